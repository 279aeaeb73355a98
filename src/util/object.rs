use crate::model::fs::FSError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Provider {
    AWS,
    GCS,
}

impl Provider {
    pub fn scheme(&self) -> &'static str {
        match self {
            Provider::AWS => "s3",
            Provider::GCS => "gs",
        }
    }
}

/// Bucket and folder named by an `open` argument.
#[derive(Debug, PartialEq)]
pub struct Location {
    pub provider: Provider,
    pub bucket: String,
    pub folder: String,
}

pub fn parse_provider(name: &str) -> Result<Provider, FSError> {
    match name {
        "s3" | "aws" => Ok(Provider::AWS),
        "gs" | "gcs" => Ok(Provider::GCS),
        _ => Err(FSError::InvalidLocation {
            location: format!("unknown provider: {}", name),
        }),
    }
}

/// Parses `s3://bucket/dir`, `gs://bucket/dir` or a bare `bucket/dir`,
/// which uses `default_provider`.
pub fn parse_location(uri: &str, default_provider: Provider) -> Result<Location, FSError> {
    let (provider, rest) = match uri.split_once("://") {
        Some((scheme, rest)) => (
            parse_provider(scheme).map_err(|_| FSError::InvalidLocation {
                location: uri.to_string(),
            })?,
            rest,
        ),
        None => (default_provider, uri),
    };

    let rest = rest.trim_start_matches('/');
    let (bucket, folder) = match rest.split_once('/') {
        Some((bucket, folder)) => (bucket, folder.trim_matches('/')),
        None => (rest, ""),
    };

    if bucket.is_empty() {
        return Err(FSError::InvalidLocation {
            location: uri.to_string(),
        });
    }

    Ok(Location {
        provider,
        bucket: bucket.to_string(),
        folder: folder.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert!(matches!(parse_provider("s3"), Ok(Provider::AWS)));
        assert!(matches!(parse_provider("gs"), Ok(Provider::GCS)));
        assert!(matches!(parse_provider("ftp"), Err(_)));
    }

    #[test]
    fn test_parse_location() {
        let cases = vec![
            ("s3://bucket", Provider::AWS, "bucket", ""),
            ("gs://bucket/a/b/", Provider::GCS, "bucket", "a/b"),
            ("bucket/folder", Provider::AWS, "bucket", "folder"),
            ("bucket", Provider::AWS, "bucket", ""),
        ];

        for (uri, provider, bucket, folder) in cases {
            let result = parse_location(uri, Provider::AWS).unwrap();
            assert_eq!(
                result,
                Location {
                    provider,
                    bucket: bucket.to_string(),
                    folder: folder.to_string(),
                },
                "failed for case: {}",
                uri
            );
        }
    }

    #[test]
    fn test_parse_location_invalid() {
        let cases = vec!["ftp://bucket", "s3://", "", "/"];

        for uri in cases {
            assert!(
                matches!(
                    parse_location(uri, Provider::AWS),
                    Err(FSError::InvalidLocation { .. })
                ),
                "failed for case: {}",
                uri
            );
        }
    }
}
