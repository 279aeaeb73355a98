use tracing::info;

use crate::{config::ObjectParams, model, util};

pub mod gcs;
#[cfg(test)]
pub mod mock;
pub mod s3;

/// Storage capability a bucket backend provides. Keys are flat; `/` has no
/// meaning to the backend.
pub trait Object {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Option<Vec<u8>>,
        params: &ObjectParams,
    ) -> Result<(), model::fs::FSError>;

    /// Every object whose key starts with `prefix`, in key order.
    fn fs_list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<model::fs::FSObject>, model::fs::FSError>;

    /// `Ok(None)` when the object does not exist.
    fn fs_download_object(
        &self,
        bucket: &str,
        key: &str,
        params: &ObjectParams,
    ) -> Result<Option<Vec<u8>>, model::fs::FSError>;

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError>;

    fn fs_bucket_exists(&self, bucket: &str) -> Result<bool, model::fs::FSError>;

    /// Parameter names applied to uploads.
    fn fs_upload_params(&self) -> &'static [&'static str];

    /// Parameter names applied to downloads.
    fn fs_download_params(&self) -> &'static [&'static str];
}

/// Builds a client for a provider when a bucket is opened.
pub trait Connector {
    fn connect(
        &self,
        provider: util::object::Provider,
    ) -> Result<Box<dyn Object>, model::fs::FSError>;
}

/// Connects to the real cloud services using ambient credentials.
pub struct CloudConnector {}

impl Connector for CloudConnector {
    fn connect(
        &self,
        provider: util::object::Provider,
    ) -> Result<Box<dyn Object>, model::fs::FSError> {
        info!(provider = provider.scheme(), "connecting");

        match provider {
            util::object::Provider::AWS => {
                let config = util::poll::poll_until_ready(aws_config::load_from_env());
                Ok(Box::new(aws_sdk_s3::Client::new(&config)))
            }
            util::object::Provider::GCS => {
                let config = util::poll::poll_until_ready(
                    google_cloud_storage::client::ClientConfig::default().with_auth(),
                )
                .map_err(|err| model::fs::FSError::Storage {
                    message: format!("failed to authenticate with gcs, {}", err),
                })?;
                Ok(Box::new(google_cloud_storage::client::Client::new(config)))
            }
        }
    }
}

/// Reads a string-valued parameter, ignoring values of other JSON types.
pub fn param_str<'a>(params: &'a ObjectParams, name: &str) -> Option<&'a str> {
    params.get(name).and_then(|v| v.as_str())
}

/// Reads a JSON object of strings, e.g. user metadata.
pub fn param_map(params: &ObjectParams, name: &str) -> Vec<(String, String)> {
    match params.get(name).and_then(|v| v.as_object()) {
        None => Vec::new(),
        Some(map) => map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_param_accessors() {
        let mut params = ObjectParams::new();
        params.insert("ContentType".to_string(), json!("text/plain"));
        params.insert("Count".to_string(), json!(3));
        params.insert("Metadata".to_string(), json!({"owner": "ops", "n": 1}));

        assert_eq!(param_str(&params, "ContentType"), Some("text/plain"));
        assert_eq!(param_str(&params, "Count"), None);
        assert_eq!(param_str(&params, "Missing"), None);
        assert_eq!(
            param_map(&params, "Metadata"),
            vec![("owner".to_string(), "ops".to_string())]
        );
        assert!(param_map(&params, "ContentType").is_empty());
    }
}
