use google_cloud_storage::http::{
    buckets::get::GetBucketRequest,
    objects::{
        delete::DeleteObjectRequest,
        download::Range,
        get::GetObjectRequest,
        list::ListObjectsRequest,
        upload::{Media, UploadObjectRequest, UploadType},
        Object,
    },
    Error,
};
use bytes::Bytes;

use crate::{
    adapters::{self, param_map, param_str},
    config::ObjectParams,
    model, util,
};

pub const UPLOAD_PARAMS: &[&str] = &[
    "cacheControl",
    "contentDisposition",
    "contentEncoding",
    "contentLanguage",
    "contentType",
    "metadata",
    "storageClass",
];

pub const DOWNLOAD_PARAMS: &[&str] = &["generation"];

fn is_transient(err: &Error) -> bool {
    match err {
        Error::Response(err) => err.code == 429 || err.code >= 500,
        Error::HttpClient(_) => true,
        _ => false,
    }
}

fn is_not_found(err: &Error) -> bool {
    matches!(err, Error::Response(err) if err.code == 404)
}

/// Upload type for `key`: a plain media upload, or a multipart upload
/// carrying object metadata when any upload parameter is set.
fn upload_type(key: &str, params: &ObjectParams) -> UploadType {
    if params.is_empty() {
        return UploadType::Simple(Media::new(key.to_string()));
    }

    let metadata = param_map(params, "metadata");
    let string = |name: &str| param_str(params, name).map(str::to_string);

    UploadType::Multipart(Box::new(Object {
        name: key.to_string(),
        cache_control: string("cacheControl"),
        content_disposition: string("contentDisposition"),
        content_encoding: string("contentEncoding"),
        content_language: string("contentLanguage"),
        content_type: string("contentType"),
        storage_class: string("storageClass"),
        metadata: if metadata.is_empty() {
            None
        } else {
            Some(metadata.into_iter().collect())
        },
        ..Default::default()
    }))
}

impl adapters::Object for google_cloud_storage::client::Client {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Option<Vec<u8>>,
        params: &ObjectParams,
    ) -> Result<(), model::fs::FSError> {
        let req = UploadObjectRequest {
            bucket: bucket.to_string(),
            ..Default::default()
        };
        let body = Bytes::from(body.unwrap_or_default());
        let upload = upload_type(key, params);

        util::retry::retry(
            &util::retry::STORAGE_BACKOFF,
            "put_object",
            || util::poll::poll_until_ready(self.upload_object(&req, body.clone(), &upload)),
            is_transient,
        )
        .map_err(|err| model::fs::FSError::storage("put_object", key, err))?;

        Ok(())
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<model::fs::FSObject>, model::fs::FSError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let req = ListObjectsRequest {
                bucket: bucket.to_string(),
                prefix: Some(prefix.to_string()),
                page_token: continuation_token.clone(),
                ..Default::default()
            };

            let lo = util::retry::retry(
                &util::retry::STORAGE_BACKOFF,
                "list_objects",
                || util::poll::poll_until_ready(self.list_objects(&req)),
                is_transient,
            )
            .map_err(|err| model::fs::FSError::storage("list_objects", prefix, err))?;

            for obj in lo.items.unwrap_or_default() {
                objects.push(model::fs::FSObject {
                    key: obj.name,
                    size: obj.size,
                });
            }

            continuation_token = lo.next_page_token;
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(objects)
    }

    fn fs_download_object(
        &self,
        bucket: &str,
        key: &str,
        params: &ObjectParams,
    ) -> Result<Option<Vec<u8>>, model::fs::FSError> {
        let req = GetObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            generation: param_str(params, "generation").and_then(|g| g.parse().ok()),
            ..Default::default()
        };

        let res = util::retry::retry(
            &util::retry::STORAGE_BACKOFF,
            "get_object",
            || util::poll::poll_until_ready(self.download_object(&req, &Range::default())),
            is_transient,
        );

        match res {
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(model::fs::FSError::storage("get_object", key, err)),
            Ok(bytes) => Ok(Some(bytes)),
        }
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let req = DeleteObjectRequest {
            bucket: bucket.to_string(),
            object: key.to_string(),
            ..Default::default()
        };

        util::retry::retry(
            &util::retry::STORAGE_BACKOFF,
            "delete_object",
            || util::poll::poll_until_ready(self.delete_object(&req)),
            is_transient,
        )
        .map_err(|err| model::fs::FSError::storage("delete_object", key, err))?;

        Ok(())
    }

    fn fs_bucket_exists(&self, bucket: &str) -> Result<bool, model::fs::FSError> {
        let req = GetBucketRequest {
            bucket: bucket.to_string(),
            ..Default::default()
        };

        match util::retry::retry(
            &util::retry::STORAGE_BACKOFF,
            "get_bucket",
            || util::poll::poll_until_ready(self.get_bucket(&req)),
            is_transient,
        ) {
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(model::fs::FSError::storage("get_bucket", bucket, err)),
            Ok(_) => Ok(true),
        }
    }

    fn fs_upload_params(&self) -> &'static [&'static str] {
        UPLOAD_PARAMS
    }

    fn fs_download_params(&self) -> &'static [&'static str] {
        DOWNLOAD_PARAMS
    }
}
