use aws_sdk_s3::{
    error::{DisplayErrorContext, SdkError},
    primitives::ByteStream,
    types::{ObjectCannedAcl, RequestPayer, ServerSideEncryption, StorageClass},
};
use bytes::Bytes;

use crate::{
    adapters::{self, param_map, param_str},
    config::ObjectParams,
    model, util,
};

/// Names accepted by S3 uploads, as in the `S3Transfer` allow-list.
pub const UPLOAD_PARAMS: &[&str] = &[
    "ACL",
    "CacheControl",
    "ContentDisposition",
    "ContentEncoding",
    "ContentLanguage",
    "ContentType",
    "GrantFullControl",
    "GrantRead",
    "GrantReadACP",
    "GrantWriteACP",
    "Metadata",
    "RequestPayer",
    "ServerSideEncryption",
    "StorageClass",
    "SSECustomerAlgorithm",
    "SSECustomerKey",
    "SSECustomerKeyMD5",
    "SSEKMSKeyId",
    "WebsiteRedirectLocation",
];

pub const DOWNLOAD_PARAMS: &[&str] = &[
    "VersionId",
    "SSECustomerAlgorithm",
    "SSECustomerKey",
    "SSECustomerKeyMD5",
    "RequestPayer",
];

/// Timeouts, connection failures, throttling and server errors.
fn is_transient<E>(err: &SdkError<E>) -> bool {
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(_) => err
            .raw_response()
            .map(|raw| {
                let status = raw.status().as_u16();
                status == 429 || status >= 500
            })
            .unwrap_or(false),
        _ => false,
    }
}

fn param_string(params: &ObjectParams, name: &str) -> Option<String> {
    param_str(params, name).map(str::to_string)
}

impl adapters::Object for aws_sdk_s3::Client {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Option<Vec<u8>>,
        params: &ObjectParams,
    ) -> Result<(), model::fs::FSError> {
        // retries share one buffer instead of copying it per attempt
        let body = Bytes::from(body.unwrap_or_default());
        let metadata = param_map(params, "Metadata");

        let send = || {
            let mut req = self
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body.clone()))
                .set_cache_control(param_string(params, "CacheControl"))
                .set_content_disposition(param_string(params, "ContentDisposition"))
                .set_content_encoding(param_string(params, "ContentEncoding"))
                .set_content_language(param_string(params, "ContentLanguage"))
                .set_content_type(param_string(params, "ContentType"))
                .set_grant_full_control(param_string(params, "GrantFullControl"))
                .set_grant_read(param_string(params, "GrantRead"))
                .set_grant_read_acp(param_string(params, "GrantReadACP"))
                .set_grant_write_acp(param_string(params, "GrantWriteACP"))
                .set_sse_customer_algorithm(param_string(params, "SSECustomerAlgorithm"))
                .set_sse_customer_key(param_string(params, "SSECustomerKey"))
                .set_sse_customer_key_md5(param_string(params, "SSECustomerKeyMD5"))
                .set_ssekms_key_id(param_string(params, "SSEKMSKeyId"))
                .set_website_redirect_location(param_string(params, "WebsiteRedirectLocation"))
                .set_acl(param_str(params, "ACL").map(ObjectCannedAcl::from))
                .set_request_payer(param_str(params, "RequestPayer").map(RequestPayer::from))
                .set_server_side_encryption(
                    param_str(params, "ServerSideEncryption").map(ServerSideEncryption::from),
                )
                .set_storage_class(param_str(params, "StorageClass").map(StorageClass::from));

            for (name, value) in &metadata {
                req = req.metadata(name, value);
            }

            util::poll::poll_until_ready(req.send())
        };

        util::retry::retry(
            &util::retry::STORAGE_BACKOFF,
            "put_object",
            send,
            is_transient,
        )
        .map_err(|err| model::fs::FSError::storage("put_object", key, DisplayErrorContext(&err)))?;

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
            let send = || {
                let req = self
                    .list_objects_v2()
                    .bucket(bucket)
                    .prefix(prefix)
                    .set_continuation_token(continuation_token.clone());

                util::poll::poll_until_ready(req.send())
            };

            let lo = util::retry::retry(
                &util::retry::STORAGE_BACKOFF,
                "list_objects",
                send,
                is_transient,
            )
            .map_err(|err| {
                model::fs::FSError::storage("list_objects", prefix, DisplayErrorContext(&err))
            })?;

            for o in lo.contents() {
                objects.push(model::fs::FSObject {
                    key: o.key().unwrap_or("").to_string(),
                    size: o.size().unwrap_or(0),
                });
            }

            continuation_token = lo.next_continuation_token().map(|tok| tok.to_string());
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
        let send = || {
            let req = self
                .get_object()
                .bucket(bucket)
                .key(key)
                .set_version_id(param_string(params, "VersionId"))
                .set_sse_customer_algorithm(param_string(params, "SSECustomerAlgorithm"))
                .set_sse_customer_key(param_string(params, "SSECustomerKey"))
                .set_sse_customer_key_md5(param_string(params, "SSECustomerKeyMD5"))
                .set_request_payer(param_str(params, "RequestPayer").map(RequestPayer::from));

            util::poll::poll_until_ready(req.send())
        };

        let res = util::retry::retry(&util::retry::STORAGE_BACKOFF, "get_object", send, is_transient);

        let o = match res {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_no_such_key() {
                        return Ok(None);
                    }
                }

                return Err(model::fs::FSError::storage(
                    "get_object",
                    key,
                    DisplayErrorContext(&err),
                ));
            }
            Ok(o) => o,
        };

        let bytes = util::poll::poll_until_ready(o.body.collect())
            .map_err(|err| model::fs::FSError::storage("collect body", key, err))?;

        Ok(Some(bytes.into_bytes().to_vec()))
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        let send = || util::poll::poll_until_ready(self.delete_object().bucket(bucket).key(key).send());

        util::retry::retry(&util::retry::STORAGE_BACKOFF, "delete_object", send, is_transient)
            .map_err(|err| {
                model::fs::FSError::storage("delete_object", key, DisplayErrorContext(&err))
            })?;

        Ok(())
    }

    fn fs_bucket_exists(&self, bucket: &str) -> Result<bool, model::fs::FSError> {
        let send = || util::poll::poll_until_ready(self.head_bucket().bucket(bucket).send());

        match util::retry::retry(&util::retry::STORAGE_BACKOFF, "head_bucket", send, is_transient) {
            Err(err) => {
                if let Some(svc_err) = err.as_service_error() {
                    if svc_err.is_not_found() {
                        return Ok(false);
                    }
                }

                Err(model::fs::FSError::storage(
                    "head_bucket",
                    bucket,
                    DisplayErrorContext(&err),
                ))
            }
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
