use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{adapters, config::ObjectParams, model, util};

#[derive(Default)]
pub struct MockState {
    pub buckets: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
    pub uploads: Vec<(String, ObjectParams)>,
    pub downloads: Vec<(String, ObjectParams)>,
    pub failing_keys: BTreeSet<String>,
}

/// In-memory bucket store. Clones share state so tests can inspect what
/// the code under test did.
#[derive(Clone, Default)]
pub struct MockClient {
    pub state: Arc<Mutex<MockState>>,
}

impl MockClient {
    pub fn with_bucket(bucket: &str) -> Self {
        let client = Self::default();
        client
            .lock()
            .buckets
            .insert(bucket.to_string(), BTreeMap::new());
        client
    }

    pub fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().expect("failed to acquire mock state guard")
    }

    /// Stores `size` bytes at `key`; size 0 makes a marker-like object.
    pub fn insert(&self, bucket: &str, key: &str, size: usize) {
        self.lock()
            .buckets
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), vec![b'x'; size]);
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned())
    }

    pub fn fail_on(&self, key: &str) {
        self.lock().failing_keys.insert(key.to_string());
    }

    fn check(&self, operation: &str, key: &str) -> Result<(), model::fs::FSError> {
        if self.lock().failing_keys.contains(key) {
            return Err(model::fs::FSError::storage(operation, key, "injected failure"));
        }
        Ok(())
    }
}

impl adapters::Object for MockClient {
    fn fs_put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Option<Vec<u8>>,
        params: &ObjectParams,
    ) -> Result<(), model::fs::FSError> {
        self.check("put_object", key)?;

        let mut state = self.lock();
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| model::fs::FSError::NoSuchContainer {
                bucket: bucket.to_string(),
            })?;
        objects.insert(key.to_string(), body.unwrap_or_default());
        state.uploads.push((key.to_string(), params.clone()));

        Ok(())
    }

    fn fs_list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<model::fs::FSObject>, model::fs::FSError> {
        self.check("list_objects", prefix)?;

        let state = self.lock();
        let objects = state
            .buckets
            .get(bucket)
            .ok_or_else(|| model::fs::FSError::NoSuchContainer {
                bucket: bucket.to_string(),
            })?;

        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, body)| model::fs::FSObject {
                key: key.clone(),
                size: body.len() as i64,
            })
            .collect())
    }

    fn fs_download_object(
        &self,
        bucket: &str,
        key: &str,
        params: &ObjectParams,
    ) -> Result<Option<Vec<u8>>, model::fs::FSError> {
        self.check("get_object", key)?;

        let mut state = self.lock();
        state.downloads.push((key.to_string(), params.clone()));

        Ok(state
            .buckets
            .get(bucket)
            .and_then(|objects| objects.get(key).cloned()))
    }

    fn fs_delete_object(&self, bucket: &str, key: &str) -> Result<(), model::fs::FSError> {
        self.check("delete_object", key)?;

        if let Some(objects) = self.lock().buckets.get_mut(bucket) {
            objects.remove(key);
        }

        Ok(())
    }

    fn fs_bucket_exists(&self, bucket: &str) -> Result<bool, model::fs::FSError> {
        Ok(self.lock().buckets.contains_key(bucket))
    }

    fn fs_upload_params(&self) -> &'static [&'static str] {
        &["ContentType", "Metadata", "ServerSideEncryption"]
    }

    fn fs_download_params(&self) -> &'static [&'static str] {
        &["VersionId"]
    }
}

/// Hands out clones of one `MockClient` whatever the provider.
pub struct MockConnector {
    pub client: MockClient,
}

impl adapters::Connector for MockConnector {
    fn connect(
        &self,
        _provider: util::object::Provider,
    ) -> Result<Box<dyn adapters::Object>, model::fs::FSError> {
        Ok(Box::new(self.client.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Object;

    #[test]
    fn test_list_objects_by_prefix() {
        let client = MockClient::with_bucket("bucket");
        for key in ["a/", "a/x.txt", "ab.txt", "b.txt"] {
            client.insert("bucket", key, 1);
        }

        let cases = vec![
            ("", vec!["a/", "a/x.txt", "ab.txt", "b.txt"]),
            ("a", vec!["a/", "a/x.txt", "ab.txt"]),
            ("a/", vec!["a/", "a/x.txt"]),
            ("c", vec![]),
        ];

        for (prefix, expected) in cases {
            let result: Vec<String> = client
                .fs_list_objects("bucket", prefix)
                .unwrap()
                .into_iter()
                .map(|o| o.key)
                .collect();
            assert_eq!(result, expected, "failed for case: {}", prefix);
        }
    }

    #[test]
    fn test_put_delete() {
        let client = MockClient::with_bucket("bucket");

        client
            .fs_put_object("bucket", "k", Some(b"abc".to_vec()), &ObjectParams::new())
            .unwrap();
        assert_eq!(client.get("bucket", "k"), Some(b"abc".to_vec()));

        client.fs_delete_object("bucket", "k").unwrap();
        assert_eq!(client.get("bucket", "k"), None);
        assert!(matches!(
            client.fs_put_object("missing", "k", None, &ObjectParams::new()),
            Err(model::fs::FSError::NoSuchContainer { .. })
        ));
    }
}
