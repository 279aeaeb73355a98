use std::path::PathBuf;

use tracing::debug;

use crate::{
    adapters,
    config::ObjectParams,
    model::{self, fs::FSError},
    path,
    util::object::Provider,
};

/// An FTP-style session over one bucket.
///
/// Directories are derived from the flat key space on every query: a
/// directory is the root or a marker object `dir/`. Keys nested below a
/// missing marker only show up in listings. Nothing is cached between calls.
pub struct ObjectFS {
    pub connector: Box<dyn adapters::Connector>,
    pub client: Option<Box<dyn adapters::Object>>,
    pub session: model::session::Session,
    pub default_provider: Provider,
    pub default_params: ObjectParams,
    pub strict_params: bool,
}

/// Borrowed view of an open connection.
pub struct Remote<'a> {
    pub client: &'a dyn adapters::Object,
    pub bucket: &'a str,
    pub cwd: &'a str,
}

impl ObjectFS {
    pub fn new(
        connector: Box<dyn adapters::Connector>,
        local_working_dir: PathBuf,
        default_provider: Provider,
        default_params: ObjectParams,
        strict_params: bool,
    ) -> Self {
        Self {
            connector,
            client: None,
            session: model::session::Session::new(local_working_dir),
            default_provider,
            default_params,
            strict_params,
        }
    }

    pub fn remote(&self) -> Result<Remote<'_>, FSError> {
        match (
            self.client.as_deref(),
            self.session.root_location.as_deref(),
            self.session.remote_working_dir.as_deref(),
        ) {
            (Some(client), Some(bucket), Some(cwd)) => Ok(Remote { client, bucket, cwd }),
            _ => Err(FSError::NotConnected),
        }
    }

    /// Canonical remote path for a user-supplied name.
    pub fn absolute_path(&self, name: &str) -> Result<String, FSError> {
        let remote = self.remote()?;
        Ok(path::absolute_path(name, remote.cwd))
    }

    pub fn list(&self, prefix: &str) -> Result<Vec<model::fs::FSObject>, FSError> {
        let remote = self.remote()?;
        let objects = remote.client.fs_list_objects(remote.bucket, prefix)?;
        debug!(prefix = prefix, count = objects.len(), "listed");

        Ok(objects)
    }

    /// Whether the canonical `path` is a directory: the root or a marker
    /// object keyed exactly `path/`.
    pub fn is_directory(&self, path: &str) -> Result<bool, FSError> {
        if path.is_empty() {
            return Ok(true);
        }

        let marker = path::dir_prefix(path);
        Ok(self
            .list(&marker)?
            .iter()
            .any(|object| object.key == marker))
    }

    /// Whether an object keyed exactly `path` exists with a nonzero size.
    /// Zero-size objects are never files.
    pub fn is_file(&self, path: &str) -> Result<bool, FSError> {
        if path.is_empty() {
            return Ok(false);
        }

        Ok(self
            .list(path)?
            .iter()
            .any(|object| object.key == path && object.size > 0))
    }

    /// Whether the directory `path` holds nothing but its marker.
    pub fn is_empty(&self, path: &str) -> Result<bool, FSError> {
        if !self.is_directory(path)? {
            return Err(FSError::NoSuchDirectory {
                path: path.to_string(),
            });
        }

        let prefix = path::dir_prefix(path);
        let objects = self.list(&prefix)?;

        Ok(match objects.as_slice() {
            [] => true,
            [marker] => marker.key == prefix && marker.size == 0,
            _ => false,
        })
    }
}

#[cfg(test)]
pub fn mock_fs(client: &adapters::mock::MockClient, cwd: &str, local_working_dir: PathBuf) -> ObjectFS {
    let mut fs = ObjectFS::new(
        Box::new(adapters::mock::MockConnector {
            client: client.clone(),
        }),
        local_working_dir,
        Provider::AWS,
        ObjectParams::new(),
        false,
    );
    fs.client = Some(Box::new(client.clone()));
    fs.session.open(Provider::AWS, "bucket", cwd);
    fs
}
