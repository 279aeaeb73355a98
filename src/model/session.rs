use std::path::PathBuf;

use crate::util::object::Provider;

/// Connection state of one interactive session.
///
/// `remote_working_dir` is a canonical path (no leading or trailing `/`,
/// root is `""`) and is only `Some` while a bucket is open.
#[derive(Debug)]
pub struct Session {
    pub provider: Option<Provider>,
    pub root_location: Option<String>,
    pub remote_working_dir: Option<String>,
    pub local_working_dir: PathBuf,
}

impl Session {
    pub fn new(local_working_dir: PathBuf) -> Self {
        Self {
            provider: None,
            root_location: None,
            remote_working_dir: None,
            local_working_dir,
        }
    }

    pub fn is_open(&self) -> bool {
        self.root_location.is_some() && self.remote_working_dir.is_some()
    }

    pub fn open(&mut self, provider: Provider, bucket: &str, remote_working_dir: &str) {
        self.provider = Some(provider);
        self.root_location = Some(bucket.to_string());
        self.remote_working_dir = Some(remote_working_dir.to_string());
    }

    pub fn close(&mut self) {
        self.provider = None;
        self.root_location = None;
        self.remote_working_dir = None;
    }
}
