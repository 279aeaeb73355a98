use std::{
    collections::BTreeSet,
    fs, io,
    path::PathBuf,
};

use tracing::{error, info, span, Level};

use crate::{
    config::{self, ObjectParams},
    fs::ObjectFS,
    model::fs::FSError,
    path, pattern, util,
};

/// Outcome of each file in a multi-file verb, in processing order.
pub type BatchReport = Vec<(String, Result<(), FSError>)>;

fn logged<T>(group: &str, res: Result<T, FSError>) -> Result<T, FSError> {
    if let Err(err) = &res {
        error!(error_message=%err, error_group=group);
    }
    res
}

impl ObjectFS {
    pub fn open(&mut self, location: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "open", context = "open");
        let _e = span.enter();
        info!(location = location, "called");

        let res = self.open_location(location);
        logged("open", res)
    }

    fn open_location(&mut self, location: &str) -> Result<(), FSError> {
        let location = util::object::parse_location(location, self.default_provider)?;
        let client = self.connector.connect(location.provider)?;

        if !client.fs_bucket_exists(&location.bucket)? {
            return Err(FSError::NoSuchContainer {
                bucket: location.bucket,
            });
        }

        if self.strict_params {
            let recognized: Vec<&str> = client
                .fs_upload_params()
                .iter()
                .chain(client.fs_download_params())
                .copied()
                .collect();
            config::filter_params(&self.default_params, &recognized, true)?;
        }

        self.close();
        self.client = Some(client);
        self.session.open(location.provider, &location.bucket, "");

        // a failed open must not leave the new bucket half-connected
        let folder = path::normalize(&location.folder);
        match self.is_directory(&folder) {
            Ok(true) => {
                self.session.remote_working_dir = Some(folder);
                Ok(())
            }
            Ok(false) => {
                self.close();
                Err(FSError::NoSuchDirectory { path: folder })
            }
            Err(err) => {
                self.close();
                Err(err)
            }
        }
    }

    pub fn close(&mut self) {
        info!(
            provider = ?self.session.provider,
            bucket = self.session.root_location.as_deref(),
            "close"
        );

        self.client = None;
        self.session.close();
    }

    pub fn pwd(&self) -> Result<String, FSError> {
        let remote = self.remote()?;
        Ok(format!("{}/{}", remote.bucket, remote.cwd))
    }

    pub fn cd(&mut self, name: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "cd", context = "cd");
        let _e = span.enter();
        info!(name = name, "called");

        let res = self.absolute_path(name).and_then(|remote_path| {
            if self.is_directory(&remote_path)? {
                self.session.remote_working_dir = Some(remote_path);
                Ok(())
            } else {
                Err(FSError::NoSuchDirectory { path: remote_path })
            }
        });
        logged("cd", res)
    }

    /// Changes the session's local working directory; the process working
    /// directory is left alone.
    pub fn lcd(&mut self, dir: &str) -> Result<PathBuf, FSError> {
        let span = span!(Level::INFO, "lcd", context = "lcd");
        let _e = span.enter();
        info!(dir = dir, "called");

        let target = self.session.local_working_dir.join(dir);
        let res = fs::canonicalize(&target)
            .map_err(|err| FSError::local_io(&target, err))
            .and_then(|canonical| {
                if !canonical.is_dir() {
                    return Err(FSError::local_io(
                        &target,
                        io::Error::new(io::ErrorKind::Other, "not a directory"),
                    ));
                }
                // surfaces permission problems now rather than on the next transfer
                fs::read_dir(&canonical).map_err(|err| FSError::local_io(&target, err))?;

                Ok(canonical)
            });

        let canonical = logged("lcd", res)?;
        self.session.local_working_dir = canonical.clone();

        Ok(canonical)
    }

    /// Names directly inside the remote working directory, sorted, with
    /// directories shown once and without their trailing `/`.
    pub fn ls(&self) -> Result<Vec<String>, FSError> {
        let span = span!(Level::INFO, "ls", context = "ls");
        let _e = span.enter();
        info!("called");

        logged("ls", self.list_working_dir())
    }

    fn list_working_dir(&self) -> Result<Vec<String>, FSError> {
        let cwd = self.remote()?.cwd;
        let prefix = path::dir_prefix(cwd);
        let objects = self.list(&prefix)?;

        if objects.is_empty() && !cwd.is_empty() {
            return Err(FSError::NoSuchDirectory {
                path: cwd.to_string(),
            });
        }

        let entries: BTreeSet<&str> = objects
            .iter()
            .filter_map(|object| object.key.strip_prefix(prefix.as_str()))
            .map(|rest| rest.split(path::SEPARATOR).next().unwrap_or_default())
            .filter(|entry| !entry.is_empty())
            .collect();

        Ok(entries.into_iter().map(str::to_string).collect())
    }

    pub fn mkdir(&self, name: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "mkdir", context = "mkdir");
        let _e = span.enter();
        info!(name = name, "called");

        let res = self.absolute_path(name).and_then(|remote_path| {
            if self.is_directory(&remote_path)? || self.is_file(&remote_path)? {
                return Err(FSError::ObjectAlreadyExists { path: remote_path });
            }

            let remote = self.remote()?;
            remote.client.fs_put_object(
                remote.bucket,
                &path::dir_prefix(&remote_path),
                None,
                &ObjectParams::new(),
            )
        });
        logged("mkdir", res)
    }

    pub fn rmdir(&self, name: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "rmdir", context = "rmdir");
        let _e = span.enter();
        info!(name = name, "called");

        let res = self.absolute_path(name).and_then(|remote_path| {
            if remote_path.is_empty() {
                return Err(FSError::RootDirectory);
            }
            if !self.is_directory(&remote_path)? {
                return Err(FSError::NoSuchDirectory { path: remote_path });
            }
            if !self.is_empty(&remote_path)? {
                return Err(FSError::DirectoryNotEmpty { path: remote_path });
            }

            let remote = self.remote()?;
            remote
                .client
                .fs_delete_object(remote.bucket, &path::dir_prefix(&remote_path))
        });
        logged("rmdir", res)
    }

    pub fn delete(&self, name: &str) -> Result<(), FSError> {
        let span = span!(Level::INFO, "delete", context = "delete");
        let _e = span.enter();
        info!(name = name, "called");

        let res = self.absolute_path(name).and_then(|remote_path| {
            if self.is_file(&remote_path)? {
                let remote = self.remote()?;
                remote.client.fs_delete_object(remote.bucket, &remote_path)
            } else if self.is_directory(&remote_path)? {
                Err(FSError::IsADirectory { path: remote_path })
            } else {
                Err(FSError::NoSuchObject { path: remote_path })
            }
        });
        logged("delete", res)
    }

    /// Downloads `name` into the local working directory under its final
    /// path segment, overwriting any existing local file.
    pub fn get(&self, name: &str, params: Option<&ObjectParams>) -> Result<PathBuf, FSError> {
        let span = span!(Level::INFO, "get", context = "get");
        let _e = span.enter();
        info!(name = name, "called");

        let res = self.absolute_path(name).and_then(|remote_path| {
            if self.is_file(&remote_path)? {
                self.download(&remote_path, params)
            } else if self.is_directory(&remote_path)? {
                Err(FSError::IsADirectory { path: remote_path })
            } else {
                Err(FSError::NoSuchFile { path: remote_path })
            }
        });
        logged("get", res)
    }

    fn download(&self, remote_path: &str, params: Option<&ObjectParams>) -> Result<PathBuf, FSError> {
        let remote = self.remote()?;
        let params = self.transfer_params(remote.client.fs_download_params(), params)?;
        let local_path = self
            .session
            .local_working_dir
            .join(path::base_name(remote_path));

        let bytes = remote
            .client
            .fs_download_object(remote.bucket, remote_path, &params)?
            .ok_or_else(|| FSError::NoSuchFile {
                path: remote_path.to_string(),
            })?;

        fs::write(&local_path, bytes).map_err(|err| FSError::local_io(&local_path, err))?;
        info!(key = remote_path, local=%local_path.display(), "downloaded");

        Ok(local_path)
    }

    /// Uploads the local file `name` into the remote working directory
    /// under its final path segment, overwriting any existing object.
    pub fn put(&self, name: &str, params: Option<&ObjectParams>) -> Result<String, FSError> {
        let span = span!(Level::INFO, "put", context = "put");
        let _e = span.enter();
        info!(name = name, "called");

        logged("put", self.upload(name, params))
    }

    fn upload(&self, name: &str, params: Option<&ObjectParams>) -> Result<String, FSError> {
        let local_path = self.session.local_working_dir.join(name);
        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                FSError::local_io(
                    &local_path,
                    io::Error::new(io::ErrorKind::InvalidInput, "not a file name"),
                )
            })?;

        let remote_path = self.absolute_path(&file_name)?;
        let remote = self.remote()?;
        let params = self.transfer_params(remote.client.fs_upload_params(), params)?;

        let body = fs::read(&local_path).map_err(|err| FSError::local_io(&local_path, err))?;
        remote
            .client
            .fs_put_object(remote.bucket, &remote_path, Some(body), &params)?;
        info!(key = %remote_path, local=%local_path.display(), "uploaded");

        Ok(remote_path)
    }

    pub fn mget(
        &self,
        patterns: &[String],
        params: Option<&ObjectParams>,
    ) -> Result<BatchReport, FSError> {
        let names = pattern::expand(patterns, &self.ls()?);

        Ok(names
            .into_iter()
            .map(|name| {
                let res = self.get(&name, params).map(|_| ());
                (name, res)
            })
            .collect())
    }

    pub fn mdelete(&self, patterns: &[String]) -> Result<BatchReport, FSError> {
        let names = pattern::expand(patterns, &self.ls()?);

        Ok(names
            .into_iter()
            .map(|name| {
                let res = self.delete(&name);
                (name, res)
            })
            .collect())
    }

    pub fn mput(
        &self,
        patterns: &[String],
        params: Option<&ObjectParams>,
    ) -> Result<BatchReport, FSError> {
        let names = logged(
            "mput",
            pattern::expand_local(patterns, &self.session.local_working_dir),
        )?;

        Ok(names
            .into_iter()
            .map(|name| {
                let res = self.put(&name, params).map(|_| ());
                (name, res)
            })
            .collect())
    }

    /// Session defaults narrowed to `recognized`, overlaid with the
    /// per-call bag, which is checked strictly when configured to.
    fn transfer_params(
        &self,
        recognized: &[&str],
        extra: Option<&ObjectParams>,
    ) -> Result<ObjectParams, FSError> {
        let mut params = config::filter_params(&self.default_params, recognized, false)?;
        if let Some(extra) = extra {
            params.extend(config::filter_params(extra, recognized, self.strict_params)?);
        }

        Ok(params)
    }
}
