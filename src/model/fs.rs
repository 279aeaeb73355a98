use std::path::PathBuf;

use thiserror::Error;

#[derive(Clone, Debug)]
pub struct FSObject {
    pub key: String,
    pub size: i64,
}

#[derive(Debug, Error)]
pub enum FSError {
    #[error("no such bucket: {bucket}")]
    NoSuchContainer { bucket: String },

    #[error("no such directory: {path}")]
    NoSuchDirectory { path: String },

    #[error("no such file: {path}")]
    NoSuchFile { path: String },

    #[error("no such object: {path}")]
    NoSuchObject { path: String },

    #[error("is a directory: {path}")]
    IsADirectory { path: String },

    #[error("a file or directory by this name already exists: {path}")]
    ObjectAlreadyExists { path: String },

    #[error("directory is not empty: {path}")]
    DirectoryNotEmpty { path: String },

    #[error("cannot remove the root directory")]
    RootDirectory,

    #[error("invalid object parameter: {name}")]
    InvalidObjectParameter { name: String },

    #[error("{}: {}", .path.display(), .source)]
    LocalIO {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Storage { message: String },

    #[error("not connected, use `open <location>` first")]
    NotConnected,

    #[error("invalid location: {location}")]
    InvalidLocation { location: String },

    #[error("invalid command: {message}")]
    InvalidCommand { message: String },
}

impl FSError {
    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FSError::LocalIO {
            path: path.into(),
            source,
        }
    }

    pub fn storage(operation: &str, key: &str, err: impl std::fmt::Display) -> Self {
        FSError::Storage {
            message: format!("failed to {} at: {}, {}", operation, key, err),
        }
    }
}
