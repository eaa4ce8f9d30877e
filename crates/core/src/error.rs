use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CleanError {
    #[error("failed to delete '{}': {source}", .path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to resolve current directory: {source}")]
    CurrentDir {
        #[source]
        source: io::Error,
    },

    #[error("failed to open database '{}': {source}", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("no connector available for the {db_type} backend")]
    UnsupportedBackend { db_type: String },

    #[error("failed to clean table {table}: {source}")]
    Database {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to read settings '{}': {source}", .path.display())]
    SettingsRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse settings '{}': {source}", .path.display())]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type CleanResult<T> = Result<T, CleanError>;
