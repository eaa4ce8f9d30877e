use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CleanError, CleanResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DbType {
    #[default]
    Json,
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[serde(rename = "mysql")]
    MySql,
    #[serde(rename = "mariadb")]
    MariaDb,
}

impl DbType {
    pub fn is_relational(self) -> bool {
        !matches!(self, DbType::Json)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DbType::Json => "json",
            DbType::Sqlite => "sqlite",
            DbType::MySql => "mysql",
            DbType::MariaDb => "mariadb",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefaultFiles {
    #[serde(default = "default_dir_structure")]
    pub dir_structure: String,
    #[serde(default = "default_iana")]
    pub iana: String,
    #[serde(default = "default_public_suffix")]
    pub public_suffix: String,
    #[serde(default = "default_inactive_db")]
    pub inactive_db: String,
    #[serde(default = "default_mining")]
    pub mining: String,
}

fn default_dir_structure() -> String {
    "dir_structure.json".to_string()
}

fn default_iana() -> String {
    "iana-domains-db.json".to_string()
}

fn default_public_suffix() -> String {
    "public-suffix.json".to_string()
}

fn default_inactive_db() -> String {
    "inactive_db.json".to_string()
}

fn default_mining() -> String {
    "mining.json".to_string()
}

impl Default for DefaultFiles {
    fn default() -> Self {
        Self {
            dir_structure: default_dir_structure(),
            iana: default_iana(),
            public_suffix: default_public_suffix(),
            inactive_db: default_inactive_db(),
            mining: default_mining(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_current_dir")]
    pub output_directory: PathBuf,
    #[serde(default = "default_output_parent")]
    pub output_parent: String,
    #[serde(default = "default_current_dir")]
    pub config_directory: PathBuf,
    #[serde(default)]
    pub db_type: DbType,
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
    #[serde(default = "default_log_marker")]
    pub log_marker: String,
    #[serde(default)]
    pub default_files: DefaultFiles,
    #[serde(default)]
    pub local_checkout: Option<bool>,
}

fn default_current_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_parent() -> String {
    "output".to_string()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("records.sqlite")
}

fn default_table_prefix() -> String {
    "checker_".to_string()
}

fn default_log_marker() -> String {
    ".log".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_directory: default_current_dir(),
            output_parent: default_output_parent(),
            config_directory: default_current_dir(),
            db_type: DbType::default(),
            sqlite_path: default_sqlite_path(),
            table_prefix: default_table_prefix(),
            log_marker: default_log_marker(),
            default_files: DefaultFiles::default(),
            local_checkout: None,
        }
    }
}

impl Settings {
    pub fn output_root(&self) -> PathBuf {
        if self.output_parent.is_empty() {
            return self.output_directory.clone();
        }
        self.output_directory.join(&self.output_parent)
    }

    pub fn resolved_sqlite_path(&self) -> PathBuf {
        if self.sqlite_path.is_absolute() {
            self.sqlite_path.clone()
        } else {
            self.config_directory.join(&self.sqlite_path)
        }
    }
}

pub fn load_settings(path: impl AsRef<Path>) -> CleanResult<Settings> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| CleanError::SettingsRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| CleanError::SettingsParse {
        path: path.to_path_buf(),
        source,
    })
}
