use serde::{Deserialize, Serialize};

use crate::database::Table;
use crate::settings::DbType;

pub const REPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CleanMode {
    #[default]
    Almost,
    All,
}

impl CleanMode {
    pub fn from_clean_all(clean_all: bool) -> Self {
        if clean_all {
            CleanMode::All
        } else {
            CleanMode::Almost
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanOptions {
    pub clean_all: bool,
    /// Narrows record deletion to rows produced while testing this file.
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableCleanup {
    pub table: Table,
    pub table_name: String,
    pub deleted_rows: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanReport {
    pub report_version: String,
    pub run_id: String,
    pub generated_at: String,
    pub mode: CleanMode,
    #[serde(default)]
    pub file_path: Option<String>,
    pub db_type: DbType,
    /// Set when the run was suppressed by the `do_not_clean` flag.
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub deleted_files: Vec<String>,
    #[serde(default)]
    pub missing_files: Vec<String>,
    #[serde(default)]
    pub excluded_tables: Vec<Table>,
    #[serde(default)]
    pub cleaned_tables: Vec<TableCleanup>,
    #[serde(default)]
    pub config_reloaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanPlan {
    pub mode: CleanMode,
    pub file_path: Option<String>,
    pub db_type: DbType,
    pub local_checkout: bool,
    pub do_not_clean: bool,
    pub output_root: String,
    pub candidate_files: Vec<String>,
    pub database_files: Vec<String>,
    pub excluded_tables: Vec<Table>,
    pub targeted_tables: Vec<String>,
    pub query_template: String,
    pub reload_config: bool,
}
