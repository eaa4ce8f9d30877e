use std::path::PathBuf;

use rusqlite::{named_params, Connection, OpenFlags};
use serde::{Deserialize, Serialize};

use crate::error::{CleanError, CleanResult};
use crate::settings::{DbType, Settings};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    AutoContinue,
    Inactive,
    Mining,
    Tested,
    Whois,
}

impl Table {
    pub fn logical_name(self) -> &'static str {
        match self {
            Table::AutoContinue => "auto_continue",
            Table::Inactive => "inactive",
            Table::Mining => "mining",
            Table::Tested => "tested",
            Table::Whois => "whois",
        }
    }

    pub fn physical_name(self, prefix: &str) -> String {
        format!("{prefix}{}", self.logical_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Never cleaned.
    Always,
    /// Kept across partial cleans, dropped by a full clean.
    UnlessCleanAll,
    /// Cleaned on every run.
    Never,
}

#[derive(Debug, Clone, Copy)]
pub struct TableDescriptor {
    pub table: Table,
    pub retention: Retention,
}

pub const TABLES: [TableDescriptor; 5] = [
    TableDescriptor {
        table: Table::AutoContinue,
        retention: Retention::UnlessCleanAll,
    },
    TableDescriptor {
        table: Table::Inactive,
        retention: Retention::UnlessCleanAll,
    },
    TableDescriptor {
        table: Table::Mining,
        retention: Retention::UnlessCleanAll,
    },
    TableDescriptor {
        table: Table::Tested,
        retention: Retention::Never,
    },
    TableDescriptor {
        table: Table::Whois,
        retention: Retention::Always,
    },
];

impl TableDescriptor {
    pub fn is_excluded(&self, clean_all: bool) -> bool {
        match self.retention {
            Retention::Always => true,
            Retention::UnlessCleanAll => !clean_all,
            Retention::Never => false,
        }
    }
}

pub fn excluded_tables(clean_all: bool) -> Vec<Table> {
    TABLES
        .iter()
        .filter(|descriptor| descriptor.is_excluded(clean_all))
        .map(|descriptor| descriptor.table)
        .collect()
}

pub fn targeted_tables(clean_all: bool) -> Vec<Table> {
    TABLES
        .iter()
        .filter(|descriptor| !descriptor.is_excluded(clean_all))
        .map(|descriptor| descriptor.table)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteQuery {
    scope: Option<String>,
}

impl DeleteQuery {
    /// An empty scope is treated like no scope.
    pub fn new(file_path: Option<&str>) -> Self {
        Self {
            scope: file_path
                .filter(|path| !path.is_empty())
                .map(str::to_string),
        }
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn template(&self) -> &'static str {
        if self.scope.is_some() {
            "DELETE FROM {table} WHERE file_path = :file_path"
        } else {
            "DELETE FROM {table}"
        }
    }

    pub fn render(&self, table_name: &str) -> String {
        self.template().replace("{table}", table_name)
    }
}

pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens an existing database; a missing file is a connection error.
    pub fn connect(&self) -> CleanResult<SqliteConnection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| CleanError::Connect {
            path: self.path.clone(),
            source,
        })?;
        Ok(SqliteConnection { conn })
    }
}

/// Only SQLite ships a connector; other relational engines are rejected.
pub fn open_store(settings: &Settings) -> CleanResult<SqliteStore> {
    match settings.db_type {
        DbType::Sqlite => Ok(SqliteStore::new(settings.resolved_sqlite_path())),
        other => Err(CleanError::UnsupportedBackend {
            db_type: other.as_str().to_string(),
        }),
    }
}

pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    pub fn delete_rows(&self, table_name: &str, query: &DeleteQuery) -> CleanResult<usize> {
        let to_error = |source| CleanError::Database {
            table: table_name.to_string(),
            source,
        };

        let sql = query.render(table_name);
        let mut statement = self.conn.prepare(&sql).map_err(to_error)?;
        let deleted = match query.scope() {
            Some(file_path) => statement.execute(named_params! { ":file_path": file_path }),
            None => statement.execute([]),
        }
        .map_err(to_error)?;

        Ok(deleted)
    }
}
