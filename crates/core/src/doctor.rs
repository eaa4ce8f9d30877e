use std::env;

use serde::{Deserialize, Serialize};

use crate::context::CleanContext;
use crate::discover::resolve_output_root;
use crate::settings::DbType;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorInfo {
    pub os: String,
    pub arch: String,
    pub current_dir: Option<String>,
    pub settings_path: Option<String>,
    pub output_root: String,
    pub output_root_exists: bool,
    pub config_directory: String,
    pub db_type: DbType,
    pub sqlite_path: Option<String>,
    pub local_checkout: bool,
    pub do_not_clean: bool,
    pub notes: Vec<String>,
}

pub fn collect_doctor_info(context: &CleanContext) -> DoctorInfo {
    let settings = &context.settings;
    let current_dir = env::current_dir()
        .ok()
        .map(|path| path.to_string_lossy().to_string());
    let output_root = resolve_output_root(settings).unwrap_or_else(|_| settings.output_root());
    let local_checkout = context.is_local_checkout();

    let mut notes = Vec::new();
    if !output_root.is_dir() {
        notes.push("Output directory does not exist yet; nothing to clean.".to_string());
    }
    if local_checkout {
        notes.push(
            "Local source checkout detected; full cleans keep auxiliary databases.".to_string(),
        );
    }
    let sqlite_path = settings.db_type.is_relational().then(|| {
        let path = settings.resolved_sqlite_path();
        if !path.is_file() {
            notes.push(format!(
                "SQLite database {} not found; record cleanup will fail.",
                path.display()
            ));
        }
        path.to_string_lossy().to_string()
    });
    if context.flags.do_not_clean {
        notes.push("do_not_clean is set; cleanup runs are no-ops.".to_string());
    }

    DoctorInfo {
        os: env::consts::OS.to_string(),
        arch: env::consts::ARCH.to_string(),
        current_dir,
        settings_path: context
            .settings_path
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
        output_root_exists: output_root.is_dir(),
        output_root: output_root.to_string_lossy().to_string(),
        config_directory: settings.config_directory.to_string_lossy().to_string(),
        db_type: settings.db_type,
        sqlite_path,
        local_checkout,
        do_not_clean: context.flags.do_not_clean,
        notes,
    }
}
