pub mod clean;
pub mod context;
pub mod database;
pub mod discover;
pub mod doctor;
pub mod error;
pub mod model;
pub mod settings;

pub use clean::{plan_clean, run_clean};
pub use context::{detect_local_checkout, CleanContext, RuntimeFlags};
pub use database::{
    excluded_tables, open_store, targeted_tables, DeleteQuery, Retention, SqliteConnection,
    SqliteStore, Table, TableDescriptor, TABLES,
};
pub use discover::{
    delete_file, discover_candidate_files, discover_database_files, resolve_output_root,
    MARKER_FILES,
};
pub use doctor::{collect_doctor_info, DoctorInfo};
pub use error::{CleanError, CleanResult};
pub use model::{CleanMode, CleanOptions, CleanPlan, CleanReport, TableCleanup, REPORT_VERSION};
pub use settings::{load_settings, DbType, DefaultFiles, Settings};
