use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use crate::context::CleanContext;
use crate::database::{excluded_tables, open_store, targeted_tables, DeleteQuery};
use crate::discover::{
    delete_file, discover_candidate_files, discover_database_files, resolve_output_root,
};
use crate::error::CleanResult;
use crate::model::{CleanMode, CleanOptions, CleanPlan, CleanReport, TableCleanup, REPORT_VERSION};

pub fn run_clean(context: &mut CleanContext, options: &CleanOptions) -> CleanResult<CleanReport> {
    let query = DeleteQuery::new(options.file_path.as_deref());
    let mut report = new_report(context, options, &query);

    if context.flags.do_not_clean {
        info!("cleanup suppressed by do_not_clean flag");
        report.skipped = true;
        return Ok(report);
    }

    let full_purge = options.clean_all && !context.is_local_checkout();

    {
        let settings = &context.settings;
        for path in collect_targets(context, options.clean_all, full_purge)? {
            let shown = path.to_string_lossy().to_string();
            if delete_file(&path)? {
                info!("Deleted: {shown}");
                report.deleted_files.push(shown);
            } else {
                info!("Already absent: {shown}");
                report.missing_files.push(shown);
            }
        }

        if settings.db_type.is_relational() {
            let connection = open_store(settings)?.connect()?;
            for table in targeted_tables(options.clean_all) {
                let table_name = table.physical_name(&settings.table_prefix);
                let deleted = connection.delete_rows(&table_name, &query)?;
                info!(
                    "Cleaned the data related to {:?} from the {} table ({} row(s)).",
                    query.scope(),
                    table_name,
                    deleted
                );
                report.cleaned_tables.push(TableCleanup {
                    table,
                    table_name,
                    deleted_rows: deleted as u64,
                });
            }
        }
    }

    if full_purge {
        context.reload_settings()?;
        info!("Reloaded configuration.");
        report.config_reloaded = true;
    }

    Ok(report)
}

pub fn plan_clean(context: &CleanContext, options: &CleanOptions) -> CleanResult<CleanPlan> {
    let settings = &context.settings;
    let query = DeleteQuery::new(options.file_path.as_deref());
    let local_checkout = context.is_local_checkout();
    let full_purge = options.clean_all && !local_checkout;

    let candidate_files = discover_candidate_files(settings, options.clean_all)?;
    let database_files = if full_purge {
        discover_database_files(settings)
    } else {
        Vec::new()
    };
    let targeted = if settings.db_type.is_relational() {
        targeted_tables(options.clean_all)
            .into_iter()
            .map(|table| table.physical_name(&settings.table_prefix))
            .collect()
    } else {
        Vec::new()
    };

    Ok(CleanPlan {
        mode: CleanMode::from_clean_all(options.clean_all),
        file_path: query.scope().map(str::to_string),
        db_type: settings.db_type,
        local_checkout,
        do_not_clean: context.flags.do_not_clean,
        output_root: resolve_output_root(settings)?
            .to_string_lossy()
            .to_string(),
        candidate_files: to_strings(candidate_files),
        database_files: to_strings(database_files),
        excluded_tables: excluded_tables(options.clean_all),
        targeted_tables: targeted,
        query_template: query.template().to_string(),
        reload_config: full_purge,
    })
}

fn collect_targets(
    context: &CleanContext,
    clean_all: bool,
    full_purge: bool,
) -> CleanResult<Vec<PathBuf>> {
    let mut to_delete = discover_candidate_files(&context.settings, clean_all)?;
    if full_purge {
        to_delete.extend(discover_database_files(&context.settings));
    }
    Ok(to_delete)
}

fn new_report(
    context: &CleanContext,
    options: &CleanOptions,
    query: &DeleteQuery,
) -> CleanReport {
    CleanReport {
        report_version: REPORT_VERSION.to_string(),
        run_id: Uuid::new_v4().to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        mode: CleanMode::from_clean_all(options.clean_all),
        file_path: query.scope().map(str::to_string),
        db_type: context.settings.db_type,
        skipped: false,
        deleted_files: Vec::new(),
        missing_files: Vec::new(),
        excluded_tables: excluded_tables(options.clean_all),
        cleaned_tables: Vec::new(),
        config_reloaded: false,
    }
}

fn to_strings(paths: Vec<PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|path| path.to_string_lossy().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use super::{plan_clean, run_clean};
    use crate::context::{CleanContext, RuntimeFlags};
    use crate::database::Table;
    use crate::error::CleanError;
    use crate::model::CleanOptions;
    use crate::settings::{DbType, Settings};

    const AUXILIARY: [&str; 5] = [
        "dir_structure.json",
        "iana-domains-db.json",
        "public-suffix.json",
        "inactive_db.json",
        "mining.json",
    ];

    fn seed_output(root: &Path) {
        fs::create_dir_all(root.join("output/logs")).expect("logs dir");
        fs::write(root.join("output/a.txt"), b"a").expect("a.txt");
        fs::write(root.join("output/.gitignore"), b"*").expect(".gitignore");
        fs::write(root.join("output/logs/run.log"), b"log").expect("run.log");
        fs::write(root.join("output/logs/.keep"), b"").expect(".keep");
    }

    fn seed_auxiliary(config: &Path) {
        fs::create_dir_all(config).expect("config dir");
        for name in AUXILIARY {
            fs::write(config.join(name), b"{}").expect("auxiliary file");
        }
    }

    fn context_for(root: &Path, db_type: DbType, local_checkout: bool) -> CleanContext {
        let settings = Settings {
            output_directory: root.to_path_buf(),
            config_directory: root.join("config"),
            db_type,
            local_checkout: Some(local_checkout),
            ..Settings::default()
        };
        CleanContext::new(settings, root)
    }

    fn seed_database(path: &Path) {
        let conn = Connection::open(path).expect("create db");
        for table in ["auto_continue", "inactive", "mining", "tested", "whois"] {
            conn.execute_batch(&format!(
                "CREATE TABLE checker_{table} (subject TEXT, file_path TEXT);
                 INSERT INTO checker_{table} VALUES ('a.com', 'one.txt'), ('b.com', 'two.txt');"
            ))
            .expect("seed table");
        }
    }

    fn row_count(path: &Path, table: &str) -> i64 {
        let conn = Connection::open(path).expect("open db");
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count rows")
    }

    #[derive(Clone)]
    struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CaptureWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("log buffer").extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_deleted_file_is_logged_by_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        seed_auxiliary(&dir.path().join("config"));
        let mut context = context_for(dir.path(), DbType::Json, false);

        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || CaptureWriter(writer.clone()))
            .with_ansi(false)
            .finish();

        let options = CleanOptions {
            clean_all: true,
            file_path: None,
        };
        let report = tracing::subscriber::with_default(subscriber, || {
            run_clean(&mut context, &options)
        })
        .expect("clean");

        let logs = String::from_utf8(buffer.lock().expect("log buffer").clone()).expect("utf8");
        assert!(!report.deleted_files.is_empty());
        for path in &report.deleted_files {
            assert!(logs.contains(&format!("Deleted: {path}")), "{path} not logged");
        }
        assert!(logs.contains("Reloaded configuration."));
    }

    #[test]
    fn do_not_clean_touches_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        seed_auxiliary(&dir.path().join("config"));
        let mut context = context_for(dir.path(), DbType::Json, false).with_flags(RuntimeFlags {
            do_not_clean: true,
        });

        let options = CleanOptions {
            clean_all: true,
            file_path: None,
        };
        let report = run_clean(&mut context, &options).expect("clean");

        assert!(report.skipped);
        assert!(report.deleted_files.is_empty());
        assert!(!report.config_reloaded);
        assert!(dir.path().join("output/a.txt").exists());
        assert!(dir.path().join("output/logs/run.log").exists());
        for name in AUXILIARY {
            assert!(dir.path().join("config").join(name).exists());
        }
    }

    #[test]
    fn full_clean_on_install_drops_auxiliary_json_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        seed_auxiliary(&dir.path().join("config"));
        let mut context = context_for(dir.path(), DbType::Json, false);

        let options = CleanOptions {
            clean_all: true,
            file_path: None,
        };
        let report = run_clean(&mut context, &options).expect("clean");

        for name in AUXILIARY {
            assert!(!dir.path().join("config").join(name).exists(), "{name} kept");
        }
        assert_eq!(report.deleted_files.len(), 2 + AUXILIARY.len());
        assert!(report.config_reloaded);
        assert!(report.cleaned_tables.is_empty());
    }

    #[test]
    fn full_clean_in_local_checkout_keeps_auxiliary_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        seed_auxiliary(&dir.path().join("config"));
        let mut context = context_for(dir.path(), DbType::Json, true);

        let options = CleanOptions {
            clean_all: true,
            file_path: None,
        };
        let report = run_clean(&mut context, &options).expect("clean");

        for name in AUXILIARY {
            assert!(dir.path().join("config").join(name).exists());
        }
        assert!(!report.config_reloaded);
        assert!(!dir.path().join("output/logs/run.log").exists());
    }

    #[test]
    fn missing_auxiliary_files_are_reported_not_failed() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        let mut context = context_for(dir.path(), DbType::Json, false);

        let options = CleanOptions {
            clean_all: true,
            file_path: None,
        };
        let report = run_clean(&mut context, &options).expect("clean");
        assert_eq!(report.missing_files.len(), AUXILIARY.len());
    }

    #[test]
    fn partial_clean_only_empties_unretained_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        fs::create_dir_all(dir.path().join("config")).expect("config dir");
        let db_path = dir.path().join("config/records.sqlite");
        seed_database(&db_path);
        let mut context = context_for(dir.path(), DbType::Sqlite, false);

        let report = run_clean(&mut context, &CleanOptions::default()).expect("clean");

        assert_eq!(report.cleaned_tables.len(), 1);
        assert_eq!(report.cleaned_tables[0].table, Table::Tested);
        assert_eq!(report.cleaned_tables[0].deleted_rows, 2);
        assert_eq!(row_count(&db_path, "checker_tested"), 0);
        for table in ["auto_continue", "inactive", "mining", "whois"] {
            assert_eq!(row_count(&db_path, &format!("checker_{table}")), 2);
        }
    }

    #[test]
    fn scoped_full_clean_keeps_other_files_rows_and_whois() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        fs::create_dir_all(dir.path().join("config")).expect("config dir");
        let db_path = dir.path().join("config/records.sqlite");
        seed_database(&db_path);
        let mut context = context_for(dir.path(), DbType::Sqlite, false);

        let options = CleanOptions {
            clean_all: true,
            file_path: Some("one.txt".to_string()),
        };
        let report = run_clean(&mut context, &options).expect("clean");

        assert_eq!(report.cleaned_tables.len(), 4);
        assert!(report.cleaned_tables.iter().all(|entry| entry.deleted_rows == 1));
        for table in ["auto_continue", "inactive", "mining", "tested"] {
            assert_eq!(row_count(&db_path, &format!("checker_{table}")), 1);
        }
        assert_eq!(row_count(&db_path, "checker_whois"), 2);
        assert!(report.missing_files.is_empty());
        assert!(report.config_reloaded);
    }

    #[test]
    fn relational_backend_without_connector_fails_after_file_cleanup() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        let mut context = context_for(dir.path(), DbType::MySql, false);

        let err = run_clean(&mut context, &CleanOptions::default()).expect_err("no connector");
        assert!(matches!(err, CleanError::UnsupportedBackend { .. }));
        assert!(!dir.path().join("output/a.txt").exists());
    }

    #[test]
    fn plan_reports_without_deleting() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed_output(dir.path());
        let context = context_for(dir.path(), DbType::Sqlite, false);

        let options = CleanOptions {
            clean_all: false,
            file_path: Some("hosts.txt".to_string()),
        };
        let plan = plan_clean(&context, &options).expect("plan");

        assert_eq!(plan.candidate_files.len(), 1);
        assert!(plan.candidate_files[0].ends_with("a.txt"));
        assert!(plan.database_files.is_empty());
        assert_eq!(plan.targeted_tables, vec!["checker_tested".to_string()]);
        assert!(plan.query_template.contains("WHERE file_path = :file_path"));
        assert!(!plan.reload_config);
        assert!(dir.path().join("output/a.txt").exists());
    }
}
