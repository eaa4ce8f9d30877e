// Changes the process working directory, so it lives in its own test binary.
use std::env;
use std::fs;

use anyhow::Result;
use output_cleaner_core::{
    discover_candidate_files, plan_clean, CleanContext, CleanOptions, Settings,
};

#[test]
fn default_relative_root_yields_absolute_paths() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("output");
    fs::create_dir_all(output.join("logs"))?;
    fs::write(output.join("a.txt"), "a.com\n")?;
    fs::write(output.join("logs/run.log"), "started\n")?;
    env::set_current_dir(dir.path())?;

    let settings = Settings {
        local_checkout: Some(false),
        ..Settings::default()
    };
    let files = discover_candidate_files(&settings, true)?;

    assert_eq!(files.len(), 2);
    for file in &files {
        assert!(file.is_absolute(), "{} is relative", file.display());
        assert!(!file.to_string_lossy().contains("/./"));
    }

    let plan = plan_clean(&CleanContext::new(settings, dir.path()), &CleanOptions::default())?;
    assert_eq!(plan.candidate_files.len(), 1);
    assert!(plan.output_root.ends_with("output"));
    Ok(())
}
