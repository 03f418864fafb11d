use anyhow::{Context, Result};
use mtrack_infrastructure::storage;
use mtrack_infrastructure::{LoadMode, ProfileUpgrader, UpgradeConfig};
use std::path::Path;

fn load_config(path: Option<&Path>) -> Result<UpgradeConfig> {
    match path {
        Some(path) => UpgradeConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(UpgradeConfig::load_default().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {}", e);
            UpgradeConfig::default()
        })),
    }
}

pub fn run(profile: &Path, scan: bool, output: Option<&Path>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let mode = if scan { LoadMode::Scan } else { LoadMode::Live };

    let mut record = storage::load_profile(profile)
        .with_context(|| format!("Failed to read {}", profile.display()))?;
    let report = ProfileUpgrader::new(&config)
        .upgrade(&mut record, mode)
        .with_context(|| format!("Failed to upgrade {}", profile.display()))?;

    let target = output.unwrap_or(profile);
    storage::save_profile(target, &record)
        .with_context(|| format!("Failed to write {}", target.display()))?;

    if report.migrated() {
        println!(
            "Upgraded {} from {} to {} ({} steps)",
            profile.display(),
            report.from,
            record.version(),
            report.applied.len()
        );
        for name in &report.applied {
            println!("  - {}", name);
        }
    } else {
        println!("{} is already at version {}", profile.display(), record.version());
    }
    if let Some(trigger) = report.new_session {
        println!("Started a new session ({:?})", trigger);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtrack_core::ProfileRecord;
    use tempfile::TempDir;

    #[test]
    fn test_upgrade_writes_output() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("old.json");
        let target = temp_dir.path().join("new.json");
        storage::save_profile(&source, &ProfileRecord::new()).unwrap();

        let config = temp_dir.path().join("config.toml");
        run(&source, true, Some(target.as_path()), Some(config.as_path())).unwrap();

        assert_eq!(storage::load_profile(&source).unwrap(), ProfileRecord::new());
        assert!(storage::load_profile(&target).unwrap().version().is_current());
    }

    #[test]
    fn test_bad_config_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("config.toml");
        std::fs::write(&config, "session_idle_secs = [").unwrap();
        assert!(load_config(Some(config.as_path())).is_err());
    }
}
