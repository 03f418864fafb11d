use anyhow::{Context, Result};
use mtrack_infrastructure::storage::{self, GRIDS_FILE, METADATA_FILE};
use std::path::Path;

pub fn split(profile: &Path, dir: &Path) -> Result<()> {
    let record = storage::load_profile(profile)
        .with_context(|| format!("Failed to read {}", profile.display()))?;
    let count = storage::save_split(dir, record)
        .with_context(|| format!("Failed to write {}", dir.display()))?;

    println!(
        "Wrote {} grids to {}, metadata to {}",
        count,
        dir.join(GRIDS_FILE).display(),
        dir.join(METADATA_FILE).display()
    );
    Ok(())
}

pub fn join(dir: &Path, output: &Path) -> Result<()> {
    let record = storage::load_split(dir)
        .with_context(|| format!("Failed to reassemble profile from {}", dir.display()))?;
    storage::save_profile(output, &record)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Joined profile written to {}", output.display());
    Ok(())
}
