//! Profile files on disk.
//!
//! A profile is stored either as one JSON document, or split into a
//! directory holding the metadata tree and the grid list separately:
//!
//! ```text
//! <dir>/
//! ├── metadata.json   # Profile tree with grid placeholders
//! └── grids.json      # Grids, indexed by the placeholders
//! ```

use mtrack_core::error::Result;
use mtrack_core::maps::GridBundle;
use mtrack_core::{Grid, ProfileRecord};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

pub const METADATA_FILE: &str = "metadata.json";
pub const GRIDS_FILE: &str = "grids.json";

/// A JSON file replaced atomically on every save.
///
/// Saves go to a sibling temp file which is synced and renamed over the
/// target, so readers never observe a half-written document.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, or `None` if it does not exist or is blank.
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(data)?;

        let tmp_path = self.temp_path();
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        tracing::debug!("Saved {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// Reads a single-document profile. A missing file is an error.
pub fn load_profile(path: &Path) -> Result<ProfileRecord> {
    AtomicJsonFile::new(path).load()?.ok_or_else(|| {
        mtrack_core::ProfileError::io(format!("{} is missing or empty", path.display()))
    })
}

pub fn save_profile(path: &Path, record: &ProfileRecord) -> Result<()> {
    AtomicJsonFile::new(path).save(record)
}

/// Writes `record` split into [`METADATA_FILE`] and [`GRIDS_FILE`] under `dir`.
///
/// Returns the number of grids written.
pub fn save_split(dir: &Path, record: ProfileRecord) -> Result<usize> {
    let bundle = GridBundle::split(record);
    AtomicJsonFile::new(dir.join(METADATA_FILE)).save(&bundle.metadata)?;
    AtomicJsonFile::new(dir.join(GRIDS_FILE)).save(&bundle.grids)?;
    Ok(bundle.grids.len())
}

/// Reassembles a profile written by [`save_split`].
pub fn load_split(dir: &Path) -> Result<ProfileRecord> {
    let metadata = load_profile(&dir.join(METADATA_FILE))?;
    let grids: Vec<Grid> = AtomicJsonFile::new(dir.join(GRIDS_FILE))
        .load()?
        .unwrap_or_default();
    GridBundle { metadata, grids }.join()
}
