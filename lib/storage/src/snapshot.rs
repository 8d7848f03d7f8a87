// Snapshot persistence for the case base
use anyhow::{anyhow, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tripcase_core::{CaseRecord, Ranges};

pub const SNAPSHOT_VERSION: u32 = 1;
pub const SNAPSHOT_FILE: &str = "cases.json";

/// Case base as stored on disk: the field ranges in effect and the cases in
/// case base order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBaseSnapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub ranges: Ranges,
    pub cases: Vec<CaseRecord>,
}

impl CaseBaseSnapshot {
    pub fn new(ranges: Ranges, cases: Vec<CaseRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            ranges,
            cases,
        }
    }
}

/// Reads and writes the snapshot file of a data directory
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        Ok(Self { path: data_dir.join(SNAPSHOT_FILE) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// `None` when no snapshot has been written yet
    pub fn load(&self) -> Result<Option<CaseBaseSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let data = fs::read(&self.path)
            .with_context(|| format!("failed to read snapshot {}", self.path.display()))?;
        let snapshot: CaseBaseSnapshot = serde_json::from_slice(&data)
            .with_context(|| format!("malformed snapshot {}", self.path.display()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(anyhow!(
                "unsupported snapshot version {} (expected {})",
                snapshot.version,
                SNAPSHOT_VERSION
            ));
        }
        Ok(Some(snapshot))
    }

    /// Replace the snapshot atomically
    pub fn save(&self, snapshot: &CaseBaseSnapshot) -> Result<()> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        AtomicFile::new(&self.path, AllowOverwrite)
            .write(|file| file.write_all(&data))
            .with_context(|| format!("failed to write snapshot {}", self.path.display()))?;
        Ok(())
    }
}
