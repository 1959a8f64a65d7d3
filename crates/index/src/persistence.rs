use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::ScanConfig;
use crate::error::{IndexError, Result};
use crate::tree::NamespaceTree;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
struct PersistedSnapshotRef<'a> {
    schema_version: u32,
    config: &'a ScanConfig,
    tree: &'a NamespaceTree,
}

#[derive(Debug, Deserialize)]
struct PersistedSnapshot {
    schema_version: u32,
    config: ScanConfig,
    tree: NamespaceTree,
}

/// Whole-tree snapshot restored from disk
#[derive(Debug)]
pub struct Snapshot {
    pub config: ScanConfig,
    pub tree: NamespaceTree,
}

/// Writes the tree atomically (temp file + rename). Returns the number of
/// bytes written.
pub fn write_snapshot(path: &Path, tree: &NamespaceTree, config: &ScanConfig) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let persisted = PersistedSnapshotRef {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        config,
        tree,
    };
    let bytes = serde_json::to_vec(&persisted)?;
    if bytes.is_empty() {
        return Err(IndexError::EmptySnapshot);
    }

    let tmp = temp_path_for(path);
    std::fs::write(&tmp, &bytes)?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err.into());
    }

    log::info!(
        "Saved namespace index to {} ({} nodes, {} bytes)",
        path.display(),
        tree.len(),
        bytes.len()
    );
    Ok(bytes.len() as u64)
}

/// Reads and validates a snapshot written by [`write_snapshot`].
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = std::fs::read(path)?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(IndexError::EmptySnapshot);
    }

    let persisted: PersistedSnapshot = serde_json::from_slice(&bytes)?;
    if persisted.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(IndexError::UnsupportedSchema {
            found: persisted.schema_version,
            expected: SNAPSHOT_SCHEMA_VERSION,
        });
    }
    if !persisted.tree.is_consistent() {
        return Err(IndexError::InvalidSnapshot(format!(
            "{} does not describe a well-formed tree",
            path.display()
        )));
    }
    if persisted.tree.separator() != persisted.config.separator {
        return Err(IndexError::InvalidSnapshot(
            "tree separator does not match its config".to_string(),
        ));
    }

    log::info!(
        "Loaded namespace index from {} ({} nodes)",
        path.display(),
        persisted.tree.len()
    );
    Ok(Snapshot {
        config: persisted.config,
        tree: persisted.tree,
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
