//! Sidecar record of the scan inputs a cache was built from.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ProjectSources;

const SOURCES_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SourcesRecord {
    schema_version: u32,
    sources: ProjectSources,
}

/// `.nsdoc/index.json` keeps its sources in `.nsdoc/index.json.sources`
pub fn sources_path(cache: &Path) -> PathBuf {
    let mut name = cache.as_os_str().to_os_string();
    name.push(".sources");
    PathBuf::from(name)
}

pub fn write_sources(cache: &Path, sources: &ProjectSources) -> Result<()> {
    let path = sources_path(cache);
    let record = SourcesRecord {
        schema_version: SOURCES_SCHEMA_VERSION,
        sources: sources.clone(),
    };
    let bytes = serde_json::to_vec_pretty(&record)?;
    std::fs::write(&path, bytes)
        .with_context(|| format!("Cannot write {}", path.display()))?;
    Ok(())
}

/// True only when a readable record exists and names exactly `sources`.
pub fn sources_match(cache: &Path, sources: &ProjectSources) -> bool {
    let path = sources_path(cache);
    let record = match read_record(&path) {
        Ok(record) => record,
        Err(err) => {
            log::debug!("No usable sources record at {}: {err}", path.display());
            return false;
        }
    };
    record.schema_version == SOURCES_SCHEMA_VERSION && &record.sources == sources
}

fn read_record(path: &Path) -> Result<SourcesRecord> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}
