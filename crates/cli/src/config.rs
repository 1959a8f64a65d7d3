use anyhow::{Context, Result};
use nsdoc_index::ScanConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "nsdoc.toml";
const DEFAULT_CACHE_PATH: &str = ".nsdoc/index.json";
const DEFAULT_URL_TEMPLATE: &str = "/docs/{path}";

/// Project configuration read from `nsdoc.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Snapshot location
    #[serde(default = "default_cache")]
    pub cache: PathBuf,

    /// Link template; `{entry}` is the fully-qualified name, `{path}` the
    /// same name with `/` between segments
    #[serde(default = "default_url_template")]
    pub url_template: String,

    #[serde(default)]
    pub source_extension: Option<String>,

    #[serde(default)]
    pub doc_extension: Option<String>,

    /// Namespaces dropped after scanning
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default, rename = "namespace")]
    pub namespaces: Vec<NamespaceSource>,

    #[serde(default, rename = "root_file")]
    pub root_files: Vec<RootFile>,

    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceSource {
    pub name: String,
    pub directory: PathBuf,
    #[serde(default)]
    pub local: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootFile {
    pub path: PathBuf,
    #[serde(default)]
    pub local: bool,
}

/// Scan inputs recorded next to the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSources {
    pub exclude: Vec<String>,
    pub namespaces: Vec<NamespaceSource>,
    pub root_files: Vec<RootFile>,
}

fn default_cache() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_PATH)
}

fn default_url_template() -> String {
    DEFAULT_URL_TEMPLATE.to_string()
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config {}", path.display()))?;
        let mut config = Self::parse(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.scan_config().validate()?;
        Ok(config)
    }

    /// Resolves a config-relative path against the config file's directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.resolve(&self.cache)
    }

    /// Everything that decides what a scan registers, with paths resolved.
    /// A cache built from different sources must not be reused.
    pub fn sources(&self) -> ProjectSources {
        ProjectSources {
            exclude: self.exclude.clone(),
            namespaces: self
                .namespaces
                .iter()
                .map(|source| NamespaceSource {
                    directory: self.resolve(&source.directory),
                    ..source.clone()
                })
                .collect(),
            root_files: self
                .root_files
                .iter()
                .map(|file| RootFile {
                    path: self.resolve(&file.path),
                    local: file.local,
                })
                .collect(),
        }
    }

    pub fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::default();
        if let Some(ext) = &self.source_extension {
            config = config.with_source_extension(ext.clone());
        }
        if let Some(ext) = &self.doc_extension {
            config = config.with_doc_extension(ext.clone());
        }
        config
    }
}
