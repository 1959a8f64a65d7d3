use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Configuration for scanning directories into a namespace tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Extension (without the dot) of files registered as entries
    pub source_extension: String,

    /// Extension (without the dot) of files collected as documentation
    pub doc_extension: String,

    /// Namespace separator used in paths and fully-qualified names
    pub separator: char,

    /// Marker inserted before each separator in entry labels so long names can wrap
    pub soft_break: String,

    /// Maximum directory depth followed by a single scan
    pub max_depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            source_extension: "php".to_string(),
            doc_extension: "md".to_string(),
            separator: '\\',
            soft_break: "\u{200B}".to_string(),
            max_depth: 64,
        }
    }
}

impl ScanConfig {
    /// Override the source-file extension
    pub fn with_source_extension(mut self, extension: impl Into<String>) -> Self {
        self.source_extension = extension.into();
        self
    }

    /// Override the documentation extension
    pub fn with_doc_extension(mut self, extension: impl Into<String>) -> Self {
        self.doc_extension = extension.into();
        self
    }

    /// Suffix (with leading dot) identifying source files
    pub fn source_suffix(&self) -> String {
        format!(".{}", self.source_extension)
    }

    /// Suffix (with leading dot) identifying documentation files
    pub fn doc_suffix(&self) -> String {
        format!(".{}", self.doc_extension)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        for (label, extension) in [
            ("source_extension", &self.source_extension),
            ("doc_extension", &self.doc_extension),
        ] {
            if extension.is_empty() {
                return Err(IndexError::InvalidConfig(format!("{label} must not be empty")));
            }
            if extension.contains('.') || extension.contains('/') {
                return Err(IndexError::InvalidConfig(format!(
                    "{label} must be a bare extension, got {extension:?}"
                )));
            }
        }

        if self.source_extension == self.doc_extension {
            return Err(IndexError::InvalidConfig(
                "source_extension and doc_extension must differ".to_string(),
            ));
        }

        if self.soft_break.contains(self.separator) {
            return Err(IndexError::InvalidConfig(
                "soft_break must not contain the separator".to_string(),
            ));
        }

        if self.max_depth == 0 {
            return Err(IndexError::InvalidConfig("max_depth must be > 0".to_string()));
        }

        Ok(())
    }
}
