//! # nsdoc index
//!
//! Hierarchical index of code namespaces discovered on disk.
//!
//! ## Pipeline
//!
//! ```text
//! Directories / root files
//!     │
//!     ├──> DirectoryScanner
//!     │      └─> NamespaceTree (entries + doc files per namespace)
//!     │
//!     ├──> sort / delete / lookups
//!     │
//!     ├──> save / load (JSON snapshot)
//!     │
//!     └──> build_menu
//!            └─> MenuSink (submenus first, then entries)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use nsdoc_index::{ActiveSelection, Menu, NamespaceIndex, ScanConfig};
//!
//! fn main() -> nsdoc_index::Result<()> {
//!     let mut index = NamespaceIndex::new(ScanConfig::default())?;
//!     index.scan_directory("App", "src/App", true);
//!     index.sort();
//!
//!     let active = ActiveSelection::new("User", "App\\Models");
//!     let resolver = |entry: &str| format!("/docs?c={entry}");
//!     let menu: Menu = index.build_menu(&active, &resolver);
//!     println!("{} top-level items", menu.items.len());
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod menu;
mod node;
mod persistence;
mod scanner;
mod stats;
mod tree;

pub use config::ScanConfig;
pub use error::{IndexError, Result};
pub use menu::{build_menu, ActiveSelection, Menu, MenuContext, MenuItem, MenuSink, UrlResolver};
pub use node::{NamespaceNode, NodeId};
pub use persistence::{read_snapshot, write_snapshot, Snapshot, SNAPSHOT_SCHEMA_VERSION};
pub use scanner::{DirectoryScanner, ScanStats};
pub use stats::IndexStats;
pub use tree::{NamespaceTree, NamespaceView};

use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// A namespace tree together with the configuration used to build it.
///
/// This is the session object callers hold for the lifetime of a build or
/// request; there is no global state.
#[derive(Debug, Clone, Default)]
pub struct NamespaceIndex {
    config: ScanConfig,
    tree: NamespaceTree,
}

impl NamespaceIndex {
    pub fn new(config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let tree = NamespaceTree::new(config.separator);
        Ok(Self { config, tree })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NamespaceTree {
        &mut self.tree
    }

    pub fn find_or_create(&mut self, path: &str) -> NodeId {
        self.tree.find_or_create(path)
    }

    pub fn register_entry(&mut self, name: &str, source: impl Into<PathBuf>) -> NodeId {
        self.tree.register_entry(name, source)
    }

    pub fn scan_directory(
        &mut self,
        namespace: &str,
        directory: impl AsRef<Path>,
        local: bool,
    ) -> ScanStats {
        DirectoryScanner::new(&self.config).scan_directory(
            &mut self.tree,
            namespace,
            directory,
            local,
        )
    }

    pub fn register_root_entry(&mut self, filename: &str, local: bool) -> bool {
        DirectoryScanner::new(&self.config).register_root_entry(&mut self.tree, filename, local)
    }

    pub fn find_node(&self, path: &str) -> Option<NamespaceView<'_>> {
        self.tree.find_node(path).and_then(|id| self.tree.view(id))
    }

    pub fn has_entry(&self, name: &str) -> bool {
        self.tree.has_entry(name)
    }

    /// Source file -> fully-qualified name for everything at or below `from`
    /// (the root when `None`).
    pub fn collect_all_entries(&self, from: Option<NodeId>) -> IndexMap<PathBuf, String> {
        self.tree
            .collect_all_entries(from.unwrap_or_else(|| self.tree.root()))
    }

    pub fn collect_all_doc_files(&self, from: Option<NodeId>) -> Vec<PathBuf> {
        self.tree
            .collect_all_doc_files(from.unwrap_or_else(|| self.tree.root()))
    }

    pub fn sort(&mut self) {
        let root = self.tree.root();
        self.tree.sort(root);
    }

    pub fn delete_namespace(&mut self, path: &str) -> bool {
        self.tree.delete_namespace(path)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats::from_tree(&self.tree)
    }

    pub fn try_save(&self, path: impl AsRef<Path>) -> Result<u64> {
        write_snapshot(path.as_ref(), &self.tree, &self.config)
    }

    /// Persists the whole tree; `false` (with a warning) on any failure.
    pub fn save(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_save(path) {
            Ok(written) => written > 0,
            Err(err) => {
                log::warn!("Failed to save namespace index to {}: {err}", path.display());
                false
            }
        }
    }

    /// Replaces the tree with the snapshot at `path`. The snapshot must have
    /// been built with the same configuration; on any error the current tree
    /// is left untouched.
    pub fn try_load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = read_snapshot(path.as_ref())?;
        if snapshot.config != self.config {
            return Err(IndexError::InvalidSnapshot(
                "snapshot was built with a different scan config".to_string(),
            ));
        }
        self.tree = snapshot.tree;
        Ok(())
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_load(path) {
            Ok(()) => true,
            Err(IndexError::IoError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No namespace index at {}", path.display());
                false
            }
            Err(err) => {
                log::warn!("Failed to load namespace index from {}: {err}", path.display());
                false
            }
        }
    }

    /// Projects the tree into a menu. Call [`NamespaceIndex::sort`] first for
    /// alphabetical output.
    pub fn build_menu<M: MenuSink>(
        &self,
        active: &ActiveSelection,
        resolver: &dyn UrlResolver,
    ) -> M {
        let ctx = MenuContext {
            active,
            resolver,
            soft_break: &self.config.soft_break,
        };
        build_menu(&self.tree, &ctx)
    }
}
