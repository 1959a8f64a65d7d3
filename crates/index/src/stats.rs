use serde::{Deserialize, Serialize};

use crate::tree::NamespaceTree;

/// Aggregate counts over a namespace tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Namespaces below the root
    pub namespaces: usize,

    /// Registered entries, root entries included
    pub entries: usize,

    /// Documentation files across all namespaces
    pub doc_files: usize,

    /// Namespaces (root included) populated from a local source
    pub local_namespaces: usize,
}

impl IndexStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tree(tree: &NamespaceTree) -> Self {
        let mut stats = Self::new();
        for (_, node) in tree.iter() {
            if !node.is_root() {
                stats.namespaces += 1;
            }
            stats.entries += node.entries().len();
            stats.doc_files += node.doc_files().count();
            if node.is_local_origin() {
                stats.local_namespaces += 1;
            }
        }
        stats
    }
}
