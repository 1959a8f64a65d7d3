use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Handle of a node inside a [`crate::NamespaceTree`] arena.
///
/// Handles are only meaningful for the tree that produced them and become
/// stale once the node's namespace is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const ROOT: NodeId = NodeId(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One level of the namespace hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamespaceNode {
    /// Name of this level relative to its parent (empty for the root)
    pub(crate) segment: String,

    /// Parent handle, used only to rebuild the full path
    pub(crate) parent: Option<NodeId>,

    /// Child namespaces keyed by unqualified segment
    pub(crate) children: IndexMap<String, NodeId>,

    /// Fully-qualified entry name -> defining source file
    pub(crate) entries: IndexMap<String, PathBuf>,

    /// Documentation files that live directly at this level
    pub(crate) doc_files: IndexSet<PathBuf>,

    /// True when populated from a local (editable) source
    pub(crate) local_origin: bool,
}

impl NamespaceNode {
    pub(crate) fn child_of(parent: NodeId, segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            parent: Some(parent),
            ..Default::default()
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Child namespaces in their current order
    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> + '_ {
        self.children.iter().map(|(segment, id)| (segment.as_str(), *id))
    }

    pub fn child(&self, segment: &str) -> Option<NodeId> {
        self.children.get(segment).copied()
    }

    /// Entries defined directly at this level, keyed by fully-qualified name
    pub fn entries(&self) -> &IndexMap<String, PathBuf> {
        &self.entries
    }

    pub fn doc_files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.doc_files.iter().map(PathBuf::as_path)
    }

    pub fn is_local_origin(&self) -> bool {
        self.local_origin
    }
}
