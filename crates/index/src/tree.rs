//! Arena-backed namespace tree.
//!
//! Every node lives in a single `Vec` slot and refers to its children and
//! parent through [`NodeId`] handles. The parent handle is only walked upward
//! to rebuild full paths; ownership flows strictly from parent to child through
//! the `children` map, so deleting a namespace is just dropping that edge and
//! releasing the slots of the detached subtree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};

use crate::node::{NamespaceNode, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceTree {
    separator: char,
    nodes: Vec<Option<NamespaceNode>>,
    free: Vec<NodeId>,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new('\\')
    }
}

impl NamespaceTree {
    pub fn new(separator: char) -> Self {
        Self {
            separator,
            nodes: vec![Some(NamespaceNode::default())],
            free: Vec::new(),
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    pub fn get(&self, id: NodeId) -> Option<&NamespaceNode> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut NamespaceNode> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Number of live nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|slot| slot.is_some()).count()
    }

    /// True when the tree holds nothing but an empty root
    pub fn is_empty(&self) -> bool {
        let root = &self[self.root()];
        self.len() == 1 && root.children.is_empty() && root.entries.is_empty()
    }

    /// Live nodes in arena order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NamespaceNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|node| (NodeId::new(idx), node)))
    }

    /// Non-empty segments of a namespace path. Leading, trailing and doubled
    /// separators are dropped.
    pub fn segments<'p>(&self, path: &'p str) -> impl Iterator<Item = &'p str> + 'p {
        path.split(self.separator).filter(|segment| !segment.is_empty())
    }

    /// Canonical form of a namespace path or fully-qualified name
    pub fn normalize(&self, path: &str) -> String {
        let mut out = String::with_capacity(path.len());
        for segment in self.segments(path) {
            if !out.is_empty() {
                out.push(self.separator);
            }
            out.push_str(segment);
        }
        out
    }

    fn allocate(&mut self, node: NamespaceNode) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id.index()] = Some(node);
            return id;
        }
        self.nodes.push(Some(node));
        NodeId::new(self.nodes.len() - 1)
    }

    /// Walks `path` from the root, creating every missing level, and returns
    /// the terminal node. The empty path resolves to the root.
    pub fn find_or_create(&mut self, path: &str) -> NodeId {
        let mut current = self.root();
        let segments: Vec<&str> = self.segments(path).collect();
        for segment in segments {
            current = match self[current].child(segment) {
                Some(child) => child,
                None => {
                    let child = self.allocate(NamespaceNode::child_of(current, segment));
                    if let Some(parent) = self.get_mut(current) {
                        parent.children.insert(segment.to_string(), child);
                    }
                    child
                }
            };
        }
        current
    }

    /// Read-only walk from the root; `None` as soon as a level is missing.
    pub fn find_node(&self, path: &str) -> Option<NodeId> {
        let mut current = self.root();
        for segment in self.segments(path) {
            current = self.get(current)?.child(segment)?;
        }
        Some(current)
    }

    /// Full namespace path of `id`, built by walking parent handles
    pub fn full_path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = self.get(id);
        while let Some(node) = current {
            if node.is_root() {
                break;
            }
            segments.push(node.segment.as_str());
            current = node.parent.and_then(|parent| self.get(parent));
        }
        segments.reverse();
        segments.join(&self.separator.to_string())
    }

    /// Splits a fully-qualified name into `(namespace, name)`.
    pub fn split_name<'n>(&self, name: &'n str) -> (&'n str, &'n str) {
        let trimmed = name.trim_matches(self.separator);
        match trimmed.rfind(self.separator) {
            Some(pos) => (&trimmed[..pos], &trimmed[pos + self.separator.len_utf8()..]),
            None => ("", trimmed),
        }
    }

    /// Stores `source` under the fully-qualified `name` in the node owning its
    /// namespace prefix. Returns that node.
    pub fn register_entry(&mut self, name: &str, source: impl Into<PathBuf>) -> NodeId {
        let key = self.normalize(name);
        let (namespace, _) = self.split_name(&key);
        let namespace = namespace.to_string();
        let id = self.find_or_create(&namespace);
        self[id].entries.insert(key, source.into());
        id
    }

    /// Fail-closed lookup of a fully-qualified entry name
    pub fn has_entry(&self, name: &str) -> bool {
        let key = self.normalize(name);
        let (namespace, _) = self.split_name(&key);
        self.find_node(namespace)
            .and_then(|id| self.get(id))
            .is_some_and(|node| node.entries.contains_key(&key))
    }

    pub(crate) fn add_doc_file(&mut self, id: NodeId, path: PathBuf) -> bool {
        self.get_mut(id)
            .is_some_and(|node| node.doc_files.insert(path))
    }

    pub(crate) fn set_local_origin(&mut self, id: NodeId, local: bool) {
        if let Some(node) = self.get_mut(id) {
            node.local_origin = local;
        }
    }

    /// Resolves `path` (creating missing levels, like every other mutating
    /// operation) and detaches it from its parent. The root cannot be deleted.
    pub fn delete_namespace(&mut self, path: &str) -> bool {
        let id = self.find_or_create(path);
        let Some(node) = self.get(id) else {
            return false;
        };
        let Some(parent) = node.parent else {
            log::debug!("Refusing to delete the root namespace");
            return false;
        };
        let segment = node.segment.clone();
        if let Some(parent) = self.get_mut(parent) {
            parent.children.shift_remove(&segment);
        }
        self.release(id);
        true
    }

    fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if let Some(node) = self.nodes.get_mut(id.index()).and_then(Option::take) {
                pending.extend(node.children.values().copied());
                self.free.push(id);
            }
        }
    }

    /// Every entry at or below `from`, keyed by source file. Colliding source
    /// paths keep the last name visited (children first, then the node itself).
    pub fn collect_all_entries(&self, from: NodeId) -> IndexMap<PathBuf, String> {
        let mut out = IndexMap::new();
        self.collect_entries_into(from, &mut out);
        out
    }

    fn collect_entries_into(&self, id: NodeId, out: &mut IndexMap<PathBuf, String>) {
        let Some(node) = self.get(id) else {
            return;
        };
        for (_, child) in node.children() {
            self.collect_entries_into(child, out);
        }
        for (name, path) in &node.entries {
            out.insert(path.clone(), name.clone());
        }
    }

    /// Documentation files at or below `from`: the node's own files first,
    /// then each child's in child order.
    pub fn collect_all_doc_files(&self, from: NodeId) -> Vec<PathBuf> {
        let mut out = Vec::new();
        self.collect_doc_files_into(from, &mut out);
        out
    }

    fn collect_doc_files_into(&self, id: NodeId, out: &mut Vec<PathBuf>) {
        let Some(node) = self.get(id) else {
            return;
        };
        out.extend(node.doc_files.iter().cloned());
        for (_, child) in node.children() {
            self.collect_doc_files_into(child, out);
        }
    }

    /// True if `id` or any descendant holds at least one entry
    pub fn subtree_has_entries(&self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        !node.entries.is_empty()
            || node
                .children()
                .any(|(_, child)| self.subtree_has_entries(child))
    }

    /// Recursively orders children and entries by case-insensitive key.
    pub fn sort(&mut self, from: NodeId) {
        let children: Vec<NodeId> = match self.get_mut(from) {
            Some(node) => {
                node.children.sort_by(|a, _, b, _| compare_keys(a, b));
                node.entries.sort_by(|a, _, b, _| compare_keys(a, b));
                node.children.values().copied().collect()
            }
            None => return,
        };
        for child in children {
            self.sort(child);
        }
    }

    /// Structural checks applied to trees that did not come from this process.
    pub(crate) fn is_consistent(&self) -> bool {
        let Some(Some(root)) = self.nodes.first() else {
            return false;
        };
        if root.parent.is_some() || !root.segment.is_empty() {
            return false;
        }
        let mut released = HashSet::with_capacity(self.free.len());
        for id in &self.free {
            if id.index() == 0
                || !matches!(self.nodes.get(id.index()), Some(None))
                || !released.insert(*id)
            {
                return false;
            }
        }
        let mut seen = 0usize;
        let mut pending = vec![self.root()];
        while let Some(id) = pending.pop() {
            let Some(node) = self.get(id) else {
                return false;
            };
            seen += 1;
            if seen > self.nodes.len() {
                return false;
            }
            for (segment, child) in node.children() {
                let linked = self
                    .get(child)
                    .is_some_and(|linked| linked.parent == Some(id) && linked.segment == segment);
                if !linked {
                    return false;
                }
                pending.push(child);
            }
        }
        seen == self.len()
    }

    pub fn view(&self, id: NodeId) -> Option<NamespaceView<'_>> {
        self.get(id).map(|node| NamespaceView { tree: self, id, node })
    }
}

/// Panics on a handle whose node was released by
/// [`NamespaceTree::delete_namespace`]; use [`NamespaceTree::get`] when the
/// handle may be stale.
impl Index<NodeId> for NamespaceTree {
    type Output = NamespaceNode;

    fn index(&self, id: NodeId) -> &Self::Output {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale namespace node handle {id:?}"),
        }
    }
}

/// Panics on a stale handle, like the [`Index`] impl.
impl IndexMut<NodeId> for NamespaceTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match self.get_mut(id) {
            Some(node) => node,
            None => panic!("stale namespace node handle {id:?}"),
        }
    }
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

/// Borrowed view of a node that can answer path questions about itself.
#[derive(Clone, Copy)]
pub struct NamespaceView<'a> {
    tree: &'a NamespaceTree,
    id: NodeId,
    node: &'a NamespaceNode,
}

impl<'a> NamespaceView<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node(&self) -> &'a NamespaceNode {
        self.node
    }

    pub fn segment(&self) -> &'a str {
        &self.node.segment
    }

    pub fn full_path(&self) -> String {
        self.tree.full_path(self.id)
    }

    pub fn parent(&self) -> Option<NamespaceView<'a>> {
        self.node.parent.and_then(|parent| self.tree.view(parent))
    }

    pub fn children(&self) -> impl Iterator<Item = NamespaceView<'a>> + 'a {
        let tree = self.tree;
        self.node
            .children()
            .filter_map(move |(_, child)| tree.view(child))
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a Path)> + 'a {
        self.node
            .entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    pub fn doc_files(&self) -> impl Iterator<Item = &'a Path> + 'a {
        self.node.doc_files()
    }

    pub fn is_local_origin(&self) -> bool {
        self.node.local_origin
    }

    /// Depth below the root (root is 0)
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.node.parent;
        while let Some(parent) = current {
            depth += 1;
            current = self.tree.get(parent).and_then(NamespaceNode::parent);
        }
        depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(tree: &NamespaceTree, id: NodeId) -> Vec<String> {
        tree[id].children().map(|(segment, _)| segment.to_string()).collect()
    }

    #[test]
    fn find_or_create_is_idempotent() {
        let mut tree = NamespaceTree::default();
        let first = tree.find_or_create("App\\Models\\User");
        let second = tree.find_or_create("App\\Models\\User");
        assert_eq!(first, second);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.full_path(first), "App\\Models\\User");
    }

    #[test]
    fn trailing_separator_is_ignored() {
        let mut tree = NamespaceTree::default();
        let id = tree.find_or_create("App\\Http\\");
        assert_eq!(tree.find_node("App\\Http"), Some(id));
        assert_eq!(tree.full_path(id), "App\\Http");
    }

    #[test]
    fn find_node_does_not_create() {
        let mut tree = NamespaceTree::default();
        tree.find_or_create("App");
        assert_eq!(tree.find_node("App\\Missing"), None);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.find_node(""), Some(tree.root()));
    }

    #[test]
    fn root_full_path_is_empty() {
        let tree = NamespaceTree::default();
        assert_eq!(tree.full_path(tree.root()), "");
    }

    #[test]
    fn register_and_lookup_entries() {
        let mut tree = NamespaceTree::default();
        let id = tree.register_entry("App\\Models\\User", "/src/App/Models/User.php");
        assert_eq!(tree.full_path(id), "App\\Models");
        assert!(tree.has_entry("App\\Models\\User"));
        assert!(tree.has_entry("\\App\\Models\\User"));
        assert!(!tree.has_entry("App\\Models\\Post"));
        assert!(!tree.has_entry("Other\\Models\\User"));
        assert!(!tree.has_entry("User"));
    }

    #[test]
    fn entry_keys_are_fully_qualified_and_children_unqualified() {
        let mut tree = NamespaceTree::default();
        let id = tree.register_entry("A\\B\\C", "c.php");
        assert!(tree[id].entries().contains_key("A\\B\\C"));
        let a = tree.find_node("A").unwrap();
        assert_eq!(names(&tree, a), vec!["B".to_string()]);
    }

    #[test]
    fn delete_detaches_subtree_and_reuses_slots() {
        let mut tree = NamespaceTree::default();
        tree.register_entry("A\\X", "x.php");
        tree.register_entry("A\\B\\Y", "y.php");
        tree.register_entry("A\\B\\C\\Z", "z.php");
        let before = tree.len();

        assert!(tree.delete_namespace("A\\B"));
        assert_eq!(tree.find_node("A\\B"), None);
        assert!(tree.find_node("A").is_some());
        assert!(tree.has_entry("A\\X"));
        assert!(!tree.has_entry("A\\B\\Y"));
        assert_eq!(tree.len(), before - 2);

        let reused = tree.find_or_create("D");
        assert!(reused.index() < before);
        assert_eq!(tree.full_path(reused), "D");
    }

    #[test]
    fn delete_missing_namespace_creates_intermediates() {
        let mut tree = NamespaceTree::default();
        assert!(tree.delete_namespace("Ghost\\Child"));
        assert!(tree.find_node("Ghost").is_some());
        assert_eq!(tree.find_node("Ghost\\Child"), None);
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut tree = NamespaceTree::default();
        tree.register_entry("Top", "top.php");
        assert!(!tree.delete_namespace(""));
        assert!(tree.has_entry("Top"));
    }

    #[test]
    fn stale_handles_resolve_to_none() {
        let mut tree = NamespaceTree::default();
        let b = tree.find_or_create("A\\B");
        assert!(tree.delete_namespace("A\\B"));
        assert!(tree.get(b).is_none());
        assert!(tree.view(b).is_none());
    }

    #[test]
    #[should_panic(expected = "stale namespace node handle")]
    fn indexing_a_stale_handle_panics() {
        let mut tree = NamespaceTree::default();
        let b = tree.find_or_create("A\\B");
        tree.delete_namespace("A\\B");
        let _ = &tree[b];
    }

    #[test]
    fn compare_keys_folds_case_per_character() {
        assert_eq!(compare_keys("MANGO", "apple"), Ordering::Greater);
        assert_eq!(compare_keys("äb", "Äa"), Ordering::Greater);
        assert_eq!(compare_keys("Äpfel", "äpfel"), Ordering::Less);
        assert_eq!(compare_keys("same", "same"), Ordering::Equal);
    }

    #[test]
    fn collect_all_entries_counts_every_entry() {
        let mut tree = NamespaceTree::default();
        tree.register_entry("Top", "/top.php");
        tree.register_entry("A\\X", "/a/x.php");
        tree.register_entry("A\\B\\Y", "/a/b/y.php");
        tree.register_entry("C\\D\\E\\F", "/c/d/e/f.php");

        let all = tree.collect_all_entries(tree.root());
        assert_eq!(all.len(), 4);
        assert_eq!(all[Path::new("/a/b/y.php")], "A\\B\\Y");
        assert_eq!(all[Path::new("/top.php")], "Top");

        let a = tree.find_node("A").unwrap();
        assert_eq!(tree.collect_all_entries(a).len(), 2);
    }

    #[test]
    fn colliding_source_paths_keep_last_write() {
        let mut tree = NamespaceTree::default();
        tree.register_entry("A\\Shared", "/shared.php");
        tree.register_entry("Shared", "/shared.php");
        let all = tree.collect_all_entries(tree.root());
        assert_eq!(all.len(), 1);
        assert_eq!(all[Path::new("/shared.php")], "Shared");
    }

    #[test]
    fn doc_files_are_own_first_then_children() {
        let mut tree = NamespaceTree::default();
        let a = tree.find_or_create("A");
        let b = tree.find_or_create("A\\B");
        let root = tree.root();
        tree.add_doc_file(b, PathBuf::from("/a/b/readme.md"));
        tree.add_doc_file(a, PathBuf::from("/a/readme.md"));
        tree.add_doc_file(root, PathBuf::from("/readme.md"));
        assert!(!tree.add_doc_file(root, PathBuf::from("/readme.md")));

        assert_eq!(
            tree.collect_all_doc_files(root),
            vec![
                PathBuf::from("/readme.md"),
                PathBuf::from("/a/readme.md"),
                PathBuf::from("/a/b/readme.md"),
            ]
        );
    }

    #[test]
    fn sort_is_case_insensitive_and_idempotent() {
        let mut tree = NamespaceTree::default();
        for path in ["zeta", "Alpha", "beta", "Gamma"] {
            tree.find_or_create(path);
        }
        tree.register_entry("alpha\\b", "b.php");
        tree.register_entry("Alpha\\a", "a.php");
        tree.register_entry("Alpha\\C", "c.php");

        tree.sort(tree.root());
        assert_eq!(
            names(&tree, tree.root()),
            vec!["Alpha", "alpha", "beta", "Gamma", "zeta"]
        );
        let alpha = tree.find_node("Alpha").unwrap();
        let keys: Vec<&str> = tree[alpha].entries().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Alpha\\a", "Alpha\\C"]);

        let once = tree.clone();
        tree.sort(tree.root());
        assert_eq!(tree, once);
    }

    #[test]
    fn subtree_has_entries_sees_descendants() {
        let mut tree = NamespaceTree::default();
        tree.find_or_create("Empty\\Deeper");
        tree.register_entry("Full\\Inner\\Leaf", "leaf.php");
        assert!(!tree.subtree_has_entries(tree.find_node("Empty").unwrap()));
        assert!(tree.subtree_has_entries(tree.find_node("Full").unwrap()));
    }

    #[test]
    fn view_reports_paths_and_depth() {
        let mut tree = NamespaceTree::default();
        let id = tree.find_or_create("A\\B\\C");
        let view = tree.view(id).unwrap();
        assert_eq!(view.full_path(), "A\\B\\C");
        assert_eq!(view.depth(), 3);
        assert_eq!(view.parent().map(|p| p.full_path()), Some("A\\B".to_string()));
    }

    #[test]
    fn consistency_check_accepts_live_tree() {
        let mut tree = NamespaceTree::default();
        tree.register_entry("A\\B\\C", "c.php");
        tree.delete_namespace("A\\B");
        assert!(tree.is_consistent());
    }

    #[test]
    fn custom_separator() {
        let mut tree = NamespaceTree::new('.');
        let id = tree.register_entry("app.models.User", "User.py");
        assert_eq!(tree.full_path(id), "app.models");
        assert!(tree.has_entry("app.models.User"));
    }
}
