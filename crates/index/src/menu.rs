//! Projection of a namespace tree into a nested navigation menu.
//!
//! Within every namespace, child-namespace submenus come before the
//! namespace's own entries. Entries that live on the root (no namespace) are
//! grouped under a single leading submenu. Namespaces whose whole subtree has
//! no entries are left out.
//!
//! The tree is expected to be sorted beforehand ([`crate::NamespaceTree::sort`]);
//! projection never mutates it.

use serde::{Deserialize, Serialize};

use crate::node::NodeId;
use crate::tree::NamespaceTree;

/// Produces the link target for a fully-qualified entry name.
pub trait UrlResolver {
    fn entry_url(&self, entry: &str) -> String;
}

impl<F> UrlResolver for F
where
    F: Fn(&str) -> String,
{
    fn entry_url(&self, entry: &str) -> String {
        self(entry)
    }
}

/// Receives menu items in display order.
pub trait MenuSink: Default {
    fn add_item(&mut self, label: String, link: String, active: bool);

    fn add_submenu(&mut self, label: String, submenu: Self, active: bool);
}

/// The entry and namespace currently being viewed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSelection {
    /// Bare entry name, e.g. `User`
    pub class: String,

    /// Namespace path, with or without a leading separator
    pub namespace: String,
}

impl ActiveSelection {
    pub fn new(class: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            namespace: namespace.into(),
        }
    }

    fn namespace_matches(&self, full_path: &str, separator: char) -> bool {
        self.namespace.trim_matches(separator) == full_path
    }

    fn entry_matches(&self, name: &str, full_path: &str, separator: char) -> bool {
        self.class == name && self.namespace_matches(full_path, separator)
    }
}

/// Everything a projection needs besides the tree itself.
pub struct MenuContext<'a> {
    pub active: &'a ActiveSelection,
    pub resolver: &'a dyn UrlResolver,
    pub soft_break: &'a str,
}

/// Builds a menu for `tree` into a fresh sink.
pub fn build_menu<M: MenuSink>(tree: &NamespaceTree, ctx: &MenuContext<'_>) -> M {
    MenuBuilder { tree, ctx }.build()
}

struct MenuBuilder<'t, 'c> {
    tree: &'t NamespaceTree,
    ctx: &'c MenuContext<'c>,
}

impl MenuBuilder<'_, '_> {
    fn build<M: MenuSink>(&self) -> M {
        let mut menu = M::default();
        let root_id = self.tree.root();
        let root = &self.tree[root_id];
        let separator = self.tree.separator();

        if !root.entries().is_empty() {
            let mut group = M::default();
            let mut any_active = false;
            for name in root.entries().keys() {
                let active = self.ctx.active.entry_matches(name, "", separator);
                any_active |= active;
                group.add_item(self.label(name), self.ctx.resolver.entry_url(name), active);
            }
            menu.add_submenu(separator.to_string(), group, any_active);
        }

        for (_, child) in root.children() {
            self.append_namespace(child, &mut menu);
        }
        menu
    }

    fn append_namespace<M: MenuSink>(&self, id: NodeId, parent: &mut M) {
        if !self.tree.subtree_has_entries(id) {
            return;
        }
        let node = &self.tree[id];
        let separator = self.tree.separator();
        let mut current = M::default();

        for (_, child) in node.children() {
            self.append_namespace(child, &mut current);
        }

        let full_path = self.tree.full_path(id);
        for name in node.entries().keys() {
            let (_, base) = self.tree.split_name(name);
            let active = self.ctx.active.entry_matches(base, &full_path, separator);
            current.add_item(self.label(base), self.ctx.resolver.entry_url(name), active);
        }

        let active = self.ctx.active.namespace_matches(&full_path, separator);
        parent.add_submenu(format!("{separator}{}", node.segment()), current, active);
    }

    fn label(&self, name: &str) -> String {
        let separator = self.tree.separator();
        let mut label = String::with_capacity(name.len());
        for ch in name.chars() {
            if ch == separator {
                label.push_str(self.ctx.soft_break);
            }
            label.push(ch);
        }
        label
    }
}

/// Plain menu model, useful as a sink when no widget toolkit is involved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuItem {
    Link {
        label: String,
        link: String,
        active: bool,
    },
    Submenu {
        label: String,
        active: bool,
        menu: Menu,
    },
}

impl MenuItem {
    pub fn label(&self) -> &str {
        match self {
            Self::Link { label, .. } | Self::Submenu { label, .. } => label,
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            Self::Link { active, .. } | Self::Submenu { active, .. } => *active,
        }
    }
}

impl MenuSink for Menu {
    fn add_item(&mut self, label: String, link: String, active: bool) {
        self.items.push(MenuItem::Link {
            label,
            link,
            active,
        });
    }

    fn add_submenu(&mut self, label: String, submenu: Self, active: bool) {
        self.items.push(MenuItem::Submenu {
            label,
            active,
            menu: submenu,
        });
    }
}

impl Menu {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Labels of the top-level items, in order
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(MenuItem::label).collect()
    }

    /// Submenu with the given label, if any
    pub fn submenu(&self, label: &str) -> Option<&Menu> {
        self.items.iter().find_map(|item| match item {
            MenuItem::Submenu { label: l, menu, .. } if l == label => Some(menu),
            _ => None,
        })
    }
}
