use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::tree::NamespaceTree;

/// Counters for a single scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Directories mapped onto namespaces (the scanned one included)
    pub directories: usize,

    /// Source files registered as entries
    pub entries: usize,

    /// Documentation files attached to namespaces
    pub doc_files: usize,

    /// Walk entries that could not be read (unreadable directories, broken or
    /// looping links) and were skipped
    pub unreadable_entries: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.directories += other.directories;
        self.entries += other.entries;
        self.doc_files += other.doc_files;
        self.unreadable_entries += other.unreadable_entries;
    }
}

/// Maps directory trees onto namespaces
pub struct DirectoryScanner<'a> {
    config: &'a ScanConfig,
}

impl<'a> DirectoryScanner<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    /// Walk `directory` and register its contents under `namespace`.
    ///
    /// Subdirectories without a `.` in their name extend the namespace by
    /// their name; source files become entries and documentation files are
    /// attached to the namespace of the directory holding them. A missing or
    /// unreadable directory contributes nothing.
    pub fn scan_directory(
        &self,
        tree: &mut NamespaceTree,
        namespace: &str,
        directory: impl AsRef<Path>,
        local: bool,
    ) -> ScanStats {
        let directory = directory.as_ref();
        let separator = tree.separator();
        let base = tree.normalize(namespace);
        let source_suffix = self.config.source_suffix();
        let doc_suffix = self.config.doc_suffix();
        let mut stats = ScanStats::default();

        let base_id = tree.find_or_create(&base);
        tree.set_local_origin(base_id, local);

        let walker = WalkDir::new(directory)
            .follow_links(true)
            .max_depth(self.config.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry.file_name().to_string_lossy().contains('.')
            });

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    log::debug!("Skipping unreadable entry: {err}");
                    stats.unreadable_entries += 1;
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(directory) else {
                continue;
            };
            let mut parts: Vec<String> = relative
                .components()
                .map(|component| component.as_os_str().to_string_lossy().into_owned())
                .collect();

            if entry.file_type().is_dir() {
                let id = tree.find_or_create(&join_namespace(&base, &parts, separator));
                tree.set_local_origin(id, local);
                stats.directories += 1;
                continue;
            }

            let Some(file_name) = parts.pop() else {
                continue;
            };
            let namespace = join_namespace(&base, &parts, separator);

            if let Some(name) = file_name.strip_suffix(&source_suffix) {
                if name.is_empty() {
                    continue;
                }
                let qualified = if namespace.is_empty() {
                    name.to_string()
                } else {
                    format!("{namespace}{separator}{name}")
                };
                tree.register_entry(&qualified, entry.path());
                stats.entries += 1;
            } else if file_name.ends_with(&doc_suffix) {
                let id = tree.find_or_create(&namespace);
                if tree.add_doc_file(id, entry.path().to_path_buf()) {
                    stats.doc_files += 1;
                }
            }
        }

        log::debug!(
            "Scanned {} into namespace {:?}: {} entries, {} docs",
            directory.display(),
            base,
            stats.entries,
            stats.doc_files
        );
        stats
    }

    /// Register a file that lives in no namespace. Path separators in
    /// `filename` are ignored; the last component minus the source suffix
    /// becomes the entry name on the root. Non-source files are skipped.
    pub fn register_root_entry(
        &self,
        tree: &mut NamespaceTree,
        filename: &str,
        local: bool,
    ) -> bool {
        let Some(stem) = filename.strip_suffix(&self.config.source_suffix()) else {
            log::debug!("Skipping non-source root file {filename}");
            return false;
        };
        let separator = tree.separator();
        let name = stem
            .rsplit(|c: char| c == '/' || c == separator)
            .next()
            .unwrap_or(stem);
        if name.is_empty() {
            return false;
        }

        let root = tree.root();
        tree.register_entry(name, filename);
        tree.set_local_origin(root, local);
        true
    }
}

fn join_namespace(base: &str, parts: &[String], separator: char) -> String {
    let mut namespace = base.to_string();
    for part in parts {
        if !namespace.is_empty() {
            namespace.push(separator);
        }
        namespace.push_str(part);
    }
    namespace
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn maps_directories_onto_namespaces() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Foo.php"), b"<?php").unwrap();
        fs::create_dir_all(temp.path().join("Bar")).unwrap();
        fs::write(temp.path().join("Bar").join("Baz.php"), b"<?php").unwrap();

        let config = ScanConfig::default();
        let mut tree = NamespaceTree::default();
        let stats = DirectoryScanner::new(&config)
            .scan_directory(&mut tree, "App", temp.path(), false);

        assert_eq!(stats.entries, 2);
        assert_eq!(stats.directories, 2);
        let all = tree.collect_all_entries(tree.root());
        assert_eq!(all[&temp.path().join("Foo.php")], "App\\Foo");
        assert_eq!(all[&temp.path().join("Bar").join("Baz.php")], "App\\Bar\\Baz");
    }

    #[test]
    fn skips_dotted_directories_and_foreign_files() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("v1.2")).unwrap();
        fs::write(temp.path().join("v1.2").join("Hidden.php"), b"").unwrap();
        fs::write(temp.path().join("notes.txt"), b"").unwrap();
        fs::write(temp.path().join("Kept.php"), b"").unwrap();

        let config = ScanConfig::default();
        let mut tree = NamespaceTree::default();
        DirectoryScanner::new(&config).scan_directory(&mut tree, "Lib", temp.path(), false);

        assert!(tree.has_entry("Lib\\Kept"));
        assert!(!tree.has_entry("Lib\\v1.2\\Hidden"));
        assert_eq!(tree.collect_all_entries(tree.root()).len(), 1);
    }

    #[test]
    fn attaches_docs_to_their_directory_namespace() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("Sub")).unwrap();
        fs::write(temp.path().join("README.md"), b"# top").unwrap();
        fs::write(temp.path().join("Sub").join("guide.md"), b"# sub").unwrap();

        let config = ScanConfig::default();
        let mut tree = NamespaceTree::default();
        let stats = DirectoryScanner::new(&config)
            .scan_directory(&mut tree, "Pkg\\", temp.path(), true);

        assert_eq!(stats.doc_files, 2);
        let pkg = tree.find_node("Pkg").unwrap();
        let sub = tree.find_node("Pkg\\Sub").unwrap();
        assert_eq!(
            tree[pkg].doc_files().collect::<Vec<_>>(),
            vec![temp.path().join("README.md").as_path()]
        );
        assert_eq!(
            tree[sub].doc_files().collect::<Vec<_>>(),
            vec![temp.path().join("Sub").join("guide.md").as_path()]
        );
        assert!(tree[pkg].is_local_origin());
        assert!(tree[sub].is_local_origin());
    }

    #[test]
    fn missing_directory_is_treated_as_empty() {
        let temp = tempdir().unwrap();
        let config = ScanConfig::default();
        let mut tree = NamespaceTree::default();
        let stats = DirectoryScanner::new(&config).scan_directory(
            &mut tree,
            "Ghost",
            temp.path().join("does-not-exist"),
            false,
        );

        assert_eq!(stats.entries, 0);
        assert_eq!(stats.unreadable_entries, 1);
        assert!(tree.find_node("Ghost").is_some());
        assert!(tree.collect_all_entries(tree.root()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn broken_links_do_not_stop_sibling_registration() {
        use std::os::unix::fs::symlink;

        let temp = tempdir().unwrap();
        symlink(temp.path().join("gone"), temp.path().join("Broken")).unwrap();
        symlink(temp.path(), temp.path().join("Loop")).unwrap();
        fs::write(temp.path().join("Sibling.php"), b"<?php").unwrap();
        fs::create_dir_all(temp.path().join("Inner")).unwrap();
        fs::write(temp.path().join("Inner").join("Deep.php"), b"<?php").unwrap();

        let config = ScanConfig::default();
        let mut tree = NamespaceTree::default();
        let stats = DirectoryScanner::new(&config)
            .scan_directory(&mut tree, "Ns", temp.path(), false);

        assert!(stats.unreadable_entries >= 2);
        assert!(tree.has_entry("Ns\\Sibling"));
        assert!(tree.has_entry("Ns\\Inner\\Deep"));
        assert!(tree.find_node("Ns\\Broken").is_none());
        assert_eq!(stats.entries, 2);
    }

    #[test]
    fn honours_custom_extensions() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("Widget.xyz"), b"").unwrap();
        fs::write(temp.path().join("Other.php"), b"").unwrap();
        fs::write(temp.path().join("intro.txt"), b"").unwrap();

        let config = ScanConfig::default()
            .with_source_extension("xyz")
            .with_doc_extension("txt");
        let mut tree = NamespaceTree::default();
        let stats = DirectoryScanner::new(&config)
            .scan_directory(&mut tree, "Ui", temp.path(), false);

        assert!(tree.has_entry("Ui\\Widget"));
        assert!(!tree.has_entry("Ui\\Other"));
        assert_eq!(stats.doc_files, 1);
    }

    #[test]
    fn root_entries_use_the_last_path_component() {
        let config = ScanConfig::default();
        let scanner = DirectoryScanner::new(&config);
        let mut tree = NamespaceTree::default();

        assert!(scanner.register_root_entry(&mut tree, "Widget.php", true));
        assert!(scanner.register_root_entry(&mut tree, "src/legacy/Helper.php", false));
        assert!(!scanner.register_root_entry(&mut tree, "README.md", false));

        assert!(tree.has_entry("Widget"));
        assert!(tree.has_entry("Helper"));
        assert!(!tree.has_entry("App\\Widget"));
        let root = tree.root();
        assert_eq!(
            tree[root].entries().get("Helper").map(|p| p.to_string_lossy().into_owned()),
            Some("src/legacy/Helper.php".to_string())
        );
    }
}
