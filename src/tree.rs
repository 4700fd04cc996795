use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::fingerprint::Fingerprint;
use crate::manifest::Manifest;

/// flattened view of a tree: full relative path -> fingerprint
pub type FileMap<'a> = BTreeMap<String, &'a Fingerprint>;

/// recursive model of a composite source tree
///
/// every node is one repository. children are *nested* repositories, keyed by
/// their residual path below this node (possibly several segments, e.g.
/// "b/c"). entries are the files of this repository only; no entry path ever
/// reaches into a child's subtree. the root node stands for the space above
/// all repositories and may own synthetic entries such as manifest-declared
/// copyfile/linkfile destinations.
#[derive(Debug, Default)]
pub struct RepoTree {
    children: BTreeMap<String, RepoTree>,
    entries: BTreeMap<String, Fingerprint>,
}

impl RepoTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// nested repositories directly below this node
    pub fn children(&self) -> &BTreeMap<String, RepoTree> {
        &self.children
    }

    /// files belonging to this repository
    pub fn entries(&self) -> &BTreeMap<String, Fingerprint> {
        &self.entries
    }

    pub(crate) fn add_child(&mut self, key: String, child: RepoTree) {
        self.children.insert(key, child);
    }

    pub(crate) fn insert_entry(&mut self, path: String, fp: Fingerprint) {
        self.entries.insert(path, fp);
    }

    pub(crate) fn children_mut(&mut self) -> btree_map::IterMut<'_, String, RepoTree> {
        self.children.iter_mut()
    }

    /// deepest node whose subtree contains `path`, plus the residual path
    ///
    /// descends through any child whose key is a proper path prefix of
    /// `path`; the node itself is returned when no child matches.
    pub fn parent_repo_mut(&mut self, path: &str) -> (&mut RepoTree, String) {
        let matched = self
            .children
            .keys()
            .find(|k| is_path_prefix(k, path))
            .cloned();

        match matched {
            Some(key) => {
                let rest = path[key.len() + 1..].to_string();
                match self.children.get_mut(&key) {
                    Some(child) => child.parent_repo_mut(&rest),
                    None => unreachable!("child key disappeared"),
                }
            }
            None => (self, path.to_string()),
        }
    }

    /// the node rooted exactly at `path`, if one exists
    pub fn repo_at(&self, path: &str) -> Option<&RepoTree> {
        if path.is_empty() {
            return Some(self);
        }
        if let Some(child) = self.children.get(path) {
            return Some(child);
        }
        for (key, child) in &self.children {
            if is_path_prefix(key, path) {
                if let Some(found) = child.repo_at(&path[key.len() + 1..]) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// all repositories below (and including) this node, keyed by full path
    ///
    /// the receiver appears under "".
    pub fn repos(&self) -> BTreeMap<String, &RepoTree> {
        let mut map = BTreeMap::new();
        self.collect_repos("", &mut map);
        map
    }

    fn collect_repos<'a>(&'a self, prefix: &str, map: &mut BTreeMap<String, &'a RepoTree>) {
        map.insert(prefix.to_string(), self);
        for (key, child) in &self.children {
            child.collect_repos(&join_rel(prefix, key), map);
        }
    }

    /// all files below this node, keyed by full path
    pub fn files(&self) -> FileMap<'_> {
        let mut map = BTreeMap::new();
        self.collect_files("", &mut map);
        map
    }

    fn collect_files<'a>(&'a self, prefix: &str, map: &mut FileMap<'a>) {
        for (name, fp) in &self.entries {
            map.insert(join_rel(prefix, name), fp);
        }
        for (key, child) in &self.children {
            child.collect_files(&join_rel(prefix, key), map);
        }
    }
}

/// does `prefix` name an ancestor directory of `path`
fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some()
}

/// join two relative paths, either of which may be empty
pub(crate) fn join_rel(a: &str, b: &str) -> String {
    if a.is_empty() {
        b.to_string()
    } else if b.is_empty() {
        a.to_string()
    } else {
        format!("{}/{}", a, b)
    }
}

/// build the repository structure a manifest describes
///
/// projects are inserted shallowest first so that a deeper project always
/// finds its deepest ancestor already in place and hangs off it by the
/// residual path. copyfile/linkfile destinations become root entries with
/// unresolved fingerprints; they exist at the workspace root and must be
/// accounted for when enumerating files.
pub fn manifest_tree(manifest: &Manifest) -> RepoTree {
    let mut by_depth: BTreeMap<usize, Vec<&str>> = BTreeMap::new();
    for project in &manifest.projects {
        let path = project.checkout_path();
        by_depth
            .entry(path.split('/').count())
            .or_default()
            .push(path);
    }

    let mut root = RepoTree::new();
    for paths in by_depth.values() {
        for path in paths {
            let (parent, key) = root.parent_repo_mut(path);
            parent.add_child(key, RepoTree::new());
        }
    }

    for project in &manifest.projects {
        for rule in project.copyfiles.iter().chain(&project.linkfiles) {
            root.insert_entry(rule.dest.clone(), Fingerprint::unresolved());
        }
    }

    root
}
