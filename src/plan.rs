use std::fs::{self, DirBuilder};
use std::os::unix::fs::{symlink, DirBuilderExt};
use std::path::Path;

use crate::error::{IoResultExt, Result};
use crate::tree::RepoTree;

/// populate a writable tree with symlinks into the read-only tree
///
/// two passes: whole subtrees are linked with a single symlink wherever the
/// writable side has no repository of its own below them; every remaining
/// repository gets one symlink per file. any link that cannot be created
/// fails the checkout.
pub fn create_links(ro: &RepoTree, rw: &RepoTree, ro_root: &Path, rw_root: &Path) -> Result<()> {
    create_tree_links(ro, rw, ro_root, rw_root)?;

    let covered = rw.repos();
    for (name, node) in ro.repos() {
        if !covered.contains_key(&name) {
            symlink_repo(&name, node, ro_root, rw_root)?;
        }
    }
    Ok(())
}

/// link whole subtrees of `ro` wherever the writable side permits
///
/// per child K: a writable repository exactly at K means descend (this wins
/// even when further repositories sit below K); one strictly inside K means
/// leave K for per-repository linking; none at all means one symlink covers
/// the whole subtree.
fn create_tree_links(ro: &RepoTree, rw: &RepoTree, ro_root: &Path, rw_root: &Path) -> Result<()> {
    let rw_repos = rw.repos();

    for key in ro.children().keys() {
        let prefix = format!("{}/", key);
        let mut recurse = false;
        let mut covered = false;
        for k in rw_repos.keys() {
            if k.is_empty() {
                continue;
            }
            if k == key {
                recurse = true;
                break;
            }
            if !covered && k.starts_with(prefix.as_str()) {
                covered = true;
            }
        }

        if recurse {
            if let Some(sub) = rw.repo_at(key) {
                let child = &ro.children()[key];
                create_tree_links(child, sub, &ro_root.join(key), &rw_root.join(key))?;
                continue;
            }
        }
        if !covered {
            let dest = rw_root.join(key);
            make_parents(&dest)?;
            symlink(ro_root.join(key), &dest).with_path(&dest)?;
        }
    }
    Ok(())
}

/// create one symlink per file of a repository that has no writable checkout
///
/// a repository already reachable through a coarser tree link is covered and
/// skipped; a real writable directory at the same spot instead receives the
/// per-file links (user content beside them stays untouched).
fn symlink_repo(name: &str, node: &RepoTree, ro_root: &Path, rw_root: &Path) -> Result<()> {
    if covered_by_link(rw_root, name) {
        return Ok(());
    }

    for entry in node.entries().keys() {
        let dest = rw_root.join(name).join(entry);
        make_parents(&dest)?;
        symlink(ro_root.join(name).join(entry), &dest).with_path(&dest)?;
    }
    Ok(())
}

/// is any component of `rw_root`/`name` a symlink
fn covered_by_link(rw_root: &Path, name: &str) -> bool {
    let mut cur = rw_root.to_path_buf();
    for comp in Path::new(name).components() {
        cur.push(comp);
        match fs::symlink_metadata(&cur) {
            Ok(meta) if meta.file_type().is_symlink() => return true,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
    false
}

/// create the parent directories of `path` with mode 0755
fn make_parents(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(parent)
            .with_path(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use tempfile::tempdir;
    use walkdir::WalkDir;

    fn repo_with_files(files: &[&str]) -> RepoTree {
        let mut node = RepoTree::new();
        for f in files {
            node.insert_entry(f.to_string(), Fingerprint::unresolved());
        }
        node
    }

    /// ro tree with repos at `a` and `b/c`, two files each
    fn sample_ro() -> RepoTree {
        let mut root = RepoTree::new();
        root.add_child("a".to_string(), repo_with_files(&["f1", "f2"]));
        root.add_child("b/c".to_string(), repo_with_files(&["f1", "f2"]));
        root
    }

    fn sample_ro_on_disk(ro: &Path) {
        for repo in ["a", "b/c"] {
            let dir = ro.join(repo);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("f1"), "1").unwrap();
            fs::write(dir.join("f2"), "2").unwrap();
        }
    }

    fn count_links(dir: &Path) -> usize {
        WalkDir::new(dir)
            .into_iter()
            .filter(|e| e.as_ref().unwrap().file_type().is_symlink())
            .count()
    }

    #[test]
    fn test_whole_subtree_links() {
        let tmp = tempdir().unwrap();
        let ro_root = tmp.path().join("ro");
        let rw_root = tmp.path().join("rw");
        sample_ro_on_disk(&ro_root);
        fs::create_dir(&rw_root).unwrap();

        create_links(&sample_ro(), &RepoTree::new(), &ro_root, &rw_root).unwrap();

        assert_eq!(fs::read_link(rw_root.join("a")).unwrap(), ro_root.join("a"));
        assert_eq!(
            fs::read_link(rw_root.join("b/c")).unwrap(),
            ro_root.join("b/c")
        );
        assert!(rw_root.join("b").is_dir());
        assert!(!fs::symlink_metadata(rw_root.join("b")).unwrap().file_type().is_symlink());
        // two links cover everything
        assert_eq!(count_links(&rw_root), 2);
        // and the files resolve through them
        assert_eq!(fs::read_to_string(rw_root.join("a/f1")).unwrap(), "1");
        assert_eq!(fs::read_to_string(rw_root.join("b/c/f2")).unwrap(), "2");
    }

    #[test]
    fn test_partial_coverage_gets_per_file_links() {
        let tmp = tempdir().unwrap();
        let ro_root = tmp.path().join("ro");
        let rw_root = tmp.path().join("rw");
        sample_ro_on_disk(&ro_root);

        // a live checkout below a: a itself cannot be whole-linked
        fs::create_dir_all(rw_root.join("a/nested/.git")).unwrap();
        let mut rw = RepoTree::new();
        rw.add_child("a/nested".to_string(), RepoTree::new());

        create_links(&sample_ro(), &rw, &ro_root, &rw_root).unwrap();

        assert!(!fs::symlink_metadata(rw_root.join("a")).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_link(rw_root.join("a/f1")).unwrap(),
            ro_root.join("a/f1")
        );
        assert_eq!(
            fs::read_link(rw_root.join("a/f2")).unwrap(),
            ro_root.join("a/f2")
        );
        // the untouched sibling subtree still gets one link
        assert_eq!(
            fs::read_link(rw_root.join("b/c")).unwrap(),
            ro_root.join("b/c")
        );
        assert_eq!(count_links(&rw_root), 3);
    }

    #[test]
    fn test_exact_checkout_recurses() {
        let tmp = tempdir().unwrap();
        let ro_root = tmp.path().join("ro");
        let rw_root = tmp.path().join("rw");

        // ro: repo at a, with a nested repo a/sub
        let mut a = repo_with_files(&["f1"]);
        a.add_child("sub".to_string(), repo_with_files(&["g1"]));
        let mut ro = RepoTree::new();
        ro.add_child("a".to_string(), a);

        fs::create_dir_all(ro_root.join("a/sub")).unwrap();
        fs::write(ro_root.join("a/f1"), "1").unwrap();
        fs::write(ro_root.join("a/sub/g1"), "g").unwrap();

        // rw: checkout exactly at a, nothing below
        fs::create_dir_all(rw_root.join("a/.git")).unwrap();
        let mut rw = RepoTree::new();
        rw.add_child("a".to_string(), RepoTree::new());

        create_links(&ro, &rw, &ro_root, &rw_root).unwrap();

        // recursion whole-links the nested repo; a's own files come from the
        // live checkout and are not linked
        assert_eq!(
            fs::read_link(rw_root.join("a/sub")).unwrap(),
            ro_root.join("a/sub")
        );
        assert!(fs::symlink_metadata(rw_root.join("a/f1")).is_err());
        assert_eq!(count_links(&rw_root), 1);
    }

    #[test]
    fn test_repo_under_tree_link_is_covered() {
        let tmp = tempdir().unwrap();
        let ro_root = tmp.path().join("ro");
        let rw_root = tmp.path().join("rw");

        let mut a = repo_with_files(&["f1"]);
        a.add_child("sub".to_string(), repo_with_files(&["g1"]));
        let mut ro = RepoTree::new();
        ro.add_child("a".to_string(), a);

        fs::create_dir_all(ro_root.join("a/sub")).unwrap();
        fs::write(ro_root.join("a/f1"), "1").unwrap();
        fs::write(ro_root.join("a/sub/g1"), "g").unwrap();
        fs::create_dir(&rw_root).unwrap();

        create_links(&ro, &RepoTree::new(), &ro_root, &rw_root).unwrap();

        // one tree link covers both repositories
        assert_eq!(count_links(&rw_root), 1);
        assert_eq!(fs::read_link(rw_root.join("a")).unwrap(), ro_root.join("a"));
        assert_eq!(fs::read_to_string(rw_root.join("a/sub/g1")).unwrap(), "g");
    }

    #[test]
    fn test_user_dir_shadowing_tree_link_is_fatal() {
        let tmp = tempdir().unwrap();
        let ro_root = tmp.path().join("ro");
        let rw_root = tmp.path().join("rw");
        sample_ro_on_disk(&ro_root);

        // user files under a, but no repository: a must be whole-linked,
        // which collides with the existing directory
        fs::create_dir_all(rw_root.join("a")).unwrap();
        fs::write(rw_root.join("a/own.txt"), "mine").unwrap();
        let mut rw = RepoTree::new();
        rw.insert_entry("a/own.txt".to_string(), Fingerprint::unresolved());

        let result = create_links(&sample_ro(), &rw, &ro_root, &rw_root);
        assert!(result.is_err());
        // the user file is untouched
        assert_eq!(fs::read_to_string(rw_root.join("a/own.txt")).unwrap(), "mine");
    }

    #[test]
    fn test_created_parents_have_0755() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempdir().unwrap();
        let ro_root = tmp.path().join("ro");
        let rw_root = tmp.path().join("rw");
        sample_ro_on_disk(&ro_root);
        fs::create_dir(&rw_root).unwrap();

        create_links(&sample_ro(), &RepoTree::new(), &ro_root, &rw_root).unwrap();

        let mode = fs::metadata(rw_root.join("b")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
