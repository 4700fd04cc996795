use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use crate::error::{IoResultExt, Result};
use crate::fingerprint::Fingerprint;
use crate::snapshot::METADATA_DIR;
use crate::tree::{join_rel, RepoTree};

const GIT_DIR: &str = ".git";

/// build a tree from a live on-disk directory
///
/// a subdirectory with its own `.git/` or `.slothfs/` is a nested repository
/// boundary and becomes a child node; other subdirectories contribute their
/// files to the enclosing repository. directories named in `skip_root_dirs`
/// are ignored at repository-root level. file fingerprints start unresolved;
/// symlinks are only flagged.
pub fn worktree_tree(root: &Path, skip_root_dirs: &[String]) -> Result<RepoTree> {
    let mut tree = RepoTree::new();
    fill(&mut tree, root, "", skip_root_dirs)?;
    Ok(tree)
}

/// is this directory the root of its own repository
fn is_repo_root(path: &Path) -> bool {
    path.join(GIT_DIR).is_dir() || path.join(METADATA_DIR).is_dir()
}

/// scan `repo_root`/`dir` into `node`
///
/// nested repositories discovered in one scan are filled concurrently, one
/// task per boundary; each task owns its subtree and hands it back through a
/// bounded channel, and the scan waits for every task before returning. the
/// first failure wins.
fn fill(node: &mut RepoTree, repo_root: &Path, dir: &str, skip_root_dirs: &[String]) -> Result<()> {
    let scan = if dir.is_empty() {
        repo_root.to_path_buf()
    } else {
        repo_root.join(dir)
    };

    let mut nested: Vec<(String, PathBuf)> = Vec::new();
    for entry in fs::read_dir(&scan).with_path(&scan)? {
        let entry = entry.with_path(&scan)?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let ftype = entry.file_type().with_path(entry.path())?;

        if ftype.is_dir() && (name == GIT_DIR || name == METADATA_DIR) {
            continue;
        }
        if ftype.is_dir() && dir.is_empty() && skip_root_dirs.iter().any(|s| *s == name) {
            continue;
        }

        let sub_name = join_rel(dir, &name);
        if ftype.is_dir() {
            let sub_root = entry.path();
            if is_repo_root(&sub_root) {
                nested.push((sub_name, sub_root));
            } else {
                fill(node, repo_root, &sub_name, skip_root_dirs)?;
            }
        } else {
            let fp = if ftype.is_symlink() {
                Fingerprint::symlink(None)
            } else {
                Fingerprint::unresolved()
            };
            node.insert_entry(sub_name, fp);
        }
    }

    if nested.is_empty() {
        return Ok(());
    }

    let (tx, rx) = mpsc::sync_channel(nested.len());
    thread::scope(|s| {
        for (key, sub_root) in nested {
            let tx = tx.clone();
            s.spawn(move || {
                let mut child = RepoTree::new();
                let outcome = fill(&mut child, &sub_root, "", skip_root_dirs).map(|()| child);
                let _ = tx.send((key, outcome));
            });
        }
        drop(tx);

        let mut first_err = None;
        for (key, outcome) in rx {
            match outcome {
                Ok(child) => node.add_child(key, child),
                Err(e) if first_err.is_none() => first_err = Some(e),
                Err(_) => {}
            }
        }
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    })
}
