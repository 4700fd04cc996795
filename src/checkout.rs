use std::path::{Path, PathBuf};
use std::thread;

use tracing::debug;

use crate::clean::clear_links;
use crate::diff::changed_files;
use crate::error::{Error, Result};
use crate::plan::create_links;
use crate::snapshot::snapshot_tree;
use crate::tree::FileMap;
use crate::walk::worktree_tree;

/// checkout options
#[derive(Clone, Debug)]
pub struct CheckoutOptions {
    /// directory names ignored at repository-root level when scanning the
    /// writable tree (build output, by convention)
    pub skip_root_dirs: Vec<String>,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            skip_root_dirs: vec!["out".to_string()],
        }
    }
}

/// materialize the read-only workspace `ro` into the writable dir `rw`
///
/// returns the absolute paths whose content changed relative to the
/// previously linked workspace; the caller refreshes their mtimes so
/// incremental build tools invalidate correctly.
pub fn checkout(ro: &Path, rw: &Path) -> Result<Vec<PathBuf>> {
    checkout_with(ro, rw, &CheckoutOptions::default())
}

/// checkout with explicit options
pub fn checkout_with(ro: &Path, rw: &Path, opts: &CheckoutOptions) -> Result<Vec<PathBuf>> {
    let ro: PathBuf = ro.components().collect();
    let mount = match ro.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Err(Error::NoMountParent(ro.clone())),
    };

    let prev = clear_links(mount, rw)?;
    debug!(prev = prev.as_deref().unwrap_or(""), "cleared stale links");
    let prev_root = prev.as_ref().map(|name| mount.join(name));

    // the three tree builds only read; run them in parallel
    let (prior, rw_tree, ro_tree) = thread::scope(|s| {
        let prior_h = prev_root
            .as_ref()
            .map(|root| s.spawn(move || snapshot_tree(root)));
        let rw_h = s.spawn(|| worktree_tree(rw, &opts.skip_root_dirs));
        let ro_h = s.spawn(|| snapshot_tree(&ro));

        (
            prior_h.map(|h| h.join().expect("prior snapshot build panicked")),
            rw_h.join().expect("worktree build panicked"),
            ro_h.join().expect("snapshot build panicked"),
        )
    });
    let prior = prior.transpose()?;
    let rw_tree = rw_tree?;
    let ro_tree = ro_tree?;

    create_links(&ro_tree, &rw_tree, &ro, rw)?;

    let new_files = ro_tree.files();
    let empty = FileMap::new();
    let old_files = prior.as_ref().map(|t| t.files());
    let old_files = old_files.as_ref().unwrap_or(&empty);
    let old_root = prev_root.unwrap_or_else(|| mount.to_path_buf());

    let changed = changed_files(old_files, &old_root, &new_files, &ro);
    debug!(changed = changed.len(), "computed change list");

    Ok(changed.into_iter().map(|p| ro.join(p)).collect())
}
