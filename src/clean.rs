use std::fs;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IoResultExt, Result};

/// remove every symlink under `dir` that points into `mount`
///
/// directories left behind are pruned deepest-first; a directory that still
/// holds user content simply stays. returns the name of the workspace the
/// removed links pointed at (the first path segment of the last matching
/// target below the mount), or None when no such link was found, which means
/// a cold checkout.
pub fn clear_links(mount: &Path, dir: &Path) -> Result<Option<String>> {
    let mount: PathBuf = mount.components().collect();

    let mut last_target: Option<PathBuf> = None;
    let mut dirs: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_symlink() {
            let target = fs::read_link(entry.path()).with_path(entry.path())?;
            if target.starts_with(&mount) {
                fs::remove_file(entry.path()).with_path(entry.path())?;
                last_target = Some(target);
            }
        } else if entry.file_type().is_dir() && entry.depth() > 0 {
            dirs.push(entry.path().to_path_buf());
        }
    }

    // deepest subdirectories first; non-empty ones are user-owned and stay
    dirs.sort();
    for d in dirs.iter().rev() {
        let _ = fs::remove_dir(d);
    }

    Ok(last_target.and_then(|t| workspace_name(&mount, &t)))
}

/// first path segment of `target` below `mount`
fn workspace_name(mount: &Path, target: &Path) -> Option<String> {
    let rest = target.strip_prefix(mount).ok()?;
    match rest.components().next()? {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}
