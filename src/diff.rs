use std::path::Path;

use crate::tree::FileMap;

/// relative paths in `new` whose content differs from `old`
///
/// a path is changed when it is new, or when either side's content id cannot
/// be determined, or when the two ids differ. symlink entries are never
/// reported: touching a symlink has no meaning for build invalidation.
/// fingerprints may resolve lazily against the tree roots, so ids missing
/// from the metadata fall back to the files' xattrs.
pub fn changed_files(
    old: &FileMap<'_>,
    old_root: &Path,
    new: &FileMap<'_>,
    new_root: &Path,
) -> Vec<String> {
    let mut changed = Vec::new();

    // FileMap iterates in path order, so the result is born sorted
    for (path, fp) in new {
        if fp.is_link() {
            continue;
        }
        let Some(old_fp) = old.get(path) else {
            changed.push(path.clone());
            continue;
        };

        let old_id = old_fp.object_id(&old_root.join(path));
        let new_id = fp.object_id(&new_root.join(path));
        match (old_id, new_id) {
            (Some(a), Some(b)) if a == b => {}
            _ => changed.push(path.clone()),
        }
    }

    changed
}
