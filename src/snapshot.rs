use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, IoResultExt, Result};
use crate::fingerprint::{Fingerprint, ObjectId};
use crate::manifest::Manifest;
use crate::tree::{manifest_tree, RepoTree};

/// metadata directory embedded at every repository root of a snapshot
pub const METADATA_DIR: &str = ".slothfs";
/// per-repository file listing inside the metadata directory
pub const TREE_FILE: &str = "tree.json";
/// manifest at the workspace root inside the metadata directory
pub const MANIFEST_FILE: &str = "manifest.xml";

/// the tree.json document: one entry per file of the repository
#[derive(Debug, Deserialize)]
pub struct TreeDoc {
    #[serde(rename = "Entries", default)]
    pub entries: Vec<TreeDocEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TreeDocEntry {
    #[serde(rename = "Name")]
    pub name: String,

    /// 40-hex content id
    #[serde(rename = "ID")]
    pub id: String,

    /// symlink target; presence marks the entry as a link
    #[serde(rename = "Target", default)]
    pub target: Option<String>,
}

/// build the full tree of a read-only workspace snapshot
///
/// the structure comes from the manifest at the workspace root; fingerprints
/// come from the tree.json each repository root carries.
pub fn snapshot_tree(dir: &Path) -> Result<RepoTree> {
    let manifest = Manifest::from_file(&dir.join(METADATA_DIR).join(MANIFEST_FILE))?;
    let mut root = manifest_tree(&manifest);
    fill_from_metadata(&mut root, dir)?;
    Ok(root)
}

/// populate a node and its descendants from their on-disk tree.json files
///
/// descent uses the node's on-disk location (dir + child key): child keys may
/// themselves contain slashes, so a flattened join would name the wrong file.
fn fill_from_metadata(node: &mut RepoTree, dir: &Path) -> Result<()> {
    let path = dir.join(METADATA_DIR).join(TREE_FILE);
    let data = fs::read(&path).with_path(&path)?;
    let doc: TreeDoc = serde_json::from_slice(&data).map_err(|source| Error::TreeMetadata {
        path: path.clone(),
        source,
    })?;

    for entry in doc.entries {
        let id = ObjectId::from_hex(&entry.id)?;
        let fp = if entry.target.is_some() {
            Fingerprint::symlink(Some(id))
        } else {
            Fingerprint::resolved(id)
        };
        node.insert_entry(entry.name, fp);
    }

    for (key, child) in node.children_mut() {
        fill_from_metadata(child, &dir.join(key))?;
    }

    Ok(())
}
