//! treelink - symlink-forest materialization of workspace snapshot mounts
//!
//! a read-only mount exposes immutable "workspace" snapshots of a large
//! multi-repository source tree, each pinned by a manifest. treelink turns
//! such a snapshot into a writable directory without copying anything: the
//! writable tree is a forest of symlinks into the mount, as coarse as the
//! user's own checkouts allow, and every refresh reports exactly which files
//! changed so their mtimes can be re-stamped for incremental build tools.
//!
//! # Core concepts
//!
//! - **RepoTree**: the nested-repository model, one node per repository,
//!   built from a manifest, from snapshot metadata, or from a live directory
//! - **Fingerprint**: a file's 20-byte content id plus a symlink flag; ids
//!   resolve lazily from the `user.gitsha1` xattr when metadata lacks them
//! - **Checkout**: clean stale links, rebuild the three trees in parallel,
//!   re-link, and diff the prior workspace against the new one
//!
//! # Example usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! // refresh ./client from the snapshot ws_abc under the mount
//! let changed = treelink::checkout(
//!     Path::new("/mnt/workspaces/ws_abc"),
//!     Path::new("client"),
//! ).unwrap();
//!
//! for path in changed {
//!     println!("touch {}", path.display());
//! }
//! ```

mod checkout;
mod clean;
mod config;
mod diff;
mod error;
mod fingerprint;
mod manifest;
mod plan;
mod snapshot;
mod tree;
mod walk;

pub use checkout::{checkout, checkout_with, CheckoutOptions};
pub use clean::clear_links;
pub use config::{Config, CONFIG_FILE};
pub use diff::changed_files;
pub use error::{Error, IoResultExt, Result};
pub use fingerprint::{Fingerprint, ObjectId, GITSHA1_XATTR};
pub use manifest::{FileRule, Manifest, Project};
pub use plan::create_links;
pub use snapshot::{snapshot_tree, TreeDoc, TreeDocEntry, MANIFEST_FILE, METADATA_DIR, TREE_FILE};
pub use tree::{manifest_tree, FileMap, RepoTree};
pub use walk::worktree_tree;
