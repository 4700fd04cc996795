use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// xattr carrying the hex content id of files materialized from a snapshot
pub const GITSHA1_XATTR: &str = "user.gitsha1";

/// 20-byte content identifier of a file, as recorded in snapshot metadata
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    /// parse from a 40-char hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidObjectId(s.to_string()))?;
        if bytes.len() != 20 {
            return Err(Error::InvalidObjectId(s.to_string()));
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// get raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..12])
    }
}

/// a file's content identity plus a flag marking symbolic links
///
/// the id may be unknown at construction time; it can then be resolved once
/// from the file's `user.gitsha1` xattr and is cached afterwards. a file
/// whose id cannot be resolved is conservatively treated as changed.
#[derive(Debug)]
pub struct Fingerprint {
    id: OnceLock<Option<ObjectId>>,
    is_link: bool,
}

impl Fingerprint {
    /// fingerprint with a known content id
    pub fn resolved(id: ObjectId) -> Self {
        let fp = Self::unresolved();
        let _ = fp.id.set(Some(id));
        fp
    }

    /// fingerprint whose id is resolved lazily from the xattr
    pub fn unresolved() -> Self {
        Self {
            id: OnceLock::new(),
            is_link: false,
        }
    }

    /// fingerprint for a symbolic link entry
    pub fn symlink(id: Option<ObjectId>) -> Self {
        let fp = Self {
            id: OnceLock::new(),
            is_link: true,
        };
        if let Some(id) = id {
            let _ = fp.id.set(Some(id));
        }
        fp
    }

    /// is this entry a symbolic link
    pub fn is_link(&self) -> bool {
        self.is_link
    }

    /// the content id, if already known; never touches the filesystem
    pub fn known_id(&self) -> Option<&ObjectId> {
        self.id.get().and_then(|id| id.as_ref())
    }

    /// the content id, reading the xattr at `path` on first use
    ///
    /// missing or unparseable xattrs yield None, not an error.
    pub fn object_id(&self, path: &Path) -> Option<&ObjectId> {
        self.id.get_or_init(|| xattr_id(path)).as_ref()
    }
}

/// read a content id from the `user.gitsha1` xattr, taking at most 40 bytes
fn xattr_id(path: &Path) -> Option<ObjectId> {
    let value = xattr::get(path, GITSHA1_XATTR).ok()??;
    let hex = std::str::from_utf8(value.get(..40)?).ok()?;
    ObjectId::from_hex(hex).ok()
}
