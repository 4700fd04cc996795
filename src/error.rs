use std::path::PathBuf;

/// error type for treelink operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("manifest parse error at {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: quick_xml::DeError,
    },

    #[error("tree metadata parse error at {path}: {source}")]
    TreeMetadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("config error at {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid object id: {0}")]
    InvalidObjectId(String),

    #[error("workspace path {0} has no parent mount")]
    NoMountParent(PathBuf),

    #[error("no read-only workspace given (pass --ro or set `ro` in the config file)")]
    NoReadOnlyRoot,
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
