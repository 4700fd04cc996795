use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, IoResultExt, Result};

/// the subset of a repo manifest this crate consumes
///
/// projects declare where they sit in the composite tree; copyfile/linkfile
/// rules declare synthetic files materialized at the workspace root. remotes,
/// defaults and sync options are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct Manifest {
    #[serde(rename = "project", default)]
    pub projects: Vec<Project>,
}

/// a single git project pinned by the manifest
#[derive(Debug, Deserialize)]
pub struct Project {
    #[serde(rename = "@name")]
    pub name: String,

    /// location in the composite tree; defaults to the project name
    #[serde(rename = "@path")]
    pub path: Option<String>,

    #[serde(rename = "@revision")]
    pub revision: Option<String>,

    #[serde(rename = "copyfile", default)]
    pub copyfiles: Vec<FileRule>,

    #[serde(rename = "linkfile", default)]
    pub linkfiles: Vec<FileRule>,
}

/// a copyfile/linkfile declaration; dest is relative to the workspace root
#[derive(Debug, Deserialize)]
pub struct FileRule {
    #[serde(rename = "@src")]
    pub src: String,

    #[serde(rename = "@dest")]
    pub dest: String,
}

impl Manifest {
    /// parse a manifest document
    pub fn parse(xml: &str) -> std::result::Result<Self, quick_xml::DeError> {
        quick_xml::de::from_str(xml)
    }

    /// read and parse a manifest file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_path(path)?;
        Self::parse(&text).map_err(|source| Error::Manifest {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Project {
    /// where the project is checked out, relative to the workspace root
    pub fn checkout_path(&self) -> &str {
        self.path.as_deref().unwrap_or(&self.name)
    }
}
