//! Data directory setup and atomic file writes.

use crate::FsError;
use std::fs;
use std::path::{Path, PathBuf};

/// Sub-directory holding one directory per stat.
pub const STATS_DIR: &str = "stats";

/// Sub-directory holding one JSON file per player.
pub const PLAYERS_DIR: &str = "players";

/// Root of a statkit data directory.
#[derive(Clone, Debug)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    /// Open the data directory at `root`, creating it if it does not exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| FsError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stats_dir(&self) -> PathBuf {
        self.root.join(STATS_DIR)
    }

    pub fn players_dir(&self) -> PathBuf {
        self.root.join(PLAYERS_DIR)
    }
}

/// Read a file, mapping "does not exist" to `None`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>, FsError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(FsError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Write `content` to `path` through a sibling temp file and a rename, so a
/// crash mid-write never leaves a truncated file behind.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), FsError> {
    let io_err = |source| FsError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)
}
