//! TOML curve files, one directory per stat.

use crate::environment::{read_optional, write_atomic};
use crate::FsError;
use statkit_store::{CurveStore, StoreError};
use statkit_types::{validate_stat_name, StatCurve};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of a stat's curve inside its directory.
pub const CURVE_FILE: &str = "stat.toml";

/// Stores each curve at `<root>/<stat>/stat.toml`.
pub struct TomlCurveStore {
    root: PathBuf,
}

impl TomlCurveStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn curve_path(&self, stat: &str) -> PathBuf {
        self.root.join(stat).join(CURVE_FILE)
    }
}

impl CurveStore for TomlCurveStore {
    fn load_curve(&self, stat: &str) -> Result<Option<StatCurve>, StoreError> {
        let path = self.curve_path(stat);
        let Some(content) = read_optional(&path)? else {
            return Ok(None);
        };
        let curve = toml::from_str(&content).map_err(|e| FsError::Malformed {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(stat, path = %path.display(), "loaded curve file");
        Ok(Some(curve))
    }

    fn save_curve(&self, stat: &str, curve: &StatCurve) -> Result<(), StoreError> {
        let path = self.curve_path(stat);
        let content =
            toml::to_string_pretty(curve).map_err(|e| FsError::Serialization(e.to_string()))?;
        write_atomic(&path, &content)?;
        tracing::debug!(stat, path = %path.display(), "saved curve file");
        Ok(())
    }

    fn list_stats(&self) -> Result<Vec<String>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(FsError::Io {
                    path: self.root.clone(),
                    source,
                }
                .into())
            }
        };

        let mut stats = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if validate_stat_name(&name).is_ok() {
                stats.push(name);
            } else {
                tracing::warn!(dir = %entry.path().display(), "skipping directory with invalid stat name");
            }
        }
        stats.sort();
        Ok(stats)
    }
}
