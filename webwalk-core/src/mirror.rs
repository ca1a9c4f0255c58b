//! Persisting fetched content to local storage.
//!
//! Two modes: `Replicate` rebuilds the site's path hierarchy under a target
//! directory, `Copy` drops every matched file flat into one directory. Name
//! collisions in copy mode are resolved by keeping the first file.

use crate::error::{ConfigError, MirrorError};
use crate::normalize::scope_prefix;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

const INDEX_FILE: &str = "index.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    Replicate,
    Copy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorWrite {
    Written(PathBuf),
    /// The target already existed and was left untouched.
    AlreadyExists(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Mirror {
    mode: MirrorMode,
    dir: PathBuf,
}

impl Mirror {
    /// Full mirror under `dir`, which must already exist.
    pub fn replicate(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::with_mode(MirrorMode::Replicate, dir.into())
    }

    /// Flat copy into `dir`, which must already exist.
    pub fn copy(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Self::with_mode(MirrorMode::Copy, dir.into())
    }

    fn with_mode(mode: MirrorMode, dir: PathBuf) -> Result<Self, ConfigError> {
        if !dir.is_dir() {
            let role = match mode {
                MirrorMode::Replicate => "replication",
                MirrorMode::Copy => "copy",
            };
            return Err(ConfigError::MissingDirectory { role, path: dir });
        }
        Ok(Self { mode, dir })
    }

    pub fn mode(&self) -> MirrorMode {
        self.mode
    }

    /// Where `url` goes, relative to the target directory.
    ///
    /// Replicate: the URL path below the root's directory, or `<host>/<path>`
    /// for URLs outside of it. Copy: the last path segment. A trailing `/`
    /// maps to `index.html` in both modes.
    pub fn relative_path(&self, url: &Url, root: &Url) -> PathBuf {
        let path = match self.mode {
            MirrorMode::Replicate => {
                let root_dir = Url::parse(&scope_prefix(root)).ok();
                let below_root = root_dir.as_ref().and_then(|dir| {
                    if dir.origin() == url.origin() {
                        url.path().strip_prefix(dir.path())
                    } else {
                        None
                    }
                });
                match below_root {
                    Some(rest) => rest.to_string(),
                    None => format!("{}{}", url.host_str().unwrap_or("unknown"), url.path()),
                }
            }
            MirrorMode::Copy => url.path().rsplit('/').next().unwrap_or("").to_string(),
        };

        let mut relative = PathBuf::new();
        for component in path.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                continue;
            }
            relative.push(component);
        }
        if path.is_empty() || path.ends_with('/') {
            relative.push(INDEX_FILE);
        }
        relative
    }

    /// Write `bytes` to `relative` under the target directory, creating
    /// intermediate directories. Existing files are never overwritten.
    pub fn persist(&self, relative: &Path, bytes: &[u8]) -> Result<MirrorWrite, MirrorError> {
        let target = self.dir.join(relative);
        if target.exists() {
            debug!("Not overwriting existing file {}", target.display());
            return Ok(MirrorWrite::AlreadyExists(target));
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| MirrorError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&target, bytes).map_err(|source| MirrorError::Io {
            path: target.clone(),
            source,
        })?;

        debug!("Wrote {} bytes to {}", bytes.len(), target.display());
        Ok(MirrorWrite::Written(target))
    }
}
