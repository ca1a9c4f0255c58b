use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The three pattern lists a run is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Exclude,
    Include,
    Filter,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::Exclude => write!(f, "exclude"),
            PatternKind::Include => write!(f, "include"),
            PatternKind::Filter => write!(f, "filter"),
        }
    }
}

/// Problems found while building a run configuration. All of them are
/// fatal and are raised before the first fetch.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid {kind} pattern '{pattern}': {source}")]
    InvalidPattern {
        kind: PatternKind,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid root URL '{url}': {reason}")]
    InvalidRootUrl { url: String, reason: String },

    #[error("{role} directory does not exist: {}", path.display())]
    MissingDirectory { role: &'static str, path: PathBuf },

    #[error("cannot specify concurrent copy and replication operations")]
    ConflictingTargets,
}

/// A failed write of one mirrored file. Reported, never fatal.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("could not write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
