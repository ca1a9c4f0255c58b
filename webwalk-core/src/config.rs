use crate::error::ConfigError;
use crate::mirror::Mirror;
use crate::normalize::parse_root;
use crate::policy::{Policy, PolicyBuilder};
use std::path::PathBuf;
use url::Url;

pub const DEFAULT_SPACES_PER_INDENT: usize = 3;
pub const MAX_SPACES_PER_INDENT: usize = 32;

/// How report lines are rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub indent: bool,
    pub relative: bool,
    pub spaces_per_indent: usize,
    /// 1 adds the size column, 2 the content type, 3 the response headers.
    pub verbosity: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            indent: false,
            relative: false,
            spaces_per_indent: DEFAULT_SPACES_PER_INDENT,
            verbosity: 0,
        }
    }
}

/// Immutable configuration of one walk.
#[derive(Debug, Clone)]
pub struct WalkConfig {
    pub root: Url,
    pub policy: Policy,
    pub render: RenderOptions,
    pub warnings_enabled: bool,
    /// Expand pages outside the root's directory too.
    pub follow_external: bool,
    pub mirror: Option<Mirror>,
}

impl WalkConfig {
    pub fn builder(root: impl Into<String>) -> WalkConfigBuilder {
        WalkConfigBuilder {
            root: root.into(),
            policy: Policy::builder(),
            render: RenderOptions::default(),
            warnings_enabled: true,
            follow_external: false,
            replicate_dir: None,
            copy_dir: None,
        }
    }
}

pub struct WalkConfigBuilder {
    root: String,
    policy: PolicyBuilder,
    render: RenderOptions,
    warnings_enabled: bool,
    follow_external: bool,
    replicate_dir: Option<PathBuf>,
    copy_dir: Option<PathBuf>,
}

impl WalkConfigBuilder {
    pub fn with_excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            self.policy = self.policy.with_exclude(pattern);
        }
        self
    }

    pub fn with_includes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            self.policy = self.policy.with_include(pattern);
        }
        self
    }

    pub fn with_filters<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for pattern in patterns {
            self.policy = self.policy.with_filter(pattern);
        }
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.policy = self.policy.with_max_depth(max_depth);
        self
    }

    pub fn with_indent(mut self, indent: bool) -> Self {
        self.render.indent = indent;
        self
    }

    pub fn with_relative_paths(mut self, relative: bool) -> Self {
        self.render.relative = relative;
        self
    }

    /// Capped at [`MAX_SPACES_PER_INDENT`].
    pub fn with_spaces_per_indent(mut self, spaces: usize) -> Self {
        self.render.spaces_per_indent = spaces.min(MAX_SPACES_PER_INDENT);
        self
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.render.verbosity = verbosity;
        self
    }

    pub fn with_warnings(mut self, enabled: bool) -> Self {
        self.warnings_enabled = enabled;
        self
    }

    pub fn with_follow_external(mut self, follow: bool) -> Self {
        self.follow_external = follow;
        self
    }

    pub fn with_replicate_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.replicate_dir = dir;
        self
    }

    pub fn with_copy_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.copy_dir = dir;
        self
    }

    /// Validate everything up front: root URL, pattern syntax and target
    /// directories.
    pub fn build(self) -> Result<WalkConfig, ConfigError> {
        let root = parse_root(&self.root)?;
        let policy = self.policy.build()?;

        let mirror = match (self.replicate_dir, self.copy_dir) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingTargets),
            (Some(dir), None) => Some(Mirror::replicate(dir)?),
            (None, Some(dir)) => Some(Mirror::copy(dir)?),
            (None, None) => None,
        };

        Ok(WalkConfig {
            root,
            policy,
            render: self.render,
            warnings_enabled: self.warnings_enabled,
            follow_external: self.follow_external,
            mirror,
        })
    }
}
