//! Include/exclude/filter/depth policy.
//!
//! Traversal admission decides whether a URL is fetched at all; report
//! admission decides whether an already traversed URL shows up in the output
//! (and gets mirrored). The two are independent: a filter never changes what
//! is traversed.

use crate::error::{ConfigError, PatternKind};
use regex::Regex;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    ExceedsDepth { depth: usize, max_depth: usize },
    Excluded { pattern: String },
    NotIncluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ExceedsDepth { depth, max_depth } => {
                write!(f, "depth {} exceeds maximum depth {}", depth, max_depth)
            }
            SkipReason::Excluded { pattern } => write!(f, "matched exclude pattern '{}'", pattern),
            SkipReason::NotIncluded => write!(f, "matched no include pattern"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Skip(SkipReason),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admit)
    }
}

/// Compiled policy. Patterns are compiled once, when the policy is built.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    exclude: Vec<Regex>,
    include: Vec<Regex>,
    filter: Vec<Regex>,
    max_depth: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyBuilder {
    exclude: Vec<String>,
    include: Vec<String>,
    filter: Vec<String>,
    max_depth: Option<usize>,
}

impl PolicyBuilder {
    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn with_include(mut self, pattern: impl Into<String>) -> Self {
        self.include.push(pattern.into());
        self
    }

    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter.push(pattern.into());
        self
    }

    /// `None` means unbounded.
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self) -> Result<Policy, ConfigError> {
        Ok(Policy {
            exclude: compile(PatternKind::Exclude, &self.exclude)?,
            include: compile(PatternKind::Include, &self.include)?,
            filter: compile(PatternKind::Filter, &self.filter)?,
            max_depth: self.max_depth,
        })
    }
}

fn compile(kind: PatternKind, patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                kind,
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

impl Policy {
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn has_filters(&self) -> bool {
        !self.filter.is_empty()
    }

    /// Depth, then exclude, then include. The first failing check is the
    /// reason reported.
    pub fn admit_for_traversal(&self, url: &str, depth: usize) -> Admission {
        if let Some(max_depth) = self.max_depth {
            if depth > max_depth {
                return Admission::Skip(SkipReason::ExceedsDepth { depth, max_depth });
            }
        }

        if let Some(pattern) = self.exclude.iter().find(|re| re.is_match(url)) {
            return Admission::Skip(SkipReason::Excluded {
                pattern: pattern.as_str().to_string(),
            });
        }

        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(url)) {
            return Admission::Skip(SkipReason::NotIncluded);
        }

        Admission::Admit
    }

    /// A URL ending in `/` is matched as `<url>index.html`, so directory
    /// index pages can be selected with `index\.html$`.
    pub fn admit_for_report(&self, url: &str) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        let candidate = if url.ends_with('/') {
            format!("{}index.html", url)
        } else {
            url.to_string()
        };
        self.filter.iter().any(|re| re.is_match(&candidate))
    }
}
