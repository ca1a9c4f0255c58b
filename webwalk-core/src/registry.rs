//! The visited registry: the single owner of every node of a run.
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`]. A node's parent is
//! an id into the same registry, so the parent chain is a lookup path and
//! never an ownership edge.

use crate::normalize::NodeKind;
use crate::policy::SkipReason;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    Fetched {
        status_code: u16,
        content_type: Option<String>,
        size: u64,
    },
    Missing {
        status_code: u16,
    },
    Failed {
        reason: String,
    },
}

/// What happened to a node after it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Unreported,
    Reported,
    SkippedByFilter,
    Persisted(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub url: Url,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub fetch: FetchStatus,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    New(NodeId),
    AlreadyPresent(NodeId),
}

#[derive(Debug, Default)]
pub struct VisitedRegistry {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
    skipped: HashMap<String, SkipReason>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-insert. Exactly one call per canonical URL returns `New`.
    ///
    /// The depth is derived from the parent, so `depth == parent.depth + 1`
    /// holds for every node but the root.
    pub fn try_register(&mut self, url: Url, parent: Option<NodeId>, kind: NodeKind) -> Registration {
        if let Some(&id) = self.index.get(url.as_str()) {
            return Registration::AlreadyPresent(id);
        }

        let depth = parent
            .and_then(|p| self.nodes.get(p))
            .map(|p| p.depth + 1)
            .unwrap_or(0);
        let id = self.nodes.len();

        self.skipped.remove(url.as_str());
        self.index.insert(url.as_str().to_string(), id);
        self.nodes.push(Node {
            id,
            url,
            depth,
            parent,
            kind,
            fetch: FetchStatus::Pending,
            disposition: Disposition::Unreported,
        });

        Registration::New(id)
    }

    pub fn lookup(&self, url: &str) -> Option<&Node> {
        self.index.get(url).and_then(|&id| self.nodes.get(id))
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Remember why a URL was not traversed. Returns `true` the first time
    /// a URL is recorded, so callers can log it once.
    pub fn record_skip(&mut self, url: &str, reason: SkipReason) -> bool {
        if self.index.contains_key(url) || self.skipped.contains_key(url) {
            return false;
        }
        self.skipped.insert(url.to_string(), reason);
        true
    }

    pub fn skip_reason(&self, url: &str) -> Option<&SkipReason> {
        self.skipped.get(url)
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}
