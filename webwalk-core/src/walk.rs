//! The traversal engine.
//!
//! A run is `INIT -> (FETCH -> EXTRACT -> EXPAND -> REPORT)* -> DONE` over a
//! LIFO frontier. Each page's children are pushed in reverse document order,
//! so pages are visited depth-first and, within a page, in document order.
//! A node is registered when it is discovered, which means its depth and
//! parent are those of its first discoverer and it is fetched at most once.

use crate::config::WalkConfig;
use crate::mirror::{Mirror, MirrorMode, MirrorWrite};
use crate::normalize::{NodeKind, Normalized, classify, is_within, normalize, scope_prefix};
use crate::policy::Admission;
use crate::registry::{Disposition, FetchStatus, NodeId, Registration, VisitedRegistry};
use crate::report::{ReportEvent, ReportSink};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;
use webwalk_scanner::{ExtractedRefs, FetchOutcome, Fetched, Fetcher, LinkExtractor};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Nodes fetched, whatever the outcome.
    pub visited: usize,
    pub reported: usize,
    /// Fetched but left out of the report by the filter patterns.
    pub filtered: usize,
    pub missing: usize,
    pub failed: usize,
    /// Files newly written by the mirror.
    pub mirrored: usize,
    /// Distinct URLs refused by the traversal policy.
    pub skipped: usize,
}

impl fmt::Display for WalkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} visited, {} reported, {} filtered, {} missing, {} failed, {} mirrored, {} skipped",
            self.visited,
            self.reported,
            self.filtered,
            self.missing,
            self.failed,
            self.mirrored,
            self.skipped
        )
    }
}

/// Everything a finished run leaves behind.
#[derive(Debug)]
pub struct WalkReport {
    pub registry: VisitedRegistry,
    pub summary: WalkSummary,
}

/// Mutable state of one run. Lives for the duration of a single
/// [`Walker::walk`] call.
struct RunContext {
    registry: VisitedRegistry,
    frontier: Vec<NodeId>,
    summary: WalkSummary,
    sequence: usize,
}

impl RunContext {
    fn new() -> Self {
        Self {
            registry: VisitedRegistry::new(),
            frontier: Vec::new(),
            summary: WalkSummary::default(),
            sequence: 0,
        }
    }
}

pub struct Walker<'a, F, X> {
    config: &'a WalkConfig,
    fetcher: F,
    extractor: X,
}

impl<'a, F: Fetcher, X: LinkExtractor> Walker<'a, F, X> {
    pub fn new(config: &'a WalkConfig, fetcher: F, extractor: X) -> Self {
        Self {
            config,
            fetcher,
            extractor,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Walk the site from the configured root, handing report lines and
    /// warnings to `sink` as they happen.
    ///
    /// Broken links and unreadable pages never end the run; they show up as
    /// warnings and in the summary.
    pub async fn walk<S: ReportSink>(&self, sink: &mut S) -> WalkReport {
        let root = &self.config.root;
        let scope = scope_prefix(root);
        info!("Starting walk of {} (scope {})", root, scope);

        let mut run = RunContext::new();
        let root_id = match run.registry.try_register(root.clone(), None, NodeKind::Page) {
            Registration::New(id) | Registration::AlreadyPresent(id) => id,
        };
        run.frontier.push(root_id);

        while let Some(id) = run.frontier.pop() {
            let url = match run.registry.get(id) {
                Some(node) => node.url.clone(),
                None => continue,
            };

            let outcome = self.fetcher.fetch(&url).await;
            run.summary.visited += 1;

            match outcome {
                FetchOutcome::Ok(fetched) => {
                    self.visit_fetched(&mut run, id, &url, &scope, fetched, sink);
                }
                failure => self.visit_failed(&mut run, id, &url, failure, sink),
            }
        }

        run.summary.skipped = run.registry.skipped_count();
        info!("Walk of {} finished: {}", root, run.summary);

        WalkReport {
            registry: run.registry,
            summary: run.summary,
        }
    }

    fn visit_failed<S: ReportSink>(
        &self,
        run: &mut RunContext,
        id: NodeId,
        url: &Url,
        outcome: FetchOutcome,
        sink: &mut S,
    ) {
        let reason = outcome.reason().unwrap_or_default();
        debug!("Fetch of {} failed: {}", url, reason);

        let status = match outcome {
            FetchOutcome::Missing { status_code } => {
                run.summary.missing += 1;
                FetchStatus::Missing { status_code }
            }
            FetchOutcome::Error { reason } => {
                run.summary.failed += 1;
                FetchStatus::Failed { reason }
            }
            FetchOutcome::Ok(_) => return,
        };
        if let Some(node) = run.registry.get_mut(id) {
            node.fetch = status;
        }

        if self.config.warnings_enabled {
            sink.warn(url, &reason);
        }
    }

    fn visit_fetched<S: ReportSink>(
        &self,
        run: &mut RunContext,
        id: NodeId,
        url: &Url,
        scope: &str,
        fetched: Fetched,
        sink: &mut S,
    ) {
        let kind = match run.registry.get_mut(id) {
            Some(node) => {
                node.fetch = FetchStatus::Fetched {
                    status_code: fetched.status_code,
                    content_type: fetched.content_type.clone(),
                    size: fetched.size(),
                };
                node.kind
            }
            None => return,
        };

        let is_html = fetched.content_type.is_none() || fetched.is_html();
        if kind == NodeKind::Page && is_html {
            if self.config.follow_external || is_within(url, scope) {
                self.expand(run, id, url, &fetched);
            } else {
                debug!("Not expanding {}: outside of {}", url, scope);
            }
        }

        self.report(run, id, url, fetched, sink);
    }

    /// EXTRACT and EXPAND: register every admitted reference of the page and
    /// push the new nodes so that they come off the frontier in document
    /// order.
    fn expand(&self, run: &mut RunContext, id: NodeId, url: &Url, fetched: &Fetched) {
        let extracted = match self.extractor.extract_refs(&fetched.body) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("Treating {} as having no links: {}", url, e);
                ExtractedRefs::default()
            }
        };

        // References resolve against where the page was served from, which
        // differs from `url` after a redirect such as `/docs` -> `/docs/`.
        let served_from = fetched.final_url.as_ref().unwrap_or(url);
        let base = extracted
            .base
            .as_deref()
            .and_then(|base| served_from.join(base).ok())
            .unwrap_or_else(|| served_from.clone());
        let child_depth = run.registry.get(id).map(|n| n.depth + 1).unwrap_or(1);

        let mut children = Vec::new();
        for raw in &extracted.refs {
            let candidate = match normalize(&base, &raw.value) {
                Normalized::Url(candidate) => candidate,
                Normalized::Ignored(reason) => {
                    debug!("Ignoring reference {:?} ({:?})", raw.value, reason);
                    continue;
                }
            };

            if let Admission::Skip(reason) = self
                .config
                .policy
                .admit_for_traversal(candidate.as_str(), child_depth)
            {
                if run.registry.record_skip(candidate.as_str(), reason.clone()) {
                    debug!("Skipping {}: {}", candidate, reason);
                }
                continue;
            }

            let kind = classify(raw.attr, &candidate);
            match run.registry.try_register(candidate, Some(id), kind) {
                Registration::New(child) => children.push(child),
                Registration::AlreadyPresent(existing) => {
                    debug!("Already registered as node {}: {}", existing, raw.value);
                }
            }
        }

        debug!(
            "{} references on {}, {} new nodes",
            extracted.refs.len(),
            url,
            children.len()
        );
        run.frontier.extend(children.into_iter().rev());
    }

    fn report<S: ReportSink>(
        &self,
        run: &mut RunContext,
        id: NodeId,
        url: &Url,
        fetched: Fetched,
        sink: &mut S,
    ) {
        if !self.config.policy.admit_for_report(url.as_str()) {
            debug!("Filtered out of the report: {}", url);
            run.summary.filtered += 1;
            if let Some(node) = run.registry.get_mut(id) {
                node.disposition = Disposition::SkippedByFilter;
            }
            return;
        }

        let mirrored = match &self.config.mirror {
            Some(mirror) => self.persist(run, mirror, url, &fetched.body, sink),
            None => None,
        };

        let event = ReportEvent {
            sequence: run.sequence,
            node: id,
            size: fetched.size(),
            content_type: fetched.content_type,
            headers: fetched.headers,
            mirror: mirrored.clone(),
        };
        run.sequence += 1;
        run.summary.reported += 1;
        sink.report(&event, &run.registry);

        if let Some(node) = run.registry.get_mut(id) {
            node.disposition = match mirrored {
                Some((_, path)) => Disposition::Persisted(path),
                None => Disposition::Reported,
            };
        }
    }

    fn persist<S: ReportSink>(
        &self,
        run: &mut RunContext,
        mirror: &Mirror,
        url: &Url,
        body: &[u8],
        sink: &mut S,
    ) -> Option<(MirrorMode, PathBuf)> {
        let relative = mirror.relative_path(url, &self.config.root);
        match mirror.persist(&relative, body) {
            Ok(MirrorWrite::Written(path)) => {
                run.summary.mirrored += 1;
                Some((mirror.mode(), path))
            }
            Ok(MirrorWrite::AlreadyExists(path)) => Some((mirror.mode(), path)),
            Err(e) => {
                debug!("Could not mirror {}: {}", url, e);
                if self.config.warnings_enabled {
                    sink.warn(url, &e.to_string());
                }
                None
            }
        }
    }
}
