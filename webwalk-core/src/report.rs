//! Rendering of report and warning lines.

use crate::config::RenderOptions;
use crate::mirror::MirrorMode;
use crate::registry::{Node, NodeId, VisitedRegistry};
use colored::Colorize;
use std::fmt::Write as _;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;
use url::Url;

const CONTENT_TYPE_WIDTH: usize = 32;

/// One admitted node, handed to the sink in traversal order.
#[derive(Debug, Clone)]
pub struct ReportEvent {
    /// Monotonic position in the report order.
    pub sequence: usize,
    pub node: NodeId,
    pub size: u64,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub mirror: Option<(MirrorMode, PathBuf)>,
}

pub trait ReportSink {
    fn report(&mut self, event: &ReportEvent, registry: &VisitedRegistry);
    fn warn(&mut self, url: &Url, reason: &str);
}

/// The path to print for `node`: its absolute URL, or in relative mode the
/// path relative to the page that referred to it. The root, and nodes on a
/// different origin than their parent, keep the absolute URL.
pub fn display_path(registry: &VisitedRegistry, node: &Node, relative: bool) -> String {
    if !relative {
        return node.url.to_string();
    }
    match node.parent.and_then(|p| registry.get(p)) {
        Some(parent) => match parent.url.make_relative(&node.url) {
            Some(path) if !path.is_empty() => path,
            _ => node.url.to_string(),
        },
        None => node.url.to_string(),
    }
}

/// Writes report lines to `out` and warnings to `err`.
pub struct Reporter<O: Write, E: Write> {
    out: O,
    err: E,
    options: RenderOptions,
    color: bool,
}

impl<O: Write, E: Write> Reporter<O, E> {
    pub fn new(out: O, err: E, options: RenderOptions) -> Self {
        Self {
            out,
            err,
            options,
            color: false,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    /// The report line for `event`, without the trailing newline or the
    /// header block.
    pub fn render_line(&self, event: &ReportEvent, registry: &VisitedRegistry) -> String {
        let Some(node) = registry.get(event.node) else {
            return String::new();
        };

        let mut line = String::new();
        if self.options.verbosity >= 1 {
            let _ = write!(line, "{:>10}  ", event.size);
        }
        if self.options.verbosity >= 2 {
            let content_type: String = event
                .content_type
                .as_deref()
                .unwrap_or("Unknown")
                .chars()
                .take(CONTENT_TYPE_WIDTH)
                .collect();
            let _ = write!(line, "{:<width$}  ", content_type, width = CONTENT_TYPE_WIDTH);
        }

        if self.options.indent && node.depth > 0 {
            let width = node.depth.saturating_mul(self.options.spaces_per_indent);
            line.push_str(&" ".repeat(width));
        }
        line.push_str(&display_path(registry, node, self.options.relative));

        match &event.mirror {
            Some((MirrorMode::Replicate, path)) => {
                let _ = write!(line, " --> {}", path.display());
            }
            Some((MirrorMode::Copy, path)) => {
                let _ = write!(line, " ==> {}", path.display());
            }
            None => {}
        }

        line
    }
}

impl<O: Write, E: Write> ReportSink for Reporter<O, E> {
    fn report(&mut self, event: &ReportEvent, registry: &VisitedRegistry) {
        let line = self.render_line(event, registry);
        let mut result = writeln!(self.out, "{}", line);
        if self.options.verbosity >= 3 {
            for (name, value) in &event.headers {
                if result.is_err() {
                    break;
                }
                result = writeln!(self.out, "    {}: {}", name, value);
            }
        }
        if let Err(e) = result {
            debug!("Could not write report line: {}", e);
        }
    }

    fn warn(&mut self, url: &Url, reason: &str) {
        let prefix = if self.color {
            "WARNING".yellow().bold().to_string()
        } else {
            "WARNING".to_string()
        };
        if let Err(e) = writeln!(self.err, "{}: {}: {}", prefix, reason, url) {
            debug!("Could not write warning: {}", e);
        }
    }
}
