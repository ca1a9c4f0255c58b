//! URL normalization and link classification.
//!
//! Every reference found in a page goes through [`normalize`] before it can
//! become a node. The canonical form produced here is the identity used by
//! the visited registry:
//!
//! - scheme and host are lower case and default ports are dropped (the
//!   `url` crate does this on parse);
//! - dot segments are resolved and runs of `/` in the path are collapsed;
//! - the fragment is removed, so `page.html#a` and `page.html#b` are one node;
//! - the query string is kept exactly as written. `?a=1&b=2` and `?b=2&a=1`
//!   are two different nodes. This is current behavior rather than an ideal
//!   one: query driven views are treated as distinct pages and parameters are
//!   never reordered.

use crate::error::ConfigError;
use url::Url;
use webwalk_scanner::RefAttr;

/// What a node is expected to be before it is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Page,
    Resource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Empty,
    Fragment,
    /// `mailto:`, `javascript:`, `tel:`, `data:` and anything else that is
    /// not http(s).
    Scheme,
    Unparseable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    Url(Url),
    Ignored(IgnoreReason),
}

/// Extensions that mark an `href` target as a resource rather than a page.
const RESOURCE_EXTENSIONS: &[&str] = &[
    "7z", "avi", "bmp", "bz2", "css", "csv", "deb", "dmg", "doc", "docx", "eot", "exe", "gif",
    "gz", "ico", "iso", "jar", "jpeg", "jpg", "js", "json", "md", "mjs", "mov", "mp3", "mp4",
    "msi", "ogg", "otf", "pdf", "png", "rar", "rpm", "rss", "svg", "tar", "tgz", "ttf", "txt",
    "wav", "webm", "webp", "woff", "woff2", "xls", "xlsx", "xml", "xz", "zip",
];

/// Resolve `raw` against `base` and canonicalize it.
pub fn normalize(base: &Url, raw: &str) -> Normalized {
    let raw = raw.trim();
    if raw.is_empty() {
        return Normalized::Ignored(IgnoreReason::Empty);
    }
    if raw.starts_with('#') {
        return Normalized::Ignored(IgnoreReason::Fragment);
    }

    let resolved = match base.join(raw) {
        Ok(url) => url,
        Err(_) => return Normalized::Ignored(IgnoreReason::Unparseable),
    };
    if !is_fetchable(&resolved) {
        return Normalized::Ignored(IgnoreReason::Scheme);
    }

    Normalized::Url(canonicalize(resolved))
}

/// Parse and canonicalize the root URL of a run.
pub fn parse_root(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidRootUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !is_fetchable(&url) {
        return Err(ConfigError::InvalidRootUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(canonicalize(url))
}

pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);
    if url.path().contains("//") {
        let collapsed = collapse_slashes(url.path());
        url.set_path(&collapsed);
    }
    url
}

fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        collapsed.push(c);
    }
    collapsed
}

fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https") && url.host_str().is_some()
}

/// `src` references are always resources. `href` references are pages
/// unless the target's extension says otherwise.
pub fn classify(attr: RefAttr, url: &Url) -> NodeKind {
    match attr {
        RefAttr::Src => NodeKind::Resource,
        RefAttr::Href if has_resource_extension(url) => NodeKind::Resource,
        RefAttr::Href => NodeKind::Page,
    }
}

fn has_resource_extension(url: &Url) -> bool {
    let last = url.path().rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            RESOURCE_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// The directory prefix of `url`: everything up to and including the last
/// `/` of the path, without the query.
pub fn scope_prefix(url: &Url) -> String {
    let mut scope = url.clone();
    scope.set_query(None);
    let path = scope.path();
    let dir = match path.rfind('/') {
        Some(pos) => path[..=pos].to_string(),
        None => "/".to_string(),
    };
    scope.set_path(&dir);
    scope.to_string()
}

/// Whether `url` lives under `scope` (a value from [`scope_prefix`]).
pub fn is_within(url: &Url, scope: &str) -> bool {
    url.as_str().starts_with(scope)
}
