use crate::error::Result;
use scraper::{Html, Selector};
use tracing::debug;

/// Which attribute a reference came from. It decides the default kind of
/// the node the reference turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefAttr {
    Href,
    Src,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRef {
    pub attr: RefAttr,
    pub value: String,
}

impl RawRef {
    pub fn href(value: impl Into<String>) -> Self {
        Self {
            attr: RefAttr::Href,
            value: value.into(),
        }
    }

    pub fn src(value: impl Into<String>) -> Self {
        Self {
            attr: RefAttr::Src,
            value: value.into(),
        }
    }
}

/// Raw references of one document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedRefs {
    /// Value of the first `<base href>`, if the document has one.
    pub base: Option<String>,
    pub refs: Vec<RawRef>,
}

pub trait LinkExtractor {
    fn extract_refs(&self, html: &[u8]) -> Result<ExtractedRefs>;
}

/// Extracts every `href` and `src` attribute value with `scraper`.
pub struct HtmlExtractor {
    selector: Selector,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self {
            selector: Selector::parse("[href], [src]").unwrap(),
        }
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkExtractor for HtmlExtractor {
    fn extract_refs(&self, html: &[u8]) -> Result<ExtractedRefs> {
        let text = String::from_utf8_lossy(html);
        let document = Html::parse_document(&text);

        let mut extracted = ExtractedRefs::default();
        for element in document.select(&self.selector) {
            let element = element.value();

            if element.name().eq_ignore_ascii_case("base") {
                if extracted.base.is_none() {
                    extracted.base = element.attr("href").map(|h| h.trim().to_string());
                }
                continue;
            }

            if let Some(href) = element.attr("href") {
                extracted.refs.push(RawRef::href(href));
            }
            if let Some(src) = element.attr("src") {
                extracted.refs.push(RawRef::src(src));
            }
        }

        debug!(
            "Extracted {} references (base: {:?})",
            extracted.refs.len(),
            extracted.base
        );
        Ok(extracted)
    }
}
