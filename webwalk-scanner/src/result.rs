use reqwest::StatusCode;
use url::Url;

/// What a single fetch produced. Per-node outcomes are values, never errors:
/// a broken link is something to report, not a reason to stop.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Ok(Fetched),
    /// The server said the target does not exist (404, 410).
    Missing { status_code: u16 },
    /// Transport or protocol failure, or any other unsuccessful status.
    Error { reason: String },
}

impl FetchOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchOutcome::Ok(_))
    }

    /// Short human readable reason used for warning lines.
    pub fn reason(&self) -> Option<String> {
        match self {
            FetchOutcome::Ok(_) => None,
            FetchOutcome::Missing { status_code } => {
                let reason = StatusCode::from_u16(*status_code)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Not Found");
                Some(format!("HTTP Error {}: {}", status_code, reason))
            }
            FetchOutcome::Error { reason } => Some(reason.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub status_code: u16,
    pub content_type: Option<String>,
    /// Value of the Content-Length header, when the server sent one.
    pub content_length: Option<u64>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Where the body was served from after redirects, when that is known.
    pub final_url: Option<Url>,
}

impl Fetched {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status_code: 200,
            content_type: None,
            content_length: None,
            headers: Vec::new(),
            body: body.into(),
            final_url: None,
        }
    }

    pub fn with_final_url(mut self, url: Url) -> Self {
        self.final_url = Some(url);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.to_lowercase().contains("html"))
            .unwrap_or(false)
    }

    /// Size as the server announced it, falling back to the body we read.
    pub fn size(&self) -> u64 {
        self.content_length.unwrap_or(self.body.len() as u64)
    }
}
