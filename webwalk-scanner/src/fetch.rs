use crate::error::Result;
use crate::result::{FetchOutcome, Fetched};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

/// Anything that can turn a URL into a [`FetchOutcome`].
///
/// The walk engine only talks to this trait, so tests can swap the network
/// for an in-memory site.
pub trait Fetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchOutcome> + Send;
}

/// Basic auth credentials, already resolved by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

pub struct HttpFetcher {
    client: Client,
    credentials: Option<Credentials>,
}

pub struct HttpFetcherBuilder {
    timeout_secs: u64,
    credentials: Option<Credentials>,
    accept_invalid_certs: bool,
}

impl HttpFetcherBuilder {
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Skip TLS certificate verification, for internal sites with
    /// self-signed certificates.
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<HttpFetcher> {
        let timeout = Duration::from_secs(self.timeout_secs.max(1));
        let client = Client::builder()
            .user_agent(concat!("webwalk/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .redirect(reqwest::redirect::Policy::limited(5))
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        Ok(HttpFetcher {
            client,
            credentials: self.credentials,
        })
    }
}

impl HttpFetcher {
    pub fn builder() -> HttpFetcherBuilder {
        HttpFetcherBuilder {
            timeout_secs: 10,
            credentials: None,
            accept_invalid_certs: false,
        }
    }

    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    async fn get(&self, url: &Url) -> FetchOutcome {
        debug!("Fetching {}", url);

        let mut request = self.client.get(url.clone());
        if let Some(ref credentials) = self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        let start = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return categorize_error(e),
        };

        let status = response.status();
        let final_url = response.url().clone();
        if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
            return FetchOutcome::Missing {
                status_code: status.as_u16(),
            };
        }
        if !status.is_success() {
            return FetchOutcome::Error {
                reason: format!("HTTP Error {}", status),
            };
        }

        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok());
        let header_pairs = headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(e) => return categorize_error(e),
        };

        debug!(
            "Fetched {} ({} bytes, {:?}) in {:?}",
            url,
            body.len(),
            content_type,
            start.elapsed()
        );
        if final_url != *url {
            debug!("{} was served from {}", url, final_url);
        }

        FetchOutcome::Ok(Fetched {
            status_code: status.as_u16(),
            content_type,
            content_length,
            headers: header_pairs,
            body,
            final_url: Some(final_url),
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> impl Future<Output = FetchOutcome> + Send {
        self.get(url)
    }
}

fn categorize_error(error: reqwest::Error) -> FetchOutcome {
    let reason = if error.is_timeout() {
        "Request timed out".to_string()
    } else if error.is_redirect() {
        "Too many redirects".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    };
    FetchOutcome::Error { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path},
    };

    fn url_for(server: &MockServer, p: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), p)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/index.html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_bytes(b"<html><body>hi</body></html>".as_slice()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let outcome = fetcher.fetch(&url_for(&mock_server, "/index.html")).await;

        match outcome {
            FetchOutcome::Ok(fetched) => {
                assert_eq!(fetched.status_code, 200);
                assert!(fetched.is_html());
                assert_eq!(fetched.body, b"<html><body>hi</body></html>");
                assert_eq!(fetched.size(), 28);
                assert!(
                    fetched
                        .headers
                        .iter()
                        .any(|(name, _)| name == "content-type")
                );
            }
            other => panic!("expected Ok, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_records_redirect_target() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/docs/"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/docs/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>docs</p>", "text/html"))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let outcome = fetcher.fetch(&url_for(&mock_server, "/docs")).await;

        match outcome {
            FetchOutcome::Ok(fetched) => {
                assert_eq!(fetched.final_url, Some(url_for(&mock_server, "/docs/")));
                assert!(fetched.is_html());
            }
            other => panic!("expected Ok, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_not_found_is_missing() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let outcome = fetcher.fetch(&url_for(&mock_server, "/gone")).await;

        assert!(matches!(outcome, FetchOutcome::Missing { status_code: 404 }));
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::new().unwrap();
        let outcome = fetcher.fetch(&url_for(&mock_server, "/broken")).await;

        match outcome {
            FetchOutcome::Error { reason } => assert!(reason.contains("500")),
            other => panic!("expected Error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_error() {
        let fetcher = HttpFetcher::builder().with_timeout(2).build().unwrap();
        let url = Url::parse("http://127.0.0.1:1/").unwrap();

        let outcome = fetcher.fetch(&url).await;

        assert!(matches!(outcome, FetchOutcome::Error { .. }));
    }

    #[tokio::test]
    async fn test_fetch_sends_basic_auth() {
        let mock_server = MockServer::start().await;
        // base64("user:pass")
        Mock::given(method("GET"))
            .and(path("/private"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"secret".as_slice()))
            .mount(&mock_server)
            .await;

        let fetcher = HttpFetcher::builder()
            .with_credentials(Some(Credentials::new("user", "pass")))
            .build()
            .unwrap();
        let outcome = fetcher.fetch(&url_for(&mock_server, "/private")).await;

        assert!(outcome.is_ok(), "expected Ok, got {:?}", outcome);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials::new("joe", "hunter2");
        let shown = format!("{:?}", credentials);
        assert!(shown.contains("joe"));
        assert!(!shown.contains("hunter2"));
    }
}
