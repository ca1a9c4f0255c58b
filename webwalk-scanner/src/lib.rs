pub mod error;
pub mod extract;
pub mod fetch;
pub mod result;

pub use error::ScanError;
pub use extract::{ExtractedRefs, HtmlExtractor, LinkExtractor, RawRef, RefAttr};
pub use fetch::{Credentials, Fetcher, HttpFetcher, HttpFetcherBuilder};
pub use result::{FetchOutcome, Fetched};
