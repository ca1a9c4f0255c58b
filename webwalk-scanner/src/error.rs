use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP client error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Could not extract links: {0}")]
    Extraction(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
