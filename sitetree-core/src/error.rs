use sitetree_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("max depth must be a positive integer, got {0}")]
    InvalidDepth(i64),

    #[error("graph has no root node; no pages were added")]
    MissingRoot,

    #[error("graph breadcrumbs have not been resolved")]
    Unresolved,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("host '{0}' not allowed")]
    HostNotAllowed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl failed: {0}")]
    Scan(#[from] ScanError),
}

pub type Result<T> = std::result::Result<T, TreeError>;
