pub mod crawler;
pub mod error;
pub mod labels;
pub mod result;

pub use crawler::{Crawler, PageCallback, ProgressCallback};
pub use error::ScanError;
pub use result::{CrawlResult, PageVisit};
