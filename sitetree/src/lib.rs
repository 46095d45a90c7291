pub mod commands;
pub mod handlers;
pub mod server;

pub use handlers::{apply_serve_args, handle_crawl, handle_serve};
pub use server::{ApiError, ServerState, SiteRequest, create_router};
