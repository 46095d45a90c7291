//! HTTP surface: the two render routes plus the static frontend.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use sitetree_core::crawl::parse_start_url;
use sitetree_core::{
    AllowList, AppConfig, CrawlOptions, Graph, TreeError, TreeGraph, TreemapItem, build_tree_graph, build_treemap,
    crawl_site, max_depth_from,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Everything a request handler needs; built once at startup.
#[derive(Debug, Clone)]
pub struct ServerState {
    pub allow_list: AllowList,
    pub crawl_options: CrawlOptions,
    pub verbose_errors: bool,
}

impl ServerState {
    pub fn new(allow_list: AllowList, crawl_options: CrawlOptions, verbose_errors: bool) -> Self {
        Self {
            allow_list,
            crawl_options,
            verbose_errors,
        }
    }

    fn reject(&self, error: TreeError) -> ApiError {
        ApiError::new(error, self.verbose_errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteRequest {
    pub url: String,
    #[serde(rename = "maxDepth")]
    pub max_depth: i64,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(error: TreeError, verbose: bool) -> Self {
        let status = status_for(&error);
        error!("request failed ({}): {}", status, error);

        let message = if verbose {
            error.to_string()
        } else {
            generic_message(status).to_string()
        };
        Self { status, message }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

fn status_for(error: &TreeError) -> StatusCode {
    match error {
        TreeError::InvalidDepth(_) | TreeError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
        TreeError::HostNotAllowed(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn generic_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad request",
        StatusCode::FORBIDDEN => "site not allowed",
        _ => "internal server error",
    }
}

/// Validate the request, check the allow-list, then crawl.
async fn crawl_request(state: &ServerState, request: &SiteRequest) -> sitetree_core::Result<(Graph, usize)> {
    let max_depth = max_depth_from(request.max_depth)?;
    let url = parse_start_url(&request.url)?;
    state.allow_list.check(&url)?;

    info!("crawling {} (max depth {})", url, max_depth);
    let graph = crawl_site(&url, &state.crawl_options, None).await?;
    Ok((graph, max_depth))
}

pub async fn treemap_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SiteRequest>,
) -> Result<Json<TreemapItem>, ApiError> {
    let (mut graph, max_depth) = crawl_request(&state, &request).await.map_err(|e| state.reject(e))?;
    build_treemap(&mut graph, max_depth)
        .map(Json)
        .map_err(|e| state.reject(e))
}

pub async fn treegraph_handler(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<SiteRequest>,
) -> Result<Json<TreeGraph>, ApiError> {
    let (mut graph, max_depth) = crawl_request(&state, &request).await.map_err(|e| state.reject(e))?;
    build_tree_graph(&mut graph, max_depth)
        .map(Json)
        .map_err(|e| state.reject(e))
}

pub fn create_router(state: Arc<ServerState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/site/treemap", post(treemap_handler))
        .route("/site/treegraph", post(treegraph_handler))
        // everything else is the frontend
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .with_state(state)
}

/// Bind the configured address and serve until SIGINT or SIGTERM.
pub async fn serve(config: &AppConfig, state: ServerState) -> anyhow::Result<()> {
    let router = create_router(Arc::new(state), &config.static_dir);
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("unable to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("unable to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&TreeError::InvalidDepth(0)), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&TreeError::InvalidUrl("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(&TreeError::HostNotAllowed("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(status_for(&TreeError::MissingRoot), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_message_hidden_unless_verbose() {
        let quiet = ApiError::new(TreeError::HostNotAllowed("evil.com".into()), false);
        assert_eq!(quiet.message(), "site not allowed");

        let verbose = ApiError::new(TreeError::HostNotAllowed("evil.com".into()), true);
        assert!(verbose.message().contains("evil.com"));
    }

    #[test]
    fn test_request_uses_camel_case_depth() {
        let request: SiteRequest = serde_json::from_str(r#"{"url": "https://example.com", "maxDepth": 3}"#).unwrap();
        assert_eq!(request.max_depth, 3);
    }
}
