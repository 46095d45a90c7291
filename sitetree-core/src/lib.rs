pub mod breadcrumb;
pub mod config;
pub mod crawl;
pub mod error;
pub mod graph;
pub mod page;
pub mod report;
pub mod treegraph;
pub mod treemap;

pub use breadcrumb::Breadcrumbs;
pub use config::{AllowList, AppConfig};
pub use crawl::{CrawlOptions, crawl_site};
pub use error::{Result, TreeError};
pub use graph::{Graph, GraphBuilder, Node, NodeId};
pub use page::PageRecord;
pub use treegraph::{TreeGraph, TreeGraphItem};
pub use treemap::TreemapItem;

/// Convert a caller-supplied depth into a usable limit.
pub fn max_depth_from(value: i64) -> Result<usize> {
    if value <= 0 {
        return Err(TreeError::InvalidDepth(value));
    }
    usize::try_from(value).map_err(|_| TreeError::InvalidDepth(value))
}

pub(crate) fn ensure_depth(max_depth: usize) -> Result<()> {
    if max_depth == 0 {
        return Err(TreeError::InvalidDepth(0));
    }
    Ok(())
}

/// Resolve slash breadcrumbs and render the graph as a treemap.
pub fn build_treemap(graph: &mut Graph, max_depth: usize) -> Result<TreemapItem> {
    ensure_depth(max_depth)?;
    Breadcrumbs::treemap().resolve(graph);
    treemap::render(graph, max_depth)
}

/// Resolve dotted `HOME` breadcrumbs and render the graph as a treegraph.
pub fn build_tree_graph(graph: &mut Graph, max_depth: usize) -> Result<TreeGraph> {
    ensure_depth(max_depth)?;
    Breadcrumbs::treegraph().resolve(graph);
    treegraph::render(graph, max_depth)
}
