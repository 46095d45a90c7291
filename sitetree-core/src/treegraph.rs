//! Flat, deduplicated treegraph rendering.

use crate::breadcrumb::trim_separator;
use crate::ensure_depth;
use crate::error::{Result, TreeError};
use crate::graph::Graph;
use crate::treemap::LEAF_VALUE;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeGraphItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeGraph {
    pub items: Vec<TreeGraphItem>,
}

impl TreeGraph {
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }
}

/// Flatten a resolved graph into path items, pre-order.
///
/// Each item's id is the node's full name minus the trailing separator. An id
/// is only emitted the first time it is seen, but the walk still descends
/// below repeats. Items are marked with [`LEAF_VALUE`] when the node has no
/// children at all, whatever the depth limit. Nodes deeper than `max_depth`
/// (root = 1) are not visited.
pub fn render(graph: &Graph, max_depth: usize) -> Result<TreeGraph> {
    ensure_depth(max_depth)?;
    let separator = graph.separator().ok_or(TreeError::Unresolved)?;

    let mut emitted: HashSet<&str> = HashSet::new();
    let mut items = Vec::new();
    let mut stack = vec![(graph.root(), 1usize)];

    while let Some((id, depth)) = stack.pop() {
        let node = graph.node(id);
        let full_name = node.record.full_name().ok_or(TreeError::Unresolved)?;
        let path = trim_separator(full_name, separator);

        if emitted.insert(path) {
            items.push(TreeGraphItem {
                id: path.to_string(),
                value: node.is_leaf().then_some(LEAF_VALUE),
            });
        }

        if depth < max_depth {
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
    }

    Ok(TreeGraph { items })
}
