//! Nested, depth-limited treemap rendering.

use crate::ensure_depth;
use crate::error::{Result, TreeError};
use crate::graph::{Graph, NodeId};
use serde::{Deserialize, Serialize};

/// Value carried by every item without rendered children.
pub const LEAF_VALUE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreemapItem {
    pub name: String,
    #[serde(rename = "colname", default, skip_serializing_if = "Option::is_none")]
    pub column_label: Option<String>,
    #[serde(default)]
    pub children: Vec<TreemapItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u32>,
    /// Set when the depth limit hid children this node really has.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

impl TreemapItem {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Column label for items below the top level.
pub fn column_label(depth: usize) -> Option<String> {
    (depth > 1).then(|| format!("level{}", depth))
}

struct Frame {
    node: NodeId,
    depth: usize,
    next_child: usize,
    children: Vec<TreemapItem>,
}

impl Frame {
    fn new(node: NodeId, depth: usize) -> Self {
        Self {
            node,
            depth,
            next_child: 0,
            children: Vec::new(),
        }
    }
}

/// Render the tree as nested items, descending while `depth < max_depth`.
///
/// The root is depth 1. Nodes at the depth limit render with no children;
/// any item whose rendered children are empty carries [`LEAF_VALUE`].
pub fn render(graph: &Graph, max_depth: usize) -> Result<TreemapItem> {
    ensure_depth(max_depth)?;

    let mut stack = vec![Frame::new(graph.root(), 1)];
    let mut rendered = None;

    while let Some(mut frame) = stack.pop() {
        let node = graph.node(frame.node);

        if frame.depth < max_depth && frame.next_child < node.children.len() {
            let child = node.children[frame.next_child];
            let depth = frame.depth + 1;
            frame.next_child += 1;
            stack.push(frame);
            stack.push(Frame::new(child, depth));
            continue;
        }

        let value = frame.children.is_empty().then_some(LEAF_VALUE);
        let item = TreemapItem {
            name: node.record.label.clone(),
            column_label: column_label(frame.depth),
            truncated: frame.children.is_empty() && !node.is_leaf(),
            children: frame.children,
            value,
        };

        match stack.last_mut() {
            Some(parent) => parent.children.push(item),
            None => rendered = Some(item),
        }
    }

    rendered.ok_or(TreeError::MissingRoot)
}
