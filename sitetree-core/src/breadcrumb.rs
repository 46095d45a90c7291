//! Full hierarchical path names ("breadcrumbs") for every node of a graph.

use crate::graph::{Graph, NodeId};

/// How breadcrumbs are spelled: the separator appended after every segment,
/// and the label used for the root segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumbs {
    pub separator: String,
    pub root_label: String,
}

impl Breadcrumbs {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            root_label: String::new(),
        }
    }

    pub fn with_root_label(mut self, root_label: impl Into<String>) -> Self {
        self.root_label = root_label.into();
        self
    }

    /// Slash-separated paths with a bare `/` root.
    pub fn treemap() -> Self {
        Self::new("/")
    }

    /// Dotted paths under a `HOME` root segment.
    pub fn treegraph() -> Self {
        Self::new(".").with_root_label("HOME")
    }

    /// Assign a full name to every node reachable from the root.
    ///
    /// The root becomes `root_label + separator`; every other node becomes
    /// its parent's full name followed by its own label and the separator.
    /// Labels are not escaped. Returns the non-root nodes in pre-order.
    /// Running this again recomputes every name from scratch.
    pub fn resolve(&self, graph: &mut Graph) -> Vec<NodeId> {
        let root = graph.root();
        let root_name = format!("{}{}", self.root_label, self.separator);
        graph.node_mut(root).record.full_name = Some(root_name.clone());

        let mut visited = Vec::with_capacity(graph.len().saturating_sub(1));
        let mut stack: Vec<(NodeId, String)> = graph
            .node(root)
            .children
            .iter()
            .rev()
            .map(|&child| (child, root_name.clone()))
            .collect();

        while let Some((id, parent_name)) = stack.pop() {
            let node = graph.node_mut(id);
            let full_name = format!("{}{}{}", parent_name, node.record.label, self.separator);
            node.record.full_name = Some(full_name.clone());
            visited.push(id);

            let children = graph.node(id).children.clone();
            stack.extend(children.into_iter().rev().map(|child| (child, full_name.clone())));
        }

        graph.separator = Some(self.separator.clone());
        visited
    }
}

/// Strip one trailing `separator` from a resolved full name.
pub fn trim_separator<'a>(full_name: &'a str, separator: &str) -> &'a str {
    full_name.strip_suffix(separator).unwrap_or(full_name)
}
