//! Page graph construction.
//!
//! Pages arrive one at a time from the crawler and are linked to the node
//! currently registered under their parent URL. Nodes live in an arena and
//! refer to their children by index, so a URL discovered twice yields two
//! independent nodes: the key index only remembers the latest one, while the
//! earlier node stays linked wherever it was attached.

use crate::error::{Result, TreeError};
use crate::page::PageRecord;
use std::collections::HashMap;
use tracing::debug;

/// Key under which the tree root is registered.
pub const ROOT_KEY: &str = "";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Node {
    pub record: PageRecord,
    pub children: Vec<NodeId>,
}

impl Node {
    fn new(record: PageRecord) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Accumulates visited pages into a URL-keyed node collection.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    index: HashMap<String, NodeId>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link a newly visited page into the collection.
    ///
    /// The parent is whatever node is registered under `record.parent_url`
    /// when this is called; pages without a registered parent hang off the
    /// root, which is created on first need.
    pub fn add_page(&mut self, record: PageRecord) -> NodeId {
        let parent = match self.index.get(&record.parent_url) {
            Some(&parent) => parent,
            None => self.root_or_insert(),
        };

        let key = record.url.clone();
        let id = NodeId(self.nodes.len());
        debug!("Adding page {} under node {}", key, parent.0);
        self.nodes.push(Node::new(record));

        if key != ROOT_KEY {
            self.index.insert(key, id);
        }
        self.nodes[parent.0].children.push(id);
        id
    }

    fn root_or_insert(&mut self) -> NodeId {
        if let Some(&root) = self.index.get(ROOT_KEY) {
            return root;
        }
        let root = NodeId(self.nodes.len());
        self.nodes.push(Node::new(PageRecord::synthetic_root()));
        self.index.insert(ROOT_KEY.to_string(), root);
        root
    }

    /// The node currently registered under `url`.
    pub fn get(&self, url: &str) -> Option<&Node> {
        self.index.get(url).map(|id| &self.nodes[id.0])
    }

    pub fn root(&self) -> Option<&Node> {
        self.get(ROOT_KEY)
    }

    /// Total nodes created, including the root and superseded duplicates.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Hand the collection off as a tree rooted at the empty-key node.
    pub fn finish(mut self, start_url: impl Into<String>) -> Result<Graph> {
        let root = *self.index.get(ROOT_KEY).ok_or(TreeError::MissingRoot)?;
        let url = start_url.into();
        self.nodes[root.0].record.url = url.clone();

        Ok(Graph {
            url,
            root,
            nodes: self.nodes,
            separator: None,
        })
    }
}

/// A finished crawl: the start URL and the tree hanging off a synthetic root.
#[derive(Debug, Clone)]
pub struct Graph {
    url: String,
    root: NodeId,
    nodes: Vec<Node>,
    pub(crate) separator: Option<String>,
}

impl Graph {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Separator of the last breadcrumb resolution, if any.
    pub fn separator(&self) -> Option<&str> {
        self.separator.as_deref()
    }

    /// Node ids reachable from the root, pre-order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev().copied());
        }
        order
    }

    /// Length of the longest root-to-leaf path, counting the root as depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(self.node(id).children.iter().map(|&child| (child, depth + 1)));
        }
        deepest
    }
}
