use crate::{Error, Result};
use petgraph::graph::UnGraph;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Dense, 0-based node identifier.
pub type NodeId = usize;

/// Raw attribute row of a node: attribute name -> value as found in the input.
pub type AttributeRow = Map<String, Value>;

/// A node type tag (e.g. `user`, `movie`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeType(pub String);

impl NodeType {
    /// Create a new node type.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeType {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for NodeType {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed node with its raw attribute row.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub attributes: AttributeRow,
}

/// Declares one feature column: an attribute name and the node type it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(rename = "nodeType")]
    pub node_type: NodeType,
}

impl AttributeSpec {
    pub fn new(name: impl Into<String>, node_type: impl Into<NodeType>) -> Self {
        Self {
            name: name.into(),
            node_type: node_type.into(),
        }
    }

    /// Whether this attribute is defined for nodes of `node_type`.
    pub fn applies_to(&self, node_type: &NodeType) -> bool {
        &self.node_type == node_type
    }
}

/// An undirected edge, stored canonically as `(min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    /// Create an edge; endpoint order does not matter.
    pub fn new(u: NodeId, v: NodeId) -> Self {
        Self {
            source: u.min(v),
            target: u.max(v),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Typed, undirected graph with dense node ids.
///
/// Built once from validated input and read-only afterwards.
///
/// # Example
///
/// ```rust
/// use biplink_core::{Graph, NodeType};
///
/// let graph = Graph::from_parts(
///     vec![(0, "other".into()), (1, "other".into()), (2, "user".into())],
///     &[(2, 0)],
/// )
/// .unwrap();
///
/// assert_eq!(graph.num_nodes(), 3);
/// assert_eq!(graph.edges()[0].source, 0);
/// assert_eq!(graph.node(2).unwrap().node_type, NodeType::new("user"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Graph {
    /// Build a graph from nodes and edges, validating ids.
    ///
    /// Nodes may arrive in any order; they are stored by id. Ids must be
    /// unique and cover `0..n` exactly, and every edge endpoint must be one
    /// of them.
    pub fn new(mut nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self> {
        nodes.sort_by_key(|n| n.id);
        for (expected, node) in nodes.iter().enumerate() {
            if node.id != expected {
                let reason = if node.id < expected {
                    format!("duplicate node id {}", node.id)
                } else {
                    format!("node ids are not dense: missing id {}", expected)
                };
                return Err(Error::MalformedInput(reason));
            }
        }

        let n = nodes.len();
        if let Some(e) = edges.iter().find(|e| e.source.max(e.target) >= n) {
            return Err(Error::MalformedInput(format!(
                "edge ({}, {}) references unknown node {} ({} nodes)",
                e.source,
                e.target,
                e.source.max(e.target),
                n
            )));
        }

        Ok(Self { nodes, edges })
    }

    /// Build an attribute-less graph from `(id, type)` pairs and raw `(u, v)` links.
    pub fn from_parts(nodes: Vec<(NodeId, NodeType)>, links: &[(NodeId, NodeId)]) -> Result<Self> {
        let nodes = nodes
            .into_iter()
            .map(|(id, node_type)| Node {
                id,
                node_type,
                attributes: AttributeRow::new(),
            })
            .collect();
        let edges = links.iter().map(|&(u, v)| Edge::new(u, v)).collect();
        Self::new(nodes, edges)
    }

    /// Replace every node's attribute row.
    ///
    /// `rows` must hold exactly one row per node in id order, and every row's
    /// `type` field must equal the node's type.
    pub fn with_attribute_table(mut self, rows: Vec<AttributeRow>) -> Result<Self> {
        if rows.len() != self.nodes.len() {
            return Err(Error::MalformedInput(format!(
                "attribute table has {} rows but graph has {} nodes",
                rows.len(),
                self.nodes.len()
            )));
        }

        for (node, mut row) in self.nodes.iter_mut().zip(rows) {
            match row.remove("type") {
                Some(Value::String(t)) if t == node.node_type.as_str() => {}
                Some(other) => {
                    return Err(Error::MalformedInput(format!(
                        "attribute row {} has type {} but node is {}",
                        node.id, other, node.node_type
                    )));
                }
                None => {
                    return Err(Error::MalformedInput(format!("attribute row {} has no type", node.id)));
                }
            }
            node.attributes = row;
        }

        Ok(self)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Edges in input order, each canonicalized.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Ids of all nodes of the given type, ascending.
    pub fn nodes_of_type(&self, node_type: &NodeType) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| &n.node_type == node_type)
            .map(|n| n.id)
            .collect()
    }

    /// Node count per type.
    pub fn type_counts(&self) -> BTreeMap<NodeType, usize> {
        let mut counts = BTreeMap::new();
        for node in &self.nodes {
            *counts.entry(node.node_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Undirected petgraph view; node index `i` is node id `i`.
    pub fn as_petgraph(&self) -> UnGraph<NodeId, ()> {
        let mut g = UnGraph::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            g.add_node(node.id);
        }
        g.extend_with_edges(self.edges.iter().map(|e| (e.source as u32, e.target as u32)));
        g
    }

    /// Summary statistics.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            num_nodes: self.num_nodes(),
            num_edges: self.num_edges(),
            num_components: petgraph::algo::connected_components(&self.as_petgraph()),
            nodes_by_type: self
                .type_counts()
                .into_iter()
                .map(|(t, c)| (t.0, c))
                .collect(),
        }
    }
}

/// Statistics for a [`Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub num_nodes: usize,
    pub num_edges: usize,
    /// Connected components, isolated nodes included.
    pub num_components: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
}
