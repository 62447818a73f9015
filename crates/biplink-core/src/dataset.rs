//! Loading a dataset from its on-disk files.
//!
//! A dataset directory holds:
//!
//! - `graph.json`: node-link data, `{"nodes": [{"id", "type", ...}], "links": [{"source", "target"}]}`.
//!   Any node key other than `id`/`type` is an attribute value.
//! - `attr-meta.json`: ordered feature columns, `[{"name", "nodeType"}]`.
//! - optionally a separate attribute table, `[{"type", <name>: <value>, ...}]`,
//!   one row per node in id order.

use crate::graph::{AttributeRow, AttributeSpec, Edge, Graph, Node, NodeType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Default file name of the node-link graph.
pub const GRAPH_FILE: &str = "graph.json";
/// Default file name of the attribute metadata.
pub const ATTR_META_FILE: &str = "attr-meta.json";

/// A node record in the node-link file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    #[serde(flatten)]
    pub attributes: AttributeRow,
}

/// A link record in the node-link file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source: i64,
    pub target: i64,
}

/// The node-link document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeLinkData {
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

fn node_id(raw: i64, what: &str) -> Result<usize> {
    usize::try_from(raw).map_err(|_| Error::MalformedInput(format!("negative {} id {}", what, raw)))
}

impl NodeLinkData {
    /// Validate and convert into a [`Graph`].
    pub fn into_graph(self) -> Result<Graph> {
        let nodes = self
            .nodes
            .into_iter()
            .map(|rec| {
                let id = node_id(rec.id, "node")?;
                let node_type = rec.node_type.ok_or_else(|| {
                    Error::MalformedInput(format!("node {} has no type", id))
                })?;
                Ok(Node {
                    id,
                    node_type: NodeType::new(node_type),
                    attributes: rec.attributes,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let edges = self
            .links
            .iter()
            .map(|l| Ok(Edge::new(node_id(l.source, "edge source")?, node_id(l.target, "edge target")?)))
            .collect::<Result<Vec<_>>>()?;

        Graph::new(nodes, edges)
    }
}

/// Open an input file; a missing file is a malformed dataset, not an IO failure.
fn open_input(path: &Path) -> Result<BufReader<File>> {
    match File::open(path) {
        Ok(f) => Ok(BufReader::new(f)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::MalformedInput(format!(
            "missing required file {}",
            path.display()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Read node-link JSON into a [`Graph`].
pub fn read_graph<R: Read>(reader: R) -> Result<Graph> {
    let data: NodeLinkData = serde_json::from_reader(reader)?;
    data.into_graph()
}

/// Read attribute metadata (`[{"name", "nodeType"}]`).
pub fn read_attribute_specs<R: Read>(reader: R) -> Result<Vec<AttributeSpec>> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read a separate per-node attribute table.
pub fn read_attribute_table<R: Read>(reader: R) -> Result<Vec<AttributeRow>> {
    Ok(serde_json::from_reader(reader)?)
}

/// A loaded dataset: typed graph plus its declared feature columns.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub graph: Graph,
    pub attributes: Vec<AttributeSpec>,
}

impl Dataset {
    /// Load `graph.json` and `attr-meta.json` from a dataset directory.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        Self::load(dir.join(GRAPH_FILE), dir.join(ATTR_META_FILE), None::<&Path>)
    }

    /// Load from explicit paths.
    ///
    /// When `attribute_table` is `None`, attribute values are taken from the
    /// node records of the graph file.
    pub fn load(
        graph_path: impl AsRef<Path>,
        meta_path: impl AsRef<Path>,
        attribute_table: Option<impl AsRef<Path>>,
    ) -> Result<Self> {
        let mut graph = read_graph(open_input(graph_path.as_ref())?)?;
        let attributes = read_attribute_specs(open_input(meta_path.as_ref())?)?;

        if let Some(table) = attribute_table {
            let rows = read_attribute_table(open_input(table.as_ref())?)?;
            graph = graph.with_attribute_table(rows)?;
        }

        tracing::debug!(
            nodes = graph.num_nodes(),
            edges = graph.num_edges(),
            attributes = attributes.len(),
            "loaded dataset"
        );
        Ok(Self { graph, attributes })
    }
}
