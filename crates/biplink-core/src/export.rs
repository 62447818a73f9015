//! Artifacts consumed by the visualization front end.
//!
//! | File | Content |
//! |------|---------|
//! | `prediction-results.json` | [`LinkPredictionResults`] or [`NodeClassificationResults`] |
//! | `node-embeddings.csv` | one row per node, 3 decimals |
//! | `graph.json` | `{"nodes": [{"id"}], "links": [{"source", "target"}]}` |
//! | `features.csv` | feature matrix, optionally binarized |
//! | `edge-split.json` | [`EdgeSplit`] |
//! | `candidates.csv` | `other,user,observed` per candidate pair, enumeration order |

use crate::bipartite::{CandidatePair, ClassifiedPair};
use crate::dataset::GRAPH_FILE;
use crate::embedding::EmbeddingMatrix;
use crate::features::FeatureMatrix;
use crate::graph::{Edge, Graph, NodeId};
use crate::split::EdgeSplit;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const PREDICTION_RESULTS_FILE: &str = "prediction-results.json";
pub const EMBEDDINGS_FILE: &str = "node-embeddings.csv";
pub const FEATURES_FILE: &str = "features.csv";
pub const EDGE_SPLIT_FILE: &str = "edge-split.json";
pub const TRUE_LABELS_FILE: &str = "true-labels.txt";
pub const PRED_LABELS_FILE: &str = "pred-labels.txt";
pub const CANDIDATES_FILE: &str = "candidates.csv";

/// Outcome of a link-prediction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPredictionResults {
    /// Always `true`; lets readers tell this apart from node classification.
    pub is_link_prediction: bool,
    /// Candidate pairs with a positive logit, enumeration order.
    pub true_allow_edges: Vec<CandidatePair>,
    /// Candidate pairs with a negative logit, enumeration order.
    pub false_allow_edges: Vec<CandidatePair>,
    /// For every node in a predicted unseen edge, its partners best first.
    pub true_unseen_edges_sorted: BTreeMap<NodeId, Vec<NodeId>>,
}

/// Outcome of a node-classification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeClassificationResults {
    pub pred_labels: Vec<usize>,
    pub true_labels: Vec<usize>,
    pub num_node_classes: usize,
}

impl NodeClassificationResults {
    pub fn new(pred_labels: Vec<usize>, true_labels: Vec<usize>) -> Self {
        let num_node_classes = crate::evaluation::num_classes(&true_labels);
        Self {
            pred_labels,
            true_labels,
            num_node_classes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub id: NodeId,
}

/// Id-only graph topology for visualization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphTopology {
    pub nodes: Vec<NodeEntry>,
    pub links: Vec<Edge>,
}

impl From<&Graph> for GraphTopology {
    fn from(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes().iter().map(|n| NodeEntry { id: n.id }).collect(),
            links: graph.edges().to_vec(),
        }
    }
}

/// Write embeddings as comma-separated rows with 3 decimals.
pub fn write_embeddings_csv<W: Write>(writer: W, embeddings: &EmbeddingMatrix) -> Result<()> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for row in embeddings.as_array().rows() {
        w.write_record(row.iter().map(|v| format!("{:.3}", v)))?;
    }
    w.flush()?;
    Ok(())
}

/// Write features; `binary` writes `1` for positive values and `0` otherwise.
pub fn write_features_csv<W: Write>(writer: W, features: &FeatureMatrix, binary: bool) -> Result<()> {
    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    if binary {
        for row in features.binarized().rows() {
            w.write_record(row.iter().map(|v| v.to_string()))?;
        }
    } else {
        for row in features.as_array().rows() {
            w.write_record(row.iter().map(|v| format!("{:.3}", v)))?;
        }
    }
    w.flush()?;
    Ok(())
}

/// Write classified pairs with an `other,user,observed` header.
///
/// Consumes the iterator row by row, so a [`CandidateStream`](crate::bipartite::CandidateStream)
/// is written without materializing the candidate universe. Returns the number of rows.
pub fn write_candidates_csv<W: Write>(writer: W, pairs: impl IntoIterator<Item = ClassifiedPair>) -> Result<usize> {
    let mut w = csv::Writer::from_writer(writer);
    w.write_record(["other", "user", "observed"])?;
    let mut rows = 0;
    for c in pairs {
        w.write_record([
            c.pair.other().to_string(),
            c.pair.user().to_string(),
            u8::from(c.observed).to_string(),
        ])?;
        rows += 1;
    }
    w.flush()?;
    Ok(rows)
}

/// One label per line.
pub fn write_labels<W: Write>(mut writer: W, labels: &[usize]) -> Result<()> {
    for label in labels {
        writeln!(writer, "{}", label)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes artifacts into one output directory, created on first use.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn create(&self, name: &str) -> Result<BufWriter<File>> {
        let path = self.dir.join(name);
        tracing::debug!(path = %path.display(), "writing artifact");
        Ok(BufWriter::new(File::create(path)?))
    }

    fn write_json<T: Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let mut w = self.create(name)?;
        serde_json::to_writer(&mut w, value)?;
        w.flush()?;
        Ok(self.dir.join(name))
    }

    pub fn write_link_results(&self, results: &LinkPredictionResults) -> Result<PathBuf> {
        self.write_json(PREDICTION_RESULTS_FILE, results)
    }

    pub fn write_classification_results(&self, results: &NodeClassificationResults) -> Result<PathBuf> {
        self.write_json(PREDICTION_RESULTS_FILE, results)?;
        write_labels(self.create(TRUE_LABELS_FILE)?, &results.true_labels)?;
        write_labels(self.create(PRED_LABELS_FILE)?, &results.pred_labels)?;
        Ok(self.dir.join(PREDICTION_RESULTS_FILE))
    }

    pub fn write_graph(&self, graph: &Graph) -> Result<PathBuf> {
        self.write_json(GRAPH_FILE, &GraphTopology::from(graph))
    }

    pub fn write_split(&self, split: &EdgeSplit) -> Result<PathBuf> {
        self.write_json(EDGE_SPLIT_FILE, split)
    }

    pub fn write_embeddings(&self, embeddings: &EmbeddingMatrix) -> Result<PathBuf> {
        write_embeddings_csv(self.create(EMBEDDINGS_FILE)?, embeddings)?;
        Ok(self.dir.join(EMBEDDINGS_FILE))
    }

    pub fn write_features(&self, features: &FeatureMatrix, binary: bool) -> Result<PathBuf> {
        write_features_csv(self.create(FEATURES_FILE)?, features, binary)?;
        Ok(self.dir.join(FEATURES_FILE))
    }

    /// Returns the path and the number of rows written.
    pub fn write_candidates(&self, pairs: impl IntoIterator<Item = ClassifiedPair>) -> Result<(PathBuf, usize)> {
        let rows = write_candidates_csv(self.create(CANDIDATES_FILE)?, pairs)?;
        Ok((self.dir.join(CANDIDATES_FILE), rows))
    }
}
