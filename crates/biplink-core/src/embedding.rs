//! Node embeddings produced by an external model.

use crate::graph::NodeId;
use crate::{Error, Result};
use ndarray::{Array2, ArrayView1};
use std::io::Read;
use std::path::Path;

/// Row-major embedding matrix; row `i` is the embedding of node `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    values: Array2<f32>,
}

/// Stack equal-length rows into a matrix. `what` names the rows in errors.
fn rows_to_array(rows: Vec<Vec<f32>>, what: &str) -> Result<Array2<f32>> {
    let n = rows.len();
    let dim = rows.first().map_or(0, Vec::len);
    if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != dim) {
        return Err(Error::MalformedInput(format!(
            "{} row {} has {} values, expected {}",
            what,
            i,
            r.len(),
            dim
        )));
    }
    let flat: Vec<f32> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((n, dim), flat).map_err(|e| Error::MalformedInput(format!("{} shape: {}", what, e)))
}

/// Read a headerless, comma-separated numeric table into a dense matrix.
///
/// `what` names the table in error messages (`"embedding"`, `"logits"`).
pub fn read_matrix_csv<R: Read>(reader: R, what: &str) -> Result<Array2<f32>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let row = record
            .iter()
            .map(|field| {
                field
                    .parse::<f32>()
                    .map_err(|_| Error::MalformedInput(format!("{} row {} has non-numeric value '{}'", what, i, field)))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    rows_to_array(rows, what)
}

impl EmbeddingMatrix {
    pub fn from_array(values: Array2<f32>) -> Self {
        Self { values }
    }

    /// Build from one vector per node. All rows must have the same length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        rows_to_array(rows, "embedding").map(Self::from_array)
    }

    /// Read a headerless, comma-separated table (one row per node).
    pub fn read_csv<R: Read>(reader: R) -> Result<Self> {
        read_matrix_csv(reader, "embedding").map(Self::from_array)
    }

    pub fn from_csv_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::read_csv(std::io::BufReader::new(file))
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn num_nodes(&self) -> usize {
        self.values.nrows()
    }

    pub fn dim(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, node: NodeId) -> Option<ArrayView1<'_, f32>> {
        (node < self.num_nodes()).then(|| self.values.row(node))
    }

    /// Fail unless there is exactly one row per node of a `num_nodes` graph.
    pub fn require_nodes(&self, num_nodes: usize) -> Result<()> {
        if self.num_nodes() != num_nodes {
            return Err(Error::MalformedInput(format!(
                "embeddings have {} rows but the graph has {} nodes",
                self.num_nodes(),
                num_nodes
            )));
        }
        Ok(())
    }

    /// Embedding of `node`, or `MalformedInput` if the matrix has no such row.
    pub fn require_row(&self, node: NodeId) -> Result<ArrayView1<'_, f32>> {
        self.row(node).ok_or_else(|| {
            Error::MalformedInput(format!(
                "node {} has no embedding ({} rows)",
                node,
                self.num_nodes()
            ))
        })
    }
}
