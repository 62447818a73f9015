//! Dense, type-masked node feature matrices.
//!
//! Attributes are declared per node type, but the matrix is dense: entry
//! `(n, a)` holds node `n`'s value for attribute `a` when `a` applies to
//! `n`'s type and is exactly `0.0` otherwise, whatever the raw row contains.

use crate::graph::{AttributeSpec, Graph, NodeType};
use crate::{Error, Result};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Feature construction settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Divide each row by its sum (rows summing to zero are left as is).
    pub normalize: bool,
}

/// Node feature matrix: rows are node ids, columns are attribute specs.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    values: Array2<f32>,
}

impl FeatureMatrix {
    /// Build the matrix for `graph` with one column per spec, in declaration order.
    pub fn build(graph: &Graph, specs: &[AttributeSpec], config: &FeatureConfig) -> Result<Self> {
        let mut values = Array2::<f32>::zeros((graph.num_nodes(), specs.len()));

        for (node, mut row) in graph.nodes().iter().zip(values.rows_mut()) {
            for (spec, cell) in specs.iter().zip(row.iter_mut()) {
                if !spec.applies_to(&node.node_type) {
                    continue;
                }
                let raw = node.attributes.get(&spec.name).unwrap_or(&Value::Null);
                *cell = coerce(raw).ok_or_else(|| Error::AttributeCoercion {
                    node: node.id,
                    attribute: spec.name.clone(),
                    value: raw.to_string(),
                })?;
            }
        }

        warn_featureless_types(graph, specs);

        let mut matrix = Self { values };
        if config.normalize {
            matrix.normalize_rows();
        }
        Ok(matrix)
    }

    pub fn from_array(values: Array2<f32>) -> Self {
        Self { values }
    }

    pub fn as_array(&self) -> &Array2<f32> {
        &self.values
    }

    pub fn num_nodes(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn row(&self, node: usize) -> Option<ArrayView1<'_, f32>> {
        (node < self.num_nodes()).then(|| self.values.row(node))
    }

    /// `1` where the value is positive, `0` elsewhere.
    pub fn binarized(&self) -> Array2<u8> {
        self.values.mapv(|v| u8::from(v > 0.0))
    }

    fn normalize_rows(&mut self) {
        for mut row in self.values.axis_iter_mut(Axis(0)) {
            let sum: f32 = row.sum();
            if sum != 0.0 {
                row.mapv_inplace(|v| v / sum);
            }
        }
    }
}

/// Numeric coercion of a raw attribute value.
///
/// Numbers pass through, numeric strings are parsed, booleans become 1/0.
fn coerce(raw: &Value) -> Option<f32> {
    match raw {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Node types with no applicable attribute get all-zero rows; that is a
/// valid "no features" row, but usually worth knowing about.
fn warn_featureless_types(graph: &Graph, specs: &[AttributeSpec]) {
    if specs.is_empty() {
        return;
    }
    let covered: BTreeSet<&NodeType> = specs.iter().map(|s| &s.node_type).collect();
    for node_type in graph.type_counts().keys() {
        if !covered.contains(node_type) {
            tracing::warn!(node_type = %node_type, "no attributes apply to node type, rows are all zero");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use serde_json::json;

    fn node(id: usize, t: &str, attrs: Value) -> Node {
        Node {
            id,
            node_type: NodeType::new(t),
            attributes: attrs.as_object().cloned().unwrap_or_default(),
        }
    }

    fn specs() -> Vec<AttributeSpec> {
        vec![AttributeSpec::new("size", "other"), AttributeSpec::new("age", "user")]
    }

    #[test]
    fn test_masking_scenario() {
        let g = Graph::new(vec![node(0, "other", json!({"size": "5", "age": "30"}))], vec![]).unwrap();
        let m = FeatureMatrix::build(&g, &specs(), &FeatureConfig::default()).unwrap();
        assert_eq!(m.row(0).unwrap().to_vec(), vec![5.0, 0.0]);
    }

    #[test]
    fn test_mixed_types() {
        let g = Graph::new(
            vec![
                node(0, "other", json!({"size": 2.5})),
                node(1, "user", json!({"age": " 41 ", "size": "junk"})),
            ],
            vec![Edge::new(0, 1)],
        )
        .unwrap();
        let m = FeatureMatrix::build(&g, &specs(), &FeatureConfig::default()).unwrap();
        assert_eq!(m.as_array().shape(), &[2, 2]);
        assert_eq!(m.row(0).unwrap().to_vec(), vec![2.5, 0.0]);
        // "junk" is never read: size does not apply to users
        assert_eq!(m.row(1).unwrap().to_vec(), vec![0.0, 41.0]);
    }

    #[test]
    fn test_non_numeric_applicable_value() {
        let g = Graph::new(vec![node(0, "other", json!({"size": "big"}))], vec![]).unwrap();
        let err = FeatureMatrix::build(&g, &specs(), &FeatureConfig::default()).unwrap_err();
        match err {
            Error::AttributeCoercion { node, attribute, .. } => {
                assert_eq!(node, 0);
                assert_eq!(attribute, "size");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_applicable_value() {
        let g = Graph::new(vec![node(0, "other", json!({}))], vec![]).unwrap();
        assert!(FeatureMatrix::build(&g, &specs(), &FeatureConfig::default()).is_err());
    }

    #[test]
    fn test_featureless_type_is_zero_row() {
        let g = Graph::new(vec![node(0, "genre", json!({"size": 3}))], vec![]).unwrap();
        let m = FeatureMatrix::build(&g, &specs(), &FeatureConfig::default()).unwrap();
        assert_eq!(m.row(0).unwrap().to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_normalize_rows() {
        let specs = vec![AttributeSpec::new("a", "user"), AttributeSpec::new("b", "user")];
        let g = Graph::new(
            vec![node(0, "user", json!({"a": 1, "b": 3})), node(1, "user", json!({"a": 0, "b": 0}))],
            vec![],
        )
        .unwrap();
        let m = FeatureMatrix::build(&g, &specs, &FeatureConfig { normalize: true }).unwrap();
        assert_eq!(m.row(0).unwrap().to_vec(), vec![0.25, 0.75]);
        assert_eq!(m.row(1).unwrap().to_vec(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_binarized() {
        let m = FeatureMatrix::from_array(ndarray::array![[0.5, 0.0], [-1.0, 2.0]]);
        assert_eq!(m.binarized(), ndarray::array![[1u8, 0], [0, 1]]);
    }
}
