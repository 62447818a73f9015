// Allow minor clippy style warnings at crate level
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]

//! Bipartite link-prediction data preparation and edge scoring.
//!
//! This crate covers everything around a link-prediction model except the
//! model itself:
//!
//! - [`Graph`] / [`Dataset`] - typed node-link graphs loaded from JSON
//! - [`BipartiteIndex`] - observed-edge index and candidate-pair enumeration
//! - [`FeatureMatrix`] - dense, type-masked node features
//! - [`scoring`] - dot-product edge scoring, threshold and ranked modes
//! - [`split`] - train/val/test edge split and negative sampling
//! - [`evaluation`] - ROC-AUC and classification accuracy
//! - [`export`] - artifacts for the visualization front end
//!
//! Embeddings come from an external training step as an [`EmbeddingMatrix`].
//!
//! # Example
//!
//! ```rust
//! use biplink_core::scoring::{classify, rank};
//! use biplink_core::{BipartiteIndex, EmbeddingMatrix, EnumerationConfig, Graph};
//!
//! let graph = Graph::from_parts(
//!     vec![(0, "movie".into()), (1, "movie".into()), (2, "user".into())],
//!     &[(0, 2)],
//! )
//! .unwrap();
//! let index = BipartiteIndex::build(&graph, &EnumerationConfig::default()).unwrap();
//! let candidates = index.enumerate();
//!
//! let z = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]]).unwrap();
//! assert_eq!(classify(&z, &index.allowed_pairs(), true).unwrap().len(), 2);
//!
//! let ranked = rank(&z, &candidates.unseen).unwrap();
//! assert_eq!(ranked[0].score, 1.0);
//! ```

pub mod bipartite;
pub mod config;
pub mod dataset;
pub mod embedding;
mod error;
pub mod evaluation;
pub mod export;
pub mod features;
mod graph;
pub mod pipeline;
pub mod scoring;
pub mod split;

pub use bipartite::{BipartiteIndex, CandidatePair, Candidates, EnumerationConfig, ObservedEdgeSet, Partition};
pub use config::PipelineConfig;
pub use dataset::Dataset;
pub use embedding::EmbeddingMatrix;
pub use error::{Error, Result};
pub use features::{FeatureConfig, FeatureMatrix};
pub use graph::{AttributeRow, AttributeSpec, Edge, Graph, GraphStats, Node, NodeId, NodeType};
pub use scoring::{ScoreMode, ScoredPair};
pub use split::{EdgeSplit, SplitConfig};
