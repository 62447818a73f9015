//! Edge scoring over learned node embeddings.
//!
//! The compatibility logit of a pair `(u, v)` is the raw dot product
//! `<z_u, z_v>`. No sigmoid is applied: a positive logit means "edge",
//! a negative one "no edge", and zero is neither.
//!
//! | Mode | Keeps | Order |
//! |------|-------|-------|
//! | Threshold, predict true | score > 0 | input order |
//! | Threshold, predict false | score < 0 | input order |
//! | Ranked | score > 0 | score descending, ties in input order |
//!
//! Everything here is a pure function of its arguments.

use crate::bipartite::CandidatePair;
use crate::embedding::EmbeddingMatrix;
use crate::graph::NodeId;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How [`predict`] selects and orders pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// Keep pairs on one side of zero, in input order.
    Threshold {
        /// `true` keeps positive logits, `false` keeps negative ones.
        predict_true: bool,
    },
    /// Keep positive logits, best first.
    Ranked,
}

/// A candidate pair with its logit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPair {
    pub pair: CandidatePair,
    pub score: f32,
}

/// Dot-product logit of one pair.
pub fn score_pair(embeddings: &EmbeddingMatrix, pair: CandidatePair) -> Result<f32> {
    let u = embeddings.require_row(pair.0)?;
    let v = embeddings.require_row(pair.1)?;
    Ok(u.dot(&v))
}

/// Logits of every pair, in input order.
pub fn score_pairs(embeddings: &EmbeddingMatrix, pairs: &[CandidatePair]) -> Result<Vec<ScoredPair>> {
    pairs
        .iter()
        .map(|&pair| Ok(ScoredPair { pair, score: score_pair(embeddings, pair)? }))
        .collect()
}

/// Score `pairs` and select/order them according to `mode`.
pub fn predict(embeddings: &EmbeddingMatrix, pairs: &[CandidatePair], mode: ScoreMode) -> Result<Vec<ScoredPair>> {
    let scored = score_pairs(embeddings, pairs)?;
    Ok(match mode {
        ScoreMode::Threshold { predict_true } => scored
            .into_iter()
            .filter(|s| if predict_true { s.score > 0.0 } else { s.score < 0.0 })
            .collect(),
        ScoreMode::Ranked => {
            let mut kept: Vec<ScoredPair> = scored.into_iter().filter(|s| s.score > 0.0).collect();
            // stable: equal scores keep input order
            kept.sort_by(|a, b| b.score.total_cmp(&a.score));
            kept
        }
    })
}

/// Threshold-mode classification returning only the pairs.
pub fn classify(embeddings: &EmbeddingMatrix, pairs: &[CandidatePair], predict_true: bool) -> Result<Vec<CandidatePair>> {
    Ok(predict(embeddings, pairs, ScoreMode::Threshold { predict_true })?
        .into_iter()
        .map(|s| s.pair)
        .collect())
}

/// Ranked-mode prediction.
pub fn rank(embeddings: &EmbeddingMatrix, pairs: &[CandidatePair]) -> Result<Vec<ScoredPair>> {
    predict(embeddings, pairs, ScoreMode::Ranked)
}

/// Group ranked pairs by node: each endpoint lists its partners in rank order.
pub fn partner_map(ranked: &[ScoredPair]) -> BTreeMap<NodeId, Vec<NodeId>> {
    let mut partners: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();
    for s in ranked {
        let CandidatePair(a, b) = s.pair;
        partners.entry(a).or_default().push(b);
        partners.entry(b).or_default().push(a);
    }
    partners
}
