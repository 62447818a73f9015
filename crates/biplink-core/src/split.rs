//! Edge splitting and negative sampling for link-prediction training.
//!
//! The observed edges are shuffled and cut into validation, test and training
//! positives. Negatives are drawn from the unseen candidate pairs, so they are
//! never observed edges and always cross the bipartite split.

use crate::bipartite::{BipartiteIndex, CandidatePair};
use crate::graph::Edge;
use crate::{Error, Result};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Edge split settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SplitConfig {
    /// Fraction of observed edges held out for validation.
    pub val_ratio: f64,
    /// Fraction of observed edges held out for testing.
    pub test_ratio: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            val_ratio: 0.05,
            test_ratio: 0.1,
            seed: 42,
        }
    }
}

/// Train/validation/test edges plus validation/test negatives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeSplit {
    pub train_pos: Vec<Edge>,
    pub val_pos: Vec<Edge>,
    pub val_neg: Vec<CandidatePair>,
    pub test_pos: Vec<Edge>,
    pub test_neg: Vec<CandidatePair>,
}

/// Split the observed edges of `index`.
///
/// With `n` distinct edges, `floor(val_ratio * n)` go to validation,
/// `floor(test_ratio * n)` to test and the rest to training. Validation and
/// test each get as many negatives as positives when enough unseen pairs
/// exist; the two negative sets are disjoint.
pub fn split_edges(index: &BipartiteIndex, config: &SplitConfig) -> Result<EdgeSplit> {
    let ratios_ok = (0.0..=1.0).contains(&config.val_ratio)
        && (0.0..=1.0).contains(&config.test_ratio)
        && config.val_ratio + config.test_ratio <= 1.0;
    if !ratios_ok {
        return Err(Error::MalformedInput(format!(
            "invalid split ratios: val {} test {}",
            config.val_ratio, config.test_ratio
        )));
    }

    let mut rng = XorShiftRng::seed_from_u64(config.seed);
    let mut edges = index.observed_edges().edges();
    edges.shuffle(&mut rng);

    let n = edges.len();
    let n_val = (config.val_ratio * n as f64).floor() as usize;
    let n_test = (config.test_ratio * n as f64).floor() as usize;

    let train_pos = edges.split_off(n_val + n_test);
    let test_pos = edges.split_off(n_val);
    let val_pos = edges;

    let mut sampler = NegativeSampler::new(index, rng);
    let mut negatives = sampler.sample(n_val + n_test);
    let test_neg = negatives.split_off(n_val.min(negatives.len()));
    let val_neg = negatives;

    tracing::debug!(
        train = train_pos.len(),
        val = val_pos.len(),
        test = test_pos.len(),
        val_neg = val_neg.len(),
        test_neg = test_neg.len(),
        "split observed edges"
    );

    Ok(EdgeSplit {
        train_pos,
        val_pos,
        val_neg,
        test_pos,
        test_neg,
    })
}

/// Draws distinct unseen candidate pairs at random.
pub struct NegativeSampler<'a, R: Rng = XorShiftRng> {
    index: &'a BipartiteIndex,
    rng: R,
}

impl<'a> NegativeSampler<'a, XorShiftRng> {
    /// Sampler seeded for reproducibility.
    pub fn seeded(index: &'a BipartiteIndex, seed: u64) -> Self {
        Self::new(index, XorShiftRng::seed_from_u64(seed))
    }
}

impl<'a, R: Rng> NegativeSampler<'a, R> {
    pub fn new(index: &'a BipartiteIndex, rng: R) -> Self {
        Self { index, rng }
    }

    /// Up to `k` distinct unseen pairs; fewer only if fewer exist.
    ///
    /// Uses rejection sampling over the cross product when unseen pairs are
    /// plentiful, and a full scan otherwise.
    pub fn sample(&mut self, k: usize) -> Vec<CandidatePair> {
        let available = self.index.num_unseen();
        if k == 0 || available == 0 {
            return Vec::new();
        }
        if k.saturating_mul(2) >= available {
            return self.sample_by_scan(k);
        }

        let p = self.index.partition();
        let observed = self.index.observed_edges();
        let mut seen = HashSet::with_capacity(k);
        let mut out = Vec::with_capacity(k);
        while out.len() < k {
            let pair = CandidatePair(
                p.other[self.rng.gen_range(0..p.other.len())],
                p.user[self.rng.gen_range(0..p.user.len())],
            );
            if !observed.contains(pair.0, pair.1) && seen.insert(pair) {
                out.push(pair);
            }
        }
        out
    }

    fn sample_by_scan(&mut self, k: usize) -> Vec<CandidatePair> {
        let mut unseen: Vec<CandidatePair> = self
            .index
            .stream()
            .filter(|c| !c.observed)
            .map(|c| c.pair)
            .collect();
        unseen.shuffle(&mut self.rng);
        unseen.truncate(k);
        unseen
    }
}

/// Labels for `num_pos` positives followed by `num_neg` negatives.
pub fn link_labels(num_pos: usize, num_neg: usize) -> Vec<f32> {
    let mut labels = vec![1.0; num_pos];
    labels.resize(num_pos + num_neg, 0.0);
    labels
}
