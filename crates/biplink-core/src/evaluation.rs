//! Evaluation metrics for link prediction and node classification.
//!
//! # ROC-AUC
//!
//! The area under the ROC curve equals the probability that a random
//! positive scores higher than a random negative (Mann-Whitney U):
//!
//! ```text
//! AUC = (R_pos - P(P+1)/2) / (P * N)
//! ```
//!
//! where `R_pos` is the rank sum of the positives when all scores are
//! ranked ascending, with tied scores sharing their average rank (a tie
//! counts as half a win). Any monotone transform of the scores (e.g. a
//! sigmoid over logits) leaves it unchanged.

use crate::bipartite::CandidatePair;
use crate::embedding::{read_matrix_csv, EmbeddingMatrix};
use crate::scoring::score_pair;
use crate::split::EdgeSplit;
use crate::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// ROC-AUC of `scores` against binary `labels` (`true` = positive).
pub fn roc_auc(labels: &[bool], scores: &[f32]) -> Result<f64> {
    if labels.len() != scores.len() {
        return Err(Error::MalformedInput(format!(
            "{} labels but {} scores",
            labels.len(),
            scores.len()
        )));
    }
    let num_pos = labels.iter().filter(|&&l| l).count();
    let num_neg = labels.len() - num_pos;
    if num_pos == 0 || num_neg == 0 {
        return Err(Error::UndefinedMetric(
            "ROC-AUC needs at least one positive and one negative".into(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut pos_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based: start+1 ..= end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let tied_pos = order[start..end].iter().filter(|&&i| labels[i]).count();
        pos_rank_sum += avg_rank * tied_pos as f64;
        start = end;
    }

    let p = num_pos as f64;
    let n = num_neg as f64;
    Ok((pos_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Validation and test ROC-AUC of a set of embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkEvaluation {
    pub val_auc: f64,
    pub test_auc: f64,
}

impl LinkEvaluation {
    pub fn summary(&self) -> String {
        format!("Val AUC: {:.4} | Test AUC: {:.4}", self.val_auc, self.test_auc)
    }
}

fn split_auc(embeddings: &EmbeddingMatrix, pos: &[crate::graph::Edge], neg: &[CandidatePair]) -> Result<f64> {
    let mut labels = Vec::with_capacity(pos.len() + neg.len());
    let mut scores = Vec::with_capacity(pos.len() + neg.len());
    for e in pos {
        labels.push(true);
        scores.push(score_pair(embeddings, CandidatePair(e.source, e.target))?);
    }
    for &pair in neg {
        labels.push(false);
        scores.push(score_pair(embeddings, pair)?);
    }
    roc_auc(&labels, &scores)
}

/// Score the held-out positives and negatives of `split`.
pub fn evaluate_split(embeddings: &EmbeddingMatrix, split: &EdgeSplit) -> Result<LinkEvaluation> {
    Ok(LinkEvaluation {
        val_auc: split_auc(embeddings, &split.val_pos, &split.val_neg)?,
        test_auc: split_auc(embeddings, &split.test_pos, &split.test_neg)?,
    })
}

/// Read class logits: a headerless CSV with one row per node and one column per class.
pub fn read_logits_csv<R: Read>(reader: R) -> Result<Array2<f32>> {
    read_matrix_csv(reader, "logits")
}

pub fn logits_from_csv_file(path: impl AsRef<Path>) -> Result<Array2<f32>> {
    let file = std::fs::File::open(path)?;
    read_logits_csv(std::io::BufReader::new(file))
}

/// Index of the largest logit in each row; ties go to the lowest index.
pub fn argmax_labels(logits: &Array2<f32>) -> Vec<usize> {
    logits
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
                .0
        })
        .collect()
}

/// Fraction of positions where `predicted` equals `truth`.
pub fn accuracy(predicted: &[usize], truth: &[usize]) -> Result<f64> {
    if predicted.len() != truth.len() {
        return Err(Error::MalformedInput(format!(
            "{} predictions but {} labels",
            predicted.len(),
            truth.len()
        )));
    }
    if truth.is_empty() {
        return Err(Error::UndefinedMetric("accuracy of zero labels".into()));
    }
    let correct = predicted.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(correct as f64 / truth.len() as f64)
}

/// Number of distinct labels.
pub fn num_classes(labels: &[usize]) -> usize {
    labels.iter().collect::<BTreeSet<_>>().len()
}
