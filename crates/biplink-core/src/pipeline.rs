//! End-to-end stages of a link-prediction run.
//!
//! ```text
//! Dataset -> prepare() -> Prepared --(external training)--> EmbeddingMatrix
//!                                                              |
//!                           LinkPredictionResults <- predict_links()
//! ```
//!
//! Each stage takes everything it needs as arguments and returns its output;
//! there is no shared run state.

use crate::bipartite::{BipartiteIndex, CandidatePair, Candidates};
use crate::config::PipelineConfig;
use crate::dataset::Dataset;
use crate::embedding::EmbeddingMatrix;
use crate::export::LinkPredictionResults;
use crate::features::FeatureMatrix;
use crate::scoring::{classify, partner_map, rank};
use crate::Result;

/// Everything derived from a dataset before training.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub index: BipartiteIndex,
    pub candidates: Candidates,
    pub features: FeatureMatrix,
}

/// Build the bipartite index, enumerate candidates and build features.
pub fn prepare(dataset: &Dataset, config: &PipelineConfig) -> Result<Prepared> {
    let index = BipartiteIndex::build(&dataset.graph, &config.enumeration)?;

    #[cfg(feature = "parallel")]
    let candidates = index.enumerate_parallel();
    #[cfg(not(feature = "parallel"))]
    let candidates = index.enumerate();

    let features = FeatureMatrix::build(&dataset.graph, &dataset.attributes, &config.features)?;

    tracing::info!(
        candidates = candidates.len(),
        observed = candidates.observed.len(),
        unseen = candidates.unseen.len(),
        features = features.num_features(),
        "prepared dataset"
    );
    Ok(Prepared {
        index,
        candidates,
        features,
    })
}

/// Classify the candidate universe and rank the unseen pairs.
///
/// `embeddings` must hold exactly one row per node of the indexed graph.
pub fn predict_links(
    index: &BipartiteIndex,
    unseen: &[CandidatePair],
    embeddings: &EmbeddingMatrix,
) -> Result<LinkPredictionResults> {
    embeddings.require_nodes(index.num_nodes())?;
    let allowed = index.allowed_pairs();
    let ranked = rank(embeddings, unseen)?;
    let results = LinkPredictionResults {
        is_link_prediction: true,
        true_allow_edges: classify(embeddings, &allowed, true)?,
        false_allow_edges: classify(embeddings, &allowed, false)?,
        true_unseen_edges_sorted: partner_map(&ranked),
    };
    tracing::info!(
        true_allow = results.true_allow_edges.len(),
        false_allow = results.false_allow_edges.len(),
        ranked_unseen = ranked.len(),
        "scored candidate pairs"
    );
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttributeSpec, Graph, NodeType};
    use crate::Error;

    #[test]
    fn test_prepare_and_predict() {
        let graph = Graph::from_parts(
            vec![
                (0, NodeType::new("other")),
                (1, NodeType::new("other")),
                (2, NodeType::new("user")),
                (3, NodeType::new("user")),
            ],
            &[(0, 2)],
        )
        .unwrap();
        let dataset = Dataset {
            graph,
            attributes: vec![AttributeSpec::new("age", "genre")],
        };
        let prepared = prepare(&dataset, &PipelineConfig::default()).unwrap();
        assert_eq!(prepared.candidates.observed, vec![CandidatePair(0, 2)]);
        assert_eq!(
            prepared.candidates.unseen,
            vec![CandidatePair(0, 3), CandidatePair(1, 2), CandidatePair(1, 3)]
        );

        let emb = EmbeddingMatrix::from_rows(vec![vec![1.0], vec![-1.0], vec![2.0], vec![0.5]]).unwrap();
        let results = predict_links(&prepared.index, &prepared.candidates.unseen, &emb).unwrap();
        assert!(results.is_link_prediction);
        assert_eq!(results.true_allow_edges, vec![CandidatePair(0, 2), CandidatePair(0, 3)]);
        assert_eq!(results.false_allow_edges, vec![CandidatePair(1, 2), CandidatePair(1, 3)]);
        assert_eq!(results.true_unseen_edges_sorted.len(), 2);
        assert_eq!(results.true_unseen_edges_sorted[&0], vec![3]);
    }

    #[test]
    fn test_predict_rejects_misaligned_embeddings() {
        let graph = Graph::from_parts(vec![(0, NodeType::new("other")), (1, NodeType::new("user"))], &[]).unwrap();
        let index = BipartiteIndex::build(&graph, &Default::default()).unwrap();
        let unseen = index.enumerate().unseen;

        let extra = EmbeddingMatrix::from_rows(vec![vec![1.0], vec![1.0], vec![1.0]]).unwrap();
        let err = predict_links(&index, &unseen, &extra).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(ref m) if m.contains("3 rows")));

        let exact = EmbeddingMatrix::from_rows(vec![vec![1.0], vec![1.0]]).unwrap();
        assert_eq!(predict_links(&index, &unseen, &exact).unwrap().true_allow_edges, vec![CandidatePair(0, 1)]);
    }
}
