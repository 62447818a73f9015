//! Bipartite candidate-pair enumeration.
//!
//! Nodes are split into two sides: the *user* side (nodes whose type equals
//! the configured user type) and the *other* side (everything else). The
//! candidate universe is the full cross product `other x user`; each pair is
//! classified as **observed** (an input edge) or **unseen** (a link-prediction
//! target).
//!
//! Enumeration order is fixed: other-side ids ascending in the outer loop,
//! user-side ids ascending in the inner loop. Downstream ranking relies on it
//! for reproducible tie order, so every variant here produces exactly that
//! order:
//!
//! - [`BipartiteIndex::enumerate`] - materialized, sequential
//! - [`BipartiteIndex::enumerate_parallel`] - materialized, split over rayon workers
//! - [`BipartiteIndex::stream`] - lazy, O(1) memory
//!
//! # Example
//!
//! ```rust
//! use biplink_core::{BipartiteIndex, CandidatePair, EnumerationConfig, Graph};
//!
//! let graph = Graph::from_parts(
//!     vec![(0, "other".into()), (1, "other".into()), (2, "user".into())],
//!     &[(0, 2)],
//! )
//! .unwrap();
//!
//! let index = BipartiteIndex::build(&graph, &EnumerationConfig::default()).unwrap();
//! let candidates = index.enumerate();
//!
//! assert_eq!(candidates.observed, vec![CandidatePair(0, 2)]);
//! assert_eq!(candidates.unseen, vec![CandidatePair(1, 2)]);
//! ```

use crate::graph::{Edge, Graph, NodeId, NodeType};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::iter::FusedIterator;

/// Enumeration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnumerationConfig {
    /// Node type forming the user side; every other type is the other side.
    pub user_type: NodeType,
    /// Fail with [`Error::EmptyPartition`] instead of enumerating nothing
    /// when a side is empty.
    pub strict: bool,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            user_type: NodeType::new("user"),
            strict: false,
        }
    }
}

/// A cross-partition node pair `(other, user)`. Serializes as `[other, user]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CandidatePair(pub NodeId, pub NodeId);

impl CandidatePair {
    pub fn other(&self) -> NodeId {
        self.0
    }

    pub fn user(&self) -> NodeId {
        self.1
    }

    /// The canonical undirected edge this pair would form.
    pub fn as_edge(&self) -> Edge {
        Edge::new(self.0, self.1)
    }
}

/// Set of observed edges with O(1) order-independent membership.
///
/// Indexed as smaller endpoint -> set of larger endpoints.
#[derive(Debug, Clone, Default)]
pub struct ObservedEdgeSet {
    index: HashMap<NodeId, HashSet<NodeId>>,
    len: usize,
}

impl ObservedEdgeSet {
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Self {
        let mut set = Self::default();
        for e in edges {
            // Edge is already canonical; re-canonicalize anyway for hand-built values.
            let e = Edge::new(e.source, e.target);
            if set.index.entry(e.source).or_default().insert(e.target) {
                set.len += 1;
            }
        }
        set
    }

    /// Whether `{u, v}` is an observed edge, in either orientation.
    pub fn contains(&self, u: NodeId, v: NodeId) -> bool {
        let (lo, hi) = (u.min(v), u.max(v));
        self.index.get(&lo).is_some_and(|targets| targets.contains(&hi))
    }

    /// Number of distinct edges.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All distinct edges, sorted.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .index
            .iter()
            .flat_map(|(&s, targets)| targets.iter().map(move |&t| Edge { source: s, target: t }))
            .collect();
        edges.sort_unstable();
        edges
    }
}

/// The two sides of the bipartite split, each in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub other: Vec<NodeId>,
    pub user: Vec<NodeId>,
}

impl Partition {
    pub fn from_graph(graph: &Graph, user_type: &NodeType) -> Self {
        let (user, other): (Vec<_>, Vec<_>) = graph
            .nodes()
            .iter()
            .map(|n| (n.id, &n.node_type == user_type))
            .partition(|&(_, is_user)| is_user);
        Self {
            other: other.into_iter().map(|(id, _)| id).collect(),
            user: user.into_iter().map(|(id, _)| id).collect(),
        }
    }

    /// Size of the candidate universe `|other| * |user|`.
    pub fn num_candidates(&self) -> usize {
        self.other.len() * self.user.len()
    }
}

/// A candidate pair and whether it is an observed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedPair {
    pub pair: CandidatePair,
    pub observed: bool,
}

/// Materialized enumeration result. Both lists are in enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidates {
    pub observed: Vec<CandidatePair>,
    pub unseen: Vec<CandidatePair>,
}

impl Candidates {
    pub fn len(&self) -> usize {
        self.observed.len() + self.unseen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty() && self.unseen.is_empty()
    }

    fn push(&mut self, c: ClassifiedPair) {
        if c.observed {
            self.observed.push(c.pair);
        } else {
            self.unseen.push(c.pair);
        }
    }
}

/// Bipartite split plus observed-edge index, built once per graph.
#[derive(Debug, Clone)]
pub struct BipartiteIndex {
    partition: Partition,
    observed: ObservedEdgeSet,
}

impl BipartiteIndex {
    /// Partition the graph and index its edges.
    pub fn build(graph: &Graph, config: &EnumerationConfig) -> Result<Self> {
        let partition = Partition::from_graph(graph, &config.user_type);

        if partition.user.is_empty() || partition.other.is_empty() {
            let side = if partition.user.is_empty() {
                config.user_type.to_string()
            } else {
                format!("other than {}", config.user_type)
            };
            if config.strict {
                return Err(Error::EmptyPartition(side));
            }
            tracing::warn!(side = %side, "bipartite side is empty, no candidates");
        }

        let observed = ObservedEdgeSet::from_edges(graph.edges());
        tracing::debug!(
            other = partition.other.len(),
            user = partition.user.len(),
            observed_edges = observed.len(),
            "built bipartite index"
        );
        Ok(Self { partition, observed })
    }

    /// Nodes on either side, i.e. every node of the indexed graph.
    pub fn num_nodes(&self) -> usize {
        self.partition.other.len() + self.partition.user.len()
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn observed_edges(&self) -> &ObservedEdgeSet {
        &self.observed
    }

    fn classify(&self, other: NodeId, user: NodeId) -> ClassifiedPair {
        ClassifiedPair {
            pair: CandidatePair(other, user),
            observed: self.observed.contains(other, user),
        }
    }

    /// Lazily enumerate every candidate pair in enumeration order.
    pub fn stream(&self) -> CandidateStream<'_> {
        CandidateStream {
            index: self,
            outer: 0,
            inner: 0,
        }
    }

    /// The full candidate universe, in enumeration order.
    pub fn allowed_pairs(&self) -> Vec<CandidatePair> {
        self.stream().map(|c| c.pair).collect()
    }

    /// Enumerate and classify every candidate pair.
    pub fn enumerate(&self) -> Candidates {
        let mut out = Candidates::default();
        for c in self.stream() {
            out.push(c);
        }
        out
    }

    /// Same result as [`enumerate`](Self::enumerate), with the outer loop
    /// split across rayon workers.
    #[cfg(feature = "parallel")]
    pub fn enumerate_parallel(&self) -> Candidates {
        use rayon::prelude::*;

        // Indexed collect keeps one chunk per outer node, in outer order.
        let rows: Vec<Candidates> = self
            .partition
            .other
            .par_iter()
            .map(|&other| {
                let mut row = Candidates::default();
                for &user in &self.partition.user {
                    row.push(self.classify(other, user));
                }
                row
            })
            .collect();

        let mut out = Candidates::default();
        for row in rows {
            out.observed.extend(row.observed);
            out.unseen.extend(row.unseen);
        }
        out
    }

    /// Number of unseen candidate pairs, without enumerating them.
    ///
    /// Counts observed edges that cross the partition; edges inside one side
    /// are not candidates.
    pub fn num_unseen(&self) -> usize {
        let user: HashSet<NodeId> = self.partition.user.iter().copied().collect();
        let crossing = self
            .observed
            .edges()
            .into_iter()
            .filter(|e| user.contains(&e.source) != user.contains(&e.target))
            .count();
        self.partition.num_candidates() - crossing
    }
}

/// Lazy, finite iterator over classified candidate pairs.
///
/// Yields exactly the sequence of [`BipartiteIndex::enumerate`].
#[derive(Debug, Clone)]
pub struct CandidateStream<'a> {
    index: &'a BipartiteIndex,
    outer: usize,
    inner: usize,
}

impl Iterator for CandidateStream<'_> {
    type Item = ClassifiedPair;

    fn next(&mut self) -> Option<Self::Item> {
        let p = &self.index.partition;
        if p.user.is_empty() {
            return None;
        }
        let other = *p.other.get(self.outer)?;
        let user = p.user[self.inner];

        self.inner += 1;
        if self.inner == p.user.len() {
            self.inner = 0;
            self.outer += 1;
        }
        Some(self.index.classify(other, user))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let p = &self.index.partition;
        let done = self.outer * p.user.len() + self.inner;
        let remaining = p.num_candidates().saturating_sub(done);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CandidateStream<'_> {}
impl FusedIterator for CandidateStream<'_> {}
