//! CART tree growing shared by the forest and the boosted trees.
//!
//! A [`Target`] supplies the split statistic: class counts with Gini impurity
//! for the forest, gradient sums with squared error for boosting. Splits are
//! axis-aligned at midpoints between adjacent distinct values and are kept
//! only when they lower the node cost. Each tree records the total cost
//! decrease per feature, which backs the impurity-based importances.

use rand::rngs::StdRng;
use rand::seq::index;

/// Cost below which a node is treated as pure.
const PURE_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
enum Node<L> {
    Leaf {
        value: L,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Tree<L> {
    nodes: Vec<Node<L>>,
    /// Total cost decrease contributed by each feature.
    gains: Vec<f64>,
}

impl<L: Copy> Tree<L> {
    pub(crate) fn predict(&self, row: &[f64]) -> L {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn gains(&self) -> &[f64] {
        &self.gains
    }

    #[cfg(test)]
    pub(crate) fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// What a tree is fitted to.
pub(crate) trait Target {
    type Stats: Clone;
    type Leaf: Copy;

    fn empty(&self) -> Self::Stats;
    fn add(&self, stats: &mut Self::Stats, sample: usize);
    fn remove(&self, stats: &mut Self::Stats, sample: usize);
    /// Sample count times node impurity.
    fn cost(&self, stats: &Self::Stats) -> f64;
    fn leaf(&self, stats: &Self::Stats) -> Self::Leaf;

    fn stats(&self, samples: &[usize]) -> Self::Stats {
        let mut stats = self.empty();
        for &s in samples {
            self.add(&mut stats, s);
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GrowParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features tried per split, drawn without replacement.
    pub max_features: usize,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    cost: f64,
}

struct Grower<'a, T: Target> {
    target: &'a T,
    rows: &'a [Vec<f64>],
    n_features: usize,
    params: GrowParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node<T::Leaf>>,
    gains: Vec<f64>,
}

/// Grow one tree on `samples` (indices into `rows`, repeats allowed).
pub(crate) fn grow<T: Target>(
    target: &T,
    rows: &[Vec<f64>],
    n_features: usize,
    samples: &[usize],
    params: GrowParams,
    rng: &mut StdRng,
) -> Tree<T::Leaf> {
    let mut grower = Grower {
        target,
        rows,
        n_features,
        params,
        rng,
        nodes: Vec::new(),
        gains: vec![0.0; n_features],
    };
    grower.build(samples, 0);
    Tree {
        nodes: grower.nodes,
        gains: grower.gains,
    }
}

impl<T: Target> Grower<'_, T> {
    fn best_split(&mut self, samples: &[usize], parent: &T::Stats) -> Option<BestSplit> {
        let tried = self.params.max_features.clamp(1, self.n_features.max(1)).min(self.n_features);
        let candidates = index::sample(&mut *self.rng, self.n_features, tried);
        let total = samples.len();
        let mut best: Option<BestSplit> = None;

        for feature in candidates.iter() {
            let mut order: Vec<usize> = samples.to_vec();
            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left = self.target.empty();
            let mut right = parent.clone();
            for pos in 0..total - 1 {
                let s = order[pos];
                self.target.add(&mut left, s);
                self.target.remove(&mut right, s);

                let here = self.rows[s][feature];
                let next = self.rows[order[pos + 1]][feature];
                if here >= next {
                    continue;
                }
                let cost = self.target.cost(&left) + self.target.cost(&right);
                if best.as_ref().is_none_or(|b| cost < b.cost) {
                    best = Some(BestSplit {
                        feature,
                        threshold: here + (next - here) / 2.0,
                        cost,
                    });
                }
            }
        }
        best
    }

    fn build(&mut self, samples: &[usize], depth: usize) -> usize {
        let stats = self.target.stats(samples);
        let node = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.target.leaf(&stats),
        });

        let parent_cost = self.target.cost(&stats);
        if parent_cost <= PURE_EPS
            || depth >= self.params.max_depth
            || samples.len() < self.params.min_samples_split.max(2)
        {
            return node;
        }
        let Some(split) = self.best_split(samples, &stats) else {
            return node;
        };
        if split.cost >= parent_cost {
            return node;
        }
        self.gains[split.feature] += parent_cost - split.cost;

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .iter()
            .partition(|&&s| self.rows[s][split.feature] <= split.threshold);
        let left = self.build(&left_samples, depth + 1);
        let right = self.build(&right_samples, depth + 1);
        self.nodes[node] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node
    }
}

/// Per-tree gains normalized to sum 1, averaged, then renormalized.
///
/// All zeros when no tree ever split.
pub(crate) fn mean_importances<'a, L: 'a>(trees: impl IntoIterator<Item = &'a Tree<L>>, n_features: usize) -> Vec<f64> {
    let mut acc = vec![0.0; n_features];
    for tree in trees {
        let total: f64 = tree.gains.iter().sum();
        if total > 0.0 {
            for (a, g) in acc.iter_mut().zip(&tree.gains) {
                *a += g / total;
            }
        }
    }
    let total: f64 = acc.iter().sum();
    if total > 0.0 {
        acc.iter_mut().for_each(|a| *a /= total);
    }
    acc
}
