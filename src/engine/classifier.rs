//! Binary classifier - positive class is index 1
//!
//! Supported exports:
//! - logistic regression (`coef_`, `intercept_`)
//! - random forest (per-tree node arrays, leaf class distributions)
//! - gradient boosting (regression trees on the log-odds scale)

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use super::{check_shape, FeatureRow, ModelError};

/// Marker for "no child" in `children_left` / `children_right`.
pub const TREE_LEAF: i64 = -1;

// ============================================================================
// DECISION TREE
// ============================================================================

/// Array-encoded binary tree. Node 0 is the root.
///
/// Internal nodes route `x[feature] <= threshold` to the left child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    pub fn node_count(&self) -> usize {
        self.children_left.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == TREE_LEAF
    }

    /// Check array lengths and index ranges so `leaf` cannot go out of bounds
    /// or loop forever.
    pub fn validate(&self, n_features: usize, value_width: usize) -> Result<(), String> {
        let n = self.node_count();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!("tree arrays disagree on node count ({})", n));
        }

        for node in 0..n {
            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == TREE_LEAF || right == TREE_LEAF {
                if left != right {
                    return Err(format!("node {} has exactly one child", node));
                }
                if self.value[node].len() != value_width {
                    return Err(format!(
                        "leaf {} has {} values, expected {}",
                        node,
                        self.value[node].len(),
                        value_width
                    ));
                }
                continue;
            }

            // Children must point forward, which also rules out cycles.
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {} has invalid child {}", node, child));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= n_features as i64 {
                return Err(format!("node {} splits on unknown feature {}", node, feature));
            }
        }
        Ok(())
    }

    /// Value vector of the leaf reached by `row`.
    pub fn leaf(&self, row: ArrayView1<'_, f64>) -> &[f64] {
        let mut node = 0usize;
        while !self.is_leaf(node) {
            let feature = self.feature[node] as usize;
            node = if row[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        &self.value[node]
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression {
        coef: Vec<f64>,
        intercept: f64,
    },
    RandomForest {
        n_features: usize,
        trees: Vec<DecisionTree>,
    },
    GradientBoosting {
        n_features: usize,
        init: f64,
        learning_rate: f64,
        trees: Vec<DecisionTree>,
    },
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::LogisticRegression { .. } => "logistic_regression",
            Classifier::RandomForest { .. } => "random_forest",
            Classifier::GradientBoosting { .. } => "gradient_boosting",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Classifier::LogisticRegression { coef, .. } => coef.len(),
            Classifier::RandomForest { n_features, .. } => *n_features,
            Classifier::GradientBoosting { n_features, .. } => *n_features,
        }
    }

    /// Structural checks run once at load time.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Classifier::LogisticRegression { coef, intercept } => {
                if coef.iter().chain(std::iter::once(intercept)).any(|v| !v.is_finite()) {
                    return Err("logistic regression weights must be finite".to_string());
                }
            }
            Classifier::RandomForest { n_features, trees } => {
                if trees.is_empty() {
                    return Err("random forest has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(*n_features, 2)
                        .map_err(|e| format!("tree {}: {}", i, e))?;
                }
            }
            Classifier::GradientBoosting { n_features, init, learning_rate, trees } => {
                if !init.is_finite() || !learning_rate.is_finite() {
                    return Err("gradient boosting init/learning_rate must be finite".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(*n_features, 1)
                        .map_err(|e| format!("tree {}: {}", i, e))?;
                }
            }
        }
        Ok(())
    }

    /// Positive-class probability.
    pub fn predict_probability(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        check_shape("classifier", row, self.n_features())?;

        let p = match self {
            Classifier::LogisticRegression { coef, intercept } => {
                let weights = ArrayView1::from(coef.as_slice());
                sigmoid(weights.dot(row) + intercept)
            }
            Classifier::RandomForest { trees, .. } => {
                let total: f64 = trees
                    .iter()
                    .map(|tree| positive_fraction(tree.leaf(row.view())))
                    .sum();
                total / trees.len() as f64
            }
            Classifier::GradientBoosting { init, learning_rate, trees, .. } => {
                let raw: f64 = trees.iter().map(|tree| tree.leaf(row.view())[0]).sum();
                sigmoid(init + learning_rate * raw)
            }
        };

        if !(0.0..=1.0).contains(&p) {
            return Err(ModelError::InvalidProbability(p));
        }
        Ok(p)
    }
}

/// Share of the positive class in a leaf's class counts.
fn positive_fraction(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total > 0.0 {
        counts[1] / total
    } else {
        0.0
    }
}

/// Logistic function, stable for large |z|.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
