//! Random forest inference over exported decision trees
//!
//! Trees are stored in the flat node layout scikit-learn uses internally:
//! every split references its children by index, and children always come
//! after their parent. A sample goes left when `x[feature] <= threshold`.
//!
//! Example artifact:
//!
//! ```json
//! {
//!   "n_features": 2,
//!   "classes": ["maize", "rice"],
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 0, "threshold": 50.0, "left": 1, "right": 2 },
//!         { "value": [8.0, 2.0] },
//!         { "value": [0.0, 5.0] }
//!     ] }
//!   ]
//! }
//! ```

use crate::classifier::{Classifier, ProbabilisticClassifier};
use agrisens_core::{ClassLabel, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A single node of a decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split node
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },

    /// Leaf holding per-class weights (sample counts or fractions)
    Leaf { value: Vec<f64> },
}

/// A fitted decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn leaf(&self, features: &[f64]) -> &[f64] {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => return value,
            }
        }
    }
}

/// On-disk representation of a forest
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ForestArtifact {
    #[serde(default)]
    name: Option<String>,
    n_features: usize,
    #[serde(default)]
    classes: Option<Vec<ClassLabel>>,
    trees: Vec<DecisionTree>,
}

/// Random forest classifier
#[derive(Debug, Clone)]
pub struct RandomForest {
    name: String,
    n_features: usize,
    n_classes: usize,
    classes: Option<Vec<ClassLabel>>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Load a forest from a JSON artifact on disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut forest = Self::from_json(&content)?;
        if forest.name == "random_forest" {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                forest.name = stem.to_string();
            }
        }
        Ok(forest)
    }

    /// Parse and validate a forest from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: ForestArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(artifact: ForestArtifact) -> Result<Self> {
        if artifact.trees.is_empty() {
            return Err(Error::model("forest has no trees"));
        }
        if artifact.n_features == 0 {
            return Err(Error::model("forest must have at least one feature"));
        }

        let mut n_classes = artifact.classes.as_ref().map(Vec::len);
        for (t, tree) in artifact.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(Error::model(format!("tree {t} has no nodes")));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= artifact.n_features {
                            return Err(Error::model(format!(
                                "tree {t} node {i}: feature {feature} out of range ({} features)",
                                artifact.n_features
                            )));
                        }
                        if threshold.is_nan() {
                            return Err(Error::model(format!("tree {t} node {i}: NaN threshold")));
                        }
                        // Children after their parent keeps traversal finite.
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(Error::model(format!(
                                    "tree {t} node {i}: invalid child index {child}"
                                )));
                            }
                        }
                    }
                    TreeNode::Leaf { value } => {
                        match n_classes {
                            Some(n) if n != value.len() => {
                                return Err(Error::model(format!(
                                    "tree {t} node {i}: leaf has {} weights, expected {n}",
                                    value.len()
                                )));
                            }
                            None => n_classes = Some(value.len()),
                            _ => {}
                        }
                        let total: f64 = value.iter().sum();
                        if value.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 {
                            return Err(Error::model(format!(
                                "tree {t} node {i}: leaf weights must be non-negative with a positive sum"
                            )));
                        }
                    }
                }
            }
        }

        let n_classes = n_classes.unwrap_or(0);
        if n_classes == 0 {
            return Err(Error::model("forest has no classes"));
        }

        debug!(
            trees = artifact.trees.len(),
            n_features = artifact.n_features,
            n_classes,
            "Loaded random forest"
        );

        Ok(Self {
            name: artifact.name.unwrap_or_else(|| "random_forest".to_string()),
            n_features: artifact.n_features,
            n_classes,
            classes: artifact.classes,
            trees: artifact.trees,
        })
    }

    /// Number of trees in the ensemble
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of output classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// The `classes_` attribute, if the export carried one
    pub fn classes(&self) -> Option<&[ClassLabel]> {
        self.classes.as_deref()
    }

    fn check_row(&self, features: &[f64]) -> Result<()> {
        if features.len() != self.n_features {
            return Err(Error::prediction(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        if let Some(pos) = features.iter().position(|x| !x.is_finite()) {
            return Err(Error::prediction(format!("feature {pos} is not a finite number")));
        }
        Ok(())
    }

    /// Mean of the normalized leaf distributions across all trees
    pub fn proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.check_row(features)?;

        let mut acc = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let leaf = tree.leaf(features);
            let total: f64 = leaf.iter().sum();
            for (slot, weight) in acc.iter_mut().zip(leaf) {
                *slot += weight / total;
            }
        }

        let n = self.trees.len() as f64;
        acc.iter_mut().for_each(|p| *p /= n);
        Ok(acc)
    }
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

impl Classifier for RandomForest {
    fn predict(&self, features: &[f64]) -> Result<ClassLabel> {
        let proba = self.proba(features)?;
        let best = argmax(&proba);
        Ok(match &self.classes {
            Some(classes) => classes[best].clone(),
            None => ClassLabel::Index(best as i64),
        })
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn probabilistic(self: Arc<Self>) -> Option<Arc<dyn ProbabilisticClassifier>> {
        if self.classes.is_some() {
            Some(self)
        } else {
            None
        }
    }
}

impl ProbabilisticClassifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        self.proba(features)
    }

    fn class_order(&self) -> &[ClassLabel] {
        self.classes.as_deref().unwrap_or(&[])
    }
}
