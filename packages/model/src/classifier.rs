//! Trained classifiers.
//!
//! The service treats a model as an opaque scorer behind the
//! [`Classifier`] trait. Concrete models are deserialized from a JSON
//! [`ModelArtifact`] whose `kind` field selects the implementation.

use serde::{Deserialize, Serialize};

/// A trained model that scores aligned feature vectors.
///
/// Callers guarantee that every `features` slice has exactly
/// [`Self::n_features`] entries.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Short name of the model family (e.g. `"logistic"`).
    fn kind(&self) -> &'static str;

    /// Number of input features.
    fn n_features(&self) -> usize;

    /// Class labels in output order.
    fn classes(&self) -> &[String];

    /// Predicted class label.
    fn predict(&self, features: &[f64]) -> String;

    /// Per-class probabilities in [`Self::classes`] order, or `None` for
    /// models that only produce hard labels.
    fn predict_proba(&self, _features: &[f64]) -> Option<Vec<f64>> {
        None
    }

    /// One weight per input feature, for models with linear coefficients.
    fn coefficients(&self) -> Option<&[f64]> {
        None
    }
}

/// Errors in a deserialized model definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} model: {message}")]
pub struct InvalidModelError {
    /// Model family.
    pub kind: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl InvalidModelError {
    fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Serialized model definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Binary or multinomial logistic regression.
    Logistic(LogisticRegression),
    /// Nearest-centroid classifier (hard labels only).
    NearestCentroid(NearestCentroid),
    /// Random forest of decision trees.
    RandomForest(RandomForest),
}

impl ModelArtifact {
    /// Validates the definition and returns it as a [`Classifier`].
    ///
    /// # Errors
    ///
    /// Returns [`InvalidModelError`] if the shapes of the parameters are
    /// inconsistent.
    pub fn into_classifier(self) -> Result<Box<dyn Classifier>, InvalidModelError> {
        match self {
            Self::Logistic(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            Self::NearestCentroid(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            Self::RandomForest(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
        }
    }
}

fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i)
}

/// Logistic regression in scikit-learn layout.
///
/// A binary model has two classes and a single coefficient row scoring the
/// second class; a multinomial model has one row per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Class labels.
    pub classes: Vec<String>,
    /// Coefficient rows, each `n_features` wide.
    pub coefficients: Vec<Vec<f64>>,
    /// One intercept per coefficient row.
    pub intercepts: Vec<f64>,
}

impl LogisticRegression {
    fn validate(&self) -> Result<(), InvalidModelError> {
        let err = |msg: String| InvalidModelError::new("logistic", msg);
        let rows = self.coefficients.len();

        match (self.classes.len(), rows) {
            (2, 1) => {}
            (n, r) if n > 2 && n == r => {}
            (n, r) => {
                return Err(err(format!(
                    "{n} classes need {} coefficient rows, found {r}",
                    if n == 2 { 1 } else { n }
                )));
            }
        }
        if self.intercepts.len() != rows {
            return Err(err(format!(
                "{rows} coefficient rows but {} intercepts",
                self.intercepts.len()
            )));
        }
        let width = self.coefficients[0].len();
        if width == 0 {
            return Err(err("coefficient rows are empty".to_owned()));
        }
        if self.coefficients.iter().any(|row| row.len() != width) {
            return Err(err("coefficient rows differ in width".to_owned()));
        }
        Ok(())
    }

    fn probabilities(&self, features: &[f64]) -> Vec<f64> {
        if self.coefficients.len() == 1 {
            let p = sigmoid(dot(&self.coefficients[0], features) + self.intercepts[0]);
            return vec![1.0 - p, p];
        }
        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| dot(w, features) + b)
            .collect();
        softmax(&logits)
    }
}

impl Classifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic"
    }

    fn n_features(&self) -> usize {
        self.coefficients[0].len()
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &[f64]) -> String {
        self.classes[argmax(&self.probabilities(features))].clone()
    }

    fn predict_proba(&self, features: &[f64]) -> Option<Vec<f64>> {
        Some(self.probabilities(features))
    }

    fn coefficients(&self) -> Option<&[f64]> {
        Some(&self.coefficients[0])
    }
}

/// Assigns the class whose centroid is closest in Euclidean distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroid {
    /// Class labels.
    pub classes: Vec<String>,
    /// One centroid per class, each `n_features` wide.
    pub centroids: Vec<Vec<f64>>,
}

impl NearestCentroid {
    fn validate(&self) -> Result<(), InvalidModelError> {
        let err = |msg: String| InvalidModelError::new("nearest_centroid", msg);
        if self.classes.is_empty() || self.classes.len() != self.centroids.len() {
            return Err(err(format!(
                "{} classes but {} centroids",
                self.classes.len(),
                self.centroids.len()
            )));
        }
        let width = self.centroids[0].len();
        if width == 0 || self.centroids.iter().any(|c| c.len() != width) {
            return Err(err("centroids must be non-empty and equally wide".to_owned()));
        }
        Ok(())
    }
}

impl Classifier for NearestCentroid {
    fn kind(&self) -> &'static str {
        "nearest_centroid"
    }

    fn n_features(&self) -> usize {
        self.centroids[0].len()
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &[f64]) -> String {
        let distances: Vec<f64> = self
            .centroids
            .iter()
            .map(|c| -c.iter().zip(features).map(|(a, b)| (a - b).powi(2)).sum::<f64>())
            .collect();
        self.classes[argmax(&distances)].clone()
    }
}

/// One decision tree in scikit-learn's parallel-array layout.
///
/// Node 0 is the root. Leaves have negative `left` and `right` children;
/// a sample goes left when `features[feature] <= threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Split feature per node (ignored for leaves).
    pub feature: Vec<i64>,
    /// Split threshold per node (ignored for leaves).
    pub threshold: Vec<f64>,
    /// Left child per node, `-1` for leaves.
    pub left: Vec<i64>,
    /// Right child per node, `-1` for leaves.
    pub right: Vec<i64>,
    /// Per-node class weights (sample counts or fractions), one column per
    /// class. Only leaf rows are read.
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> Result<(), String> {
        let n = self.feature.len();
        if n == 0 {
            return Err("tree has no nodes".to_owned());
        }
        if self.threshold.len() != n
            || self.left.len() != n
            || self.right.len() != n
            || self.value.len() != n
        {
            return Err("node arrays differ in length".to_owned());
        }

        for node in 0..n {
            let children = (
                usize::try_from(self.left[node]),
                usize::try_from(self.right[node]),
            );
            match children {
                (Err(_), Err(_)) => {
                    let row = &self.value[node];
                    if row.len() != n_classes {
                        return Err(format!(
                            "leaf {node} has {} class weights, expected {n_classes}",
                            row.len()
                        ));
                    }
                    if row.iter().any(|w| !w.is_finite() || *w < 0.0)
                        || row.iter().sum::<f64>() <= 0.0
                    {
                        return Err(format!("leaf {node} has no usable class weights"));
                    }
                }
                // Children always come after their parent, so traversal
                // cannot loop.
                (Ok(left), Ok(right)) if left > node && right > node && left < n && right < n => {
                    if !usize::try_from(self.feature[node]).is_ok_and(|f| f < n_features) {
                        return Err(format!(
                            "node {node} splits on feature {} of {n_features}",
                            self.feature[node]
                        ));
                    }
                    if !self.threshold[node].is_finite() {
                        return Err(format!("node {node} has a non-finite threshold"));
                    }
                }
                _ => return Err(format!("node {node} has invalid children")),
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf reached by `features`.
    fn leaf_distribution(&self, features: &[f64]) -> Vec<f64> {
        let mut node = 0;
        while let (Ok(left), Ok(right), Ok(feature)) = (
            usize::try_from(self.left[node]),
            usize::try_from(self.right[node]),
            usize::try_from(self.feature[node]),
        ) {
            node = if features[feature] <= self.threshold[node] {
                left
            } else {
                right
            };
        }
        let row = &self.value[node];
        let total: f64 = row.iter().sum();
        row.iter().map(|w| w / total).collect()
    }
}

/// Random forest classifier. Probabilities are the mean of the trees'
/// leaf class distributions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Class labels.
    pub classes: Vec<String>,
    /// Number of input features.
    pub n_features: usize,
    /// Fitted trees.
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    fn validate(&self) -> Result<(), InvalidModelError> {
        let err = |msg: String| InvalidModelError::new("random_forest", msg);
        if self.classes.is_empty() {
            return Err(err("no classes".to_owned()));
        }
        if self.n_features == 0 {
            return Err(err("no input features".to_owned()));
        }
        if self.trees.is_empty() {
            return Err(err("forest has no trees".to_owned()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|msg| err(format!("tree {i}: {msg}")))?;
        }
        Ok(())
    }

    fn probabilities(&self, features: &[f64]) -> Vec<f64> {
        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (total, p) in totals.iter_mut().zip(tree.leaf_distribution(features)) {
                *total += p;
            }
        }
        #[allow(clippy::cast_precision_loss)]
        let n_trees = self.trees.len() as f64;
        totals.into_iter().map(|t| t / n_trees).collect()
    }
}

impl Classifier for RandomForest {
    fn kind(&self) -> &'static str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, features: &[f64]) -> String {
        self.classes[argmax(&self.probabilities(features))].clone()
    }

    fn predict_proba(&self, features: &[f64]) -> Option<Vec<f64>> {
        Some(self.probabilities(features))
    }
}
