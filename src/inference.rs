//! Inference boundary
//!
//! The trained classifier is an external collaborator reached through the
//! [`Classifier`] trait: a tensor of shape `(N, 1, F)` goes in, `N` probability
//! distributions over [`ActivityLabel::ALL`] come out. [`InferenceAdapter`]
//! guards both sides of that call so malformed shapes never reach the model and
//! malformed output never reaches the vote.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::error::PredictError;
use crate::labels::{ActivityLabel, LABEL_COUNT};
use crate::schema::FEATURE_COUNT;
use crate::tensor::PredictionTensor;

/// Failure reported by a classifier implementation
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier runtime error: {0}")]
    Runtime(String),
}

/// Tensor-in, distribution-out capability of a trained model
///
/// Implementations are loaded once and shared read-only across requests, so
/// they must be safe to call concurrently.
pub trait Classifier: Send + Sync {
    /// Feature width the model was trained on
    fn input_width(&self) -> usize;

    /// Return one row of label probabilities per record in `tensor`
    fn predict(&self, tensor: &PredictionTensor) -> Result<Vec<Vec<f64>>, ClassifierError>;
}

/// Reason a classifier output row was rejected
#[derive(Debug, Error, PartialEq)]
pub enum DistributionError {
    #[error("expected {expected} probabilities, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("probability at index {index} is {value}, expected a finite non-negative number")]
    InvalidValue { index: usize, value: f64 },
}

/// Validated probability distribution over the label enumeration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Distribution(Vec<f64>);

impl Distribution {
    pub fn new(values: Vec<f64>) -> Result<Self, DistributionError> {
        if values.len() != LABEL_COUNT {
            return Err(DistributionError::WrongLength {
                expected: LABEL_COUNT,
                actual: values.len(),
            });
        }
        if let Some((index, value)) = values
            .iter()
            .copied()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(DistributionError::InvalidValue { index, value });
        }
        Ok(Self(values))
    }

    /// Index of the largest probability; the first one wins on ties
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (index, value) in self.0.iter().enumerate().skip(1) {
            if *value > self.0[best] {
                best = index;
            }
        }
        best
    }

    pub fn label(&self) -> ActivityLabel {
        ActivityLabel::ALL[self.argmax()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Reject a classifier that cannot take encoded records as input
pub fn ensure_schema_width(classifier: &dyn Classifier) -> Result<(), PredictError> {
    if classifier.input_width() != FEATURE_COUNT {
        return Err(PredictError::ModelLoad(format!(
            "model accepts {} features, records encode to {}",
            classifier.input_width(),
            FEATURE_COUNT
        )));
    }
    Ok(())
}

/// Shape-checking wrapper around a shared classifier
#[derive(Clone)]
pub struct InferenceAdapter {
    classifier: Arc<dyn Classifier>,
}

impl InferenceAdapter {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }

    pub fn input_width(&self) -> usize {
        self.classifier.input_width()
    }

    /// Run the classifier on `tensor` and validate what it returns.
    ///
    /// Shape problems are reported as [`PredictError::ShapeValidation`] before the
    /// classifier is called; everything the classifier does wrong is reported as
    /// [`PredictError::InferenceFailure`]. Nothing is retried.
    pub fn infer(&self, tensor: &PredictionTensor) -> Result<Vec<Distribution>, PredictError> {
        tensor.validate_shape(self.classifier.input_width())?;

        let rows = self
            .classifier
            .predict(tensor)
            .map_err(|e| PredictError::InferenceFailure(e.to_string()))?;

        if rows.len() != tensor.batch_size() {
            return Err(PredictError::InferenceFailure(format!(
                "classifier returned {} distributions for {} records",
                rows.len(),
                tensor.batch_size()
            )));
        }

        rows.into_iter()
            .enumerate()
            .map(|(row, values)| {
                Distribution::new(values).map_err(|e| {
                    PredictError::InferenceFailure(format!("distribution {}: {}", row, e))
                })
            })
            .collect()
    }
}

/// Classifier that answers every record with the same distribution
#[derive(Debug, Clone)]
pub struct FixedClassifier {
    distribution: Vec<f64>,
    input_width: usize,
}

impl FixedClassifier {
    pub fn new(distribution: Vec<f64>) -> Self {
        Self {
            distribution,
            input_width: FEATURE_COUNT,
        }
    }

    /// Put all probability mass on `label`
    pub fn certain(label: ActivityLabel) -> Self {
        let mut distribution = vec![0.0; LABEL_COUNT];
        distribution[label.index()] = 1.0;
        Self::new(distribution)
    }

    pub fn with_input_width(mut self, input_width: usize) -> Self {
        self.input_width = input_width;
        self
    }
}

impl Classifier for FixedClassifier {
    fn input_width(&self) -> usize {
        self.input_width
    }

    fn predict(&self, tensor: &PredictionTensor) -> Result<Vec<Vec<f64>>, ClassifierError> {
        Ok(vec![self.distribution.clone(); tensor.batch_size()])
    }
}

/// Serialized dense-layer parameters: `weights` is `labels x features`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftmaxWeights {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

/// Single dense layer followed by softmax, `p = softmax(W x + b)`
#[derive(Debug, Clone)]
pub struct SoftmaxClassifier {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    input_width: usize,
}

impl SoftmaxClassifier {
    pub fn new(params: SoftmaxWeights) -> Result<Self, PredictError> {
        let SoftmaxWeights { weights, bias } = params;

        if weights.len() != LABEL_COUNT {
            return Err(PredictError::ModelLoad(format!(
                "expected {} weight rows, got {}",
                LABEL_COUNT,
                weights.len()
            )));
        }
        if bias.len() != LABEL_COUNT {
            return Err(PredictError::ModelLoad(format!(
                "expected {} bias terms, got {}",
                LABEL_COUNT,
                bias.len()
            )));
        }

        let input_width = weights[0].len();
        if input_width == 0 {
            return Err(PredictError::ModelLoad("weight rows are empty".to_string()));
        }
        if let Some(row) = weights.iter().position(|row| row.len() != input_width) {
            return Err(PredictError::ModelLoad(format!(
                "weight row {} has {} columns, expected {}",
                row,
                weights[row].len(),
                input_width
            )));
        }
        if weights.iter().flatten().chain(bias.iter()).any(|v| !v.is_finite()) {
            return Err(PredictError::ModelLoad(
                "weights contain non-finite values".to_string(),
            ));
        }

        Ok(Self {
            weights,
            bias,
            input_width,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, PredictError> {
        let params: SoftmaxWeights =
            serde_json::from_str(json).map_err(|e| PredictError::ModelLoad(e.to_string()))?;
        Self::new(params)
    }

    /// Load weights from a JSON file
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let json = fs::read_to_string(path).map_err(|e| {
            PredictError::ModelLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        let classifier = Self::from_json(&json)?;
        log::info!(
            "loaded softmax classifier from {} ({} labels x {} features)",
            path.display(),
            LABEL_COUNT,
            classifier.input_width
        );
        Ok(classifier)
    }

    fn probabilities(&self, features: &[f64]) -> Vec<f64> {
        let logits: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect();

        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

impl Classifier for SoftmaxClassifier {
    fn input_width(&self) -> usize {
        self.input_width
    }

    fn predict(&self, tensor: &PredictionTensor) -> Result<Vec<Vec<f64>>, ClassifierError> {
        if tensor.feature_width() != self.input_width {
            return Err(ClassifierError::Runtime(format!(
                "input has {} features, model expects {}",
                tensor.feature_width(),
                self.input_width
            )));
        }
        Ok(tensor.steps().map(|step| self.probabilities(step)).collect())
    }
}
