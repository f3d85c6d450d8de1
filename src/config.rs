//! Predictor configuration
//!
//! Read from a TOML file at startup. Example:
//!
//! ```toml
//! [model]
//! kind = "softmax"
//! path = "models/activity.json"
//! ```
//!
//! A `fixed` model answers every record with `distribution` and needs no file.
//! The loaded model must accept exactly `FEATURE_COUNT` inputs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::PredictError;
use crate::inference::{ensure_schema_width, Classifier, FixedClassifier, SoftmaxClassifier};
use crate::labels::LABEL_COUNT;

/// Which classifier implementation to load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Dense softmax layer loaded from a JSON weights file
    #[default]
    Softmax,
    /// Constant distribution, for dry runs and smoke tests
    Fixed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default)]
    pub kind: ModelKind,
    /// Weights file for `softmax`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Output of a `fixed` model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PredictorConfig {
    #[serde(default)]
    pub model: ModelConfig,
}

impl PredictorConfig {
    pub fn from_toml(content: &str) -> Result<Self, PredictError> {
        let config: Self =
            toml::from_str(content).map_err(|e| PredictError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let content = fs::read_to_string(path).map_err(|e| {
            PredictError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), PredictError> {
        let model = &self.model;

        match model.kind {
            ModelKind::Softmax if model.path.is_none() => Err(PredictError::Config(
                "model.path is required for a softmax model".to_string(),
            )),
            ModelKind::Fixed => match &model.distribution {
                None => Err(PredictError::Config(
                    "model.distribution is required for a fixed model".to_string(),
                )),
                Some(values) if values.len() != LABEL_COUNT => Err(PredictError::Config(format!(
                    "model.distribution has {} values, expected {}",
                    values.len(),
                    LABEL_COUNT
                ))),
                Some(_) => Ok(()),
            },
            ModelKind::Softmax => Ok(()),
        }
    }

    /// Load the configured classifier and check it accepts the schema width
    pub fn build_classifier(&self) -> Result<Arc<dyn Classifier>, PredictError> {
        self.validate()?;
        let model = &self.model;

        let classifier: Arc<dyn Classifier> = match model.kind {
            ModelKind::Softmax => {
                let path = model.path.as_deref().ok_or_else(|| {
                    PredictError::Config("model.path is required for a softmax model".to_string())
                })?;
                Arc::new(SoftmaxClassifier::load(path)?)
            }
            ModelKind::Fixed => {
                let distribution = model.distribution.clone().unwrap_or_default();
                Arc::new(FixedClassifier::new(distribution))
            }
        };

        ensure_schema_width(classifier.as_ref())?;
        Ok(classifier)
    }
}
