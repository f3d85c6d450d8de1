//! Error types for the activity inference pipeline

use thiserror::Error;

/// Errors that can occur while turning a batch of sensor records into a label
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),

    #[error("Structural error: {0}")]
    Structural(String),

    #[error("Shape validation failed: expected {expected:?}, got {actual:?}")]
    ShapeValidation {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Inference failure: {0}")]
    InferenceFailure(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse grouping of [`PredictError`] variants for front ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Empty batch or inconsistent vector lengths
    Structural,
    /// Tensor rejected before the classifier was called
    ShapeValidation,
    /// The classifier failed or returned malformed output
    InferenceFailure,
    /// Caller payload could not be decoded
    Input,
    /// Model or configuration could not be loaded
    Setup,
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::InvalidBatch(_) | PredictError::Structural(_) => ErrorKind::Structural,
            PredictError::ShapeValidation { .. } => ErrorKind::ShapeValidation,
            PredictError::InferenceFailure(_) => ErrorKind::InferenceFailure,
            PredictError::Json(_) => ErrorKind::Input,
            PredictError::ModelLoad(_) | PredictError::Config(_) => ErrorKind::Setup,
        }
    }

    /// Stable machine-readable code for the error
    pub fn code(&self) -> &'static str {
        match self {
            PredictError::InvalidBatch(_) => "INVALID_BATCH",
            PredictError::Structural(_) => "STRUCTURAL_ERROR",
            PredictError::ShapeValidation { .. } => "SHAPE_VALIDATION_ERROR",
            PredictError::InferenceFailure(_) => "INFERENCE_FAILURE",
            PredictError::Json(_) => "JSON_ERROR",
            PredictError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            PredictError::Config(_) => "CONFIG_ERROR",
        }
    }
}
