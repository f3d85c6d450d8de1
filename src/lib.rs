//! Activity Sense - Smartphone activity recognition from sensor feature batches
//!
//! A batch of multi-sensor telemetry records is turned into one activity label
//! through a deterministic pipeline: record schema → feature vectors → batch
//! tensor → classifier → plurality vote.
//!
//! ## Modules
//!
//! - **Schema**: Sensor record wire types and the ordered feature table
//! - **Pipeline**: Encoding, tensor assembly, inference and vote aggregation
//! - **Inference**: The classifier boundary and bundled classifiers

pub mod config;
pub mod error;
pub mod features;
pub mod inference;
pub mod labels;
pub mod pipeline;
pub mod schema;
pub mod tensor;
pub mod types;
pub mod vote;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use config::PredictorConfig;
pub use error::{ErrorKind, PredictError};
pub use features::{FeatureVector, FeatureVectorBuilder};
pub use inference::{Classifier, ClassifierError, FixedClassifier, SoftmaxClassifier};
pub use labels::{ActivityLabel, LABEL_COUNT};
pub use pipeline::{predict_batch, ActivityPredictor};
pub use schema::{ActivityType, SensorRecord, FEATURE_COUNT};
pub use types::PredictionSummary;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported by the CLI and diagnostics
pub const PRODUCER_NAME: &str = "activity-sense";
