//! Pipeline orchestration
//!
//! This module provides the public API for batch activity prediction.
//! It runs the full pipeline from sensor records (or request JSON) to one label.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::PredictorConfig;
use crate::error::PredictError;
use crate::features::FeatureVectorBuilder;
use crate::inference::{Classifier, Distribution, InferenceAdapter};
use crate::labels::ActivityLabel;
use crate::schema::{PredictRequest, PredictResponse, SensorRecord};
use crate::tensor::PredictionTensor;
use crate::types::PredictionSummary;
use crate::vote::{VoteAggregator, VoteTally};

/// Predict the activity of a batch with a one-off predictor.
///
/// # Example
/// ```ignore
/// let label = predict_batch(classifier, &records)?;
/// ```
pub fn predict_batch(
    classifier: Arc<dyn Classifier>,
    records: &[SensorRecord],
) -> Result<ActivityLabel, PredictError> {
    ActivityPredictor::new(classifier).predict(records)
}

/// Batch predictor around a classifier loaded once at startup.
///
/// Cloning is cheap and shares the classifier; the predictor holds no other
/// state, so clones can serve requests concurrently.
#[derive(Clone)]
pub struct ActivityPredictor {
    adapter: InferenceAdapter,
}

impl ActivityPredictor {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            adapter: InferenceAdapter::new(classifier),
        }
    }

    /// Load the classifier described by `config`
    pub fn from_config(config: &PredictorConfig) -> Result<Self, PredictError> {
        Ok(Self::new(config.build_classifier()?))
    }

    pub fn input_width(&self) -> usize {
        self.adapter.input_width()
    }

    /// Predict one label for an ordered batch of records
    pub fn predict(&self, records: &[SensorRecord]) -> Result<ActivityLabel, PredictError> {
        let distributions = self.distributions(records)?;
        let label = VoteAggregator::aggregate(&distributions)?;
        log::info!("batch of {} records -> {}", records.len(), label);
        Ok(label)
    }

    /// Predict and keep per-record labels and vote counts
    pub fn predict_detailed(
        &self,
        records: &[SensorRecord],
    ) -> Result<PredictionSummary, PredictError> {
        let request_id = Uuid::new_v4().to_string();
        let distributions = self.distributions(records)?;

        let per_record = VoteAggregator::per_record_labels(&distributions);
        let tally = VoteTally::from_labels(&per_record);
        let winner = tally.plurality()?;

        let timestamps = records.iter().filter_map(|record| record.timestamp);
        let window_start = timestamps.clone().min();
        let window_end = timestamps.max();

        log::info!(
            "[{}] batch of {} records -> {} ({} votes)",
            request_id,
            records.len(),
            winner.label,
            winner.votes
        );

        Ok(PredictionSummary {
            request_id,
            prediction: winner.label,
            votes: winner.votes,
            record_count: records.len(),
            per_record,
            tally,
            window_start,
            window_end,
            computed_at: Utc::now(),
        })
    }

    /// Handle a `{"data": [...]}` request body and return `{"prediction": "..."}`
    pub fn predict_json(&self, body: &str) -> Result<String, PredictError> {
        let request: PredictRequest = serde_json::from_str(body)?;
        let prediction = self.predict(&request.data)?;
        Ok(serde_json::to_string(&PredictResponse { prediction })?)
    }

    fn distributions(&self, records: &[SensorRecord]) -> Result<Vec<Distribution>, PredictError> {
        if records.is_empty() {
            return Err(PredictError::InvalidBatch(
                "batch contains no records".to_string(),
            ));
        }

        // Stage 1: encode records
        let vectors = FeatureVectorBuilder::build_batch(records);

        // Stage 2: pack into (N, 1, F)
        let tensor = PredictionTensor::assemble(&vectors)?;
        log::debug!("prediction tensor shape {:?}", tensor.shape());

        // Stage 3: classify
        let distributions = self.adapter.infer(&tensor)?;
        for distribution in &distributions {
            log::trace!("distribution: {:?}", distribution.as_slice());
        }
        log::debug!(
            "per-record labels: {:?}",
            distributions
                .iter()
                .map(|d| d.label().as_str())
                .collect::<Vec<_>>()
        );

        Ok(distributions)
    }
}
