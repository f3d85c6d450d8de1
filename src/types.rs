//! Prediction result types

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::labels::ActivityLabel;
use crate::vote::VoteTally;

/// Full account of one batch prediction
#[derive(Debug, Clone, Serialize)]
pub struct PredictionSummary {
    /// Unique id for correlating logs with this request
    pub request_id: String,
    /// Winning label for the batch
    pub prediction: ActivityLabel,
    /// Votes the winning label received
    pub votes: usize,
    pub record_count: usize,
    /// Arg-max label of each record, in record order
    pub per_record: Vec<ActivityLabel>,
    /// Vote counts in order of first appearance
    pub tally: VoteTally,
    /// Earliest record timestamp, if any record carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<DateTime<Utc>>,
    /// Latest record timestamp, if any record carried one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<DateTime<Utc>>,
    pub computed_at: DateTime<Utc>,
}

impl PredictionSummary {
    /// Share of records that voted for the winning label
    pub fn agreement(&self) -> f64 {
        if self.record_count == 0 {
            return 0.0;
        }
        self.votes as f64 / self.record_count as f64
    }
}
