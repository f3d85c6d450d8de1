//! Batch-level vote aggregation
//!
//! Two-stage reduction: every record votes for its arg-max label, then the
//! batch takes the most common vote. Ties go to the label that first appeared
//! in record order. Per-record confidence is dropped once the vote is cast.

use serde::Serialize;

use crate::error::PredictError;
use crate::inference::Distribution;
use crate::labels::ActivityLabel;

/// Vote count for one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelVotes {
    pub label: ActivityLabel,
    pub votes: usize,
}

/// Vote counts kept in order of first appearance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VoteTally {
    entries: Vec<LabelVotes>,
}

impl VoteTally {
    pub fn from_labels(labels: &[ActivityLabel]) -> Self {
        let mut tally = Self::default();
        for label in labels {
            tally.record(*label);
        }
        tally
    }

    pub fn record(&mut self, label: ActivityLabel) {
        match self.entries.iter_mut().find(|entry| entry.label == label) {
            Some(entry) => entry.votes += 1,
            None => self.entries.push(LabelVotes { label, votes: 1 }),
        }
    }

    /// Most voted label; among equal counts the earliest-seen label wins
    pub fn winner(&self) -> Option<LabelVotes> {
        let mut best: Option<LabelVotes> = None;
        for entry in &self.entries {
            match best {
                Some(current) if entry.votes <= current.votes => {}
                _ => best = Some(*entry),
            }
        }
        best
    }

    /// Batch label from this tally; an empty tally has no winner
    pub fn plurality(&self) -> Result<LabelVotes, PredictError> {
        self.winner()
            .ok_or_else(|| PredictError::InvalidBatch("no predictions to aggregate".to_string()))
    }

    pub fn votes_for(&self, label: ActivityLabel) -> usize {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.votes)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> &[LabelVotes] {
        &self.entries
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|entry| entry.votes).sum()
    }
}

/// Plurality vote over per-record predictions
pub struct VoteAggregator;

impl VoteAggregator {
    /// Arg-max label of each distribution, in record order
    pub fn per_record_labels(distributions: &[Distribution]) -> Vec<ActivityLabel> {
        distributions.iter().map(Distribution::label).collect()
    }

    /// Reduce per-record labels to the batch label
    pub fn plurality(labels: &[ActivityLabel]) -> Result<LabelVotes, PredictError> {
        VoteTally::from_labels(labels).plurality()
    }

    /// Reduce distributions to the batch label
    pub fn aggregate(distributions: &[Distribution]) -> Result<ActivityLabel, PredictError> {
        let labels = Self::per_record_labels(distributions);
        Self::plurality(&labels).map(|winner| winner.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LABEL_COUNT;
    use pretty_assertions::assert_eq;
    use crate::labels::ActivityLabel::{Cleaning as C, Eating as B, Talking as A};

    fn peaked(label: ActivityLabel) -> Distribution {
        let mut values = vec![0.01; LABEL_COUNT];
        values[label.index()] = 0.9;
        Distribution::new(values).unwrap()
    }

    #[test]
    fn test_plurality_winner() {
        let winner = VoteAggregator::plurality(&[A, B, A, C, B, A]).unwrap();
        assert_eq!(winner, LabelVotes { label: A, votes: 3 });
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let winner = VoteAggregator::plurality(&[B, A, A, B]).unwrap();
        assert_eq!(winner.label, B);
        assert_eq!(winner.votes, 2);
    }

    #[test]
    fn test_tie_ignores_enumeration_order() {
        // ELEVATOR is the last label but appears first
        let labels = [
            ActivityLabel::Elevator,
            ActivityLabel::Talking,
            ActivityLabel::Talking,
            ActivityLabel::Elevator,
        ];
        assert_eq!(
            VoteAggregator::plurality(&labels).unwrap().label,
            ActivityLabel::Elevator
        );
    }

    #[test]
    fn test_single_record() {
        assert_eq!(VoteAggregator::plurality(&[C]).unwrap().label, C);
    }

    #[test]
    fn test_empty_is_invalid_batch() {
        let err = VoteAggregator::plurality(&[]).unwrap_err();
        assert!(matches!(err, PredictError::InvalidBatch(_)));
        assert!(VoteAggregator::aggregate(&[]).is_err());
    }

    #[test]
    fn test_tally_first_appearance_order() {
        let tally = VoteTally::from_labels(&[C, A, C, B]);
        let order: Vec<ActivityLabel> = tally.entries().iter().map(|e| e.label).collect();
        assert_eq!(order, vec![C, A, B]);
        assert_eq!(tally.votes_for(C), 2);
        assert_eq!(tally.votes_for(ActivityLabel::Toilet), 0);
        assert_eq!(tally.total(), 4);
        assert_eq!(tally.plurality().unwrap(), LabelVotes { label: C, votes: 2 });
        assert!(VoteTally::default().plurality().is_err());
    }

    #[test]
    fn test_aggregate_discards_confidence() {
        // one very confident EATING vote loses to two weak TALKING votes
        let mut weak = vec![0.06; LABEL_COUNT];
        weak[A.index()] = 0.16;
        let weak = Distribution::new(weak).unwrap();

        let distributions = vec![peaked(B), weak.clone(), weak];
        assert_eq!(VoteAggregator::aggregate(&distributions).unwrap(), A);
    }

    #[test]
    fn test_per_record_labels_in_order() {
        let distributions = vec![peaked(C), peaked(A), peaked(B)];
        assert_eq!(
            VoteAggregator::per_record_labels(&distributions),
            vec![C, A, B]
        );
    }
}
