//! Batch tensor assembly
//!
//! Packs encoded records into the `(batch, time_steps, features)` layout the
//! sequence classifier consumes. Every record is a single time step, so the
//! middle dimension is always 1. No windowing or resampling happens here.

use crate::error::PredictError;
use crate::features::FeatureVector;

/// Time steps per record
pub const TIME_STEPS: usize = 1;

/// Row-major `(N, 1, F)` tensor
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTensor {
    data: Vec<f64>,
    shape: [usize; 3],
}

impl PredictionTensor {
    /// Assemble a tensor from feature vectors, preserving record order.
    ///
    /// Fails with [`PredictError::InvalidBatch`] when `vectors` is empty and with
    /// [`PredictError::Structural`] when the vectors disagree on length.
    pub fn assemble(vectors: &[FeatureVector]) -> Result<Self, PredictError> {
        let first = vectors
            .first()
            .ok_or_else(|| PredictError::InvalidBatch("batch contains no records".to_string()))?;
        let width = first.len();

        if let Some((row, vector)) = vectors
            .iter()
            .enumerate()
            .find(|(_, vector)| vector.len() != width)
        {
            return Err(PredictError::Structural(format!(
                "feature vector {} has length {}, expected {}",
                row,
                vector.len(),
                width
            )));
        }

        let mut data = Vec::with_capacity(vectors.len() * width);
        for vector in vectors {
            data.extend_from_slice(vector.as_slice());
        }

        Ok(Self {
            data,
            shape: [vectors.len(), TIME_STEPS, width],
        })
    }

    /// Check the tensor against the classifier's input layout before inference
    pub fn validate_shape(&self, expected_width: usize) -> Result<(), PredictError> {
        let expected = [self.shape[0], TIME_STEPS, expected_width];
        let consistent = self.data.len() == self.shape.iter().product::<usize>();

        if self.shape != expected || self.shape[0] == 0 || !consistent {
            return Err(PredictError::ShapeValidation {
                expected: expected.to_vec(),
                actual: self.shape.to_vec(),
            });
        }
        Ok(())
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn batch_size(&self) -> usize {
        self.shape[0]
    }

    pub fn feature_width(&self) -> usize {
        self.shape[2]
    }

    /// Features of record `index` at its single time step
    pub fn step(&self, index: usize) -> Option<&[f64]> {
        if index >= self.batch_size() {
            return None;
        }
        let width = self.feature_width();
        let start = index * TIME_STEPS * width;
        self.data.get(start..start + width)
    }

    /// Iterate over the single time step of every record
    pub fn steps(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.batch_size()).filter_map(move |index| self.step(index))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}
