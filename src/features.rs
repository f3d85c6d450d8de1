//! Feature vector construction
//!
//! Encodes one [`SensorRecord`] into the fixed-order numeric vector the
//! classifier was trained on. Defaulting is the only normalization applied:
//! - unset numeric fields and flags become `0`
//! - flags become `1`/`0`
//! - `activityType` expands into five one-hot indicators
//!
//! Values are otherwise passed through untouched, including out-of-range ones.

use serde::Serialize;

use crate::schema::{SensorRecord, FEATURE_COUNT, FIELDS};

/// Encoded record, one value per schema position
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Pair each value with its schema field name
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FIELDS.iter().map(|field| field.name).zip(self.0.iter().copied())
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        FeatureVector(values)
    }
}

/// Builder for feature vectors
pub struct FeatureVectorBuilder;

impl FeatureVectorBuilder {
    /// Encode a single record
    pub fn build(record: &SensorRecord) -> FeatureVector {
        let mut values = Vec::with_capacity(FEATURE_COUNT);
        values.extend(FIELDS.iter().map(|field| field.encode(record)));

        if let Some(activity) = &record.activity_type {
            if !crate::schema::ActivityType::INDICATED
                .iter()
                .any(|known| known.as_str() == activity.as_str())
            {
                log::debug!(
                    "activityType {:?} has no indicator, encoding all zeros",
                    activity.as_str()
                );
            }
        }

        log::trace!("feature vector: {:?}", values);
        FeatureVector(values)
    }

    /// Encode records in order
    pub fn build_batch(records: &[SensorRecord]) -> Vec<FeatureVector> {
        records.iter().map(Self::build).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{field_index, group_range, ActivityType, FieldGroup};
    use pretty_assertions::assert_eq;

    fn indicators(vector: &FeatureVector) -> Vec<f64> {
        vector.as_slice()[group_range(FieldGroup::ActivityType)].to_vec()
    }

    #[test]
    fn test_empty_record_is_all_zero() {
        let vector = FeatureVectorBuilder::build(&SensorRecord::default());
        assert_eq!(vector.len(), FEATURE_COUNT);
        assert!(vector.as_slice().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_length_constant_regardless_of_presence() {
        let sparse = SensorRecord {
            location_max_speed: Some(3.2),
            ..Default::default()
        };
        let dense: SensorRecord = serde_json::from_str(
            r#"{
                "rawAccMagnitudeStatsMean": 1.0,
                "procGyro3dStdZ": 2.0,
                "audioPropertiesMaxAbsValue": 3.0,
                "discreteRingerModeIsNormal": true,
                "lfMeasurementsScreenBrightness": 0.4,
                "activityType": "RUNNING"
            }"#,
        )
        .unwrap();

        assert_eq!(FeatureVectorBuilder::build(&sparse).len(), FEATURE_COUNT);
        assert_eq!(FeatureVectorBuilder::build(&dense).len(), FEATURE_COUNT);
    }

    #[test]
    fn test_each_wire_name_maps_to_its_own_column() {
        for (index, field) in FIELDS.iter().enumerate() {
            if field.encoding() == "indicator" {
                continue;
            }
            let json = if field.encoding() == "flag" {
                format!(r#"{{"{}": true}}"#, field.name)
            } else {
                format!(r#"{{"{}": 7.5}}"#, field.name)
            };
            let record: SensorRecord = serde_json::from_str(&json).unwrap();
            let vector = FeatureVectorBuilder::build(&record);

            for (column, value) in vector.as_slice().iter().enumerate() {
                if column == index {
                    assert_ne!(*value, 0.0, "{} not written to column {}", field.name, index);
                } else {
                    assert_eq!(*value, 0.0, "{} leaked into column {}", field.name, column);
                }
            }
        }
    }

    #[test]
    fn test_flags_encode_as_integers() {
        let record = SensorRecord {
            discrete_battery_state_is_charging: Some(true),
            discrete_battery_state_is_full: Some(false),
            ..Default::default()
        };
        let vector = FeatureVectorBuilder::build(&record);

        let charging = field_index("discreteBatteryStateIsCharging").unwrap();
        let full = field_index("discreteBatteryStateIsFull").unwrap();
        let missing = field_index("discreteBatteryStateMissing").unwrap();
        assert_eq!(vector.as_slice()[charging], 1.0);
        assert_eq!(vector.as_slice()[full], 0.0);
        assert_eq!(vector.as_slice()[missing], 0.0);
    }

    #[test]
    fn test_walking_indicator() {
        let record = SensorRecord {
            activity_type: Some(ActivityType::Walking),
            ..Default::default()
        };
        let vector = FeatureVectorBuilder::build(&record);
        assert_eq!(indicators(&vector), vec![0.0, 1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_each_activity_indicator() {
        for (position, activity) in ActivityType::INDICATED.iter().enumerate() {
            let record = SensorRecord {
                activity_type: Some(activity.clone()),
                ..Default::default()
            };
            let mut expected = vec![0.0; 5];
            expected[position] = 1.0;
            assert_eq!(indicators(&FeatureVectorBuilder::build(&record)), expected);
        }
    }

    #[test]
    fn test_unset_and_unknown_activity_are_all_zero() {
        let unset = FeatureVectorBuilder::build(&SensorRecord::default());
        assert_eq!(indicators(&unset), vec![0.0; 5]);

        let unknown = SensorRecord {
            activity_type: Some(ActivityType::Other("STILL".to_string())),
            ..Default::default()
        };
        assert_eq!(indicators(&FeatureVectorBuilder::build(&unknown)), vec![0.0; 5]);
    }

    #[test]
    fn test_activity_match_is_by_name() {
        let record = SensorRecord {
            activity_type: Some(ActivityType::Other("SLEEPING".to_string())),
            ..Default::default()
        };
        assert_eq!(
            indicators(&FeatureVectorBuilder::build(&record)),
            vec![0.0, 0.0, 0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_values_pass_through_unvalidated() {
        let record = SensorRecord {
            lf_measurements_battery_level: Some(-42.0),
            raw_acc3d_ro_xy: Some(1e9),
            ..Default::default()
        };
        let vector = FeatureVectorBuilder::build(&record);
        let battery = field_index("lfMeasurementsBatteryLevel").unwrap();
        let ro_xy = field_index("rawAcc3dRoXy").unwrap();
        assert_eq!(vector.as_slice()[battery], -42.0);
        assert_eq!(vector.as_slice()[ro_xy], 1e9);
    }

    #[test]
    fn test_measured_zero_and_unset_encode_alike() {
        let zero = SensorRecord {
            location_min_altitude: Some(0.0),
            ..Default::default()
        };
        assert_eq!(
            FeatureVectorBuilder::build(&zero),
            FeatureVectorBuilder::build(&SensorRecord::default())
        );
    }

    #[test]
    fn test_named_iteration() {
        let record = SensorRecord {
            audio_naive_mfcc3_mean: Some(-12.5),
            ..Default::default()
        };
        let vector = FeatureVectorBuilder::build(&record);
        let named: Vec<(&str, f64)> = vector.named().collect();
        assert_eq!(named.len(), FEATURE_COUNT);
        assert!(named.contains(&("audioNaiveMfcc3Mean", -12.5)));
    }

    #[test]
    fn test_build_batch_preserves_order() {
        let records = vec![
            SensorRecord {
                lf_measurements_light: Some(1.0),
                ..Default::default()
            },
            SensorRecord {
                lf_measurements_light: Some(2.0),
                ..Default::default()
            },
        ];
        let light = field_index("lfMeasurementsLight").unwrap();
        let vectors = FeatureVectorBuilder::build_batch(&records);
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0].as_slice()[light], 1.0);
        assert_eq!(vectors[1].as_slice()[light], 2.0);
    }
}
