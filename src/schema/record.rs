//! Sensor record wire types
//!
//! One [`SensorRecord`] is a single telemetry window captured on the phone:
//! motion statistics, location, audio summaries, discrete context flags and
//! low-frequency environmental readings. Every measurement is optional and an
//! absent field is kept distinct from a measured zero until encoding.

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::labels::ActivityLabel;

/// Platform activity-recognition hint attached to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    InVehicle,
    Walking,
    Running,
    OnBicycle,
    Sleeping,
    /// Any value the encoder has no indicator for (e.g. `STILL`, `TILTING`)
    #[serde(untagged)]
    Other(String),
}

impl ActivityType {
    /// Activity types with a dedicated indicator, in encoding order
    pub const INDICATED: [ActivityType; 5] = [
        ActivityType::InVehicle,
        ActivityType::Walking,
        ActivityType::Running,
        ActivityType::OnBicycle,
        ActivityType::Sleeping,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ActivityType::InVehicle => "IN_VEHICLE",
            ActivityType::Walking => "WALKING",
            ActivityType::Running => "RUNNING",
            ActivityType::OnBicycle => "ON_BICYCLE",
            ActivityType::Sleeping => "SLEEPING",
            ActivityType::Other(name) => name.as_str(),
        }
    }
}

/// Accept `true`/`false` as well as the `0`/`1` integers some producers emit.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlagRepr {
        Bool(bool),
        Number(f64),
    }

    match Option::<FlagRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FlagRepr::Bool(value)) => Ok(Some(value)),
        Some(FlagRepr::Number(n)) if n == 0.0 => Ok(Some(false)),
        Some(FlagRepr::Number(n)) if n == 1.0 => Ok(Some(true)),
        Some(FlagRepr::Number(n)) => Err(de::Error::custom(format!(
            "expected a boolean flag (true, false, 0 or 1), got {n}"
        ))),
    }
}

/// Read a capture time from an RFC 3339 string or epoch milliseconds.
///
/// The timestamp only feeds batch summaries, so anything else is dropped to
/// `None` instead of rejecting the record.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TimestampRepr {
        Millis(i64),
        Text(String),
        Other(de::IgnoredAny),
    }

    let parsed = match Option::<TimestampRepr>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(TimestampRepr::Millis(ms)) => DateTime::<Utc>::from_timestamp_millis(ms),
        Some(TimestampRepr::Text(text)) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Some(TimestampRepr::Other(_)) => None,
    };

    if parsed.is_none() {
        log::debug!("ignoring unreadable record timestamp");
    }
    Ok(parsed)
}

/// One multi-sensor telemetry window
///
/// Field names follow the producer's camelCase wire format
/// (`rawAccMagnitudeStatsMean`, `discreteTimeOfDayBetween21and3`, ...).
/// Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorRecord {
    /// Capture time of the window; never encoded into the feature vector
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,

    // Accelerometer (raw)
    pub raw_acc_magnitude_stats_mean: Option<f64>,
    pub raw_acc_magnitude_stats_std: Option<f64>,
    pub raw_acc_magnitude_stats_moment3: Option<f64>,
    pub raw_acc_magnitude_stats_moment4: Option<f64>,
    pub raw_acc_magnitude_stats_percentile25: Option<f64>,
    pub raw_acc_magnitude_stats_percentile50: Option<f64>,
    pub raw_acc_magnitude_stats_percentile75: Option<f64>,
    pub raw_acc3d_mean_x: Option<f64>,
    pub raw_acc3d_mean_y: Option<f64>,
    pub raw_acc3d_mean_z: Option<f64>,
    pub raw_acc3d_std_x: Option<f64>,
    pub raw_acc3d_std_y: Option<f64>,
    pub raw_acc3d_std_z: Option<f64>,
    pub raw_acc3d_ro_xy: Option<f64>,
    pub raw_acc3d_ro_xz: Option<f64>,
    pub raw_acc3d_ro_yz: Option<f64>,

    // Gyroscope (processed)
    pub proc_gyro_magnitude_stats_mean: Option<f64>,
    pub proc_gyro_magnitude_stats_std: Option<f64>,
    pub proc_gyro_magnitude_stats_moment3: Option<f64>,
    pub proc_gyro_magnitude_stats_moment4: Option<f64>,
    pub proc_gyro_magnitude_stats_percentile25: Option<f64>,
    pub proc_gyro_magnitude_stats_percentile50: Option<f64>,
    pub proc_gyro_magnitude_stats_percentile75: Option<f64>,
    pub proc_gyro3d_mean_x: Option<f64>,
    pub proc_gyro3d_mean_y: Option<f64>,
    pub proc_gyro3d_mean_z: Option<f64>,
    pub proc_gyro3d_std_x: Option<f64>,
    pub proc_gyro3d_std_y: Option<f64>,
    pub proc_gyro3d_std_z: Option<f64>,
    pub proc_gyro3d_ro_xy: Option<f64>,
    pub proc_gyro3d_ro_xz: Option<f64>,
    pub proc_gyro3d_ro_yz: Option<f64>,

    // Magnetometer (raw)
    pub raw_magnet_magnitude_stats_mean: Option<f64>,
    pub raw_magnet_magnitude_stats_std: Option<f64>,
    pub raw_magnet_magnitude_stats_moment3: Option<f64>,
    pub raw_magnet_magnitude_stats_moment4: Option<f64>,
    pub raw_magnet_magnitude_stats_percentile25: Option<f64>,
    pub raw_magnet_magnitude_stats_percentile50: Option<f64>,
    pub raw_magnet_magnitude_stats_percentile75: Option<f64>,
    pub raw_magnet3d_mean_x: Option<f64>,
    pub raw_magnet3d_mean_y: Option<f64>,
    pub raw_magnet3d_mean_z: Option<f64>,
    pub raw_magnet3d_std_x: Option<f64>,
    pub raw_magnet3d_std_y: Option<f64>,
    pub raw_magnet3d_std_z: Option<f64>,
    pub raw_magnet3d_ro_xy: Option<f64>,
    pub raw_magnet3d_ro_xz: Option<f64>,
    pub raw_magnet3d_ro_yz: Option<f64>,

    // Location
    pub location_num_valid_updates: Option<f64>,
    pub location_log_latitude_range: Option<f64>,
    pub location_log_longitude_range: Option<f64>,
    pub location_min_altitude: Option<f64>,
    pub location_max_altitude: Option<f64>,
    pub location_min_speed: Option<f64>,
    pub location_max_speed: Option<f64>,
    pub location_best_horizontal_accuracy: Option<f64>,
    pub location_best_vertical_accuracy: Option<f64>,
    pub location_diameter: Option<f64>,
    pub location_log_diameter: Option<f64>,
    pub location_quick_features_std_lat: Option<f64>,
    pub location_quick_features_std_long: Option<f64>,
    pub location_quick_features_lat_change: Option<f64>,
    pub location_quick_features_long_change: Option<f64>,

    // Audio
    pub audio_naive_mfcc0_mean: Option<f64>,
    pub audio_naive_mfcc1_mean: Option<f64>,
    pub audio_naive_mfcc2_mean: Option<f64>,
    pub audio_naive_mfcc3_mean: Option<f64>,
    pub audio_naive_mfcc4_mean: Option<f64>,
    pub audio_naive_mfcc5_mean: Option<f64>,
    pub audio_naive_mfcc6_mean: Option<f64>,
    pub audio_naive_mfcc7_mean: Option<f64>,
    pub audio_naive_mfcc8_mean: Option<f64>,
    pub audio_naive_mfcc9_mean: Option<f64>,
    pub audio_naive_mfcc10_mean: Option<f64>,
    pub audio_naive_mfcc11_mean: Option<f64>,
    pub audio_naive_mfcc12_mean: Option<f64>,
    pub audio_naive_mfcc0_std: Option<f64>,
    pub audio_naive_mfcc1_std: Option<f64>,
    pub audio_naive_mfcc2_std: Option<f64>,
    pub audio_naive_mfcc3_std: Option<f64>,
    pub audio_naive_mfcc4_std: Option<f64>,
    pub audio_naive_mfcc5_std: Option<f64>,
    pub audio_naive_mfcc6_std: Option<f64>,
    pub audio_naive_mfcc7_std: Option<f64>,
    pub audio_naive_mfcc8_std: Option<f64>,
    pub audio_naive_mfcc9_std: Option<f64>,
    pub audio_naive_mfcc10_std: Option<f64>,
    pub audio_naive_mfcc11_std: Option<f64>,
    pub audio_naive_mfcc12_std: Option<f64>,
    pub audio_properties_max_abs_value: Option<f64>,
    pub audio_properties_normalization_multiplier: Option<f64>,

    // App state
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_app_state_is_active: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_app_state_is_inactive: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_app_state_is_background: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_app_state_missing: Option<bool>,

    // Battery plug type
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_plugged_is_ac: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_plugged_is_usb: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_plugged_is_wireless: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_plugged_missing: Option<bool>,

    // Battery state
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_state_is_unknown: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_state_is_unplugged: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_state_is_not_charging: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_state_is_discharging: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_state_is_charging: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_state_is_full: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_battery_state_missing: Option<bool>,

    // Call state
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_on_the_phone_is_false: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_on_the_phone_is_true: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_on_the_phone_missing: Option<bool>,

    // Ringer mode
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_ringer_mode_is_normal: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_ringer_mode_is_silent_no_vibrate: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_ringer_mode_is_silent_with_vibrate: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_ringer_mode_missing: Option<bool>,

    // Network reachability
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_wifi_status_is_not_reachable: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_wifi_status_is_reachable_via_wifi: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_wifi_status_is_reachable_via_wwan: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_wifi_status_missing: Option<bool>,

    // Time of day
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between0and6: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between3and9: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between6and12: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between9and15: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between12and18: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between15and21: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between18and24: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub discrete_time_of_day_between21and3: Option<bool>,

    // Low-frequency measurements
    pub lf_measurements_light: Option<f64>,
    pub lf_measurements_pressure: Option<f64>,
    pub lf_measurements_proximity_cm: Option<f64>,
    pub lf_measurements_proximity: Option<f64>,
    pub lf_measurements_relative_humidity: Option<f64>,
    pub lf_measurements_battery_level: Option<f64>,
    pub lf_measurements_screen_brightness: Option<f64>,

    // Activity recognition hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<ActivityType>,
}

/// Batch prediction request: `{"data": [record, ...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictRequest {
    pub data: Vec<SensorRecord>,
}

/// Batch prediction response: `{"prediction": "LABEL"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: ActivityLabel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVectorBuilder;

    #[test]
    fn test_empty_object_is_all_unset() {
        let record: SensorRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record, SensorRecord::default());
    }

    #[test]
    fn test_camel_case_wire_names() {
        let json = r#"{
            "rawAccMagnitudeStatsMean": 9.81,
            "rawAcc3dRoXy": -0.25,
            "audioNaiveMfcc12Std": 3.5,
            "discreteTimeOfDayBetween21and3": true,
            "lfMeasurementsProximityCm": 5,
            "activityType": "ON_BICYCLE"
        }"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.raw_acc_magnitude_stats_mean, Some(9.81));
        assert_eq!(record.raw_acc3d_ro_xy, Some(-0.25));
        assert_eq!(record.audio_naive_mfcc12_std, Some(3.5));
        assert_eq!(record.discrete_time_of_day_between21and3, Some(true));
        assert_eq!(record.lf_measurements_proximity_cm, Some(5.0));
        assert_eq!(record.activity_type, Some(ActivityType::OnBicycle));
    }

    #[test]
    fn test_null_is_unset() {
        let json = r#"{"locationMaxSpeed": null, "discreteOnThePhoneIsTrue": null}"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.location_max_speed, None);
        assert_eq!(record.discrete_on_the_phone_is_true, None);
    }

    #[test]
    fn test_flags_accept_integers() {
        let json = r#"{"discreteAppStateIsActive": 1, "discreteAppStateMissing": 0}"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.discrete_app_state_is_active, Some(true));
        assert_eq!(record.discrete_app_state_missing, Some(false));

        let bad = r#"{"discreteAppStateIsActive": 2}"#;
        assert!(serde_json::from_str::<SensorRecord>(bad).is_err());
    }

    #[test]
    fn test_unknown_activity_type_kept() {
        let json = r#"{"activityType": "TILTING"}"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.activity_type,
            Some(ActivityType::Other("TILTING".to_string()))
        );
        assert_eq!(record.activity_type.unwrap().as_str(), "TILTING");
    }

    #[test]
    fn test_timestamp_parsed() {
        let json = r#"{"timestamp": "2024-03-01T12:00:00Z"}"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.timestamp.unwrap().to_rfc3339(),
            "2024-03-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_timestamp_accepts_epoch_millis() {
        let json = r#"{"timestamp": 1714557600000}"#;
        let record: SensorRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.timestamp.unwrap().to_rfc3339(),
            "2024-05-01T10:00:00+00:00"
        );
    }

    #[test]
    fn test_unreadable_timestamp_does_not_reject_record() {
        let plain: SensorRecord =
            serde_json::from_str(r#"{"rawAccMagnitudeStatsMean": 9.8}"#).unwrap();
        let expected = FeatureVectorBuilder::build(&plain);

        for timestamp in [r#""2024-05-01 10:00:00""#, "12.5", "[1, 2]", r#"{"s": 1}"#, "true"] {
            let json = format!(
                r#"{{"timestamp": {}, "rawAccMagnitudeStatsMean": 9.8}}"#,
                timestamp
            );
            let record: SensorRecord = serde_json::from_str(&json).unwrap();
            assert_eq!(record.timestamp, None, "{}", timestamp);
            assert_eq!(FeatureVectorBuilder::build(&record), expected);
        }

        let millis: SensorRecord = serde_json::from_str(
            r#"{"timestamp": 1714557600000, "rawAccMagnitudeStatsMean": 9.8}"#,
        )
        .unwrap();
        assert!(millis.timestamp.is_some());
        assert_eq!(FeatureVectorBuilder::build(&millis), expected);
    }

    #[test]
    fn test_request_and_response_shape() {
        let request: PredictRequest =
            serde_json::from_str(r#"{"data": [{}, {"rawAccMagnitudeStatsStd": 0.1}]}"#).unwrap();
        assert_eq!(request.data.len(), 2);

        let response = PredictResponse {
            prediction: ActivityLabel::Eating,
        };
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"prediction":"EATING"}"#
        );
    }
}
