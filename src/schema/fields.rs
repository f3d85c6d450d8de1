//! Feature schema table
//!
//! The table below is the single source of truth for feature order. Position
//! `i` in [`FIELDS`] is column `i` of every feature vector the classifier sees,
//! so entries must never be reordered, inserted or removed.

use serde::Serialize;
use std::fmt;
use std::ops::Range;

use super::record::{ActivityType, SensorRecord};

/// Width of every encoded feature vector
pub const FEATURE_COUNT: usize = 137;

/// Value written for any field the record leaves unset
pub const MISSING_DEFAULT: f64 = 0.0;

/// Logical sensor group a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Accelerometer,
    Gyroscope,
    Magnetometer,
    Location,
    Audio,
    AppState,
    BatteryPlugged,
    BatteryState,
    OnThePhone,
    RingerMode,
    WifiStatus,
    TimeOfDay,
    LowFrequency,
    ActivityType,
}

impl FieldGroup {
    pub const ALL: [FieldGroup; 14] = [
        FieldGroup::Accelerometer,
        FieldGroup::Gyroscope,
        FieldGroup::Magnetometer,
        FieldGroup::Location,
        FieldGroup::Audio,
        FieldGroup::AppState,
        FieldGroup::BatteryPlugged,
        FieldGroup::BatteryState,
        FieldGroup::OnThePhone,
        FieldGroup::RingerMode,
        FieldGroup::WifiStatus,
        FieldGroup::TimeOfDay,
        FieldGroup::LowFrequency,
        FieldGroup::ActivityType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldGroup::Accelerometer => "accelerometer",
            FieldGroup::Gyroscope => "gyroscope",
            FieldGroup::Magnetometer => "magnetometer",
            FieldGroup::Location => "location",
            FieldGroup::Audio => "audio",
            FieldGroup::AppState => "app_state",
            FieldGroup::BatteryPlugged => "battery_plugged",
            FieldGroup::BatteryState => "battery_state",
            FieldGroup::OnThePhone => "on_the_phone",
            FieldGroup::RingerMode => "ringer_mode",
            FieldGroup::WifiStatus => "wifi_status",
            FieldGroup::TimeOfDay => "time_of_day",
            FieldGroup::LowFrequency => "low_frequency",
            FieldGroup::ActivityType => "activity_type",
        }
    }

    /// Groups encoded from boolean flags
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            FieldGroup::AppState
                | FieldGroup::BatteryPlugged
                | FieldGroup::BatteryState
                | FieldGroup::OnThePhone
                | FieldGroup::RingerMode
                | FieldGroup::WifiStatus
                | FieldGroup::TimeOfDay
        )
    }
}

/// How a schema position is read from a record
#[derive(Clone)]
pub enum FieldRule {
    /// Optional real-valued measurement, passed through as-is
    Numeric(fn(&SensorRecord) -> Option<f64>),
    /// Optional boolean flag, `true -> 1`, `false -> 0`
    Flag(fn(&SensorRecord) -> Option<bool>),
    /// One-hot indicator for a single `activityType` value
    Indicator(ActivityType),
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldRule::Numeric(_) => f.write_str("Numeric"),
            FieldRule::Flag(_) => f.write_str("Flag"),
            FieldRule::Indicator(activity) => write!(f, "Indicator({})", activity.as_str()),
        }
    }
}

/// One column of the feature vector
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Wire name of the source field (indicators use `activityType:<VALUE>`)
    pub name: &'static str,
    pub group: FieldGroup,
    pub rule: FieldRule,
}

impl FieldSpec {
    /// Encode this column for `record`, substituting [`MISSING_DEFAULT`] for unset values.
    pub fn encode(&self, record: &SensorRecord) -> f64 {
        match &self.rule {
            FieldRule::Numeric(get) => get(record).unwrap_or(MISSING_DEFAULT),
            FieldRule::Flag(get) => get(record)
                .map(|flag| if flag { 1.0 } else { 0.0 })
                .unwrap_or(MISSING_DEFAULT),
            FieldRule::Indicator(expected) => match &record.activity_type {
                Some(actual) if actual.as_str() == expected.as_str() => 1.0,
                _ => 0.0,
            },
        }
    }

    pub fn encoding(&self) -> &'static str {
        match self.rule {
            FieldRule::Numeric(_) => "numeric",
            FieldRule::Flag(_) => "flag",
            FieldRule::Indicator(_) => "indicator",
        }
    }
}

/// Serializable view of one schema position
#[derive(Debug, Clone, Serialize)]
pub struct SchemaEntry {
    pub index: usize,
    pub name: &'static str,
    pub group: FieldGroup,
    pub encoding: &'static str,
    pub default: f64,
}

/// Describe the full schema in feature order
pub fn describe() -> Vec<SchemaEntry> {
    FIELDS
        .iter()
        .enumerate()
        .map(|(index, field)| SchemaEntry {
            index,
            name: field.name,
            group: field.group,
            encoding: field.encoding(),
            default: MISSING_DEFAULT,
        })
        .collect()
}

/// Position of a field in the feature vector
pub fn field_index(name: &str) -> Option<usize> {
    FIELDS.iter().position(|field| field.name == name)
}

/// Contiguous column range occupied by a group
pub fn group_range(group: FieldGroup) -> Range<usize> {
    let start = FIELDS
        .iter()
        .position(|field| field.group == group)
        .unwrap_or(FEATURE_COUNT);
    let len = FIELDS[start..]
        .iter()
        .take_while(|field| field.group == group)
        .count();
    start..start + len
}

macro_rules! numeric {
    ($name:literal, $group:ident, $field:ident) => {
        FieldSpec {
            name: $name,
            group: FieldGroup::$group,
            rule: FieldRule::Numeric(|r: &SensorRecord| r.$field),
        }
    };
}

macro_rules! flag {
    ($name:literal, $group:ident, $field:ident) => {
        FieldSpec {
            name: $name,
            group: FieldGroup::$group,
            rule: FieldRule::Flag(|r: &SensorRecord| r.$field),
        }
    };
}

macro_rules! indicator {
    ($name:literal, $activity:ident) => {
        FieldSpec {
            name: $name,
            group: FieldGroup::ActivityType,
            rule: FieldRule::Indicator(ActivityType::$activity),
        }
    };
}

/// Feature order expected by the trained classifier
pub static FIELDS: [FieldSpec; FEATURE_COUNT] = [
    // Accelerometer (raw)
    numeric!("rawAccMagnitudeStatsMean", Accelerometer, raw_acc_magnitude_stats_mean),
    numeric!("rawAccMagnitudeStatsStd", Accelerometer, raw_acc_magnitude_stats_std),
    numeric!("rawAccMagnitudeStatsMoment3", Accelerometer, raw_acc_magnitude_stats_moment3),
    numeric!("rawAccMagnitudeStatsMoment4", Accelerometer, raw_acc_magnitude_stats_moment4),
    numeric!("rawAccMagnitudeStatsPercentile25", Accelerometer, raw_acc_magnitude_stats_percentile25),
    numeric!("rawAccMagnitudeStatsPercentile50", Accelerometer, raw_acc_magnitude_stats_percentile50),
    numeric!("rawAccMagnitudeStatsPercentile75", Accelerometer, raw_acc_magnitude_stats_percentile75),
    numeric!("rawAcc3dMeanX", Accelerometer, raw_acc3d_mean_x),
    numeric!("rawAcc3dMeanY", Accelerometer, raw_acc3d_mean_y),
    numeric!("rawAcc3dMeanZ", Accelerometer, raw_acc3d_mean_z),
    numeric!("rawAcc3dStdX", Accelerometer, raw_acc3d_std_x),
    numeric!("rawAcc3dStdY", Accelerometer, raw_acc3d_std_y),
    numeric!("rawAcc3dStdZ", Accelerometer, raw_acc3d_std_z),
    numeric!("rawAcc3dRoXy", Accelerometer, raw_acc3d_ro_xy),
    numeric!("rawAcc3dRoXz", Accelerometer, raw_acc3d_ro_xz),
    numeric!("rawAcc3dRoYz", Accelerometer, raw_acc3d_ro_yz),
    // Gyroscope (processed)
    numeric!("procGyroMagnitudeStatsMean", Gyroscope, proc_gyro_magnitude_stats_mean),
    numeric!("procGyroMagnitudeStatsStd", Gyroscope, proc_gyro_magnitude_stats_std),
    numeric!("procGyroMagnitudeStatsMoment3", Gyroscope, proc_gyro_magnitude_stats_moment3),
    numeric!("procGyroMagnitudeStatsMoment4", Gyroscope, proc_gyro_magnitude_stats_moment4),
    numeric!("procGyroMagnitudeStatsPercentile25", Gyroscope, proc_gyro_magnitude_stats_percentile25),
    numeric!("procGyroMagnitudeStatsPercentile50", Gyroscope, proc_gyro_magnitude_stats_percentile50),
    numeric!("procGyroMagnitudeStatsPercentile75", Gyroscope, proc_gyro_magnitude_stats_percentile75),
    numeric!("procGyro3dMeanX", Gyroscope, proc_gyro3d_mean_x),
    numeric!("procGyro3dMeanY", Gyroscope, proc_gyro3d_mean_y),
    numeric!("procGyro3dMeanZ", Gyroscope, proc_gyro3d_mean_z),
    numeric!("procGyro3dStdX", Gyroscope, proc_gyro3d_std_x),
    numeric!("procGyro3dStdY", Gyroscope, proc_gyro3d_std_y),
    numeric!("procGyro3dStdZ", Gyroscope, proc_gyro3d_std_z),
    numeric!("procGyro3dRoXy", Gyroscope, proc_gyro3d_ro_xy),
    numeric!("procGyro3dRoXz", Gyroscope, proc_gyro3d_ro_xz),
    numeric!("procGyro3dRoYz", Gyroscope, proc_gyro3d_ro_yz),
    // Magnetometer (raw)
    numeric!("rawMagnetMagnitudeStatsMean", Magnetometer, raw_magnet_magnitude_stats_mean),
    numeric!("rawMagnetMagnitudeStatsStd", Magnetometer, raw_magnet_magnitude_stats_std),
    numeric!("rawMagnetMagnitudeStatsMoment3", Magnetometer, raw_magnet_magnitude_stats_moment3),
    numeric!("rawMagnetMagnitudeStatsMoment4", Magnetometer, raw_magnet_magnitude_stats_moment4),
    numeric!("rawMagnetMagnitudeStatsPercentile25", Magnetometer, raw_magnet_magnitude_stats_percentile25),
    numeric!("rawMagnetMagnitudeStatsPercentile50", Magnetometer, raw_magnet_magnitude_stats_percentile50),
    numeric!("rawMagnetMagnitudeStatsPercentile75", Magnetometer, raw_magnet_magnitude_stats_percentile75),
    numeric!("rawMagnet3dMeanX", Magnetometer, raw_magnet3d_mean_x),
    numeric!("rawMagnet3dMeanY", Magnetometer, raw_magnet3d_mean_y),
    numeric!("rawMagnet3dMeanZ", Magnetometer, raw_magnet3d_mean_z),
    numeric!("rawMagnet3dStdX", Magnetometer, raw_magnet3d_std_x),
    numeric!("rawMagnet3dStdY", Magnetometer, raw_magnet3d_std_y),
    numeric!("rawMagnet3dStdZ", Magnetometer, raw_magnet3d_std_z),
    numeric!("rawMagnet3dRoXy", Magnetometer, raw_magnet3d_ro_xy),
    numeric!("rawMagnet3dRoXz", Magnetometer, raw_magnet3d_ro_xz),
    numeric!("rawMagnet3dRoYz", Magnetometer, raw_magnet3d_ro_yz),
    // Location
    numeric!("locationNumValidUpdates", Location, location_num_valid_updates),
    numeric!("locationLogLatitudeRange", Location, location_log_latitude_range),
    numeric!("locationLogLongitudeRange", Location, location_log_longitude_range),
    numeric!("locationMinAltitude", Location, location_min_altitude),
    numeric!("locationMaxAltitude", Location, location_max_altitude),
    numeric!("locationMinSpeed", Location, location_min_speed),
    numeric!("locationMaxSpeed", Location, location_max_speed),
    numeric!("locationBestHorizontalAccuracy", Location, location_best_horizontal_accuracy),
    numeric!("locationBestVerticalAccuracy", Location, location_best_vertical_accuracy),
    numeric!("locationDiameter", Location, location_diameter),
    numeric!("locationLogDiameter", Location, location_log_diameter),
    numeric!("locationQuickFeaturesStdLat", Location, location_quick_features_std_lat),
    numeric!("locationQuickFeaturesStdLong", Location, location_quick_features_std_long),
    numeric!("locationQuickFeaturesLatChange", Location, location_quick_features_lat_change),
    numeric!("locationQuickFeaturesLongChange", Location, location_quick_features_long_change),
    // Audio
    numeric!("audioNaiveMfcc0Mean", Audio, audio_naive_mfcc0_mean),
    numeric!("audioNaiveMfcc1Mean", Audio, audio_naive_mfcc1_mean),
    numeric!("audioNaiveMfcc2Mean", Audio, audio_naive_mfcc2_mean),
    numeric!("audioNaiveMfcc3Mean", Audio, audio_naive_mfcc3_mean),
    numeric!("audioNaiveMfcc4Mean", Audio, audio_naive_mfcc4_mean),
    numeric!("audioNaiveMfcc5Mean", Audio, audio_naive_mfcc5_mean),
    numeric!("audioNaiveMfcc6Mean", Audio, audio_naive_mfcc6_mean),
    numeric!("audioNaiveMfcc7Mean", Audio, audio_naive_mfcc7_mean),
    numeric!("audioNaiveMfcc8Mean", Audio, audio_naive_mfcc8_mean),
    numeric!("audioNaiveMfcc9Mean", Audio, audio_naive_mfcc9_mean),
    numeric!("audioNaiveMfcc10Mean", Audio, audio_naive_mfcc10_mean),
    numeric!("audioNaiveMfcc11Mean", Audio, audio_naive_mfcc11_mean),
    numeric!("audioNaiveMfcc12Mean", Audio, audio_naive_mfcc12_mean),
    numeric!("audioNaiveMfcc0Std", Audio, audio_naive_mfcc0_std),
    numeric!("audioNaiveMfcc1Std", Audio, audio_naive_mfcc1_std),
    numeric!("audioNaiveMfcc2Std", Audio, audio_naive_mfcc2_std),
    numeric!("audioNaiveMfcc3Std", Audio, audio_naive_mfcc3_std),
    numeric!("audioNaiveMfcc4Std", Audio, audio_naive_mfcc4_std),
    numeric!("audioNaiveMfcc5Std", Audio, audio_naive_mfcc5_std),
    numeric!("audioNaiveMfcc6Std", Audio, audio_naive_mfcc6_std),
    numeric!("audioNaiveMfcc7Std", Audio, audio_naive_mfcc7_std),
    numeric!("audioNaiveMfcc8Std", Audio, audio_naive_mfcc8_std),
    numeric!("audioNaiveMfcc9Std", Audio, audio_naive_mfcc9_std),
    numeric!("audioNaiveMfcc10Std", Audio, audio_naive_mfcc10_std),
    numeric!("audioNaiveMfcc11Std", Audio, audio_naive_mfcc11_std),
    numeric!("audioNaiveMfcc12Std", Audio, audio_naive_mfcc12_std),
    numeric!("audioPropertiesMaxAbsValue", Audio, audio_properties_max_abs_value),
    numeric!("audioPropertiesNormalizationMultiplier", Audio, audio_properties_normalization_multiplier),
    // App state
    flag!("discreteAppStateIsActive", AppState, discrete_app_state_is_active),
    flag!("discreteAppStateIsInactive", AppState, discrete_app_state_is_inactive),
    flag!("discreteAppStateIsBackground", AppState, discrete_app_state_is_background),
    flag!("discreteAppStateMissing", AppState, discrete_app_state_missing),
    // Battery plug type
    flag!("discreteBatteryPluggedIsAc", BatteryPlugged, discrete_battery_plugged_is_ac),
    flag!("discreteBatteryPluggedIsUsb", BatteryPlugged, discrete_battery_plugged_is_usb),
    flag!("discreteBatteryPluggedIsWireless", BatteryPlugged, discrete_battery_plugged_is_wireless),
    flag!("discreteBatteryPluggedMissing", BatteryPlugged, discrete_battery_plugged_missing),
    // Battery state
    flag!("discreteBatteryStateIsUnknown", BatteryState, discrete_battery_state_is_unknown),
    flag!("discreteBatteryStateIsUnplugged", BatteryState, discrete_battery_state_is_unplugged),
    flag!("discreteBatteryStateIsNotCharging", BatteryState, discrete_battery_state_is_not_charging),
    flag!("discreteBatteryStateIsDischarging", BatteryState, discrete_battery_state_is_discharging),
    flag!("discreteBatteryStateIsCharging", BatteryState, discrete_battery_state_is_charging),
    flag!("discreteBatteryStateIsFull", BatteryState, discrete_battery_state_is_full),
    flag!("discreteBatteryStateMissing", BatteryState, discrete_battery_state_missing),
    // Call state
    flag!("discreteOnThePhoneIsFalse", OnThePhone, discrete_on_the_phone_is_false),
    flag!("discreteOnThePhoneIsTrue", OnThePhone, discrete_on_the_phone_is_true),
    flag!("discreteOnThePhoneMissing", OnThePhone, discrete_on_the_phone_missing),
    // Ringer mode
    flag!("discreteRingerModeIsNormal", RingerMode, discrete_ringer_mode_is_normal),
    flag!("discreteRingerModeIsSilentNoVibrate", RingerMode, discrete_ringer_mode_is_silent_no_vibrate),
    flag!("discreteRingerModeIsSilentWithVibrate", RingerMode, discrete_ringer_mode_is_silent_with_vibrate),
    flag!("discreteRingerModeMissing", RingerMode, discrete_ringer_mode_missing),
    // Network reachability
    flag!("discreteWifiStatusIsNotReachable", WifiStatus, discrete_wifi_status_is_not_reachable),
    flag!("discreteWifiStatusIsReachableViaWifi", WifiStatus, discrete_wifi_status_is_reachable_via_wifi),
    flag!("discreteWifiStatusIsReachableViaWwan", WifiStatus, discrete_wifi_status_is_reachable_via_wwan),
    flag!("discreteWifiStatusMissing", WifiStatus, discrete_wifi_status_missing),
    // Time of day
    flag!("discreteTimeOfDayBetween0and6", TimeOfDay, discrete_time_of_day_between0and6),
    flag!("discreteTimeOfDayBetween3and9", TimeOfDay, discrete_time_of_day_between3and9),
    flag!("discreteTimeOfDayBetween6and12", TimeOfDay, discrete_time_of_day_between6and12),
    flag!("discreteTimeOfDayBetween9and15", TimeOfDay, discrete_time_of_day_between9and15),
    flag!("discreteTimeOfDayBetween12and18", TimeOfDay, discrete_time_of_day_between12and18),
    flag!("discreteTimeOfDayBetween15and21", TimeOfDay, discrete_time_of_day_between15and21),
    flag!("discreteTimeOfDayBetween18and24", TimeOfDay, discrete_time_of_day_between18and24),
    flag!("discreteTimeOfDayBetween21and3", TimeOfDay, discrete_time_of_day_between21and3),
    // Low-frequency measurements
    numeric!("lfMeasurementsLight", LowFrequency, lf_measurements_light),
    numeric!("lfMeasurementsPressure", LowFrequency, lf_measurements_pressure),
    numeric!("lfMeasurementsProximityCm", LowFrequency, lf_measurements_proximity_cm),
    numeric!("lfMeasurementsProximity", LowFrequency, lf_measurements_proximity),
    numeric!("lfMeasurementsRelativeHumidity", LowFrequency, lf_measurements_relative_humidity),
    numeric!("lfMeasurementsBatteryLevel", LowFrequency, lf_measurements_battery_level),
    numeric!("lfMeasurementsScreenBrightness", LowFrequency, lf_measurements_screen_brightness),
    // Activity recognition hint, no missing indicator
    indicator!("activityType:IN_VEHICLE", InVehicle),
    indicator!("activityType:WALKING", Walking),
    indicator!("activityType:RUNNING", Running),
    indicator!("activityType:ON_BICYCLE", OnBicycle),
    indicator!("activityType:SLEEPING", Sleeping),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique() {
        let names: HashSet<&str> = FIELDS.iter().map(|field| field.name).collect();
        assert_eq!(names.len(), FEATURE_COUNT);
    }

    #[test]
    fn test_groups_contiguous() {
        let mut seen = Vec::new();
        for field in FIELDS.iter() {
            if seen.last() != Some(&field.group) {
                assert!(
                    !seen.contains(&field.group),
                    "group {:?} appears twice",
                    field.group
                );
                seen.push(field.group);
            }
        }
        assert_eq!(seen, FieldGroup::ALL.to_vec());
    }

    #[test]
    fn test_group_sizes() {
        let sizes: Vec<(FieldGroup, usize)> = FieldGroup::ALL
            .iter()
            .map(|g| (*g, group_range(*g).len()))
            .collect();
        assert_eq!(
            sizes,
            vec![
                (FieldGroup::Accelerometer, 16),
                (FieldGroup::Gyroscope, 16),
                (FieldGroup::Magnetometer, 16),
                (FieldGroup::Location, 15),
                (FieldGroup::Audio, 28),
                (FieldGroup::AppState, 4),
                (FieldGroup::BatteryPlugged, 4),
                (FieldGroup::BatteryState, 7),
                (FieldGroup::OnThePhone, 3),
                (FieldGroup::RingerMode, 4),
                (FieldGroup::WifiStatus, 4),
                (FieldGroup::TimeOfDay, 8),
                (FieldGroup::LowFrequency, 7),
                (FieldGroup::ActivityType, 5),
            ]
        );
    }

    #[test]
    fn test_discrete_groups_are_flags() {
        for field in FIELDS.iter() {
            let is_flag = matches!(field.rule, FieldRule::Flag(_));
            assert_eq!(field.group.is_discrete(), is_flag, "{}", field.name);
        }
    }

    #[test]
    fn test_landmark_positions() {
        assert_eq!(field_index("rawAccMagnitudeStatsMean"), Some(0));
        assert_eq!(field_index("procGyroMagnitudeStatsMean"), Some(16));
        assert_eq!(field_index("rawMagnetMagnitudeStatsMean"), Some(32));
        assert_eq!(field_index("locationNumValidUpdates"), Some(48));
        assert_eq!(field_index("audioNaiveMfcc0Mean"), Some(63));
        assert_eq!(field_index("discreteAppStateIsActive"), Some(91));
        assert_eq!(field_index("lfMeasurementsLight"), Some(125));
        assert_eq!(field_index("activityType:IN_VEHICLE"), Some(132));
        assert_eq!(field_index("activityType:SLEEPING"), Some(136));
        assert_eq!(field_index("activityType"), None);
    }

    #[test]
    fn test_missing_flags_per_group() {
        for group in FieldGroup::ALL {
            let has_missing = FIELDS[group_range(group)]
                .iter()
                .any(|field| field.name.ends_with("Missing"));
            let expected = group.is_discrete() && group != FieldGroup::TimeOfDay;
            assert_eq!(has_missing, expected, "{:?}", group);
        }
    }

    #[test]
    fn test_describe_matches_table() {
        let entries = describe();
        assert_eq!(entries.len(), FEATURE_COUNT);
        assert_eq!(entries[91].encoding, "flag");
        assert_eq!(entries[134].name, "activityType:RUNNING");
        assert_eq!(entries[134].encoding, "indicator");
        assert!(entries.iter().all(|e| e.default == MISSING_DEFAULT));
    }
}
