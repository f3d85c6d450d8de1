//! FFI bindings for Activity Sense
//!
//! This module provides C-compatible functions for embedding the predictor in a
//! host application. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `activity_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;
use std::sync::Arc;

use crate::config::PredictorConfig;
use crate::features::FeatureVectorBuilder;
use crate::inference::{ensure_schema_width, SoftmaxClassifier};
use crate::pipeline::ActivityPredictor;
use crate::schema::{PredictRequest, SensorRecord};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Caller must free the result with `activity_free_string`
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Opaque handle owning a loaded predictor
pub struct ActivityPredictorHandle {
    predictor: ActivityPredictor,
}

fn into_handle(predictor: ActivityPredictor) -> *mut ActivityPredictorHandle {
    Box::into_raw(Box::new(ActivityPredictorHandle { predictor }))
}

// ============================================================================
// Predictor lifecycle
// ============================================================================

/// Create a predictor from TOML configuration text.
///
/// # Safety
/// - `config_toml` must be a valid null-terminated C string.
/// - Must be freed with `activity_predictor_free`.
/// - Returns NULL on error; call `activity_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn activity_predictor_from_config(
    config_toml: *const c_char,
) -> *mut ActivityPredictorHandle {
    clear_last_error();

    let toml_str = match cstr_to_string(config_toml) {
        Some(s) => s,
        None => {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        }
    };

    match PredictorConfig::from_toml(&toml_str).and_then(|c| ActivityPredictor::from_config(&c)) {
        Ok(predictor) => into_handle(predictor),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Create a predictor from softmax weights JSON (`{"weights": [...], "bias": [...]}`).
///
/// # Safety
/// - `weights_json` must be a valid null-terminated C string.
/// - Must be freed with `activity_predictor_free`.
/// - Returns NULL on error; call `activity_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn activity_predictor_from_weights(
    weights_json: *const c_char,
) -> *mut ActivityPredictorHandle {
    clear_last_error();

    let json_str = match cstr_to_string(weights_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid weights string pointer");
            return ptr::null_mut();
        }
    };

    let classifier = SoftmaxClassifier::from_json(&json_str).and_then(|classifier| {
        ensure_schema_width(&classifier)?;
        Ok(classifier)
    });

    match classifier {
        Ok(classifier) => into_handle(ActivityPredictor::new(Arc::new(classifier))),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a predictor.
///
/// # Safety
/// - `predictor` must be a pointer returned by an `activity_predictor_*` constructor, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn activity_predictor_free(predictor: *mut ActivityPredictorHandle) {
    if !predictor.is_null() {
        drop(Box::from_raw(predictor));
    }
}

// ============================================================================
// Prediction
// ============================================================================

/// Predict a batch label from a `{"data": [...]}` request.
///
/// # Safety
/// - `predictor` must be a valid predictor handle.
/// - `request_json` must be a valid null-terminated C string.
/// - Returns `{"prediction": "..."}` as a newly allocated string that must be freed
///   with `activity_free_string`.
/// - Returns NULL on error; call `activity_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn activity_predictor_predict(
    predictor: *const ActivityPredictorHandle,
    request_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if predictor.is_null() {
        set_last_error("Null predictor pointer");
        return ptr::null_mut();
    }
    let handle = &*predictor;

    let json_str = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.predictor.predict_json(&json_str) {
        Ok(response) => string_to_cstr(&response),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Predict a batch label and return the full prediction summary as JSON.
///
/// # Safety
/// - Same contract as `activity_predictor_predict`.
#[no_mangle]
pub unsafe extern "C" fn activity_predictor_predict_detailed(
    predictor: *const ActivityPredictorHandle,
    request_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if predictor.is_null() {
        set_last_error("Null predictor pointer");
        return ptr::null_mut();
    }
    let handle = &*predictor;

    let json_str = match cstr_to_string(request_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = serde_json::from_str::<PredictRequest>(&json_str)
        .map_err(crate::error::PredictError::from)
        .and_then(|request| handle.predictor.predict_detailed(&request.data))
        .and_then(|summary| serde_json::to_string(&summary).map_err(Into::into));

    match result {
        Ok(summary) => string_to_cstr(&summary),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Encode one sensor record and return its feature vector as a JSON array.
///
/// # Safety
/// - `record_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `activity_free_string`.
/// - Returns NULL on error; call `activity_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn activity_encode_record(record_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(record_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let result = serde_json::from_str::<SensorRecord>(&json_str)
        .and_then(|record| serde_json::to_string(&FeatureVectorBuilder::build(&record)));

    match result {
        Ok(vector) => string_to_cstr(&vector),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by an `activity_*` function.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an `activity_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn activity_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next `activity_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn activity_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn activity_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LABEL_COUNT;
    use crate::schema::FEATURE_COUNT;

    fn zero_weights_json() -> CString {
        let weights = serde_json::json!({
            "weights": vec![vec![0.0; FEATURE_COUNT]; LABEL_COUNT],
            "bias": vec![0.0; LABEL_COUNT],
        });
        CString::new(weights.to_string()).unwrap()
    }

    fn sample_request() -> CString {
        CString::new(
            r#"{"data": [
                {"rawAccMagnitudeStatsMean": 9.81, "activityType": "WALKING"},
                {"discreteRingerModeIsNormal": true}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_predictor_lifecycle() {
        let weights = zero_weights_json();
        let request = sample_request();

        unsafe {
            let predictor = activity_predictor_from_weights(weights.as_ptr());
            assert!(!predictor.is_null());

            // uniform output, first label wins every arg-max
            let result = activity_predictor_predict(predictor, request.as_ptr());
            assert!(!result.is_null());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert_eq!(result_str, r#"{"prediction":"TALKING"}"#);
            activity_free_string(result);

            let detailed = activity_predictor_predict_detailed(predictor, request.as_ptr());
            assert!(!detailed.is_null());
            let summary: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(detailed).to_str().unwrap()).unwrap();
            assert_eq!(summary["prediction"], "TALKING");
            assert_eq!(summary["record_count"], 2);
            activity_free_string(detailed);

            activity_predictor_free(predictor);
        }
    }

    #[test]
    fn test_ffi_from_config() {
        let config = CString::new(
            "[model]\nkind = \"fixed\"\ndistribution = [0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0]\n",
        )
        .unwrap();
        let request = sample_request();

        unsafe {
            let predictor = activity_predictor_from_config(config.as_ptr());
            assert!(!predictor.is_null());

            let result = activity_predictor_predict(predictor, request.as_ptr());
            let result_str = CStr::from_ptr(result).to_str().unwrap();
            assert_eq!(result_str, r#"{"prediction":"FIX_restaurant"}"#);

            activity_free_string(result);
            activity_predictor_free(predictor);
        }
    }

    #[test]
    fn test_ffi_encode_record() {
        let record = CString::new(r#"{"activityType": "RUNNING"}"#).unwrap();

        unsafe {
            let result = activity_encode_record(record.as_ptr());
            assert!(!result.is_null());

            let values: Vec<f64> =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(values.len(), FEATURE_COUNT);
            assert_eq!(values.iter().sum::<f64>(), 1.0);
            assert_eq!(values[FEATURE_COUNT - 3], 1.0);

            activity_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let weights = zero_weights_json();
        let empty = CString::new(r#"{"data": []}"#).unwrap();

        unsafe {
            let predictor = activity_predictor_from_weights(weights.as_ptr());

            let result = activity_predictor_predict(predictor, empty.as_ptr());
            assert!(result.is_null());

            let error = activity_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.starts_with("Invalid batch"));

            let result = activity_predictor_predict(ptr::null(), empty.as_ptr());
            assert!(result.is_null());

            activity_predictor_free(predictor);
        }
    }

    #[test]
    fn test_ffi_bad_weights() {
        let weights = CString::new(r#"{"weights": [[1.0]], "bias": [0.0]}"#).unwrap();

        unsafe {
            let predictor = activity_predictor_from_weights(weights.as_ptr());
            assert!(predictor.is_null());
            assert!(!activity_last_error().is_null());
        }
    }

    #[test]
    fn test_ffi_weights_narrower_than_schema() {
        let weights = serde_json::json!({
            "weights": vec![vec![0.1; 8]; LABEL_COUNT],
            "bias": vec![0.0; LABEL_COUNT],
        });
        let weights = CString::new(weights.to_string()).unwrap();

        unsafe {
            let predictor = activity_predictor_from_weights(weights.as_ptr());
            assert!(predictor.is_null());

            let error = activity_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("model accepts 8 features"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = activity_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
