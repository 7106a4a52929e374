//! FFI bindings for Handsight
//!
//! This module provides C-compatible functions for calling Handsight from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `handsight_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::ptr;

use crate::error::HandError;
use crate::interpret::ExerciseDefinition;
use crate::pipeline::{frames_to_reports, HandSession};
use crate::schema::FrameRecord;
use crate::types::Viewport;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Helper to convert a Vec<String> to a JSON array string
fn vec_to_json_array(vec: Vec<String>) -> String {
    // Each string is already valid JSON, so we join them as array elements
    let elements: Vec<&str> = vec.iter().map(|s| s.as_str()).collect();
    format!("[{}]", elements.join(","))
}

/// NULL selects the default exercise
unsafe fn parse_exercise(ptr: *const c_char) -> Result<ExerciseDefinition, HandError> {
    match cstr_to_string(ptr) {
        Some(s) => s.parse(),
        None => Ok(ExerciseDefinition::default()),
    }
}

fn make_viewport(width: f64, height: f64, mirror_x: c_int) -> Result<Viewport, HandError> {
    let viewport = Viewport::new(width, height)?;
    Ok(if mirror_x != 0 { viewport.mirrored() } else { viewport })
}

// ============================================================================
// Stateless API
// ============================================================================

/// Process a recorded frame stream (NDJSON or JSON array) and return a JSON
/// array of frame reports.
///
/// # Safety
/// - `frames` must be a valid null-terminated C string.
/// - `exercise` may be NULL (all fingers) or a C string such as `"isolation:index"`.
/// - Returns a newly allocated string that must be freed with `handsight_free_string`.
/// - Returns NULL on error; call `handsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn handsight_frames_to_reports(
    frames: *const c_char,
    width: f64,
    height: f64,
    mirror_x: c_int,
    exercise: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let frames_str = match cstr_to_string(frames) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frames string pointer");
            return ptr::null_mut();
        }
    };

    let result = make_viewport(width, height, mirror_x).and_then(|viewport| {
        let exercise = parse_exercise(exercise)?;
        frames_to_reports(&frames_str, viewport, exercise)
    });

    match result {
        Ok(reports) => string_to_cstr(&vec_to_json_array(reports)),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Session API
// ============================================================================

/// Opaque handle to a HandSession
pub struct HandSessionHandle {
    session: HandSession,
    viewport: Viewport,
}

/// Create a new session projecting onto a `width` x `height` surface.
///
/// # Safety
/// - `exercise` may be NULL or a valid null-terminated C string.
/// - Returns a pointer to a newly allocated session.
/// - Must be freed with `handsight_session_free`.
/// - Returns NULL on error (invalid surface size or exercise).
#[no_mangle]
pub unsafe extern "C" fn handsight_session_new(
    width: f64,
    height: f64,
    mirror_x: c_int,
    exercise: *const c_char,
) -> *mut HandSessionHandle {
    clear_last_error();

    let viewport = match make_viewport(width, height, mirror_x) {
        Ok(v) => v,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };
    let exercise = match parse_exercise(exercise) {
        Ok(ex) => ex,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    let handle = Box::new(HandSessionHandle {
        session: HandSession::with_exercise(exercise),
        viewport,
    });
    Box::into_raw(handle)
}

/// Free a session.
///
/// # Safety
/// - `session` must be a valid pointer returned by `handsight_session_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn handsight_session_free(session: *mut HandSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Process one hand.landmark_frame.v1 record.
///
/// Returns the frame report as JSON, or the JSON literal `null` when the
/// frame was rejected (too few landmarks, non-finite coordinates).
///
/// # Safety
/// - `session` must be a valid pointer returned by `handsight_session_new`.
/// - `frame_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `handsight_free_string`.
/// - Returns NULL on error; call `handsight_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn handsight_session_process_frame(
    session: *mut HandSessionHandle,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    let handle = &mut *session;

    let json_str = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    let result = serde_json::from_str::<FrameRecord>(&json_str)
        .map_err(HandError::from)
        .and_then(|record| handle.session.process_record(&record, &handle.viewport))
        .and_then(|report| serde_json::to_string(&report).map_err(|e| HandError::EncodingError(e.to_string())));

    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Make the next processed frame the new reference pose.
///
/// # Safety
/// - `session` must be a valid pointer returned by `handsight_session_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn handsight_session_recapture_reference(session: *mut HandSessionHandle) -> c_int {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    (*session).session.recapture_reference();
    0
}

/// Pause hold timing until `now_ms + duration_ms`.
///
/// # Safety
/// - `session` must be a valid pointer returned by `handsight_session_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn handsight_session_pause(
    session: *mut HandSessionHandle,
    now_ms: u64,
    duration_ms: u64,
) -> c_int {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    (*session).session.pause_for(now_ms, duration_ms);
    0
}

/// Cancel a pause started with `handsight_session_pause`.
///
/// # Safety
/// - `session` must be a valid pointer returned by `handsight_session_new`.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn handsight_session_resume(session: *mut HandSessionHandle) -> c_int {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    (*session).session.resume();
    0
}

/// Session totals as JSON.
///
/// # Safety
/// - `session` must be a valid pointer returned by `handsight_session_new`.
/// - Returns a newly allocated string that must be freed with `handsight_free_string`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn handsight_session_summary(session: *const HandSessionHandle) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    match serde_json::to_string(&(*session).session.summary()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a string returned by Handsight functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Handsight function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn handsight_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Handsight function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn handsight_last_error() -> *const c_char {
    LAST_ERROR.with(|e| {
        match &*e.borrow() {
            Some(cstr) => cstr.as_ptr(),
            None => ptr::null(),
        }
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Handsight library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn handsight_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
