//! FFI interface for C/C++ hosts
//!
//! One-shot resolution over an HTML snapshot. Inputs and outputs are JSON
//! strings; every result must be released with `free_report_result`.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Serialize;

use crate::capture::CaptureConfig;
use crate::dom::{DomReader, HtmlSnapshot};
use crate::engine::{NavigationOverride, PropertyEngine};
use crate::extractors::extract_structured_data;

/// Result struct returned to the host
/// Both pointers are owned by Rust and must be freed via free_report_result
#[repr(C)]
pub struct ReportResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if resolution failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

/// Resolve the page report for an HTML document loaded from `url`.
///
/// # Arguments
/// * `html_ptr` / `html_len` - HTML content (UTF-8, not necessarily null-terminated)
/// * `url` - absolute URL or path with query (null-terminated)
/// * `config_json` - `CaptureConfig` JSON, or null for the default `["all"]`
/// * `override_json` - `NavigationOverride` JSON, or null
///
/// # Returns
/// `{"type":"page","properties":{...}}`, or `null` when the page is suppressed.
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - string arguments must be null or valid null-terminated C strings
/// - Caller must free the result via `free_report_result`
#[no_mangle]
pub unsafe extern "C" fn resolve_page_report(
    html_ptr: *const c_char,
    html_len: usize,
    url: *const c_char,
    config_json: *const c_char,
    override_json: *const c_char,
) -> ReportResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let url = match read_c_str(url) {
        Ok(Some(u)) => u,
        Ok(None) => return make_error_result("URL is null"),
        Err(msg) => return make_error_result(msg),
    };

    let config = match read_c_str(config_json) {
        Ok(Some(json)) => match CaptureConfig::from_json(json) {
            Ok(c) => c,
            Err(e) => return make_error_result(&e.to_string()),
        },
        Ok(None) => CaptureConfig::default(),
        Err(msg) => return make_error_result(msg),
    };

    let nav_override = match read_c_str(override_json) {
        Ok(Some(json)) => match serde_json::from_str::<NavigationOverride>(json) {
            Ok(o) => Some(o),
            Err(e) => return make_error_result(&format!("Failed to parse override JSON: {}", e)),
        },
        Ok(None) => None,
        Err(msg) => return make_error_result(msg),
    };

    let snapshot = HtmlSnapshot::parse(&html, url);
    let engine = PropertyEngine::new(&config, &snapshot);

    match engine.resolve(&snapshot.location(), nav_override.as_ref()) {
        Ok(report) if report.is_empty() => make_json_result(&serde_json::Value::Null),
        Ok(report) => make_json_result(&report.payload()),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Flatten every JSON-LD block in the HTML into one property map.
///
/// # Safety
/// Same as resolve_page_report
#[no_mangle]
pub unsafe extern "C" fn flatten_structured_data(
    html_ptr: *const c_char,
    html_len: usize,
) -> ReportResultFFI {
    let html = match read_html(html_ptr, html_len) {
        Ok(h) => h,
        Err(msg) => return make_error_result(msg),
    };

    let snapshot = HtmlSnapshot::parse(&html, "/");
    match extract_structured_data(&snapshot.structured_data_blocks()) {
        Ok(properties) => make_json_result(&properties),
        Err(e) => make_error_result(&e.to_string()),
    }
}

/// Free a ReportResultFFI returned by this module
///
/// # Safety
/// - `result` must have been returned by a function in this module
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_report_result(result: ReportResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

unsafe fn read_html(html_ptr: *const c_char, html_len: usize) -> Result<String, &'static str> {
    if html_ptr.is_null() || html_len == 0 {
        return Ok(String::new());
    }
    let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
    std::str::from_utf8(slice)
        .map(String::from)
        .map_err(|_| "Invalid UTF-8 in HTML content")
}

unsafe fn read_c_str<'a>(ptr: *const c_char) -> Result<Option<&'a str>, &'static str> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|_| "Invalid UTF-8 in string argument")
}

fn make_json_result<T: Serialize>(value: &T) -> ReportResultFFI {
    match serde_json::to_string(value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ReportResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

// Helper to create error result
fn make_error_result(msg: &str) -> ReportResultFFI {
    let error_cstr = CString::new(msg.replace('\0', "")).unwrap_or_default();
    ReportResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr: error_cstr.into_raw(),
    }
}
