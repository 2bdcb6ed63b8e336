use std::ffi::{c_char, CStr, CString};
use std::path::Path;

use gdal_sys::CPLErr;

use crate::config::exceptions_enabled;
use crate::errors::*;

pub fn _string(raw_ptr: *const c_char) -> String {
    if raw_ptr.is_null() {
        return String::new();
    }
    let c_str = unsafe { CStr::from_ptr(raw_ptr) };
    c_str.to_string_lossy().into_owned()
}

/// Fetches the pending CPL error message and clears the error state.
pub fn _last_error_msg() -> String {
    let msg = _string(unsafe { gdal_sys::CPLGetLastErrorMsg() });
    unsafe { gdal_sys::CPLErrorReset() };
    msg
}

pub fn _last_cpl_err(cpl_err_class: CPLErr::Type) -> GdalError {
    let last_err_no = unsafe { gdal_sys::CPLGetLastErrorNo() };
    GdalError::CplError {
        class: cpl_err_class.into(),
        number: last_err_no,
        msg: _last_error_msg(),
    }
}

pub fn _last_null_pointer_err(method_name: &'static str) -> GdalError {
    GdalError::NullPointer {
        method_name,
        msg: _last_error_msg(),
    }
}

/// Clears stale CPL errors before a call when exception mode is on, so that
/// [`_pending_failure`] only sees what the call itself raised.
pub fn _reset_if_raising() {
    if exceptions_enabled() {
        unsafe { gdal_sys::CPLErrorReset() };
    }
}

/// In exception mode, returns the message of a failure GDAL raised during the
/// last call, even if that call produced a result.
pub fn _pending_failure() -> Option<String> {
    _pending_failure_in_mode(exceptions_enabled())
}

fn _pending_failure_in_mode(raising: bool) -> Option<String> {
    if !raising {
        return None;
    }
    let class: CplErrType = unsafe { gdal_sys::CPLGetLastErrorType() }.into();
    if class.is_failure() {
        Some(_last_error_msg())
    } else {
        None
    }
}

pub fn _path_to_c_string(path: &Path) -> Result<CString> {
    let path_str = path.to_string_lossy();
    CString::new(path_str.as_ref()).map_err(Into::into)
}
