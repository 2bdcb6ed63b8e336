//! Process-wide GDAL configuration
//!
//! Everything in this module mutates state shared by the whole process: the
//! exception mode, GDAL configuration options and the CPL error handler.
//! Set these once at start-up, before datasets are opened on other threads.
//! Toggling them concurrently from several threads is not synchronized with
//! in-flight GDAL calls and is the caller's responsibility to avoid.
//!
//! ```no_run
//! use gdal_facade::config;
//!
//! config::use_exceptions(true);
//! config::route_errors_to_log();
//! config::set_config_option("GDAL_CACHEMAX", "512").unwrap();
//! ```

use std::ffi::{c_char, c_void, CString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use gdal_sys::{CPLErr, CPLErrorNum, CPLGetErrorHandlerUserData};

use crate::errors::{CplErrType, Result};
use crate::utils::_string;

static USE_EXCEPTIONS: AtomicBool = AtomicBool::new(false);

/// Switch between error-code and raise-on-error reporting.
///
/// With exceptions disabled (the default) an operation fails only when GDAL
/// returns no handle or a non-success code. With exceptions enabled, a
/// `CE_Failure` or `CE_Fatal` that GDAL raises during an operation also fails
/// it, even when a handle came back; that handle is released before the error
/// is returned. Enabling clears any pending CPL error.
///
/// This is process-wide state. It is meant to be set once at process start;
/// toggling it while other threads run GDAL operations races with them.
pub fn use_exceptions(enable: bool) {
    if enable {
        unsafe { gdal_sys::CPLErrorReset() };
    }
    USE_EXCEPTIONS.store(enable, Ordering::SeqCst);
    log::debug!(target: "gdal", "exception mode {}", if enable { "enabled" } else { "disabled" });
}

/// Whether [`use_exceptions`] is currently enabled.
pub fn exceptions_enabled() -> bool {
    USE_EXCEPTIONS.load(Ordering::SeqCst)
}

/// Set a GDAL library configuration option
///
/// Refer to [GDAL `ConfigOptions`](https://gdal.org/user/configoptions.html) for
/// a full list of options.
pub fn set_config_option(key: &str, value: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    let c_val = CString::new(value.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetConfigOption(c_key.as_ptr(), c_val.as_ptr());
    };
    Ok(())
}

/// Get the value of a GDAL library configuration option
///
/// If the option is not set, `default` is returned.
pub fn get_config_option(key: &str, default: &str) -> Result<String> {
    let c_key = CString::new(key.as_bytes())?;
    let c_default = CString::new(default.as_bytes())?;
    let rv = unsafe { gdal_sys::CPLGetConfigOption(c_key.as_ptr(), c_default.as_ptr()) };
    Ok(_string(rv))
}

/// Clear the value of a GDAL library configuration option
pub fn clear_config_option(key: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetConfigOption(c_key.as_ptr(), ::std::ptr::null());
    };
    Ok(())
}

type ErrorCallbackType = dyn FnMut(CplErrType, i32, &str) + 'static + Send;
// Double-`Box`ed: the outer box gives a stable address to hand to GDAL, the
// inner (sized) box makes that address a thin pointer castable from `*mut c_void`.
type PinnedErrorCallback = Box<Box<ErrorCallbackType>>;

/// Holds the installed callback so the pointer given to GDAL never dangles.
static ERROR_CALLBACK: Mutex<Option<PinnedErrorCallback>> = Mutex::new(None);

/// Set a custom error handler for GDAL.
///
/// The callback receives every CPL message (debug, warning, failure) emitted
/// by GDAL on any thread, so it must be `Send`.
pub fn set_error_handler<F>(callback: F)
where
    F: FnMut(CplErrType, i32, &str) + 'static + Send,
{
    unsafe extern "C" fn error_handler(
        error_type: CPLErr::Type,
        error_num: CPLErrorNum,
        error_msg_ptr: *const c_char,
    ) {
        let error_msg = _string(error_msg_ptr);
        let error_type: CplErrType = error_type.into();

        // reconstruct callback from user data pointer
        let callback_raw = CPLGetErrorHandlerUserData();
        if callback_raw.is_null() {
            return;
        }
        let callback: &mut Box<ErrorCallbackType> = &mut *(callback_raw as *mut Box<_>);

        callback(error_type, error_num, &error_msg);
    }

    let mut callback: PinnedErrorCallback = Box::new(Box::new(callback));
    let callback_ref: &mut Box<ErrorCallbackType> = callback.as_mut();

    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        // poisoning could only occur on `CPLSetErrorHandlerEx` panicking; the value is still valid
        Err(poison_error) => poison_error.into_inner(),
    };

    // changing the error callback is fenced by the callback lock
    unsafe {
        gdal_sys::CPLSetErrorHandlerEx(Some(error_handler), callback_ref as *mut _ as *mut c_void);
    };

    callback_lock.replace(callback);
}

/// Restore GDAL's default error handler (which prints to `stderr`).
pub fn remove_error_handler() {
    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    };

    unsafe {
        gdal_sys::CPLSetErrorHandler(None);
    };

    callback_lock.take();
}

/// Forward GDAL's CPL messages to the [`log`] facade under the `gdal` target.
///
/// Debug messages are only produced by GDAL when the `CPL_DEBUG` config
/// option is `ON`.
pub fn route_errors_to_log() {
    set_error_handler(|class, number, msg| match class {
        CplErrType::None | CplErrType::Debug => log::debug!(target: "gdal", "{msg}"),
        CplErrType::Warning => log::warn!(target: "gdal", "[{number}] {msg}"),
        CplErrType::Failure | CplErrType::Fatal => {
            log::error!(target: "gdal", "[{number}] {msg}")
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_options() {
        // Config options are process-global in GDAL, so these run sequentially.

        assert!(set_config_option("GDAL_FACADE_TEST", "128").is_ok());
        assert_eq!(get_config_option("GDAL_FACADE_TEST", "").unwrap(), "128");
        assert_eq!(
            get_config_option("GDAL_FACADE_NON_EXISTANT", "DEFAULT_VALUE").unwrap(),
            "DEFAULT_VALUE"
        );

        assert!(clear_config_option("GDAL_FACADE_TEST").is_ok());
        assert_eq!(get_config_option("GDAL_FACADE_TEST", "XXX").unwrap(), "XXX");

        assert!(set_config_option("f\0oo", "valid").is_err());
        assert!(set_config_option("foo", "in\0valid").is_err());
        assert!(get_config_option("f\0oo", "").is_err());
    }
}
