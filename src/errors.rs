use std::ffi::{c_int, NulError};
use std::str::Utf8Error;

use gdal_sys::CPLErr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GdalError>;

#[derive(Clone, PartialEq, Debug, Error)]
pub enum GdalError {
    #[error("FfiNulError")]
    FfiNulError(#[from] NulError),
    #[error("StrUtf8Error")]
    StrUtf8Error(#[from] Utf8Error),

    #[error("Failed to open dataset '{path}': {msg}")]
    OpenError { path: String, msg: String },
    #[error("Translate to '{dest}' failed: {msg}")]
    TranslateError { dest: String, msg: String },
    #[error("Warp to '{dest}' failed: {msg}")]
    WarpError { dest: String, msg: String },
    #[error("Driver not found: '{name}'")]
    DriverNotFound { name: String },
    #[error("In-memory file '{file_name}' could not be opened: {msg}")]
    MemBufferError { file_name: String, msg: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Geo transform is uninvertible")]
    SingularTransform,

    #[error("CPL error class: '{class:?}', error number: '{number}', error msg: '{msg}'")]
    CplError {
        class: CplErrType,
        number: c_int,
        msg: String,
    },
    #[error("GDAL method '{method_name}' returned a NULL pointer. Error msg: '{msg}'")]
    NullPointer {
        method_name: &'static str,
        msg: String,
    },
    #[error("Unable to unlink mem file: {file_name}")]
    UnlinkMemFile { file_name: String },
}

/// A wrapper for [`CPLErr::Type`] that reflects it as an enum
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(C)]
pub enum CplErrType {
    None = 0,
    Debug = 1,
    Warning = 2,
    Failure = 3,
    Fatal = 4,
}

impl CplErrType {
    /// `true` for the classes that make a GDAL call unsuccessful.
    pub fn is_failure(self) -> bool {
        self >= CplErrType::Failure
    }
}

impl From<CPLErr::Type> for CplErrType {
    fn from(error_type: CPLErr::Type) -> Self {
        match error_type {
            CPLErr::CE_Debug => Self::Debug,
            CPLErr::CE_Warning => Self::Warning,
            CPLErr::CE_Failure => Self::Failure,
            CPLErr::CE_Fatal => Self::Fatal,
            // fallback type, should not happen
            _ => Self::None,
        }
    }
}
