use std::ffi::c_int;
use std::path::Path;
use std::ptr::null_mut;

use gdal_sys::GDALTranslateOptions;

use crate::errors::*;
use crate::programs::OptionSet;
use crate::utils::{_last_error_msg, _path_to_c_string, _pending_failure, _reset_if_raising};
use crate::Dataset;

/// Wraps a [GDALTranslateOptions] object, freed on drop.
///
/// [GDALTranslateOptions]: https://gdal.org/api/gdal_utils.html#_CPPv420GDALTranslateOptions
pub struct TranslateOptions {
    c_options: *mut GDALTranslateOptions,
}

impl TranslateOptions {
    /// Parse `gdal_translate` switches.
    ///
    /// See [GDALTranslateOptionsNew] and the [program docs] for accepted switches.
    ///
    /// [GDALTranslateOptionsNew]: https://gdal.org/api/gdal_utils.html#_CPPv423GDALTranslateOptionsNewPPcP33GDALTranslateOptionsForBinary
    /// [program docs]: https://gdal.org/programs/gdal_translate.html
    pub fn new(options: &OptionSet) -> Result<Self> {
        let mut c_args = options.to_c_args()?;

        let c_options =
            unsafe { gdal_sys::GDALTranslateOptionsNew(c_args.as_mut_ptr(), null_mut()) };
        if c_options.is_null() {
            return Err(GdalError::InvalidArgument(format!(
                "invalid translate options '{options}': {}",
                _last_error_msg()
            )));
        }
        Ok(Self { c_options })
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_options(&self) -> *mut GDALTranslateOptions {
        self.c_options
    }
}

impl Drop for TranslateOptions {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALTranslateOptionsFree(self.c_options);
        }
    }
}

impl TryFrom<&OptionSet> for TranslateOptions {
    type Error = GdalError;

    fn try_from(value: &OptionSet) -> Result<Self> {
        TranslateOptions::new(value)
    }
}

/// Converts raster data between formats, and optionally subsets, resamples
/// and rescales it.
///
/// `source` is only borrowed for the call; the result is a new dataset owned
/// by the caller. An empty option set keeps GDAL's defaults (a GeoTIFF copy).
///
/// Wraps [GDALTranslate]. See the [program docs] for the accepted options.
///
/// [GDALTranslate]: https://gdal.org/api/gdal_utils.html#_CPPv413GDALTranslatePKc12GDALDatasetHPK20GDALTranslateOptionsPi
/// [program docs]: https://gdal.org/programs/gdal_translate.html
pub fn translate<P: AsRef<Path>>(
    destination: P,
    source: &Dataset,
    options: &OptionSet,
) -> Result<Dataset> {
    _translate(destination.as_ref(), source, options)
}

fn _translate(destination: &Path, source: &Dataset, options: &OptionSet) -> Result<Dataset> {
    let translate_err = |msg: String| GdalError::TranslateError {
        dest: destination.display().to_string(),
        msg,
    };

    let c_dest = _path_to_c_string(destination)?;
    let c_options = TranslateOptions::new(options).map_err(|e| translate_err(e.to_string()))?;

    _reset_if_raising();
    let mut usage_error: c_int = 0;
    let c_dataset = unsafe {
        gdal_sys::GDALTranslate(
            c_dest.as_ptr(),
            source.c_dataset(),
            c_options.c_options(),
            &mut usage_error,
        )
    };

    if c_dataset.is_null() {
        return Err(translate_err(_last_error_msg()));
    }
    let result = unsafe { Dataset::from_c_dataset(c_dataset) };
    if usage_error != 0 {
        return Err(translate_err(format!("usage error: {}", _last_error_msg())));
    }
    if let Some(msg) = _pending_failure() {
        return Err(translate_err(msg));
    }

    log::debug!("translated to '{}' with [{options}]", destination.display());
    Ok(result)
}
