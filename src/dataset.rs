use std::ffi::{c_int, CString};
use std::path::Path;
use std::ptr;

use gdal_sys::{self, CPLErr, GDALDatasetH, GDALMajorObjectH};

use crate::cpl::CStringArray;
use crate::driver::{Driver, DriverManager};
use crate::errors::*;
use crate::geo_transform::GeoTransform;
use crate::metadata::{MajorObject, Metadata};
use crate::options::DatasetOptions;
use crate::options::GdalOpenFlags;
use crate::utils::{
    _last_cpl_err, _last_error_msg, _path_to_c_string, _pending_failure, _reset_if_raising,
    _string,
};

/// An open GDAL dataset, raster or vector.
///
/// The handle is owned exclusively and released exactly once, either when the
/// value is dropped or by [`Dataset::close`].
#[derive(Debug)]
pub struct Dataset {
    c_dataset: GDALDatasetH,
}

// GDAL Docs state: The returned dataset should only be accessed by one thread at a time.
// See: https://gdal.org/api/raster_c_api.html#_CPPv48GDALOpenPKc10GDALAccess
// Additionally, VRT Datasets are not safe before GDAL 2.3.
#[cfg(any(all(major_is_2, minor_ge_3), major_ge_3))]
unsafe impl Send for Dataset {}

impl Dataset {
    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_dataset(&self) -> GDALDatasetH {
        self.c_dataset
    }

    /// Creates a new Dataset by wrapping a C pointer, taking ownership of it.
    ///
    /// # Safety
    /// `c_dataset` must be a valid, non-null handle not owned by anything else.
    pub unsafe fn from_c_dataset(c_dataset: GDALDatasetH) -> Dataset {
        Dataset { c_dataset }
    }

    /// Open a dataset read-only with any registered driver.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        Self::_open_ex(path.as_ref(), DatasetOptions::default())
    }

    /// Open a dataset with extended options (update access, driver
    /// restrictions, driver open options, sibling file list).
    pub fn open_ex<P: AsRef<Path>>(path: P, options: DatasetOptions) -> Result<Dataset> {
        Self::_open_ex(path.as_ref(), options)
    }

    fn _open_ex(path: &Path, options: DatasetOptions) -> Result<Dataset> {
        if path.as_os_str().is_empty() {
            return Err(GdalError::InvalidArgument(
                "dataset path must not be empty".to_string(),
            ));
        }
        DriverManager::register_all_once();

        let c_filename = _path_to_c_string(path)?;

        // The arrays must outlive the GDALOpenEx call.
        let c_allowed_drivers = options
            .allowed_drivers
            .map(|d| CStringArray::new(d.iter().copied()))
            .transpose()?;
        let c_open_options = options
            .open_options
            .map(|d| CStringArray::new(d.iter().copied()))
            .transpose()?;
        let c_sibling_files = options
            .sibling_files
            .map(|d| CStringArray::new(d.iter().copied()))
            .transpose()?;

        let as_ptr = |a: &Option<CStringArray>| a.as_ref().map_or(ptr::null(), |a| a.as_ptr());

        _reset_if_raising();
        let c_dataset = unsafe {
            gdal_sys::GDALOpenEx(
                c_filename.as_ptr(),
                (options.open_flags | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR).bits(),
                as_ptr(&c_allowed_drivers),
                as_ptr(&c_open_options),
                as_ptr(&c_sibling_files),
            )
        };
        if c_dataset.is_null() {
            return Err(GdalError::OpenError {
                path: path.display().to_string(),
                msg: _last_error_msg(),
            });
        }
        let dataset = Dataset { c_dataset };
        if let Some(msg) = _pending_failure() {
            return Err(GdalError::OpenError {
                path: path.display().to_string(),
                msg,
            });
        }

        log::debug!("opened dataset '{}'", path.display());
        Ok(dataset)
    }

    /// Flush and release the handle, reporting errors GDAL raises while doing so.
    ///
    /// Consumes the dataset, so the handle cannot be used afterwards.
    pub fn close(mut self) -> Result<()> {
        // leave a null tombstone behind so `Drop` does nothing
        let c_dataset = std::mem::replace(&mut self.c_dataset, ptr::null_mut());

        #[cfg(any(all(major_is_3, minor_ge_7), major_ge_4))]
        {
            let rv = unsafe { gdal_sys::GDALClose(c_dataset) };
            if rv != CPLErr::CE_None {
                return Err(_last_cpl_err(rv));
            }
        }
        #[cfg(not(any(all(major_is_3, minor_ge_7), major_ge_4)))]
        {
            unsafe { gdal_sys::GDALClose(c_dataset) };
        }

        Ok(())
    }

    /// The driver that opened or created this dataset.
    pub fn driver(&self) -> Driver {
        unsafe {
            let c_driver = gdal_sys::GDALGetDatasetDriver(self.c_dataset);
            Driver::from_c_driver(c_driver)
        }
    }

    pub fn raster_count(&self) -> usize {
        (unsafe { gdal_sys::GDALGetRasterCount(self.c_dataset) }) as usize
    }

    /// Raster size as `(columns, rows)`; `(0, 0)` for vector-only datasets.
    pub fn raster_size(&self) -> (usize, usize) {
        let size_x = unsafe { gdal_sys::GDALGetRasterXSize(self.c_dataset) } as usize;
        let size_y = unsafe { gdal_sys::GDALGetRasterYSize(self.c_dataset) } as usize;
        (size_x, size_y)
    }

    pub fn layer_count(&self) -> usize {
        (unsafe { gdal_sys::GDALDatasetGetLayerCount(self.c_dataset) }) as usize
    }

    /// Projection definition as WKT, empty if the dataset has none.
    pub fn projection(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetProjectionRef(self.c_dataset) };
        _string(rv)
    }

    pub fn set_projection(&mut self, projection: &str) -> Result<()> {
        let c_projection = CString::new(projection)?;
        let rv = unsafe { gdal_sys::GDALSetProjection(self.c_dataset, c_projection.as_ptr()) };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }

    /// Get affine transformation coefficients.
    pub fn geo_transform(&self) -> Result<GeoTransform> {
        let mut transformation = [0.0; 6];
        let rv =
            unsafe { gdal_sys::GDALGetGeoTransform(self.c_dataset, transformation.as_mut_ptr()) };

        // check if the dataset has a GeoTransform
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(GeoTransform::from(transformation))
    }

    pub fn set_geo_transform(&mut self, transformation: &GeoTransform) -> Result<()> {
        let mut coefficients = transformation.to_array();
        let rv =
            unsafe { gdal_sys::GDALSetGeoTransform(self.c_dataset, coefficients.as_mut_ptr()) };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }

    fn _band(&self, band_index: usize) -> Result<gdal_sys::GDALRasterBandH> {
        let count = self.raster_count();
        if band_index == 0 || band_index > count {
            return Err(GdalError::InvalidArgument(format!(
                "band {band_index} out of range 1..={count}"
            )));
        }
        // raster_count came from a c_int, so the index fits
        Ok(unsafe { gdal_sys::GDALGetRasterBand(self.c_dataset, band_index as c_int) })
    }

    /// Fill every pixel of band `band_index` (1-based) with `value`.
    pub fn fill_band(&mut self, band_index: usize, value: f64) -> Result<()> {
        let c_band = self._band(band_index)?;
        let rv = unsafe { gdal_sys::GDALFillRaster(c_band, value, 0.0) };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }

    /// Read pixel `(x, y)` of band `band_index` (1-based) as `f64`.
    pub fn read_pixel(&self, band_index: usize, x: usize, y: usize) -> Result<f64> {
        let c_band = self._band(band_index)?;
        let to_c_int = |v: usize| {
            c_int::try_from(v).map_err(|_| {
                GdalError::InvalidArgument(format!("pixel offset {v} does not fit a C int"))
            })
        };
        let (c_x, c_y) = (to_c_int(x)?, to_c_int(y)?);

        let mut value = 0.0_f64;
        let rv = unsafe {
            gdal_sys::GDALRasterIO(
                c_band,
                gdal_sys::GDALRWFlag::GF_Read,
                c_x,
                c_y,
                1,
                1,
                &mut value as *mut f64 as *mut std::ffi::c_void,
                1,
                1,
                gdal_sys::GDALDataType::GDT_Float64,
                0,
                0,
            )
        };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(value)
    }
}

impl MajorObject for Dataset {
    unsafe fn gdal_object_ptr(&self) -> GDALMajorObjectH {
        self.c_dataset
    }
}

impl Metadata for Dataset {}

impl Drop for Dataset {
    fn drop(&mut self) {
        if self.c_dataset.is_null() {
            return;
        }
        unsafe {
            gdal_sys::GDALClose(self.c_dataset);
        }
    }
}
