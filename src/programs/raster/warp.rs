use std::borrow::Borrow;
use std::ffi::c_int;
use std::path::Path;
use std::ptr::null_mut;

use gdal_sys::{GDALDatasetH, GDALWarpAppOptions};

use crate::errors::*;
use crate::programs::OptionSet;
use crate::utils::{_last_error_msg, _path_to_c_string, _pending_failure, _reset_if_raising};
use crate::Dataset;

/// Wraps a [GDALWarpAppOptions] object, freed on drop.
///
/// [GDALWarpAppOptions]: https://gdal.org/api/gdal_utils.html#_CPPv418GDALWarpAppOptions
pub struct WarpAppOptions {
    c_options: *mut GDALWarpAppOptions,
}

impl WarpAppOptions {
    /// Parse `gdalwarp` switches.
    ///
    /// See [GDALWarpAppOptionsNew] and the [program docs] for accepted switches.
    ///
    /// [GDALWarpAppOptionsNew]: https://gdal.org/api/gdal_utils.html#_CPPv421GDALWarpAppOptionsNewPPcP31GDALWarpAppOptionsForBinary
    /// [program docs]: https://gdal.org/programs/gdalwarp.html
    pub fn new(options: &OptionSet) -> Result<Self> {
        let mut c_args = options.to_c_args()?;

        let c_options = unsafe { gdal_sys::GDALWarpAppOptionsNew(c_args.as_mut_ptr(), null_mut()) };
        if c_options.is_null() {
            return Err(GdalError::InvalidArgument(format!(
                "invalid warp options '{options}': {}",
                _last_error_msg()
            )));
        }
        Ok(Self { c_options })
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_options(&self) -> *mut GDALWarpAppOptions {
        self.c_options
    }
}

impl Drop for WarpAppOptions {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALWarpAppOptionsFree(self.c_options);
        }
    }
}

impl TryFrom<&OptionSet> for WarpAppOptions {
    type Error = GdalError;

    fn try_from(value: &OptionSet) -> Result<Self> {
        WarpAppOptions::new(value)
    }
}

/// Reprojects, resamples or mosaics `source` into a new dataset at
/// `destination`.
///
/// `source` is only borrowed for the call. An empty option set keeps GDAL's
/// defaults (same projection, nearest neighbour, GeoTIFF output).
///
/// Wraps [GDALWarp]. See the [program docs] for the accepted options.
///
/// [GDALWarp]: https://gdal.org/api/gdal_utils.html#_CPPv48GDALWarpPKc12GDALDatasetHiP12GDALDatasetHPK18GDALWarpAppOptionsPi
/// [program docs]: https://gdal.org/programs/gdalwarp.html
pub fn warp<P: AsRef<Path>>(
    destination: P,
    source: &Dataset,
    options: &OptionSet,
) -> Result<Dataset> {
    _warp(destination.as_ref(), &[source], options)
}

/// Like [`warp`], with several sources mosaicked into one destination.
pub fn warp_multiple<P: AsRef<Path>, D: Borrow<Dataset>>(
    destination: P,
    sources: &[D],
    options: &OptionSet,
) -> Result<Dataset> {
    let sources = sources.iter().map(|d| d.borrow()).collect::<Vec<&Dataset>>();
    _warp(destination.as_ref(), &sources, options)
}

fn _warp(destination: &Path, sources: &[&Dataset], options: &OptionSet) -> Result<Dataset> {
    let warp_err = |msg: String| GdalError::WarpError {
        dest: destination.display().to_string(),
        msg,
    };

    if sources.is_empty() {
        return Err(GdalError::InvalidArgument(
            "warp needs at least one source dataset".to_string(),
        ));
    }

    let c_dest = _path_to_c_string(destination)?;
    let c_options = WarpAppOptions::new(options).map_err(|e| warp_err(e.to_string()))?;

    // GDAL only reads the handles; they stay owned by the borrowed datasets
    let mut c_sources: Vec<GDALDatasetH> =
        sources.iter().map(|ds| unsafe { ds.c_dataset() }).collect();

    _reset_if_raising();
    let mut usage_error: c_int = 0;
    let c_dataset = unsafe {
        gdal_sys::GDALWarp(
            c_dest.as_ptr(),
            null_mut(),
            c_sources.len() as c_int,
            c_sources.as_mut_ptr(),
            c_options.c_options(),
            &mut usage_error,
        )
    };

    if c_dataset.is_null() {
        return Err(warp_err(_last_error_msg()));
    }
    let result = unsafe { Dataset::from_c_dataset(c_dataset) };
    if usage_error != 0 {
        return Err(warp_err(format!("usage error: {}", _last_error_msg())));
    }
    if let Some(msg) = _pending_failure() {
        return Err(warp_err(msg));
    }

    log::debug!(
        "warped {} source(s) to '{}' with [{options}]",
        sources.len(),
        destination.display()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster_type::DataType;
    use crate::test_utils::{
        assert_transform_near, fixture_raster, InMemoryFixture, SuppressGDALErrorLog, TempFixture,
        FIXTURE_TRANSFORM,
    };
    use crate::{assert_almost_eq, DatasetOptions, DriverManager, GeoTransform};

    fn source(name: &str, value: u8) -> Result<(TempFixture, Dataset)> {
        let fixture = TempFixture::empty(name);
        fixture_raster(fixture.path(), value)?;
        let ds = Dataset::open_ex(fixture.path(), DatasetOptions::raster().for_update())?;
        Ok((fixture, ds))
    }

    #[test]
    fn test_warp_defaults() -> Result<()> {
        let (_fixture, mut src) = source("warp_src.tif", 3)?;
        let out = InMemoryFixture::new("warp_defaults.tif");

        let result = warp(out.path(), &src, &OptionSet::new())?;
        assert_eq!(result.raster_size(), (20, 10));
        assert_transform_near(&result.geo_transform()?, &FIXTURE_TRANSFORM);
        assert_eq!(result.read_pixel(1, 5, 5)?, 3.0);
        assert_eq!(result.projection(), src.projection());

        src.fill_band(1, 200.0)?;
        drop(src);
        assert_eq!(result.read_pixel(1, 5, 5)?, 3.0);
        Ok(())
    }

    #[test]
    fn test_warp_resample() -> Result<()> {
        let (_fixture, src) = source("warp_resample.tif", 4)?;

        let mut options = OptionSet::new();
        options
            .with_output_format("MEM")
            .with_output_type(DataType::Float32)
            .set("-r", "bilinear")
            .set_values("-tr", ["60", "60"]);

        let result = warp("", &src, &options)?;
        assert_eq!(result.raster_size(), (10, 5));
        let gt = result.geo_transform()?;
        assert_almost_eq(gt.pixel_width, 60.0, 1e-9);
        assert_almost_eq(gt.pixel_height, -60.0, 1e-9);
        assert_eq!(result.read_pixel(1, 1, 1)?, 4.0);
        Ok(())
    }

    #[test]
    fn test_warp_multiple_mosaics() -> Result<()> {
        let (_left_fixture, left) = source("left.tif", 10)?;

        let mut right = DriverManager::get_driver_by_name("MEM")?.create("", 20, 10, 1)?;
        right.set_projection(&left.projection())?;
        right.set_geo_transform(&GeoTransform {
            x_origin: FIXTURE_TRANSFORM.x_origin + 20.0 * FIXTURE_TRANSFORM.pixel_width,
            ..FIXTURE_TRANSFORM
        })?;
        right.fill_band(1, 20.0)?;

        let options = OptionSet::from(&[("-of", "MEM")]);
        let result = warp_multiple("", &[&left, &right], &options)?;
        assert_eq!(result.raster_size(), (40, 10));
        assert_eq!(result.read_pixel(1, 0, 0)?, 10.0);
        assert_eq!(result.read_pixel(1, 39, 9)?, 20.0);
        Ok(())
    }

    #[test]
    fn test_warp_without_sources() {
        let sources: [&Dataset; 0] = [];
        assert!(matches!(
            warp_multiple("/vsimem/none.tif", &sources, &OptionSet::new()),
            Err(GdalError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_warp_bad_option() -> Result<()> {
        let _nolog = SuppressGDALErrorLog::new();
        let (_fixture, src) = source("warp_bad.tif", 1)?;

        let options = OptionSet::from(&[("-r", "no-such-resampling")]);
        let err = warp("/vsimem/never_warped.tif", &src, &options).unwrap_err();
        assert!(matches!(
            err,
            GdalError::WarpError { ref dest, .. } if dest == "/vsimem/never_warped.tif"
        ));
        Ok(())
    }
}
