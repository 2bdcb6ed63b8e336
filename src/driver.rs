use std::ffi::{c_int, CString};
use std::path::Path;
use std::sync::Once;

use gdal_sys::{self, GDALDriverH, GDALMajorObjectH};

use crate::cpl::CslStringList;
use crate::dataset::Dataset;
use crate::errors::*;
use crate::metadata::{MajorObject, Metadata};
use crate::raster_type::DataType;
use crate::utils::{_last_error_msg, _last_null_pointer_err, _path_to_c_string, _string};

static START: Once = Once::new();

/// A format plugin registered with GDAL.
///
/// Driver handles belong to GDAL's registry; a `Driver` only borrows one and
/// never releases it.
#[derive(Debug)]
#[allow(missing_copy_implementations)]
pub struct Driver {
    c_driver: GDALDriverH,
}

impl Driver {
    /// Creates a new Driver object by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer
    pub unsafe fn from_c_driver(c_driver: GDALDriverH) -> Driver {
        Driver { c_driver }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_driver(&self) -> GDALDriverH {
        self.c_driver
    }

    pub fn short_name(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetDriverShortName(self.c_driver) };
        _string(rv)
    }

    pub fn long_name(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetDriverLongName(self.c_driver) };
        _string(rv)
    }

    /// Create a new `Byte` raster dataset.
    pub fn create<P: AsRef<Path>>(
        &self,
        filename: P,
        size_x: usize,
        size_y: usize,
        bands: usize,
    ) -> Result<Dataset> {
        self.create_with_band_type(filename, size_x, size_y, bands, DataType::Byte)
    }

    pub fn create_with_band_type<P: AsRef<Path>>(
        &self,
        filename: P,
        size_x: usize,
        size_y: usize,
        bands: usize,
        band_type: DataType,
    ) -> Result<Dataset> {
        let options = CslStringList::new();
        self.create_with_options(filename, size_x, size_y, bands, band_type, &options)
    }

    /// Create a new raster dataset with driver-specific creation options
    /// (`KEY=VALUE`, e.g. `COMPRESS=LZW` for GTiff).
    pub fn create_with_options<P: AsRef<Path>>(
        &self,
        filename: P,
        size_x: usize,
        size_y: usize,
        bands: usize,
        band_type: DataType,
        options: &CslStringList,
    ) -> Result<Dataset> {
        let c_filename = _path_to_c_string(filename.as_ref())?;
        let c_dataset = unsafe {
            gdal_sys::GDALCreate(
                self.c_driver,
                c_filename.as_ptr(),
                size_x as c_int,
                size_y as c_int,
                bands as c_int,
                band_type.gdal_ordinal(),
                options.as_ptr(),
            )
        };

        if c_dataset.is_null() {
            return Err(_last_null_pointer_err("GDALCreate"));
        };

        Ok(unsafe { Dataset::from_c_dataset(c_dataset) })
    }
}

impl MajorObject for Driver {
    unsafe fn gdal_object_ptr(&self) -> GDALMajorObjectH {
        self.c_driver
    }
}

impl Metadata for Driver {}

/// Lookup and registration of GDAL drivers.
pub struct DriverManager;

impl DriverManager {
    /// Register all known drivers, once per process.
    pub fn register_all_once() {
        START.call_once(|| unsafe {
            gdal_sys::GDALAllRegister();
        });
    }

    /// Register all known drivers, again if need be.
    pub fn register_all() {
        unsafe { gdal_sys::GDALAllRegister() };
    }

    /// Number of registered drivers.
    pub fn count() -> usize {
        Self::register_all_once();
        (unsafe { gdal_sys::GDALGetDriverCount() }) as usize
    }

    /// Fetch the driver at `index` in the registry.
    pub fn get_driver(index: usize) -> Result<Driver> {
        Self::register_all_once();
        let c_driver = unsafe { gdal_sys::GDALGetDriver(index as c_int) };
        if c_driver.is_null() {
            return Err(_last_null_pointer_err("GDALGetDriver"));
        }
        Ok(Driver { c_driver })
    }

    /// Look a driver up by its short name, e.g. `"GTiff"`.
    pub fn get_driver_by_name(name: &str) -> Result<Driver> {
        Self::register_all_once();
        let c_name = CString::new(name)?;
        let c_driver = unsafe { gdal_sys::GDALGetDriverByName(c_name.as_ptr()) };
        if c_driver.is_null() {
            // GDALGetDriverByName does not raise a CPL error, but clear any stale one
            let _ = _last_error_msg();
            return Err(GdalError::DriverNotFound {
                name: name.to_string(),
            });
        };
        Ok(Driver { c_driver })
    }

    /// The descriptive identifier of the driver registered as `name`.
    ///
    /// Never returns an empty string: a driver without a description is
    /// reported as [`GdalError::DriverNotFound`].
    pub fn driver_description(name: &str) -> Result<String> {
        let description = Self::get_driver_by_name(name)?.description();
        if description.is_empty() {
            return Err(GdalError::DriverNotFound {
                name: name.to_string(),
            });
        }
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpl::CslStringList;
    use crate::test_utils::TempFixture;

    #[test]
    fn test_get_driver_by_name() -> Result<()> {
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        assert_eq!(driver.short_name(), "GTiff");
        assert_eq!(driver.long_name(), "GeoTIFF");
        assert_eq!(
            driver.metadata_item("DCAP_RASTER", "")?,
            Some("YES".to_string())
        );
        Ok(())
    }

    #[test]
    fn test_driver_description_is_stable() -> Result<()> {
        let first = DriverManager::driver_description("GTiff")?;
        assert_eq!(first, "GTiff");
        for _ in 0..10 {
            assert_eq!(DriverManager::driver_description("GTiff")?, first);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_driver() {
        for _ in 0..3 {
            assert_eq!(
                DriverManager::driver_description("NoSuchFormat").unwrap_err(),
                GdalError::DriverNotFound {
                    name: "NoSuchFormat".to_string()
                }
            );
        }
        assert!(matches!(
            DriverManager::get_driver_by_name(""),
            Err(GdalError::DriverNotFound { .. })
        ));
    }

    #[test]
    fn test_registry_enumeration() -> Result<()> {
        assert!(DriverManager::count() > 0);
        let before = DriverManager::count();
        DriverManager::register_all();
        assert_eq!(DriverManager::count(), before);
        let first = DriverManager::get_driver(0)?;
        assert!(!first.short_name().is_empty());
        assert!(DriverManager::get_driver(DriverManager::count() + 10).is_err());
        Ok(())
    }

    #[test]
    fn test_create_with_options() -> Result<()> {
        let fixture = TempFixture::empty("created.tif");
        let driver = DriverManager::get_driver_by_name("GTiff")?;
        let options = CslStringList::try_from(&[("COMPRESS", "LZW")][..])?;

        let ds = driver.create_with_options(
            fixture.path(),
            8,
            6,
            2,
            DataType::Float32,
            &options,
        )?;
        assert_eq!(ds.raster_size(), (8, 6));
        assert_eq!(ds.raster_count(), 2);
        ds.close()?;

        let ds = Dataset::open(fixture.path())?;
        assert_eq!(
            ds.metadata_item("COMPRESSION", "IMAGE_STRUCTURE")?,
            Some("LZW".to_string())
        );
        Ok(())
    }
}
