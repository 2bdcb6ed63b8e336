use std::ffi::c_void;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::Result;
use crate::vsi::{get_vsi_mem_file_bytes_owned, unlink_mem_file};
use crate::{assert_almost_eq, DriverManager, GeoTransform};

/// North-up 30 m grid in UTM zone 11N.
pub const FIXTURE_TRANSFORM: GeoTransform = GeoTransform {
    x_origin: 440720.0,
    pixel_width: 30.0,
    row_rotation: 0.0,
    y_origin: 3751320.0,
    column_rotation: 0.0,
    pixel_height: -30.0,
};

/// WGS 84 / UTM zone 11N.
pub const FIXTURE_WKT: &str = r#"PROJCS["WGS 84 / UTM zone 11N",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],PARAMETER["latitude_of_origin",0],PARAMETER["central_meridian",-117],PARAMETER["scale_factor",0.9996],PARAMETER["false_easting",500000],PARAMETER["false_northing",0],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AXIS["Easting",EAST],AXIS["Northing",NORTH],AUTHORITY["EPSG","32611"]]"#;

/// A struct that contains a temporary directory and a path to a file in that directory.
pub struct TempFixture {
    _temp_dir: tempfile::TempDir,
    temp_path: PathBuf,
}

impl TempFixture {
    /// Creates a temporary directory and path to a non-existent file with given `name`.
    ///
    /// The directory is removed when the fixture is dropped.
    pub fn empty(name: &str) -> Self {
        let _temp_dir = tempfile::tempdir().unwrap();
        let temp_path = _temp_dir.path().join(name);
        Self {
            _temp_dir,
            temp_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.temp_path
    }
}

impl AsRef<Path> for TempFixture {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}

/// A struct that represents a `/vsimem/` (in-memory) path.
///
/// The file will be deleted when the value is dropped.
pub struct InMemoryFixture {
    path: PathBuf,
}

impl InMemoryFixture {
    pub fn new(filename: &str) -> Self {
        let mut path = PathBuf::from("/vsimem");
        path.push(filename);

        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InMemoryFixture {
    fn drop(&mut self) {
        // tests may already have taken the bytes, which unlinks the file
        let _ = unlink_mem_file(&self.path);
    }
}

/// Scoped value for temporarily suppressing thread-local GDAL log messages.
///
/// Useful for tests that expect GDAL errors and want to keep the output log clean
/// of distracting yet expected error messages.
pub(crate) struct SuppressGDALErrorLog {
    // Make !Sync and !Send, and force use of `new`.
    _private: PhantomData<*mut c_void>,
}

impl SuppressGDALErrorLog {
    pub(crate) fn new() -> Self {
        unsafe { gdal_sys::CPLPushErrorHandler(Some(gdal_sys::CPLQuietErrorHandler)) };
        SuppressGDALErrorLog {
            _private: PhantomData,
        }
    }
}

impl Drop for SuppressGDALErrorLog {
    fn drop(&mut self) {
        unsafe { gdal_sys::CPLPopErrorHandler() };
    }
}

/// Writes a 20x10 single band Byte GeoTIFF to `path`, every pixel set to
/// `value`, georeferenced with [`FIXTURE_TRANSFORM`] and [`FIXTURE_WKT`].
pub fn fixture_raster<P: AsRef<Path>>(path: P, value: u8) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create(path, 20, 10, 1)?;
    ds.set_geo_transform(&FIXTURE_TRANSFORM)?;
    ds.set_projection(FIXTURE_WKT)?;
    ds.fill_band(1, value as f64)?;
    ds.close()
}

/// The encoded bytes of a [`fixture_raster`].
pub fn fixture_raster_bytes(value: u8) -> Result<Vec<u8>> {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let path = format!(
        "/vsimem/fixture_raster_{}_{}.tif",
        std::process::id(),
        COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    fixture_raster(&path, value)?;
    get_vsi_mem_file_bytes_owned(&path)
}

pub fn assert_transform_near(a: &GeoTransform, b: &GeoTransform) {
    for (x, y) in a.to_array().iter().zip(b.to_array()) {
        assert_almost_eq(*x, y, 1e-9);
    }
}
