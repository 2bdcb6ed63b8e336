use std::ffi::c_uint;

use bitflags::bitflags;

/// Open options for [`crate::Dataset::open_ex`].
///
/// `open_options` entries are `KEY=VALUE` strings understood by the selected
/// driver, e.g. `"FLATTEN_NESTED_ATTRIBUTES=YES"` for GeoJSON.
#[derive(Debug, Default)]
pub struct DatasetOptions<'a> {
    pub open_flags: GdalOpenFlags,
    pub allowed_drivers: Option<&'a [&'a str]>,
    pub open_options: Option<&'a [&'a str]>,
    pub sibling_files: Option<&'a [&'a str]>,
}

impl<'a> DatasetOptions<'a> {
    /// Read-only access restricted to raster drivers.
    pub fn raster() -> Self {
        Self {
            open_flags: GdalOpenFlags::GDAL_OF_RASTER,
            ..Default::default()
        }
    }

    /// Read-only access restricted to vector drivers.
    pub fn vector() -> Self {
        Self {
            open_flags: GdalOpenFlags::GDAL_OF_VECTOR,
            ..Default::default()
        }
    }

    /// Adds update access to the current flags.
    pub fn for_update(mut self) -> Self {
        self.open_flags |= GdalOpenFlags::GDAL_OF_UPDATE;
        self
    }
}

// These are skipped by bindgen and manually updated.
bitflags! {
    /// GDAL extended open flags, the `nOpenFlags` argument of [`GDALOpenEx`].
    ///
    /// `GDAL_OF_SHARED` is deliberately absent: a shared handle could be
    /// closed through one [`crate::Dataset`] while another still uses it.
    ///
    /// [`GDALOpenEx`]: https://gdal.org/api/raster_c_api.html#_CPPv410GDALOpenExPKcjPPCKcPPCKcPPCKc
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GdalOpenFlags: c_uint {
        /// Open in read-only mode (default).
        const GDAL_OF_READONLY = 0x00;
        /// Open in update mode.
        const GDAL_OF_UPDATE = 0x01;
        /// Allow raster and vector drivers to be used.
        const GDAL_OF_ALL = 0x00;
        /// Allow raster drivers to be used.
        const GDAL_OF_RASTER = 0x02;
        /// Allow vector drivers to be used.
        const GDAL_OF_VECTOR = 0x04;
        /// Emit error message in case of failed open.
        const GDAL_OF_VERBOSE_ERROR = 0x40;
    }
}

impl Default for GdalOpenFlags {
    fn default() -> GdalOpenFlags {
        GdalOpenFlags::GDAL_OF_READONLY
    }
}
