//! A thin, safe facade over a handful of [GDAL](http://gdal.org/) operations.
//!
//! The crate covers what a raster processing pipeline typically needs from
//! GDAL, and nothing else:
//!
//! * opening datasets from paths ([`Dataset::open`], [`Dataset::open_ex`])
//!   or from bytes already in memory ([`file_from_mem_buffer`]),
//! * converting and resampling with the `gdal_translate` and `gdalwarp`
//!   programs ([`translate`], [`warp`], [`warp_multiple`]), configured with an
//!   ordered [`OptionSet`],
//! * driver lookup ([`DriverManager::get_driver_by_name`]),
//! * geotransform inversion ([`GeoTransform::invert`], [`inv_geo_transform`]),
//! * process-wide configuration and error reporting ([`config`]).
//!
//! Handles are owned by the Rust values that wrap them and released exactly
//! once, when the value is dropped or explicitly closed.
//!
//! ## Use
//!
//! ```no_run
//! use gdal_facade::{translate, Dataset, OptionSet};
//!
//! # fn main() -> gdal_facade::errors::Result<()> {
//! let source = Dataset::open("dem.tif")?;
//!
//! let mut options = OptionSet::new();
//! options
//!     .with_output_format("GTiff")
//!     .set_values("-outsize", ["50%", "50%"]);
//!
//! let half = translate("/vsimem/half.tif", &source, &options)?;
//! println!("{:?}", half.raster_size());
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Every fallible operation returns [`errors::Result`]. GDAL's own messages
//! are carried in the error; they can additionally be forwarded to the `log`
//! crate with [`config::route_errors_to_log`]. See [`config::use_exceptions`]
//! for how warnings and failures raised by GDAL during a successful call are
//! treated.

#![crate_name = "gdal_facade"]
#![crate_type = "lib"]

pub mod config;
pub mod cpl;
mod dataset;
mod driver;
pub mod errors;
mod geo_transform;
mod metadata;
mod options;
pub mod programs;
pub mod raster_type;
mod utils;
pub mod vsi;

pub use config::use_exceptions;
pub use dataset::Dataset;
pub use driver::{Driver, DriverManager};
pub use geo_transform::{inv_geo_transform, GeoTransform};
pub use metadata::{MajorObject, Metadata};
pub use options::{DatasetOptions, GdalOpenFlags};
pub use programs::{translate, warp, warp_multiple, OptionSet};
pub use raster_type::DataType;
pub use vsi::{file_from_mem_buffer, MemFileDataset};

#[cfg(test)]
mod test_utils;

#[cfg(test)]
fn assert_almost_eq(a: f64, b: f64, epsilon: f64) {
    let diff = (b - a).abs();
    assert!(diff < epsilon, "|{a} - {b}| = {diff} is not below {epsilon}");
}
