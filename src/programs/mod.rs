//! Rust wrappers for the [GDAL Programs](https://gdal.org/programs/index.html)
//! exposed through the `gdal_utils` C API.
//!
//! Every program takes its switches as an [`OptionSet`], exactly as they
//! would be written on the command line.

mod option_set;
pub mod raster;

pub use option_set::OptionSet;
pub use raster::{translate, warp, warp_multiple, TranslateOptions, WarpAppOptions};
