use std::ffi::CString;
use std::ptr;

use gdal_sys::GDALMajorObjectH;

use crate::errors::Result;
use crate::utils::_string;

/// Anything GDAL models as a `GDALMajorObject` (datasets, drivers, bands).
pub trait MajorObject {
    /// # Safety
    /// Returns the raw handle; it must not outlive `self`.
    unsafe fn gdal_object_ptr(&self) -> GDALMajorObjectH;
}

pub trait Metadata: MajorObject {
    /// The object's description: the short name for a driver, the path for
    /// a dataset.
    fn description(&self) -> String {
        let c_res = unsafe { gdal_sys::GDALGetDescription(self.gdal_object_ptr()) };
        _string(c_res)
    }

    /// Fetch a single metadata item, `None` when it is not set.
    ///
    /// An empty `domain` selects the default domain.
    fn metadata_item(&self, key: &str, domain: &str) -> Result<Option<String>> {
        let c_key = CString::new(key)?;
        let c_domain = CString::new(domain)?;
        let c_domain_ptr = if domain.is_empty() {
            ptr::null()
        } else {
            c_domain.as_ptr()
        };

        let c_res = unsafe {
            gdal_sys::GDALGetMetadataItem(self.gdal_object_ptr(), c_key.as_ptr(), c_domain_ptr)
        };
        if c_res.is_null() {
            Ok(None)
        } else {
            Ok(Some(_string(c_res)))
        }
    }
}
