//! GDAL Common Portability Library string lists
//!
//! GDAL takes options in two flat shapes: `argv`-style arrays for the
//! command-line utilities (`gdal_translate`, `gdalwarp`), and `KEY=VALUE`
//! lists for open and creation options. Both are null-terminated arrays of
//! null-terminated strings; the types here own that memory on the Rust side.

use std::ffi::{c_char, CString};
use std::fmt::{Debug, Formatter};
use std::ptr;

use gdal_sys::{CSLCount, CSLDestroy, CSLFetchNameValue, CSLSetNameValue};

use crate::errors::{GdalError, Result};
use crate::utils::_string;

/// A null-terminated `char **` whose strings are owned by this value.
///
/// The pointer array refers into the heap buffers of the owned [`CString`]s,
/// so it stays valid for as long as the `CStringArray` is alive, including
/// after the value itself is moved.
pub struct CStringArray {
    // `ptrs` points into `strings`; never mutate `strings` after construction.
    strings: Vec<CString>,
    ptrs: Vec<*mut c_char>,
}

impl CStringArray {
    pub fn new<S: Into<Vec<u8>>, I: IntoIterator<Item = S>>(items: I) -> Result<Self> {
        let strings = items
            .into_iter()
            .map(CString::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // These strings don't actually get modified, the C API is just not const-correct
        let ptrs = strings
            .iter()
            .map(|s| s.as_ptr() as *mut c_char)
            .chain(std::iter::once(ptr::null_mut()))
            .collect();

        Ok(Self { strings, ptrs })
    }

    /// Number of strings, not counting the terminating null.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn as_ptr(&self) -> *const *const c_char {
        self.ptrs.as_ptr() as *const *const c_char
    }

    pub fn as_mut_ptr(&mut self) -> *mut *mut c_char {
        self.ptrs.as_mut_ptr()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.strings.iter().map(|s| s.to_str().unwrap_or_default())
    }
}

impl Debug for CStringArray {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.strings.iter()).finish()
    }
}

/// Wraps a [`gdal_sys::CSLConstList`]  (a.k.a. `char **papszStrList`) of
/// `KEY=VALUE` entries, allocated and freed by GDAL.
pub struct CslStringList {
    list_ptr: *mut *mut c_char,
}

impl CslStringList {
    /// Creates an empty GDAL string list.
    pub fn new() -> Self {
        Self {
            list_ptr: ptr::null_mut(),
        }
    }

    /// Assigns `value` to `name`.
    ///
    /// Overwrites duplicate `name`s.
    ///
    /// Returns `Err(GdalError::InvalidArgument)` if `name` has non alphanumeric
    /// characters, or `value` has newline characters.
    pub fn set_name_value(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(GdalError::InvalidArgument(format!(
                "Invalid characters in name: '{name}'"
            )));
        }
        if value.contains(['\n', '\r']) {
            return Err(GdalError::InvalidArgument(format!(
                "Invalid characters in value: '{value}'"
            )));
        }
        let psz_name = CString::new(name)?;
        let psz_value = CString::new(value)?;

        unsafe {
            self.list_ptr = CSLSetNameValue(self.list_ptr, psz_name.as_ptr(), psz_value.as_ptr());
        }

        Ok(())
    }

    /// Looks up the value corresponding to `key`.
    pub fn fetch_name_value(&self, key: &str) -> Result<Option<String>> {
        let key = CString::new(key)?;
        let c_value = unsafe { CSLFetchNameValue(self.as_ptr(), key.as_ptr()) };
        let value = if c_value.is_null() {
            None
        } else {
            Some(_string(c_value))
        };
        Ok(value)
    }

    /// Determine the number of entries in the list.
    pub fn len(&self) -> usize {
        (unsafe { CSLCount(self.as_ptr()) }) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the raw pointer to the underlying data.
    pub fn as_ptr(&self) -> gdal_sys::CSLConstList {
        self.list_ptr
    }
}

impl Drop for CslStringList {
    fn drop(&mut self) {
        unsafe { CSLDestroy(self.list_ptr) }
    }
}

impl Default for CslStringList {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CslStringList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries = (0..self.len())
            .map(|i| _string(unsafe { *self.list_ptr.add(i) }))
            .collect::<Vec<_>>();
        f.debug_list().entries(entries).finish()
    }
}

/// Creates a [`CslStringList`] from a slice of _key_/_value_ tuples.
impl TryFrom<&[(&str, &str)]> for CslStringList {
    type Error = GdalError;

    fn try_from(pairs: &[(&str, &str)]) -> Result<Self> {
        let mut result = Self::default();
        for (k, v) in pairs {
            result.set_name_value(k, v)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Result<CslStringList> {
        let mut l = CslStringList::new();
        l.set_name_value("COMPRESS", "LZW")?;
        l.set_name_value("TILED", "YES")?;
        Ok(l)
    }

    #[test]
    fn string_array_is_null_terminated() -> Result<()> {
        let mut args = CStringArray::new(["-of", "GTiff"])?;
        assert_eq!(args.len(), 2);
        assert_eq!(args.iter().collect::<Vec<_>>(), vec!["-of", "GTiff"]);

        let raw = args.as_mut_ptr();
        unsafe {
            assert_eq!(_string(*raw), "-of");
            assert_eq!(_string(*raw.add(1)), "GTiff");
            assert!((*raw.add(2)).is_null());
        }
        Ok(())
    }

    #[test]
    fn string_array_survives_move() -> Result<()> {
        let args = CStringArray::new(vec!["-r".to_string(), "bilinear".to_string()])?;
        let moved = Box::new(args);
        unsafe {
            assert_eq!(_string(*moved.as_ptr().add(1)), "bilinear");
        }
        Ok(())
    }

    #[test]
    fn empty_string_array() -> Result<()> {
        let args = CStringArray::new(Vec::<String>::new())?;
        assert!(args.is_empty());
        assert!(unsafe { (*args.as_ptr()).is_null() });
        Ok(())
    }

    #[test]
    fn string_array_rejects_nul() {
        assert!(matches!(
            CStringArray::new(["ok", "n\0t ok"]),
            Err(GdalError::FfiNulError(_))
        ));
    }

    #[test]
    fn name_value_list() -> Result<()> {
        let mut l = fixture()?;
        assert_eq!(l.len(), 2);
        assert_eq!(l.fetch_name_value("COMPRESS")?, Some("LZW".to_string()));
        assert_eq!(l.fetch_name_value("BLOCKXSIZE")?, None);

        l.set_name_value("COMPRESS", "DEFLATE")?;
        assert_eq!(l.len(), 2);
        assert_eq!(l.fetch_name_value("COMPRESS")?, Some("DEFLATE".to_string()));
        Ok(())
    }

    #[test]
    fn invalid_keys() -> Result<()> {
        let mut l = fixture()?;
        assert!(l.set_name_value("l==t", "2").is_err());
        assert!(l.set_name_value("", "2").is_err());
        assert!(l.set_name_value("foo", "2\n4\r5").is_err());
        Ok(())
    }

    #[test]
    fn from_pairs() -> Result<()> {
        let l = CslStringList::try_from(&[("A", "1"), ("B", "2")][..])?;
        assert!(!l.is_empty());
        assert!(format!("{l:?}").contains("B=2"));
        Ok(())
    }
}
