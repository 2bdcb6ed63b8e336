//! In-memory virtual files (`/vsimem/`)
//!
//! GDAL's virtual file system registry is process-wide. Every registration
//! made here is paired with something that releases it: [`MemFileDataset`]
//! unlinks its file after closing the dataset, [`MemFileRef`] unlinks before
//! the borrowed bytes go away.

use std::ffi::c_void;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::path::{Path, PathBuf};

use gdal_sys::{VSIFCloseL, VSIFileFromMemBuffer, VSIFree, VSIGetMemFileBuffer, VSIUnlink};

use crate::dataset::Dataset;
use crate::errors::{GdalError, Result};
use crate::utils::{_last_error_msg, _last_null_pointer_err, _path_to_c_string};

/// Whether `file_name` exists in GDAL's virtual file system.
pub fn mem_file_exists<P: AsRef<Path>>(file_name: P) -> Result<bool> {
    let file_name = _path_to_c_string(file_name.as_ref())?;
    let mut stat = MaybeUninit::<gdal_sys::VSIStatBufL>::uninit();
    let rv = unsafe { gdal_sys::VSIStatL(file_name.as_ptr(), stat.as_mut_ptr()) };
    Ok(rv == 0)
}

/// Creates a new VSIMemFile holding a copy of `data`.
///
/// The copy is allocated by GDAL and owned by the registration, so `data`
/// may be dropped right away. An existing file of the same name is replaced.
pub fn create_mem_file<P: AsRef<Path>>(file_name: P, data: &[u8]) -> Result<()> {
    _create_mem_file(file_name.as_ref(), data)
}

fn _create_mem_file(file_name: &Path, data: &[u8]) -> Result<()> {
    let file_name = _path_to_c_string(file_name)?;

    // GDAL frees the buffer with VSIFree, so it must come from VSIMalloc.
    let buffer = unsafe { gdal_sys::VSIMalloc(data.len().max(1)) } as *mut u8;
    if buffer.is_null() {
        return Err(_last_null_pointer_err("VSIMalloc"));
    }
    unsafe { std::ptr::copy_nonoverlapping(data.as_ptr(), buffer, data.len()) };

    let handle = unsafe {
        VSIFileFromMemBuffer(
            file_name.as_ptr(),
            buffer,
            data.len() as u64,
            true as i32,
        )
    };

    if handle.is_null() {
        // ownership was not taken
        unsafe { VSIFree(buffer.cast::<c_void>()) };
        return Err(_last_null_pointer_err("VSIFileFromMemBuffer"));
    }

    unsafe {
        VSIFCloseL(handle);
    }

    Ok(())
}

/// Unlinks a mem file that points to borrowed data before that data is freed.
pub struct MemFileRef<'d> {
    file_name: PathBuf,
    data_ref: PhantomData<&'d mut ()>,
}

impl<'d> MemFileRef<'d> {
    fn new(file_name: &Path) -> MemFileRef<'d> {
        Self {
            file_name: file_name.into(),
            data_ref: PhantomData,
        }
    }

    pub fn file_name(&self) -> &Path {
        &self.file_name
    }
}

impl Drop for MemFileRef<'_> {
    fn drop(&mut self) {
        // ignore failures: the file may have been unlinked manually
        let _ = unlink_mem_file(&self.file_name);
    }
}

/// Creates a new VSIMemFile that reads `data` in place, without copying.
///
/// The returned guard borrows `data` and unlinks the file when dropped.
pub fn create_mem_file_from_ref<P: AsRef<Path>>(
    file_name: P,
    data: &mut [u8],
) -> Result<MemFileRef<'_>> {
    _create_mem_file_from_ref(file_name.as_ref(), data)
}

fn _create_mem_file_from_ref<'d>(file_name: &Path, data: &'d mut [u8]) -> Result<MemFileRef<'d>> {
    let file_name_c = _path_to_c_string(file_name)?;

    let handle = unsafe {
        VSIFileFromMemBuffer(
            file_name_c.as_ptr(),
            data.as_mut_ptr(),
            data.len() as u64,
            false as i32,
        )
    };

    if handle.is_null() {
        return Err(_last_null_pointer_err("VSIFileFromMemBuffer"));
    }

    unsafe {
        VSIFCloseL(handle);
    }

    Ok(MemFileRef::new(file_name))
}

/// Unlink a VSIMemFile.
pub fn unlink_mem_file<P: AsRef<Path>>(file_name: P) -> Result<()> {
    _unlink_mem_file(file_name.as_ref())
}

fn _unlink_mem_file(file_name: &Path) -> Result<()> {
    let file_name_c = _path_to_c_string(file_name)?;

    let rv = unsafe { VSIUnlink(file_name_c.as_ptr()) };

    if rv != 0 {
        return Err(GdalError::UnlinkMemFile {
            file_name: file_name.display().to_string(),
        });
    }

    Ok(())
}

/// Copies the bytes of the VSIMemFile with given `file_name`.
/// Takes the ownership and frees the memory of the VSIMemFile.
pub fn get_vsi_mem_file_bytes_owned<P: AsRef<Path>>(file_name: P) -> Result<Vec<u8>> {
    _get_vsi_mem_file_bytes_owned(file_name.as_ref())
}

fn _get_vsi_mem_file_bytes_owned(file_name: &Path) -> Result<Vec<u8>> {
    let file_name = _path_to_c_string(file_name)?;

    let owned_bytes = unsafe {
        let mut length: u64 = 0;
        let bytes = VSIGetMemFileBuffer(file_name.as_ptr(), &mut length, true as i32);

        if bytes.is_null() {
            return Err(_last_null_pointer_err("VSIGetMemFileBuffer"));
        }

        let vec = std::slice::from_raw_parts(bytes, length as usize).to_vec();

        VSIFree(bytes.cast::<c_void>());

        vec
    };

    Ok(owned_bytes)
}

/// Computes a function on the bytes of the in-memory file with given
/// `file_name`, without taking ownership of them.
pub fn call_on_mem_file_bytes<F, R, P: AsRef<Path>>(file_name: P, fun: F) -> Result<R>
where
    F: FnOnce(&[u8]) -> R,
{
    let file_name = _path_to_c_string(file_name.as_ref())?;

    unsafe {
        let mut length: u64 = 0;
        let bytes = VSIGetMemFileBuffer(file_name.as_ptr(), &mut length, false as i32);

        if bytes.is_null() {
            return Err(_last_null_pointer_err("VSIGetMemFileBuffer"));
        }

        let slice = std::slice::from_raw_parts(bytes, length as usize);

        Ok(fun(slice))
    }
}

/// A dataset opened from an in-memory file, together with that file's
/// registration.
///
/// Dropping it closes the dataset first, then unlinks the file.
#[derive(Debug)]
pub struct MemFileDataset {
    // field order matters: `dataset` is dropped before `registration`
    dataset: Dataset,
    registration: Registration,
}

impl MemFileDataset {
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut Dataset {
        &mut self.dataset
    }

    /// The virtual path the bytes are registered under.
    pub fn file_name(&self) -> &Path {
        &self.registration.file_name
    }
}

impl AsRef<Dataset> for MemFileDataset {
    fn as_ref(&self) -> &Dataset {
        &self.dataset
    }
}

#[derive(Debug)]
struct Registration {
    file_name: PathBuf,
}

impl Drop for Registration {
    fn drop(&mut self) {
        if unlink_mem_file(&self.file_name).is_err() {
            log::warn!(
                "in-memory file '{}' was already unlinked",
                self.file_name.display()
            );
        }
    }
}

/// Register `bytes` as the in-memory file `file_name` and open it.
///
/// `file_name` is a `/vsimem/` path. Registering a name that already exists
/// fails with [`GdalError::MemBufferError`] and leaves the existing file
/// untouched. If the bytes cannot be opened as a dataset the registration is
/// removed again before the error is returned.
pub fn file_from_mem_buffer<P: AsRef<Path>>(file_name: P, bytes: &[u8]) -> Result<MemFileDataset> {
    _file_from_mem_buffer(file_name.as_ref(), bytes)
}

fn _file_from_mem_buffer(file_name: &Path, bytes: &[u8]) -> Result<MemFileDataset> {
    let mem_buffer_err = |msg: String| GdalError::MemBufferError {
        file_name: file_name.display().to_string(),
        msg,
    };

    if file_name.as_os_str().is_empty() {
        return Err(GdalError::InvalidArgument(
            "in-memory file name must not be empty".to_string(),
        ));
    }
    if mem_file_exists(file_name)? {
        return Err(mem_buffer_err("a file is already registered under this name".to_string()));
    }

    create_mem_file(file_name, bytes).map_err(|e| mem_buffer_err(e.to_string()))?;
    let registration = Registration {
        file_name: file_name.to_path_buf(),
    };

    match Dataset::open(file_name) {
        Ok(dataset) => {
            log::debug!(
                "opened {} in-memory bytes as '{}'",
                bytes.len(),
                file_name.display()
            );
            Ok(MemFileDataset {
                dataset,
                registration,
            })
        }
        Err(e) => {
            log::warn!(
                "unregistering '{}': bytes could not be opened",
                file_name.display()
            );
            drop(registration);
            let msg = match e {
                GdalError::OpenError { msg, .. } => msg,
                other => other.to_string(),
            };
            // unlinking may leave a CPL error behind
            let _ = _last_error_msg();
            Err(mem_buffer_err(msg))
        }
    }
}
