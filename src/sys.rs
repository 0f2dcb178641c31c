//! Thin wrappers over the native primitives, one function per call.
//! Failure is translated into `io::Error` right here; callers attach the
//! operation name and path.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use libc::{DIR, c_char, c_int, mode_t};
use std::ffi::CStr;
use std::io;
use std::mem::MaybeUninit;

#[cfg(target_os = "linux")]
use libc::readdir64 as native_readdir;
#[cfg(not(target_os = "linux"))]
use libc::readdir as native_readdir;

///converts a byte slice into a null terminated c string pointer
///bounded by `PATH_MAX`, done as a callback so the backing array outlives the pointer
pub(crate) trait BytesToCstrPointer {
    fn as_cstr_ptr<F, R>(&self, f: F) -> io::Result<R>
    where
        F: FnOnce(*const c_char) -> R;
}

impl BytesToCstrPointer for [u8] {
    #[inline]
    fn as_cstr_ptr<F, R>(&self, f: F) -> io::Result<R>
    where
        F: FnOnce(*const c_char) -> R,
    {
        const CAP: usize = libc::PATH_MAX as usize;
        if self.len() >= CAP {
            return Err(io::Error::from_raw_os_error(libc::ENAMETOOLONG));
        }
        if self.contains(&0) {
            return Err(io::Error::from_raw_os_error(libc::EINVAL));
        }
        let mut buf = [0u8; CAP];
        buf[..self.len()].copy_from_slice(self);
        // terminator comes from the zero fill
        Ok(f(buf.as_ptr().cast()))
    }
}

#[inline]
pub(crate) fn open(path: &[u8], oflag: c_int, mode: mode_t) -> io::Result<c_int> {
    let fd = path.as_cstr_ptr(|ptr| unsafe { libc::open(ptr, oflag, libc::c_uint::from(mode)) })?;
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

#[inline]
pub(crate) fn close(fd: c_int) -> io::Result<()> {
    if unsafe { libc::close(fd) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[inline]
pub(crate) fn read(fd: c_int, buf: &mut [u8]) -> io::Result<usize> {
    let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

#[inline]
pub(crate) fn write(fd: c_int, buf: &[u8]) -> io::Result<usize> {
    let n = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(n as usize)
}

#[inline]
pub(crate) fn lseek(fd: c_int, offset: i64, whence: c_int) -> io::Result<i64> {
    let off = unsafe { libc::lseek(fd, offset, whence) };
    if off < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(off)
}

#[inline]
pub(crate) fn ftruncate(fd: c_int, size: i64) -> io::Result<()> {
    if unsafe { libc::ftruncate(fd, size) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[inline]
pub(crate) fn pipe() -> io::Result<[c_int; 2]> {
    let mut fds = [0 as c_int; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fds)
}

/// Flags a descriptor so it is not inherited across exec.
#[inline]
pub(crate) fn set_cloexec(fd: c_int) -> io::Result<()> {
    if unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[inline]
pub(crate) fn opendir(path: &[u8]) -> io::Result<*mut DIR> {
    let dir = path.as_cstr_ptr(|ptr| unsafe { libc::opendir(ptr) })?;
    if dir.is_null() {
        return Err(io::Error::last_os_error());
    }
    Ok(dir)
}

#[inline]
pub(crate) fn dirfd(dir: *mut DIR) -> io::Result<c_int> {
    let fd = unsafe { libc::dirfd(dir) };
    if fd < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(fd)
}

#[inline]
pub(crate) fn closedir(dir: *mut DIR) -> io::Result<()> {
    if unsafe { libc::closedir(dir) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// The native find-next primitive. `Ok(None)` is clean end-of-directory
/// (null return with errno untouched); any other errno propagates. The
/// entry name is copied out immediately, the native record's storage is
/// reused by the next call.
pub(crate) fn readdir_next(dir: *mut DIR) -> io::Result<Option<Box<[u8]>>> {
    clear_errno();
    let ent = unsafe { native_readdir(dir) };
    if ent.is_null() {
        let err = io::Error::last_os_error();
        return match err.raw_os_error() {
            Some(0) => Ok(None),
            _ => Err(err),
        };
    }
    // SAFETY: a non-null record from readdir holds a null terminated name
    let name = unsafe { CStr::from_ptr((*ent).d_name.as_ptr()) };
    Ok(Some(name.to_bytes().into()))
}

/// stat relative to an open directory handle, symlinks not followed.
pub(crate) fn fstatat(dirfd: c_int, name: &[u8]) -> io::Result<libc::stat> {
    let mut st = MaybeUninit::<libc::stat>::uninit();
    let ret = name.as_cstr_ptr(|ptr| unsafe {
        libc::fstatat(dirfd, ptr, st.as_mut_ptr(), libc::AT_SYMLINK_NOFOLLOW)
    })?;
    if ret < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: fstatat filled the buffer on success
    Ok(unsafe { st.assume_init() })
}

// readdir signals end-of-stream by leaving errno alone, so it has to be
// zeroed before the call to tell that apart from a real failure.
#[inline]
fn clear_errno() {
    unsafe { *errno_location() = 0 };
}

#[cfg(target_os = "linux")]
#[inline]
fn errno_location() -> *mut c_int {
    unsafe { libc::__errno_location() }
}

#[cfg(any(target_os = "macos", target_os = "ios"))]
#[inline]
fn errno_location() -> *mut c_int {
    unsafe { libc::__error() }
}
