//! The file object: one move-only type over the native handle, composing
//! the open dispatcher, close, sequential and emulated positional I/O, and
//! directory enumeration.
#![allow(clippy::cast_sign_loss)] //lseek offsets and positive batch counts are non-negative

use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use libc::{c_int, mode_t};

use crate::dir::{DirState, Fetch};
use crate::entry::DirEntry;
use crate::error::{FileError, Result};
use crate::flags::{OpenFlags, Whence};
use crate::handle::Handle;
use crate::sys;

/// An open file or directory.
///
/// A `File` is minted only by [`open`] or [`pipe`](crate::pipe). It is
/// move-only and releases its native handle exactly once, through
/// [`close`](File::close) or, as a last resort bounding leaks, when dropped
/// still open. Exactly one operation set is legal per instance: byte I/O
/// for regular files, [`read_entries`](File::read_entries) for directories;
/// the other set reports a kind-mismatch error.
///
/// All byte operations on one instance serialize on a single internal lock,
/// so positional and sequential access never interleave. Two different
/// instances never contend.
pub struct File {
    handle: Handle,
    name: Box<[u8]>, //path it was opened with, diagnostics only
    dir: Option<Mutex<DirState>>,
    broken_pipe_writes: AtomicU32,
    io_lock: Mutex<()>,
}

/// Opens `path`, dispatching between the directory and regular-file
/// operation sets of the native API.
///
/// The directory probe runs first. When it succeeds but `flags` requested
/// write access, the fresh enumeration handle is closed again and the error
/// is "is a directory", never a generic open failure; directories are not
/// write-openable. When the probe fails for any reason, the regular open
/// runs with the given flags and mode.
pub fn open<P: AsRef<Path>>(path: P, flags: OpenFlags, mode: mode_t) -> Result<File> {
    let name = path.as_ref().as_os_str().as_bytes();
    match open_dir(name) {
        Ok(mut file) => {
            if flags.is_writable() {
                // the probe handle must not leak
                let _ = file.close();
                return Err(FileError::IsDirectory(name.into()));
            }
            Ok(file)
        }
        Err(_) => open_regular(name, flags, mode),
    }
}

fn open_dir(name: &[u8]) -> Result<File> {
    let dir = sys::opendir(name).map_err(|e| FileError::path("open", name, e))?;
    let fd = match sys::dirfd(dir) {
        Ok(fd) => fd,
        Err(e) => {
            let _ = sys::closedir(dir);
            return Err(FileError::path("open", name, e));
        }
    };
    Ok(File::from_native(fd, name, Some(DirState::new(dir))))
}

fn open_regular(name: &[u8], flags: OpenFlags, mode: mode_t) -> Result<File> {
    let fd =
        sys::open(name, flags.to_native(), mode).map_err(|e| FileError::path("open", name, e))?;
    Ok(File::from_native(fd, name, None))
}

/// Changes the size of the named file, creating it when absent. Composed
/// from open, [`File::truncate`] and close; there is no separate native
/// call behind it.
pub fn truncate<P: AsRef<Path>>(path: P, size: i64) -> Result<()> {
    let mut file = open(path, OpenFlags::WRITE | OpenFlags::CREATE, 0o666)?;
    let truncated = file.truncate(size);
    let closed = file.close();
    truncated.and(closed)
}

impl File {
    pub(crate) fn from_native(fd: c_int, name: &[u8], dir: Option<DirState>) -> Self {
        Self {
            handle: Handle(fd),
            name: name.into(),
            dir: dir.map(Mutex::new),
            broken_pipe_writes: AtomicU32::new(0),
            io_lock: Mutex::new(()),
        }
    }

    ///the path this file was opened with
    #[inline]
    #[must_use]
    pub fn name(&self) -> &OsStr {
        OsStr::from_bytes(&self.name)
    }

    ///the underlying native handle, sentinel-invalid after close
    #[inline]
    #[must_use]
    pub const fn handle(&self) -> Handle {
        self.handle
    }

    #[inline]
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.dir.is_some()
    }

    /// Consecutive broken-pipe write failures on this file. Diagnostic
    /// backpressure signal for layers above; nothing here acts on it.
    #[inline]
    #[must_use]
    pub fn broken_pipe_writes(&self) -> u32 {
        self.broken_pipe_writes.load(Ordering::Relaxed)
    }

    // a panicked lock holder cannot leave the handle itself in a bad
    // state, so a poisoned lock stays usable
    fn io_guard(&self) -> MutexGuard<'_, ()> {
        self.io_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_open(&self) -> Result<()> {
        if self.handle.is_valid() {
            Ok(())
        } else {
            Err(FileError::Closed)
        }
    }

    fn check_regular(&self) -> Result<()> {
        self.check_open()?;
        if self.dir.is_some() {
            return Err(FileError::IsDirectory(self.name.clone()));
        }
        Ok(())
    }

    /// Releases the native handle: the enumeration-close primitive for
    /// directories, the generic close otherwise. A second call reports
    /// [`FileError::Closed`] and performs no native operation.
    ///
    /// The sentinel is set even when the native close fails. The kernel may
    /// already have invalidated the slot, so a failed close still consumes
    /// the handle and is never retried.
    pub fn close(&mut self) -> Result<()> {
        if !self.handle.is_valid() {
            return Err(FileError::Closed);
        }
        self.release_native()
            .map_err(|e| FileError::path("close", &self.name, e))
    }

    // shared by close and the drop safety net, sets the sentinel
    // unconditionally so the handle is released at most once
    fn release_native(&mut self) -> io::Result<()> {
        let result = match self.dir.as_mut() {
            Some(state) => state
                .get_mut()
                .unwrap_or_else(PoisonError::into_inner)
                .release(),
            None => sys::close(self.handle.raw()),
        };
        self.handle = Handle::INVALID;
        result
    }

    /// Sequential read at the handle's implicit cursor. A zero count on a
    /// non-empty buffer is end-of-stream, not an error.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.check_regular()?;
        let _io = self.io_guard();
        sys::read(self.handle.raw(), buf).map_err(|e| FileError::path("read", &self.name, e))
    }

    /// Sequential write at the handle's implicit cursor.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        self.check_regular()?;
        let _io = self.io_guard();
        match sys::write(self.handle.raw(), buf) {
            Ok(n) => {
                self.broken_pipe_writes.store(0, Ordering::Relaxed);
                Ok(n)
            }
            Err(e) => {
                if e.raw_os_error() == Some(libc::EPIPE) {
                    let streak = self.broken_pipe_writes.fetch_add(1, Ordering::Relaxed) + 1;
                    log::debug!(
                        "write {}: broken pipe (streak {streak})",
                        String::from_utf8_lossy(&self.name)
                    );
                } else {
                    self.broken_pipe_writes.store(0, Ordering::Relaxed);
                }
                Err(FileError::path("write", &self.name, e))
            }
        }
    }

    /// Repositions the implicit sequential cursor, returning the new
    /// absolute offset.
    pub fn seek(&self, offset: i64, whence: Whence) -> Result<u64> {
        self.check_regular()?;
        let _io = self.io_guard();
        sys::lseek(self.handle.raw(), offset, whence.to_native())
            .map(|off| off as u64)
            .map_err(|e| FileError::path("seek", &self.name, e))
    }

    /// Reads at an absolute offset without disturbing the sequential
    /// cursor. A zero count with no error is end-of-stream at that offset.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        self.positional("read_at", offset, |fd| sys::read(fd, buf))
    }

    /// Writes at an absolute offset without disturbing the sequential
    /// cursor.
    pub fn write_at(&self, buf: &[u8], offset: u64) -> Result<usize> {
        self.positional("write_at", offset, |fd| sys::write(fd, buf))
    }

    // The native API has no atomic positional primitive, so absolute-offset
    // access is emulated: record the cursor, seek to the offset, transfer,
    // put the cursor back. Holding the same lock as sequential I/O is what
    // makes the emulation safe; the restore runs even when the transfer
    // failed, so a later sequential call never observes a corrupted cursor.
    fn positional<F>(&self, op: &'static str, offset: u64, transfer: F) -> Result<usize>
    where
        F: FnOnce(c_int) -> io::Result<usize>,
    {
        self.check_regular()?;
        let Ok(offset) = i64::try_from(offset) else {
            return Err(FileError::path(
                op,
                &self.name,
                io::Error::from_raw_os_error(libc::EINVAL),
            ));
        };
        let _io = self.io_guard();
        let fd = self.handle.raw();
        let recorded =
            sys::lseek(fd, 0, libc::SEEK_CUR).map_err(|e| FileError::path(op, &self.name, e))?;
        let result = sys::lseek(fd, offset, libc::SEEK_SET).and_then(|_| transfer(fd));
        let _ = sys::lseek(fd, recorded, libc::SEEK_SET);
        result.map_err(|e| FileError::path(op, &self.name, e))
    }

    /// Truncates or extends the open file to `size` bytes.
    pub fn truncate(&self, size: i64) -> Result<()> {
        self.check_regular()?;
        let _io = self.io_guard();
        sys::ftruncate(self.handle.raw(), size)
            .map_err(|e| FileError::path("truncate", &self.name, e))
    }

    /// Reads directory entries, continuing from wherever the previous call
    /// stopped; the cursor is per file, not per call.
    ///
    /// With `n > 0` at most `n` entries come back, and an empty batch is
    /// always paired with an error saying why; end of the directory is the
    /// designated [`FileError::EndOfEntries`]. A short but non-empty batch
    /// with no error is legal, the end was reached exactly.
    ///
    /// With `n <= 0` the remaining entries are drained in one call; clean
    /// return means the end was reached, and an error mid-drain still
    /// yields everything accumulated so far alongside it.
    ///
    /// `.` and `..` never appear and never count toward `n`. Order is
    /// whatever the native iterator yields.
    pub fn read_entries(&self, n: isize) -> (Vec<DirEntry>, Option<FileError>) {
        if !self.handle.is_valid() {
            return (Vec::new(), Some(FileError::Closed));
        }
        let Some(state) = &self.dir else {
            return (Vec::new(), Some(FileError::NotDirectory(self.name.clone())));
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);

        let want_all = n <= 0;
        let mut left = if want_all { usize::MAX } else { n as usize };
        let mut entries = Vec::with_capacity(left.min(64));
        while left > 0 {
            if !state.holding() {
                match state.fetch() {
                    Ok(Fetch::Entry) => {}
                    Ok(Fetch::End) => break,
                    Err(e) => {
                        let err = FileError::path("readdir", &self.name, e);
                        // a failed bounded batch is discarded whole
                        return if want_all {
                            (entries, Some(err))
                        } else {
                            (Vec::new(), Some(err))
                        };
                    }
                }
            }
            let Some(raw) = state.take() else { break };
            if raw.is_dot() {
                continue;
            }
            match sys::fstatat(self.handle.raw(), &raw.name) {
                Ok(st) => {
                    entries.push(DirEntry::from_stat(raw.name, &st));
                    left -= 1;
                }
                // unlinked between find-next and stat, the entry is gone
                Err(e) if e.raw_os_error() == Some(libc::ENOENT) => {}
                Err(e) => {
                    let err = FileError::path("stat", &self.name, e);
                    return if want_all {
                        (entries, Some(err))
                    } else {
                        (Vec::new(), Some(err))
                    };
                }
            }
        }
        if !want_all && entries.is_empty() {
            return (entries, Some(FileError::EndOfEntries));
        }
        (entries, None)
    }
}

impl Drop for File {
    /// Safety net only: bounds handle leaks when a `File` is dropped still
    /// open. Deterministic release is [`File::close`], which sets the
    /// sentinel and makes this a no-op.
    fn drop(&mut self) {
        if !self.handle.is_valid() {
            return;
        }
        log::warn!(
            "file dropped without close: {}",
            String::from_utf8_lossy(&self.name)
        );
        let _ = self.release_native();
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File")
            .field("handle", &self.handle)
            .field("name", &self.name())
            .field("directory", &self.is_directory())
            .finish_non_exhaustive()
    }
}
