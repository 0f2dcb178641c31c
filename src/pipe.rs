//! Connected handle pairs.

use std::sync::{PoisonError, RwLock};

use crate::error::{FileError, Result};
use crate::file::File;
use crate::sys;

// Shared by pipe creation (read side) and by process-forking code (write
// side, outside this layer). Holding the read side while the pair is
// created and flagged close-on-exec narrows the window in which a
// concurrent fork could inherit a half-flagged pair.
static FORK_GUARD: RwLock<()> = RwLock::new(());

/// The process-wide fork guard. Code that forks takes the write side for
/// the duration of the fork; everything here only ever takes the read side.
#[must_use]
pub fn fork_guard() -> &'static RwLock<()> {
    &FORK_GUARD
}

/// Creates a connected pair of files; reads on the first return bytes
/// written to the second.
///
/// Both ends are marked close-on-exec before the fork guard is released. A
/// fork already in flight when the guard was taken can still inherit the
/// pair; that residual race is a known limitation, narrowed rather than
/// solved.
pub fn pipe() -> Result<(File, File)> {
    let guard = FORK_GUARD.read().unwrap_or_else(PoisonError::into_inner);
    let fds = sys::pipe().map_err(|e| FileError::sys("pipe", e))?;
    for fd in fds {
        // fcntl on a fresh descriptor has nothing left to fail on
        let _ = sys::set_cloexec(fd);
    }
    drop(guard);

    Ok((
        File::from_native(fds[0], b"|0", None),
        File::from_native(fds[1], b"|1", None),
    ))
}
