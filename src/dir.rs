//! The directory cursor: enumeration state owned by a directory
//! [`File`](crate::File), wrapping the native find-next primitive.

use crate::sys;
use libc::DIR;
use std::io;
use std::ptr;

/// One fetched-but-undelivered record, copied out of the enumeration
/// handle's transient storage.
pub(crate) struct RawEntry {
    pub(crate) name: Box<[u8]>,
}

impl RawEntry {
    // dot entries are filtered by the caller and never count toward a batch
    #[inline]
    pub(crate) fn is_dot(&self) -> bool {
        matches!(self.name.as_ref(), [b'.'] | [b'.', b'.'])
    }
}

/// The cursor's two legal states. A record is consumed exactly once:
/// delivering it moves the cursor back to `AwaitingFetch`, so there is no
/// state in which a stale record could be read twice.
enum Cursor {
    AwaitingFetch,
    Holding(RawEntry),
}

/// Outcome of advancing the cursor.
pub(crate) enum Fetch {
    Entry,
    End,
}

pub(crate) struct DirState {
    dir: *mut DIR,
    cursor: Cursor,
}

// SAFETY: the raw enumeration handle is only touched while the owning
// File's mutex is held (or through &mut during close/drop).
unsafe impl Send for DirState {}

impl DirState {
    pub(crate) const fn new(dir: *mut DIR) -> Self {
        Self {
            dir,
            cursor: Cursor::AwaitingFetch,
        }
    }

    /// Loads the next native record into the cursor. Clean end-of-directory
    /// is `Fetch::End`, not an error.
    pub(crate) fn fetch(&mut self) -> io::Result<Fetch> {
        debug_assert!(matches!(self.cursor, Cursor::AwaitingFetch));
        match sys::readdir_next(self.dir)? {
            None => Ok(Fetch::End),
            Some(name) => {
                self.cursor = Cursor::Holding(RawEntry { name });
                Ok(Fetch::Entry)
            }
        }
    }

    #[inline]
    pub(crate) const fn holding(&self) -> bool {
        matches!(self.cursor, Cursor::Holding(_))
    }

    /// Delivers the held record, returning the cursor to `AwaitingFetch`.
    pub(crate) fn take(&mut self) -> Option<RawEntry> {
        match std::mem::replace(&mut self.cursor, Cursor::AwaitingFetch) {
            Cursor::Holding(entry) => Some(entry),
            Cursor::AwaitingFetch => None,
        }
    }

    /// Releases the enumeration handle. The null guard makes a second call
    /// a no-op, close and the drop safety net share this path.
    pub(crate) fn release(&mut self) -> io::Result<()> {
        if self.dir.is_null() {
            return Ok(());
        }
        let dir = std::mem::replace(&mut self.dir, ptr::null_mut());
        sys::closedir(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::RawEntry;

    #[test]
    fn dot_entries_are_recognised() {
        let dot = RawEntry { name: (*b".").into() };
        let dotdot = RawEntry { name: (*b"..").into() };
        let hidden = RawEntry { name: (*b".gitignore").into() };
        assert!(dot.is_dot());
        assert!(dotdot.is_dot());
        assert!(!hidden.is_dot());
    }
}
