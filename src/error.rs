use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::{fmt, io};

/// Generic result type for handle-layer operations.
pub type Result<T> = core::result::Result<T, FileError>;

/// An error type for file-handle operations.
///
/// Every native failure is translated at the call site into one of these
/// variants and returned to the caller. Nothing in this layer panics, retries
/// or terminates the process, and end-of-stream on byte reads is a zero count
/// rather than an error.
#[derive(Debug)]
pub enum FileError {
    /// A native call failed against a specific path, eg `open /tmp/x: ...`
    Path {
        op: &'static str,
        path: Box<[u8]>,
        source: io::Error,
    },
    /// A native call failed with no path in scope (pipe creation).
    Sys {
        op: &'static str,
        source: io::Error,
    },
    /// The file was never opened or has already been closed.
    Closed,
    /// Write access requested on a directory, or byte I/O applied to one.
    IsDirectory(Box<[u8]>),
    /// Directory enumeration requested on a regular file.
    NotDirectory(Box<[u8]>),
    /// End of a bounded enumeration, distinct from genuine failure.
    EndOfEntries,
}

impl FileError {
    #[inline]
    pub(crate) fn path(op: &'static str, path: &[u8], source: io::Error) -> Self {
        Self::Path {
            op,
            path: path.into(),
            source,
        }
    }

    #[inline]
    pub(crate) fn sys(op: &'static str, source: io::Error) -> Self {
        Self::Sys { op, source }
    }

    ///cheap check for the designated end-of-enumeration value
    #[inline]
    #[must_use]
    pub const fn is_end_of_entries(&self) -> bool {
        matches!(self, Self::EndOfEntries)
    }

    /// Raw errno of the underlying native failure, if there is one.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Path { source, .. } | Self::Sys { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }
}

//paths are byte strings on this host, lossy conversion is for display only
fn lossy(path: &[u8]) -> std::borrow::Cow<'_, str> {
    OsStr::from_bytes(path).to_string_lossy()
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { op, path, source } => write!(f, "{op} {}: {source}", lossy(path)),
            Self::Sys { op, source } => write!(f, "{op}: {source}"),
            Self::Closed => write!(f, "file already closed"),
            Self::IsDirectory(path) => write!(f, "{}: is a directory", lossy(path)),
            Self::NotDirectory(path) => write!(f, "{}: not a directory", lossy(path)),
            Self::EndOfEntries => write!(f, "no more directory entries"),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Path { source, .. } | Self::Sys { source, .. } => Some(source),
            _ => None,
        }
    }
}
