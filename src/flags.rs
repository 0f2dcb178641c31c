use bitflags::bitflags;
use libc::c_int;

bitflags! {
    /// Access and creation flags for [`open`](crate::open).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
        const READ_WRITE = Self::READ.bits() | Self::WRITE.bits();
        const CREATE = 1 << 2;
        const EXCLUSIVE = 1 << 3;
    }
}

impl OpenFlags {
    /// True when any write access is requested. Directories refuse these.
    #[inline]
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.intersects(Self::WRITE)
    }

    // handles never outlive an exec, so O_CLOEXEC is always or'd in
    pub(crate) const fn to_native(self) -> c_int {
        let mut bits = if self.contains(Self::READ_WRITE) {
            libc::O_RDWR
        } else if self.intersects(Self::WRITE) {
            libc::O_WRONLY
        } else {
            libc::O_RDONLY
        };
        if self.intersects(Self::CREATE) {
            bits |= libc::O_CREAT;
        }
        if self.intersects(Self::EXCLUSIVE) {
            bits |= libc::O_EXCL;
        }
        bits | libc::O_CLOEXEC
    }
}

/// Origin for [`seek`](crate::File::seek).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Absolute, from the beginning of the file.
    Start,
    /// Relative to the current sequential cursor.
    Current,
    /// Relative to the end of the file.
    End,
}

impl Whence {
    pub(crate) const fn to_native(self) -> c_int {
        match self {
            Self::Start => libc::SEEK_SET,
            Self::Current => libc::SEEK_CUR,
            Self::End => libc::SEEK_END,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OpenFlags, Whence};

    #[test]
    fn native_access_bits() {
        assert_eq!(
            OpenFlags::READ.to_native(),
            libc::O_RDONLY | libc::O_CLOEXEC
        );
        assert_eq!(
            OpenFlags::WRITE.to_native(),
            libc::O_WRONLY | libc::O_CLOEXEC
        );
        assert_eq!(
            OpenFlags::READ_WRITE.to_native(),
            libc::O_RDWR | libc::O_CLOEXEC
        );
        assert_eq!(
            (OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::EXCLUSIVE).to_native(),
            libc::O_WRONLY | libc::O_CREAT | libc::O_EXCL | libc::O_CLOEXEC
        );
    }

    #[test]
    fn writability() {
        assert!(!OpenFlags::READ.is_writable());
        assert!(OpenFlags::WRITE.is_writable());
        assert!(OpenFlags::READ_WRITE.is_writable());
        assert!(!(OpenFlags::READ | OpenFlags::CREATE).is_writable());
    }

    #[test]
    fn whence_mapping() {
        assert_eq!(Whence::Start.to_native(), libc::SEEK_SET);
        assert_eq!(Whence::Current.to_native(), libc::SEEK_CUR);
        assert_eq!(Whence::End.to_native(), libc::SEEK_END);
    }
}
