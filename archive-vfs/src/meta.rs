use std::fmt;
use std::time::SystemTime;

/// File mode bits: a type bit plus Unix permission bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FileMode(u32);

impl FileMode {
    pub const TYPE_MASK: u32 = 0o170000;
    pub const TYPE_REGULAR: u32 = 0o100000;
    pub const TYPE_DIRECTORY: u32 = 0o040000;
    pub const TYPE_SYMLINK: u32 = 0o120000;
    pub const PERM_MASK: u32 = 0o7777;

    pub fn regular(perm: u32) -> FileMode {
        FileMode(Self::TYPE_REGULAR | (perm & Self::PERM_MASK))
    }

    pub fn directory(perm: u32) -> FileMode {
        FileMode(Self::TYPE_DIRECTORY | (perm & Self::PERM_MASK))
    }

    pub fn symlink(perm: u32) -> FileMode {
        FileMode(Self::TYPE_SYMLINK | (perm & Self::PERM_MASK))
    }

    pub fn from_bits(bits: u32) -> FileMode {
        FileMode(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn permissions(self) -> u32 {
        self.0 & Self::PERM_MASK
    }

    pub fn is_regular(self) -> bool {
        self.0 & Self::TYPE_MASK == Self::TYPE_REGULAR
    }

    pub fn is_dir(self) -> bool {
        self.0 & Self::TYPE_MASK == Self::TYPE_DIRECTORY
    }

    pub fn is_symlink(self) -> bool {
        self.0 & Self::TYPE_MASK == Self::TYPE_SYMLINK
    }
}

impl fmt::Display for FileMode {
    /// Renders in the `ls -l` style, e.g. `drwxr-xr-x` or `lrwxrwxrwx`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ty = match self.0 & Self::TYPE_MASK {
            Self::TYPE_DIRECTORY => 'd',
            Self::TYPE_SYMLINK => 'l',
            _ => '-',
        };
        f.write_fmt(format_args!("{ty}"))?;
        for shift in [6u32, 3, 0] {
            let bits = (self.0 >> shift) & 0o7;
            f.write_fmt(format_args!(
                "{}{}{}",
                if bits & 0o4 != 0 { 'r' } else { '-' },
                if bits & 0o2 != 0 { 'w' } else { '-' },
                if bits & 0o1 != 0 { 'x' } else { '-' },
            ))?;
        }
        Ok(())
    }
}

/// Metadata for one entry in the archive namespace.
///
/// Immutable once produced. When returned by `stat` for a symlink, every
/// field except `name` describes the resolved target; `name` is always the
/// base name of the path that was queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    name: String,
    size: u64,
    mode: FileMode,
    mtime: SystemTime,
}

impl Metadata {
    pub fn new(name: String, size: u64, mode: FileMode, mtime: SystemTime) -> Metadata {
        Metadata {
            name,
            size,
            mode,
            mtime,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    pub fn is_symlink(&self) -> bool {
        self.mode.is_symlink()
    }

    /// Same metadata carrying a different name. Used by `stat` to report a
    /// resolved symlink target under the queried name.
    pub(crate) fn with_name(mut self, name: String) -> Metadata {
        self.name = name;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_type_bits() {
        assert!(FileMode::regular(0o644).is_regular());
        assert!(FileMode::directory(0o755).is_dir());
        assert!(FileMode::symlink(0o777).is_symlink());
        assert!(!FileMode::regular(0o644).is_dir());
        assert_eq!(FileMode::regular(0o644).permissions(), 0o644);
    }

    #[test]
    fn mode_display() {
        assert_eq!(FileMode::regular(0o644).to_string(), "-rw-r--r--");
        assert_eq!(FileMode::directory(0o755).to_string(), "drwxr-xr-x");
        assert_eq!(FileMode::symlink(0o777).to_string(), "lrwxrwxrwx");
    }
}
