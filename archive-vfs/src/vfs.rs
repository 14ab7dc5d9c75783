use std::ops::{BitOr, BitOrAssign};

use crate::archive::ArchiveReader;
use crate::error::{Error, Result};
use crate::file::LazyFile;
use crate::meta::Metadata;
use crate::path;

/// Capabilities a filesystem declares to its serving layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const READ: Capabilities = Capabilities(1 << 0);
    pub const WRITE: Capabilities = Capabilities(1 << 1);
    pub const SEEK: Capabilities = Capabilities(1 << 2);
    pub const TRUNCATE: Capabilities = Capabilities(1 << 3);
    pub const LOCK: Capabilities = Capabilities(1 << 4);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capabilities {
    fn bitor_assign(&mut self, rhs: Capabilities) {
        self.0 |= rhs.0;
    }
}

/// Open flags for [`Filesystem::open_file`].
///
/// Any flag besides plain reading requests a mutation capability and is
/// rejected by a read-only filesystem before the archive is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct OpenFlags(u32);

impl OpenFlags {
    pub const READ_ONLY: OpenFlags = OpenFlags(0);
    pub const WRITE: OpenFlags = OpenFlags(1 << 0);
    pub const READ_WRITE: OpenFlags = OpenFlags(1 << 1);
    pub const CREATE: OpenFlags = OpenFlags(1 << 2);
    pub const APPEND: OpenFlags = OpenFlags(1 << 3);
    pub const TRUNCATE: OpenFlags = OpenFlags(1 << 4);
    pub const EXCLUSIVE: OpenFlags = OpenFlags(1 << 5);

    /// Whether any mutation capability is requested.
    pub fn is_mutating(self) -> bool {
        self.0 != 0
    }

    pub fn contains(self, other: OpenFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for OpenFlags {
    type Output = OpenFlags;

    fn bitor(self, rhs: OpenFlags) -> OpenFlags {
        OpenFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for OpenFlags {
    fn bitor_assign(&mut self, rhs: OpenFlags) {
        self.0 |= rhs.0;
    }
}

/// The generic filesystem capability contract a serving layer consumes.
///
/// Paths are canonical archive paths (`""` is the root); [`Filesystem::join`]
/// builds them from arbitrary segments. Implementations classify failures
/// with [`Error`] and leave retries to the caller.
pub trait Filesystem: Send + Sync {
    type File;

    /// The root of this filesystem, as a path string.
    fn root(&self) -> &str;

    /// Metadata for the entry at `path`, following symlinks. The returned
    /// name is always the base name of the queried path, even when the
    /// remaining fields describe a resolved target.
    fn stat(&self, path: &str) -> Result<Metadata>;

    /// Metadata for the literal entry at `path`; never follows symlinks.
    fn lstat(&self, path: &str) -> Result<Metadata>;

    /// Opens the file at `path` for reading.
    fn open(&self, path: &str) -> Result<Self::File>;

    /// Opens the file at `path` with explicit flags. The mode argument only
    /// matters to writable filesystems.
    fn open_file(&self, path: &str, flags: OpenFlags, mode: u32) -> Result<Self::File>;

    /// The entries of the directory at `path`, sorted ascending by name.
    fn read_dir(&self, path: &str) -> Result<Vec<Metadata>>;

    /// The raw target of the symlink at `path`, exactly as stored.
    fn readlink(&self, path: &str) -> Result<String>;

    /// Joins path segments into one canonical path (OS-agnostic, forward
    /// slashes).
    fn join(&self, segments: &[&str]) -> String;

    /// A filesystem rooted at a subdirectory of this one.
    fn chroot(&self, path: &str) -> Result<Self>
    where
        Self: Sized;

    fn create(&self, path: &str) -> Result<Self::File>;
    fn rename(&self, from: &str, to: &str) -> Result<()>;
    fn remove(&self, path: &str) -> Result<()>;
    fn mkdir_all(&self, path: &str, mode: u32) -> Result<()>;
    fn symlink(&self, target: &str, link: &str) -> Result<()>;
    fn temp_file(&self, dir: &str, prefix: &str) -> Result<Self::File>;

    /// The capability set this filesystem declares.
    fn capabilities(&self) -> Capabilities;
}

/// Projects an archive container onto the [`Filesystem`] contract.
///
/// One adapter wraps one already-opened container for the lifetime of the
/// serving process. Lookups, stats, and listings are pure reads and take no
/// locks; the only guarded state is inside each [`LazyFile`].
#[derive(Debug)]
pub struct ArchiveFilesystem<R> {
    reader: R,
}

impl<R: ArchiveReader> ArchiveFilesystem<R> {
    /// Wraps an opened container. Failures to open the container itself
    /// belong to the backend's constructor, so they surface at startup
    /// rather than on first use.
    pub fn new(reader: R) -> ArchiveFilesystem<R> {
        ArchiveFilesystem { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Listing assembly: raw entries from the container, converted to
    /// literal metadata and sorted by name, byte-wise.
    fn collect_dir(&self, path: &str) -> Result<Vec<Metadata>> {
        let mut entries: Vec<Metadata> = self
            .reader
            .read_dir(path)?
            .iter()
            .map(|entry| entry.metadata())
            .collect();
        entries.sort_by(|a, b| a.name().as_bytes().cmp(b.name().as_bytes()));
        Ok(entries)
    }
}

impl<R: ArchiveReader> Filesystem for ArchiveFilesystem<R> {
    type File = LazyFile;

    fn root(&self) -> &str {
        ""
    }

    fn stat(&self, path: &str) -> Result<Metadata> {
        let path = path::clean(path);
        tracing::trace!(%path, "stat");

        let entry = self.reader.entry(&path)?;
        if !entry.is_symlink() {
            return Ok(entry.metadata());
        }

        let target = self.reader.resolve_symlink(&path).map_err(|err| {
            if err.is_broken_resolution() {
                tracing::debug!(%path, "stat: broken symlink");
                Error::SymlinkBroken { path: path.clone() }
            } else {
                err
            }
        })?;

        // The caller identifies entries by the path it asked for, so the
        // name stays the queried one even though every other field comes
        // from the resolved target.
        Ok(target
            .metadata()
            .with_name(path::base_name(&path).to_string()))
    }

    fn lstat(&self, path: &str) -> Result<Metadata> {
        let path = path::clean(path);
        tracing::trace!(%path, "lstat");
        Ok(self.reader.entry(&path)?.metadata())
    }

    fn open(&self, path: &str) -> Result<LazyFile> {
        self.open_file(path, OpenFlags::READ_ONLY, 0)
    }

    fn open_file(&self, path: &str, flags: OpenFlags, _mode: u32) -> Result<LazyFile> {
        if flags.is_mutating() {
            return Err(Error::ReadOnly);
        }

        let path = path::clean(path);
        tracing::trace!(%path, "open");

        let entry = self.reader.entry(&path)?;
        if entry.is_dir() {
            return Err(Error::IsADirectory { path });
        }

        // The whole content is decoded here, once per open. The cost is
        // proportional to the entry size with no upper bound; turning the
        // bytes into a seekable reader is deferred to first use.
        let content = self.reader.read_file(&path)?;
        tracing::debug!(%path, size = content.len(), "open: content fetched");
        Ok(LazyFile::new(entry.metadata(), content))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<Metadata>> {
        let path = path::clean(path);
        tracing::trace!(%path, "readdir");

        let entry = self.reader.entry(&path)?;
        if !entry.is_dir() {
            return Err(Error::NotADirectory { path });
        }

        self.collect_dir(&path)
    }

    fn readlink(&self, path: &str) -> Result<String> {
        let path = path::clean(path);
        tracing::trace!(%path, "readlink");

        let entry = self.reader.entry(&path)?;
        match entry.symlink_target() {
            Some(target) => Ok(target.to_string()),
            None => Err(Error::NotASymlink { path }),
        }
    }

    fn join(&self, segments: &[&str]) -> String {
        path::join(segments.iter().copied())
    }

    /// Sub-views over a container are unsupported, unconditionally.
    fn chroot(&self, _path: &str) -> Result<Self> {
        Err(Error::Unsupported("chroot"))
    }

    fn create(&self, _path: &str) -> Result<LazyFile> {
        Err(Error::ReadOnly)
    }

    fn rename(&self, _from: &str, _to: &str) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn remove(&self, _path: &str) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn mkdir_all(&self, _path: &str, _mode: u32) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn symlink(&self, _target: &str, _link: &str) -> Result<()> {
        Err(Error::ReadOnly)
    }

    fn temp_file(&self, _dir: &str, _prefix: &str) -> Result<LazyFile> {
        Err(Error::ReadOnly)
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::READ | Capabilities::SEEK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_bitset() {
        let caps = Capabilities::READ | Capabilities::SEEK;
        assert!(caps.contains(Capabilities::READ));
        assert!(caps.contains(Capabilities::SEEK));
        assert!(!caps.contains(Capabilities::WRITE));
    }

    #[test]
    fn open_flags_mutating() {
        assert!(!OpenFlags::READ_ONLY.is_mutating());
        for flags in [
            OpenFlags::WRITE,
            OpenFlags::READ_WRITE,
            OpenFlags::CREATE,
            OpenFlags::APPEND,
            OpenFlags::TRUNCATE,
            OpenFlags::EXCLUSIVE,
            OpenFlags::CREATE | OpenFlags::TRUNCATE,
        ] {
            assert!(flags.is_mutating(), "{flags:?} should request mutation");
        }
    }
}
