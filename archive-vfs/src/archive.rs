use std::time::SystemTime;

use crate::meta::{FileMode, Metadata};
use crate::Result;

/// One node in the archive namespace, resolved once at lookup time.
///
/// The kind is a tagged variant so callers never need to narrow a concrete
/// backend type to ask symlink-specific questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub size: u64,
    pub perm: u32,
    pub mtime: SystemTime,
    pub kind: EntryKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink {
        /// The raw target path exactly as stored in the container.
        target: String,
    },
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.kind, EntryKind::Symlink { .. })
    }

    pub fn symlink_target(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::Symlink { target } => Some(target),
            _ => None,
        }
    }

    /// Metadata for the literal entry, symlinks included.
    pub fn metadata(&self) -> Metadata {
        let mode = match self.kind {
            EntryKind::File => FileMode::regular(self.perm),
            EntryKind::Directory => FileMode::directory(self.perm),
            EntryKind::Symlink { .. } => FileMode::symlink(self.perm),
        };
        Metadata::new(self.name.clone(), self.size, mode, self.mtime)
    }
}

/// The primitive operations the adapter consumes from a container decoder.
///
/// Implementations decode the container's superblock, inode table, and
/// compression; none of that surfaces here. Paths are canonical archive
/// paths (see [`crate::path`]), with `""` denoting the root. The container
/// is immutable, so implementations must be safe for concurrent lookups.
pub trait ArchiveReader: Send + Sync {
    /// Looks up the entry at `path`. Fails with [`crate::Error::NotFound`]
    /// if the container has no entry there.
    fn entry(&self, path: &str) -> Result<Entry>;

    /// Lists the children of the directory at `path` in archive-native
    /// order. Callers wanting a stable listing sort the result themselves.
    fn read_dir(&self, path: &str) -> Result<Vec<Entry>>;

    /// Decodes the full content of the file at `path`. Symlinks are
    /// followed to their content.
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;

    /// Resolves the symlink at `path` to its target entry, following
    /// however many hops the backend supports.
    fn resolve_symlink(&self, path: &str) -> Result<Entry>;
}

impl<R: ArchiveReader + ?Sized> ArchiveReader for &R {
    fn entry(&self, path: &str) -> Result<Entry> {
        (**self).entry(path)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<Entry>> {
        (**self).read_dir(path)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read_file(path)
    }

    fn resolve_symlink(&self, path: &str) -> Result<Entry> {
        (**self).resolve_symlink(path)
    }
}

impl<R: ArchiveReader + ?Sized> ArchiveReader for std::sync::Arc<R> {
    fn entry(&self, path: &str) -> Result<Entry> {
        (**self).entry(path)
    }

    fn read_dir(&self, path: &str) -> Result<Vec<Entry>> {
        (**self).read_dir(path)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read_file(path)
    }

    fn resolve_symlink(&self, path: &str) -> Result<Entry> {
        (**self).resolve_symlink(path)
    }
}
