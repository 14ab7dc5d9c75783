//! Read-only virtual filesystem adapter over immutable archive containers.
//!
//! An archive container stores a directory tree of files, directories, and
//! symlinks behind a handful of coarse primitives (look up an entry, list a
//! directory, decode a file, resolve a symlink). This crate projects that
//! namespace onto the generic [`Filesystem`] capability trait, so serving
//! layers that expect stat/open/readdir/readlink against something shaped
//! like a local filesystem can run against an archive unchanged.
//!
//! Use [`ArchiveFilesystem`] to wrap any [`ArchiveReader`] backend.
//! [`MemArchive`] is the bundled in-memory backend, and [`snapshot`] gives
//! it a durable JSON form.

mod archive;
mod error;
mod file;
pub mod mem;
pub mod path;
pub mod snapshot;
mod meta;
mod vfs;

pub use archive::{ArchiveReader, Entry, EntryKind};
pub use error::{Error, Result};
pub use file::LazyFile;
pub use mem::MemArchive;
pub use meta::{FileMode, Metadata};
pub use vfs::{ArchiveFilesystem, Capabilities, Filesystem, OpenFlags};
