use std::path::PathBuf;

use archive_vfs::snapshot::SnapshotError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open snapshot `{}`", .path.display())]
    OpenSnapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    #[error("Cannot access `{path}` in the archive")]
    Filesystem {
        path: String,
        #[source]
        source: archive_vfs::Error,
    },

    #[error("Cannot write to standard output")]
    Stdout {
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot walk directory `{}`", .path.display())]
    WalkDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read file `{}`", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write snapshot `{}`", .path.display())]
    WriteSnapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    #[error("Cannot create snapshot `{}`", .path.display())]
    CreateSnapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
