use std::io;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure classification for every operation in the filesystem contract.
///
/// Errors are returned to the immediate caller and never retried here;
/// a serving layer translates them into its own protocol status codes.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no entry found at `{path}`")]
    NotFound { path: String },

    #[error("`{path}` is not a directory")]
    NotADirectory { path: String },

    #[error("cannot open directory `{path}`")]
    IsADirectory { path: String },

    #[error("`{path}` is not a symlink")]
    NotASymlink { path: String },

    #[error("cannot resolve symlink target for `{path}`")]
    SymlinkBroken { path: String },

    #[error("filesystem is read-only")]
    ReadOnly,

    #[error("`{0}` is not supported")]
    Unsupported(&'static str),

    #[error("seek would move before the start of the file")]
    InvalidOffset,

    #[error("archive error")]
    Archive(#[source] io::Error),
}

impl Error {
    /// True when the error reports a failed target resolution, either
    /// because the target is missing or the chain itself is defective.
    pub(crate) fn is_broken_resolution(&self) -> bool {
        matches!(
            self,
            Error::NotFound { .. } | Error::SymlinkBroken { .. }
        )
    }
}

// Needed for the `Read`/`Seek` impls on file handles.
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        let kind = match &err {
            Error::NotFound { .. } => io::ErrorKind::NotFound,
            Error::ReadOnly => io::ErrorKind::PermissionDenied,
            Error::Unsupported(_) => io::ErrorKind::Unsupported,
            Error::InvalidOffset => io::ErrorKind::InvalidInput,
            Error::Archive(source) => source.kind(),
            _ => io::ErrorKind::Other,
        };
        io::Error::new(kind, err)
    }
}
