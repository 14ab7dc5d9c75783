//! The JSON snapshot container format.
//!
//! A snapshot is a flat document listing every entry of an archive
//! namespace, with file content carried as base64. It exists so fixtures
//! and the CLI have a durable on-disk container that loads straight into a
//! [`MemArchive`]; real binary containers live behind their own
//! [`crate::ArchiveReader`] implementations.
//!
//! ```json
//! { "entries": [
//!   { "kind": "dir",     "path": "docs" },
//!   { "kind": "file",    "path": "docs/readme.md", "content": "aGVsbG8=" },
//!   { "kind": "symlink", "path": "latest", "target": "docs/readme.md" }
//! ] }
//! ```

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::mem::MemArchive;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("cannot read snapshot")]
    Io(#[from] io::Error),

    #[error("malformed snapshot document")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 content for `{path}`")]
    Content {
        path: String,
        #[source]
        source: base64::DecodeError,
    },
}

/// The on-disk document. Entry order is preserved into the archive, so it
/// doubles as the archive-native directory order.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: Vec<SnapshotEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SnapshotEntry {
    Dir {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        perm: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mtime: Option<u64>,
    },
    File {
        path: String,
        /// Base64-encoded content; empty string for an empty file.
        #[serde(default)]
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        perm: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mtime: Option<u64>,
    },
    Symlink {
        path: String,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        perm: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mtime: Option<u64>,
    },
}

impl Snapshot {
    pub fn from_reader(reader: impl io::Read) -> Result<Snapshot, SnapshotError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_writer(&self, writer: impl io::Write) -> Result<(), SnapshotError> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }

    /// Builds the in-memory archive this snapshot describes.
    pub fn into_archive(self) -> Result<MemArchive, SnapshotError> {
        let mut builder = MemArchive::builder();

        for entry in self.entries {
            builder = match entry {
                SnapshotEntry::Dir { path, perm, mtime } => builder.dir_with(
                    &path,
                    perm.unwrap_or(0o755),
                    unix_time(mtime),
                ),
                SnapshotEntry::File {
                    path,
                    content,
                    perm,
                    mtime,
                } => {
                    let content = BASE64.decode(content.as_bytes()).map_err(|source| {
                        SnapshotError::Content {
                            path: path.clone(),
                            source,
                        }
                    })?;
                    builder.file_with(&path, content, perm.unwrap_or(0o644), unix_time(mtime))
                }
                SnapshotEntry::Symlink {
                    path,
                    target,
                    perm,
                    mtime,
                } => builder.symlink_with(&path, &target, perm.unwrap_or(0o777), unix_time(mtime)),
            };
        }

        Ok(builder.build())
    }
}

/// Opens a snapshot file and builds its archive.
pub fn load(path: impl AsRef<Path>) -> Result<MemArchive, SnapshotError> {
    let file = File::open(path)?;
    Snapshot::from_reader(io::BufReader::new(file))?.into_archive()
}

/// Base64 form of file content, as stored in snapshot documents.
pub fn encode_content(content: &[u8]) -> String {
    BASE64.encode(content)
}

fn unix_time(secs: Option<u64>) -> SystemTime {
    match secs {
        Some(secs) => SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        None => SystemTime::UNIX_EPOCH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveReader;

    const DOC: &str = r#"{
        "entries": [
            { "kind": "dir", "path": "docs", "perm": 448 },
            { "kind": "file", "path": "docs/readme.md", "content": "aGVsbG8=", "mtime": 1700000000 },
            { "kind": "symlink", "path": "latest", "target": "docs/readme.md" }
        ]
    }"#;

    #[test]
    fn loads_a_document() {
        let archive = Snapshot::from_reader(DOC.as_bytes())
            .unwrap()
            .into_archive()
            .unwrap();

        assert_eq!(archive.read_file("docs/readme.md").unwrap(), b"hello");
        assert_eq!(archive.entry("docs").unwrap().perm, 0o700);
        assert_eq!(
            archive.resolve_symlink("latest").unwrap().name,
            "readme.md"
        );
        assert_eq!(
            archive.entry("docs/readme.md").unwrap().mtime,
            unix_time(Some(1_700_000_000))
        );
    }

    #[test]
    fn rejects_bad_content_encoding() {
        let doc = r#"{ "entries": [ { "kind": "file", "path": "x", "content": "!!" } ] }"#;
        let err = Snapshot::from_reader(doc.as_bytes())
            .unwrap()
            .into_archive()
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Content { .. }));
    }

    #[test]
    fn round_trips_through_a_file() {
        let snapshot = Snapshot {
            entries: vec![
                SnapshotEntry::File {
                    path: "a.txt".into(),
                    content: encode_content(b"alpha"),
                    perm: None,
                    mtime: None,
                },
                SnapshotEntry::Symlink {
                    path: "b".into(),
                    target: "a.txt".into(),
                    perm: None,
                    mtime: None,
                },
            ],
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        snapshot.to_writer(File::create(&path).unwrap()).unwrap();

        let archive = load(&path).unwrap();
        assert_eq!(archive.read_file("b").unwrap(), b"alpha");
    }
}
