use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use archive_vfs::snapshot::{self, Snapshot, SnapshotEntry};

use crate::error::{Error, Result};

/// Packs a host directory tree into a snapshot document.
///
/// Entries are emitted parents-first, children sorted by name, so the
/// resulting archive lists directories in a stable order regardless of the
/// host filesystem's enumeration order.
pub fn pack(dir: &Path, archive: &Path) -> Result<()> {
    let mut entries = Vec::new();
    walk(dir, "", &mut entries)?;

    let count = entries.len();
    let out = fs::File::create(archive).map_err(|source| Error::CreateSnapshot {
        path: archive.to_path_buf(),
        source,
    })?;
    Snapshot { entries }
        .to_writer(io::BufWriter::new(out))
        .map_err(|source| Error::WriteSnapshot {
            path: archive.to_path_buf(),
            source,
        })?;

    println!("Packed {} entries into `{}`", count, archive.display());
    Ok(())
}

fn walk(host: &Path, rel: &str, out: &mut Vec<SnapshotEntry>) -> Result<()> {
    let walk_err = |source| Error::WalkDirectory {
        path: host.to_path_buf(),
        source,
    };

    let mut children = fs::read_dir(host)
        .map_err(walk_err)?
        .collect::<io::Result<Vec<_>>>()
        .map_err(walk_err)?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let host_path = child.path();
        let name = child.file_name().to_string_lossy().into_owned();
        let rel_path = if rel.is_empty() {
            name
        } else {
            format!("{rel}/{name}")
        };

        let meta = fs::symlink_metadata(&host_path).map_err(|source| Error::ReadFile {
            path: host_path.clone(),
            source,
        })?;
        let file_type = meta.file_type();

        if file_type.is_symlink() {
            let target = fs::read_link(&host_path).map_err(|source| Error::ReadFile {
                path: host_path.clone(),
                source,
            })?;
            out.push(SnapshotEntry::Symlink {
                path: rel_path,
                target: target.to_string_lossy().replace('\\', "/"),
                perm: perm(&meta),
                mtime: mtime(&meta),
            });
        } else if file_type.is_dir() {
            out.push(SnapshotEntry::Dir {
                path: rel_path.clone(),
                perm: perm(&meta),
                mtime: mtime(&meta),
            });
            walk(&host_path, &rel_path, out)?;
        } else if file_type.is_file() {
            let content = fs::read(&host_path).map_err(|source| Error::ReadFile {
                path: host_path.clone(),
                source,
            })?;
            out.push(SnapshotEntry::File {
                path: rel_path,
                content: snapshot::encode_content(&content),
                perm: perm(&meta),
                mtime: mtime(&meta),
            });
        } else {
            // Sockets, devices, and friends have no archive representation.
            tracing::warn!(path = %host_path.display(), "skipping special file");
        }
    }

    Ok(())
}

#[cfg(unix)]
fn perm(meta: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn perm(_meta: &fs::Metadata) -> Option<u32> {
    None
}

fn mtime(meta: &fs::Metadata) -> Option<u64> {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}
