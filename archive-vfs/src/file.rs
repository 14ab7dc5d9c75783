use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::error::{Error, Result};
use crate::meta::Metadata;

/// A read-only handle over one opened archive entry.
///
/// The entry's full content is fetched at open time, but the seekable
/// reader over it is only constructed on the first `read`, `read_at`, or
/// `seek`. That transition happens exactly once even when several threads
/// race to be first on a shared handle; afterwards every operation reuses
/// the same reader and cursor.
///
/// Sharing a handle across threads after materialization races on the
/// shared cursor exactly as a conventional file descriptor would.
pub struct LazyFile {
    meta: Metadata,
    content: Arc<[u8]>,
    reader: OnceLock<Mutex<Cursor<Arc<[u8]>>>>,
    materializations: AtomicUsize,
}

impl LazyFile {
    pub(crate) fn new(meta: Metadata, content: Vec<u8>) -> LazyFile {
        LazyFile {
            meta,
            content: Arc::from(content),
            reader: OnceLock::new(),
            materializations: AtomicUsize::new(0),
        }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn stat(&self) -> Metadata {
        self.meta.clone()
    }

    /// Whether the seekable reader has been constructed yet.
    pub fn is_materialized(&self) -> bool {
        self.reader.get().is_some()
    }

    #[cfg(test)]
    fn materialization_count(&self) -> usize {
        self.materializations.load(Ordering::Relaxed)
    }

    fn cursor(&self) -> MutexGuard<'_, Cursor<Arc<[u8]>>> {
        let reader = self.reader.get_or_init(|| {
            self.materializations.fetch_add(1, Ordering::Relaxed);
            Mutex::new(Cursor::new(self.content.clone()))
        });
        // A poisoned lock only means another thread panicked mid-read;
        // the cursor itself is still coherent.
        reader.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads from the shared cursor, advancing it. Returns `Ok(0)` at the
    /// end of the content.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let mut cursor = self.cursor();
        cursor.read(buf).map_err(Error::Archive)
    }

    /// Reads at an absolute offset without moving the shared cursor.
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        // Still counts as first access for materialization purposes.
        drop(self.cursor());

        let content: &[u8] = &self.content;
        if offset >= content.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = buf.len().min(content.len() - start);
        buf[..n].copy_from_slice(&content[start..start + n]);
        Ok(n)
    }

    /// Repositions the shared cursor. Start, current, and end anchors are
    /// supported; a resulting negative position is rejected.
    pub fn seek(&self, pos: SeekFrom) -> Result<u64> {
        let mut cursor = self.cursor();
        cursor.seek(pos).map_err(|e| {
            if e.kind() == io::ErrorKind::InvalidInput {
                Error::InvalidOffset
            } else {
                Error::Archive(e)
            }
        })
    }

    /// Closing is a no-op: the content is already in memory and the handle
    /// holds no lock on the container.
    pub fn close(&self) -> Result<()> {
        Ok(())
    }

    /// No-op. There is no concurrent writer to coordinate with.
    pub fn lock(&self) -> Result<()> {
        Ok(())
    }

    /// No-op, see [`LazyFile::lock`].
    pub fn unlock(&self) -> Result<()> {
        Ok(())
    }

    pub fn write(&self, _buf: &[u8]) -> Result<usize> {
        Err(Error::ReadOnly)
    }

    pub fn write_at(&self, _buf: &[u8], _offset: u64) -> Result<usize> {
        Err(Error::ReadOnly)
    }

    pub fn truncate(&self, _size: u64) -> Result<()> {
        Err(Error::ReadOnly)
    }
}

impl Read for LazyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        LazyFile::read(self, buf).map_err(Into::into)
    }
}

impl Read for &LazyFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        LazyFile::read(*self, buf).map_err(Into::into)
    }
}

impl Seek for LazyFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        LazyFile::seek(self, pos).map_err(Into::into)
    }
}

impl Seek for &LazyFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        LazyFile::seek(*self, pos).map_err(Into::into)
    }
}

impl std::fmt::Debug for LazyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyFile")
            .field("name", &self.meta.name())
            .field("size", &self.meta.size())
            .field("materialized", &self.is_materialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::FileMode;
    use std::time::SystemTime;

    fn handle(content: &[u8]) -> LazyFile {
        let meta = Metadata::new(
            "test.txt".into(),
            content.len() as u64,
            FileMode::regular(0o644),
            SystemTime::UNIX_EPOCH,
        );
        LazyFile::new(meta, content.to_vec())
    }

    #[test]
    fn materializes_once_across_operations() {
        let f = handle(b"hello world");
        assert!(!f.is_materialized());
        assert_eq!(f.materialization_count(), 0);

        f.seek(SeekFrom::Start(6)).unwrap();
        assert!(f.is_materialized());

        let mut buf = [0u8; 16];
        let n = f.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"world");
        assert_eq!(f.read(&mut buf).unwrap(), 0);

        assert_eq!(f.materialization_count(), 1);
    }

    #[test]
    fn read_at_does_not_move_the_cursor() {
        let f = handle(b"0123456789");
        let mut buf = [0u8; 4];

        assert_eq!(f.read_at(&mut buf, 4).unwrap(), 4);
        assert_eq!(&buf, b"4567");

        // Cursor still at the start.
        let n = f.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"0123");

        assert_eq!(f.read_at(&mut buf, 20).unwrap(), 0);
    }

    #[test]
    fn seek_from_end_and_rejects_negative() {
        let f = handle(b"0123456789");
        assert_eq!(f.seek(SeekFrom::End(-2)).unwrap(), 8);

        let mut buf = [0u8; 4];
        let n = f.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"89");

        assert!(matches!(
            f.seek(SeekFrom::Current(-100)),
            Err(Error::InvalidOffset)
        ));
    }

    #[test]
    fn writes_fail_read_only() {
        let f = handle(b"abc");
        assert!(matches!(f.write(b"x"), Err(Error::ReadOnly)));
        assert!(matches!(f.write_at(b"x", 0), Err(Error::ReadOnly)));
        assert!(matches!(f.truncate(0), Err(Error::ReadOnly)));
        // Lock and close stay inert.
        f.lock().unwrap();
        f.unlock().unwrap();
        f.close().unwrap();
    }

    #[test]
    fn concurrent_first_access_materializes_once() {
        let f = std::sync::Arc::new(handle(&vec![7u8; 4096]));
        let barrier = std::sync::Arc::new(std::sync::Barrier::new(8));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let f = f.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        let mut buf = [0u8; 64];
                        f.read(&mut buf).unwrap();
                    } else {
                        f.seek(SeekFrom::Start(0)).unwrap();
                    }
                })
            })
            .collect();

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(f.materialization_count(), 1);
    }
}
