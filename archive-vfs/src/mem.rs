//! An in-memory archive backend.
//!
//! `MemArchive` implements [`ArchiveReader`] over a tree built up front
//! with [`MemArchiveBuilder`]; once built it is immutable, like any other
//! container. It backs the test suite and the snapshot container format,
//! and serves as the reference behavior for real decoders: children are
//! listed in insertion order (archive-native order), and symlink targets
//! resolve relative to the link's parent directory with a bounded number
//! of hops.

use std::collections::HashMap;
use std::time::SystemTime;

use crate::archive::{ArchiveReader, Entry, EntryKind};
use crate::error::{Error, Result};
use crate::path;

/// Hop budget for symlink chains, after which the chain is broken.
/// Matches the kernel's ELOOP convention.
const MAX_LINK_HOPS: usize = 40;

#[derive(Debug, Clone)]
enum NodeKind {
    File { content: Vec<u8> },
    Directory { children: Vec<String> },
    Symlink { target: String },
}

#[derive(Debug, Clone)]
struct Node {
    perm: u32,
    mtime: SystemTime,
    kind: NodeKind,
}

/// An immutable, in-memory archive container.
#[derive(Debug, Clone)]
pub struct MemArchive {
    nodes: HashMap<String, Node>,
}

impl MemArchive {
    pub fn builder() -> MemArchiveBuilder {
        MemArchiveBuilder::new()
    }

    fn node(&self, path: &str) -> Result<&Node> {
        self.nodes.get(path).ok_or_else(|| Error::NotFound {
            path: path.to_string(),
        })
    }

    fn entry_for(&self, entry_path: &str, node: &Node) -> Entry {
        let (size, kind) = match &node.kind {
            NodeKind::File { content } => (content.len() as u64, EntryKind::File),
            NodeKind::Directory { .. } => (0, EntryKind::Directory),
            NodeKind::Symlink { target } => (
                target.len() as u64,
                EntryKind::Symlink {
                    target: target.clone(),
                },
            ),
        };
        Entry {
            name: path::base_name(entry_path).to_string(),
            size,
            perm: node.perm,
            mtime: node.mtime,
            kind,
        }
    }

    /// Follows symlinks from `start` to a terminal node. Targets beginning
    /// with `/` are taken from the archive root; anything else is relative
    /// to the link's parent directory.
    fn resolve_node(&self, start: &str) -> Result<(String, &Node)> {
        let mut current = start.to_string();

        for _ in 0..MAX_LINK_HOPS {
            let node = self.node(&current)?;
            let target = match &node.kind {
                NodeKind::Symlink { target } => target,
                _ => return Ok((current, node)),
            };

            current = if let Some(rooted) = target.strip_prefix('/') {
                path::clean(rooted)
            } else {
                let parent = parent_of(&current);
                path::join([parent, target.as_str()])
            };
        }

        Err(Error::SymlinkBroken {
            path: start.to_string(),
        })
    }
}

impl ArchiveReader for MemArchive {
    fn entry(&self, path: &str) -> Result<Entry> {
        let path = path::clean(path);
        let node = self.node(&path)?;
        Ok(self.entry_for(&path, node))
    }

    fn read_dir(&self, path: &str) -> Result<Vec<Entry>> {
        let path = path::clean(path);
        let node = self.node(&path)?;
        let children = match &node.kind {
            NodeKind::Directory { children } => children,
            _ => return Err(Error::NotADirectory { path }),
        };

        children
            .iter()
            .map(|name| {
                let child_path = path::join([path.as_str(), name.as_str()]);
                let child = self.node(&child_path)?;
                Ok(self.entry_for(&child_path, child))
            })
            .collect()
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let path = path::clean(path);
        let (resolved, node) = self.resolve_node(&path)?;
        match &node.kind {
            NodeKind::File { content } => Ok(content.clone()),
            NodeKind::Directory { .. } => Err(Error::IsADirectory { path: resolved }),
            NodeKind::Symlink { .. } => unreachable!("resolve_node returns terminal nodes"),
        }
    }

    fn resolve_symlink(&self, path: &str) -> Result<Entry> {
        let path = path::clean(path);
        let node = self.node(&path)?;
        if !matches!(node.kind, NodeKind::Symlink { .. }) {
            return Err(Error::NotASymlink { path });
        }

        let (resolved, target) = self.resolve_node(&path)?;
        Ok(self.entry_for(&resolved, target))
    }
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[..idx],
        None => "",
    }
}

/// Builds a [`MemArchive`] one entry at a time.
///
/// Parent directories are created implicitly with default permissions.
/// Entries default to mode 0o644 (files), 0o755 (directories), and 0o777
/// (symlinks), all with an epoch mtime; the `*_with` variants override
/// both.
#[derive(Debug)]
pub struct MemArchiveBuilder {
    nodes: HashMap<String, Node>,
}

impl MemArchiveBuilder {
    fn new() -> MemArchiveBuilder {
        let mut nodes = HashMap::new();
        nodes.insert(
            String::new(),
            Node {
                perm: 0o755,
                mtime: SystemTime::UNIX_EPOCH,
                kind: NodeKind::Directory {
                    children: Vec::new(),
                },
            },
        );
        MemArchiveBuilder { nodes }
    }

    pub fn dir(self, path: &str) -> Self {
        self.dir_with(path, 0o755, SystemTime::UNIX_EPOCH)
    }

    pub fn dir_with(mut self, path: &str, perm: u32, mtime: SystemTime) -> Self {
        self.insert(
            path,
            Node {
                perm,
                mtime,
                kind: NodeKind::Directory {
                    children: Vec::new(),
                },
            },
        );
        self
    }

    pub fn file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.file_with(path, content, 0o644, SystemTime::UNIX_EPOCH)
    }

    pub fn file_with(
        mut self,
        path: &str,
        content: impl Into<Vec<u8>>,
        perm: u32,
        mtime: SystemTime,
    ) -> Self {
        self.insert(
            path,
            Node {
                perm,
                mtime,
                kind: NodeKind::File {
                    content: content.into(),
                },
            },
        );
        self
    }

    pub fn symlink(self, path: &str, target: &str) -> Self {
        self.symlink_with(path, target, 0o777, SystemTime::UNIX_EPOCH)
    }

    pub fn symlink_with(mut self, path: &str, target: &str, perm: u32, mtime: SystemTime) -> Self {
        self.insert(
            path,
            Node {
                perm,
                mtime,
                kind: NodeKind::Symlink {
                    target: target.to_string(),
                },
            },
        );
        self
    }

    pub fn build(self) -> MemArchive {
        MemArchive { nodes: self.nodes }
    }

    fn insert(&mut self, path: &str, node: Node) {
        let path = path::clean(path);
        if path.is_empty() {
            // Adjusting the root: keep its child list, take the new bits.
            if let Some(root) = self.nodes.get_mut("") {
                root.perm = node.perm;
                root.mtime = node.mtime;
            }
            return;
        }

        let parent = parent_of(&path).to_string();
        self.ensure_dir(&parent);

        let name = path::base_name(&path).to_string();
        let replacing = self.nodes.contains_key(&path);
        if !replacing {
            if let Some(Node {
                kind: NodeKind::Directory { children },
                ..
            }) = self.nodes.get_mut(&parent)
            {
                children.push(name);
            }
        }
        self.nodes.insert(path, node);
    }

    fn ensure_dir(&mut self, path: &str) {
        if path.is_empty() || self.nodes.contains_key(path) {
            return;
        }
        let parent = parent_of(path).to_string();
        self.ensure_dir(&parent);

        let name = path::base_name(path).to_string();
        if let Some(Node {
            kind: NodeKind::Directory { children },
            ..
        }) = self.nodes.get_mut(&parent)
        {
            children.push(name);
        }
        self.nodes.insert(
            path.to_string(),
            Node {
                perm: 0o755,
                mtime: SystemTime::UNIX_EPOCH,
                kind: NodeKind::Directory {
                    children: Vec::new(),
                },
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive() -> MemArchive {
        MemArchive::builder()
            .file("docs/readme.md", "hello")
            .file("docs/guide.md", "guide")
            .symlink("docs/latest", "readme.md")
            .symlink("top-level", "docs/guide.md")
            .symlink("rooted", "/docs/readme.md")
            .symlink("hop", "top-level")
            .symlink("dangling", "missing.txt")
            .build()
    }

    #[test]
    fn implicit_parent_directories() {
        let a = archive();
        let entry = a.entry("docs").unwrap();
        assert!(entry.is_dir());
        assert_eq!(entry.name, "docs");
    }

    #[test]
    fn children_keep_insertion_order() {
        let a = archive();
        let names: Vec<_> = a
            .read_dir("docs")
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, ["readme.md", "guide.md", "latest"]);
    }

    #[test]
    fn resolves_relative_rooted_and_chained_targets() {
        let a = archive();
        assert_eq!(a.resolve_symlink("docs/latest").unwrap().name, "readme.md");
        assert_eq!(a.resolve_symlink("rooted").unwrap().name, "readme.md");
        // hop -> top-level -> docs/guide.md
        assert_eq!(a.resolve_symlink("hop").unwrap().name, "guide.md");
        assert_eq!(a.read_file("hop").unwrap(), b"guide");
    }

    #[test]
    fn dangling_and_cyclic_links_are_broken() {
        let a = archive();
        assert!(matches!(
            a.resolve_symlink("dangling"),
            Err(Error::NotFound { .. })
        ));

        let cyclic = MemArchive::builder()
            .symlink("a", "b")
            .symlink("b", "a")
            .build();
        assert!(matches!(
            cyclic.resolve_symlink("a"),
            Err(Error::SymlinkBroken { .. })
        ));
    }

    #[test]
    fn resolve_on_non_symlink_is_an_error() {
        let a = archive();
        assert!(matches!(
            a.resolve_symlink("docs/readme.md"),
            Err(Error::NotASymlink { .. })
        ));
    }

    #[test]
    fn root_listing() {
        let a = archive();
        let root = a.entry("").unwrap();
        assert!(root.is_dir());
        assert_eq!(root.name, "");
        assert_eq!(a.read_dir("").unwrap().len(), 5);
    }
}
