use std::io;
use std::path::Path;
use std::time::SystemTime;

use archive_vfs::{snapshot, ArchiveFilesystem, Filesystem, MemArchive, Metadata};
use chrono::{DateTime, Utc};
use humansize::{file_size_opts, FileSize};

use crate::error::{Error, Result};

mod pack;

pub use pack::pack;

fn open_archive(archive: &Path) -> Result<ArchiveFilesystem<MemArchive>> {
    let backend = snapshot::load(archive).map_err(|source| Error::OpenSnapshot {
        path: archive.to_path_buf(),
        source,
    })?;
    Ok(ArchiveFilesystem::new(backend))
}

fn fs_err(path: &str) -> impl FnOnce(archive_vfs::Error) -> Error + '_ {
    move |source| Error::Filesystem {
        path: path.to_string(),
        source,
    }
}

fn human_size(size: u64) -> String {
    size.file_size(file_size_opts::CONVENTIONAL)
        .unwrap_or_else(|_| size.to_string())
}

fn human_mtime(mtime: SystemTime) -> String {
    DateTime::<Utc>::from(mtime)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn print_entry(fs: &ArchiveFilesystem<MemArchive>, dir: &str, meta: &Metadata) {
    let mut name = meta.name().to_string();
    if meta.is_symlink() {
        let link_path = fs.join(&[dir, meta.name()]);
        if let Ok(target) = fs.readlink(&link_path) {
            name = format!("{name} -> {target}");
        }
    }
    println!(
        "{} {:>10} {} {}",
        meta.mode(),
        human_size(meta.size()),
        human_mtime(meta.mtime()),
        name,
    );
}

pub fn list(archive: &Path, path: &str) -> Result<()> {
    let fs = open_archive(archive)?;
    let entries = fs.read_dir(path).map_err(fs_err(path))?;
    for meta in &entries {
        print_entry(&fs, path, meta);
    }
    Ok(())
}

pub fn stat(archive: &Path, path: &str) -> Result<()> {
    let fs = open_archive(archive)?;

    let literal = fs.lstat(path).map_err(fs_err(path))?;
    println!("name:     {}", literal.name());
    println!("mode:     {} ({:o})", literal.mode(), literal.mode().bits());
    println!("size:     {}", human_size(literal.size()));
    println!("modified: {}", human_mtime(literal.mtime()));

    if literal.is_symlink() {
        let target = fs.readlink(path).map_err(fs_err(path))?;
        println!("target:   {target}");
        match fs.stat(path) {
            Ok(resolved) => {
                println!(
                    "resolved: {} {} {}",
                    resolved.mode(),
                    human_size(resolved.size()),
                    human_mtime(resolved.mtime()),
                );
            }
            Err(err) => println!("resolved: ({err})"),
        }
    }

    Ok(())
}

pub fn cat(archive: &Path, path: &str) -> Result<()> {
    let fs = open_archive(archive)?;
    let mut file = fs.open(path).map_err(fs_err(path))?;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    io::copy(&mut file, &mut stdout).map_err(|source| Error::Stdout { source })?;
    Ok(())
}

pub fn readlink(archive: &Path, path: &str) -> Result<()> {
    let fs = open_archive(archive)?;
    let target = fs.readlink(path).map_err(fs_err(path))?;
    println!("{target}");
    Ok(())
}
