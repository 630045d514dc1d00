//! Filesystem primitives for the build tree.
//!
//! Thin wrappers over `std::fs` that attach the operation and path to every
//! failure, so an aborted bake reports *what* it was doing and *where*.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    CreateDir,
    RemoveDir,
    RemoveFile,
    ReadDir,
    Copy,
    Write,
}

impl fmt::Display for FsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            FsOp::CreateDir => "create directory",
            FsOp::RemoveDir => "remove directory",
            FsOp::RemoveFile => "remove file",
            FsOp::ReadDir => "read directory",
            FsOp::Copy => "copy",
            FsOp::Write => "write",
        };
        f.write_str(verb)
    }
}

#[derive(Error, Debug)]
#[error("failed to {op} {}: {source}", path.display())]
pub struct FilesystemError {
    pub op: FsOp,
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl FilesystemError {
    fn new(op: FsOp, path: &Path, source: io::Error) -> Self {
        Self {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

trait IoContext<T> {
    fn at(self, op: FsOp, path: &Path) -> Result<T, FilesystemError>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, op: FsOp, path: &Path) -> Result<T, FilesystemError> {
        self.map_err(|e| FilesystemError::new(op, path, e))
    }
}

/// Create a directory and its parents. Existing directories are fine.
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    fs::create_dir_all(path).at(FsOp::CreateDir, path)
}

/// Remove a directory tree if present. Returns whether anything was removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool, FilesystemError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FilesystemError::new(FsOp::RemoveDir, path, e)),
    }
}

/// Remove whatever sits at `path` (file, symlink or directory tree).
pub fn remove_entry_if_exists(path: &Path) -> Result<bool, FilesystemError> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(false);
    };
    if meta.is_dir() {
        remove_dir_if_exists(path)
    } else {
        fs::remove_file(path).at(FsOp::RemoveFile, path)?;
        Ok(true)
    }
}

/// Write `contents` to `path`, truncating any existing file.
pub fn write_file(path: &Path, contents: &[u8]) -> Result<(), FilesystemError> {
    fs::write(path, contents).at(FsOp::Write, path)
}

/// Copy a single file, overwriting the destination.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, FilesystemError> {
    fs::copy(src, dst).at(FsOp::Copy, src)
}

/// Entries directly inside `dir`, sorted by file name for deterministic order.
pub fn read_dir_sorted(dir: &Path) -> Result<Vec<fs::DirEntry>, FilesystemError> {
    let mut entries = fs::read_dir(dir)
        .and_then(|rd| rd.collect::<io::Result<Vec<_>>>())
        .at(FsOp::ReadDir, dir)?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Recursively copy `src` into `dst`, creating `dst` if needed. Existing
/// files in `dst` with the same relative path are overwritten; others are
/// left alone. Returns the number of files copied.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<usize, FilesystemError> {
    create_dir_all(dst)?;
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            FilesystemError::new(FsOp::ReadDir, &path, io::Error::other(e))
        })?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| FilesystemError::new(FsOp::Copy, entry.path(), io::Error::other(e)))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            create_dir_all(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Replace `dst` with a fresh copy of `src`: remove first, then copy.
pub fn replace_dir(src: &Path, dst: &Path) -> Result<usize, FilesystemError> {
    remove_dir_if_exists(dst)?;
    copy_dir_recursive(src, dst)
}
