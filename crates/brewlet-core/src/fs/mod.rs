//! Filesystem seam for install steps.
//!
//! Steps never call `std::fs` directly; they go through [`InstallFs`] so the
//! same formula can be replayed against the real disk ([`RealFs`]) or an
//! in-memory tree ([`MemoryFs`]).

mod memory;
mod paths;
mod real;

pub use memory::MemoryFs;
pub use paths::{normalize, relative_path, resolve_link};
pub use real::RealFs;

use std::io;
use std::path::{Path, PathBuf};

/// What sits at a path, without following symlinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Symlink with its raw (possibly relative) target.
    Symlink(PathBuf),
}

/// Match options shared by every `glob` implementation.
pub(crate) const GLOB_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

pub trait InstallFs {
    /// Entries under `root` matching `pattern` (relative glob), sorted.
    /// Names starting with `.` only match patterns that spell the dot out.
    fn glob(&self, root: &Path, pattern: &str) -> io::Result<Vec<PathBuf>>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy a file, directory (recursively) or symlink from `from` to `to`.
    /// Files keep their permission bits. Returns the destination files written.
    fn copy_tree(&self, from: &Path, to: &Path) -> io::Result<Vec<PathBuf>>;

    /// Set permission bits, following symlinks.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Permission bits, following symlinks.
    fn mode(&self, path: &Path) -> io::Result<u32>;

    /// Kind of entry at `path`, or `None` when nothing is there.
    fn entry(&self, path: &Path) -> Option<EntryKind>;

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Remove a file or symlink.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory only if it is empty. Returns whether it was removed.
    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<bool>;
}
