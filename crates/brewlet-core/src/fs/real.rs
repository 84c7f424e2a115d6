//! `InstallFs` backed by the host filesystem.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{EntryKind, InstallFs};

/// The host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

/// Clear a file or link at `to` so a copy never writes through an old symlink
/// or trips over a read-only file from a previous install.
fn clear_destination(to: &Path) -> io::Result<()> {
    match fs::symlink_metadata(to) {
        Ok(meta) if !meta.is_dir() => fs::remove_file(to),
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    let target = fs::read_link(from)?;
    std::os::unix::fs::symlink(target, to)
}

#[cfg(not(unix))]
fn copy_symlink(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

impl InstallFs for RealFs {
    fn glob(&self, root: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        // Relative-path matching: a pattern spelling the leading dot out
        // must still see dotfiles.
        let mut out = Vec::new();
        for entry in walkdir::WalkDir::new(root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            if pattern.matches_path_with(rel, super::GLOB_OPTIONS) {
                out.push(entry.into_path());
            }
        }
        out.sort();
        Ok(out)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> io::Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for entry in walkdir::WalkDir::new(from).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let rel = entry
                .path()
                .strip_prefix(from)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            let dest = if rel.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(rel)
            };

            let file_type = entry.file_type();
            if file_type.is_dir() {
                fs::create_dir_all(&dest)?;
                continue;
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            clear_destination(&dest)?;
            if file_type.is_symlink() {
                copy_symlink(entry.path(), &dest)?;
            } else {
                // fs::copy also carries the permission bits over.
                fs::copy(entry.path(), &dest)?;
            }
            written.push(dest);
        }
        Ok(written)
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, path: &Path, _mode: u32) -> io::Result<()> {
        fs::metadata(path).map(|_| ())
    }

    #[cfg(unix)]
    fn mode(&self, path: &Path) -> io::Result<u32> {
        use std::os::unix::fs::PermissionsExt;
        Ok(fs::metadata(path)?.permissions().mode() & 0o7777)
    }

    #[cfg(not(unix))]
    fn mode(&self, path: &Path) -> io::Result<u32> {
        let readonly = fs::metadata(path)?.permissions().readonly();
        Ok(if readonly { 0o555 } else { 0o755 })
    }

    fn entry(&self, path: &Path) -> Option<EntryKind> {
        let meta = fs::symlink_metadata(path).ok()?;
        let file_type = meta.file_type();
        if file_type.is_symlink() {
            Some(EntryKind::Symlink(fs::read_link(path).ok()?))
        } else if file_type.is_dir() {
            Some(EntryKind::Dir)
        } else {
            Some(EntryKind::File)
        }
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(not(unix))]
    fn symlink(&self, _target: &Path, link: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("symlinks are not supported here: {}", link.display()),
        ))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<bool> {
        if fs::read_dir(path)?.next().is_some() {
            return Ok(false);
        }
        fs::remove_dir(path)?;
        Ok(true)
    }
}
