//! In-memory `InstallFs` for replaying install steps without a disk.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};

use super::paths::{normalize, resolve_link};
use super::{EntryKind, InstallFs};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    File { data: Vec<u8>, mode: u32 },
    Dir,
    Symlink(PathBuf),
}

/// A tree of absolute paths kept in a map. Parent directories are implicit
/// for seeded files but must exist for writes, like a real filesystem.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    read_only: RefCell<BTreeSet<PathBuf>>,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{}: not found", path.display()))
}

fn already_exists(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{}: already exists", path.display()),
    )
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file (and its parent directories).
    pub fn add_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>, mode: u32) {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.nodes.borrow_mut().insert(
            path,
            Node::File {
                data: data.into(),
                mode,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        self.add_parents(&path);
        self.nodes.borrow_mut().insert(path, Node::Dir);
    }

    pub fn add_symlink(&self, link: impl AsRef<Path>, target: impl AsRef<Path>) {
        let link = normalize(link.as_ref());
        self.add_parents(&link);
        self.nodes
            .borrow_mut()
            .insert(link, Node::Symlink(target.as_ref().to_path_buf()));
    }

    /// Make writes below `dir` fail with `PermissionDenied`.
    pub fn deny_writes(&self, dir: impl AsRef<Path>) {
        self.read_only.borrow_mut().insert(normalize(dir.as_ref()));
    }

    /// File contents, following symlinks.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let resolved = self.resolve(path.as_ref())?;
        match self.nodes.borrow().get(&resolved) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// All paths currently present, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.nodes.borrow().keys().cloned().collect()
    }

    fn add_parents(&self, path: &Path) {
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }

    /// Follow symlinks (bounded) to the final node path.
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let nodes = self.nodes.borrow();
        let mut current = normalize(path);
        for _ in 0..40 {
            match nodes.get(&current)? {
                Node::Symlink(raw) => current = resolve_link(&current, raw),
                _ => return Some(current),
            }
        }
        None
    }

    fn check_writable(&self, path: &Path) -> io::Result<()> {
        let denied = self
            .read_only
            .borrow()
            .iter()
            .any(|dir| path.starts_with(dir));
        if denied {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{}: permission denied", path.display()),
            ));
        }
        Ok(())
    }

    fn check_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                match self.resolve(parent).and_then(|p| self.nodes.borrow().get(&p).cloned()) {
                    Some(Node::Dir) => Ok(()),
                    Some(_) => Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("{}: not a directory", parent.display()),
                    )),
                    None => Err(not_found(parent)),
                }
            }
            _ => Ok(()),
        }
    }

    fn insert(&self, path: &Path, node: Node) -> io::Result<()> {
        self.check_writable(path)?;
        self.check_parent(path)?;
        self.nodes.borrow_mut().insert(path.to_path_buf(), node);
        Ok(())
    }
}

impl InstallFs for MemoryFs {
    fn glob(&self, root: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let root = normalize(root);
        let nodes = self.nodes.borrow();
        let out = nodes
            .keys()
            .filter_map(|p| {
                let rel = p.strip_prefix(&root).ok()?;
                if rel.as_os_str().is_empty() {
                    return None;
                }
                pattern.matches_path_with(rel, super::GLOB_OPTIONS).then(|| p.clone())
            })
            .collect();
        Ok(out)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        let mut missing = Vec::new();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            match self.nodes.borrow().get(ancestor) {
                Some(Node::Dir) => break,
                Some(_) => return Err(already_exists(ancestor)),
                None => missing.push(ancestor.to_path_buf()),
            }
        }
        for dir in missing.into_iter().rev() {
            self.check_writable(&dir)?;
            self.nodes.borrow_mut().insert(dir, Node::Dir);
        }
        Ok(())
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> io::Result<Vec<PathBuf>> {
        let from = normalize(from);
        let to = normalize(to);
        let subtree: Vec<(PathBuf, Node)> = {
            let nodes = self.nodes.borrow();
            if !nodes.contains_key(&from) {
                return Err(not_found(&from));
            }
            nodes
                .range(from.clone()..)
                .take_while(|(p, _)| p.starts_with(&from))
                .map(|(p, n)| (p.clone(), n.clone()))
                .collect()
        };

        let mut written = Vec::new();
        for (path, node) in subtree {
            let rel = path.strip_prefix(&from).unwrap_or(Path::new(""));
            let dest = if rel.as_os_str().is_empty() {
                to.clone()
            } else {
                to.join(rel)
            };
            match node {
                Node::Dir => self.create_dir_all(&dest)?,
                other => {
                    if let Some(parent) = dest.parent() {
                        self.create_dir_all(parent)?;
                    }
                    self.insert(&dest, other)?;
                    written.push(dest);
                }
            }
        }
        Ok(written)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        let resolved = self.resolve(path).ok_or_else(|| not_found(path))?;
        self.check_writable(&resolved)?;
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(&resolved) {
            Some(Node::File { mode: m, .. }) => {
                *m = mode;
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(not_found(path)),
        }
    }

    fn mode(&self, path: &Path) -> io::Result<u32> {
        let resolved = self.resolve(path).ok_or_else(|| not_found(path))?;
        match self.nodes.borrow().get(&resolved) {
            Some(Node::File { mode, .. }) => Ok(*mode),
            Some(_) => Ok(0o755),
            None => Err(not_found(path)),
        }
    }

    fn entry(&self, path: &Path) -> Option<EntryKind> {
        match self.nodes.borrow().get(&normalize(path))? {
            Node::File { .. } => Some(EntryKind::File),
            Node::Dir => Some(EntryKind::Dir),
            Node::Symlink(raw) => Some(EntryKind::Symlink(raw.clone())),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let link = normalize(link);
        if self.nodes.borrow().contains_key(&link) {
            return Err(already_exists(&link));
        }
        self.insert(&link, Node::Symlink(target.to_path_buf()))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        self.check_writable(&path)?;
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get(&path) {
            Some(Node::Dir) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{}: is a directory", path.display()),
            )),
            Some(_) => {
                nodes.remove(&path);
                Ok(())
            }
            None => Err(not_found(&path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        self.check_writable(&path)?;
        let mut nodes = self.nodes.borrow_mut();
        if !nodes.contains_key(&path) {
            return Err(not_found(&path));
        }
        nodes.retain(|p, _| !p.starts_with(&path));
        Ok(())
    }

    fn remove_dir_if_empty(&self, path: &Path) -> io::Result<bool> {
        let path = normalize(path);
        let has_children = {
            let nodes = self.nodes.borrow();
            if !matches!(nodes.get(&path), Some(Node::Dir)) {
                return Err(not_found(&path));
            }
            nodes.keys().any(|p| p != &path && p.starts_with(&path))
        };
        if has_children {
            return Ok(false);
        }
        self.check_writable(&path)?;
        self.nodes.borrow_mut().remove(&path);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_top_level_only_and_skips_dotfiles() {
        let fs = MemoryFs::new();
        fs.add_file("/stage/tool", b"x".to_vec(), 0o644);
        fs.add_file("/stage/share/doc", b"d".to_vec(), 0o644);
        fs.add_file("/stage/.DS_Store", b"".to_vec(), 0o644);
        let got = fs.glob(Path::new("/stage"), "*").unwrap();
        assert_eq!(
            got,
            vec![PathBuf::from("/stage/share"), PathBuf::from("/stage/tool")]
        );
        let nested = fs.glob(Path::new("/stage"), "share/*").unwrap();
        assert_eq!(nested, vec![PathBuf::from("/stage/share/doc")]);
    }

    #[test]
    fn copy_tree_copies_subtree_and_modes() {
        let fs = MemoryFs::new();
        fs.add_file("/stage/share/doc", b"d".to_vec(), 0o600);
        fs.add_file("/stage/shared", b"not me".to_vec(), 0o600);
        assert_eq!(
            fs.copy_tree(Path::new("/stage/missing"), Path::new("/lib/x/missing"))
                .unwrap_err()
                .kind(),
            io::ErrorKind::NotFound
        );
        let written = fs
            .copy_tree(Path::new("/stage/share"), Path::new("/lib/x/share"))
            .unwrap();
        assert_eq!(written, vec![PathBuf::from("/lib/x/share/doc")]);
        assert_eq!(fs.read("/lib/x/share/doc").unwrap(), b"d");
        assert_eq!(fs.mode(Path::new("/lib/x/share/doc")).unwrap(), 0o600);
    }

    #[test]
    fn symlinks_resolve_for_mode_and_read() {
        let fs = MemoryFs::new();
        fs.add_file("/p/lib/t/1/tool", b"elf".to_vec(), 0o755);
        fs.add_dir("/p/bin");
        fs.symlink(Path::new("../lib/t/1/tool"), Path::new("/p/bin/t"))
            .unwrap();
        assert_eq!(fs.read("/p/bin/t").unwrap(), b"elf");
        assert_eq!(fs.mode(Path::new("/p/bin/t")).unwrap(), 0o755);
        assert_eq!(
            fs.entry(Path::new("/p/bin/t")),
            Some(EntryKind::Symlink(PathBuf::from("../lib/t/1/tool")))
        );
        assert_eq!(
            fs.symlink(Path::new("x"), Path::new("/p/bin/t"))
                .unwrap_err()
                .kind(),
            io::ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn deny_writes_yields_permission_denied() {
        let fs = MemoryFs::new();
        fs.add_file("/p/lib/tool", b"x".to_vec(), 0o644);
        fs.deny_writes("/p/lib");
        assert_eq!(
            fs.set_mode(Path::new("/p/lib/tool"), 0o755)
                .unwrap_err()
                .kind(),
            io::ErrorKind::PermissionDenied
        );
    }

    #[test]
    fn remove_dir_helpers() {
        let fs = MemoryFs::new();
        fs.add_file("/p/lib/x/1/tool", b"x".to_vec(), 0o755);
        assert!(!fs.remove_dir_if_empty(Path::new("/p/lib/x")).unwrap());
        fs.remove_dir_all(Path::new("/p/lib/x/1")).unwrap();
        assert!(fs.remove_dir_if_empty(Path::new("/p/lib/x")).unwrap());
        assert_eq!(fs.entry(Path::new("/p/lib/x")), None);
    }
}
