use crate::paths;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};

/// The filesystem operations linking needs. Existence doubles as the "already linked" ledger.
pub trait LinkFs {
    /// Whether anything occupies `path`. Links are not followed, so a dangling link exists.
    fn exists(&self, path: &Path) -> bool;
    fn is_symlink(&self, path: &Path) -> bool;
    /// Create one directory; the parent must already exist.
    fn create_dir(&self, path: &Path) -> io::Result<()>;
    /// Create a symbolic link at `link` whose stored target is `target`, verbatim.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiskFs;

impl LinkFs for DiskFs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, link)
    }

    #[cfg(windows)]
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::windows::fs::symlink_file(target, link)
    }

    #[cfg(not(any(unix, windows)))]
    fn symlink(&self, _target: &Path, _link: &Path) -> io::Result<()> {
        Err(io::Error::new(
            ErrorKind::Unsupported,
            "symbolic links are not supported on this platform",
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Dir,
    File,
    Link(PathBuf),
}

/// In-memory stand-in for `DiskFs`. Paths are normalized lexically and the root always exists.
#[derive(Debug, Default)]
pub struct MemoryFs {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `path` and any missing parents.
    pub fn add_dir_all(&self, path: &Path) {
        let path = paths::normalize(path);
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in path.ancestors() {
            if is_anchor(ancestor) {
                continue;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
    }

    pub fn add_file(&self, path: &Path) {
        let path = paths::normalize(path);
        if let Some(parent) = path.parent() {
            self.add_dir_all(parent);
        }
        self.nodes.borrow_mut().insert(path, Node::File);
    }

    pub fn add_symlink(&self, target: &Path, link: &Path) {
        let link = paths::normalize(link);
        if let Some(parent) = link.parent() {
            self.add_dir_all(parent);
        }
        self.nodes
            .borrow_mut()
            .insert(link, Node::Link(target.to_path_buf()));
    }

    pub fn node(&self, path: &Path) -> Option<Node> {
        self.nodes.borrow().get(&paths::normalize(path)).cloned()
    }

    pub fn read_link(&self, path: &Path) -> Option<PathBuf> {
        match self.node(path) {
            Some(Node::Link(target)) => Some(target),
            _ => None,
        }
    }

    /// Where the link at `path` points, resolved against its own directory.
    pub fn resolve_link(&self, path: &Path) -> Option<PathBuf> {
        let target = self.read_link(path)?;
        let parent = path.parent()?;
        Some(paths::normalize(&parent.join(target)))
    }

    /// All links currently stored, keyed by link path.
    pub fn links(&self) -> BTreeMap<PathBuf, PathBuf> {
        self.nodes
            .borrow()
            .iter()
            .filter_map(|(path, node)| match node {
                Node::Link(target) => Some((path.clone(), target.clone())),
                _ => None,
            })
            .collect()
    }

    fn parent_is_dir(&self, path: &Path) -> bool {
        match path.parent() {
            None => true,
            Some(parent) if is_anchor(parent) => true,
            Some(parent) => matches!(self.nodes.borrow().get(parent), Some(Node::Dir)),
        }
    }

    fn check_vacant(&self, path: &Path) -> io::Result<()> {
        if self.nodes.borrow().contains_key(path) || is_anchor(path) {
            return Err(io::Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", path.display()),
            ));
        }
        if !self.parent_is_dir(path) {
            return Err(io::Error::new(
                ErrorKind::NotFound,
                format!("parent of {} is not a directory", path.display()),
            ));
        }
        Ok(())
    }
}

impl LinkFs for MemoryFs {
    fn exists(&self, path: &Path) -> bool {
        let path = paths::normalize(path);
        is_anchor(&path) || self.nodes.borrow().contains_key(&path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        matches!(self.node(path), Some(Node::Link(_)))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        let path = paths::normalize(path);
        self.check_vacant(&path)?;
        self.nodes.borrow_mut().insert(path, Node::Dir);
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let link = paths::normalize(link);
        self.check_vacant(&link)?;
        self.nodes
            .borrow_mut()
            .insert(link, Node::Link(target.to_path_buf()));
        Ok(())
    }
}

fn is_anchor(path: &Path) -> bool {
    path.as_os_str().is_empty()
        || path
            .components()
            .all(|c| matches!(c, Component::RootDir | Component::Prefix(_)))
}
