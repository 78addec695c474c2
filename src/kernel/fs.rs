//! In-memory filesystem.
//!
//! A tree of named nodes, backed by the kernel's own allocator rather than
//! any notion of a block device: `mkdir`/`touch` allocate nodes, `write`
//! allocates file content, `rm`/`rmdir` free them. Nothing survives a
//! reboot.
//!
//! Nodes live in a flat arena (`Vec<Option<Node>>`) addressed by index
//! rather than through parent/child pointers, so the root's `..` can be a
//! plain `Option<NodeId>` instead of a true self-cycle: root's parent is
//! `None`, and resolving `..` at the root clamps to the root.

use crate::{architecture::SpinLock, kernel::Mutex};
use alloc::{string::String, vec::Vec};

type NodeId = usize;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    File,
    Dir,
}

struct Node {
    name: String,
    kind: Kind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: Vec<u8>,
}

impl Node {
    fn dir(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: String::from(name),
            kind: Kind::Dir,
            parent,
            children: Vec::new(),
            data: Vec::new(),
        }
    }

    fn file(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: String::from(name),
            kind: Kind::File,
            parent,
            children: Vec::new(),
            data: Vec::new(),
        }
    }
}

struct FsState {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    cwd: NodeId,
}

impl FsState {
    fn new() -> Self {
        let root = Node::dir("/", None);
        Self {
            nodes: alloc::vec![Some(root)],
            root: 0,
            cwd: 0,
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id].as_ref().expect("dangling node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id].as_mut().expect("dangling node id")
    }

    fn alloc_node(&mut self, node: Node) -> NodeId {
        for (id, slot) in self.nodes.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(node);
                return id;
            }
        }
        self.nodes.push(Some(node));
        self.nodes.len() - 1
    }

    fn find_child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.node(dir)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).name == name)
    }

    /// Resolves a path, relative to `cwd` unless it starts with `/`.
    /// `..` at the root clamps in place rather than wrapping.
    fn resolve(&self, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return Some(self.cwd);
        }
        let mut cur = if path.starts_with('/') { self.root } else { self.cwd };
        for component in path.split('/').filter(|c| !c.is_empty()) {
            cur = match component {
                "." => cur,
                ".." => self.node(cur).parent.unwrap_or(self.root),
                name => self.find_child(cur, name)?,
            };
        }
        Some(cur)
    }

    /// Splits `path` into its parent directory and final-component name,
    /// without requiring the final component to already exist.
    fn resolve_parent(&self, path: &str) -> Option<(NodeId, String)> {
        let (dir_part, base) = match path.rsplit_once('/') {
            Some((dir, base)) => (dir, base),
            None => ("", path),
        };
        if base.is_empty() {
            return None;
        }
        let parent = if dir_part.is_empty() {
            if path.starts_with('/') {
                self.root
            } else {
                self.cwd
            }
        } else {
            self.resolve(dir_part)?
        };
        Some((parent, String::from(base)))
    }

    fn path_of(&self, mut id: NodeId) -> String {
        let mut parts = Vec::new();
        while id != self.root {
            let node = self.node(id);
            parts.push(node.name.clone());
            id = match node.parent {
                Some(p) => p,
                None => break,
            };
        }
        parts.reverse();
        let mut out = String::from("/");
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push('/');
            }
            out.push_str(part);
        }
        out
    }
}

static FS: SpinLock<Option<FsState>> = SpinLock::new(None);

/// Builds the root directory. Must run once before any other `fs` call.
pub fn init() {
    FS.lock(|fs| *fs = Some(FsState::new()));
}

fn with_fs<R>(f: impl FnOnce(&mut FsState) -> R) -> R {
    FS.lock(|fs| f(fs.as_mut().expect("fs::init must run before fs use")))
}

/// Current working directory, as an absolute path string.
pub fn pwd() -> String {
    with_fs(|fs| fs.path_of(fs.cwd))
}

/// Changes the working directory. `None`/empty path means go to root.
pub fn cd(path: &str) -> Result<(), &'static str> {
    with_fs(|fs| {
        let target = fs.resolve(path).ok_or("cd: not found")?;
        if fs.node(target).kind != Kind::Dir {
            return Err("cd: not a directory");
        }
        fs.cwd = target;
        Ok(())
    })
}

pub fn mkdir(path: &str) -> Result<(), &'static str> {
    with_fs(|fs| {
        let (parent, name) = fs.resolve_parent(path).ok_or("mkdir: missing directory name")?;
        if fs.node(parent).kind != Kind::Dir {
            return Err("mkdir: parent directory not found");
        }
        if fs.find_child(parent, &name).is_some() {
            return Err("mkdir: already exists");
        }
        let id = fs.alloc_node(Node::dir(&name, Some(parent)));
        fs.node_mut(parent).children.push(id);
        Ok(())
    })
}

pub fn rmdir(path: &str) -> Result<(), &'static str> {
    with_fs(|fs| {
        let id = fs.resolve(path).ok_or("rmdir: not found")?;
        if id == fs.root {
            return Err("rmdir: cannot remove root");
        }
        if fs.node(id).kind != Kind::Dir {
            return Err("rmdir: not a directory");
        }
        if !fs.node(id).children.is_empty() {
            return Err("rmdir: directory not empty");
        }
        let parent = fs.node(id).parent.expect("non-root has a parent");
        fs.node_mut(parent).children.retain(|&c| c != id);
        if fs.cwd == id {
            fs.cwd = parent;
        }
        fs.nodes[id] = None;
        Ok(())
    })
}

pub fn touch(path: &str) -> Result<(), &'static str> {
    with_fs(|fs| {
        if fs.resolve(path).is_some() {
            return Ok(());
        }
        let (parent, name) = fs.resolve_parent(path).ok_or("touch: missing filename")?;
        if fs.node(parent).kind != Kind::Dir {
            return Err("touch: parent directory not found");
        }
        let id = fs.alloc_node(Node::file(&name, Some(parent)));
        fs.node_mut(parent).children.push(id);
        Ok(())
    })
}

pub fn write(path: &str, content: &[u8]) -> Result<(), &'static str> {
    touch(path)?;
    with_fs(|fs| {
        let id = fs.resolve(path).expect("just touched");
        if fs.node(id).kind != Kind::Dir {
            fs.node_mut(id).data = Vec::from(content);
            Ok(())
        } else {
            Err("write: not a file")
        }
    })
}

/// Returns a copy of the file's content, since the backing node lives
/// behind the filesystem lock.
pub fn read(path: &str) -> Result<Vec<u8>, &'static str> {
    with_fs(|fs| {
        let id = fs.resolve(path).ok_or("not found")?;
        let node = fs.node(id);
        if node.kind != Kind::File {
            return Err("not a file");
        }
        Ok(node.data.clone())
    })
}

pub fn rm(path: &str) -> Result<(), &'static str> {
    with_fs(|fs| {
        let id = fs.resolve(path).ok_or("rm: not found")?;
        if id == fs.root {
            return Err("rm: cannot remove root");
        }
        if fs.node(id).kind != Kind::File {
            return Err("rm: is a directory (use rmdir)");
        }
        let parent = fs.node(id).parent.expect("non-root has a parent");
        fs.node_mut(parent).children.retain(|&c| c != id);
        fs.nodes[id] = None;
        Ok(())
    })
}

/// Prints a directory listing, or a single line for a file path, to
/// serial output.
pub fn ls(path: &str) {
    with_fs(|fs| {
        let Some(id) = fs.resolve(path) else {
            crate::println!("ls: not found");
            return;
        };
        let node = fs.node(id);
        if node.kind == Kind::File {
            crate::println!("{}  ({} bytes)", node.name, node.data.len());
            return;
        }
        if node.children.is_empty() {
            crate::println!("(empty)");
            return;
        }
        for &child in &node.children {
            let c = fs.node(child);
            match c.kind {
                Kind::Dir => crate::println!("  {}/", c.name),
                Kind::File => crate::println!("  {}  ({} bytes)", c.name, c.data.len()),
            }
        }
    });
}
