//! # Virtual Tree Cache
//!
//! The namespace of a transformed mount: a hierarchical tree for directory
//! listings and a flat reverse index from virtual path to real path.
//!
//! ## Responsibility
//! - Build the namespace once from rule sets and enumerated real paths
//! - Answer listing and resolution queries, lock-free, once built
//!
//! ## Layout
//!
//! Nodes live in an arena (`Vec<Node>`); interior nodes refer to children by
//! [`NodeId`]. Node 0 is the mount root.
//!
//! ```text
//! TreeBuilder ──add_volume()──▶ TreeBuilder ──build()──▶ VirtualTree (immutable)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use remapfs::{Rule, RuleSet, TreeBuilder};
//! use std::path::{Path, PathBuf};
//!
//! let rules = RuleSet::from_rules(vec![Rule::new(r"/src/(\w+)/(\w+)\.txt", "$2/$1.txt").unwrap()]);
//! let mut builder = TreeBuilder::new();
//! builder.add_volume(&rules, vec![PathBuf::from("/src/notes/today.txt")]);
//! let tree = builder.build();
//!
//! assert_eq!(tree.list_children("/"), vec!["today"]);
//! assert_eq!(tree.resolve("/today/notes.txt"), Some(Path::new("/src/notes/today.txt")));
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::RuleSet;

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

const ROOT: NodeId = NodeId(0);

/// A node of the virtual tree.
#[derive(Debug, Clone)]
pub enum Node {
    /// A virtual directory.
    Interior {
        /// Child nodes by segment name.
        children: HashMap<String, NodeId>,
    },
    /// A virtual file backed by a real one.
    Leaf {
        /// Real path the virtual file resolves to.
        source: PathBuf,
    },
}

impl Node {
    fn dir() -> Self {
        Node::Interior {
            children: HashMap::new(),
        }
    }
}

/// Result of an exact lookup in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    /// A virtual directory with no real counterpart.
    Directory,
    /// A virtual file and its real path.
    File(&'a Path),
}

/// Immutable virtual namespace of one transformed mount.
///
/// Built by [`TreeBuilder`]. Has no mutating methods, so it can be shared
/// across operation threads without locking.
#[derive(Debug, Clone)]
pub struct VirtualTree {
    nodes: Vec<Node>,
    index: HashMap<String, PathBuf>,
}

impl Default for VirtualTree {
    fn default() -> Self {
        Self {
            nodes: vec![Node::dir()],
            index: HashMap::new(),
        }
    }
}

impl VirtualTree {
    /// Names of the immediate children of `virtual_path`.
    ///
    /// `"/"` lists the mount root. The path is walked segment by segment,
    /// skipping empty segments. When a segment is missing, or names a file,
    /// the walk stops and the children of the deepest directory reached are
    /// returned: a listing of a path that does not exist degrades to the
    /// listing of its nearest existing ancestor.
    pub fn list_children(&self, virtual_path: &str) -> Vec<&str> {
        match &self.nodes[self.nearest_dir(virtual_path).0] {
            Node::Interior { children } => children.keys().map(String::as_str).collect(),
            Node::Leaf { .. } => Vec::new(),
        }
    }

    /// Like [`list_children`](Self::list_children), with each child's entry.
    pub fn list_entries(&self, virtual_path: &str) -> Vec<(&str, Entry<'_>)> {
        match &self.nodes[self.nearest_dir(virtual_path).0] {
            Node::Interior { children } => children
                .iter()
                .map(|(name, id)| (name.as_str(), self.entry(*id)))
                .collect(),
            Node::Leaf { .. } => Vec::new(),
        }
    }

    /// Real path of the virtual file at `virtual_path`.
    ///
    /// One leading `/` is stripped; the rest must match an indexed virtual
    /// path exactly. `None` means the path does not exist in this namespace.
    pub fn resolve(&self, virtual_path: &str) -> Option<&Path> {
        let key = virtual_path.strip_prefix('/').unwrap_or(virtual_path);
        self.index.get(key).map(PathBuf::as_path)
    }

    /// Exact lookup, without the ancestor fallback of [`list_children`](Self::list_children).
    pub fn lookup(&self, virtual_path: &str) -> Option<Entry<'_>> {
        let mut current = ROOT;
        for segment in segments(virtual_path) {
            current = self.child(current, segment)?;
        }
        Some(self.entry(current))
    }

    /// Number of virtual files.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no real path matched any rule.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Iterate `(virtual path, real path)` pairs in no particular order.
    pub fn files(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.index
            .iter()
            .map(|(virtual_path, source)| (virtual_path.as_str(), source.as_path()))
    }

    /// Deepest directory reached walking `virtual_path` from the root.
    fn nearest_dir(&self, virtual_path: &str) -> NodeId {
        let mut current = ROOT;
        for segment in segments(virtual_path) {
            match self.child(current, segment) {
                Some(id) if matches!(self.nodes[id.0], Node::Interior { .. }) => current = id,
                _ => break,
            }
        }
        current
    }

    fn entry(&self, id: NodeId) -> Entry<'_> {
        match &self.nodes[id.0] {
            Node::Interior { .. } => Entry::Directory,
            Node::Leaf { source } => Entry::File(source),
        }
    }

    fn child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        match &self.nodes[parent.0] {
            Node::Interior { children } => children.get(name).copied(),
            Node::Leaf { .. } => None,
        }
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Single-threaded builder for a [`VirtualTree`].
///
/// When two real paths map to the same virtual path the later insertion
/// wins. The same holds when a file and a directory compete for one name:
/// whatever is displaced leaves the reverse index too.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    tree: VirtualTree,
}

impl TreeBuilder {
    /// Builder holding an empty root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every real path some rule of `rules` matches.
    ///
    /// Returns the number of paths inserted. Paths that are not valid UTF-8
    /// cannot be matched against rules and are skipped.
    pub fn add_volume<I>(&mut self, rules: &RuleSet, paths: I) -> usize
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut inserted = 0;
        let mut excluded = 0;
        for source in paths {
            let Some(real) = source.to_str() else {
                tracing::warn!(path = %source.display(), "skipping non UTF-8 path");
                continue;
            };
            match rules.apply(real) {
                Some(virtual_path) => {
                    if self.insert(&virtual_path, source) {
                        inserted += 1;
                    }
                }
                None => excluded += 1,
            }
        }
        tracing::info!(inserted, excluded, "volume added to virtual tree");
        inserted
    }

    /// Map `virtual_path` to `source`, creating directories on the way.
    ///
    /// Returns `false` if the virtual path has no segments.
    pub fn insert(&mut self, virtual_path: &str, source: PathBuf) -> bool {
        let parts: Vec<&str> = segments(virtual_path).collect();
        let Some((name, parents)) = parts.split_last() else {
            tracing::warn!(virtual_path, source = %source.display(), "empty virtual path");
            return false;
        };

        let mut current = ROOT;
        for depth in 0..parents.len() {
            current = self.descend(current, parents[depth], &parts[..=depth].join("/"));
        }

        let key = parts.join("/");
        match self.tree.child(current, name) {
            Some(id) => {
                match &self.tree.nodes[id.0] {
                    Node::Leaf { source: previous } => tracing::debug!(
                        virtual_path = %key,
                        previous = %previous.display(),
                        source = %source.display(),
                        "file replaces file"
                    ),
                    Node::Interior { .. } => tracing::debug!(
                        virtual_path = %key,
                        source = %source.display(),
                        "file replaces directory"
                    ),
                }
                self.evict(id, &key);
                self.tree.nodes[id.0] = Node::Leaf {
                    source: source.clone(),
                };
            }
            None => {
                self.attach(
                    current,
                    name,
                    Node::Leaf {
                        source: source.clone(),
                    },
                );
            }
        }
        self.tree.index.insert(key, source);
        true
    }

    /// Freeze the namespace.
    pub fn build(self) -> VirtualTree {
        self.tree
    }

    /// The interior child `name` of `parent`, created or converted if needed.
    fn descend(&mut self, parent: NodeId, name: &str, key: &str) -> NodeId {
        match self.tree.child(parent, name) {
            Some(id) => {
                if let Node::Leaf { source } = &self.tree.nodes[id.0] {
                    tracing::debug!(
                        virtual_path = key,
                        source = %source.display(),
                        "directory replaces file"
                    );
                    self.tree.index.remove(key);
                    self.tree.nodes[id.0] = Node::dir();
                }
                id
            }
            None => self.attach(parent, name, Node::dir()),
        }
    }

    fn attach(&mut self, parent: NodeId, name: &str, node: Node) -> NodeId {
        let id = NodeId(self.tree.nodes.len());
        self.tree.nodes.push(node);
        if let Node::Interior { children } = &mut self.tree.nodes[parent.0] {
            children.insert(name.to_owned(), id);
        }
        id
    }

    /// Drop the reverse-index entries of every file at or under `id`.
    fn evict(&mut self, id: NodeId, key: &str) {
        let mut pending = vec![(id, key.to_owned())];
        while let Some((id, path)) = pending.pop() {
            match &self.tree.nodes[id.0] {
                Node::Leaf { .. } => {
                    self.tree.index.remove(&path);
                }
                Node::Interior { children } => {
                    pending.extend(
                        children
                            .iter()
                            .map(|(name, &child)| (child, format!("{path}/{name}"))),
                    );
                }
            }
        }
    }
}
