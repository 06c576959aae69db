use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::InspectError;
use crate::models::PackageNode;

/// Directory holding installed dependencies.
pub const MODULES_DIR: &str = "node_modules";

/// A package's node (with empty `deps`) and the dependency specifiers it declares.
pub struct Visited {
    pub node: PackageNode,
    pub dependencies: Vec<String>,
}

/// Builds the per-package part of the tree while the resolver walks the graph.
pub trait Visitor {
    /// `declared_name` is `None` for the root package.
    fn visit(&mut self, declared_name: Option<&str>, location: &Path) -> Visited;
}

/// Find the installed location of dependency `name` as seen from `from`.
///
/// Looks in `<from>/node_modules/<name>` first, then in the `node_modules`
/// directory of every ancestor up to the filesystem root, skipping ancestors
/// that are themselves `node_modules` directories. `name` must be a plain
/// package name, optionally `@scope/`-prefixed.
pub fn locate(from: &Path, name: &str) -> Result<PathBuf, InspectError> {
    let unresolved = || InspectError::DependencyUnresolved {
        name: name.to_string(),
        from: from.to_path_buf(),
    };
    if !is_package_name(name) {
        return Err(unresolved());
    }

    for dir in from.ancestors() {
        if dir.file_name().is_some_and(|n| n == MODULES_DIR) {
            continue;
        }
        let candidate = dir.join(MODULES_DIR).join(name);
        if candidate.is_dir() {
            return Ok(candidate);
        }
    }

    Err(unresolved())
}

/// `name` or `@scope/name`, with no empty, `.` or `..` segments.
fn is_package_name(name: &str) -> bool {
    let segment_ok = |s: &str| !s.is_empty() && s != "." && s != ".." && !s.contains('\\');
    match name.split_once('/') {
        Some((scope, rest)) => {
            scope.starts_with('@') && segment_ok(&scope[1..]) && !rest.contains('/') && segment_ok(rest)
        }
        None => !name.starts_with('@') && segment_ok(name),
    }
}

/// Identity of a location for cycle detection; symlinked installs collapse
/// onto their target.
fn identity(location: &Path) -> PathBuf {
    std::fs::canonicalize(location).unwrap_or_else(|_| location.to_path_buf())
}

struct Slot {
    node: PackageNode,
    children: Vec<usize>,
}

/// A package on the active path whose dependencies are still being resolved.
struct Frame {
    /// Arena index, `None` for the root.
    slot: Option<usize>,
    key: PathBuf,
    location: PathBuf,
    pending: std::vec::IntoIter<String>,
}

/// Walk the dependency graph from `root` and return the assembled tree.
///
/// The walk is an explicit depth-first worklist over an arena of nodes, so
/// deep graphs do not grow the native stack. A dependency that resolves to a
/// location already on the active path becomes a leaf. The same location
/// reached from two independent branches is expanded under each of them.
/// Specifiers that resolve nowhere are dropped from their parent's `deps`.
pub fn resolve(root: &Path, visitor: &mut impl Visitor) -> PackageNode {
    let Visited {
        node: mut root_node,
        dependencies,
    } = visitor.visit(None, root);

    let mut arena: Vec<Slot> = Vec::new();
    let mut root_children: Vec<usize> = Vec::new();
    let mut active: HashSet<PathBuf> = HashSet::new();

    let root_key = identity(root);
    active.insert(root_key.clone());
    let mut stack = vec![Frame {
        slot: None,
        key: root_key,
        location: root.to_path_buf(),
        pending: dependencies.into_iter(),
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(name) = frame.pending.next() else {
            if let Some(done) = stack.pop() {
                active.remove(&done.key);
            }
            continue;
        };
        let parent = frame.slot;

        let location = match locate(&frame.location, &name) {
            Ok(location) => location,
            Err(err) => {
                debug!(%err, "skipping dependency");
                continue;
            }
        };

        let visited = visitor.visit(Some(&name), &location);
        let index = arena.len();
        arena.push(Slot {
            node: visited.node,
            children: Vec::new(),
        });
        match parent {
            Some(p) => arena[p].children.push(index),
            None => root_children.push(index),
        }

        let key = identity(&location);
        if active.contains(&key) {
            debug!(package = %name, location = %location.display(), "dependency cycle, not descending");
            continue;
        }
        active.insert(key.clone());
        stack.push(Frame {
            slot: Some(index),
            key,
            location,
            pending: visited.dependencies.into_iter(),
        });
    }

    // Children always sit after their parent in the arena, so a reverse pass
    // sees every subtree finished before its parent needs it.
    let mut built: Vec<Option<PackageNode>> = (0..arena.len()).map(|_| None).collect();
    for (index, slot) in arena.into_iter().enumerate().rev() {
        let mut node = slot.node;
        node.deps = slot
            .children
            .into_iter()
            .filter_map(|child| built[child].take())
            .collect();
        built[index] = Some(node);
    }

    root_node.deps = root_children
        .into_iter()
        .filter_map(|child| built[child].take())
        .collect();
    root_node
}
