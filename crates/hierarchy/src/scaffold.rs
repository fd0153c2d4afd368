use std::collections::{BTreeSet, HashMap};

use atlas_model::{Node, NodeId, NodeKind};

/// The levels above files: one Repo root plus one Package node per directory
/// that directly contains a supported file. Files in the repository root
/// attach straight to the Repo node.
#[derive(Debug)]
pub struct Scaffold {
    /// Repo node first, then packages in sorted path order.
    nodes: Vec<Node>,
    package_index: HashMap<String, usize>,
}

impl Scaffold {
    /// Derive the scaffold from the relative paths of every file the build
    /// will index. Paths are `/`-separated and relative to the repo root.
    #[must_use]
    pub fn new(repo_name: &str, file_paths: &[String]) -> Self {
        let repo = Node::new(NodeKind::Repo, ".", repo_name, None);
        let mut nodes = vec![repo];
        let mut package_index = HashMap::new();

        let dirs: BTreeSet<&str> = file_paths
            .iter()
            .filter_map(|p| dirname(p))
            .flat_map(ancestors)
            .collect();

        // BTreeSet order guarantees ancestors are inserted before their
        // subdirectories, so the parent lookup below always succeeds.
        for dir in dirs {
            let parent_idx = parent_package(&package_index, dir);
            let parent_id = nodes[parent_idx].id.clone();
            let name = dir.rsplit('/').next().unwrap_or(dir);

            let mut package = Node::new(NodeKind::Package, dir, name, None);
            package.parent = Some(parent_id);
            let id = package.id.clone();
            nodes.push(package);
            nodes[parent_idx].children.push(id);
            package_index.insert(dir.to_string(), nodes.len() - 1);
        }

        log::debug!(
            "scaffold: repo {repo_name} with {} packages",
            nodes.len() - 1
        );
        Self {
            nodes,
            package_index,
        }
    }

    #[must_use]
    pub fn repo_id(&self) -> &NodeId {
        &self.nodes[0].id
    }

    /// The node a file at `path` hangs under: its directory's package, or
    /// the repo root for top-level files.
    #[must_use]
    pub fn parent_for(&self, path: &str) -> &NodeId {
        match dirname(path).and_then(|d| self.package_index.get(d)) {
            Some(&idx) => &self.nodes[idx].id,
            None => self.repo_id(),
        }
    }

    /// Record `file_id` as a child of its directory's node. Call in sorted
    /// path order to keep child ordering deterministic.
    pub fn attach_file(&mut self, path: &str, file_id: NodeId) {
        let idx = dirname(path)
            .and_then(|d| self.package_index.get(d))
            .copied()
            .unwrap_or(0);
        self.nodes[idx].children.push(file_id);
    }

    /// Consume the scaffold into its node list, repo first.
    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

fn dirname(path: &str) -> Option<&str> {
    path.rfind('/').map(|i| &path[..i])
}

/// All ancestor directories of `dir`, including itself.
fn ancestors(dir: &str) -> Vec<&str> {
    let mut out = vec![dir];
    let mut cur = dir;
    while let Some(i) = cur.rfind('/') {
        cur = &cur[..i];
        out.push(cur);
    }
    out
}

fn parent_package(index: &HashMap<String, usize>, dir: &str) -> usize {
    let mut cur = dir;
    while let Some(i) = cur.rfind('/') {
        cur = &cur[..i];
        if let Some(&idx) = index.get(cur) {
            return idx;
        }
    }
    0
}
