use thiserror::Error;

use crate::explorer::node::Node;

/// Generous multiple of any realistic directory depth. An upward walk that
/// exceeds it has hit a cycle or a dangling parent link.
pub const WALK_BUDGET: usize = 256;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("ancestor walk from offset {start} exceeded {WALK_BUDGET} steps, the tree is corrupt")]
    WalkBudgetExceeded { start: u32 },
}

/// The immutable node arena for one game installation. Offset 0 is the
/// synthetic meta root; everything else hangs off it. Built once per
/// installation, replaced wholesale on reload, and therefore safe for
/// lock-free concurrent reads.
pub struct NodeTree {
    nodes: Vec<Node>,
}

impl NodeTree {
    pub(crate) fn from_nodes(nodes: Vec<Node>) -> Self {
        debug_assert!(!nodes.is_empty(), "a tree always carries its synthetic root");
        debug_assert!(nodes[0].parent == Node::NO_PARENT);
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, offset: u32) -> Option<&Node> {
        self.nodes.get(offset as usize)
    }

    /// Inverse of [`NodeTree::node`]: the arena is contiguous, so the offset
    /// falls out of the reference's position within it. Returns `None` for a
    /// node that does not live in this tree.
    pub fn offset_of(&self, node: &Node) -> Option<u32> {
        let base = self.nodes.as_ptr() as usize;
        let addr = node as *const Node as usize;
        let delta = addr.checked_sub(base)?;
        if delta % std::mem::size_of::<Node>() != 0 {
            return None;
        }
        let index = delta / std::mem::size_of::<Node>();
        (index < self.nodes.len()).then_some(index as u32)
    }

    pub fn parent_of(&self, node: &Node) -> Option<&Node> {
        if node.parent < 0 {
            return None;
        }
        self.node(node.parent as u32)
    }

    /// Name of the package (or meta root) the node belongs to, found by
    /// walking the parent links upward.
    pub fn node_package<'a>(&'a self, node: &'a Node) -> Result<&'a str, TreeError> {
        let start = self.offset_of(node).unwrap_or(u32::MAX);
        let mut current = node;
        for _ in 0..WALK_BUDGET {
            if current.is_package_boundary() {
                return Ok(&current.name);
            }
            match self.parent_of(current) {
                Some(parent) => current = parent,
                // above the root without hitting a package: dangling link
                None => return Err(TreeError::WalkBudgetExceeded { start }),
            }
        }
        Err(TreeError::WalkBudgetExceeded { start })
    }

    /// The node's path below its package boundary, `\` separated like the
    /// archive listfiles. The boundary itself is not part of the path.
    pub fn node_file_path(&self, node: &Node) -> Result<String, TreeError> {
        let start = self.offset_of(node).unwrap_or(u32::MAX);
        let mut path = node.name.clone();
        let mut current = node;
        for _ in 0..WALK_BUDGET {
            let Some(parent) = self.parent_of(current) else {
                return Err(TreeError::WalkBudgetExceeded { start });
            };
            if parent.is_package_boundary() {
                return Ok(path);
            }
            if parent.is_directory() {
                path = format!("{}\\{}", parent.name, path);
            } else {
                path = format!("{}{}", parent.name, path);
            }
            current = parent;
        }
        Err(TreeError::WalkBudgetExceeded { start })
    }

    /// Resolves an archive-style path (`Creature\Chicken\Chicken.m2`) to a
    /// node offset, trying every package in mount-priority order. Matching is
    /// case-insensitive like the MPQ file tables.
    pub fn node_by_path(&self, path: &str) -> Option<u32> {
        let segments: Vec<&str> = path.split('\\').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return None;
        }

        'packages: for &package_offset in &self.root().children {
            let mut current = self.node(package_offset)?;
            let mut offset = package_offset;
            for segment in &segments {
                let child = current.children.iter().find(|&&child_offset| {
                    self.node(child_offset)
                        .map(|child| child.name.eq_ignore_ascii_case(segment))
                        .unwrap_or(false)
                });
                match child {
                    Some(&child_offset) => {
                        offset = child_offset;
                        current = self.node(child_offset)?;
                    }
                    None => continue 'packages,
                }
            }
            return Some(offset);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::node::NodeType;

    /// meta root → package "base.MPQ" → dir "World" → file "map.blp"
    fn sample_tree() -> NodeTree {
        NodeTree::from_nodes(vec![
            Node {
                node_type: NodeType::META,
                name: "Wrath 3.3.5a".to_string(),
                parent: Node::NO_PARENT,
                children: vec![1],
            },
            Node {
                node_type: NodeType::PACKAGE,
                name: "base.MPQ".to_string(),
                parent: 0,
                children: vec![2],
            },
            Node {
                node_type: NodeType::DIRECTORY,
                name: "World".to_string(),
                parent: 1,
                children: vec![3],
            },
            Node {
                node_type: NodeType::FILE | NodeType::IMAGE,
                name: "map.blp".to_string(),
                parent: 2,
                children: vec![],
            },
        ])
    }

    #[test]
    fn offset_roundtrip() {
        let tree = sample_tree();
        for offset in 0..tree.len() as u32 {
            let node = tree.node(offset).unwrap();
            assert_eq!(tree.offset_of(node), Some(offset));
        }
    }

    #[test]
    fn offset_of_rejects_foreign_nodes() {
        let tree = sample_tree();
        let foreign = Node {
            node_type: NodeType::FILE,
            name: "other".to_string(),
            parent: 0,
            children: vec![],
        };
        assert_eq!(tree.offset_of(&foreign), None);
    }

    #[test]
    fn package_resolution_walks_to_the_boundary() {
        let tree = sample_tree();
        let file = tree.node(3).unwrap();
        assert_eq!(tree.node_package(file).unwrap(), "base.MPQ");

        // a package node resolves to itself
        let package = tree.node(1).unwrap();
        assert_eq!(tree.node_package(package).unwrap(), "base.MPQ");
    }

    #[test]
    fn file_path_separates_below_directories_only() {
        let tree = sample_tree();
        let file = tree.node(3).unwrap();
        assert_eq!(tree.node_file_path(file).unwrap(), "World\\map.blp");

        let dir = tree.node(2).unwrap();
        assert_eq!(tree.node_file_path(dir).unwrap(), "World");
    }

    #[test]
    fn cyclic_parents_hit_the_walk_budget() {
        // two directories pointing at each other, below no package
        let tree = NodeTree::from_nodes(vec![
            Node {
                node_type: NodeType::META,
                name: "root".to_string(),
                parent: Node::NO_PARENT,
                children: vec![],
            },
            Node {
                node_type: NodeType::DIRECTORY,
                name: "a".to_string(),
                parent: 2,
                children: vec![2],
            },
            Node {
                node_type: NodeType::DIRECTORY,
                name: "b".to_string(),
                parent: 1,
                children: vec![1],
            },
        ]);

        let node = tree.node(1).unwrap();
        assert!(matches!(
            tree.node_package(node),
            Err(TreeError::WalkBudgetExceeded { start: 1 })
        ));
        assert!(tree.node_file_path(node).is_err());
    }

    #[test]
    fn path_lookup_is_case_insensitive() {
        let tree = sample_tree();
        assert_eq!(tree.node_by_path("WORLD\\MAP.BLP"), Some(3));
        assert_eq!(tree.node_by_path("World"), Some(2));
        assert_eq!(tree.node_by_path("World\\missing.blp"), None);
        assert_eq!(tree.node_by_path(""), None);
    }
}
