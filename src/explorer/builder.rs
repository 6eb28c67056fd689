use itertools::Itertools;
use log::{debug, trace};

use crate::explorer::node::{Node, NodeType};
use crate::explorer::reference::FileKind;
use crate::explorer::tree::NodeTree;
use crate::io::mpq::loader::MPQPackageGroup;

/// Builds the immutable [`NodeTree`] for one installation. The arena grows
/// append-only, so offsets handed out during construction stay valid.
pub struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub fn new(installation_name: &str) -> Self {
        Self {
            nodes: vec![Node {
                node_type: NodeType::META,
                name: installation_name.to_string(),
                parent: Node::NO_PARENT,
                children: vec![],
            }],
        }
    }

    /// One tree per installation, one package per mounted archive, the
    /// hierarchy below from that archive's listfile.
    pub fn from_package_group(installation_name: &str, group: &MPQPackageGroup) -> NodeTree {
        let mut builder = TreeBuilder::new(installation_name);
        for (archive_name, listfile) in group.enumerate_listfiles() {
            let package = builder.add_package(&archive_name);
            let listing = String::from_utf8_lossy(&listfile);
            let mut count = 0usize;
            for line in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
                builder.add_path(package, line);
                count += 1;
            }
            debug!("Indexed {} listfile entries for {}", count, archive_name);
        }
        builder.build()
    }

    pub fn add_package(&mut self, name: &str) -> u32 {
        let offset = self.push_node(Node {
            node_type: NodeType::PACKAGE,
            name: name.to_string(),
            parent: 0,
            children: vec![],
        });
        self.nodes[0].children.push(offset);
        offset
    }

    /// Inserts one `\`-separated listfile path below the given package,
    /// creating missing directories and collapsing duplicates
    /// (case-insensitively, like the archive file tables).
    pub fn add_path(&mut self, package: u32, path: &str) -> u32 {
        let mut current = package;
        let segments = path.split('\\').filter(|s| !s.is_empty()).collect_vec();

        for (position, segment) in segments.iter().enumerate() {
            let is_leaf = position + 1 == segments.len();
            let existing = self.nodes[current as usize]
                .children
                .iter()
                .find(|&&child| self.nodes[child as usize].name.eq_ignore_ascii_case(segment))
                .copied();

            current = match existing {
                Some(child) => child,
                None => {
                    let node_type = if is_leaf {
                        NodeType::FILE | kind_flag(FileKind::from_path(segment))
                    } else {
                        NodeType::DIRECTORY
                    };
                    let offset = self.push_node(Node {
                        node_type,
                        name: segment.to_string(),
                        parent: current as i64,
                        children: vec![],
                    });
                    self.nodes[current as usize].children.push(offset);
                    offset
                }
            };
        }
        current
    }

    fn push_node(&mut self, node: Node) -> u32 {
        let offset = self.nodes.len() as u32;
        self.nodes.push(node);
        offset
    }

    /// Finalizes the arena: children sorted directories-first, then by name,
    /// which is the display order the browser expects. The meta root is
    /// exempt so packages keep their mount-priority order.
    pub fn build(mut self) -> NodeTree {
        let order: Vec<(bool, String)> = self
            .nodes
            .iter()
            .map(|node| (!node.is_directory() && !node.is_package_boundary(), node.name.to_lowercase()))
            .collect();

        for node in self.nodes.iter_mut().skip(1) {
            node.children.sort_by(|a, b| {
                let ka = &order[*a as usize];
                let kb = &order[*b as usize];
                ka.0.cmp(&kb.0).then_with(|| ka.1.cmp(&kb.1))
            });
        }

        trace!("Built node tree with {} entries", self.nodes.len());
        NodeTree::from_nodes(self.nodes)
    }
}

fn kind_flag(kind: FileKind) -> NodeType {
    match kind {
        FileKind::Image => NodeType::IMAGE,
        FileKind::GameModel => NodeType::GAME_MODEL,
        FileKind::WorldModel => NodeType::WORLD_MODEL,
        FileKind::Audio => NodeType::AUDIO,
        FileKind::Data => NodeType::empty(),
    }
}
