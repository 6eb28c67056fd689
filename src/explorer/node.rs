use bitflags::bitflags;

bitflags! {
    /// What a tree entry is, plus the preview kind for file entries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeType: u32 {
        const DIRECTORY = 0x01;
        const FILE = 0x02;
        /// one mounted archive
        const PACKAGE = 0x04;
        /// the synthetic per-installation root above all packages
        const META = 0x08;

        const IMAGE = 0x10;
        const GAME_MODEL = 0x20;
        const WORLD_MODEL = 0x40;
        const AUDIO = 0x80;
    }
}

/// One entry in the offset-addressed tree. Links are arena offsets, not
/// pointers: `parent` is signed so the synthetic root can carry NO_PARENT,
/// `children` keeps its display order.
#[derive(Debug, Clone)]
pub struct Node {
    pub node_type: NodeType,
    pub name: String,
    pub parent: i64,
    pub children: Vec<u32>,
}

impl Node {
    pub const NO_PARENT: i64 = -1;

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_directory(&self) -> bool {
        self.node_type.contains(NodeType::DIRECTORY)
    }

    /// Upward walks (package name, file path) stop at these nodes.
    pub fn is_package_boundary(&self) -> bool {
        self.node_type.intersects(NodeType::PACKAGE | NodeType::META)
    }
}
