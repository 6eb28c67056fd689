use std::sync::Arc;

use bitflags::bitflags;
use thiserror::Error;

use crate::explorer::node::Node;
use crate::explorer::tree::{NodeTree, TreeError};

/// Ordered sequence of sibling indices from the (hidden) root down.
pub type TreePath = Vec<usize>;

/// Opaque handle into a [`TreeModel`]. The stamp ties it to the adapter
/// instance that minted it; after a tree swap the new adapter's stamp differs
/// and every retained handle turns invalid, which is exactly what the view
/// layer relies on to notice staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeIter {
    stamp: u32,
    offset: u32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TreeModelFlags: u32 {
        /// handles stay valid until the underlying tree changes
        const ITERS_PERSIST = 0x1;
        const LIST_ONLY = 0x2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Node,
}

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("the iterator was not minted by this model or no longer resolves to a node")]
    InvalidIter,
    #[error(transparent)]
    Corrupt(#[from] TreeError),
}

/// The data-provider contract a tree view walks. `None` in an
/// `Option<&TreeIter>` position is the sentinel for the hidden root.
/// Navigation off either end is `Ok(None)`; a foreign or stale handle is
/// [`ModelError::InvalidIter`], which callers treat as a contract violation.
pub trait TreeModel {
    fn flags(&self) -> TreeModelFlags;

    fn n_columns(&self) -> usize;

    fn column_type(&self, column: usize) -> Option<ColumnType>;

    /// Descends the path from the root; `None` if any index is out of range.
    fn iter(&self, path: &TreePath) -> Option<TreeIter>;

    fn path(&self, iter: &TreeIter) -> Result<TreePath, ModelError>;

    fn value(&self, iter: Option<&TreeIter>) -> Result<&Node, ModelError>;

    fn iter_next(&self, iter: &TreeIter) -> Result<Option<TreeIter>, ModelError>;

    fn iter_previous(&self, iter: &TreeIter) -> Result<Option<TreeIter>, ModelError>;

    fn iter_children(&self, parent: Option<&TreeIter>) -> Result<Option<TreeIter>, ModelError>;

    fn iter_has_child(&self, iter: &TreeIter) -> Result<bool, ModelError>;

    fn iter_n_children(&self, iter: Option<&TreeIter>) -> Result<usize, ModelError>;

    fn iter_nth_child(&self, parent: Option<&TreeIter>, n: usize) -> Result<Option<TreeIter>, ModelError>;

    fn iter_parent(&self, child: &TreeIter) -> Result<Option<TreeIter>, ModelError>;

    /// Reference counting hooks of the view contract. No caching layer here,
    /// so both are no-ops.
    fn ref_node(&self, _iter: &TreeIter) {}

    fn unref_node(&self, _iter: &TreeIter) {}
}

/// [`TreeModel`] over one immutable [`NodeTree`]. Handles are `(stamp,
/// offset)` pairs; the adapter never retains them.
pub struct FileTreeModel {
    tree: Arc<NodeTree>,
    stamp: u32,
}

impl FileTreeModel {
    pub fn new(tree: Arc<NodeTree>) -> Self {
        Self {
            tree,
            stamp: rand::random(),
        }
    }

    pub fn tree(&self) -> &Arc<NodeTree> {
        &self.tree
    }

    fn mint(&self, offset: u32) -> TreeIter {
        TreeIter {
            stamp: self.stamp,
            offset,
        }
    }

    /// Stamp check plus offset resolution; everything taking a handle funnels
    /// through here.
    fn resolve(&self, iter: &TreeIter) -> Result<&Node, ModelError> {
        if iter.stamp != self.stamp {
            return Err(ModelError::InvalidIter);
        }
        self.tree.node(iter.offset).ok_or(ModelError::InvalidIter)
    }

    pub(crate) fn resolve_offset(&self, iter: &TreeIter) -> Result<u32, ModelError> {
        self.resolve(iter)?;
        Ok(iter.offset)
    }

    /// The index of `iter`'s node within its parent's children, together with
    /// the parent. The root has no position.
    fn position_in_parent(&self, iter: &TreeIter) -> Result<Option<(&Node, usize)>, ModelError> {
        let node = self.resolve(iter)?;
        let Some(parent) = self.tree.parent_of(node) else {
            return Ok(None);
        };
        let index = parent
            .children
            .iter()
            .position(|&child| child == iter.offset)
            // the parent link exists but the parent doesn't know the child: desync
            .ok_or(ModelError::InvalidIter)?;
        Ok(Some((parent, index)))
    }

    fn parent_or_root(&self, parent: Option<&TreeIter>) -> Result<&Node, ModelError> {
        match parent {
            Some(iter) => self.resolve(iter),
            None => Ok(self.tree.root()),
        }
    }
}

impl TreeModel for FileTreeModel {
    fn flags(&self) -> TreeModelFlags {
        TreeModelFlags::ITERS_PERSIST
    }

    fn n_columns(&self) -> usize {
        1
    }

    fn column_type(&self, column: usize) -> Option<ColumnType> {
        (column == 0).then_some(ColumnType::Node)
    }

    fn iter(&self, path: &TreePath) -> Option<TreeIter> {
        if path.is_empty() {
            return None;
        }

        let mut current = self.tree.root();
        let mut offset = 0u32;
        for &index in path {
            if index >= current.child_count() {
                return None;
            }
            offset = current.children[index];
            current = self.tree.node(offset)?;
        }
        Some(self.mint(offset))
    }

    fn path(&self, iter: &TreeIter) -> Result<TreePath, ModelError> {
        self.resolve(iter)?;

        let mut path = TreePath::new();
        let mut current = *iter;
        while let Some((parent, index)) = self.position_in_parent(&current)? {
            path.insert(0, index);
            match self.tree.offset_of(parent) {
                // the meta root is not part of the path
                Some(0) | None => break,
                Some(parent_offset) => current = self.mint(parent_offset),
            }
        }
        Ok(path)
    }

    fn value(&self, iter: Option<&TreeIter>) -> Result<&Node, ModelError> {
        self.parent_or_root(iter)
    }

    fn iter_next(&self, iter: &TreeIter) -> Result<Option<TreeIter>, ModelError> {
        let Some((parent, index)) = self.position_in_parent(iter)? else {
            return Ok(None);
        };
        Ok(parent.children.get(index + 1).map(|&offset| self.mint(offset)))
    }

    fn iter_previous(&self, iter: &TreeIter) -> Result<Option<TreeIter>, ModelError> {
        let Some((parent, index)) = self.position_in_parent(iter)? else {
            return Ok(None);
        };
        if index == 0 {
            return Ok(None);
        }
        Ok(Some(self.mint(parent.children[index - 1])))
    }

    fn iter_children(&self, parent: Option<&TreeIter>) -> Result<Option<TreeIter>, ModelError> {
        let node = self.parent_or_root(parent)?;
        Ok(node.children.first().map(|&offset| self.mint(offset)))
    }

    fn iter_has_child(&self, iter: &TreeIter) -> Result<bool, ModelError> {
        Ok(self.resolve(iter)?.child_count() > 0)
    }

    fn iter_n_children(&self, iter: Option<&TreeIter>) -> Result<usize, ModelError> {
        Ok(self.parent_or_root(iter)?.child_count())
    }

    fn iter_nth_child(&self, parent: Option<&TreeIter>, n: usize) -> Result<Option<TreeIter>, ModelError> {
        // resolve against the input parent, the output handle is derived state
        let node = self.parent_or_root(parent)?;
        Ok(node.children.get(n).map(|&offset| self.mint(offset)))
    }

    fn iter_parent(&self, child: &TreeIter) -> Result<Option<TreeIter>, ModelError> {
        let node = self.resolve(child)?;
        let Some(parent) = self.tree.parent_of(node) else {
            return Ok(None);
        };
        // the meta root is the view's hidden top boundary, not a row
        if parent.parent == Node::NO_PARENT {
            return Ok(None);
        }
        let offset = self.tree.offset_of(parent).ok_or(ModelError::InvalidIter)?;
        Ok(Some(self.mint(offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::builder::TreeBuilder;

    fn sample_model() -> FileTreeModel {
        let mut builder = TreeBuilder::new("test install");
        let package = builder.add_package("base.MPQ");
        builder.add_path(package, "World\\Maps\\azeroth.blp");
        builder.add_path(package, "World\\Maps\\kalimdor.blp");
        builder.add_path(package, "World\\Maps\\northrend.blp");
        builder.add_path(package, "Sound\\chicken.wav");
        FileTreeModel::new(Arc::new(builder.build()))
    }

    /// every reachable path survives the iter → path roundtrip
    #[test]
    fn path_iter_roundtrip() {
        let model = sample_model();
        let mut stack: Vec<TreePath> = vec![vec![0]];
        let mut visited = 0usize;
        while let Some(path) = stack.pop() {
            let iter = model.iter(&path).expect("reachable path resolves");
            assert_eq!(model.path(&iter).unwrap(), path);
            visited += 1;

            let children = model.iter_n_children(Some(&iter)).unwrap();
            for n in 0..children {
                let mut child_path = path.clone();
                child_path.push(n);
                stack.push(child_path);
            }
        }
        // package, 2 dirs + Maps, 3 maps, 1 wav... at least the package subtree
        assert!(visited >= 7, "visited only {} nodes", visited);
    }

    #[test]
    fn foreign_stamps_are_rejected() {
        let model_a = sample_model();
        let model_b = sample_model();

        let iter = model_a.iter(&vec![0]).unwrap();
        assert!(matches!(model_b.path(&iter), Err(ModelError::InvalidIter)));
        assert!(matches!(model_b.value(Some(&iter)), Err(ModelError::InvalidIter)));
        assert!(matches!(model_b.iter_next(&iter), Err(ModelError::InvalidIter)));
        assert!(matches!(
            model_b.iter_children(Some(&iter)),
            Err(ModelError::InvalidIter)
        ));
    }

    #[test]
    fn sibling_navigation_roundtrip() {
        let model = sample_model();
        // Maps has three children; start in the middle
        let maps_path = vec![0, 1, 0];
        let maps = model.iter(&maps_path).unwrap();
        assert_eq!(model.value(Some(&maps)).unwrap().name, "Maps");

        let first = model.iter_children(Some(&maps)).unwrap().unwrap();
        let second = model.iter_next(&first).unwrap().unwrap();
        let third = model.iter_next(&second).unwrap().unwrap();
        assert!(model.iter_next(&third).unwrap().is_none());

        let back = model.iter_previous(&second).unwrap().unwrap();
        assert_eq!(back, first);
        assert!(model.iter_previous(&first).unwrap().is_none());
    }

    #[test]
    fn sentinel_means_root() {
        let model = sample_model();
        assert_eq!(model.value(None).unwrap().name, "test install");
        assert_eq!(model.iter_n_children(None).unwrap(), 1);

        let first = model.iter_children(None).unwrap().unwrap();
        assert_eq!(model.value(Some(&first)).unwrap().name, "base.MPQ");

        let nth = model.iter_nth_child(None, 0).unwrap().unwrap();
        assert_eq!(nth, first);
        assert!(model.iter_nth_child(None, 1).unwrap().is_none());
    }

    #[test]
    fn parent_navigation_stops_at_the_top_boundary() {
        let model = sample_model();
        let azeroth = model.iter(&vec![0, 1, 0, 0]).unwrap();
        let maps = model.iter_parent(&azeroth).unwrap().unwrap();
        assert_eq!(model.value(Some(&maps)).unwrap().name, "Maps");

        let package = model.iter(&vec![0]).unwrap();
        assert!(model.iter_parent(&package).unwrap().is_none());
    }

    #[test]
    fn parent_child_offsets_are_bidirectionally_consistent() {
        let model = sample_model();
        let child = model.iter(&vec![0, 1, 0, 1]).unwrap();
        let parent = model.iter_parent(&child).unwrap().unwrap();

        let child_offset = model.resolve_offset(&child).unwrap();
        let parent_node = model.value(Some(&parent)).unwrap();
        assert!(parent_node.children.contains(&child_offset));
    }

    #[test]
    fn out_of_range_paths_are_not_found() {
        let model = sample_model();
        assert!(model.iter(&vec![]).is_none());
        assert!(model.iter(&vec![5]).is_none());
        assert!(model.iter(&vec![0, 99]).is_none());
    }

    #[test]
    fn single_node_column() {
        let model = sample_model();
        assert_eq!(model.n_columns(), 1);
        assert_eq!(model.column_type(0), Some(ColumnType::Node));
        assert_eq!(model.column_type(1), None);
        assert!(model.flags().contains(TreeModelFlags::ITERS_PERSIST));
    }
}
