use std::fmt;
use std::sync::Arc;

use crate::explorer::model::{FileTreeModel, ModelError, TreeIter, TreeModel, TreePath};
use crate::explorer::tree::{NodeTree, TreeError};
use crate::io::common::loader::RawAssetLoader;

/// Preview dispatch key, derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
    GameModel,
    WorldModel,
    Audio,
    /// no previewer; the node still shows up in the browser
    Data,
}

impl FileKind {
    pub fn from_path(path: &str) -> FileKind {
        let extension = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "blp" => FileKind::Image,
            "m2" | "mdx" | "mdl" => FileKind::GameModel,
            "wmo" => FileKind::WorldModel,
            "wav" | "mp3" | "ogg" => FileKind::Audio,
            _ => FileKind::Data,
        }
    }
}

/// Derived identity of one archive entry: enough to re-read its bytes through
/// the package group without holding onto tree internals. Created per query,
/// immutable, cheap to discard.
#[derive(Clone)]
pub struct FileReference {
    package_group: Arc<dyn RawAssetLoader + Send + Sync>,
    pub node_offset: u32,
    pub package_name: String,
    pub file_path: String,
}

impl FileReference {
    /// Derives the reference for one tree node: package by upward walk, path
    /// by the same walk with separators. Absent offsets are a valid "nothing".
    pub fn for_node(
        group: &Arc<dyn RawAssetLoader + Send + Sync>,
        tree: &NodeTree,
        offset: u32,
    ) -> Result<Option<FileReference>, TreeError> {
        let Some(node) = tree.node(offset) else {
            return Ok(None);
        };
        let package_name = tree.node_package(node)?.to_string();
        let file_path = tree.node_file_path(node)?;
        Ok(Some(FileReference {
            package_group: group.clone(),
            node_offset: offset,
            package_name,
            file_path,
        }))
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_path(&self.file_path)
    }

    pub fn file_name(&self) -> &str {
        self.file_path.rsplit('\\').next().unwrap_or(&self.file_path)
    }

    pub fn exists(&self) -> bool {
        self.package_group.contains(&self.file_path)
    }

    pub fn read_bytes(&self) -> Option<Vec<u8>> {
        self.package_group.load_raw_owned(&self.file_path)
    }

    pub fn package_group(&self) -> &Arc<dyn RawAssetLoader + Send + Sync> {
        &self.package_group
    }

    /// Path of the sibling file `suffix` produces, e.g. the `00.skin` LoD next
    /// to an `.m2`.
    pub fn sibling_path(&self, extension: &str, suffix: &str) -> String {
        let stem = self
            .file_path
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&self.file_path);
        format!("{}{}.{}", stem, suffix, extension)
    }
}

impl fmt::Debug for FileReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileReference")
            .field("node_offset", &self.node_offset)
            .field("package_name", &self.package_name)
            .field("file_path", &self.file_path)
            .finish()
    }
}

impl FileTreeModel {
    /// Builds a [`FileReference`] for the handle's node. An absent node (or
    /// the sentinel) is a valid empty selection, not a failure.
    pub fn reference_by_iter(
        &self,
        group: &Arc<dyn RawAssetLoader + Send + Sync>,
        iter: Option<&TreeIter>,
    ) -> Result<Option<FileReference>, ModelError> {
        let Some(iter) = iter else {
            return Ok(None);
        };
        let offset = self.resolve_offset(iter)?;
        Ok(FileReference::for_node(group, self.tree(), offset)?)
    }

    pub fn reference_by_path(
        &self,
        group: &Arc<dyn RawAssetLoader + Send + Sync>,
        path: &TreePath,
    ) -> Result<Option<FileReference>, ModelError> {
        match self.iter(path) {
            Some(iter) => self.reference_by_iter(group, Some(&iter)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::explorer::builder::TreeBuilder;

    /// In-memory package group so the tests don't need real archives on disk.
    pub(crate) struct StubPackageGroup {
        pub files: HashMap<String, Vec<u8>>,
    }

    impl RawAssetLoader for StubPackageGroup {
        fn load_raw_owned(&self, path: &str) -> Option<Vec<u8>> {
            self.files.get(path).cloned()
        }

        fn contains(&self, path: &str) -> bool {
            self.files.contains_key(path)
        }
    }

    fn sample() -> (FileTreeModel, Arc<dyn RawAssetLoader + Send + Sync>) {
        let mut builder = TreeBuilder::new("test install");
        let package = builder.add_package("base.MPQ");
        builder.add_path(package, "Creature\\Chicken\\Chicken.m2");
        builder.add_path(package, "Creature\\Chicken\\Chicken.blp");
        let model = FileTreeModel::new(Arc::new(builder.build()));

        let mut files = HashMap::new();
        files.insert("Creature\\Chicken\\Chicken.m2".to_string(), vec![1, 2, 3]);
        let group: Arc<dyn RawAssetLoader + Send + Sync> = Arc::new(StubPackageGroup { files });
        (model, group)
    }

    #[test]
    fn reference_resolves_package_and_path() {
        let (model, group) = sample();
        let reference = model
            .reference_by_path(&group, &vec![0, 0, 0, 1])
            .unwrap()
            .expect("path resolves to the m2");

        assert_eq!(reference.package_name, "base.MPQ");
        assert_eq!(reference.file_path, "Creature\\Chicken\\Chicken.m2");
        assert_eq!(reference.file_name(), "Chicken.m2");
        assert_eq!(reference.kind(), FileKind::GameModel);
        assert!(reference.exists());
        assert_eq!(reference.read_bytes(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn empty_selection_is_not_an_error() {
        let (model, group) = sample();
        assert!(model.reference_by_iter(&group, None).unwrap().is_none());
        assert!(model.reference_by_path(&group, &vec![9, 9]).unwrap().is_none());
    }

    #[test]
    fn foreign_iter_is_still_a_contract_violation() {
        let (model, group) = sample();
        let other = {
            let mut builder = TreeBuilder::new("other");
            builder.add_package("other.MPQ");
            FileTreeModel::new(Arc::new(builder.build()))
        };
        let foreign = other.iter(&vec![0]).unwrap();
        assert!(model.reference_by_iter(&group, Some(&foreign)).is_err());
    }

    #[test]
    fn sibling_path_swaps_the_extension() {
        let (model, group) = sample();
        let reference = model
            .reference_by_path(&group, &vec![0, 0, 0, 1])
            .unwrap()
            .unwrap();
        assert_eq!(
            reference.sibling_path("skin", "00"),
            "Creature\\Chicken\\Chicken00.skin"
        );
    }

    #[test]
    fn kind_dispatch_covers_every_previewable_extension() {
        assert_eq!(FileKind::from_path("a\\b.BLP"), FileKind::Image);
        assert_eq!(FileKind::from_path("a\\b.m2"), FileKind::GameModel);
        assert_eq!(FileKind::from_path("a\\b.MDX"), FileKind::GameModel);
        assert_eq!(FileKind::from_path("a\\b.wmo"), FileKind::WorldModel);
        assert_eq!(FileKind::from_path("a\\b.wav"), FileKind::Audio);
        assert_eq!(FileKind::from_path("a\\b.mp3"), FileKind::Audio);
        assert_eq!(FileKind::from_path("a\\b.dbc"), FileKind::Data);
        assert_eq!(FileKind::from_path("noextension"), FileKind::Data);
    }
}
