use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use image_blp::BlpImage;
use itertools::Itertools;
use log::trace;

use everrust_files::common::types::CAaBox;
use everrust_files::wmo::reader::WMOReader;

use crate::explorer::reference::FileReference;
use crate::rendering::common::types::{AlbedoType, Material, MeshWithBatches};
use crate::rendering::importer::wmo_importer::WMOGroupImporter;
use crate::rendering::loader::texture_cache::TextureCache;

pub struct LoadedWMO {
    pub groups: Vec<LoadedWMOGroup>,
    /// decoded textures the group materials refer to by name
    pub textures: Vec<(String, Arc<BlpImage>)>,
    pub bounding_box: CAaBox,
}

pub struct LoadedWMOGroup {
    pub name: Option<String>,
    pub mesh: MeshWithBatches,
    pub materials: Vec<Material>,
}

pub struct WMOLoader {}

impl WMOLoader {
    /// Parses the root and every `_NNN.wmo` group next to it, decoding the
    /// referenced textures once through the cache.
    pub fn load(
        reference: &FileReference,
        bytes: Vec<u8>,
        textures: &TextureCache,
    ) -> Result<LoadedWMO, anyhow::Error> {
        let root = WMOReader::parse_root(&mut Cursor::new(bytes))
            .with_context(|| format!("Parsing wmo root {}", reference.file_path))?;

        let mut groups = Vec::with_capacity(root.mohd.n_groups as usize);
        for index in 0..root.mohd.n_groups {
            let group_path = WMOGroupImporter::group_path(&reference.file_path, index);
            let group_bytes = reference
                .package_group()
                .load_raw_owned(&group_path)
                .with_context(|| format!("Missing wmo group {}", group_path))?;
            let group = WMOReader::parse_group(&mut Cursor::new(group_bytes))
                .with_context(|| format!("Parsing wmo group {}", group_path))?;

            let name = root
                .mogi
                .groups
                .get(index as usize)
                .filter(|info| info.name_offset >= 0)
                .and_then(|info| root.mogn.group_names.offset_lookup.get(&(info.name_offset as u32)))
                .map(|&name_index| root.mogn.group_names.strings[name_index].clone());
            if let Some(name) = &name {
                trace!("Loaded WMO group {}", name);
            }

            let (mesh, materials) = WMOGroupImporter::create_group_batches(&root, &group);
            groups.push(LoadedWMOGroup { name, mesh, materials });
        }

        let texture_names = groups
            .iter()
            .flat_map(|group| &group.materials)
            .filter_map(|material| match &material.albedo {
                AlbedoType::TextureWithName(name) => Some(name.clone()),
                _ => None,
            })
            .unique()
            .collect_vec();

        let decoded = texture_names
            .into_iter()
            .filter_map(|name| textures.resolve(&name).map(|blp| (name, blp)))
            .collect_vec();

        Ok(LoadedWMO {
            groups,
            textures: decoded,
            bounding_box: root.mohd.bounding_box,
        })
    }
}
