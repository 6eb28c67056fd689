use std::io::Cursor;
use std::sync::Arc;

use anyhow::Context;
use image_blp::BlpImage;

use everrust_files::common::types::CAaBox;
use everrust_files::m2::reader::M2Reader;

use crate::explorer::reference::FileReference;
use crate::rendering::common::types::{Material, Mesh};
use crate::rendering::importer::m2_importer::M2Importer;
use crate::rendering::loader::texture_cache::TextureCache;
use crate::settings::GameVersion;

pub struct LoadedM2 {
    pub name: String,
    pub mesh: Mesh,
    pub material: Material,
    pub blp: Option<Arc<BlpImage>>,
    pub bounding_box: CAaBox,
}

pub struct M2Loader {}

impl M2Loader {
    /// Parses the model plus its first LoD skin and first texture. The version
    /// decides where the skin lives; before WotLK it was embedded and those
    /// clients are not supported by the preview yet.
    pub fn load_no_lod(
        reference: &FileReference,
        bytes: Vec<u8>,
        textures: &TextureCache,
        version: GameVersion,
    ) -> Result<LoadedM2, anyhow::Error> {
        let asset = M2Reader::parse_asset(&mut Cursor::new(bytes))
            .with_context(|| format!("Parsing m2 {}", reference.file_path))?;

        if version != GameVersion::WrathOfTheLichKing {
            anyhow::bail!("Model previews currently require a Wrath of the Lich King installation");
        }

        // In theory, we could investigate the number of LoD Levels, but we just use "0"
        let skin_path = reference.sibling_path("skin", "00");
        let skin_bytes = reference
            .package_group()
            .load_raw_owned(&skin_path)
            .with_context(|| format!("Missing skin profile {}", skin_path))?;
        let skin = M2Reader::parse_skin_profile(&mut Cursor::new(skin_bytes))
            .with_context(|| format!("Parsing skin profile {}", skin_path))?;

        let texture_name = asset
            .textures
            .iter()
            .map(|tex| tex.filename.as_str())
            .find(|name| !name.is_empty());
        let blp = texture_name.and_then(|name| textures.resolve(name));

        let mesh = M2Importer::create_mesh(&asset, &skin);
        let material = M2Importer::create_material(blp.as_deref(), texture_name);

        Ok(LoadedM2 {
            name: asset.name.clone(),
            mesh,
            material,
            blp,
            bounding_box: asset.bounding_box,
        })
    }
}
