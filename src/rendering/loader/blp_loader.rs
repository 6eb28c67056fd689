use image_blp::BlpImage;
use image_blp::parser::parse_blp_with_externals;
use log::{error, warn};

use crate::io::common::loader::RawAssetLoader;

pub struct BLPLoader {}

impl BLPLoader {
    pub fn load_blp_from_ldr(loader: &dyn RawAssetLoader, file_name: &str) -> Option<BlpImage> {
        let Some(owned_file) = loader.load_raw_owned(file_name) else {
            warn!("Could not load BLP {}", file_name);
            return None;
        };

        BLPLoader::parse(&owned_file, file_name)
    }

    /// load_blp uses the fs to load mip maps next to it. We don't want to
    /// extract blps into temporary files, though, so we use the externals API
    /// and reject BLP0 mipmaps.
    pub fn parse(buf: &[u8], file_name: &str) -> Option<BlpImage> {
        let image = parse_blp_with_externals(buf, |_i| {
            // This could also be no_mipmaps from the image-blp parser crate.
            panic!("Loading of BLP Mip Maps is unsupported. File {}", file_name)
        });

        match image {
            Ok((_, image)) => Some(image),
            Err(err) => {
                error!("Parsing of the BLP {file_name} failed: {}", err);
                None
            }
        }
    }
}
