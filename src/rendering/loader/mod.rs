pub mod blp_loader;
pub mod m2_loader;
pub mod texture_cache;
pub mod wmo_loader;
