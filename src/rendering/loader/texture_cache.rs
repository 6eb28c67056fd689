use std::ops::DerefMut;
use std::sync::{Arc, RwLock, RwLockWriteGuard, Weak};

use dashmap::DashMap;
use image_blp::BlpImage;

use crate::io::common::loader::RawAssetLoader;
use crate::rendering::loader::blp_loader::BLPLoader;

/// Weak-reference cache for decoded BLPs: a model preview and the standalone
/// image preview of the same texture share one decode, but nothing outlives
/// its last user. Entries sit behind per-key locks so a miss only blocks
/// other resolvers of the same name.
pub struct TextureCache {
    loader: Arc<dyn RawAssetLoader + Send + Sync>,
    ref_cache: DashMap<String, RwLock<Weak<BlpImage>>>,
}

impl TextureCache {
    pub fn new(loader: Arc<dyn RawAssetLoader + Send + Sync>) -> Self {
        Self {
            loader,
            ref_cache: DashMap::with_capacity(100),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<BlpImage>> {
        // Easy path: The cache contains a live weak reference
        if let Some(weak_lock) = self.ref_cache.get(name) {
            {
                let weak = weak_lock.read().expect("Read lock on the cache entry");
                if let Some(arc) = weak.upgrade() {
                    return Some(arc);
                }
            }
            {
                let mut weak = weak_lock.write().expect("Write lock on the cache entry");
                return self.generate(name, &mut weak);
            }
        }

        // Heavier path: insert the entry first so we never hold a whole-shard
        // lock while decoding.
        self.ref_cache
            .insert(name.to_string(), RwLock::new(Weak::new()));

        let entry = self.ref_cache.get(name).expect("entry inserted right above");
        let mut weak = entry.write().expect("Write lock on the cache entry");
        self.generate(name, &mut weak)
    }

    fn generate(&self, name: &str, weak: &mut RwLockWriteGuard<Weak<BlpImage>>) -> Option<Arc<BlpImage>> {
        if let Some(arc) = weak.upgrade() {
            return Some(arc); // maybe we have been raced
        }

        let arc = Arc::new(BLPLoader::load_blp_from_ldr(self.loader.as_ref(), name)?);
        *weak.deref_mut() = Arc::downgrade(&arc);
        Some(arc)
    }
}
