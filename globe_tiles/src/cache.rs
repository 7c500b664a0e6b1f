//! In-memory store of loaded textures.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::{Layer, Purpose, Texture, TileId};

/// Identity of a cached texture.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Image downloaded from this very URL.
    Url(String),

    /// Tile of a layer, whichever provider ended up serving it.
    Tile { layer: Layer, tile_id: TileId },

    /// Synthesized image, shared by everything which ran out of candidates.
    Placeholder(Purpose),
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Tile { layer, tile_id } => write!(f, "{layer}/{tile_id}"),
            Self::Placeholder(purpose) => write!(f, "placeholder/{purpose:?}"),
        }
    }
}

/// How many textures are kept around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheCapacity {
    /// Keep everything until disposed.
    #[default]
    Unbounded,

    /// Forget the least recently used textures above this count. Forgotten textures are not
    /// disposed, as they might be still displayed.
    Bounded(NonZeroUsize),
}

/// Texture store owned by a single loader.
pub struct ResourceCache {
    entries: LruCache<CacheKey, Texture>,
    disposed: bool,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(CacheCapacity::default())
    }
}

impl ResourceCache {
    pub fn new(capacity: CacheCapacity) -> Self {
        let entries = match capacity {
            CacheCapacity::Unbounded => LruCache::unbounded(),
            CacheCapacity::Bounded(capacity) => LruCache::new(capacity),
        };

        Self {
            entries,
            disposed: false,
        }
    }

    /// Cached texture, marking it as recently used. A texture disposed by one of its holders
    /// is dropped from the cache and reported as a miss.
    pub fn get(&mut self, key: &CacheKey) -> Option<Texture> {
        let texture = self.entries.get(key)?.clone();
        if texture.is_disposed() {
            log::debug!("'{key}' was disposed, forgetting it.");
            self.entries.pop(key);
            return None;
        }
        Some(texture)
    }

    pub fn has(&self, key: &CacheKey) -> bool {
        self.entries
            .peek(key)
            .is_some_and(|texture| !texture.is_disposed())
    }

    /// Store the texture. Returns `false` if the cache was disposed, in which case the texture
    /// is not kept.
    pub fn insert(&mut self, key: CacheKey, texture: Texture) -> bool {
        if self.disposed {
            log::debug!("Not caching '{key}', the cache is disposed.");
            return false;
        }

        if let Some((evicted, _)) = self.entries.push(key.clone(), texture) {
            if evicted != key {
                log::trace!("Evicted '{evicted}'.");
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Dispose every cached texture and refuse to store new ones.
    pub fn dispose_all(&mut self) {
        log::debug!("Disposing {} textures.", self.entries.len());
        for (_, texture) in self.entries.iter() {
            texture.dispose();
        }
        self.entries.clear();
        self.disposed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder;

    fn tile(x: u32) -> CacheKey {
        CacheKey::Tile {
            layer: Layer::Streets,
            tile_id: TileId { zoom: 5, x, y: 3 },
        }
    }

    #[test]
    fn keys_are_readable() {
        assert_eq!(tile(1).to_string(), "streets/5/1/3");
        assert_eq!(
            CacheKey::Placeholder(Purpose::Clouds).to_string(),
            "placeholder/Clouds"
        );
    }

    #[test]
    fn unbounded_cache_keeps_everything() {
        let mut cache = ResourceCache::default();
        let texture = placeholder::synthesize(Purpose::Tile);

        for x in 0..1000 {
            assert!(cache.insert(tile(x), texture.clone()));
        }

        assert_eq!(cache.len(), 1000);
        assert!(cache.has(&tile(0)));
    }

    #[test]
    fn bounded_cache_forgets_least_recently_used() {
        let capacity = NonZeroUsize::new(2).unwrap();
        let mut cache = ResourceCache::new(CacheCapacity::Bounded(capacity));
        let first = placeholder::synthesize(Purpose::Tile);

        cache.insert(tile(1), first.clone());
        cache.insert(tile(2), placeholder::synthesize(Purpose::Tile));

        // Touch the first one, so the second becomes the oldest.
        assert!(cache.get(&tile(1)).unwrap().ptr_eq(&first));
        cache.insert(tile(3), placeholder::synthesize(Purpose::Tile));

        assert_eq!(cache.len(), 2);
        assert!(cache.has(&tile(1)));
        assert!(!cache.has(&tile(2)));
        assert!(cache.has(&tile(3)));

        // Forgetting is not disposing.
        assert!(!first.is_disposed());
    }

    #[test]
    fn reinserting_replaces() {
        let mut cache = ResourceCache::default();
        let second = placeholder::synthesize(Purpose::Tile);

        cache.insert(tile(1), placeholder::synthesize(Purpose::Tile));
        cache.insert(tile(1), second.clone());

        assert_eq!(cache.len(), 1);
        assert!(cache.get(&tile(1)).unwrap().ptr_eq(&second));
    }

    #[test]
    fn disposing_is_terminal() {
        let mut cache = ResourceCache::default();
        let texture = placeholder::synthesize(Purpose::Diffuse);
        cache.insert(CacheKey::Url("https://example.com/a.jpg".to_owned()), texture.clone());

        cache.dispose_all();

        assert!(texture.is_disposed());
        assert!(cache.is_empty());
        assert!(cache.is_disposed());

        assert!(!cache.insert(tile(1), placeholder::synthesize(Purpose::Tile)));
        assert!(!cache.has(&tile(1)));

        // Second time is a no-op.
        cache.dispose_all();
    }

    #[test]
    fn texture_disposed_by_its_holder_is_a_miss() {
        let mut cache = ResourceCache::default();
        let texture = placeholder::synthesize(Purpose::Tile);
        cache.insert(tile(1), texture.clone());

        texture.dispose();

        assert!(!cache.has(&tile(1)));
        assert!(cache.get(&tile(1)).is_none());
        assert!(cache.is_empty(), "disposed texture should be forgotten");

        // Cache itself is still usable.
        assert!(cache.insert(tile(1), placeholder::synthesize(Purpose::Tile)));
        assert!(!cache.get(&tile(1)).unwrap().is_disposed());
    }
}
