use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, WeakShared};

use crate::cache::{CacheCapacity, CacheKey, ResourceCache};
use crate::io::Fetch;
use crate::providers::{Candidate, Providers};
use crate::texture::Texture;
use crate::{Layer, Purpose, ResourceRequest, TileId, placeholder};

type Download = BoxFuture<'static, Option<Texture>>;

#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    pub cache_capacity: CacheCapacity,
}

struct State {
    cache: ResourceCache,

    /// Downloads which somebody still waits for. Weak, so a download nobody awaits anymore
    /// gets dropped instead of finishing in the background.
    in_flight: HashMap<CacheKey, InFlight>,

    /// Number of downloads started so far, used to tell them apart.
    started: u64,
}

struct InFlight {
    id: u64,
    download: WeakShared<Download>,
}

struct Inner<F> {
    fetch: F,
    providers: Providers,
    state: Mutex<State>,
}

impl<F> Inner<F> {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolves image requests into [`Texture`]s, trying providers one by one and synthesizing a
/// placeholder when all of them fail. It never returns an error.
///
/// Clones share the cache, so identical requests get the very same [`Texture`], even if
/// they are made at the same time.
pub struct TextureLoader<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for TextureLoader<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F> TextureLoader<F>
where
    F: Fetch + Send + Sync + 'static,
{
    pub fn new(fetch: F, providers: Providers) -> Self {
        Self::with_options(fetch, providers, LoaderOptions::default())
    }

    pub fn with_options(fetch: F, providers: Providers, options: LoaderOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetch,
                providers,
                state: Mutex::new(State {
                    cache: ResourceCache::new(options.cache_capacity),
                    in_flight: HashMap::new(),
                    started: 0,
                }),
            }),
        }
    }

    pub fn providers(&self) -> &Providers {
        &self.inner.providers
    }

    /// Try the candidates in order, returning the first one which downloads and decodes.
    /// [`Candidate::Placeholder`], or running out of candidates, gives the placeholder for
    /// `purpose`.
    pub async fn load(&self, candidates: &[Candidate], purpose: Purpose) -> Texture {
        for candidate in candidates {
            let Candidate::Url(url) = candidate else {
                log::debug!("No more sources for {purpose:?}, using placeholder.");
                return self.placeholder(purpose);
            };

            let key = CacheKey::Url(url.clone());
            if let Some(texture) = self.resolve(key, vec![url.clone()]).await {
                return texture;
            }
        }

        log::warn!("Every source of {purpose:?} failed, using placeholder.");
        self.placeholder(purpose)
    }

    /// Single map tile of the layer, from whichever provider serves it first.
    pub async fn tile(&self, layer: Layer, tile_id: TileId) -> Texture {
        if !tile_id.valid() {
            log::debug!("{tile_id} is outside the map.");
            return self.placeholder(Purpose::Tile);
        }

        let urls: Vec<_> = self
            .inner
            .providers
            .tile_candidates(layer, tile_id)
            .into_iter()
            .map_while(|candidate| match candidate {
                Candidate::Url(url) => Some(url),
                Candidate::Placeholder => None,
            })
            .collect();

        self.resolve(CacheKey::Tile { layer, tile_id }, urls)
            .await
            .unwrap_or_else(|| {
                log::warn!("Tile {tile_id} of {layer} is unavailable, using placeholder.");
                self.placeholder(Purpose::Tile)
            })
    }

    /// Whole-globe surface of the layer.
    pub async fn global(&self, layer: Layer) -> Texture {
        let candidates = self.inner.providers.global_candidates(layer);
        self.load(&candidates, Purpose::Diffuse).await
    }

    /// Whole-globe material, such as normal map or clouds.
    pub async fn material(&self, purpose: Purpose) -> Texture {
        let candidates = self.inner.providers.material_candidates(purpose);
        self.load(&candidates, purpose).await
    }

    pub async fn request(&self, request: ResourceRequest) -> Texture {
        match (request.tile_id, request.purpose) {
            (Some(tile_id), _) => self.tile(request.layer, tile_id).await,
            (None, Purpose::Diffuse | Purpose::Tile) => self.global(request.layer).await,
            (None, purpose) => self.material(purpose).await,
        }
    }

    /// Placeholder for the purpose. Synthesized once, then shared.
    pub fn placeholder(&self, purpose: Purpose) -> Texture {
        let key = CacheKey::Placeholder(purpose);
        let mut state = self.inner.lock();

        if let Some(texture) = state.cache.get(&key) {
            return texture;
        }

        let texture = placeholder::synthesize(purpose);
        state.cache.insert(key, texture.clone());
        texture
    }

    /// Dispose every texture this loader handed out. Downloads which are still going will be
    /// returned to whoever waits for them, but not cached anymore.
    pub fn dispose(&self) {
        let mut state = self.inner.lock();
        state.cache.dispose_all();
        state.in_flight.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.inner.lock().cache.len()
    }

    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.inner.lock().cache.has(key)
    }

    /// Texture under `key`, either cached, being downloaded, or downloaded now from the first
    /// of `urls` which works.
    async fn resolve(&self, key: CacheKey, urls: Vec<String>) -> Option<Texture> {
        let download = {
            let mut state = self.inner.lock();

            if let Some(texture) = state.cache.get(&key) {
                log::trace!("Cache hit for '{key}'.");
                return Some(texture);
            }

            match state
                .in_flight
                .get(&key)
                .and_then(|in_flight| in_flight.download.upgrade())
            {
                Some(download) => {
                    log::trace!("Joining download of '{key}'.");
                    download
                }
                None => {
                    state.started += 1;
                    let id = state.started;
                    let download =
                        first_available(Arc::clone(&self.inner), key.clone(), id, urls)
                            .boxed()
                            .shared();
                    if let Some(weak) = download.downgrade() {
                        state.in_flight.insert(key, InFlight { id, download: weak });
                    }
                    download
                }
            }
        };

        download.await
    }
}

/// Download the first of `urls` which decodes, and cache it under `key`. `id` identifies this
/// download among the ones registered for `key`.
async fn first_available<F>(
    inner: Arc<Inner<F>>,
    key: CacheKey,
    id: u64,
    urls: Vec<String>,
) -> Option<Texture>
where
    F: Fetch + Send + Sync + 'static,
{
    let mut texture = None;

    for url in urls {
        log::trace!("Requesting '{url}'.");
        match inner.fetch.fetch(&url).await {
            Ok(bytes) => match Texture::from_bytes(&bytes, url.as_str()) {
                Ok(decoded) => {
                    texture = Some(decoded);
                    break;
                }
                Err(e) => log::warn!("Could not decode '{url}': {e}."),
            },
            Err(e) => log::warn!("Could not download '{url}': {e}."),
        }
    }

    let mut state = inner.lock();

    // A newer download might have been registered after the loader was disposed.
    if state
        .in_flight
        .get(&key)
        .is_some_and(|in_flight| in_flight.id == id)
    {
        state.in_flight.remove(&key);
    }

    if let Some(texture) = &texture {
        state.cache.insert(key, texture.clone());
    }

    texture
}
