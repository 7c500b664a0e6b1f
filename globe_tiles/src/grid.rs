//! Square neighbourhood of tiles around a position.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::{AbortRegistration, Abortable, join_all};

pub use futures::future::Aborted;

use crate::io::Fetch;
use crate::loader::TextureLoader;
use crate::mercator::tile_id;
use crate::position::Position;
use crate::texture::Texture;
use crate::{Layer, Purpose, TileId};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("grid size must be odd, got {0}")]
pub struct InvalidGridSize(pub u8);

/// Number of tiles along each side of the grid. Always odd, so there is a center tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridSize(u8);

impl Default for GridSize {
    fn default() -> Self {
        Self(3)
    }
}

impl GridSize {
    pub fn new(size: u8) -> Result<Self, InvalidGridSize> {
        if size % 2 == 1 {
            Ok(Self(size))
        } else {
            Err(InvalidGridSize(size))
        }
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    /// Number of tiles on each side of the center one.
    pub fn radius(&self) -> i64 {
        i64::from(self.0 / 2)
    }

    /// Number of cells in the grid.
    pub fn cells(&self) -> usize {
        usize::from(self.0) * usize::from(self.0)
    }
}

impl TryFrom<u8> for GridSize {
    type Error = InvalidGridSize;

    fn try_from(size: u8) -> Result<Self, Self::Error> {
        Self::new(size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRequest {
    pub center: Position,

    /// Requested zoom. Deeper than the layer goes gets clamped.
    pub zoom: u8,

    pub layer: Layer,
    pub size: GridSize,
}

impl GridRequest {
    /// Request of a default-sized grid.
    pub fn new(center: Position, zoom: u8, layer: Layer) -> Self {
        Self {
            center,
            zoom,
            layer,
            size: GridSize::default(),
        }
    }

    pub fn with_size(self, size: GridSize) -> Self {
        Self { size, ..self }
    }
}

#[derive(Debug, Clone)]
pub struct GridCell {
    /// `None` when the cell falls outside the map.
    pub tile_id: Option<TileId>,
    pub texture: Texture,
}

/// Fetched grid. Cells go row by row, starting from the north-west corner.
#[derive(Debug, Clone)]
pub struct TileGrid {
    pub layer: Layer,
    pub center: TileId,

    /// Zoom the tiles were fetched at, which might be lower than requested.
    pub zoom: u8,

    pub size: GridSize,
    pub cells: Vec<GridCell>,
}

impl TileGrid {
    pub fn textures(&self) -> impl Iterator<Item = &Texture> {
        self.cells.iter().map(|cell| &cell.texture)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[GridCell]> {
        self.cells.chunks(usize::from(self.size.get()))
    }
}

/// Counts a grid fetch as outstanding for as long as it lives, whichever way it ends.
struct Loading(Arc<AtomicUsize>);

impl Loading {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for Loading {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fetches whole grids of tiles through a [`TextureLoader`].
pub struct GridFetcher<F> {
    loader: TextureLoader<F>,
    loading: Arc<AtomicUsize>,
}

impl<F> Clone for GridFetcher<F> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader.clone(),
            loading: Arc::clone(&self.loading),
        }
    }
}

impl<F> GridFetcher<F>
where
    F: Fetch + Send + Sync + 'static,
{
    pub fn new(loader: TextureLoader<F>) -> Self {
        Self {
            loader,
            loading: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn loader(&self) -> &TextureLoader<F> {
        &self.loader
    }

    /// Fetch every tile of the grid at once. Never fails, tiles which could not be loaded,
    /// or which are outside the map, are placeholders.
    pub async fn tiles(&self, request: &GridRequest) -> TileGrid {
        let _loading = Loading::start(&self.loading);

        let layer = request.layer;
        let zoom = self.loader.providers().clamp_zoom(layer, request.zoom);
        if zoom != request.zoom {
            log::debug!("Zoom {} is too deep for {layer}, using {zoom}.", request.zoom);
        }

        let center = tile_id(request.center, zoom);
        let radius = request.size.radius();
        log::trace!("Fetching {0}x{0} grid around {center}.", request.size.get());

        let cells = (-radius..=radius)
            .flat_map(|dy| (-radius..=radius).map(move |dx| center.offset(dx, dy)))
            .map(|tile_id| async move {
                let texture = match tile_id {
                    Some(tile_id) => self.loader.tile(layer, tile_id).await,
                    None => self.loader.placeholder(Purpose::Tile),
                };
                GridCell { tile_id, texture }
            });

        TileGrid {
            layer,
            center,
            zoom,
            size: request.size,
            cells: join_all(cells).await,
        }
    }

    /// Like [`GridFetcher::tiles`], but gives up as soon as the matching
    /// [`futures::future::AbortHandle`] is triggered.
    pub async fn tiles_abortable(
        &self,
        request: &GridRequest,
        registration: AbortRegistration,
    ) -> Result<TileGrid, Aborted> {
        Abortable::new(self.tiles(request), registration).await
    }

    /// Whether any grid is being fetched right now.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst) > 0
    }
}
