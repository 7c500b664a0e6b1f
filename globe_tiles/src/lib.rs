#![doc = include_str!("../README.md")]
#![deny(clippy::unwrap_used, rustdoc::broken_intra_doc_links)]

mod cache;
mod grid;
mod io;
mod layer;
mod loader;
pub mod mercator;
pub mod placeholder;
mod position;
mod providers;
pub mod sources;
mod texture;

#[cfg(test)]
mod testing;

pub use cache::{CacheCapacity, CacheKey, ResourceCache};
pub use grid::{
    Aborted, GridCell, GridFetcher, GridRequest, GridSize, InvalidGridSize, TileGrid,
};
pub use io::{
    Fetch, FetchError, GridIo, HeaderValue, HttpFetch, HttpOptions, MaxParallelDownloads, Stats,
};
pub use layer::{Layer, Purpose, ResourceRequest};
pub use loader::{LoaderOptions, TextureLoader};
pub use mercator::{TileId, tile_id};
pub use position::{Position, lat_lon, lon_lat};
pub use providers::{API_KEY_VAR, Candidate, DEFAULT_IMAGERY_DATE, IMAGERY_DATE_VAR, Providers};
pub use texture::{Origin, Texture, TextureError};
