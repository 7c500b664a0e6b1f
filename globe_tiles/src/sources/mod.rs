//! Imagery tile servers. Make sure you follow terms of usage of the particular source.

mod carto;
mod esri;
mod gibs;
mod openstreetmap;
mod opentopomap;

use crate::TileId;
use reqwest::Url;

pub use carto::CartoVoyager;
pub use esri::EsriWorldImagery;
pub use gibs::{Gibs, GibsLayer};
pub use openstreetmap::OpenStreetMap;
pub use opentopomap::OpenTopoMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub text: &'static str,
    pub url: &'static str,
}

/// Remote tile server definition. Implementations only know how to address a single tile,
/// the zoom domain is enforced by [`tile_url`].
pub trait TileSource {
    /// URL of a tile which is within `0..=max_zoom()`.
    fn tile_url(&self, tile_id: TileId) -> String;

    fn attribution(&self) -> Attribution;

    fn max_zoom(&self) -> u8 {
        18
    }

    /// Name of the query parameter carrying the API key, if the source accepts one.
    fn api_key_parameter(&self) -> Option<&'static str> {
        None
    }
}

/// URL of `tile_id` within the source's zoom domain. Tiles deeper than the source goes are
/// replaced by the tile covering them at the maximum zoom.
pub fn tile_url(source: &dyn TileSource, tile_id: TileId, api_key: Option<&str>) -> String {
    let tile_id = tile_id.parent_at(source.max_zoom());
    let url = source.tile_url(tile_id);

    match (source.api_key_parameter(), api_key) {
        (Some(parameter), Some(key)) if !key.is_empty() => {
            match Url::parse_with_params(&url, [(parameter, key)]) {
                Ok(with_key) => with_key.into(),
                Err(e) => {
                    log::warn!("Could not add the API key to '{url}': {e}.");
                    url
                }
            }
        }
        _ => url,
    }
}
