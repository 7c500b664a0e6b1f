use super::{Attribution, TileSource};
use crate::TileId;

/// <https://opentopomap.org/about>
pub struct OpenTopoMap;

impl TileSource for OpenTopoMap {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://tile.opentopomap.org/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "OpenTopoMap (CC-BY-SA), OpenStreetMap contributors",
            url: "https://opentopomap.org/about",
        }
    }

    fn max_zoom(&self) -> u8 {
        17
    }
}
