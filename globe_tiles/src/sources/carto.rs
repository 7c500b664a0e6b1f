use super::{Attribution, TileSource};
use crate::TileId;

/// CARTO Voyager raster basemap, rendered from OpenStreetMap data.
/// <https://github.com/CartoDB/basemap-styles>
pub struct CartoVoyager;

impl TileSource for CartoVoyager {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://basemaps.cartocdn.com/rastertiles/voyager/{}/{}/{}.png",
            tile_id.zoom, tile_id.x, tile_id.y
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "© CARTO, © OpenStreetMap contributors",
            url: "https://carto.com/attributions",
        }
    }

    fn max_zoom(&self) -> u8 {
        20
    }
}
