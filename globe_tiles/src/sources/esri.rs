use super::{Attribution, TileSource};
use crate::TileId;

/// Esri World Imagery. Note that, like in WMTS, the row goes before the column.
/// <https://www.arcgis.com/home/item.html?id=10df2279f9684e4a9f6a7f08febac2a9>
pub struct EsriWorldImagery;

impl TileSource for EsriWorldImagery {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{}/{}/{}",
            tile_id.zoom, tile_id.y, tile_id.x
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "Esri, Maxar, Earthstar Geographics",
            url: "https://www.esri.com/en-us/legal/terms/full-master-agreement",
        }
    }

    fn max_zoom(&self) -> u8 {
        19
    }

    fn api_key_parameter(&self) -> Option<&'static str> {
        Some("token")
    }
}
