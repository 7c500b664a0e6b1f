use super::{Attribution, TileSource};
use crate::TileId;

/// Imagery products served by GIBS.
/// <https://nasa-gibs.github.io/gibs-api-docs/available-visualizations/>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GibsLayer {
    /// MODIS Terra true color, daily.
    #[default]
    TrueColor,
    /// ASTER global digital elevation model, shaded relief.
    ShadedRelief,
    /// VIIRS true color, used as the base for the hybrid layer.
    ViirsTrueColor,
}

impl GibsLayer {
    fn api_slug(&self) -> &'static str {
        match self {
            Self::TrueColor => "MODIS_Terra_CorrectedReflectance_TrueColor",
            Self::ShadedRelief => "ASTER_GDEM_Greyscale_Shaded_Relief",
            Self::ViirsTrueColor => "VIIRS_SNPP_CorrectedReflectance_TrueColor",
        }
    }

    /// Name of the tile matrix set, which is the native resolution of the product.
    fn resolution(&self) -> &'static str {
        match self {
            Self::TrueColor | Self::ViirsTrueColor => "250m",
            Self::ShadedRelief => "31.25m",
        }
    }
}

/// NASA Global Imagery Browse Services, WMTS REST endpoint. Layers are versioned by date,
/// and paths put the row (`y`) before the column (`x`).
/// <https://nasa-gibs.github.io/gibs-api-docs/access-basics/>
pub struct Gibs {
    pub layer: GibsLayer,

    /// Day of the imagery, `YYYY-MM-DD`.
    pub date: String,
}

impl TileSource for Gibs {
    fn tile_url(&self, tile_id: TileId) -> String {
        format!(
            "https://gibs.earthdata.nasa.gov/wmts/epsg4326/best/{}/default/{}/{}/{}/{}/{}.jpg",
            self.layer.api_slug(),
            self.date,
            self.layer.resolution(),
            tile_id.zoom,
            tile_id.y,
            tile_id.x
        )
    }

    fn attribution(&self) -> Attribution {
        Attribution {
            text: "NASA EOSDIS GIBS",
            url: "https://www.earthdata.nasa.gov/eosdis/science-system-description/eosdis-components/gibs",
        }
    }

    fn max_zoom(&self) -> u8 {
        8
    }

    fn api_key_parameter(&self) -> Option<&'static str> {
        Some("api_key")
    }
}
