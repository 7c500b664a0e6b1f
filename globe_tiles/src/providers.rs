//! Which servers are asked for which layer, and in what order.

use std::ops::RangeInclusive;

use crate::sources::{
    self, Attribution, CartoVoyager, EsriWorldImagery, Gibs, GibsLayer, OpenStreetMap,
    OpenTopoMap, TileSource,
};
use crate::{Layer, Purpose, TileId};

/// Environment variable holding the imagery API key.
pub const API_KEY_VAR: &str = "GLOBE_TILES_API_KEY";

/// Environment variable overriding [`DEFAULT_IMAGERY_DATE`].
pub const IMAGERY_DATE_VAR: &str = "GLOBE_TILES_IMAGERY_DATE";

/// Day of the date-versioned imagery used unless configured otherwise.
pub const DEFAULT_IMAGERY_DATE: &str = "2024-06-01";

const BLUE_MARBLE: &str = "https://eoimages.gsfc.nasa.gov/images/imagerecords/74000/74142/world.topo.200412.3x5400x2700.jpg";
const BLUE_MARBLE_BATHYMETRY: &str = "https://eoimages.gsfc.nasa.gov/images/imagerecords/73000/73909/world.topo.bathy.200412.3x5400x2700.jpg";
const THREE_GLOBE_BLUE_MARBLE: &str = "https://unpkg.com/three-globe/example/img/earth-blue-marble.jpg";
const THREE_GLOBE_DAY: &str = "https://unpkg.com/three-globe/example/img/earth-day.jpg";
const THREE_GLOBE_TOPOLOGY: &str = "https://unpkg.com/three-globe/example/img/earth-topology.png";

const THREE_JS_PLANETS: &str =
    "https://raw.githubusercontent.com/mrdoob/three.js/dev/examples/textures/planets";

/// A single step of a fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Url(String),

    /// Stop asking the network and use a synthesized placeholder.
    Placeholder,
}

impl Candidate {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Placeholder => None,
        }
    }
}

/// Builds imagery URLs for every [`Layer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Providers {
    api_key: Option<String>,
    date: String,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            api_key: None,
            date: DEFAULT_IMAGERY_DATE.to_owned(),
        }
    }
}

impl Providers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read [`API_KEY_VAR`] and [`IMAGERY_DATE_VAR`]. Both are optional, keyless public
    /// endpoints are used when there is no key.
    pub fn from_env() -> Self {
        let mut providers = Self::default();

        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => providers.api_key = Some(key.trim().to_owned()),
            _ => log::debug!("{API_KEY_VAR} is not set, using public endpoints."),
        }

        if let Ok(date) = std::env::var(IMAGERY_DATE_VAR) {
            providers.date = date;
        }

        providers
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Day of the date-versioned imagery, `YYYY-MM-DD`.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    fn gibs(&self, layer: GibsLayer) -> Gibs {
        Gibs {
            layer,
            date: self.date.clone(),
        }
    }

    fn primary(&self, layer: Layer) -> Box<dyn TileSource> {
        match layer {
            Layer::Satellite => Box::new(self.gibs(GibsLayer::TrueColor)),
            Layer::Terrain => Box::new(self.gibs(GibsLayer::ShadedRelief)),
            Layer::Hybrid => Box::new(self.gibs(GibsLayer::ViirsTrueColor)),
            Layer::Streets => Box::new(OpenStreetMap),
        }
    }

    /// Source asked when the primary one fails. Its zoom domain covers the primary's one.
    fn secondary(layer: Layer) -> Box<dyn TileSource> {
        match layer {
            Layer::Satellite | Layer::Hybrid => Box::new(EsriWorldImagery),
            Layer::Terrain => Box::new(OpenTopoMap),
            Layer::Streets => Box::new(CartoVoyager),
        }
    }

    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Zoom levels the layer's primary source can serve.
    pub fn zoom_range(&self, layer: Layer) -> RangeInclusive<u8> {
        0..=self.primary(layer).max_zoom()
    }

    pub fn clamp_zoom(&self, layer: Layer, zoom: u8) -> u8 {
        zoom.min(*self.zoom_range(layer).end())
    }

    /// URL of the tile on the layer's primary source.
    pub fn tile_url(&self, layer: Layer, tile_id: TileId) -> String {
        sources::tile_url(self.primary(layer).as_ref(), tile_id, self.api_key())
    }

    /// Every source able to serve the tile, ending with the placeholder.
    pub fn tile_candidates(&self, layer: Layer, tile_id: TileId) -> Vec<Candidate> {
        [self.primary(layer), Self::secondary(layer)]
            .iter()
            .map(|source| {
                Candidate::Url(sources::tile_url(source.as_ref(), tile_id, self.api_key()))
            })
            .chain([Candidate::Placeholder])
            .collect()
    }

    /// Whole-globe images of the layer in order of preference, ending with the placeholder.
    pub fn global_candidates(&self, layer: Layer) -> Vec<Candidate> {
        let world = TileId { zoom: 0, x: 0, y: 0 };
        let key = self.api_key();

        let urls = match layer {
            Layer::Satellite => vec![
                BLUE_MARBLE.to_owned(),
                THREE_GLOBE_BLUE_MARBLE.to_owned(),
                sources::tile_url(&EsriWorldImagery, world, key),
            ],
            Layer::Terrain => vec![
                BLUE_MARBLE_BATHYMETRY.to_owned(),
                THREE_GLOBE_TOPOLOGY.to_owned(),
                sources::tile_url(&OpenTopoMap, world, key),
            ],
            Layer::Hybrid => vec![
                THREE_GLOBE_DAY.to_owned(),
                format!("{THREE_JS_PLANETS}/earth_atmos_2048.jpg"),
                sources::tile_url(&EsriWorldImagery, world, key),
            ],
            Layer::Streets => vec![
                sources::tile_url(&OpenStreetMap, world, key),
                sources::tile_url(&CartoVoyager, world, key),
            ],
        };

        urls.into_iter()
            .map(Candidate::Url)
            .chain([Candidate::Placeholder])
            .collect()
    }

    /// Whole-globe material maps, shared by all layers.
    pub fn material_candidates(&self, purpose: Purpose) -> Vec<Candidate> {
        let file = match purpose {
            Purpose::Normal => Some("earth_normal_2048.jpg"),
            Purpose::Specular => Some("earth_specular_2048.jpg"),
            Purpose::Clouds => Some("earth_clouds_1024.png"),
            Purpose::Diffuse => Some("earth_atmos_2048.jpg"),
            Purpose::Tile => None,
        };

        file.map(|file| Candidate::Url(format!("{THREE_JS_PLANETS}/{file}")))
            .into_iter()
            .chain([Candidate::Placeholder])
            .collect()
    }

    /// Who should be credited for the layer's tiles.
    pub fn attribution(&self, layer: Layer) -> Attribution {
        self.primary(layer).attribution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_YORK: TileId = TileId {
        zoom: 18,
        x: 77187,
        y: 98537,
    };

    #[test]
    fn zoom_domains_of_layers() {
        let providers = Providers::new();
        assert_eq!(providers.zoom_range(Layer::Streets), 0..=18);
        for layer in [Layer::Satellite, Layer::Terrain, Layer::Hybrid] {
            assert_eq!(providers.zoom_range(layer), 0..=8);
        }

        assert_eq!(providers.clamp_zoom(Layer::Streets, 20), 18);
        assert_eq!(providers.clamp_zoom(Layer::Streets, 12), 12);
        assert_eq!(providers.clamp_zoom(Layer::Terrain, 12), 8);
    }

    #[test]
    fn streets_use_xyz_order_without_key() {
        let providers = Providers::new().with_api_key("secret");
        assert_eq!(
            providers.tile_url(Layer::Streets, NEW_YORK),
            "https://tile.openstreetmap.org/18/77187/98537.png"
        );
    }

    #[test]
    fn satellite_uses_wmts_order_with_key() {
        let providers = Providers::new()
            .with_api_key("secret")
            .with_date("2023-01-02");
        let tile_id = TileId { zoom: 4, x: 3, y: 9 };

        assert_eq!(
            providers.tile_url(Layer::Satellite, tile_id),
            "https://gibs.earthdata.nasa.gov/wmts/epsg4326/best/\
             MODIS_Terra_CorrectedReflectance_TrueColor/default/2023-01-02/250m/4/9/3.jpg?api_key=secret"
        );
    }

    #[test]
    fn tile_url_never_leaves_zoom_domain() {
        let providers = Providers::new();
        let url = providers.tile_url(Layer::Terrain, NEW_YORK);
        assert!(url.contains("/31.25m/8/96/75.jpg"), "{url}");
    }

    #[test]
    fn tile_candidates_end_with_placeholder() {
        let providers = Providers::new();
        for layer in Layer::ALL {
            let candidates = providers.tile_candidates(layer, NEW_YORK);
            assert!(candidates.len() >= 3, "{layer}: {candidates:?}");
            assert_eq!(candidates.last(), Some(&Candidate::Placeholder));
            assert!(candidates[..candidates.len() - 1].iter().all(|c| c.url().is_some()));
        }
    }

    #[test]
    fn satellite_globe_has_alternate_providers() {
        let candidates = Providers::new().global_candidates(Layer::Satellite);

        let hosts: Vec<_> = candidates
            .iter()
            .filter_map(Candidate::url)
            .map(|url| url.split('/').nth(2).unwrap_or_default())
            .collect();

        assert!(hosts.len() >= 3, "{hosts:?}");
        assert_eq!(hosts[0], "eoimages.gsfc.nasa.gov");
        assert!(hosts[1..].iter().all(|host| *host != hosts[0]), "{hosts:?}");
        assert_eq!(candidates.last(), Some(&Candidate::Placeholder));
    }

    #[test]
    fn every_global_chain_ends_with_placeholder() {
        let providers = Providers::new();
        for layer in Layer::ALL {
            let candidates = providers.global_candidates(layer);
            assert!(candidates.len() >= 3, "{layer}");
            assert_eq!(candidates.last(), Some(&Candidate::Placeholder));
        }

        assert_eq!(
            providers.material_candidates(Purpose::Tile),
            vec![Candidate::Placeholder]
        );
        assert_eq!(providers.material_candidates(Purpose::Clouds).len(), 2);
    }

    #[test]
    fn keyless_by_default() {
        let providers = Providers::new();
        assert!(
            providers
                .global_candidates(Layer::Satellite)
                .iter()
                .filter_map(Candidate::url)
                .all(|url| !url.contains("token=")),
            "no key should leak into the urls"
        );
    }
}
