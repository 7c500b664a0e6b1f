use crate::TileId;

/// Imagery style of the globe's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum Layer {
    #[default]
    Satellite,
    Terrain,
    Hybrid,
    Streets,
}

impl Layer {
    pub const ALL: [Self; 4] = [Self::Satellite, Self::Terrain, Self::Hybrid, Self::Streets];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Satellite => "satellite",
            Self::Terrain => "terrain",
            Self::Hybrid => "hybrid",
            Self::Streets => "streets",
        }
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the loaded image is going to be used for by the renderer. Decides how the
/// placeholder looks when nothing could be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Purpose {
    Diffuse,
    Normal,
    Specular,
    Clouds,
    Tile,
}

/// Everything needed to resolve a single image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceRequest {
    pub layer: Layer,

    /// Single map tile. `None` means the whole-globe texture.
    pub tile_id: Option<TileId>,

    pub purpose: Purpose,
}

impl ResourceRequest {
    /// Whole-globe surface texture of the layer.
    pub fn globe(layer: Layer) -> Self {
        Self {
            layer,
            tile_id: None,
            purpose: Purpose::Diffuse,
        }
    }

    /// Whole-globe material, such as clouds. These do not depend on the layer.
    pub fn material(purpose: Purpose) -> Self {
        Self {
            layer: Layer::default(),
            tile_id: None,
            purpose,
        }
    }

    pub fn tile(layer: Layer, tile_id: TileId) -> Self {
        Self {
            layer,
            tile_id: Some(tile_id),
            purpose: Purpose::Tile,
        }
    }
}
