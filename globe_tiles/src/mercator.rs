//! Project the lat/lon coordinates into slippy map tiles using the Web Mercator.
//! <https://en.wikipedia.org/wiki/Web_Mercator_projection>
//! <https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames>

use crate::position::{Position, lon_lat};
use std::f64::consts::PI;

// zoom level   tile coverage  number of tiles  tile size(*) in degrees
// 0            1 tile         1 tile           360° x 170.1022°
// 1            2 × 2 tiles    4 tiles          180° x 85.0511°
// 2            4 × 4 tiles    16 tiles         90° x [variable]

/// Latitude at which Web Mercator turns the globe into a square. Anything beyond is clamped.
pub const MAX_LATITUDE: f64 = 85.0511;

/// Deepest zoom level a [`TileId`] can address.
pub const MAX_ZOOM: u8 = 30;

/// Number of tiles along one axis at given zoom.
pub fn total_tiles(zoom: u8) -> u32 {
    2u32.pow(u32::from(zoom.min(MAX_ZOOM)))
}

/// Project the position into the Mercator projection and normalize it to 0-1 range.
fn mercator_normalized(position: Position) -> (f64, f64) {
    let lat = position.y().clamp(-MAX_LATITUDE, MAX_LATITUDE);

    // Project into Mercator (cylindrical map projection).
    let x = position.x().to_radians();
    let y = lat.to_radians().tan().asinh();

    // Scale both x and y to 0-1 range.
    let x = (1. + (x / PI)) / 2.;
    let y = (1. - (y / PI)) / 2.;

    (x, y)
}

/// Coordinates of the OSM-like tile.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct TileId {
    /// Zoom level, where 0 means no zoom.
    /// See: <https://wiki.openstreetmap.org/wiki/Zoom_levels>
    pub zoom: u8,

    /// X number of the tile.
    pub x: u32,

    /// Y number of the tile.
    pub y: u32,
}

impl TileId {
    pub fn valid(&self) -> bool {
        self.zoom <= MAX_ZOOM && self.x < total_tiles(self.zoom) && self.y < total_tiles(self.zoom)
    }

    /// Neighbouring tile shifted by `dx` columns and `dy` rows. The grid does not wrap around,
    /// so `None` is returned for anything outside of it.
    pub fn offset(&self, dx: i64, dy: i64) -> Option<Self> {
        let total = i64::from(total_tiles(self.zoom));
        let x = i64::from(self.x) + dx;
        let y = i64::from(self.y) + dy;

        ((0..total).contains(&x) && (0..total).contains(&y)).then(|| Self {
            zoom: self.zoom,
            x: x as u32,
            y: y as u32,
        })
    }

    /// Tile at a lower (or the same) zoom level which covers this one.
    pub fn parent_at(&self, zoom: u8) -> Self {
        let levels = self.zoom.saturating_sub(zoom);
        Self {
            zoom: self.zoom - levels,
            x: self.x >> levels,
            y: self.y >> levels,
        }
    }

    /// Geographical position of the tile's center.
    pub fn center(&self) -> Position {
        let total = f64::from(total_tiles(self.zoom));
        unproject(
            (f64::from(self.x) + 0.5) / total,
            (f64::from(self.y) + 0.5) / total,
        )
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Calculate the tile containing the given position. Latitudes beyond [`MAX_LATITUDE`] and
/// longitudes beyond ±180° end up in the border tiles, so the result is always valid.
pub fn tile_id(position: Position, zoom: u8) -> TileId {
    let zoom = zoom.min(MAX_ZOOM);
    let (x, y) = mercator_normalized(position);

    // Map that into a big bitmap made out of web tiles.
    let number_of_tiles = f64::from(total_tiles(zoom));
    let last = total_tiles(zoom) - 1;

    // Float to int casts saturate, NaN ends up as 0.
    let x = ((x * number_of_tiles).floor() as u32).min(last);
    let y = ((y * number_of_tiles).floor() as u32).min(last);

    TileId { zoom, x, y }
}

/// Inverse of the normalized Mercator projection.
fn unproject(x: f64, y: f64) -> Position {
    let lon = (x * 2. - 1.) * PI;
    let lat = ((-y * 2. + 1.) * PI).sinh().atan();
    lon_lat(lon.to_degrees(), lat.to_degrees())
}
