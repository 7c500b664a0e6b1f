//! Procedurally generated images used when nothing could be downloaded. Each [`Purpose`]
//! gets its own recognizable look, so a missing tile is not mistaken for e.g. a dark
//! specular map.

use ab_glyph::{FontRef, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use rand::Rng;

use crate::texture::{Origin, Texture};
use crate::Purpose;

/// Whole-globe maps use the 2:1 equirectangular layout.
pub const GLOBE_SIZE: [u32; 2] = [512, 256];

pub const TILE_SIZE: u32 = 256;

const SKY: [f32; 3] = [135., 190., 235.];
const GROUND: [f32; 3] = [90., 120., 60.];
const SEA: [f32; 3] = [20., 60., 120.];

const GRID_BACKGROUND: Rgba<u8> = Rgba([40, 40, 48, 255]);
const GRID_LINE: Rgba<u8> = Rgba([255, 0, 255, 255]);
const GRID_TEXT: Rgba<u8> = Rgba([255, 220, 0, 255]);
const GRID_SPACING: u32 = 32;
const LABEL_SIZE: f32 = 40.;

const CLOUD_BLOBS: usize = 6;

/// Synthesize a placeholder using the thread's random generator.
pub fn synthesize(purpose: Purpose) -> Texture {
    synthesize_with(purpose, &mut rand::rng())
}

/// Synthesize a placeholder using given random generator.
pub fn synthesize_with(purpose: Purpose, rng: &mut impl Rng) -> Texture {
    let image = match purpose {
        Purpose::Diffuse => diffuse(rng),
        Purpose::Normal => normal(rng),
        Purpose::Specular => specular(rng),
        Purpose::Clouds => clouds(rng),
        Purpose::Tile => tile(),
    };
    log::trace!("Synthesized {purpose:?} placeholder.");
    Texture::from_image(image, Origin::Placeholder(purpose))
}

fn lerp(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn channel(value: f32) -> u8 {
    value.round().clamp(0., 255.) as u8
}

/// Sky at the top, ground in the middle, sea at the bottom, with some speckles.
fn diffuse(rng: &mut impl Rng) -> RgbaImage {
    let [width, height] = GLOBE_SIZE;
    let mut image = RgbaImage::new(width, height);

    for (_, y, pixel) in image.enumerate_pixels_mut() {
        let t = y as f32 / (height - 1) as f32;
        let mut color = if t < 0.5 {
            lerp(SKY, GROUND, t * 2.)
        } else {
            lerp(GROUND, SEA, (t - 0.5) * 2.)
        };

        if rng.random_bool(0.03) {
            let noise = rng.random_range(-40.0..40.0);
            color = color.map(|c| c + noise);
        }

        *pixel = Rgba([channel(color[0]), channel(color[1]), channel(color[2]), 255]);
    }

    image
}

/// Flat bump field, slightly perturbed.
fn normal(rng: &mut impl Rng) -> RgbaImage {
    let [width, height] = GLOBE_SIZE;
    RgbaImage::from_fn(width, height, |_, _| {
        let mut perturbed = || channel(128. + rng.random_range(-6.0..6.0));
        Rgba([perturbed(), perturbed(), perturbed(), 255])
    })
}

/// Mostly not reflective, with sparse bright flecks.
fn specular(rng: &mut impl Rng) -> RgbaImage {
    let [width, height] = GLOBE_SIZE;
    RgbaImage::from_fn(width, height, |_, _| {
        if rng.random_bool(0.01) {
            let fleck = rng.random_range(200..=255);
            Rgba([fleck, fleck, fleck, 255])
        } else {
            Rgba([12, 12, 12, 255])
        }
    })
}

struct Blob {
    x: f32,
    y: f32,
    radius: f32,
}

/// Transparent sky with a few soft clouds.
fn clouds(rng: &mut impl Rng) -> RgbaImage {
    let [width, height] = GLOBE_SIZE;
    let blobs: Vec<_> = (0..CLOUD_BLOBS)
        .map(|_| Blob {
            x: rng.random_range(0.0..width as f32),
            y: rng.random_range(0.0..height as f32),
            radius: rng.random_range(16.0..48.0),
        })
        .collect();

    RgbaImage::from_fn(width, height, |x, y| {
        let density = blobs
            .iter()
            .map(|blob| {
                let distance = (x as f32 - blob.x).hypot(y as f32 - blob.y);
                (1. - distance / blob.radius).max(0.).powi(2)
            })
            .fold(0f32, f32::max);

        Rgba([255, 255, 255, channel(density * 220.)])
    })
}

/// Debug grid with "NO TILE" written over it.
fn tile() -> RgbaImage {
    let mut image = RgbaImage::from_fn(TILE_SIZE, TILE_SIZE, |x, y| {
        let border = x < 2 || y < 2 || x >= TILE_SIZE - 2 || y >= TILE_SIZE - 2;
        if border || x % GRID_SPACING == 0 || y % GRID_SPACING == 0 {
            GRID_LINE
        } else {
            GRID_BACKGROUND
        }
    });

    label(&mut image, "NO TILE");
    image
}

/// Write `text` in the middle of the image.
fn label(image: &mut RgbaImage, text: &str) {
    let font = match FontRef::try_from_slice(epaint_default_fonts::HACK_REGULAR) {
        Ok(font) => font,
        Err(e) => {
            log::warn!("Could not load the label font: {e}.");
            return;
        }
    };

    let scale = PxScale::from(LABEL_SIZE);
    let (width, height) = text_size(scale, &font, text);
    let x = i32::try_from(image.width().saturating_sub(width) / 2).unwrap_or_default();
    let y = i32::try_from(image.height().saturating_sub(height) / 2).unwrap_or_default();

    draw_text_mut(image, GRID_TEXT, x, y, scale, &font, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn image(purpose: Purpose) -> std::sync::Arc<RgbaImage> {
        synthesize_with(purpose, &mut StdRng::seed_from_u64(7))
            .image()
            .unwrap()
    }

    #[test]
    fn placeholders_know_their_purpose() {
        for purpose in [
            Purpose::Diffuse,
            Purpose::Normal,
            Purpose::Specular,
            Purpose::Clouds,
            Purpose::Tile,
        ] {
            let texture = synthesize(purpose);
            assert!(texture.is_placeholder());
            assert_eq!(texture.origin(), &Origin::Placeholder(purpose));
        }
    }

    #[test]
    fn same_seed_gives_same_image() {
        let a = synthesize_with(Purpose::Clouds, &mut StdRng::seed_from_u64(1));
        let b = synthesize_with(Purpose::Clouds, &mut StdRng::seed_from_u64(1));
        assert_eq!(*a.image().unwrap(), *b.image().unwrap());
    }

    #[test]
    fn diffuse_goes_from_sky_to_sea() {
        let image = image(Purpose::Diffuse);
        assert_eq!(image.dimensions(), (512, 256));

        let blueness = |y: u32| {
            (0..image.width())
                .map(|x| {
                    let pixel = image.get_pixel(x, y);
                    f32::from(pixel[2]) - f32::from(pixel[1])
                })
                .sum::<f32>()
                / image.width() as f32
        };

        // Sky and sea are blue, ground is not.
        assert!(blueness(0) > 0., "sky");
        assert!(blueness(128) < 0., "ground");
        assert!(blueness(255) > 0., "sea");
    }

    #[test]
    fn normal_is_mid_grey() {
        let image = image(Purpose::Normal);
        assert!(
            image
                .pixels()
                .all(|p| (121..=135).contains(&p[0]) && p[3] == 255),
            "every pixel should be close to 128"
        );
    }

    #[test]
    fn specular_is_dark_with_flecks() {
        let image = image(Purpose::Specular);
        let bright = image.pixels().filter(|p| p[0] >= 200).count();
        let total = image.pixels().count();
        assert!(bright > 0, "there should be some flecks");
        assert!(bright < total / 20, "but only a few of them");
    }

    #[test]
    fn clouds_are_mostly_transparent() {
        let image = image(Purpose::Clouds);
        let transparent = image.pixels().filter(|p| p[3] == 0).count();
        let opaque = image.pixels().filter(|p| p[3] > 100).count();
        assert!(transparent > image.pixels().count() / 2, "sky");
        assert!(opaque > 0, "clouds");
    }

    #[test]
    fn tile_is_a_labeled_grid() {
        let image = image(Purpose::Tile);
        assert_eq!(image.dimensions(), (TILE_SIZE, TILE_SIZE));
        assert_eq!(*image.get_pixel(0, 0), GRID_LINE);
        assert_eq!(*image.get_pixel(64, 17), GRID_LINE);
        assert_eq!(*image.get_pixel(17, 17), GRID_BACKGROUND);
        assert!(
            image
                .pixels()
                .any(|p| p[0] > 240 && p[1] > 200 && p[2] < 40),
            "label should be drawn"
        );
    }

    #[test]
    fn tile_does_not_look_like_other_placeholders() {
        let tile = image(Purpose::Tile);
        let corner = *tile.get_pixel(0, 0);
        for purpose in [Purpose::Diffuse, Purpose::Normal, Purpose::Specular, Purpose::Clouds] {
            assert!(
                image(purpose).pixels().all(|p| *p != corner),
                "{purpose:?} uses grid color"
            );
        }
    }
}
