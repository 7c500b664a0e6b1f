use std::sync::{Arc, PoisonError, RwLock};

use image::{ImageError, RgbaImage};

use crate::Purpose;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(transparent)]
    Decode(#[from] ImageError),

    #[error("texture was disposed")]
    Disposed,
}

/// Where the pixels came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Network(String),
    Placeholder(Purpose),
}

struct Inner {
    image: RwLock<Option<Arc<RgbaImage>>>,
    origin: Origin,
}

/// Shared handle to a decoded image, which the renderer uses as a surface material.
///
/// Clones refer to the same image. Once [`Texture::dispose`] is called on any of them, the
/// pixels are released and every clone refuses to give them out.
#[derive(Clone)]
pub struct Texture(Arc<Inner>);

impl Texture {
    /// Decode an image downloaded from `url`.
    pub fn from_bytes(bytes: &[u8], url: impl Into<String>) -> Result<Self, TextureError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        Ok(Self::from_image(image, Origin::Network(url.into())))
    }

    pub fn from_image(image: RgbaImage, origin: Origin) -> Self {
        Self(Arc::new(Inner {
            image: RwLock::new(Some(Arc::new(image))),
            origin,
        }))
    }

    /// Pixels of the texture, unless it was disposed.
    pub fn image(&self) -> Result<Arc<RgbaImage>, TextureError> {
        self.0
            .image
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TextureError::Disposed)
    }

    pub fn size(&self) -> Option<[u32; 2]> {
        self.image()
            .ok()
            .map(|image| [image.width(), image.height()])
    }

    pub fn origin(&self) -> &Origin {
        &self.0.origin
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.0.origin, Origin::Placeholder(_))
    }

    /// Release the pixels. Affects all clones of this texture.
    pub fn dispose(&self) {
        self.0
            .image
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }

    pub fn is_disposed(&self) -> bool {
        self.0
            .image
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Whether both handles refer to the same texture.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Convert into egui's [`egui::ColorImage`], so it can be uploaded with
    /// [`egui::Context::load_texture`].
    #[cfg(feature = "egui")]
    pub fn to_color_image(&self) -> Result<egui::ColorImage, TextureError> {
        let image = self.image()?;
        Ok(egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_raw(),
        ))
    }
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("origin", &self.0.origin)
            .field("size", &self.size())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::png;

    #[test]
    fn decoding_png() {
        let texture = Texture::from_bytes(&png(4, 2), "https://example.com/a.png").unwrap();
        assert_eq!(texture.size(), Some([4, 2]));
        assert_eq!(
            texture.origin(),
            &Origin::Network("https://example.com/a.png".to_owned())
        );
        assert!(!texture.is_placeholder());
    }

    #[test]
    fn garbage_is_not_decoded() {
        assert!(matches!(
            Texture::from_bytes(b"definitely not an image", "x"),
            Err(TextureError::Decode(_))
        ));
    }

    #[test]
    fn disposing_affects_every_clone() {
        let texture = Texture::from_image(RgbaImage::new(2, 2), Origin::Placeholder(Purpose::Tile));
        let clone = texture.clone();
        assert!(clone.ptr_eq(&texture));

        texture.dispose();

        assert!(clone.is_disposed());
        assert!(matches!(clone.image(), Err(TextureError::Disposed)));
        assert_eq!(clone.size(), None);

        // Disposing twice is fine.
        clone.dispose();
    }
}
