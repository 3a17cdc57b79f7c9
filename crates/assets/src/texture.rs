use crate::{AssetError, ContentId};

/// A decoded image, kept as tightly packed RGBA8.
#[derive(Debug, Clone)]
pub struct TextureAsset {
    pub id: ContentId,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureAsset {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let image = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            id: ContentId::of(bytes),
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    pub fn byte_len(&self) -> usize {
        self.rgba.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_png() {
        let tex = TextureAsset::from_bytes(&png(4, 2)).unwrap();
        assert_eq!((tex.width, tex.height), (4, 2));
        assert_eq!(tex.byte_len(), 4 * 2 * 4);
        assert_eq!(&tex.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn rejects_non_images() {
        assert!(matches!(
            TextureAsset::from_bytes(b"definitely not a png"),
            Err(AssetError::Image(_))
        ));
    }
}
