//! CPU-side textures and image decoding.
//!
//! Images are decoded through the [`ImageDecoder`] trait into tightly packed
//! RGB8 [`TextureImage`]s. The production decoder, [`PnmDecoder`], handles the
//! PPM family (`P3` ASCII and `P6` binary) via the `image` crate. GPU upload
//! lives in [`texture_resource`](super::texture_resource).

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture file not found: {path}")]
    FileNotFound { path: PathBuf },
    #[error("failed to read texture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(String),
}

/// Decoded RGB8 image in raster order (row by row from the top).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 3` bytes.
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height * 3) as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Reverses the raster order of the pixels. Each pixel keeps its channel
    /// order, so the result is the image rotated by 180 degrees.
    pub fn flip(&mut self) {
        let count = self.pixels.len() / 3;
        for i in 0..count / 2 {
            let j = count - 1 - i;
            for c in 0..3 {
                self.pixels.swap(i * 3 + c, j * 3 + c);
            }
        }
    }

    /// Expands to RGBA8 with opaque alpha, the layout wgpu textures expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .chunks_exact(3)
            .flat_map(|rgb| [rgb[0], rgb[1], rgb[2], 255])
            .collect()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = ((y * self.width + x) * 3) as usize;
        Some([
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
        ])
    }
}

/// Turns encoded image bytes into a [`TextureImage`].
pub trait ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<TextureImage, TextureError>;
}

/// Decoder for the PNM family (PPM, PGM, PBM), converting everything to RGB8.
#[derive(Debug, Clone, Copy, Default)]
pub struct PnmDecoder;

impl ImageDecoder for PnmDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<TextureImage, TextureError> {
        let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Pnm)
            .map_err(|e| TextureError::Decode(e.to_string()))?
            .to_rgb8();
        let (width, height) = image.dimensions();
        Ok(TextureImage::new(width, height, image.into_raw()))
    }
}

/// A decoded texture and the file it came from.
#[derive(Debug, Clone)]
pub struct Texture {
    path: PathBuf,
    image: TextureImage,
}

impl Texture {
    /// Reads and decodes the image file at `path`.
    ///
    /// # Arguments
    /// * `path` - Image file
    /// * `decoder` - Decoder for the file's format
    /// * `flip` - Whether to apply [`TextureImage::flip`] after decoding
    pub fn load(
        path: impl AsRef<Path>,
        decoder: &dyn ImageDecoder,
        flip: bool,
    ) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TextureError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => TextureError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let mut image = decoder.decode(&bytes)?;
        if flip {
            image.flip();
        }
        debug!(
            "Loaded texture {} ({}x{})",
            path.display(),
            image.width,
            image.height
        );

        Ok(Self {
            path: path.to_path_buf(),
            image,
        })
    }

    pub fn from_image(path: impl Into<PathBuf>, image: TextureImage) -> Self {
        Self {
            path: path.into(),
            image,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn image(&self) -> &TextureImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width
    }

    pub fn height(&self) -> u32 {
        self.image.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> TextureImage {
        TextureImage::new(
            2,
            2,
            vec![
                1, 2, 3, 4, 5, 6, //
                7, 8, 9, 10, 11, 12,
            ],
        )
    }

    #[test]
    fn test_flip_reverses_pixel_order() {
        let mut image = two_by_two();
        image.flip();
        assert_eq!(
            image.pixels,
            vec![10, 11, 12, 7, 8, 9, 4, 5, 6, 1, 2, 3]
        );
        image.flip();
        assert_eq!(image, two_by_two());
    }

    #[test]
    fn test_flip_odd_pixel_count_keeps_middle() {
        let mut image = TextureImage::new(3, 1, vec![1, 1, 1, 2, 2, 2, 3, 3, 3]);
        image.flip();
        assert_eq!(image.pixels, vec![3, 3, 3, 2, 2, 2, 1, 1, 1]);
    }

    #[test]
    fn test_to_rgba_and_pixel_lookup() {
        let image = two_by_two();
        assert_eq!(&image.to_rgba()[..8], &[1, 2, 3, 255, 4, 5, 6, 255]);
        assert_eq!(image.pixel(1, 1), Some([10, 11, 12]));
        assert_eq!(image.pixel(2, 0), None);
    }

    #[test]
    fn test_pnm_decoder_ascii() {
        let ppm = b"P3\n# comment\n2 1\n255\n255 0 0  0 255 0\n";
        let image = PnmDecoder.decode(ppm).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels, vec![255, 0, 0, 0, 255, 0]);
    }

    #[test]
    fn test_pnm_decoder_binary() {
        let mut ppm = b"P6\n1 2\n255\n".to_vec();
        ppm.extend_from_slice(&[9, 8, 7, 6, 5, 4]);
        let image = PnmDecoder.decode(&ppm).unwrap();
        assert_eq!((image.width, image.height), (1, 2));
        assert_eq!(image.pixels, vec![9, 8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_pnm_decoder_rejects_garbage() {
        assert!(matches!(
            PnmDecoder.decode(b"not an image"),
            Err(TextureError::Decode(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("arbor_missing_texture.ppm");
        let err = Texture::load(&path, &PnmDecoder, true).unwrap_err();
        assert!(matches!(err, TextureError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_and_flip() {
        let dir = std::env::temp_dir().join("arbor_texture_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("strip.ppm");
        std::fs::write(&path, b"P3\n2 1\n255\n1 2 3 4 5 6\n").unwrap();

        let texture = Texture::load(&path, &PnmDecoder, true).unwrap();
        assert_eq!(texture.image().pixels, vec![4, 5, 6, 1, 2, 3]);
        assert_eq!(texture.path(), path.as_path());

        let unflipped = Texture::load(&path, &PnmDecoder, false).unwrap();
        assert_eq!(unflipped.image().pixels, vec![1, 2, 3, 4, 5, 6]);
    }
}
