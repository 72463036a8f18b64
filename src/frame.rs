//! Encoded frames.
//!
//! - `Frame`: one JPEG-encoded still sampled from the active capture surface.
//!
//! A frame is created per capture tick and moved into exactly one outbound
//! request. There is no `Clone`: once submitted, the bytes are gone.

use anyhow::{anyhow, Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

/// JPEG quality used when re-encoding decoded pixels.
pub const JPEG_QUALITY: u8 = 90;

/// Multipart filename every frame is uploaded under.
pub const FRAME_FILENAME: &str = "frame.jpg";

pub const FRAME_CONTENT_TYPE: &str = "image/jpeg";

/// One sampled, encoded still image.
#[derive(Debug)]
pub struct Frame {
    bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap bytes that are already JPEG-encoded (MJPEG clip frames, MJPG webcams).
    pub fn from_jpeg(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    /// Encode a decoded image at `JPEG_QUALITY`.
    pub fn encode(image: &DynamicImage) -> Result<Self> {
        let rgb = image.to_rgb8();
        Self::encode_rgb(&rgb)
    }

    /// Encode packed RGB24 pixels.
    pub fn encode_rgb(rgb: &RgbImage) -> Result<Self> {
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(anyhow!("cannot encode a {}x{} frame", width, height));
        }
        let mut bytes = Vec::with_capacity(width as usize * height as usize / 4);
        JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY)
            .encode_image(rgb)
            .context("encode jpeg frame")?;
        Ok(Self {
            bytes,
            width,
            height,
        })
    }

    /// Encode raw RGB24 bytes of the given dimensions.
    pub fn encode_rgb_bytes(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let rgb = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("pixel buffer does not match {}x{} rgb", width, height))?;
        Self::encode_rgb(&rgb)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Hand the encoded bytes to an outbound request.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn encoded_frames_are_jpeg() -> Result<()> {
        let frame = Frame::encode_rgb(&gradient(32, 24))?;
        assert_eq!((frame.width, frame.height), (32, 24));
        let bytes = frame.into_bytes();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
        Ok(())
    }

    #[test]
    fn rgb_bytes_must_match_dimensions() {
        assert!(Frame::encode_rgb_bytes(vec![0u8; 10], 4, 4).is_err());
    }

    #[test]
    fn zero_sized_images_are_rejected() {
        assert!(Frame::encode_rgb(&RgbImage::new(0, 0)).is_err());
    }
}
