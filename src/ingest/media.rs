//! Loaded media surfaces.
//!
//! This module provides the two file-backed capture surfaces:
//! - `VideoClip`: a motion-JPEG clip (concatenated JPEG frames, or an AVI
//!   with MJPEG payloads) that loops while playing
//! - `StillImage`: any still the `image` crate decodes, re-encoded to JPEG on
//!   every capture
//!
//! A video reports zero dimensions when its first frame cannot be decoded.
//! Such a clip stays loaded but is not eligible for sampling.

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::frame::Frame;

const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;

pub struct VideoClip {
    name: String,
    frames: Vec<Vec<u8>>,
    width: u32,
    height: u32,
    position: usize,
    playing: bool,
}

impl VideoClip {
    /// Split a motion-JPEG byte stream into frames.
    pub fn from_mjpeg(name: &str, bytes: Vec<u8>) -> Result<Self> {
        let frames = split_jpeg_frames(&bytes);
        if frames.is_empty() {
            return Err(anyhow!("{} contains no motion-jpeg frames", name));
        }
        let (width, height) = match jpeg_dimensions(&frames[0]) {
            Ok(dims) => dims,
            Err(err) => {
                log::warn!("VideoClip: {} has no readable first frame: {:#}", name, err);
                (0, 0)
            }
        };
        log::info!(
            "VideoClip: loaded {} ({} frames, {}x{})",
            name,
            frames.len(),
            width,
            height
        );
        Ok(Self {
            name: name.to_string(),
            frames,
            width,
            height,
            position: 0,
            playing: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Sample the frame under the playhead. Playback advances one frame per
    /// sample and loops at the end; a paused clip keeps returning the same frame.
    pub fn sample(&mut self) -> Frame {
        let bytes = self.frames[self.position].clone();
        if self.playing {
            self.position = (self.position + 1) % self.frames.len();
        }
        Frame::from_jpeg(bytes, self.width, self.height)
    }
}

pub struct StillImage {
    name: String,
    image: DynamicImage,
}

impl StillImage {
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).with_context(|| format!("decode {}", name))?;
        log::info!(
            "StillImage: loaded {} ({}x{})",
            name,
            image.width(),
            image.height()
        );
        Ok(Self {
            name: name.to_string(),
            image,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn encode(&self) -> Result<Frame> {
        Frame::encode(&self.image)
    }
}

fn jpeg_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .context("decode first video frame")?;
    Ok(image.dimensions())
}

/// Every complete SOI..EOI span in `buffer`, in order.
pub(crate) fn split_jpeg_frames(buffer: &[u8]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while let Some((start, end)) = find_jpeg_bounds(&buffer[offset..]) {
        let frame = &buffer[offset + start..offset + end];
        if frame.len() <= MAX_JPEG_BYTES {
            frames.push(frame.to_vec());
        } else {
            log::warn!("skipping oversized jpeg frame ({} bytes)", frame.len());
        }
        offset += end;
    }
    frames
}

pub(crate) fn find_jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let start = buffer.windows(2).position(|pair| pair == [0xFF, 0xD8])?;
    let end = walk_segments(buffer, start + 2)?;
    Some((start, end))
}

/// Offset one past the EOI of the image whose SOI ends at `pos`. Marker
/// segments are skipped by their length fields, so an EOI inside an
/// embedded thumbnail does not end the frame. `None` means the frame is
/// truncated.
fn walk_segments(buffer: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        if *buffer.get(pos)? != 0xFF {
            return scan_entropy(buffer, pos);
        }
        match *buffer.get(pos + 1)? {
            // fill byte
            0xFF => pos += 1,
            0xD9 => return Some(pos + 2),
            // standalone markers: TEM, RSTn
            0x01 | 0xD0..=0xD7 => pos += 2,
            0xDA => match segment_len(buffer, pos)? {
                Some(len) => return scan_entropy(buffer, pos + 2 + len),
                None => return scan_entropy(buffer, pos + 2),
            },
            _ => match segment_len(buffer, pos)? {
                Some(len) => pos += 2 + len,
                None => return scan_entropy(buffer, pos + 2),
            },
        }
    }
}

/// Length field of the segment whose marker sits at `pos`. The inner `None`
/// flags a length too short to be valid.
fn segment_len(buffer: &[u8], pos: usize) -> Option<Option<usize>> {
    let hi = *buffer.get(pos + 2)?;
    let lo = *buffer.get(pos + 3)?;
    let len = u16::from_be_bytes([hi, lo]) as usize;
    Some((len >= 2).then_some(len))
}

/// Scan entropy-coded data up to the next real marker. Stuffed `FF 00`
/// bytes and restart markers belong to the scan; any other marker hands
/// control back to the segment walk (progressive images carry several scans).
fn scan_entropy(buffer: &[u8], mut pos: usize) -> Option<usize> {
    while pos + 1 < buffer.len() {
        if buffer[pos] == 0xFF {
            match buffer[pos + 1] {
                0x00 | 0xFF | 0xD0..=0xD7 => {}
                0xD9 => return Some(pos + 2),
                _ => return walk_segments(buffer, pos),
            }
        }
        pos += 1;
    }
    None
}
