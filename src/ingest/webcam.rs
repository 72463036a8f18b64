//! Webcam capture.
//!
//! This module provides the `MediaCaptureProvider` capability and its default
//! implementation, `WebcamProvider`, which opens:
//! - a synthetic camera for `stub://` devices (testing, demos)
//! - a V4L2 device node (feature: webcam-v4l2)
//!
//! `stub://denied` always fails, to rehearse a refused permission prompt.

use anyhow::{anyhow, Result};

use crate::config::WebcamSettings;
use crate::error::ClientError;
use crate::frame::Frame;

/// A live, video-only capture handle.
pub trait CaptureStream {
    fn label(&self) -> &str;

    /// Current frame dimensions; zero until the device reports a format.
    fn dimensions(&self) -> (u32, u32);

    /// Grab and encode the current frame.
    fn grab(&mut self) -> Result<Frame>;

    /// Stop every track of the stream. Further grabs fail.
    fn stop(&mut self);
}

pub trait MediaCaptureProvider {
    /// Request a video-only capture device.
    fn open(&mut self) -> Result<Box<dyn CaptureStream>, ClientError>;
}

/// Opens the webcam named by `WebcamSettings::device`.
pub struct WebcamProvider {
    settings: WebcamSettings,
}

impl WebcamProvider {
    pub fn new(settings: WebcamSettings) -> Self {
        Self { settings }
    }
}

impl MediaCaptureProvider for WebcamProvider {
    fn open(&mut self) -> Result<Box<dyn CaptureStream>, ClientError> {
        let device = self.settings.device.as_str();
        if device == "stub://denied" {
            return Err(ClientError::DeviceAccess(
                "permission denied by user".to_string(),
            ));
        }
        if device.starts_with("stub://") {
            return Ok(Box::new(SyntheticCamera::new(self.settings.clone())));
        }
        #[cfg(feature = "webcam-v4l2")]
        {
            super::v4l2::V4l2Camera::open(self.settings.clone())
                .map(|camera| Box::new(camera) as Box<dyn CaptureStream>)
                .map_err(|e| ClientError::DeviceAccess(format!("{:#}", e)))
        }
        #[cfg(not(feature = "webcam-v4l2"))]
        {
            Err(ClientError::DeviceAccess(format!(
                "no capture device for {}; device capture requires the webcam-v4l2 feature",
                device
            )))
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic camera (stub://)
// ----------------------------------------------------------------------------

pub struct SyntheticCamera {
    settings: WebcamSettings,
    frame_count: u64,
    /// Simulated scene, shifted every 50 frames.
    scene_state: u8,
    live: bool,
}

impl SyntheticCamera {
    pub fn new(settings: WebcamSettings) -> Self {
        log::info!("SyntheticCamera: opened {} (synthetic)", settings.device);
        Self {
            settings,
            frame_count: 0,
            scene_state: 0,
            live: true,
        }
    }

    pub fn frames_captured(&self) -> u64 {
        self.frame_count
    }

    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = self.settings.width as usize * self.settings.height as usize * 3;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }
}

impl CaptureStream for SyntheticCamera {
    fn label(&self) -> &str {
        &self.settings.device
    }

    fn dimensions(&self) -> (u32, u32) {
        if self.live {
            (self.settings.width, self.settings.height)
        } else {
            (0, 0)
        }
    }

    fn grab(&mut self) -> Result<Frame> {
        if !self.live {
            return Err(anyhow!("capture stream {} stopped", self.settings.device));
        }
        self.frame_count += 1;
        let pixels = self.generate_synthetic_pixels();
        Frame::encode_rgb_bytes(pixels, self.settings.width, self.settings.height)
    }

    fn stop(&mut self) {
        self.live = false;
    }
}
