//! Input sources.
//!
//! This module tracks which of {webcam, uploaded video, uploaded image} is the
//! active source and mediates acquisition through two capability interfaces:
//! - `MediaCaptureProvider`: opens a live video-only capture device
//! - `FilePicker`: yields zero or one file of a MIME category
//!
//! The source manager is responsible for:
//! - Replacing previously loaded media of the same kind on every load
//! - Owning the webcam handle exclusively until `release_webcam()`
//! - Sampling the current capture surface into an encoded `Frame`
//!
//! The source manager MUST NOT:
//! - Acquire a second webcam handle while one is held
//! - Keep frames after handing them to the caller

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::Serialize;

use crate::error::ClientError;
use crate::frame::Frame;

pub mod media;
pub mod picker;
#[cfg(feature = "webcam-v4l2")]
mod v4l2;
pub mod webcam;

pub use media::{StillImage, VideoClip};
pub use picker::{FilePicker, MediaCategory, PickedFile, QueuedFilePicker};
pub use webcam::{CaptureStream, MediaCaptureProvider, SyntheticCamera, WebcamProvider};

/// Input kinds a session can switch between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Webcam,
    #[default]
    Video,
    Image,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Webcam => "webcam",
            InputKind::Video => "video",
            InputKind::Image => "image",
        }
    }

    /// File category prompted for when this kind is selected.
    pub fn category(&self) -> Option<MediaCategory> {
        match self {
            InputKind::Webcam => None,
            InputKind::Video => Some(MediaCategory::Video),
            InputKind::Image => Some(MediaCategory::Image),
        }
    }

    /// Streaming sources run a periodic cycle; a still image is submitted once.
    pub fn is_streaming(&self) -> bool {
        !matches!(self, InputKind::Image)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "webcam" => Ok(InputKind::Webcam),
            "video" => Ok(InputKind::Video),
            "image" => Ok(InputKind::Image),
            other => Err(anyhow!(
                "unknown input kind '{}'; expected webcam, video or image",
                other
            )),
        }
    }
}

/// Which surface the view shows in place of the placeholder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibleSurface {
    Placeholder,
    Video,
    Image,
}

/// The pixel source currently eligible for sampling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub kind: InputKind,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Outcome of a successful file load, for status reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedMedia {
    pub kind: InputKind,
    pub name: String,
    pub frames: usize,
}

pub struct SourceManager {
    active: InputKind,
    capture: Box<dyn MediaCaptureProvider>,
    picker: Box<dyn FilePicker>,
    webcam: Option<Box<dyn CaptureStream>>,
    video: Option<VideoClip>,
    image: Option<StillImage>,
}

impl SourceManager {
    pub fn new(capture: Box<dyn MediaCaptureProvider>, picker: Box<dyn FilePicker>) -> Self {
        Self {
            active: InputKind::default(),
            capture,
            picker,
            webcam: None,
            video: None,
            image: None,
        }
    }

    pub fn active(&self) -> InputKind {
        self.active
    }

    pub fn set_active(&mut self, kind: InputKind) {
        self.active = kind;
    }

    /// Prompt the picker for the active kind's category and load the chosen file.
    ///
    /// Returns `Ok(None)` when the kind has no category or the prompt was cancelled.
    pub fn pick_and_load(&mut self) -> Result<Option<LoadedMedia>, ClientError> {
        let Some(category) = self.active.category() else {
            return Ok(None);
        };
        let picked = self
            .picker
            .pick(category)
            .map_err(|e| ClientError::MediaLoad(format!("{:#}", e)))?;
        let Some(file) = picked else {
            log::debug!("file selection for {} cancelled", category);
            return Ok(None);
        };
        self.load(file, category).map(Some)
    }

    fn load(&mut self, file: PickedFile, category: MediaCategory) -> Result<LoadedMedia, ClientError> {
        match category {
            MediaCategory::Video => {
                let mut clip = VideoClip::from_mjpeg(&file.name, file.bytes)
                    .map_err(|e| ClientError::MediaLoad(format!("{:#}", e)))?;
                clip.play();
                let loaded = LoadedMedia {
                    kind: InputKind::Video,
                    name: clip.name().to_string(),
                    frames: clip.frame_count(),
                };
                if self.video.replace(clip).is_some() {
                    log::debug!("replaced previously loaded video");
                }
                Ok(loaded)
            }
            MediaCategory::Image => {
                let still = StillImage::decode(&file.name, &file.bytes)
                    .map_err(|e| ClientError::MediaLoad(format!("{:#}", e)))?;
                let loaded = LoadedMedia {
                    kind: InputKind::Image,
                    name: still.name().to_string(),
                    frames: 1,
                };
                if self.image.replace(still).is_some() {
                    log::debug!("replaced previously loaded image");
                }
                Ok(loaded)
            }
        }
    }

    /// Acquire the webcam. A held handle must be released before a new one is opened.
    pub fn acquire_webcam(&mut self) -> Result<(), ClientError> {
        if self.webcam.is_some() {
            return Err(ClientError::DeviceAccess(
                "capture device already acquired".to_string(),
            ));
        }
        let stream = self.capture.open()?;
        log::info!(
            "webcam acquired: {} ({}x{})",
            stream.label(),
            stream.dimensions().0,
            stream.dimensions().1
        );
        self.webcam = Some(stream);
        Ok(())
    }

    /// Stop all tracks of the held webcam handle, if any.
    pub fn release_webcam(&mut self) -> bool {
        match self.webcam.take() {
            Some(mut stream) => {
                stream.stop();
                log::info!("webcam released: {}", stream.label());
                true
            }
            None => false,
        }
    }

    pub fn has_webcam(&self) -> bool {
        self.webcam.is_some()
    }

    pub fn play_video(&mut self) {
        if let Some(video) = self.video.as_mut() {
            video.play();
        }
    }

    pub fn pause_video(&mut self) {
        if let Some(video) = self.video.as_mut() {
            video.pause();
        }
    }

    pub fn video(&self) -> Option<&VideoClip> {
        self.video.as_ref()
    }

    pub fn image(&self) -> Option<&StillImage> {
        self.image.as_ref()
    }

    pub fn has_media(&self) -> bool {
        self.video.is_some() || self.image.is_some()
    }

    /// Drop every loaded media item.
    pub fn clear_media(&mut self) {
        self.video = None;
        self.image = None;
    }

    /// Surface the view should show for the active kind.
    pub fn visible_surface(&self) -> VisibleSurface {
        match self.active {
            InputKind::Webcam if self.webcam.is_some() => VisibleSurface::Video,
            InputKind::Video if self.video.is_some() => VisibleSurface::Video,
            InputKind::Image if self.image.is_some() => VisibleSurface::Image,
            _ => VisibleSurface::Placeholder,
        }
    }

    /// The surface eligible for sampling, or `None` when nothing is loaded or
    /// it has not reported non-zero dimensions.
    pub fn current_frame_surface(&self) -> Option<SurfaceInfo> {
        let (label, width, height) = match self.active {
            InputKind::Webcam => {
                let stream = self.webcam.as_ref()?;
                let (w, h) = stream.dimensions();
                (stream.label().to_string(), w, h)
            }
            InputKind::Video => {
                let video = self.video.as_ref()?;
                (video.name().to_string(), video.width(), video.height())
            }
            InputKind::Image => {
                let image = self.image.as_ref()?;
                (image.name().to_string(), image.width(), image.height())
            }
        };
        if width == 0 || height == 0 {
            return None;
        }
        Some(SurfaceInfo {
            kind: self.active,
            label,
            width,
            height,
        })
    }

    /// Sample the active surface into an encoded frame.
    pub fn capture_frame(&mut self) -> Result<Frame, ClientError> {
        if self.current_frame_surface().is_none() {
            return Err(ClientError::EmptyCapture);
        }
        let frame = match self.active {
            InputKind::Webcam => self.webcam.as_mut().map(|stream| stream.grab()),
            InputKind::Video => self.video.as_mut().map(|video| Ok(video.sample())),
            InputKind::Image => self.image.as_ref().map(|image| image.encode()),
        };
        match frame {
            Some(Ok(frame)) if !frame.is_empty() => Ok(frame),
            Some(Err(err)) => {
                log::warn!("frame capture failed: {:#}", err);
                Err(ClientError::EmptyCapture)
            }
            _ => Err(ClientError::EmptyCapture),
        }
    }
}
