//! V4L2 webcam capture.
//!
//! Opens a local device node (e.g. /dev/video0), asks for MJPG so frames
//! arrive already JPEG-encoded, and falls back to RGB3 which is encoded
//! in-process. Any other negotiated format is refused at open time.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::webcam::CaptureStream;
use crate::config::WebcamSettings;
use crate::frame::Frame;

const FOURCC_MJPG: &[u8; 4] = b"MJPG";
const FOURCC_RGB3: &[u8; 4] = b"RGB3";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PixelFormat {
    Mjpg,
    Rgb3,
}

#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

pub(crate) struct V4l2Camera {
    settings: WebcamSettings,
    state: Option<DeviceState>,
    format: PixelFormat,
    width: u32,
    height: u32,
    frame_count: u64,
}

impl V4l2Camera {
    pub(crate) fn open(settings: WebcamSettings) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&settings.device)
            .with_context(|| format!("open v4l2 device {}", settings.device))?;
        let mut requested = device.format().context("read v4l2 format")?;
        requested.width = settings.width;
        requested.height = settings.height;
        requested.fourcc = v4l::FourCC::new(FOURCC_MJPG);

        let negotiated = match device.set_format(&requested) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Camera: MJPG rejected on {}: {}; trying RGB3",
                    settings.device,
                    err
                );
                requested.fourcc = v4l::FourCC::new(FOURCC_RGB3);
                device
                    .set_format(&requested)
                    .context("set v4l2 capture format")?
            }
        };
        let format = if negotiated.fourcc == v4l::FourCC::new(FOURCC_MJPG) {
            PixelFormat::Mjpg
        } else if negotiated.fourcc == v4l::FourCC::new(FOURCC_RGB3) {
            PixelFormat::Rgb3
        } else {
            return Err(anyhow!(
                "unsupported v4l2 pixel format {} on {}",
                negotiated.fourcc,
                settings.device
            ));
        };

        if settings.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(settings.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Camera: failed to set fps on {}: {}",
                    settings.device,
                    err
                );
            }
        }

        let state = DeviceStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "V4l2Camera: opened {} ({}x{}, {:?})",
            settings.device,
            negotiated.width,
            negotiated.height,
            format
        );
        Ok(Self {
            width: negotiated.width,
            height: negotiated.height,
            settings,
            state: Some(state),
            format,
            frame_count: 0,
        })
    }
}

impl CaptureStream for V4l2Camera {
    fn label(&self) -> &str {
        &self.settings.device
    }

    fn dimensions(&self) -> (u32, u32) {
        if self.state.is_some() {
            (self.width, self.height)
        } else {
            (0, 0)
        }
    }

    fn grab(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream as _;

        let state = self.state.as_mut().context("v4l2 device stopped")?;
        let bytes = state.with_mut(|fields| -> Result<Vec<u8>> {
            let (buf, meta) = fields.stream.next().context("capture v4l2 frame")?;
            let used = (meta.bytesused as usize).min(buf.len());
            Ok(buf[..used].to_vec())
        })?;
        self.frame_count += 1;

        match self.format {
            PixelFormat::Mjpg => Ok(Frame::from_jpeg(bytes, self.width, self.height)),
            PixelFormat::Rgb3 => Frame::encode_rgb_bytes(bytes, self.width, self.height),
        }
    }

    fn stop(&mut self) {
        if self.state.take().is_some() {
            log::info!(
                "V4l2Camera: stopped {} after {} frames",
                self.settings.device,
                self.frame_count
            );
        }
    }
}
