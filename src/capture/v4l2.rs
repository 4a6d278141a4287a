//! V4L2 capture backend (feature `capture-v4l2`).
//!
//! Opens local `/dev/video*` devices for deployments where the daemon runs on
//! the classroom machine itself. Enumeration lists every V4L2 node; the
//! platform default is the first node.

use anyhow::Context;
use ouroboros::self_referencing;

use crate::capture::backend::{CameraDevice, CaptureBackend, FrameStream};
use crate::error::HeadcountError;
use crate::frame::VideoFrame;

/// Preferred capture geometry. The device may negotiate something else; the
/// stream reports whatever was actually granted.
#[derive(Clone, Debug)]
pub struct V4l2Settings {
    pub width: u32,
    pub height: u32,
    pub target_fps: u32,
}

impl Default for V4l2Settings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            target_fps: 10,
        }
    }
}

pub struct V4l2Backend {
    settings: V4l2Settings,
}

impl V4l2Backend {
    pub fn new(settings: V4l2Settings) -> Self {
        Self { settings }
    }

    fn open_path(&self, path: &str) -> Result<Box<dyn FrameStream>, HeadcountError> {
        V4l2Stream::open(path, &self.settings)
            .map(|stream| Box::new(stream) as Box<dyn FrameStream>)
            .map_err(|e| HeadcountError::Capture(format!("{:#}", e)))
    }
}

impl CaptureBackend for V4l2Backend {
    fn enumerate(&mut self) -> Result<Vec<CameraDevice>, HeadcountError> {
        let nodes = v4l::context::enum_devices();
        if nodes.is_empty() {
            return Err(HeadcountError::NoCameraAvailable);
        }
        Ok(nodes
            .iter()
            .map(|node| CameraDevice {
                id: node.path().display().to_string(),
                label: node
                    .name()
                    .unwrap_or_else(|| format!("video{}", node.index())),
            })
            .collect())
    }

    fn open(&mut self, device: &CameraDevice) -> Result<Box<dyn FrameStream>, HeadcountError> {
        self.open_path(&device.id)
    }

    fn open_default(&mut self) -> Result<Box<dyn FrameStream>, HeadcountError> {
        let nodes = v4l::context::enum_devices();
        let first = nodes.first().ok_or(HeadcountError::NoCameraAvailable)?;
        self.open_path(&first.path().display().to_string())
    }
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

struct V4l2Stream {
    path: String,
    state: Option<V4l2State>,
    active_width: u32,
    active_height: u32,
}

impl V4l2Stream {
    fn open(path: &str, settings: &V4l2Settings) -> anyhow::Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device =
            v4l::Device::with_path(path).with_context(|| format!("open v4l2 device {}", path))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = settings.width;
        format.height = settings.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("failed to set format on {}: {}", path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };

        if settings.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(settings.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!("failed to set fps on {}: {}", path, err);
            }
        }

        let active_width = format.width;
        let active_height = format.height;

        let state = V4l2StateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "v4l2 stream opened on {} ({}x{})",
            path,
            active_width,
            active_height
        );
        Ok(Self {
            path: path.to_string(),
            state: Some(state),
            active_width,
            active_height,
        })
    }
}

impl FrameStream for V4l2Stream {
    fn next_frame(&mut self) -> Result<VideoFrame, HeadcountError> {
        use v4l::io::traits::CaptureStream;

        let state = self
            .state
            .as_mut()
            .ok_or_else(|| HeadcountError::Capture(format!("stream on {} is closed", self.path)))?;
        let (buf, _meta) = state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| HeadcountError::Capture(format!("capture v4l2 frame: {}", err)))?;
        VideoFrame::new(buf.to_vec(), self.active_width, self.active_height)
    }

    fn native_dimensions(&self) -> Option<(u32, u32)> {
        self.state
            .as_ref()
            .map(|_| (self.active_width, self.active_height))
    }

    fn close(&mut self) {
        if self.state.take().is_some() {
            log::info!("v4l2 stream on {} released", self.path);
        }
    }
}
