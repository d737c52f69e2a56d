use frame_lapse_common::config::CameraConfig;
use tracing::{debug, info, warn};

use super::{CaptureDevice, Orientation};
use crate::CaptureError;

/// Camera attached to this host, read through Video4Linux2 in MJPG format.
///
/// Mirroring is requested from the driver through the `HFLIP`/`VFLIP`
/// controls. Drivers that reject a control get that flip applied to the
/// JPEG instead.
pub struct V4l2Camera {
    camera: rscam::Camera,
    device: String,
    warmup_frames: u32,
    quality: u8,
    /// Flips the driver could not do itself.
    software: Orientation,
}

impl V4l2Camera {
    pub fn open(config: &CameraConfig) -> Result<Self, CaptureError> {
        let device_err = |source| CaptureError::Device {
            device: config.device.clone(),
            source,
        };

        let mut camera = rscam::new(&config.device).map_err(device_err)?;
        camera
            .start(&rscam::Config {
                interval: (1, 30),
                resolution: (config.width, config.height),
                format: b"MJPG",
                ..Default::default()
            })
            .map_err(|e| CaptureError::DeviceStart {
                device: config.device.clone(),
                reason: e.to_string(),
            })?;

        info!(
            device = config.device,
            width = config.width,
            height = config.height,
            "started V4L2 stream"
        );

        Ok(Self {
            camera,
            device: config.device.clone(),
            warmup_frames: config.warmup_frames,
            quality: config.quality,
            software: Orientation::default(),
        })
    }

    fn set_flip(&self, control: u32, name: &str, on: bool) -> bool {
        match self.camera.set_control(control, &on) {
            Ok(()) => true,
            Err(e) => {
                warn!(device = self.device, control = name, error = %e, "driver refused flip, flipping in software");
                false
            }
        }
    }
}

impl CaptureDevice for V4l2Camera {
    fn set_orientation(&mut self, orientation: Orientation) {
        let hflip_done = self.set_flip(rscam::CID_HFLIP, "hflip", orientation.hflip);
        let vflip_done = self.set_flip(rscam::CID_VFLIP, "vflip", orientation.vflip);
        self.software = Orientation {
            hflip: orientation.hflip && !hflip_done,
            vflip: orientation.vflip && !vflip_done,
        };
    }

    async fn capture(&mut self) -> Result<Vec<u8>, CaptureError> {
        let device_err = |source| CaptureError::Device {
            device: self.device.clone(),
            source,
        };

        // Early frames predate the flip controls and auto exposure.
        for _ in 0..self.warmup_frames {
            drop(self.camera.capture().map_err(device_err)?);
        }
        let frame = self.camera.capture().map_err(device_err)?;
        let raw = frame[..].to_vec();
        drop(frame);
        debug!(bytes = raw.len(), "frame received from camera");

        Ok(self.software.apply(&raw, self.quality)?)
    }
}
