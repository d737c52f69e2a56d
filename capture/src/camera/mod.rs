pub mod http;
pub mod mjpeg;
#[cfg(feature = "v4l2")]
pub mod v4l2;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;

use crate::CaptureError;

/// Mirroring applied to every captured frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Orientation {
    pub hflip: bool,
    pub vflip: bool,
}

impl Orientation {
    /// Correction for a camera mounted upside down.
    pub const FLIPPED: Orientation = Orientation {
        hflip: true,
        vflip: true,
    };

    pub fn is_identity(&self) -> bool {
        !self.hflip && !self.vflip
    }

    /// Apply the mirroring to an encoded frame and re-encode it as JPEG.
    ///
    /// The identity orientation returns the input untouched.
    pub fn apply(&self, encoded: &[u8], quality: u8) -> Result<Vec<u8>, image::ImageError> {
        if self.is_identity() {
            return Ok(encoded.to_vec());
        }

        let mut img = ImageReader::new(Cursor::new(encoded))
            .with_guessed_format()?
            .decode()?;
        if self.hflip {
            img = img.fliph();
        }
        if self.vflip {
            img = img.flipv();
        }

        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut out = Vec::new();
        rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, quality))?;
        Ok(out)
    }
}

/// A camera that can hand out one encoded frame at a time.
///
/// Implementations own their connection for as long as they live; dropping
/// the device releases it.
pub trait CaptureDevice {
    /// Mirroring to apply to subsequent captures.
    fn set_orientation(&mut self, orientation: Orientation);

    /// Grab one JPEG frame. Blocks until the camera delivers; no retry.
    async fn capture(&mut self) -> Result<Vec<u8>, CaptureError>;
}
