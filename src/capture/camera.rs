//! # Camera Snapshots
//!
//! A [`FrameSource`] stands in for a live video stream. On an explicit trigger the
//! current frame is taken, scaled to the configured resolution and encoded as JPEG.
//! A source without an active stream yields [`CaptureError::NoActiveStream`].

use image::{imageops::FilterType, DynamicImage, ImageOutputFormat};
use std::io::Cursor;

use super::{data_uri::encode_data_uri, CaptureError, CapturedImage, ImageOrigin};
use crate::common::config::CaptureConfig;

/// Anything that can hand out the frame currently on screen.
pub trait FrameSource {
    /// The current frame, or `None` when no stream is active.
    fn current_frame(&self) -> Option<DynamicImage>;
}

/// A stream that always shows the same picture.
///
/// Used by the CLI to push an image file through the camera path.
pub struct StillFrameSource {
    frame: Option<DynamicImage>,
}

impl StillFrameSource {
    pub fn new(frame: DynamicImage) -> Self {
        Self { frame: Some(frame) }
    }

    /// A source whose stream has not started.
    pub fn inactive() -> Self {
        Self { frame: None }
    }

    /// A still stream showing the image stored at `path`.
    pub async fn from_file(path: &std::path::Path) -> Result<Self, CaptureError> {
        let bytes = tokio::fs::read(path).await?;
        let frame = image::load_from_memory(&bytes).map_err(|_| CaptureError::Unsupported)?;
        Ok(Self::new(frame))
    }
}

impl FrameSource for StillFrameSource {
    fn current_frame(&self) -> Option<DynamicImage> {
        self.frame.clone()
    }
}

/// Take a JPEG snapshot of `source` at the configured resolution.
pub fn snapshot(
    source: &dyn FrameSource,
    settings: &CaptureConfig,
) -> Result<CapturedImage, CaptureError> {
    let frame = source.current_frame().ok_or(CaptureError::NoActiveStream)?;

    let scaled = if frame.width() == settings.width && frame.height() == settings.height {
        frame
    } else {
        frame.resize_exact(settings.width, settings.height, FilterType::Triangle)
    };

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(scaled.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(
        &mut Cursor::new(&mut buf),
        ImageOutputFormat::Jpeg(settings.jpeg_quality.clamp(1, 100)),
    )?;

    Ok(CapturedImage {
        data_uri: encode_data_uri(&buf, "image/jpeg"),
        origin: ImageOrigin::Camera,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ClientError;
    use image::{GenericImageView, RgbaImage};

    fn settings() -> CaptureConfig {
        CaptureConfig {
            width: 48,
            height: 48,
            jpeg_quality: 80,
        }
    }

    #[test]
    fn snapshot_without_stream_fails() {
        let err = snapshot(&StillFrameSource::inactive(), &settings()).unwrap_err();
        assert!(matches!(err, CaptureError::NoActiveStream));
        assert_eq!(err.user_message(), "Could not capture image from webcam.");
    }

    #[test]
    fn snapshot_is_jpeg_at_configured_resolution() {
        let frame = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            64,
            32,
            image::Rgba([200, 10, 10, 255]),
        ));
        let captured = snapshot(&StillFrameSource::new(frame), &settings()).unwrap();

        assert_eq!(captured.origin, ImageOrigin::Camera);
        assert_eq!(captured.upload_name(), "capture.jpg");

        let decoded = captured.decode().unwrap();
        assert_eq!(decoded.mime, "image/jpeg");
        assert_eq!(
            image::guess_format(&decoded.bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
        let img = image::load_from_memory(&decoded.bytes).unwrap();
        assert_eq!(img.dimensions(), (48, 48));
    }

    #[tokio::test]
    async fn still_source_rejects_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desk.jpg");
        std::fs::write(&path, b"not a picture").unwrap();

        let err = StillFrameSource::from_file(&path).await.err().unwrap();
        assert!(matches!(err, CaptureError::Unsupported));
        assert_eq!(
            ClientError::from(err),
            ClientError::validation("Failed to read the selected file.")
        );

        let err = StillFrameSource::from_file(&dir.path().join("gone.jpg"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CaptureError::Read(_)));
    }
}
