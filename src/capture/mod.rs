//! # Image Acquisition
//!
//! Produces the image a view submits, from either of two sources:
//!
//! - [`camera`]: an on-demand snapshot of a live frame, re-encoded as JPEG
//! - [`file`]: a user-selected PNG or JPEG read from disk
//!
//! Both converge on a [`CapturedImage`] holding a base64 data URI
//! ([`data_uri`]). At submission time the URI is decoded into an [`ImageCapture`]
//! (bytes plus MIME type) for the multipart upload.

pub mod camera;
pub mod data_uri;
pub mod file;

use log::warn;
use std::path::Path;
use thiserror::Error;

use crate::common::config::CaptureConfig;
use crate::common::error::ClientError;

pub use camera::{FrameSource, StillFrameSource};
pub use data_uri::{decode_data_uri, encode_data_uri};

/// File name used in the upload for camera snapshots.
pub const CAMERA_FILE_NAME: &str = "capture.jpg";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no active video stream")]
    NoActiveStream,
    #[error("failed to read image file: {0}")]
    Read(#[from] std::io::Error),
    #[error("unsupported image content")]
    Unsupported,
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),
}

impl CaptureError {
    /// Message shown to the user when acquisition fails.
    pub fn user_message(&self) -> &'static str {
        match self {
            CaptureError::NoActiveStream | CaptureError::Encode(_) => {
                "Could not capture image from webcam."
            }
            CaptureError::Read(_) | CaptureError::Unsupported => {
                "Failed to read the selected file."
            }
        }
    }
}

/// A failed acquisition is reported like any other local validation failure.
impl From<CaptureError> for ClientError {
    fn from(err: CaptureError) -> Self {
        ClientError::validation(err.user_message())
    }
}

/// Decoded image ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCapture {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Where a captured image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageOrigin {
    Camera,
    File { file_name: String },
}

/// An image held by a view between acquisition and submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub data_uri: String,
    pub origin: ImageOrigin,
}

impl CapturedImage {
    /// File name to send in the multipart `image` part.
    pub fn upload_name(&self) -> &str {
        match &self.origin {
            ImageOrigin::Camera => CAMERA_FILE_NAME,
            ImageOrigin::File { file_name } => file_name,
        }
    }

    pub fn decode(&self) -> Option<ImageCapture> {
        decode_data_uri(&self.data_uri)
    }
}

/// The current image of a view.
///
/// A successful acquisition replaces the held image; a failed one clears it.
#[derive(Debug, Default, Clone)]
pub struct ImageSlot {
    image: Option<CapturedImage>,
}

impl ImageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none()
    }

    pub fn clear(&mut self) {
        self.image = None;
    }

    /// Store an already-encoded data URI, e.g. one handed over by a browser.
    pub fn set(&mut self, image: CapturedImage) {
        self.image = Some(image);
    }

    /// Snapshot the current frame of `source`.
    pub fn capture(
        &mut self,
        source: &dyn FrameSource,
        settings: &CaptureConfig,
    ) -> Result<&CapturedImage, CaptureError> {
        let result = camera::snapshot(source, settings);
        self.store(result)
    }

    /// Read a user-selected file.
    pub async fn load_file(&mut self, path: &Path) -> Result<&CapturedImage, CaptureError> {
        let result = file::read_image_file(path).await;
        self.store(result)
    }

    fn store(
        &mut self,
        result: Result<CapturedImage, CaptureError>,
    ) -> Result<&CapturedImage, CaptureError> {
        match result {
            Ok(image) => Ok(self.image.insert(image)),
            Err(e) => {
                warn!("Image acquisition failed: {}", e);
                self.image = None;
                Err(e)
            }
        }
    }
}
