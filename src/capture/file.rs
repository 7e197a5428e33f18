//! # File Selection
//!
//! Reads a user-selected image asynchronously. Only PNG and JPEG are accepted; the
//! MIME type comes from the file content, not from its extension.

use image::ImageFormat;
use log::debug;
use std::path::Path;

use super::{data_uri::encode_data_uri, CaptureError, CapturedImage, ImageOrigin};

/// Read `path` into a data URI.
pub async fn read_image_file(path: &Path) -> Result<CapturedImage, CaptureError> {
    let bytes = tokio::fs::read(path).await?;
    let mime = sniff_mime(&bytes).ok_or(CaptureError::Unsupported)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    debug!("Read {} ({} bytes, {})", file_name, bytes.len(), mime);

    Ok(CapturedImage {
        data_uri: encode_data_uri(&bytes, mime),
        origin: ImageOrigin::File { file_name },
    })
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png)
            .unwrap();
        buf
    }

    #[tokio::test]
    async fn reads_png_with_sniffed_mime() {
        let dir = tempfile::tempdir().unwrap();
        // Extension deliberately wrong
        let path = dir.path().join("guardian.jpg");
        let bytes = png_bytes();
        std::fs::write(&path, &bytes).unwrap();

        let captured = read_image_file(&path).await.unwrap();
        assert_eq!(captured.upload_name(), "guardian.jpg");

        let decoded = captured.decode().unwrap();
        assert_eq!(decoded.mime, "image/png");
        assert_eq!(decoded.bytes, bytes);
    }

    #[tokio::test]
    async fn rejects_corrupt_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let err = read_image_file(&path).await.unwrap_err();
        assert!(matches!(err, CaptureError::Unsupported));
        assert_eq!(err.user_message(), "Failed to read the selected file.");

        let err = read_image_file(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, CaptureError::Read(_)));
    }
}
