//! # Data URI Encoding
//!
//! Captured images travel through the views as `data:<mime>;base64,<payload>`
//! strings, the same form a browser hands out for screenshots and file reads.
//! Before transport they are decoded back into bytes plus the declared MIME type.
//!
//! Decoding is strict: there is no default MIME type, and anything that is not a
//! well-formed base64 data URI with a non-empty payload is rejected.

use base64::{engine::general_purpose, Engine as _};

use super::ImageCapture;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Encode `bytes` as a base64 data URI declaring `mime`.
pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!(
        "{}{}{},{}",
        SCHEME,
        mime,
        BASE64_MARKER,
        general_purpose::STANDARD.encode(bytes)
    )
}

/// Decode a data URI into its bytes and MIME type.
///
/// Returns `None` when the comma separator is missing, the header is not
/// `data:<type>/<subtype>;base64`, the payload is not valid base64, or the
/// payload is empty. Callers must treat `None` as a hard validation failure.
pub fn decode_data_uri(uri: &str) -> Option<ImageCapture> {
    let (header, payload) = uri.split_once(',')?;
    let mime = header.strip_prefix(SCHEME)?.strip_suffix(BASE64_MARKER)?;

    if !is_recognizable_mime(mime) {
        return None;
    }

    let bytes = general_purpose::STANDARD.decode(payload.trim()).ok()?;
    if bytes.is_empty() {
        return None;
    }

    Some(ImageCapture {
        bytes,
        mime: mime.to_string(),
    })
}

/// `type/subtype`, both parts non-empty and free of parameters or whitespace.
fn is_recognizable_mime(mime: &str) -> bool {
    let Some((kind, subtype)) = mime.split_once('/') else {
        return false;
    };
    let is_token = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
    };
    is_token(kind) && is_token(subtype)
}
