//! Base64 ⇄ JPEG frame conversion, including the optional browser data-URI
//! header on both directions.

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use image::{codecs::jpeg::JpegEncoder, ImageBuffer, Rgb};
use thiserror::Error;

use crate::service::{color, frame::Frame};

/// Token separating a data-URI header from the base64 body.
const DATA_URI_TOKEN: &str = "base64,";

/// Header re-added on encode; the service always re-encodes as JPEG.
pub(crate) const JPEG_PREFIX: &str = "data:image/jpeg;base64,";

#[derive(Debug, Error)]
pub(crate) enum CodecError {
    #[error("malformed base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload bytes are not a decodable image: {0}")]
    ImageDecode(image::ImageError),
    #[error("decoded image has no pixels")]
    EmptyImage,
    #[error("JPEG encoding failed: {0}")]
    ImageEncode(image::ImageError),
}

/// Strip an optional `data:image/...;base64,` header and decode the
/// remainder into a BGR frame. The header is split on the LAST occurrence
/// of the `base64,` token.
pub(crate) fn decode_payload(payload: &str) -> Result<Frame, CodecError> {
    let body = match payload.rfind(DATA_URI_TOKEN) {
        Some(pos) => &payload[pos + DATA_URI_TOKEN.len()..],
        None => payload,
    };
    let bytes = B64.decode(body)?;
    let decoded = image::load_from_memory(&bytes).map_err(CodecError::ImageDecode)?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(CodecError::EmptyImage);
    }
    let mut data = rgb.into_raw();
    // transport convention is BGR
    color::swap_channel_order(&mut data);
    Ok(Frame {
        data,
        width,
        height,
    })
}

/// Re-encode a BGR frame as a JPEG data URI at the given quality. Pure
/// transform; the input frame is left untouched.
pub(crate) fn encode_frame(frame: &Frame, quality: u8) -> Result<String, CodecError> {
    let mut rgb = frame.data.clone();
    color::swap_channel_order(&mut rgb);
    let image = ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(frame.width, frame.height, rgb)
        .ok_or(CodecError::EmptyImage)?;
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
        .encode_image(&image)
        .map_err(CodecError::ImageEncode)?;
    Ok(format!("{JPEG_PREFIX}{}", B64.encode(&buffer)))
}
