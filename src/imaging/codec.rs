use base64::{prelude::BASE64_STANDARD, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageResult, RgbImage};
use std::io::Cursor;

pub const JPEG_QUALITY: u8 = 95;

/// Decodes any supported container into an 8-bit RGB raster.
pub fn decode_rgb(bytes: &[u8]) -> ImageResult<RgbImage> {
    Ok(image::load_from_memory(bytes)?.to_rgb8())
}

pub fn encode(image: &RgbImage, format: ImageFormat) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
            encoder.encode_image(image)?;
        }
        other => image.write_to(&mut Cursor::new(&mut buf), other)?,
    }
    Ok(buf)
}

/// Output format for a file extension (`jpg`, `PNG`, ...).
pub fn format_for_extension(ext: &str) -> Option<ImageFormat> {
    ImageFormat::from_extension(ext.to_ascii_lowercase())
}

/// Drops a `data:image/...;base64,` style prefix: everything up to and
/// including the first comma.
pub fn strip_data_url(payload: &str) -> &str {
    payload.split_once(',').map_or(payload, |(_, data)| data)
}

/// `None` when the payload is not base64 or the bytes are not an image.
/// Line breaks and other ASCII whitespace inside the payload are ignored.
pub fn decode_base64_image(payload: &str) -> Option<RgbImage> {
    let compact: String = strip_data_url(payload)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = BASE64_STANDARD.decode(compact).ok()?;
    decode_rgb(&bytes).ok()
}

pub fn to_jpeg_data_url(image: &RgbImage) -> ImageResult<String> {
    let jpeg = encode(image, ImageFormat::Jpeg)?;
    Ok(format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(jpeg)))
}
