//! JPEG decode and re-encode.
//!
//! The encoder writes SOI, a JFIF APP0 header, quantization and Huffman
//! tables, the frame and scan, and EOI. APP1 (EXIF/XMP), APP13 (IPTC),
//! COM and other application segments of the source are not carried over.
//!
//! Re-encoding is lossy; quality 100 keeps the generation loss small.

use super::ImageFormat;
use crate::error::{Error, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat as CodecFormat};
use std::path::Path;

const FORMAT: ImageFormat = ImageFormat::Jpeg;

/// Encoder quality (1-100).
pub const QUALITY: u8 = 100;

/// Decode JPEG bytes into pixels.
pub fn decode(data: &[u8], path: &Path) -> Result<DynamicImage> {
    image::load_from_memory_with_format(data, CodecFormat::Jpeg)
        .map_err(|e| Error::decode(path, FORMAT.name(), e))
}

/// Encode pixels as a metadata-free JPEG.
pub fn encode(image: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, QUALITY);

    // JPEG carries neither alpha nor 16-bit samples.
    let written = match image.color() {
        ColorType::L8 | ColorType::Rgb8 => image.write_with_encoder(encoder),
        ColorType::L16 | ColorType::La8 | ColorType::La16 => {
            DynamicImage::ImageLuma8(image.to_luma8()).write_with_encoder(encoder)
        }
        _ => DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder),
    };
    written.map_err(|e| Error::encode(path, FORMAT.name(), e))?;

    Ok(buffer)
}

/// Create a small JPEG carrying an EXIF APP1 and a COM segment, for testing.
#[cfg(test)]
pub fn create_jpeg_with_exif() -> Vec<u8> {
    use image::{Rgb, RgbImage};

    let pixels = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 100, 50])));
    let clean = encode(&pixels, Path::new("fixture.jpg")).unwrap();

    let mut data = vec![0xFF, 0xD8];

    let exif = b"Exif\x00\x00Camera serial 0xDEADBEEF";
    data.extend_from_slice(&[0xFF, 0xE1]);
    data.extend_from_slice(&((exif.len() + 2) as u16).to_be_bytes());
    data.extend_from_slice(exif);

    let comment = b"Shot at home";
    data.extend_from_slice(&[0xFF, 0xFE]);
    data.extend_from_slice(&((comment.len() + 2) as u16).to_be_bytes());
    data.extend_from_slice(comment);

    // Everything after the original SOI.
    data.extend_from_slice(&clean[2..]);
    data
}
