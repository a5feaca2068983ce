//! PNG decode and re-encode.
//!
//! The encoder only emits the critical chunks (IHDR, PLTE, IDAT, IEND), so
//! tEXt, zTXt, iTXt, eXIf, tIME and every other ancillary chunk of the
//! source file is gone after a round trip. Pixels are re-encoded losslessly
//! at their original color type and bit depth.

use super::ImageFormat;
use crate::error::{Error, Result};
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat as CodecFormat};
use std::path::Path;

const FORMAT: ImageFormat = ImageFormat::Png;

/// Decode PNG bytes into pixels.
pub fn decode(data: &[u8], path: &Path) -> Result<DynamicImage> {
    image::load_from_memory_with_format(data, CodecFormat::Png)
        .map_err(|e| Error::decode(path, FORMAT.name(), e))
}

/// Encode pixels as a metadata-free PNG.
pub fn encode(image: &DynamicImage, path: &Path) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_with_encoder(PngEncoder::new(&mut buffer))
        .map_err(|e| Error::encode(path, FORMAT.name(), e))?;
    Ok(buffer)
}

/// PNG signature bytes.
#[cfg(test)]
const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// CRC32 over chunk type and data, as PNG chunks require.
#[cfg(test)]
fn chunk_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in chunk_type.iter().chain(data.iter()) {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
        }
    }
    crc ^ 0xFFFF_FFFF
}

/// Create a 2x2 PNG carrying tEXt and tIME chunks, for testing.
#[cfg(test)]
pub fn create_png_with_metadata() -> Vec<u8> {
    use image::{Rgb, RgbImage};

    let pixels = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([40, 80, 120])));
    let clean = encode(&pixels, Path::new("fixture.png")).unwrap();

    // IHDR is always 13 bytes: 8 signature + 4 length + 4 type + 13 data + 4 crc.
    let ihdr_end = PNG_SIGNATURE.len() + 25;
    let mut data = clean[..ihdr_end].to_vec();

    for (chunk_type, body) in [
        (b"tEXt", &b"Comment\x00GPS 51.5007 N, 0.1246 W"[..]),
        (b"tIME", &[0x07, 0xE8, 0x06, 0x15, 0x0C, 0x00, 0x00][..]),
    ] {
        data.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(chunk_type);
        data.extend_from_slice(body);
        data.extend_from_slice(&chunk_crc(chunk_type, body).to_be_bytes());
    }

    data.extend_from_slice(&clean[ihdr_end..]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn test_fixture_is_valid_png() {
        let data = create_png_with_metadata();
        assert!(data.starts_with(&PNG_SIGNATURE));
        assert!(contains(&data, b"tEXt"));
        let image = decode(&data, Path::new("fixture.png")).unwrap();
        assert_eq!((image.width(), image.height()), (2, 2));
    }

    #[test]
    fn test_round_trip_strips_text_chunks() {
        let data = create_png_with_metadata();
        let path = Path::new("fixture.png");

        let output = encode(&decode(&data, path).unwrap(), path).unwrap();

        assert!(output.starts_with(&PNG_SIGNATURE));
        assert!(!contains(&output, b"tEXt"));
        assert!(!contains(&output, b"tIME"));
        assert!(!contains(&output, b"GPS"));
        assert!(output.len() < data.len());
    }

    #[test]
    fn test_round_trip_preserves_pixels() {
        let data = create_png_with_metadata();
        let path = Path::new("fixture.png");

        let before = decode(&data, path).unwrap();
        let after = decode(&encode(&before, path).unwrap(), path).unwrap();
        assert_eq!(before.to_rgba8().into_raw(), after.to_rgba8().into_raw());
    }

    #[test]
    fn test_round_trip_keeps_16_bit() {
        use image::{ImageBuffer, Rgba};

        let path = Path::new("deep.png");
        let deep = DynamicImage::ImageRgba16(ImageBuffer::from_pixel(1, 1, Rgba([1000u16, 2000, 3000, 65535])));
        let back = decode(&encode(&deep, path).unwrap(), path).unwrap();
        assert_eq!(back.color(), image::ColorType::Rgba16);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"\x89PNG but not really", Path::new("bad.png")).unwrap_err();
        assert!(matches!(err, Error::Decode { format: "PNG", .. }));
        assert!(err.to_string().contains("bad.png"));
    }

    #[test]
    fn test_decode_rejects_jpeg_bytes() {
        let err = decode(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10], Path::new("swap.png")).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
