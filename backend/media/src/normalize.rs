//! Image normalization before inference.
//!
//! Receipts don't need full resolution; bounding each side and
//! re-encoding as JPEG keeps the inference payload small without hurting
//! extraction quality.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use timbang_config::MediaSettings;
use timbang_core::TimbangError;
use tracing::debug;

use crate::ReceiptImage;

/// Re-encode an uploaded photo bounded to `max_dimension` pixels per side
/// at the configured JPEG quality. Pure local transformation: no network,
/// no disk.
///
/// Fails with `TimbangError::ImageDecode` if the bytes are not a decodable
/// image.
pub fn normalize(image: &ReceiptImage, settings: &MediaSettings) -> Result<ReceiptImage, TimbangError> {
    let decoded = image::load_from_memory(&image.data)
        .map_err(|e| TimbangError::ImageDecode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let max = settings.max_dimension;
    let bounded = if width > max || height > max {
        let scaled = decoded.thumbnail(max, max);
        debug!(
            source = %image.source,
            from = format!("{width}x{height}"),
            to = format!("{}x{}", scaled.width(), scaled.height()),
            "Resized receipt image"
        );
        scaled
    } else {
        decoded
    };

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(bounded.to_rgb8());

    let mut out = Cursor::new(Vec::new());
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut out, settings.jpeg_quality))
        .map_err(|e| TimbangError::ImageDecode(format!("re-encode failed: {e}")))?;

    Ok(ReceiptImage::new(
        image.source.clone(),
        "image/jpeg",
        bytes::Bytes::from(out.into_inner()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use image::{ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut out, ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }

    #[test]
    fn oversized_image_is_bounded() {
        let settings = MediaSettings { max_dimension: 100, jpeg_quality: 85 };
        let input = ReceiptImage::new("big.png", "image/png", png_bytes(400, 200));

        let normalized = normalize(&input, &settings).unwrap();
        assert_eq!(normalized.mime_type, "image/jpeg");

        let decoded = image::load_from_memory(&normalized.data).unwrap();
        assert!(decoded.width() <= 100 && decoded.height() <= 100);
        // Aspect ratio survives the bound.
        assert_eq!(decoded.width(), 100);
        assert_eq!(decoded.height(), 50);
    }

    #[test]
    fn small_image_keeps_its_dimensions() {
        let settings = MediaSettings::default();
        let input = ReceiptImage::new("small.png", "image/png", png_bytes(64, 48));

        let normalized = normalize(&input, &settings).unwrap();
        let decoded = image::load_from_memory(&normalized.data).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let settings = MediaSettings::default();
        let input = ReceiptImage::new("junk.jpg", "image/jpeg", Bytes::from_static(b"not an image"));

        let err = normalize(&input, &settings).unwrap_err();
        assert!(matches!(err, TimbangError::ImageDecode(_)));
    }
}
