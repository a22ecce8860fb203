use bytes::Bytes;

pub mod mime_detect;
pub mod normalize;

pub use mime_detect::{detect_image_mime, is_image};
pub use normalize::normalize;

/// One uploaded receipt photo: raw bytes plus the declared MIME type.
///
/// Ephemeral — lives in memory for the duration of one pipeline run and is
/// discarded (or archived) after persistence or failure.
#[derive(Debug, Clone)]
pub struct ReceiptImage {
    /// Opaque label for where the bytes came from (file name, message id).
    pub source: String,
    pub mime_type: String,
    pub data: Bytes,
}

impl ReceiptImage {
    pub fn new(source: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self { source: source.into(), mime_type: mime_type.into(), data }
    }

    /// Build a payload from an uploaded file name, detecting the MIME type
    /// from its extension.
    pub fn from_file_name(file_name: impl Into<String>, data: Bytes) -> Self {
        let source = file_name.into();
        let mime_type = detect_image_mime(&source).to_string();
        Self { source, mime_type, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mime_from_file_name() {
        let img = ReceiptImage::from_file_name("nota-2025-12-24.JPG", Bytes::new());
        assert_eq!(img.mime_type, "image/jpeg");
        assert!(is_image(&img.mime_type));
    }
}
