//! MIME type detection for uploaded receipt photos.
//!
//! Chat front-ends usually hand over a file name but not a trustworthy
//! content type; the pipeline only needs to tell image payloads apart.

/// Detect the MIME type of an uploaded file by extension.
pub fn detect_image_mime(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "webp"         => "image/webp",
        "heic"         => "image/heic",
        "bmp"          => "image/bmp",
        "tiff" | "tif" => "image/tiff",
        _              => "application/octet-stream",
    }
}

/// Whether a MIME type is for an image.
pub fn is_image(mime: &str) -> bool {
    mime.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn common_extensions_map() {
        assert_eq!(detect_image_mime("bukti.jpg"), "image/jpeg");
        assert_eq!(detect_image_mime("BUKTI.PNG"), "image/png");
        assert_eq!(detect_image_mime("scan.tif"), "image/tiff");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        assert_eq!(detect_image_mime("receipt.pdf.exe"), "application/octet-stream");
        assert!(!is_image(detect_image_mime("notes.txt")));
    }
}
