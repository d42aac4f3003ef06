/// Magic-byte sniffing for stored images
use mime::Mime;

const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_SIGNATURE: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Classifies image bytes by their leading signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageContentTypeDetector;

impl ImageContentTypeDetector {
    /// JPEG is checked before PNG; anything unrecognized or too short is
    /// `application/octet-stream`.
    pub fn detect(&self, bytes: &[u8]) -> Mime {
        if bytes.starts_with(JPEG_SIGNATURE) {
            mime::IMAGE_JPEG
        } else if bytes.starts_with(PNG_SIGNATURE) {
            mime::IMAGE_PNG
        } else {
            mime::APPLICATION_OCTET_STREAM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_jpeg() {
        let detector = ImageContentTypeDetector;
        assert_eq!(detector.detect(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), mime::IMAGE_JPEG);
        assert_eq!(detector.detect(&[0xFF, 0xD8, 0xFF]), mime::IMAGE_JPEG);
    }

    #[test]
    fn test_detects_png() {
        let detector = ImageContentTypeDetector;
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"IHDR");
        assert_eq!(detector.detect(&bytes), mime::IMAGE_PNG);
    }

    #[test]
    fn test_unknown_or_short_input_is_octet_stream() {
        let detector = ImageContentTypeDetector;
        assert_eq!(detector.detect(b"GIF89a"), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(detector.detect(&[0xFF, 0xD8]), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(detector.detect(&PNG_SIGNATURE[..7]), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(detector.detect(&[]), mime::APPLICATION_OCTET_STREAM);
    }
}
