//! Page payloads: base64 text from the backend ↔ raw PDF bytes.

use crate::error::DecodeError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Decode the `base64_content` of an extracted page.
///
/// ASCII whitespace anywhere in the text is ignored, so line-wrapped
/// base64 decodes like the unwrapped form. Empty input and input that
/// decodes to zero bytes are both [`DecodeError::Empty`].
pub fn decode_page_payload(b64: &str) -> Result<Vec<u8>, DecodeError> {
    let compact: Vec<u8> = b64
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(DecodeError::Empty);
    }

    let bytes = STANDARD
        .decode(&compact)
        .map_err(|e| DecodeError::Malformed(e.to_string()))?;
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }

    if !bytes.starts_with(PDF_MAGIC) {
        warn!(
            "Decoded page payload does not start with %PDF (first bytes: {:?})",
            &bytes[..bytes.len().min(4)]
        );
    }
    debug!("Decoded page payload → {} bytes", bytes.len());
    Ok(bytes)
}

/// Encode PDF bytes the way the backend ships them.
pub fn encode_page_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn decodes_pdf_header() {
        let bytes = decode_page_payload("JVBERi0xLjcK").unwrap();
        assert_eq!(bytes, b"%PDF-1.7\n");
    }

    #[test]
    fn empty_and_blank_are_empty() {
        assert_eq!(decode_page_payload(""), Err(DecodeError::Empty));
        assert_eq!(decode_page_payload("  \n"), Err(DecodeError::Empty));
    }

    #[test]
    fn malformed_is_reported() {
        assert!(matches!(
            decode_page_payload("not*base64!"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            decode_page_payload("JVBERi0"),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn wrapped_lines_decode() {
        let pdf = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\ntrailer\n%%EOF\n";
        let encoded = encode_page_payload(pdf);
        assert!(encoded.len() > 76);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\r\n");
        assert!(wrapped.contains("\r\n"));
        assert_eq!(decode_page_payload(&wrapped).unwrap(), pdf.to_vec());
        assert_eq!(decode_page_payload("JVBE Ri0x\tLjcK").unwrap(), b"%PDF-1.7\n");
    }

    proptest! {
        #[test]
        fn round_trip_reproduces_bytes(bytes in prop::collection::vec(any::<u8>(), 1..2048)) {
            let encoded = encode_page_payload(&bytes);
            prop_assert_eq!(decode_page_payload(&encoded).unwrap(), bytes);
        }
    }
}
