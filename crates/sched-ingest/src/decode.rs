//! Transport decoding of raw file content.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::debug;

/// Returns the base64-decoded text of `content` when it decodes to UTF-8,
/// otherwise `content` itself.
///
/// Decoding is strict: any character outside the base64 alphabet, or a
/// length that is not padded correctly, means the content is used as-is.
pub fn decode_content(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return content.to_string();
    }
    match BASE64.decode(trimmed) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => {
                debug!(decoded_len = text.len(), "content was base64 encoded");
                text
            }
            Err(_) => content.to_string(),
        },
        Err(_) => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_base64_csv() {
        let encoded = BASE64.encode("Visit,Day\nScreening,-14");
        assert_eq!(decode_content(&encoded), "Visit,Day\nScreening,-14");
    }

    #[test]
    fn raw_csv_passes_through() {
        let raw = "Visit Name,Study Day\nScreening,-14";
        assert_eq!(decode_content(raw), raw);
    }

    #[test]
    fn non_utf8_payload_passes_through() {
        let encoded = BASE64.encode([0xff, 0xfe, 0xfd]);
        assert_eq!(decode_content(&encoded), encoded);
    }
}
