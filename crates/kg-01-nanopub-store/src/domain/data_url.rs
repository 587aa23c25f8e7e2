//! # Data URLs
//!
//! Inline file content arrives as `data:[<mime>][;base64],<payload>`.

use base64::Engine;

/// MIME type assumed when a data URL does not declare one.
pub const DEFAULT_MIME: &str = "text/plain";

/// A decoded data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUrl {
    /// Parse a `data:` URL.
    pub fn parse(input: &str) -> Result<Self, String> {
        let rest = input
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| "missing 'data:' scheme".to_string())?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| "missing ',' separator".to_string())?;

        let mut params = header.split(';');
        let mime = match params.next() {
            Some(m) if !m.is_empty() => m.to_ascii_lowercase(),
            _ => DEFAULT_MIME.to_string(),
        };
        let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

        let bytes = if is_base64 {
            base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| format!("invalid base64: {}", e))?
        } else {
            percent_decode(payload)?
        };
        Ok(Self { mime, bytes })
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, String> {
    let raw = input.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex = input
                .get(i + 1..i + 3)
                .ok_or_else(|| "truncated percent escape".to_string())?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| format!("invalid percent escape '%{}'", hex))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_payload() {
        let url = DataUrl::parse("data:text/plain;base64,aGVsbG8=").unwrap();
        assert_eq!(url.mime, "text/plain");
        assert_eq!(url.bytes, b"hello");
    }

    #[test]
    fn test_percent_encoded_payload() {
        let url = DataUrl::parse("data:,hello%20world").unwrap();
        assert_eq!(url.mime, DEFAULT_MIME);
        assert_eq!(url.bytes, b"hello world");
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(DataUrl::parse("http://ex.org/file").is_err());
        assert!(DataUrl::parse("data:text/plain").is_err());
        assert!(DataUrl::parse("data:;base64,***").is_err());
    }
}
