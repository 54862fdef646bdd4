//! Input validation for magnet URIs, info-hashes, and stream file paths.

use thiserror::Error;
use url::Url;

/// A rejected input, with the offending field name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Characters never allowed in a URL-supplied file path.
const FORBIDDEN_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Validate a magnet URI and return its normalized info-hash.
///
/// The URI must start with `magnet:?` and carry at least one
/// `xt=urn:btih:<hash>` parameter where `<hash>` is 40 hex characters or
/// 32 base32 characters. Hex hashes are normalized to lowercase, base32 to
/// uppercase.
pub fn validate_magnet_uri(magnet_uri: &str) -> Result<String, ValidationError> {
    let magnet_uri = magnet_uri.trim();

    if magnet_uri.is_empty() {
        return Err(ValidationError::new("magnetUri", "magnet URI is empty"));
    }

    if !magnet_uri.starts_with("magnet:?") {
        return Err(ValidationError::new(
            "magnetUri",
            "magnet URI must start with 'magnet:?'",
        ));
    }

    let parsed = Url::parse(magnet_uri)
        .map_err(|e| ValidationError::new("magnetUri", format!("malformed magnet URI: {e}")))?;

    for (key, value) in parsed.query_pairs() {
        if key != "xt" {
            continue;
        }
        if let Some(hash) = value.strip_prefix("urn:btih:") {
            return normalize_info_hash(hash).map_err(|e| {
                ValidationError::new("magnetUri", format!("invalid info-hash: {}", e.message))
            });
        }
    }

    Err(ValidationError::new(
        "magnetUri",
        "magnet URI must contain an 'xt=urn:btih:' parameter",
    ))
}

/// Validate a bare info-hash and return it in normalized form.
pub fn validate_info_hash(info_hash: &str) -> Result<String, ValidationError> {
    if info_hash.is_empty() {
        return Err(ValidationError::new("infoHash", "info-hash is empty"));
    }
    normalize_info_hash(info_hash)
}

fn normalize_info_hash(hash: &str) -> Result<String, ValidationError> {
    match hash.len() {
        40 => {
            if hash.chars().all(|c| c.is_ascii_hexdigit()) {
                Ok(hash.to_ascii_lowercase())
            } else {
                Err(ValidationError::new(
                    "infoHash",
                    "40-character info-hash must be hexadecimal",
                ))
            }
        }
        32 => {
            let upper = hash.to_ascii_uppercase();
            if upper
                .chars()
                .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c))
            {
                Ok(upper)
            } else {
                Err(ValidationError::new(
                    "infoHash",
                    "32-character info-hash must be base32 (A-Z, 2-7)",
                ))
            }
        }
        n => Err(ValidationError::new(
            "infoHash",
            format!("info-hash must be 40 hex or 32 base32 characters, got {n}"),
        )),
    }
}

/// Validate a URL-supplied file path for a stream request.
///
/// Rejects empty paths, parent-directory traversal, absolute paths, and
/// shell/filesystem metacharacters. The on-disk path is always derived from
/// torrent metadata, never from this input; these rules only keep hostile
/// URLs from reaching the lookup.
pub fn validate_stream_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::new("filePath", "file path is empty"));
    }

    if path.starts_with('/') || path.starts_with('\\') {
        return Err(ValidationError::new(
            "filePath",
            "absolute paths are not allowed",
        ));
    }

    if path.split(['/', '\\']).any(|component| component == "..") {
        return Err(ValidationError::new(
            "filePath",
            "file path must not contain '..'",
        ));
    }

    if let Some(c) = path.chars().find(|c| FORBIDDEN_PATH_CHARS.contains(c)) {
        return Err(ValidationError::new(
            "filePath",
            format!("file path must not contain '{c}'"),
        ));
    }

    if path.chars().any(|c| c.is_control()) {
        return Err(ValidationError::new(
            "filePath",
            "file path must not contain control characters",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX_HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn test_valid_magnet_hex() {
        let uri = format!("magnet:?xt=urn:btih:{HEX_HASH}");
        assert_eq!(validate_magnet_uri(&uri).unwrap(), HEX_HASH);
    }

    #[test]
    fn test_valid_magnet_with_trackers() {
        let uri = format!(
            "magnet:?xt=urn:btih:{HEX_HASH}&dn=Some+Name&tr=udp%3A%2F%2Ftracker.example%3A1337"
        );
        assert_eq!(validate_magnet_uri(&uri).unwrap(), HEX_HASH);
    }

    #[test]
    fn test_valid_magnet_base32() {
        let uri = "magnet:?xt=urn:btih:ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
        assert_eq!(
            validate_magnet_uri(uri).unwrap(),
            "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567"
        );
    }

    #[test]
    fn test_magnet_mixed_case_hex_normalized() {
        let uri = "magnet:?xt=urn:btih:0123456789ABCDEF0123456789abcdef01234567";
        assert_eq!(validate_magnet_uri(uri).unwrap(), HEX_HASH);
    }

    #[test]
    fn test_magnet_not_a_magnet() {
        let err = validate_magnet_uri("http://example.com").unwrap_err();
        assert_eq!(err.field, "magnetUri");
        assert!(err.message.contains("magnet"));
    }

    #[test]
    fn test_magnet_empty() {
        assert!(validate_magnet_uri("").is_err());
        assert!(validate_magnet_uri("   ").is_err());
    }

    #[test]
    fn test_magnet_missing_xt() {
        let err = validate_magnet_uri("magnet:?dn=NoHashHere").unwrap_err();
        assert!(err.message.contains("xt"));
    }

    #[test]
    fn test_magnet_39_char_hash_rejected() {
        let uri = format!("magnet:?xt=urn:btih:{}", &HEX_HASH[..39]);
        assert!(validate_magnet_uri(&uri).is_err());
    }

    #[test]
    fn test_info_hash_hex() {
        assert_eq!(validate_info_hash(HEX_HASH).unwrap(), HEX_HASH);
    }

    #[test]
    fn test_info_hash_uppercase_hex_normalized() {
        let upper = HEX_HASH.to_ascii_uppercase();
        assert_eq!(validate_info_hash(&upper).unwrap(), HEX_HASH);
    }

    #[test]
    fn test_info_hash_base32() {
        assert_eq!(
            validate_info_hash("abcdefghijklmnopqrstuvwxyz234567").unwrap(),
            "ABCDEFGHIJKLMNOPQRSTUVWXYZ234567"
        );
    }

    #[test]
    fn test_info_hash_bad_lengths() {
        assert!(validate_info_hash("").is_err());
        assert!(validate_info_hash("abc123").is_err());
        assert!(validate_info_hash(&HEX_HASH[..39]).is_err());
    }

    #[test]
    fn test_info_hash_bad_base32_chars() {
        // '0' and '1' are not in the base32 alphabet.
        assert!(validate_info_hash("01CDEFGHIJKLMNOPQRSTUVWXYZ234567").is_err());
    }

    #[test]
    fn test_info_hash_non_hex_rejected() {
        assert!(validate_info_hash("z123456789abcdef0123456789abcdef01234567").is_err());
    }

    #[test]
    fn test_path_ok() {
        assert!(validate_stream_path("Movie.2023.1080p/Movie.2023.1080p.mkv").is_ok());
        assert!(validate_stream_path("video.mp4").is_ok());
    }

    #[test]
    fn test_path_traversal_rejected() {
        assert!(validate_stream_path("../etc/passwd").is_err());
        assert!(validate_stream_path("dir/../../etc/passwd").is_err());
    }

    #[test]
    fn test_path_absolute_rejected() {
        assert!(validate_stream_path("/abs/path").is_err());
        assert!(validate_stream_path("\\windows\\path").is_err());
    }

    #[test]
    fn test_path_drive_colon_rejected() {
        assert!(validate_stream_path("name:alt").is_err());
        assert!(validate_stream_path("C:stuff").is_err());
    }

    #[test]
    fn test_path_meta_chars_rejected() {
        for path in ["a<b", "a>b", "a\"b", "a|b", "a?b", "a*b"] {
            assert!(validate_stream_path(path).is_err(), "expected reject: {path}");
        }
    }

    #[test]
    fn test_path_empty_rejected() {
        assert!(validate_stream_path("").is_err());
    }

    #[test]
    fn test_path_control_chars_rejected() {
        assert!(validate_stream_path("a\u{1}b").is_err());
    }

    #[test]
    fn test_dotdot_inside_name_allowed() {
        // '..' must be a whole component to count as traversal.
        assert!(validate_stream_path("file..name.mkv").is_ok());
    }
}
