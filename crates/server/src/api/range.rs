//! HTTP Range header parsing (RFC 7233) for the stream route.

/// The requested range cannot be satisfied for this file.
#[derive(Debug, PartialEq, Eq)]
pub struct Unsatisfiable;

/// Parse a `Range` header against a file of `length` bytes.
///
/// Returns `Ok(None)` when the header is absent or carries a unit other
/// than `bytes` (serve the full body), `Ok(Some((start, end)))` with `end`
/// clamped to the last byte for a satisfiable range, and `Err` for ranges
/// that must be answered with 416.
///
/// One range per request; a multi-range header is rejected. Suffix ranges
/// (`bytes=-N`) are honored as the final `N` bytes.
pub fn parse_range(header: Option<&str>, length: u64) -> Result<Option<(u64, u64)>, Unsatisfiable> {
    let Some(header) = header else {
        return Ok(None);
    };

    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        // Unknown unit: ignore the header per RFC 7233.
        return Ok(None);
    };

    if spec.contains(',') {
        return Err(Unsatisfiable);
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return Err(Unsatisfiable);
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix form: the final N bytes.
    if start_str.is_empty() {
        let suffix: u64 = end_str.parse().map_err(|_| Unsatisfiable)?;
        if suffix == 0 || length == 0 {
            return Err(Unsatisfiable);
        }
        let start = length.saturating_sub(suffix);
        return Ok(Some((start, length - 1)));
    }

    let start: u64 = start_str.parse().map_err(|_| Unsatisfiable)?;
    if start >= length {
        return Err(Unsatisfiable);
    }

    let end = if end_str.is_empty() {
        length - 1
    } else {
        let end: u64 = end_str.parse().map_err(|_| Unsatisfiable)?;
        if start > end {
            return Err(Unsatisfiable);
        }
        end.min(length - 1)
    };

    Ok(Some((start, end)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LENGTH: u64 = 10_000_000;

    #[test]
    fn test_no_header_serves_full_body() {
        assert_eq!(parse_range(None, LENGTH), Ok(None));
    }

    #[test]
    fn test_unknown_unit_ignored() {
        assert_eq!(parse_range(Some("items=0-10"), LENGTH), Ok(None));
    }

    #[test]
    fn test_bounded_range() {
        assert_eq!(
            parse_range(Some("bytes=0-1023"), LENGTH),
            Ok(Some((0, 1023)))
        );
        assert_eq!(
            parse_range(Some("bytes=100-199"), LENGTH),
            Ok(Some((100, 199)))
        );
    }

    #[test]
    fn test_open_ended_range() {
        assert_eq!(
            parse_range(Some("bytes=500-"), LENGTH),
            Ok(Some((500, LENGTH - 1)))
        );
        assert_eq!(parse_range(Some("bytes=0-"), LENGTH), Ok(Some((0, LENGTH - 1))));
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range(Some("bytes=-500"), LENGTH),
            Ok(Some((LENGTH - 500, LENGTH - 1)))
        );
        // A suffix longer than the file covers the whole file.
        assert_eq!(
            parse_range(Some("bytes=-99999999999"), LENGTH),
            Ok(Some((0, LENGTH - 1)))
        );
        assert_eq!(parse_range(Some("bytes=-0"), LENGTH), Err(Unsatisfiable));
    }

    #[test]
    fn test_end_clamped_to_length() {
        assert_eq!(
            parse_range(Some("bytes=9999500-99999999"), LENGTH),
            Ok(Some((9_999_500, LENGTH - 1)))
        );
        assert_eq!(
            parse_range(Some("bytes=0-1000000000000000000"), LENGTH),
            Ok(Some((0, LENGTH - 1)))
        );
    }

    #[test]
    fn test_start_past_length_unsatisfiable() {
        assert_eq!(
            parse_range(Some("bytes=20000000-"), LENGTH),
            Err(Unsatisfiable)
        );
        assert_eq!(
            parse_range(Some(&format!("bytes={LENGTH}-")), LENGTH),
            Err(Unsatisfiable)
        );
    }

    #[test]
    fn test_inverted_range_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=100-99"), LENGTH), Err(Unsatisfiable));
    }

    #[test]
    fn test_garbage_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=abc-"), LENGTH), Err(Unsatisfiable));
        assert_eq!(parse_range(Some("bytes=0-abc"), LENGTH), Err(Unsatisfiable));
        assert_eq!(parse_range(Some("bytes=-"), LENGTH), Err(Unsatisfiable));
        assert_eq!(parse_range(Some("bytes=5"), LENGTH), Err(Unsatisfiable));
    }

    #[test]
    fn test_multi_range_unsatisfiable() {
        assert_eq!(
            parse_range(Some("bytes=0-99,200-299"), LENGTH),
            Err(Unsatisfiable)
        );
    }

    #[test]
    fn test_last_byte_range() {
        assert_eq!(
            parse_range(Some(&format!("bytes={}-", LENGTH - 1)), LENGTH),
            Ok(Some((LENGTH - 1, LENGTH - 1)))
        );
    }

    #[test]
    fn test_empty_file_any_range_unsatisfiable() {
        assert_eq!(parse_range(Some("bytes=0-"), 0), Err(Unsatisfiable));
        assert_eq!(parse_range(Some("bytes=-5"), 0), Err(Unsatisfiable));
        assert_eq!(parse_range(None, 0), Ok(None));
    }
}
