//! `Range` header parsing.
//!
//! Supports one byte range per request in the three forms `bytes=a-b`,
//! `bytes=a-` and `bytes=-n`. Anything else is unsatisfiable; the variants of
//! [`RangeError`] only exist so the cause can be logged.

use cs_core::ByteRange;

/// Why a `Range` header could not be honoured. All variants become 416.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// Not `bytes=<digits>-<digits>` in any accepted shape.
    #[error("malformed range header: {0}")]
    Malformed(&'static str),
    /// More than one comma-separated range.
    #[error("multiple ranges are not supported")]
    MultipleRanges,
    /// Well-formed but outside `[0, total)` or reversed.
    #[error("range {spec} is outside 0..{total}")]
    OutOfBounds { spec: String, total: u64 },
    /// The resource has no bytes, so no range can be satisfied.
    #[error("resource is empty")]
    EmptyResource,
}

/// Parse an optional `Range` header against a resource of `total` bytes.
///
/// `Ok(None)` means no header was sent and the whole resource is served.
pub fn parse(header: Option<&str>, total: u64) -> Result<Option<ByteRange>, RangeError> {
    let Some(raw) = header else {
        return Ok(None);
    };

    let raw = raw.trim();
    let spec = match raw.split_once('=') {
        Some((unit, spec)) if unit.trim().eq_ignore_ascii_case("bytes") => spec.trim(),
        Some(_) => return Err(RangeError::Malformed("unit is not bytes")),
        None => return Err(RangeError::Malformed("missing '='")),
    };

    if spec.contains(',') {
        return Err(RangeError::MultipleRanges);
    }

    let (first, last) = spec
        .split_once('-')
        .ok_or(RangeError::Malformed("missing '-'"))?;
    let first = parse_position(first.trim())?;
    let last = parse_position(last.trim())?;

    let out_of_bounds = || RangeError::OutOfBounds {
        spec: spec.to_owned(),
        total,
    };

    let (start, end) = match (first, last) {
        (None, None) => return Err(RangeError::Malformed("no positions")),
        // bytes=-N: the last N bytes.
        (None, Some(suffix)) => {
            if suffix == 0 {
                return Err(out_of_bounds());
            }
            if total == 0 {
                return Err(RangeError::EmptyResource);
            }
            (total.saturating_sub(suffix), total - 1)
        }
        // bytes=N-: from N to the end.
        (Some(start), None) => {
            if total == 0 {
                return Err(RangeError::EmptyResource);
            }
            (start, total - 1)
        }
        (Some(start), Some(end)) => {
            if total == 0 {
                return Err(RangeError::EmptyResource);
            }
            (start, end)
        }
    };

    ByteRange::new(start, end, total)
        .map(Some)
        .ok_or_else(out_of_bounds)
}

/// An empty position is `None`; otherwise ASCII digits only.
fn parse_position(s: &str) -> Result<Option<u64>, RangeError> {
    if s.is_empty() {
        return Ok(None);
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed("position is not a decimal number"));
    }
    s.parse()
        .map(Some)
        .map_err(|_| RangeError::Malformed("position overflows u64"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn range(start: u64, end: u64, total: u64) -> Option<ByteRange> {
        ByteRange::new(start, end, total)
    }

    #[test]
    fn absent_header_serves_whole_resource() {
        assert_eq!(parse(None, 1000), Ok(None));
        assert_eq!(parse(None, 0), Ok(None));
    }

    #[test]
    fn explicit_range() {
        assert_eq!(parse(Some("bytes=500-999"), 1000), Ok(range(500, 999, 1000)));
        assert_eq!(parse(Some("bytes=0-0"), 1), Ok(range(0, 0, 1)));
    }

    #[test]
    fn open_ended_range() {
        assert_eq!(
            parse(Some("bytes=900000-"), 1_000_000),
            Ok(range(900_000, 999_999, 1_000_000))
        );
    }

    #[test]
    fn suffix_range() {
        assert_eq!(parse(Some("bytes=-500"), 1000), Ok(range(500, 999, 1000)));
        assert_eq!(parse(Some("bytes=-5000"), 1000), Ok(range(0, 999, 1000)));
    }

    #[test]
    fn zero_suffix_is_unsatisfiable() {
        assert_matches!(
            parse(Some("bytes=-0"), 1000),
            Err(RangeError::OutOfBounds { .. })
        );
    }

    #[test]
    fn whitespace_and_unit_case_are_tolerated() {
        assert_eq!(parse(Some("  Bytes = 10 - 19 "), 100), Ok(range(10, 19, 100)));
    }

    #[test]
    fn reversed_range_is_out_of_bounds() {
        assert_matches!(
            parse(Some("bytes=500-100"), 1000),
            Err(RangeError::OutOfBounds { total: 1000, .. })
        );
    }

    #[test]
    fn start_past_end_of_file_is_out_of_bounds() {
        assert_matches!(
            parse(Some("bytes=1000-"), 1000),
            Err(RangeError::OutOfBounds { .. })
        );
        assert_matches!(
            parse(Some("bytes=1500-1600"), 1000),
            Err(RangeError::OutOfBounds { .. })
        );
    }

    #[test]
    fn end_past_end_of_file_is_out_of_bounds() {
        assert_matches!(
            parse(Some("bytes=0-1000"), 1000),
            Err(RangeError::OutOfBounds { .. })
        );
    }

    #[test]
    fn multiple_ranges_are_rejected() {
        assert_eq!(
            parse(Some("bytes=0-10,20-30"), 1000),
            Err(RangeError::MultipleRanges)
        );
    }

    #[test]
    fn malformed_headers() {
        for raw in [
            "bytes=-",
            "bytes=abc-def",
            "bytes=+5-10",
            "bytes 0-10",
            "items=0-10",
            "bytes=10",
            "bytes=99999999999999999999999-",
        ] {
            assert_matches!(parse(Some(raw), 1000), Err(RangeError::Malformed(_)), "{raw}");
        }
    }

    #[test]
    fn empty_resource_has_no_satisfiable_range() {
        for raw in ["bytes=0-", "bytes=-1", "bytes=0-0"] {
            assert_eq!(parse(Some(raw), 0), Err(RangeError::EmptyResource), "{raw}");
        }
    }
}
