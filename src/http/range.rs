//! HTTP Range request parsing module
//!
//! Range header parsing for partial content, following RFC 7233 for a single
//! byte range. When several ranges are requested only the first is honored.

/// Parsed Range request, both ends inclusive and already clipped to the
/// length it was parsed against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Shift the range by a caller-supplied offset into the full payload
    #[inline]
    pub const fn offset_by(self, offset: u64) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// Range header parse result
#[derive(Debug, PartialEq, Eq)]
pub enum RangeParseResult {
    /// Valid range request
    Valid(ByteRange),
    /// Well-formed but cannot be satisfied for this length - should return 416
    NotSatisfiable,
    /// Malformed or non-bytes unit (ignore, return full content)
    None,
}

/// Parse an HTTP Range header value against a content length
///
/// Supported formats:
/// - `bytes=start-end` - Specific range (end clipped to the last byte)
/// - `bytes=start-` - From start to end
/// - `bytes=-suffix` - Last suffix bytes
///
/// # Examples
/// ```
/// use combo_static::http::range::{parse_range_header, RangeParseResult};
///
/// let result = parse_range_header("bytes=0-99", 1000);
/// assert!(matches!(result, RangeParseResult::Valid(_)));
///
/// let result = parse_range_header("lines=1-2", 1000);
/// assert!(matches!(result, RangeParseResult::None));
/// ```
pub fn parse_range_header(header: &str, len: u64) -> RangeParseResult {
    let Some(spec) = header.trim().strip_prefix("bytes=") else {
        return RangeParseResult::None; // Not bytes unit, ignore
    };

    // Only the first range of a multi-range request is served
    let first = spec.split(',').next().unwrap_or_default();

    let Some((start_str, end_str)) = first.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    // Suffix range: "-500" means last 500 bytes
    if start_str.is_empty() {
        return parse_suffix_range(end_str, len);
    }

    // Standard range: "start-" or "start-end"
    parse_standard_range(start_str, end_str, len)
}

/// Parse suffix range (e.g., "-500")
fn parse_suffix_range(suffix_str: &str, len: u64) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<u64>() else {
        return RangeParseResult::None;
    };

    if suffix == 0 || len == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    // Suffix larger than the content is valid, it just covers everything
    RangeParseResult::Valid(ByteRange {
        start: len.saturating_sub(suffix),
        end: len - 1,
    })
}

/// Parse standard range (e.g., "0-99" or "100-")
fn parse_standard_range(start_str: &str, end_str: &str, len: u64) -> RangeParseResult {
    let Ok(start) = start_str.parse::<u64>() else {
        return RangeParseResult::None;
    };

    let end = if end_str.is_empty() {
        None // Open-ended range
    } else {
        let Ok(e) = end_str.parse::<u64>() else {
            return RangeParseResult::None;
        };
        Some(e)
    };

    // Start beyond content is not satisfiable
    if start >= len {
        return RangeParseResult::NotSatisfiable;
    }

    let last = len - 1;
    let end = end.map_or(last, |e| e.min(last));
    if start > end {
        return RangeParseResult::NotSatisfiable;
    }

    RangeParseResult::Valid(ByteRange { start, end })
}
