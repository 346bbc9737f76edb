//! CRLF handling. Every internal range is computed against LF text.

use std::borrow::Cow;

use rulemap_core::ByteRange;

pub fn uses_crlf(text: &str) -> bool {
    text.contains("\r\n")
}

/// `text` with every `\r\n` replaced by `\n`.
pub fn normalize(text: &str) -> Cow<'_, str> {
    if uses_crlf(text) {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Map a range in LF-normalized text back onto the CRLF original by adding
/// one byte per line break before `range.start`.
pub fn adjust_range(normalized: &str, range: ByteRange) -> ByteRange {
    let before = normalized.get(..range.start).unwrap_or(normalized);
    let breaks = before.bytes().filter(|b| *b == b'\n').count();
    range.shifted(breaks)
}

/// Map a range in the CRLF original onto its LF-normalized equivalent.
pub fn normalize_range(original: &str, range: ByteRange) -> ByteRange {
    let bytes = original.as_bytes();
    let carriage_returns = |end: usize| {
        bytes[..end.min(bytes.len())]
            .windows(2)
            .filter(|pair| *pair == b"\r\n")
            .count()
    };
    ByteRange::new(
        range.start.saturating_sub(carriage_returns(range.start)),
        range.end.saturating_sub(carriage_returns(range.end)),
    )
}
