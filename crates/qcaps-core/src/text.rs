#![forbid(unsafe_code)]

//! Byte-level helpers shared by the banner, help-text and device-list scans.
//!
//! Emulator output is treated as opaque bytes. Nothing here allocates in
//! proportion to the input, and no helper can index past the end of a slice.

/// Find the first occurrence of `needle` in `haystack`.
///
/// An empty needle matches at offset 0.
#[must_use]
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Whether `needle` occurs anywhere in `haystack`.
#[must_use]
pub fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find_subsequence(haystack, needle).is_some()
}

/// Clip `input` to at most `max_len` bytes.
///
/// Returns the clipped slice and whether anything was dropped.
#[must_use]
pub fn clip(input: &[u8], max_len: usize) -> (&[u8], bool) {
    if input.len() > max_len {
        (&input[..max_len], true)
    } else {
        (input, false)
    }
}

/// Iterate over `\n`-separated lines, stripping a trailing `\r`.
///
/// A final line without a terminator is still yielded; a trailing
/// terminator does not produce an extra empty line.
pub fn lines(input: &[u8]) -> impl Iterator<Item = &[u8]> {
    let body = input.strip_suffix(b"\n").unwrap_or(input);
    let empty = input.is_empty();
    body.split(|&b| b == b'\n')
        .filter(move |_| !empty)
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Strip leading ASCII blanks (space and tab).
#[must_use]
pub fn skip_blanks(input: &[u8]) -> &[u8] {
    let start = input
        .iter()
        .position(|&b| b != b' ' && b != b'\t')
        .unwrap_or(input.len());
    &input[start..]
}

/// Whether a line holds nothing but ASCII whitespace.
#[must_use]
pub fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Split a leading run of ASCII digits off `input`.
///
/// Returns `None` when `input` does not start with a digit or when the run
/// does not fit in a `u32`.
#[must_use]
pub fn split_decimal(input: &[u8]) -> Option<(u32, &[u8])> {
    let len = input.iter().take_while(|b| b.is_ascii_digit()).count();
    if len == 0 {
        return None;
    }
    let mut value: u32 = 0;
    for &digit in &input[..len] {
        value = value.checked_mul(10)?.checked_add(u32::from(digit - b'0'))?;
    }
    Some((value, &input[len..]))
}

/// Lossily decode at most `max_len` bytes of `line` for diagnostics.
#[must_use]
pub fn excerpt(line: &[u8], max_len: usize) -> String {
    let (shown, _) = clip(line, max_len);
    String::from_utf8_lossy(shown).into_owned()
}
