//! Postal code validation.

/// Largest accepted postal code.
pub const MAX_ZIP: i64 = 99_999;

/// Parse `input` as a base-10 integer in `0..=99999` and return the
/// zero-padded five digit key, or `None` when it is not acceptable.
///
/// Parsing is permissive about shape: `"1"`, `"+1"` and `"00001"` all map to
/// `"00001"`. Surrounding whitespace is rejected.
pub fn normalize_zip(input: &str) -> Option<String> {
    let value: i64 = input.parse().ok()?;
    if (0..=MAX_ZIP).contains(&value) {
        Some(format!("{value:05}"))
    } else {
        None
    }
}
