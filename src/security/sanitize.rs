//! Query sanitization.

/// Characters removed from every query before it is used as a lookup key.
pub const DENYLIST: &[char] = &[';', '&', '|', '>', '<', '`', '$', '\\'];

/// Trim surrounding whitespace and strip [`DENYLIST`] characters.
///
/// Whitespace exposed by stripping (`"line ;"`) is trimmed as well, so the
/// result is exactly the key that is looked up and echoed back.
pub fn sanitize_query(raw: &str) -> String {
    let stripped: String = raw.trim().chars().filter(|c| !DENYLIST.contains(c)).collect();
    stripped.trim().to_string()
}
