//! Filename sanitization for media saved or served under an upstream-chosen name.

/// Longest filename most filesystems accept, in bytes.
const NAME_MAX: usize = 255;

/// Characters that are unsafe in a filename on at least one common platform.
const RESERVED: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Replaces reserved and control characters with `_`, leaving the rest of
/// the name as it was.
///
/// Surrounding whitespace is trimmed and the result is capped at 255 bytes.
/// Returns `None` when nothing usable is left (empty, `.` or `..`).
pub fn sanitize_filename(name: &str) -> Option<String> {
    let replaced: String = name
        .chars()
        .map(|c| {
            if RESERVED.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return None;
    }

    if trimmed.len() <= NAME_MAX {
        return Some(trimmed.to_string());
    }
    let mut take = NAME_MAX;
    while !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    Some(trimmed[..take].to_string())
}
