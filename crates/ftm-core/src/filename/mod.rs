//! Local filename derivation for streamed media.
//!
//! The upstream names the file through `Content-Disposition`; when it doesn't
//! (or names it with nothing usable) the name is built from the track metadata.

mod content_disposition;
mod sanitize;

pub use content_disposition::{attachment_disposition, parse_content_disposition_filename};
pub use sanitize::sanitize_filename;

/// `"<title> - <artist>.mp3"`, unsanitized.
pub fn fallback_filename(title: &str, artist: &str) -> String {
    format!("{} - {}.mp3", title, artist)
}

/// Derives a safe filename for a downloaded track.
///
/// # Examples
///
/// - `derive_filename(Some("attachment; filename=\"My/Song:1.mp3\""), "X", "Y")` → `"My_Song_1.mp3"`
/// - `derive_filename(None, "Song", "Band")` → `"Song - Band.mp3"`
pub fn derive_filename(content_disposition: Option<&str>, title: &str, artist: &str) -> String {
    content_disposition
        .and_then(parse_content_disposition_filename)
        .and_then(|name| sanitize_filename(&name))
        .unwrap_or_else(|| {
            let fallback = fallback_filename(title, artist);
            sanitize_filename(&fallback).unwrap_or(fallback)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_name_is_sanitized() {
        assert_eq!(
            derive_filename(Some("attachment; filename=\"My/Song:1.mp3\""), "X", "Y"),
            "My_Song_1.mp3"
        );
    }

    #[test]
    fn missing_header_uses_title_and_artist() {
        assert_eq!(derive_filename(None, "Song", "Band"), "Song - Band.mp3");
        assert_eq!(derive_filename(Some("attachment"), "Song", "Band"), "Song - Band.mp3");
        assert_eq!(derive_filename(Some("garbage"), "Song", "Band"), "Song - Band.mp3");
    }

    #[test]
    fn fallback_is_sanitized_too() {
        assert_eq!(derive_filename(None, "AC/DC", "T.N.T?"), "AC_DC - T.N.T_.mp3");
    }

    #[test]
    fn unusable_header_name_falls_back() {
        assert_eq!(derive_filename(Some("attachment; filename=\"..\""), "Song", "Band"), "Song - Band.mp3");
    }
}
