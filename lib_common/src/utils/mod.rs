//! # Utilities Module
//!
//! Small helpers shared across the backend: upload filename handling and
//! money/distance rounding.

use uuid::Uuid;

/// Strips path components and reduces the name to a safe character set,
/// mirroring what `secure_filename` does for uploaded files.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches(['.', '_']).to_string();
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed
    }
}

/// Unique on-disk name for an upload: a random prefix plus the sanitized
/// original, so concurrent uploads of "photo.jpg" never collide.
pub fn stored_upload_name(original: &str) -> String {
    format!("{}_{}", Uuid::new_v4().simple(), sanitize_filename(original))
}

/// Rounds to 2 decimals (money and kilometers).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("my photo (1).jpg"), "my_photo__1_.jpg");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[test]
    fn stored_names_are_unique_per_call() {
        let a = stored_upload_name("photo.jpg");
        let b = stored_upload_name("photo.jpg");
        assert_ne!(a, b);
        assert!(a.ends_with("photo.jpg"));
    }

    #[test]
    fn round2_rounds_half_up() {
        assert_eq!(round2(12.346), 12.35);
        assert_eq!(round2(5.004), 5.0);
        assert_eq!(round2(7.0), 7.0);
    }
}
