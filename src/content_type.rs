//! Content-Type inference for attachment downloads.

/// Fallback for anything not in [`CONTENT_TYPES`].
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Suffix table, checked in order. Matching is case-sensitive.
const CONTENT_TYPES: &[(&str, &str)] = &[
    (".txt", "text/plain"),
    (".pdf", "application/pdf"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".png", "image/png"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// Resolve the Content-Type for a file name from its suffix.
///
/// ```
/// use tempmail_api::content_type;
///
/// assert_eq!(content_type::resolve("report.pdf"), "application/pdf");
/// assert_eq!(content_type::resolve("report.PDF"), "application/octet-stream");
/// ```
pub fn resolve(filename: &str) -> &'static str {
    CONTENT_TYPES
        .iter()
        .find(|(suffix, _)| filename.ends_with(suffix))
        .map_or(OCTET_STREAM, |&(_, content_type)| content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_suffixes() {
        assert_eq!(resolve("notes.txt"), "text/plain");
        assert_eq!(resolve("report.pdf"), "application/pdf");
        assert_eq!(resolve("photo.jpg"), "image/jpeg");
        assert_eq!(resolve("photo.jpeg"), "image/jpeg");
        assert_eq!(resolve("logo.png"), "image/png");
        assert_eq!(
            resolve("letter.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn test_suffix_match_is_case_sensitive() {
        assert_eq!(resolve("report.PDF"), OCTET_STREAM);
        assert_eq!(resolve("photo.Jpg"), OCTET_STREAM);
    }

    #[test]
    fn test_unknown_suffix_falls_back() {
        assert_eq!(resolve("archive.zip"), OCTET_STREAM);
        assert_eq!(resolve("README"), OCTET_STREAM);
        assert_eq!(resolve(""), OCTET_STREAM);
    }

    #[test]
    fn test_only_the_final_suffix_counts() {
        assert_eq!(resolve("report.pdf.zip"), OCTET_STREAM);
        assert_eq!(resolve("archive.zip.txt"), "text/plain");
    }
}
