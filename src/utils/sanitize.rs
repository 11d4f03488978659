// src/utils/sanitize.rs

/// Characters that cannot appear in a file name on Windows (and `/` anywhere).
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Used when nothing of the label survives sanitization.
const FALLBACK_STEM: &str = "chart";

/// Turns a rubric label into something safe to use as a file stem.
///
/// Illegal path characters and control characters are dropped, surrounding
/// whitespace and dots are trimmed. Hebrew and other non-ASCII letters are kept
/// as-is, so distinct part labels stay distinct.
pub fn sanitize_filename(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .filter(|c| !ILLEGAL_FILENAME_CHARS.contains(c) && !c.is_control())
        .collect();
    let cleaned = cleaned.trim().trim_matches('.').trim();

    if cleaned.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        cleaned.to_string()
    }
}
