//! Filename and title utilities shared across crates.

/// Make a subject safe for use in filenames.
///
/// The subject is trimmed and every character outside `[A-Za-z0-9_-]` is
/// replaced with `_`. CJK subjects therefore collapse to underscores; the
/// 1-based variant suffix keeps the names unique.
pub fn sanitize_subject(subject: &str) -> String {
    subject
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Wrap a title into lines of at most `max_chars_per_line` characters.
///
/// Counts characters, not bytes, since titles are frequently CJK.
pub fn wrap_title(title: &str, max_chars_per_line: usize) -> Vec<String> {
    if max_chars_per_line == 0 {
        return vec![title.to_string()];
    }
    let chars: Vec<char> = title.chars().collect();
    chars
        .chunks(max_chars_per_line)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
