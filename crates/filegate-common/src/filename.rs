//! Upload filename handling
//!
//! Clients name uploads through the URL path, so every name is reduced to a
//! single safe path segment before it reaches storage. Names are allowed to
//! contain non-ASCII letters: marketplace exports are routinely named in
//! Cyrillic.

/// Extensions accepted for stored uploads.
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv", "txt"];

/// Lowercased extension after the last dot, if any.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Whether `filename` carries one of [`ALLOWED_EXTENSIONS`].
pub fn is_allowed(filename: &str) -> bool {
    extension(filename)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Reduce a client supplied name to a single safe path segment.
///
/// Directory components are discarded, whitespace becomes `_`, and anything
/// other than letters, digits, `.`, `-`, `_` and parentheses is dropped.
/// Leading and trailing dots/underscores are trimmed so the result can never
/// be `..` or a hidden file. May return an empty string.
pub fn sanitize(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | '(' | ')') {
                Some(c)
            } else {
                None
            }
        })
        .collect();

    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// `report.xlsx`, 2 -> `report (2).xlsx`
pub fn numbered(filename: &str, n: u32) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", filename, n),
    }
}
