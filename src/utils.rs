//! Small string helpers shared by the listing parser, the enricher and logging.

/// Whether a link already carries a scheme and can be used as-is.
///
/// Anything starting with `http` (so both `http://` and `https://`) counts as
/// absolute; everything else is treated as relative to some base.
pub fn is_absolute_url(link: &str) -> bool {
    link.starts_with("http")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number
/// of dropped characters appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 chars)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => {
            let dropped = s[cut..].chars().count();
            format!("{}…(+{} chars)", &s[..cut], dropped)
        }
    }
}
