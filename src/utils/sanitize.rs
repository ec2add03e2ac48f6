//! Filename sanitization utilities

/// Sanitize a filename for safe filesystem usage
///
/// Replaces the characters that are invalid on at least one major
/// filesystem with `-`, matching the naming scheme players expect for
/// `<track> - <artist>` files and their `.lrc` sidecars.
///
/// # Examples
///
/// ```
/// use cadenza::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("AC/DC - T.N.T"), "AC-DC - T.N.T");
/// assert_eq!(sanitize_filename("What If?"), "What If-");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' => '-',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
