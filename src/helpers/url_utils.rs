//! URL parsing utilities
//!
//! Provides helpers for deriving local file names from download URLs.

/// Extract filename from a URL or mirror path.
///
/// Handles query strings and fragments, returns "download" as fallback.
///
/// # Example
/// ```ignore
/// assert_eq!(extract_filename("https://example.com/foo-1.0.zip"), "foo-1.0.zip");
/// assert_eq!(extract_filename("firefox/setup.exe?v=1"), "setup.exe");
/// ```
pub fn extract_filename(url: &str) -> String {
    // Strip query string and fragment
    let clean_url = url.split('?').next().unwrap_or(url);
    let clean_url = clean_url.split('#').next().unwrap_or(clean_url);

    clean_url
        .rsplit('/')
        .next()
        .map(sanitize_filename)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "download".to_string())
}

/// Replace characters that are not safe in a file name.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}
