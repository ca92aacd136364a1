// Small shared helpers

use std::ffi::OsStr;
use std::path::Path;

use url::Url;

/// Returns the item with the greatest key, keeping the earliest one on ties.
///
/// Later items replace the running best only when strictly greater, so
/// listing order acts as the tie-break.
pub fn first_max_by_key<T, K, F>(items: &[T], mut key: F) -> Option<&T>
where
    K: PartialOrd,
    F: FnMut(&T) -> K,
{
    let mut best: Option<(&T, K)> = None;
    for item in items {
        let candidate = key(item);
        let replace = match &best {
            Some((_, current)) => candidate > *current,
            None => true,
        };
        if replace {
            best = Some((item, candidate));
        }
    }
    best.map(|(item, _)| item)
}

/// Reverses the HTML entity escaping reddit applies to preview URLs.
pub fn unescape_url(url: &str) -> String {
    url.replace("&amp;", "&")
}

/// Extracts the file extension (with leading dot) from a media URL.
///
/// Query strings and fragments are ignored. Falls back to `.jpg` when the
/// path carries no extension at all.
pub fn extension_from_url(raw: &str) -> String {
    let path = match Url::parse(raw) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => raw.split(['?', '#']).next().unwrap_or(raw).to_string(),
    };
    Path::new(&path)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| format!(".{}", ext))
        .unwrap_or_else(|| ".jpg".to_string())
}
