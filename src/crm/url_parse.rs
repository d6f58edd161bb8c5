//! Parsing for pasted website lists.

use std::collections::HashSet;

/// Strips one leading `http://`/`https://` and one trailing `/`, then prefixes
/// `https://` unless another scheme remains.
pub fn normalize_website(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let bare = bare.strip_suffix('/').unwrap_or(bare);
    if bare.contains("://") {
        bare.to_string()
    } else {
        format!("https://{bare}")
    }
}

fn is_plausible(candidate: &str) -> bool {
    url::Url::parse(candidate).is_ok() && candidate.contains('.') && candidate.chars().count() > 4
}

/// Splits pasted text on line breaks and whitespace into normalized, unique
/// URLs in first-seen order.
pub fn parse_multiple_urls(input: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    input
        .lines()
        .flat_map(str::split_whitespace)
        .map(normalize_website)
        .filter(|candidate| seen.insert(candidate.clone()))
        .filter(|candidate| is_plausible(candidate))
        .collect()
}

/// Website without scheme and `www.`, used for display names.
pub fn domain_of(website_url: &str) -> String {
    let trimmed = website_url.trim();
    let bare = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    bare.strip_prefix("www.").unwrap_or(bare).to_string()
}

/// Website without scheme or trailing slash, used for the LinkedIn slug.
pub fn website_slug(website_url: &str) -> String {
    let trimmed = website_url.trim();
    let bare = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    bare.strip_suffix('/').unwrap_or(bare).to_string()
}
