//! Resolution of link attributes against a document's base URI.

use url::Url;

/// Resolve an attribute value to an absolute URL.
///
/// - An empty value resolves to `""`.
/// - With no base, only values that are already absolute resolve.
/// - An unusable base leaves the value as written.
pub fn abs_url(base_uri: &str, value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }

    if base_uri.is_empty() {
        return Url::parse(value).map(String::from).unwrap_or_default();
    }

    match Url::parse(base_uri) {
        Ok(base) => base
            .join(value)
            .map(String::from)
            .unwrap_or_else(|_| value.to_string()),
        Err(err) => {
            tracing::debug!(base_uri, %err, "base URI does not parse");
            value.to_string()
        }
    }
}
