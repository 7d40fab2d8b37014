//! Header helpers used by the dispatch core

use http::HeaderMap;
use http::header::{CONTENT_TYPE, HeaderValue};

/// Sets `content-type` unless the request already carries one.
pub fn set_content_type_if_absent(headers: &mut HeaderMap, value: &'static str) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
    }
}

/// Returns true when the `content-type` header names a JSON media type.
#[must_use]
pub fn is_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"))
}
