//! URL Query Parameters
//!
//! Extraction and serialization of `name=value` pairs in a URL query string.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in a query component: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Returns the decoded value of the first `name=` pair in `search`.
///
/// `search` is a query string as found in a location bar, leading `?`
/// included; its first character is always skipped. The value runs to the
/// next `&` and is percent-decoded (`+` is kept as-is).
///
/// Returns None when the parameter is absent or its value does not decode to
/// valid UTF-8. A present but empty parameter yields `Some("")`.
pub fn get_url_param(name: &str, search: &str) -> Option<String> {
    let mut chars = search.chars();
    chars.next();
    let query = chars.as_str();

    let raw = query
        .split('&')
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))?;

    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|value| value.into_owned())
}

/// Returns the `?...` part of a full URL, without any `#fragment`.
///
/// Empty when the URL has no query.
pub fn search_of(url: &str) -> &str {
    let without_fragment = url.split('#').next().unwrap_or_default();
    match without_fragment.find('?') {
        Some(start) => &without_fragment[start..],
        None => "",
    }
}

/// Serializes pairs into `k1=v1&k2=v2`, percent-encoding keys and values.
///
/// No leading `?` is added.
pub fn to_query_string<I, K, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key.as_ref(), COMPONENT),
                utf8_percent_encode(value.as_ref(), COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}
