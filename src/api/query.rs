//! Query-string encoding with `encodeURIComponent` rules.

use crate::Record;
use serde_json::Value;

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&byte)
}

/// Percent-encodes everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
pub fn encode_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if is_unreserved(byte) {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Reverses [`encode_component`]. Malformed escapes are kept literally.
pub fn decode_component(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = &bytes[i + 1..i + 3];
            let byte = std::str::from_utf8(hex)
                .ok()
                .filter(|h| h.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = byte {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// The string a parameter value takes in a url. Arrays are comma-joined.
pub fn param_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(param_string).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

/// `key=value&...` for every entry of `params`.
pub fn encode(params: &Record) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(&param_string(value))))
        .collect::<Vec<_>>()
        .join("&")
}

/// Parses a query string into string-valued params.
pub fn decode(query: &str) -> Record {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), Value::String(decode_component(value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_component_matches_uri_component_rules() {
        assert_eq!(encode_component("Avo Cado"), "Avo%20Cado");
        assert_eq!(encode_component("a&b=c"), "a%26b%3Dc");
        assert_eq!(encode_component("it's-(ok)!~*._"), "it's-(ok)!~*._");
        assert_eq!(encode_component("phở"), "ph%E1%BB%9F");
    }

    #[test]
    fn test_encode_params() {
        let params = json!({ "name": "Avo Cado", "age": 31, "tags": ["a", "b"], "active": true });
        let query = encode(params.as_object().unwrap());
        assert_eq!(query, "active=true&age=31&name=Avo%20Cado&tags=a%2Cb");
    }

    #[test]
    fn test_decode_reverses_encode() {
        let decoded = decode("name=Avo%20Cado&food=ph%E1%BB%9F&empty=&broken=%zz");
        assert_eq!(decoded["name"], json!("Avo Cado"));
        assert_eq!(decoded["food"], json!("phở"));
        assert_eq!(decoded["empty"], json!(""));
        assert_eq!(decoded["broken"], json!("%zz"));
    }
}
