// Copyright 2026 The Clupy Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Small helpers shared by master, worker and client: the `clupy://` URL
//! normalization and client id scheme from spec §6.

/// Rewrites a `clupy://host:port` URL to `http://host:port`. URLs that are
/// already `http(s)://` pass through unchanged.
pub fn normalize_url(url: &str) -> String {
    url.replacen("clupy://", "http://", 1)
}

/// `<hostname>:<pid>`, computed once per client process (spec §6, glossary).
pub fn client_id() -> String {
    let hostname = hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string());
    format!("{hostname}:{}", std::process::id())
}

/// Percent-encodes a worker/server URL for embedding in an HTTP path segment
/// (mirrors `urllib.parse.quote_plus` on the original registration path).
pub fn encode_path_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Reverses [`encode_path_segment`].
pub fn decode_path_segment(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(value) = u8::from_str_radix(&encoded[i + 1..i + 3], 16) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_clupy_scheme() {
        assert_eq!(
            normalize_url("clupy://localhost:7877"),
            "http://localhost:7877"
        );
        assert_eq!(normalize_url("http://localhost:7877"), "http://localhost:7877");
    }

    #[test]
    fn client_id_has_host_and_pid() {
        let id = client_id();
        assert!(id.contains(':'));
        assert!(id.ends_with(&std::process::id().to_string()));
    }

    #[test]
    fn path_segment_roundtrips() {
        let raw = "http://localhost:7877/weird path?a=b";
        let encoded = encode_path_segment(raw);
        assert!(!encoded.contains(' '));
        assert_eq!(decode_path_segment(&encoded), raw);
    }
}
