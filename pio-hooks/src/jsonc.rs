// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundation.xyz>
// SPDX-License-Identifier: GPL-3.0-or-later

//! JSON with C style comments, as written by VS Code.

use serde::de::DeserializeOwned;

/// Remove `// line` and `/* block */` comments from `text`.
///
/// String literals are copied verbatim, so a path such as `"//server/share"`
/// or a define containing `/*` is left alone. Line comments keep their
/// terminating newline. An unterminated block comment is kept as is, which
/// makes the subsequent JSON parse fail instead of silently dropping the rest
/// of the document.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut in_string = false;
    let mut i = 0;

    while i < bytes.len() {
        if in_string {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    in_string = false;
                    i += 1;
                }
                _ => i += 1,
            }
            continue;
        }

        match (bytes[i], bytes.get(i + 1)) {
            (b'"', _) => {
                in_string = true;
                i += 1;
            }
            (b'/', Some(b'/')) => {
                out.push_str(&text[copied..i]);
                i = text[i..].find('\n').map_or(bytes.len(), |end| i + end);
                copied = i;
            }
            (b'/', Some(b'*')) => match text[i + 2..].find("*/") {
                Some(end) => {
                    out.push_str(&text[copied..i]);
                    i += 2 + end + 2;
                    copied = i;
                }
                None => break,
            },
            _ => i += 1,
        }
    }

    out.push_str(&text[copied.min(text.len())..]);
    out
}

/// Strip comments and deserialize.
pub fn from_str<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(&strip_comments(text))
}
