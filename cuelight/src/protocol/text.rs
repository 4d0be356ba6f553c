/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Text helpers for frame payloads.

use encoding_rs::GBK;
use tracing::warn;

/// Escape protocol control characters (`\`, CR, LF, `;`, `,`) for display in
/// diagnostics.  Voice payloads on the wire are hex and never need this.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            other => out.push(other),
        }
    }
    out
}

/// Encode `text` as GBK and render each byte as two uppercase hex digits,
/// separated by single spaces.
///
/// Characters GBK cannot represent are emitted as the encoder's numeric
/// character reference (`&#NNNN;`) and reported with a warning.
pub fn gbk_hex(text: &str) -> String {
    let (bytes, _, unmappable) = GBK.encode(text);
    if unmappable {
        warn!(text = %text, "voice text contains characters outside GBK");
    }
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_every_control_character() {
        assert_eq!(escape_text("a,b;c\\d\r\n"), "a\\,b\\;c\\\\d\\r\\n");
        assert_eq!(escape_text("plain"), "plain");
    }

    #[test]
    fn ascii_is_hex_encoded_per_byte() {
        assert_eq!(gbk_hex("Hi"), "48 69");
    }

    #[test]
    fn chinese_uses_two_byte_gbk_codes() {
        // 中 = D6D0, 文 = CEC4 in GB2312.
        assert_eq!(gbk_hex("中文"), "D6 D0 CE C4");
    }

    #[test]
    fn empty_text_is_empty_payload() {
        assert_eq!(gbk_hex(""), "");
    }

    #[test]
    fn unmappable_characters_become_numeric_references() {
        // "&#128512;" for U+1F600.
        let hex = gbk_hex("\u{1F600}");
        assert!(hex.starts_with("26 23"), "{hex}");
        assert!(hex.ends_with("3B"), "{hex}");
    }
}
