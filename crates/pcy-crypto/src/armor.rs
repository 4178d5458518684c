//! Delimiter-safe text armor for binary ciphertext
//!
//! Armor = standard base64 followed by a fixed substitution of the three
//! base64 characters that clash with URLs, form encoding and common
//! delimiters:
//!
//! ```text
//! '/' -> ".x"    '=' -> ".y"    '+' -> ".z"
//! ```
//!
//! The resulting alphabet is `[A-Za-z0-9.]`. Every replacement begins with
//! `.`, a character base64 never produces, so no replacement is a prefix of
//! another replacement or of a plain base64 character.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use pcy_core::{CodecError, CodecResult};

/// Escape character that introduces every substituted sequence.
pub const ESCAPE: char = '.';

/// Base64 character paired with the character that follows [`ESCAPE`].
pub const SUBSTITUTIONS: [(char, char); 3] = [('/', 'x'), ('=', 'y'), ('+', 'z')];

/// Encode raw bytes into armored text.
pub fn armor(data: &[u8]) -> String {
    let b64 = STANDARD.encode(data);
    let mut out = String::with_capacity(b64.len() + b64.len() / 8);
    for c in b64.chars() {
        match SUBSTITUTIONS.iter().find(|(plain, _)| *plain == c) {
            Some((_, tag)) => {
                out.push(ESCAPE);
                out.push(*tag);
            }
            None => out.push(c),
        }
    }
    out
}

/// Decode armored text back into raw bytes.
///
/// Rejects characters outside the armor alphabet, dangling or unknown
/// escapes, and anything the base64 decoder refuses.
pub fn unarmor(text: &str) -> CodecResult<Vec<u8>> {
    let mut b64 = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == ESCAPE {
            let tag = chars
                .next()
                .ok_or_else(|| malformed("dangling escape at end of segment"))?;
            let (plain, _) = SUBSTITUTIONS
                .iter()
                .find(|(_, t)| *t == tag)
                .ok_or_else(|| malformed(format!("unknown escape sequence '.{tag}'")))?;
            b64.push(*plain);
        } else if c.is_ascii_alphanumeric() {
            b64.push(c);
        } else {
            return Err(malformed(format!("character {c:?} is not in the armor alphabet")));
        }
    }

    STANDARD
        .decode(b64.as_bytes())
        .map_err(|e| malformed(format!("base64 decode: {e}")))
}

/// Whether `c` can appear in armored output.
pub fn is_armor_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == ESCAPE
}

fn malformed(reason: impl Into<String>) -> CodecError {
    CodecError::MalformedEnvelope(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcy_core::ErrorKind;
    use proptest::prelude::*;

    const BASE64_ALPHABET: &str =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

    #[test]
    fn reserved_characters_are_substituted() {
        // 0xfb 0xff encodes to "+/8=" in standard base64
        let armored = armor(&[0xfb, 0xff]);
        assert_eq!(armored, ".z.x8.y");
        assert_eq!(unarmor(&armored).unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn empty_input() {
        assert_eq!(armor(b""), "");
        assert_eq!(unarmor("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn substitution_table_is_collision_free() {
        let mut sequences: Vec<String> = SUBSTITUTIONS
            .iter()
            .map(|(_, tag)| format!("{ESCAPE}{tag}"))
            .collect();

        // Every base64 character that survives unchanged is a one-char sequence.
        for c in BASE64_ALPHABET.chars() {
            if SUBSTITUTIONS.iter().all(|(plain, _)| *plain != c) {
                assert!(is_armor_char(c), "{c:?} must be armor-safe");
                sequences.push(c.to_string());
            }
        }

        assert!(!BASE64_ALPHABET.contains(ESCAPE));
        for (i, a) in sequences.iter().enumerate() {
            for (j, b) in sequences.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a.as_str()), "{a:?} is a prefix of {b:?}");
                }
            }
        }

        let tags: Vec<char> = SUBSTITUTIONS.iter().map(|(_, t)| *t).collect();
        let mut dedup = tags.clone();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(tags.len(), dedup.len(), "escape tags must be distinct");
    }

    #[test]
    fn every_base64_character_survives_armor() {
        for c in BASE64_ALPHABET.chars() {
            let armored: String = armor_text(&c.to_string());
            assert!(armored.chars().all(is_armor_char));
        }
    }

    fn armor_text(b64: &str) -> String {
        // Applies only the substitution step, for alphabet checks.
        b64.chars()
            .map(|c| match SUBSTITUTIONS.iter().find(|(p, _)| *p == c) {
                Some((_, tag)) => format!("{ESCAPE}{tag}"),
                None => c.to_string(),
            })
            .collect()
    }

    #[test]
    fn rejects_foreign_characters() {
        for bad in ["abc/", "ab+c", "ab==", "a_bc", "ab c"] {
            let err = unarmor(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedEnvelope, "{bad}");
        }
    }

    #[test]
    fn rejects_bad_escapes() {
        assert!(unarmor("QUJD.").is_err());
        assert!(unarmor("QUJD.q").is_err());
        assert!(unarmor("..xx").is_err());
    }

    #[test]
    fn rejects_truncated_base64() {
        // "QUJD" is "ABC"; dropping a character leaves an invalid length
        assert!(unarmor("QUJ").is_err());
    }

    proptest! {
        #[test]
        fn armor_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..=1024)) {
            let armored = armor(&data);
            prop_assert!(armored.chars().all(is_armor_char));
            prop_assert!(!armored.contains('/'));
            prop_assert!(!armored.contains('+'));
            prop_assert!(!armored.contains('='));
            prop_assert!(!armored.contains('_'));
            prop_assert_eq!(unarmor(&armored).unwrap(), data);
        }
    }
}
