//! Encoding of address parts and header text for RFC 5322 / RFC 2047.
//!
//! Contact names and phone numbers come straight from the device and may
//! contain anything. These functions turn them into header-safe text:
//! atoms pass through untouched, other ASCII is quoted, and non-ASCII text
//! becomes `=?UTF-8?B?...?=` encoded words.

/// Maximum length of one encoded word (RFC 2047 §2).
const MAX_ENCODED_WORD_LEN: usize = 75;

/// `=?UTF-8?B?` + `?=`
const ENCODED_WORD_OVERHEAD: usize = 12;

/// Encode the local part of an address.
///
/// A dot-atom (`john.doe`, `+15551234567`) is returned unchanged; anything
/// else becomes a quoted-string.
pub fn encode_local_part(s: &str) -> String {
    if is_dot_atom(s) {
        s.to_string()
    } else {
        quote(s)
    }
}

/// Encode a display name for use in a `From:`/`To:` header.
///
/// - `Jane Doe` → `Jane Doe` (phrase of atoms)
/// - `Doe, Jane` → `"Doe, Jane"`
/// - `José` → `=?UTF-8?B?Sm9zw6k=?=`
pub fn encode_display_name(s: &str) -> String {
    if is_atom_phrase(s) {
        s.to_string()
    } else if needs_encoded_word(s) {
        encode_words(s)
    } else {
        quote(s)
    }
}

/// Encode unstructured header text (e.g. `Subject:`).
///
/// Plain printable ASCII is kept as-is.
pub fn encode_unstructured(s: &str) -> String {
    if needs_encoded_word(s) {
        encode_words(s)
    } else {
        s.to_string()
    }
}

/// RFC 5322 `atext`.
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c)
}

fn is_dot_atom(s: &str) -> bool {
    !s.is_empty()
        && s
            .split('.')
            .all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

fn is_atom_phrase(s: &str) -> bool {
    let mut words = s.split([' ', '\t']).filter(|w| !w.is_empty()).peekable();
    words.peek().is_some() && words.all(|w| w.chars().all(is_atext))
}

fn needs_encoded_word(s: &str) -> bool {
    s.chars()
        .any(|c| !c.is_ascii() || (c.is_ascii_control() && c != '\t'))
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Split `s` on character boundaries into encoded words that each fit in
/// 75 characters, joined by a space (which decoders drop between words).
fn encode_words(s: &str) -> String {
    // 4 base64 chars per 3 input bytes
    let max_bytes = (MAX_ENCODED_WORD_LEN - ENCODED_WORD_OVERHEAD) / 4 * 3;

    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in s.chars() {
        if chunk.len() + c.len_utf8() > max_bytes {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join(" ")
}

fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", base64_encode(text.as_bytes()))
}

/// Minimal standard-alphabet base64 encoder with `=` padding.
fn base64_encode(input: &[u8]) -> String {
    const ALPHABET: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut out = String::with_capacity(input.len().div_ceil(3) * 4);
    for block in input.chunks(3) {
        let b0 = block[0];
        let b1 = block.get(1).copied().unwrap_or(0);
        let b2 = block.get(2).copied().unwrap_or(0);

        out.push(ALPHABET[(b0 >> 2) as usize] as char);
        out.push(ALPHABET[(((b0 & 0x03) << 4) | (b1 >> 4)) as usize] as char);
        if block.len() > 1 {
            out.push(ALPHABET[(((b1 & 0x0f) << 2) | (b2 >> 6)) as usize] as char);
        } else {
            out.push('=');
        }
        if block.len() > 2 {
            out.push(ALPHABET[(b2 & 0x3f) as usize] as char);
        } else {
            out.push('=');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_part_phone_number_unchanged() {
        assert_eq!(encode_local_part("+15551234567"), "+15551234567");
        assert_eq!(encode_local_part("john.doe"), "john.doe");
    }

    #[test]
    fn test_local_part_quoted() {
        assert_eq!(encode_local_part("555 1234"), "\"555 1234\"");
        assert_eq!(encode_local_part("(555) 123"), "\"(555) 123\"");
        assert_eq!(encode_local_part("a..b"), "\"a..b\"");
        assert_eq!(encode_local_part("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(encode_local_part(""), "\"\"");
    }

    #[test]
    fn test_display_name_atom_phrase() {
        assert_eq!(encode_display_name("Jane Doe"), "Jane Doe");
        assert_eq!(encode_display_name("O'Brien"), "O'Brien");
    }

    #[test]
    fn test_display_name_quoted() {
        assert_eq!(encode_display_name("Doe, Jane"), "\"Doe, Jane\"");
        assert_eq!(encode_display_name("J. Doe"), "\"J. Doe\"");
    }

    #[test]
    fn test_display_name_encoded_word() {
        assert_eq!(encode_display_name("José"), "=?UTF-8?B?Sm9zw6k=?=");
    }

    #[test]
    fn test_long_name_split_into_words() {
        let name = "é".repeat(40);
        let encoded = encode_display_name(&name);
        let words: Vec<&str> = encoded.split(' ').collect();
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|w| w.len() <= MAX_ENCODED_WORD_LEN));
    }

    #[test]
    fn test_unstructured() {
        assert_eq!(encode_unstructured("SMS with Bob"), "SMS with Bob");
        assert_eq!(
            encode_unstructured("SMS with José"),
            "=?UTF-8?B?U01TIHdpdGggSm9zw6k=?="
        );
    }

    #[test]
    fn test_base64_padding() {
        assert_eq!(base64_encode(b""), "");
        assert_eq!(base64_encode(b"f"), "Zg==");
        assert_eq!(base64_encode(b"fo"), "Zm8=");
        assert_eq!(base64_encode(b"foo"), "Zm9v");
        assert_eq!(base64_encode(b"Hola mundo"), "SG9sYSBtdW5kbw==");
    }
}
