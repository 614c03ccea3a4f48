//! The emoji transport encoding.
//!
//! Values are first written as CBOR, a self-describing binary format that
//! keeps types intact across a round trip, and the CBOR bytes are then
//! re-encoded in base 1024: every 10 bits select one of 1024 emoji
//! codepoints. Output is wrapped every [`LINE_WIDTH`] symbols.
//!
//! ```text
//! bytes:    [b0 b1 b2 b3 b4] [b5 ...]
//! bits:     40 bits per 5-byte group
//! symbols:  4 emoji per group, ceil(n * 8 / 10) overall
//! ```
//!
//! A trailing group of exactly 4 bytes yields 4 symbols, which would decode
//! back to 5 bytes, so it is followed by [`PADDING`] to mark the surplus byte.
//! Whitespace anywhere in the input is ignored on decode.
//!
//! The format is an internal convenience and makes no compatibility promise
//! beyond `decode(encode(v)) == v`.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::content_type::ContentType;
use crate::error::EncodingError;

/// Number of distinct symbols.
pub const ALPHABET_SIZE: usize = 1024;

/// Symbols per output line.
pub const LINE_WIDTH: usize = 40;

/// Marks a trailing 4-byte group.
pub const PADDING: char = '\u{2728}';

/// Codepoint blocks backing the alphabet, as `(first, len)`.
const BLOCKS: [(u32, usize); 3] = [
    // Miscellaneous Symbols and Pictographs, Emoticons
    (0x1F300, 848),
    // Transport and Map Symbols
    (0x1F680, 128),
    // Supplemental Symbols and Pictographs
    (0x1F900, 48),
];

static ALPHABET: [char; ALPHABET_SIZE] = build_alphabet();

const fn build_alphabet() -> [char; ALPHABET_SIZE] {
    let mut table = ['\0'; ALPHABET_SIZE];
    let mut i = 0;
    let mut block = 0;
    while block < BLOCKS.len() {
        let (first, len) = BLOCKS[block];
        let mut offset = 0;
        while offset < len {
            table[i] = match char::from_u32(first + offset as u32) {
                Some(c) => c,
                None => panic!("emoji block contains an invalid scalar value"),
            };
            i += 1;
            offset += 1;
        }
        block += 1;
    }
    assert!(i == ALPHABET_SIZE, "emoji blocks must cover the alphabet");
    table
}

fn symbol_index(c: char) -> Option<u32> {
    let cp = u32::from(c);
    let mut base = 0u32;
    for (first, len) in BLOCKS {
        #[allow(clippy::cast_possible_truncation)]
        let len = len as u32;
        if (first..first + len).contains(&cp) {
            return Some(base + (cp - first));
        }
        base += len;
    }
    None
}

/// Encode raw bytes as wrapped base-1024 emoji text.
#[must_use]
pub fn encode_bytes(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 5);
    let mut written = 0usize;
    let mut push = |out: &mut String, index: u32| {
        if written > 0 && written % LINE_WIDTH == 0 {
            out.push('\n');
        }
        out.push(ALPHABET[index as usize]);
        written += 1;
    };

    let mut buf: u32 = 0;
    let mut bits: u32 = 0;
    for &byte in data {
        buf = (buf << 8) | u32::from(byte);
        bits += 8;
        while bits >= 10 {
            bits -= 10;
            push(&mut out, (buf >> bits) & 0x3FF);
        }
        buf &= (1 << bits) - 1;
    }
    if bits > 0 {
        push(&mut out, (buf << (10 - bits)) & 0x3FF);
    }
    if data.len() % 5 == 4 {
        out.push(PADDING);
    }

    out
}

/// Decode wrapped base-1024 emoji text back into raw bytes.
pub fn decode_bytes(text: &str) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(text.len() / 3);
    let mut buf: u32 = 0;
    let mut bits: u32 = 0;
    let mut padding = 0usize;

    for c in text.chars().filter(|c| !c.is_whitespace()) {
        if c == PADDING {
            padding += 1;
            continue;
        }
        if padding > 0 {
            return Err(format!("symbol {c:?} after padding"));
        }
        let index = symbol_index(c).ok_or_else(|| format!("unknown symbol {c:?}"))?;
        buf = (buf << 10) | index;
        bits += 10;
        while bits >= 8 {
            bits -= 8;
            #[allow(clippy::cast_possible_truncation)]
            out.push((buf >> bits) as u8);
        }
        buf &= (1 << bits) - 1;
    }

    match padding {
        0 => {}
        1 if out.len() % 5 == 0 && !out.is_empty() => {
            out.pop();
        }
        _ => return Err("misplaced padding".to_owned()),
    }

    Ok(out)
}

/// Serialize a value to emoji text.
pub fn to_emoji<T: Serialize + ?Sized>(value: &T) -> Result<String, EncodingError> {
    let mut cbor = Vec::with_capacity(128);
    ciborium::into_writer(value, &mut cbor)
        .map_err(|e| EncodingError::encode(ContentType::Emoji, e))?;
    Ok(encode_bytes(&cbor))
}

/// Deserialize a value from emoji text.
pub fn from_emoji<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, EncodingError> {
    let text = std::str::from_utf8(bytes).map_err(|e| EncodingError::decode(ContentType::Emoji, e))?;
    let cbor = decode_bytes(text).map_err(|e| EncodingError::decode(ContentType::Emoji, e))?;
    ciborium::from_reader(cbor.as_slice()).map_err(|e| EncodingError::decode(ContentType::Emoji, e))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_should_build_distinct_alphabet() {
        let mut seen = std::collections::HashSet::new();
        for (i, c) in ALPHABET.iter().enumerate() {
            assert!(seen.insert(*c), "duplicate symbol {c:?}");
            assert_eq!(symbol_index(*c), Some(i as u32));
        }
        assert!(symbol_index(PADDING).is_none());
    }

    #[test]
    fn test_should_round_trip_every_tail_length() {
        let data: Vec<u8> = (0..=255u8).collect();
        for len in 0..=12 {
            let slice = &data[..len];
            let text = encode_bytes(slice);
            assert_eq!(decode_bytes(&text).unwrap(), slice, "failed for length {len}");
        }
    }

    #[test]
    fn test_should_pad_four_byte_tail() {
        let text = encode_bytes(&[0xFF, 0x00, 0xFF, 0x00]);
        assert!(text.ends_with(PADDING));
        assert_eq!(text.chars().count(), 5);
    }

    #[test]
    fn test_should_wrap_long_output() {
        let data = vec![0xAB; 200];
        let text = encode_bytes(&data);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.chars().count() <= LINE_WIDTH));
        assert_eq!(decode_bytes(&text).unwrap(), data);
    }

    #[test]
    fn test_should_tolerate_presentation_whitespace() {
        let data = b"hello, pantry".to_vec();
        let text = encode_bytes(&data);
        let spaced: String = text
            .chars()
            .flat_map(|c| [c, ' '])
            .chain("\r\n\n".chars())
            .collect();
        assert_eq!(decode_bytes(&spaced).unwrap(), data);
    }

    #[test]
    fn test_should_reject_foreign_symbols() {
        assert!(decode_bytes("abc").is_err());
        let mut text = encode_bytes(&[1, 2, 3, 4]);
        text.push(ALPHABET[0]);
        assert!(decode_bytes(&text).is_err());
    }

    #[test]
    fn test_should_round_trip_typed_map() {
        let mut value = BTreeMap::new();
        value.insert("Name".to_owned(), "name".to_owned());

        let text = to_emoji(&value).unwrap();
        let back: BTreeMap<String, String> = from_emoji(text.as_bytes()).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_should_preserve_types_across_round_trip() {
        let value = serde_json::json!({
            "count": 3,
            "ratio": 0.25,
            "flag": true,
            "nothing": null,
            "nested": {"list": [1, "two", 3.5]},
        });

        let text = to_emoji(&value).unwrap();
        let back: serde_json::Value = from_emoji(text.as_bytes()).unwrap();
        assert_eq!(back, value);
    }
}
