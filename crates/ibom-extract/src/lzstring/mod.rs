//! LZ-String decompression.
//!
//! InteractiveHtmlBom embeds its `pcbdata` JSON compressed with LZ-String and
//! base64-encoded. The decoder below handles every LZ-String text transport:
//! they differ only in how compressed text maps to symbol values.

pub mod bits;

use bits::{Alphabet, BitReader};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompressError {
    #[error("compressed stream ended after {offset} symbols without a terminator")]
    Truncated { offset: usize },

    #[error("code {code} does not name a dictionary entry (dictionary holds {dict_size})")]
    CorruptCode { code: usize, dict_size: usize },

    #[error("invalid leading selector {0}")]
    BadSelector(u32),

    #[error("decompressed text is not valid UTF-16")]
    InvalidUtf16,
}

/// Codes below this value are control codes, not dictionary references.
const CONTROL_CODES: usize = 3;
const LITERAL_8: usize = 0;
const LITERAL_16: usize = 1;
const END_OF_STREAM: usize = 2;

/// Decompress output of `LZString.compressToBase64`.
pub fn decompress_from_base64(input: &str) -> Result<String, DecompressError> {
    if input.is_empty() {
        return Ok(String::new());
    }
    let symbols = input.chars().map(|c| Alphabet::Base64.value(c));
    Decoder::new(BitReader::new(symbols, 6)).run()
}

/// Decompress output of `LZString.compressToEncodedURIComponent`.
pub fn decompress_from_encoded_uri_component(input: &str) -> Result<String, DecompressError> {
    if input.is_empty() {
        return Ok(String::new());
    }
    let symbols = input.chars().map(|c| Alphabet::UriSafe.value(c));
    Decoder::new(BitReader::new(symbols, 6)).run()
}

/// Decompress output of `LZString.compressToUTF16`.
pub fn decompress_from_utf16(input: &str) -> Result<String, DecompressError> {
    if input.is_empty() {
        return Ok(String::new());
    }
    let symbols = input.encode_utf16().map(|unit| u32::from(unit).saturating_sub(32));
    Decoder::new(BitReader::new(symbols, 15)).run()
}

/// Decoder state. The dictionary is append-only: a code is simply an index,
/// with slots 0..3 reserved for the control codes.
struct Decoder<I> {
    bits: BitReader<I>,
    dictionary: Vec<Vec<u16>>,
    num_bits: u32,
    enlarge_in: u32,
}

impl<I: Iterator<Item = u32>> Decoder<I> {
    fn new(bits: BitReader<I>) -> Self {
        Self {
            bits,
            dictionary: vec![Vec::new(); CONTROL_CODES],
            num_bits: 3,
            enlarge_in: 4,
        }
    }

    fn run(mut self) -> Result<String, DecompressError> {
        let units = self.decode()?;
        String::from_utf16(&units).map_err(|_| DecompressError::InvalidUtf16)
    }

    fn decode(&mut self) -> Result<Vec<u16>, DecompressError> {
        let first = match self.bits.read_bits(2)? {
            0 => self.bits.read_bits(8)?,
            1 => self.bits.read_bits(16)?,
            2 => return Ok(Vec::new()),
            other => return Err(DecompressError::BadSelector(other)),
        };
        let mut w = vec![first as u16];
        self.dictionary.push(w.clone());
        let mut output = w.clone();

        loop {
            let mut code = self.bits.read_bits(self.num_bits)? as usize;
            match code {
                LITERAL_8 | LITERAL_16 => {
                    let width = if code == LITERAL_8 { 8 } else { 16 };
                    let unit = self.bits.read_bits(width)? as u16;
                    self.dictionary.push(vec![unit]);
                    code = self.dictionary.len() - 1;
                    self.tick();
                }
                END_OF_STREAM => return Ok(output),
                _ => {}
            }

            let entry = match self.dictionary.get(code) {
                Some(entry) if code >= CONTROL_CODES => entry.clone(),
                // The one code the encoder may reference before we have learned it.
                None if code == self.dictionary.len() => {
                    let mut entry = w.clone();
                    entry.push(w[0]);
                    entry
                }
                _ => {
                    return Err(DecompressError::CorruptCode {
                        code,
                        dict_size: self.dictionary.len(),
                    })
                }
            };
            output.extend_from_slice(&entry);

            w.push(entry[0]);
            self.dictionary.push(w);
            self.tick();

            w = entry;
        }
    }

    /// Count down one dictionary insertion, widening codes when the window fills.
    fn tick(&mut self) {
        self.enlarge_in -= 1;
        if self.enlarge_in == 0 {
            self.enlarge_in = 1 << self.num_bits;
            self.num_bits += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_JSON: &str = include_str!("../../testdata/current.json");
    const DEMO_B64: &str = include_str!("../../testdata/current.b64");

    #[test]
    fn test_decompress_hello() {
        assert_eq!(decompress_from_base64("BYUwNmD2Q===").unwrap(), "hello");
    }

    #[test]
    fn test_decompress_single_char() {
        assert_eq!(decompress_from_base64("IZA=").unwrap(), "a");
    }

    #[test]
    fn test_decompress_sixteen_bit_literal() {
        assert_eq!(decompress_from_base64("IYI0NQQMZA==").unwrap(), "ab€c");
    }

    #[test]
    fn test_decompress_surrogate_pairs() {
        assert_eq!(
            decompress_from_base64("sFAhYNx4uwBAzgdg9gdwLYEMYUMBkE0BMIBcUAjASCA=").unwrap(),
            "ʃ𝄞 snowman ☃ and tab\t"
        );
    }

    #[test]
    fn test_decompress_repeated_pattern() {
        // Exercises the code == dictionary size case.
        assert_eq!(
            decompress_from_base64("IYI17SNI").unwrap(),
            "ababababababababab"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(decompress_from_base64("").unwrap(), "");
        assert_eq!(decompress_from_encoded_uri_component("").unwrap(), "");
        assert_eq!(decompress_from_utf16("").unwrap(), "");
    }

    #[test]
    fn test_explicit_empty_terminator() {
        // 'Q' = 0b010000: leading 2-bit selector reads as 2.
        assert_eq!(decompress_from_base64("Q===").unwrap(), "");
    }

    #[test]
    fn test_round_trip_document() {
        let json = decompress_from_base64(DEMO_B64.trim()).unwrap();
        assert_eq!(json, DEMO_JSON.trim_end());
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["title"], "demo-board");
    }

    #[test]
    fn test_repeated_decompression_is_identical() {
        let a = decompress_from_base64(DEMO_B64.trim()).unwrap();
        let b = decompress_from_base64(DEMO_B64.trim()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_code_width_widens_repeatedly() {
        let symbols = DEMO_B64.trim().chars().map(|c| Alphabet::Base64.value(c));
        let mut decoder = Decoder::new(BitReader::new(symbols, 6));
        let units = decoder.decode().unwrap();
        assert_eq!(String::from_utf16(&units).unwrap(), DEMO_JSON.trim_end());
        assert_eq!(decoder.num_bits, 10);
        assert_eq!(decoder.dictionary.len(), 879);
    }

    #[test]
    fn test_truncated_input_fails() {
        let full = "BYUwNmD2Q===";
        let unpadded = full.trim_end_matches('=');
        assert_eq!(decompress_from_base64(unpadded).unwrap(), "hello");

        let truncated = &unpadded[..unpadded.len() - 1];
        assert!(matches!(
            decompress_from_base64(truncated),
            Err(DecompressError::Truncated { .. })
        ));

        let doc = DEMO_B64.trim().trim_end_matches('=');
        assert!(matches!(
            decompress_from_base64(&doc[..doc.len() - 1]),
            Err(DecompressError::Truncated { .. })
        ));
    }

    #[test]
    fn test_corrupt_code_fails() {
        // Selector 0, literal 'a', then code 7 with only 4 entries learned.
        // Bits (LSB-first groups): 00 | 10000110 | 111 -> symbols below.
        let bits = [0, 0, 1, 0, 0, 0, 0, 1, 1, 0, 1, 1, 1];
        let mut symbols = Vec::new();
        for chunk in bits.chunks(6) {
            let mut v = 0u32;
            for (i, b) in chunk.iter().enumerate() {
                v |= b << (5 - i);
            }
            symbols.push(v);
        }
        let decoder = Decoder::new(BitReader::new(symbols.into_iter(), 6));
        assert_eq!(
            decoder.run(),
            Err(DecompressError::CorruptCode {
                code: 7,
                dict_size: 4
            })
        );
    }

    #[test]
    fn test_bad_selector() {
        // 'w' = 48 = 0b110000: selector reads as 3.
        assert_eq!(
            decompress_from_base64("w"),
            Err(DecompressError::BadSelector(3))
        );
    }

    #[test]
    fn test_decompress_uri_component() {
        assert_eq!(
            decompress_from_encoded_uri_component("BYUwNmD2Q").unwrap(),
            "hello"
        );
        assert_eq!(
            decompress_from_encoded_uri_component("N4IgbiBcIJ4F70Q5TUvW+A-A-APhAF8g").unwrap(),
            r#"{"v":"yzyzyzyzyzyzyzyzyzyzyzyzyzyzyzyzyzyzyz~?>"}"#
        );
    }

    #[test]
    fn test_decompress_utf16() {
        let hello: String = char::decode_utf16([0x2e2, 0x4c2d, 0x4c3e, 0x6420, 0x20])
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(decompress_from_utf16(&hello).unwrap(), "hello");

        let units = [
            0x1be1, 0x841, 0x442b, 0x40fa, 0x480, 0xd20, 0x4d10, 0x19a0, 0x5d22, 0x7ca0, 0x20,
        ];
        let text = String::from_utf16(&units).unwrap();
        assert_eq!(decompress_from_utf16(&text).unwrap(), r#"{"a":[1,2,3]}"#);
    }
}
