use clap::ValueEnum;
use encoding_rs::{UTF_16BE, WINDOWS_1252};
use serde::{Deserialize, Serialize};
use std::fmt;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_BOM: &[u8] = &[0xFE, 0xFF];

/// Field separator written after every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsvDelimiter {
    Comma,
    #[default]
    Semicolon,
    Tab,
    Pipe,
    Colon,
    Space,
}

impl CsvDelimiter {
    pub fn as_char(self) -> char {
        match self {
            CsvDelimiter::Comma => ',',
            CsvDelimiter::Semicolon => ';',
            CsvDelimiter::Tab => '\t',
            CsvDelimiter::Pipe => '|',
            CsvDelimiter::Colon => ':',
            CsvDelimiter::Space => ' ',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CsvDelimiter::Comma => "comma",
            CsvDelimiter::Semicolon => "semicolon",
            CsvDelimiter::Tab => "tab",
            CsvDelimiter::Pipe => "pipe",
            CsvDelimiter::Colon => "colon",
            CsvDelimiter::Space => "space",
        }
    }
}

impl fmt::Display for CsvDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output character set.
///
/// Characters the target charset cannot represent are written as `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum CsvEncoding {
    #[default]
    #[value(name = "utf8")]
    #[serde(rename = "utf8")]
    Utf8,
    #[value(name = "utf8bom")]
    #[serde(rename = "utf8bom")]
    Utf8Bom,
    #[value(name = "latin1")]
    #[serde(rename = "latin1")]
    Latin1,
    #[value(name = "windows1252")]
    #[serde(rename = "windows1252")]
    Windows1252,
    #[value(name = "utf16")]
    #[serde(rename = "utf16")]
    Utf16,
    #[value(name = "ascii")]
    #[serde(rename = "ascii")]
    Ascii,
}

impl CsvEncoding {
    pub fn name(self) -> &'static str {
        match self {
            CsvEncoding::Utf8 => "utf8",
            CsvEncoding::Utf8Bom => "utf8bom",
            CsvEncoding::Latin1 => "latin1",
            CsvEncoding::Windows1252 => "windows1252",
            CsvEncoding::Utf16 => "utf16",
            CsvEncoding::Ascii => "ascii",
        }
    }

    pub fn writes_bom(self) -> bool {
        matches!(self, CsvEncoding::Utf8Bom)
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            CsvEncoding::Utf8 => text.as_bytes().to_vec(),
            CsvEncoding::Utf8Bom => {
                let mut bytes = Vec::with_capacity(text.len() + UTF8_BOM.len());
                bytes.extend_from_slice(UTF8_BOM);
                bytes.extend_from_slice(text.as_bytes());
                bytes
            }
            CsvEncoding::Latin1 => encode_single_byte(text, 0xFF),
            CsvEncoding::Ascii => encode_single_byte(text, 0x7F),
            CsvEncoding::Windows1252 => {
                let mut bytes = Vec::with_capacity(text.len());
                let mut scratch = [0u8; 4];
                for ch in text.chars() {
                    let (encoded, _, unmappable) = WINDOWS_1252.encode(ch.encode_utf8(&mut scratch));
                    if unmappable {
                        bytes.push(b'?');
                    } else {
                        bytes.extend_from_slice(&encoded);
                    }
                }
                bytes
            }
            CsvEncoding::Utf16 => {
                // Big-endian with a leading byte-order mark
                let mut bytes = Vec::with_capacity(text.len() * 2 + UTF16_BOM.len());
                bytes.extend_from_slice(UTF16_BOM);
                for unit in text.encode_utf16() {
                    bytes.extend_from_slice(&unit.to_be_bytes());
                }
                bytes
            }
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            CsvEncoding::Utf8 | CsvEncoding::Utf8Bom => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8_lossy(body).into_owned()
            }
            CsvEncoding::Latin1 | CsvEncoding::Ascii => bytes.iter().map(|&b| b as char).collect(),
            CsvEncoding::Windows1252 => WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned(),
            CsvEncoding::Utf16 => UTF_16BE.decode(bytes).0.into_owned(),
        }
    }
}

impl fmt::Display for CsvEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn encode_single_byte(text: &str, max: u32) -> Vec<u8> {
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            if code <= max {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delimiter_characters() {
        assert_eq!(CsvDelimiter::Comma.as_char(), ',');
        assert_eq!(CsvDelimiter::Semicolon.as_char(), ';');
        assert_eq!(CsvDelimiter::Tab.as_char(), '\t');
        assert_eq!(CsvDelimiter::Pipe.as_char(), '|');
        assert_eq!(CsvDelimiter::Colon.as_char(), ':');
        assert_eq!(CsvDelimiter::Space.as_char(), ' ');
        assert_eq!(CsvDelimiter::default(), CsvDelimiter::Semicolon);
    }

    #[test]
    fn test_value_names() {
        assert_eq!(CsvEncoding::from_str("utf8bom", true).unwrap(), CsvEncoding::Utf8Bom);
        assert_eq!(CsvEncoding::from_str("windows1252", true).unwrap(), CsvEncoding::Windows1252);
        assert_eq!(CsvDelimiter::from_str("pipe", true).unwrap(), CsvDelimiter::Pipe);
        assert!(CsvDelimiter::from_str("dash", true).is_err());
    }

    #[test]
    fn test_utf8_bom_prefix() {
        let bytes = CsvEncoding::Utf8Bom.encode("a;\n");
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert_eq!(&bytes[3..], b"a;\n");
        assert_eq!(CsvEncoding::Utf8Bom.decode(&bytes), "a;\n");
        assert!(CsvEncoding::Utf8Bom.writes_bom());
        assert!(!CsvEncoding::Utf8.writes_bom());
    }

    #[test]
    fn test_single_byte_charsets() {
        assert_eq!(CsvEncoding::Latin1.encode("café€"), vec![b'c', b'a', b'f', 0xE9, b'?']);
        assert_eq!(CsvEncoding::Ascii.encode("café"), b"caf?".to_vec());
        assert_eq!(CsvEncoding::Windows1252.encode("€é"), vec![0x80, 0xE9]);
        assert_eq!(CsvEncoding::Windows1252.encode("日"), b"?".to_vec());
        assert_eq!(CsvEncoding::Windows1252.decode(&[0x80, 0xE9]), "€é");
        assert_eq!(CsvEncoding::Latin1.decode(&[b'c', 0xE9]), "cé");
    }

    #[test]
    fn test_utf16_big_endian_with_bom() {
        let bytes = CsvEncoding::Utf16.encode("A;");
        assert_eq!(bytes, vec![0xFE, 0xFF, 0x00, b'A', 0x00, b';']);
        assert_eq!(CsvEncoding::Utf16.decode(&bytes), "A;");
    }

    #[test]
    fn test_serde_names() {
        let encoding: CsvEncoding = serde_json::from_str("\"latin1\"").unwrap();
        assert_eq!(encoding, CsvEncoding::Latin1);
        let delimiter: CsvDelimiter = serde_json::from_str("\"tab\"").unwrap();
        assert_eq!(delimiter, CsvDelimiter::Tab);
    }
}
