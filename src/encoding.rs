//! # 文本编码模块
//!
//! 定义可选的文本编码以及待隐藏的载荷。文本在嵌入前被编码为字节序列，
//! 恢复出的字节序列再按同一编码解码回文本。

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::{Result, StegoError};

/// 文本与载荷字节之间使用的字符编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TextEncoding {
    /// 16 位宽编码 (UTF-16，大端序)。
    #[value(name = "utf-16", alias = "utf16")]
    Utf16,
    /// 8 位 UTF-8。
    #[default]
    #[value(name = "utf-8", alias = "utf8")]
    Utf8,
    /// 7 位 ASCII。
    #[value(name = "ascii", alias = "us-ascii")]
    Ascii,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf16 => "UTF-16",
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Ascii => "US-ASCII",
        }
    }

    /// 将文本编码为字节序列。
    ///
    /// UTF-16 输出为不带 BOM 的大端序。ASCII 遇到非 ASCII 字符时返回
    /// [`StegoError::UnencodableText`]，而不是静默替换。
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
            TextEncoding::Utf16 => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            TextEncoding::Ascii => match text.char_indices().find(|(_, c)| !c.is_ascii()) {
                Some((offset, c)) => Err(StegoError::UnencodableText {
                    encoding: self,
                    reason: format!("character {c:?} at byte offset {offset} is not ASCII"),
                }),
                None => Ok(text.as_bytes().to_vec()),
            },
        }
    }

    /// 将字节序列解码为文本。
    ///
    /// # Errors
    ///
    /// 字节序列在该编码下无效时返回 [`StegoError::DecodingError`]：
    /// * UTF-8 序列格式错误。
    /// * UTF-16 字节数为奇数，或包含未配对的代理项。
    /// * ASCII 中出现 `>= 0x80` 的字节。
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let fail = |reason: String| StegoError::DecodingError {
            encoding: self,
            reason,
        };

        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| fail(e.to_string())),
            TextEncoding::Ascii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(offset) => Err(fail(format!(
                    "byte {:#04x} at offset {offset} is outside 7-bit ASCII",
                    bytes[offset]
                ))),
                // 全部为 ASCII，必然是合法的 UTF-8
                None => String::from_utf8(bytes.to_vec()).map_err(|e| fail(e.to_string())),
            },
            TextEncoding::Utf16 => {
                if bytes.len() % 2 != 0 {
                    return Err(fail(format!("odd byte count {}", bytes.len())));
                }
                // 与 encode 对称：固定大端序，开头的 U+FEFF 按普通字符保留
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));

                char::decode_utf16(units)
                    .collect::<std::result::Result<String, _>>()
                    .map_err(|e| fail(e.to_string()))
            }
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        <TextEncoding as ValueEnum>::from_str(s, true)
            .map_err(|_| format!("unknown text encoding '{s}' (expected utf-16, utf-8 or ascii)"))
    }
}

/// 待嵌入或已恢复的载荷：字节序列及其文本编码。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
    encoding: TextEncoding,
}

impl Payload {
    /// 直接使用字节序列构造载荷，不做编码校验。
    pub fn from_bytes(bytes: Vec<u8>, encoding: TextEncoding) -> Self {
        Self { bytes, encoding }
    }

    pub fn from_text(text: &str, encoding: TextEncoding) -> Result<Self> {
        Ok(Self {
            bytes: encoding.encode(text)?,
            encoding,
        })
    }

    /// 从文本文件读取载荷。
    ///
    /// 文件按 UTF-8 读取，随后转换为 `encoding` 指定的编码。文件句柄在
    /// 函数返回前释放，无论成功与否。
    ///
    /// # Errors
    ///
    /// * 文件无法读取或不是 UTF-8 文本时返回 [`StegoError::SourceUnavailable`]。
    /// * 文本无法用目标编码表示时返回 [`StegoError::UnencodableText`]。
    pub fn read_text_file(path: &Path, encoding: TextEncoding) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| StegoError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_text(&text, encoding)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// 按载荷的编码解码为文本。
    pub fn to_text(&self) -> Result<String> {
        self.encoding.decode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_is_big_endian_without_bom() {
        let bytes = TextEncoding::Utf16.encode("Aé").unwrap();
        assert_eq!(bytes, vec![0x00, 0x41, 0x00, 0xE9]);
        assert_eq!(TextEncoding::Utf16.decode(&bytes).unwrap(), "Aé");
    }

    #[test]
    fn utf16_keeps_leading_feff_as_text() {
        let text = "\u{FEFF}hi";
        let bytes = TextEncoding::Utf16.encode(text).unwrap();
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        assert_eq!(TextEncoding::Utf16.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn utf16_does_not_swap_on_fffe() {
        let text = "\u{FFFE}A";
        let bytes = TextEncoding::Utf16.encode(text).unwrap();
        assert_eq!(TextEncoding::Utf16.decode(&bytes).unwrap(), text);
    }

    #[test]
    fn utf16_rejects_odd_length() {
        let err = TextEncoding::Utf16.decode(&[0x00, 0x41, 0x00]).unwrap_err();
        assert!(matches!(
            err,
            StegoError::DecodingError {
                encoding: TextEncoding::Utf16,
                ..
            }
        ));
    }

    #[test]
    fn utf16_rejects_unpaired_surrogate() {
        let err = TextEncoding::Utf16.decode(&[0xD8, 0x00, 0x00, 0x41]).unwrap_err();
        assert!(matches!(err, StegoError::DecodingError { .. }));
    }

    #[test]
    fn ascii_rejects_high_bytes() {
        let err = TextEncoding::Ascii.decode(b"ok\x80").unwrap_err();
        assert!(matches!(
            err,
            StegoError::DecodingError {
                encoding: TextEncoding::Ascii,
                ..
            }
        ));
        assert!(err.to_string().contains("offset 2"));
    }

    #[test]
    fn ascii_refuses_to_encode_non_ascii() {
        let err = TextEncoding::Ascii.encode("naïve").unwrap_err();
        assert!(matches!(err, StegoError::UnencodableText { .. }));
    }

    #[test]
    fn utf8_rejects_broken_continuation() {
        let err = TextEncoding::Utf8.decode(&[0xE4, 0xB8]).unwrap_err();
        assert!(matches!(err, StegoError::DecodingError { .. }));
    }

    #[test]
    fn parses_encoding_names() {
        assert_eq!("UTF-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("utf16".parse::<TextEncoding>().unwrap(), TextEncoding::Utf16);
        assert_eq!("ascii".parse::<TextEncoding>().unwrap(), TextEncoding::Ascii);
        assert!("latin-1".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn missing_source_file_is_reported() {
        let err = Payload::read_text_file(Path::new("/nonexistent/payload.txt"), TextEncoding::Utf8)
            .unwrap_err();
        assert!(matches!(err, StegoError::SourceUnavailable { .. }));
    }
}
