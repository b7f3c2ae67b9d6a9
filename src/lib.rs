//! # stegoplane 库
//!
//! 本库包含位平面 LSB 隐写编解码器的核心逻辑：把文本编码后的字节序列
//! 写入像素样本各字节通道的最低有效位，并按同样的索引规则恢复。

// 声明库包含的所有模块。

pub mod cli;
pub mod codec;
pub mod constants;
pub mod encoding;
pub mod error;
pub mod handler;
pub mod pixels;
pub mod steganography;

pub use codec::{
    CodecOptions, EmbedMode, EmbedReport, ExtractRequest, Framing, Operation, embed, encode,
    extract, extract_text, max_payload, payload_capacity,
};
pub use encoding::{Payload, TextEncoding};
pub use error::StegoError;
pub use pixels::{Geometry, PixelBuffer};
