//! # 错误类型模块
//!
//! 定义编解码过程中所有可能出现的错误。所有错误都在修改像素之前检测，
//! 因此任何失败都不会改动调用者的像素缓冲区。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::encoding::TextEncoding;

/// 隐写编解码器返回的错误。
#[derive(Debug, Error)]
pub enum StegoError {
    /// 载荷超出图像容量。
    #[error("payload of {requested} bytes exceeds the available capacity of {available} bytes")]
    PayloadTooLarge { requested: usize, available: usize },

    /// 像素格式无法按字节通道寻址。
    #[error("a pixel depth of {bit_depth} bits cannot be addressed as byte lanes (expected 8, 16, 24 or 32)")]
    UnsupportedChannelLayout { bit_depth: u8 },

    /// 恢复出的字节在所选编码下无效。
    #[error("recovered bytes are not valid {encoding}: {reason}")]
    DecodingError {
        encoding: TextEncoding,
        reason: String,
    },

    /// 文本无法用所选编码表示。
    #[error("text cannot be represented as {encoding}: {reason}")]
    UnencodableText {
        encoding: TextEncoding,
        reason: String,
    },

    /// 载荷来源无法打开或读取。
    #[error("payload source {} could not be read", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 样本数量与宽高不符。
    #[error("{width}x{height} image needs {expected} samples, got {actual}")]
    InvalidGeometry {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// 样本值超出位深度可表示的范围。
    #[error("sample {value:#x} at pixel {index} does not fit in {bit_depth} bits")]
    SampleOutOfRange {
        index: usize,
        value: u32,
        bit_depth: u8,
    },

    /// 异或模式恢复时缺少原始图像。
    #[error("xor-original extraction requires the unmodified source image")]
    MissingReference,

    /// 两个像素缓冲区的几何参数不一致。
    #[error("reference image is {reference}, embedded image is {embedded}")]
    GeometryMismatch { reference: String, embedded: String },

    /// 图像太小，无法容纳长度前缀。
    #[error("image holds {available} bytes, too few for the {required}-byte length header")]
    MissingHeader { available: usize, required: usize },

    /// 载荷的编码与本次操作选择的编码不一致。
    #[error("payload is encoded as {payload}, but the codec is configured for {configured}")]
    EncodingMismatch {
        payload: TextEncoding,
        configured: TextEncoding,
    },

    /// 长度前缀模式下又提供了显式长度。
    #[error("an explicit length of {requested} bytes cannot be combined with length-prefixed framing")]
    UnexpectedLength { requested: usize },

    /// 长度前缀声明的载荷大于图像容量。
    #[error("declared payload of {declared} bytes exceeds the available capacity of {available} bytes")]
    DeclaredLengthExceedsCapacity { declared: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, StegoError>;
