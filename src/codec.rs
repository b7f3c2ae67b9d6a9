//! # 编解码编排模块
//!
//! 把容量校验、长度前缀、比特打包/解包与文本编码组合为完整的嵌入与恢复操作。
//! 所有校验都在修改像素之前完成，失败时调用者的缓冲区保持原样。

use std::fmt;

use clap::ValueEnum;
use log::{debug, info, warn};

use crate::constants::LENGTH_PREFIX_BYTES;
use crate::encoding::{Payload, TextEncoding};
use crate::error::{Result, StegoError};
use crate::pixels::{Geometry, PixelBuffer};
use crate::steganography::{
    LaneWrite, assemble_bytes, bits_msb_first, capacity, pack, unpack_bits,
};

/// 单次调用执行的操作。每次调用只选择一种，执行完毕即终止。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encode,
    Decode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Encode => f.write_str("encode"),
            Operation::Decode => f.write_str("decode"),
        }
    }
}

/// 载荷位写入通道最低位的方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EmbedMode {
    /// 用载荷位替换最低位，恢复时无需原图。
    #[default]
    Replace,
    /// 载荷位与原图最低位异或，恢复时必须提供未修改的原图。
    #[value(name = "xor-original")]
    XorOriginal,
}

impl EmbedMode {
    fn lane_write(self) -> LaneWrite {
        match self {
            EmbedMode::Replace => LaneWrite::Replace,
            EmbedMode::XorOriginal => LaneWrite::Xor,
        }
    }
}

/// 载荷长度的传递方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Framing {
    /// 先嵌入 4 字节大端序长度，再嵌入载荷。
    #[default]
    LengthPrefixed,
    /// 不写长度，恢复时由调用者提供长度。
    Headerless,
}

impl Framing {
    fn header_bytes(self) -> usize {
        match self {
            Framing::LengthPrefixed => LENGTH_PREFIX_BYTES,
            Framing::Headerless => 0,
        }
    }
}

/// 嵌入与恢复共用的参数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodecOptions {
    pub encoding: TextEncoding,
    pub mode: EmbedMode,
    pub framing: Framing,
}

/// 恢复操作的输入。
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractRequest<'a> {
    pub options: CodecOptions,
    /// 载荷字节数，仅在 [`Framing::Headerless`] 下使用；缺省时读取整个容量。
    /// 长度前缀模式下必须为 `None`。
    pub length: Option<usize>,
    /// 未修改的原图，[`EmbedMode::XorOriginal`] 下必需。
    pub reference: Option<&'a PixelBuffer>,
}

/// 嵌入完成后的统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedReport {
    pub payload_bytes: usize,
    /// 在当前分帧方式下可嵌入的最大载荷字节数。
    pub available_bytes: usize,
    pub bits_written: usize,
    pub pixels_touched: usize,
}

/// 在给定分帧方式下，该几何参数可容纳的最大载荷字节数。
pub fn payload_capacity(geometry: Geometry, framing: Framing) -> usize {
    capacity(geometry.pixel_count(), geometry.byte_width()).saturating_sub(framing.header_bytes())
}

/// 在给定分帧方式下，缓冲区可容纳的最大载荷字节数。
pub fn max_payload(buffer: &PixelBuffer, framing: Framing) -> usize {
    payload_capacity(buffer.geometry(), framing)
}

/// 将载荷就地嵌入像素缓冲区。
///
/// # Errors
///
/// 以下错误都在修改像素之前返回，此时缓冲区不会被修改：
/// * 载荷编码与 `options.encoding` 不一致时返回 [`StegoError::EncodingMismatch`]。
/// * 图像容纳不下长度前缀时返回 [`StegoError::MissingHeader`]。
/// * 载荷超出容量时返回 [`StegoError::PayloadTooLarge`]。
/// * 长度前缀模式下载荷超过 `u32::MAX` 字节时同样返回 [`StegoError::PayloadTooLarge`]。
pub fn embed(
    buffer: &mut PixelBuffer,
    payload: &Payload,
    options: &CodecOptions,
) -> Result<EmbedReport> {
    if payload.encoding() != options.encoding {
        return Err(StegoError::EncodingMismatch {
            payload: payload.encoding(),
            configured: options.encoding,
        });
    }

    let byte_width = buffer.byte_width();
    let total = capacity(buffer.geometry().pixel_count(), byte_width);
    let header_bytes = options.framing.header_bytes();
    if total < header_bytes {
        return Err(StegoError::MissingHeader {
            available: total,
            required: header_bytes,
        });
    }
    let available = total - header_bytes;
    debug!(
        "embedding {} bytes ({}) into {} with {:?}/{:?}",
        payload.len(),
        payload.encoding(),
        buffer.geometry(),
        options.mode,
        options.framing
    );

    if payload.len() > available {
        warn!("payload of {} bytes rejected, capacity is {available}", payload.len());
        return Err(StegoError::PayloadTooLarge {
            requested: payload.len(),
            available,
        });
    }

    let header = match options.framing {
        Framing::LengthPrefixed => u32::try_from(payload.len())
            .map_err(|_| StegoError::PayloadTooLarge {
                requested: payload.len(),
                available: u32::MAX as usize,
            })?
            .to_be_bytes()
            .to_vec(),
        Framing::Headerless => Vec::new(),
    };

    let bits = bits_msb_first(&header).chain(bits_msb_first(payload.bytes()));
    let bits_written = pack(buffer.samples_mut(), byte_width, 0, bits, options.mode.lane_write());

    let report = EmbedReport {
        payload_bytes: payload.len(),
        available_bytes: available,
        bits_written,
        pixels_touched: bits_written.div_ceil(byte_width),
    };
    info!(
        "embedded {} of {} available bytes, {} pixels touched",
        report.payload_bytes, report.available_bytes, report.pixels_touched
    );
    Ok(report)
}

/// 嵌入载荷并返回新的像素缓冲区，原缓冲区保持不变。
pub fn encode(
    buffer: &PixelBuffer,
    payload: &Payload,
    options: &CodecOptions,
) -> Result<(PixelBuffer, EmbedReport)> {
    let mut doctored = buffer.clone();
    let report = embed(&mut doctored, payload, options)?;
    Ok((doctored, report))
}

/// 从像素缓冲区恢复载荷，并按所选编码校验。
///
/// # Errors
///
/// * 异或模式下缺少原图时返回 [`StegoError::MissingReference`]，
///   原图几何参数不一致时返回 [`StegoError::GeometryMismatch`]。
/// * 图像容纳不下长度前缀时返回 [`StegoError::MissingHeader`]。
/// * 长度前缀模式下提供了显式长度时返回 [`StegoError::UnexpectedLength`]。
/// * 声明或请求的长度超出容量时返回
///   [`StegoError::DeclaredLengthExceedsCapacity`] 或 [`StegoError::PayloadTooLarge`]。
/// * 恢复出的字节在所选编码下无效时返回 [`StegoError::DecodingError`]。
pub fn extract(buffer: &PixelBuffer, request: &ExtractRequest<'_>) -> Result<Payload> {
    extract_text(buffer, request).map(|(payload, _)| payload)
}

/// 与 [`extract`] 相同，同时返回解码后的文本，避免调用者再次解码。
pub fn extract_text(
    buffer: &PixelBuffer,
    request: &ExtractRequest<'_>,
) -> Result<(Payload, String)> {
    let bytes = extract_bytes(buffer, request)?;
    let encoding = request.options.encoding;
    let text = encoding.decode(&bytes)?;
    Ok((Payload::from_bytes(bytes, encoding), text))
}

fn extract_bytes(buffer: &PixelBuffer, request: &ExtractRequest<'_>) -> Result<Vec<u8>> {
    let options = request.options;
    let byte_width = buffer.byte_width();

    let reference = match (options.mode, request.reference) {
        (EmbedMode::Replace, _) => None,
        (EmbedMode::XorOriginal, None) => return Err(StegoError::MissingReference),
        (EmbedMode::XorOriginal, Some(original)) => {
            if original.geometry() != buffer.geometry() {
                return Err(StegoError::GeometryMismatch {
                    reference: original.geometry().to_string(),
                    embedded: buffer.geometry().to_string(),
                });
            }
            Some(original.samples())
        }
    };

    let total = capacity(buffer.geometry().pixel_count(), byte_width);
    let header_bytes = options.framing.header_bytes();
    if total < header_bytes {
        return Err(StegoError::MissingHeader {
            available: total,
            required: header_bytes,
        });
    }
    let available = total - header_bytes;

    let length = match options.framing {
        Framing::LengthPrefixed => {
            if let Some(requested) = request.length {
                return Err(StegoError::UnexpectedLength { requested });
            }
            let header_bits = unpack_bits(buffer.samples(), reference, byte_width, 0, header_bytes * 8);
            let header = assemble_bytes(header_bits);
            let declared = header.iter().fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
            if declared > available {
                return Err(StegoError::DeclaredLengthExceedsCapacity { declared, available });
            }
            declared
        }
        Framing::Headerless => {
            let length = request.length.unwrap_or(available);
            if length > available {
                return Err(StegoError::PayloadTooLarge {
                    requested: length,
                    available,
                });
            }
            length
        }
    };
    debug!("extracting {length} bytes from {} with {:?}", buffer.geometry(), options.mode);

    Ok(assemble_bytes(unpack_bits(
        buffer.samples(),
        reference,
        byte_width,
        header_bytes * 8,
        length * 8,
    )))
}
