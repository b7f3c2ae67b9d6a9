//! # 命令处理逻辑模块
//!
//! 包含处理 `hide`、`recover` 和 `capacity` 子命令的高级业务逻辑。
//! 本模块负责协调文件 I/O、调用编解码器以及向用户报告结果。

use crate::cli::{CapacityArgs, GeometryArgs, HideArgs, RecoverArgs};
use crate::codec::{self, CodecOptions, ExtractRequest, Operation};
use crate::constants::{DOCTORED_PREFIX, RECOVERED_PREFIX};
use crate::encoding::Payload;
use crate::pixels::{Geometry, PixelBuffer};
use crate::steganography::capacity;
use anyhow::{Context, Result};
use colored::Colorize;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// 处理 'Hide' 命令的执行逻辑。
///
/// 负责读取原始样本和文本文件、检查隐写空间是否足够、调用编解码器嵌入载荷，
/// 最后将结果写入目标文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与编解码参数的 `HideArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取输入的样本或文本文件，或样本与几何参数不符。
/// * 图像没有足够的空间来隐藏文本。
/// * 无法写入到目标文件。
pub fn handle_hide(args: HideArgs) -> Result<()> {
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| sibling_with_prefix(&args.image, DOCTORED_PREFIX, None));
    ensure_writable(&dest, args.force)?;

    let mut picture = load_pixels(&args.image, args.geometry)?;
    let options = CodecOptions::from(args.codec);

    let payload = Payload::read_text_file(&args.text, options.encoding).with_context(|| {
        format!(
            "Unable to read text file: {}",
            args.text.to_string_lossy().red().bold()
        )
    })?;

    let available = codec::max_payload(&picture, options.framing);
    anyhow::ensure!(
        available >= payload.len(),
        "Not enough space in the image to hide the text. \nRequired: {}, Available: {}",
        payload.len().to_string().red().bold(),
        available.to_string().green().bold()
    );

    let report = codec::embed(&mut picture, &payload, &options).with_context(|| {
        format!(
            "Failed to hide the text in {}. \nThe sample file may not match the given geometry.",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    debug!("{report:?}");

    fs::write(&dest, picture.to_raw_bytes()).with_context(|| {
        format!(
            "Unable to write to target image file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    report_done(
        Operation::Encode,
        &format!(
            "The text has been successfully hidden ({} of {} bytes used) and saved: {}",
            report.payload_bytes,
            report.available_bytes,
            dest.to_string_lossy().green().bold()
        ),
    );

    Ok(())
}

/// 处理 'Recover' 命令的执行逻辑。
///
/// 负责读取经过隐写的样本文件、调用编解码器恢复载荷并按所选编码解码，
/// 最后将恢复的文本内容以 UTF-8 写入目标文本文件。
///
/// # Arguments
///
/// * `args` - 包含输入/输出路径与编解码参数的 `RecoverArgs` 结构体。
///
/// # Errors
///
/// 如果发生以下任一情况，将返回错误：
/// * 输出文件已存在且未指定 `--force`。
/// * 无法读取输入的样本文件或原图文件。
/// * 载荷无法恢复，或恢复出的字节在所选编码下无效。
/// * 无法写入到目标文本文件。
pub fn handle_recover(args: RecoverArgs) -> Result<()> {
    let dest = args
        .text
        .clone()
        .unwrap_or_else(|| sibling_with_prefix(&args.image, RECOVERED_PREFIX, Some("txt")));
    ensure_writable(&dest, args.force)?;

    let picture = load_pixels(&args.image, args.geometry)?;
    let original = args
        .original
        .as_deref()
        .map(|path| load_pixels(path, args.geometry))
        .transpose()?;

    let request = ExtractRequest {
        options: CodecOptions::from(args.codec),
        length: args.length,
        reference: original.as_ref(),
    };

    let (payload, text) = codec::extract_text(&picture, &request).with_context(|| {
        format!(
            "Failed to recover the text from '{}'. \nThe image may not contain a hidden message or the parameters differ from those used to hide it.",
            args.image.to_string_lossy().red().bold()
        )
    })?;
    debug!("recovered {} bytes of {}", payload.len(), payload.encoding());

    fs::write(&dest, text).with_context(|| {
        format!(
            "Unable to write to target text file: {}",
            dest.to_string_lossy().red().bold()
        )
    })?;

    report_done(
        Operation::Decode,
        &format!(
            "The text has been successfully recovered and saved: {}",
            dest.to_string_lossy().green().bold()
        ),
    );
    Ok(())
}

/// 处理 'Capacity' 命令：打印给定几何参数下可隐藏的最大字节数。
pub fn handle_capacity(args: CapacityArgs) -> Result<()> {
    let geometry = to_geometry(args.geometry)?;
    let total = capacity(geometry.pixel_count(), geometry.byte_width());
    let usable = codec::payload_capacity(geometry, args.framing);

    println!(
        "{}: {} bytes can be hidden ({} lane bits in total)",
        geometry.to_string().bold(),
        usable.to_string().green().bold(),
        total * 8
    );
    Ok(())
}

fn to_geometry(args: GeometryArgs) -> Result<Geometry> {
    Geometry::new(args.width, args.height, args.bit_depth)
        .with_context(|| format!("Invalid bit depth: {}", args.bit_depth.to_string().red().bold()))
}

/// 读取原始样本转储并按几何参数解析。
fn load_pixels(path: &Path, geometry: GeometryArgs) -> Result<PixelBuffer> {
    let raw = fs::read(path).with_context(|| {
        format!(
            "Unable to read image file: {}",
            path.to_string_lossy().red().bold()
        )
    })?;

    let GeometryArgs {
        width,
        height,
        bit_depth,
    } = geometry;
    PixelBuffer::from_raw_bytes(width, height, bit_depth, &raw).with_context(|| {
        format!(
            "The sample file {} does not match {width}x{height} @ {bit_depth} bpp.",
            path.to_string_lossy().red().bold(),
        )
    })
}

/// 在输入文件旁生成带前缀的默认输出路径，可选地替换扩展名。
fn sibling_with_prefix(input: &Path, prefix: &str, extension: Option<&str>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = extension
        .map(str::to_owned)
        .or_else(|| input.extension().map(|e| e.to_string_lossy().into_owned()));

    let file_name = match extension {
        Some(ext) => format!("{prefix}{stem}.{ext}"),
        None => format!("{prefix}{stem}"),
    };
    input.with_file_name(file_name)
}

/// 未指定 `--force` 时拒绝覆盖已存在的文件。
fn ensure_writable(path: &Path, force: bool) -> Result<()> {
    anyhow::ensure!(
        force || !path.exists(),
        "Output file already exists: {}. \nUse --force to overwrite it.",
        path.to_string_lossy().red().bold()
    );
    Ok(())
}

fn report_done(operation: Operation, message: &str) {
    debug!("{operation} finished");
    println!("{message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_sit_next_to_the_input() {
        let input = Path::new("/tmp/work/original.raw");
        assert_eq!(
            sibling_with_prefix(input, DOCTORED_PREFIX, None),
            PathBuf::from("/tmp/work/doctored_original.raw")
        );
        assert_eq!(
            sibling_with_prefix(input, RECOVERED_PREFIX, Some("txt")),
            PathBuf::from("/tmp/work/recovered_original.txt")
        );
    }

    #[test]
    fn extensionless_input_keeps_no_extension() {
        let input = Path::new("pixels");
        assert_eq!(
            sibling_with_prefix(input, DOCTORED_PREFIX, None),
            PathBuf::from("doctored_pixels")
        );
    }
}
