//! # 命令行接口模块
//!
//! 使用 `clap` 定义了程序的命令行结构，包括子命令和参数。
//! 图像以原始样本转储的形式读写：按行优先排列，每个样本占 `bit_depth / 8` 个字节 (大端序)。

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::codec::{CodecOptions, EmbedMode, Framing};
use crate::encoding::TextEncoding;

/// 一款基于 LSB (最低有效位) 位平面隐写的命令行工具，用于在原始像素样本中隐藏或恢复文本。
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "一款基于 LSB (最低有效位) 位平面隐写的命令行工具，用于在原始像素样本中隐藏或恢复文本。\n每个像素按位深度划分为若干字节通道，每个通道的最低位承载一个载荷位。"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令：hide (隐藏)、recover (恢复) 和 capacity (容量)。
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 在原始像素样本中隐藏文本文件内容。
    Hide(HideArgs),

    /// 从经过隐写的原始像素样本中恢复隐藏的文本。
    Recover(RecoverArgs),

    /// 报告给定几何参数下可隐藏的最大字节数。
    Capacity(CapacityArgs),
}

/// 原始样本转储的几何参数。
#[derive(Args, Debug, Clone, Copy)]
pub struct GeometryArgs {
    /// 图像宽度 (像素)。
    #[arg(long)]
    pub width: u32,

    /// 图像高度 (像素)。
    #[arg(long)]
    pub height: u32,

    /// 每像素位数：8、16、24 或 32。
    #[arg(short, long, default_value_t = 24)]
    pub bit_depth: u8,
}

/// 编解码参数，隐藏与恢复时必须一致。
#[derive(Args, Debug, Clone, Copy)]
pub struct CodecArgs {
    /// 文本使用的字符编码。
    #[arg(short, long, value_enum, default_value_t = TextEncoding::Utf8)]
    pub encoding: TextEncoding,

    /// 载荷位的写入方式。
    #[arg(short, long, value_enum, default_value_t = EmbedMode::Replace)]
    pub mode: EmbedMode,

    /// 载荷长度的传递方式。
    #[arg(long, value_enum, default_value_t = Framing::LengthPrefixed)]
    pub framing: Framing,
}

impl From<CodecArgs> for CodecOptions {
    fn from(args: CodecArgs) -> Self {
        CodecOptions {
            encoding: args.encoding,
            mode: args.mode,
            framing: args.framing,
        }
    }
}

/// 'hide' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct HideArgs {
    /// 用于隐写的原始样本文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// 要隐藏的文本内容的文件路径。
    #[arg(short, long)]
    pub text: PathBuf,

    /// 隐写完成后保存结果的输出路径。默认为输入文件旁的 `doctored_<文件名>`。
    #[arg(short, long)]
    pub dest: Option<PathBuf>,

    #[command(flatten)]
    pub codec: CodecArgs,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'recover' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// 已隐藏文本数据的原始样本文件路径。
    #[arg(short, long)]
    pub image: PathBuf,

    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// 恢复文本后保存的输出路径。默认为输入文件旁的 `recovered_<文件名>.txt`。
    #[arg(short, long)]
    pub text: Option<PathBuf>,

    /// 未经修改的原始样本文件，`xor-original` 模式下必需。
    #[arg(short, long)]
    pub original: Option<PathBuf>,

    /// 隐藏文本的字节数，仅在 `headerless` 模式下使用。
    #[arg(short, long)]
    pub length: Option<usize>,

    #[command(flatten)]
    pub codec: CodecArgs,

    /// 输出文件已存在时强制覆盖。
    #[arg(short, long)]
    pub force: bool,
}

/// 'capacity' 命令所需的参数。
#[derive(Parser, Debug)]
pub struct CapacityArgs {
    #[command(flatten)]
    pub geometry: GeometryArgs,

    /// 载荷长度的传递方式。
    #[arg(long, value_enum, default_value_t = Framing::LengthPrefixed)]
    pub framing: Framing,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_hide_with_defaults() {
        let cli = Cli::parse_from([
            "stegoplane", "hide", "--image", "in.raw", "--width", "4", "--height", "2", "--text", "t.txt",
        ]);
        let Commands::Hide(args) = cli.command else {
            panic!("expected hide");
        };
        assert_eq!(args.geometry.bit_depth, 24);
        assert_eq!(args.dest, None);
        assert_eq!(CodecOptions::from(args.codec), CodecOptions::default());
    }

    #[test]
    fn parses_recover_options() {
        let cli = Cli::parse_from([
            "stegoplane",
            "recover",
            "-i",
            "in.raw",
            "--width",
            "4",
            "--height",
            "2",
            "-b",
            "32",
            "--encoding",
            "utf-16",
            "--mode",
            "xor-original",
            "--framing",
            "headerless",
            "--original",
            "orig.raw",
            "--length",
            "3",
        ]);
        let Commands::Recover(args) = cli.command else {
            panic!("expected recover");
        };
        assert_eq!(args.geometry.bit_depth, 32);
        assert_eq!(args.codec.encoding, TextEncoding::Utf16);
        assert_eq!(args.codec.mode, EmbedMode::XorOriginal);
        assert_eq!(args.codec.framing, Framing::Headerless);
        assert_eq!(args.length, Some(3));
    }

    #[test]
    fn parses_capacity_framing() {
        let cli = Cli::parse_from([
            "stegoplane", "capacity", "--width", "3", "--height", "3", "-b", "8", "--framing", "headerless",
        ]);
        let Commands::Capacity(args) = cli.command else {
            panic!("expected capacity");
        };
        assert_eq!(args.geometry.bit_depth, 8);
        assert_eq!(args.framing, Framing::Headerless);
    }

    #[test]
    fn hide_takes_image_not_samples() {
        let rejected = Cli::try_parse_from([
            "stegoplane", "hide", "--samples", "in.raw", "--width", "1", "--height", "1", "--text", "t.txt",
        ]);
        assert!(rejected.is_err());
    }
}
