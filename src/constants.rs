/// 每个字节通道 (lane) 中用于隐写的位数。
/// 每个通道只使用最低有效位，因此一个载荷字节需要 8 个通道。
pub const BITS_PER_LANE: usize = 1;

/// 长度前缀占用的字节数。
/// 以大端序 `u32` 写入，位于载荷之前，使恢复过程无需外部提供长度。
pub const LENGTH_PREFIX_BYTES: usize = 4;

/// 支持的像素位深度 (bits per pixel)。
pub const SUPPORTED_BIT_DEPTHS: [u8; 4] = [8, 16, 24, 32];

/// `hide` 未指定输出路径时，默认输出文件名的前缀。
pub const DOCTORED_PREFIX: &str = "doctored_";

/// `recover` 未指定输出路径时，默认输出文件名的前缀。
pub const RECOVERED_PREFIX: &str = "recovered_";
