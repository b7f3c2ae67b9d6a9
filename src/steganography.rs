//! # 位平面核心算法模块
//!
//! 包含容量计算、比特索引到 (像素, 通道) 的映射，以及按像素写入/读取
//! 最低有效位的打包与解包逻辑。嵌入与恢复共用同一套索引规则。

use crate::constants::BITS_PER_LANE;

/// 计算可嵌入的字节数：`floor(pixel_count * byte_width / 8)`。
pub fn capacity(pixel_count: usize, byte_width: usize) -> usize {
    pixel_count.saturating_mul(byte_width).saturating_mul(BITS_PER_LANE) / 8
}

/// 比特索引在像素缓冲区中的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LanePosition {
    pub pixel: usize,
    pub lane: usize,
}

/// 将线性比特索引映射为 (像素索引, 通道索引)。
pub(crate) fn locate(bit_index: usize, byte_width: usize) -> LanePosition {
    LanePosition {
        pixel: bit_index / byte_width,
        lane: bit_index % byte_width,
    }
}

/// 通道最低有效位在样本中的位移：通道 0 为最高字节。
pub(crate) fn lane_shift(lane: usize, byte_width: usize) -> u32 {
    (8 * (byte_width - 1 - lane)) as u32
}

/// 按 MSB 优先顺序逐位遍历字节序列。
pub fn bits_msb_first(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes
        .iter()
        .flat_map(|&byte| (0..8).map(move |b| (byte >> (7 - b)) & 1))
}

/// 写入方式：如何把载荷位与像素原有的最低有效位组合。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LaneWrite {
    /// 清除通道最低位后写入载荷位。
    Replace,
    /// 与原始最低位异或。
    Xor,
}

/// 从 `start_bit` 开始，把 `bits` 写入像素通道的最低有效位。
///
/// 落在同一像素内的比特先累积到暂存值中，在该像素的最后一个通道
/// (或最后一个载荷位) 处一次性写回。未被载荷覆盖的通道保持不变。
/// 返回写入的比特数。
///
/// 调用者必须事先保证 `byte_width >= 1` 且 `samples` 足以容纳所有比特。
pub(crate) fn pack(
    samples: &mut [u32],
    byte_width: usize,
    start_bit: usize,
    bits: impl IntoIterator<Item = u8>,
    write: LaneWrite,
) -> usize {
    let mut written = 0;
    let mut current: Option<usize> = None;
    let mut acc = 0u32;
    let mut mask = 0u32;

    for (offset, bit) in bits.into_iter().enumerate() {
        let pos = locate(start_bit + offset, byte_width);
        if current != Some(pos.pixel) {
            if let Some(pixel) = current {
                flush(&mut samples[pixel], acc, mask, write);
            }
            current = Some(pos.pixel);
            acc = 0;
            mask = 0;
        }

        let shift = lane_shift(pos.lane, byte_width);
        acc |= u32::from(bit & 1) << shift;
        mask |= 1 << shift;
        written += 1;
    }

    if let Some(pixel) = current {
        flush(&mut samples[pixel], acc, mask, write);
    }

    written
}

fn flush(sample: &mut u32, acc: u32, mask: u32, write: LaneWrite) {
    *sample = match write {
        LaneWrite::Replace => (*sample & !mask) | acc,
        LaneWrite::Xor => *sample ^ acc,
    };
}

/// 读取从 `start_bit` 开始的 `bit_count` 个通道最低有效位。
///
/// 若提供 `reference`，每个比特都与参考样本对应通道的最低位异或，
/// 用于还原异或写入的数据。
pub(crate) fn unpack_bits<'a>(
    samples: &'a [u32],
    reference: Option<&'a [u32]>,
    byte_width: usize,
    start_bit: usize,
    bit_count: usize,
) -> impl Iterator<Item = u8> + 'a {
    (start_bit..start_bit + bit_count).map(move |index| {
        let pos = locate(index, byte_width);
        let shift = lane_shift(pos.lane, byte_width);
        let bit = (samples[pos.pixel] >> shift) & 1;
        let base = reference.map_or(0, |r| (r[pos.pixel] >> shift) & 1);
        (bit ^ base) as u8
    })
}

/// 将 MSB 优先的比特流重新组装为字节。末尾不足 8 位的比特被丢弃。
pub fn assemble_bytes(bits: impl IntoIterator<Item = u8>) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut value = 0u8;
    for (i, bit) in bits.into_iter().enumerate() {
        value = (value << 1) | (bit & 1);
        if i % 8 == 7 {
            bytes.push(value);
            value = 0;
        }
    }
    bytes
}
