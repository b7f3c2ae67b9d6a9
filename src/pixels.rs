//! # 像素缓冲区模块
//!
//! [`PixelBuffer`] 保存按行优先排列的像素样本，每个像素是一个 `u32` 整数，
//! 按位深度划分为若干字节通道 (lane)：通道 0 为最高字节，最后一个通道为最低字节。
//! 例如 24 位的 `0xRRGGBB` 样本依次对应 R、G、B 三个通道。
//!
//! 本模块同时提供与 `image` 内存缓冲区以及原始样本转储之间的相互转换，
//! 但不涉及任何图像容器格式的读写。

use std::fmt;

use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};

use crate::constants::SUPPORTED_BIT_DEPTHS;
use crate::error::{Result, StegoError};

/// 图像的几何参数：宽、高以及每像素位数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
}

impl Geometry {
    /// 校验位深度后构造几何参数。
    pub fn new(width: u32, height: u32, bit_depth: u8) -> Result<Self> {
        if !SUPPORTED_BIT_DEPTHS.contains(&bit_depth) {
            return Err(StegoError::UnsupportedChannelLayout { bit_depth });
        }
        Ok(Self {
            width,
            height,
            bit_depth,
        })
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// 每个像素可寻址的字节通道数。
    pub fn byte_width(&self) -> usize {
        usize::from(self.bit_depth / 8)
    }

    /// 样本的最大合法值。
    fn sample_mask(&self) -> u32 {
        match self.bit_depth {
            32 => u32::MAX,
            depth => (1u32 << depth) - 1,
        }
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} @ {} bpp", self.width, self.height, self.bit_depth)
    }
}

/// 调用者拥有的像素缓冲区。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    geometry: Geometry,
    samples: Vec<u32>,
}

impl PixelBuffer {
    /// 由样本序列构造像素缓冲区。
    ///
    /// # Errors
    ///
    /// * 位深度不是 8/16/24/32 时返回 [`StegoError::UnsupportedChannelLayout`]。
    /// * 样本数量不等于 `width * height` 时返回 [`StegoError::InvalidGeometry`]。
    /// * 任一样本超出位深度时返回 [`StegoError::SampleOutOfRange`]。
    pub fn new(width: u32, height: u32, bit_depth: u8, samples: Vec<u32>) -> Result<Self> {
        let geometry = Geometry::new(width, height, bit_depth)?;
        if samples.len() != geometry.pixel_count() {
            return Err(StegoError::InvalidGeometry {
                width,
                height,
                expected: geometry.pixel_count(),
                actual: samples.len(),
            });
        }

        let mask = geometry.sample_mask();
        if let Some((index, &value)) = samples.iter().enumerate().find(|(_, v)| **v & !mask != 0) {
            return Err(StegoError::SampleOutOfRange {
                index,
                value,
                bit_depth,
            });
        }

        Ok(Self { geometry, samples })
    }

    /// 构造所有样本均为 `value` 的缓冲区。
    pub fn filled(width: u32, height: u32, bit_depth: u8, value: u32) -> Result<Self> {
        let count = width as usize * height as usize;
        Self::new(width, height, bit_depth, vec![value; count])
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    pub fn height(&self) -> u32 {
        self.geometry.height
    }

    pub fn bit_depth(&self) -> u8 {
        self.geometry.bit_depth
    }

    pub fn byte_width(&self) -> usize {
        self.geometry.byte_width()
    }

    pub fn samples(&self) -> &[u32] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<u32> {
        self.samples
    }

    /// 从原始样本转储解析缓冲区。
    ///
    /// 转储按行优先排列，每个样本占 `byte_width` 个字节，按通道顺序 (大端序) 存放。
    pub fn from_raw_bytes(width: u32, height: u32, bit_depth: u8, raw: &[u8]) -> Result<Self> {
        let geometry = Geometry::new(width, height, bit_depth)?;
        let byte_width = geometry.byte_width();
        if raw.len() != geometry.pixel_count() * byte_width {
            return Err(StegoError::InvalidGeometry {
                width,
                height,
                expected: geometry.pixel_count(),
                actual: raw.len() / byte_width,
            });
        }

        let samples = raw
            .chunks_exact(byte_width)
            .map(|lanes| lanes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b)))
            .collect();
        Self::new(width, height, bit_depth, samples)
    }

    /// 输出原始样本转储，格式与 [`PixelBuffer::from_raw_bytes`] 相同。
    pub fn to_raw_bytes(&self) -> Vec<u8> {
        let byte_width = self.byte_width();
        self.samples
            .iter()
            .flat_map(|sample| sample.to_be_bytes().into_iter().skip(4 - byte_width))
            .collect()
    }

    /// 从 `image` 的内存图像构造缓冲区。
    ///
    /// 支持 8 位的灰度、灰度+透明、RGB 与 RGBA，每个颜色分量成为一个通道。
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let (width, height) = (image.width(), image.height());
        let (bit_depth, raw): (u8, &[u8]) = match image {
            DynamicImage::ImageLuma8(buf) => (8, buf.as_raw().as_slice()),
            DynamicImage::ImageLumaA8(buf) => (16, buf.as_raw().as_slice()),
            DynamicImage::ImageRgb8(buf) => (24, buf.as_raw().as_slice()),
            DynamicImage::ImageRgba8(buf) => (32, buf.as_raw().as_slice()),
            other => {
                return Err(StegoError::UnsupportedChannelLayout {
                    bit_depth: other.color().bits_per_pixel().min(u16::from(u8::MAX)) as u8,
                });
            }
        };
        Self::from_raw_bytes(width, height, bit_depth, raw)
    }

    /// 转换回 `image` 的内存图像，与 [`PixelBuffer::from_image`] 互逆。
    pub fn to_image(&self) -> Result<DynamicImage> {
        let (width, height) = (self.width(), self.height());
        let raw = self.to_raw_bytes();
        let mismatch = || StegoError::InvalidGeometry {
            width,
            height,
            expected: self.geometry.pixel_count(),
            actual: self.samples.len(),
        };

        let image = match self.bit_depth() {
            8 => GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8),
            16 => GrayAlphaImage::from_raw(width, height, raw).map(DynamicImage::ImageLumaA8),
            24 => RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
            32 => RgbaImage::from_raw(width, height, raw).map(DynamicImage::ImageRgba8),
            bit_depth => return Err(StegoError::UnsupportedChannelLayout { bit_depth }),
        };
        image.ok_or_else(mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn rejects_unaddressable_depths() {
        for depth in [0, 1, 4, 12, 48] {
            let err = PixelBuffer::filled(2, 2, depth, 0).unwrap_err();
            assert!(matches!(
                err,
                StegoError::UnsupportedChannelLayout { bit_depth } if bit_depth == depth
            ));
        }
    }

    #[test]
    fn rejects_sample_count_mismatch() {
        let err = PixelBuffer::new(3, 3, 8, vec![0; 8]).unwrap_err();
        assert!(matches!(
            err,
            StegoError::InvalidGeometry {
                expected: 9,
                actual: 8,
                ..
            }
        ));
    }

    #[test]
    fn rejects_samples_wider_than_depth() {
        let err = PixelBuffer::new(2, 1, 16, vec![0xFFFF, 0x1_0000]).unwrap_err();
        assert!(matches!(err, StegoError::SampleOutOfRange { index: 1, .. }));
    }

    #[test]
    fn raw_dump_uses_big_endian_lanes() {
        let buffer = PixelBuffer::new(2, 1, 24, vec![0x11_22_33, 0xAA_BB_CC]).unwrap();
        let raw = buffer.to_raw_bytes();
        assert_eq!(raw, vec![0x11, 0x22, 0x33, 0xAA, 0xBB, 0xCC]);
        assert_eq!(PixelBuffer::from_raw_bytes(2, 1, 24, &raw).unwrap(), buffer);
    }

    #[test]
    fn raw_dump_with_wrong_length_is_rejected() {
        let err = PixelBuffer::from_raw_bytes(2, 2, 32, &[0; 15]).unwrap_err();
        assert!(matches!(err, StegoError::InvalidGeometry { .. }));
    }

    #[test]
    fn rgb_image_maps_channels_to_lanes() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([0x12, 0x34, 0x56])));
        let buffer = PixelBuffer::from_image(&image).unwrap();
        assert_eq!(buffer.bit_depth(), 24);
        assert!(buffer.samples().iter().all(|&s| s == 0x12_34_56));
        assert_eq!(buffer.to_image().unwrap(), image);
    }

    #[test]
    fn wide_images_are_not_lane_addressable() {
        let image = DynamicImage::new_rgb16(2, 2);
        let err = PixelBuffer::from_image(&image).unwrap_err();
        assert!(matches!(err, StegoError::UnsupportedChannelLayout { bit_depth: 48 }));
    }
}
