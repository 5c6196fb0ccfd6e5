//! 可分离盒式模糊
//!
//! 先水平后垂直两次一维平均。窗口只统计落在图像内的像素，
//! 边缘像素的有效窗口和除数都更小，不做环绕也不做边缘复制。
//! 每一趟内各行互不依赖，按行并行；垂直趟只读取水平趟的完整结果。

use std::fmt;
use std::io::{Read, Write};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec::{read_header, read_pixels, write_header, ImageGeometry, BYTES_PER_PIXEL};
use crate::error::{ImagingError, ImagingResult};

pub const MIN_KERNEL_SIZE: u32 = 55;
pub const MAX_KERNEL_SIZE: u32 = 155;

/// 已校验的模糊核边长：奇数，且在 [55, 155] 内
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct KernelSize(u32);

impl KernelSize {
    pub fn new(size: u32) -> ImagingResult<Self> {
        if size % 2 == 0 || !(MIN_KERNEL_SIZE..=MAX_KERNEL_SIZE).contains(&size) {
            return Err(ImagingError::InvalidKernel(size));
        }
        Ok(Self(size))
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// 半径，即 k / 2
    pub fn radius(&self) -> usize {
        (self.0 / 2) as usize
    }
}

impl TryFrom<u32> for KernelSize {
    type Error = ImagingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KernelSize> for u32 {
    fn from(value: KernelSize) -> Self {
        value.0
    }
}

impl fmt::Display for KernelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn blur_row_horizontal(src: &[u8], dst: &mut [u8], width: usize, radius: usize) {
    let pixel_bytes = width * BYTES_PER_PIXEL;

    // 前缀和按整行累加，宽行会超出 u32
    let mut prefix = vec![0u64; (width + 1) * BYTES_PER_PIXEL];
    for x in 0..width {
        for c in 0..BYTES_PER_PIXEL {
            prefix[(x + 1) * BYTES_PER_PIXEL + c] =
                prefix[x * BYTES_PER_PIXEL + c] + src[x * BYTES_PER_PIXEL + c] as u64;
        }
    }

    for x in 0..width {
        let lo = x.saturating_sub(radius);
        let hi = (x + radius).min(width - 1);
        let count = (hi - lo + 1) as u64;
        for c in 0..BYTES_PER_PIXEL {
            let sum = prefix[(hi + 1) * BYTES_PER_PIXEL + c] - prefix[lo * BYTES_PER_PIXEL + c];
            dst[x * BYTES_PER_PIXEL + c] = (sum / count) as u8;
        }
    }

    dst[pixel_bytes..].copy_from_slice(&src[pixel_bytes..]);
}

fn blur_row_vertical(temp: &[u8], dst: &mut [u8], y: usize, geometry: &ImageGeometry, radius: usize) {
    let stride = geometry.row_stride;
    let pixel_bytes = geometry.pixel_row_bytes();
    let lo = y.saturating_sub(radius);
    let hi = (y + radius).min(geometry.height - 1);
    let count = (hi - lo + 1) as u32;

    let mut sums = vec![0u32; pixel_bytes];
    for row in temp[lo * stride..(hi + 1) * stride].chunks_exact(stride) {
        for (sum, &value) in sums.iter_mut().zip(&row[..pixel_bytes]) {
            *sum += value as u32;
        }
    }

    for (out, sum) in dst[..pixel_bytes].iter_mut().zip(&sums) {
        *out = (sum / count) as u8;
    }
    dst[pixel_bytes..].copy_from_slice(&temp[y * stride + pixel_bytes..(y + 1) * stride]);
}

/// 按半径执行两趟模糊
pub(crate) fn separable_box_blur(pixels: &[u8], geometry: &ImageGeometry, radius: usize) -> Vec<u8> {
    let stride = geometry.row_stride;
    let width = geometry.width;

    let mut temp = vec![0u8; pixels.len()];
    temp.par_chunks_mut(stride)
        .zip(pixels.par_chunks(stride))
        .for_each(|(dst, src)| blur_row_horizontal(src, dst, width, radius));

    // 水平趟在此全部完成，垂直趟只读 temp
    let mut output = vec![0u8; pixels.len()];
    output
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, dst)| blur_row_vertical(&temp, dst, y, geometry, radius));

    output
}

/// 对内存中的像素数据（含填充）执行模糊
pub fn box_blur(pixels: &[u8], geometry: &ImageGeometry, kernel: KernelSize) -> Vec<u8> {
    separable_box_blur(pixels, geometry, kernel.radius())
}

/// 读取、模糊并写出一张图片
pub fn blur<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    kernel: KernelSize,
) -> ImagingResult<ImageGeometry> {
    let (geometry, header) = read_header(reader)?;
    let pixels = read_pixels(reader, &geometry)?;

    debug!(
        "应用可分离模糊: 核 {}x{}, 图像 {}x{}",
        kernel, kernel, geometry.width, geometry.height
    );
    let output = box_blur(&pixels, &geometry, kernel);

    write_header(writer, &header)?;
    writer.write_all(&output)?;
    Ok(geometry)
}
