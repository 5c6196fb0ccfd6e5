use std::io::{Read, Write};

use crate::codec::{read_header, read_row, write_header, ImageGeometry, BYTES_PER_PIXEL};
use crate::error::ImagingResult;

const RED_WEIGHT: f64 = 0.21;
const GREEN_WEIGHT: f64 = 0.72;
const BLUE_WEIGHT: f64 = 0.07;

/// 亮度，参数按存储顺序 (B, G, R)
#[inline]
pub fn luma(b: u8, g: u8, r: u8) -> u8 {
    let value = RED_WEIGHT * r as f64 + GREEN_WEIGHT * g as f64 + BLUE_WEIGHT * b as f64;
    value.round().clamp(0.0, 255.0) as u8
}

/// 原地灰度化一段像素字节（不含填充）
pub fn grayscale_pixels(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        let gray = luma(px[0], px[1], px[2]);
        px.fill(gray);
    }
}

/// 逐行流式灰度化，无需整张图片驻留内存
pub fn grayscale<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> ImagingResult<ImageGeometry> {
    let (geometry, header) = read_header(reader)?;
    write_header(writer, &header)?;

    let pixel_bytes = geometry.pixel_row_bytes();
    let mut row = Vec::new();
    for _ in 0..geometry.height {
        read_row(reader, &mut row, &geometry)?;
        grayscale_pixels(&mut row[..pixel_bytes]);
        writer.write_all(&row)?;
    }

    Ok(geometry)
}
