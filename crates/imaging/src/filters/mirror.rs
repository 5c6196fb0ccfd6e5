use std::io::{Read, Write};

use crate::codec::{read_header, read_pixels, read_row, write_header, ImageGeometry, BYTES_PER_PIXEL};
use crate::error::ImagingResult;

use super::grayscale::{grayscale_pixels, luma};

/// 行内像素逆序，填充字节原样留在行尾
fn mirror_row(src: &[u8], dst: &mut [u8], geometry: &ImageGeometry) {
    let pixel_bytes = geometry.pixel_row_bytes();
    for (x, px) in src[..pixel_bytes].chunks_exact(BYTES_PER_PIXEL).enumerate() {
        let out = (geometry.width - 1 - x) * BYTES_PER_PIXEL;
        dst[out..out + BYTES_PER_PIXEL].copy_from_slice(px);
    }
    dst[pixel_bytes..].copy_from_slice(&src[pixel_bytes..]);
}

/// 灰度化与行内逆序合并为一次遍历
fn grayscale_mirror_row(src: &[u8], dst: &mut [u8], geometry: &ImageGeometry) {
    let pixel_bytes = geometry.pixel_row_bytes();
    for (x, px) in src[..pixel_bytes].chunks_exact(BYTES_PER_PIXEL).enumerate() {
        let gray = luma(px[0], px[1], px[2]);
        let out = (geometry.width - 1 - x) * BYTES_PER_PIXEL;
        dst[out..out + BYTES_PER_PIXEL].fill(gray);
    }
    dst[pixel_bytes..].copy_from_slice(&src[pixel_bytes..]);
}

fn stream_rows<R, W, F>(reader: &mut R, writer: &mut W, transform: F) -> ImagingResult<ImageGeometry>
where
    R: Read,
    W: Write,
    F: Fn(&[u8], &mut [u8], &ImageGeometry),
{
    let (geometry, header) = read_header(reader)?;
    write_header(writer, &header)?;

    let mut src = Vec::new();
    let mut dst = Vec::new();
    for _ in 0..geometry.height {
        read_row(reader, &mut src, &geometry)?;
        // 首行读满之后才分配输出行
        dst.resize(geometry.row_stride, 0);
        transform(&src[..], &mut dst[..], &geometry);
        writer.write_all(&dst)?;
    }

    Ok(geometry)
}

fn write_rows_reversed<W: Write>(
    writer: &mut W,
    pixels: &[u8],
    geometry: &ImageGeometry,
) -> ImagingResult<()> {
    for row in pixels.chunks_exact(geometry.row_stride).rev() {
        writer.write_all(row)?;
    }
    Ok(())
}

/// 水平镜像
pub fn mirror_horizontal<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> ImagingResult<ImageGeometry> {
    stream_rows(reader, writer, mirror_row)
}

/// 垂直镜像：整行（连同填充）倒序输出
pub fn mirror_vertical<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> ImagingResult<ImageGeometry> {
    let (geometry, header) = read_header(reader)?;
    let pixels = read_pixels(reader, &geometry)?;
    write_header(writer, &header)?;
    write_rows_reversed(writer, &pixels, &geometry)?;
    Ok(geometry)
}

/// 灰度 + 水平镜像
pub fn grayscale_mirror_horizontal<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> ImagingResult<ImageGeometry> {
    stream_rows(reader, writer, grayscale_mirror_row)
}

/// 灰度 + 垂直镜像
pub fn grayscale_mirror_vertical<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
) -> ImagingResult<ImageGeometry> {
    let (geometry, header) = read_header(reader)?;
    let mut pixels = read_pixels(reader, &geometry)?;
    let pixel_bytes = geometry.pixel_row_bytes();
    for row in pixels.chunks_exact_mut(geometry.row_stride) {
        grayscale_pixels(&mut row[..pixel_bytes]);
    }
    write_header(writer, &header)?;
    write_rows_reversed(writer, &pixels, &geometry)?;
    Ok(geometry)
}
