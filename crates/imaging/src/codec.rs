//! 24位无压缩位图的编解码
//!
//! 只处理固定 54 字节的文件头（14 字节文件头 + 40 字节信息头），
//! 像素数据紧随其后，按存储顺序（自下而上）逐行排列，每行按 4 字节对齐。
//! 文件头原样复制到输出，宽高只用于计算几何信息，从不改写。

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ImagingError, ImagingResult};

/// 文件头固定长度
pub const HEADER_LEN: usize = 54;
/// 每像素字节数（B, G, R）
pub const BYTES_PER_PIXEL: usize = 3;

const WIDTH_OFFSET: usize = 18;
const HEIGHT_OFFSET: usize = 22;
const BITS_PER_PIXEL_OFFSET: usize = 28;
const COMPRESSION_OFFSET: usize = 30;

/// 原始文件头字节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader([u8; HEADER_LEN]);

impl BitmapHeader {
    pub fn from_bytes(bytes: [u8; HEADER_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.0
    }

    /// 为指定尺寸构造一个合法的 24 位文件头
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        let geometry = ImageGeometry::new(width as usize, height as usize);
        let image_size = geometry.image_byte_size() as u32;
        let mut bytes = [0u8; HEADER_LEN];

        bytes[0..2].copy_from_slice(b"BM");
        bytes[2..6].copy_from_slice(&(HEADER_LEN as u32 + image_size).to_le_bytes());
        bytes[10..14].copy_from_slice(&(HEADER_LEN as u32).to_le_bytes());
        bytes[14..18].copy_from_slice(&40u32.to_le_bytes());
        bytes[WIDTH_OFFSET..WIDTH_OFFSET + 4].copy_from_slice(&(width as i32).to_le_bytes());
        bytes[HEIGHT_OFFSET..HEIGHT_OFFSET + 4].copy_from_slice(&(height as i32).to_le_bytes());
        bytes[26..28].copy_from_slice(&1u16.to_le_bytes());
        bytes[BITS_PER_PIXEL_OFFSET..BITS_PER_PIXEL_OFFSET + 2]
            .copy_from_slice(&24u16.to_le_bytes());
        bytes[34..38].copy_from_slice(&image_size.to_le_bytes());

        Self(bytes)
    }

    fn read_i32(&self, offset: usize) -> i32 {
        i32::from_le_bytes([
            self.0[offset],
            self.0[offset + 1],
            self.0[offset + 2],
            self.0[offset + 3],
        ])
    }

    fn read_u16(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.0[offset], self.0[offset + 1]])
    }

    /// 校验文件头并推导几何信息
    pub fn geometry(&self) -> ImagingResult<ImageGeometry> {
        if &self.0[0..2] != b"BM" {
            return Err(ImagingError::malformed("缺少 BM 签名"));
        }

        let bits_per_pixel = self.read_u16(BITS_PER_PIXEL_OFFSET);
        if bits_per_pixel != 24 {
            return Err(ImagingError::malformed(format!(
                "不支持的颜色深度: {bits_per_pixel} 位"
            )));
        }

        let compression = self.read_i32(COMPRESSION_OFFSET);
        if compression != 0 {
            return Err(ImagingError::malformed(format!(
                "不支持的压缩方式: {compression}"
            )));
        }

        let width = self.read_i32(WIDTH_OFFSET);
        let height = self.read_i32(HEIGHT_OFFSET);
        if width <= 0 || height <= 0 {
            return Err(ImagingError::malformed(format!(
                "无效的图像尺寸: {width}x{height}"
            )));
        }

        ImageGeometry::checked(width as usize, height as usize).ok_or_else(|| {
            ImagingError::malformed(format!("图像尺寸溢出: {width}x{height}"))
        })
    }
}

/// 图像几何信息，每张图片从文件头推导一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub width: usize,
    pub height: usize,
    /// 含对齐填充的每行字节数
    pub row_stride: usize,
    pub padding_bytes: usize,
}

impl ImageGeometry {
    pub fn new(width: usize, height: usize) -> Self {
        let row_bytes = width * BYTES_PER_PIXEL;
        let row_stride = (row_bytes + 3) & !3;
        Self {
            width,
            height,
            row_stride,
            padding_bytes: row_stride - row_bytes,
        }
    }

    /// 从文件头尺寸构造，行跨度或像素总字节数溢出时返回 `None`
    pub fn checked(width: usize, height: usize) -> Option<Self> {
        let row_bytes = width.checked_mul(BYTES_PER_PIXEL)?;
        let row_stride = row_bytes.checked_add(3)? & !3;
        row_stride.checked_mul(height)?;
        Some(Self {
            width,
            height,
            row_stride,
            padding_bytes: row_stride - row_bytes,
        })
    }

    /// 每行有效像素字节数（不含填充）
    pub fn pixel_row_bytes(&self) -> usize {
        self.width * BYTES_PER_PIXEL
    }

    pub fn image_byte_size(&self) -> usize {
        self.row_stride * self.height
    }
}

/// 读取并校验文件头
pub fn read_header<R: Read>(reader: &mut R) -> ImagingResult<(ImageGeometry, BitmapHeader)> {
    let mut bytes = [0u8; HEADER_LEN];
    let read = read_full(reader, &mut bytes)?;
    if read < HEADER_LEN {
        return Err(ImagingError::malformed(format!(
            "文件头不完整: 期望 {HEADER_LEN} 字节, 实际 {read} 字节"
        )));
    }

    let header = BitmapHeader::from_bytes(bytes);
    let geometry = header.geometry()?;
    Ok((geometry, header))
}

/// 原样写出文件头
pub fn write_header<W: Write>(writer: &mut W, header: &BitmapHeader) -> ImagingResult<()> {
    writer.write_all(header.as_bytes())?;
    Ok(())
}

/// 读取恰好 `expected` 字节到 `buf`，缓冲区只随实际读到的数据增长
fn read_exact_bounded<R: Read>(reader: &mut R, buf: &mut Vec<u8>, expected: usize) -> ImagingResult<()> {
    buf.clear();
    reader.by_ref().take(expected as u64).read_to_end(buf)?;
    if buf.len() < expected {
        return Err(ImagingError::TruncatedPixelData {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// 读取一行（含填充），`row` 在行与行之间复用
pub(crate) fn read_row<R: Read>(
    reader: &mut R,
    row: &mut Vec<u8>,
    geometry: &ImageGeometry,
) -> ImagingResult<()> {
    read_exact_bounded(reader, row, geometry.row_stride)
}

/// 读取整张图片的像素数据
pub fn read_pixels<R: Read>(reader: &mut R, geometry: &ImageGeometry) -> ImagingResult<Vec<u8>> {
    let mut pixels = Vec::new();
    read_exact_bounded(reader, &mut pixels, geometry.image_byte_size())?;
    Ok(pixels)
}

fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// 打开输入文件
pub(crate) fn open_input(path: &Path) -> ImagingResult<BufReader<File>> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| ImagingError::io(path, e))
}

/// 创建输出文件
pub(crate) fn create_output(path: &Path) -> ImagingResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| ImagingError::io(path, e))
}

/// 只读取文件头，返回像素数据总字节数（行跨度 × 高度）
pub fn probe_image_size<P: AsRef<Path>>(path: P) -> ImagingResult<usize> {
    let path = path.as_ref();
    let mut reader = open_input(path)?;
    let (geometry, _) = read_header(&mut reader).map_err(|e| e.with_path(path))?;
    Ok(geometry.image_byte_size())
}

/// 完整加载到内存的位图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub header: BitmapHeader,
    pub geometry: ImageGeometry,
    /// 按存储顺序排列的像素字节，含每行填充
    pub pixels: Vec<u8>,
}

impl Bitmap {
    /// 用给定像素数据（含填充）构造位图
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> ImagingResult<Self> {
        let header = BitmapHeader::for_dimensions(width, height);
        let geometry = header.geometry()?;
        if pixels.len() != geometry.image_byte_size() {
            return Err(ImagingError::TruncatedPixelData {
                expected: geometry.image_byte_size(),
                actual: pixels.len(),
            });
        }
        Ok(Self {
            header,
            geometry,
            pixels,
        })
    }

    pub fn decode<R: Read>(reader: &mut R) -> ImagingResult<Self> {
        let (geometry, header) = read_header(reader)?;
        let pixels = read_pixels(reader, &geometry)?;
        Ok(Self {
            header,
            geometry,
            pixels,
        })
    }

    pub fn encode<W: Write>(&self, writer: &mut W) -> ImagingResult<()> {
        write_header(writer, &self.header)?;
        writer.write_all(&self.pixels)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.pixels.len());
        bytes.extend_from_slice(self.header.as_bytes());
        bytes.extend_from_slice(&self.pixels);
        bytes
    }

    pub fn open<P: AsRef<Path>>(path: P) -> ImagingResult<Self> {
        let path = path.as_ref();
        let mut reader = open_input(path)?;
        Self::decode(&mut reader).map_err(|e| e.with_path(path))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> ImagingResult<()> {
        let path = path.as_ref();
        let mut writer = create_output(path)?;
        self.encode(&mut writer).map_err(|e| e.with_path(path))?;
        writer.flush().map_err(|e| ImagingError::io(path, e))
    }

    /// 单个像素的 (B, G, R)，行号按存储顺序
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = y * self.geometry.row_stride + x * BYTES_PER_PIXEL;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_geometry_row_stride_padding() {
        let g = ImageGeometry::new(4, 2);
        assert_eq!(g.row_stride, 12);
        assert_eq!(g.padding_bytes, 0);

        let g = ImageGeometry::new(2, 3);
        assert_eq!(g.row_stride, 8);
        assert_eq!(g.padding_bytes, 2);
        assert_eq!(g.image_byte_size(), 24);

        let g = ImageGeometry::new(1, 1);
        assert_eq!(g.row_stride, 4);
        assert_eq!(g.padding_bytes, 1);
    }

    #[test]
    fn test_header_roundtrip_geometry() {
        let header = BitmapHeader::for_dimensions(5, 7);
        let geometry = header.geometry().unwrap();
        assert_eq!(geometry.width, 5);
        assert_eq!(geometry.height, 7);
        assert_eq!(geometry.row_stride, 16);
    }

    #[test]
    fn test_read_header_truncated() {
        let mut reader = Cursor::new(vec![b'B', b'M', 0, 0]);
        let err = read_header(&mut reader).unwrap_err();
        assert!(matches!(err, ImagingError::MalformedHeader { .. }));
    }

    #[test]
    fn test_read_header_rejects_other_depths() {
        let mut bytes = *BitmapHeader::for_dimensions(2, 2).as_bytes();
        bytes[BITS_PER_PIXEL_OFFSET] = 32;
        let mut reader = Cursor::new(bytes.to_vec());
        let err = read_header(&mut reader).unwrap_err();
        assert!(matches!(err, ImagingError::MalformedHeader { .. }));
    }

    #[test]
    fn test_read_pixels_truncated() {
        let mut bytes = BitmapHeader::for_dimensions(2, 2).as_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 10]);
        let mut reader = Cursor::new(bytes);
        let err = Bitmap::decode(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            ImagingError::TruncatedPixelData {
                expected: 16,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_geometry_overflow_is_rejected() {
        assert!(ImageGeometry::checked(usize::MAX / 2, 1).is_none());
        assert!(ImageGeometry::checked(1 << 30, usize::MAX / 4).is_none());
        assert_eq!(ImageGeometry::checked(2, 3), Some(ImageGeometry::new(2, 3)));
    }

    #[test]
    fn test_huge_header_with_short_body_is_truncated() {
        let mut bytes = *BitmapHeader::for_dimensions(2, 2).as_bytes();
        bytes[WIDTH_OFFSET..WIDTH_OFFSET + 4].copy_from_slice(&(1i32 << 30).to_le_bytes());
        bytes[HEIGHT_OFFSET..HEIGHT_OFFSET + 4].copy_from_slice(&(1i32 << 30).to_le_bytes());
        let mut input = bytes.to_vec();
        input.extend_from_slice(&[7u8; 16]);

        let err = Bitmap::decode(&mut Cursor::new(input)).unwrap_err();
        assert!(matches!(
            err,
            ImagingError::TruncatedPixelData { actual: 16, .. }
        ));
    }

    #[test]
    fn test_bitmap_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("img.bmp");
        let pixels: Vec<u8> = (0..16u8).collect();
        let bitmap = Bitmap::from_pixels(2, 2, pixels).unwrap();
        bitmap.save(&path).unwrap();

        let loaded = Bitmap::open(&path).unwrap();
        assert_eq!(loaded, bitmap);
        assert_eq!(probe_image_size(&path).unwrap(), 16);
    }

    #[test]
    fn test_open_missing_file_reports_path() {
        let err = Bitmap::open("/definitely/not/here.bmp").unwrap_err();
        match err {
            ImagingError::Io { path, .. } => {
                assert_eq!(path, Path::new("/definitely/not/here.bmp"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
