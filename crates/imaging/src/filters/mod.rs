pub mod blur;
pub mod grayscale;
pub mod mirror;

use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::codec::{create_output, open_input, ImageGeometry};
use crate::error::{ImagingError, ImagingResult};

pub use blur::{box_blur, KernelSize, MAX_KERNEL_SIZE, MIN_KERNEL_SIZE};
pub use grayscale::luma;

/// 轻量滤镜：一个轻量任务对同一张图片执行全部五种
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightFilter {
    Grayscale,
    MirrorHorizontal,
    MirrorVertical,
    GrayscaleMirrorHorizontal,
    GrayscaleMirrorVertical,
}

impl LightFilter {
    pub const ALL: [LightFilter; 5] = [
        LightFilter::Grayscale,
        LightFilter::MirrorHorizontal,
        LightFilter::MirrorVertical,
        LightFilter::GrayscaleMirrorHorizontal,
        LightFilter::GrayscaleMirrorVertical,
    ];

    /// 输出文件名后缀
    pub fn suffix(&self) -> &'static str {
        match self {
            LightFilter::Grayscale => "grayscale",
            LightFilter::MirrorHorizontal => "mirrorh",
            LightFilter::MirrorVertical => "mirrorv",
            LightFilter::GrayscaleMirrorHorizontal => "gray_mirrorh",
            LightFilter::GrayscaleMirrorVertical => "gray_mirrorv",
        }
    }

    pub fn apply<R: Read, W: Write>(&self, reader: &mut R, writer: &mut W) -> ImagingResult<ImageGeometry> {
        match self {
            LightFilter::Grayscale => grayscale::grayscale(reader, writer),
            LightFilter::MirrorHorizontal => mirror::mirror_horizontal(reader, writer),
            LightFilter::MirrorVertical => mirror::mirror_vertical(reader, writer),
            LightFilter::GrayscaleMirrorHorizontal => {
                mirror::grayscale_mirror_horizontal(reader, writer)
            }
            LightFilter::GrayscaleMirrorVertical => mirror::grayscale_mirror_vertical(reader, writer),
        }
    }

    /// 对完整的位图文件字节执行滤镜
    pub fn apply_bytes(&self, input: &[u8]) -> ImagingResult<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len());
        self.apply(&mut Cursor::new(input), &mut output)?;
        Ok(output)
    }

    pub fn apply_file(&self, input: &Path, output: &Path) -> ImagingResult<ImageGeometry> {
        run_file(input, output, |reader, writer| self.apply(reader, writer))
    }
}

impl fmt::Display for LightFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// 模糊一个文件；核大小已在 `KernelSize` 构造时校验
pub fn blur_file(input: &Path, output: &Path, kernel: KernelSize) -> ImagingResult<ImageGeometry> {
    run_file(input, output, |reader, writer| blur::blur(reader, writer, kernel))
}

/// 对完整的位图文件字节执行模糊
pub fn blur_bytes(input: &[u8], kernel: KernelSize) -> ImagingResult<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len());
    blur::blur(&mut Cursor::new(input), &mut output, kernel)?;
    Ok(output)
}

fn run_file<F>(input: &Path, output: &Path, filter: F) -> ImagingResult<ImageGeometry>
where
    F: FnOnce(&mut BufReader<File>, &mut BufWriter<File>) -> ImagingResult<ImageGeometry>,
{
    let mut reader = open_input(input)?;
    let mut writer = create_output(output)?;

    let geometry = filter(&mut reader, &mut writer).map_err(|e| e.with_path(input))?;
    writer.flush().map_err(|e| ImagingError::io(output, e))?;
    Ok(geometry)
}
