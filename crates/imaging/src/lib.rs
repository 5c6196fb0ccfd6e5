//! # imgfleet 图像处理
//!
//! 24位无压缩位图的编解码与像素滤镜：
//! - 文件头解析、行跨度与填充计算
//! - 灰度、水平/垂直镜像及其灰度融合变体
//! - 按行并行的可分离盒式模糊

pub mod codec;
pub mod error;
pub mod filters;
pub mod naming;

pub use codec::{probe_image_size, read_header, write_header, Bitmap, BitmapHeader, ImageGeometry, HEADER_LEN};
pub use error::{ImagingError, ImagingResult};
pub use filters::{blur_bytes, blur_file, box_blur, luma, KernelSize, LightFilter};
pub use naming::{blur_suffix, output_file_name, output_path};
