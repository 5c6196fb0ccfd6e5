use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// 图像编解码与滤镜错误
#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("文件IO错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("位图头格式错误: {reason}")]
    MalformedHeader { reason: String },

    #[error("像素数据被截断: 期望 {expected} 字节, 实际 {actual} 字节")]
    TruncatedPixelData { expected: usize, actual: usize },

    #[error("无效的模糊核大小: {0} (必须为奇数且在 55 到 155 之间)")]
    InvalidKernel(u32),
}

pub type ImagingResult<T> = Result<T, ImagingError>;

impl ImagingError {
    pub fn io<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn malformed<S: Into<String>>(reason: S) -> Self {
        Self::MalformedHeader {
            reason: reason.into(),
        }
    }

    /// 给不带路径的流错误补上文件路径
    pub(crate) fn with_path<P: AsRef<Path>>(self, path: P) -> Self {
        match self {
            Self::Io { path: p, source } if p.as_os_str().is_empty() => Self::Io {
                path: path.as_ref().to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

impl From<io::Error> for ImagingError {
    fn from(source: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
