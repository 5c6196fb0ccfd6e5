use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use imgfleet_core::{FleetError, FleetResult};

/// 输入文件列表，发现后不可变，两个游标共享只读
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileList {
    paths: Arc<[String]>,
}

impl FileList {
    /// 用给定路径构建列表；超出容量或路径过长都是配置错误，不做截断
    pub fn new(paths: Vec<String>, max_files: usize, max_path_len: usize) -> FleetResult<Self> {
        if paths.len() > max_files {
            return Err(FleetError::capacity_exceeded("输入文件", max_files, paths.len()));
        }
        if let Some(path) = paths.iter().find(|p| p.len() > max_path_len) {
            return Err(FleetError::config_error(format!(
                "路径长度 {} 超过上限 {}: {}",
                path.len(),
                max_path_len,
                path
            )));
        }
        Ok(Self {
            paths: paths.into(),
        })
    }

    /// 扫描目录中扩展名为 bmp（不区分大小写）的文件，按文件名排序
    pub fn discover(dir: &Path, max_files: usize, max_path_len: usize) -> FleetResult<Self> {
        let entries = fs::read_dir(dir).map_err(|e| {
            FleetError::config_error(format!("无法读取输入目录 {}: {}", dir.display(), e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                FleetError::config_error(format!("遍历输入目录 {} 失败: {}", dir.display(), e))
            })?;
            let path = entry.path();
            if !path.is_file() || !is_bitmap(&path) {
                debug!("跳过非位图文件: {}", path.display());
                continue;
            }
            paths.push(path.to_string_lossy().into_owned());
        }
        paths.sort();

        info!("在 {} 中发现 {} 个位图文件", dir.display(), paths.len());
        Self::new(paths, max_files, max_path_len)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.paths.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

fn is_bitmap(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("bmp"))
        .unwrap_or(false)
}
