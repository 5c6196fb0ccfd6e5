use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::{
    dispatcher_worker::{DispatcherConfig, WorkerConfig},
    imaging_observability::{ImagingConfig, ObservabilityConfig},
};
use crate::validation::ConfigValidator;

const DEFAULT_PATHS: [&str; 3] = [
    "config/imgfleet.toml",
    "imgfleet.toml",
    "/etc/imgfleet/config.toml",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub dispatcher: DispatcherConfig,
    pub worker: WorkerConfig,
    pub imaging: ImagingConfig,
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// 加载配置：TOML 文件 + `IMGFLEET__` 前缀的环境变量
    ///
    /// 嵌套字段用双下划线分隔，例如 `IMGFLEET__IMAGING__KERNEL_SIZE=57`。
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
        } else if let Some(path) = DEFAULT_PATHS.iter().find(|p| Path::new(p).exists()) {
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("IMGFLEET")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("dispatcher.workers")
                .with_list_parse_key("dispatcher.blur_excluded_workers")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }
}

impl ConfigValidator for AppConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        self.dispatcher.validate()?;
        self.worker.validate()?;
        self.imaging.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}
