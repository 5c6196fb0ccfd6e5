use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use imgfleet_config::{AppConfig, ConfigValidator, LogFormat};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::app::{AppMode, Application};
use crate::shutdown::ShutdownManager;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// 通用的应用启动配置，命令行参数覆盖配置文件
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub config_path: Option<String>,
    pub worker_id: Option<String>,
    pub kernel_size: Option<u32>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
}

impl StartupConfig {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let worker_id = matches
            .try_get_one::<String>("worker-id")
            .ok()
            .flatten()
            .cloned();

        Self {
            config_path: matches.get_one::<String>("config").cloned(),
            worker_id,
            kernel_size: matches.get_one::<u32>("kernel").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            log_format: matches.get_one::<String>("log-format").cloned(),
        }
    }
}

/// 所有二进制共用的命令行参数
pub fn base_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .version(env!("CARGO_PKG_VERSION"))
        .about(about)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径，缺省时按默认路径查找"),
        )
        .arg(
            Arg::new("kernel")
                .short('k')
                .long("kernel")
                .value_name("SIZE")
                .help("模糊核边长，奇数且在 [55, 155] 内")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"]),
        )
}

/// Worker 标识参数
pub fn worker_id_arg() -> Arg {
    Arg::new("worker-id")
        .short('w')
        .long("worker-id")
        .value_name("ID")
        .help("Worker标识，必须出现在协调器的名册中")
}

/// 初始化日志系统
pub fn init_logging(log_level: &str, log_format: LogFormat) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        LogFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        LogFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
    }

    Ok(())
}

/// 加载应用配置并应用命令行覆盖
pub fn load_config(startup_config: &StartupConfig) -> Result<AppConfig> {
    let mut config = AppConfig::load(startup_config.config_path.as_deref())
        .context("加载配置失败")?;

    if let Some(ref worker_id) = startup_config.worker_id {
        config.worker.worker_id = worker_id.clone();
    }
    if let Some(kernel_size) = startup_config.kernel_size {
        config.imaging.kernel_size = kernel_size;
    }
    if let Some(ref log_level) = startup_config.log_level {
        config.observability.log_level = log_level.clone();
    }
    if let Some(ref log_format) = startup_config.log_format {
        config.observability.log_format = log_format.parse()?;
    }

    config.validate().context("命令行参数覆盖后的配置无效")?;
    Ok(config)
}

/// 启动应用程序的通用函数
///
/// 运行自然结束（全部任务完成或Worker收到终止）时直接返回；
/// 收到 Ctrl+C / SIGTERM 时通过关闭管理器通知应用，并最多等待 30 秒。
pub async fn start_application(
    startup_config: StartupConfig,
    app_mode: AppMode,
    service_name: &str,
) -> Result<()> {
    let config = load_config(&startup_config)?;

    init_logging(
        &config.observability.log_level,
        config.observability.log_format,
    )?;

    info!("启动 {} 服务", service_name);
    if let Some(ref path) = startup_config.config_path {
        info!("配置文件: {}", path);
    }
    info!("运行模式: {}", app_mode);
    if app_mode == AppMode::Worker {
        info!("Worker ID: {}", config.worker.worker_id);
    }

    validate_mode_enabled(&app_mode, &config)?;

    let app = Application::new(config, app_mode)?;

    let shutdown_manager = ShutdownManager::new();
    let shutdown_rx = shutdown_manager.subscribe().await;
    let mut app_handle = tokio::spawn(async move { app.run(shutdown_rx).await });

    tokio::select! {
        joined = &mut app_handle => {
            joined.context("应用任务异常退出")??;
            info!("{} 服务运行完成", service_name);
            return Ok(());
        }
        _ = wait_for_shutdown_signal() => {
            info!("收到关闭信号，开始优雅关闭...");
        }
    }

    shutdown_manager.shutdown().await;

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, app_handle).await {
        Ok(Ok(Ok(()))) => info!("{} 服务已优雅关闭", service_name),
        Ok(Ok(Err(e))) => warn!("{} 服务在关闭过程中结束: {:#}", service_name, e),
        Ok(Err(e)) => error!("应用关闭时发生错误: {}", e),
        Err(_) => warn!("{} 服务关闭超时，强制退出", service_name),
    }

    info!("{} 服务已退出", service_name);
    Ok(())
}

/// 验证指定的模式是否在配置中被启用
pub fn validate_mode_enabled(app_mode: &AppMode, config: &AppConfig) -> Result<()> {
    match app_mode {
        AppMode::Dispatcher => {
            if !config.dispatcher.enabled {
                return Err(anyhow::anyhow!("Dispatcher模式被禁用，请检查配置"));
            }
        }
        AppMode::Worker => {
            if !config.worker.enabled {
                return Err(anyhow::anyhow!("Worker模式被禁用，请检查配置"));
            }
        }
        AppMode::All => {}
    }
    Ok(())
}

/// 解析应用运行模式
pub fn parse_app_mode(mode_str: &str) -> Result<AppMode> {
    mode_str.parse()
}

/// 等待关闭信号；信号处理器安装失败时只记录错误，不再等待该信号
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_config_from_matches() {
        let matches = base_command("test", "test")
            .arg(worker_id_arg())
            .try_get_matches_from([
                "test", "--kernel", "57", "--worker-id", "10", "--log-format", "json",
            ])
            .unwrap();
        let startup = StartupConfig::from_matches(&matches);

        assert_eq!(startup.kernel_size, Some(57));
        assert_eq!(startup.worker_id.as_deref(), Some("10"));
        assert_eq!(startup.log_format.as_deref(), Some("json"));
        assert!(startup.config_path.is_none());
        assert!(startup.log_level.is_none());
    }

    #[test]
    fn test_worker_id_absent_from_command() {
        let matches = base_command("test", "test")
            .try_get_matches_from(["test"])
            .unwrap();
        assert!(StartupConfig::from_matches(&matches).worker_id.is_none());
    }

    #[test]
    fn test_log_level_value_parser() {
        let result = base_command("test", "test").try_get_matches_from(["test", "-l", "loud"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgfleet.toml");
        std::fs::write(&path, "[imaging]\nkernel_size = 111\n").unwrap();

        let startup = StartupConfig {
            config_path: Some(path.to_string_lossy().into_owned()),
            worker_id: Some("7".to_string()),
            kernel_size: Some(155),
            log_level: Some("debug".to_string()),
            log_format: Some("json".to_string()),
        };
        let config = load_config(&startup).unwrap();

        assert_eq!(config.worker.worker_id, "7");
        assert_eq!(config.imaging.kernel_size, 155);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_load_config_rejects_invalid_kernel_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgfleet.toml");
        std::fs::write(&path, "").unwrap();

        let startup = StartupConfig {
            config_path: Some(path.to_string_lossy().into_owned()),
            kernel_size: Some(56),
            ..Default::default()
        };
        assert!(load_config(&startup).is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let startup = StartupConfig {
            config_path: Some("/nonexistent/imgfleet.toml".to_string()),
            ..Default::default()
        };
        assert!(load_config(&startup).is_err());
    }

    #[test]
    fn test_validate_mode_enabled() {
        let mut config = AppConfig::default();
        assert!(validate_mode_enabled(&AppMode::Dispatcher, &config).is_ok());
        assert!(validate_mode_enabled(&AppMode::Worker, &config).is_err());
        config.worker.enabled = true;
        assert!(validate_mode_enabled(&AppMode::Worker, &config).is_ok());
        assert!(validate_mode_enabled(&AppMode::All, &config).is_ok());
    }
}
