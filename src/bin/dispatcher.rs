use anyhow::Result;
use imgfleet::app::AppMode;
use imgfleet::common::{base_command, start_application, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = base_command("imgfleet-dispatcher", "图像任务协调器服务")
        .long_about("扫描输入目录，通过HTTP向Worker分发轻量与模糊任务，汇总统计并写出最终报告")
        .get_matches();

    let startup_config = StartupConfig::from_matches(&matches);
    start_application(startup_config, AppMode::Dispatcher, "Dispatcher").await
}
