use anyhow::Result;
use imgfleet::app::AppMode;
use imgfleet::common::{base_command, start_application, worker_id_arg, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = base_command("imgfleet-worker", "图像任务Worker服务")
        .long_about("从协调器拉取任务并执行图像滤镜，收到终止后上报统计并退出")
        .arg(worker_id_arg().required(true))
        .get_matches();

    let startup_config = StartupConfig::from_matches(&matches);
    start_application(startup_config, AppMode::Worker, "Worker").await
}
