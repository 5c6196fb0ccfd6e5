use anyhow::Result;
use clap::Arg;
use imgfleet::common::{base_command, parse_app_mode, start_application, worker_id_arg, StartupConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = base_command("imgfleet", "拉取式图像处理任务分发系统")
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_name("MODE")
                .help("运行模式")
                .value_parser(["dispatcher", "worker", "all"])
                .default_value("all"),
        )
        .arg(worker_id_arg().required_if_eq("mode", "worker"))
        .get_matches();

    let mode_str = matches
        .get_one::<String>("mode")
        .map(String::as_str)
        .unwrap_or("all");
    let app_mode = parse_app_mode(mode_str)?;

    let startup_config = StartupConfig::from_matches(&matches);
    start_application(startup_config, app_mode, "imgfleet").await
}
