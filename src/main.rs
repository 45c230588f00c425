//! Simple Video Downloader：调用本地 yt-dlp / ffmpeg 下载音频或视频的交互式命令行前端。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/外部工具路径/下载目录等基础设施
//! - `download`：预设、参数生成、子进程执行与结果判定
//! - `ui`：编号菜单交互

use std::io;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;

mod base_system;
mod download;
mod ui;

use base_system::config::{load_or_create, load_or_create_with_base};
use base_system::context::Config;
use base_system::logging::{LogOptions, LogSystem};
use base_system::tool_paths::{OsFamily, ToolPaths};
use download::downloader::ToolDownloader;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "video-downloader")]
#[command(about = "Download audio or video through local yt-dlp and ffmpeg binaries")]
struct Cli {
    /// 启用调试日志（同时输出到控制台）
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,

    /// 数据目录路径（存放 config.yml 和 logs）
    #[arg(long)]
    data_dir: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("Simple Video Downloader v{}", VERSION);
        return Ok(());
    }

    let data_dir = cli.data_dir.as_deref().map(Path::new);
    let _log = init_logging(cli.debug, data_dir)?;
    info!(target: "startup", "当前版本: v{}", VERSION);

    let config = if let Some(dir) = data_dir {
        load_or_create_with_base::<Config>(None, Some(dir))
    } else {
        load_or_create::<Config>(None)
    }
    .context("load config.yml")?;

    let bin_dir = config.resolved_bin_dir();
    let tools = ToolPaths::resolve(&bin_dir, OsFamily::current());
    let download_dir = config.resolved_download_dir();
    let mut downloader = ToolDownloader::from_config(&config, tools.clone());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    ui::noui::start(
        &tools,
        &bin_dir,
        &mut input,
        &mut output,
        &mut downloader,
        &download_dir,
    )?;
    Ok(())
}

fn init_logging(debug: bool, base_dir: Option<&Path>) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        console: debug,
        ..LogOptions::default()
    };
    LogSystem::init_with_base(opts, base_dir).map_err(|e| anyhow!(e))
}
