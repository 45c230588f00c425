//! 下载流程模块入口。
//!
//! 子模块：
//! - `models`     — 预设、下载请求与执行结果
//! - `plan`       — 按预设生成 yt-dlp 参数
//! - `process`    — 子进程启动、输出转发与超时控制
//! - `downloader` — 单次下载的执行入口

pub mod downloader;
pub mod models;
pub mod plan;
pub mod process;
