//! 单次下载的执行入口：生成参数、启动 yt-dlp、转发输出、判定结果。

use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::base_system::context::Config;
use crate::base_system::tool_paths::ToolPaths;

use super::models::{DownloadRequest, InvocationResult, PresetKind};
use super::plan::build_args;
use super::process::{ProcessOutcome, ProcessSpec, run_streaming};

/// 菜单循环依赖的下载接口，测试中可替换为假实现。
pub trait Downloader {
    /// 执行一次下载；过程输出写入 `console`，任何错误都折叠进返回值。
    fn download(&mut self, request: &DownloadRequest, console: &mut dyn Write) -> InvocationResult;
}

/// 调用本地 yt-dlp 的实现。
pub struct ToolDownloader {
    tools: ToolPaths,
    download_dir: PathBuf,
    work_dir: Option<PathBuf>,
    timeout: Duration,
}

impl ToolDownloader {
    pub fn new(tools: ToolPaths, download_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            tools,
            download_dir,
            work_dir: std::env::current_dir().ok(),
            timeout,
        }
    }

    pub fn from_config(config: &Config, tools: ToolPaths) -> Self {
        Self::new(tools, config.resolved_download_dir(), config.download_timeout())
    }
}

impl Downloader for ToolDownloader {
    fn download(&mut self, request: &DownloadRequest, console: &mut dyn Write) -> InvocationResult {
        let preset = request.preset();
        let _ = writeln!(console, "Starting the download in {}...", preset.kind);
        match preset.kind {
            PresetKind::Mp4_720p => {
                let _ = writeln!(console, "Download in 720p quality...");
            }
            PresetKind::Mp4Best => {
                let _ = writeln!(console, "Seeking the best quality available...");
            }
            PresetKind::Mp3 => {}
        }

        let args = build_args(request, &self.tools, &self.download_dir);
        info!(target: "download", url = request.url(), preset = %preset.kind, "starting yt-dlp");
        debug!(target: "download", ?args, "yt-dlp arguments");

        let spec = ProcessSpec {
            program: &self.tools.downloader,
            args: &args,
            work_dir: self.work_dir.as_deref(),
            timeout: self.timeout,
        };

        let started = Instant::now();
        let outcome = run_streaming(&spec, |line| {
            let _ = writeln!(console, "{line}");
            let _ = console.flush();
        });

        match outcome {
            Ok(ProcessOutcome::Exited(code)) => {
                let result = InvocationResult::from_exit_code(code);
                if result.succeeded {
                    info!(target: "download", elapsed_ms = started.elapsed().as_millis() as u64, "yt-dlp finished");
                } else {
                    warn!(target: "download", ?code, "yt-dlp failed");
                }
                result
            }
            Ok(ProcessOutcome::TimedOut) => {
                warn!(target: "download", timeout_secs = self.timeout.as_secs(), "yt-dlp timed out");
                InvocationResult::timed_out()
            }
            Err(err) => {
                error!(target: "download", error = %err, "yt-dlp could not run");
                let _ = writeln!(console, "Error while downloading: {err}");
                InvocationResult::failed()
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::base_system::tool_paths::OsFamily;
    use crate::download::models::{MP3, MP4_720P};
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn install_fake_tool(bin_dir: &Path, body: &str) -> ToolPaths {
        let tools = ToolPaths::resolve(bin_dir, OsFamily::Unix);
        for path in [&tools.downloader, &tools.converter] {
            fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        tools
    }

    fn run(tools: ToolPaths, request: &DownloadRequest, timeout: Duration) -> (InvocationResult, String) {
        let out_dir = tempfile::tempdir().unwrap();
        let mut downloader = ToolDownloader::new(tools, out_dir.path().to_path_buf(), timeout);
        let mut console = Vec::new();
        let result = downloader.download(request, &mut console);
        (result, String::from_utf8(console).unwrap())
    }

    #[test]
    fn relays_arguments_and_reports_success() {
        let bin = tempfile::tempdir().unwrap();
        let tools = install_fake_tool(bin.path(), r#"for a in "$@"; do echo "$a"; done; exit 0"#);
        let request = DownloadRequest::new("https://example.com/watch?v=abc", &MP3).unwrap();

        let (result, console) = run(tools, &request, Duration::from_secs(10));

        assert!(result.succeeded);
        assert_eq!(result.exit_code, Some(0));
        assert!(console.starts_with("Starting the download in MP3..."));
        for expected in ["--extract-audio", "mp3", "--no-playlist", "--ffmpeg-location"] {
            assert!(console.lines().any(|l| l == expected), "missing {expected}");
        }
        assert!(console.lines().any(|l| l == "https://example.com/watch?v=abc"));
    }

    #[test]
    fn exit_code_one_is_a_failure() {
        let bin = tempfile::tempdir().unwrap();
        let tools = install_fake_tool(bin.path(), "echo 'ERROR: unsupported URL' >&2; exit 1");
        let request = DownloadRequest::new("https://example.com/x", &MP4_720P).unwrap();

        let (result, console) = run(tools, &request, Duration::from_secs(10));

        assert!(!result.succeeded);
        assert!(!result.timed_out);
        assert_eq!(result.exit_code, Some(1));
        assert!(console.contains("Download in 720p quality..."));
        assert!(console.contains("ERROR: unsupported URL"));
    }

    #[test]
    fn slow_tool_is_killed() {
        let bin = tempfile::tempdir().unwrap();
        let tools = install_fake_tool(bin.path(), "exec sleep 30");
        let request = DownloadRequest::new("https://example.com/slow", &MP3).unwrap();

        let started = Instant::now();
        let (result, _) = run(tools, &request, Duration::from_millis(300));

        assert!(result.timed_out);
        assert!(!result.succeeded);
        assert_eq!(result.exit_code, None);
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn launch_error_is_folded_into_result() {
        let bin = tempfile::tempdir().unwrap();
        let tools = ToolPaths::resolve(bin.path(), OsFamily::Unix);
        let request = DownloadRequest::new("https://example.com/x", &MP3).unwrap();

        let (result, console) = run(tools, &request, Duration::from_secs(5));

        assert!(!result.succeeded);
        assert!(!result.timed_out);
        assert!(console.contains("Error while downloading:"));
    }
}
