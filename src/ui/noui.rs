//! 编号菜单交互：选择预设、输入链接、逐个执行下载。

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::base_system::save_dir::{DirStatus, ensure_download_dir};
use crate::base_system::tool_paths::{CONVERTER_NAME, DOWNLOADER_NAME, ToolPaths};
use crate::download::downloader::Downloader;
use crate::download::models::{DownloadRequest, InvocationResult, PRESETS, Preset};

const QUIT_CHOICE: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Download(&'static Preset),
    Quit,
}

/// 解析菜单输入；非数字或超出 1..=4 时返回 None。
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    let n: u32 = input.trim().parse().ok()?;
    if n == QUIT_CHOICE {
        return Some(MenuChoice::Quit);
    }
    Preset::from_choice(n).map(MenuChoice::Download)
}

/// 启动检查通过后进入菜单循环。
///
/// yt-dlp 或 ffmpeg 缺失/不可执行时只输出目录结构说明，返回 `Ok(false)`，
/// 不会调用 `downloader`。
pub fn start<R, W, D>(
    tools: &ToolPaths,
    bin_dir: &Path,
    input: &mut R,
    output: &mut W,
    downloader: &mut D,
    download_dir: &Path,
) -> Result<bool>
where
    R: BufRead,
    W: Write,
    D: Downloader,
{
    let missing = tools.check();
    if !missing.is_empty() {
        for tool in &missing {
            warn!(target: "startup", tool = tool.name, path = %tool.path.display(), "required binary missing");
            writeln!(output, "{} not found: {}", tool.name, tool.path.display())?;
        }
        print_expected_layout(output, bin_dir)?;
        return Ok(false);
    }
    info!(
        target: "startup",
        downloader = %tools.downloader.display(),
        converter = %tools.converter.display(),
        "binaries found"
    );

    match ensure_download_dir(download_dir) {
        Ok(DirStatus::Created) => {
            info!(target: "startup", dir = %download_dir.display(), "download directory created");
            writeln!(output, "Directory created: {}", download_dir.display())?;
        }
        Ok(DirStatus::Existing) => {}
        Err(err) => {
            warn!(target: "startup", dir = %download_dir.display(), error = %err, "cannot create download directory");
            writeln!(output, "Unable to create directory: {err}")?;
        }
    }

    run(input, output, downloader, download_dir)?;
    Ok(true)
}

fn print_expected_layout<W: Write>(output: &mut W, bin_dir: &Path) -> Result<()> {
    writeln!(output, "Binaries not found in folder: {}", bin_dir.display())?;
    writeln!(output, "Required structure:")?;
    writeln!(output, "    {}/", bin_dir.display())?;
    writeln!(output, "       {DOWNLOADER_NAME}.exe (Windows) or {DOWNLOADER_NAME} (Linux/Mac)")?;
    writeln!(output, "       {CONVERTER_NAME}.exe (Windows) or {CONVERTER_NAME} (Linux/Mac)")?;
    Ok(())
}

/// 菜单主循环，选择退出或输入结束（EOF）时返回。
pub fn run<R, W, D>(input: &mut R, output: &mut W, downloader: &mut D, download_dir: &Path) -> Result<()>
where
    R: BufRead,
    W: Write,
    D: Downloader,
{
    loop {
        print_menu(output, download_dir)?;

        let Some(line) = read_line(input, output, "Your choice: ")? else {
            writeln!(output)?;
            break;
        };
        let preset = match parse_choice(&line) {
            Some(MenuChoice::Quit) => break,
            Some(MenuChoice::Download(preset)) => preset,
            None => {
                writeln!(output, "Invalid choice!")?;
                continue;
            }
        };

        let Some(url) = read_line(input, output, "Enter the video URL: ")? else {
            writeln!(output)?;
            break;
        };
        let Some(request) = DownloadRequest::new(&url, preset) else {
            writeln!(output, "Invalid URL!")?;
            continue;
        };

        info!(target: "ui", preset = %preset.kind, url = request.url(), "download requested");
        let result = downloader.download(&request, &mut *output);
        report_result(output, &result)?;
    }

    info!(target: "ui", "menu closed");
    Ok(())
}

fn print_menu<W: Write>(output: &mut W, download_dir: &Path) -> Result<()> {
    writeln!(output, "\n=== SIMPLE VIDEO DOWNLOADER ===")?;
    writeln!(output, " Downloads: {}\n", download_dir.display())?;
    for (idx, preset) in PRESETS.iter().enumerate() {
        writeln!(output, "{}. {}", idx + 1, preset.label)?;
    }
    writeln!(output, "{QUIT_CHOICE}. Quit")?;
    Ok(())
}

fn report_result<W: Write>(output: &mut W, result: &InvocationResult) -> Result<()> {
    if result.succeeded {
        writeln!(output, "Download successful!")?;
    } else if result.timed_out {
        writeln!(output, "The download took too long and was interrupted.")?;
    } else if let Some(code) = result.exit_code {
        writeln!(output, "Download failed (code: {code})")?;
    } else {
        writeln!(output, "Download failed.")?;
    }
    Ok(())
}

/// 输出提示并读取一行；EOF 返回 None。
fn read_line<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<Option<String>> {
    write!(output, "{prompt}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
