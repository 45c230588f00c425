//! 外部工具（yt-dlp / ffmpeg）路径解析与启动前检查。

use std::fs;
use std::path::{Path, PathBuf};

pub const DOWNLOADER_NAME: &str = "yt-dlp";
pub const CONVERTER_NAME: &str = "ffmpeg";

const WINDOWS_MARKER: &str = "windows";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
    Windows,
    Unix,
}

impl OsFamily {
    /// 按系统名称判断平台（大小写不敏感的子串匹配）。
    pub fn from_os_name(name: &str) -> Self {
        if name.to_ascii_lowercase().contains(WINDOWS_MARKER) {
            Self::Windows
        } else {
            Self::Unix
        }
    }

    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    fn exe_suffix(self) -> &'static str {
        match self {
            Self::Windows => ".exe",
            Self::Unix => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub downloader: PathBuf,
    pub converter: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTool {
    pub name: &'static str,
    pub path: PathBuf,
}

impl ToolPaths {
    pub fn resolve(bin_dir: &Path, family: OsFamily) -> Self {
        let suffix = family.exe_suffix();
        Self {
            downloader: bin_dir.join(format!("{DOWNLOADER_NAME}{suffix}")),
            converter: bin_dir.join(format!("{CONVERTER_NAME}{suffix}")),
        }
    }

    /// 返回缺失或不可执行的工具列表；为空表示检查通过。
    pub fn check(&self) -> Vec<MissingTool> {
        [
            (DOWNLOADER_NAME, &self.downloader),
            (CONVERTER_NAME, &self.converter),
        ]
        .into_iter()
        .filter(|(_, path)| !is_executable(path))
        .map(|(name, path)| MissingTool {
            name,
            path: path.clone(),
        })
        .collect()
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    fs::metadata(path).map(|meta| meta.is_file()).unwrap_or(false)
}
