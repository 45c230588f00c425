//! 下载相关的数据模型定义。
//!
//! 包含三个固定预设（Preset）、单次下载请求与子进程执行结果。

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetKind {
    Mp3,
    Mp4Best,
    Mp4_720p,
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mp3 => "MP3",
            Self::Mp4Best => "MP4_BEST",
            Self::Mp4_720p => "MP4_720P",
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Preset {
    pub kind: PresetKind,
    /// 传给 yt-dlp `--format` 的格式选择表达式
    pub selector: &'static str,
    pub extension: &'static str,
    /// 菜单显示文本
    pub label: &'static str,
    /// `--format-sort` 排序规则，仅视频预设使用
    pub format_sort: Option<&'static str>,
}

pub static MP3: Preset = Preset {
    kind: PresetKind::Mp3,
    selector: "bestaudio[ext=m4a]/bestaudio[ext=mp3]/bestaudio",
    extension: "mp3",
    label: "Download MP3",
    format_sort: None,
};

pub static MP4_BEST: Preset = Preset {
    kind: PresetKind::Mp4Best,
    selector: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best[ext=mp4]/best",
    extension: "mp4",
    label: "Download MP4 (BEST RESOLUTION)",
    format_sort: Some("res:desc,fps:desc,tbr:desc"),
};

pub static MP4_720P: Preset = Preset {
    kind: PresetKind::Mp4_720p,
    selector: "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/bestvideo[height<=720]+bestaudio[ext=m4a]/best[height<=720][ext=mp4]/best[height<=720]",
    extension: "mp4",
    label: "Download MP4 (720p)",
    format_sort: Some("height:720,fps:30,tbr"),
};

/// 菜单顺序：1 → MP3，2 → 最佳画质，3 → 720p。
pub static PRESETS: [&Preset; 3] = [&MP3, &MP4_BEST, &MP4_720P];

impl Preset {
    /// 菜单编号（从 1 开始）对应的预设。
    pub fn from_choice(choice: u32) -> Option<&'static Preset> {
        let idx = usize::try_from(choice).ok()?.checked_sub(1)?;
        PRESETS.get(idx).copied()
    }

    pub fn is_audio(&self) -> bool {
        self.kind == PresetKind::Mp3
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    url: String,
    preset: &'static Preset,
}

impl DownloadRequest {
    /// URL 去除首尾空白后为空时返回 None。
    pub fn new(url: &str, preset: &'static Preset) -> Option<Self> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            preset,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn preset(&self) -> &'static Preset {
        self.preset
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationResult {
    pub succeeded: bool,
    /// 被强制结束或被信号终止时没有退出码
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl InvocationResult {
    /// 仅退出码 0 视为成功。
    pub fn from_exit_code(code: Option<i32>) -> Self {
        Self {
            succeeded: code == Some(0),
            exit_code: code,
            timed_out: false,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            succeeded: false,
            exit_code: None,
            timed_out: true,
        }
    }

    pub fn failed() -> Self {
        Self {
            succeeded: false,
            exit_code: None,
            timed_out: false,
        }
    }
}
