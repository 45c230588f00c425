//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, ConfigSpec, FieldMeta};

/// 默认下载目录：`<home>/Downloads/VideoDownloader`
pub const DEFAULT_DOWNLOAD_SUBDIR: &str = "VideoDownloader";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 路径配置
    #[serde(default)]
    pub download_dir: String,
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,

    // 进程配置
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: String::new(),
            bin_dir: default_bin_dir(),
            download_timeout_secs: default_download_timeout_secs(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 3] = [
            FieldMeta {
                name: "download_dir",
                description: "下载保存目录（留空表示 <home>/Downloads/VideoDownloader）",
            },
            FieldMeta {
                name: "bin_dir",
                description: "yt-dlp 与 ffmpeg 所在目录",
            },
            FieldMeta {
                name: "download_timeout_secs",
                description: "单次下载的最长运行时间（秒），超时将强制结束 yt-dlp",
            },
        ];
        &FIELDS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.download_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "download_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.bin_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "bin_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    /// 实际使用的下载目录。
    pub fn resolved_download_dir(&self) -> PathBuf {
        let configured = self.download_dir.trim();
        if !configured.is_empty() {
            return PathBuf::from(configured);
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join("Downloads").join(DEFAULT_DOWNLOAD_SUBDIR)
    }

    pub fn resolved_bin_dir(&self) -> PathBuf {
        PathBuf::from(self.bin_dir.trim())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

fn default_bin_dir() -> String {
    "./bin".to_string()
}

fn default_download_timeout_secs() -> u64 {
    300
}
