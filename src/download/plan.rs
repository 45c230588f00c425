//! 按预设生成 yt-dlp 的参数列表。

use std::ffi::OsString;
use std::path::Path;

use crate::base_system::tool_paths::ToolPaths;

use super::models::{DownloadRequest, Preset};

/// yt-dlp 自行替换的输出文件名模板
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

pub fn output_template(download_dir: &Path) -> OsString {
    download_dir.join(OUTPUT_TEMPLATE).into_os_string()
}

/// 生成完整参数列表（不含程序本身），URL 放在最后。
pub fn build_args(request: &DownloadRequest, tools: &ToolPaths, download_dir: &Path) -> Vec<OsString> {
    let preset = request.preset();
    let mut args: Vec<OsString> = Vec::with_capacity(24);

    if preset.is_audio() {
        push_audio_args(&mut args, preset);
    } else {
        push_video_args(&mut args, preset);
    }

    args.push("--output".into());
    args.push(output_template(download_dir));
    args.push("--no-playlist".into());
    args.push("--ffmpeg-location".into());
    args.push(tools.converter.clone().into_os_string());
    args.push(request.url().into());
    args
}

fn push_audio_args(args: &mut Vec<OsString>, preset: &Preset) {
    args.extend(
        [
            "--extract-audio",
            "--audio-format",
            preset.extension,
            "--audio-quality",
            "0",
            "--format",
            preset.selector,
        ]
        .map(OsString::from),
    );
}

fn push_video_args(args: &mut Vec<OsString>, preset: &Preset) {
    args.extend(
        [
            "--format",
            preset.selector,
            "--merge-output-format",
            preset.extension,
        ]
        .map(OsString::from),
    );
    if let Some(sort) = preset.format_sort {
        args.push("--format-sort".into());
        args.push(sort.into());
    }
    args.extend(
        [
            "--no-prefer-free-formats",
            "--embed-thumbnail",
            "--add-metadata",
        ]
        .map(OsString::from),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_system::tool_paths::OsFamily;
    use crate::download::models::{MP3, MP4_720P, MP4_BEST, PRESETS};

    const URL: &str = "https://example.com/watch?v=abc";

    fn tools() -> ToolPaths {
        ToolPaths::resolve(Path::new("./bin"), OsFamily::Unix)
    }

    fn args_for(preset: &'static Preset) -> Vec<String> {
        let request = DownloadRequest::new(URL, preset).unwrap();
        build_args(&request, &tools(), Path::new("/downloads"))
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn every_preset_carries_shared_flags() {
        for preset in PRESETS {
            let args = args_for(preset);
            assert!(args.iter().any(|a| a == "--no-playlist"), "{}", preset.kind);
            let converter = tools().converter.to_string_lossy().into_owned();
            assert_eq!(value_after(&args, "--ffmpeg-location"), Some(converter.as_str()));

            let template = value_after(&args, "--output").unwrap();
            assert!(template.starts_with("/downloads"));
            assert!(template.ends_with("%(title)s.%(ext)s"));

            assert_eq!(args.last().map(String::as_str), Some(URL));
        }
    }

    #[test]
    fn extension_reaches_the_tool() {
        assert_eq!(value_after(&args_for(&MP3), "--audio-format"), Some("mp3"));
        assert_eq!(
            value_after(&args_for(&MP4_BEST), "--merge-output-format"),
            Some("mp4")
        );
        assert_eq!(
            value_after(&args_for(&MP4_720P), "--merge-output-format"),
            Some("mp4")
        );
    }

    #[test]
    fn audio_preset_extracts_best_audio() {
        let args = args_for(&MP3);
        assert_eq!(args[0], "--extract-audio");
        assert_eq!(value_after(&args, "--audio-quality"), Some("0"));
        assert_eq!(value_after(&args, "--format"), Some(MP3.selector));
        assert!(!args.iter().any(|a| a == "--embed-thumbnail"));
        assert!(!args.iter().any(|a| a == "--format-sort"));
    }

    #[test]
    fn video_presets_differ_in_sort_order() {
        let best = args_for(&MP4_BEST);
        let hd = args_for(&MP4_720P);

        assert_eq!(
            value_after(&best, "--format-sort"),
            Some("res:desc,fps:desc,tbr:desc")
        );
        assert_eq!(value_after(&hd, "--format-sort"), Some("height:720,fps:30,tbr"));
        assert_eq!(value_after(&hd, "--format"), Some(MP4_720P.selector));

        for args in [&best, &hd] {
            assert!(args.iter().any(|a| a == "--no-prefer-free-formats"));
            assert!(!args.iter().any(|a| a == "--prefer-free-formats" || a == "false"));
            assert!(args.iter().any(|a| a == "--embed-thumbnail"));
            assert!(args.iter().any(|a| a == "--add-metadata"));
            assert!(!args.iter().any(|a| a == "--extract-audio"));
        }
    }

    /// 不带参数的开关；其余以 `--` 开头的选项都会消耗下一个参数。
    const SWITCHES: &[&str] = &[
        "--extract-audio",
        "--no-playlist",
        "--no-prefer-free-formats",
        "--embed-thumbnail",
        "--add-metadata",
    ];

    fn positionals(args: &[String]) -> Vec<&str> {
        let mut found = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if SWITCHES.contains(&arg.as_str()) {
                continue;
            }
            if arg.starts_with("--") {
                iter.next();
                continue;
            }
            found.push(arg.as_str());
        }
        found
    }

    #[test]
    fn url_is_the_only_positional_argument() {
        for preset in PRESETS {
            let args = args_for(preset);
            assert_eq!(positionals(&args), vec![URL], "{}", preset.kind);
        }
    }
}
