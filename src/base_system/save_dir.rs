use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirStatus {
    Existing,
    Created,
}

/// 确保下载目录存在（递归创建缺失的上级目录）。
pub fn ensure_download_dir(path: &Path) -> io::Result<DirStatus> {
    if path.is_dir() {
        return Ok(DirStatus::Existing);
    }
    fs::create_dir_all(path)?;
    Ok(DirStatus::Created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_directories_once() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("Downloads").join("VideoDownloader");

        assert_eq!(ensure_download_dir(&target).unwrap(), DirStatus::Created);
        assert!(target.is_dir());
        assert_eq!(ensure_download_dir(&target).unwrap(), DirStatus::Existing);
    }

    #[test]
    fn fails_when_a_file_is_in_the_way() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("blocked");
        fs::write(&blocker, b"x").unwrap();

        assert!(ensure_download_dir(&blocker.join("child")).is_err());
    }
}
