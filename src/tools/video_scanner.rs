use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 批次模式支援的影片副檔名
const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "mov", "avi", "mkv", "webm", "m4v", "ts", "wmv"];

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
}

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// 掃描資料夾樹裡的所有影片檔案，依檔案大小由小到大排序
pub fn scan_video_files(directory: &Path) -> Result<Vec<VideoFileInfo>> {
    let mut video_files: Vec<VideoFileInfo> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_video_file(entry.path()))
        .par_bridge()
        .filter_map(|entry| {
            let metadata = std::fs::symlink_metadata(entry.path()).ok()?;
            Some(VideoFileInfo {
                path: entry.into_path(),
                size: metadata.len(),
            })
        })
        .collect();

    video_files.sort_by_key(|file| file.size);
    Ok(video_files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("/a/clip.mp4")));
        assert!(is_video_file(Path::new("/a/CLIP.MKV")));
        assert!(!is_video_file(Path::new("/a/cover.jpg")));
        assert!(!is_video_file(Path::new("/a/noext")));
    }

    #[test]
    fn test_scan_filters_and_sorts_by_size() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("big.mp4"), vec![0u8; 300]).unwrap();
        std::fs::write(dir.path().join("small.mkv"), vec![0u8; 10]).unwrap();
        std::fs::write(dir.path().join("note.txt"), b"skip me").unwrap();

        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("middle.mov"), vec![0u8; 100]).unwrap();

        let files = scan_video_files(dir.path()).unwrap();

        assert_eq!(files.len(), 3, "應該只掃到 3 個影片檔案");
        assert_eq!(files[0].size, 10);
        assert_eq!(files[1].size, 100);
        assert_eq!(files[2].size, 300);
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = TempDir::new().unwrap();
        let files = scan_video_files(dir.path()).unwrap();
        assert!(files.is_empty());
    }
}
