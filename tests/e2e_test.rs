//! E2E 測試 - 以 ffmpeg 合成的測試影片驗證完整產圖流程
//!
//! 環境沒有 ffmpeg / ffprobe 時自動跳過

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use video_thumbnail_maker::component::thumbnail_generator::ThumbnailPipeline;
use video_thumbnail_maker::config::{
    ThumbnailMode, ThumbnailSettings, WatermarkKind, WatermarkPosition, WatermarkSettings,
};

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .output()
        .is_ok_and(|output| output.status.success())
        && Command::new("ffprobe")
            .arg("-version")
            .output()
            .is_ok_and(|output| output.status.success())
}

/// 用 lavfi testsrc 合成一支 4 秒 320x180 的測試影片
fn create_test_video(dir: &Path) -> Option<PathBuf> {
    let path = dir.join("test_video.mp4");
    let status = Command::new("ffmpeg")
        .args([
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "lavfi",
            "-i",
            "testsrc=duration=4:size=320x180:rate=10",
            "-pix_fmt",
            "yuv420p",
            "-y",
        ])
        .arg(&path)
        .status()
        .ok()?;

    status.success().then_some(path)
}

#[test]
fn test_single_thumbnail_e2e() {
    if !ffmpeg_available() {
        println!("跳過測試：環境沒有 ffmpeg");
        return;
    }

    let temp = TempDir::new().unwrap();
    let Some(video_path) = create_test_video(temp.path()) else {
        println!("跳過測試：無法合成測試影片");
        return;
    };

    let pipeline = ThumbnailPipeline::open(&video_path).unwrap();

    let info = pipeline.video_info();
    println!("影片資訊: {:.2}s, {}, {:.2} fps", info.duration, info.resolution(), info.fps);
    assert!(info.duration > 3.0, "影片長度應該接近 4 秒");
    assert_eq!(info.resolution(), "320x180");

    let thumbnail = ThumbnailSettings {
        mode: ThumbnailMode::Single,
        timestamp: 2.0,
        output_path: temp.path().join("single_out"),
        output_format: "jpg".to_string(),
        ..Default::default()
    };

    let mut reported: Vec<u8> = Vec::new();
    let (output_path, image) = pipeline
        .generate(&thumbnail, &WatermarkSettings::default(), |percent| {
            reported.push(percent);
        })
        .unwrap();

    assert_eq!(
        output_path.extension().and_then(|e| e.to_str()),
        Some("jpg")
    );
    assert!(output_path.exists(), "輸出檔案應該存在");
    assert_eq!(image.dimensions(), (320, 180));
    assert_eq!(*reported.last().unwrap(), 100);

    let decoded = image::open(&output_path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (320, 180));

    println!("✓ 單張縮圖 E2E 測試通過");
}

#[test]
fn test_grid_thumbnail_with_watermark_e2e() {
    if !ffmpeg_available() {
        println!("跳過測試：環境沒有 ffmpeg");
        return;
    }

    let temp = TempDir::new().unwrap();
    let Some(video_path) = create_test_video(temp.path()) else {
        println!("跳過測試：無法合成測試影片");
        return;
    };

    let pipeline = ThumbnailPipeline::open(&video_path).unwrap();

    let thumbnail = ThumbnailSettings {
        mode: ThumbnailMode::Grid,
        rows: 2,
        columns: 2,
        output_path: temp.path().join("grid_out.png"),
        output_format: "png".to_string(),
        ..Default::default()
    };
    let watermark = WatermarkSettings {
        kind: WatermarkKind::Text,
        opacity: 60,
        position: WatermarkPosition::BottomRight,
        text: "SAMPLE".to_string(),
        font_size: 24,
        ..Default::default()
    };

    let (output_path, image) = pipeline
        .generate(&thumbnail, &watermark, |_| {})
        .unwrap();

    // 2x2 網格：每格 320x180
    assert_eq!(image.dimensions(), (640, 360));
    assert!(output_path.exists());

    let metadata = std::fs::metadata(&output_path).unwrap();
    assert!(metadata.len() > 0, "輸出檔案大小應該大於 0");

    println!("✓ 網格浮水印 E2E 測試通過");
}

#[test]
fn test_random_grid_reproducible_e2e() {
    if !ffmpeg_available() {
        println!("跳過測試：環境沒有 ffmpeg");
        return;
    }

    let temp = TempDir::new().unwrap();
    let Some(video_path) = create_test_video(temp.path()) else {
        println!("跳過測試：無法合成測試影片");
        return;
    };

    let pipeline = ThumbnailPipeline::open(&video_path).unwrap();

    let mut thumbnail = ThumbnailSettings {
        mode: ThumbnailMode::Grid,
        rows: 2,
        columns: 2,
        randomize: true,
        random_seed: Some(7),
        output_path: temp.path().join("random_a.png"),
        output_format: "png".to_string(),
        ..Default::default()
    };

    let (_, first) = pipeline
        .generate(&thumbnail, &WatermarkSettings::default(), |_| {})
        .unwrap();

    thumbnail.output_path = temp.path().join("random_b.png");
    let (_, second) = pipeline
        .generate(&thumbnail, &WatermarkSettings::default(), |_| {})
        .unwrap();

    assert_eq!(first, second, "同一顆種子要產出相同的網格");

    println!("✓ 隨機網格重現 E2E 測試通過");
}

#[test]
fn test_missing_video_fails_cleanly_e2e() {
    let result = ThumbnailPipeline::open(Path::new("/no/such/video.mp4"));
    assert!(result.is_err(), "不存在的影片應該直接失敗");
}
