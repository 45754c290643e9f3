use anyhow::{Context, Result, bail};
use image::RgbImage;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 影片開檔時讀到的中繼資料快照，之後只讀不改
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub path: PathBuf,
    /// 影片長度（秒），讀不到時為 0
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl VideoInfo {
    /// 解析度字串，例如 "1920x1080"
    #[must_use]
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// seek 不超過串流結尾的保留量（秒）
const END_EPSILON: f64 = 0.001;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

/// 把時間戳限制在 [0, duration - 1ms]；長度不明時一律取 0
#[must_use]
pub fn clamp_timestamp(timestamp: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 0.0;
    }
    timestamp.clamp(0.0, (duration - END_EPSILON).max(0.0))
}

/// 影片來源：提供中繼資料與任意時間點的解碼影格
///
/// 管線只透過這個介面跟解碼端往來，時間戳一律先 clamp 再 seek
pub trait VideoSource {
    fn info(&self) -> &VideoInfo;

    fn frame_at(&self, timestamp: f64) -> Result<RgbImage>;
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
}

/// 以 ffprobe / ffmpeg 實作的影片來源
///
/// 開檔時跑一次 ffprobe 取中繼資料；之後每張影格各跑一次 ffmpeg，
/// 用兩段式 seek 讓長片也能快速定位：
/// 1. `-ss` 在 `-i` 前：快速跳到最近的關鍵幀
/// 2. `-ss` 在 `-i` 後：精準解碼到目標時間點
pub struct FfmpegVideoSource {
    info: VideoInfo,
}

impl FfmpegVideoSource {
    /// 開啟影片，檔案不存在或讀不到中繼資料時直接失敗
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("影片檔案不存在: {}", path.display());
        }

        let info = probe_video(path)?;
        debug!(
            "已開啟影片: {} ({:.2}s, {}, {:.2} fps)",
            path.display(),
            info.duration,
            info.resolution(),
            info.fps
        );

        Ok(Self { info })
    }
}

impl VideoSource for FfmpegVideoSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn frame_at(&self, timestamp: f64) -> Result<RgbImage> {
        let timestamp = clamp_timestamp(timestamp, self.info.duration);
        let t0 = (timestamp - SEEK_MARGIN).max(0.0);
        let delta = timestamp - t0;

        debug!("擷取影格: timestamp={timestamp:.3}s, seek={t0:.3}s+{delta:.3}s");

        let mut args: Vec<String> = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ];

        if t0 > 0.0 {
            args.push("-ss".to_string());
            args.push(format!("{t0:.3}"));
        }

        args.push("-i".to_string());
        args.push(self.info.path.to_string_lossy().to_string());

        if delta > 0.0 {
            args.push("-ss".to_string());
            args.push(format!("{delta:.3}"));
        }

        // 影格不落地，直接以 PNG 形式從 stdout 讀回記憶體
        args.extend([
            "-frames:v".to_string(),
            "1".to_string(),
            "-an".to_string(),
            "-sn".to_string(),
            "-dn".to_string(),
            "-f".to_string(),
            "image2pipe".to_string(),
            "-vcodec".to_string(),
            "png".to_string(),
            "pipe:1".to_string(),
        ]);

        let output = Command::new("ffmpeg")
            .args(&args)
            .output()
            .with_context(|| format!("無法執行 ffmpeg: {}", self.info.path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg 解碼影格失敗 ({timestamp:.3}s): {}", stderr.trim());
        }

        if output.stdout.is_empty() {
            bail!("ffmpeg 沒有輸出影格資料 ({timestamp:.3}s)");
        }

        let frame = image::load_from_memory(&output.stdout)
            .with_context(|| format!("無法解析解碼出的影格 ({timestamp:.3}s)"))?;

        Ok(frame.to_rgb8())
    }
}

/// 使用 ffprobe 取得影片中繼資料
fn probe_video(path: &Path) -> Result<VideoInfo> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .with_context(|| format!("無法執行 ffprobe: {}", path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffprobe 執行失敗: {}", stderr.trim());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let probe: FfprobeOutput =
        serde_json::from_str(&stdout).with_context(|| "無法解析 ffprobe 輸出")?;

    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or_else(|| anyhow::anyhow!("找不到視訊串流: {}", path.display()))?;

    let width = video_stream
        .width
        .ok_or_else(|| anyhow::anyhow!("無法取得影片寬度"))?;
    let height = video_stream
        .height
        .ok_or_else(|| anyhow::anyhow!("無法取得影片高度"))?;

    // 影片長度優先從 format 讀，其次 stream；兩邊都沒有就當 0，
    // 後續所有 seek 都會被 clamp 到 0
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0)
        .max(0.0);

    let fps = video_stream
        .r_frame_rate
        .as_ref()
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        path: path.to_path_buf(),
        duration,
        width,
        height,
        fps,
    })
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}
