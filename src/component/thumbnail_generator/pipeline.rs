use super::frame_sampler::{extract_frames, sample_even, sample_random};
use super::grid_composer::compose_grid;
use super::watermark::apply_watermark;
use crate::config::{ThumbnailMode, ThumbnailSettings, WatermarkSettings};
use crate::tools::{
    FfmpegVideoSource, VideoInfo, VideoSource, clamp_timestamp, ensure_parent_directory,
};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbImage};
use log::{debug, info};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// 縮圖產生管線
///
/// 一次呼叫跑完「取樣 ->（網格合併）-> 浮水印 -> 編碼」全流程，
/// 透過同一個回呼回報遞增的整數百分比：取樣佔 0-60、網格合併到 70、
/// 浮水印 80-90、寫檔完成 100。任何階段失敗都立刻中止，不留半成品
pub struct ThumbnailPipeline<S: VideoSource> {
    source: S,
}

impl ThumbnailPipeline<FfmpegVideoSource> {
    /// 開啟影片並建立管線
    pub fn open(video_path: &Path) -> Result<Self> {
        Ok(Self::with_source(FfmpegVideoSource::open(video_path)?))
    }
}

impl<S: VideoSource> ThumbnailPipeline<S> {
    pub const fn with_source(source: S) -> Self {
        Self { source }
    }

    #[must_use]
    pub fn video_info(&self) -> &VideoInfo {
        self.source.info()
    }

    /// 產生縮圖並寫入檔案，回傳實際輸出路徑與合成後的影像
    pub fn generate(
        &self,
        thumbnail: &ThumbnailSettings,
        watermark: &WatermarkSettings,
        mut progress: impl FnMut(u8),
    ) -> Result<(PathBuf, RgbImage)> {
        let image = self.render_image(thumbnail, watermark, &mut progress)?;

        let format = resolve_format(&thumbnail.output_format)?;
        let output_path = resolve_output_path(thumbnail);
        ensure_parent_directory(&output_path)?;

        encode_to_file(&image, &output_path, format)?;
        progress(100);

        info!("縮圖已輸出: {}", output_path.display());
        Ok((output_path, image))
    }

    /// 只合成不落地，預覽用
    pub fn render_image(
        &self,
        thumbnail: &ThumbnailSettings,
        watermark: &WatermarkSettings,
        mut progress: impl FnMut(u8),
    ) -> Result<RgbImage> {
        let base = match thumbnail.mode {
            ThumbnailMode::Single => self.render_single(thumbnail, &mut progress)?,
            ThumbnailMode::Grid => self.render_grid(thumbnail, &mut progress)?,
        };
        progress(80);

        let mut composed = apply_watermark(&base, watermark)?;
        progress(90);

        if let Some((width, height)) = thumbnail.resize_to
            && width > 0
            && height > 0
            && (width, height) != composed.dimensions()
        {
            debug!("輸出前縮放到 {width}x{height}");
            composed = imageops::resize(&composed, width, height, FilterType::Lanczos3);
        }

        Ok(composed)
    }

    fn render_single(
        &self,
        settings: &ThumbnailSettings,
        progress: &mut impl FnMut(u8),
    ) -> Result<RgbImage> {
        let duration = self.source.info().duration;
        let timestamp = clamp_timestamp(settings.timestamp, duration);

        let frame = self
            .source
            .frame_at(timestamp)
            .with_context(|| format!("無法擷取 {timestamp:.3}s 的影格"))?;

        progress(60);
        Ok(frame)
    }

    fn render_grid(
        &self,
        settings: &ThumbnailSettings,
        progress: &mut impl FnMut(u8),
    ) -> Result<RgbImage> {
        let rows = settings.rows.max(1);
        let columns = settings.columns.max(1);
        let count = rows as usize * columns as usize;
        let duration = self.source.info().duration;

        let timestamps = if settings.randomize {
            sample_random(duration, count, settings.random_seed)
        } else {
            sample_even(duration, count)
        };

        // 取樣與擷取佔整體進度的前六成
        let frames = extract_frames(&self.source, &timestamps, &mut |percent| {
            progress((f64::from(percent) * 0.6) as u8);
        })?;

        let grid = compose_grid(&frames, rows, columns)?;
        progress(70);
        Ok(grid)
    }
}

/// 輸出路徑沒有副檔名時補上輸出格式的副檔名
fn resolve_output_path(settings: &ThumbnailSettings) -> PathBuf {
    let path = settings.output_path.clone();
    if path.extension().is_some() {
        return path;
    }
    path.with_extension(settings.output_format.trim().to_lowercase())
}

/// 輸出格式對照：jpg/jpeg 與 png 直接對應，空字串當 png，
/// 其餘名稱當作影像副檔名寬鬆解析，解不開的在這裡（編碼階段）報錯
fn resolve_format(name: &str) -> Result<ImageFormat> {
    let normalized = name.trim().to_lowercase();
    match normalized.as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" | "" => Ok(ImageFormat::Png),
        other => ImageFormat::from_extension(other)
            .ok_or_else(|| anyhow::anyhow!("不支援的輸出格式: {name}")),
    }
}

/// 先在記憶體完成編碼再一次寫檔，編碼失敗不會留下半成品檔案
fn encode_to_file(image: &RgbImage, path: &Path, format: ImageFormat) -> Result<()> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, format)
        .with_context(|| format!("影像編碼失敗 ({format:?})"))?;

    std::fs::write(path, buffer.into_inner())
        .with_context(|| format!("無法寫入輸出檔案: {}", path.display()))?;

    Ok(())
}
