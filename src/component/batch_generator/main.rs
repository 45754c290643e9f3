use crate::component::thumbnail_generator::ThumbnailPipeline;
use crate::config::{PersistedSettings, ThumbnailMode};
use crate::tools::{
    ensure_directory_exists, scan_video_files, validate_directory_exists, VideoFileInfo,
};
use anyhow::Result;
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 批次產生結果
#[derive(Debug)]
pub struct GenerationResult {
    pub total_videos: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 批次縮圖產生元件
///
/// 掃描資料夾裡的影片，逐一以儲存的預設設定跑縮圖管線；
/// 輸出已存在就跳過，Ctrl-C 會在目前影片處理完後停止
pub struct BatchGenerator {
    settings: PersistedSettings,
    shutdown_signal: Arc<AtomicBool>,
}

impl BatchGenerator {
    pub const fn new(settings: PersistedSettings, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            settings,
            shutdown_signal,
        }
    }

    pub fn run(&self) -> Result<()> {
        println!("{}", style("=== 批次縮圖產生 ===").cyan().bold());

        let input_path = self.prompt_input_path()?;
        let input_dir = PathBuf::from(&input_path);
        validate_directory_exists(&input_dir)?;

        let output_path = self.prompt_output_path()?;
        let output_dir = PathBuf::from(&output_path);
        ensure_directory_exists(&output_dir)?;

        println!("{}", style("掃描影片檔案中...").dim());
        let video_files = scan_video_files(&input_dir)?;

        if video_files.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(());
        }

        println!(
            "{}",
            style(format!(
                "找到 {} 個影片檔案，依檔案大小排序（由小到大）",
                video_files.len()
            ))
            .green()
        );

        for (index, file) in video_files.iter().enumerate() {
            let size_mb = file.size as f64 / 1024.0 / 1024.0;
            println!(
                "  {}. {} ({:.2} MB)",
                index + 1,
                file.path.file_name().unwrap_or_default().to_string_lossy(),
                size_mb
            );
        }

        println!();
        println!("{}", style("開始產生縮圖...").cyan());

        let result = self.process_videos(&video_files, &output_dir)?;
        self.print_summary(&result);

        Ok(())
    }

    fn prompt_input_path(&self) -> Result<String> {
        let path: String = Input::new()
            .with_prompt("請輸入影片資料夾路徑")
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn prompt_output_path(&self) -> Result<String> {
        let path: String = Input::new()
            .with_prompt("請輸入縮圖輸出資料夾路徑")
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn process_videos(
        &self,
        videos: &[VideoFileInfo],
        output_dir: &Path,
    ) -> Result<GenerationResult> {
        let mut successful = 0;
        let mut failed = 0;
        let mut skipped = 0;

        let extension = output_extension(&self.settings.thumbnail.output_format);

        for (index, video) in videos.iter().enumerate() {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                warn!("收到中斷訊號，停止批次處理");
                break;
            }

            let video_name = video.path.file_stem().map_or_else(
                || format!("video_{index}"),
                |s| s.to_string_lossy().to_string(),
            );

            println!(
                "\n{} [{}/{}] {}",
                style("處理中").cyan(),
                index + 1,
                videos.len(),
                style(&video_name).bold()
            );

            let output_path = output_dir.join(format!("{video_name}_thumbnail.{extension}"));
            if output_path.exists() {
                println!("  {} 縮圖已存在，跳過", style("⤳").dim());
                skipped += 1;
                continue;
            }

            match self.process_single_video(&video.path, &output_path) {
                Ok(()) => {
                    println!("  {} 縮圖已建立", style("✓").green());
                    successful += 1;
                }
                Err(e) => {
                    error!("處理影片失敗 {video_name}: {e}");
                    println!("  {} 處理失敗: {}", style("✗").red(), e);
                    failed += 1;
                }
            }
        }

        Ok(GenerationResult {
            total_videos: videos.len(),
            successful,
            failed,
            skipped,
        })
    }

    fn process_single_video(&self, video_path: &Path, output_path: &Path) -> Result<()> {
        let pipeline = ThumbnailPipeline::open(video_path)?;

        let mut thumbnail = self.settings.thumbnail.clone();
        thumbnail.output_path = output_path.to_path_buf();

        // 批次模式的單張時間戳一律取各影片自己的中點
        if thumbnail.mode == ThumbnailMode::Single {
            thumbnail.timestamp = pipeline.video_info().duration / 2.0;
        }

        let progress_bar = ProgressBar::new(100);
        progress_bar.set_style(
            ProgressStyle::with_template("  {bar:40.cyan/blue} {pos:>3}%")?
                .progress_chars("█▓░"),
        );

        let result = pipeline.generate(&thumbnail, &self.settings.watermark, |percent| {
            progress_bar.set_position(u64::from(percent));
        });
        progress_bar.finish_and_clear();

        let (output_path, _) = result?;
        info!("縮圖已建立: {}", output_path.display());

        Ok(())
    }

    fn print_summary(&self, result: &GenerationResult) {
        println!();
        println!("{}", style("=== 批次產生摘要 ===").cyan().bold());
        println!("  總計: {} 個影片", result.total_videos);
        println!("  成功: {} 個", style(result.successful).green());

        if result.skipped > 0 {
            println!("  跳過: {} 個", style(result.skipped).yellow());
        }

        if result.failed > 0 {
            println!("  失敗: {} 個", style(result.failed).red());
        }

        info!(
            "批次產生完成 - 成功: {}, 跳過: {}, 失敗: {}",
            result.successful, result.skipped, result.failed
        );
    }
}

/// 批次輸出檔名用的副檔名，認不得的格式退回 jpg
fn output_extension(format: &str) -> String {
    let normalized = format.trim().to_lowercase();
    match normalized.as_str() {
        "png" => "png".to_string(),
        "jpg" | "jpeg" | "" => "jpg".to_string(),
        other => other.to_string(),
    }
}
