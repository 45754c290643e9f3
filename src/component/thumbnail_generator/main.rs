use super::pipeline::ThumbnailPipeline;
use crate::config::save::save_settings;
use crate::config::{
    PersistedSettings, ThumbnailMode, WatermarkKind, WatermarkPosition,
};
use crate::tools::validate_file_exists;
use anyhow::Result;
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::Rng;
use std::path::{Path, PathBuf};

/// 互動式縮圖產生元件
///
/// 流程：選影片 -> 顯示影片資訊 -> 以儲存的預設值逐項詢問設定 ->
/// 跑管線並顯示進度 -> 視需要把這次設定存成預設值
pub struct ThumbnailGenerator {
    settings: PersistedSettings,
}

impl ThumbnailGenerator {
    pub const fn new(settings: PersistedSettings) -> Self {
        Self { settings }
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style("=== 影片縮圖產生 ===").cyan().bold());

        let video_path = self.prompt_video_path()?;
        let pipeline = ThumbnailPipeline::open(&video_path)?;

        let info = pipeline.video_info();
        println!(
            "  {} {:.2}s | {} | {:.2} fps",
            style("影片資訊:").dim(),
            info.duration,
            info.resolution(),
            info.fps
        );
        let duration = info.duration;

        println!();
        self.prompt_thumbnail_settings(&video_path, duration)?;
        self.prompt_watermark_settings()?;

        println!();
        println!("{}", style("開始產生縮圖...").cyan());

        let progress_bar = ProgressBar::new(100);
        progress_bar.set_style(
            ProgressStyle::with_template("  {bar:40.cyan/blue} {pos:>3}%")?
                .progress_chars("█▓░"),
        );

        let result = pipeline.generate(
            &self.settings.thumbnail,
            &self.settings.watermark,
            |percent| progress_bar.set_position(u64::from(percent)),
        );
        progress_bar.finish_and_clear();

        let (output_path, image) = result?;
        println!(
            "  {} 縮圖已建立: {} ({}x{})",
            style("✓").green(),
            output_path.display(),
            image.width(),
            image.height()
        );

        let save = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("要把這次設定存成預設值嗎?")
            .default(false)
            .interact()?;
        if save {
            save_settings(&self.settings)?;
            println!("  {}", style("設定已儲存").green());
        }

        Ok(())
    }

    fn prompt_video_path(&self) -> Result<PathBuf> {
        let path: String = Input::new()
            .with_prompt("請輸入影片檔案路徑")
            .interact_text()?;
        let path = PathBuf::from(path.trim());

        validate_file_exists(&path, "影片檔案")?;
        Ok(path)
    }

    fn prompt_thumbnail_settings(&mut self, video_path: &Path, duration: f64) -> Result<()> {
        let thumbnail = &mut self.settings.thumbnail;

        let modes = [ThumbnailMode::Single, ThumbnailMode::Grid];
        let mode_index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("縮圖模式")
            .items(&["單張縮圖", "網格縮圖"])
            .default(modes.iter().position(|m| *m == thumbnail.mode).unwrap_or(0))
            .interact()?;
        thumbnail.mode = modes[mode_index];

        match thumbnail.mode {
            ThumbnailMode::Single => {
                let default_timestamp = if duration > 0.0 { duration / 2.0 } else { 0.0 };
                thumbnail.timestamp = Input::new()
                    .with_prompt("擷取時間點（秒）")
                    .default(default_timestamp)
                    .validate_with(|value: &f64| {
                        if *value >= 0.0 {
                            Ok(())
                        } else {
                            Err("時間點不能是負數")
                        }
                    })
                    .interact_text()?;
            }
            ThumbnailMode::Grid => {
                thumbnail.rows = Input::new()
                    .with_prompt("列數")
                    .default(thumbnail.rows)
                    .validate_with(|value: &u32| {
                        if (1..=10).contains(value) {
                            Ok(())
                        } else {
                            Err("必須在 1-10 之間")
                        }
                    })
                    .interact_text()?;
                thumbnail.columns = Input::new()
                    .with_prompt("欄數")
                    .default(thumbnail.columns)
                    .validate_with(|value: &u32| {
                        if (1..=10).contains(value) {
                            Ok(())
                        } else {
                            Err("必須在 1-10 之間")
                        }
                    })
                    .interact_text()?;

                thumbnail.randomize = Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt("隨機取樣影格?")
                    .default(thumbnail.randomize)
                    .interact()?;

                // 種子只在隨機模式剛開啟時抽一次，之後重複產圖沿用同一顆，
                // 關掉隨機就清掉，下次開啟會換新種子
                if thumbnail.randomize {
                    if thumbnail.random_seed.is_none() {
                        let seed: u64 = rand::rng().random();
                        thumbnail.random_seed = Some(seed);
                        info!("本次隨機取樣種子: {seed}");
                    }
                } else {
                    thumbnail.normalize();
                }
            }
        }

        let formats = ["jpg", "png"];
        let format_index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("輸出格式")
            .items(&formats)
            .default(if thumbnail.output_format == "png" { 1 } else { 0 })
            .interact()?;
        thumbnail.output_format = formats[format_index].to_string();

        let stem = video_path.file_stem().map_or_else(
            || "thumbnail".to_string(),
            |s| s.to_string_lossy().to_string(),
        );
        let default_output = video_path
            .with_file_name(format!("{stem}_thumbnail.{}", thumbnail.output_format));
        let output: String = Input::new()
            .with_prompt("輸出檔案路徑")
            .default(default_output.to_string_lossy().to_string())
            .interact_text()?;
        thumbnail.output_path = PathBuf::from(output.trim());

        let resize = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("輸出前另外縮放尺寸?")
            .default(thumbnail.resize_to.is_some())
            .interact()?;
        thumbnail.resize_to = if resize {
            let (default_width, default_height) = thumbnail.resize_to.unwrap_or((1280, 720));
            let width: u32 = Input::new()
                .with_prompt("縮放寬度")
                .default(default_width)
                .validate_with(|value: &u32| if *value > 0 { Ok(()) } else { Err("必須大於 0") })
                .interact_text()?;
            let height: u32 = Input::new()
                .with_prompt("縮放高度")
                .default(default_height)
                .validate_with(|value: &u32| if *value > 0 { Ok(()) } else { Err("必須大於 0") })
                .interact_text()?;
            Some((width, height))
        } else {
            None
        };

        Ok(())
    }

    fn prompt_watermark_settings(&mut self) -> Result<()> {
        let watermark = &mut self.settings.watermark;

        let kinds = [WatermarkKind::None, WatermarkKind::Text, WatermarkKind::Image];
        let kind_index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("浮水印")
            .items(&["無", "文字", "圖片"])
            .default(kinds.iter().position(|k| *k == watermark.kind).unwrap_or(0))
            .interact()?;
        watermark.kind = kinds[kind_index];

        if watermark.kind == WatermarkKind::None {
            return Ok(());
        }

        watermark.opacity = Input::new()
            .with_prompt("不透明度 (0-100)")
            .default(watermark.opacity)
            .validate_with(|value: &u8| {
                if *value <= 100 {
                    Ok(())
                } else {
                    Err("必須在 0-100 之間")
                }
            })
            .interact_text()?;

        let position_items: Vec<&str> = WatermarkPosition::ALL
            .iter()
            .map(|p| p.as_str())
            .collect();
        let position_index = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("位置")
            .items(&position_items)
            .default(
                WatermarkPosition::ALL
                    .iter()
                    .position(|p| *p == watermark.position)
                    .unwrap_or(2),
            )
            .interact()?;
        watermark.position = WatermarkPosition::ALL[position_index];

        match watermark.kind {
            WatermarkKind::Text => {
                watermark.text = Input::new()
                    .with_prompt("浮水印文字")
                    .default(watermark.text.clone())
                    .allow_empty(true)
                    .interact_text()?;

                let font: String = Input::new()
                    .with_prompt("字型檔路徑（留空用系統字型）")
                    .default(
                        watermark
                            .font_path
                            .as_ref()
                            .map_or_else(String::new, |p| p.to_string_lossy().to_string()),
                    )
                    .allow_empty(true)
                    .interact_text()?;
                let font = font.trim();
                watermark.font_path = (!font.is_empty()).then(|| PathBuf::from(font));

                watermark.font_size = Input::new()
                    .with_prompt("字級")
                    .default(watermark.font_size)
                    .validate_with(|value: &u32| {
                        if (8..=200).contains(value) {
                            Ok(())
                        } else {
                            Err("必須在 8-200 之間")
                        }
                    })
                    .interact_text()?;

                watermark.color = Input::new()
                    .with_prompt("文字顏色（十六進位色碼）")
                    .default(watermark.color.clone())
                    .interact_text()?;
            }
            WatermarkKind::Image => {
                let path: String = Input::new()
                    .with_prompt("浮水印圖片路徑")
                    .default(
                        watermark
                            .image_path
                            .as_ref()
                            .map_or_else(String::new, |p| p.to_string_lossy().to_string()),
                    )
                    .interact_text()?;
                watermark.image_path = Some(PathBuf::from(path.trim()));

                let percent: u32 = Input::new()
                    .with_prompt("寬度比例 (5-100%)")
                    .default((watermark.scale * 100.0).round() as u32)
                    .validate_with(|value: &u32| {
                        if (5..=100).contains(value) {
                            Ok(())
                        } else {
                            Err("必須在 5-100 之間")
                        }
                    })
                    .interact_text()?;
                watermark.scale = f64::from(percent) / 100.0;
            }
            WatermarkKind::None => unreachable!(),
        }

        Ok(())
    }
}
