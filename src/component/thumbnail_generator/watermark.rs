use super::font::resolve_font;
use crate::config::{WatermarkKind, WatermarkSettings};
use ab_glyph::{Font, FontVec, Glyph, GlyphId, PxScale, Rect, ScaleFont, point};
use anyhow::Result;
use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use log::debug;

/// 浮水印與畫布邊緣保留的邊距（像素）
const EDGE_MARGIN: f64 = 16.0;

/// 最小可用字級
const MIN_FONT_SIZE: u32 = 8;

/// 把浮水印套用到基底圖上，永遠回傳新影像，不動輸入
///
/// 設定不完整時視同沒有浮水印，原樣複製：種類為 none、
/// 不透明度為零、文字全空白、圖檔路徑沒設或不存在
pub fn apply_watermark(base: &RgbImage, settings: &WatermarkSettings) -> Result<RgbImage> {
    if settings.kind == WatermarkKind::None || settings.opacity == 0 {
        return Ok(base.clone());
    }

    let overlay = match settings.kind {
        WatermarkKind::Text => render_text_overlay(settings),
        WatermarkKind::Image => load_image_overlay(base.width(), settings),
        WatermarkKind::None => None,
    };

    let Some(overlay) = overlay else {
        return Ok(base.clone());
    };

    Ok(composite_overlay(base, &overlay, settings))
}

/// 把浮水印點陣圖疊到同尺寸的透明圖層，再整層合成回基底並壓平成三通道
fn composite_overlay(
    base: &RgbImage,
    overlay: &RgbaImage,
    settings: &WatermarkSettings,
) -> RgbImage {
    let (base_width, base_height) = base.dimensions();

    let (fraction_x, fraction_y) = settings.position.anchor_fraction();
    let anchor = (
        f64::from(base_width) * fraction_x,
        f64::from(base_height) * fraction_y,
    );

    let (center_x, center_y) =
        constrain_center(anchor, (base_width, base_height), overlay.dimensions());

    // 錨點語意：浮水印自身的中心對齊到錨點
    let left = (center_x - f64::from(overlay.width()) / 2.0).round() as i64;
    let top = (center_y - f64::from(overlay.height()) / 2.0).round() as i64;

    let mut layer = RgbaImage::new(base_width, base_height);
    imageops::overlay(&mut layer, overlay, left, top);

    let mut combined: RgbaImage = image::DynamicImage::ImageRgb8(base.clone()).to_rgba8();
    imageops::overlay(&mut combined, &layer, 0, 0);

    image::DynamicImage::ImageRgba8(combined).to_rgb8()
}

/// 把錨點往內收，讓浮水印整個落在邊距以內
///
/// 當浮水印連邊距都塞不下時，該軸收斂到畫布中線，讓溢出左右對稱
fn constrain_center(
    center: (f64, f64),
    base_size: (u32, u32),
    overlay_size: (u32, u32),
) -> (f64, f64) {
    let (base_width, base_height) = (f64::from(base_size.0), f64::from(base_size.1));
    let half_width = f64::from(overlay_size.0) / 2.0;
    let half_height = f64::from(overlay_size.1) / 2.0;

    let mut min_x = EDGE_MARGIN + half_width;
    let mut max_x = base_width - EDGE_MARGIN - half_width;
    let mut min_y = EDGE_MARGIN + half_height;
    let mut max_y = base_height - EDGE_MARGIN - half_height;

    if min_x > max_x {
        min_x = base_width / 2.0;
        max_x = min_x;
    }
    if min_y > max_y {
        min_y = base_height / 2.0;
        max_y = min_y;
    }

    (center.0.clamp(min_x, max_x), center.1.clamp(min_y, max_y))
}

/// 覆蓋率乘上不透明度換算成最終 alpha
fn coverage_alpha(coverage: f32, opacity: u8) -> u8 {
    let opacity = f32::from(opacity.min(100)) / 100.0;
    (coverage.clamp(0.0, 1.0) * opacity * 255.0).round() as u8
}

/// 解析 "#RRGGBB"、"RRGGBB" 或 "#RGB" 形式的色碼
fn parse_hex_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }

    match hex.len() {
        6 => {
            let red = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let green = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let blue = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb([red, green, blue]))
        }
        3 => {
            let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v * 17);
            Some(Rgb([
                channel(&hex[0..1])?,
                channel(&hex[1..2])?,
                channel(&hex[2..3])?,
            ]))
        }
        _ => None,
    }
}

/// 把文字渲染成緊貼內容邊界的透明點陣圖
///
/// 回傳 None 代表沒有可見內容（空字串或量不出任何字形邊界）
fn render_text_overlay(settings: &WatermarkSettings) -> Option<RgbaImage> {
    let text = settings.text.trim();
    if text.is_empty() {
        return None;
    }

    let color = parse_hex_color(&settings.color).unwrap_or(Rgb([255, 255, 255]));
    let size = settings.font_size.max(MIN_FONT_SIZE);

    match resolve_font(settings.font_path.as_deref()) {
        Some(font) => render_vector_text(text, &font, size, color, settings.opacity),
        None => render_bitmap_text(text, size, color, settings.opacity),
    }
}

/// 以向量字型排版並光柵化文字
///
/// 第一輪沿基線排版收集字形外框，算出整段文字的緊貼邊界；
/// 第二輪把每個字形的覆蓋率轉成 alpha 畫進點陣圖
fn render_vector_text(
    text: &str,
    font: &FontVec,
    size: u32,
    color: Rgb<u8>,
    opacity: u8,
) -> Option<RgbaImage> {
    let scale = PxScale::from(size as f32);
    let scaled = font.as_scaled(scale);
    let ascent = scaled.ascent();

    let mut caret = 0.0f32;
    let mut previous: Option<GlyphId> = None;
    let mut outlines = Vec::new();
    let mut bounds: Option<Rect> = None;

    for ch in text.chars() {
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, glyph_id);
        }

        let glyph: Glyph = glyph_id.with_scale_and_position(scale, point(caret, ascent));
        caret += scaled.h_advance(glyph_id);
        previous = Some(glyph_id);

        if let Some(outlined) = font.outline_glyph(glyph) {
            let px_bounds = outlined.px_bounds();
            bounds = Some(match bounds {
                Some(merged) => Rect {
                    min: point(
                        merged.min.x.min(px_bounds.min.x),
                        merged.min.y.min(px_bounds.min.y),
                    ),
                    max: point(
                        merged.max.x.max(px_bounds.max.x),
                        merged.max.y.max(px_bounds.max.y),
                    ),
                },
                None => px_bounds,
            });
            outlines.push(outlined);
        }
    }

    let bounds = bounds?;
    let width = (bounds.max.x - bounds.min.x).ceil().max(1.0) as u32;
    let height = (bounds.max.y - bounds.min.y).ceil().max(1.0) as u32;
    let mut bitmap = RgbaImage::new(width, height);

    for outlined in &outlines {
        let px_bounds = outlined.px_bounds();
        let offset_x = (px_bounds.min.x - bounds.min.x).round() as i64;
        let offset_y = (px_bounds.min.y - bounds.min.y).round() as i64;

        outlined.draw(|x, y, coverage| {
            let alpha = coverage_alpha(coverage, opacity);
            if alpha == 0 {
                return;
            }

            let target_x = offset_x + i64::from(x);
            let target_y = offset_y + i64::from(y);
            if target_x < 0
                || target_y < 0
                || target_x >= i64::from(width)
                || target_y >= i64::from(height)
            {
                return;
            }

            // 字形重疊時保留較深的一筆
            let pixel = bitmap.get_pixel_mut(target_x as u32, target_y as u32);
            if alpha > pixel[3] {
                *pixel = Rgba([color[0], color[1], color[2], alpha]);
            }
        });
    }

    Some(bitmap)
}

/// 內建 8x8 點陣字型的最終退路，整數倍放大到接近要求的字級
///
/// 點陣字型只涵蓋基本 ASCII，涵蓋外的字元以空格呈現
fn render_bitmap_text(text: &str, size: u32, color: Rgb<u8>, opacity: u8) -> Option<RgbaImage> {
    let scale = (size / 8).max(1);
    let glyph_size = 8 * scale;
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return None;
    }

    let width = glyph_size * chars.len() as u32;
    let mut bitmap = RgbaImage::new(width, glyph_size);
    let alpha = coverage_alpha(1.0, opacity);

    for (index, ch) in chars.iter().enumerate() {
        let Some(glyph) = BASIC_FONTS.get(*ch) else {
            continue;
        };

        let origin_x = index as u32 * glyph_size;
        for (row, row_bits) in glyph.iter().enumerate() {
            for column in 0..8u32 {
                if row_bits & (1 << column) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        bitmap.put_pixel(
                            origin_x + column * scale + dx,
                            row as u32 * scale + dy,
                            Rgba([color[0], color[1], color[2], alpha]),
                        );
                    }
                }
            }
        }
    }

    Some(bitmap)
}

/// 載入圖片浮水印並縮放調整 alpha
///
/// 路徑沒設、檔案不存在或讀不出影像時回傳 None，當作沒有浮水印
fn load_image_overlay(base_width: u32, settings: &WatermarkSettings) -> Option<RgbaImage> {
    let path = settings.image_path.as_deref()?;
    if !path.exists() {
        return None;
    }

    let watermark = match image::open(path) {
        Ok(img) => img.to_rgba8(),
        Err(e) => {
            debug!("無法載入浮水印圖片 {}: {e}", path.display());
            return None;
        }
    };

    Some(prepare_image_overlay(
        &watermark,
        base_width,
        settings.scale,
        settings.opacity,
    ))
}

/// 等比縮放到基底寬度的指定比例，再把不透明度乘進原有的 alpha
///
/// 乘法調整保留浮水印本身的透明區域，不會把透明處也塗上顏色
fn prepare_image_overlay(
    watermark: &RgbaImage,
    base_width: u32,
    scale: f64,
    opacity: u8,
) -> RgbaImage {
    let scale = scale.clamp(0.05, 1.0);
    let target_width = ((f64::from(base_width) * scale) as u32).max(1);
    let factor = f64::from(target_width) / f64::from(watermark.width());
    let target_height = ((f64::from(watermark.height()) * factor) as u32).max(1);

    let mut resized = imageops::resize(watermark, target_width, target_height, FilterType::Lanczos3);

    let opacity = f64::from(opacity.min(100)) / 100.0;
    if opacity < 1.0 {
        for pixel in resized.pixels_mut() {
            pixel[3] = (f64::from(pixel[3]) * opacity).round() as u8;
        }
    }

    resized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatermarkPosition;
    use image::Rgba;
    use tempfile::TempDir;

    fn base_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([30, 60, 90]))
    }

    fn text_settings(text: &str, opacity: u8, position: WatermarkPosition) -> WatermarkSettings {
        WatermarkSettings {
            kind: WatermarkKind::Text,
            opacity,
            position,
            text: text.to_string(),
            font_size: 16,
            ..Default::default()
        }
    }

    #[test]
    fn test_none_kind_returns_identical_image() {
        let base = base_image(64, 48);
        let settings = WatermarkSettings::default();

        let result = apply_watermark(&base, &settings).unwrap();
        assert_eq!(result, base);
    }

    #[test]
    fn test_zero_opacity_is_a_no_op() {
        let base = base_image(64, 48);
        let settings = text_settings("SAMPLE", 0, WatermarkPosition::Center);

        let result = apply_watermark(&base, &settings).unwrap();
        assert_eq!(result, base);
    }

    #[test]
    fn test_blank_text_is_a_no_op() {
        let base = base_image(64, 48);
        let settings = text_settings("   ", 80, WatermarkPosition::Center);

        let result = apply_watermark(&base, &settings).unwrap();
        assert_eq!(result, base);
    }

    #[test]
    fn test_missing_image_path_is_a_no_op() {
        let base = base_image(64, 48);
        let settings = WatermarkSettings {
            kind: WatermarkKind::Image,
            opacity: 80,
            image_path: Some("/no/such/watermark.png".into()),
            ..Default::default()
        };

        let result = apply_watermark(&base, &settings).unwrap();
        assert_eq!(result, base);
    }

    #[test]
    fn test_text_watermark_changes_pixels_within_margin() {
        let base = base_image(400, 200);

        for position in WatermarkPosition::ALL {
            let settings = text_settings("Hi", 100, position);
            let result = apply_watermark(&base, &settings).unwrap();

            assert_eq!(result.dimensions(), base.dimensions());

            let mut changed = 0usize;
            for (x, y, pixel) in result.enumerate_pixels() {
                if pixel != base.get_pixel(x, y) {
                    changed += 1;
                    assert!(
                        (16..384).contains(&x) && (16..184).contains(&y),
                        "位置 {position} 的浮水印越界: ({x}, {y})"
                    );
                }
            }
            assert!(changed > 0, "位置 {position} 的浮水印應該有畫出東西");
        }
    }

    #[test]
    fn test_text_watermark_color_applied() {
        let base = RgbImage::from_pixel(300, 120, Rgb([0, 0, 0]));
        let mut settings = text_settings("X", 100, WatermarkPosition::Center);
        settings.color = "#FF0000".to_string();

        let result = apply_watermark(&base, &settings).unwrap();

        // 完整不透明度下，筆畫核心應該出現接近純紅的像素
        let has_red = result
            .pixels()
            .any(|p| p[0] > 200 && p[1] < 60 && p[2] < 60);
        assert!(has_red, "應該畫出紅色文字");
    }

    #[test]
    fn test_constrain_center_inside_range_unchanged() {
        let center = constrain_center((100.0, 50.0), (400, 200), (40, 20));
        assert!((center.0 - 100.0).abs() < 1e-9);
        assert!((center.1 - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_constrain_center_clamps_to_margin() {
        // 錨點 (20, 10) 太靠左上，得往內收到邊距加上半寬高
        let center = constrain_center((20.0, 10.0), (400, 200), (40, 20));
        assert!((center.0 - 36.0).abs() < 1e-9);
        assert!((center.1 - 26.0).abs() < 1e-9);

        let center = constrain_center((395.0, 195.0), (400, 200), (40, 20));
        assert!((center.0 - 364.0).abs() < 1e-9);
        assert!((center.1 - 174.0).abs() < 1e-9);
    }

    #[test]
    fn test_constrain_center_oversized_collapses_to_midline() {
        // 浮水印比基底加邊距還大，軸向收斂到中線
        let center = constrain_center((10.0, 10.0), (100, 100), (120, 30));
        assert!((center.0 - 50.0).abs() < 1e-9);
        assert!((center.1 - 31.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_hex_color_variants() {
        assert_eq!(parse_hex_color("#FFCC00"), Some(Rgb([255, 204, 0])));
        assert_eq!(parse_hex_color("00ff00"), Some(Rgb([0, 255, 0])));
        assert_eq!(parse_hex_color("#F0A"), Some(Rgb([255, 0, 170])));
        assert_eq!(parse_hex_color("not-a-color"), None);
        assert_eq!(parse_hex_color(""), None);
        assert_eq!(parse_hex_color("#紅紅紅"), None);
    }

    #[test]
    fn test_coverage_alpha() {
        assert_eq!(coverage_alpha(1.0, 100), 255);
        assert_eq!(coverage_alpha(1.0, 50), 128);
        assert_eq!(coverage_alpha(0.0, 100), 0);
        assert_eq!(coverage_alpha(0.5, 100), 128);
    }

    #[test]
    fn test_bitmap_text_dimensions() {
        let bitmap = render_bitmap_text("ABC", 16, Rgb([255, 255, 255]), 100).unwrap();
        // 字級 16 -> 兩倍放大的 8x8 格子
        assert_eq!(bitmap.dimensions(), (48, 16));
    }

    #[test]
    fn test_prepare_image_overlay_scales_to_base_width() {
        let watermark = RgbaImage::from_pixel(200, 100, Rgba([255, 0, 0, 255]));
        let overlay = prepare_image_overlay(&watermark, 400, 0.5, 100);

        assert_eq!(overlay.dimensions(), (200, 100));

        let overlay = prepare_image_overlay(&watermark, 400, 0.25, 100);
        assert_eq!(overlay.dimensions(), (100, 50));
    }

    #[test]
    fn test_prepare_image_overlay_clamps_scale() {
        let watermark = RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 255]));

        // 比例低於 0.05 收到 0.05，高於 1.0 收到 1.0
        let overlay = prepare_image_overlay(&watermark, 400, 0.01, 100);
        assert_eq!(overlay.width(), 20);

        let overlay = prepare_image_overlay(&watermark, 400, 3.0, 100);
        assert_eq!(overlay.width(), 400);
    }

    #[test]
    fn test_prepare_image_overlay_multiplies_existing_alpha() {
        let watermark = RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 128]));
        let overlay = prepare_image_overlay(&watermark, 80, 0.5, 50);

        // 原有 alpha 128 乘上 50% 不透明度
        assert_eq!(overlay.get_pixel(20, 20)[3], 64);
    }

    #[test]
    fn test_image_watermark_from_file_stays_within_margin() {
        let dir = TempDir::new().unwrap();
        let watermark_path = dir.path().join("mark.png");
        RgbaImage::from_pixel(60, 30, Rgba([255, 255, 0, 255]))
            .save(&watermark_path)
            .unwrap();

        let base = base_image(400, 200);
        let settings = WatermarkSettings {
            kind: WatermarkKind::Image,
            opacity: 100,
            position: WatermarkPosition::BottomRight,
            image_path: Some(watermark_path),
            scale: 0.1,
            ..Default::default()
        };

        let result = apply_watermark(&base, &settings).unwrap();

        let mut changed = 0usize;
        for (x, y, pixel) in result.enumerate_pixels() {
            if pixel != base.get_pixel(x, y) {
                changed += 1;
                assert!(
                    (16..384).contains(&x) && (16..184).contains(&y),
                    "圖片浮水印越界: ({x}, {y})"
                );
            }
        }
        assert!(changed > 0, "圖片浮水印應該有畫出東西");
    }

    #[test]
    fn test_watermark_never_mutates_base() {
        let base = base_image(200, 100);
        let snapshot = base.clone();
        let settings = text_settings("SAMPLE", 70, WatermarkPosition::BottomRight);

        let _ = apply_watermark(&base, &settings).unwrap();
        assert_eq!(base, snapshot);
    }
}
