use anyhow::{Result, bail};
use image::RgbImage;
use image::imageops::{self, FilterType};
use log::debug;

/// 把影格按列優先順序排進 rows x columns 的網格畫布
///
/// 格子尺寸以第一張影格為準，其餘影格尺寸不同時先縮放到一致；
/// 超出格數的影格直接捨棄，數量不足時尾端格子留黑
pub fn compose_grid(frames: &[RgbImage], rows: u32, columns: u32) -> Result<RgbImage> {
    let Some(first) = frames.first() else {
        bail!("沒有任何影格可以合併網格縮圖");
    };

    let rows = rows.max(1);
    let columns = columns.max(1);
    let (cell_width, cell_height) = first.dimensions();

    debug!(
        "合併 {} 張影格為 {columns}x{rows} 網格，格子尺寸 {cell_width}x{cell_height}",
        frames.len()
    );

    let mut canvas = RgbImage::new(cell_width * columns, cell_height * rows);

    for (index, frame) in frames.iter().enumerate() {
        let row = index as u32 / columns;
        let column = index as u32 % columns;
        if row >= rows {
            break;
        }

        let x = i64::from(column * cell_width);
        let y = i64::from(row * cell_height);

        if frame.dimensions() == (cell_width, cell_height) {
            imageops::replace(&mut canvas, frame, x, y);
        } else {
            let resized = imageops::resize(frame, cell_width, cell_height, FilterType::Lanczos3);
            imageops::replace(&mut canvas, &resized, x, y);
        }
    }

    Ok(canvas)
}
