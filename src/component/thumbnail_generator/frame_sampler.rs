use crate::tools::VideoSource;
use anyhow::{Context, Result};
use image::RgbImage;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 均勻取樣時間點
///
/// count == 1 時取影片中點；count > 1 時把影片切成 count+1 等分，
/// 取每個內部分段的結尾，刻意避開開頭與結尾的黑幕和轉場影格
#[must_use]
pub fn sample_even(duration: f64, count: usize) -> Vec<f64> {
    if duration <= 0.0 || count == 0 {
        return vec![0.0];
    }

    if count == 1 {
        return vec![duration / 2.0];
    }

    let step = duration / (count + 1) as f64;
    (0..count)
        .map(|i| ((i + 1) as f64 * step).min(duration))
        .collect()
}

/// 隨機取樣時間點
///
/// 有種子時結果可重現；取樣後一律遞增排序，
/// 網格的格子順序必須跟影片時間順序一致
#[must_use]
pub fn sample_random(duration: f64, count: usize, seed: Option<u64>) -> Vec<f64> {
    if duration <= 0.0 || count == 0 {
        return vec![0.0];
    }

    let mut timestamps = match seed {
        Some(seed) => draw_uniform(&mut StdRng::seed_from_u64(seed), duration, count),
        None => draw_uniform(&mut rand::rng(), duration, count),
    };

    timestamps.sort_by(|a, b| a.partial_cmp(b).unwrap());
    timestamps
}

fn draw_uniform<R: Rng>(rng: &mut R, duration: f64, count: usize) -> Vec<f64> {
    (0..count).map(|_| rng.random_range(0.0..duration)).collect()
}

/// 依序從影片來源擷取影格
///
/// 每取得一張就回報一次整數百分比；任何一張失敗都讓整批失敗，
/// 不會回傳不完整的影格列表
pub fn extract_frames(
    source: &dyn VideoSource,
    timestamps: &[f64],
    progress: &mut dyn FnMut(u8),
) -> Result<Vec<RgbImage>> {
    let total = timestamps.len();
    let mut frames = Vec::with_capacity(total);

    for (index, &timestamp) in timestamps.iter().enumerate() {
        let frame = source
            .frame_at(timestamp)
            .with_context(|| format!("無法擷取 {timestamp:.3}s 的影格"))?;
        frames.push(frame);

        let percent = ((index + 1) as f64 / total as f64 * 100.0).round() as u8;
        progress(percent);
    }

    Ok(frames)
}
