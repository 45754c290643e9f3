//! 影片縮圖產生元件
//!
//! 管線四階段：
//! A. 依模式取樣時間點（均勻或隨機）
//! B. 依序從影片來源擷取影格
//! C. 網格模式合併成單張畫布
//! D. 套用浮水印並編碼輸出

mod font;
mod frame_sampler;
mod grid_composer;
mod main;
mod pipeline;
mod watermark;

pub use frame_sampler::{extract_frames, sample_even, sample_random};
pub use grid_composer::compose_grid;
pub use main::ThumbnailGenerator;
pub use pipeline::ThumbnailPipeline;
pub use watermark::apply_watermark;
