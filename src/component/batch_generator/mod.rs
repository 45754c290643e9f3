//! 批次縮圖產生元件

mod main;

pub use main::{BatchGenerator, GenerationResult};
