pub mod load;
pub mod save;
pub mod types;

pub use types::{
    PersistedSettings, ThumbnailMode, ThumbnailSettings, WatermarkKind, WatermarkPosition,
    WatermarkSettings,
};
