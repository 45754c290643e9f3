use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 縮圖模式
///
/// 設定檔中以小寫字串表示，未知的模式在解析階段直接報錯
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailMode {
    Single,
    Grid,
}

impl fmt::Display for ThumbnailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

/// 浮水印種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatermarkKind {
    None,
    Text,
    Image,
}

impl fmt::Display for WatermarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// 浮水印位置
///
/// 每個名稱對應基底圖寬高的錨點比例；設定檔裡的未知名稱一律回退為置中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    Center,
    BottomLeft,
    BottomRight,
}

impl WatermarkPosition {
    pub const ALL: [Self; 5] = [
        Self::TopLeft,
        Self::TopRight,
        Self::Center,
        Self::BottomLeft,
        Self::BottomRight,
    ];

    /// 錨點佔基底圖寬高的比例 (x, y)
    #[must_use]
    pub const fn anchor_fraction(self) -> (f64, f64) {
        match self {
            Self::TopLeft => (0.05, 0.05),
            Self::TopRight => (0.95, 0.05),
            Self::Center => (0.5, 0.5),
            Self::BottomLeft => (0.05, 0.95),
            Self::BottomRight => (0.95, 0.95),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::Center => "center",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }

    /// 解析位置名稱，認不得的一律當作置中
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "top-left" => Self::TopLeft,
            "top-right" => Self::TopRight,
            "bottom-left" => Self::BottomLeft,
            "bottom-right" => Self::BottomRight,
            _ => Self::Center,
        }
    }
}

impl From<String> for WatermarkPosition {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<WatermarkPosition> for String {
    fn from(position: WatermarkPosition) -> Self {
        position.as_str().to_string()
    }
}

impl fmt::Display for WatermarkPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 縮圖產生設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailSettings {
    pub mode: ThumbnailMode,
    /// 單張模式的擷取時間點（秒）
    pub timestamp: f64,
    pub rows: u32,
    pub columns: u32,
    pub randomize: bool,
    /// 只有 randomize 開啟且已抽過種子時才有值
    pub random_seed: Option<u64>,
    pub output_path: PathBuf,
    pub output_format: String,
    /// 輸出前把成品另外縮放到指定尺寸
    pub resize_to: Option<(u32, u32)>,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            mode: ThumbnailMode::Single,
            timestamp: 0.0,
            rows: 2,
            columns: 3,
            randomize: false,
            random_seed: None,
            output_path: PathBuf::from("thumbnail.jpg"),
            output_format: "jpg".to_string(),
            resize_to: None,
        }
    }
}

impl ThumbnailSettings {
    /// 維持不變式：關閉隨機取樣時種子必須清空
    pub fn normalize(&mut self) {
        if !self.randomize {
            self.random_seed = None;
        }
    }
}

/// 浮水印設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatermarkSettings {
    pub kind: WatermarkKind,
    /// 不透明度 0-100
    pub opacity: u8,
    pub position: WatermarkPosition,

    // 文字浮水印
    pub text: String,
    pub font_path: Option<PathBuf>,
    pub font_size: u32,
    /// 十六進位色碼，例如 "#FFFFFF"
    pub color: String,

    // 圖片浮水印
    pub image_path: Option<PathBuf>,
    /// 浮水印寬度佔基底圖寬度的比例 0.05-1.0
    pub scale: f64,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            kind: WatermarkKind::None,
            opacity: 50,
            position: WatermarkPosition::Center,
            text: String::new(),
            font_path: None,
            font_size: 48,
            color: "#FFFFFF".to_string(),
            image_path: None,
            scale: 0.3,
        }
    }
}

/// 寫進 settings.json 的完整設定，固定只有 thumbnail 與 watermark 兩個區塊
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub thumbnail: ThumbnailSettings,
    pub watermark: WatermarkSettings,
}
