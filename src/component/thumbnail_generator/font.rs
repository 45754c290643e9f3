use ab_glyph::FontVec;
use log::debug;
use std::fs;
use std::path::Path;

/// 常見系統字型的候選路徑，照順序試到成功為止
const SYSTEM_FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// 解析要用的向量字型：指定路徑 -> 系統候選字型
///
/// 全部失敗時回傳 None，呼叫端改用內建點陣字型；
/// 字型載入失敗一律靜默降級，絕不讓產圖流程中斷
#[must_use]
pub fn resolve_font(font_path: Option<&Path>) -> Option<FontVec> {
    if let Some(path) = font_path {
        if let Some(font) = load_font_file(path) {
            return Some(font);
        }
        debug!("無法載入指定字型，改用系統字型: {}", path.display());
    }

    SYSTEM_FONT_CANDIDATES
        .iter()
        .find_map(|candidate| load_font_file(Path::new(candidate)))
}

fn load_font_file(path: &Path) -> Option<FontVec> {
    let data = fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_explicit_font_falls_through() {
        // 指定的字型不存在時不能失敗，頂多退到系統字型或 None
        let _ = resolve_font(Some(Path::new("/no/such/font.ttf")));
    }

    #[test]
    fn test_invalid_font_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        std::fs::write(&bogus, b"this is not a font").unwrap();

        assert!(load_font_file(&bogus).is_none());
    }
}
