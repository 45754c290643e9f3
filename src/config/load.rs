use crate::config::types::PersistedSettings;
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

/// 設定檔固定放在工作目錄
pub const SETTINGS_FILE: &str = "settings.json";

/// 載入使用者設定
///
/// 檔案不存在時用預設值；讀得到但解析失敗時記一筆警告後同樣退回預設值，
/// 壞掉的設定檔不應該讓整個程式動不了
#[must_use]
pub fn load_settings() -> PersistedSettings {
    load_settings_from(Path::new(SETTINGS_FILE)).unwrap_or_else(|e| {
        warn!("設定檔載入失敗，改用預設值: {e:#}");
        PersistedSettings::default()
    })
}

/// 從指定路徑載入設定，解析失敗會回傳錯誤
pub fn load_settings_from(path: &Path) -> Result<PersistedSettings> {
    if !path.exists() {
        return Ok(PersistedSettings::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("無法讀取設定檔: {}", path.display()))?;

    let mut settings: PersistedSettings = serde_json::from_str(&content)
        .with_context(|| format!("無法解析設定檔: {}", path.display()))?;

    // 舊版設定檔可能留有關閉隨機後的殘存種子
    settings.thumbnail.normalize();

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_returns_defaults() {
        let settings = load_settings_from(Path::new("/nonexistent/settings.json")).unwrap();
        assert_eq!(settings, PersistedSettings::default());
    }

    #[test]
    fn test_load_normalizes_stale_seed() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"thumbnail": {"randomize": false, "random_seed": 99}}"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.thumbnail.random_seed, None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json at all").unwrap();

        assert!(load_settings_from(&path).is_err());
    }
}
