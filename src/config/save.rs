use crate::config::load::SETTINGS_FILE;
use crate::config::types::PersistedSettings;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// 把設定存回工作目錄的 settings.json
pub fn save_settings(settings: &PersistedSettings) -> Result<()> {
    save_settings_to(Path::new(SETTINGS_FILE), settings)
}

/// 存到指定路徑，落地前先套用種子不變式
pub fn save_settings_to(path: &Path, settings: &PersistedSettings) -> Result<()> {
    let mut settings = settings.clone();
    settings.thumbnail.normalize();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("無法建立設定檔目錄: {}", parent.display()))?;
    }

    let content =
        serde_json::to_string_pretty(&settings).context("設定序列化失敗")?;

    fs::write(path, content)
        .with_context(|| format!("無法寫入設定檔: {}", path.display()))?;

    Ok(())
}
