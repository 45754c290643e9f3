use anyhow::{Context, Result, bail};
use std::path::Path;

pub fn validate_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!("{what}不存在: {}", path.display());
    }
    if !path.is_file() {
        bail!("{what}不是檔案: {}", path.display());
    }
    Ok(())
}

pub fn validate_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("無法建立資料夾: {}", path.display()))?;
    }
    Ok(())
}

/// 確保輸出檔案的上層資料夾存在
pub fn ensure_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        ensure_directory_exists(parent)?;
    }
    Ok(())
}
