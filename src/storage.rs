//! HTML 片段图片目录管理模块
//!
//! # 设计思路
//!
//! `HTML Format` 的文件引用变体需要一张落盘的图片，供粘贴目标通过 `file:///` 读取。
//! 这里统一管理该目录，支持调用方自定义，并在目录不存在时自动创建。
//!
//! # 实现思路
//!
//! - 优先使用配置中的自定义目录。
//! - 未设置时回退到系统临时目录下的 `clipboard-interchange` 子目录。
//! - 所有可能失败的操作均返回 `Result`，不使用 `expect()` / `unwrap()`。

use std::fs;
use std::path::PathBuf;

use chrono::Local;

use crate::error::InterchangeError;

const DEFAULT_DIR_NAME: &str = "clipboard-interchange";

/// 获取片段图片目录
///
/// # 参数
/// * `custom_dir` - 自定义目录（可选，空字符串视为未设置）
///
/// # 返回
/// - `Ok(PathBuf)`：可用的目录
/// - `Err(InterchangeError::Storage)`：无法创建目录
pub fn fragment_dir(custom_dir: Option<&str>) -> Result<PathBuf, InterchangeError> {
    if let Some(dir) = custom_dir {
        if !dir.is_empty() {
            let path = PathBuf::from(dir);
            if !path.exists() {
                fs::create_dir_all(&path).map_err(|e| {
                    InterchangeError::Storage(format!("创建自定义目录 '{}' 失败: {}", dir, e))
                })?;
            }
            return Ok(path);
        }
    }

    let dir = std::env::temp_dir().join(DEFAULT_DIR_NAME);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .map_err(|e| InterchangeError::Storage(format!("创建临时目录失败: {}", e)))?;
    }
    Ok(dir)
}

/// 生成带时间戳的片段图片路径（不创建文件）。
pub fn fragment_file_path(custom_dir: Option<&str>) -> Result<PathBuf, InterchangeError> {
    let timestamp = Local::now().format("%Y%m%d%H%M%S%f");
    let file_name = format!("clip_{}.png", timestamp);
    Ok(fragment_dir(custom_dir)?.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_dir_is_created_on_demand() {
        let dir = std::env::temp_dir()
            .join("clipboard-interchange-tests")
            .join(format!("custom-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let resolved = fragment_dir(dir.to_str()).expect("custom dir should be created");
        assert_eq!(resolved, dir);
        assert!(dir.is_dir());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_custom_dir_falls_back_to_temp() {
        let resolved = fragment_dir(Some("")).expect("temp dir should be usable");
        assert!(resolved.ends_with(DEFAULT_DIR_NAME));
    }

    #[test]
    fn fragment_files_are_timestamped_pngs() {
        let path = fragment_file_path(None).expect("path");
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("clip_"));
        assert!(name.ends_with(".png"));
    }
}
