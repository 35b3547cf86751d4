//! # 运行时配置
//!
//! ## 设计思路
//!
//! `InterchangeConfig` 汇总访问重试、解码上限与输出格式集合，
//! 由外层应用解析好后整体交给 `ClipboardInterchange`。
//! 外层设置文件是 JSON，字段 camelCase，缺省字段取默认值。
//!
//! ## 实现思路
//!
//! - `validate` 做区间校验，非法配置不会进入运行时。
//! - `load` 在文件不存在时返回 `Ok(None)`，由调用方决定是否使用默认值。

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::board::{RetryPolicy, DEFAULT_ACCESS_ATTEMPTS, DEFAULT_ACCESS_RETRY_DELAY_MS};
use crate::error::InterchangeError;
use crate::image_handler::{ClipboardFormatsConfig, ImageConfig};

/// 剪贴板交换配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterchangeConfig {
    /// 获取剪贴板的总尝试次数。
    pub access_attempts: u32,
    /// 两次尝试之间的固定等待（毫秒）。
    pub access_retry_delay_ms: u64,
    /// 解码与片段相关配置。
    pub image: ImageConfig,
    /// 复制图片时生成的格式。
    pub clipboard_formats: ClipboardFormatsConfig,
}

impl Default for InterchangeConfig {
    fn default() -> Self {
        Self {
            access_attempts: DEFAULT_ACCESS_ATTEMPTS,
            access_retry_delay_ms: DEFAULT_ACCESS_RETRY_DELAY_MS,
            image: ImageConfig::default(),
            clipboard_formats: ClipboardFormatsConfig::default(),
        }
    }
}

impl InterchangeConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.access_attempts,
            delay: Duration::from_millis(self.access_retry_delay_ms),
        }
    }

    /// 区间校验。
    pub fn validate(&self) -> Result<(), InterchangeError> {
        if !(1..=10).contains(&self.access_attempts) {
            return Err(InterchangeError::Settings("accessAttempts 必须在 1~10 之间".to_string()));
        }
        if self.access_retry_delay_ms > 5_000 {
            return Err(InterchangeError::Settings(
                "accessRetryDelayMs 不能大于 5000 毫秒".to_string(),
            ));
        }
        if self.image.max_decoded_pixels == 0 {
            return Err(InterchangeError::Settings("maxDecodedPixels 不能为 0".to_string()));
        }
        if self.image.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(InterchangeError::Settings("maxDecodedBytes 不能小于 8MB".to_string()));
        }
        if self.image.max_file_size == 0 {
            return Err(InterchangeError::Settings("maxFileSize 不能为 0".to_string()));
        }
        if self.clipboard_formats.is_empty() {
            return Err(InterchangeError::Settings("clipboardFormats 至少需要一个格式".to_string()));
        }
        Ok(())
    }

    /// 从已解析的设置 JSON 构建并校验。
    pub fn from_value(value: serde_json::Value) -> Result<Self, InterchangeError> {
        let config: Self = serde_json::from_value(value)
            .map_err(|e| InterchangeError::Settings(format!("解析设置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 读取设置文件；文件不存在返回 `Ok(None)`。
    pub fn load(path: &Path) -> Result<Option<Self>, InterchangeError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let value = serde_json::from_str::<serde_json::Value>(&content)
            .map_err(|e| InterchangeError::Settings(format!("解析设置文件失败: {}", e)))?;

        Self::from_value(value).map(Some)
    }

    pub fn save(&self, path: &Path) -> Result<(), InterchangeError> {
        self.validate()?;
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| InterchangeError::Settings(format!("序列化设置失败: {}", e)))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, content)?;
        Ok(())
    }
}
