//! 文本、文件列表、自定义对象与清空。

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ClipboardInterchange;
use crate::board::{FormatName, RawPayload};
use crate::codec::text::{decode_ansi_text, decode_unicode_text, encode_ansi_text, encode_unicode_text};
use crate::codec::encode_drop_files;
use crate::error::InterchangeError;

impl ClipboardInterchange {
    /// 写入文本（同时提供 `UnicodeText` 与 `Text`）。
    pub fn copy_text(&self, text: &str) -> Result<(), InterchangeError> {
        let payloads = [
            RawPayload::new(FormatName::UNICODE_TEXT, encode_unicode_text(text)),
            RawPayload::new(FormatName::TEXT, encode_ansi_text(text)),
        ];
        self.write(&payloads, true)?;
        log::info!("✅ 文本已写入剪贴板（{} 字符）", text.chars().count());
        Ok(())
    }

    /// 读取文本，优先 `UnicodeText`。
    pub fn get_text(&self) -> Option<String> {
        self.read(|snapshot| {
            if snapshot.contains(&FormatName::UNICODE_TEXT) {
                if let Some(bytes) = snapshot.read(&FormatName::UNICODE_TEXT) {
                    return Some(decode_unicode_text(&bytes));
                }
            }
            if snapshot.contains(&FormatName::TEXT) {
                return snapshot
                    .read(&FormatName::TEXT)
                    .map(|bytes| decode_ansi_text(&bytes));
            }
            None
        })
        .flatten()
    }

    /// 写入文件路径列表。
    pub fn copy_file_drop_list<P: AsRef<Path>>(&self, paths: &[P]) -> Result<(), InterchangeError> {
        if paths.is_empty() {
            return Err(InterchangeError::Format("文件列表为空".to_string()));
        }
        let payload = RawPayload::new(FormatName::FILE_DROP, encode_drop_files(paths));
        self.write(&[payload], true)?;
        log::info!("✅ 已复制 {} 个文件路径", paths.len());
        Ok(())
    }

    /// 读取文件路径列表；不存在或损坏时为空。
    pub fn get_file_drop_list(&self) -> Vec<PathBuf> {
        self.read(|snapshot| snapshot.file_drop_list())
            .unwrap_or_default()
    }

    /// 为逻辑 key 注册自定义格式名（`Object:<key>`）。
    pub fn register_format(&self, key: &str) -> Result<FormatName, InterchangeError> {
        let mut registry = match self.registry.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("格式注册表锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        };
        registry.register(key)
    }

    /// 以 JSON 写入自定义对象；进程退出后不保留。
    pub fn copy_object<T: Serialize>(&self, key: &str, value: &T) -> Result<(), InterchangeError> {
        let format = self.register_format(key)?;
        let bytes = serde_json::to_vec(value)?;
        self.write(&[RawPayload::new(format.clone(), bytes)], false)?;
        log::debug!("🧾 自定义对象已写入 {}", format);
        Ok(())
    }

    /// 读取自定义对象；格式不存在或剪贴板不可用时返回 `Ok(None)`。
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, InterchangeError> {
        // 只查不注册，读取任意 key 不会让注册表增长
        let format = match self.registry.read() {
            Ok(registry) => registry.resolve(key)?,
            Err(poisoned) => {
                log::warn!("格式注册表锁中毒，继续使用恢复数据");
                poisoned.into_inner().resolve(key)?
            }
        };
        let bytes = self
            .read(|snapshot| {
                if snapshot.contains(&format) {
                    snapshot.read(&format)
                } else {
                    None
                }
            })
            .flatten();

        match bytes {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// 清空剪贴板。
    pub fn clear(&self) -> Result<(), InterchangeError> {
        self.write(&[], true)?;
        log::info!("🧹 剪贴板已清空");
        Ok(())
    }
}
