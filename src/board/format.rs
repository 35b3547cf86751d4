//! # 格式名与原始载荷
//!
//! ## 设计思路
//!
//! 剪贴板上同一份逻辑内容可以同时以多个格式名存在（如 `PNG` + `Bitmap` + `HTML Format`）。
//! 这里用 `FormatName` 新类型包装格式字符串，避免与普通字符串混用；
//! 自定义对象格式由 `FormatRegistry` 根据调用方提供的稳定 key 生成，
//! 不依赖任何类型反射推导出的名字。

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InterchangeError;

/// 剪贴板格式名（区分大小写）。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatName(Cow<'static, str>);

impl FormatName {
    /// 系统原生位图。
    pub const BITMAP: FormatName = FormatName::from_static("Bitmap");
    /// 无文件头的设备无关位图。
    pub const DIB: FormatName = FormatName::from_static("DeviceIndependentBitmap");
    /// 带 14 字节文件头的通用位图文件。
    pub const BMP_FILE: FormatName = FormatName::from_static("image/bmp");
    pub const TIFF: FormatName = FormatName::from_static("TaggedImageFileFormat");
    pub const ENHANCED_METAFILE: FormatName = FormatName::from_static("EnhancedMetafile");
    /// 自定义 PNG 标签。
    pub const PNG: FormatName = FormatName::from_static("PNG");
    /// 自定义 JPG 标签。
    pub const JPG: FormatName = FormatName::from_static("JPG");
    /// 原始文件字节。
    pub const FILE_CONTENTS: FormatName = FormatName::from_static("FileContents");
    /// 文件路径列表（DROPFILES 结构）。
    pub const FILE_DROP: FormatName = FormatName::from_static("FileDrop");
    pub const TEXT: FormatName = FormatName::from_static("Text");
    pub const UNICODE_TEXT: FormatName = FormatName::from_static("UnicodeText");
    /// CF_HTML 文本片段。
    pub const HTML: FormatName = FormatName::from_static("HTML Format");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FormatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FormatName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FormatName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// 单个格式的原始字节载荷，读写双方交换的最小单位。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload {
    pub format: FormatName,
    pub bytes: Vec<u8>,
}

impl RawPayload {
    pub fn new(format: FormatName, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// 自定义对象格式名前缀。
pub const OBJECT_FORMAT_PREFIX: &str = "Object:";

const MAX_OBJECT_KEY_LEN: usize = 200;

/// 基于字符串 key 的自定义格式注册表。
///
/// 调用方注册一个稳定的逻辑 key（例如 `"history-item"`），
/// 注册表返回对应的 `Object:<key>` 格式名；同一个 key 重复注册返回同一个名字。
#[derive(Debug, Default, Clone)]
pub struct FormatRegistry {
    formats: BTreeMap<String, FormatName>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册逻辑 key 并返回格式名。
    ///
    /// key 必须非空、不超过 200 字节且不含控制字符。
    pub fn register(&mut self, key: &str) -> Result<FormatName, InterchangeError> {
        Self::validate_key(key)?;

        if let Some(existing) = self.formats.get(key) {
            return Ok(existing.clone());
        }

        let name = FormatName::new(format!("{}{}", OBJECT_FORMAT_PREFIX, key));
        self.formats.insert(key.to_string(), name.clone());
        log::debug!("🧾 注册自定义格式: {}", name);
        Ok(name)
    }

    /// 查询 key 对应的格式名，不写入注册表。
    ///
    /// 读取路径使用：未注册的 key 照样得到 `Object:<key>`，注册表保持不变。
    pub fn resolve(&self, key: &str) -> Result<FormatName, InterchangeError> {
        Self::validate_key(key)?;
        Ok(match self.formats.get(key) {
            Some(existing) => existing.clone(),
            None => FormatName::new(format!("{}{}", OBJECT_FORMAT_PREFIX, key)),
        })
    }

    pub fn get(&self, key: &str) -> Option<&FormatName> {
        self.formats.get(key)
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    fn validate_key(key: &str) -> Result<(), InterchangeError> {
        if key.trim().is_empty() {
            return Err(InterchangeError::Format("自定义格式 key 不能为空".to_string()));
        }
        if key.len() > MAX_OBJECT_KEY_LEN {
            return Err(InterchangeError::Format(format!(
                "自定义格式 key 过长：{} 字节（限制：{} 字节）",
                key.len(),
                MAX_OBJECT_KEY_LEN
            )));
        }
        if key.chars().any(char::is_control) {
            return Err(InterchangeError::Format("自定义格式 key 含控制字符".to_string()));
        }
        Ok(())
    }
}
