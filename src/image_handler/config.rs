//! # 配置模块
//!
//! ## 设计思路
//!
//! 将图片链路的“可调策略”集中到两个结构：
//! - `ImageConfig`：解码资源上限、特殊 DIB 读取开关、HTML 片段图片目录
//! - `ClipboardFormatsConfig`：写入剪贴板时要生成的格式集合
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的配置。
//! - `OutgoingFormat` 负责格式字符串解析与反向输出（大小写不敏感）。
//! - `ClipboardFormatsConfig` 保持调用方给出的顺序并去重；HTML 与 HTMLDATAURL 互斥，HTML 优先。

use serde::{Deserialize, Serialize};

use super::ImageError;

/// 图片处理配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageConfig {
    /// 从文件复制图片时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 启用压缩 DIB 的补文件头读取路径。
    pub use_alternative_dib_reader: bool,
    /// HTML 片段引用的图片文件目录；为空时使用系统临时目录。
    pub fragment_dir: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            use_alternative_dib_reader: false,
            fragment_dir: None,
        }
    }
}

/// 写入剪贴板时可生成的格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutgoingFormat {
    #[serde(rename = "BITMAP")]
    Bitmap,
    #[serde(rename = "DIB")]
    Dib,
    #[serde(rename = "PNG")]
    Png,
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "HTMLDATAURL")]
    HtmlDataUrl,
}

impl OutgoingFormat {
    /// 从外部字符串解析格式。
    ///
    /// # 示例
    /// ```rust
    /// use clipboard_interchange::image_handler::OutgoingFormat;
    ///
    /// let f = OutgoingFormat::parse("htmlDataUrl")?;
    /// assert_eq!(f, OutgoingFormat::HtmlDataUrl);
    /// # Ok::<(), clipboard_interchange::image_handler::ImageError>(())
    /// ```
    pub fn parse(name: &str) -> Result<Self, ImageError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "BITMAP" => Ok(Self::Bitmap),
            "DIB" => Ok(Self::Dib),
            "PNG" => Ok(Self::Png),
            "HTML" => Ok(Self::Html),
            "HTMLDATAURL" => Ok(Self::HtmlDataUrl),
            other => Err(ImageError::InvalidFormat(format!(
                "未知剪贴板格式：{}（可选：BITMAP / DIB / PNG / HTML / HTMLDATAURL）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bitmap => "BITMAP",
            Self::Dib => "DIB",
            Self::Png => "PNG",
            Self::Html => "HTML",
            Self::HtmlDataUrl => "HTMLDATAURL",
        }
    }
}

/// HTML 片段的生成方式（二选一）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlVariant {
    /// 引用磁盘上的图片文件。
    FileReference,
    /// 内嵌 base64 data URL。
    DataUrl,
}

/// 写入格式集合（保序、去重）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<OutgoingFormat>", into = "Vec<OutgoingFormat>")]
pub struct ClipboardFormatsConfig {
    formats: Vec<OutgoingFormat>,
}

impl ClipboardFormatsConfig {
    pub fn new(formats: impl IntoIterator<Item = OutgoingFormat>) -> Self {
        let mut deduped = Vec::new();
        for format in formats {
            if !deduped.contains(&format) {
                deduped.push(format);
            }
        }
        Self { formats: deduped }
    }

    /// 从字符串列表解析（如设置文件中的 `["PNG", "html"]`）。
    pub fn parse<S: AsRef<str>>(names: &[S]) -> Result<Self, ImageError> {
        let formats = names
            .iter()
            .map(|name| OutgoingFormat::parse(name.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(formats))
    }

    pub fn contains(&self, format: OutgoingFormat) -> bool {
        self.formats.contains(&format)
    }

    pub fn iter(&self) -> impl Iterator<Item = OutgoingFormat> + '_ {
        self.formats.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// 两者都请求时 HTML 优先。
    pub fn html_variant(&self) -> Option<HtmlVariant> {
        if self.contains(OutgoingFormat::Html) {
            Some(HtmlVariant::FileReference)
        } else if self.contains(OutgoingFormat::HtmlDataUrl) {
            Some(HtmlVariant::DataUrl)
        } else {
            None
        }
    }
}

impl Default for ClipboardFormatsConfig {
    fn default() -> Self {
        Self::new([OutgoingFormat::Bitmap, OutgoingFormat::Png, OutgoingFormat::Dib])
    }
}

impl From<Vec<OutgoingFormat>> for ClipboardFormatsConfig {
    fn from(formats: Vec<OutgoingFormat>) -> Self {
        Self::new(formats)
    }
}

impl From<ClipboardFormatsConfig> for Vec<OutgoingFormat> {
    fn from(config: ClipboardFormatsConfig) -> Self {
        config.formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_keep_order_and_drop_duplicates() {
        let config = ClipboardFormatsConfig::new([
            OutgoingFormat::Png,
            OutgoingFormat::Dib,
            OutgoingFormat::Png,
        ]);
        let formats: Vec<_> = config.iter().collect();
        assert_eq!(formats, vec![OutgoingFormat::Png, OutgoingFormat::Dib]);
    }

    #[test]
    fn html_wins_over_data_url() {
        let both = ClipboardFormatsConfig::new([OutgoingFormat::HtmlDataUrl, OutgoingFormat::Html]);
        assert_eq!(both.html_variant(), Some(HtmlVariant::FileReference));

        let data_only = ClipboardFormatsConfig::new([OutgoingFormat::HtmlDataUrl]);
        assert_eq!(data_only.html_variant(), Some(HtmlVariant::DataUrl));

        assert_eq!(ClipboardFormatsConfig::default().html_variant(), None);
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        let config = ClipboardFormatsConfig::parse(&["png", " Html ", "BITMAP"]).expect("valid names");
        assert!(config.contains(OutgoingFormat::Png));
        assert!(config.contains(OutgoingFormat::Html));
        assert!(config.contains(OutgoingFormat::Bitmap));

        assert!(ClipboardFormatsConfig::parse(&["GIF"]).is_err());
    }

    #[test]
    fn serde_uses_upper_case_names() {
        let config: ClipboardFormatsConfig =
            serde_json::from_str(r#"["PNG","HTMLDATAURL","PNG"]"#).expect("valid json");
        assert_eq!(
            config.iter().collect::<Vec<_>>(),
            vec![OutgoingFormat::Png, OutgoingFormat::HtmlDataUrl]
        );
        assert_eq!(
            serde_json::to_string(&config).expect("serialize"),
            r#"["PNG","HTMLDATAURL"]"#
        );
    }

    #[test]
    fn image_config_defaults_disable_special_dib_reader() {
        let config: ImageConfig = serde_json::from_str("{}").expect("defaults");
        assert!(!config.use_alternative_dib_reader);
        assert_eq!(config.max_decoded_pixels, 40_000_000);
    }
}
