//! # HTML 剪贴板片段（CF_HTML）
//!
//! ## 设计思路
//!
//! CF_HTML 文本以 `Version:0.9` 开头，随后四个（加两个 Selection 镜像）偏移字段，
//! 描述 HTML 文档与可粘贴片段在**字节**层面的起止位置。模板中的偏移占位符
//! （`<<<<<<<1` ~ `<<<<<<<4`）恰好 8 个字符，与 8 位零填充十进制等宽，
//! 因此回填数字不会改变任何已计算出的偏移。
//!
//! ## 实现思路
//!
//! 1. 文本替换 `{width}`/`{height}`/`{mime}`/`{content}`
//! 2. 转为 UTF-8 字节，并按“每字节一个字符”的单字节代码页视角处理，偏移即字节下标
//! 3. 定位 `<HTML>` 之后、`</HTML>`、`<!--StartFragment -->` 之后、`<!--EndFragment -->`
//! 4. 把偏移写回占位符

const START_HTML_TOKEN: &str = "<<<<<<<1";
const END_HTML_TOKEN: &str = "<<<<<<<2";
const START_FRAGMENT_TOKEN: &str = "<<<<<<<3";
const END_FRAGMENT_TOKEN: &str = "<<<<<<<4";

const HTML_OPEN: &[u8] = b"<HTML>";
const HTML_CLOSE: &[u8] = b"</HTML>";
const FRAGMENT_OPEN: &[u8] = b"<!--StartFragment -->";
const FRAGMENT_CLOSE: &[u8] = b"<!--EndFragment -->";

const OFFSET_DIGITS: usize = 8;
const MAX_OFFSET: usize = 99_999_999;

/// 引用本地图片文件的片段模板。
pub const FILE_REFERENCE_TEMPLATE: &str = concat!(
    "Version:0.9\r\n",
    "StartHTML:<<<<<<<1\r\n",
    "EndHTML:<<<<<<<2\r\n",
    "StartFragment:<<<<<<<3\r\n",
    "EndFragment:<<<<<<<4\r\n",
    "StartSelection:<<<<<<<3\r\n",
    "EndSelection:<<<<<<<4\r\n",
    "<!DOCTYPE html>\r\n",
    "<HTML>\r\n",
    "<HEAD>\r\n",
    "<TITLE>Clipboard image</TITLE>\r\n",
    "</HEAD>\r\n",
    "<BODY>\r\n",
    "<!--StartFragment -->\r\n",
    "<img src=\"file:///{content}\" width=\"{width}\" height=\"{height}\">\r\n",
    "<!--EndFragment -->\r\n",
    "</BODY>\r\n",
    "</HTML>",
);

/// 内嵌 data URL 的片段模板。
pub const DATA_URL_TEMPLATE: &str = concat!(
    "Version:0.9\r\n",
    "StartHTML:<<<<<<<1\r\n",
    "EndHTML:<<<<<<<2\r\n",
    "StartFragment:<<<<<<<3\r\n",
    "EndFragment:<<<<<<<4\r\n",
    "StartSelection:<<<<<<<3\r\n",
    "EndSelection:<<<<<<<4\r\n",
    "<!DOCTYPE html>\r\n",
    "<HTML>\r\n",
    "<HEAD>\r\n",
    "<TITLE>Clipboard image</TITLE>\r\n",
    "</HEAD>\r\n",
    "<BODY>\r\n",
    "<!--StartFragment -->\r\n",
    "<img src=\"data:image/{mime};base64,{content}\" width=\"{width}\" height=\"{height}\">\r\n",
    "<!--EndFragment -->\r\n",
    "</BODY>\r\n",
    "</HTML>",
);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FragmentError {
    #[error("模板缺少标记：{0}")]
    MissingMarker(&'static str),

    #[error("模板缺少偏移占位符：{0}")]
    MissingPlaceholder(&'static str),

    #[error("偏移超过 8 位十进制：{0}")]
    OffsetOverflow(usize),
}

/// 四个字节偏移。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentOffsets {
    pub start_html: usize,
    pub end_html: usize,
    pub start_fragment: usize,
    pub end_fragment: usize,
}

impl FragmentOffsets {
    fn locate(bytes: &[u8]) -> Result<Self, FragmentError> {
        let start_html = find_bytes(bytes, HTML_OPEN)
            .ok_or(FragmentError::MissingMarker("<HTML>"))?
            + HTML_OPEN.len();
        let end_html = rfind_bytes(bytes, HTML_CLOSE).ok_or(FragmentError::MissingMarker("</HTML>"))?;
        let start_fragment = find_bytes(bytes, FRAGMENT_OPEN)
            .ok_or(FragmentError::MissingMarker("<!--StartFragment -->"))?
            + FRAGMENT_OPEN.len();
        let end_fragment = find_bytes(bytes, FRAGMENT_CLOSE)
            .ok_or(FragmentError::MissingMarker("<!--EndFragment -->"))?;

        Ok(Self {
            start_html,
            end_html,
            start_fragment,
            end_fragment,
        })
    }

    fn fields(&self) -> [(&'static str, &'static str, usize); 4] {
        [
            ("StartHTML", START_HTML_TOKEN, self.start_html),
            ("EndHTML", END_HTML_TOKEN, self.end_html),
            ("StartFragment", START_FRAGMENT_TOKEN, self.start_fragment),
            ("EndFragment", END_FRAGMENT_TOKEN, self.end_fragment),
        ]
    }
}

/// 已回填偏移的 CF_HTML 文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFragment {
    text: String,
    offsets: FragmentOffsets,
}

impl HtmlFragment {
    pub fn offsets(&self) -> FragmentOffsets {
        self.offsets
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.text.into_bytes()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// 构建引用本地文件的片段。
///
/// 路径中的反斜杠统一为 `/`；开头的 `/`（Unix 绝对路径）去掉，`file:///` 之后不会出现第四个斜杠。
pub fn build_file_reference(
    skeleton: &str,
    width: u32,
    height: u32,
    file_path: &str,
) -> Result<HtmlFragment, FragmentError> {
    let normalized = file_path.replace('\\', "/");
    let content = normalized.trim_start_matches('/');
    build(
        skeleton,
        &[
            ("{width}", &width.to_string()),
            ("{height}", &height.to_string()),
            ("{content}", content),
        ],
    )
}

/// 构建内嵌 data URL 的片段。
pub fn build_data_url(
    skeleton: &str,
    width: u32,
    height: u32,
    mime_subtype: &str,
    base64_data: &str,
) -> Result<HtmlFragment, FragmentError> {
    build(
        skeleton,
        &[
            ("{width}", &width.to_string()),
            ("{height}", &height.to_string()),
            ("{mime}", mime_subtype),
            ("{content}", base64_data),
        ],
    )
}

fn build(skeleton: &str, substitutions: &[(&str, &str)]) -> Result<HtmlFragment, FragmentError> {
    // {content} 放在最后替换，内容里出现的 "{width}" 等不会被二次替换
    let mut text = skeleton.to_string();
    for (placeholder, value) in substitutions {
        text = text.replace(placeholder, value);
    }

    // 按 UTF-8 字节定位：单字节代码页视角下每个字节就是一个字符单元
    let offsets = FragmentOffsets::locate(text.as_bytes())?;

    // 占位符与回填数字都是 8 个 ASCII 字符，回填不改变任何偏移
    for (field, token, value) in offsets.fields() {
        text = write_offset(&text, field, token, value)?;
    }

    log::debug!(
        "🧩 HTML 片段偏移 - StartHTML={} EndHTML={} StartFragment={} EndFragment={}",
        offsets.start_html,
        offsets.end_html,
        offsets.start_fragment,
        offsets.end_fragment
    );

    Ok(HtmlFragment { text, offsets })
}

fn write_offset(
    text: &str,
    field: &'static str,
    token: &'static str,
    value: usize,
) -> Result<String, FragmentError> {
    if value > MAX_OFFSET {
        return Err(FragmentError::OffsetOverflow(value));
    }
    if !text.contains(token) {
        return Err(FragmentError::MissingPlaceholder(field));
    }
    let digits = format!("{:0width$}", value, width = OFFSET_DIGITS);
    Ok(text.replace(token, &digits))
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}
