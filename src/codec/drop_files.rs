//! # 文件列表（DROPFILES）编解码
//!
//! `FileDrop` 格式的字节布局：
//!
//! ```text
//! offset 0   u32  pFiles  文件列表起始偏移（通常为 20）
//! offset 4   i32  pt.x
//! offset 8   i32  pt.y
//! offset 12  u32  fNC
//! offset 16  u32  fWide   非 0 表示 UTF-16LE，否则为单字节编码
//! pFiles..        以 NUL 分隔的路径列表，以连续两个 NUL 结束
//! ```

use std::path::{Path, PathBuf};

pub const DROPFILES_HEADER_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DropFilesError {
    #[error("DROPFILES 数据过短：{0} 字节")]
    Truncated(usize),

    #[error("DROPFILES 文件列表偏移非法：{0}")]
    BadOffset(u32),
}

/// 解析 DROPFILES 结构为路径列表（保持原有顺序）。
pub fn decode_drop_files(bytes: &[u8]) -> Result<Vec<PathBuf>, DropFilesError> {
    if bytes.len() < DROPFILES_HEADER_SIZE {
        return Err(DropFilesError::Truncated(bytes.len()));
    }

    let p_files = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let wide = u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]) != 0;

    let start = p_files as usize;
    if start < DROPFILES_HEADER_SIZE || start > bytes.len() {
        return Err(DropFilesError::BadOffset(p_files));
    }

    let list = &bytes[start..];
    let paths = if wide {
        let units: Vec<u16> = list
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        units
            .split(|&unit| unit == 0)
            .take_while(|segment| !segment.is_empty())
            .map(|segment| PathBuf::from(String::from_utf16_lossy(segment)))
            .collect()
    } else {
        list.split(|&byte| byte == 0)
            .take_while(|segment| !segment.is_empty())
            .map(|segment| PathBuf::from(String::from_utf8_lossy(segment).into_owned()))
            .collect()
    };

    Ok(paths)
}

/// 编码路径列表为宽字符 DROPFILES 结构。
pub fn encode_drop_files<P: AsRef<Path>>(paths: &[P]) -> Vec<u8> {
    let mut out = Vec::with_capacity(DROPFILES_HEADER_SIZE + paths.len() * 64);
    out.extend_from_slice(&(DROPFILES_HEADER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());

    for path in paths {
        let text = path.as_ref().to_string_lossy();
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out.extend_from_slice(&[0, 0]);
    }
    if paths.is_empty() {
        out.extend_from_slice(&[0, 0]);
    }
    out.extend_from_slice(&[0, 0]);
    out
}
