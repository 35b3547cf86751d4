//! # 系统剪贴板后端选择
//!
//! - Windows：Win32 原生实现（任意格式名、DIB/位图互转、占用者探测）
//! - 其他平台：回退到 arboard（仅文本与位图）
//!
//! 错误分类（Busy / Transient / Fatal）与日志字段格式与平台无关，放在这里统一测试。
//!
//! ## 错误日志字段约定（Windows）
//!
//! - `format`: 失败的剪贴板格式（如 `PNG`、`CF_DIB`）
//! - `hr`: 原始 HRESULT（十六进制）
//! - `code`: 从 HRESULT 解析出的 Win32 错误码（若可解析）
//! - `hint`: 内置错误语义提示

use std::sync::Arc;

use super::{ClipboardBackend, OwnerProbe};

#[cfg(target_os = "windows")]
mod win32;

#[cfg(not(target_os = "windows"))]
mod fallback;

/// 当前平台的系统剪贴板后端。
pub(crate) fn system_backend() -> Arc<dyn ClipboardBackend> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(win32::Win32Board)
    }

    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(fallback::ArboardBoard)
    }
}

/// 当前平台的占用者探测器；平台不支持时为 `None`。
pub(crate) fn system_owner_probe() -> Option<Arc<dyn OwnerProbe>> {
    #[cfg(target_os = "windows")]
    {
        Some(Arc::new(win32::Win32OwnerProbe))
    }

    #[cfg(not(target_os = "windows"))]
    {
        None
    }
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn hresult_to_win32_code(hr: i32) -> Option<u32> {
    let value = hr as u32;
    if (value & 0xFFFF_0000) == 0x8007_0000 {
        Some(value & 0xFFFF)
    } else {
        None
    }
}

#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn format_win32_error_message(
    operation: &str,
    format_name: &str,
    hr: i32,
    detail: &str,
) -> String {
    let code = hresult_to_win32_code(hr);
    let code_str = code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let hint = win32_error_hint(code);
    format!(
        "{}失败: format={} hr=0x{:08X} code={} hint={} detail={}",
        operation,
        format_name,
        hr as u32,
        code_str,
        hint,
        detail
    )
}

fn win32_error_hint(code: Option<u32>) -> &'static str {
    #[cfg(target_os = "windows")]
    {
        use windows::Win32::Foundation::{
            ERROR_ACCESS_DENIED, ERROR_BUSY, ERROR_CLIPBOARD_NOT_OPEN, ERROR_NOT_ENOUGH_MEMORY,
            ERROR_NOT_ENOUGH_QUOTA, ERROR_NO_SYSTEM_RESOURCES, ERROR_OUTOFMEMORY,
        };

        match code {
            Some(c) if c == ERROR_ACCESS_DENIED.0 => "剪贴板被其他进程占用或权限不足",
            Some(c) if c == ERROR_CLIPBOARD_NOT_OPEN.0 => "剪贴板句柄未打开或已失效",
            Some(c) if c == ERROR_BUSY.0 => "系统忙，资源暂不可用",
            Some(c) if c == ERROR_NOT_ENOUGH_MEMORY.0 => "内存不足",
            Some(c) if c == ERROR_OUTOFMEMORY.0 => "系统报告内存耗尽",
            Some(c) if c == ERROR_NO_SYSTEM_RESOURCES.0 => "系统资源不足",
            Some(c) if c == ERROR_NOT_ENOUGH_QUOTA.0 => "进程配额不足",
            Some(_) => "未分类 Win32 错误",
            None => "无法从 HRESULT 解析 Win32 错误码",
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        match code {
            Some(_) => "未分类 Win32 错误",
            None => "无法从 HRESULT 解析 Win32 错误码",
        }
    }
}
