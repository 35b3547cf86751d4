//! # Win32 剪贴板后端
//!
//! ## 实现思路
//!
//! 所有耗时操作（图片解码、DIB 转换）都在 `OpenClipboard` 之前完成，
//! 使 Open→Empty→Set→Close 窗口尽量短。
//!
//! 格式名映射：
//! - `Text`/`UnicodeText`/`DeviceIndependentBitmap`/`TaggedImageFileFormat`/
//!   `EnhancedMetafile`/`FileDrop` 对应系统预定义格式
//! - `Bitmap` 读取时由 `CF_DIB` 补文件头得到 BMP 字节；写入时转换为 `CF_DIB`
//!   （同一批载荷已含 DIB 时跳过，避免重复）
//! - 其余名字一律 `RegisterClipboardFormatW`
//!
//! Win32 剪贴板数据总是在进程退出后保留，`persist_after_exit = false` 仅记录日志。

use std::path::PathBuf;
use std::ptr::copy_nonoverlapping;

use windows::Win32::Foundation::{
    CloseHandle, GlobalFree, HANDLE, HGLOBAL, ERROR_ACCESS_DENIED, ERROR_BUSY,
    ERROR_CLIPBOARD_NOT_OPEN, ERROR_NOT_ENOUGH_MEMORY, ERROR_NOT_ENOUGH_QUOTA,
    ERROR_NO_SYSTEM_RESOURCES, ERROR_OUTOFMEMORY,
};
use windows::Win32::System::DataExchange::{
    CloseClipboard, EmptyClipboard, EnumClipboardFormats, GetClipboardData,
    GetClipboardFormatNameW, GetOpenClipboardWindow, OpenClipboard, RegisterClipboardFormatW,
    SetClipboardData,
};
use windows::Win32::System::Memory::{GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE};
use windows::Win32::System::Ole::{
    CF_BITMAP, CF_DIB, CF_ENHMETAFILE, CF_HDROP, CF_TEXT, CF_TIFF, CF_UNICODETEXT,
};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
};
use windows::Win32::UI::WindowsAndMessaging::GetWindowThreadProcessId;
use windows::core::{PCWSTR, PWSTR};

use super::{format_win32_error_message, hresult_to_win32_code};
use crate::board::{
    BoardError, BoardOwner, BoardReader, ClipboardBackend, FormatName, OwnerProbe, RawPayload,
};
use crate::codec::dib_to_bmp;

/// 预定义格式与格式名的对应关系。
fn predefined_formats() -> [(u32, FormatName); 7] {
    [
        (CF_TEXT.0 as u32, FormatName::TEXT),
        (CF_UNICODETEXT.0 as u32, FormatName::UNICODE_TEXT),
        (CF_BITMAP.0 as u32, FormatName::BITMAP),
        (CF_DIB.0 as u32, FormatName::DIB),
        (CF_TIFF.0 as u32, FormatName::TIFF),
        (CF_ENHMETAFILE.0 as u32, FormatName::ENHANCED_METAFILE),
        (CF_HDROP.0 as u32, FormatName::FILE_DROP),
    ]
}

fn format_id_for(name: &FormatName) -> Result<u32, BoardError> {
    if let Some((id, _)) = predefined_formats().into_iter().find(|(_, known)| known == name) {
        return Ok(id);
    }

    let wide: Vec<u16> = name.as_str().encode_utf16().chain(std::iter::once(0)).collect();
    let id = unsafe { RegisterClipboardFormatW(PCWSTR(wide.as_ptr())) };
    if id == 0 {
        return Err(BoardError::fatal(format!("注册格式 '{}' 失败", name)));
    }
    Ok(id)
}

fn format_name_for(id: u32) -> Option<FormatName> {
    if let Some((_, name)) = predefined_formats().into_iter().find(|(known, _)| *known == id) {
        return Some(name);
    }

    let mut buf = [0u16; 256];
    let len = unsafe { GetClipboardFormatNameW(id, &mut buf) };
    if len <= 0 {
        // 未映射的预定义格式（CF_DIBV5 等）
        return None;
    }
    Some(FormatName::new(String::from_utf16_lossy(&buf[..len as usize])))
}

fn classify_win32_error(
    operation: &str,
    format_name: &str,
    err: &windows::core::Error,
) -> BoardError {
    let code = hresult_to_win32_code(err.code().0);
    let message = format_win32_error_message(operation, format_name, err.code().0, &format!("{:?}", err));

    match code {
        Some(c)
            if c == ERROR_ACCESS_DENIED.0
                || c == ERROR_CLIPBOARD_NOT_OPEN.0
                || c == ERROR_BUSY.0 => BoardError::busy(message),
        Some(c)
            if c == ERROR_NOT_ENOUGH_MEMORY.0
                || c == ERROR_OUTOFMEMORY.0
                || c == ERROR_NO_SYSTEM_RESOURCES.0
                || c == ERROR_NOT_ENOUGH_QUOTA.0 => BoardError::transient(message),
        _ => BoardError::fatal(message),
    }
}

/// 系统剪贴板（Win32）。
pub(crate) struct Win32Board;

/// 打开状态的剪贴板；`Drop` 时关闭。
struct OpenBoard;

impl OpenBoard {
    fn open() -> Result<Self, BoardError> {
        unsafe { OpenClipboard(None) }.map_err(|e| classify_win32_error("打开剪贴板", "N/A", &e))?;
        Ok(Self)
    }
}

impl Drop for OpenBoard {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseClipboard() } {
            log::warn!("⚠️ 关闭剪贴板失败：{:?}", e);
        }
    }
}

struct Win32Reader {
    _open: OpenBoard,
}

impl Win32Reader {
    fn read_global(id: u32) -> Option<Vec<u8>> {
        unsafe {
            let handle = GetClipboardData(id).ok()?;
            let hglobal = HGLOBAL(handle.0);
            let size = GlobalSize(hglobal);
            if size == 0 {
                return None;
            }
            let ptr = GlobalLock(hglobal) as *const u8;
            if ptr.is_null() {
                return None;
            }
            let mut out = vec![0u8; size];
            copy_nonoverlapping(ptr, out.as_mut_ptr(), size);
            let _ = GlobalUnlock(hglobal);
            Some(out)
        }
    }
}

impl BoardReader for Win32Reader {
    fn formats(&self) -> Vec<FormatName> {
        let mut formats = Vec::new();
        let mut id = 0;
        loop {
            id = unsafe { EnumClipboardFormats(id) };
            if id == 0 {
                break;
            }
            if let Some(name) = format_name_for(id) {
                if !formats.contains(&name) {
                    formats.push(name);
                }
            }
        }
        formats
    }

    fn read(&self, format: &FormatName) -> Option<Vec<u8>> {
        if format == &FormatName::BITMAP {
            // 系统会从 CF_BITMAP 合成 CF_DIB，这里再补上文件头
            let dib = Self::read_global(CF_DIB.0 as u32)?;
            return match dib_to_bmp(&dib) {
                Ok(bmp) => Some(bmp),
                Err(err) => {
                    log::debug!("系统位图转换失败：{}", err);
                    None
                }
            };
        }

        if format == &FormatName::ENHANCED_METAFILE {
            // 句柄型数据，不提供字节视图
            return None;
        }

        let id = format_id_for(format).ok()?;
        Self::read_global(id)
    }
}

/// 写入前完成所有转换，得到 (格式 id, 格式名, 字节)。
fn prepare_payloads(payloads: &[RawPayload]) -> Vec<(u32, String, Vec<u8>)> {
    let has_dib = payloads.iter().any(|p| p.format == FormatName::DIB);
    let mut prepared = Vec::with_capacity(payloads.len());

    for payload in payloads {
        if payload.format == FormatName::BITMAP {
            if has_dib {
                continue;
            }
            match bitmap_payload_to_dib(&payload.bytes) {
                Ok(dib) => prepared.push((CF_DIB.0 as u32, "CF_DIB".to_string(), dib)),
                Err(err) => log::warn!("⚠️ Bitmap 载荷无法转换为 DIB，已跳过：{}", err),
            }
            continue;
        }

        match format_id_for(&payload.format) {
            Ok(id) => prepared.push((id, payload.format.to_string(), payload.bytes.clone())),
            Err(err) => log::warn!("⚠️ {}，已跳过", err),
        }
    }

    prepared
}

fn bitmap_payload_to_dib(bytes: &[u8]) -> Result<Vec<u8>, String> {
    if bytes.starts_with(b"BM") {
        return crate::codec::strip_file_header(bytes).map_err(|e| e.to_string());
    }
    let image = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    crate::image_handler::dib_from_image(&image).map_err(|e| e.to_string())
}

/// 将字节写入全局内存并 SetClipboardData。
unsafe fn set_global_data(format_id: u32, format_name: &str, data: &[u8]) -> Result<(), BoardError> {
    unsafe {
        let hglobal = GlobalAlloc(GMEM_MOVEABLE, data.len().max(1))
            .map_err(|e| classify_win32_error("GlobalAlloc", format_name, &e))?;

        let ptr = GlobalLock(hglobal) as *mut u8;
        if ptr.is_null() {
            let _ = GlobalFree(Some(hglobal));
            return Err(BoardError::transient("GlobalLock 返回空指针"));
        }

        copy_nonoverlapping(data.as_ptr(), ptr, data.len());
        let _ = GlobalUnlock(hglobal);

        if let Err(e) = SetClipboardData(format_id, Some(HANDLE(hglobal.0))) {
            let _ = GlobalFree(Some(hglobal));
            return Err(classify_win32_error("SetClipboardData", format_name, &e));
        }
    }

    Ok(())
}

impl ClipboardBackend for Win32Board {
    fn open_read(&self) -> Result<Box<dyn BoardReader + '_>, BoardError> {
        let open = OpenBoard::open()?;
        Ok(Box::new(Win32Reader { _open: open }))
    }

    fn write_all(&self, payloads: &[RawPayload], persist_after_exit: bool) -> Result<(), BoardError> {
        if !persist_after_exit {
            log::debug!("Win32 剪贴板数据在进程退出后仍会保留");
        }

        // ── 预处理阶段（不持有剪贴板）──
        let prepared = prepare_payloads(payloads);

        // ── Open → Empty → Set* → Close ──
        let _open = OpenBoard::open()?;
        unsafe { EmptyClipboard() }.map_err(|e| classify_win32_error("清空剪贴板", "N/A", &e))?;

        for (id, name, bytes) in &prepared {
            unsafe { set_global_data(*id, name, bytes)? };
        }

        log::debug!("📋 Win32 剪贴板写入 {} 个格式", prepared.len());
        Ok(())
    }
}

/// 通过 `GetOpenClipboardWindow` 查询当前持有剪贴板的进程。
pub(crate) struct Win32OwnerProbe;

impl OwnerProbe for Win32OwnerProbe {
    fn current_owner(&self) -> Option<BoardOwner> {
        let hwnd = unsafe { GetOpenClipboardWindow() };
        if hwnd.is_invalid() {
            return None;
        }

        let mut pid = 0u32;
        unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
        if pid == 0 {
            return None;
        }

        let exe_path = query_process_image(pid);
        let process_name = exe_path
            .as_ref()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned());

        Some(BoardOwner {
            pid: Some(pid),
            exe_path,
            process_name,
        })
    }
}

fn query_process_image(pid: u32) -> Option<PathBuf> {
    unsafe {
        let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
        let mut buf = [0u16; 1024];
        let mut size = buf.len() as u32;
        let result = QueryFullProcessImageNameW(
            process,
            PROCESS_NAME_WIN32,
            PWSTR(buf.as_mut_ptr()),
            &mut size,
        );
        let _ = CloseHandle(process);
        result.ok()?;
        Some(PathBuf::from(String::from_utf16_lossy(&buf[..size as usize])))
    }
}
