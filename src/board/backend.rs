//! # 剪贴板原语接口
//!
//! 系统剪贴板只需要提供四个原语：独占打开、列出格式、按格式名读、按格式名写。
//! 其余逻辑（重试、格式协商、编解码）全部建立在这组 trait 之上，
//! 因此同一套流程既能跑在 Win32 上，也能跑在内存剪贴板（测试）上。

use std::path::PathBuf;

use super::{BoardError, FormatName, RawPayload};

/// 系统剪贴板后端。
pub trait ClipboardBackend: Send + Sync {
    /// 独占打开剪贴板用于读取。返回的读取器在 `Drop` 时关闭剪贴板。
    fn open_read(&self) -> Result<Box<dyn BoardReader + '_>, BoardError>;

    /// 在一次独占打开内完成“清空 → 逐格式写入 → 关闭”。
    ///
    /// `persist_after_exit = false` 时，数据在本进程退出后应随之消失。
    fn write_all(&self, payloads: &[RawPayload], persist_after_exit: bool) -> Result<(), BoardError>;
}

/// 一次读取会话内的剪贴板视图。
pub trait BoardReader {
    /// 当前剪贴板上的全部格式名（按后端枚举顺序）。
    fn formats(&self) -> Vec<FormatName>;

    /// 读取指定格式的原始字节；格式不存在时返回 `None`。
    fn read(&self, format: &FormatName) -> Option<Vec<u8>>;
}

/// 剪贴板占用者信息（仅用于诊断日志）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardOwner {
    pub pid: Option<u32>,
    pub exe_path: Option<PathBuf>,
    pub process_name: Option<String>,
}

impl BoardOwner {
    /// 按“可执行文件路径 → 进程名 → 通用提示”的顺序描述占用者。
    pub fn describe(&self) -> String {
        if let Some(path) = &self.exe_path {
            return format!("剪贴板被其他进程占用：{}", path.display());
        }
        if let Some(name) = &self.process_name {
            return format!("剪贴板被其他进程占用：{}", name);
        }
        GENERIC_OWNER_MESSAGE.to_string()
    }
}

pub(crate) const GENERIC_OWNER_MESSAGE: &str = "剪贴板被其他进程占用";

/// 查询当前占用剪贴板的进程。失败时返回 `None`，调用方必须容忍。
pub trait OwnerProbe: Send + Sync {
    fn current_owner(&self) -> Option<BoardOwner>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_description_prefers_path_then_name() {
        let full = BoardOwner {
            pid: Some(42),
            exe_path: Some(PathBuf::from("C:/Tools/grabber.exe")),
            process_name: Some("grabber".to_string()),
        };
        assert!(full.describe().contains("grabber.exe"));

        let name_only = BoardOwner {
            process_name: Some("grabber".to_string()),
            ..BoardOwner::default()
        };
        assert!(name_only.describe().ends_with("grabber"));

        assert_eq!(BoardOwner::default().describe(), GENERIC_OWNER_MESSAGE);
    }
}
