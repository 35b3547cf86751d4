//! # board-probe
//!
//! 诊断工具：打印系统剪贴板上的格式列表与可解码的图片信息。
//!
//! 用法：`board-probe [settings.json]`

use std::path::PathBuf;
use std::process::ExitCode;

use clipboard_interchange::{ClipboardInterchange, InterchangeConfig, InterchangeError};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ board-probe 失败: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), InterchangeError> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => match InterchangeConfig::load(&path)? {
            Some(config) => {
                log::info!("⚙️ 已加载设置文件 {}", path.display());
                config
            }
            None => {
                log::warn!("⚠️ 设置文件不存在，使用默认配置: {}", path.display());
                InterchangeConfig::default()
            }
        },
        None => InterchangeConfig::default(),
    };

    let interchange = ClipboardInterchange::system(config)?;

    let formats = interchange.list_formats();
    println!("formats ({}):", formats.len());
    for format in &formats {
        println!("  {format}");
    }

    println!("text:  {}", interchange.contains_text());
    println!("image: {}", interchange.contains_image());

    let files = interchange.get_file_drop_list();
    if !files.is_empty() {
        println!("files ({}):", files.len());
        for file in &files {
            println!("  {}", file.display());
        }
    }

    match interchange.get_image() {
        Some(decoded) => println!(
            "best image: {}x{} from {}",
            decoded.width(),
            decoded.height(),
            decoded.source
        ),
        None => println!("best image: none"),
    }

    Ok(())
}
