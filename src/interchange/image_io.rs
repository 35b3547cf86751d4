//! 图片读写：解码链 / 编码链的入口。

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;

use super::ClipboardInterchange;
use crate::error::InterchangeError;
use crate::image_handler::{self, ClipboardFormatsConfig, DecodedImage, DecodedImages};

impl ClipboardInterchange {
    /// 按优先级解码剪贴板上的一张图片；没有图片或剪贴板不可用时返回 `None`。
    pub fn get_image(&self) -> Option<DecodedImage> {
        let config = self.config_snapshot();
        self.guard
            .read_with_policy(config.retry_policy(), |snapshot| {
                image_handler::decode_best(snapshot, &config.image)
            })
            .flatten()
    }

    /// 解码剪贴板上的全部图片（直接图片格式优先，其次是文件列表中的图片文件）。
    pub fn get_images(&self) -> DecodedImages {
        let config = self.config_snapshot();
        self.guard
            .read_with_policy(config.retry_policy(), |snapshot| {
                image_handler::decode_all(snapshot, &config.image)
            })
            .unwrap_or_else(DecodedImages::empty)
    }

    /// 按配置的格式集合复制图片。
    pub fn copy_image(&self, image: &DynamicImage) -> Result<(), InterchangeError> {
        let config = self.config_snapshot();
        self.copy_image_with_formats(image, &config.clipboard_formats)
    }

    /// 按指定格式集合复制图片（不修改已保存的配置）。
    pub fn copy_image_with_formats(
        &self,
        image: &DynamicImage,
        formats: &ClipboardFormatsConfig,
    ) -> Result<(), InterchangeError> {
        let config = self.config_snapshot();
        let started = Instant::now();

        image_handler::encode(
            &self.guard,
            config.retry_policy(),
            image,
            formats,
            &config.image,
        )?;

        log::debug!("⏱️ 图片复制耗时 {}ms", started.elapsed().as_millis());
        Ok(())
    }

    /// 读取本地图片文件并复制。
    pub fn copy_image_from_file(&self, path: &Path) -> Result<(), InterchangeError> {
        let config = self.config_snapshot();
        let load_start = Instant::now();
        let image = image_handler::load_image_file(path, &config.image)?;
        log::debug!(
            "📂 已加载图片文件 {}（{}ms）",
            path.display(),
            load_start.elapsed().as_millis()
        );
        self.copy_image(&image)
    }
}
