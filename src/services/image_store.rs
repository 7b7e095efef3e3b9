//! Image Store
//!
//! 订单附件图片的本地存储。上传内容统一校验并重编码为 JPEG 后落盘，
//! 文件名为 UUID，生命周期跟随订单：创建时写入、编辑时替换、删除时移除。
//!
//! 图片写入在订单行提交之前完成，失败时订单不会携带悬空的 `image_ref`。

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::fs;

use uuid::Uuid;

use crate::utils::{AppError, AppResult};

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// JPEG quality (85% - keeps receipts/product photos legible at modest size)
const JPEG_QUALITY: u8 = 85;

/// 基于文件系统的图片存储
#[derive(Debug, Clone)]
pub struct ImageStore {
    images_dir: PathBuf,
}

impl ImageStore {
    /// 在 `work_dir/uploads/images` 下创建存储
    pub fn new(work_dir: &Path) -> AppResult<Self> {
        let images_dir = work_dir.join("uploads/images");
        fs::create_dir_all(&images_dir)
            .map_err(|e| AppError::internal(format!("Failed to create images directory: {}", e)))?;
        Ok(Self { images_dir })
    }

    /// 校验、压缩并写入图片，返回存储引用 (文件名)
    pub fn store(&self, data: &[u8]) -> AppResult<String> {
        if data.is_empty() {
            return Err(AppError::validation("Empty image provided".to_string()));
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(AppError::validation(format!(
                "Image too large. Maximum size is {}MB",
                MAX_FILE_SIZE / 1024 / 1024
            )));
        }

        // Verify it's actually an image by loading it
        let img = image::load_from_memory(data)
            .map_err(|e| AppError::validation(format!("Invalid image: {}", e)))?;

        // Re-encode as JPEG with quality setting
        let mut buffer = Vec::new();
        {
            let mut cursor = Cursor::new(&mut buffer);
            let rgb_img = img.to_rgb8();
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
            rgb_img
                .write_with_encoder(encoder)
                .map_err(|e| AppError::internal(format!("Failed to compress image: {}", e)))?;
        }

        let image_ref = format!("{}.jpg", Uuid::new_v4());
        let file_path = self.images_dir.join(&image_ref);
        fs::write(&file_path, &buffer)
            .map_err(|e| AppError::internal(format!("Failed to save image: {}", e)))?;

        tracing::info!(image_ref = %image_ref, size = buffer.len(), "Image stored");
        Ok(image_ref)
    }

    /// 读取图片内容
    pub fn fetch(&self, image_ref: &str) -> AppResult<Vec<u8>> {
        let path = self.resolve(image_ref)?;
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Image {} not found", image_ref))
            } else {
                AppError::internal(format!("Failed to read image {}: {}", image_ref, e))
            }
        })
    }

    /// 删除图片；文件已不存在视为成功
    pub fn delete(&self, image_ref: &str) -> AppResult<()> {
        let path = self.resolve(image_ref)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(image_ref = %image_ref, "Image already removed");
                Ok(())
            }
            Err(e) => Err(AppError::internal(format!(
                "Failed to delete image {}: {}",
                image_ref, e
            ))),
        }
    }

    /// 引用只允许存储层生成的 `<uuid>.jpg` 形式，防止路径穿越
    fn resolve(&self, image_ref: &str) -> AppResult<PathBuf> {
        let valid = image_ref
            .strip_suffix(".jpg")
            .is_some_and(|stem| Uuid::parse_str(stem).is_ok());
        if !valid {
            return Err(AppError::validation(format!(
                "Invalid image reference: {}",
                image_ref
            )));
        }
        Ok(self.images_dir.join(image_ref))
    }
}
