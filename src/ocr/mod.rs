//! 光学识别引擎接口
//!
//! 识别失败对调用方是非致命的：文本恢复阶段会捕获 [`OcrError`]
//! 并降级为"未找到文本"，单个区域的失败不会中断其余框/页面的处理。

mod tesseract;

pub use tesseract::{TesseractConfig, TesseractEngine};

use image::DynamicImage;
use thiserror::Error;

/// OCR 错误类型
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("recognition failed: {0}")]
    Recognition(String),

    #[error("recognition timed out after {0}s")]
    Timeout(u64),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// OCR 引擎统一 trait
pub trait OcrEngine: Send {
    /// 识别图片中的文字，返回拼接后的纯文本
    fn recognize_image(&mut self, img: &DynamicImage) -> Result<String, OcrError>;

    /// 引擎名称（用于日志）
    fn name(&self) -> &str;
}
