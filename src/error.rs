//! 错误类型定义

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UnredactorError>;

/// 核心错误分类
///
/// 检测/恢复阶段的单个区域失败不会走到这里（在本地降级处理），
/// 这里的错误都会直接返回给调用方。
#[derive(Debug, Error)]
pub enum UnredactorError {
    #[error("page {page} does not exist, document has {page_count} pages")]
    PageNotFound { page: usize, page_count: usize },

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("file id '{0}' not found")]
    FileNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
