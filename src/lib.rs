//! # unredactor
//!
//! PDF 涂黑块检测与替换库。
//!
//! 流水线分四步：
//! 1. **检测**：把页面渲染为位图，按亮度阈值二值化后做连通域分析，
//!    找出看起来像涂黑块的深色矩形（[`detect_boxes`]）；
//! 2. **分组**：按尺寸（一位小数精度）聚合候选框，便于批量定位
//!    同一类涂黑（[`group_by_size`]）；
//! 3. **恢复**：覆盖前先尝试读取框下残留的文本层，失败时放大渲染
//!    交给光学识别（[`recover_text`]）；
//! 4. **替换**：把尺寸匹配的框盖成带标签的白色矩形，整页栅格化后
//!    原位替换（[`replace_boxes`]）。
//!
//! 渲染由 [`DocumentEngine`] 抽象，生产实现为 [`PdfiumEngine`]；
//! 光学识别由 [`OcrEngine`] 抽象，自带 Tesseract 命令行封装。
//! [`UnredactorService`] 把以上能力与会话存储组合成完整的
//! 上传/检测/替换/下载操作集。

pub mod analyze;
pub mod config;
pub mod detect;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod group;
pub mod label;
pub mod ocr;
pub mod pdfium;
pub mod recover;
pub mod replace;
pub mod service;
pub mod session;

#[cfg(test)]
pub(crate) mod test_util;

pub use analyze::{analyze_document, DocumentTypeAnalysis, PageTypeInfo};
pub use config::DetectConfig;
pub use detect::detect_boxes;
pub use engine::DocumentEngine;
pub use error::{Result, UnredactorError};
pub use geometry::{round1, CoordinateMapper, RedactBox, Region};
pub use group::{group_by_size, SizeGroup, SizeKey};
pub use ocr::{OcrEngine, OcrError, TesseractConfig, TesseractEngine};
pub use pdfium::PdfiumEngine;
pub use recover::{recover_text, Provenance, RecoveryRecord, NO_TEXT_FOUND};
pub use replace::{replace_boxes, ReplaceRequest, ReplaceSummary, DEFAULT_TOLERANCE};
pub use service::{
    AllPagesReport, DetectionReport, DocumentInfo, PageInfo, ReplaceReport, UnredactorService,
    UploadReceipt,
};
pub use session::{SessionStore, TempFileStore};
