//! 操作门面
//!
//! 把会话存储与 pdfium 引擎拼成对外操作：上传、查询、分析、检测、
//! 替换、下载、清理。传输层（工具注册/HTTP/CLI）不在本 crate 内，
//! 上层只需把这些方法原样暴露出去。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analyze::{analyze_document, DocumentTypeAnalysis};
use crate::config::DetectConfig;
use crate::detect::detect_boxes;
use crate::engine::DocumentEngine;
use crate::error::{Result, UnredactorError};
use crate::geometry::{round1, RedactBox};
use crate::group::{group_by_size, SizeGroup};
use crate::ocr::OcrEngine;
use crate::pdfium::PdfiumEngine;
use crate::replace::{replace_boxes, ReplaceRequest, ReplaceSummary};
use crate::session::SessionStore;

/// 类型分析默认抽样页数
const DEFAULT_SAMPLE_PAGES: usize = 3;

/// 上传回执
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadReceipt {
    pub file_id: String,
    pub filename: String,
    pub page_count: usize,
}

/// 单页尺寸信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page_number: usize,
    pub width: f64,
    pub height: f64,
}

/// 文档信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub file_id: String,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

/// 单页检测报告
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub file_id: String,
    pub page_number: usize,
    pub total_boxes_found: usize,
    pub boxes_by_size: Vec<SizeGroup>,
    pub boxes: Vec<RedactBox>,
}

/// 全文档检测报告
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllPagesReport {
    pub file_id: String,
    pub page_count: usize,
    pub total_boxes: usize,
    pub pages: Vec<DetectionReport>,
}

/// 替换报告
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceReport {
    pub original_file_id: String,
    pub modified_file_id: String,
    #[serde(flatten)]
    pub summary: ReplaceSummary,
}

/// 核心操作服务
pub struct UnredactorService {
    store: Arc<dyn SessionStore>,
    config: DetectConfig,
}

impl UnredactorService {
    pub fn new(store: Arc<dyn SessionStore>, config: DetectConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    fn open(&self, file_id: &str) -> Result<PdfiumEngine> {
        let path = self.store.get(file_id)?;
        PdfiumEngine::open(&path)
    }

    /// 上传一个 PDF，返回后续操作使用的标识符
    ///
    /// 在写入存储前校验字节流：必须以 `%PDF` 头开始且长度合理。
    pub fn upload(&self, bytes: &[u8], filename: &str) -> Result<UploadReceipt> {
        if bytes.len() < 8 {
            return Err(UnredactorError::InvalidInput(format!(
                "content too short ({} bytes)",
                bytes.len()
            )));
        }
        if !bytes.starts_with(b"%PDF") {
            return Err(UnredactorError::InvalidInput(
                "content does not start with PDF header".to_string(),
            ));
        }

        let file_id = self.store.put(bytes)?;
        let engine = self.open(&file_id)?;
        let page_count = engine.page_count();

        log::info!(
            "[Service] 上传 {}（{} 字节，{} 页）-> {}",
            filename,
            bytes.len(),
            page_count,
            file_id
        );

        Ok(UploadReceipt {
            file_id,
            filename: filename.to_string(),
            page_count,
        })
    }

    /// 查询文档页数与每页尺寸
    pub fn document_info(&self, file_id: &str) -> Result<DocumentInfo> {
        let engine = self.open(file_id)?;
        let page_count = engine.page_count();

        let mut pages = Vec::with_capacity(page_count);
        for page_number in 0..page_count {
            let (width, height) = engine.page_size(page_number)?;
            pages.push(PageInfo {
                page_number,
                width: round1(width),
                height: round1(height),
            });
        }

        Ok(DocumentInfo {
            file_id: file_id.to_string(),
            page_count,
            pages,
        })
    }

    /// 分析文档是文本型还是图片型
    pub fn analyze(&self, file_id: &str, sample_pages: Option<usize>) -> Result<DocumentTypeAnalysis> {
        let engine = self.open(file_id)?;
        analyze_document(&engine, sample_pages.unwrap_or(DEFAULT_SAMPLE_PAGES))
    }

    /// 检测单个页面上的涂黑块并按尺寸分组
    pub fn detect(&self, file_id: &str, page_number: usize) -> Result<DetectionReport> {
        let engine = self.open(file_id)?;
        self.detect_on(&engine, file_id, page_number)
    }

    /// 检测所有页面
    pub fn detect_all_pages(&self, file_id: &str) -> Result<AllPagesReport> {
        let engine = self.open(file_id)?;
        let page_count = engine.page_count();

        let mut pages = Vec::with_capacity(page_count);
        let mut total_boxes = 0;
        for page_number in 0..page_count {
            let report = self.detect_on(&engine, file_id, page_number)?;
            total_boxes += report.total_boxes_found;
            pages.push(report);
        }

        Ok(AllPagesReport {
            file_id: file_id.to_string(),
            page_count,
            total_boxes,
            pages,
        })
    }

    fn detect_on(
        &self,
        engine: &PdfiumEngine,
        file_id: &str,
        page_number: usize,
    ) -> Result<DetectionReport> {
        let boxes = detect_boxes(engine, page_number, &self.config)?;
        Ok(DetectionReport {
            file_id: file_id.to_string(),
            page_number,
            total_boxes_found: boxes.len(),
            boxes_by_size: group_by_size(&boxes),
            boxes,
        })
    }

    /// 替换匹配尺寸的涂黑块，结果作为新条目写入存储
    ///
    /// 输入文档不被修改；输出在存储里有独立的标识符。
    pub fn replace(
        &self,
        file_id: &str,
        request: &ReplaceRequest,
        ocr: Option<&mut (dyn OcrEngine + '_)>,
    ) -> Result<ReplaceReport> {
        let mut engine = self.open(file_id)?;
        let summary = replace_boxes(&mut engine, ocr, request, &self.config)?;

        let bytes = engine.save_to_bytes()?;
        let modified_file_id = self.store.put(&bytes)?;

        log::info!(
            "[Service] 替换完成：{} 个框，{} 页修改，输出 {}",
            summary.total_replaced,
            summary.pages_modified.len(),
            modified_file_id
        );

        Ok(ReplaceReport {
            original_file_id: file_id.to_string(),
            modified_file_id,
            summary,
        })
    }

    /// 以字节流取回文档
    pub fn download(&self, file_id: &str) -> Result<Vec<u8>> {
        let path = self.store.get(file_id)?;
        Ok(std::fs::read(path)?)
    }

    /// 删除会话条目
    pub fn cleanup(&self, file_id: &str) -> Result<()> {
        self.store.delete(file_id)
    }
}
