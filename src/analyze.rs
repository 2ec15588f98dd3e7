//! 文档类型分析
//!
//! 抽样若干页面判断文档是文本型还是图片型（扫描件），
//! 帮助调用方预判直接文本提取是否可行、是否需要启用光学识别。

use serde::{Deserialize, Serialize};

use crate::engine::DocumentEngine;
use crate::error::Result;

/// 单页"有效文本"判定下限：超过该字符数才视为正文而非页眉页脚
const MEANINGFUL_TEXT_LEN: usize = 100;

/// 单页分析详情
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTypeInfo {
    pub page: usize,
    pub text_length: usize,
    pub image_count: usize,
    pub has_meaningful_text: bool,
    pub has_images: bool,
}

/// 文档类型分析结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeAnalysis {
    pub is_text_based: bool,
    pub total_pages: usize,
    pub pages_checked: usize,
    pub pages_with_text: usize,
    pub pages_with_images: usize,
    pub average_text_length: f64,
    pub pages: Vec<PageTypeInfo>,
    pub recommendation: String,
}

/// 抽样分析文档类型
///
/// 检查前 `sample_pages` 页（不超过总页数）。抽样页里多数页面
/// 包含有效文本则判定为文本型。
pub fn analyze_document<E: DocumentEngine + ?Sized>(
    engine: &E,
    sample_pages: usize,
) -> Result<DocumentTypeAnalysis> {
    let total_pages = engine.page_count();
    let pages_checked = sample_pages.min(total_pages);

    let mut pages = Vec::with_capacity(pages_checked);
    let mut pages_with_text = 0;
    let mut pages_with_images = 0;
    let mut total_text_length = 0usize;

    for page in 0..pages_checked {
        let text = engine.page_text(page)?;
        let text_length = text.trim().chars().count();
        let image_count = engine.page_image_count(page)?;

        let has_meaningful_text = text_length > MEANINGFUL_TEXT_LEN;
        let has_images = image_count > 0;

        if has_meaningful_text {
            pages_with_text += 1;
        }
        if has_images {
            pages_with_images += 1;
        }
        total_text_length += text_length;

        pages.push(PageTypeInfo {
            page,
            text_length,
            image_count,
            has_meaningful_text,
            has_images,
        });
    }

    let is_text_based = pages_checked > 0 && pages_with_text * 2 > pages_checked;
    let recommendation = if is_text_based {
        "document contains a text layer - direct text extraction will work".to_string()
    } else {
        "document appears to be image-based - optical recognition may be required".to_string()
    };

    Ok(DocumentTypeAnalysis {
        is_text_based,
        total_pages,
        pages_checked,
        pages_with_text,
        pages_with_images,
        average_text_length: if pages_checked > 0 {
            total_text_length as f64 / pages_checked as f64
        } else {
            0.0
        },
        pages,
        recommendation,
    })
}
