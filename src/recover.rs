//! 涂黑块下的文本恢复
//!
//! 两段式策略：先从文本层直接提取，失败时回退到对该区域的高倍率
//! 渲染 + 光学识别。每条结果带来源标记，作为替换操作的审计记录。

use serde::{Deserialize, Serialize};

use crate::config::DetectConfig;
use crate::engine::DocumentEngine;
use crate::geometry::RedactBox;
use crate::ocr::OcrEngine;

/// "未找到文本"哨兵值
pub const NO_TEXT_FOUND: &str = "[No text found]";

/// 文本来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// 文本层直接提取
    Direct,
    /// 光学识别
    Optical,
    /// 未找到
    None,
}

/// 单个涂黑块的恢复记录
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryRecord {
    pub page: usize,
    pub bbox: RedactBox,
    pub text: String,
    pub provenance: Provenance,
}

impl RecoveryRecord {
    pub fn found_text(&self) -> bool {
        self.provenance != Provenance::None
    }
}

/// 恢复一个矩形区域下的文本
///
/// 1. 从页面文本层提取限定在框内的文字，trim 后长度超过噪声下限
///    即返回（来源 `direct`）。
/// 2. 否则若提供了 OCR 引擎：以 `ocr_scale` 渲染该区域并识别，
///    非空结果返回（来源 `optical`）。
/// 3. 否则返回哨兵值（来源 `none`）。
///
/// 文本层与识别引擎的错误都只记录日志并降级为"未找到"，
/// 不会让同一次替换里其余框/页面的处理中断。
pub fn recover_text<E: DocumentEngine + ?Sized>(
    engine: &E,
    mut ocr: Option<&mut (dyn OcrEngine + '_)>,
    bbox: &RedactBox,
    config: &DetectConfig,
) -> RecoveryRecord {
    let region = bbox.region();

    match engine.text_in_region(bbox.page, &region) {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.chars().count() > config.min_direct_text_len {
                return RecoveryRecord {
                    page: bbox.page,
                    bbox: bbox.clone(),
                    text: trimmed.to_string(),
                    provenance: Provenance::Direct,
                };
            }
        }
        Err(e) => {
            log::warn!(
                "[Recover] 页面 {} 区域 ({:.1}, {:.1}, {:.1}, {:.1}) 文本层提取失败: {}",
                bbox.page,
                bbox.x0,
                bbox.y0,
                bbox.x1,
                bbox.y1,
                e
            );
        }
    }

    if let Some(engine_ocr) = ocr.as_deref_mut() {
        match recognize_region(engine, engine_ocr, bbox, config) {
            Ok(text) if !text.is_empty() => {
                return RecoveryRecord {
                    page: bbox.page,
                    bbox: bbox.clone(),
                    text,
                    provenance: Provenance::Optical,
                };
            }
            Ok(_) => {}
            Err(e) => {
                log::warn!(
                    "[Recover] 页面 {} 区域光学识别失败: {}",
                    bbox.page,
                    e
                );
            }
        }
    }

    RecoveryRecord {
        page: bbox.page,
        bbox: bbox.clone(),
        text: NO_TEXT_FOUND.to_string(),
        provenance: Provenance::None,
    }
}

fn recognize_region<E: DocumentEngine + ?Sized>(
    engine: &E,
    ocr: &mut (dyn OcrEngine + '_),
    bbox: &RedactBox,
    config: &DetectConfig,
) -> Result<String, String> {
    // 区域单独以更高倍率渲染，提升字符识别率
    let sub_image = engine
        .render_region(bbox.page, &bbox.region(), config.ocr_scale)
        .map_err(|e| e.to_string())?;
    let text = ocr.recognize_image(&sub_image).map_err(|e| e.to_string())?;
    Ok(text.trim().to_string())
}
