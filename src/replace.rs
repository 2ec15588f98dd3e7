//! 按目标尺寸替换涂黑块
//!
//! 替换前在每个页面上重新检测候选框（而不是复用调用方传入的检测
//! 结果），保证操作的是页面的当前状态；这是刻意的二阶段契约，
//! 检测是纯读取，替换内部自行重推。

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::config::DetectConfig;
use crate::detect::detect_boxes;
use crate::engine::DocumentEngine;
use crate::error::Result;
use crate::geometry::{CoordinateMapper, RedactBox};
use crate::label::{draw_cover, CoverRect};
use crate::ocr::OcrEngine;
use crate::recover::{recover_text, RecoveryRecord};

/// 默认尺寸容差（文档坐标单位）
pub const DEFAULT_TOLERANCE: f64 = 2.0;

/// 替换请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceRequest {
    /// 目标框宽度（point）
    pub target_width: f64,
    /// 目标框高度（point）
    pub target_height: f64,
    /// 绘制在替换块中的标签文字
    pub label: String,
    /// 限定处理的页面，None 表示全部页面
    #[serde(default)]
    pub page: Option<usize>,
    /// 尺寸容差
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

impl ReplaceRequest {
    pub fn new(target_width: f64, target_height: f64, label: impl Into<String>) -> Self {
        Self {
            target_width,
            target_height,
            label: label.into(),
            page: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// 替换结果汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceSummary {
    /// 替换的框总数
    pub total_replaced: usize,
    /// 被修改的页面索引
    pub pages_modified: Vec<usize>,
    /// 每个被替换框的文本恢复记录（按处理顺序）
    pub records: Vec<RecoveryRecord>,
    /// 恢复到非哨兵文本的记录数
    pub recovered_count: usize,
}

/// 框尺寸是否落在目标容差内
pub fn size_matches(bbox: &RedactBox, target_width: f64, target_height: f64, tolerance: f64) -> bool {
    (bbox.width - target_width).abs() <= tolerance
        && (bbox.height - target_height).abs() <= tolerance
}

/// 替换所有匹配目标尺寸的涂黑块
///
/// 逐页处理：重新检测 -> 容差过滤 -> 无匹配则跳过（页面保持原样）
/// -> 渲染一次 -> 逐框先恢复文本再绘制覆盖块 -> 整页替换。
/// 页面校验在任何修改发生之前完成；匹配为零不是错误。
pub fn replace_boxes<E: DocumentEngine>(
    engine: &mut E,
    mut ocr: Option<&mut (dyn OcrEngine + '_)>,
    request: &ReplaceRequest,
    config: &DetectConfig,
) -> Result<ReplaceSummary> {
    // 显式页面限定越界时在任何修改前失败
    let pages: Vec<usize> = match request.page {
        Some(page) => {
            engine.check_page(page)?;
            vec![page]
        }
        None => (0..engine.page_count()).collect(),
    };

    let mapper = CoordinateMapper::new(config.render_scale);
    let mut summary = ReplaceSummary {
        total_replaced: 0,
        pages_modified: Vec::new(),
        records: Vec::new(),
        recovered_count: 0,
    };

    for page in pages {
        let boxes = detect_boxes(&*engine, page, config)?;
        let matching: Vec<RedactBox> = boxes
            .into_iter()
            .filter(|b| size_matches(b, request.target_width, request.target_height, request.tolerance))
            .collect();

        if matching.is_empty() {
            continue;
        }

        let mut canvas = engine.render_page(page, config.render_scale)?.to_rgba8();

        for bbox in &matching {
            // 先恢复原页面上框下的文本，再绘制覆盖
            let record = recover_text(&*engine, ocr.as_deref_mut(), bbox, config);
            summary.records.push(record);

            let px0 = mapper.to_pixels(bbox.x0);
            let py0 = mapper.to_pixels(bbox.y0);
            let px1 = mapper.to_pixels(bbox.x1);
            let py1 = mapper.to_pixels(bbox.y1);
            let rect = CoverRect {
                x: px0.round() as i32,
                y: py0.round() as i32,
                width: (px1 - px0).round().max(0.0) as u32,
                height: (py1 - py0).round().max(0.0) as u32,
            };

            // 字号随框高缩放并设置上限，避免小框里文字溢出
            let font_size_pt = (bbox.height * 0.6).min(config.max_label_font_size as f64);
            let font_size_px = mapper.to_pixels(font_size_pt) as f32;
            draw_cover(&mut canvas, rect, &request.label, font_size_px);
        }

        engine.substitute_page(page, &DynamicImage::ImageRgba8(canvas))?;

        log::info!(
            "[Replace] 页面 {}: 替换 {} 个 {}x{} 的框",
            page,
            matching.len(),
            request.target_width,
            request.target_height
        );

        summary.total_replaced += matching.len();
        summary.pages_modified.push(page);
    }

    summary.recovered_count = summary.records.iter().filter(|r| r.found_text()).count();

    Ok(summary)
}
