//! 涂黑块检测
//!
//! 将页面渲染为位图后二值化，对前景做 8 连通域标注，取每个连通域的
//! 轴对齐包围盒，再按尺寸合理性过滤。结果为文档坐标（一位小数）。

use std::collections::BTreeMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};

use crate::config::DetectConfig;
use crate::engine::DocumentEngine;
use crate::error::Result;
use crate::geometry::{CoordinateMapper, RedactBox};

/// 检测单个页面上的涂黑块候选
///
/// 对固定的页面、渲染倍率与阈值，结果是确定的：检测过程不修改页面
/// 状态，重复调用返回相同的集合。框的顺序为连通域的发现顺序
/// （逐行扫描序），调用方不应依赖位置排序。
pub fn detect_boxes<E: DocumentEngine + ?Sized>(
    engine: &E,
    page: usize,
    config: &DetectConfig,
) -> Result<Vec<RedactBox>> {
    engine.check_page(page)?;

    let rendered = engine.render_page(page, config.render_scale)?;
    let gray = rendered.to_luma8();
    let (img_width, img_height) = gray.dimensions();

    let binary = binarize(&gray, config.intensity_threshold);
    let labels = connected_components(&binary, Connectivity::Eight, Luma([0u8]));

    // 每个连通域的像素包围盒。BTreeMap 保证按标签序（即发现序）输出。
    let mut bounds: BTreeMap<u32, (u32, u32, u32, u32)> = BTreeMap::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let label = pixel[0];
        if label == 0 {
            continue;
        }
        bounds
            .entry(label)
            .and_modify(|(min_x, min_y, max_x, max_y)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
            })
            .or_insert((x, y, x, y));
    }

    let max_w = (img_width as f32 * config.max_page_fraction) as u32;
    let max_h = (img_height as f32 * config.max_page_fraction) as u32;
    let mapper = CoordinateMapper::new(config.render_scale);

    let mut boxes = Vec::new();
    for (min_x, min_y, max_x, max_y) in bounds.into_values() {
        // 像素上界取开区间，宽高与填充矩形一致
        let w = max_x - min_x + 1;
        let h = max_y - min_y + 1;

        // 过小视为噪点，过大视为整页填充
        if w <= config.min_box_width_px || h <= config.min_box_height_px {
            continue;
        }
        if w >= max_w || h >= max_h {
            continue;
        }

        boxes.push(RedactBox::from_pixels(
            page,
            &mapper,
            min_x,
            min_y,
            max_x + 1,
            max_y + 1,
        ));
    }

    log::info!(
        "[Detect] 页面 {}: {}x{} px, 阈值 {}, 候选框 {} 个",
        page,
        img_width,
        img_height,
        config.intensity_threshold,
        boxes.len()
    );

    Ok(boxes)
}

/// 二值化：低于阈值的像素为前景（255），其余为背景（0）
fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = GrayImage::new(gray.width(), gray.height());
    for (src, dst) in gray.pixels().zip(out.pixels_mut()) {
        *dst = if src[0] < threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        };
    }
    out
}
