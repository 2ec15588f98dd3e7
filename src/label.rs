//! 覆盖块与标签绘制
//!
//! 在渲染图上用白底黑边矩形盖住涂黑块，并把替换标签水平/垂直居中
//! 绘制在矩形内。字体按候选列表依次解析；全部失败时只画覆盖块并
//! 记录警告，标签绘制永远不会让整个替换调用失败。

use std::sync::OnceLock;

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

const WHITE: Rgba<u8> = Rgba([255u8, 255u8, 255u8, 255u8]);
const BLACK: Rgba<u8> = Rgba([0u8, 0u8, 0u8, 255u8]);

/// 字体解析候选路径，按顺序尝试
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

static LABEL_FONT: OnceLock<Option<FontVec>> = OnceLock::new();

/// 解析标签字体，进程内只解析一次
pub fn label_font() -> Option<&'static FontVec> {
    LABEL_FONT
        .get_or_init(|| {
            for path in FONT_CANDIDATES {
                if let Ok(bytes) = std::fs::read(path) {
                    match FontVec::try_from_vec(bytes) {
                        Ok(font) => {
                            log::info!("[Label] 使用字体: {}", path);
                            return Some(font);
                        }
                        Err(e) => {
                            log::debug!("[Label] 解析字体 {} 失败: {}", path, e);
                        }
                    }
                }
            }
            log::warn!("[Label] 未找到可用字体，替换块将不绘制标签文字");
            None
        })
        .as_ref()
}

/// 像素坐标下的覆盖矩形
#[derive(Debug, Clone, Copy)]
pub struct CoverRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// 绘制一个覆盖块：白色填充 + 2px 黑色描边 + 居中标签
///
/// `font_size_px` 为像素字号（文档字号乘渲染倍率后的值）。
pub fn draw_cover(img: &mut RgbaImage, rect: CoverRect, label: &str, font_size_px: f32) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }

    let fill = Rect::at(rect.x, rect.y).of_size(rect.width, rect.height);
    draw_filled_rect_mut(img, fill, WHITE);

    // 2px 描边
    draw_hollow_rect_mut(img, fill, BLACK);
    if rect.width > 2 && rect.height > 2 {
        let inner = Rect::at(rect.x + 1, rect.y + 1).of_size(rect.width - 2, rect.height - 2);
        draw_hollow_rect_mut(img, inner, BLACK);
    }

    if label.is_empty() {
        return;
    }
    let font = match label_font() {
        Some(font) => font,
        None => return,
    };

    let scale = PxScale::from(font_size_px.max(1.0));
    let (text_w, text_h) = text_size(scale, font, label);

    let text_x = rect.x + (rect.width as i32 - text_w as i32) / 2;
    let text_y = rect.y + (rect.height as i32 - text_h as i32) / 2;
    draw_text_mut(img, BLACK, text_x, text_y, scale, font, label);
}
