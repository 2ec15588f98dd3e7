//! 检测与替换的配置项
//!
//! 阈值和尺寸边界是针对 2x 渲染的办公类文档经验调参的结果，
//! 不保证对所有扫描分辨率/文档风格通用，因此全部开放为配置，
//! 并支持环境变量覆盖。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectConfig {
    /// 检测阶段的渲染倍率（相对文档坐标）
    pub render_scale: f32,
    /// 二值化阈值：灰度值低于该值的像素视为前景（近黑填充）
    pub intensity_threshold: u8,
    /// 候选框最小像素宽度（检测倍率下），低于视为噪点
    pub min_box_width_px: u32,
    /// 候选框最小像素高度（检测倍率下）
    pub min_box_height_px: u32,
    /// 候选框相对页面的最大占比，超过视为整页填充而非涂黑块
    pub max_page_fraction: f32,
    /// OCR 回退时对区域的渲染倍率（高于检测倍率以提升识别率）
    pub ocr_scale: f32,
    /// 文本层直接提取的噪声下限：trim 后长度需大于该值才算命中
    pub min_direct_text_len: usize,
    /// 替换标签的最大字号（文档坐标，绘制时乘渲染倍率）
    pub max_label_font_size: f32,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            render_scale: 2.0,
            intensity_threshold: 50,
            min_box_width_px: 20,
            min_box_height_px: 10,
            max_page_fraction: 0.8,
            ocr_scale: 3.0,
            min_direct_text_len: 2,
            max_label_font_size: 12.0,
        }
    }
}

impl DetectConfig {
    /// 读取默认配置并应用环境变量覆盖
    ///
    /// 支持 `UNREDACTOR_RENDER_SCALE`、`UNREDACTOR_THRESHOLD`、
    /// `UNREDACTOR_OCR_SCALE`。
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(scale) = env_parse::<f32>("UNREDACTOR_RENDER_SCALE") {
            if scale > 0.0 {
                config.render_scale = scale;
            }
        }
        if let Some(threshold) = env_parse::<u8>("UNREDACTOR_THRESHOLD") {
            config.intensity_threshold = threshold;
        }
        if let Some(scale) = env_parse::<f32>("UNREDACTOR_OCR_SCALE") {
            if scale > 0.0 {
                config.ocr_scale = scale;
            }
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
