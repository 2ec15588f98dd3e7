//! 测试用的合成文档引擎
//!
//! 在内存里按页面描述合成位图：白底页面 + 若干深色矩形 + 文本层
//! 区域，让检测/恢复/替换流水线不依赖 pdfium 二进制即可被完整测试。

use image::{imageops, DynamicImage, Rgba, RgbaImage};

use crate::engine::DocumentEngine;
use crate::error::{Result, UnredactorError};
use crate::geometry::Region;
use crate::ocr::{OcrEngine, OcrError};

/// 合成页面描述
pub struct FakePage {
    width: f64,
    height: f64,
    rects: Vec<(f64, f64, f64, f64)>,
    texts: Vec<(Region, String)>,
    image_count: usize,
    body_text: String,
    replaced: Option<RgbaImage>,
}

impl FakePage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            rects: Vec::new(),
            texts: Vec::new(),
            image_count: 0,
            body_text: String::new(),
            replaced: None,
        }
    }

    /// 添加一个深色矩形（文档坐标：左上角 + 宽高）
    pub fn with_rect(mut self, x: f64, y: f64, w: f64, h: f64) -> Self {
        self.rects.push((x, y, w, h));
        self
    }

    /// 在指定区域放置文本层内容
    pub fn with_text(mut self, x: f64, y: f64, w: f64, h: f64, text: &str) -> Self {
        self.texts
            .push((Region::new(x, y, x + w, y + h), text.to_string()));
        self
    }

    /// 设置整页正文文本（供文档类型分析用）
    pub fn with_body_text(mut self, text: &str) -> Self {
        self.body_text = text.to_string();
        self
    }

    /// 标记页面包含若干图片对象
    pub fn with_images(mut self, count: usize) -> Self {
        self.image_count = count;
        self
    }

    pub fn into_engine(self) -> FakeEngine {
        FakeEngine::new(vec![self])
    }

    fn render(&self, scale: f32) -> RgbaImage {
        if let Some(replaced) = &self.replaced {
            let w = (self.width * scale as f64).round() as u32;
            let h = (self.height * scale as f64).round() as u32;
            if replaced.dimensions() == (w, h) {
                return replaced.clone();
            }
            return imageops::resize(replaced, w, h, imageops::FilterType::Nearest);
        }

        let s = scale as f64;
        let w = (self.width * s).round() as u32;
        let h = (self.height * s).round() as u32;
        let mut img = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
        for &(x, y, rw, rh) in &self.rects {
            let x0 = (x * s) as u32;
            let y0 = (y * s) as u32;
            let x1 = (((x + rw) * s) as u32).min(w);
            let y1 = (((y + rh) * s) as u32).min(h);
            for py in y0..y1 {
                for px in x0..x1 {
                    img.put_pixel(px, py, Rgba([0, 0, 0, 255]));
                }
            }
        }
        img
    }
}

/// 合成文档引擎
pub struct FakeEngine {
    pages: Vec<FakePage>,
}

impl FakeEngine {
    pub fn new(pages: Vec<FakePage>) -> Self {
        Self { pages }
    }

    pub fn page_was_substituted(&self, page: usize) -> bool {
        self.pages
            .get(page)
            .map(|p| p.replaced.is_some())
            .unwrap_or(false)
    }

    fn page(&self, page: usize) -> Result<&FakePage> {
        self.pages.get(page).ok_or(UnredactorError::PageNotFound {
            page,
            page_count: self.pages.len(),
        })
    }
}

impl DocumentEngine for FakeEngine {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let p = self.page(page)?;
        Ok((p.width, p.height))
    }

    fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage> {
        Ok(DynamicImage::ImageRgba8(self.page(page)?.render(scale)))
    }

    fn render_region(&self, page: usize, region: &Region, scale: f32) -> Result<DynamicImage> {
        let p = self.page(page)?;
        region.validate(p.width, p.height)?;
        let full = p.render(scale);
        let s = scale as f64;
        let x = (region.x0 * s) as u32;
        let y = (region.y0 * s) as u32;
        let w = ((region.width() * s) as u32).max(1);
        let h = ((region.height() * s) as u32).max(1);
        Ok(DynamicImage::ImageRgba8(
            imageops::crop_imm(&full, x, y, w, h).to_image(),
        ))
    }

    fn page_text(&self, page: usize) -> Result<String> {
        let p = self.page(page)?;
        let mut parts: Vec<&str> = vec![p.body_text.as_str()];
        parts.extend(p.texts.iter().map(|(_, t)| t.as_str()));
        Ok(parts.join(" ").trim().to_string())
    }

    fn page_image_count(&self, page: usize) -> Result<usize> {
        Ok(self.page(page)?.image_count)
    }

    fn text_in_region(&self, page: usize, region: &Region) -> Result<String> {
        let p = self.page(page)?;
        let slack = 0.5;
        let hits: Vec<&str> = p
            .texts
            .iter()
            .filter(|(r, _)| {
                r.x0 >= region.x0 - slack
                    && r.y0 >= region.y0 - slack
                    && r.x1 <= region.x1 + slack
                    && r.y1 <= region.y1 + slack
            })
            .map(|(_, t)| t.as_str())
            .collect();
        Ok(hits.join(" "))
    }

    fn substitute_page(&mut self, page: usize, image: &DynamicImage) -> Result<()> {
        let page_count = self.pages.len();
        let p = self
            .pages
            .get_mut(page)
            .ok_or(UnredactorError::PageNotFound { page, page_count })?;
        p.replaced = Some(image.to_rgba8());
        Ok(())
    }

    fn save_to_bytes(&self) -> Result<Vec<u8>> {
        Ok(format!("fake-document-{}-pages", self.pages.len()).into_bytes())
    }
}

/// 合成 OCR 引擎
pub struct FakeOcr {
    text: String,
    fail: bool,
}

impl FakeOcr {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            text: String::new(),
            fail: true,
        }
    }
}

impl OcrEngine for FakeOcr {
    fn recognize_image(&mut self, _img: &DynamicImage) -> std::result::Result<String, OcrError> {
        if self.fail {
            return Err(OcrError::Recognition("synthetic failure".to_string()));
        }
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}
