//! pdfium 渲染引擎实现
//!
//! 每次操作重新绑定 pdfium 并从工作文件加载文档，避免跨调用持有
//! 库句柄。引擎在打开时把输入复制为私有工作副本，所有修改都写回
//! 工作副本，输入文件本身保持不变。

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;

use crate::engine::DocumentEngine;
use crate::error::{Result, UnredactorError};
use crate::geometry::Region;

/// 获取 pdfium 库的搜索路径
fn get_pdfium_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(custom) = std::env::var("UNREDACTOR_PDFIUM_PATH") {
        paths.push(PathBuf::from(custom));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            paths.push(exe_dir.join("libs"));
            paths.push(exe_dir.to_path_buf());
        }
    }

    paths.push(PathBuf::from("libs"));
    paths.push(PathBuf::from("./"));

    paths
}

/// 尝试绑定 pdfium 库
fn bind_pdfium() -> Result<Pdfium> {
    let search_paths = get_pdfium_search_paths();

    for path in &search_paths {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(path);
        log::debug!("[Pdfium] 尝试加载 pdfium: {:?}", lib_path);

        if let Ok(bindings) = Pdfium::bind_to_library(&lib_path) {
            log::debug!("[Pdfium] 成功从 {:?} 加载 pdfium", path);
            return Ok(Pdfium::new(bindings));
        }
    }

    log::debug!("[Pdfium] 尝试加载系统 pdfium 库");
    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| UnredactorError::Render(format!("pdfium library unavailable: {e}")))
}

fn render_err(e: PdfiumError) -> UnredactorError {
    UnredactorError::Render(e.to_string())
}

/// 基于 pdfium 的文档引擎
pub struct PdfiumEngine {
    work_path: PathBuf,
    page_count: usize,
}

impl PdfiumEngine {
    /// 打开一个 PDF：复制为工作副本并读取页数
    pub fn open(input: &Path) -> Result<Self> {
        let work_path = std::env::temp_dir().join(format!(
            "unredactor_work_{}_{}.pdf",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));
        std::fs::copy(input, &work_path)?;

        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(&work_path, None)
            .map_err(render_err)?;
        let page_count = document.pages().len() as usize;

        log::info!(
            "[Pdfium] 打开文档 {:?}（{} 页），工作副本 {:?}",
            input,
            page_count,
            work_path
        );

        Ok(Self {
            work_path,
            page_count,
        })
    }

    fn page_index(&self, page: usize) -> Result<u16> {
        self.check_page(page)?;
        u16::try_from(page).map_err(|_| UnredactorError::PageNotFound {
            page,
            page_count: self.page_count,
        })
    }

    /// 加载工作副本并执行一次只读操作
    fn with_document<T>(&self, f: impl FnOnce(&PdfDocument) -> Result<T>) -> Result<T> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(&self.work_path, None)
            .map_err(render_err)?;
        f(&document)
    }

    fn render_page_image(document: &PdfDocument, index: u16, scale: f32) -> Result<DynamicImage> {
        let page = document.pages().get(index).map_err(render_err)?;

        let page_width = page.width().value;
        let page_height = page.height().value;
        let target_width = (page_width * scale) as i32;
        let target_height = (page_height * scale) as i32;

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width)
            .set_target_height(target_height);

        let bitmap = page.render_with_config(&render_config).map_err(render_err)?;
        Ok(bitmap.as_image())
    }
}

impl DocumentEngine for PdfiumEngine {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, page: usize) -> Result<(f64, f64)> {
        let index = self.page_index(page)?;
        self.with_document(|document| {
            let page = document.pages().get(index).map_err(render_err)?;
            Ok((page.width().value as f64, page.height().value as f64))
        })
    }

    fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage> {
        let index = self.page_index(page)?;
        self.with_document(|document| Self::render_page_image(document, index, scale))
    }

    fn render_region(&self, page: usize, region: &Region, scale: f32) -> Result<DynamicImage> {
        let index = self.page_index(page)?;
        let (page_w, page_h) = self.page_size(page)?;
        region.validate(page_w, page_h)?;

        // 整页渲染后按像素裁剪出目标区域
        self.with_document(|document| {
            let full = Self::render_page_image(document, index, scale)?;
            let s = scale as f64;
            let x = (region.x0 * s) as u32;
            let y = (region.y0 * s) as u32;
            let w = ((region.width() * s) as u32).max(1);
            let h = ((region.height() * s) as u32).max(1);
            Ok(full.crop_imm(x, y, w, h))
        })
    }

    fn page_text(&self, page: usize) -> Result<String> {
        let index = self.page_index(page)?;
        self.with_document(|document| {
            let page = document.pages().get(index).map_err(render_err)?;
            let text = page.text().map_err(render_err)?;
            Ok(text.all())
        })
    }

    fn page_image_count(&self, page: usize) -> Result<usize> {
        let index = self.page_index(page)?;
        self.with_document(|document| {
            let page = document.pages().get(index).map_err(render_err)?;
            let count = page
                .objects()
                .iter()
                .filter(|object| matches!(object, PdfPageObject::Image(_)))
                .count();
            Ok(count)
        })
    }

    fn text_in_region(&self, page: usize, region: &Region) -> Result<String> {
        let index = self.page_index(page)?;
        self.with_document(|document| {
            let page = document.pages().get(index).map_err(render_err)?;
            let page_height = page.height().value as f64;
            let text = page.text().map_err(render_err)?;

            // 文档坐标原点在左上，pdfium 文本坐标原点在左下
            let rect = PdfRect::new(
                PdfPoints::new((page_height - region.y1) as f32),
                PdfPoints::new(region.x0 as f32),
                PdfPoints::new((page_height - region.y0) as f32),
                PdfPoints::new(region.x1 as f32),
            );
            Ok(text.inside_rect(rect))
        })
    }

    fn substitute_page(&mut self, page: usize, image: &DynamicImage) -> Result<()> {
        let index = self.page_index(page)?;

        let pdfium = bind_pdfium()?;
        let mut document = pdfium
            .load_pdf_from_file(&self.work_path, None)
            .map_err(render_err)?;

        let (page_width, page_height) = {
            let old_page = document.pages().get(index).map_err(render_err)?;
            (old_page.width(), old_page.height())
        };

        // 新页面内容经由临时 JPEG 栅格化
        let temp_image = std::env::temp_dir().join(format!(
            "unredactor_page_{}_{}.jpg",
            std::process::id(),
            uuid::Uuid::new_v4().simple()
        ));
        image
            .to_rgb8()
            .save_with_format(&temp_image, image::ImageFormat::Jpeg)?;

        let result = (|| -> Result<()> {
            // 先在原页面位置插入新页，再删除被挤到后一位的原页，
            // 保证页数与页序不变
            let mut new_page = document
                .pages_mut()
                .create_page_at_index(PdfPagePaperSize::Custom(page_width, page_height), index)
                .map_err(render_err)?;

            let mut image_object =
                PdfPageImageObject::new_from_jpeg_file(&document, &temp_image)
                    .map_err(render_err)?;
            image_object
                .scale(page_width.value, page_height.value)
                .map_err(render_err)?;
            new_page
                .objects_mut()
                .add_image_object(image_object)
                .map_err(render_err)?;
            drop(new_page);

            document
                .pages_mut()
                .delete_page_at_index(index + 1)
                .map_err(render_err)?;

            // 写临时文件后原子替换工作副本
            let staged = self.work_path.with_extension("staged.pdf");
            document.save_to_file(&staged).map_err(render_err)?;
            std::fs::rename(&staged, &self.work_path)?;
            Ok(())
        })();

        let _ = std::fs::remove_file(&temp_image);
        result?;

        log::info!("[Pdfium] 页面 {} 已替换为栅格化页面", page);
        Ok(())
    }

    fn save_to_bytes(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.work_path)?)
    }
}

impl Drop for PdfiumEngine {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.work_path) {
            log::warn!("[Pdfium] 删除工作副本 {:?} 失败: {}", self.work_path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_paths_cover_exe_and_cwd() {
        let paths = get_pdfium_search_paths();
        assert!(paths.iter().any(|p| p == &PathBuf::from("./")));
        assert!(paths.iter().any(|p| p == &PathBuf::from("libs")));
    }
}
