//! 渲染引擎统一接口
//!
//! 核心流水线只通过该 trait 访问文档：渲染页面/区域、读取文本层、
//! 以及整页替换。生产实现见 [`crate::pdfium::PdfiumEngine`]。

use image::DynamicImage;

use crate::error::{Result, UnredactorError};
use crate::geometry::Region;

/// 文档渲染引擎
pub trait DocumentEngine {
    /// 页数
    fn page_count(&self) -> usize;

    /// 页面尺寸（文档坐标，point）
    fn page_size(&self, page: usize) -> Result<(f64, f64)>;

    /// 将整页渲染为位图，`scale` 为相对文档坐标的倍率
    fn render_page(&self, page: usize, scale: f32) -> Result<DynamicImage>;

    /// 渲染页面中的一个矩形区域
    fn render_region(&self, page: usize, region: &Region, scale: f32) -> Result<DynamicImage>;

    /// 提取整页文本层
    fn page_text(&self, page: usize) -> Result<String>;

    /// 页面中图片对象的数量（用于扫描件判定）
    fn page_image_count(&self, page: usize) -> Result<usize>;

    /// 提取限定在矩形内的文本层内容
    fn text_in_region(&self, page: usize, region: &Region) -> Result<String>;

    /// 整页替换：删除 `page` 处的原页面，在同一位置插入由 `image`
    /// 栅格化得到的新页面。页数与页序保持不变，单页替换是原子的。
    fn substitute_page(&mut self, page: usize, image: &DynamicImage) -> Result<()>;

    /// 以字节流导出当前文档
    fn save_to_bytes(&self) -> Result<Vec<u8>>;

    /// 页索引越界检查
    fn check_page(&self, page: usize) -> Result<()> {
        let page_count = self.page_count();
        if page >= page_count {
            return Err(UnredactorError::PageNotFound { page, page_count });
        }
        Ok(())
    }
}
