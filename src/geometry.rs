//! 坐标与几何类型
//!
//! 文档坐标单位为 PDF point，原点在页面左上角（与渲染像素方向一致）。
//! 检测在 `scale` 倍渲染图上进行，像素坐标除以 `scale` 回到文档坐标。

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnredactorError};

/// 保留一位小数（用于上报/比较的文档坐标）
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// 像素空间与文档空间之间的换算
#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    scale: f64,
}

impl CoordinateMapper {
    pub fn new(scale: f32) -> Self {
        Self {
            scale: scale as f64,
        }
    }

    /// 像素 -> 文档坐标
    pub fn to_document(&self, px: f64) -> f64 {
        px / self.scale
    }

    /// 文档坐标 -> 像素
    pub fn to_pixels(&self, pt: f64) -> f64 {
        pt * self.scale
    }
}

/// 文档坐标下的矩形区域
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Region {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// 校验区域非退化且落在页面范围内
    pub fn validate(&self, page_width: f64, page_height: f64) -> Result<()> {
        if !(self.x1 > self.x0 && self.y1 > self.y0) {
            return Err(UnredactorError::InvalidRegion(format!(
                "degenerate rectangle ({:.1}, {:.1}, {:.1}, {:.1})",
                self.x0, self.y0, self.x1, self.y1
            )));
        }
        if self.x0 < 0.0 || self.y0 < 0.0 || self.x1 > page_width || self.y1 > page_height {
            return Err(UnredactorError::InvalidRegion(format!(
                "rectangle ({:.1}, {:.1}, {:.1}, {:.1}) outside page {:.1}x{:.1}",
                self.x0, self.y0, self.x1, self.y1, page_width, page_height
            )));
        }
        Ok(())
    }
}

/// 检测到的涂黑块候选框
///
/// 坐标为文档坐标，已按一位小数取整。每次检测调用重新生成，
/// 不做跨调用缓存，因此同一页面在相同倍率/阈值下必须可复现。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedactBox {
    pub page: usize,
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub width: f64,
    pub height: f64,
}

impl RedactBox {
    /// 由检测倍率下的像素包围盒构造（像素上界为开区间）
    pub fn from_pixels(
        page: usize,
        mapper: &CoordinateMapper,
        px0: u32,
        py0: u32,
        px1: u32,
        py1: u32,
    ) -> Self {
        let x0 = round1(mapper.to_document(px0 as f64));
        let y0 = round1(mapper.to_document(py0 as f64));
        let x1 = round1(mapper.to_document(px1 as f64));
        let y1 = round1(mapper.to_document(py1 as f64));
        Self {
            page,
            x0,
            y0,
            x1,
            y1,
            width: round1(x1 - x0),
            height: round1(y1 - y0),
        }
    }

    pub fn region(&self) -> Region {
        Region::new(self.x0, self.y0, self.x1, self.y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(10.04), 10.0);
        assert_eq!(round1(10.05), 10.1);
        assert_eq!(round1(99.96), 100.0);
    }

    #[test]
    fn test_mapper_roundtrip() {
        // 文档 -> 像素 -> 文档，应在末位小数一个单位内还原
        let mapper = CoordinateMapper::new(2.0);
        for &v in &[0.0, 12.3, 50.0, 421.7, 841.9] {
            let back = round1(mapper.to_document(mapper.to_pixels(v)));
            assert!((back - v).abs() <= 0.1, "{} -> {}", v, back);
        }
    }

    #[test]
    fn test_box_from_pixels_at_scale_2() {
        let mapper = CoordinateMapper::new(2.0);
        let b = RedactBox::from_pixels(0, &mapper, 100, 40, 200, 64);
        assert_eq!(b.x0, 50.0);
        assert_eq!(b.y0, 20.0);
        assert_eq!(b.x1, 100.0);
        assert_eq!(b.y1, 32.0);
        assert_eq!(b.width, 50.0);
        assert_eq!(b.height, 12.0);
        assert!(b.x1 > b.x0 && b.y1 > b.y0);
    }

    #[test]
    fn test_region_validate() {
        let page = (595.0, 842.0);
        assert!(Region::new(10.0, 10.0, 60.0, 22.0)
            .validate(page.0, page.1)
            .is_ok());
        // 退化矩形
        assert!(Region::new(10.0, 10.0, 10.0, 22.0)
            .validate(page.0, page.1)
            .is_err());
        // 越界
        assert!(Region::new(10.0, 10.0, 600.0, 22.0)
            .validate(page.0, page.1)
            .is_err());
    }
}
