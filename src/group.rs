//! 按尺寸分组
//!
//! 检测结果按取整后的 (宽, 高) 精确分组，供人工/Agent 挑选目标尺寸。
//! 容差只在替换阶段生效，这里不做近似合并，也不过滤、不重排成员。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::RedactBox;

/// 分组键：一位小数的 (宽, 高)，以十分之一 point 存储
///
/// 用值类型而不是格式化字符串作键，避免格式化/locale 带来的歧义。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SizeKey {
    width_tenths: u32,
    height_tenths: u32,
}

impl SizeKey {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width_tenths: (width * 10.0).round() as u32,
            height_tenths: (height * 10.0).round() as u32,
        }
    }

    pub fn width(&self) -> f64 {
        self.width_tenths as f64 / 10.0
    }

    pub fn height(&self) -> f64 {
        self.height_tenths as f64 / 10.0
    }
}

/// 一组尺寸相同的候选框
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeGroup {
    pub width: f64,
    pub height: f64,
    pub count: usize,
    pub boxes: Vec<RedactBox>,
}

/// 将候选框按尺寸分组，分组顺序为尺寸首次出现的顺序
pub fn group_by_size(boxes: &[RedactBox]) -> Vec<SizeGroup> {
    let mut groups: Vec<SizeGroup> = Vec::new();
    let mut index: HashMap<SizeKey, usize> = HashMap::new();

    for b in boxes {
        let key = SizeKey::new(b.width, b.height);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(SizeGroup {
                width: key.width(),
                height: key.height(),
                count: 0,
                boxes: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].count += 1;
        groups[slot].boxes.push(b.clone());
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CoordinateMapper, RedactBox};

    fn make_box(x0: f64, y0: f64, w: f64, h: f64) -> RedactBox {
        let mapper = CoordinateMapper::new(1.0);
        RedactBox::from_pixels(
            0,
            &mapper,
            x0 as u32,
            y0 as u32,
            (x0 + w) as u32,
            (y0 + h) as u32,
        )
    }

    #[test]
    fn test_every_box_in_exactly_one_group() {
        let boxes = vec![
            make_box(50.0, 100.0, 50.0, 12.0),
            make_box(300.0, 100.0, 50.0, 12.0),
            make_box(50.0, 200.0, 120.0, 12.0),
        ];
        let groups = group_by_size(&boxes);

        assert_eq!(groups.len(), 2);
        let total: usize = groups.iter().map(|g| g.count).sum();
        assert_eq!(total, boxes.len());

        let mut counts: Vec<usize> = groups.iter().map(|g| g.count).collect();
        counts.sort();
        assert_eq!(counts, vec![1, 2]);

        // 分组键与成员的取整尺寸一致
        for g in &groups {
            for b in &g.boxes {
                assert_eq!(b.width, g.width);
                assert_eq!(b.height, g.height);
            }
        }
    }

    #[test]
    fn test_group_order_is_first_seen() {
        let boxes = vec![
            make_box(0.0, 0.0, 120.0, 12.0),
            make_box(0.0, 50.0, 50.0, 12.0),
            make_box(0.0, 100.0, 120.0, 12.0),
        ];
        let groups = group_by_size(&boxes);
        assert_eq!(groups[0].width, 120.0);
        assert_eq!(groups[1].width, 50.0);
    }

    #[test]
    fn test_size_key_tenths() {
        let a = SizeKey::new(50.0, 12.0);
        let b = SizeKey::new(50.04, 12.04);
        assert_eq!(a, b);
        assert_eq!(a.width(), 50.0);
        assert_eq!(a.height(), 12.0);
        assert_ne!(a, SizeKey::new(50.1, 12.0));
    }
}
