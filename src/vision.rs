// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/vision.rs - 掩膜与轮廓提取
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use image::{GrayImage, RgbImage, imageops};
use imageproc::{
  contours::{BorderType, find_contours},
  contrast::{ThresholdType, otsu_level, threshold},
  distance_transform::Norm,
  edges::canny,
  filter::gaussian_blur_f32,
  geometry::contour_area,
  morphology::close,
  point::Point,
};
use tracing::debug;

/// 5x5 高斯核对应的 sigma
pub const BLUR_SIGMA: f32 = 1.1;

/// 二值化极性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
  /// 亮于阈值为前景
  Normal,
  /// 暗于阈值为前景（亮背景上的暗物体）
  Inverted,
}

/// 外轮廓及其面积
#[derive(Debug, Clone)]
pub struct Candidate {
  pub points: Vec<Point<i32>>,
  pub area: f64,
}

pub fn blurred_gray(image: &RgbImage, sigma: f32) -> GrayImage {
  let gray = imageops::grayscale(image);
  gaussian_blur_f32(&gray, sigma)
}

/// Otsu 自动阈值二值化，返回掩膜和所选阈值
pub fn binarize_otsu(gray: &GrayImage, polarity: Polarity) -> (GrayImage, u8) {
  let level = otsu_level(gray);
  let kind = match polarity {
    Polarity::Normal => ThresholdType::Binary,
    Polarity::Inverted => ThresholdType::BinaryInverted,
  };
  debug!("Otsu 阈值: {} ({:?})", level, polarity);
  (threshold(gray, level, kind), level)
}

/// 形态学闭运算，方形结构元，`radius` 为切比雪夫半径
///
/// 3x3 结构元迭代 n 次等价于半径 n。
pub fn close_mask(mask: &GrayImage, radius: u8) -> GrayImage {
  close(mask, Norm::LInf, radius)
}

/// 掩膜与 Canny 边缘取并集
pub fn edge_union(mask: &GrayImage, gray: &GrayImage, low: f32, high: f32) -> GrayImage {
  let edges = canny(gray, low, high);
  let mut union = mask.clone();
  for (dst, edge) in union.pixels_mut().zip(edges.pixels()) {
    dst.0[0] = dst.0[0].max(edge.0[0]);
  }
  union
}

/// 只保留最外层轮廓（不在任何孔洞内部的外边界）
pub fn external_contours(mask: &GrayImage) -> Vec<Candidate> {
  find_contours::<i32>(mask)
    .into_iter()
    .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
    .map(|c| {
      let area = contour_area(&c.points);
      Candidate {
        points: c.points,
        area,
      }
    })
    .collect()
}

/// 面积最大者；面积相同时保留提取顺序中靠前的轮廓
pub fn largest_candidate<'a>(candidates: impl Iterator<Item = &'a Candidate>) -> Option<&'a Candidate> {
  candidates.fold(None, |best: Option<&Candidate>, c| match best {
    Some(b) if b.area >= c.area => Some(b),
    _ => Some(c),
  })
}
