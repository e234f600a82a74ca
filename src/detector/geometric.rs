// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/detector/geometric.rs - 基于轮廓的全帧矩形检测
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

use imageproc::geometry::{approximate_polygon_dp, arc_length};
use tracing::{debug, info};

use crate::{
  detector::{PoseError, PoseEstimator},
  frame::Frame,
  geometry::{AngleConvention, OrientedBox, fit_oriented_box},
  pose::PoseEstimate,
  vision::{
    BLUR_SIGMA, Candidate, Polarity, binarize_otsu, blurred_gray, close_mask, external_contours,
    largest_candidate,
  },
};

/// 几何检测参数
#[derive(Debug, Clone, PartialEq)]
pub struct GeometricParams {
  pub blur_sigma: f32,
  /// 闭运算半径（3x3 结构元的迭代次数）
  pub close_radius: u8,
  /// 轮廓面积下限，相对整帧面积
  pub min_area_ratio: f64,
  /// 多边形近似容差，相对周长
  pub approx_epsilon_ratio: f64,
  pub min_vertices: usize,
  pub max_vertices: usize,
}

impl Default for GeometricParams {
  fn default() -> Self {
    Self {
      blur_sigma: BLUR_SIGMA,
      close_radius: 2,
      min_area_ratio: 0.01,
      approx_epsilon_ratio: 0.02,
      min_vertices: 4,
      max_vertices: 8,
    }
  }
}

/// 无先验的全帧矩形检测：假设亮背景上的暗色物体
#[derive(Debug, Clone, Default)]
pub struct GeometricDetector {
  params: GeometricParams,
}

impl GeometricDetector {
  pub fn new(params: GeometricParams) -> Self {
    Self { params }
  }

  pub fn detect(&self, frame: &Frame) -> Option<OrientedBox> {
    debug!("帧尺寸: {}x{}", frame.width(), frame.height());

    let gray = blurred_gray(frame.as_image(), self.params.blur_sigma);
    let (mask, _) = binarize_otsu(&gray, Polarity::Inverted);
    let mask = close_mask(&mask, self.params.close_radius);

    let contours = external_contours(&mask);
    debug!("找到 {} 个外轮廓", contours.len());

    let min_area = self.params.min_area_ratio * frame.area();
    let best = largest_candidate(contours.iter().filter(|c| self.is_rectangular(c, min_area)));

    let Some(best) = best else {
      debug!("没有符合条件的矩形");
      return None;
    };

    let rect = fit_oriented_box(&best.points, AngleConvention::NegativeFlip)?;
    info!(
      "选中矩形 中心=({:.1},{:.1}) 角度={:.1}",
      rect.cx, rect.cy, rect.angle
    );
    Some(rect)
  }

  /// 面积与近似顶点数过滤
  fn is_rectangular(&self, candidate: &Candidate, min_area: f64) -> bool {
    debug!("轮廓面积: {}", candidate.area);
    if candidate.area < min_area {
      return false;
    }

    let epsilon = self.params.approx_epsilon_ratio * arc_length(&candidate.points, true);
    if epsilon <= 0.0 {
      return false;
    }
    let vertices = approximate_polygon_dp(&candidate.points, epsilon, true).len();
    debug!("近似顶点数: {}", vertices);

    (self.params.min_vertices..=self.params.max_vertices).contains(&vertices)
  }
}

impl PoseEstimator for GeometricDetector {
  fn estimate(&self, frame: &Frame) -> Result<PoseEstimate, PoseError> {
    Ok(PoseEstimate::from(self.detect(frame)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{
    BLACK, WHITE, canvas, fill_polygon, frame_with_rect, regular_polygon_vertices, rotated_rect_vertices,
    star_vertices,
  };
  use approx::assert_abs_diff_eq;

  #[test]
  fn finds_rotated_rectangle() {
    let frame = frame_with_rect(640, 480, (320.0, 240.0, 100.0, 60.0, 15.0));
    let rect = GeometricDetector::default().detect(&frame).unwrap();
    assert_abs_diff_eq!(rect.angle, 15.0, epsilon = 1.0);
    assert_abs_diff_eq!(rect.cx, 320.0, epsilon = 2.0);
    assert_abs_diff_eq!(rect.cy, 240.0, epsilon = 2.0);
    assert_abs_diff_eq!(rect.area(), 6000.0, epsilon = 600.0);
  }

  #[test]
  fn negative_rotation_stays_negative() {
    let frame = frame_with_rect(640, 480, (300.0, 200.0, 120.0, 70.0, -20.0));
    let rect = GeometricDetector::default().detect(&frame).unwrap();
    assert_abs_diff_eq!(rect.angle, -20.0, epsilon = 1.0);
  }

  #[test]
  fn blank_frame_is_not_found() {
    let frame = Frame::new(canvas(320, 240, WHITE)).unwrap();
    assert!(GeometricDetector::default().detect(&frame).is_none());
    let pose = GeometricDetector::default().estimate(&frame).unwrap();
    assert_eq!(pose, PoseEstimate::not_found());
  }

  #[test]
  fn area_below_one_percent_is_rejected() {
    // 640x480 的 0.5% 约为 1536 像素
    let frame = frame_with_rect(640, 480, (200.0, 200.0, 48.0, 32.0, 0.0));
    assert!(GeometricDetector::default().detect(&frame).is_none());

    let mut image = frame.into_image();
    fill_polygon(&mut image, &rotated_rect_vertices(450.0, 300.0, 96.0, 64.0, 10.0), BLACK);
    let rect = GeometricDetector::default().detect(&Frame::new(image).unwrap()).unwrap();
    assert_abs_diff_eq!(rect.cx, 450.0, epsilon = 2.0);
    assert_abs_diff_eq!(rect.cy, 300.0, epsilon = 2.0);
  }

  #[test]
  fn triangle_star_and_decagon_are_never_selected() {
    let mut image = canvas(800, 600, WHITE);
    fill_polygon(&mut image, &[(20.0, 20.0), (300.0, 40.0), (120.0, 300.0)], BLACK);
    fill_polygon(&mut image, &star_vertices(470.0, 300.0, 150.0, 70.0, 6), BLACK);
    // 十边形面积最大，近似顶点数刚超过上限
    fill_polygon(&mut image, &regular_polygon_vertices(170.0, 460.0, 120.0, 10), BLACK);
    let frame = Frame::new(image.clone()).unwrap();
    assert!(GeometricDetector::default().detect(&frame).is_none());

    // 加一个比它们都小的矩形，只能选中矩形
    fill_polygon(&mut image, &rotated_rect_vertices(500.0, 80.0, 120.0, 60.0, 5.0), BLACK);
    let rect = GeometricDetector::default().detect(&Frame::new(image).unwrap()).unwrap();
    assert_abs_diff_eq!(rect.cx, 500.0, epsilon = 2.0);
    assert_abs_diff_eq!(rect.cy, 80.0, epsilon = 2.0);
  }

  #[test]
  fn largest_rectangle_wins() {
    let mut image = canvas(640, 480, WHITE);
    fill_polygon(&mut image, &rotated_rect_vertices(150.0, 150.0, 90.0, 60.0, 0.0), BLACK);
    fill_polygon(&mut image, &rotated_rect_vertices(450.0, 300.0, 160.0, 100.0, 25.0), BLACK);
    let rect = GeometricDetector::default().detect(&Frame::new(image).unwrap()).unwrap();
    assert_abs_diff_eq!(rect.cx, 450.0, epsilon = 2.0);
    assert_abs_diff_eq!(rect.angle, 25.0, epsilon = 1.0);
  }

  #[test]
  fn repeated_calls_are_identical() {
    let frame = frame_with_rect(320, 240, (150.0, 120.0, 80.0, 40.0, 33.0));
    let detector = GeometricDetector::default();
    let first = detector.estimate(&frame).unwrap();
    for _ in 0..3 {
      assert_eq!(detector.estimate(&frame).unwrap(), first);
    }
  }
}
