// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/geometry.rs - 轮廓几何与最小外接旋转矩形
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

use imageproc::{geometry::convex_hull, point::Point};

const DEGENERATE_EPS: f64 = 1e-6;

/// 角度归一化规则
///
/// 原始角度为“宽”边方向，取值区间 [-90, 0)，图像坐标系（x 向右，y 向下）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleConvention {
  /// 全帧几何检测：原始角度小于 -45° 时加 90°，输出区间 [-45, 45)
  NegativeFlip,
  /// 候选框细化：宽小于高时加 90°，输出跟随长边，区间 [-90, 90)
  AspectFlip,
}

impl AngleConvention {
  pub fn normalize(self, raw_angle: f32, width: f32, height: f32) -> f32 {
    match self {
      AngleConvention::NegativeFlip if raw_angle < -45.0 => raw_angle + 90.0,
      AngleConvention::AspectFlip if width < height => raw_angle + 90.0,
      _ => raw_angle,
    }
  }
}

/// 旋转矩形
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
  pub cx: f32,
  pub cy: f32,
  pub width: f32,
  pub height: f32,
  /// 归一化之后的角度（度）
  pub angle: f32,
  /// 四个顶点，按 box points 顺序；不保证顺/逆时针
  pub corners: [Point<f32>; 4],
}

impl OrientedBox {
  /// 平移到另一坐标系（例如从裁剪区域回到整帧）
  pub fn translate(self, dx: f32, dy: f32) -> Self {
    Self {
      cx: self.cx + dx,
      cy: self.cy + dy,
      corners: self.corners.map(|p| Point::new(p.x + dx, p.y + dy)),
      ..self
    }
  }

  pub fn area(&self) -> f32 {
    self.width * self.height
  }
}

/// 计算点集的最小外接旋转矩形，并按给定规则归一化角度。
///
/// 点集为空、或结果矩形宽/高为零时返回 `None`。
pub fn fit_oriented_box(points: &[Point<i32>], convention: AngleConvention) -> Option<OrientedBox> {
  if points.is_empty() {
    return None;
  }

  // 细线轮廓会重复经过同一像素，凸包排序要求点互不相同
  let mut points = points.to_vec();
  points.sort_by_key(|p| (p.x, p.y));
  points.dedup();

  let hull: Vec<Point<f64>> = convex_hull(points)
    .into_iter()
    .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
    .collect();
  let raw = min_area_rect(&hull)?;

  if raw.width <= DEGENERATE_EPS || raw.height <= DEGENERATE_EPS {
    return None;
  }

  let corners = box_points(raw.cx, raw.cy, raw.width, raw.height, raw.angle)
    .map(|p| Point::new(p.x as f32, p.y as f32));
  let (width, height) = (raw.width as f32, raw.height as f32);

  Some(OrientedBox {
    cx: raw.cx as f32,
    cy: raw.cy as f32,
    width,
    height,
    angle: convention.normalize(raw.angle as f32, width, height),
    corners,
  })
}

struct RawRect {
  cx: f64,
  cy: f64,
  width: f64,
  height: f64,
  angle: f64,
}

/// 旋转卡壳：以凸包每条边为基准求外接矩形，取面积最小者（相等时保留先出现的边）
fn min_area_rect(hull: &[Point<f64>]) -> Option<RawRect> {
  let n = hull.len();
  if n < 3 {
    return None;
  }

  let mut best: Option<(f64, RawRect)> = None;

  for i in 0..n {
    let p1 = hull[i];
    let p2 = hull[(i + 1) % n];
    let (ex, ey) = (p2.x - p1.x, p2.y - p1.y);
    let len = ex.hypot(ey);
    if len < DEGENERATE_EPS {
      continue;
    }

    let (ux, uy) = (ex / len, ey / len);
    let (vx, vy) = (-uy, ux);

    let (mut min_u, mut max_u) = (f64::MAX, f64::MIN);
    let (mut min_v, mut max_v) = (f64::MAX, f64::MIN);
    for p in hull {
      let (dx, dy) = (p.x - p1.x, p.y - p1.y);
      let u = dx * ux + dy * uy;
      let v = dx * vx + dy * vy;
      min_u = min_u.min(u);
      max_u = max_u.max(u);
      min_v = min_v.min(v);
      max_v = max_v.max(v);
    }

    let width = max_u - min_u;
    let height = max_v - min_v;
    let area = width * height;
    if best.as_ref().is_some_and(|(best_area, _)| area >= *best_area) {
      continue;
    }

    let cu = (min_u + max_u) / 2.0;
    let cv = (min_v + max_v) / 2.0;
    let rect = canonical_rect(
      p1.x + cu * ux + cv * vx,
      p1.y + cu * uy + cv * vy,
      width,
      height,
      uy.atan2(ux).to_degrees(),
    );
    best = Some((area, rect));
  }

  best.map(|(_, rect)| rect)
}

/// 把边方向折叠到 [-90, 0)，方向旋转 90° 时宽高互换
fn canonical_rect(cx: f64, cy: f64, width: f64, height: f64, direction: f64) -> RawRect {
  let mut angle = direction;
  if angle >= 90.0 {
    angle -= 180.0;
  } else if angle < -90.0 {
    angle += 180.0;
  }

  if angle >= 0.0 {
    RawRect {
      cx,
      cy,
      width: height,
      height: width,
      angle: angle - 90.0,
    }
  } else {
    RawRect {
      cx,
      cy,
      width,
      height,
      angle,
    }
  }
}

/// 由中心、尺寸、角度求矩形四个顶点
pub fn box_points(cx: f64, cy: f64, width: f64, height: f64, angle_deg: f64) -> [Point<f64>; 4] {
  let theta = angle_deg.to_radians();
  let a = theta.sin() * 0.5;
  let b = theta.cos() * 0.5;

  let p0 = Point::new(cx - a * height - b * width, cy + b * height - a * width);
  let p1 = Point::new(cx + a * height - b * width, cy - b * height - a * width);
  let p2 = Point::new(2.0 * cx - p0.x, 2.0 * cy - p0.y);
  let p3 = Point::new(2.0 * cx - p1.x, 2.0 * cy - p1.y);
  [p0, p1, p2, p3]
}
