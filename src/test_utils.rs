// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/test_utils.rs - 测试用合成图像
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

use image::{Rgb, RgbImage};

use crate::frame::Frame;

pub const WHITE: Rgb<u8> = Rgb([240, 240, 240]);
pub const BLACK: Rgb<u8> = Rgb([20, 20, 20]);

/// 旋转矩形顶点，`width` 沿 `angle_deg` 方向（图像坐标系）
pub fn rotated_rect_vertices(cx: f64, cy: f64, width: f64, height: f64, angle_deg: f64) -> Vec<(f64, f64)> {
  let (s, c) = angle_deg.to_radians().sin_cos();
  let (hw, hh) = (width / 2.0, height / 2.0);
  [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)]
    .iter()
    .map(|&(u, v)| (cx + u * c - v * s, cy + u * s + v * c))
    .collect()
}

/// 星形顶点（外/内半径交替）
pub fn star_vertices(cx: f64, cy: f64, outer: f64, inner: f64, spikes: usize) -> Vec<(f64, f64)> {
  (0..spikes * 2)
    .map(|i| {
      let r = if i % 2 == 0 { outer } else { inner };
      let t = std::f64::consts::PI * i as f64 / spikes as f64;
      (cx + r * t.cos(), cy + r * t.sin())
    })
    .collect()
}

/// 正多边形顶点
pub fn regular_polygon_vertices(cx: f64, cy: f64, radius: f64, sides: usize) -> Vec<(f64, f64)> {
  (0..sides)
    .map(|i| {
      let t = std::f64::consts::TAU * i as f64 / sides as f64;
      (cx + radius * t.cos(), cy + radius * t.sin())
    })
    .collect()
}

pub fn canvas(width: u32, height: u32, background: Rgb<u8>) -> RgbImage {
  RgbImage::from_pixel(width, height, background)
}

/// 以像素坐标做奇偶规则判断，填充多边形
pub fn fill_polygon(image: &mut RgbImage, vertices: &[(f64, f64)], color: Rgb<u8>) {
  let n = vertices.len();
  for (x, y, pixel) in image.enumerate_pixels_mut() {
    let (px, py) = (x as f64, y as f64);
    let mut inside = false;
    for i in 0..n {
      let (xi, yi) = vertices[i];
      let (xj, yj) = vertices[(i + n - 1) % n];
      if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
        inside = !inside;
      }
    }
    if inside {
      *pixel = color;
    }
  }
}

/// 亮背景上一个暗色旋转矩形
pub fn frame_with_rect(width: u32, height: u32, rect: (f64, f64, f64, f64, f64)) -> Frame {
  let mut image = canvas(width, height, WHITE);
  let (cx, cy, w, h, deg) = rect;
  fill_polygon(&mut image, &rotated_rect_vertices(cx, cy, w, h, deg), BLACK);
  Frame::new(image).expect("non-empty canvas")
}
