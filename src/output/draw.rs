// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/output/draw.rs - 位姿结果可视化
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

use std::{
  fs::File,
  io::{BufWriter, Write},
  path::Path,
};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::{frame::Frame, pose::PoseEstimate};

const BOX_COLOR: [u8; 3] = [0, 255, 255]; // 青色
const CENTER_COLOR: [u8; 3] = [255, 128, 0]; // 橙色
const CENTER_RADIUS: i32 = 6;
const HEADING_LENGTH: f32 = 50.0;
const LINE_THICKNESS: i32 = 2;

/// 在帧上叠加旋转框、中心点和朝向线
pub struct Draw {
  box_color: [u8; 3],
  center_color: [u8; 3],
  center_radius: i32,
  heading_length: f32,
  line_thickness: i32,
}

impl Default for Draw {
  fn default() -> Self {
    Self {
      box_color: BOX_COLOR,
      center_color: CENTER_COLOR,
      center_radius: CENTER_RADIUS,
      heading_length: HEADING_LENGTH,
      line_thickness: LINE_THICKNESS,
    }
  }
}

impl Draw {
  fn draw_thick_line(&self, image: &mut RgbImage, start: (f32, f32), end: (f32, f32), color: [u8; 3]) {
    let half = self.line_thickness / 2;
    for dx in -half..=half {
      for dy in -half..=half {
        let (dx, dy) = (dx as f32, dy as f32);
        draw_line_segment_mut(image, (start.0 + dx, start.1 + dy), (end.0 + dx, end.1 + dy), Rgb(color));
      }
    }
  }

  /// 未找到目标时不做任何绘制
  pub fn draw_pose_on_image(&self, image: &mut RgbImage, pose: &PoseEstimate) {
    if let Some(corners) = pose.corners {
      for i in 0..corners.len() {
        let next = corners[(i + 1) % corners.len()];
        self.draw_thick_line(image, corners[i], next, self.box_color);
      }
    }

    let Some((cx, cy)) = pose.center() else {
      return;
    };

    if let Some(theta) = pose.theta_deg {
      let rad = theta.to_radians();
      let tip = (cx + self.heading_length * rad.cos(), cy + self.heading_length * rad.sin());
      self.draw_thick_line(image, (cx, cy), tip, self.center_color);
    }

    draw_filled_circle_mut(
      image,
      (cx.round() as i32, cy.round() as i32),
      self.center_radius,
      Rgb(self.center_color),
    );
  }

  pub fn draw_pose(&self, frame: &Frame, pose: &PoseEstimate) -> RgbImage {
    let mut image = frame.as_image().clone();
    self.draw_pose_on_image(&mut image, pose);
    image
  }
}

/// 以带缩进的 JSON 写出位姿
pub fn write_record(pose: &PoseEstimate, path: &Path) -> Result<(), std::io::Error> {
  let mut writer = BufWriter::new(File::create(path)?);
  serde_json::to_writer_pretty(&mut writer, pose)?;
  writer.write_all(b"\n")?;
  writer.flush()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pose_at(cx: f32, cy: f32) -> PoseEstimate {
    PoseEstimate {
      found: true,
      x_px: Some(cx),
      y_px: Some(cy),
      theta_deg: Some(0.0),
      corners: Some([(10.0, 10.0), (50.0, 10.0), (50.0, 40.0), (10.0, 40.0)]),
      ..PoseEstimate::default()
    }
  }

  #[test]
  fn draws_box_center_and_heading() {
    let frame = Frame::new(RgbImage::new(100, 60)).unwrap();
    let image = Draw::default().draw_pose(&frame, &pose_at(30.0, 25.0));

    assert_eq!(image.get_pixel(30, 10).0, BOX_COLOR);
    assert_eq!(image.get_pixel(10, 25).0, BOX_COLOR);
    assert_eq!(image.get_pixel(30, 25).0, CENTER_COLOR);
    // 朝向线沿 0° 指向右侧
    assert_eq!(image.get_pixel(70, 25).0, CENTER_COLOR);
    assert_eq!(image.get_pixel(30, 50).0, [0, 0, 0]);
  }

  #[test]
  fn not_found_leaves_frame_untouched() {
    let frame = Frame::new(RgbImage::new(20, 20)).unwrap();
    let image = Draw::default().draw_pose(&frame, &PoseEstimate::not_found());
    assert_eq!(&image, frame.as_image());
  }
}
