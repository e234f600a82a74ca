// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/frame.rs - RGB 帧定义
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

use image::{RgbImage, imageops};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
  #[error("图像尺寸为空: {0}x{1}")]
  Empty(u32, u32),
}

/// 单帧彩色图像（8 位 RGB），估计过程中只读
#[derive(Debug, Clone)]
pub struct Frame {
  image: RgbImage,
}

impl Frame {
  pub fn new(image: RgbImage) -> Result<Self, FrameError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
      return Err(FrameError::Empty(width, height));
    }
    Ok(Self { image })
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  /// 帧面积（像素数）
  pub fn area(&self) -> f64 {
    self.width() as f64 * self.height() as f64
  }

  pub fn as_image(&self) -> &RgbImage {
    &self.image
  }

  pub fn into_image(self) -> RgbImage {
    self.image
  }

  /// 裁剪子区域，区域会被截断到帧内；截断后为空则返回 None
  pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Option<RgbImage> {
    let x = x.min(self.width());
    let y = y.min(self.height());
    let width = width.min(self.width() - x);
    let height = height.min(self.height() - y);
    if width == 0 || height == 0 {
      return None;
    }
    Some(imageops::crop_imm(&self.image, x, y, width, height).to_image())
  }
}

impl TryFrom<RgbImage> for Frame {
  type Error = FrameError;

  fn try_from(image: RgbImage) -> Result<Self, Self::Error> {
    Frame::new(image)
  }
}

impl AsRef<RgbImage> for Frame {
  fn as_ref(&self) -> &RgbImage {
    &self.image
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_zero_sized_image() {
    assert_eq!(
      Frame::new(RgbImage::new(0, 10)).unwrap_err(),
      FrameError::Empty(0, 10)
    );
    assert!(Frame::try_from(RgbImage::new(4, 0)).is_err());
  }

  #[test]
  fn crop_is_clipped_to_frame() {
    let frame = Frame::new(RgbImage::new(20, 10)).unwrap();
    let crop = frame.crop(15, 5, 30, 30).unwrap();
    assert_eq!(crop.dimensions(), (5, 5));
    assert!(frame.crop(20, 0, 5, 5).is_none());
    assert!(frame.crop(0, 0, 0, 5).is_none());
  }
}
