// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/model.rs - 外部检测模型接口
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

use serde::{Deserialize, Serialize};

/// 候选区域提供者（外部检测器），每次估计只调用一次 `infer`
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

impl<M: Model + ?Sized> Model for &M {
  type Input = M::Input;
  type Output = M::Output;
  type Error = M::Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    (**self).infer(input)
  }
}

/// 检测器给出的一个轴对齐候选框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedRegion {
  pub class_id: u32,
  pub class_name: String,
  /// 置信度 [0, 1]
  #[serde(alias = "confidence")]
  pub score: f32,
  pub bbox: [f32; 4], // [x_min, y_min, x_max, y_max]，整帧像素坐标
}

impl ProposedRegion {
  pub fn width(&self) -> f32 {
    self.bbox[2] - self.bbox[0]
  }

  pub fn height(&self) -> f32 {
    self.bbox[3] - self.bbox[1]
  }

  /// 坐标颠倒（`x_max <= x_min` 或 `y_max <= y_min`）时为 0
  pub fn area(&self) -> f32 {
    self.width().max(0.0) * self.height().max(0.0)
  }

  pub fn is_degenerate(&self) -> bool {
    !(self.width() > 0.0 && self.height() > 0.0)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectResult {
  pub items: Box<[ProposedRegion]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }
}

impl From<Vec<ProposedRegion>> for DetectResult {
  fn from(items: Vec<ProposedRegion>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

mod fixed;
pub use self::fixed::{FixedProposals, FixedProposalsError};
