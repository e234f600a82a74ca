// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/detector.rs - 位姿估计器
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

use image::RgbImage;
use thiserror::Error;

use crate::{
  frame::{Frame, FrameError},
  model::{DetectResult, FixedProposals, Model},
  pose::PoseEstimate,
};

#[derive(Error, Debug)]
pub enum PoseError {
  #[error("输入图像无效: {0}")]
  InvalidFrame(#[from] FrameError),
  #[error("候选框推理失败: {0}")]
  Proposal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// 单帧位姿估计；每次调用互不影响，不读写调用之外的状态
pub trait PoseEstimator {
  fn estimate(&self, frame: &Frame) -> Result<PoseEstimate, PoseError>;

  fn estimate_image(&self, image: RgbImage) -> Result<PoseEstimate, PoseError> {
    let frame = Frame::new(image)?;
    self.estimate(&frame)
  }
}

impl<E: PoseEstimator + ?Sized> PoseEstimator for &E {
  fn estimate(&self, frame: &Frame) -> Result<PoseEstimate, PoseError> {
    (**self).estimate(frame)
  }
}

/// 命令行可选择的两种流程
pub enum Estimator<M = FixedProposals> {
  Geometric(GeometricDetector),
  Assisted(AssistedDetector<M>),
}

impl<M> PoseEstimator for Estimator<M>
where
  M: Model<Input = Frame, Output = DetectResult>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  fn estimate(&self, frame: &Frame) -> Result<PoseEstimate, PoseError> {
    match self {
      Estimator::Geometric(detector) => detector.estimate(frame),
      Estimator::Assisted(detector) => detector.estimate(frame),
    }
  }
}

mod assisted;
mod geometric;
pub use self::assisted::{AssistConfig, AssistedDetector, AssistedMatch, ClassFilter, Refinement};
pub use self::geometric::{GeometricDetector, GeometricParams};
