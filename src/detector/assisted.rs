// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/detector/assisted.rs - 候选框辅助的矩形检测
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

use std::{cmp::Ordering, collections::BTreeSet};

use tracing::{debug, info, warn};

use crate::{
  detector::{PoseError, PoseEstimator},
  frame::Frame,
  geometry::{AngleConvention, OrientedBox, fit_oriented_box},
  model::{DetectResult, Model, ProposedRegion},
  pose::PoseEstimate,
  vision::{BLUR_SIGMA, Polarity, binarize_otsu, blurred_gray, edge_union, external_contours, largest_candidate},
};

/// 按类别编号或名称（不区分大小写）匹配的类别集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFilter {
  ids: BTreeSet<u32>,
  names: BTreeSet<String>,
}

impl ClassFilter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_id(mut self, id: u32) -> Self {
    self.ids.insert(id);
    self
  }

  pub fn with_name(mut self, name: &str) -> Self {
    self.names.insert(name.to_lowercase());
    self
  }

  /// 纯数字视为类别编号，其余视为类别名称
  pub fn with_label(self, label: &str) -> Self {
    match label.trim().parse::<u32>() {
      Ok(id) => self.with_id(id),
      Err(_) => self.with_name(label.trim()),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.ids.is_empty() && self.names.is_empty()
  }

  pub fn matches(&self, class_id: u32, class_name: &str) -> bool {
    self.ids.contains(&class_id) || self.names.contains(&class_name.to_lowercase())
  }
}

impl<S: AsRef<str>> FromIterator<S> for ClassFilter {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    iter
      .into_iter()
      .fold(Self::new(), |filter, label| filter.with_label(label.as_ref()))
  }
}

/// 候选框筛选与框内精修参数
#[derive(Debug, Clone, PartialEq)]
pub struct AssistConfig {
  /// 置信度须严格大于该值
  pub min_confidence: f32,
  /// 非空时类别必须在其中
  pub allowed: ClassFilter,
  /// 优先于 `allowed`
  pub blocked: ClassFilter,
  /// 候选框面积占整帧比例的下限（含）
  pub min_area_ratio: f64,
  /// 候选框面积占整帧比例的上限（不含）
  pub max_area_ratio: f64,
  pub blur_sigma: f32,
  pub canny_low: f32,
  pub canny_high: f32,
  /// 框内轮廓面积的固定下限（像素²）
  pub min_refine_area: f64,
  /// 框内轮廓面积下限，相对裁剪区域面积
  pub min_refine_area_ratio: f64,
}

impl Default for AssistConfig {
  fn default() -> Self {
    Self {
      min_confidence: 0.5,
      allowed: ClassFilter::default(),
      blocked: ClassFilter::default(),
      min_area_ratio: 0.005,
      max_area_ratio: 0.5,
      blur_sigma: BLUR_SIGMA,
      canny_low: 50.0,
      canny_high: 150.0,
      min_refine_area: 50.0,
      min_refine_area_ratio: 0.003,
    }
  }
}

impl AssistConfig {
  pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
    self.min_confidence = min_confidence;
    self
  }

  pub fn with_allowed(mut self, allowed: ClassFilter) -> Self {
    self.allowed = allowed;
    self
  }

  pub fn with_blocked(mut self, blocked: ClassFilter) -> Self {
    self.blocked = blocked;
    self
  }

  pub fn with_area_range(mut self, min_ratio: f64, max_ratio: f64) -> Self {
    self.min_area_ratio = min_ratio;
    self.max_area_ratio = max_ratio;
    self
  }

  /// 依次筛选候选框，返回通过全部条件且置信度最高的一个
  ///
  /// 每接受一个候选框，置信度门限就提高到它的置信度；
  /// 置信度相同时先出现的保留。
  pub fn select_proposal<'a>(&self, items: &'a [ProposedRegion], frame_area: f64) -> Option<&'a ProposedRegion> {
    let mut threshold = self.min_confidence;
    let mut best = None;

    for item in items {
      if item.score.partial_cmp(&threshold) != Some(Ordering::Greater) {
        continue;
      }
      if self.blocked.matches(item.class_id, &item.class_name) {
        debug!("类别 {}({}) 在屏蔽列表中", item.class_name, item.class_id);
        continue;
      }
      if !self.allowed.is_empty() && !self.allowed.matches(item.class_id, &item.class_name) {
        debug!("类别 {}({}) 不在允许列表中", item.class_name, item.class_id);
        continue;
      }
      if item.is_degenerate() {
        debug!("候选框坐标无效: {:?}", item.bbox);
        continue;
      }
      let ratio = item.area() as f64 / frame_area;
      if !(self.min_area_ratio..self.max_area_ratio).contains(&ratio) {
        debug!("候选框面积比例 {:.4} 超出范围", ratio);
        continue;
      }

      threshold = item.score;
      best = Some(item);
    }

    best
  }
}

/// 框内精修的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refinement {
  /// 精修成功，坐标已换算回整帧
  Refined(OrientedBox),
  /// 精修失败，退回候选框本身（角度为 0）
  RawBox,
}

/// 选中的候选框及其精修结果
#[derive(Debug, Clone, PartialEq)]
pub struct AssistedMatch {
  pub proposal: ProposedRegion,
  pub refinement: Refinement,
}

impl AssistedMatch {
  pub fn center(&self) -> (f32, f32) {
    match &self.refinement {
      Refinement::Refined(rect) => (rect.cx, rect.cy),
      Refinement::RawBox => {
        let [x1, y1, x2, y2] = self.proposal.bbox;
        ((x1 + x2) / 2.0, (y1 + y2) / 2.0)
      }
    }
  }

  pub fn angle(&self) -> f32 {
    match &self.refinement {
      Refinement::Refined(rect) => rect.angle,
      Refinement::RawBox => 0.0,
    }
  }

  pub fn corners(&self) -> [(f32, f32); 4] {
    match &self.refinement {
      Refinement::Refined(rect) => rect.corners.map(|p| (p.x, p.y)),
      Refinement::RawBox => {
        let [x1, y1, x2, y2] = self.proposal.bbox;
        [(x1, y1), (x2, y1), (x2, y2), (x1, y2)]
      }
    }
  }

  pub fn is_refined(&self) -> bool {
    matches!(self.refinement, Refinement::Refined(_))
  }
}

/// 在候选框内重新做一次阈值 + 边缘的轮廓拟合
pub fn refine(frame: &Frame, bbox: [f32; 4], config: &AssistConfig) -> Refinement {
  let clamp = |v: f32, limit: u32| v.clamp(0.0, limit as f32) as u32;
  let x1 = clamp(bbox[0], frame.width());
  let y1 = clamp(bbox[1], frame.height());
  let x2 = clamp(bbox[2], frame.width());
  let y2 = clamp(bbox[3], frame.height());

  let Some(crop) = frame.crop(x1, y1, x2.saturating_sub(x1), y2.saturating_sub(y1)) else {
    warn!("候选框裁剪后为空: {:?}", bbox);
    return Refinement::RawBox;
  };

  let gray = blurred_gray(&crop, config.blur_sigma);
  let (mask, _) = binarize_otsu(&gray, Polarity::Normal);
  let mask = edge_union(&mask, &gray, config.canny_low, config.canny_high);

  let contours = external_contours(&mask);
  debug!("框内找到 {} 个外轮廓", contours.len());
  let Some(best) = largest_candidate(contours.iter()) else {
    return Refinement::RawBox;
  };

  let crop_area = f64::from(crop.width()) * f64::from(crop.height());
  let min_area = config.min_refine_area.max(config.min_refine_area_ratio * crop_area);
  if best.area < min_area {
    debug!("框内轮廓面积 {} 小于 {}", best.area, min_area);
    return Refinement::RawBox;
  }

  match fit_oriented_box(&best.points, AngleConvention::AspectFlip) {
    Some(rect) => Refinement::Refined(rect.translate(x1 as f32, y1 as f32)),
    None => Refinement::RawBox,
  }
}

/// 外部检测器给出候选框，再在框内精修位置与角度
#[derive(Debug, Clone)]
pub struct AssistedDetector<M> {
  model: M,
  config: AssistConfig,
}

impl<M> AssistedDetector<M>
where
  M: Model<Input = Frame, Output = DetectResult>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(model: M, config: AssistConfig) -> Self {
    Self { model, config }
  }

  pub fn detect(&self, frame: &Frame) -> Result<Option<AssistedMatch>, PoseError> {
    let proposals = self
      .model
      .infer(frame)
      .map_err(|e| PoseError::Proposal(Box::new(e)))?;
    debug!("检测器给出 {} 个候选框", proposals.len());

    let Some(proposal) = self.config.select_proposal(&proposals.items, frame.area()) else {
      debug!("没有通过筛选的候选框");
      return Ok(None);
    };

    let refinement = refine(frame, proposal.bbox, &self.config);
    let found = AssistedMatch {
      proposal: proposal.clone(),
      refinement,
    };
    let (cx, cy) = found.center();
    info!(
      "选中 {}({}) 置信度={:.2} 中心=({:.1},{:.1}) 角度={:.1} 精修={}",
      found.proposal.class_name,
      found.proposal.class_id,
      found.proposal.score,
      cx,
      cy,
      found.angle(),
      found.is_refined()
    );
    Ok(Some(found))
  }
}

impl<M> PoseEstimator for AssistedDetector<M>
where
  M: Model<Input = Frame, Output = DetectResult>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  fn estimate(&self, frame: &Frame) -> Result<PoseEstimate, PoseError> {
    Ok(PoseEstimate::from(self.detect(frame)?))
  }
}
