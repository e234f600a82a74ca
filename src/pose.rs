// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/pose.rs - 位姿结果
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

use crate::{detector::AssistedMatch, geometry::OrientedBox};

/// 单次估计的输出
///
/// 未找到目标时除 `found` 外所有字段均为空，序列化时省略。
/// 毫米坐标字段保留给下游标定，本模块始终不填。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
  pub found: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub x_px: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub y_px: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub theta_deg: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub x_mm: Option<f32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub y_mm: Option<f32>,
  #[serde(rename = "box", default, skip_serializing_if = "Option::is_none")]
  pub corners: Option<[(f32, f32); 4]>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub class_id: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub class_name: Option<String>,
}

impl PoseEstimate {
  pub fn not_found() -> Self {
    Self::default()
  }

  pub fn from_oriented(rect: &OrientedBox) -> Self {
    Self {
      found: true,
      x_px: Some(rect.cx),
      y_px: Some(rect.cy),
      theta_deg: Some(rect.angle),
      corners: Some(rect.corners.map(|p| (p.x, p.y))),
      ..Self::default()
    }
  }

  pub fn from_assisted(found: &AssistedMatch) -> Self {
    let (x, y) = found.center();
    Self {
      found: true,
      x_px: Some(x),
      y_px: Some(y),
      theta_deg: Some(found.angle()),
      corners: Some(found.corners()),
      class_id: Some(found.proposal.class_id),
      class_name: Some(found.proposal.class_name.clone()),
      ..Self::default()
    }
  }

  pub fn center(&self) -> Option<(f32, f32)> {
    self.x_px.zip(self.y_px)
  }
}

impl From<Option<OrientedBox>> for PoseEstimate {
  fn from(rect: Option<OrientedBox>) -> Self {
    rect
      .as_ref()
      .map_or_else(PoseEstimate::not_found, PoseEstimate::from_oriented)
  }
}

impl From<Option<AssistedMatch>> for PoseEstimate {
  fn from(found: Option<AssistedMatch>) -> Self {
    found
      .as_ref()
      .map_or_else(PoseEstimate::not_found, PoseEstimate::from_assisted)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    detector::Refinement,
    geometry::{AngleConvention, fit_oriented_box},
    model::ProposedRegion,
  };
  use imageproc::point::Point;
  use serde_json::json;

  #[test]
  fn not_found_serializes_only_flag() {
    let value = serde_json::to_value(PoseEstimate::not_found()).unwrap();
    assert_eq!(value, json!({ "found": false }));
  }

  #[test]
  fn oriented_box_fills_position_fields() {
    let outline = [Point::new(30, 25), Point::new(50, 25), Point::new(50, 35), Point::new(30, 35)];
    let rect = fit_oriented_box(&outline, AngleConvention::NegativeFlip);
    let pose = PoseEstimate::from(rect);
    assert!(pose.found);
    assert_eq!(pose.center(), rect.map(|r| (r.cx, r.cy)));
    assert!(pose.corners.is_some());
    assert!(pose.class_id.is_none() && pose.class_name.is_none());
    assert!(pose.x_mm.is_none() && pose.y_mm.is_none());

    let value = serde_json::to_value(&pose).unwrap();
    assert_eq!(value["box"].as_array().map(Vec::len), Some(4));
    assert!(value.get("x_mm").is_none());
    assert!(value.get("class_id").is_none());
  }

  #[test]
  fn assisted_match_carries_class() {
    let found = AssistedMatch {
      proposal: ProposedRegion {
        class_id: 2,
        class_name: "carton".to_string(),
        score: 0.9,
        bbox: [10.0, 10.0, 30.0, 20.0],
      },
      refinement: Refinement::RawBox,
    };
    let pose = PoseEstimate::from(Some(found));
    assert_eq!(pose.class_id, Some(2));
    assert_eq!(pose.class_name.as_deref(), Some("carton"));
    assert_eq!(pose.theta_deg, Some(0.0));
    assert_eq!(pose.center(), Some((20.0, 15.0)));

    let none: Option<AssistedMatch> = None;
    assert_eq!(PoseEstimate::from(none), PoseEstimate::not_found());
  }

  #[test]
  fn round_trips_missing_fields_as_none() {
    let pose: PoseEstimate = serde_json::from_str(r#"{"found": false}"#).unwrap();
    assert_eq!(pose, PoseEstimate::not_found());
  }
}
