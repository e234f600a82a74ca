// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/args.rs - 命令行参数
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

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use url::Url;

use rectpose::{
  FromUrl,
  detector::{AssistConfig, AssistedDetector, ClassFilter, Estimator, GeometricDetector},
  model::FixedProposals,
};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
  /// 全帧轮廓检测
  Geometric,
  /// 外部候选框 + 框内精修
  Assisted,
}

/// 输入、输出与估计器参数
#[derive(Args, Debug)]
pub struct EstimatorArgs {
  /// 输入来源
  /// 支持格式:
  /// - 图片: image:///path/to/frame.png
  /// - 目录: folder:///path/to/frames
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,

  /// 输出路径
  /// 支持格式:
  /// - JSON: json:///path/to/pose.json
  /// - 图片: image:///path/to/overlay.png
  /// - 目录: folder:///path/to/records[?always]
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 检测流程
  #[arg(long, value_enum, default_value_t = Mode::Geometric)]
  pub mode: Mode,

  /// 候选框文件（assisted 模式），如 proposals:///path/to/proposals.json
  #[arg(long, value_name = "PROPOSALS")]
  pub proposals: Option<Url>,

  /// 候选框置信度下限（不含）
  #[arg(long, default_value_t = 0.5, value_name = "THRESHOLD")]
  pub min_confidence: f32,

  /// 允许的类别，可重复；纯数字为类别编号，其余为名称
  #[arg(long = "allow-class", value_name = "CLASS")]
  pub allow_class: Vec<String>,

  /// 屏蔽的类别，可重复；优先于允许列表
  #[arg(long = "block-class", value_name = "CLASS")]
  pub block_class: Vec<String>,

  /// 候选框面积占整帧比例下限（含）
  #[arg(long, default_value_t = 0.005, value_name = "RATIO")]
  pub min_area_ratio: f64,

  /// 候选框面积占整帧比例上限（不含）
  #[arg(long, default_value_t = 0.5, value_name = "RATIO")]
  pub max_area_ratio: f64,
}

impl EstimatorArgs {
  pub fn assist_config(&self) -> AssistConfig {
    AssistConfig::default()
      .with_min_confidence(self.min_confidence)
      .with_allowed(self.allow_class.iter().collect::<ClassFilter>())
      .with_blocked(self.block_class.iter().collect::<ClassFilter>())
      .with_area_range(self.min_area_ratio, self.max_area_ratio)
  }

  pub fn estimator(&self) -> Result<Estimator> {
    match self.mode {
      Mode::Geometric => Ok(Estimator::Geometric(GeometricDetector::default())),
      Mode::Assisted => {
        let url = self
          .proposals
          .as_ref()
          .context("assisted 模式需要 --proposals")?;
        let model = FixedProposals::from_url(url)
          .with_context(|| format!("无法加载候选框: {}", url))?;
        Ok(Estimator::Assisted(AssistedDetector::new(model, self.assist_config())))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[derive(Parser)]
  struct Cli {
    #[command(flatten)]
    args: EstimatorArgs,
  }

  #[test]
  fn maps_class_flags_onto_config() {
    let cli = Cli::try_parse_from([
      "rectpose",
      "--input",
      "image:///tmp/in.png",
      "--output",
      "json:///tmp/out.json",
      "--mode",
      "assisted",
      "--allow-class",
      "Carton",
      "--allow-class",
      "3",
      "--block-class",
      "7",
      "--min-confidence",
      "0.6",
    ])
    .unwrap();

    let config = cli.args.assist_config();
    assert_eq!(config.min_confidence, 0.6);
    assert!(config.allowed.matches(99, "carton"));
    assert!(config.allowed.matches(3, "other"));
    assert!(config.blocked.matches(7, "x"));
    assert!(!config.blocked.matches(8, "7x"));
    assert_eq!(config.min_area_ratio, 0.005);
    assert_eq!(config.max_area_ratio, 0.5);
  }

  #[test]
  fn assisted_mode_requires_proposals() {
    let cli = Cli::try_parse_from([
      "rectpose",
      "--input",
      "image:///tmp/in.png",
      "--output",
      "json:///tmp/out.json",
      "--mode",
      "assisted",
    ])
    .unwrap();
    assert!(cli.args.estimator().is_err());
  }
}
