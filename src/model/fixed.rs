// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/model/fixed.rs - 固定候选框回放
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

use std::convert::Infallible;

use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  model::{DetectResult, Model, ProposedRegion},
};

#[derive(Error, Debug)]
pub enum FixedProposalsError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("候选框文件格式错误: {0}")]
  ParseError(#[from] serde_json::Error),
}

/// 每次推理都返回同一组候选框
///
/// 用于回放离线检测结果，或在测试中替代真实检测器。
#[derive(Debug, Clone, Default)]
pub struct FixedProposals {
  result: DetectResult,
}

impl FixedProposals {
  pub fn new(items: Vec<ProposedRegion>) -> Self {
    Self {
      result: DetectResult::from(items),
    }
  }

  /// 解析 JSON：候选框数组，或带 `items` 字段的对象
  pub fn from_json(text: &str) -> Result<Self, FixedProposalsError> {
    let result = match serde_json::from_str::<Vec<ProposedRegion>>(text) {
      Ok(items) => DetectResult::from(items),
      Err(_) => serde_json::from_str::<DetectResult>(text)?,
    };
    debug!("读取到 {} 个候选框", result.len());
    Ok(Self { result })
  }
}

impl From<Vec<ProposedRegion>> for FixedProposals {
  fn from(items: Vec<ProposedRegion>) -> Self {
    Self::new(items)
  }
}

impl FromUrlWithScheme for FixedProposals {
  const SCHEME: &'static str = "proposals";
}

impl FromUrl for FixedProposals {
  type Error = FixedProposalsError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(FixedProposalsError::SchemeMismatch(url.scheme().to_string()));
    }

    info!("加载候选框文件: {}", url.path());
    let text = std::fs::read_to_string(url.path())?;
    Self::from_json(&text)
  }
}

impl Model for FixedProposals {
  type Input = Frame;
  type Output = DetectResult;
  type Error = Infallible;

  fn infer(&self, _input: &Self::Input) -> Result<Self::Output, Self::Error> {
    Ok(self.result.clone())
  }
}
