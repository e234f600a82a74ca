// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/bin/repeatshot.rs - 单帧重复估计，测量耗时并检查结果一致性
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

#[path = "../args.rs"]
mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rectpose::{
  FromUrl,
  input::InputWrapper,
  output::OutputWrapper,
  task::{RepeatShotTask, Task},
};

/// RectPose 重复估计
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
  #[command(flatten)]
  pub args: args::EstimatorArgs,

  /// 重复次数
  #[arg(long, default_value_t = 100, value_name = "COUNT")]
  pub repeat: usize,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let cli = Cli::parse();

  info!("输入来源: {}", cli.args.input);
  info!("输出路径: {}", cli.args.output);
  info!("重复次数: {}", cli.repeat);

  let input = InputWrapper::from_url(&cli.args.input)?;
  let estimator = cli.args.estimator()?;
  let output = OutputWrapper::from_url(&cli.args.output)?;

  RepeatShotTask::default()
    .with_repeat(cli.repeat)
    .run_task(input, estimator, output)?;

  Ok(())
}
