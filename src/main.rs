// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/main.rs - 位姿估计主程序
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

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use rectpose::{
  FromUrl,
  input::InputWrapper,
  output::OutputWrapper,
  task::{ContinuousTask, Task},
};

/// RectPose 矩形位姿估计
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
  #[command(flatten)]
  pub args: args::EstimatorArgs,

  /// 最大处理帧数，不指定则处理全部输入
  #[arg(long, value_name = "COUNT")]
  pub max_frames: Option<usize>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let cli = Cli::parse();

  info!("输入来源: {}", cli.args.input);
  info!("输出路径: {}", cli.args.output);
  info!("检测流程: {:?}", cli.args.mode);

  let input = InputWrapper::from_url(&cli.args.input)?;
  let estimator = cli.args.estimator()?;
  let output = OutputWrapper::from_url(&cli.args.output)?;

  ContinuousTask::default()
    .with_frame_number(cli.max_frames)
    .with_interrupt(true)
    .run_task(input, estimator, output)?;

  Ok(())
}
