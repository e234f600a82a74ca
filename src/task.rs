// 该文件是 RectPose （矩形位姿） 项目的一部分。
// src/task.rs - 输入、估计、输出的任务编排
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

use std::{thread, time::Duration};
use tracing::{info, warn};

use crate::{detector::PoseEstimator, frame::Frame, output::Render, pose::PoseEstimate};

pub trait Task<I, E, O>: Sized {
  type Error;
  fn run_task(self, input: I, estimator: E, output: O) -> Result<(), Self::Error>;
}

pub struct OneShotTask;

impl<RE, I, E, O> Task<I, E, O> for OneShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  E: PoseEstimator,
  O: Render<Frame, PoseEstimate, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, estimator: E, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，开始估计...");
    let now = std::time::Instant::now();
    let result = estimator.estimate(&frame)?;
    let elapsed = now.elapsed();
    info!("估计完成，耗时: {:.2?}, 找到目标: {}", elapsed, result.found);
    output.render_result(&frame, &result)?;
    info!("渲染完成，总耗时: {:.2?}", now.elapsed());

    Ok(())
  }
}

/// 对同一帧重复估计，统计平均耗时并检查结果是否一致
pub struct RepeatShotTask {
  repeat: usize,
}

impl Default for RepeatShotTask {
  fn default() -> Self {
    Self { repeat: 100 }
  }
}

impl RepeatShotTask {
  pub fn with_repeat(mut self, repeat: usize) -> Self {
    self.repeat = repeat.max(1);
    self
  }
}

impl<RE, I, E, O> Task<I, E, O> for RepeatShotTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  E: PoseEstimator,
  O: Render<Frame, PoseEstimate, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, mut input: I, estimator: E, output: O) -> Result<(), Self::Error> {
    const WARMUP: usize = 2;

    info!("开始任务...");
    let frame = input.next().ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("输入帧获取成功，重复估计 {} 次...", self.repeat);

    let mut times = Vec::with_capacity(self.repeat);
    let mut first: Option<PoseEstimate> = None;
    let mut mismatches = 0usize;
    for i in 0..self.repeat {
      let now = std::time::Instant::now();
      let result = estimator.estimate(&frame)?;
      let elapsed = now.elapsed();
      info!("({})估计完成，耗时: {:.2?}", i, elapsed);
      times.push(elapsed);

      match &first {
        None => {
          output.render_result(&frame, &result)?;
          first = Some(result);
        }
        Some(expected) if *expected != result => {
          warn!("({})结果与第一次不一致: {:?}", i, result);
          mismatches += 1;
        }
        Some(_) => {}
      }
    }

    let measured = if times.len() > WARMUP { &times[WARMUP..] } else { &times[..] };
    warn!(
      "平均估计时间: {:.2?}",
      measured.iter().sum::<Duration>() / measured.len() as u32
    );
    if mismatches > 0 {
      warn!("{} 次结果与第一次不一致", mismatches);
    }

    Ok(())
  }
}

#[derive(Default, Debug)]
pub struct ContinuousTask {
  frame_number: Option<usize>,
  interruptible: bool,
}

impl ContinuousTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 安装 Ctrl-C 处理；每个进程只能安装一次
  pub fn with_interrupt(mut self, interruptible: bool) -> Self {
    self.interruptible = interruptible;
    self
  }
}

impl<RE, I, E, O> Task<I, E, O> for ContinuousTask
where
  RE: std::error::Error + Sync + Send + 'static,
  I: Iterator<Item = Frame>,
  E: PoseEstimator,
  O: Render<Frame, PoseEstimate, Error = RE>,
{
  type Error = anyhow::Error;

  fn run_task(self, input: I, estimator: E, output: O) -> Result<(), Self::Error> {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    if self.interruptible {
      ctrlc::set_handler(move || {
        info!("收到中断信号，准备退出...");
        let _ = tx.send(());
        thread::spawn(|| {
          thread::sleep(Duration::from_secs(30));
          warn!("强制退出程序");
          std::process::exit(1);
        });
      })?;
    }

    let mut frame_index = 0usize;
    let mut found = 0usize;
    let mut now = std::time::Instant::now();
    for frame in input {
      frame_index += 1;
      info!("处理第 {} 帧图像", frame_index);
      let result = estimator.estimate(&frame)?;
      let elapsed_a = now.elapsed();
      output.render_result(&frame, &result)?;
      let elapsed_b = now.elapsed();
      now = std::time::Instant::now();
      info!("估计完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);
      found += usize::from(result.found);

      if self.frame_number.is_some_and(|n| frame_index >= n) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共 {} 帧，{} 帧找到目标", frame_index, found);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{detector::GeometricDetector, test_utils::frame_with_rect};
  use std::{cell::RefCell, convert::Infallible};

  #[derive(Default)]
  struct Collect {
    results: RefCell<Vec<PoseEstimate>>,
  }

  impl Render<Frame, PoseEstimate> for &Collect {
    type Error = Infallible;

    fn render_result(&self, _frame: &Frame, result: &PoseEstimate) -> Result<(), Self::Error> {
      self.results.borrow_mut().push(result.clone());
      Ok(())
    }
  }

  fn frames(n: usize) -> impl Iterator<Item = Frame> {
    (0..n).map(|i| frame_with_rect(320, 240, (160.0, 120.0, 80.0, 50.0, 10.0 + i as f64)))
  }

  #[test]
  fn one_shot_renders_first_frame_only() {
    let collect = Collect::default();
    OneShotTask
      .run_task(frames(3), GeometricDetector::default(), &collect)
      .unwrap();
    let results = collect.results.borrow();
    assert_eq!(results.len(), 1);
    assert!(results[0].found);
  }

  #[test]
  fn one_shot_without_frames_fails() {
    let collect = Collect::default();
    let err = OneShotTask.run_task(frames(0), GeometricDetector::default(), &collect);
    assert!(err.is_err());
  }

  #[test]
  fn repeat_shot_renders_once() {
    let collect = Collect::default();
    RepeatShotTask::default()
      .with_repeat(4)
      .run_task(frames(1), GeometricDetector::default(), &collect)
      .unwrap();
    assert_eq!(collect.results.borrow().len(), 1);
  }

  #[test]
  fn continuous_stops_at_frame_limit() {
    let collect = Collect::default();
    ContinuousTask::default()
      .with_frame_number(Some(2))
      .run_task(frames(5), GeometricDetector::default(), &collect)
      .unwrap();
    assert_eq!(collect.results.borrow().len(), 2);

    let collect = Collect::default();
    ContinuousTask::default()
      .run_task(frames(3), GeometricDetector::default(), &collect)
      .unwrap();
    assert_eq!(collect.results.borrow().len(), 3);
  }
}
