// 该文件是 Shitu （识图） 项目的一部分。
// src/task.rs - 单次检测任务
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
use tracing::info;

use crate::{
  FromUrl,
  input::{ImageFileInput, ImagePicker, Selection},
  model::{DetectResult, Model, WithLabel},
  output::{Render, draw::Summary},
};

/// 一次动作的结束状态
#[derive(Debug)]
pub enum TaskOutcome {
  /// 用户取消选择，系统回到空闲状态
  Cancelled,
  /// 完成一次检测
  Completed {
    /// 检测数量
    detections: usize,
    /// 文字摘要，每个检测一行
    summary: String,
  },
}

pub trait Task<P, M, O>: Sized {
  type Error;
  fn run_task(self, picker: P, model: M, output: O) -> Result<TaskOutcome, Self::Error>;
}

/// 单次「选图-检测-标注」任务。
///
/// 选择、解码、推理、标注在调用线程上顺序执行；任何一步出错都
/// 中止本次动作并向上传播，进程本身不退出。
pub struct GalleryShotTask;

impl<
  T: WithLabel,
  ME: std::error::Error + Sync + Send + 'static,
  RE: std::error::Error + Sync + Send + 'static,
  P: ImagePicker,
  M: Model<Input = RgbImage, Output = DetectResult<T>, Error = ME>,
  O: Render<RgbImage, DetectResult<T>, Error = RE>,
> Task<P, M, O> for GalleryShotTask
{
  type Error = anyhow::Error;

  fn run_task(self, mut picker: P, mut model: M, output: O) -> Result<TaskOutcome, Self::Error> {
    info!("等待图像选择...");
    let url = match picker.pick_image() {
      Selection::Chosen(url) => url,
      Selection::Cancelled => {
        info!("未选择图像，回到空闲状态");
        return Ok(TaskOutcome::Cancelled);
      }
    };

    info!("已选择图像: {}", url);
    let input = ImageFileInput::from_url(&url)?;
    let frame = input
      .into_frames()
      .next()
      .ok_or_else(|| anyhow::anyhow!("没有输入帧"))?;
    info!("图像解码成功 ({}x{})，开始推理...", frame.width(), frame.height());

    let now = std::time::Instant::now();
    let result = model.infer(&frame)?;
    info!(
      "推理完成，耗时: {:.2?}，检测到 {} 个对象",
      now.elapsed(),
      result.len()
    );

    output.render_result(&frame, &result)?;

    let summary = Summary::default().format(&result);
    Ok(TaskOutcome::Completed {
      detections: result.len(),
      summary,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::input::FixedPicker;
  use crate::model::{CocoLabel, DetectItem};
  use std::convert::Infallible;
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use url::Url;

  struct StubModel {
    calls: Arc<AtomicUsize>,
    items: Vec<DetectItem<CocoLabel>>,
  }

  impl Model for StubModel {
    type Input = RgbImage;
    type Output = DetectResult<CocoLabel>;
    type Error = Infallible;

    fn infer(&mut self, _input: &RgbImage) -> Result<Self::Output, Self::Error> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      Ok(DetectResult::from(self.items.clone()))
    }
  }

  struct NullOutput {
    renders: Arc<AtomicUsize>,
  }

  impl<T: WithLabel> Render<RgbImage, DetectResult<T>> for NullOutput {
    type Error = Infallible;

    fn render_result(
      &self,
      _frame: &RgbImage,
      _result: &DetectResult<T>,
    ) -> Result<(), Self::Error> {
      self.renders.fetch_add(1, Ordering::SeqCst);
      Ok(())
    }
  }

  fn photo_url(dir: &tempfile::TempDir) -> Url {
    let path = dir.path().join("photo.png");
    RgbImage::new(16, 12).save(&path).unwrap();
    Url::parse(&format!("image://{}", path.display())).unwrap()
  }

  #[test]
  fn cancelled_selection_stays_idle() {
    let calls = Arc::new(AtomicUsize::new(0));
    let renders = Arc::new(AtomicUsize::new(0));
    let model = StubModel {
      calls: calls.clone(),
      items: Vec::new(),
    };
    let output = NullOutput {
      renders: renders.clone(),
    };

    let outcome = GalleryShotTask
      .run_task(FixedPicker::new(None), model, output)
      .unwrap();

    assert!(matches!(outcome, TaskOutcome::Cancelled));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(renders.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn completed_action_reports_summary() {
    let dir = tempfile::tempdir().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let renders = Arc::new(AtomicUsize::new(0));
    let model = StubModel {
      calls: calls.clone(),
      items: vec![DetectItem {
        kind: CocoLabel(17),
        score: 0.8734,
        bbox: [1.0, 1.0, 8.0, 8.0],
      }],
    };
    let output = NullOutput {
      renders: renders.clone(),
    };

    let outcome = GalleryShotTask
      .run_task(FixedPicker::new(Some(photo_url(&dir))), model, output)
      .unwrap();

    match outcome {
      TaskOutcome::Completed {
        detections,
        summary,
      } => {
        assert_eq!(detections, 1);
        assert_eq!(summary, "Object: cat, Confidence: 87%");
      }
      other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(renders.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn zero_detections_complete_with_empty_summary() {
    let dir = tempfile::tempdir().unwrap();
    let model = StubModel {
      calls: Arc::new(AtomicUsize::new(0)),
      items: Vec::new(),
    };
    let output = NullOutput {
      renders: Arc::new(AtomicUsize::new(0)),
    };

    let outcome = GalleryShotTask
      .run_task(FixedPicker::new(Some(photo_url(&dir))), model, output)
      .unwrap();

    match outcome {
      TaskOutcome::Completed {
        detections,
        summary,
      } => {
        assert_eq!(detections, 0);
        assert_eq!(summary, "");
      }
      other => panic!("unexpected outcome: {:?}", other),
    }
  }

  #[test]
  fn decode_failure_aborts_the_action() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"junk").unwrap();
    let url = Url::parse(&format!("image://{}", path.display())).unwrap();

    let model = StubModel {
      calls: Arc::new(AtomicUsize::new(0)),
      items: Vec::new(),
    };
    let output = NullOutput {
      renders: Arc::new(AtomicUsize::new(0)),
    };

    let result = GalleryShotTask.run_task(FixedPicker::new(Some(url)), model, output);
    assert!(result.is_err());
  }
}
