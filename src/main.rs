// 该文件是 Shitu （识图） 项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shitu::{
  FromUrl,
  input::FixedPicker,
  model::SsdMobilenetBuilder,
  output::SaveImageFileOutput,
  task::{GalleryShotTask, Task, TaskOutcome},
};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输出路径: {}", args.output);

  let model = SsdMobilenetBuilder::from_url(&args.model)?
    .max_results(args.max_results)
    .score_threshold(args.score_threshold)
    .build()?;

  let output = SaveImageFileOutput::from_url(&args.output)?;
  let picker = FixedPicker::new(args.input);

  match GalleryShotTask.run_task(picker, model, output)? {
    TaskOutcome::Cancelled => {
      info!("本次未处理任何图像");
    }
    TaskOutcome::Completed {
      detections,
      summary,
    } => {
      info!("检测完成: {} 个对象", detections);
      if !summary.is_empty() {
        println!("{}", summary);
      }
    }
  }

  Ok(())
}
