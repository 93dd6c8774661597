// 该文件是 Shitu （识图） 项目的一部分。
// src/args.rs - 项目参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use clap::Parser;
use url::Url;

/// Shitu 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// SSD MobileNet 模型路径
  /// 例如: mobilenet:///path/to/ssd_mobilenet_v1.onnx
  #[arg(long, value_name = "MODEL")]
  pub model: Url,

  /// 待检测的图像来源，例如: image:///path/to/photo.jpg
  /// 缺省视为用户取消了选择
  #[arg(long, value_name = "SOURCE")]
  pub input: Option<Url>,

  /// 标注结果输出路径，例如: image:///path/to/annotated.png
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  /// 返回检测结果的最大数量
  #[arg(long, default_value = "10", value_name = "COUNT")]
  pub max_results: usize,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.5", value_name = "THRESHOLD")]
  pub score_threshold: f32,
}
