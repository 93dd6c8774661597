// 该文件是 Shitu （识图） 项目的一部分。
// src/model/ssd_mobilenet.rs - SSD MobileNet 检测模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;
use ndarray::{Array4, ArrayViewD};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::TensorRef;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  model::{CocoLabel, DetectItem, DetectResult, DetectorConfig, Model, WithLabel},
};

const SSD_INPUT_WIDTH: u32 = 300;
const SSD_INPUT_HEIGHT: u32 = 300;

// 模型输出头：框为归一化 [y_min, x_min, y_max, x_max]
const OUTPUT_BOXES: &str = "detection_boxes";
const OUTPUT_CLASSES: &str = "detection_classes";
const OUTPUT_SCORES: &str = "detection_scores";
const OUTPUT_COUNT: &str = "num_detections";

#[derive(Error, Debug)]
pub enum SsdMobilenetError {
  #[error("模型加载错误: {0}")]
  ModelLoadError(std::io::Error),
  #[error("模型无效: {0}, 错误: {1}")]
  ModelInvalid(String, ort::Error),
  #[error("推理错误: {0}")]
  InferenceError(ort::Error),
  #[error("输入图像无法适配模型张量: {0}")]
  InputShapeError(ndarray::ShapeError),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
}

impl From<std::io::Error> for SsdMobilenetError {
  fn from(err: std::io::Error) -> Self {
    SsdMobilenetError::ModelLoadError(err)
  }
}

impl From<ndarray::ShapeError> for SsdMobilenetError {
  fn from(err: ndarray::ShapeError) -> Self {
    SsdMobilenetError::InputShapeError(err)
  }
}

impl SsdMobilenetError {
  pub fn invalid(msg: &str, e: ort::Error) -> Self {
    SsdMobilenetError::ModelInvalid(msg.to_string(), e)
  }
}

/// 预训练 SSD MobileNet 检测器。
///
/// 模型文件在 `build` 时读取并提交为一个长期存活的推理会话，
/// 之后每次 `infer` 复用该会话。
pub struct SsdMobilenet {
  session: Session,
  config: DetectorConfig,
  input_width: u32,
  input_height: u32,
}

pub struct SsdMobilenetBuilder {
  model_path: String,
  config: DetectorConfig,
  input_width: u32,
  input_height: u32,
}

const SSD_MOBILENET_SCHEME: &str = "mobilenet";

impl FromUrlWithScheme for SsdMobilenetBuilder {
  const SCHEME: &'static str = SSD_MOBILENET_SCHEME;
}

impl FromUrl for SsdMobilenetBuilder {
  type Error = SsdMobilenetError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(SsdMobilenetError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        Self::SCHEME
      )));
    }

    let mut config = DetectorConfig::default();
    for (k, v) in url.query_pairs() {
      match k.as_ref() {
        "max-results" => {
          if let Ok(n) = v.parse() {
            config = config.with_max_results(n);
          }
        }
        "score-threshold" => {
          if let Ok(t) = v.parse() {
            config = config.with_score_threshold(t);
          }
        }
        _ => {}
      }
    }

    Ok(SsdMobilenetBuilder {
      model_path: url.path().to_string(),
      config,
      input_width: SSD_INPUT_WIDTH,
      input_height: SSD_INPUT_HEIGHT,
    })
  }
}

impl SsdMobilenetBuilder {
  pub fn config(mut self, config: DetectorConfig) -> Self {
    self.config = config;
    self
  }

  pub fn max_results(mut self, max_results: usize) -> Self {
    self.config = self.config.with_max_results(max_results);
    self
  }

  pub fn score_threshold(mut self, score_threshold: f32) -> Self {
    self.config = self.config.with_score_threshold(score_threshold);
    self
  }

  pub fn input_size(mut self, width: u32, height: u32) -> Self {
    self.input_width = width;
    self.input_height = height;
    self
  }

  pub fn build(self) -> Result<SsdMobilenet, SsdMobilenetError> {
    info!("加载模型文件: {}", self.model_path);
    let model_data = std::fs::read(&self.model_path)?;
    debug!(
      "模型文件大小: {:.2} MB",
      model_data.len() as f64 / (1024.0 * 1024.0)
    );

    info!("创建 ONNX Runtime 推理会话");
    let session = Session::builder()
      .map_err(|e| SsdMobilenetError::invalid("无法创建会话", e))?
      .with_optimization_level(GraphOptimizationLevel::Level3)
      .map_err(|e| SsdMobilenetError::invalid("无法设置优化级别", e))?
      .commit_from_memory(&model_data)
      .map_err(|e| SsdMobilenetError::invalid("模型格式不正确", e))?;
    info!("模型加载完成");

    Ok(SsdMobilenet {
      session,
      config: self.config,
      input_width: self.input_width,
      input_height: self.input_height,
    })
  }
}

impl SsdMobilenet {
  /// 调整到模型输入尺寸，NHWC，uint8 输入无需归一化
  fn preprocess(&self, image: &RgbImage) -> Result<Array4<u8>, SsdMobilenetError> {
    let resized = image::imageops::resize(
      image,
      self.input_width,
      self.input_height,
      image::imageops::FilterType::Triangle,
    );

    let array = Array4::from_shape_vec(
      (1, self.input_height as usize, self.input_width as usize, 3),
      resized.into_raw(),
    )?;

    Ok(array)
  }

  fn postprocess(
    boxes: ArrayViewD<f32>,
    classes: ArrayViewD<f32>,
    scores: ArrayViewD<f32>,
    count: usize,
    config: &DetectorConfig,
    original_width: f32,
    original_height: f32,
  ) -> DetectResult<CocoLabel> {
    let slots = scores.shape().get(1).copied().unwrap_or(0);
    let mut items = Vec::new();

    for i in 0..count.min(slots) {
      let score = scores[[0, i]];
      if score < config.score_threshold {
        continue;
      }

      let bbox = [
        boxes[[0, i, 1]] * original_width,
        boxes[[0, i, 0]] * original_height,
        boxes[[0, i, 3]] * original_width,
        boxes[[0, i, 2]] * original_height,
      ];

      items.push(DetectItem {
        kind: CocoLabel::from_label_id(classes[[0, i]] as u32),
        score,
        bbox,
      });
    }

    items.sort_by(|a, b| b.score.total_cmp(&a.score));
    items.truncate(config.max_results);

    DetectResult::from(items)
  }
}

impl Model for SsdMobilenet {
  type Input = RgbImage;
  type Output = DetectResult<CocoLabel>;
  type Error = SsdMobilenetError;

  fn infer(&mut self, input: &RgbImage) -> Result<Self::Output, Self::Error> {
    let original_width = input.width() as f32;
    let original_height = input.height() as f32;

    let input_tensor = self.preprocess(input)?;
    let tensor_ref =
      TensorRef::from_array_view(&input_tensor).map_err(SsdMobilenetError::InferenceError)?;

    let outputs = self
      .session
      .run(ort::inputs![tensor_ref])
      .map_err(SsdMobilenetError::InferenceError)?;

    let boxes = outputs[OUTPUT_BOXES]
      .try_extract_array::<f32>()
      .map_err(SsdMobilenetError::InferenceError)?
      .into_owned();
    let classes = outputs[OUTPUT_CLASSES]
      .try_extract_array::<f32>()
      .map_err(SsdMobilenetError::InferenceError)?
      .into_owned();
    let scores = outputs[OUTPUT_SCORES]
      .try_extract_array::<f32>()
      .map_err(SsdMobilenetError::InferenceError)?
      .into_owned();
    let count = outputs[OUTPUT_COUNT]
      .try_extract_array::<f32>()
      .map_err(SsdMobilenetError::InferenceError)?
      .iter()
      .copied()
      .next()
      .unwrap_or(0.0) as usize;

    drop(outputs);

    let result = Self::postprocess(
      boxes.view(),
      classes.view(),
      scores.view(),
      count,
      &self.config,
      original_width,
      original_height,
    );
    debug!("检测到 {} 个对象", result.len());

    Ok(result)
  }
}
