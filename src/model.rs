// 该文件是 Shitu （识图） 项目的一部分。
// src/model.rs - 模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

/// 目标检测模型。
///
/// 会话在构建时创建一次，之后跨调用复用；`infer` 需要可变引用是
/// 推理运行时的要求，模型本身在构建后不再变化。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&mut self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

#[derive(Debug, Clone)]
pub struct DetectItem<T> {
  pub kind: T,
  pub score: f32,
  pub bbox: [f32; 4], // [left, top, right, bottom]，图像像素坐标
}

#[derive(Debug, Clone)]
pub struct DetectResult<T> {
  pub items: Box<[DetectItem<T>]>,
}

impl<T> DetectResult<T> {
  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

impl<T> From<Vec<DetectItem<T>>> for DetectResult<T> {
  fn from(items: Vec<DetectItem<T>>) -> Self {
    DetectResult {
      items: items.into_boxed_slice(),
    }
  }
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn to_label_str(&self) -> String;
  fn from_label_id(id: u32) -> Self;
}

/// 检测器配置
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
  /// 返回检测结果的最大数量
  pub max_results: usize,
  /// 置信度阈值 (0.0 - 1.0)
  pub score_threshold: f32,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      max_results: 10,
      score_threshold: 0.5,
    }
  }
}

impl DetectorConfig {
  /// 最大数量至少为 1
  pub fn with_max_results(mut self, max_results: usize) -> Self {
    self.max_results = max_results.max(1);
    self
  }

  /// 阈值截断到 [0, 1]
  pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
    self.score_threshold = score_threshold.clamp(0.0, 1.0);
    self
  }
}

/// SSD MobileNet 模型自带的 COCO 标签表（编号从 1 起，含空位）
pub const COCO_LABELS: [&str; 91] = [
  "???",
  "person",
  "bicycle",
  "car",
  "motorcycle",
  "airplane",
  "bus",
  "train",
  "truck",
  "boat",
  "traffic light",
  "fire hydrant",
  "???",
  "stop sign",
  "parking meter",
  "bench",
  "bird",
  "cat",
  "dog",
  "horse",
  "sheep",
  "cow",
  "elephant",
  "bear",
  "zebra",
  "giraffe",
  "???",
  "backpack",
  "umbrella",
  "???",
  "???",
  "handbag",
  "tie",
  "suitcase",
  "frisbee",
  "skis",
  "snowboard",
  "sports ball",
  "kite",
  "baseball bat",
  "baseball glove",
  "skateboard",
  "surfboard",
  "tennis racket",
  "bottle",
  "???",
  "wine glass",
  "cup",
  "fork",
  "knife",
  "spoon",
  "bowl",
  "banana",
  "apple",
  "sandwich",
  "orange",
  "broccoli",
  "carrot",
  "hot dog",
  "pizza",
  "donut",
  "cake",
  "chair",
  "couch",
  "potted plant",
  "bed",
  "???",
  "dining table",
  "???",
  "???",
  "toilet",
  "???",
  "tv",
  "laptop",
  "mouse",
  "remote",
  "keyboard",
  "cell phone",
  "microwave",
  "oven",
  "toaster",
  "sink",
  "refrigerator",
  "???",
  "book",
  "clock",
  "vase",
  "scissors",
  "teddy bear",
  "hair drier",
  "toothbrush",
];

/// 检测类别：模型输出的原始类别编号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CocoLabel(pub u32);

impl WithLabel for CocoLabel {
  fn to_label_str(&self) -> String {
    COCO_LABELS
      .get(self.0 as usize)
      .copied()
      .unwrap_or("unknown")
      .to_string()
  }

  fn from_label_id(id: u32) -> Self {
    CocoLabel(id)
  }
}

mod ssd_mobilenet;
pub use self::ssd_mobilenet::{SsdMobilenet, SsdMobilenetBuilder, SsdMobilenetError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn label_map_resolves_known_ids() {
    assert_eq!(CocoLabel::from_label_id(1).to_label_str(), "person");
    assert_eq!(CocoLabel::from_label_id(17).to_label_str(), "cat");
    assert_eq!(CocoLabel::from_label_id(90).to_label_str(), "toothbrush");
  }

  #[test]
  fn label_map_gaps_and_overflow() {
    assert_eq!(CocoLabel::from_label_id(12).to_label_str(), "???");
    assert_eq!(CocoLabel::from_label_id(200).to_label_str(), "unknown");
  }

  #[test]
  fn config_clamps_bounds() {
    let config = DetectorConfig::default()
      .with_max_results(0)
      .with_score_threshold(1.5);
    assert_eq!(config.max_results, 1);
    assert_eq!(config.score_threshold, 1.0);

    let config = DetectorConfig::default().with_score_threshold(-0.5);
    assert_eq!(config.score_threshold, 0.0);
  }

  #[test]
  fn default_config_matches_demo_values() {
    let config = DetectorConfig::default();
    assert_eq!(config.max_results, 10);
    assert_eq!(config.score_threshold, 0.5);
  }
}
