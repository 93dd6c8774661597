// 该文件是 Shitu （识图） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::model::{DetectItem, DetectResult, WithLabel};

// 渲染常量
const BOX_STROKE_WIDTH: i32 = 6;
const BOX_COLOR: [u8; 3] = [255, 0, 0]; // 红色边框
const LABEL_FONT_SIZE: f32 = 32.0;
const LABEL_TEXT_HEIGHT: i32 = 32;
const LABEL_CHAR_WIDTH: f32 = 16.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const LABEL_BACKGROUND: [u8; 3] = [0, 0, 0]; // 黑色标签底
const LABEL_TEXT_COLOR: [u8; 3] = [255, 255, 255]; // 白色文本

pub struct Draw {
  stroke_width: i32,
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  font: FontArc,
  box_color: [u8; 3],
  label_background: [u8; 3],
  text_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    let font_data = include_bytes!("../../assets/DejaVuSans.ttf"); // default font
    let font = FontArc::try_from_slice(font_data).expect("无法加载嵌入的字体文件");

    Self {
      stroke_width: BOX_STROKE_WIDTH,
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      font,
      box_color: BOX_COLOR,
      label_background: LABEL_BACKGROUND,
      text_color: LABEL_TEXT_COLOR,
    }
  }
}

impl Draw {
  /// 在原图副本上绘制全部检测结果，原图保持不变。
  ///
  /// 空检测列表返回与原图逐像素一致的副本。
  pub fn draw_detection<T: WithLabel>(
    &self,
    frame: &RgbImage,
    result: &DetectResult<T>,
  ) -> RgbImage {
    let mut image = frame.clone();
    self.draw_detections_on_image(&mut image, result);
    image
  }

  /// 按检测顺序绘制，后画的覆盖先画的
  pub fn draw_detections_on_image<T: WithLabel>(
    &self,
    image: &mut RgbImage,
    result: &DetectResult<T>,
  ) {
    for DetectItem { kind, score, bbox } in result.items.iter() {
      self.draw_bbox_with_label(image, bbox, kind, *score);
    }
  }

  // bbox 为像素坐标 [x_min, y_min, x_max, y_max]
  fn draw_bbox_with_label<T: WithLabel>(
    &self,
    image: &mut RgbImage,
    bbox: &[f32; 4],
    kind: &T,
    score: f32,
  ) {
    let x_min = bbox[0].floor() as i32;
    let y_min = bbox[1].floor() as i32;
    let x_max = bbox[2].ceil() as i32;
    let y_max = bbox[3].ceil() as i32;

    // 边框从框边缘向内加粗；退化框交给绘图原语处理（跳过）
    if x_max > x_min && y_max > y_min {
      for thickness in 0..self.stroke_width {
        let width = x_max - x_min - 2 * thickness;
        let height = y_max - y_min - 2 * thickness;
        if width <= 0 || height <= 0 {
          break;
        }

        let rect =
          Rect::at(x_min + thickness, y_min + thickness).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, Rgb(self.box_color));
      }
    }

    // 标签文本
    let label = format!("{} ({}%)", kind.to_label_str(), (score * 100.0) as i32);

    let scale = PxScale::from(self.font_size);
    let text_width = (label.len() as f32 * self.label_char_width) as i32;
    let text_height = self.label_text_height;

    // 标签背景位于边框上方；不向图像内侧收拢，
    // 越界部分由绘图原语自行丢弃
    let label_x = x_min;
    let label_y = y_min - text_height;

    if text_width > 0 {
      let rect = Rect::at(label_x, label_y).of_size(text_width as u32, text_height as u32);
      draw_filled_rect_mut(image, rect, Rgb(self.label_background));

      draw_text_mut(
        image,
        Rgb(self.text_color),
        label_x,
        label_y + self.label_text_vertical_padding,
        scale,
        &self.font,
        &label,
      );
    }
  }
}

/// 检测结果文字摘要，每个检测一行。
#[derive(Debug, Default)]
pub struct Summary;

impl Summary {
  /// 置信度以整数百分比呈现，向零取整；零检测返回空字符串。
  pub fn format<T: WithLabel>(&self, result: &DetectResult<T>) -> String {
    let mut lines = Vec::new();
    for item in result.items.iter() {
      lines.push(format!(
        "Object: {}, Confidence: {}%",
        item.kind.to_label_str(),
        (item.score * 100.0) as i32
      ));
    }
    lines.join("\n")
  }
}
