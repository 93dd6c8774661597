// 该文件是 Shitu （识图） 项目的一部分。
// src/input.rs - 图像获取
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

use std::sync::mpsc::{Receiver, Sender};

use url::Url;

mod gallery;
pub use self::gallery::{ImageFileFrames, ImageFileInput, ImageFileInputError};

/// 一次选择动作的结果：给出图像地址，或者取消。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
  Chosen(Url),
  Cancelled,
}

/// 外部图像选择器。
///
/// 每次调用对应一次用户动作，最多产生一次完成结果；取消不是错误，
/// 调用方收到 [`Selection::Cancelled`] 后应保持空闲。
pub trait ImagePicker {
  fn pick_image(&mut self) -> Selection;
}

/// 固定来源选择器：第一次给出预设的图像地址，之后视为取消。
pub struct FixedPicker {
  url: Option<Url>,
}

impl FixedPicker {
  pub fn new(url: Option<Url>) -> Self {
    Self { url }
  }
}

impl ImagePicker for FixedPicker {
  fn pick_image(&mut self) -> Selection {
    match self.url.take() {
      Some(url) => Selection::Chosen(url),
      None => Selection::Cancelled,
    }
  }
}

/// 回调式选择器：阻塞等待外部完成回调送来的选择结果。
///
/// 发送端在未发送任何结果前被丢弃时，等同于取消。
pub struct ChannelPicker {
  receiver: Receiver<Selection>,
}

impl ChannelPicker {
  pub fn new(receiver: Receiver<Selection>) -> Self {
    Self { receiver }
  }

  pub fn channel() -> (Sender<Selection>, Self) {
    let (sender, receiver) = std::sync::mpsc::channel();
    (sender, ChannelPicker { receiver })
  }
}

impl ImagePicker for ChannelPicker {
  fn pick_image(&mut self) -> Selection {
    self.receiver.recv().unwrap_or(Selection::Cancelled)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fixed_picker_yields_once() {
    let url = Url::parse("image:///tmp/photo.png").unwrap();
    let mut picker = FixedPicker::new(Some(url.clone()));

    assert_eq!(picker.pick_image(), Selection::Chosen(url));
    assert_eq!(picker.pick_image(), Selection::Cancelled);
  }

  #[test]
  fn fixed_picker_without_source_cancels() {
    let mut picker = FixedPicker::new(None);
    assert_eq!(picker.pick_image(), Selection::Cancelled);
  }

  #[test]
  fn channel_picker_receives_completion() {
    let (sender, mut picker) = ChannelPicker::channel();
    let url = Url::parse("image:///tmp/photo.png").unwrap();
    sender.send(Selection::Chosen(url.clone())).unwrap();

    assert_eq!(picker.pick_image(), Selection::Chosen(url));
  }

  #[test]
  fn channel_picker_treats_dropped_sender_as_cancel() {
    let (sender, mut picker) = ChannelPicker::channel();
    drop(sender);

    assert_eq!(picker.pick_image(), Selection::Cancelled);
  }
}
