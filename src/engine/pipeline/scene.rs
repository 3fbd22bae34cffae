//! ### English
//! Scene value handed from the producer context to the rendering consumer.
//!
//! ### 中文
//! 从生产者上下文交给渲染消费者的场景值。

use std::time::Duration;

use dpi::PhysicalSize;

use super::metrics::SceneVersion;

/// ### English
/// A submitted scene plus the frame bookkeeping stamped onto it at submission time.
///
/// The value is moved into the consumer context; the producer keeps no reference to it.
///
/// ### 中文
/// 已提交的场景，以及提交时盖上的帧记录信息。
///
/// 该值被移动到消费者上下文；生产者不再持有其引用。
#[derive(Debug)]
pub struct StampedScene<S> {
    /// ### English
    /// Producer-defined renderable description.
    ///
    /// ### 中文
    /// 生产者定义的可渲染描述。
    pub scene: S,
    /// ### English
    /// Time spent between "begin frame" and submission.
    ///
    /// ### 中文
    /// 从 "begin frame" 到提交之间的耗时。
    pub construction_time: Duration,
    /// ### English
    /// Target size taken from the current viewport metrics.
    ///
    /// ### 中文
    /// 取自当前视口参数的目标尺寸。
    pub frame_size: PhysicalSize<u32>,
    /// ### English
    /// Scene version last reported by the host.
    ///
    /// ### 中文
    /// 宿主最近一次报告的场景版本。
    pub scene_version: SceneVersion,
    /// ### English
    /// Per-surface submission sequence number (starts at 1).
    ///
    /// ### 中文
    /// 每个 surface 的提交序号（从 1 开始）。
    pub frame_seq: u64,
}

impl<S> StampedScene<S> {
    pub fn into_inner(self) -> S {
        self.scene
    }
}
