//! ### English
//! Handle given to the producer for the duration of one `begin_frame` call.
//!
//! ### 中文
//! 在一次 `begin_frame` 调用期间交给生产者的句柄。

use std::time::Instant;

use super::collaborators::{InvalidationSource, RenderConsumer};
use super::metrics::{SceneVersion, ViewportMetrics};
use super::state::PipelineState;

/// ### English
/// Borrowed view of the controller while a frame is being produced.
///
/// ### 中文
/// 生成帧期间对控制器的借用视图。
pub struct Frame<'a, S> {
    pub(crate) state: &'a mut PipelineState,
    pub(crate) host: &'a mut dyn InvalidationSource,
    pub(crate) consumer: &'a mut dyn RenderConsumer<S>,
}

impl<S> Frame<'_, S> {
    /// ### English
    /// Submits the scene for this frame. Only the first submission per frame is drawn; later
    /// ones are dropped and return `false`.
    ///
    /// ### 中文
    /// 提交本帧场景。每帧只有第一次提交会被绘制；之后的提交被丢弃并返回 `false`。
    pub fn submit(&mut self, scene: S) -> bool {
        self.state.submit(scene, &mut *self.consumer)
    }

    /// ### English
    /// Whether this frame can still accept a scene.
    ///
    /// ### 中文
    /// 本帧是否仍可接受场景。
    pub fn is_ready_to_draw(&self) -> bool {
        self.state.is_ready_to_draw
    }

    pub fn viewport_metrics(&self) -> &ViewportMetrics {
        &self.state.viewport_metrics
    }

    /// Scene version from the most recent invalidation metadata.
    pub fn scene_version(&self) -> SceneVersion {
        self.state.scene_version
    }

    /// ### English
    /// Start time of the frame being produced (the `frame_time` passed to `begin_frame`).
    ///
    /// ### 中文
    /// 正在生成的帧的开始时间（即传给 `begin_frame` 的 `frame_time`）。
    pub fn frame_time(&self) -> Option<Instant> {
        self.state.last_frame_start_time
    }

    /// ### English
    /// Requests another frame after this one (idempotent, same as `request_frame`).
    ///
    /// ### 中文
    /// 请求在本帧之后再来一帧（幂等，等同 `request_frame`）。
    pub fn schedule_frame(&mut self) {
        self.state.request_frame(&mut *self.host);
    }
}
