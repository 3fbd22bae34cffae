//! ### English
//! Mutable pipeline record owned by one controller (producer context only, no locking).
//!
//! ### 中文
//! 单个控制器持有的可变管线记录（仅在生产者上下文访问，无需加锁）。

use std::time::Instant;

use super::ack::Acknowledgment;
use super::collaborators::{InvalidationSource, RenderConsumer};
use super::metrics::{SceneVersion, ViewportMetrics};
use super::scene::StampedScene;

/// ### English
/// Per-surface flow-control state.
///
/// ### 中文
/// 每个 surface 的流控状态。
#[derive(Debug)]
pub(crate) struct PipelineState {
    /// ### English
    /// Frames admitted but not yet completed by the consumer.
    ///
    /// ### 中文
    /// 已接纳但消费者尚未完成的帧数。
    pub outstanding_requests: u32,
    /// ### English
    /// True only inside a producer `begin_frame` call that has not submitted yet.
    ///
    /// ### 中文
    /// 仅在生产者 `begin_frame` 调用期间、且尚未提交时为 true。
    pub is_ready_to_draw: bool,
    /// ### English
    /// Set when we asked the host to re-invalidate; cleared by the next invalidation.
    ///
    /// ### 中文
    /// 向宿主请求重新 invalidate 时置位；下一次 invalidation 到达时清除。
    pub pending_invalidation: bool,
    /// ### English
    /// At most one acknowledgment withheld because the pipeline was full.
    ///
    /// ### 中文
    /// 因管线已满而暂扣的确认（至多一个）。
    pub deferred_acknowledgment: Option<Acknowledgment>,
    pub viewport_metrics: ViewportMetrics,
    pub scene_version: SceneVersion,
    pub last_frame_start_time: Option<Instant>,
    /// ### English
    /// Sequence number of the last submitted scene.
    ///
    /// ### 中文
    /// 最近一次提交场景的序号。
    pub frame_seq: u64,
}

impl PipelineState {
    pub(crate) fn new(viewport_metrics: ViewportMetrics) -> Self {
        Self {
            outstanding_requests: 0,
            is_ready_to_draw: false,
            pending_invalidation: false,
            deferred_acknowledgment: None,
            viewport_metrics,
            scene_version: SceneVersion::default(),
            last_frame_start_time: None,
            frame_seq: 0,
        }
    }

    /// ### English
    /// Asks the host for one more invalidation unless one is already implied.
    ///
    /// A deferred acknowledgment implies a re-request once it resolves, so it also suppresses
    /// the notification.
    ///
    /// ### 中文
    /// 向宿主请求再一次 invalidation，除非已有隐含请求。
    ///
    /// 延迟确认在释放时会隐含一次重新请求，因此也会抑制本次通知。
    pub(crate) fn request_frame(&mut self, host: &mut dyn InvalidationSource) {
        if self.pending_invalidation || self.deferred_acknowledgment.is_some() {
            return;
        }
        self.pending_invalidation = true;
        host.request_invalidation();
    }

    /// ### English
    /// Stamps and hands off one scene. Returns `false` if the submission was dropped because
    /// this frame already submitted (or no frame is being produced).
    ///
    /// ### 中文
    /// 为场景盖章并移交。若本帧已提交过（或当前不在生成帧），提交被丢弃并返回 `false`。
    pub(crate) fn submit<S>(&mut self, scene: S, consumer: &mut dyn RenderConsumer<S>) -> bool {
        if !self.is_ready_to_draw {
            tracing::warn!(
                outstanding = self.outstanding_requests,
                "dropping scene submitted outside of a ready frame"
            );
            return false;
        }
        self.is_ready_to_draw = false;

        let construction_time = self
            .last_frame_start_time
            .map(|start| start.elapsed())
            .unwrap_or_default();
        self.frame_seq = self.frame_seq.wrapping_add(1);

        let stamped = StampedScene {
            scene,
            construction_time,
            frame_size: self.viewport_metrics.physical_size,
            scene_version: self.scene_version,
            frame_seq: self.frame_seq,
        };
        tracing::trace!(
            frame_seq = stamped.frame_seq,
            construction_us = construction_time.as_micros() as u64,
            "dispatching scene for render"
        );
        consumer.dispatch_for_render(stamped);
        true
    }
}
