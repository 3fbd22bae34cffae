//! ### English
//! Frame-production flow control: admission, begin-frame, completion and deferred-ack recovery.
//!
//! Runs entirely on the producer context. The rendering consumer only reaches it through
//! `on_frame_complete`, scheduled back onto the producer context.
//!
//! ### 中文
//! 帧生产流控：接纳、begin-frame、完成处理以及延迟确认的恢复。
//!
//! 完全运行在生产者上下文。渲染消费者只能通过调度回生产者上下文的 `on_frame_complete` 触达它。

use std::marker::PhantomData;
use std::time::Instant;

use crate::engine::config::PipelineConfig;

use super::ack::Acknowledgment;
use super::collaborators::{FrameProducer, InvalidationSource, RenderConsumer};
use super::frame::Frame;
use super::metrics::{InvalidationMetadata, ViewportMetrics};
use super::state::PipelineState;

/// ### English
/// Read-only copy of the controller's counters and flags.
///
/// ### 中文
/// 控制器计数与标志的只读快照。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineSnapshot {
    pub outstanding_requests: u32,
    pub is_ready_to_draw: bool,
    pub pending_invalidation: bool,
    pub has_deferred_acknowledgment: bool,
    pub frame_seq: u64,
}

/// ### English
/// Pipeline controller for one rendering surface.
///
/// Lifetime matches the surface: dropping it flushes any deferred acknowledgment.
///
/// ### 中文
/// 单个渲染 surface 的管线控制器。
///
/// 生命周期与 surface 一致：drop 时会冲刷（执行）任何被延迟的确认。
pub struct PipelineController<S, P, H, R>
where
    P: FrameProducer<S>,
    H: InvalidationSource,
    R: RenderConsumer<S>,
{
    config: PipelineConfig,
    state: PipelineState,
    producer: P,
    host: H,
    consumer: R,
    _scene: PhantomData<fn(S)>,
}

impl<S, P, H, R> PipelineController<S, P, H, R>
where
    P: FrameProducer<S>,
    H: InvalidationSource,
    R: RenderConsumer<S>,
{
    /// ### English
    /// Creates a controller with an idle pipeline.
    ///
    /// `config` is expected to be validated already (see [`PipelineConfig::validate`]).
    ///
    /// ### 中文
    /// 创建一个空闲管线的控制器。
    ///
    /// `config` 应已通过校验（见 [`PipelineConfig::validate`]）。
    pub fn new(
        config: PipelineConfig,
        initial_viewport: ViewportMetrics,
        producer: P,
        host: H,
        consumer: R,
    ) -> Self {
        debug_assert!(config.validate().is_ok());
        Self {
            config,
            state: PipelineState::new(initial_viewport),
            producer,
            host,
            consumer,
            _scene: PhantomData,
        }
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        PipelineSnapshot {
            outstanding_requests: self.state.outstanding_requests,
            is_ready_to_draw: self.state.is_ready_to_draw,
            pending_invalidation: self.state.pending_invalidation,
            has_deferred_acknowledgment: self.state.deferred_acknowledgment.is_some(),
            frame_seq: self.state.frame_seq,
        }
    }

    pub fn viewport_metrics(&self) -> &ViewportMetrics {
        &self.state.viewport_metrics
    }

    /// Consumer the controller dispatches scenes to.
    pub fn consumer(&self) -> &R {
        &self.consumer
    }

    /// ### English
    /// Idempotent request for one more invalidation signal.
    ///
    /// ### 中文
    /// 幂等地请求再一次 invalidation 信号。
    pub fn request_frame(&mut self) {
        self.state.request_frame(&mut self.host);
    }

    /// ### English
    /// Handles one invalidation signal from the host.
    ///
    /// When the pipeline is full the acknowledgment is withheld and no frame is started. Otherwise
    /// a frame is produced and the host is acknowledged right away, before rendering finishes.
    ///
    /// # Panics
    /// If an acknowledgment is already deferred: the host must not send another signal before
    /// the previous one is acknowledged.
    ///
    /// ### 中文
    /// 处理来自宿主的一次 invalidation 信号。
    ///
    /// 管线已满时暂扣确认且不开始新帧；否则生成一帧并立即确认宿主（早于渲染完成）。
    ///
    /// # Panics
    /// 若已有延迟确认：宿主在上一个信号被确认前不得再次发送。
    pub fn on_invalidation(
        &mut self,
        metadata: Option<InvalidationMetadata>,
        acknowledgment: Acknowledgment,
    ) {
        assert!(
            self.state.deferred_acknowledgment.is_none(),
            "invalidation received while a previous acknowledgment is still deferred"
        );
        self.state.pending_invalidation = false;

        if let Some(metadata) = metadata {
            if let Some(viewport) = metadata.viewport {
                self.state.viewport_metrics = viewport;
                self.producer.set_viewport_metrics(&viewport);
            }
            self.state.scene_version = metadata.scene_version;
        }

        if self.state.outstanding_requests >= self.config.max_pipeline_depth {
            tracing::debug!(
                outstanding = self.state.outstanding_requests,
                "pipeline full; deferring acknowledgment"
            );
            self.state.deferred_acknowledgment = Some(acknowledgment);
            return;
        }

        self.state.outstanding_requests += 1;
        self.begin_frame();

        // Acked before the frame is drawn; the host may briefly see stale view properties.
        acknowledgment.invoke();
    }

    /// ### English
    /// Submits a scene outside of the producer's `Frame` handle.
    ///
    /// Only accepted while a frame is ready to draw; otherwise dropped and `false` is returned.
    ///
    /// ### 中文
    /// 不经由生产者的 `Frame` 句柄提交场景。
    ///
    /// 仅在帧处于可绘制状态时接受；否则丢弃并返回 `false`。
    pub fn submit(&mut self, scene: S) -> bool {
        self.state.submit(scene, &mut self.consumer)
    }

    /// ### English
    /// Marks one admitted frame as fully done and, once drained to the recovery depth, releases
    /// the deferred acknowledgment.
    ///
    /// # Panics
    /// If no frame is outstanding.
    ///
    /// ### 中文
    /// 将一个已接纳帧标记为完成；回落到恢复深度后释放延迟确认。
    ///
    /// # Panics
    /// 若没有在途帧。
    pub fn on_frame_complete(&mut self) {
        assert!(
            self.state.outstanding_requests > 0,
            "frame completion without an outstanding frame"
        );
        self.state.outstanding_requests -= 1;
        tracing::trace!(
            outstanding = self.state.outstanding_requests,
            "frame complete"
        );

        if self.state.outstanding_requests > self.config.recovery_pipeline_depth {
            return;
        }
        let Some(acknowledgment) = self.state.deferred_acknowledgment.take() else {
            return;
        };

        tracing::debug!(
            outstanding = self.state.outstanding_requests,
            "pipeline recovered; releasing deferred acknowledgment"
        );
        // Re-request first: releasing the ack may make the host send the next signal right away.
        self.request_frame();
        acknowledgment.invoke();
    }

    fn begin_frame(&mut self) {
        assert!(self.state.outstanding_requests > 0);
        assert!(
            self.state.outstanding_requests <= self.config.max_pipeline_depth,
            "outstanding_requests {} exceeds max depth {}",
            self.state.outstanding_requests,
            self.config.max_pipeline_depth
        );
        assert!(
            !self.state.is_ready_to_draw,
            "begin_frame while a frame is already being produced"
        );

        let frame_time = Instant::now();
        self.state.is_ready_to_draw = true;
        self.state.last_frame_start_time = Some(frame_time);
        tracing::trace!(
            outstanding = self.state.outstanding_requests,
            "begin frame"
        );

        {
            let mut frame = Frame {
                state: &mut self.state,
                host: &mut self.host,
                consumer: &mut self.consumer,
            };
            self.producer.begin_frame(frame_time, &mut frame);
        }

        let was_ready_to_draw = self.state.is_ready_to_draw;
        self.state.is_ready_to_draw = false;

        // Nothing was dispatched, so no completion will come back from the consumer.
        if was_ready_to_draw {
            self.on_frame_complete();
        }
    }
}

impl<S, P, H, R> Drop for PipelineController<S, P, H, R>
where
    P: FrameProducer<S>,
    H: InvalidationSource,
    R: RenderConsumer<S>,
{
    fn drop(&mut self) {
        if let Some(acknowledgment) = self.state.deferred_acknowledgment.take() {
            tracing::debug!("flushing deferred acknowledgment on teardown");
            acknowledgment.invoke();
        }
    }
}
