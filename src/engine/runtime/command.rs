//! ### English
//! Internal command protocol between host threads and the dedicated producer thread.
//!
//! ### 中文
//! 宿主线程与独立生产者线程之间的内部命令协议。

use crossbeam_channel as channel;

use crate::engine::pipeline::{
    Acknowledgment, FrameProducer, InvalidationMetadata, InvalidationSource, ViewportMetrics,
};

use super::render_thread::Renderer;
use super::surface_id::SurfaceId;

/// ### English
/// Builds the frame producer on the producer thread (the producer itself need not be `Send`).
///
/// ### 中文
/// 在生产者线程上构造帧生产者（生产者本身不必是 `Send`）。
pub(super) type ProducerFactory<S> = Box<dyn FnOnce() -> Box<dyn FrameProducer<S>> + Send>;

/// ### English
/// Host-side invalidation source moved onto the producer thread.
///
/// ### 中文
/// 移动到生产者线程上的宿主侧 invalidation source。
pub(super) type HostSource = Box<dyn InvalidationSource + Send>;

/// ### English
/// Commands sent from host threads to the producer thread.
///
/// ### 中文
/// 从宿主线程发送到生产者线程的命令。
pub(super) enum Command<S> {
    /// ### English
    /// Creates one surface (controller + producer on this thread, renderer on the render thread).
    ///
    /// ### 中文
    /// 创建一个 surface（控制器与生产者在本线程，renderer 在渲染线程）。
    CreateSurface {
        id: SurfaceId,
        initial_viewport: ViewportMetrics,
        producer: ProducerFactory<S>,
        renderer: Box<dyn Renderer<S>>,
        host: HostSource,
        /// ### English
        /// One-shot response used to unblock the caller once the surface exists.
        ///
        /// ### 中文
        /// 一次性响应：surface 创建完成后解除调用方阻塞。
        response: channel::Sender<()>,
    },
    /// ### English
    /// One invalidation signal from the host.
    ///
    /// ### 中文
    /// 来自宿主的一次 invalidation 信号。
    Invalidate {
        id: SurfaceId,
        metadata: Option<InvalidationMetadata>,
        acknowledgment: Acknowledgment,
    },
    /// ### English
    /// Idempotent "please invalidate me" request routed to the surface's controller.
    ///
    /// ### 中文
    /// 幂等的“请求重绘”请求，路由到该 surface 的控制器。
    RequestFrame { id: SurfaceId },
    /// ### English
    /// Tears the surface down (flushes any deferred acknowledgment).
    ///
    /// ### 中文
    /// 销毁 surface（冲刷任何延迟确认）。
    DestroySurface {
        id: SurfaceId,
        /// ### English
        /// Resolved by the render thread once the surface's queued draws and detach are done.
        ///
        /// ### 中文
        /// 渲染线程处理完该 surface 已排队的绘制与 detach 后完成。
        response: Option<channel::Sender<()>>,
    },
    /// ### English
    /// Tears down every surface and exits the producer thread.
    ///
    /// ### 中文
    /// 销毁所有 surface 并退出生产者线程。
    Shutdown,
}
