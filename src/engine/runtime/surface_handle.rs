//! ### English
//! Thread-safe host-side handle for one surface.
//!
//! ### 中文
//! 单个 surface 的线程安全宿主侧句柄。

use crossbeam_channel as channel;

use crate::engine::pipeline::{Acknowledgment, InvalidationMetadata};

use super::command::Command;
use super::surface_id::SurfaceId;

/// ### English
/// Handle for a single surface. It only sends commands to the producer thread, so it can be used
/// from any host thread.
///
/// Dropping the handle destroys the surface on the producer thread.
///
/// ### 中文
/// 单个 surface 的句柄。仅向生产者线程发送命令，因此可在任意宿主线程使用。
///
/// drop 该句柄会在生产者线程上销毁 surface。
pub struct SurfaceHandle<S> {
    /// ### English
    /// Runtime-unique surface ID.
    ///
    /// ### 中文
    /// 运行时内唯一的 surface ID。
    id: SurfaceId,
    /// ### English
    /// Command channel into the producer thread.
    ///
    /// ### 中文
    /// 通往生产者线程的命令 channel。
    command_tx: channel::Sender<Command<S>>,
    destroyed: bool,
}

impl<S> SurfaceHandle<S> {
    pub(super) fn new(id: SurfaceId, command_tx: channel::Sender<Command<S>>) -> Self {
        Self {
            id,
            command_tx,
            destroyed: false,
        }
    }

    /// ### English
    /// Delivers one invalidation signal. `acknowledgment` runs exactly once on the producer
    /// thread: right after the frame is started, later if the pipeline is full, or at teardown.
    /// If the runtime is already shut down it runs immediately on this thread.
    ///
    /// ### 中文
    /// 投递一次 invalidation 信号。`acknowledgment` 会在生产者线程上恰好执行一次：
    /// 帧开始后立即执行；管线已满时延后执行；或在 teardown 时执行。
    /// 若运行时已关闭，则立即在当前线程执行。
    pub fn invalidate(&self, metadata: Option<InvalidationMetadata>, acknowledgment: Acknowledgment) {
        if let Err(channel::SendError(Command::Invalidate { acknowledgment, .. })) =
            self.command_tx.send(Command::Invalidate {
                id: self.id,
                metadata,
                acknowledgment,
            })
        {
            acknowledgment.invoke();
        }
    }

    /// ### English
    /// Asks the pipeline to request another invalidation from the host (idempotent).
    ///
    /// ### 中文
    /// 请求管线向宿主再要一次 invalidation（幂等）。
    pub fn request_frame(&self) {
        let _ = self.command_tx.send(Command::RequestFrame { id: self.id });
    }

    /// ### English
    /// Destroys the surface and blocks until it is fully torn down: the deferred acknowledgment
    /// (if any) has run, every draw queued for it has returned, and its renderer is dropped.
    /// No callback of this surface runs after this returns.
    ///
    /// Must not be called from the surface's own producer or renderer callbacks.
    ///
    /// ### 中文
    /// 销毁 surface，并阻塞直到完全拆除：延迟确认（如有）已执行、为其排队的绘制都已返回、
    /// 其 renderer 已释放。返回后该 surface 的任何回调都不会再执行。
    ///
    /// 不得在该 surface 自身的生产者或 renderer 回调中调用。
    pub fn destroy(mut self) {
        self.destroyed = true;
        let (response_tx, response_rx) = channel::bounded(1);
        let command = Command::DestroySurface {
            id: self.id,
            response: Some(response_tx),
        };
        if self.command_tx.send(command).is_ok() {
            // Disconnected means the runtime shut down, which also tears the surface down.
            let _ = response_rx.recv();
        }
    }
}

impl<S> Drop for SurfaceHandle<S> {
    /// ### English
    /// Schedules surface destruction on the producer thread without waiting for it.
    /// Use [`SurfaceHandle::destroy`] to wait.
    ///
    /// ### 中文
    /// 在生产者线程上调度 surface 销毁，不等待其完成。需要等待时使用 [`SurfaceHandle::destroy`]。
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        let _ = self.command_tx.send(Command::DestroySurface {
            id: self.id,
            response: None,
        });
    }
}
