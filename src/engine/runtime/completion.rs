//! ### English
//! Completion path from the render thread back to the producer thread.
//!
//! A completion never touches controller state directly: it is posted as a message and the
//! producer thread applies it, after checking the surface's liveness token.
//!
//! ### 中文
//! 从渲染线程回到生产者线程的完成通知路径。
//!
//! 完成通知从不直接修改控制器状态：它以消息形式投递，由生产者线程在检查 surface
//! 存活令牌后再应用。

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel as channel;

use super::surface_id::SurfaceId;

/// ### English
/// Explicit liveness token for one surface. Revoked on teardown; late completions carrying a
/// revoked token are discarded.
///
/// ### 中文
/// 单个 surface 的显式存活令牌。teardown 时撤销；携带已撤销令牌的迟到完成通知会被丢弃。
#[derive(Clone, Debug)]
pub(crate) struct SurfaceLiveness(Arc<AtomicBool>);

impl SurfaceLiveness {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    #[inline]
    pub(crate) fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// ### English
/// Message posted to the producer thread when one frame finished rendering.
///
/// ### 中文
/// 一帧渲染完成时投递给生产者线程的消息。
pub(super) struct CompletedFrame {
    pub surface_id: SurfaceId,
    pub liveness: SurfaceLiveness,
}

struct CompletionTarget {
    surface_id: SurfaceId,
    liveness: SurfaceLiveness,
    tx: channel::Sender<CompletedFrame>,
}

/// ### English
/// Single-use completion callback handed to a [`Renderer`](super::Renderer) with each scene.
///
/// Call [`FrameCompletion::complete`] once drawing is done (it may be moved to and called from
/// any thread). A completion dropped without being called still signals, so the pipeline
/// cannot stall on a forgotten frame.
///
/// ### 中文
/// 随每个场景交给 [`Renderer`](super::Renderer) 的一次性完成回调。
///
/// 绘制完成后调用 [`FrameCompletion::complete`]（可移动到任意线程调用）。
/// 未调用就被 drop 的完成回调仍会发出信号，避免管线因遗漏的帧而停滞。
pub struct FrameCompletion {
    target: Option<CompletionTarget>,
}

impl FrameCompletion {
    pub(super) fn new(
        surface_id: SurfaceId,
        liveness: SurfaceLiveness,
        tx: channel::Sender<CompletedFrame>,
    ) -> Self {
        Self {
            target: Some(CompletionTarget {
                surface_id,
                liveness,
                tx,
            }),
        }
    }

    /// ### English
    /// Surface this frame belongs to.
    ///
    /// ### 中文
    /// 该帧所属的 surface。
    pub fn surface_id(&self) -> Option<SurfaceId> {
        self.target.as_ref().map(|target| target.surface_id)
    }

    /// ### English
    /// Reports the frame as drawn.
    ///
    /// ### 中文
    /// 报告该帧已绘制完成。
    pub fn complete(mut self) {
        self.signal();
    }

    fn signal(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };
        if !target.liveness.is_alive() {
            return;
        }
        let _ = target.tx.send(CompletedFrame {
            surface_id: target.surface_id,
            liveness: target.liveness,
        });
    }
}

impl Drop for FrameCompletion {
    fn drop(&mut self) {
        if self.target.is_some() {
            tracing::warn!(
                surface = ?self.surface_id(),
                "frame completion dropped without being signalled; signalling now"
            );
            self.signal();
        }
    }
}

impl fmt::Debug for FrameCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameCompletion")
            .field("surface_id", &self.surface_id())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_posts_one_message() {
        let (tx, rx) = channel::unbounded();
        let completion = FrameCompletion::new(SurfaceId(3), SurfaceLiveness::new(), tx);
        completion.complete();
        let msg = rx.try_recv().expect("completion message");
        assert_eq!(msg.surface_id, SurfaceId(3));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_completion_still_posts() {
        let (tx, rx) = channel::unbounded();
        drop(FrameCompletion::new(SurfaceId(1), SurfaceLiveness::new(), tx));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn revoked_surface_posts_nothing() {
        let (tx, rx) = channel::unbounded();
        let liveness = SurfaceLiveness::new();
        let completion = FrameCompletion::new(SurfaceId(1), liveness.clone(), tx);
        liveness.revoke();
        completion.complete();
        assert!(rx.is_empty());
    }
}
