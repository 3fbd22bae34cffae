//! ### English
//! Dedicated render thread (consumer context): owns every surface's renderer and draws scenes in
//! submission order.
//!
//! ### 中文
//! 独立渲染线程（消费者上下文）：持有所有 surface 的 renderer，并按提交顺序绘制场景。

use crossbeam_channel as channel;

use crate::engine::pipeline::{RenderConsumer, StampedScene};

use super::completion::{CompletedFrame, FrameCompletion, SurfaceLiveness};
use super::surface_id::{SurfaceId, SurfaceMap};

/// ### English
/// Thread name of the consumer context.
///
/// ### 中文
/// 消费者上下文线程名。
pub(super) const RENDER_THREAD_NAME: &str = "FramePipelineRender";

/// ### English
/// Draws submitted scenes for one surface. Lives on the render thread from attach to detach.
///
/// ### 中文
/// 为单个 surface 绘制已提交的场景。从 attach 到 detach 期间驻留在渲染线程。
pub trait Renderer<S>: Send {
    /// ### English
    /// Draws one scene. `completion` must be signalled once the frame is done; it may be kept
    /// and signalled later (for example after a GPU fence) from any thread.
    ///
    /// ### 中文
    /// 绘制一个场景。帧完成后必须触发 `completion`；可以先保存、稍后（例如 GPU fence 之后）
    /// 在任意线程触发。
    fn draw(&mut self, scene: StampedScene<S>, completion: FrameCompletion);
}

impl<S, T: Renderer<S> + ?Sized> Renderer<S> for Box<T> {
    fn draw(&mut self, scene: StampedScene<S>, completion: FrameCompletion) {
        (**self).draw(scene, completion);
    }
}

/// ### English
/// Jobs sent from the producer thread to the render thread. Processed strictly FIFO.
///
/// ### 中文
/// 从生产者线程发往渲染线程的任务，严格按 FIFO 处理。
pub(super) enum RenderJob<S> {
    /// ### English
    /// Installs the renderer for a new surface.
    ///
    /// ### 中文
    /// 为新 surface 安装 renderer。
    Attach {
        id: SurfaceId,
        renderer: Box<dyn Renderer<S>>,
    },
    /// ### English
    /// Draws one scene; ownership of the scene moves to the render thread.
    ///
    /// ### 中文
    /// 绘制一个场景；场景所有权转移到渲染线程。
    Draw {
        id: SurfaceId,
        scene: StampedScene<S>,
        completion: FrameCompletion,
    },
    /// ### English
    /// Drops the surface's renderer. Queued behind that surface's in-flight draws.
    ///
    /// ### 中文
    /// 释放该 surface 的 renderer；排在其在途绘制任务之后。
    Detach { id: SurfaceId },
    /// ### English
    /// Answers once every job queued before it has been processed.
    ///
    /// ### 中文
    /// 在其之前排队的所有任务处理完后应答。
    Barrier { response: channel::Sender<()> },
    /// ### English
    /// Finishes the queued jobs and exits.
    ///
    /// ### 中文
    /// 处理完已排队任务后退出。
    Shutdown,
}

/// ### English
/// Render thread entry. Returns on `Shutdown` or when every sender is gone.
///
/// ### 中文
/// 渲染线程入口；收到 `Shutdown` 或所有 sender 断开时返回。
pub(super) fn run_render_thread<S>(rx: channel::Receiver<RenderJob<S>>) {
    let mut renderers: SurfaceMap<Box<dyn Renderer<S>>> = SurfaceMap::default();

    while let Ok(job) = rx.recv() {
        match job {
            RenderJob::Attach { id, renderer } => {
                renderers.insert(id, renderer);
            }
            RenderJob::Draw {
                id,
                scene,
                completion,
            } => match renderers.get_mut(&id) {
                Some(renderer) => renderer.draw(scene, completion),
                None => {
                    tracing::debug!(surface = id.get(), "draw for detached surface skipped");
                    completion.complete();
                }
            },
            RenderJob::Detach { id } => {
                renderers.remove(&id);
            }
            RenderJob::Barrier { response } => {
                let _ = response.send(());
            }
            RenderJob::Shutdown => break,
        }
    }

    tracing::debug!(renderers = renderers.len(), "render thread exiting");
}

/// ### English
/// [`RenderConsumer`] that hands scenes to the render thread.
///
/// Dropping it (with its controller) revokes the surface's liveness and queues the renderer's
/// detach behind any in-flight draws.
///
/// ### 中文
/// 把场景交给渲染线程的 [`RenderConsumer`]。
///
/// 随控制器一同 drop 时会撤销 surface 的存活令牌，并把 renderer 的 detach 排在在途绘制之后。
pub(super) struct RenderThreadDispatch<S> {
    id: SurfaceId,
    liveness: SurfaceLiveness,
    render_tx: channel::Sender<RenderJob<S>>,
    completion_tx: channel::Sender<CompletedFrame>,
}

impl<S> RenderThreadDispatch<S> {
    pub(super) fn new(
        id: SurfaceId,
        liveness: SurfaceLiveness,
        render_tx: channel::Sender<RenderJob<S>>,
        completion_tx: channel::Sender<CompletedFrame>,
    ) -> Self {
        Self {
            id,
            liveness,
            render_tx,
            completion_tx,
        }
    }
}

impl<S> RenderConsumer<S> for RenderThreadDispatch<S> {
    fn dispatch_for_render(&mut self, scene: StampedScene<S>) {
        let completion =
            FrameCompletion::new(self.id, self.liveness.clone(), self.completion_tx.clone());
        // If the render thread is gone the job comes back in the error and its completion fires
        // on drop.
        let _ = self.render_tx.send(RenderJob::Draw {
            id: self.id,
            scene,
            completion,
        });
    }
}

impl<S> Drop for RenderThreadDispatch<S> {
    fn drop(&mut self) {
        self.liveness.revoke();
        let _ = self.render_tx.send(RenderJob::Detach { id: self.id });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::pipeline::SceneVersion;
    use dpi::PhysicalSize;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::Duration;

    struct Recording(Arc<Mutex<Vec<u64>>>);

    impl Renderer<u32> for Recording {
        fn draw(&mut self, scene: StampedScene<u32>, completion: FrameCompletion) {
            self.0.lock().expect("poisoned").push(scene.frame_seq);
            completion.complete();
        }
    }

    fn stamped(frame_seq: u64) -> StampedScene<u32> {
        StampedScene {
            scene: 0,
            construction_time: Duration::ZERO,
            frame_size: PhysicalSize::new(1, 1),
            scene_version: SceneVersion(0),
            frame_seq,
        }
    }

    #[test]
    fn draws_in_order_and_completes_each_frame() {
        let (render_tx, render_rx) = channel::unbounded();
        let (completion_tx, completion_rx) = channel::unbounded();
        let drawn = Arc::new(Mutex::new(Vec::new()));
        let worker = thread::spawn(move || run_render_thread::<u32>(render_rx));

        let id = SurfaceId(1);
        render_tx
            .send(RenderJob::Attach {
                id,
                renderer: Box::new(Recording(drawn.clone())),
            })
            .expect("render thread alive");
        let mut dispatch = RenderThreadDispatch::new(
            id,
            SurfaceLiveness::new(),
            render_tx.clone(),
            completion_tx,
        );
        for seq in 1..=5 {
            dispatch.dispatch_for_render(stamped(seq));
        }
        for _ in 0..5 {
            let done = completion_rx
                .recv_timeout(Duration::from_secs(5))
                .expect("completion");
            assert_eq!(done.surface_id, id);
        }

        drop(dispatch);
        render_tx.send(RenderJob::Shutdown).expect("render thread alive");
        worker.join().expect("render thread panicked");
        assert_eq!(*drawn.lock().expect("poisoned"), vec![1, 2, 3, 4, 5]);
    }
}
