//! ### English
//! Dedicated producer thread: owns every surface's pipeline controller and frame producer.
//! All controller state is mutated here and nowhere else.
//!
//! ### 中文
//! 独立生产者线程：持有所有 surface 的管线控制器与帧生产者。
//! 控制器状态只在此处被修改。

use crossbeam_channel as channel;

use crate::engine::config::PipelineConfig;
use crate::engine::pipeline::{FrameProducer, PipelineController};

use super::command::{Command, HostSource};
use super::completion::{CompletedFrame, SurfaceLiveness};
use super::render_thread::{RenderJob, RenderThreadDispatch};
use super::surface_id::SurfaceMap;

/// ### English
/// Thread name of the producer context.
///
/// ### 中文
/// 生产者上下文线程名。
pub(super) const PRODUCER_THREAD_NAME: &str = "FramePipelineProducer";

type SurfaceController<S> =
    PipelineController<S, Box<dyn FrameProducer<S>>, HostSource, RenderThreadDispatch<S>>;

/// ### English
/// Channels the producer thread is started with.
///
/// ### 中文
/// 启动生产者线程时传入的 channel 集合。
pub(super) struct ProducerThreadInit<S> {
    pub config: PipelineConfig,
    pub command_rx: channel::Receiver<Command<S>>,
    pub completion_tx: channel::Sender<CompletedFrame>,
    pub completion_rx: channel::Receiver<CompletedFrame>,
    pub render_tx: channel::Sender<RenderJob<S>>,
    pub init_tx: channel::Sender<()>,
}

/// ### English
/// Producer thread entry. Returns on `Shutdown` or when every command sender is gone; all
/// controllers are dropped before returning, which flushes deferred acknowledgments.
///
/// ### 中文
/// 生产者线程入口。收到 `Shutdown` 或所有命令 sender 断开时返回；返回前会 drop 所有控制器，
/// 从而冲刷延迟确认。
pub(super) fn run_producer_thread<S: 'static>(init: ProducerThreadInit<S>) {
    let ProducerThreadInit {
        config,
        command_rx,
        completion_tx,
        completion_rx,
        render_tx,
        init_tx,
    } = init;

    let mut surfaces: SurfaceMap<SurfaceController<S>> = SurfaceMap::default();
    let _ = init_tx.send(());

    loop {
        channel::select! {
            recv(completion_rx) -> msg => {
                // The thread keeps its own `completion_tx`, so this side never disconnects.
                let Ok(CompletedFrame { surface_id, liveness }) = msg else {
                    continue;
                };
                if !liveness.is_alive() {
                    continue;
                }
                if let Some(controller) = surfaces.get_mut(&surface_id) {
                    controller.on_frame_complete();
                }
            }
            recv(command_rx) -> command => {
                let Ok(command) = command else {
                    break;
                };
                match command {
                    Command::CreateSurface {
                        id,
                        initial_viewport,
                        producer,
                        renderer,
                        host,
                        response,
                    } => {
                        let liveness = SurfaceLiveness::new();
                        if render_tx.send(RenderJob::Attach { id, renderer }).is_err() {
                            tracing::error!(surface = id.get(), "render thread is gone; surface not created");
                            continue;
                        }

                        let mut producer = producer();
                        producer.set_viewport_metrics(&initial_viewport);
                        let dispatch = RenderThreadDispatch::new(
                            id,
                            liveness,
                            render_tx.clone(),
                            completion_tx.clone(),
                        );
                        let controller =
                            PipelineController::new(config, initial_viewport, producer, host, dispatch);
                        surfaces.insert(id, controller);
                        tracing::debug!(surface = id.get(), "surface created");

                        let _ = response.send(());
                    }
                    Command::Invalidate {
                        id,
                        metadata,
                        acknowledgment,
                    } => match surfaces.get_mut(&id) {
                        Some(controller) => controller.on_invalidation(metadata, acknowledgment),
                        None => {
                            tracing::debug!(surface = id.get(), "invalidation for unknown surface");
                            acknowledgment.invoke();
                        }
                    },
                    Command::RequestFrame { id } => {
                        if let Some(controller) = surfaces.get_mut(&id) {
                            controller.request_frame();
                        }
                    }
                    Command::DestroySurface { id, response } => {
                        // Dropping the controller flushes its ack and queues the renderer's detach.
                        if surfaces.remove(&id).is_some() {
                            tracing::debug!(surface = id.get(), "surface destroyed");
                        }
                        if let Some(response) = response {
                            let _ = render_tx.send(RenderJob::Barrier { response });
                        }
                    }
                    Command::Shutdown => break,
                }
            }
        }
    }

    tracing::debug!(surfaces = surfaces.len(), "producer thread exiting");
    surfaces.clear();
}
