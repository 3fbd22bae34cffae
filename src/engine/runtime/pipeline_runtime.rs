//! ### English
//! Pipeline runtime that spawns and owns the producer and render threads.
//!
//! ### 中文
//! 创建并持有生产者线程与渲染线程的管线运行时。

use std::thread;

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::config::RuntimeConfig;
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::pipeline::{FrameProducer, InvalidationSource, ViewportMetrics};

use super::command::Command;
use super::producer_thread::{PRODUCER_THREAD_NAME, ProducerThreadInit, run_producer_thread};
use super::render_thread::{RENDER_THREAD_NAME, RenderJob, Renderer, run_render_thread};
use super::surface_handle::SurfaceHandle;
use super::surface_id::SurfaceIdAllocator;

/// ### English
/// Runtime owning the producer context (controllers + producers) and the consumer context
/// (renderers).
///
/// ### 中文
/// 持有生产者上下文（控制器 + 生产者）与消费者上下文（renderer）的运行时。
pub struct PipelineRuntime<S: Send + 'static> {
    /// ### English
    /// Validated configuration shared by every surface.
    ///
    /// ### 中文
    /// 所有 surface 共享的已校验配置。
    config: RuntimeConfig,
    /// ### English
    /// Command channel into the producer thread.
    ///
    /// ### 中文
    /// 发往生产者线程的命令 channel。
    command_tx: channel::Sender<Command<S>>,
    /// ### English
    /// Job channel into the render thread (only used here to stop it).
    ///
    /// ### 中文
    /// 发往渲染线程的任务 channel（此处仅用于停止它）。
    render_tx: channel::Sender<RenderJob<S>>,
    producer_thread: Option<thread::JoinHandle<()>>,
    render_thread: Option<thread::JoinHandle<()>>,
    ids: SurfaceIdAllocator,
}

impl<S: Send + 'static> PipelineRuntime<S> {
    /// ### English
    /// Validates `config`, spawns both threads and blocks until the producer thread is running
    /// (or `config.init_timeout` elapses).
    ///
    /// ### 中文
    /// 校验 `config`，创建两个线程，并阻塞直到生产者线程开始运行（或超过 `config.init_timeout`）。
    pub fn new(config: RuntimeConfig) -> PipelineResult<Self> {
        config.validate()?;

        let (render_tx, render_rx) = channel::unbounded::<RenderJob<S>>();
        let render_thread = thread::Builder::new()
            .name(RENDER_THREAD_NAME.to_string())
            .spawn(move || run_render_thread(render_rx))
            .map_err(|source| {
                tracing::error!(%source, "failed to spawn render thread");
                PipelineError::ThreadSpawn {
                    name: RENDER_THREAD_NAME,
                    source,
                }
            })?;

        let (command_tx, command_rx) = channel::unbounded::<Command<S>>();
        let (completion_tx, completion_rx) = channel::unbounded();
        let (init_tx, init_rx) = channel::bounded(1);
        let init = ProducerThreadInit {
            config: config.pipeline,
            command_rx,
            completion_tx,
            completion_rx,
            render_tx: render_tx.clone(),
            init_tx,
        };

        let producer_thread = match thread::Builder::new()
            .name(PRODUCER_THREAD_NAME.to_string())
            .spawn(move || run_producer_thread(init))
        {
            Ok(handle) => handle,
            Err(source) => {
                tracing::error!(%source, "failed to spawn producer thread");
                let _ = render_tx.send(RenderJob::Shutdown);
                let _ = render_thread.join();
                return Err(PipelineError::ThreadSpawn {
                    name: PRODUCER_THREAD_NAME,
                    source,
                });
            }
        };

        let mut runtime = Self {
            config,
            command_tx,
            render_tx,
            producer_thread: Some(producer_thread),
            render_thread: Some(render_thread),
            ids: SurfaceIdAllocator::new(),
        };

        match init_rx.recv_timeout(config.init_timeout) {
            Ok(()) => Ok(runtime),
            Err(_) => {
                runtime.shutdown();
                Err(PipelineError::InitTimeout(config.init_timeout))
            }
        }
    }

    /// ### English
    /// Creates one surface and blocks until the producer thread has installed it.
    ///
    /// A zero width or height in `initial_viewport` is replaced by the runtime's default size.
    /// `producer` is invoked on the producer thread to build the frame producer; `renderer` is
    /// moved to the render thread; `host` is notified on the producer thread whenever the pipeline
    /// wants another invalidation.
    ///
    /// ### 中文
    /// 创建一个 surface，并阻塞直到生产者线程完成安装。
    ///
    /// `initial_viewport` 的宽或高为 0 时使用运行时默认尺寸。
    /// `producer` 在生产者线程上调用以构造帧生产者；`renderer` 被移动到渲染线程；
    /// 管线需要新的 invalidation 时会在生产者线程上通知 `host`。
    pub fn create_surface<F, P, R, H>(
        &self,
        initial_viewport: ViewportMetrics,
        producer: F,
        renderer: R,
        host: H,
    ) -> PipelineResult<SurfaceHandle<S>>
    where
        F: FnOnce() -> P + Send + 'static,
        P: FrameProducer<S> + 'static,
        R: Renderer<S> + 'static,
        H: InvalidationSource + Send + 'static,
    {
        if self.producer_thread.is_none() {
            return Err(PipelineError::ShuttingDown);
        }

        let size = initial_viewport.physical_size;
        let physical_size = if size.width == 0 || size.height == 0 {
            self.config.default_size
        } else {
            size
        };
        let initial_viewport = ViewportMetrics {
            physical_size: PhysicalSize::new(physical_size.width.max(1), physical_size.height.max(1)),
            ..initial_viewport
        };

        let id = self.ids.allocate();
        let (response_tx, response_rx) = channel::bounded(1);
        let command = Command::CreateSurface {
            id,
            initial_viewport,
            producer: Box::new(move || Box::new(producer()) as Box<dyn FrameProducer<S>>),
            renderer: Box::new(renderer),
            host: Box::new(host),
            response: response_tx,
        };
        if self.command_tx.send(command).is_err() {
            return Err(PipelineError::ShuttingDown);
        }

        match response_rx.recv_timeout(self.config.init_timeout) {
            Ok(()) => Ok(SurfaceHandle::new(id, self.command_tx.clone())),
            Err(channel::RecvTimeoutError::Timeout) => {
                let _ = self.command_tx.send(Command::DestroySurface { id, response: None });
                Err(PipelineError::InitTimeout(self.config.init_timeout))
            }
            Err(channel::RecvTimeoutError::Disconnected) => Err(PipelineError::ShuttingDown),
        }
    }

    /// ### English
    /// Stops both threads. Surfaces are torn down first (deferred acknowledgments flushed), then
    /// the render thread drains its queue and exits. Idempotent.
    ///
    /// ### 中文
    /// 停止两个线程。先销毁 surface（冲刷延迟确认），然后渲染线程处理完队列后退出。可重复调用。
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.producer_thread.take() {
            let _ = self.command_tx.send(Command::Shutdown);
            if thread.join().is_err() {
                tracing::error!("producer thread panicked");
            }
        }
        if let Some(thread) = self.render_thread.take() {
            let _ = self.render_tx.send(RenderJob::Shutdown);
            if thread.join().is_err() {
                tracing::error!("render thread panicked");
            }
        }
    }
}

impl<S: Send + 'static> Drop for PipelineRuntime<S> {
    /// ### English
    /// Ensures both threads are shut down when the runtime is dropped.
    ///
    /// ### 中文
    /// 确保运行时 drop 时关闭两个线程。
    fn drop(&mut self) {
        self.shutdown();
    }
}
