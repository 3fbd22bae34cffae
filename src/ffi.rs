//! ### English
//! C ABI surface for `frame_pipeline`.
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//!
//! Threading contract for surface callbacks:
//! - `request_invalidation`, `set_viewport_metrics` and `begin_frame` run on the producer thread.
//! - `draw` runs on the render thread.
//! - `user_data` is shared by both threads; the embedder is responsible for its synchronization.
//!
//! ### 中文
//! `frame_pipeline` 的 C ABI 接口层。
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//!
//! surface 回调的线程约定：
//! - `request_invalidation`、`set_viewport_metrics` 与 `begin_frame` 在生产者线程执行。
//! - `draw` 在渲染线程执行。
//! - `user_data` 由两个线程共享；其同步由宿主负责。

use std::ffi::c_void;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use dpi::PhysicalSize;

use crate::engine::config::{PipelineConfig, RuntimeConfig};
use crate::engine::pipeline::{
    Acknowledgment, Frame, FrameProducer, InvalidationMetadata, InvalidationSource, SceneVersion,
    StampedScene, ViewportMetrics,
};
use crate::engine::runtime::{FrameCompletion, PipelineRuntime, Renderer, SurfaceHandle};

/// ### English
/// C ABI version for `frame_pipeline`.
///
/// ### 中文
/// `frame_pipeline` 的 C ABI 版本号。
const FRAME_PIPELINE_ABI_VERSION: u32 = 1;

/// ### English
/// Process-wide origin for the `frame_time_nanos` passed to `begin_frame`.
/// Set once by the first `frame_pipeline_engine_create`.
///
/// ### 中文
/// 传给 `begin_frame` 的 `frame_time_nanos` 的进程级时间原点。
/// 由第一次 `frame_pipeline_engine_create` 设置。
static FRAME_TIME_EPOCH: OnceLock<Instant> = OnceLock::new();

/// ### English
/// Scene pointer owned by the embedder; ownership moves to the `draw` callback.
///
/// ### 中文
/// 由宿主持有的场景指针；所有权转移给 `draw` 回调。
pub struct RawScene(*mut c_void);

unsafe impl Send for RawScene {}

#[repr(C)]
/// ### English
/// Opaque engine handle owning the producer and render threads.
///
/// ### 中文
/// 不透明引擎句柄，持有生产者线程与渲染线程。
pub struct FramePipelineEngine {
    runtime: PipelineRuntime<RawScene>,
}

#[repr(C)]
/// ### English
/// Opaque surface handle (thread-safe for the embedder to use via pointers).
///
/// ### 中文
/// 不透明 surface 句柄（宿主可通过指针线程安全使用）。
pub struct FramePipelineSurface {
    handle: SurfaceHandle<RawScene>,
}

/// ### English
/// Opaque frame handle, only valid inside the `begin_frame` callback it was passed to.
///
/// ### 中文
/// 不透明帧句柄，仅在传入它的 `begin_frame` 回调内有效。
pub struct FramePipelineFrame {
    _private: [u8; 0],
}

/// ### English
/// Opaque completion handle passed to `draw`; signal it exactly once.
///
/// ### 中文
/// 传给 `draw` 的不透明完成句柄；必须恰好触发一次。
pub struct FramePipelineCompletion {
    completion: FrameCompletion,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
/// ### English
/// Viewport geometry in physical pixels.
///
/// ### 中文
/// 视口几何（物理像素）。
pub struct FramePipelineViewport {
    pub width: u32,
    pub height: u32,
    pub device_pixel_ratio: f64,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
/// ### English
/// Metadata for one invalidation. `has_viewport = false` means the view properties did not change.
///
/// ### 中文
/// 单次 invalidation 的元数据。`has_viewport = false` 表示视图属性未变化。
pub struct FramePipelineInvalidation {
    pub has_viewport: bool,
    pub viewport: FramePipelineViewport,
    pub scene_version: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
/// ### English
/// One scene handed to `draw`, with its frame bookkeeping.
///
/// ### 中文
/// 交给 `draw` 的单个场景及其帧记录信息。
pub struct FramePipelineScene {
    /// ### English
    /// Pointer passed to `frame_pipeline_frame_submit`.
    ///
    /// ### 中文
    /// 传给 `frame_pipeline_frame_submit` 的指针。
    pub scene: *mut c_void,
    pub width: u32,
    pub height: u32,
    pub scene_version: u32,
    pub construction_time_nanos: u64,
    pub frame_seq: u64,
}

pub type FramePipelineUserCallback = Option<unsafe extern "C" fn(user_data: *mut c_void)>;

#[repr(C)]
#[derive(Clone, Copy)]
/// ### English
/// Per-surface callbacks. Any callback may be NULL.
///
/// ### 中文
/// 每个 surface 的回调集合。任意回调都可以为 NULL。
pub struct FramePipelineSurfaceCallbacks {
    pub user_data: *mut c_void,
    /// ### English
    /// The pipeline wants another invalidation signal (producer thread).
    ///
    /// ### 中文
    /// 管线需要新的 invalidation 信号（生产者线程）。
    pub request_invalidation: FramePipelineUserCallback,
    /// ### English
    /// Viewport metrics changed (producer thread).
    ///
    /// ### 中文
    /// 视口参数发生变化（生产者线程）。
    pub set_viewport_metrics:
        Option<unsafe extern "C" fn(user_data: *mut c_void, viewport: *const FramePipelineViewport)>,
    /// ### English
    /// Produce a frame; call `frame_pipeline_frame_submit` at most once before returning
    /// (producer thread).
    ///
    /// ### 中文
    /// 生成一帧；返回前至多调用一次 `frame_pipeline_frame_submit`（生产者线程）。
    pub begin_frame: Option<
        unsafe extern "C" fn(user_data: *mut c_void, frame_time_nanos: u64, frame: *mut FramePipelineFrame),
    >,
    /// ### English
    /// Draw a submitted scene and later call `frame_pipeline_completion_signal` (render thread).
    ///
    /// ### 中文
    /// 绘制已提交场景，之后调用 `frame_pipeline_completion_signal`（渲染线程）。
    pub draw: Option<
        unsafe extern "C" fn(
            user_data: *mut c_void,
            scene: *const FramePipelineScene,
            completion: *mut FramePipelineCompletion,
        ),
    >,
}

struct SurfaceCallbacks(FramePipelineSurfaceCallbacks);

unsafe impl Send for SurfaceCallbacks {}
unsafe impl Sync for SurfaceCallbacks {}

struct CallbackProducer(Arc<SurfaceCallbacks>);

impl FrameProducer<RawScene> for CallbackProducer {
    fn set_viewport_metrics(&mut self, metrics: &ViewportMetrics) {
        let callbacks = &self.0.0;
        let Some(callback) = callbacks.set_viewport_metrics else {
            return;
        };
        let viewport = FramePipelineViewport {
            width: metrics.physical_size.width,
            height: metrics.physical_size.height,
            device_pixel_ratio: metrics.device_pixel_ratio,
        };
        unsafe { callback(callbacks.user_data, &viewport) };
    }

    fn begin_frame(&mut self, frame_time: Instant, frame: &mut Frame<'_, RawScene>) {
        let callbacks = &self.0.0;
        let Some(callback) = callbacks.begin_frame else {
            return;
        };
        let epoch = *FRAME_TIME_EPOCH.get_or_init(Instant::now);
        let frame_time_nanos = frame_time.saturating_duration_since(epoch).as_nanos() as u64;
        let frame = frame as *mut Frame<'_, RawScene> as *mut FramePipelineFrame;
        unsafe { callback(callbacks.user_data, frame_time_nanos, frame) };
    }
}

struct CallbackRenderer(Arc<SurfaceCallbacks>);

impl Renderer<RawScene> for CallbackRenderer {
    fn draw(&mut self, scene: StampedScene<RawScene>, completion: FrameCompletion) {
        let callbacks = &self.0.0;
        let Some(callback) = callbacks.draw else {
            completion.complete();
            return;
        };
        let info = FramePipelineScene {
            scene: scene.scene.0,
            width: scene.frame_size.width,
            height: scene.frame_size.height,
            scene_version: scene.scene_version.0,
            construction_time_nanos: scene.construction_time.as_nanos() as u64,
            frame_seq: scene.frame_seq,
        };
        let completion = Box::into_raw(Box::new(FramePipelineCompletion { completion }));
        unsafe { callback(callbacks.user_data, &info, completion) };
    }
}

struct CallbackHost(Arc<SurfaceCallbacks>);

impl InvalidationSource for CallbackHost {
    fn request_invalidation(&mut self) {
        let callbacks = &self.0.0;
        if let Some(callback) = callbacks.request_invalidation {
            unsafe { callback(callbacks.user_data) };
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn frame_pipeline_abi_version() -> u32 {
    FRAME_PIPELINE_ABI_VERSION
}

#[unsafe(no_mangle)]
/// ### English
/// Creates an engine. Returns NULL if `recovery_depth >= max_depth`, `max_depth == 0`, or the
/// threads cannot be started. A zero default size falls back to 1280x720.
///
/// ### 中文
/// 创建引擎。若 `recovery_depth >= max_depth`、`max_depth == 0` 或线程无法启动，返回 NULL。
/// 默认尺寸为 0 时回退到 1280x720。
pub extern "C" fn frame_pipeline_engine_create(
    max_depth: u32,
    recovery_depth: u32,
    default_width: u32,
    default_height: u32,
) -> *mut FramePipelineEngine {
    FRAME_TIME_EPOCH.get_or_init(Instant::now);

    let Ok(pipeline) = PipelineConfig::new(max_depth, recovery_depth) else {
        return std::ptr::null_mut();
    };
    let mut config = RuntimeConfig {
        pipeline,
        ..RuntimeConfig::default()
    };
    if default_width != 0 && default_height != 0 {
        config.default_size = PhysicalSize::new(default_width, default_height);
    }

    match PipelineRuntime::new(config) {
        Ok(runtime) => Box::into_raw(Box::new(FramePipelineEngine { runtime })),
        Err(err) => {
            tracing::error!(%err, "frame_pipeline_engine_create failed");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys an engine: tears down remaining surfaces (flushing deferred acknowledgments) and
/// joins both threads.
///
/// ### 中文
/// 销毁引擎：销毁剩余 surface（冲刷延迟确认）并 join 两个线程。
pub unsafe extern "C" fn frame_pipeline_engine_destroy(engine: *mut FramePipelineEngine) {
    if engine.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(engine));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Creates one surface. Returns NULL on failure.
///
/// ### 中文
/// 创建一个 surface；失败时返回 NULL。
pub unsafe extern "C" fn frame_pipeline_surface_create(
    engine: *mut FramePipelineEngine,
    width: u32,
    height: u32,
    device_pixel_ratio: f64,
    callbacks: *const FramePipelineSurfaceCallbacks,
) -> *mut FramePipelineSurface {
    if engine.is_null() || callbacks.is_null() {
        return std::ptr::null_mut();
    }

    let callbacks = Arc::new(SurfaceCallbacks(unsafe { *callbacks }));
    let device_pixel_ratio = if device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    };
    let viewport = ViewportMetrics::new(PhysicalSize::new(width, height), device_pixel_ratio);

    let producer_callbacks = callbacks.clone();
    let engine = unsafe { &*engine };
    let result = engine.runtime.create_surface(
        viewport,
        move || CallbackProducer(producer_callbacks),
        CallbackRenderer(callbacks.clone()),
        CallbackHost(callbacks),
    );

    match result {
        Ok(handle) => Box::into_raw(Box::new(FramePipelineSurface { handle })),
        Err(err) => {
            tracing::error!(%err, "frame_pipeline_surface_create failed");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a surface and blocks until its deferred acknowledgment (if any) has run and every
/// queued `draw` has returned. After this returns no callback receives the surface's
/// `user_data`, so it may be freed.
///
/// Must not be called from inside a callback of the same engine.
///
/// ### 中文
/// 销毁 surface，并阻塞直到其延迟确认（如有）已执行、所有已排队的 `draw` 均已返回。
/// 返回后不会再有回调收到该 surface 的 `user_data`，宿主可以释放它。
///
/// 不得在同一引擎的回调内部调用。
pub unsafe extern "C" fn frame_pipeline_surface_destroy(surface: *mut FramePipelineSurface) {
    if surface.is_null() {
        return;
    }
    let FramePipelineSurface { handle } = *unsafe { Box::from_raw(surface) };
    handle.destroy();
}

#[unsafe(no_mangle)]
/// ### English
/// Delivers one invalidation signal. `ack` is called exactly once (possibly much later, on the
/// producer thread). `invalidation` may be NULL ("no change").
///
/// ### 中文
/// 投递一次 invalidation 信号。`ack` 恰好被调用一次（可能很久之后、在生产者线程上）。
/// `invalidation` 可为 NULL（表示“无变化”）。
pub unsafe extern "C" fn frame_pipeline_surface_invalidate(
    surface: *mut FramePipelineSurface,
    invalidation: *const FramePipelineInvalidation,
    ack: FramePipelineUserCallback,
    ack_user_data: *mut c_void,
) {
    let ack_user_data = ack_user_data as usize;
    let acknowledgment = match ack {
        Some(callback) => Acknowledgment::new(move || unsafe {
            callback(ack_user_data as *mut c_void);
        }),
        None => Acknowledgment::noop(),
    };

    if surface.is_null() {
        acknowledgment.invoke();
        return;
    }

    let metadata = if invalidation.is_null() {
        None
    } else {
        let invalidation = unsafe { *invalidation };
        Some(InvalidationMetadata {
            viewport: invalidation.has_viewport.then(|| {
                ViewportMetrics::new(
                    PhysicalSize::new(invalidation.viewport.width, invalidation.viewport.height),
                    invalidation.viewport.device_pixel_ratio,
                )
            }),
            scene_version: SceneVersion(invalidation.scene_version),
        })
    };

    let surface = unsafe { &*surface };
    surface.handle.invalidate(metadata, acknowledgment);
}

#[unsafe(no_mangle)]
/// ### English
/// Asks the pipeline to request another invalidation (idempotent).
///
/// ### 中文
/// 请求管线再要一次 invalidation（幂等）。
pub unsafe extern "C" fn frame_pipeline_surface_request_frame(surface: *mut FramePipelineSurface) {
    if surface.is_null() {
        return;
    }
    let surface = unsafe { &*surface };
    surface.handle.request_frame();
}

#[unsafe(no_mangle)]
/// ### English
/// Submits a scene for the current frame. Returns `false` if this frame already submitted.
///
/// `frame` must be the pointer passed to the `begin_frame` callback currently running.
///
/// ### 中文
/// 为当前帧提交场景；若本帧已提交过则返回 `false`。
///
/// `frame` 必须是当前正在执行的 `begin_frame` 回调收到的指针。
pub unsafe extern "C" fn frame_pipeline_frame_submit(
    frame: *mut FramePipelineFrame,
    scene: *mut c_void,
) -> bool {
    if frame.is_null() {
        return false;
    }
    let frame = unsafe { &mut *(frame as *mut Frame<'static, RawScene>) };
    frame.submit(RawScene(scene))
}

#[unsafe(no_mangle)]
/// ### English
/// Requests another frame from inside `begin_frame`.
///
/// ### 中文
/// 在 `begin_frame` 内请求下一帧。
pub unsafe extern "C" fn frame_pipeline_frame_schedule(frame: *mut FramePipelineFrame) {
    if frame.is_null() {
        return;
    }
    let frame = unsafe { &mut *(frame as *mut Frame<'static, RawScene>) };
    frame.schedule_frame();
}

#[unsafe(no_mangle)]
/// ### English
/// Signals that the scene passed to `draw` has been drawn. Consumes `completion`.
///
/// ### 中文
/// 通知传给 `draw` 的场景已绘制完成；会消耗 `completion`。
pub unsafe extern "C" fn frame_pipeline_completion_signal(completion: *mut FramePipelineCompletion) {
    if completion.is_null() {
        return;
    }
    let completion = unsafe { Box::from_raw(completion) };
    completion.completion.complete();
}
