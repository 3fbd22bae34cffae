//! ### English
//! `frame_pipeline` crate root.
//! Bounds the number of frames in flight between a host that signals invalidations, a frame
//! producer and a rendering consumer. The Rust API lives under `engine`; the C ABI is exported
//! via `ffi`.
//!
//! ### 中文
//! `frame_pipeline` 的 crate 根。
//! 在发出 invalidation 的宿主、帧生产者与渲染消费者之间限制在途帧数量。
//! Rust API 位于 `engine`；C ABI 通过 `ffi` 导出。
mod engine;
mod ffi;

pub use engine::config::{
    DEFAULT_MAX_PIPELINE_DEPTH, DEFAULT_RECOVERY_PIPELINE_DEPTH, DEFAULT_SURFACE_SIZE,
    PipelineConfig, RuntimeConfig,
};
pub use engine::error::{PipelineError, PipelineResult};
pub use engine::pipeline::{
    Acknowledgment, Frame, FrameProducer, InvalidationMetadata, InvalidationSource,
    PipelineController, PipelineSnapshot, RenderConsumer, SceneVersion, StampedScene,
    ViewportMetrics,
};
pub use engine::runtime::{FrameCompletion, PipelineRuntime, Renderer, SurfaceHandle, SurfaceId};
