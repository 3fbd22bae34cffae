//! ### English
//! Execution contexts around the pipeline controller (public API).
//!
//! - Producer thread: controllers and frame producers, fed by a command channel.
//! - Render thread: renderers, fed by a FIFO job channel; completions travel back as messages.
//!
//! ### 中文
//! 管线控制器周边的执行上下文（对外公开 API）。
//!
//! - 生产者线程：控制器与帧生产者，由命令 channel 驱动。
//! - 渲染线程：renderer，由 FIFO 任务 channel 驱动；完成通知以消息形式回传。

mod command;
mod completion;
mod producer_thread;
mod render_thread;
mod surface_id;

mod pipeline_runtime;
mod surface_handle;

pub use completion::FrameCompletion;
pub use pipeline_runtime::PipelineRuntime;
pub use render_thread::Renderer;
pub use surface_handle::SurfaceHandle;
pub use surface_id::SurfaceId;
