//! ### English
//! Frame pipeline controller: bounds frames in flight between the host, the frame producer and
//! the rendering consumer.
//!
//! ### 中文
//! 帧管线控制器：在宿主、帧生产者与渲染消费者之间限制在途帧数量。

mod ack;
mod collaborators;
mod controller;
mod frame;
mod metrics;
mod scene;
mod state;

pub use ack::Acknowledgment;
pub use collaborators::{FrameProducer, InvalidationSource, RenderConsumer};
pub use controller::{PipelineController, PipelineSnapshot};
pub use frame::Frame;
pub use metrics::{InvalidationMetadata, SceneVersion, ViewportMetrics};
pub use scene::StampedScene;
