//! ### English
//! Seams to the three external roles the controller talks to.
//!
//! ### 中文
//! 控制器与三个外部角色之间的接口边界。

use std::time::Instant;

use super::frame::Frame;
use super::metrics::ViewportMetrics;
use super::scene::StampedScene;

/// ### English
/// Host side that emits invalidation signals. The controller only ever asks it for one more.
///
/// ### 中文
/// 发出 invalidation 信号的宿主侧；控制器只会请求它再发一次。
pub trait InvalidationSource {
    /// ### English
    /// "Please invalidate me." No payload, no acknowledgment.
    ///
    /// ### 中文
    /// “请使我失效（重绘）”。无载荷、无确认。
    fn request_invalidation(&mut self);
}

/// ### English
/// Application layer that turns a "begin frame" notification into (at most) one scene.
///
/// ### 中文
/// 应用层：把一次 "begin frame" 通知转换为（至多）一个场景。
pub trait FrameProducer<S> {
    /// ### English
    /// Called synchronously whenever an invalidation carries new viewport metrics, independent
    /// of pipeline depth.
    ///
    /// ### 中文
    /// 每当 invalidation 携带新的视口参数时同步调用，与管线深度无关。
    fn set_viewport_metrics(&mut self, metrics: &ViewportMetrics);

    /// ### English
    /// Produces a frame. Call `frame.submit(scene)` zero or one times before returning; not
    /// submitting means nothing changed and the slot is completed immediately.
    ///
    /// ### 中文
    /// 生成一帧。返回前调用 `frame.submit(scene)` 零次或一次；不提交表示无变化，
    /// 该帧槽位会被立即完成。
    fn begin_frame(&mut self, frame_time: Instant, frame: &mut Frame<'_, S>);
}

/// ### English
/// Consumer that renders submitted scenes asynchronously.
///
/// Every dispatched scene must eventually produce exactly one `on_frame_complete` on the
/// producer context, in dispatch order. Routing the completion back is the consumer's job.
///
/// ### 中文
/// 异步渲染已提交场景的消费者。
///
/// 每个派发的场景最终都必须在生产者上下文中产生且只产生一次 `on_frame_complete`，
/// 并保持派发顺序。完成通知的回传由消费者负责。
pub trait RenderConsumer<S> {
    /// ### English
    /// Takes ownership of the scene and returns without waiting for rendering.
    ///
    /// ### 中文
    /// 接管场景所有权，不等待渲染完成即返回。
    fn dispatch_for_render(&mut self, scene: StampedScene<S>);
}

impl<S, T: FrameProducer<S> + ?Sized> FrameProducer<S> for Box<T> {
    fn set_viewport_metrics(&mut self, metrics: &ViewportMetrics) {
        (**self).set_viewport_metrics(metrics);
    }

    fn begin_frame(&mut self, frame_time: Instant, frame: &mut Frame<'_, S>) {
        (**self).begin_frame(frame_time, frame);
    }
}

impl<T: InvalidationSource + ?Sized> InvalidationSource for Box<T> {
    fn request_invalidation(&mut self) {
        (**self).request_invalidation();
    }
}
