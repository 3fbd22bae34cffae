//! ### English
//! Single-use acknowledgment handle for one invalidation signal.
//!
//! ### 中文
//! 单个 invalidation 信号的一次性确认句柄。

use std::fmt;

type AckCallback = Box<dyn FnOnce() + Send + 'static>;

/// ### English
/// Host callback that must run exactly once per invalidation signal.
///
/// `invoke` consumes the handle. A handle dropped without being invoked (for example a command
/// that never reached the producer thread) still fires from `Drop`, so the host is never left
/// waiting.
///
/// ### 中文
/// 每个 invalidation 信号必须且只能执行一次的宿主回调。
///
/// `invoke` 会消耗该句柄。若句柄未被调用就被 drop（例如命令未能送达生产者线程），
/// 仍会在 `Drop` 中触发，保证宿主不会一直等待。
pub struct Acknowledgment {
    callback: Option<AckCallback>,
}

impl Acknowledgment {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Some(Box::new(callback)),
        }
    }

    /// ### English
    /// Acknowledgment with no host-side effect.
    ///
    /// ### 中文
    /// 不产生宿主侧效果的空确认。
    pub fn noop() -> Self {
        Self { callback: None }
    }

    /// ### English
    /// Runs the host callback.
    ///
    /// ### 中文
    /// 执行宿主回调。
    pub fn invoke(mut self) {
        if let Some(callback) = self.callback.take() {
            callback();
        }
    }
}

impl Drop for Acknowledgment {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::warn!("acknowledgment dropped without being invoked; firing it now");
            callback();
        }
    }
}

impl fmt::Debug for Acknowledgment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acknowledgment")
            .field("armed", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting() -> (Acknowledgment, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let for_ack = count.clone();
        let ack = Acknowledgment::new(move || {
            for_ack.fetch_add(1, Ordering::SeqCst);
        });
        (ack, count)
    }

    #[test]
    fn invoke_fires_once() {
        let (ack, count) = counting();
        ack.invoke();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_unfired_ack_still_fires_once() {
        let (ack, count) = counting();
        drop(ack);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
