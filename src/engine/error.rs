//! ### English
//! Recoverable error taxonomy for configuration and runtime lifecycle.
//! Protocol violations inside the controller are not represented here: they are fatal assertions.
//!
//! ### 中文
//! 配置与运行时生命周期相关的可恢复错误类型。
//! 控制器内部的协议违规不在此表示：它们是致命断言。

use std::time::Duration;

/// ### English
/// Convenience result type used across the crate.
///
/// ### 中文
/// crate 内通用的 `Result` 别名。
pub type PipelineResult<T> = Result<T, PipelineError>;

/// ### English
/// Errors surfaced by configuration validation and runtime setup/teardown.
///
/// ### 中文
/// 配置校验以及运行时创建/关闭过程中暴露的错误。
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// ### English
    /// Pipeline depths violate `0 <= recovery < max` (or `max == 0`).
    ///
    /// ### 中文
    /// 管线深度不满足 `0 <= recovery < max`（或 `max == 0`）。
    #[error("invalid pipeline config: {0}")]
    InvalidConfig(String),

    /// ### English
    /// A dedicated worker thread could not be spawned.
    ///
    /// ### 中文
    /// 无法创建独立工作线程。
    #[error("failed to spawn {name} thread: {source}")]
    ThreadSpawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// ### English
    /// The producer thread did not answer within the configured timeout.
    ///
    /// ### 中文
    /// 生产者线程未在配置的超时时间内响应。
    #[error("timed out after {0:?} waiting for the producer thread")]
    InitTimeout(Duration),

    /// ### English
    /// The runtime is shut down (or shutting down) and rejects new work.
    ///
    /// ### 中文
    /// 运行时已关闭（或正在关闭），拒绝新的工作。
    #[error("pipeline runtime is shutting down")]
    ShuttingDown,
}

impl PipelineError {
    /// ### English
    /// Builds a [`PipelineError::InvalidConfig`] value.
    ///
    /// ### 中文
    /// 构造 [`PipelineError::InvalidConfig`]。
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = PipelineError::invalid_config("recovery 3 >= max 3");
        assert_eq!(
            err.to_string(),
            "invalid pipeline config: recovery 3 >= max 3"
        );
        assert_eq!(
            PipelineError::ShuttingDown.to_string(),
            "pipeline runtime is shutting down"
        );
    }
}
