//! ### English
//! Engine internal modules (pipeline controller, execution contexts, configuration, errors).
//!
//! ### 中文
//! 引擎内部模块（管线控制器、执行上下文、配置、错误类型）。
pub mod config;
pub mod error;
pub mod pipeline;
pub mod runtime;
