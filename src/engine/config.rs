//! ### English
//! Pipeline and runtime configuration (depth limits, default surface size, init timeout).
//!
//! ### 中文
//! 管线与运行时配置（深度上限、默认 surface 尺寸、初始化超时）。

use std::time::Duration;

use dpi::PhysicalSize;

use super::error::{PipelineError, PipelineResult};

/// ### English
/// Default maximum number of frames in flight.
///
/// ### 中文
/// 默认的在途帧数量上限。
pub const DEFAULT_MAX_PIPELINE_DEPTH: u32 = 3;

/// ### English
/// Default depth the pipeline must drain to before a deferred acknowledgment is released.
///
/// ### 中文
/// 延迟确认被释放前，管线需要回落到的默认深度。
pub const DEFAULT_RECOVERY_PIPELINE_DEPTH: u32 = 1;

/// ### English
/// Fallback surface size used when the embedder passes a zero size.
///
/// ### 中文
/// 宿主传入 0 尺寸时使用的兜底 surface 尺寸。
pub const DEFAULT_SURFACE_SIZE: PhysicalSize<u32> = PhysicalSize::new(1280, 720);

const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// ### English
/// Flow-control limits for one pipeline controller.
///
/// ### 中文
/// 单个管线控制器的流控上限。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PipelineConfig {
    /// ### English
    /// Maximum frames admitted but not yet drawn. Invalidations beyond this are deferred.
    ///
    /// ### 中文
    /// 已接纳但尚未绘制完成的帧数上限；超过后 invalidation 会被延迟确认。
    pub max_pipeline_depth: u32,
    /// ### English
    /// A deferred acknowledgment is released once the depth drops to this value (or below).
    ///
    /// ### 中文
    /// 深度回落到该值（或更低）时释放延迟确认。
    pub recovery_pipeline_depth: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_pipeline_depth: DEFAULT_MAX_PIPELINE_DEPTH,
            recovery_pipeline_depth: DEFAULT_RECOVERY_PIPELINE_DEPTH,
        }
    }
}

impl PipelineConfig {
    /// ### English
    /// Builds and validates a config.
    ///
    /// ### 中文
    /// 构造并校验配置。
    pub fn new(max_pipeline_depth: u32, recovery_pipeline_depth: u32) -> PipelineResult<Self> {
        let config = Self {
            max_pipeline_depth,
            recovery_pipeline_depth,
        };
        config.validate()?;
        Ok(config)
    }

    /// ### English
    /// Checks `max >= 1` and `recovery < max`.
    ///
    /// ### 中文
    /// 校验 `max >= 1` 且 `recovery < max`。
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_pipeline_depth == 0 {
            return Err(PipelineError::invalid_config(
                "max_pipeline_depth must be at least 1",
            ));
        }
        if self.recovery_pipeline_depth >= self.max_pipeline_depth {
            return Err(PipelineError::invalid_config(format!(
                "recovery_pipeline_depth ({}) must be below max_pipeline_depth ({})",
                self.recovery_pipeline_depth, self.max_pipeline_depth
            )));
        }
        Ok(())
    }
}

/// ### English
/// Runtime-level configuration: per-surface pipeline limits plus thread bootstrap settings.
///
/// ### 中文
/// 运行时级配置：每个 surface 的管线上限以及线程启动参数。
#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    pub pipeline: PipelineConfig,
    /// ### English
    /// Size used when a surface is created with a zero width or height.
    ///
    /// ### 中文
    /// surface 以 0 宽或 0 高创建时使用的尺寸。
    pub default_size: PhysicalSize<u32>,
    /// ### English
    /// How long `PipelineRuntime::new` / `create_surface` wait for the producer thread.
    ///
    /// ### 中文
    /// `PipelineRuntime::new` / `create_surface` 等待生产者线程的最长时间。
    pub init_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            default_size: DEFAULT_SURFACE_SIZE,
            init_timeout: DEFAULT_INIT_TIMEOUT,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> PipelineResult<()> {
        self.pipeline.validate()?;
        if self.default_size.width == 0 || self.default_size.height == 0 {
            return Err(PipelineError::invalid_config(
                "default_size must be non-zero",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_three_and_one() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_pipeline_depth, 3);
        assert_eq!(config.recovery_pipeline_depth, 1);
        assert!(config.validate().is_ok());
        assert!(RuntimeConfig::default().validate().is_ok());
    }

    #[test]
    fn recovery_must_stay_below_max() {
        assert!(PipelineConfig::new(3, 3).is_err());
        assert!(PipelineConfig::new(3, 4).is_err());
        assert!(PipelineConfig::new(0, 0).is_err());
        assert!(PipelineConfig::new(1, 0).is_ok());
        assert!(PipelineConfig::new(5, 4).is_ok());
    }

    #[test]
    fn zero_default_size_is_rejected() {
        let config = RuntimeConfig {
            default_size: PhysicalSize::new(0, 720),
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
