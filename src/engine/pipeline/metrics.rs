//! ### English
//! Host-provided viewport/scene metadata carried by invalidation signals.
//!
//! ### 中文
//! invalidation 信号携带的宿主侧视口/场景元数据。

use dpi::PhysicalSize;

/// ### English
/// Viewport geometry of the surface, in physical pixels.
///
/// ### 中文
/// surface 的视口几何信息（物理像素）。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportMetrics {
    /// ### English
    /// Physical width/height of the surface.
    ///
    /// ### 中文
    /// surface 的物理宽高。
    pub physical_size: PhysicalSize<u32>,
    /// ### English
    /// Physical pixels per logical pixel.
    ///
    /// ### 中文
    /// 每逻辑像素对应的物理像素数。
    pub device_pixel_ratio: f64,
}

impl ViewportMetrics {
    pub fn new(physical_size: PhysicalSize<u32>, device_pixel_ratio: f64) -> Self {
        Self {
            physical_size,
            device_pixel_ratio,
        }
    }
}

impl Default for ViewportMetrics {
    fn default() -> Self {
        Self {
            physical_size: PhysicalSize::new(0, 0),
            device_pixel_ratio: 1.0,
        }
    }
}

/// ### English
/// Opaque scene-version token echoed back to the host on every submitted scene.
///
/// ### 中文
/// 不透明的场景版本号；每个提交的场景都会回带给宿主。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SceneVersion(pub u32);

/// ### English
/// Metadata attached to one invalidation signal.
///
/// `viewport` is `None` when the host reports no property change; the scene version is always
/// updated when metadata is present.
///
/// ### 中文
/// 单个 invalidation 信号附带的元数据。
///
/// 宿主未报告属性变化时 `viewport` 为 `None`；只要元数据存在，场景版本总会被更新。
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InvalidationMetadata {
    pub viewport: Option<ViewportMetrics>,
    pub scene_version: SceneVersion,
}
