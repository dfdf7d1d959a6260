// crates/ob_config/src/lib.rs

//! OrbSpectral Config Layer
//!
//! 配置层，集中定义网格、Helmholtz 求解和时间推进的参数。
//! 所有配置都可经 JSON 字符串往返，文件读写由调用方负责。
//!
//! # 模块概览
//!
//! - [`solve_config`]: `SolveConfig`、`GridConfig` 及边界/失败/分辨率策略枚举
//! - [`driver_config`]: `DriverConfig` 平流扩散驱动参数
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 4: ob_workflow   ─> DriverConfig
//! Layer 3: ob_spectral   ─> SolveConfig, GridConfig
//! Layer 2: ob_config     (本层)
//! Layer 1: ob_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver_config;
pub mod error;
pub mod solve_config;

/// 层级标识
pub const LAYER: u8 = 2;

// 重导出核心类型
pub use driver_config::DriverConfig;
pub use error::ConfigError;
pub use solve_config::{BoundaryType, FailureMode, GridConfig, ResolutionPolicy, SolveConfig};
