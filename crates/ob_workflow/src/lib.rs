// crates/ob_workflow/src/lib.rs

//! OrbSpectral 工作流层
//!
//! 在谱核心之上做时间推进。
//!
//! # 模块结构
//!
//! - [`driver`]: IMEX-BDF1 平流扩散驱动
//! - [`runner`]: 取消、墙钟预算、步报告与运行汇总
//!
//! # 示例
//!
//! ```
//! use ob_config::DriverConfig;
//! use ob_spectral::Grid;
//! use ob_workflow::{example_initial_condition, example_velocity, AdvectionDiffusion, CancellationToken};
//!
//! let config = DriverConfig::new(1.0 / 5000.0, 0.05, 0.25, 8);
//! let grid = Grid::with_config(config.solve.grid_config()).unwrap();
//! let c0 = example_initial_condition(&grid).unwrap();
//! let v = example_velocity(&grid).unwrap();
//!
//! let mut driver = AdvectionDiffusion::new(config, c0, v).unwrap();
//! let summary = driver.run(&CancellationToken::new(), |_| {}).unwrap();
//! assert_eq!(summary.steps, 5);
//! assert!(summary.final_norm <= summary.initial_norm * 1.01);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod driver;
pub mod runner;

/// 层级标识
pub const LAYER: u8 = 4;

// 重导出核心类型
pub use driver::{
    example_initial_condition, example_velocity, velocity_from_potential, AdvectionDiffusion,
};
pub use runner::{CancellationToken, RunContext, RunSummary, RunnerError, StepReport};
