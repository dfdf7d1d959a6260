// crates/ob_spectral/src/helmholtz/mod.rs

//! Helmholtz 方程 `∇²u + K²u = g` 的球内求解
//!
//! - [`tau`]: 超球 tau 离散的径向算子（按网格缓存）
//! - [`boundary`]: r = 1 处的边界数据
//! - [`solver`]: 逐 ℓ 分解、逐 m 多右端项求解
//!
//! 原点正则性由奇偶基与多项式解空间自动保证，不需要额外条件。

mod boundary;
mod solver;
pub mod tau;

pub use boundary::BoundaryData;
pub use solver::{solve, HelmholtzProblem, HelmholtzSolution, HelmholtzSolver};
