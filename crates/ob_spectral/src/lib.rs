// crates/ob_spectral/src/lib.rs

//! 球域谱方法核心
//!
//! 单位球内的场用 Chebyshev（径向）× 实球谐（角向）展开，提供：
//! - 网格与变换 (grid, transform)
//! - 基函数 (basis) - Chebyshev 奇偶基、Gauss-Legendre 求积、归一化 Legendre 表
//! - 场表示 (field) - 标量/矢量/球面场与快照
//! - 微分算子 (operators) - 梯度、散度、旋度、拉普拉斯
//! - Helmholtz 求解 (helmholtz) - 超球 tau 离散、逐 ℓ 分解
//! - 线性代数 (linalg) - CSR 算子矩阵、带状 LU、向量运算
//!
//! # 示例
//!
//! ```
//! use ob_spectral::{gradient, divergence, laplacian, Grid, ScalarField};
//!
//! let grid = Grid::new(8).unwrap();
//! let f = ScalarField::from_fn(&grid, |x, y, z| x * x + y * y + z * z).unwrap();
//! let lap = laplacian(&f);
//! assert!((lap.mean() - 6.0).abs() < 1e-10);
//! assert!((&divergence(&gradient(&f)) - &lap).norm() < 1e-10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod basis;
pub mod field;
pub mod grid;
pub mod helmholtz;
pub mod linalg;
pub mod operators;
pub mod transform;

/// 层级标识
pub const LAYER: u8 = 3;

// 重导出常用类型
pub use field::{
    CoordinateSystem, FieldKind, FieldSnapshot, Frame, ResolutionReport, ScalarField,
    SurfaceField, SurfaceVectorField, VectorField,
};
pub use grid::Grid;
pub use helmholtz::{solve, BoundaryData, HelmholtzProblem, HelmholtzSolution, HelmholtzSolver};
pub use operators::{curl, divergence, gradient, laplacian};
pub use transform::SphericalComponents;
