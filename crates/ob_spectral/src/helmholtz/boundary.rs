// crates/ob_spectral/src/helmholtz/boundary.rs

//! r = 1 处的边界数据
//!
//! 边界值（Dirichlet）或法向导数（Neumann）可以给成角向函数、球谐系数，
//! 或齐次零值。求解前统一转换为长度 (L+1)² 的球谐系数。

use std::fmt;
use std::sync::Arc;

use crate::grid::Grid;
use crate::transform::angular_analysis;
use ob_foundation::{ensure, ObError, ObResult};

/// 边界数据
#[derive(Clone, Default)]
pub enum BoundaryData {
    /// 零边界值
    #[default]
    Homogeneous,
    /// 角向函数 `h(θ, φ)`
    Function(Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>),
    /// 球谐系数，紧凑编号 `ℓ² + ℓ + m`
    Coefficients(Vec<f64>),
}

impl fmt::Debug for BoundaryData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Homogeneous => write!(f, "Homogeneous"),
            Self::Function(_) => write!(f, "Function(..)"),
            Self::Coefficients(c) => f.debug_tuple("Coefficients").field(&c.len()).finish(),
        }
    }
}

impl BoundaryData {
    /// 由角向函数构造
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// 是否为齐次边界
    pub fn is_homogeneous(&self) -> bool {
        matches!(self, Self::Homogeneous)
    }

    /// 转换为球谐系数
    pub fn resolve(&self, grid: &Grid) -> ObResult<Vec<f64>> {
        let n_modes = grid.n_modes();
        match self {
            Self::Homogeneous => Ok(vec![0.0; n_modes]),
            Self::Function(h) => {
                let values = grid.sample_surface(|theta, phi| h(theta, phi));
                ensure!(
                    values.iter().all(|v| v.is_finite()),
                    ObError::invalid_boundary("边界函数在角向网格上取到非有限值")
                );
                Ok(angular_analysis(grid, values.view()))
            }
            Self::Coefficients(coeffs) => {
                ensure!(
                    coeffs.len() == n_modes,
                    ObError::invalid_boundary(format!(
                        "边界系数长度应为 {n_modes}，实际 {}",
                        coeffs.len()
                    ))
                );
                ensure!(
                    coeffs.iter().all(|v| v.is_finite()),
                    ObError::invalid_boundary("边界系数含非有限值")
                );
                Ok(coeffs.clone())
            }
        }
    }
}
