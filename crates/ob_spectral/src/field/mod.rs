// crates/ob_spectral/src/field/mod.rs

//! 场表示
//!
//! - [`ScalarField`]: 标量场，系数矩阵 ((L+1)², N)
//! - [`VectorField`]: 矢量场，径向/极向/环向三组系数
//! - [`SurfaceField`] / [`SurfaceVectorField`]: 限制到固定半径球面上的场
//! - [`FieldSnapshot`]: 可序列化的系数快照
//!
//! 场构造后不可变，算子与运算总是产生新场。

mod resolution;
mod scalar;
mod snapshot;
mod surface;
mod vector;

pub use resolution::ResolutionReport;
pub use scalar::ScalarField;
pub use snapshot::{FieldKind, FieldSnapshot};
pub use surface::{SurfaceField, SurfaceVectorField};
pub use vector::VectorField;

use serde::{Deserialize, Serialize};

use ndarray::Array2;

use crate::basis::{chebyshev, LegendreColumn, INV_SQRT_2PI, INV_SQRT_PI};
use crate::grid::Grid;
use crate::linalg::quadratic_form;
use ob_foundation::{ensure, modes, ModeIndex, ObError, ObResult};

/// 求值点的坐标系
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinateSystem {
    /// (x, y, z)
    Cartesian,
    /// (r, θ, φ)，θ 为余纬
    Spherical,
}

/// 矢量分量的表示标架
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frame {
    /// (v_x, v_y, v_z)
    Cartesian,
    /// (v_r, v_θ, v_φ)
    Spherical,
}

/// 允许的半径上界（容忍舍入）
const RADIUS_SLACK: f64 = 1e-12;

/// 球坐标点 `(r, cosθ, sinθ, φ)`
#[derive(Debug, Clone, Copy)]
pub(crate) struct SphericalPoint {
    pub r: f64,
    pub cos_t: f64,
    pub sin_t: f64,
    pub phi: f64,
}

impl SphericalPoint {
    /// 转换并检查定义域
    pub(crate) fn new(point: [f64; 3], coords: CoordinateSystem) -> ObResult<Self> {
        ensure!(
            point.iter().all(|v| v.is_finite()),
            ObError::invalid_input(format!("求值点含非有限值: {point:?}"))
        );
        let p = match coords {
            CoordinateSystem::Cartesian => {
                let [x, y, z] = point;
                let r = (x * x + y * y + z * z).sqrt();
                let rho = (x * x + y * y).sqrt();
                if r == 0.0 {
                    Self { r, cos_t: 1.0, sin_t: 0.0, phi: 0.0 }
                } else {
                    Self {
                        r,
                        cos_t: z / r,
                        sin_t: rho / r,
                        phi: y.atan2(x),
                    }
                }
            }
            CoordinateSystem::Spherical => {
                let [r, theta, phi] = point;
                ensure!(r >= 0.0, ObError::invalid_input(format!("半径为负: {r}")));
                Self {
                    r,
                    cos_t: theta.cos(),
                    sin_t: theta.sin().abs(),
                    phi,
                }
            }
        };
        ensure!(p.r <= 1.0 + RADIUS_SLACK, ObError::out_of_domain(p.r));
        Ok(Self { r: p.r.min(1.0), ..p })
    }
}

/// 单点上全部模态的角向基函数值
pub(crate) struct PointBasis {
    /// `Y_ℓm`
    pub y: Vec<f64>,
    /// `∂θ Y_ℓm`
    pub y_theta: Vec<f64>,
    /// `(1/sinθ) ∂φ Y_ℓm`
    pub y_phi: Vec<f64>,
}

impl PointBasis {
    pub(crate) fn new(l_max: usize, cos_t: f64, sin_t: f64, phi: f64) -> Self {
        let col = LegendreColumn::new(l_max, cos_t, sin_t);
        let n = (l_max + 1) * (l_max + 1);
        let mut y = vec![0.0; n];
        let mut y_theta = vec![0.0; n];
        let mut y_phi = vec![0.0; n];
        for mode in modes(l_max) {
            let mu = mode.order_abs();
            let t = crate::basis::tri_index(mode.l, mu);
            let idx = mode.packed();
            if mode.m == 0 {
                y[idx] = col.p[t] * INV_SQRT_2PI;
                y_theta[idx] = col.dp[t] * INV_SQRT_2PI;
            } else {
                let (s, c) = (mu as f64 * phi).sin_cos();
                if mode.m > 0 {
                    y[idx] = col.p[t] * c * INV_SQRT_PI;
                    y_theta[idx] = col.dp[t] * c * INV_SQRT_PI;
                    y_phi[idx] = -col.mq[t] * s * INV_SQRT_PI;
                } else {
                    y[idx] = col.p[t] * s * INV_SQRT_PI;
                    y_theta[idx] = col.dp[t] * s * INV_SQRT_PI;
                    y_phi[idx] = col.mq[t] * c * INV_SQRT_PI;
                }
            }
        }
        Self { y, y_theta, y_phi }
    }

    /// 由 (a, b, c) 系数合成球坐标分量 `[v_r, v_θ, v_φ]`
    pub(crate) fn combine(&self, a: &[f64], b: &[f64], c: &[f64]) -> [f64; 3] {
        let mut v = [0.0; 3];
        for idx in 0..self.y.len() {
            v[0] += a[idx] * self.y[idx];
            v[1] += b[idx] * self.y_theta[idx] - c[idx] * self.y_phi[idx];
            v[2] += b[idx] * self.y_phi[idx] + c[idx] * self.y_theta[idx];
        }
        v
    }
}

/// 在半径 r 处对每个模态的紧凑径向系数求值
///
/// `offset` 为奇偶偏移，返回长度 (L+1)² 的向量。
pub(crate) fn radial_values_at(coeffs: &Array2<f64>, r: f64, offset: usize) -> Vec<f64> {
    let (n_modes, order) = coeffs.dim();
    let t = chebyshev::eval_all(2 * order, r);
    (0..n_modes)
        .map(|idx| {
            let l = ModeIndex::from_packed(idx).l;
            let parity = (l + offset) % 2;
            coeffs
                .row(idx)
                .iter()
                .enumerate()
                .map(|(k, &c)| c * t[2 * k + parity])
                .sum()
        })
        .collect()
}

/// `Σ_ℓm w(ℓ) · cᵀ G c`，G 为对应奇偶性的径向 Gram 矩阵
///
/// 即 `∫ |f|² r² dr` 按角向权重 `w(ℓ)` 求和。
pub(crate) fn weighted_energy<W>(grid: &Grid, coeffs: &Array2<f64>, offset: usize, weight: W) -> f64
where
    W: Fn(usize) -> f64,
{
    coeffs
        .rows()
        .into_iter()
        .enumerate()
        .map(|(idx, row)| {
            let l = ModeIndex::from_packed(idx).l;
            let w = weight(l);
            if w == 0.0 {
                return 0.0;
            }
            let values: Vec<f64> = row.iter().copied().collect();
            w * quadratic_form(grid.gram((l + offset) % 2), &values)
        })
        .sum()
}
