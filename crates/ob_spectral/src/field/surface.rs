// crates/ob_spectral/src/field/surface.rs

//! 球面场
//!
//! 体场在半径 ρ 的球面上的限制，只保留角向系数。

use std::sync::Arc;

use ndarray::Array2;

use super::{Frame, PointBasis};
use crate::grid::Grid;
use crate::transform::{angular_synthesis, spherical_to_cartesian, vector_angular_synthesis};
use ob_foundation::{ObError, ObResult};

/// 球面标量场 `Σ c_ℓm Y_ℓm(θ, φ)`
#[derive(Debug, Clone)]
pub struct SurfaceField {
    grid: Arc<Grid>,
    radius: f64,
    coeffs: Vec<f64>,
}

impl SurfaceField {
    pub(crate) fn new(grid: &Arc<Grid>, radius: f64, coeffs: Vec<f64>) -> ObResult<Self> {
        ObError::check_size("surface.coefficients", grid.n_modes(), coeffs.len())?;
        Ok(Self {
            grid: Arc::clone(grid),
            radius,
            coeffs,
        })
    }

    /// 球面半径
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// 球谐系数，紧凑编号
    pub fn coefficients(&self) -> &[f64] {
        &self.coeffs
    }

    /// 所在网格
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// 球面上的 L² 范数，面积元 ρ² dΩ
    pub fn norm(&self) -> f64 {
        self.radius * self.coeffs.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    /// 角向网格值 (Nθ, Nφ)
    pub fn to_physical(&self) -> Array2<f64> {
        angular_synthesis(&self.grid, &self.coeffs)
    }

    /// 在 (θ, φ) 处求值
    pub fn evaluate(&self, angles: &[(f64, f64)]) -> Vec<f64> {
        angles
            .iter()
            .map(|&(theta, phi)| {
                let basis =
                    PointBasis::new(self.grid.l_max(), theta.cos(), theta.sin().abs(), phi);
                self.coeffs.iter().zip(&basis.y).map(|(c, y)| c * y).sum::<f64>()
            })
            .collect()
    }
}

/// 球面矢量场 `Σ a Y r̂ + b Ψ + c Φ`
#[derive(Debug, Clone)]
pub struct SurfaceVectorField {
    grid: Arc<Grid>,
    radius: f64,
    frame: Frame,
    a: Vec<f64>,
    b: Vec<f64>,
    c: Vec<f64>,
}

impl SurfaceVectorField {
    pub(crate) fn new(
        grid: &Arc<Grid>,
        radius: f64,
        frame: Frame,
        a: Vec<f64>,
        b: Vec<f64>,
        c: Vec<f64>,
    ) -> ObResult<Self> {
        for v in [&a, &b, &c] {
            ObError::check_size("surface.coefficients", grid.n_modes(), v.len())?;
        }
        Ok(Self {
            grid: Arc::clone(grid),
            radius,
            frame,
            a,
            b,
            c,
        })
    }

    /// 球面半径
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// 输出分量所用标架
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// 法向分量 `v · r̂`
    pub fn dot_normal(&self) -> SurfaceField {
        SurfaceField {
            grid: Arc::clone(&self.grid),
            radius: self.radius,
            coeffs: self.a.clone(),
        }
    }

    /// 球面上的 L² 范数
    ///
    /// `∫|Ψ|² dΩ = ∫|Φ|² dΩ = ℓ(ℓ+1)`，且 Ψ、Φ 相互正交。
    pub fn norm(&self) -> f64 {
        let energy: f64 = (0..self.a.len())
            .map(|idx| {
                let ell = ob_foundation::ModeIndex::from_packed(idx).eigenvalue();
                self.a[idx].powi(2) + ell * (self.b[idx].powi(2) + self.c[idx].powi(2))
            })
            .sum();
        self.radius * energy.sqrt()
    }

    /// 角向网格上的三个分量，按 `frame` 给出
    pub fn to_physical(&self) -> [Array2<f64>; 3] {
        let v_r = angular_synthesis(&self.grid, &self.a);
        let (v_t, v_p) = vector_angular_synthesis(&self.grid, &self.b, &self.c);
        match self.frame {
            Frame::Spherical => [v_r, v_t, v_p],
            Frame::Cartesian => {
                let shape = v_r.dim();
                let mut out = [Array2::zeros(shape), Array2::zeros(shape), Array2::zeros(shape)];
                for i in 0..shape.0 {
                    let (ct, st) = (self.grid.cos_theta()[i], self.grid.sin_theta()[i]);
                    for k in 0..shape.1 {
                        let phi = self.grid.longitudes()[k];
                        let v = spherical_to_cartesian(
                            [v_r[[i, k]], v_t[[i, k]], v_p[[i, k]]],
                            ct,
                            st,
                            phi,
                        );
                        for (dst, val) in out.iter_mut().zip(v) {
                            dst[[i, k]] = val;
                        }
                    }
                }
                out
            }
        }
    }

    /// 在 (θ, φ) 处求值，按 `frame` 给出
    pub fn evaluate(&self, angles: &[(f64, f64)]) -> Vec<[f64; 3]> {
        angles
            .iter()
            .map(|&(theta, phi)| {
                let (ct, st) = (theta.cos(), theta.sin().abs());
                let basis = PointBasis::new(self.grid.l_max(), ct, st, phi);
                let v = basis.combine(&self.a, &self.b, &self.c);
                match self.frame {
                    Frame::Spherical => v,
                    Frame::Cartesian => spherical_to_cartesian(v, ct, st, phi),
                }
            })
            .collect()
    }
}
