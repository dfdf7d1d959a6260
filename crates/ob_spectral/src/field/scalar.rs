// crates/ob_spectral/src/field/scalar.rs

//! 标量场
//!
//! `f(r, θ, φ) = Σ_ℓm Σ_k c[ℓm, k] · T_{2k + ℓ%2}(r) · Y_ℓm(θ, φ)`
//!
//! 系数矩阵形状 ((L+1)², N)，行为紧凑模态编号 `ℓ² + ℓ + m`。三角约束
//! `|m| ≤ ℓ` 与奇偶约束都由存储结构保证，不存在"非法系数"。

use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use ndarray::{Array2, Array3, Zip};

use super::{
    radial_values_at, weighted_energy, CoordinateSystem, FieldKind, FieldSnapshot, PointBasis,
    ResolutionReport, SphericalPoint, SurfaceField,
};
use crate::basis::chebyshev;
use crate::grid::Grid;
use crate::transform::{forward_scalar, inverse_scalar};
use ob_config::SolveConfig;
use ob_foundation::{ensure, modes, ModeIndex, ObError, ObResult};

/// 标量场
#[derive(Debug, Clone)]
pub struct ScalarField {
    grid: Arc<Grid>,
    coeffs: Array2<f64>,
}

impl ScalarField {
    // =========================================================================
    // 构造
    // =========================================================================

    /// 零场
    pub fn zeros(grid: &Arc<Grid>) -> Self {
        Self {
            grid: Arc::clone(grid),
            coeffs: Array2::zeros(grid.coefficient_shape()),
        }
    }

    /// 由系数矩阵构造，形状必须为 ((L+1)², N)
    pub fn from_coefficients(grid: &Arc<Grid>, coeffs: Array2<f64>) -> ObResult<Self> {
        check_coefficients(grid, &coeffs, "coefficients")?;
        Ok(Self {
            grid: Arc::clone(grid),
            coeffs,
        })
    }

    /// 由稠密张量 (N, L+1, 2L+1) 构造，`[k, ℓ, m + L]`
    ///
    /// `|m| > ℓ` 的位置必须为零。
    pub fn from_tensor(grid: &Arc<Grid>, tensor: &Array3<f64>) -> ObResult<Self> {
        let n = grid.order();
        let l_max = grid.l_max();
        let (d0, d1, d2) = tensor.dim();
        ObError::check_size("tensor.radial", n, d0)?;
        ObError::check_size("tensor.degree", l_max + 1, d1)?;
        ObError::check_size("tensor.order", 2 * l_max + 1, d2)?;

        for ((k, l, j), &v) in tensor.indexed_iter() {
            let m = j as i64 - l_max as i64;
            if m.unsigned_abs() as usize > l {
                ensure!(
                    v == 0.0,
                    ObError::invalid_input(format!(
                        "张量 [{k}, {l}, {j}] 对应 |m| > ℓ，值必须为零，实际 {v}"
                    ))
                );
            }
        }

        let mut coeffs = Array2::zeros(grid.coefficient_shape());
        for mode in modes(l_max) {
            let j = (mode.m + l_max as i64) as usize;
            for k in 0..n {
                coeffs[[mode.packed(), k]] = tensor[[k, mode.l, j]];
            }
        }
        Self::from_coefficients(grid, coeffs)
    }

    /// 对 `f(x, y, z)` 采样并做前向变换
    pub fn from_fn<F>(grid: &Arc<Grid>, f: F) -> ObResult<Self>
    where
        F: Fn(f64, f64, f64) -> f64 + Sync,
    {
        Self::from_physical(grid, &grid.sample(f))
    }

    /// 由物理网格值 (Nr, Nθ, Nφ) 构造
    pub fn from_physical(grid: &Arc<Grid>, values: &Array3<f64>) -> ObResult<Self> {
        let coeffs = forward_scalar(grid, values, 0)?;
        Ok(Self {
            grid: Arc::clone(grid),
            coeffs,
        })
    }

    // =========================================================================
    // 访问
    // =========================================================================

    /// 所在网格
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// 系数矩阵
    pub fn coefficients(&self) -> &Array2<f64> {
        &self.coeffs
    }

    /// 取出系数矩阵
    pub fn into_coefficients(self) -> Array2<f64> {
        self.coeffs
    }

    /// 单个系数 `c[ℓm, k]`
    pub fn coefficient(&self, mode: ModeIndex, k: usize) -> f64 {
        self.coeffs[[mode.packed(), k]]
    }

    /// 转为稠密张量 (N, L+1, 2L+1)
    pub fn to_tensor(&self) -> Array3<f64> {
        let l_max = self.grid.l_max();
        let mut tensor = Array3::zeros((self.grid.order(), l_max + 1, 2 * l_max + 1));
        for mode in modes(l_max) {
            let j = (mode.m + l_max as i64) as usize;
            for (k, &v) in self.coeffs.row(mode.packed()).iter().enumerate() {
                tensor[[k, mode.l, j]] = v;
            }
        }
        tensor
    }

    /// 物理网格值 (Nr, Nθ, Nφ)
    pub fn to_physical(&self) -> Array3<f64> {
        inverse_scalar(&self.grid, &self.coeffs, 0)
    }

    /// 在任意点求值
    ///
    /// 半径超过 1（容许舍入）的点返回 `OutOfDomain`。
    pub fn evaluate(&self, points: &[[f64; 3]], coords: CoordinateSystem) -> ObResult<Vec<f64>> {
        let l_max = self.grid.l_max();
        points
            .iter()
            .map(|&point| {
                let p = SphericalPoint::new(point, coords)?;
                let radial = radial_values_at(&self.coeffs, p.r, 0);
                let basis = PointBasis::new(l_max, p.cos_t, p.sin_t, p.phi);
                let value: f64 = radial.iter().zip(&basis.y).map(|(f, y)| f * y).sum();
                Ok(value)
            })
            .collect()
    }

    // =========================================================================
    // 积分量
    // =========================================================================

    /// 单位球内的 L² 范数
    ///
    /// 角向正交归一，径向用精确 Gram 矩阵，不重新采样。
    pub fn norm(&self) -> f64 {
        weighted_energy(&self.grid, &self.coeffs, 0, |_| 1.0).sqrt()
    }

    /// 体积平均
    pub fn mean(&self) -> f64 {
        // ∫ f dV = √(4π) Σ_k c[00, k] ∫₀¹ T_2k r² dr
        let integral: f64 = self
            .coeffs
            .row(0)
            .iter()
            .enumerate()
            .map(|(k, &c)| c * chebyshev::weighted_integral(2 * k))
            .sum();
        let four_pi = 4.0 * std::f64::consts::PI;
        four_pi.sqrt() * integral / (four_pi / 3.0)
    }

    /// 尾部/峰值比
    pub fn resolution(&self) -> ResolutionReport {
        ResolutionReport::from_coefficients(&[&self.coeffs], self.grid.l_max())
    }

    /// 按配置的容差与策略检查分辨率
    pub fn check_resolution(&self, config: &SolveConfig) -> ObResult<ResolutionReport> {
        let report = self.resolution();
        report.enforce(config.tolerance, config.resolution_policy)?;
        Ok(report)
    }

    // =========================================================================
    // 运算
    // =========================================================================

    /// 网格一致时相加
    pub fn try_add(&self, other: &ScalarField) -> ObResult<Self> {
        self.grid.check_compatible(&other.grid)?;
        Ok(self.with_coefficients(&self.coeffs + &other.coeffs))
    }

    /// 网格一致时相减
    pub fn try_sub(&self, other: &ScalarField) -> ObResult<Self> {
        self.grid.check_compatible(&other.grid)?;
        Ok(self.with_coefficients(&self.coeffs - &other.coeffs))
    }

    /// 数乘
    pub fn scale(&self, alpha: f64) -> Self {
        self.with_coefficients(&self.coeffs * alpha)
    }

    /// 将模低于 `tolerance × 峰值` 的系数置零，返回置零个数
    ///
    /// 非线性乘积与变换引入的舍入噪声落在本应为零的模态上，
    /// 显式平流会逐步放大它们；每步截断一次即可抑制。
    pub fn chop(&mut self, tolerance: f64) -> usize {
        let peak = self.coeffs.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if peak == 0.0 {
            return 0;
        }
        let threshold = tolerance * peak;
        let mut dropped = 0;
        self.coeffs.mapv_inplace(|v| {
            if v != 0.0 && v.abs() < threshold {
                dropped += 1;
                0.0
            } else {
                v
            }
        });
        dropped
    }

    /// 逐点乘积，在去混叠物理网格上计算后变换回谱空间
    pub fn mul_field(&self, other: &ScalarField) -> ObResult<Self> {
        self.grid.check_compatible(&other.grid)?;
        let mut values = self.to_physical();
        Zip::from(&mut values)
            .and(&other.to_physical())
            .for_each(|a, &b| *a *= b);
        Self::from_physical(&self.grid, &values)
    }

    /// 限制到半径为 `radius` 的球面
    pub fn restrict(&self, radius: f64) -> ObResult<SurfaceField> {
        let r = check_radius(radius)?;
        SurfaceField::new(&self.grid, r, radial_values_at(&self.coeffs, r, 0))
    }

    // =========================================================================
    // 快照
    // =========================================================================

    /// 可序列化快照
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot::new(FieldKind::Scalar, self.grid.config(), vec![self.coeffs.clone()])
    }

    /// 由快照恢复，快照的网格参数必须与 `grid` 一致
    pub fn from_snapshot(grid: &Arc<Grid>, snapshot: &FieldSnapshot) -> ObResult<Self> {
        snapshot.check(grid, FieldKind::Scalar)?;
        let coeffs = snapshot.components[0].clone();
        Self::from_coefficients(grid, coeffs)
    }

    pub(crate) fn with_coefficients(&self, coeffs: Array2<f64>) -> Self {
        Self {
            grid: Arc::clone(&self.grid),
            coeffs,
        }
    }
}

/// 检查系数矩阵形状与有限性
pub(crate) fn check_coefficients(
    grid: &Grid,
    coeffs: &Array2<f64>,
    name: &'static str,
) -> ObResult<()> {
    let (rows, cols) = coeffs.dim();
    ObError::check_size(name, grid.n_modes(), rows)?;
    ObError::check_size(name, grid.order(), cols)?;
    ensure!(
        coeffs.iter().all(|v| v.is_finite()),
        ObError::invalid_input(format!("{name} 含非有限值"))
    );
    Ok(())
}

/// 球面半径必须在 [0, 1] 内
pub(crate) fn check_radius(radius: f64) -> ObResult<f64> {
    ensure!(
        radius.is_finite() && radius >= 0.0,
        ObError::invalid_input(format!("无效半径: {radius}"))
    );
    ensure!(radius <= 1.0 + 1e-12, ObError::out_of_domain(radius));
    Ok(radius.min(1.0))
}

// =============================================================================
// 运算符重载
// =============================================================================
//
// 网格不一致时 panic；需要错误返回时用 try_add / try_sub。

impl Add<&ScalarField> for &ScalarField {
    type Output = ScalarField;

    /// # Panics
    ///
    /// 两个场的网格不一致时 panic。
    fn add(self, rhs: &ScalarField) -> ScalarField {
        self.try_add(rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Add<&ScalarField> for ScalarField {
    type Output = ScalarField;

    fn add(self, rhs: &ScalarField) -> ScalarField {
        &self + rhs
    }
}

impl Add for ScalarField {
    type Output = ScalarField;

    fn add(self, rhs: ScalarField) -> ScalarField {
        &self + &rhs
    }
}

impl Sub<&ScalarField> for &ScalarField {
    type Output = ScalarField;

    /// # Panics
    ///
    /// 两个场的网格不一致时 panic。
    fn sub(self, rhs: &ScalarField) -> ScalarField {
        self.try_sub(rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Sub<&ScalarField> for ScalarField {
    type Output = ScalarField;

    fn sub(self, rhs: &ScalarField) -> ScalarField {
        &self - rhs
    }
}

impl Sub for ScalarField {
    type Output = ScalarField;

    fn sub(self, rhs: ScalarField) -> ScalarField {
        &self - &rhs
    }
}

impl Neg for &ScalarField {
    type Output = ScalarField;

    fn neg(self) -> ScalarField {
        self.scale(-1.0)
    }
}

impl Neg for ScalarField {
    type Output = ScalarField;

    fn neg(self) -> ScalarField {
        -&self
    }
}

impl Mul<f64> for &ScalarField {
    type Output = ScalarField;

    fn mul(self, rhs: f64) -> ScalarField {
        self.scale(rhs)
    }
}

impl Mul<f64> for ScalarField {
    type Output = ScalarField;

    fn mul(mut self, rhs: f64) -> ScalarField {
        self.coeffs *= rhs;
        self
    }
}

impl Mul<&ScalarField> for f64 {
    type Output = ScalarField;

    fn mul(self, rhs: &ScalarField) -> ScalarField {
        rhs.scale(self)
    }
}
