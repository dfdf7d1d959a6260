// crates/ob_spectral/src/field/vector.rs

//! 矢量场
//!
//! 矢量球谐表示 `v = Σ a_ℓm Y r̂ + b_ℓm Ψ + c_ℓm Φ`，`Ψ = r∇Y`，`Φ = r̂ × Ψ`。
//!
//! | 分量 | 奇偶偏移 | 径向基 |
//! |------|----------|--------|
//! | a    | 1        | `T_{2k + (ℓ+1)%2}` |
//! | b    | 1        | `T_{2k + (ℓ+1)%2}` |
//! | c    | 0        | `T_{2k + ℓ%2}` |
//!
//! ℓ = 0 时 Ψ、Φ 恒为零，对应的 b、c 系数必须为零。

use std::ops::{Add, Mul, Neg, Sub};
use std::sync::Arc;

use ndarray::{Array2, Array3, Zip};
use rayon::prelude::*;

use super::scalar::{check_coefficients, check_radius};
use super::{
    radial_values_at, weighted_energy, CoordinateSystem, FieldKind, FieldSnapshot, Frame,
    PointBasis, ResolutionReport, ScalarField, SphericalPoint, SurfaceVectorField,
};
use crate::grid::Grid;
use crate::transform::{
    cartesian_to_spherical, forward_vector, inverse_vector, spherical_to_cartesian,
    SphericalComponents,
};
use ob_foundation::{ensure, ObError, ObResult};

/// 径向、极向、环向分量的奇偶偏移
pub(crate) const OFFSETS: [usize; 3] = [1, 1, 0];

/// 矢量场
#[derive(Debug, Clone)]
pub struct VectorField {
    grid: Arc<Grid>,
    a: Array2<f64>,
    b: Array2<f64>,
    c: Array2<f64>,
}

impl VectorField {
    // =========================================================================
    // 构造
    // =========================================================================

    /// 零场
    pub fn zeros(grid: &Arc<Grid>) -> Self {
        let shape = grid.coefficient_shape();
        Self {
            grid: Arc::clone(grid),
            a: Array2::zeros(shape),
            b: Array2::zeros(shape),
            c: Array2::zeros(shape),
        }
    }

    /// 由 (a, b, c) 系数矩阵构造
    pub fn from_components(
        grid: &Arc<Grid>,
        a: Array2<f64>,
        b: Array2<f64>,
        c: Array2<f64>,
    ) -> ObResult<Self> {
        check_coefficients(grid, &a, "a")?;
        check_coefficients(grid, &b, "b")?;
        check_coefficients(grid, &c, "c")?;
        ensure!(
            b.row(0).iter().chain(c.row(0).iter()).all(|&v| v == 0.0),
            ObError::invalid_input("ℓ = 0 的极向/环向系数必须为零")
        );
        Ok(Self {
            grid: Arc::clone(grid),
            a,
            b,
            c,
        })
    }

    /// 对笛卡尔分量函数 `f(x, y, z) → [v_x, v_y, v_z]` 采样
    pub fn from_cartesian_fn<F>(grid: &Arc<Grid>, f: F) -> ObResult<Self>
    where
        F: Fn(f64, f64, f64) -> [f64; 3] + Sync,
    {
        let components = sample_components(grid, |r, ct, st, phi| {
            let (sp, cp) = phi.sin_cos();
            let v = f(r * st * cp, r * st * sp, r * ct);
            cartesian_to_spherical(v, ct, st, phi)
        });
        Self::from_physical(grid, &components)
    }

    /// 对球坐标分量函数 `f(r, θ, φ) → [v_r, v_θ, v_φ]` 采样
    pub fn from_spherical_fn<F>(grid: &Arc<Grid>, f: F) -> ObResult<Self>
    where
        F: Fn(f64, f64, f64) -> [f64; 3] + Sync,
    {
        let components = sample_components(grid, |r, ct, st, phi| f(r, st.atan2(ct), phi));
        Self::from_physical(grid, &components)
    }

    /// 由物理网格上的球坐标分量构造
    pub fn from_physical(grid: &Arc<Grid>, components: &SphericalComponents) -> ObResult<Self> {
        let (a, mut b, mut c) = forward_vector(grid, components)?;
        b.row_mut(0).fill(0.0);
        c.row_mut(0).fill(0.0);
        Ok(Self {
            grid: Arc::clone(grid),
            a,
            b,
            c,
        })
    }

    pub(crate) fn from_parts(grid: &Arc<Grid>, a: Array2<f64>, b: Array2<f64>, c: Array2<f64>) -> Self {
        Self {
            grid: Arc::clone(grid),
            a,
            b,
            c,
        }
    }

    // =========================================================================
    // 访问
    // =========================================================================

    /// 所在网格
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// 径向系数
    pub fn radial(&self) -> &Array2<f64> {
        &self.a
    }

    /// 极向系数
    pub fn spheroidal(&self) -> &Array2<f64> {
        &self.b
    }

    /// 环向系数
    pub fn toroidal(&self) -> &Array2<f64> {
        &self.c
    }

    /// 物理网格上的三个分量
    pub fn to_physical(&self, frame: Frame) -> [Array3<f64>; 3] {
        let spherical = inverse_vector(&self.grid, &self.a, &self.b, &self.c);
        match frame {
            Frame::Spherical => spherical,
            Frame::Cartesian => to_cartesian_components(&self.grid, spherical),
        }
    }

    /// 在任意点求值，分量按 `frame` 给出
    pub fn evaluate(
        &self,
        points: &[[f64; 3]],
        coords: CoordinateSystem,
        frame: Frame,
    ) -> ObResult<Vec<[f64; 3]>> {
        let l_max = self.grid.l_max();
        points
            .iter()
            .map(|&point| {
                let p = SphericalPoint::new(point, coords)?;
                let a = radial_values_at(&self.a, p.r, OFFSETS[0]);
                let b = radial_values_at(&self.b, p.r, OFFSETS[1]);
                let c = radial_values_at(&self.c, p.r, OFFSETS[2]);
                let v = PointBasis::new(l_max, p.cos_t, p.sin_t, p.phi).combine(&a, &b, &c);
                Ok(match frame {
                    Frame::Spherical => v,
                    Frame::Cartesian => spherical_to_cartesian(v, p.cos_t, p.sin_t, p.phi),
                })
            })
            .collect()
    }

    // =========================================================================
    // 积分量
    // =========================================================================

    /// 单位球内的 L² 范数
    pub fn norm(&self) -> f64 {
        let radial = weighted_energy(&self.grid, &self.a, OFFSETS[0], |_| 1.0);
        let eigen = |l: usize| (l * (l + 1)) as f64;
        let spheroidal = weighted_energy(&self.grid, &self.b, OFFSETS[1], eigen);
        let toroidal = weighted_energy(&self.grid, &self.c, OFFSETS[2], eigen);
        (radial + spheroidal + toroidal).sqrt()
    }

    /// 三组系数合并的尾部/峰值比
    pub fn resolution(&self) -> ResolutionReport {
        ResolutionReport::from_coefficients(&[&self.a, &self.b, &self.c], self.grid.l_max())
    }

    // =========================================================================
    // 运算
    // =========================================================================

    /// 点积 `v · w`，在去混叠物理网格上逐点计算
    pub fn dot(&self, other: &VectorField) -> ObResult<ScalarField> {
        self.grid.check_compatible(&other.grid)?;
        let [ur, ut, up] = self.to_physical(Frame::Spherical);
        let [wr, wt, wp] = other.to_physical(Frame::Spherical);
        let mut values = Array3::zeros(self.grid.physical_shape());
        Zip::from(&mut values)
            .and(&ur)
            .and(&wr)
            .and(&ut)
            .and(&wt)
            .for_each(|out, &a, &b, &c, &d| *out = a * b + c * d);
        Zip::from(&mut values)
            .and(&up)
            .and(&wp)
            .for_each(|out, &a, &b| *out += a * b);
        ScalarField::from_physical(&self.grid, &values)
    }

    /// 限制到半径为 `radius` 的球面，分量按 `frame` 给出
    pub fn restrict(&self, radius: f64, frame: Frame) -> ObResult<SurfaceVectorField> {
        let r = check_radius(radius)?;
        SurfaceVectorField::new(
            &self.grid,
            r,
            frame,
            radial_values_at(&self.a, r, OFFSETS[0]),
            radial_values_at(&self.b, r, OFFSETS[1]),
            radial_values_at(&self.c, r, OFFSETS[2]),
        )
    }

    /// 网格一致时相加
    pub fn try_add(&self, other: &VectorField) -> ObResult<Self> {
        self.grid.check_compatible(&other.grid)?;
        Ok(Self::from_parts(
            &self.grid,
            &self.a + &other.a,
            &self.b + &other.b,
            &self.c + &other.c,
        ))
    }

    /// 网格一致时相减
    pub fn try_sub(&self, other: &VectorField) -> ObResult<Self> {
        self.grid.check_compatible(&other.grid)?;
        Ok(Self::from_parts(
            &self.grid,
            &self.a - &other.a,
            &self.b - &other.b,
            &self.c - &other.c,
        ))
    }

    /// 数乘
    pub fn scale(&self, alpha: f64) -> Self {
        Self::from_parts(&self.grid, &self.a * alpha, &self.b * alpha, &self.c * alpha)
    }

    // =========================================================================
    // 快照
    // =========================================================================

    /// 可序列化快照，分量顺序 (a, b, c)
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot::new(
            FieldKind::Vector,
            self.grid.config(),
            vec![self.a.clone(), self.b.clone(), self.c.clone()],
        )
    }

    /// 由快照恢复
    pub fn from_snapshot(grid: &Arc<Grid>, snapshot: &FieldSnapshot) -> ObResult<Self> {
        snapshot.check(grid, FieldKind::Vector)?;
        let [a, b, c] = [0, 1, 2].map(|i| snapshot.components[i].clone());
        Self::from_components(grid, a, b, c)
    }
}

/// 对返回球坐标分量的函数 `f(r, cosθ, sinθ, φ)` 逐壳并行采样
fn sample_components<F>(grid: &Grid, f: F) -> SphericalComponents
where
    F: Fn(f64, f64, f64, f64) -> [f64; 3] + Sync,
{
    let shells: Vec<Vec<[f64; 3]>> = grid
        .radii()
        .par_iter()
        .map(|&r| {
            let mut values = Vec::with_capacity(grid.ntheta() * grid.nphi());
            for (&ct, &st) in grid.cos_theta().iter().zip(grid.sin_theta()) {
                for &phi in grid.longitudes() {
                    values.push(f(r, ct, st, phi));
                }
            }
            values
        })
        .collect();

    let shape = grid.physical_shape();
    let mut out = [Array3::zeros(shape), Array3::zeros(shape), Array3::zeros(shape)];
    let nphi = grid.nphi();
    for (j, shell) in shells.into_iter().enumerate() {
        for (flat, v) in shell.into_iter().enumerate() {
            let (i, k) = (flat / nphi, flat % nphi);
            for (dst, val) in out.iter_mut().zip(v) {
                dst[[j, i, k]] = val;
            }
        }
    }
    out
}

fn to_cartesian_components(grid: &Grid, spherical: SphericalComponents) -> [Array3<f64>; 3] {
    let [v_r, v_t, v_p] = spherical;
    let shape = grid.physical_shape();
    let mut out = [Array3::zeros(shape), Array3::zeros(shape), Array3::zeros(shape)];
    for ((j, i, k), &vr) in v_r.indexed_iter() {
        let v = spherical_to_cartesian(
            [vr, v_t[[j, i, k]], v_p[[j, i, k]]],
            grid.cos_theta()[i],
            grid.sin_theta()[i],
            grid.longitudes()[k],
        );
        for (dst, val) in out.iter_mut().zip(v) {
            dst[[j, i, k]] = val;
        }
    }
    out
}

// =============================================================================
// 运算符重载
// =============================================================================

impl Add<&VectorField> for &VectorField {
    type Output = VectorField;

    /// # Panics
    ///
    /// 两个场的网格不一致时 panic。
    fn add(self, rhs: &VectorField) -> VectorField {
        self.try_add(rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Add for VectorField {
    type Output = VectorField;

    fn add(self, rhs: VectorField) -> VectorField {
        &self + &rhs
    }
}

impl Sub<&VectorField> for &VectorField {
    type Output = VectorField;

    /// # Panics
    ///
    /// 两个场的网格不一致时 panic。
    fn sub(self, rhs: &VectorField) -> VectorField {
        self.try_sub(rhs).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Sub for VectorField {
    type Output = VectorField;

    fn sub(self, rhs: VectorField) -> VectorField {
        &self - &rhs
    }
}

impl Neg for &VectorField {
    type Output = VectorField;

    fn neg(self) -> VectorField {
        self.scale(-1.0)
    }
}

impl Neg for VectorField {
    type Output = VectorField;

    fn neg(self) -> VectorField {
        -&self
    }
}

impl Mul<f64> for &VectorField {
    type Output = VectorField;

    fn mul(self, rhs: f64) -> VectorField {
        self.scale(rhs)
    }
}

impl Mul<f64> for VectorField {
    type Output = VectorField;

    fn mul(self, rhs: f64) -> VectorField {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn grid(order: usize) -> Arc<Grid> {
        Grid::new(order).unwrap()
    }

    #[test]
    fn test_constant_field() {
        let g = grid(6);
        let ez = VectorField::from_cartesian_fn(&g, |_, _, _| [0.0, 0.0, 1.0]).unwrap();
        assert!((ez.norm() - (4.0 * PI / 3.0_f64).sqrt()).abs() < 1e-12);

        let pts = [[0.2, -0.4, 0.1], [0.0, 0.0, 0.0], [0.0, 0.6, -0.8]];
        let vals = ez.evaluate(&pts, CoordinateSystem::Cartesian, Frame::Cartesian).unwrap();
        for v in vals {
            assert!(v[0].abs() < 1e-12 && v[1].abs() < 1e-12);
            assert!((v[2] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_polynomial_field_evaluation() {
        let g = grid(6);
        let f = |x: f64, y: f64, z: f64| [1.0 + y, z * x, 0.5 - x * x];
        let v = VectorField::from_cartesian_fn(&g, f).unwrap();
        let pts = [[0.3, 0.1, -0.5], [-0.2, 0.7, 0.4]];
        let vals = v.evaluate(&pts, CoordinateSystem::Cartesian, Frame::Cartesian).unwrap();
        for (p, got) in pts.iter().zip(vals) {
            let exact = f(p[0], p[1], p[2]);
            for d in 0..3 {
                assert!((got[d] - exact[d]).abs() < 1e-11, "{got:?} vs {exact:?}");
            }
        }
    }

    #[test]
    fn test_spherical_constructor_matches_cartesian() {
        let g = grid(5);
        // 刚体旋转 (−y, x, 0) 在球坐标下为 (0, 0, r sinθ)
        let a = VectorField::from_cartesian_fn(&g, |x, y, _| [-y, x, 0.0]).unwrap();
        let b = VectorField::from_spherical_fn(&g, |r, t, _| [0.0, 0.0, r * t.sin()]).unwrap();
        assert!((&a - &b).norm() < 1e-13);
        // 纯环向
        assert!(a.radial().iter().all(|v| v.abs() < 1e-13));
        assert!(a.spheroidal().iter().all(|v| v.abs() < 1e-13));
    }

    #[test]
    fn test_dot() {
        let g = grid(6);
        let ez = VectorField::from_cartesian_fn(&g, |_, _, _| [0.0, 0.0, 1.0]).unwrap();
        let v = VectorField::from_cartesian_fn(&g, |x, _, z| [x, 0.0, z]).unwrap();
        let d = ez.dot(&v).unwrap();
        let val = d.evaluate(&[[0.1, 0.2, 0.3]], CoordinateSystem::Cartesian).unwrap();
        assert!((val[0] - 0.3).abs() < 1e-12);
        assert!((ez.dot(&ez).unwrap().mean() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_restrict_normal_component() {
        let g = grid(6);
        let ez = VectorField::from_cartesian_fn(&g, |_, _, _| [0.0, 0.0, 1.0]).unwrap();
        let surface = ez.restrict(1.0, Frame::Cartesian).unwrap();
        assert!((surface.norm() - (4.0 * PI).sqrt()).abs() < 1e-12);
        let normal = surface.dot_normal();
        // ∫ cos²θ dΩ = 4π/3
        assert!((normal.norm() - (4.0 * PI / 3.0_f64).sqrt()).abs() < 1e-12);
        let v = surface.evaluate(&[(0.7, 1.1)]);
        assert!((v[0][2] - 1.0).abs() < 1e-12);
        let comps = surface.to_physical();
        assert!(comps[2].iter().all(|&z| (z - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_rejects_monopole_tangential() {
        let g = grid(4);
        let shape = g.coefficient_shape();
        let mut b = Array2::zeros(shape);
        b[[0, 0]] = 1.0;
        let err = VectorField::from_components(&g, Array2::zeros(shape), b, Array2::zeros(shape));
        assert!(err.is_err());
    }

    #[test]
    fn test_arithmetic_and_snapshot() {
        let g = grid(5);
        let v = VectorField::from_cartesian_fn(&g, |x, y, z| [y, z, x]).unwrap();
        let w = &v * 2.0 - v.clone();
        assert!((&w - &v).norm() < 1e-14);
        assert!((-&v + v.clone()).norm() < 1e-14);

        let snap = v.snapshot();
        let back = VectorField::from_snapshot(&g, &snap).unwrap();
        assert!((&back - &v).norm() == 0.0);
        assert!(ScalarField::from_snapshot(&g, &snap).is_err());
    }
}
