// crates/ob_spectral/src/transform.rs

//! 物理空间与谱系数之间的变换
//!
//! 物理张量形状 (Nr, Nθ, Nφ)，系数矩阵形状 ((L+1)², N)，按紧凑模态编号
//! `ℓ² + ℓ + m` 存储。变换分两步：
//!
//! 1. 角向：经度 FFT + Gauss-Legendre 求积，逐径向壳并行
//! 2. 径向：半轴 Gauss-Chebyshev 离散正交，逐模态并行
//!
//! `offset` 为分量的奇偶偏移 s：模态 (ℓ, m) 只使用 `n ≡ ℓ + s (mod 2)` 的
//! `T_n`。标量与环向分量 s = 0，径向与极向分量 s = 1。
//!
//! 矢量角向部分采用矢量球谐分解
//! `v = Σ a Y r̂ + b Ψ + c Φ`，`Ψ = r∇Y`，`Φ = r̂ × Ψ`。

use std::f64::consts::PI;

use ndarray::{Array2, Array3, ArrayView2, Axis};
use num_complex::Complex64;
use rayon::prelude::*;

use crate::basis::{tri_index, INV_SQRT_2PI, INV_SQRT_PI};
use crate::grid::Grid;
use ob_foundation::{packed_index, ObError, ObResult};

/// 物理空间矢量分量 `[v_r, v_θ, v_φ]`
pub type SphericalComponents = [Array3<f64>; 3];

// =============================================================================
// 经度方向
// =============================================================================

/// 一行经度数据的 cos/sin 求和 `(Σ f cos mφ, Σ f sin mφ)`，m ≤ L
fn longitude_sums(grid: &Grid, row: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut buffer: Vec<Complex64> = row.iter().map(|&v| Complex64::new(v, 0.0)).collect();
    grid.fft_forward(&mut buffer);
    let l_max = grid.l_max();
    let cos_sums = buffer[..=l_max].iter().map(|c| c.re).collect();
    let sin_sums = buffer[..=l_max].iter().map(|c| -c.im).collect();
    (cos_sums, sin_sums)
}

/// 由 cos/sin 系数 `Σ A_m cos mφ + B_m sin mφ` 合成一行经度数据
fn longitude_synthesis(grid: &Grid, cos_coeffs: &[f64], sin_coeffs: &[f64]) -> Vec<f64> {
    let mut buffer = vec![Complex64::new(0.0, 0.0); grid.nphi()];
    for (m, (&a, &b)) in cos_coeffs.iter().zip(sin_coeffs).enumerate() {
        buffer[m] = Complex64::new(a, -b);
    }
    grid.fft_inverse(&mut buffer);
    buffer.into_iter().map(|c| c.re).collect()
}

// =============================================================================
// 角向（单个球面）
// =============================================================================

/// 球面数据 (Nθ, Nφ) → 球谐系数（长度 (L+1)²）
pub fn angular_analysis(grid: &Grid, surface: ArrayView2<'_, f64>) -> Vec<f64> {
    let l_max = grid.l_max();
    let mut out = vec![0.0; grid.n_modes()];
    let dphi = 2.0 * PI / grid.nphi() as f64;

    for (i, row) in surface.axis_iter(Axis(0)).enumerate() {
        let row: Vec<f64> = row.iter().copied().collect();
        let (cs, sn) = longitude_sums(grid, &row);
        let w = grid.weights()[i] * dphi;
        let col = grid.legendre().column(i);
        for m in 0..=l_max {
            for l in m..=l_max {
                let p = col.p[tri_index(l, m)] * w;
                if m == 0 {
                    out[packed_index(l, 0)] += p * cs[0] * INV_SQRT_2PI;
                } else {
                    out[packed_index(l, m as i64)] += p * cs[m] * INV_SQRT_PI;
                    out[packed_index(l, -(m as i64))] += p * sn[m] * INV_SQRT_PI;
                }
            }
        }
    }
    out
}

/// 球谐系数 → 球面数据 (Nθ, Nφ)
pub fn angular_synthesis(grid: &Grid, coeffs: &[f64]) -> Array2<f64> {
    let l_max = grid.l_max();
    let mut out = Array2::zeros((grid.ntheta(), grid.nphi()));
    for (i, mut row) in out.axis_iter_mut(Axis(0)).enumerate() {
        let col = grid.legendre().column(i);
        let mut a = vec![0.0; l_max + 1];
        let mut b = vec![0.0; l_max + 1];
        for m in 0..=l_max {
            for l in m..=l_max {
                let p = col.p[tri_index(l, m)];
                if m == 0 {
                    a[0] += coeffs[packed_index(l, 0)] * p * INV_SQRT_2PI;
                } else {
                    a[m] += coeffs[packed_index(l, m as i64)] * p * INV_SQRT_PI;
                    b[m] += coeffs[packed_index(l, -(m as i64))] * p * INV_SQRT_PI;
                }
            }
        }
        for (dst, v) in row.iter_mut().zip(longitude_synthesis(grid, &a, &b)) {
            *dst = v;
        }
    }
    out
}

/// 切向分量 (v_θ, v_φ) → 极向/环向系数 (b, c)
pub fn vector_angular_analysis(
    grid: &Grid,
    v_theta: ArrayView2<'_, f64>,
    v_phi: ArrayView2<'_, f64>,
) -> (Vec<f64>, Vec<f64>) {
    let l_max = grid.l_max();
    let mut b = vec![0.0; grid.n_modes()];
    let mut c = vec![0.0; grid.n_modes()];
    let dphi = 2.0 * PI / grid.nphi() as f64;

    for i in 0..grid.ntheta() {
        let row_t: Vec<f64> = v_theta.row(i).iter().copied().collect();
        let row_p: Vec<f64> = v_phi.row(i).iter().copied().collect();
        let (ct, st) = longitude_sums(grid, &row_t);
        let (cp, sp) = longitude_sums(grid, &row_p);
        let w = grid.weights()[i] * dphi;
        let col = grid.legendre().column(i);

        for m in 0..=l_max {
            for l in m.max(1)..=l_max {
                let idx = tri_index(l, m);
                let dp = col.dp[idx];
                let mq = col.mq[idx];
                let ell = (l * (l + 1)) as f64;
                if m == 0 {
                    let f = w * INV_SQRT_2PI / ell;
                    b[packed_index(l, 0)] += f * dp * ct[0];
                    c[packed_index(l, 0)] += f * dp * cp[0];
                } else {
                    let f = w * INV_SQRT_PI / ell;
                    let pos = packed_index(l, m as i64);
                    let neg = packed_index(l, -(m as i64));
                    b[pos] += f * (dp * ct[m] - mq * sp[m]);
                    b[neg] += f * (dp * st[m] + mq * cp[m]);
                    c[pos] += f * (mq * st[m] + dp * cp[m]);
                    c[neg] += f * (-mq * ct[m] + dp * sp[m]);
                }
            }
        }
    }
    (b, c)
}

/// 极向/环向系数 (b, c) → 切向分量 (v_θ, v_φ)
pub fn vector_angular_synthesis(grid: &Grid, b: &[f64], c: &[f64]) -> (Array2<f64>, Array2<f64>) {
    let l_max = grid.l_max();
    let shape = (grid.ntheta(), grid.nphi());
    let mut v_theta = Array2::zeros(shape);
    let mut v_phi = Array2::zeros(shape);

    for i in 0..grid.ntheta() {
        let col = grid.legendre().column(i);
        let mut at = vec![0.0; l_max + 1];
        let mut bt = vec![0.0; l_max + 1];
        let mut ap = vec![0.0; l_max + 1];
        let mut bp = vec![0.0; l_max + 1];

        for m in 0..=l_max {
            for l in m.max(1)..=l_max {
                let idx = tri_index(l, m);
                let dp = col.dp[idx];
                let mq = col.mq[idx];
                if m == 0 {
                    at[0] += b[packed_index(l, 0)] * dp * INV_SQRT_2PI;
                    ap[0] += c[packed_index(l, 0)] * dp * INV_SQRT_2PI;
                } else {
                    let b_pos = b[packed_index(l, m as i64)];
                    let b_neg = b[packed_index(l, -(m as i64))];
                    let c_pos = c[packed_index(l, m as i64)];
                    let c_neg = c[packed_index(l, -(m as i64))];
                    at[m] += (b_pos * dp - c_neg * mq) * INV_SQRT_PI;
                    bt[m] += (b_neg * dp + c_pos * mq) * INV_SQRT_PI;
                    ap[m] += (b_neg * mq + c_pos * dp) * INV_SQRT_PI;
                    bp[m] += (-b_pos * mq + c_neg * dp) * INV_SQRT_PI;
                }
            }
        }

        for (dst, v) in v_theta.row_mut(i).iter_mut().zip(longitude_synthesis(grid, &at, &bt)) {
            *dst = v;
        }
        for (dst, v) in v_phi.row_mut(i).iter_mut().zip(longitude_synthesis(grid, &ap, &bp)) {
            *dst = v;
        }
    }
    (v_theta, v_phi)
}

// =============================================================================
// 径向
// =============================================================================

/// 径向节点值 → 紧凑 Chebyshev 系数（长度 N）
///
/// 半轴节点上的离散正交：`c_n = (2/Nr) Σ_j f(r_j) T_n(r_j) / (1 + δ_{n0})`，
/// 对与奇偶性一致、阶数 < 2N 的多项式精确。
pub fn radial_analysis(grid: &Grid, values: &[f64], parity: usize) -> Vec<f64> {
    let basis = grid.radial_basis();
    let scale = 2.0 / grid.nr() as f64;
    (0..grid.order())
        .map(|k| {
            let n = 2 * k + parity;
            let sum: f64 = values.iter().enumerate().map(|(j, &f)| f * basis[[j, n]]).sum();
            if n == 0 {
                0.5 * scale * sum
            } else {
                scale * sum
            }
        })
        .collect()
}

/// 紧凑 Chebyshev 系数 → 径向节点值（长度 Nr）
pub fn radial_synthesis(grid: &Grid, coeffs: &[f64], parity: usize) -> Vec<f64> {
    let basis = grid.radial_basis();
    (0..grid.nr())
        .map(|j| {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, &c)| c * basis[[j, 2 * k + parity]])
                .sum()
        })
        .collect()
}

// =============================================================================
// 完整三维变换
// =============================================================================

fn check_physical(grid: &Grid, physical: &Array3<f64>) -> ObResult<()> {
    let (nr, nt, np) = grid.physical_shape();
    let (a, b, c) = physical.dim();
    ObError::check_size("physical.nr", nr, a)?;
    ObError::check_size("physical.ntheta", nt, b)?;
    ObError::check_size("physical.nphi", np, c)?;
    if physical.iter().any(|v| !v.is_finite()) {
        return Err(ObError::invalid_input("物理场含非有限值"));
    }
    Ok(())
}

/// 每个径向壳的角向系数 (Nr, (L+1)²) → 系数矩阵 ((L+1)², N)
fn radial_project(grid: &Grid, shells: &Array2<f64>, offset: usize) -> Array2<f64> {
    let mut out = Array2::zeros(grid.coefficient_shape());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(idx, mut row)| {
            let l = ob_foundation::ModeIndex::from_packed(idx).l;
            let values: Vec<f64> = shells.column(idx).iter().copied().collect();
            let coeffs = radial_analysis(grid, &values, (l + offset) % 2);
            for (dst, v) in row.iter_mut().zip(coeffs) {
                *dst = v;
            }
        });
    out
}

/// 系数矩阵 → 每个径向壳的角向系数 (Nr, (L+1)²)
fn radial_evaluate(grid: &Grid, coeffs: &Array2<f64>, offset: usize) -> Array2<f64> {
    let columns: Vec<Vec<f64>> = (0..grid.n_modes())
        .into_par_iter()
        .map(|idx| {
            let l = ob_foundation::ModeIndex::from_packed(idx).l;
            let row: Vec<f64> = coeffs.row(idx).iter().copied().collect();
            radial_synthesis(grid, &row, (l + offset) % 2)
        })
        .collect();
    let mut shells = Array2::zeros((grid.nr(), grid.n_modes()));
    for (idx, col) in columns.into_iter().enumerate() {
        for (j, v) in col.into_iter().enumerate() {
            shells[[j, idx]] = v;
        }
    }
    shells
}

/// 标量前向变换：物理张量 → 系数矩阵
pub fn forward_scalar(grid: &Grid, physical: &Array3<f64>, offset: usize) -> ObResult<Array2<f64>> {
    check_physical(grid, physical)?;
    let mut shells = Array2::zeros((grid.nr(), grid.n_modes()));
    shells
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(j, mut out)| {
            let coeffs = angular_analysis(grid, physical.index_axis(Axis(0), j));
            for (dst, v) in out.iter_mut().zip(coeffs) {
                *dst = v;
            }
        });
    Ok(radial_project(grid, &shells, offset))
}

/// 标量逆变换：系数矩阵 → 物理张量
pub fn inverse_scalar(grid: &Grid, coeffs: &Array2<f64>, offset: usize) -> Array3<f64> {
    let shells = radial_evaluate(grid, coeffs, offset);
    let mut out = Array3::zeros(grid.physical_shape());
    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(j, mut shell)| {
            let row: Vec<f64> = shells.row(j).iter().copied().collect();
            shell.assign(&angular_synthesis(grid, &row));
        });
    out
}

/// 矢量前向变换：球坐标分量 → (a, b, c) 系数矩阵
pub fn forward_vector(
    grid: &Grid,
    components: &SphericalComponents,
) -> ObResult<(Array2<f64>, Array2<f64>, Array2<f64>)> {
    for comp in components {
        check_physical(grid, comp)?;
    }
    let [v_r, v_theta, v_phi] = components;
    let a = forward_scalar(grid, v_r, 1)?;

    let per_shell: Vec<(Vec<f64>, Vec<f64>)> = (0..grid.nr())
        .into_par_iter()
        .map(|j| {
            vector_angular_analysis(
                grid,
                v_theta.index_axis(Axis(0), j),
                v_phi.index_axis(Axis(0), j),
            )
        })
        .collect();

    let mut shells_b = Array2::zeros((grid.nr(), grid.n_modes()));
    let mut shells_c = Array2::zeros((grid.nr(), grid.n_modes()));
    for (j, (b, c)) in per_shell.into_iter().enumerate() {
        for (idx, (vb, vc)) in b.into_iter().zip(c).enumerate() {
            shells_b[[j, idx]] = vb;
            shells_c[[j, idx]] = vc;
        }
    }

    Ok((
        a,
        radial_project(grid, &shells_b, 1),
        radial_project(grid, &shells_c, 0),
    ))
}

/// 矢量逆变换：(a, b, c) 系数矩阵 → 球坐标分量
pub fn inverse_vector(
    grid: &Grid,
    a: &Array2<f64>,
    b: &Array2<f64>,
    c: &Array2<f64>,
) -> SphericalComponents {
    let v_r = inverse_scalar(grid, a, 1);
    let shells_b = radial_evaluate(grid, b, 1);
    let shells_c = radial_evaluate(grid, c, 0);

    let mut v_theta = Array3::zeros(grid.physical_shape());
    let mut v_phi = Array3::zeros(grid.physical_shape());
    v_theta
        .axis_iter_mut(Axis(0))
        .into_par_iter()
        .zip(v_phi.axis_iter_mut(Axis(0)).into_par_iter())
        .enumerate()
        .for_each(|(j, (mut st, mut sp))| {
            let row_b: Vec<f64> = shells_b.row(j).iter().copied().collect();
            let row_c: Vec<f64> = shells_c.row(j).iter().copied().collect();
            let (t, p) = vector_angular_synthesis(grid, &row_b, &row_c);
            st.assign(&t);
            sp.assign(&p);
        });

    [v_r, v_theta, v_phi]
}

// =============================================================================
// 坐标系转换
// =============================================================================

/// 笛卡尔分量 → 球坐标分量
#[inline]
pub fn cartesian_to_spherical(v: [f64; 3], cos_t: f64, sin_t: f64, phi: f64) -> [f64; 3] {
    let (sp, cp) = phi.sin_cos();
    let [vx, vy, vz] = v;
    [
        sin_t * cp * vx + sin_t * sp * vy + cos_t * vz,
        cos_t * cp * vx + cos_t * sp * vy - sin_t * vz,
        -sp * vx + cp * vy,
    ]
}

/// 球坐标分量 → 笛卡尔分量
#[inline]
pub fn spherical_to_cartesian(v: [f64; 3], cos_t: f64, sin_t: f64, phi: f64) -> [f64; 3] {
    let (sp, cp) = phi.sin_cos();
    let [vr, vt, vp] = v;
    [
        sin_t * cp * vr + cos_t * cp * vt - sp * vp,
        sin_t * sp * vr + cos_t * sp * vt + cp * vp,
        cos_t * vr - sin_t * vt,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::chebyshev;

    #[test]
    fn test_angular_roundtrip_band_limited() {
        let grid = Grid::new(6).unwrap();
        let coeffs: Vec<f64> = (0..grid.n_modes()).map(|i| ((i * 7 % 11) as f64 - 5.0) / 5.0).collect();
        let surface = angular_synthesis(&grid, &coeffs);
        let back = angular_analysis(&grid, surface.view());
        for (a, b) in coeffs.iter().zip(&back) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_vector_angular_roundtrip() {
        let grid = Grid::new(6).unwrap();
        let n = grid.n_modes();
        let mut b: Vec<f64> = (0..n).map(|i| ((i * 5 % 7) as f64 - 3.0) / 3.0).collect();
        let mut c: Vec<f64> = (0..n).map(|i| ((i * 3 % 13) as f64 - 6.0) / 6.0).collect();
        b[0] = 0.0;
        c[0] = 0.0;
        let (vt, vp) = vector_angular_synthesis(&grid, &b, &c);
        let (b2, c2) = vector_angular_analysis(&grid, vt.view(), vp.view());
        for i in 0..n {
            assert!((b[i] - b2[i]).abs() < 1e-12, "b[{i}]");
            assert!((c[i] - c2[i]).abs() < 1e-12, "c[{i}]");
        }
    }

    #[test]
    fn test_y10_synthesis() {
        // Y_10 = sqrt(3/(4π)) cosθ
        let grid = Grid::new(4).unwrap();
        let mut coeffs = vec![0.0; grid.n_modes()];
        coeffs[packed_index(1, 0)] = 1.0;
        let s = angular_synthesis(&grid, &coeffs);
        let norm = (3.0 / (4.0 * PI)).sqrt();
        for i in 0..grid.ntheta() {
            for k in 0..grid.nphi() {
                assert!((s[[i, k]] - norm * grid.cos_theta()[i]).abs() < 1e-13);
            }
        }
    }

    #[test]
    fn test_radial_roundtrip() {
        let grid = Grid::new(8).unwrap();
        for parity in 0..2 {
            let coeffs: Vec<f64> = (0..8).map(|k| 1.0 / (k as f64 + 1.0)).collect();
            let values = radial_synthesis(&grid, &coeffs, parity);
            for (j, &r) in grid.radii().iter().enumerate() {
                let full = chebyshev::expand(&coeffs, parity, 16);
                assert!((values[j] - chebyshev::eval(&full, r)).abs() < 1e-12);
            }
            let back = radial_analysis(&grid, &values, parity);
            for (a, b) in coeffs.iter().zip(&back) {
                assert!((a - b).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_frame_conversion_inverse() {
        let (t, phi): (f64, f64) = (0.8, 2.1);
        let v = [0.3, -1.1, 0.7];
        let s = cartesian_to_spherical(v, t.cos(), t.sin(), phi);
        let back = spherical_to_cartesian(s, t.cos(), t.sin(), phi);
        for i in 0..3 {
            assert!((v[i] - back[i]).abs() < 1e-14);
        }
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let grid = Grid::new(4).unwrap();
        let wrong = Array3::zeros((2, 2, 2));
        assert!(matches!(
            forward_scalar(&grid, &wrong, 0),
            Err(ObError::SizeMismatch { .. })
        ));
    }
}
