// crates/ob_spectral/src/operators/mod.rs

//! 微分算子
//!
//! 所有算子都是逐 (ℓ, m) 的精确线性组合，只用到 Chebyshev 求导与商算子
//! `Q f = (f − f(0))/r`：
//!
//! ```text
//! ∇(fY)            = f' Y r̂ + (Qf) Ψ
//! ∇·(aYr̂ + bΨ + cΦ) = (a' + 2Qa − ℓ(ℓ+1) Qb) Y
//! ∇×(aYr̂ + bΨ + cΦ) = −ℓ(ℓ+1) Qc Y r̂ − (c' + Qc) Ψ + (b' + Qb − Qa) Φ
//! ∇²(fY)           = (f'' + 2Qf' − ℓ(ℓ+1) QQf) Y
//! ```
//!
//! 由恒等式 `(Qf)' + QQf = Q(f')`，`∇·∇× ≡ 0` 与 `∇×∇ ≡ 0` 在系数层面
//! 逐项成立，只剩舍入误差。各模态并行计算。

mod radial;

use ndarray::Array2;
use rayon::prelude::*;

use crate::field::{ScalarField, VectorField};
use crate::grid::Grid;
use ob_foundation::ModeIndex;
use radial::{combine, RadialCalculus};

/// 逐模态并行计算 K 个输出系数矩阵
///
/// `f(l, idx)` 返回该模态的 K 个紧凑径向向量。
fn per_mode<const K: usize, F>(grid: &Grid, f: F) -> [Array2<f64>; K]
where
    F: Fn(usize, usize) -> [Vec<f64>; K] + Sync + Send,
{
    let rows: Vec<[Vec<f64>; K]> = (0..grid.n_modes())
        .into_par_iter()
        .map(|idx| f(ModeIndex::from_packed(idx).l, idx))
        .collect();

    let mut out: [Array2<f64>; K] = std::array::from_fn(|_| Array2::zeros(grid.coefficient_shape()));
    for (idx, row) in rows.into_iter().enumerate() {
        for (dst, values) in out.iter_mut().zip(row) {
            for (k, v) in values.into_iter().enumerate() {
                dst[[idx, k]] = v;
            }
        }
    }
    out
}

fn calculus(grid: &Grid) -> RadialCalculus {
    RadialCalculus::new(grid.order(), grid.full_len())
}

/// 梯度 `∇f`
pub fn gradient(field: &ScalarField) -> VectorField {
    let grid = field.grid();
    let calc = calculus(grid);
    let n = grid.order();
    let coeffs = field.coefficients();

    let [a, b, c] = per_mode(grid, |l, idx| {
        let f = coeffs.row(idx).to_vec();
        let p = l % 2;
        let radial = calc.derivative(&f, p);
        let spheroidal = if l == 0 {
            vec![0.0; n]
        } else {
            calc.quotient(&f, p)
        };
        [radial, spheroidal, vec![0.0; n]]
    });
    VectorField::from_parts(grid, a, b, c)
}

/// 散度 `∇·v`
pub fn divergence(field: &VectorField) -> ScalarField {
    let grid = field.grid();
    let calc = calculus(grid);
    let n = grid.order();
    let (a_all, b_all) = (field.radial(), field.spheroidal());

    let [out] = per_mode(grid, |l, idx| {
        let ell = (l * (l + 1)) as f64;
        let q = (l + 1) % 2;
        let a = a_all.row(idx).to_vec();
        let b = b_all.row(idx).to_vec();
        let da = calc.derivative(&a, q);
        let qa = calc.quotient(&a, q);
        let qb = calc.quotient(&b, q);
        [combine(&[(1.0, &da[..]), (2.0, &qa[..]), (-ell, &qb[..])], n)]
    });
    ScalarField::zeros(grid).with_coefficients(out)
}

/// 旋度 `∇×v`
pub fn curl(field: &VectorField) -> VectorField {
    let grid = field.grid();
    let calc = calculus(grid);
    let n = grid.order();
    let (a_all, b_all, c_all) = (field.radial(), field.spheroidal(), field.toroidal());

    let [a, b, c] = per_mode(grid, |l, idx| {
        if l == 0 {
            return [vec![0.0; n], vec![0.0; n], vec![0.0; n]];
        }
        let ell = (l * (l + 1)) as f64;
        // a、b 奇偶性为 (ℓ+1)%2，c 为 ℓ%2
        let q = (l + 1) % 2;
        let p = l % 2;
        let a = a_all.row(idx).to_vec();
        let b = b_all.row(idx).to_vec();
        let c = c_all.row(idx).to_vec();

        let qc = calc.quotient(&c, p);
        let dc = calc.derivative(&c, p);
        let db = calc.derivative(&b, q);
        let qb = calc.quotient(&b, q);
        let qa = calc.quotient(&a, q);

        [
            combine(&[(-ell, &qc[..])], n),
            combine(&[(-1.0, &dc[..]), (-1.0, &qc[..])], n),
            combine(&[(1.0, &db[..]), (1.0, &qb[..]), (-1.0, &qa[..])], n),
        ]
    });
    VectorField::from_parts(grid, a, b, c)
}

/// 拉普拉斯 `∇²f`
pub fn laplacian(field: &ScalarField) -> ScalarField {
    let grid = field.grid();
    let calc = calculus(grid);
    let coeffs = field.coefficients();

    let [out] = per_mode(grid, |l, idx| {
        let f = coeffs.row(idx).to_vec();
        [calc.laplacian(&f, l % 2, (l * (l + 1)) as f64)]
    });
    field.with_coefficients(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{CoordinateSystem, Frame};
    use std::sync::Arc;

    fn grid(order: usize) -> Arc<Grid> {
        Grid::new(order).unwrap()
    }

    const PTS: [[f64; 3]; 3] = [[0.1, -0.2, 0.3], [0.5, 0.5, -0.1], [-0.3, 0.0, 0.8]];

    fn assert_vector_at(v: &VectorField, exact: impl Fn(f64, f64, f64) -> [f64; 3], tol: f64) {
        let vals = v.evaluate(&PTS, CoordinateSystem::Cartesian, Frame::Cartesian).unwrap();
        for (p, got) in PTS.iter().zip(vals) {
            let e = exact(p[0], p[1], p[2]);
            for d in 0..3 {
                assert!((got[d] - e[d]).abs() < tol, "at {p:?}: {got:?} vs {e:?}");
            }
        }
    }

    #[test]
    fn test_gradient_of_polynomial() {
        let g = grid(8);
        let f = ScalarField::from_fn(&g, |x, y, z| x * y + z * z * z).unwrap();
        assert_vector_at(&gradient(&f), |x, y, z| [y, x, 3.0 * z * z], 1e-11);
    }

    #[test]
    fn test_divergence_of_position() {
        let g = grid(6);
        let v = VectorField::from_cartesian_fn(&g, |x, y, z| [x, y, z]).unwrap();
        let d = divergence(&v);
        let vals = d.evaluate(&PTS, CoordinateSystem::Cartesian).unwrap();
        assert!(vals.iter().all(|v| (v - 3.0).abs() < 1e-11));
    }

    #[test]
    fn test_curl_of_rotation() {
        let g = grid(6);
        let v = VectorField::from_cartesian_fn(&g, |x, y, _| [-y, x, 0.0]).unwrap();
        assert_vector_at(&curl(&v), |_, _, _| [0.0, 0.0, 2.0], 1e-11);
    }

    #[test]
    fn test_curl_of_polynomial() {
        let g = grid(8);
        let v = VectorField::from_cartesian_fn(&g, |x, y, z| [y * z, x * x, -x * z]).unwrap();
        // ∇×(yz, x², −xz) = (0, y + z, 2x − z)
        assert_vector_at(&curl(&v), |x, y, z| [0.0, y + z, 2.0 * x - z], 1e-10);
    }

    #[test]
    fn test_laplacian_of_r_squared() {
        let g = grid(6);
        let f = ScalarField::from_fn(&g, |x, y, z| x * x + y * y + z * z).unwrap();
        let lap = laplacian(&f);
        assert!((lap.mean() - 6.0).abs() < 1e-11);
        let vals = lap.evaluate(&PTS, CoordinateSystem::Cartesian).unwrap();
        assert!(vals.iter().all(|v| (v - 6.0).abs() < 1e-11));
    }

    #[test]
    fn test_identities() {
        let g = grid(10);
        let f = ScalarField::from_fn(&g, |x, y, z| (x + 2.0 * y * z).sin() * (-z * z).exp()).unwrap();
        let grad = gradient(&f);

        assert!(curl(&grad).norm() < 1e-10 * grad.norm());
        let lap = laplacian(&f);
        let div_grad = divergence(&grad);
        assert!((&lap - &div_grad).norm() < 1e-10 * lap.norm().max(1.0));

        let v = VectorField::from_cartesian_fn(&g, |x, y, z| [y * z.cos(), x * x - z, (x * y).sin()])
            .unwrap();
        assert!(divergence(&curl(&v)).norm() < 1e-10 * v.norm());
    }

    #[test]
    fn test_gradient_has_no_monopole_tangential() {
        let g = grid(5);
        let f = ScalarField::from_fn(&g, |x, y, z| 1.0 + x * x + y * y + z * z).unwrap();
        let grad = gradient(&f);
        assert!(grad.spheroidal().row(0).iter().all(|&v| v == 0.0));
        assert!(grad.toroidal().iter().all(|&v| v == 0.0));
    }
}
