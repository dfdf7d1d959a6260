// crates/ob_spectral/tests/transform_tests.rs

//! 变换与场表示测试
//!
//! # 测试覆盖
//!
//! - 带限场的逆变换/前向变换精确往返
//! - 光滑场变换误差随阶数谱收敛
//! - 分辨率检查策略

use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::Array2;
use ob_config::{BoundaryType, ResolutionPolicy, SolveConfig};
use ob_foundation::ObError;
use ob_spectral::{CoordinateSystem, Frame, Grid, ScalarField, VectorField};

// ============================================================================
// 测试辅助函数
// ============================================================================

/// 确定性伪随机系数，取值 [-1, 1)
fn pseudo_random(shape: (usize, usize), seed: u64) -> Array2<f64> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    Array2::from_shape_fn(shape, |_| {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    })
}

fn max_abs_diff(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// 若干球内测试点（笛卡尔）
fn sample_points() -> Vec<[f64; 3]> {
    let mut pts = Vec::new();
    for &r in &[0.05, 0.4, 0.75, 0.98] {
        for &(t, p) in &[(0.3, 0.1), (1.2, 2.5), (2.0, -1.0), (2.9, 4.0)] {
            let (st, ct) = f64::sin_cos(t);
            let (sp, cp) = f64::sin_cos(p);
            pts.push([r * st * cp, r * st * sp, r * ct]);
        }
    }
    pts
}

// ============================================================================
// 往返
// ============================================================================

#[test]
fn test_scalar_band_limited_round_trip() {
    let grid = Grid::new(10).unwrap();
    let coeffs = pseudo_random(grid.coefficient_shape(), 7);
    let f = ScalarField::from_coefficients(&grid, coeffs.clone()).unwrap();
    let back = ScalarField::from_physical(&grid, &f.to_physical()).unwrap();
    assert!(max_abs_diff(back.coefficients(), &coeffs) < 1e-11);
}

#[test]
fn test_vector_band_limited_round_trip() {
    let grid = Grid::new(8).unwrap();
    let shape = grid.coefficient_shape();
    let a = pseudo_random(shape, 1);
    let mut b = pseudo_random(shape, 2);
    let mut c = pseudo_random(shape, 3);
    b.row_mut(0).fill(0.0);
    c.row_mut(0).fill(0.0);
    let v = VectorField::from_components(&grid, a.clone(), b.clone(), c.clone()).unwrap();

    let back = VectorField::from_physical(&grid, &v.to_physical(Frame::Spherical)).unwrap();
    assert!(max_abs_diff(back.radial(), &a) < 1e-11);
    assert!(max_abs_diff(back.spheroidal(), &b) < 1e-11);
    assert!(max_abs_diff(back.toroidal(), &c) < 1e-11);
}

#[test]
fn test_physical_round_trip_of_smooth_field() {
    let grid = Grid::new(16).unwrap();
    let f = |x: f64, y: f64, z: f64| (0.5 * x).exp() * (y + z).cos();
    let values = grid.sample(f);
    let field = ScalarField::from_physical(&grid, &values).unwrap();
    let err = (&field.to_physical() - &values)
        .iter()
        .map(|v| v.abs())
        .fold(0.0, f64::max);
    assert!(err < 1e-10, "err = {err:e}");
}

#[test]
fn test_spectral_convergence() {
    let f = |x: f64, y: f64, z: f64| (0.5 * x).exp() * (y + z).cos();
    let pts = sample_points();
    let error_at = |order: usize| -> f64 {
        let grid = Grid::new(order).unwrap();
        let field = ScalarField::from_fn(&grid, f).unwrap();
        let vals = field.evaluate(&pts, CoordinateSystem::Cartesian).unwrap();
        pts.iter()
            .zip(vals)
            .map(|(p, v)| (v - f(p[0], p[1], p[2])).abs())
            .fold(0.0, f64::max)
    };

    let coarse = error_at(4);
    let medium = error_at(8);
    let fine = error_at(14);
    assert!(medium < coarse, "{medium:e} !< {coarse:e}");
    assert!(fine < 1e-3 * coarse, "{fine:e} vs {coarse:e}");
    assert!(fine < 1e-9, "fine = {fine:e}");
}

// ============================================================================
// 场运算
// ============================================================================

#[test]
fn test_vector_norm_matches_self_dot() {
    let grid = Grid::new(8).unwrap();
    let v = VectorField::from_cartesian_fn(&grid, |x, y, z| [1.0 + y, z * x, 0.5 - x * x]).unwrap();
    // ‖v‖² = ∫ v·v dV = ⟨v·v⟩ · 4π/3
    let via_dot = v.dot(&v).unwrap().mean() * 4.0 * PI / 3.0;
    assert!((v.norm().powi(2) - via_dot).abs() < 1e-11);
}

#[test]
fn test_evaluate_spherical_matches_cartesian() {
    let grid = Grid::new(8).unwrap();
    let f = ScalarField::from_fn(&grid, |x, y, z| x * y * z + y).unwrap();
    let (r, t, p) = (0.7, 1.1, -2.3);
    let sph = f.evaluate(&[[r, t, p]], CoordinateSystem::Spherical).unwrap();
    let cart = f
        .evaluate(
            &[[r * t.sin() * p.cos(), r * t.sin() * p.sin(), r * t.cos()]],
            CoordinateSystem::Cartesian,
        )
        .unwrap();
    assert!((sph[0] - cart[0]).abs() < 1e-13);
}

// ============================================================================
// 分辨率检查
// ============================================================================

#[test]
fn test_resolution_policy() {
    let grid: Arc<Grid> = Grid::new(5).unwrap();
    let rough = ScalarField::from_fn(&grid, |x, y, z| (-40.0 * (x * x + y * y + z * z)).exp() * (3.0 * x).sin())
        .unwrap();
    let smooth = ScalarField::from_fn(&grid, |x, _, z| 1.0 + x * z).unwrap();

    let reject = SolveConfig::new(5, BoundaryType::Dirichlet)
        .with_resolution_policy(ResolutionPolicy::Reject);
    assert!(matches!(
        rough.check_resolution(&reject),
        Err(ObError::BasisResolution { .. })
    ));
    assert!(smooth.check_resolution(&reject).is_ok());

    let warn = reject.with_resolution_policy(ResolutionPolicy::Warn);
    let report = rough.check_resolution(&warn).unwrap();
    assert!(!report.is_resolved(warn.tolerance));
}
