// crates/ob_spectral/tests/operator_tests.rs

//! 微分算子测试
//!
//! # 测试覆盖
//!
//! - 结构恒等式：∇·∇× ≡ 0，∇×∇ ≡ 0，∇² = ∇·∇
//! - 示例速度场 v = ∇×w 的无散与边界无穿透
//! - 已知多项式的解析结果

use std::sync::Arc;

use ob_spectral::{
    curl, divergence, gradient, laplacian, CoordinateSystem, Frame, Grid, ScalarField,
    VectorField,
};

// ============================================================================
// 测试辅助函数
// ============================================================================

/// 矢量势 `w = z·exp(−5r²)·(x, y, z)`
fn vector_potential(grid: &Arc<Grid>) -> VectorField {
    VectorField::from_cartesian_fn(grid, |x, y, z| {
        let s = z * (-5.0 * (x * x + y * y + z * z)).exp();
        [s * x, s * y, s * z]
    })
    .unwrap()
}

fn check_example_velocity(order: usize) {
    let grid = Grid::new(order).unwrap();
    let v = curl(&vector_potential(&grid));
    assert!(v.norm() > 1e-3);

    let div = divergence(&v).norm();
    assert!(div < 1e-10, "‖∇·v‖ = {div:e}");

    let normal = v.restrict(1.0, Frame::Spherical).unwrap().dot_normal().norm();
    assert!(normal < 1e-10, "‖v·n‖ = {normal:e}");
}

// ============================================================================
// 示例速度场
// ============================================================================

#[test]
fn test_example_velocity_order_32() {
    check_example_velocity(32);
}

#[test]
fn test_example_velocity_order_100() {
    check_example_velocity(100);
}

#[test]
fn test_example_velocity_matches_analytic_curl() {
    // ∇×(φ r) = ∇φ × r = exp(−5r²)·(−y, x, 0)
    let grid = Grid::new(24).unwrap();
    let v = curl(&vector_potential(&grid));
    let pts = [[0.3, -0.2, 0.1], [0.0, 0.5, 0.5], [-0.6, 0.1, -0.3]];
    let vals = v.evaluate(&pts, CoordinateSystem::Cartesian, Frame::Cartesian).unwrap();
    for (p, got) in pts.iter().zip(vals) {
        let e = (-5.0 * (p[0] * p[0] + p[1] * p[1] + p[2] * p[2])).exp();
        let exact = [-p[1] * e, p[0] * e, 0.0];
        for d in 0..3 {
            assert!((got[d] - exact[d]).abs() < 1e-8, "{got:?} vs {exact:?}");
        }
    }
}

// ============================================================================
// 结构恒等式
// ============================================================================

#[test]
fn test_div_curl_vanishes_independent_of_magnitude() {
    let grid = Grid::new(16).unwrap();
    for &scale in &[1e-3, 1.0, 10.0] {
        let v = VectorField::from_cartesian_fn(&grid, |x, y, z| {
            [scale * (y * z).sin(), scale * x.cos() * z, scale * (-x * x).exp() * y]
        })
        .unwrap();
        let div_curl = divergence(&curl(&v)).norm();
        assert!(div_curl < 1e-9, "scale {scale}: {div_curl:e}");
    }
}

#[test]
fn test_curl_grad_and_div_grad() {
    let grid = Grid::new(14).unwrap();
    let f = ScalarField::from_fn(&grid, |x, y, z| (x - y).cos() * (1.0 + z * z).ln()).unwrap();
    let grad = gradient(&f);
    assert!(curl(&grad).norm() < 1e-10 * grad.norm());
    assert!((&divergence(&grad) - &laplacian(&f)).norm() < 1e-9);
}

// ============================================================================
// 解析结果
// ============================================================================

#[test]
fn test_laplacian_of_known_polynomials() {
    let grid = Grid::new(10).unwrap();
    let pts = [[0.2, 0.3, -0.4], [0.0, 0.0, 0.0], [-0.5, 0.6, 0.1]];
    let cases: [(fn(f64, f64, f64) -> f64, fn(f64, f64, f64) -> f64); 3] = [
        (|x, y, z| x * x + y * y + z * z, |_, _, _| 6.0),
        (|x, y, z| x * y * z + x * x * x, |x, _, _| 6.0 * x),
        // r⁴z = r⁵ cosθ：∇² = (30 − 2) r³ cosθ
        (
            |x, y, z| (x * x + y * y + z * z).powi(2) * z,
            |x, y, z| 28.0 * (x * x + y * y + z * z) * z,
        ),
    ];
    for (f, lap_exact) in cases {
        let lap = laplacian(&ScalarField::from_fn(&grid, f).unwrap());
        let vals = lap.evaluate(&pts, CoordinateSystem::Cartesian).unwrap();
        for (p, v) in pts.iter().zip(vals) {
            let exact = lap_exact(p[0], p[1], p[2]);
            assert!((v - exact).abs() < 1e-10, "at {p:?}: {v} vs {exact}");
        }
    }
}

#[test]
fn test_gradient_magnitude_on_sphere() {
    // ∇(r²/2) = r，在 r = 1 上法向分量为 1
    let grid = Grid::new(8).unwrap();
    let f = ScalarField::from_fn(&grid, |x, y, z| 0.5 * (x * x + y * y + z * z)).unwrap();
    let surface = gradient(&f).restrict(1.0, Frame::Spherical).unwrap();
    let normal = surface.dot_normal();
    let vals = normal.evaluate(&[(0.4, 1.0), (2.5, -3.0)]);
    assert!(vals.iter().all(|v| (v - 1.0).abs() < 1e-12));
    assert!((surface.norm() - (4.0 * std::f64::consts::PI).sqrt()).abs() < 1e-12);
}
