// crates/ob_spectral/src/operators/radial.rs

//! 单模态径向运算
//!
//! 输入输出均为紧凑系数（长度 N）加奇偶性。求导与商算子都会翻转奇偶性，
//! 且不会提高多项式次数，因此紧凑表示下结果精确，无截断。

use crate::basis::chebyshev;

/// 单个 (ℓ, m) 模态上的径向微积分
#[derive(Debug, Clone, Copy)]
pub(crate) struct RadialCalculus {
    order: usize,
    full_len: usize,
}

impl RadialCalculus {
    pub(crate) fn new(order: usize, full_len: usize) -> Self {
        Self { order, full_len }
    }

    /// `f'`，结果奇偶性为 `1 − parity`
    pub(crate) fn derivative(&self, f: &[f64], parity: usize) -> Vec<f64> {
        let full = chebyshev::expand(f, parity, self.full_len);
        chebyshev::compress(&chebyshev::derivative(&full), 1 - parity, self.order)
    }

    /// `Q f = (f − f(0)) / r`，结果奇偶性为 `1 − parity`
    pub(crate) fn quotient(&self, f: &[f64], parity: usize) -> Vec<f64> {
        let full = chebyshev::expand(f, parity, self.full_len);
        chebyshev::compress(&chebyshev::quotient(&full), 1 - parity, self.order)
    }

    /// `f'' + 2Qf' − ℓ(ℓ+1) QQf`，奇偶性不变
    pub(crate) fn laplacian(&self, f: &[f64], parity: usize, ell: f64) -> Vec<f64> {
        let d1 = self.derivative(f, parity);
        let d2 = self.derivative(&d1, 1 - parity);
        let qd1 = self.quotient(&d1, 1 - parity);
        let qqf = self.quotient(&self.quotient(f, parity), 1 - parity);
        d2.iter()
            .zip(&qd1)
            .zip(&qqf)
            .map(|((a, b), c)| a + 2.0 * b - ell * c)
            .collect()
    }
}

/// 逐项线性组合 `Σ w_i v_i`
pub(crate) fn combine(terms: &[(f64, &[f64])], len: usize) -> Vec<f64> {
    let mut out = vec![0.0; len];
    for &(w, v) in terms {
        if w != 0.0 {
            crate::linalg::axpy(w, v, &mut out);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> RadialCalculus {
        RadialCalculus::new(6, 14)
    }

    #[test]
    fn test_derivative_of_r_squared() {
        // r² = (T_0 + T_2) / 2，偶
        let d = calc().derivative(&[0.5, 0.5, 0.0, 0.0, 0.0, 0.0], 0);
        // 2r = 2 T_1
        assert!((d[0] - 2.0).abs() < 1e-15);
        assert!(d[1..].iter().all(|v| v.abs() < 1e-15));
    }

    #[test]
    fn test_quotient_of_r_cubed() {
        // r³ = (3T_1 + T_3) / 4，奇；Q r³ = r²
        let q = calc().quotient(&[0.75, 0.25, 0.0, 0.0, 0.0, 0.0], 1);
        assert!((q[0] - 0.5).abs() < 1e-15);
        assert!((q[1] - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_laplacian_of_r_squared() {
        // ∇²(r² Y_00) = 6 Y_00
        let lap = calc().laplacian(&[0.5, 0.5, 0.0, 0.0, 0.0, 0.0], 0, 0.0);
        assert!((lap[0] - 6.0).abs() < 1e-14);
        assert!(lap[1..].iter().all(|v| v.abs() < 1e-14));
    }

    #[test]
    fn test_laplacian_of_harmonic() {
        // r^ℓ Y_ℓm 调和；ℓ = 2：r² = (T_0 + T_2)/2
        let lap = calc().laplacian(&[0.5, 0.5, 0.0, 0.0, 0.0, 0.0], 0, 6.0);
        assert!(lap.iter().all(|v| v.abs() < 1e-14));
    }
}
