// crates/ob_spectral/src/helmholtz/tau.rs

//! 超球（ultraspherical）tau 离散
//!
//! 每个 ℓ 的径向方程写成
//!
//! ```text
//! r² u'' + 2 r u' − ℓ(ℓ+1) u + K² r² u = r² g
//! ```
//!
//! 未知量取 Chebyshev `T` 系数，方程在 `C⁽²⁾` 基下表示：
//!
//! - `E0 = x²·D2 + 2·S1·(x·D1)`，其中 `D2: T→C⁽²⁾`，`D1: T→C⁽¹⁾`
//! - `S  = S1·S0`，`S0: T→C⁽¹⁾`，`S1: C⁽¹⁾→C⁽²⁾`
//! - `M  = S1·S0·(x²)`，x² 在 T 基下相乘
//!
//! 以上算子保持奇偶性，按紧凑下标组装为 (N+1)×N 的 CSR 矩阵，
//! 在紧凑下标中带宽不超过 3。

use crate::basis::chebyshev;
use crate::linalg::CsrMatrix;

// =============================================================================
// 基本算子（作用于完整系数向量）
// =============================================================================

/// `S0`: T → C⁽¹⁾
pub(crate) fn t_to_c1(c: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; c.len()];
    for (n, &v) in c.iter().enumerate() {
        match n {
            0 => out[0] += v,
            1 => out[1] += 0.5 * v,
            _ => {
                out[n] += 0.5 * v;
                out[n - 2] -= 0.5 * v;
            }
        }
    }
    out
}

/// `S1`: C⁽¹⁾ → C⁽²⁾，`C⁽¹⁾_n = (C⁽²⁾_n − C⁽²⁾_{n−2}) / (n+1)`
pub(crate) fn c1_to_c2(c: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; c.len()];
    for (n, &v) in c.iter().enumerate() {
        let s = v / (n + 1) as f64;
        out[n] += s;
        if n >= 2 {
            out[n - 2] -= s;
        }
    }
    out
}

/// `D1`: T → C⁽¹⁾，`T_n' = n C⁽¹⁾_{n−1}`
pub(crate) fn diff_t_to_c1(c: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; c.len()];
    for (n, &v) in c.iter().enumerate().skip(1) {
        out[n - 1] = n as f64 * v;
    }
    out
}

/// `D2`: T → C⁽²⁾，`T_n'' = 2n C⁽²⁾_{n−2}`
pub(crate) fn diff2_t_to_c2(c: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; c.len()];
    for (n, &v) in c.iter().enumerate().skip(2) {
        out[n - 2] = 2.0 * n as f64 * v;
    }
    out
}

/// C⁽λ⁾ 基下乘以 x
///
/// `x C_n = [(n+1) C_{n+1} + (n+2λ−1) C_{n−1}] / (2(n+λ))`，输出比输入长 1。
pub(crate) fn multiply_x_ultraspherical(c: &[f64], lambda: f64) -> Vec<f64> {
    let mut out = vec![0.0; c.len() + 1];
    for (n, &v) in c.iter().enumerate() {
        if v == 0.0 {
            continue;
        }
        let nf = n as f64;
        let denom = 2.0 * (nf + lambda);
        out[n + 1] += v * (nf + 1.0) / denom;
        if n >= 1 {
            out[n - 1] += v * (nf + 2.0 * lambda - 1.0) / denom;
        }
    }
    out
}

/// 径向算子 `r²(·)'' + 2r(·)'` 的 C⁽²⁾ 表示
pub(crate) fn apply_e0(c: &[f64]) -> Vec<f64> {
    let d2 = diff2_t_to_c2(c);
    let x2d2 = multiply_x_ultraspherical(&multiply_x_ultraspherical(&d2, 2.0), 2.0);
    let xd1 = multiply_x_ultraspherical(&diff_t_to_c1(c), 1.0);
    let first = c1_to_c2(&xd1);
    let mut out = x2d2;
    for (o, f) in out.iter_mut().zip(first) {
        *o += 2.0 * f;
    }
    out
}

/// 恒等算子的 C⁽²⁾ 表示
pub(crate) fn apply_s(c: &[f64]) -> Vec<f64> {
    c1_to_c2(&t_to_c1(c))
}

/// 乘以 r² 的 C⁽²⁾ 表示
pub(crate) fn apply_m(c: &[f64]) -> Vec<f64> {
    apply_s(&chebyshev::multiply_x(&chebyshev::multiply_x(c)))
}

// =============================================================================
// 按奇偶性缓存的算子矩阵
// =============================================================================

/// 单一奇偶性下的 tau 算子
#[derive(Debug, Clone)]
pub struct ParityOperators {
    /// `r²∂² + 2r∂`
    pub e0: CsrMatrix,
    /// 恒等
    pub s: CsrMatrix,
    /// 乘以 r²
    pub m: CsrMatrix,
    /// Dirichlet 边界行 `Σ u_n`
    pub dirichlet_row: Vec<f64>,
    /// Neumann 边界行 `Σ n² u_n`
    pub neumann_row: Vec<f64>,
}

/// 某阶数下两种奇偶性的 tau 算子
#[derive(Debug, Clone)]
pub struct TauOperators {
    parity: [ParityOperators; 2],
}

impl TauOperators {
    /// 为阶数 N 组装
    pub fn new(order: usize) -> Self {
        let build = |p: usize| ParityOperators {
            e0: assemble(order, p, apply_e0),
            s: assemble(order, p, apply_s),
            m: assemble(order, p, apply_m),
            dirichlet_row: vec![1.0; order],
            neumann_row: (0..order)
                .map(|k| {
                    let n = (2 * k + p) as f64;
                    n * n
                })
                .collect(),
        };
        let parity = [build(0), build(1)];
        debug_assert!(parity
            .iter()
            .all(|p| p.e0.bandwidth() <= 3 && p.s.bandwidth() <= 3 && p.m.bandwidth() <= 3));
        log::trace!(
            "组装 tau 算子: order={}, nnz(E0/S/M)={}/{}/{}",
            order,
            parity[0].e0.nnz(),
            parity[0].s.nnz(),
            parity[0].m.nnz()
        );
        Self { parity }
    }

    /// 给定奇偶性的算子
    #[inline]
    pub fn parity(&self, p: usize) -> &ParityOperators {
        &self.parity[p % 2]
    }
}

/// 作用于单位向量逐列组装 (N+1)×N 紧凑矩阵
fn assemble(order: usize, parity: usize, op: fn(&[f64]) -> Vec<f64>) -> CsrMatrix {
    let full_len = 2 * order + 4;
    CsrMatrix::from_columns(order + 1, order, |k| {
        let mut unit = vec![0.0; full_len];
        unit[2 * k + parity] = 1.0;
        let image = op(&unit);
        chebyshev::compress(&image, parity, order + 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// C⁽²⁾ 级数求值：C⁽²⁾_n 由递推 `(n+1)C_{n+1} = 2(n+2)x C_n − (n+3) C_{n−1}`
    fn eval_c2(c: &[f64], x: f64) -> f64 {
        let mut prev = 0.0;
        let mut cur = 1.0;
        let mut sum = 0.0;
        for (n, &v) in c.iter().enumerate() {
            sum += v * cur;
            let nf = n as f64;
            let next = (2.0 * (nf + 2.0) * x * cur - (nf + 3.0) * prev) / (nf + 1.0);
            prev = cur;
            cur = next;
        }
        sum
    }

    #[test]
    fn test_c2_recurrence_helper() {
        // C⁽²⁾_1 = 4x, C⁽²⁾_2 = 12x² − 2
        assert!((eval_c2(&[0.0, 1.0], 0.3) - 1.2).abs() < 1e-14);
        assert!((eval_c2(&[0.0, 0.0, 1.0], 0.5) - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_conversions_preserve_values() {
        let c = [0.3, -0.2, 0.5, 0.1, -0.4, 0.0, 0.0];
        for &x in &[-0.7f64, 0.1, 0.9] {
            let direct = chebyshev::eval(&c, x);
            assert!((eval_c2(&apply_s(&c), x) - direct).abs() < 1e-13);
        }
    }

    #[test]
    fn test_e0_matches_analytic_operator() {
        // u = T_4 = 8x⁴ − 8x² + 1: x²u'' + 2xu' = 96x⁴ − 16x² + 64x⁴ − 32x² = 160x⁴ − 48x²
        let mut c = vec![0.0; 8];
        c[4] = 1.0;
        let e = apply_e0(&c);
        for &x in &[-0.5f64, 0.2, 0.8] {
            let expected = 160.0 * x.powi(4) - 48.0 * x * x;
            assert!((eval_c2(&e, x) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_m_matches_r_squared() {
        let c = [0.0, 1.0, 0.0, 0.5, 0.0, 0.0, 0.0];
        let m = apply_m(&c);
        for &x in &[-0.3f64, 0.6] {
            let expected = x * x * chebyshev::eval(&c, x);
            assert!((eval_c2(&m, x) - expected).abs() < 1e-13);
        }
    }

    #[test]
    fn test_operator_bandwidth() {
        let ops = TauOperators::new(10);
        for p in 0..2 {
            let par = ops.parity(p);
            assert_eq!(par.e0.n_rows(), 11);
            assert_eq!(par.e0.n_cols(), 10);
            assert!(par.e0.bandwidth() <= 3);
            assert!(par.s.bandwidth() <= 3);
            assert!(par.m.bandwidth() <= 3);
        }
        assert_eq!(ops.parity(1).neumann_row[2], 25.0);
    }
}
