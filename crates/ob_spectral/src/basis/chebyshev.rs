// crates/ob_spectral/src/basis/chebyshev.rs

//! 径向 Chebyshev 基
//!
//! 径向展开使用第一类 Chebyshev 多项式 `T_n(r)`，r ∈ [0, 1] 视为
//! [-1, 1] 上具有确定奇偶性函数的正半部分。(ℓ, m) 分量只保留
//! `n ≡ ℓ + s (mod 2)` 的项，紧凑下标 k 对应阶数 `n = 2k + parity`。
//!
//! 本模块的函数都作用于"完整"系数向量（按阶数 n 编号），
//! 紧凑向量与完整向量之间用 [`expand`] / [`compress`] 转换。
//!
//! # 精确算子
//!
//! - [`derivative`]: d/dr
//! - [`quotient`]: `Q f = (f − f(0)) / r`，多项式意义下精确
//! - [`multiply_x`]: 乘以 r
//!
//! `(Qf)' + Q(Qf) = Q(f')` 对任意多项式精确成立，散度/旋度恒等式依赖于此。

use std::f64::consts::PI;

/// 正半轴 Gauss-Chebyshev 节点
///
/// `r_j = cos((2j+1)π / (4·nr))`，即 [-1, 1] 上 `2·nr` 个 Gauss-Chebyshev
/// 点的正半部分，按降序排列，不含原点。
pub fn half_nodes(nr: usize) -> Vec<f64> {
    (0..nr)
        .map(|j| ((2 * j + 1) as f64 * PI / (4 * nr) as f64).cos())
        .collect()
}

/// `T_0(x) .. T_{max_degree}(x)` 的值
pub fn eval_all(max_degree: usize, x: f64) -> Vec<f64> {
    let mut t = vec![0.0; max_degree + 1];
    t[0] = 1.0;
    if max_degree >= 1 {
        t[1] = x;
    }
    for n in 2..=max_degree {
        t[n] = 2.0 * x * t[n - 1] - t[n - 2];
    }
    t
}

/// Clenshaw 求和 `Σ c_n T_n(x)`
pub fn eval(coeffs: &[f64], x: f64) -> f64 {
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    for &c in coeffs.iter().skip(1).rev() {
        let b0 = 2.0 * x * b1 - b2 + c;
        b2 = b1;
        b1 = b0;
    }
    match coeffs.first() {
        Some(&c0) => x * b1 - b2 + c0,
        None => 0.0,
    }
}

/// `Σ n² c_n`，即 `d/dx Σ c_n T_n` 在 x = 1 处的值
pub fn derivative_at_one(coeffs: &[f64]) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .map(|(n, &c)| (n * n) as f64 * c)
        .sum()
}

/// 导数系数，输出与输入等长（末项为 0）
pub fn derivative(coeffs: &[f64]) -> Vec<f64> {
    let len = coeffs.len();
    let mut d = vec![0.0; len + 1];
    for k in (1..len).rev() {
        d[k - 1] = d[k + 1] + 2.0 * k as f64 * coeffs[k];
    }
    if let Some(d0) = d.first_mut() {
        *d0 *= 0.5;
    }
    d.truncate(len);
    d
}

/// 商算子 `Q f = (f − f(0)) / r`
///
/// 对 `x·g = f − f(0)` 逐阶反解：`g_{n−1} = 2 f_n − g_{n+1}`（n ≥ 2），
/// `g_0 = f_1 − g_2 / 2`。`f_0` 只用于 `f(0)`，不需要显式计算。
pub fn quotient(coeffs: &[f64]) -> Vec<f64> {
    let len = coeffs.len();
    let mut g = vec![0.0; len + 1];
    for n in (2..len).rev() {
        g[n - 1] = 2.0 * coeffs[n] - g[n + 1];
    }
    if len >= 2 {
        g[0] = coeffs[1] - 0.5 * g[2];
    }
    g.truncate(len);
    g
}

/// 乘以 x：`x T_0 = T_1`，`x T_n = (T_{n+1} + T_{n−1}) / 2`
///
/// 输出比输入长 1。
pub fn multiply_x(coeffs: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; coeffs.len() + 1];
    for (n, &c) in coeffs.iter().enumerate() {
        if c == 0.0 {
            continue;
        }
        if n == 0 {
            out[1] += c;
        } else {
            out[n + 1] += 0.5 * c;
            out[n - 1] += 0.5 * c;
        }
    }
    out
}

/// 紧凑向量展开为完整向量（长度 `full_len`）
pub fn expand(compact: &[f64], parity: usize, full_len: usize) -> Vec<f64> {
    let mut full = vec![0.0; full_len];
    for (k, &c) in compact.iter().enumerate() {
        let n = 2 * k + parity;
        if n < full_len {
            full[n] = c;
        }
    }
    full
}

/// 完整向量压缩为长度 `n` 的紧凑向量，丢弃另一奇偶性的项
pub fn compress(full: &[f64], parity: usize, n: usize) -> Vec<f64> {
    (0..n)
        .map(|k| full.get(2 * k + parity).copied().unwrap_or(0.0))
        .collect()
}

// =============================================================================
// Gram 矩阵
// =============================================================================

/// `∫_{-1}^{1} T_k dx`
fn integral_t(k: usize) -> f64 {
    if k % 2 == 1 {
        0.0
    } else {
        2.0 / (1.0 - (k * k) as f64)
    }
}

/// `∫_{-1}^{1} x² T_k dx`，利用 `x² T_k = (T_{k+2} + 2T_k + T_{|k−2|}) / 4`
fn integral_x2_t(k: usize) -> f64 {
    0.25 * (integral_t(k + 2) + 2.0 * integral_t(k) + integral_t(k.abs_diff(2)))
}

/// `∫_0^1 T_a T_b r² dr`，要求 a ≡ b (mod 2)
pub fn weighted_inner(a: usize, b: usize) -> f64 {
    0.25 * (integral_x2_t(a + b) + integral_x2_t(a.abs_diff(b)))
}

/// `∫_0^1 T_n r² dr`，要求 n 为偶数
pub fn weighted_integral(n: usize) -> f64 {
    0.5 * integral_x2_t(n)
}

/// 给定奇偶性下 n×n 紧凑 Gram 矩阵（行主序）
pub fn gram_matrix(n: usize, parity: usize) -> Vec<f64> {
    let mut g = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            g[i * n + j] = weighted_inner(2 * i + parity, 2 * j + parity);
        }
    }
    g
}
