// crates/ob_spectral/src/basis/legendre.rs

//! Gauss-Legendre 求积与归一化连带 Legendre 函数
//!
//! 归一化约定：`∫_{-1}^{1} p̃_ℓ^m(x)² dx = 1`，不含 Condon-Shortley 相位。
//! 实球谐函数为
//!
//! ```text
//! Y_ℓ0  = p̃_ℓ^0 / √(2π)
//! Y_ℓm  = p̃_ℓ^m cos(mφ) / √π      (m > 0)
//! Y_ℓ,−m = p̃_ℓ^m sin(mφ) / √π     (m > 0)
//! ```
//!
//! 矢量运算需要 `∂θ p̃` 与 `m p̃ / sinθ`。两者都由 `q = p̃ / sinθ`
//! 的递推直接得到，全程不做除以 `sinθ` 的运算，极点处同样有限。

use std::f64::consts::PI;

/// 三角形存储下标 `ℓ(ℓ+1)/2 + m`（0 ≤ m ≤ ℓ）
#[inline]
pub fn tri_index(l: usize, m: usize) -> usize {
    l * (l + 1) / 2 + m
}

/// ℓ ≤ `l_max` 的三角形表长度
#[inline]
pub fn tri_len(l_max: usize) -> usize {
    (l_max + 1) * (l_max + 2) / 2
}

/// 三项递推系数 `a_ℓm = sqrt((4ℓ² − 1) / (ℓ² − m²))`
#[inline]
fn recurrence_coeff(l: usize, m: usize) -> f64 {
    let l2 = (l * l) as f64;
    let m2 = (m * m) as f64;
    ((4.0 * l2 - 1.0) / (l2 - m2)).sqrt()
}

/// n 点 Gauss-Legendre 节点与权重
///
/// 节点按降序排列（对应余纬 θ 升序），Newton 迭代求 `P_n` 的根。
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    let mut nodes = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..n {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_with_derivative(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        let (_, dp) = legendre_with_derivative(n, x);
        nodes.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    (nodes, weights)
}

/// `(P_n(x), P_n'(x))`，未归一化 Legendre 多项式
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 1..n {
        let kf = k as f64;
        let p2 = ((2.0 * kf + 1.0) * x * p1 - kf * p0) / (kf + 1.0);
        p0 = p1;
        p1 = p2;
    }
    let dp = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, dp)
}

/// 单个余纬点上的连带 Legendre 值
///
/// 三张表均按 [`tri_index`] 存储：`p` 为 `p̃_ℓ^m`，`dp` 为 `∂θ p̃_ℓ^m`，
/// `mq` 为 `m p̃_ℓ^m / sinθ`。
#[derive(Debug, Clone)]
pub struct LegendreColumn {
    /// `p̃_ℓ^m(cosθ)`
    pub p: Vec<f64>,
    /// `∂θ p̃_ℓ^m`
    pub dp: Vec<f64>,
    /// `m p̃_ℓ^m / sinθ`
    pub mq: Vec<f64>,
}

impl LegendreColumn {
    /// 在 `x = cosθ`、`s = sinθ ≥ 0` 处计算 ℓ ≤ `l_max` 的全部值
    pub fn new(l_max: usize, x: f64, s: f64) -> Self {
        let len = tri_len(l_max);
        let mut p = vec![0.0; len];
        let mut q = vec![0.0; len];

        // m = 0
        p[0] = std::f64::consts::FRAC_1_SQRT_2;
        if l_max >= 1 {
            p[tri_index(1, 0)] = 3f64.sqrt() * x * p[0];
        }
        for l in 2..=l_max {
            p[tri_index(l, 0)] = recurrence_coeff(l, 0)
                * (x * p[tri_index(l - 1, 0)]
                    - p[tri_index(l - 2, 0)] / recurrence_coeff(l - 1, 0));
        }

        // m ≥ 1，先算 q = p̃ / sinθ
        let mut q_mm = 0.5 * 3f64.sqrt();
        for m in 1..=l_max {
            if m > 1 {
                q_mm *= ((2 * m + 1) as f64 / (2 * m) as f64).sqrt() * s;
            }
            q[tri_index(m, m)] = q_mm;
            if m < l_max {
                q[tri_index(m + 1, m)] = ((2 * m + 3) as f64).sqrt() * x * q_mm;
            }
            for l in (m + 2)..=l_max {
                q[tri_index(l, m)] = recurrence_coeff(l, m)
                    * (x * q[tri_index(l - 1, m)]
                        - q[tri_index(l - 2, m)] / recurrence_coeff(l - 1, m));
            }
            for l in m..=l_max {
                p[tri_index(l, m)] = s * q[tri_index(l, m)];
            }
        }

        let mut dp = vec![0.0; len];
        let mut mq = vec![0.0; len];
        for l in 1..=l_max {
            dp[tri_index(l, 0)] = -((l * (l + 1)) as f64).sqrt() * p[tri_index(l, 1)];
            for m in 1..=l {
                let lower = if l > m {
                    let c = ((2 * l + 1) * (l * l - m * m)) as f64 / (2 * l - 1) as f64;
                    c.sqrt() * q[tri_index(l - 1, m)]
                } else {
                    0.0
                };
                dp[tri_index(l, m)] = l as f64 * x * q[tri_index(l, m)] - lower;
                mq[tri_index(l, m)] = m as f64 * q[tri_index(l, m)];
            }
        }

        Self { p, dp, mq }
    }
}

/// 全部余纬节点上的 Legendre 表
#[derive(Debug, Clone)]
pub struct LegendreTable {
    l_max: usize,
    columns: Vec<LegendreColumn>,
}

impl LegendreTable {
    /// 在给定 `cosθ` / `sinθ` 节点上建表
    pub fn new(l_max: usize, cos_theta: &[f64], sin_theta: &[f64]) -> Self {
        let columns = cos_theta
            .iter()
            .zip(sin_theta)
            .map(|(&x, &s)| LegendreColumn::new(l_max, x, s))
            .collect();
        Self { l_max, columns }
    }

    /// 最大阶 ℓ
    #[inline]
    pub fn l_max(&self) -> usize {
        self.l_max
    }

    /// 第 i 个节点
    #[inline]
    pub fn column(&self, i: usize) -> &LegendreColumn {
        &self.columns[i]
    }
}
