// crates/ob_spectral/src/linalg/vector_ops.rs

//! 向量运算（BLAS Level 1 风格）
//!
//! - [`dot`]: 点积 x·y
//! - [`axpy`]: y = α*x + y
//! - [`quadratic_form`]: Gram 矩阵二次型

/// 点积 x·y
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y.iter()).map(|(&xi, &yi)| xi * yi).sum()
}

/// AXPY: y = α*x + y
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// 二次型 xᵀ G x，G 为 n×n 行主序
#[inline]
pub fn quadratic_form(g: &[f64], x: &[f64]) -> f64 {
    let n = x.len();
    debug_assert_eq!(g.len(), n * n);
    x.iter()
        .enumerate()
        .map(|(i, &xi)| xi * dot(&g[i * n..(i + 1) * n], x))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_axpy() {
        let x = [1.0, 2.0, 3.0];
        let mut y = [4.0, 5.0, 6.0];
        assert_eq!(dot(&x, &y), 32.0);
        axpy(2.0, &x, &mut y);
        assert_eq!(y, [6.0, 9.0, 12.0]);
    }

    #[test]
    fn test_quadratic_form() {
        let g = [2.0, 1.0, 1.0, 3.0];
        assert_eq!(quadratic_form(&g, &[1.0, 2.0]), 2.0 + 2.0 + 2.0 + 12.0);
    }
}
