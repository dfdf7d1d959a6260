// crates/ob_spectral/src/linalg/banded.rs

//! 带状径向系统的行包络存储与 LU 分解
//!
//! 每个 ℓ 的 tau 系统前 N−1 行是窄带（紧凑下标中每行只有列 `i−1..=i+3`），
//! 末行是稠密的边界行。按行包络存储：每行只保存从首个非零列到末个非零列
//! 的连续片段，带状行的长度不超过 5，边界行长度为 N。
//!
//! 分解是带部分主元的行消元。第 j 步的候选行只有包络起点恰为 j 的行
//! （至多两条带状行加边界行），消元后的行起点移到 j+1。带状部分的填充
//! 被限制在带宽内，整体代价 O(N²)，不再形成 N×N 稠密矩阵。
//!
//! 分解前做行、列平衡缩放，分解后用 `‖A‖₁ · est‖A⁻¹‖₁` 估计条件数，
//! 倒数低于阈值即判为奇异。同一分解服务于该 ℓ 的全部 `2ℓ+1` 个 m。

use nalgebra::{ComplexField, DMatrix};

/// 单行包络：列 `start..start + values.len()` 的值
#[derive(Debug, Clone, PartialEq)]
struct EnvelopeRow<T> {
    start: usize,
    values: Vec<T>,
}

impl<T> EnvelopeRow<T>
where
    T: ComplexField<RealField = f64> + Copy,
{
    #[inline]
    fn end(&self) -> usize {
        self.start + self.values.len()
    }

    fn get(&self, col: usize) -> T {
        if col >= self.start && col < self.end() {
            self.values[col - self.start]
        } else {
            T::from_real(0.0)
        }
    }

    fn peak(&self) -> f64 {
        self.values.iter().map(|v| v.modulus()).fold(0.0, f64::max)
    }
}

/// 行包络存储的方阵
#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeMatrix<T> {
    n: usize,
    rows: Vec<EnvelopeRow<T>>,
}

impl<T> EnvelopeMatrix<T>
where
    T: ComplexField<RealField = f64> + Copy,
{
    /// 由 n 行 `(起始列, 连续值)` 构造
    ///
    /// # Panics
    /// - 行数不等于 `n`，或某行越过第 n 列
    pub fn from_rows(n: usize, rows: Vec<(usize, Vec<T>)>) -> Self {
        assert_eq!(rows.len(), n, "行数必须等于矩阵阶数");
        let rows: Vec<EnvelopeRow<T>> = rows
            .into_iter()
            .map(|(start, values)| EnvelopeRow { start, values })
            .collect();
        assert!(rows.iter().all(|r| r.end() <= n), "行包络越界");
        Self { n, rows }
    }

    /// 获取 (row, col) 位置的值（包络外为 0）
    #[cfg(test)]
    pub(crate) fn get(&self, row: usize, col: usize) -> T {
        self.rows[row].get(col)
    }

    /// 矩阵乘多列 `A X`
    pub fn mul_mat(&self, x: &DMatrix<T>) -> DMatrix<T> {
        let mut out = DMatrix::from_element(self.n, x.ncols(), T::from_real(0.0));
        for (i, row) in self.rows.iter().enumerate() {
            for c in 0..x.ncols() {
                let mut sum = T::from_real(0.0);
                for (k, &v) in row.values.iter().enumerate() {
                    sum += v * x[(row.start + k, c)];
                }
                out[(i, c)] = sum;
            }
        }
        out
    }

    /// 最大元素模
    pub fn max_abs(&self) -> f64 {
        self.rows.iter().map(EnvelopeRow::peak).fold(0.0, f64::max)
    }
}

/// 单个径向系统的分解结果
#[derive(Debug, Clone)]
pub struct BandedFactor<T> {
    n: usize,
    row_scale: Vec<f64>,
    col_scale: Vec<f64>,
    /// 第 j 步的主元行（原行号）
    pivots: Vec<usize>,
    /// 第 j 步的消元 `(目标行, 乘子)`
    eliminations: Vec<Vec<(usize, T)>>,
    /// U 的第 j 行，自第 j 列起
    upper: Vec<Vec<T>>,
    rcond: f64,
    singular: bool,
}

impl<T> BandedFactor<T>
where
    T: ComplexField<RealField = f64> + Copy,
{
    /// 平衡缩放后分解
    ///
    /// `tolerance` 为条件数倒数的下限。
    pub fn new(matrix: &EnvelopeMatrix<T>, tolerance: f64) -> Self {
        let n = matrix.n;
        let mut rows = matrix.rows.clone();

        let mut row_scale = vec![1.0; n];
        for (row, scale) in rows.iter_mut().zip(row_scale.iter_mut()) {
            let peak = row.peak();
            if peak > 0.0 && peak.is_finite() {
                *scale = 1.0 / peak;
                let s = T::from_real(*scale);
                row.values.iter_mut().for_each(|v| *v *= s);
            }
        }

        let mut col_peak = vec![0.0_f64; n];
        for row in &rows {
            for (k, v) in row.values.iter().enumerate() {
                let c = row.start + k;
                col_peak[c] = col_peak[c].max(v.modulus());
            }
        }
        let col_scale: Vec<f64> = col_peak
            .iter()
            .map(|&p| if p > 0.0 && p.is_finite() { 1.0 / p } else { 1.0 })
            .collect();
        let mut col_sum = vec![0.0_f64; n];
        for row in rows.iter_mut() {
            for (k, v) in row.values.iter_mut().enumerate() {
                let c = row.start + k;
                *v *= T::from_real(col_scale[c]);
                col_sum[c] += v.modulus();
            }
        }
        let norm1 = col_sum.iter().copied().fold(0.0, f64::max);

        let mut factor = Self {
            n,
            row_scale,
            col_scale,
            pivots: Vec::with_capacity(n),
            eliminations: Vec::with_capacity(n),
            upper: Vec::with_capacity(n),
            rcond: 0.0,
            singular: true,
        };

        if !factor.eliminate(rows) {
            return factor;
        }
        factor.singular = false;

        let inverse_norm = factor.estimate_inverse_norm();
        factor.rcond = if inverse_norm.is_finite() && inverse_norm > 0.0 && norm1 > 0.0 {
            1.0 / (norm1 * inverse_norm)
        } else {
            0.0
        };
        factor.singular = factor.rcond < tolerance;
        factor
    }

    /// 部分主元消元，遇到零主元返回 `false`
    fn eliminate(&mut self, rows: Vec<EnvelopeRow<T>>) -> bool {
        let n = self.n;
        let mut active: Vec<Option<EnvelopeRow<T>>> = Vec::with_capacity(n);
        // 按包络起点分桶
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, row) in rows.into_iter().enumerate() {
            if row.values.is_empty() || row.start >= n {
                return false;
            }
            buckets[row.start].push(i);
            active.push(Some(row));
        }

        for j in 0..n {
            let candidates = std::mem::take(&mut buckets[j]);
            let pivot = candidates
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    let va = leading(&active[a]);
                    let vb = leading(&active[b]);
                    va.total_cmp(&vb)
                });
            let Some(p) = pivot else {
                return false;
            };
            let Some(pivot_row) = active[p].take() else {
                return false;
            };
            let head = pivot_row.values[0];
            if !(head.modulus() > 0.0) {
                return false;
            }

            let mut steps = Vec::with_capacity(candidates.len().saturating_sub(1));
            for &r in candidates.iter().filter(|&&r| r != p) {
                let Some(row) = active[r].take() else {
                    return false;
                };
                let l = row.values[0] / head;
                let end = row.end().max(pivot_row.end());
                let values: Vec<T> = (j + 1..end)
                    .map(|c| row.get(c) - l * pivot_row.get(c))
                    .collect();
                steps.push((r, l));
                if values.is_empty() {
                    return false;
                }
                buckets[j + 1].push(r);
                active[r] = Some(EnvelopeRow {
                    start: j + 1,
                    values,
                });
            }

            self.pivots.push(p);
            self.eliminations.push(steps);
            self.upper.push(pivot_row.values);
        }
        true
    }

    /// 是否奇异
    #[inline]
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// 条件数倒数估计
    #[inline]
    pub fn rcond(&self) -> f64 {
        self.rcond
    }

    /// 求解 A X = B（B 的每一列为一个右端项）
    ///
    /// 奇异分解或解含非有限值时返回 `None`。
    pub fn solve(&self, rhs: &DMatrix<T>) -> Option<DMatrix<T>> {
        if self.singular || rhs.nrows() != self.n {
            return None;
        }
        let mut b = rhs.clone();
        for (i, &s) in self.row_scale.iter().enumerate() {
            let s = T::from_real(s);
            b.row_mut(i).iter_mut().for_each(|v| *v *= s);
        }
        let mut x = self.solve_scaled(b);
        for (i, &s) in self.col_scale.iter().enumerate() {
            let s = T::from_real(s);
            x.row_mut(i).iter_mut().for_each(|v| *v *= s);
        }
        x.iter().all(|v| v.modulus().is_finite()).then_some(x)
    }

    /// 在缩放后的系统上做前代与回代
    fn solve_scaled(&self, mut b: DMatrix<T>) -> DMatrix<T> {
        let n = self.n;
        let ncols = b.ncols();
        for (j, steps) in self.eliminations.iter().enumerate() {
            let p = self.pivots[j];
            for &(r, l) in steps {
                for c in 0..ncols {
                    let bp = b[(p, c)];
                    b[(r, c)] -= l * bp;
                }
            }
        }

        let mut y = DMatrix::from_element(n, ncols, T::from_real(0.0));
        for j in (0..n).rev() {
            let u = &self.upper[j];
            let p = self.pivots[j];
            for c in 0..ncols {
                let mut sum = b[(p, c)];
                for (k, &v) in u.iter().enumerate().skip(1) {
                    sum -= v * y[(j + k, c)];
                }
                y[(j, c)] = sum / u[0];
            }
        }
        y
    }

    /// 用三个试探右端项估计缩放后系统的 `‖A⁻¹‖₁`
    fn estimate_inverse_norm(&self) -> f64 {
        let n = self.n;
        let trials = DMatrix::from_fn(n, 3, |i, k| {
            T::from_real(match k {
                0 => 1.0,
                1 => {
                    if i % 2 == 0 {
                        1.0
                    } else {
                        -1.0
                    }
                }
                _ => (i + 1) as f64 / n as f64,
            })
        });
        let x = self.solve_scaled(trials.clone());
        let mut estimate: f64 = 0.0;
        for k in 0..3 {
            let b_norm: f64 = trials.column(k).iter().map(|v| v.modulus()).sum();
            let x_norm: f64 = x.column(k).iter().map(|v| v.modulus()).sum();
            if !x_norm.is_finite() {
                return f64::INFINITY;
            }
            estimate = estimate.max(x_norm / b_norm);
        }
        estimate
    }
}

fn leading<T>(row: &Option<EnvelopeRow<T>>) -> f64
where
    T: ComplexField<RealField = f64> + Copy,
{
    row.as_ref()
        .and_then(|r| r.values.first())
        .map_or(0.0, |v| v.modulus())
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    /// 三对角带状行加稠密末行
    fn bordered(n: usize) -> EnvelopeMatrix<f64> {
        let mut rows: Vec<(usize, Vec<f64>)> = (0..n - 1)
            .map(|i| {
                let start = i.saturating_sub(1);
                let end = (i + 3).min(n);
                let values = (start..end)
                    .map(|j| if j == i { 4.0 } else { 1.0 / (1.0 + i as f64 + j as f64) })
                    .collect();
                (start, values)
            })
            .collect();
        rows.push((0, (0..n).map(|k| ((k * k) as f64).max(1.0)).collect()));
        EnvelopeMatrix::from_rows(n, rows)
    }

    fn dense(a: &EnvelopeMatrix<f64>) -> DMatrix<f64> {
        DMatrix::from_fn(a.n, a.n, |i, j| a.get(i, j))
    }

    #[test]
    fn test_bordered_solve_matches_dense() {
        let a = bordered(12);
        let factor = BandedFactor::new(&a, 1e-12);
        assert!(!factor.is_singular());
        assert!(factor.rcond() > 1e-10);

        let b = DMatrix::from_fn(12, 3, |i, k| ((i + 2 * k) as f64).sin());
        let x = factor.solve(&b).unwrap();
        let residual = &dense(&a) * &x - &b;
        assert!(residual.iter().all(|v| v.abs() < 1e-11));
        assert!((a.mul_mat(&x) - &b).iter().all(|v| v.abs() < 1e-11));
        assert_eq!(a.rows[11].values.len(), 12);
        assert!(a.rows[5].values.len() <= 4);
    }

    #[test]
    fn test_pivoting_on_zero_diagonal() {
        // 首列只有第二行非零，需要换行
        let a = EnvelopeMatrix::from_rows(
            3,
            vec![(1, vec![2.0, 1.0]), (0, vec![3.0, 1.0]), (0, vec![1.0, 1.0, 1.0])],
        );
        let factor = BandedFactor::new(&a, 1e-12);
        let b = DMatrix::from_column_slice(3, 1, &[3.0, 4.0, 3.0]);
        let x = factor.solve(&b).unwrap();
        assert!((a.mul_mat(&x) - b).iter().all(|v| v.abs() < 1e-13));
        assert!((x[(0, 0)] - 1.0).abs() < 1e-13);
    }

    #[test]
    fn test_singular_detection() {
        let a = EnvelopeMatrix::from_rows(2, vec![(0, vec![1.0, 2.0]), (0, vec![2.0, 4.0])]);
        let factor = BandedFactor::new(&a, 1e-12);
        assert!(factor.is_singular());
        assert!(factor.solve(&DMatrix::from_element(2, 1, 1.0)).is_none());

        let near = EnvelopeMatrix::from_rows(
            2,
            vec![(0, vec![1.0, 1.0]), (0, vec![1.0, 1.0 + 1e-15])],
        );
        let factor = BandedFactor::new(&near, 1e-10);
        assert!(factor.is_singular());
        assert!(factor.rcond() < 1e-10);
    }

    #[test]
    fn test_structurally_empty_column_is_singular() {
        let a = EnvelopeMatrix::from_rows(3, vec![(0, vec![1.0]), (2, vec![1.0]), (2, vec![3.0])]);
        assert!(BandedFactor::new(&a, 1e-12).is_singular());
    }

    #[test]
    fn test_complex_solve() {
        let i = Complex64::new(0.0, 1.0);
        let one = Complex64::new(1.0, 0.0);
        let a = EnvelopeMatrix::from_rows(
            3,
            vec![
                (0, vec![one + i, one]),
                (0, vec![-one, 2.0 * one, i]),
                (0, vec![one, one, one]),
            ],
        );
        let factor = BandedFactor::new(&a, 1e-12);
        let b = DMatrix::from_column_slice(3, 1, &[one, i, 2.0 * one]);
        let x = factor.solve(&b).unwrap();
        assert!((a.mul_mat(&x) - b).iter().all(|v| v.norm() < 1e-12));
    }
}
