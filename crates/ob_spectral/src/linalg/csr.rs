// crates/ob_spectral/src/linalg/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! 径向 tau 算子在紧凑 Chebyshev 下标中是窄带矩阵，CSR 存储后
//! 按 ℓ 组合 `E0 − ℓ(ℓ+1)·S + K²·M` 时只需遍历非零元。
//!
//! # 格式说明
//!
//! - `row_ptr`: 行指针，长度 n_rows + 1
//! - `col_idx`: 列索引，与非零元一一对应，行内有序
//! - `values`: 非零元值
//!
//! # 使用示例
//!
//! ```
//! use ob_spectral::linalg::csr::CsrBuilder;
//!
//! let mut builder = CsrBuilder::new(2, 3);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 2, -1.0);
//! builder.set(1, 1, 2.0);
//! let matrix = builder.build();
//!
//! let y = matrix.mul_vec(&[1.0, 2.0, 3.0]);
//! assert_eq!(y, vec![1.0, 4.0]);
//! ```

use std::collections::BTreeMap;

/// CSR 格式稀疏矩阵
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 逐列组装
    ///
    /// `column(j)` 返回第 j 列的稠密值（长度 ≥ n_rows 时截断），
    /// 精确为零的元素不存储。
    pub fn from_columns<F>(n_rows: usize, n_cols: usize, mut column: F) -> Self
    where
        F: FnMut(usize) -> Vec<f64>,
    {
        let mut builder = CsrBuilder::new(n_rows, n_cols);
        for j in 0..n_cols {
            for (i, v) in column(j).into_iter().take(n_rows).enumerate() {
                if v != 0.0 {
                    builder.set(i, j, v);
                }
            }
        }
        builder.build()
    }

    /// 获取行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 获取列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 获取非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 获取 (row, col) 位置的值（如果不存在返回 0）
    #[cfg(test)]
    pub(crate) fn get(&self, row: usize, col: usize) -> f64 {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        match self.col_idx[start..end].binary_search(&col) {
            Ok(local) => self.values[start + local],
            Err(_) => 0.0,
        }
    }

    /// 获取第 row 行的非零元视图
    #[inline]
    pub fn row(&self, row: usize) -> RowView<'_> {
        let start = self.row_ptr[row];
        let end = self.row_ptr[row + 1];
        RowView {
            col_idx: &self.col_idx[start..end],
            values: &self.values[start..end],
        }
    }

    /// 矩阵-向量乘法 y = A * x
    ///
    /// # Panics
    /// - `x.len() != self.n_cols()`
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        assert_eq!(x.len(), self.n_cols, "x 长度必须等于矩阵列数");
        (0..self.n_rows)
            .map(|row| self.row(row).iter().map(|(col, v)| v * x[col]).sum())
            .collect()
    }

    /// 最大带宽 `max |i − j|`
    pub fn bandwidth(&self) -> usize {
        (0..self.n_rows)
            .flat_map(|row| self.row(row).col_indices().iter().map(move |&c| row.abs_diff(c)))
            .max()
            .unwrap_or(0)
    }
}

// =============================================================================
// 行视图辅助类型
// =============================================================================

/// 行视图：提供对矩阵某一行的非零元的只读访问
pub struct RowView<'a> {
    col_idx: &'a [usize],
    values: &'a [f64],
}

impl<'a> RowView<'a> {
    /// 获取列索引切片
    #[inline]
    pub fn col_indices(&self) -> &'a [usize] {
        self.col_idx
    }

    /// 迭代 (列索引, 值) 对
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.col_idx.iter().copied().zip(self.values.iter().copied())
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 使用 BTreeMap 临时存储，构建时转换为紧凑 CSR 格式。
pub struct CsrBuilder {
    n_rows: usize,
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 创建构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// - `row >= n_rows`
    /// - `col >= n_cols`
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.n_rows, "行索引越界");
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 获取当前非零元总数
    #[inline]
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// 构建 CSR 矩阵（消耗构建器）
    pub fn build(self) -> CsrMatrix {
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(self.n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        row_ptr.push(0);
        for row_map in self.rows {
            for (col, val) in row_map {
                col_idx.push(col);
                values.push(val);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix {
            n_rows: self.n_rows,
            n_cols: self.n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }
}
