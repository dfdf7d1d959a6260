// crates/ob_spectral/src/linalg/mod.rs

//! 线性代数模块
//!
//! - [`csr`]: 压缩稀疏行矩阵，存放按列组装的带状径向算子
//! - [`banded`]: 每个 ℓ 的径向系统的行包络存储与带状 LU，含平衡缩放与奇异判定
//! - [`vector_ops`]: BLAS Level 1 风格的向量运算

pub mod banded;
pub mod csr;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, RowView};
pub use banded::{BandedFactor, EnvelopeMatrix};
pub use vector_ops::{axpy, dot, quadratic_form};
