// crates/ob_spectral/src/basis/mod.rs

//! 基函数层
//!
//! - [`chebyshev`]: 径向 Chebyshev 基、奇偶压缩与精确径向算子
//! - [`legendre`]: Gauss-Legendre 求积与归一化连带 Legendre 表

pub mod chebyshev;
pub mod legendre;

pub use legendre::{gauss_legendre, tri_index, tri_len, LegendreColumn, LegendreTable};

/// `1/√π`
pub const INV_SQRT_PI: f64 = 0.564_189_583_547_756_3;
/// `1/√(2π)`
pub const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
