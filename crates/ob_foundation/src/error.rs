// crates/ob_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `ObError` 枚举和 `ObResult` 类型别名。数值层（变换、算子、
//! Helmholtz 求解）的失败都归入此类型，工作流层再在其上包装。
//!
//! # 示例
//!
//! ```
//! use ob_foundation::error::{ObError, ObResult};
//!
//! fn check_order(order: usize) -> ObResult<()> {
//!     ob_foundation::ensure!(order >= 2, ObError::invalid_input("order 太小"));
//!     Ok(())
//! }
//!
//! assert!(check_order(8).is_ok());
//! assert!(check_order(1).is_err());
//! ```

use crate::index::ModeIndex;
use thiserror::Error;

/// 统一结果类型
pub type ObResult<T> = Result<T, ObError>;

/// OrbSpectral 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObError {
    // ========================================================================
    // 数值错误
    // ========================================================================
    /// 系数尾部衰减不足，当前阶数无法分辨该场
    #[error("分辨率不足: {axis} 方向尾部/峰值比 {ratio:.3e} 超过容差 {tolerance:.3e}")]
    BasisResolution {
        /// 出问题的方向（radial / angular）
        axis: &'static str,
        /// 尾部与峰值系数幅值之比
        ratio: f64,
        /// 允许的比值上限
        tolerance: f64,
    },

    /// 某些 (ℓ, m) 模态的径向方程奇异或严重病态
    #[error("线性系统奇异: {} 个模态无法求解 (首个: {})", .modes.len(), first_mode(.modes))]
    SingularSystem {
        /// 失败的模态列表
        modes: Vec<ModeIndex>,
    },

    /// 边界数据非法（尺寸错误、非有限值等）
    #[error("无效的边界条件: {message}")]
    InvalidBoundaryCondition {
        /// 具体原因
        message: String,
    },

    // ========================================================================
    // 输入错误
    // ========================================================================
    /// 两个场定义在不同网格上
    #[error("网格不一致: {message}")]
    GridMismatch {
        /// 具体原因
        message: String,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 求值点位于单位球之外
    #[error("点位于单位球之外: 半径 {radius}")]
    OutOfDomain {
        /// 求值点半径
        radius: f64,
    },

    // ========================================================================
    // 配置与内部错误
    // ========================================================================
    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 内部错误
    #[error("内部错误: {message}")]
    Internal {
        /// 内部错误描述
        message: String,
    },
}

fn first_mode(modes: &[ModeIndex]) -> String {
    modes
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "-".to_string())
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl ObError {
    /// 分辨率不足
    pub fn basis_resolution(axis: &'static str, ratio: f64, tolerance: f64) -> Self {
        Self::BasisResolution {
            axis,
            ratio,
            tolerance,
        }
    }

    /// 奇异系统
    pub fn singular(modes: Vec<ModeIndex>) -> Self {
        Self::SingularSystem { modes }
    }

    /// 无效边界条件
    pub fn invalid_boundary(message: impl Into<String>) -> Self {
        Self::InvalidBoundaryCondition {
            message: message.into(),
        }
    }

    /// 网格不一致
    pub fn grid_mismatch(message: impl Into<String>) -> Self {
        Self::GridMismatch {
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 超出定义域
    pub fn out_of_domain(radius: f64) -> Self {
        Self::OutOfDomain { radius }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// 是否为奇异系统错误
    pub fn is_singular(&self) -> bool {
        matches!(self, Self::SingularSystem { .. })
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl ObError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> ObResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否为有限数
    #[inline]
    pub fn check_finite(name: &str, value: f64) -> ObResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self::invalid_input(format!("{name} 不是有限值: {value}")))
        }
    }
}

/// 条件不满足时提前返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

/// 解包 `Option`，为 `None` 时提前返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err.into()),
        }
    };
}

// ========================================================================
// 测试
// ========================================================================
