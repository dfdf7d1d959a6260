// crates/ob_foundation/src/lib.rs

//! OrbSpectral Foundation Layer
//!
//! 球域谱方法求解器的基础层，为上层 crate 提供共用抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `ObError` 与 `ensure!`/`require!` 宏
//! - [`index`]: 球谐模态 (ℓ, m) 的强类型索引与紧凑编号
//!
//! # 示例
//!
//! ```
//! use ob_foundation::{ModeIndex, ObError, ObResult};
//!
//! fn degree_of(packed: usize) -> ObResult<usize> {
//!     Ok(ModeIndex::from_packed(packed).l)
//! }
//!
//! assert_eq!(degree_of(5).unwrap(), 2);
//! let err = ObError::invalid_input("order 必须 ≥ 2");
//! assert!(err.to_string().contains("order"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;

// 重导出常用类型
pub use error::{ObError, ObResult};
pub use index::{mode_count, modes, packed_index, ModeIndex};
