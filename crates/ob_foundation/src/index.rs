// crates/ob_foundation/src/index.rs

//! 球谐模态索引
//!
//! 实球谐函数按 (ℓ, m) 编号，`m ∈ [-ℓ, ℓ]`。系数张量按紧凑编号
//! `ℓ² + ℓ + m` 存储，因此 `|m| > ℓ` 的槽位在类型层面不存在。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 球谐模态 (ℓ, m)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModeIndex {
    /// 球谐阶 ℓ
    pub l: usize,
    /// 球谐序 m，满足 |m| ≤ ℓ
    pub m: i64,
}

impl ModeIndex {
    /// 创建模态索引
    ///
    /// 调用方保证 `|m| <= l`。
    #[inline]
    pub const fn new(l: usize, m: i64) -> Self {
        Self { l, m }
    }

    /// 由紧凑编号还原 (ℓ, m)
    #[inline]
    pub fn from_packed(packed: usize) -> Self {
        let mut l = (packed as f64).sqrt() as usize;
        // 浮点开方可能差一
        while l * l > packed {
            l -= 1;
        }
        while (l + 1) * (l + 1) <= packed {
            l += 1;
        }
        let m = packed as i64 - (l * l + l) as i64;
        Self { l, m }
    }

    /// 紧凑编号 `ℓ² + ℓ + m`
    #[inline]
    pub fn packed(&self) -> usize {
        packed_index(self.l, self.m)
    }

    /// |m|
    #[inline]
    pub fn order_abs(&self) -> usize {
        self.m.unsigned_abs() as usize
    }

    /// ℓ(ℓ+1)
    #[inline]
    pub fn eigenvalue(&self) -> f64 {
        (self.l * (self.l + 1)) as f64
    }

    /// 是否满足 |m| ≤ ℓ
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.order_abs() <= self.l
    }
}

impl fmt::Display for ModeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.l, self.m)
    }
}

/// 紧凑编号 `ℓ² + ℓ + m`
#[inline]
pub fn packed_index(l: usize, m: i64) -> usize {
    ((l * l + l) as i64 + m) as usize
}

/// ℓ ≤ `l_max` 的模态总数 `(l_max + 1)²`
#[inline]
pub const fn mode_count(l_max: usize) -> usize {
    (l_max + 1) * (l_max + 1)
}

/// 遍历 ℓ ≤ `l_max` 的全部模态，按紧凑编号升序
pub fn modes(l_max: usize) -> impl Iterator<Item = ModeIndex> {
    (0..=l_max).flat_map(|l| (-(l as i64)..=l as i64).map(move |m| ModeIndex::new(l, m)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_roundtrip_covers_all_modes() {
        for (i, mode) in modes(12).enumerate() {
            assert_eq!(mode.packed(), i);
            assert_eq!(ModeIndex::from_packed(i), mode);
            assert!(mode.is_valid());
        }
        assert_eq!(modes(12).count(), mode_count(12));
    }

    #[test]
    fn test_eigenvalue() {
        assert_eq!(ModeIndex::new(3, -2).eigenvalue(), 12.0);
        assert_eq!(ModeIndex::new(0, 0).eigenvalue(), 0.0);
    }

    #[test]
    fn test_display() {
        assert_eq!(ModeIndex::new(4, -3).to_string(), "(4, -3)");
    }
}
