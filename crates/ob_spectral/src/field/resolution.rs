// crates/ob_spectral/src/field/resolution.rs

//! 分辨率检查
//!
//! 光滑场的谱系数应快速衰减。取最后一个径向模态与 ℓ = L 的全部系数，
//! 与系数峰值比较；比值超过容差说明当前阶数不足以分辨该场。

use ndarray::Array2;

use ob_config::ResolutionPolicy;
use ob_foundation::{ModeIndex, ObError, ObResult};

/// 尾部/峰值比
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionReport {
    /// 末位径向模态与峰值之比
    pub radial_ratio: f64,
    /// ℓ = L 模态与峰值之比
    pub angular_ratio: f64,
}

impl ResolutionReport {
    /// 由一组系数矩阵计算
    pub fn from_coefficients(arrays: &[&Array2<f64>], l_max: usize) -> Self {
        let mut peak: f64 = 0.0;
        let mut radial_tail: f64 = 0.0;
        let mut angular_tail: f64 = 0.0;

        for coeffs in arrays {
            let order = coeffs.ncols();
            for (idx, row) in coeffs.rows().into_iter().enumerate() {
                let row_peak = row.iter().map(|v| v.abs()).fold(0.0, f64::max);
                peak = peak.max(row_peak);
                if order > 0 {
                    radial_tail = radial_tail.max(row[order - 1].abs());
                }
                if ModeIndex::from_packed(idx).l == l_max {
                    angular_tail = angular_tail.max(row_peak);
                }
            }
        }

        if peak == 0.0 {
            return Self {
                radial_ratio: 0.0,
                angular_ratio: 0.0,
            };
        }
        Self {
            radial_ratio: radial_tail / peak,
            angular_ratio: angular_tail / peak,
        }
    }

    /// 两个方向都不超过容差
    pub fn is_resolved(&self, tolerance: f64) -> bool {
        self.radial_ratio <= tolerance && self.angular_ratio <= tolerance
    }

    /// 按策略处理
    pub fn enforce(&self, tolerance: f64, policy: ResolutionPolicy) -> ObResult<()> {
        if policy == ResolutionPolicy::Ignore {
            return Ok(());
        }
        for (axis, ratio) in [("radial", self.radial_ratio), ("angular", self.angular_ratio)] {
            if ratio > tolerance {
                match policy {
                    ResolutionPolicy::Reject => {
                        return Err(ObError::basis_resolution(axis, ratio, tolerance));
                    }
                    _ => log::warn!(
                        "分辨率不足: {} 尾部/峰值比 {:.3e} > {:.3e}",
                        axis,
                        ratio,
                        tolerance
                    ),
                }
            }
        }
        Ok(())
    }
}
