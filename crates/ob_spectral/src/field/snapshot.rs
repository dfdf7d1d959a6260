// crates/ob_spectral/src/field/snapshot.rs

//! 场的可序列化快照
//!
//! 只记录网格参数与系数矩阵，恢复时由调用方提供（或按
//! [`FieldSnapshot::grid_config`] 重建）网格。不涉及文件 I/O。

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use ob_config::GridConfig;
use ob_foundation::{ensure, ObError, ObResult};

/// 快照所属场的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// 一个系数矩阵
    Scalar,
    /// 三个系数矩阵 (a, b, c)
    Vector,
}

impl FieldKind {
    fn component_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector => 3,
        }
    }
}

/// 系数快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    /// 场种类
    pub kind: FieldKind,
    /// 网格阶数
    pub order: usize,
    /// 去混叠因子
    pub dealias: f64,
    /// 模拟时间
    #[serde(default)]
    pub time: f64,
    /// 系数矩阵
    pub components: Vec<Array2<f64>>,
}

impl FieldSnapshot {
    pub(crate) fn new(kind: FieldKind, config: &GridConfig, components: Vec<Array2<f64>>) -> Self {
        Self {
            kind,
            order: config.order,
            dealias: config.dealias,
            time: 0.0,
            components,
        }
    }

    /// 附加模拟时间
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    /// 重建网格所需的配置
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            order: self.order,
            dealias: self.dealias,
        }
    }

    /// 检查与目标网格及场种类一致
    pub(crate) fn check(&self, grid: &Grid, kind: FieldKind) -> ObResult<()> {
        ensure!(
            self.kind == kind,
            ObError::invalid_input(format!("快照种类为 {:?}，期望 {:?}", self.kind, kind))
        );
        ensure!(
            self.grid_config() == *grid.config(),
            ObError::grid_mismatch(format!(
                "快照 order {} / dealias {}，网格 order {} / dealias {}",
                self.order,
                self.dealias,
                grid.order(),
                grid.config().dealias
            ))
        );
        ObError::check_size("snapshot.components", kind.component_count(), self.components.len())
    }
}
