// crates/ob_config/src/solve_config.rs

//! SolveConfig - Helmholtz 求解与网格配置
//!
//! 每次顶层调用显式传入，不存在全局默认状态。

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// r = 1 处的边界条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
    /// 给定边界值 u(1, θ, φ)
    #[default]
    Dirichlet,
    /// 给定法向导数 ∂u/∂r(1, θ, φ)
    Neumann,
}

/// 单个模态求解失败时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// 任一模态失败即整体返回错误
    #[default]
    Strict,
    /// 失败模态置零并在结果中列出
    Permissive,
}

/// 分辨率检查未通过时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPolicy {
    /// 不检查
    Ignore,
    /// 记录警告后继续
    #[default]
    Warn,
    /// 返回 `BasisResolution` 错误
    Reject,
}

/// 网格配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// 每个角向模态的径向模态数 N，最大球谐阶 L = N - 1
    #[serde(default = "default_order")]
    pub order: usize,

    /// 物理网格相对模态数的放大因子
    #[serde(default = "default_dealias")]
    pub dealias: f64,
}

fn default_order() -> usize { 16 }
fn default_dealias() -> f64 { 1.5 }
fn default_tolerance() -> f64 { 1e-6 }
fn default_singular_tolerance() -> f64 { 1e-12 }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            dealias: default_dealias(),
        }
    }
}

impl GridConfig {
    /// 指定阶数，其余取默认值
    pub fn with_order(order: usize) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.order < 2 {
            return Err(ConfigError::invalid("order", self.order, "阶数必须 ≥ 2"));
        }
        if !self.dealias.is_finite() || self.dealias < 1.0 {
            return Err(ConfigError::invalid("dealias", self.dealias, "去混叠因子必须 ≥ 1"));
        }
        Ok(())
    }
}

/// Helmholtz 求解配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveConfig {
    /// 径向阶数 N
    #[serde(default = "default_order")]
    pub order: usize,

    /// 边界条件类型
    #[serde(default)]
    pub boundary_type: BoundaryType,

    /// 分辨率检查容差（尾部/峰值比）
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// 模态失败处理方式
    #[serde(default)]
    pub failure_mode: FailureMode,

    /// 分辨率检查策略
    #[serde(default)]
    pub resolution_policy: ResolutionPolicy,

    /// 奇异判定阈值（主元比 / 条件数倒数）
    #[serde(default = "default_singular_tolerance")]
    pub singular_tolerance: f64,

    /// 去混叠因子
    #[serde(default = "default_dealias")]
    pub dealias: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            boundary_type: BoundaryType::default(),
            tolerance: default_tolerance(),
            failure_mode: FailureMode::default(),
            resolution_policy: ResolutionPolicy::default(),
            singular_tolerance: default_singular_tolerance(),
            dealias: default_dealias(),
        }
    }
}

impl SolveConfig {
    /// 指定阶数与边界类型，其余取默认值
    pub fn new(order: usize, boundary_type: BoundaryType) -> Self {
        Self {
            order,
            boundary_type,
            ..Self::default()
        }
    }

    /// 设置失败处理方式
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    /// 设置分辨率策略
    pub fn with_resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.resolution_policy = policy;
        self
    }

    /// 对应的网格配置
    pub fn grid_config(&self) -> GridConfig {
        GridConfig {
            order: self.order,
            dealias: self.dealias,
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid_config().validate()?;

        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(ConfigError::invalid("tolerance", self.tolerance, "容差必须为正"));
        }

        if !(self.singular_tolerance > 0.0 && self.singular_tolerance < 1.0) {
            return Err(ConfigError::invalid(
                "singular_tolerance",
                self.singular_tolerance,
                "奇异阈值必须在 (0, 1) 范围内",
            ));
        }

        Ok(())
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SolveConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为 JSON 字符串
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
