// crates/ob_config/src/driver_config.rs

//! DriverConfig - 平流扩散时间推进参数

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::solve_config::SolveConfig;

/// 时间推进配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// 扩散系数 D
    #[serde(default = "default_diffusivity")]
    pub diffusivity: f64,

    /// 时间步长 Δt
    #[serde(default = "default_dt")]
    pub dt: f64,

    /// 终止时间 T
    #[serde(default = "default_t_end")]
    pub t_end: f64,

    /// 每隔多少步回调一次观察者（0 表示只在结束时回调）
    #[serde(default = "default_report_interval")]
    pub report_interval: usize,

    /// 墙钟时间预算 [s]，超出后在步间停止
    #[serde(default)]
    pub wall_clock_budget_secs: Option<f64>,

    /// 每步结束后截断系数的相对阈值（相对最大系数模），0 表示不截断
    #[serde(default = "default_chop_tolerance")]
    pub chop_tolerance: f64,

    /// 每步 Helmholtz 求解配置（边界类型由驱动强制为 Neumann）
    #[serde(default)]
    pub solve: SolveConfig,
}

fn default_diffusivity() -> f64 { 0.1 }
fn default_dt() -> f64 { 0.02 }
fn default_t_end() -> f64 { 10.0 }
fn default_report_interval() -> usize { 10 }
fn default_chop_tolerance() -> f64 { 1e-13 }

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            diffusivity: default_diffusivity(),
            dt: default_dt(),
            t_end: default_t_end(),
            report_interval: default_report_interval(),
            wall_clock_budget_secs: None,
            chop_tolerance: default_chop_tolerance(),
            solve: SolveConfig::default(),
        }
    }
}

impl DriverConfig {
    /// 指定核心物理参数，其余取默认值
    pub fn new(diffusivity: f64, dt: f64, t_end: f64, order: usize) -> Self {
        let mut config = Self {
            diffusivity,
            dt,
            t_end,
            ..Self::default()
        };
        config.solve.order = order;
        config
    }

    /// 总步数 `round(T / Δt)`
    pub fn total_steps(&self) -> usize {
        (self.t_end / self.dt).round() as usize
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.diffusivity > 0.0 && self.diffusivity.is_finite()) {
            return Err(ConfigError::invalid("diffusivity", self.diffusivity, "扩散系数必须为正"));
        }
        if !(self.dt > 0.0 && self.dt.is_finite()) {
            return Err(ConfigError::invalid("dt", self.dt, "时间步长必须为正"));
        }
        if !(self.t_end >= self.dt && self.t_end.is_finite()) {
            return Err(ConfigError::invalid("t_end", self.t_end, "终止时间必须 ≥ dt"));
        }
        if let Some(budget) = self.wall_clock_budget_secs {
            if !(budget > 0.0) {
                return Err(ConfigError::invalid(
                    "wall_clock_budget_secs",
                    budget,
                    "墙钟预算必须为正",
                ));
            }
        }
        if !(self.chop_tolerance >= 0.0 && self.chop_tolerance < 1.0) {
            return Err(ConfigError::invalid(
                "chop_tolerance",
                self.chop_tolerance,
                "截断阈值必须在 [0, 1) 内",
            ));
        }
        self.solve.validate()
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: DriverConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// 序列化为 JSON 字符串
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
