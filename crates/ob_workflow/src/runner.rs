// crates/ob_workflow/src/runner.rs

//! 运行控制
//!
//! 取消标志、墙钟预算与运行进度。求解内部不可中断，检查只发生在步与步之间。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use ob_config::{ConfigError, DriverConfig};
use ob_foundation::ObError;

/// 运行器错误
#[derive(Debug, Error)]
pub enum RunnerError {
    /// 数值层错误
    #[error("Solver error: {0}")]
    Solver(#[from] ObError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 取消
    #[error("Run was cancelled after {0} steps")]
    Cancelled(usize),

    /// 超出墙钟预算
    #[error("Run exceeded wall-clock budget of {0} seconds")]
    Timeout(f64),
}

/// 可跨线程共享的取消标志
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// 创建未取消的标志
    pub fn new() -> Self {
        Self::default()
    }

    /// 请求取消
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// 单步报告，交给观察者回调
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// 已完成步数
    pub step: usize,
    /// 模拟时间
    pub time: f64,
    /// 浓度场 L² 范数
    pub norm: f64,
    /// 本次运行已用墙钟时间 [s]
    pub elapsed: f64,
}

/// 运行汇总
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// 本次运行完成的步数
    pub steps: usize,
    /// 结束时的模拟时间
    pub final_time: f64,
    /// 起始范数
    pub initial_norm: f64,
    /// 结束范数
    pub final_norm: f64,
    /// 运行中出现的最大范数
    pub max_norm: f64,
    /// 墙钟时间 [s]
    pub elapsed: f64,
}

/// 运行上下文
pub struct RunContext {
    token: CancellationToken,
    budget: Option<Duration>,
    start_time: Instant,
    t_end: f64,
    /// 当前模拟时间
    current_time: RwLock<f64>,
    /// 已完成步数
    completed_steps: RwLock<usize>,
}

impl RunContext {
    /// 创建运行上下文
    pub fn new(config: &DriverConfig, start_time: f64, token: CancellationToken) -> Self {
        Self {
            token,
            budget: config
                .wall_clock_budget_secs
                .and_then(|s| Duration::try_from_secs_f64(s).ok()),
            start_time: Instant::now(),
            t_end: config.t_end,
            current_time: RwLock::new(start_time),
            completed_steps: RwLock::new(0),
        }
    }

    /// 是否已取消
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 获取当前模拟时间
    pub fn current_time(&self) -> f64 {
        *self.current_time.read()
    }

    /// 更新当前模拟时间
    pub fn set_current_time(&self, time: f64) {
        *self.current_time.write() = time;
    }

    /// 获取已完成步数
    pub fn completed_steps(&self) -> usize {
        *self.completed_steps.read()
    }

    /// 增加步数
    pub fn increment_steps(&self, count: usize) {
        *self.completed_steps.write() += count;
    }

    /// 获取运行时长
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 进度 (0.0-1.0)
    pub fn progress(&self) -> f64 {
        if self.t_end > 0.0 {
            (self.current_time() / self.t_end).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// 步前检查：取消与墙钟预算
    pub fn check(&self) -> Result<(), RunnerError> {
        if self.is_cancelled() {
            return Err(RunnerError::Cancelled(self.completed_steps()));
        }
        if let Some(budget) = self.budget {
            if self.elapsed() > budget {
                return Err(RunnerError::Timeout(budget.as_secs_f64()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let ctx = RunContext::new(&DriverConfig::default(), 0.0, token.clone());
        assert!(ctx.check().is_ok());
        token.cancel();
        assert!(matches!(ctx.check(), Err(RunnerError::Cancelled(0))));
    }

    #[test]
    fn test_budget_exceeded() {
        let config = DriverConfig {
            wall_clock_budget_secs: Some(1e-9),
            ..DriverConfig::default()
        };
        let ctx = RunContext::new(&config, 0.0, CancellationToken::new());
        std::thread::sleep(Duration::from_millis(2));
        assert!(matches!(ctx.check(), Err(RunnerError::Timeout(_))));
    }

    #[test]
    fn test_progress() {
        let ctx = RunContext::new(&DriverConfig::default(), 0.0, CancellationToken::new());
        ctx.set_current_time(5.0);
        ctx.increment_steps(250);
        assert!((ctx.progress() - 0.5).abs() < 1e-15);
        assert_eq!(ctx.completed_steps(), 250);
    }

    #[test]
    fn test_report_serializes() {
        let report = StepReport {
            step: 3,
            time: 0.15,
            norm: 0.2,
            elapsed: 0.01,
        };
        let json = serde_json::to_string(&report).unwrap();
        let back: StepReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
