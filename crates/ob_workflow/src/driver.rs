// crates/ob_workflow/src/driver.rs

//! 平流扩散时间推进
//!
//! 方程 `∂c/∂t + v·∇c = D∇²c`，扩散隐式、平流显式（IMEX-BDF1）：
//!
//! ```text
//! (c_{n+1} − c_n)/Δt = D∇²c_{n+1} − v·∇c_n
//! ⇔ ∇²c_{n+1} + K²c_{n+1} = K²c_n + (1/D) v·∇c_n,   K² = −1/(DΔt)
//! ```
//!
//! 每步一次 Helmholtz 求解，边界为齐次 Neumann（无通量）。K 在整个运行中
//! 不变，各 ℓ 系统只分解一次。求解后按 `chop_tolerance` 截断相对峰值过小的
//! 系数，否则舍入噪声会在显式平流下指数增长。

use std::sync::Arc;
use std::time::Instant;

use num_complex::Complex64;

use crate::runner::{CancellationToken, RunContext, RunSummary, RunnerError, StepReport};
use ob_config::{BoundaryType, DriverConfig};
use ob_foundation::{ObError, ObResult};
use ob_spectral::{
    curl, gradient, BoundaryData, FieldSnapshot, Grid, HelmholtzSolver, ScalarField, VectorField,
};

/// 速度场散度相对范数超过此值时给出警告
const DIVERGENCE_WARN_RATIO: f64 = 1e-8;

/// 平流扩散驱动
#[derive(Debug)]
pub struct AdvectionDiffusion {
    config: DriverConfig,
    grid: Arc<Grid>,
    velocity: VectorField,
    solver: HelmholtzSolver,
    k2: f64,
    state: ScalarField,
    time: f64,
    step: usize,
}

impl AdvectionDiffusion {
    /// 创建驱动
    ///
    /// 校验配置（`D > 0`、`Δt > 0`、`T ≥ Δt`），检查初值与速度场同网格，
    /// 并预先分解全部 Helmholtz 系统。
    pub fn new(
        config: DriverConfig,
        initial: ScalarField,
        velocity: VectorField,
    ) -> Result<Self, RunnerError> {
        config.validate()?;
        let grid = Arc::clone(initial.grid());
        grid.check_compatible(velocity.grid())?;

        let div = ob_spectral::divergence(&velocity).norm();
        if div > DIVERGENCE_WARN_RATIO * velocity.norm().max(1.0) {
            tracing::warn!("速度场非无散: ‖∇·v‖ = {:.3e}", div);
        }

        let mut solve = config.solve;
        solve.boundary_type = BoundaryType::Neumann;

        let k2 = -1.0 / (config.diffusivity * config.dt);
        let k = Complex64::new(0.0, (-k2).sqrt());
        let solver = HelmholtzSolver::prepare(&grid, k, &solve)?;

        tracing::info!(
            "平流扩散驱动: order={}, D={}, dt={}, T={}, K²={:.3e}",
            grid.order(),
            config.diffusivity,
            config.dt,
            config.t_end,
            k2
        );

        Ok(Self {
            config,
            grid,
            velocity,
            solver,
            k2,
            state: initial,
            time: 0.0,
            step: 0,
        })
    }

    /// 推进一步，返回新状态的范数
    pub fn step(&mut self) -> ObResult<f64> {
        let advection = self.velocity.dot(&gradient(&self.state))?;
        let rhs = self
            .state
            .scale(self.k2)
            .try_add(&advection.scale(1.0 / self.config.diffusivity))?;

        let solution = self.solver.solve(&rhs, &BoundaryData::Homogeneous)?;
        if !solution.is_complete() {
            tracing::warn!(
                "第 {} 步有 {} 个模态求解失败",
                self.step + 1,
                solution.invalid_modes.len()
            );
        }
        let mut state = solution.into_field();
        if self.config.chop_tolerance > 0.0 {
            let dropped = state.chop(self.config.chop_tolerance);
            tracing::trace!("step {}: 截断 {} 个系数", self.step + 1, dropped);
        }
        self.state = state;
        self.step += 1;
        self.time = self.step as f64 * self.config.dt;

        let norm = self.state.norm();
        if !norm.is_finite() {
            return Err(ObError::internal(format!("第 {} 步范数非有限", self.step)));
        }
        tracing::trace!("step {} t={:.4} ‖c‖={:.6e}", self.step, self.time, norm);
        Ok(norm)
    }

    /// 推进到 `T`
    ///
    /// 每 `report_interval` 步及最后一步调用一次 `observer`。步与步之间检查
    /// 取消标志与墙钟预算。
    pub fn run<F>(
        &mut self,
        token: &CancellationToken,
        mut observer: F,
    ) -> Result<RunSummary, RunnerError>
    where
        F: FnMut(&StepReport),
    {
        let total = self.config.total_steps();
        let context = RunContext::new(&self.config, self.time, token.clone());
        let initial_norm = self.state.norm();
        let mut max_norm = initial_norm;
        let mut norm = initial_norm;
        let started = Instant::now();

        tracing::info!("Starting run: step {} -> {}", self.step, total);

        while self.step < total {
            context.check()?;
            norm = self.step()?;
            max_norm = max_norm.max(norm);
            context.set_current_time(self.time);
            context.increment_steps(1);

            let interval = self.config.report_interval;
            let due = interval > 0 && self.step % interval == 0;
            if due || self.step == total {
                let report = StepReport {
                    step: self.step,
                    time: self.time,
                    norm,
                    elapsed: context.elapsed().as_secs_f64(),
                };
                tracing::debug!(
                    "step {}/{} t={:.3} ‖c‖={:.6e} ({:.0}%)",
                    report.step,
                    total,
                    report.time,
                    report.norm,
                    100.0 * context.progress()
                );
                observer(&report);
            }
        }

        let summary = RunSummary {
            steps: context.completed_steps(),
            final_time: self.time,
            initial_norm,
            final_norm: norm,
            max_norm,
            elapsed: started.elapsed().as_secs_f64(),
        };
        tracing::info!(
            "Run finished: {} steps, t={:.3}, ‖c‖ {:.6e} -> {:.6e} ({:.2}s)",
            summary.steps,
            summary.final_time,
            summary.initial_norm,
            summary.final_norm,
            summary.elapsed
        );
        Ok(summary)
    }

    /// 当前浓度场
    pub fn state(&self) -> &ScalarField {
        &self.state
    }

    /// 当前模拟时间
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 已完成步数
    pub fn steps(&self) -> usize {
        self.step
    }

    /// 速度场
    pub fn velocity(&self) -> &VectorField {
        &self.velocity
    }

    /// 网格
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// 配置
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 当前状态的检查点
    pub fn checkpoint(&self) -> FieldSnapshot {
        self.state.snapshot().with_time(self.time)
    }

    /// 从检查点恢复状态与时间
    pub fn restore(&mut self, snapshot: &FieldSnapshot) -> ObResult<()> {
        self.state = ScalarField::from_snapshot(&self.grid, snapshot)?;
        self.step = (snapshot.time / self.config.dt).round() as usize;
        self.time = self.step as f64 * self.config.dt;
        Ok(())
    }
}

/// 由矢量势构造无散速度场 `v = ∇×w`
pub fn velocity_from_potential(potential: &VectorField) -> VectorField {
    curl(potential)
}

/// 示例速度场：`w = z·exp(−5r²)·(x, y, z)` 的旋度，即 `exp(−5r²)·(−y, x, 0)`
pub fn example_velocity(grid: &Arc<Grid>) -> ObResult<VectorField> {
    let potential = VectorField::from_cartesian_fn(grid, |x, y, z| {
        let s = z * (-5.0 * (x * x + y * y + z * z)).exp();
        [s * x, s * y, s * z]
    })?;
    Ok(velocity_from_potential(&potential))
}

/// 示例初值：`c₀ = −x·exp(−5r²)`
pub fn example_initial_condition(grid: &Arc<Grid>) -> ObResult<ScalarField> {
    ScalarField::from_fn(grid, |x, y, z| -x * (-5.0 * (x * x + y * y + z * z)).exp())
}
