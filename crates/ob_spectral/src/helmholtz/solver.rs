// crates/ob_spectral/src/helmholtz/solver.rs

//! Helmholtz 求解器 `∇²u + K²u = g`
//!
//! 每个 ℓ 的 tau 系统 (N×N) 只依赖 ℓ 与 K，按行包络存储并做带状 LU，
//! 分解一次后供该 ℓ 的全部 `2ℓ+1` 个 m 作为多右端项使用。各 ℓ 之间并行，
//! `collect` 即汇合点。
//!
//! 系统矩阵 = 前 N−1 行 `E0 − ℓ(ℓ+1)·S + K²·M`，末行为 r = 1 的边界行。
//! 右端项 = `(M·g)` 的前 N−1 项，末项为边界系数 `h_ℓm`。

use std::sync::Arc;

use nalgebra::{ComplexField, DMatrix};
use ndarray::Array2;
use num_complex::Complex64;
use rayon::prelude::*;

use super::boundary::BoundaryData;
use super::tau::{ParityOperators, TauOperators};
use crate::field::ScalarField;
use crate::grid::Grid;
use crate::linalg::{BandedFactor, EnvelopeMatrix};
use ob_config::{BoundaryType, FailureMode, SolveConfig};
use ob_foundation::{ensure, packed_index, ModeIndex, ObError, ObResult};

/// 残差检查的相对容差
const RESIDUAL_TOLERANCE: f64 = 1e-8;

/// `K²` 虚部相对幅值低于此值时按实数求解
const REAL_K2_TOLERANCE: f64 = 1e-14;

/// 求解结果
#[derive(Debug, Clone)]
pub struct HelmholtzSolution {
    /// 解的实部
    pub field: ScalarField,
    /// 解的虚部，仅当 `K²` 为复数时存在
    pub imaginary: Option<ScalarField>,
    /// 求解失败并被置零的模态（仅 Permissive 模式下非空）
    pub invalid_modes: Vec<ModeIndex>,
    /// 各 ℓ 系统条件数倒数估计的最小值
    pub min_rcond: f64,
}

impl HelmholtzSolution {
    /// 所有模态都求解成功
    pub fn is_complete(&self) -> bool {
        self.invalid_modes.is_empty()
    }

    /// 取出实部
    pub fn into_field(self) -> ScalarField {
        self.field
    }
}

/// 单个 ℓ 的系统矩阵与分解
#[derive(Debug, Clone)]
struct DegreeSystem<T>
where
    T: ComplexField<RealField = f64> + Copy,
{
    matrix: EnvelopeMatrix<T>,
    factor: BandedFactor<T>,
}

impl<T> DegreeSystem<T>
where
    T: ComplexField<RealField = f64> + Copy,
{
    fn new(ops: &ParityOperators, ell: f64, k2: T, boundary_row: &[f64], tolerance: f64) -> Self {
        let matrix = system_matrix(ops, ell, k2, boundary_row);
        let factor = BandedFactor::new(&matrix, tolerance);
        Self { matrix, factor }
    }

    /// 求解并做残差检查，失败返回 `None`
    fn solve(&self, rhs: &DMatrix<T>) -> Option<DMatrix<T>> {
        let x = self.factor.solve(rhs)?;
        let residual = self.matrix.mul_mat(&x) - rhs;
        let scale = self.matrix.max_abs() * max_abs(&x) + max_abs(rhs);
        if max_abs(&residual) <= RESIDUAL_TOLERANCE * scale.max(f64::MIN_POSITIVE) {
            Some(x)
        } else {
            None
        }
    }
}

fn max_abs<T: ComplexField<RealField = f64> + Copy>(m: &DMatrix<T>) -> f64 {
    m.iter().map(|v| v.modulus()).fold(0.0, f64::max)
}

/// 组装 N×N 系统：前 N−1 行取带状的 `E0 − ℓ(ℓ+1)·S + K²·M`，末行为边界行
fn system_matrix<T>(
    ops: &ParityOperators,
    ell: f64,
    k2: T,
    boundary_row: &[f64],
) -> EnvelopeMatrix<T>
where
    T: ComplexField<RealField = f64> + Copy,
{
    let n = ops.e0.n_cols();
    let terms = [
        (&ops.e0, T::from_real(1.0)),
        (&ops.s, T::from_real(-ell)),
        (&ops.m, k2),
    ];
    let mut rows: Vec<(usize, Vec<T>)> = (0..n - 1)
        .map(|i| {
            let cols = terms
                .iter()
                .flat_map(|(op, _)| op.row(i).col_indices().iter().copied());
            let (lo, hi) = cols.fold((usize::MAX, 0), |(lo, hi), c| (lo.min(c), hi.max(c)));
            if lo > hi {
                return (i.min(n - 1), vec![T::from_real(0.0)]);
            }
            let mut values = vec![T::from_real(0.0); hi - lo + 1];
            for (op, weight) in &terms {
                for (j, v) in op.row(i).iter() {
                    values[j - lo] += *weight * T::from_real(v);
                }
            }
            (lo, values)
        })
        .collect();
    rows.push((0, boundary_row.iter().map(|&v| T::from_real(v)).collect()));
    EnvelopeMatrix::from_rows(n, rows)
}

/// 按 ℓ 缓存的系统
#[derive(Debug, Clone)]
enum Systems {
    Real(Vec<DegreeSystem<f64>>),
    Complex(Vec<DegreeSystem<Complex64>>),
}

/// 固定网格、K 与配置下的 Helmholtz 求解器
///
/// 构造时完成全部 ℓ 系统的分解，之后可对任意多个右端项重复求解。
///
/// # 示例
///
/// ```
/// use num_complex::Complex64;
/// use ob_config::{BoundaryType, SolveConfig};
/// use ob_spectral::{BoundaryData, Grid, HelmholtzSolver, ScalarField};
///
/// let grid = Grid::new(8).unwrap();
/// let config = SolveConfig::new(8, BoundaryType::Dirichlet);
/// let solver = HelmholtzSolver::prepare(&grid, Complex64::new(0.0, 0.0), &config).unwrap();
///
/// // ∇²u = 6，u(1) = 1  ⇒  u = r²
/// let rhs = ScalarField::from_fn(&grid, |_, _, _| 6.0).unwrap();
/// let boundary = BoundaryData::from_fn(|_, _| 1.0);
/// let u = solver.solve(&rhs, &boundary).unwrap().into_field();
/// assert!((u.mean() - 0.6).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct HelmholtzSolver {
    grid: Arc<Grid>,
    k: Complex64,
    config: SolveConfig,
    tau: Arc<TauOperators>,
    systems: Systems,
}

impl HelmholtzSolver {
    /// 组装并分解全部 ℓ 系统
    pub fn prepare(grid: &Arc<Grid>, k: Complex64, config: &SolveConfig) -> ObResult<Self> {
        config.validate()?;
        ensure!(
            config.grid_config() == *grid.config(),
            ObError::grid_mismatch(format!(
                "配置 order {} / dealias {}，网格 order {} / dealias {}",
                config.order,
                config.dealias,
                grid.order(),
                grid.config().dealias
            ))
        );
        ensure!(
            k.re.is_finite() && k.im.is_finite(),
            ObError::invalid_input(format!("K 非有限: {k}"))
        );

        let tau = grid.tau_operators();
        let k2 = k * k;
        let l_max = grid.l_max();
        let tol = config.singular_tolerance;
        let row = |ops: &ParityOperators| -> Vec<f64> {
            match config.boundary_type {
                BoundaryType::Dirichlet => ops.dirichlet_row.clone(),
                BoundaryType::Neumann => ops.neumann_row.clone(),
            }
        };

        let systems = if is_real(k2) {
            Systems::Real(
                (0..=l_max)
                    .into_par_iter()
                    .map(|l| {
                        let ops = tau.parity(l % 2);
                        DegreeSystem::new(ops, (l * (l + 1)) as f64, k2.re, &row(ops), tol)
                    })
                    .collect(),
            )
        } else {
            Systems::Complex(
                (0..=l_max)
                    .into_par_iter()
                    .map(|l| {
                        let ops = tau.parity(l % 2);
                        DegreeSystem::new(ops, (l * (l + 1)) as f64, k2, &row(ops), tol)
                    })
                    .collect(),
            )
        };

        log::debug!(
            "Helmholtz 分解完成: order={}, K={}, {}, {:?}",
            grid.order(),
            k,
            if matches!(systems, Systems::Real(_)) { "实数" } else { "复数" },
            config.boundary_type
        );

        Ok(Self {
            grid: Arc::clone(grid),
            k,
            config: *config,
            tau,
            systems,
        })
    }

    /// 网格
    pub fn grid(&self) -> &Arc<Grid> {
        &self.grid
    }

    /// 波数 K
    pub fn wavenumber(&self) -> Complex64 {
        self.k
    }

    /// 求解配置
    pub fn config(&self) -> &SolveConfig {
        &self.config
    }

    /// 是否走复数路径
    pub fn is_complex(&self) -> bool {
        matches!(self.systems, Systems::Complex(_))
    }

    /// 分解阶段即判为奇异的 ℓ
    pub fn singular_degrees(&self) -> Vec<usize> {
        match &self.systems {
            Systems::Real(s) => singular_of(s),
            Systems::Complex(s) => singular_of(s),
        }
    }

    /// 求解 `∇²u + K²u = rhs`
    pub fn solve(&self, rhs: &ScalarField, boundary: &BoundaryData) -> ObResult<HelmholtzSolution> {
        self.grid.check_compatible(rhs.grid())?;
        rhs.check_resolution(&self.config)?;
        let h = boundary.resolve(&self.grid)?;

        let shape = self.grid.coefficient_shape();
        let mut real = Array2::zeros(shape);
        let mut imag = self.is_complex().then(|| Array2::zeros(shape));
        let mut invalid = Vec::new();
        let mut min_rcond = f64::INFINITY;

        match &self.systems {
            Systems::Real(systems) => {
                let results: Vec<DegreeResult<f64>> = systems
                    .par_iter()
                    .enumerate()
                    .map(|(l, sys)| self.solve_degree(l, sys, rhs.coefficients(), &h, |v| v))
                    .collect();
                for (l, res) in results.into_iter().enumerate() {
                    min_rcond = min_rcond.min(res.rcond);
                    match res.solution {
                        Some(x) => self.scatter(l, &x, &mut real),
                        None => invalid.extend(degree_modes(l)),
                    }
                }
            }
            Systems::Complex(systems) => {
                let results: Vec<DegreeResult<Complex64>> = systems
                    .par_iter()
                    .enumerate()
                    .map(|(l, sys)| {
                        self.solve_degree(l, sys, rhs.coefficients(), &h, |v| Complex64::new(v, 0.0))
                    })
                    .collect();
                for (l, res) in results.into_iter().enumerate() {
                    min_rcond = min_rcond.min(res.rcond);
                    match res.solution {
                        Some(x) => {
                            let re = x.map(|z| z.re);
                            let im = x.map(|z| z.im);
                            self.scatter(l, &re, &mut real);
                            if let Some(imag) = imag.as_mut() {
                                self.scatter(l, &im, imag);
                            }
                        }
                        None => invalid.extend(degree_modes(l)),
                    }
                }
            }
        }

        if !invalid.is_empty() {
            match self.config.failure_mode {
                FailureMode::Strict => return Err(ObError::singular(invalid)),
                FailureMode::Permissive => log::warn!(
                    "Helmholtz: {} 个模态无法求解，已置零 (K={})",
                    invalid.len(),
                    self.k
                ),
            }
        }

        Ok(HelmholtzSolution {
            field: ScalarField::from_coefficients(&self.grid, real)?,
            imaginary: imag
                .map(|c| ScalarField::from_coefficients(&self.grid, c))
                .transpose()?,
            invalid_modes: invalid,
            min_rcond,
        })
    }

    /// 单个 ℓ：组装 2ℓ+1 个右端项并求解
    fn solve_degree<T, F>(
        &self,
        l: usize,
        system: &DegreeSystem<T>,
        g: &Array2<f64>,
        h: &[f64],
        lift: F,
    ) -> DegreeResult<T>
    where
        T: ComplexField<RealField = f64> + Copy,
        F: Fn(f64) -> T,
    {
        let n = self.grid.order();
        let ops = self.tau.parity(l % 2);
        let width = 2 * l + 1;
        let mut b = DMatrix::from_element(n, width, T::from_real(0.0));
        for (j, m) in (-(l as i64)..=l as i64).enumerate() {
            let idx = packed_index(l, m);
            let row: Vec<f64> = g.row(idx).iter().copied().collect();
            let mg = ops.m.mul_vec(&row);
            for i in 0..n - 1 {
                b[(i, j)] = lift(mg[i]);
            }
            b[(n - 1, j)] = lift(h[idx]);
        }
        DegreeResult {
            solution: system.solve(&b),
            rcond: system.factor.rcond(),
        }
    }

    fn scatter(&self, l: usize, x: &DMatrix<f64>, out: &mut Array2<f64>) {
        for (j, m) in (-(l as i64)..=l as i64).enumerate() {
            let idx = packed_index(l, m);
            for k in 0..x.nrows() {
                out[[idx, k]] = x[(k, j)];
            }
        }
    }
}

struct DegreeResult<T>
where
    T: ComplexField<RealField = f64> + Copy,
{
    solution: Option<DMatrix<T>>,
    rcond: f64,
}

fn is_real(k2: Complex64) -> bool {
    k2.im.abs() <= REAL_K2_TOLERANCE * k2.norm().max(1.0)
}

fn singular_of<T: ComplexField<RealField = f64> + Copy>(systems: &[DegreeSystem<T>]) -> Vec<usize> {
    systems
        .iter()
        .enumerate()
        .filter(|(_, s)| s.factor.is_singular())
        .map(|(l, _)| l)
        .collect()
}

fn degree_modes(l: usize) -> impl Iterator<Item = ModeIndex> {
    (-(l as i64)..=l as i64).map(move |m| ModeIndex::new(l, m))
}

// =============================================================================
// 一次性问题
// =============================================================================

/// 一次性 Helmholtz 问题，`solve` 消耗自身
#[derive(Debug, Clone)]
pub struct HelmholtzProblem {
    rhs: ScalarField,
    k: Complex64,
    boundary: BoundaryData,
    config: SolveConfig,
}

impl HelmholtzProblem {
    /// 齐次边界的问题
    pub fn new(rhs: ScalarField, k: Complex64, config: SolveConfig) -> Self {
        Self {
            rhs,
            k,
            boundary: BoundaryData::Homogeneous,
            config,
        }
    }

    /// 设置边界数据
    pub fn with_boundary(mut self, boundary: BoundaryData) -> Self {
        self.boundary = boundary;
        self
    }

    /// 求解
    pub fn solve(self) -> ObResult<HelmholtzSolution> {
        solve(&self.rhs, self.k, &self.boundary, &self.config)
    }
}

/// 一次性求解 `∇²u + K²u = rhs`
///
/// `config.order` 必须与 `rhs` 所在网格一致。重复求解同一 K 时
/// 应改用 [`HelmholtzSolver`] 复用分解。
pub fn solve(
    rhs: &ScalarField,
    k: Complex64,
    boundary: &BoundaryData,
    config: &SolveConfig,
) -> ObResult<HelmholtzSolution> {
    HelmholtzSolver::prepare(rhs.grid(), k, config)?.solve(rhs, boundary)
}
