// crates/ob_spectral/src/grid.rs

//! 球域谱网格
//!
//! 由阶数 N 唯一确定：每个角向模态 N 个径向模态，最大球谐阶 L = N − 1。
//! 物理网格规模
//!
//! ```text
//! Nr = ceil(dealias · N)          径向（正半轴 Gauss-Chebyshev 点）
//! Nθ = ceil(dealias · (L + 1))    余纬（Gauss-Legendre 点）
//! Nφ = 2 · Nθ                     经度（等距）
//! ```
//!
//! 所有节点都不落在原点或极点上。网格构造后只读，经 `Arc` 在场之间共享；
//! Helmholtz 径向算子矩阵在首次使用时惰性建立并缓存于网格内。

use std::f64::consts::PI;
use std::fmt;
use std::sync::{Arc, OnceLock};

use ndarray::{Array2, Array3};
use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};

use crate::basis::{chebyshev, gauss_legendre, LegendreTable};
use crate::helmholtz::tau::TauOperators;
use ob_config::GridConfig;
use ob_foundation::{ensure, mode_count, ObError, ObResult};

/// 球域谱网格
pub struct Grid {
    config: GridConfig,
    l_max: usize,
    radii: Vec<f64>,
    colatitudes: Vec<f64>,
    cos_theta: Vec<f64>,
    sin_theta: Vec<f64>,
    weights: Vec<f64>,
    longitudes: Vec<f64>,
    legendre: LegendreTable,
    /// `T_n(r_j)`，形状 (Nr, 2N)
    radial_basis: Array2<f64>,
    /// 紧凑 Gram 矩阵，按奇偶性
    gram: [Vec<f64>; 2],
    fft_forward: Arc<dyn Fft<f64>>,
    fft_inverse: Arc<dyn Fft<f64>>,
    tau: OnceLock<Arc<TauOperators>>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("order", &self.config.order)
            .field("dealias", &self.config.dealias)
            .field("nr", &self.nr())
            .field("ntheta", &self.ntheta())
            .field("nphi", &self.nphi())
            .finish()
    }
}

impl Grid {
    /// 默认去混叠因子下的网格
    pub fn new(order: usize) -> ObResult<Arc<Self>> {
        Self::with_config(GridConfig::with_order(order))
    }

    /// 由网格配置构造
    pub fn with_config(config: GridConfig) -> ObResult<Arc<Self>> {
        config.validate()?;
        if config.dealias < 1.5 {
            log::warn!("dealias = {} < 1.5，二次乘积项会产生混叠", config.dealias);
        }
        let order = config.order;
        let l_max = order - 1;

        let nr = (config.dealias * order as f64).ceil() as usize;
        let ntheta = (config.dealias * (l_max + 1) as f64).ceil() as usize;
        let nphi = 2 * ntheta;
        ensure!(
            nr >= order && ntheta > l_max,
            ObError::internal(format!("网格过小: nr={nr}, nθ={ntheta}"))
        );

        let radii = chebyshev::half_nodes(nr);
        let (cos_theta, weights) = gauss_legendre(ntheta);
        let sin_theta: Vec<f64> = cos_theta.iter().map(|x| (1.0 - x * x).max(0.0).sqrt()).collect();
        let colatitudes = cos_theta.iter().map(|x| x.acos()).collect();
        let longitudes = (0..nphi).map(|k| 2.0 * PI * k as f64 / nphi as f64).collect();

        let legendre = LegendreTable::new(l_max, &cos_theta, &sin_theta);

        let full_len = 2 * order;
        let mut radial_basis = Array2::zeros((nr, full_len));
        for (j, &r) in radii.iter().enumerate() {
            let t = chebyshev::eval_all(full_len - 1, r);
            for (n, v) in t.into_iter().enumerate() {
                radial_basis[[j, n]] = v;
            }
        }

        let gram = [
            chebyshev::gram_matrix(order, 0),
            chebyshev::gram_matrix(order, 1),
        ];

        let mut planner = FftPlanner::<f64>::new();
        let fft_forward = planner.plan_fft_forward(nphi);
        let fft_inverse = planner.plan_fft_inverse(nphi);

        log::debug!(
            "构建网格: order={}, L={}, 物理网格 {}×{}×{}",
            order,
            l_max,
            nr,
            ntheta,
            nphi
        );

        Ok(Arc::new(Self {
            config,
            l_max,
            radii,
            colatitudes,
            cos_theta,
            sin_theta,
            weights,
            longitudes,
            legendre,
            radial_basis,
            gram,
            fft_forward,
            fft_inverse,
            tau: OnceLock::new(),
        }))
    }

    // =========================================================================
    // 规模
    // =========================================================================

    /// 阶数 N（每个角向模态的径向模态数）
    #[inline]
    pub fn order(&self) -> usize {
        self.config.order
    }

    /// 最大球谐阶 L
    #[inline]
    pub fn l_max(&self) -> usize {
        self.l_max
    }

    /// 角向模态数 (L+1)²
    #[inline]
    pub fn n_modes(&self) -> usize {
        mode_count(self.l_max)
    }

    /// 网格配置
    #[inline]
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// 径向点数
    #[inline]
    pub fn nr(&self) -> usize {
        self.radii.len()
    }

    /// 余纬点数
    #[inline]
    pub fn ntheta(&self) -> usize {
        self.colatitudes.len()
    }

    /// 经度点数
    #[inline]
    pub fn nphi(&self) -> usize {
        self.longitudes.len()
    }

    /// 物理张量形状 (Nr, Nθ, Nφ)
    #[inline]
    pub fn physical_shape(&self) -> (usize, usize, usize) {
        (self.nr(), self.ntheta(), self.nphi())
    }

    /// 系数矩阵形状 ((L+1)², N)
    #[inline]
    pub fn coefficient_shape(&self) -> (usize, usize) {
        (self.n_modes(), self.order())
    }

    /// 完整 Chebyshev 向量长度
    #[inline]
    pub(crate) fn full_len(&self) -> usize {
        2 * self.order() + 2
    }

    // =========================================================================
    // 节点
    // =========================================================================

    /// 径向节点（降序）
    #[inline]
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    /// 余纬节点（升序）
    #[inline]
    pub fn colatitudes(&self) -> &[f64] {
        &self.colatitudes
    }

    /// `cosθ`
    #[inline]
    pub fn cos_theta(&self) -> &[f64] {
        &self.cos_theta
    }

    /// `sinθ`
    #[inline]
    pub fn sin_theta(&self) -> &[f64] {
        &self.sin_theta
    }

    /// Gauss-Legendre 权重
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// 经度节点
    #[inline]
    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    #[inline]
    pub(crate) fn legendre(&self) -> &LegendreTable {
        &self.legendre
    }

    #[inline]
    pub(crate) fn radial_basis(&self) -> &Array2<f64> {
        &self.radial_basis
    }

    #[inline]
    pub(crate) fn gram(&self, parity: usize) -> &[f64] {
        &self.gram[parity % 2]
    }

    /// 经度方向前向 FFT（原地）
    pub(crate) fn fft_forward(&self, buffer: &mut [Complex64]) {
        self.fft_forward.process(buffer);
    }

    /// 经度方向逆 FFT（原地，不归一化）
    pub(crate) fn fft_inverse(&self, buffer: &mut [Complex64]) {
        self.fft_inverse.process(buffer);
    }

    /// Helmholtz 径向算子缓存
    pub(crate) fn tau_operators(&self) -> Arc<TauOperators> {
        self.tau
            .get_or_init(|| Arc::new(TauOperators::new(self.order())))
            .clone()
    }

    /// 两个网格是否等价（同一实例或相同配置）
    pub fn is_compatible(&self, other: &Grid) -> bool {
        std::ptr::eq(self, other) || self.config == other.config
    }

    /// 不等价时返回 `GridMismatch`
    pub fn check_compatible(&self, other: &Grid) -> ObResult<()> {
        ensure!(
            self.is_compatible(other),
            ObError::grid_mismatch(format!(
                "order {} / dealias {} 与 order {} / dealias {}",
                self.order(),
                self.config.dealias,
                other.order(),
                other.config.dealias
            ))
        );
        Ok(())
    }

    // =========================================================================
    // 采样
    // =========================================================================

    /// 在物理网格上对 `f(x, y, z)` 采样，返回 (Nr, Nθ, Nφ) 张量
    pub fn sample<F>(&self, f: F) -> Array3<f64>
    where
        F: Fn(f64, f64, f64) -> f64 + Sync,
    {
        self.sample_spherical(|r, ct, st, phi| {
            let (sp, cp) = phi.sin_cos();
            f(r * st * cp, r * st * sp, r * ct)
        })
    }

    /// 以 `(r, cosθ, sinθ, φ)` 为自变量采样
    pub(crate) fn sample_spherical<F>(&self, f: F) -> Array3<f64>
    where
        F: Fn(f64, f64, f64, f64) -> f64 + Sync,
    {
        let mut out = Array3::zeros(self.physical_shape());
        out.axis_iter_mut(ndarray::Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(j, mut shell)| {
                let r = self.radii[j];
                for (i, (&ct, &st)) in self.cos_theta.iter().zip(&self.sin_theta).enumerate() {
                    for (k, &phi) in self.longitudes.iter().enumerate() {
                        shell[[i, k]] = f(r, ct, st, phi);
                    }
                }
            });
        out
    }

    /// 在单位球面角向网格上对 `f(θ, φ)` 采样，返回 (Nθ, Nφ)
    pub fn sample_surface<F>(&self, f: F) -> Array2<f64>
    where
        F: Fn(f64, f64) -> f64,
    {
        Array2::from_shape_fn((self.ntheta(), self.nphi()), |(i, k)| {
            f(self.colatitudes[i], self.longitudes[k])
        })
    }
}
