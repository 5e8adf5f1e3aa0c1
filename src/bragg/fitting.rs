//! # 摇摆曲线拟合
//!
//! 1D 摇摆曲线（rocking curve）的峰形分析：细网格插值估计 FWHM，
//! 再用 Levenberg 阻尼的 Gauss-Newton 最小二乘精修
//! Gaussian / Lorentzian / pseudo-Voigt 峰模型。
//!
//! 所有模型统一参数化为 (height, center, fwhm, background)。
//!
//! ## 依赖关系
//! - 被 `commands/analyze/fit.rs` 调用
//! - 无外部模块依赖

use crate::error::{BcdiError, Result};

use std::f64::consts::PI;

/// 峰模型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeakModel {
    Gaussian,
    Lorentzian,
    /// 50% Gaussian + 50% Lorentzian
    PseudoVoigt,
}

impl std::fmt::Display for PeakModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeakModel::Gaussian => write!(f, "gaussian"),
            PeakModel::Lorentzian => write!(f, "lorentzian"),
            PeakModel::PseudoVoigt => write!(f, "pseudo-voigt"),
        }
    }
}

/// 拟合结果
#[derive(Debug, Clone)]
pub struct FitResult {
    pub model: PeakModel,
    /// 峰高（扣除背景）
    pub height: f64,
    /// 峰位
    pub center: f64,
    /// 半高全宽
    pub fwhm: f64,
    /// 常数背景
    pub background: f64,
    /// 峰面积（解析式）
    pub area: f64,
    /// 决定系数 R²
    pub r_squared: f64,
    /// 迭代次数
    pub iterations: usize,
}

impl FitResult {
    /// 按拟合参数计算模型值
    pub fn evaluate(&self, x: f64) -> f64 {
        eval(
            self.model,
            &[self.height, self.center, self.fwhm, self.background],
            x,
        )
    }
}

/// 模型取值，参数 p = [height, center, fwhm, background]
fn eval(model: PeakModel, p: &[f64; 4], x: f64) -> f64 {
    let w = p[2].abs().max(1e-12);
    let d = x - p[1];
    let gauss = (-4.0 * 2.0_f64.ln() * d * d / (w * w)).exp();
    let lorentz = 1.0 / (1.0 + 4.0 * d * d / (w * w));
    let peak = match model {
        PeakModel::Gaussian => gauss,
        PeakModel::Lorentzian => lorentz,
        PeakModel::PseudoVoigt => 0.5 * (gauss + lorentz),
    };
    p[0] * peak + p[3]
}

/// 解析峰面积
fn analytic_area(model: PeakModel, height: f64, fwhm: f64) -> f64 {
    let gauss_area = height * fwhm * 0.5 * (PI / 2.0_f64.ln()).sqrt();
    let lorentz_area = height * fwhm * PI / 2.0;
    match model {
        PeakModel::Gaussian => gauss_area,
        PeakModel::Lorentzian => lorentz_area,
        PeakModel::PseudoVoigt => 0.5 * (gauss_area + lorentz_area),
    }
}

/// 细网格线性插值估计 FWHM
///
/// 把曲线插值到 interp_factor 倍密度的网格上，统计超过半高的
/// 点数乘以步长。与原始读数脚本一致，interp_factor 默认取 5。
pub fn estimate_fwhm(x: &[f64], y: &[f64], interp_factor: usize) -> Result<f64> {
    if x.len() != y.len() || x.len() < 3 {
        return Err(BcdiError::InvalidArgument(
            "need at least 3 points with matching x/y lengths".to_string(),
        ));
    }

    let n_interp = interp_factor.max(1) * x.len();
    let x_min = x[0];
    let x_max = x[x.len() - 1];
    if x_max <= x_min {
        return Err(BcdiError::InvalidArgument(
            "x values must be increasing".to_string(),
        ));
    }

    let step = (x_max - x_min) / (n_interp - 1) as f64;
    let y_max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let y_min = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let half = y_min + (y_max - y_min) / 2.0;

    let mut above = 0usize;
    for i in 0..n_interp {
        let xi = x_min + i as f64 * step;
        if interp_linear(x, y, xi) >= half {
            above += 1;
        }
    }

    Ok(above as f64 * step)
}

/// 强度加权矩估计：返回 (质心, 方差)
///
/// 背景取 y 的最小值，先扣除再加权。
pub fn moments(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    if x.len() != y.len() || x.is_empty() {
        return Err(BcdiError::InvalidArgument(
            "need non-empty x/y of matching lengths".to_string(),
        ));
    }
    let background = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let weights: Vec<f64> = y.iter().map(|v| v - background).collect();
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return Err(BcdiError::InvalidArgument(
            "curve has no signal above background".to_string(),
        ));
    }

    let centroid = x
        .iter()
        .zip(weights.iter())
        .map(|(xi, w)| xi * w)
        .sum::<f64>()
        / total;
    let variance = x
        .iter()
        .zip(weights.iter())
        .map(|(xi, w)| w * (xi - centroid) * (xi - centroid))
        .sum::<f64>()
        / total;

    Ok((centroid, variance))
}

/// 将 (x, y) 对按 x 升序重排
///
/// 摇摆扫描常以递减角度采集，估计与拟合前先排序。
pub fn sort_by_x(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut pairs: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    pairs.into_iter().unzip()
}

/// 线性插值（x 必须单调递增）
fn interp_linear(x: &[f64], y: &[f64], xi: f64) -> f64 {
    if xi <= x[0] {
        return y[0];
    }
    if xi >= x[x.len() - 1] {
        return y[y.len() - 1];
    }
    let mut hi = 1;
    while x[hi] < xi {
        hi += 1;
    }
    let lo = hi - 1;
    let t = (xi - x[lo]) / (x[hi] - x[lo]);
    y[lo] + t * (y[hi] - y[lo])
}

/// 初始参数估计
fn initial_guess(x: &[f64], y: &[f64]) -> [f64; 4] {
    let y_min = y.iter().cloned().fold(f64::INFINITY, f64::min);
    let y_max = y.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let i_max = y
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap_or(0);

    let fwhm = estimate_fwhm(x, y, 5).unwrap_or((x[x.len() - 1] - x[0]) / 4.0);
    let fwhm = if fwhm > 0.0 {
        fwhm
    } else {
        (x[x.len() - 1] - x[0]) / 4.0
    };

    [y_max - y_min, x[i_max], fwhm, y_min]
}

/// 解 4x4 线性方程组（高斯消元，部分主元）
fn solve4(mut a: [[f64; 4]; 4], mut b: [f64; 4]) -> Option<[f64; 4]> {
    for col in 0..4 {
        let mut pivot = col;
        for row in col + 1..4 {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..4 {
            let f = a[row][col] / a[col][col];
            for k in col..4 {
                a[row][k] -= f * a[col][k];
            }
            b[row] -= f * b[col];
        }
    }

    let mut x = [0.0; 4];
    for col in (0..4).rev() {
        let mut sum = b[col];
        for k in col + 1..4 {
            sum -= a[col][k] * x[k];
        }
        x[col] = sum / a[col][col];
    }
    Some(x)
}

/// Levenberg 阻尼的 Gauss-Newton 峰拟合
pub fn fit_peak(x: &[f64], y: &[f64], model: PeakModel) -> Result<FitResult> {
    if x.len() != y.len() {
        return Err(BcdiError::ShapeMismatch {
            context: "curve x and y lengths differ".to_string(),
            expected: format!("{} points", x.len()),
            actual: format!("{} points", y.len()),
        });
    }
    if x.len() < 5 {
        return Err(BcdiError::InvalidArgument(
            "need at least 5 points for a 4-parameter fit".to_string(),
        ));
    }

    let mut p = initial_guess(x, y);
    let mut lambda = 1e-3;
    let mut sse = sum_squared_error(model, &p, x, y);
    let mut iterations = 0;

    for _ in 0..200 {
        iterations += 1;

        // 数值雅可比（中心差分）
        let n = x.len();
        let mut jtj = [[0.0; 4]; 4];
        let mut jtr = [0.0; 4];
        for i in 0..n {
            let mut grad = [0.0; 4];
            for k in 0..4 {
                let h = (p[k].abs() * 1e-6).max(1e-9);
                let mut p_hi = p;
                let mut p_lo = p;
                p_hi[k] += h;
                p_lo[k] -= h;
                grad[k] = (eval(model, &p_hi, x[i]) - eval(model, &p_lo, x[i])) / (2.0 * h);
            }
            let r = y[i] - eval(model, &p, x[i]);
            for k in 0..4 {
                jtr[k] += grad[k] * r;
                for l in 0..4 {
                    jtj[k][l] += grad[k] * grad[l];
                }
            }
        }

        // Levenberg 阻尼
        let mut damped = jtj;
        for k in 0..4 {
            damped[k][k] += lambda * (1.0 + jtj[k][k]);
        }

        let delta = match solve4(damped, jtr) {
            Some(d) => d,
            None => break,
        };

        let mut p_new = p;
        for k in 0..4 {
            p_new[k] += delta[k];
        }
        let sse_new = sum_squared_error(model, &p_new, x, y);

        if sse_new < sse {
            let rel = (sse - sse_new) / sse.max(1e-300);
            p = p_new;
            sse = sse_new;
            lambda = (lambda * 0.5).max(1e-12);
            if rel < 1e-12 {
                break;
            }
        } else {
            lambda *= 10.0;
            if lambda > 1e10 {
                break;
            }
        }
    }

    let y_mean = y.iter().sum::<f64>() / y.len() as f64;
    let sst: f64 = y.iter().map(|v| (v - y_mean) * (v - y_mean)).sum();
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };

    let fwhm = p[2].abs();
    Ok(FitResult {
        model,
        height: p[0],
        center: p[1],
        fwhm,
        background: p[3],
        area: analytic_area(model, p[0], fwhm),
        r_squared,
        iterations,
    })
}

fn sum_squared_error(model: PeakModel, p: &[f64; 4], x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y.iter())
        .map(|(xi, yi)| {
            let r = yi - eval(model, p, *xi);
            r * r
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic(model: PeakModel, p: [f64; 4], n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| -5.0 + 10.0 * i as f64 / (n - 1) as f64).collect();
        let y: Vec<f64> = x.iter().map(|xi| eval(model, &p, *xi)).collect();
        (x, y)
    }

    #[test]
    fn test_fit_gaussian_recovers_parameters() {
        let truth = [10.0, 0.7, 1.5, 2.0];
        let (x, y) = synthetic(PeakModel::Gaussian, truth, 101);
        let fit = fit_peak(&x, &y, PeakModel::Gaussian).unwrap();

        assert!((fit.height - 10.0).abs() < 1e-4);
        assert!((fit.center - 0.7).abs() < 1e-4);
        assert!((fit.fwhm - 1.5).abs() < 1e-4);
        assert!((fit.background - 2.0).abs() < 1e-4);
        assert!(fit.r_squared > 0.999999);
    }

    #[test]
    fn test_fit_lorentzian_recovers_parameters() {
        let truth = [5.0, -1.2, 2.0, 0.5];
        let (x, y) = synthetic(PeakModel::Lorentzian, truth, 101);
        let fit = fit_peak(&x, &y, PeakModel::Lorentzian).unwrap();

        assert!((fit.center - (-1.2)).abs() < 1e-3);
        assert!((fit.fwhm - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_fit_pseudo_voigt() {
        let truth = [8.0, 0.0, 1.0, 0.0];
        let (x, y) = synthetic(PeakModel::PseudoVoigt, truth, 101);
        let fit = fit_peak(&x, &y, PeakModel::PseudoVoigt).unwrap();
        assert!((fit.height - 8.0).abs() < 1e-3);
        assert!(fit.r_squared > 0.9999);
    }

    #[test]
    fn test_moments_of_symmetric_peak() {
        let truth = [3.0, 1.0, 2.0, 0.5];
        let (x, y) = synthetic(PeakModel::Gaussian, truth, 201);
        let (centroid, variance) = moments(&x, &y).unwrap();
        assert!((centroid - 1.0).abs() < 1e-6);
        // 高斯方差 = fwhm² / (8 ln2)，截断导致轻微偏差
        let expected = 4.0 / (8.0 * 2.0_f64.ln());
        assert!((variance - expected).abs() < 0.05);
    }

    #[test]
    fn test_moments_reject_flat_curve() {
        let x = vec![0.0, 1.0, 2.0];
        let y = vec![5.0, 5.0, 5.0];
        assert!(moments(&x, &y).is_err());
    }

    #[test]
    fn test_descending_scan_sorted_before_fit() {
        let truth = [4.0, 0.5, 1.0, 0.0];
        let (x, y) = synthetic(PeakModel::Gaussian, truth, 101);
        let x_desc: Vec<f64> = x.iter().rev().copied().collect();
        let y_desc: Vec<f64> = y.iter().rev().copied().collect();

        assert!(estimate_fwhm(&x_desc, &y_desc, 5).is_err());

        let (xs, ys) = sort_by_x(&x_desc, &y_desc);
        assert!(estimate_fwhm(&xs, &ys, 5).is_ok());
        let fit = fit_peak(&xs, &ys, PeakModel::Gaussian).unwrap();
        assert!((fit.center - 0.5).abs() < 1e-3);
        assert!((fit.fwhm - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_estimate_fwhm_gaussian() {
        let truth = [1.0, 0.0, 2.0, 0.0];
        let (x, y) = synthetic(PeakModel::Gaussian, truth, 201);
        let fwhm = estimate_fwhm(&x, &y, 5).unwrap();
        // 插值估计的精度受网格限制
        assert!((fwhm - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_fit_rejects_short_input() {
        let x = vec![0.0, 1.0, 2.0];
        let y = vec![0.0, 1.0, 0.0];
        assert!(fit_peak(&x, &y, PeakModel::Gaussian).is_err());
    }

    #[test]
    fn test_area_gaussian() {
        // 高斯峰面积 = h * w/2 * sqrt(pi/ln2)
        let area = analytic_area(PeakModel::Gaussian, 2.0, 3.0);
        let expected = 2.0 * 3.0 * 0.5 * (PI / 2.0_f64.ln()).sqrt();
        assert!((area - expected).abs() < 1e-12);
    }
}
