//! # 切趾窗函数
//!
//! 在倒空间数据上直接应用 3D 窗函数，抑制高频振铃。
//! 支持 Gaussian、Tukey（锥形余弦）与 Blackman 窗。
//!
//! 3D 窗由各轴 1D 窗的外积构成；Gaussian 窗在 [-1, 1] 归一化
//! 坐标上取值，对角协方差下与多元正态密度等价（重缩放后）。
//!
//! ## 依赖关系
//! - 被 `commands/preprocess/apodize.rs` 调用
//! - 使用 `models/volume.rs` 的 Volume

use crate::models::Volume;

use std::f64::consts::PI;

/// 窗函数类型
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowKind {
    /// 各轴 sigma 的高斯窗
    Gaussian { sigma: [f64; 3] },
    /// 形状参数 alpha 的 Tukey 窗
    Tukey { alpha: f64 },
    /// Blackman 窗
    Blackman,
}

/// 生成与 shape 同形的 3D 窗
pub fn make_window(shape: [usize; 3], kind: WindowKind) -> Volume {
    let axes: [Vec<f64>; 3] = match kind {
        WindowKind::Gaussian { sigma } => [
            gaussian_1d(shape[0], sigma[0]),
            gaussian_1d(shape[1], sigma[1]),
            gaussian_1d(shape[2], sigma[2]),
        ],
        WindowKind::Tukey { alpha } => [
            tukey_1d(shape[0], alpha),
            tukey_1d(shape[1], alpha),
            tukey_1d(shape[2], alpha),
        ],
        WindowKind::Blackman => [
            blackman_1d(shape[0]),
            blackman_1d(shape[1]),
            blackman_1d(shape[2]),
        ],
    };

    let mut window = Volume::zeros(shape);
    for z in 0..shape[0] {
        for y in 0..shape[1] {
            for x in 0..shape[2] {
                window.set(z, y, x, axes[0][z] * axes[1][y] * axes[2][x]);
            }
        }
    }
    window
}

/// 对强度数据应用窗并重缩放回原始最大值
///
/// 形状由调用者保证一致（窗由同一 shape 生成）。
pub fn apodize(data: &Volume, kind: WindowKind) -> Volume {
    let max_before = data.max();
    let window = make_window(data.shape, kind);
    let mut out = data.multiply(&window).expect("window shape matches data");
    let max_after = out.max();
    if max_after > 0.0 && max_before > 0.0 {
        out.scale(max_before / max_after);
    }
    out
}

/// [-1, 1] 上的 1D 高斯窗
fn gaussian_1d(n: usize, sigma: f64) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| {
            let x = -1.0 + 2.0 * i as f64 / (n - 1) as f64;
            (-x * x / (2.0 * sigma * sigma)).exp()
        })
        .collect()
}

/// 1D Tukey 窗
///
/// alpha = 0 退化为矩形窗，alpha = 1 为 Hann 窗。
fn tukey_1d(n: usize, alpha: f64) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    let alpha = alpha.clamp(0.0, 1.0);
    if alpha == 0.0 {
        return vec![1.0; n];
    }

    let width = alpha * (n - 1) as f64 / 2.0;
    (0..n)
        .map(|i| {
            let i = i as f64;
            let n1 = (n - 1) as f64;
            if i < width {
                0.5 * (1.0 + (PI * (i / width - 1.0)).cos())
            } else if i > n1 - width {
                0.5 * (1.0 + (PI * ((i - n1) / width + 1.0)).cos())
            } else {
                1.0
            }
        })
        .collect()
}

/// 1D Blackman 窗
fn blackman_1d(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / (n - 1) as f64;
            0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_peak_at_center() {
        let w = gaussian_1d(101, 0.3);
        assert!((w[50] - 1.0).abs() < 1e-12);
        assert!(w[0] < w[50]);
        // 对称性
        assert!((w[10] - w[90]).abs() < 1e-12);
    }

    #[test]
    fn test_tukey_endpoints() {
        let w = tukey_1d(64, 0.5);
        assert!(w[0].abs() < 1e-12);
        assert!(w[63].abs() < 1e-12);
        // 平台区为 1
        assert!((w[32] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tukey_rectangular_limit() {
        let w = tukey_1d(16, 0.0);
        assert!(w.iter().all(|v| (*v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_blackman_symmetry() {
        let w = blackman_1d(33);
        for i in 0..16 {
            assert!((w[i] - w[32 - i]).abs() < 1e-10);
        }
        assert!(w[0].abs() < 1e-10);
    }

    #[test]
    fn test_apodize_preserves_max() {
        let mut data = Volume::ones([17, 17, 17]);
        data.set(8, 8, 8, 100.0);
        let out = apodize(
            &data,
            WindowKind::Gaussian {
                sigma: [0.3, 0.3, 0.3],
            },
        );
        assert!((out.max() - 100.0).abs() < 1e-9);
        assert_eq!(out.shape, data.shape);
    }
}
