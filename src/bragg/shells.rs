//! # q 壳层径向平均与 PRTF
//!
//! 把 3D 衍射图样按 |q| 分壳平均得到 1D 强度曲线 I(q)，
//! 以及相位恢复传递函数 (PRTF) 的壳层比值计算。
//!
//! PRTF(q) = <|F_retrieved|> / <sqrt(I_measured)>，逐壳层求平均；
//! 负值（被屏蔽）的测量体素不参与统计。分辨率截止取 PRTF 首次
//! 跌破 1/e 处的 q。
//!
//! ## 依赖关系
//! - 被 `commands/analyze/average.rs` 与 `commands/analyze/prtf.rs` 调用
//! - 使用 `models/volume.rs` 的 Volume

use crate::error::{BcdiError, Result};
use crate::models::Volume;

/// 壳层平均曲线
#[derive(Debug, Clone)]
pub struct ShellCurve {
    /// 各壳层中心 |q|
    pub q: Vec<f64>,
    /// 各壳层平均值
    pub value: Vec<f64>,
    /// 各壳层参与统计的体素数
    pub counts: Vec<usize>,
}

impl ShellCurve {
    /// 转换为 (q, value) 点列，跳过空壳层
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.q
            .iter()
            .zip(self.value.iter())
            .zip(self.counts.iter())
            .filter(|((_, _), c)| **c > 0)
            .map(|((q, v), _)| (*q, *v))
            .collect()
    }
}

/// 径向平均的原点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellOrigin {
    /// 数组几何中心
    Center,
    /// 绝对值最大处（Bragg 峰）
    Max,
}

/// 3D 图样的 q 壳层平均
///
/// `dq` 为各轴体素间的倒空间步长；`min_value` 以下的体素
/// （包括负的屏蔽标记）不参与统计。
pub fn radial_average(
    data: &Volume,
    origin: ShellOrigin,
    dq: [f64; 3],
    nbins: usize,
    min_value: f64,
) -> Result<ShellCurve> {
    if nbins == 0 {
        return Err(BcdiError::InvalidArgument(
            "number of bins must be positive".to_string(),
        ));
    }
    if dq.iter().any(|v| *v <= 0.0) {
        return Err(BcdiError::InvalidArgument(
            "q steps must be strictly positive".to_string(),
        ));
    }

    let (oz, oy, ox) = match origin {
        ShellOrigin::Center => (
            data.shape[0] as f64 / 2.0,
            data.shape[1] as f64 / 2.0,
            data.shape[2] as f64 / 2.0,
        ),
        ShellOrigin::Max => {
            let (z, y, x) = data.argmax();
            (z as f64, y as f64, x as f64)
        }
    };

    // 到八个角点的最大距离决定 q 范围
    let mut q_max: f64 = 0.0;
    for &cz in &[0.0, data.shape[0] as f64 - 1.0] {
        for &cy in &[0.0, data.shape[1] as f64 - 1.0] {
            for &cx in &[0.0, data.shape[2] as f64 - 1.0] {
                let qz = (cz - oz) * dq[0];
                let qy = (cy - oy) * dq[1];
                let qx = (cx - ox) * dq[2];
                q_max = q_max.max((qz * qz + qy * qy + qx * qx).sqrt());
            }
        }
    }
    if q_max == 0.0 {
        return Err(BcdiError::Other("degenerate q range".to_string()));
    }

    let mut sums = vec![0.0; nbins];
    let mut counts = vec![0usize; nbins];

    for z in 0..data.shape[0] {
        for y in 0..data.shape[1] {
            for x in 0..data.shape[2] {
                let v = data.get(z, y, x);
                if v < min_value {
                    continue;
                }
                let qz = (z as f64 - oz) * dq[0];
                let qy = (y as f64 - oy) * dq[1];
                let qx = (x as f64 - ox) * dq[2];
                let qr = (qz * qz + qy * qy + qx * qx).sqrt();
                let bin = ((qr / q_max) * nbins as f64) as usize;
                let bin = bin.min(nbins - 1);
                sums[bin] += v;
                counts[bin] += 1;
            }
        }
    }

    let q = (0..nbins)
        .map(|i| (i as f64 + 0.5) * q_max / nbins as f64)
        .collect();
    let value = sums
        .iter()
        .zip(counts.iter())
        .map(|(s, c)| if *c > 0 { s / *c as f64 } else { 0.0 })
        .collect();

    Ok(ShellCurve { q, value, counts })
}

/// PRTF 计算结果
#[derive(Debug, Clone)]
pub struct PrtfResult {
    /// 壳层曲线（value 为 PRTF 比值）
    pub curve: ShellCurve,
    /// 首次跌破 1/e 的 q，未跌破时为 None
    pub cutoff: Option<f64>,
}

/// 相位恢复传递函数
///
/// `measured` 为实测强度 I(q)，`retrieved` 为恢复的衍射振幅 |F(q)|，
/// 两者同形、同原点（几何中心）。
pub fn prtf(measured: &Volume, retrieved: &Volume, nbins: usize) -> Result<PrtfResult> {
    if measured.shape != retrieved.shape {
        return Err(BcdiError::ShapeMismatch {
            context: "measured and retrieved volumes must have the same shape".to_string(),
            expected: format!("{:?}", measured.shape),
            actual: format!("{:?}", retrieved.shape),
        });
    }
    if nbins == 0 {
        return Err(BcdiError::InvalidArgument(
            "number of bins must be positive".to_string(),
        ));
    }

    let oz = measured.shape[0] as f64 / 2.0;
    let oy = measured.shape[1] as f64 / 2.0;
    let ox = measured.shape[2] as f64 / 2.0;
    let q_max = (oz * oz + oy * oy + ox * ox).sqrt();

    let mut sum_ret = vec![0.0; nbins];
    let mut sum_meas = vec![0.0; nbins];
    let mut counts = vec![0usize; nbins];

    for z in 0..measured.shape[0] {
        for y in 0..measured.shape[1] {
            for x in 0..measured.shape[2] {
                let i_meas = measured.get(z, y, x);
                // 负值为屏蔽标记，零强度无统计意义
                if i_meas <= 0.0 {
                    continue;
                }
                let qz = z as f64 - oz;
                let qy = y as f64 - oy;
                let qx = x as f64 - ox;
                let qr = (qz * qz + qy * qy + qx * qx).sqrt();
                let bin = ((qr / q_max) * nbins as f64) as usize;
                let bin = bin.min(nbins - 1);
                sum_ret[bin] += retrieved.get(z, y, x).abs();
                sum_meas[bin] += i_meas.sqrt();
                counts[bin] += 1;
            }
        }
    }

    let q: Vec<f64> = (0..nbins)
        .map(|i| (i as f64 + 0.5) * q_max / nbins as f64)
        .collect();
    let value: Vec<f64> = sum_ret
        .iter()
        .zip(sum_meas.iter())
        .map(|(r, m)| if *m > 0.0 { r / m } else { 0.0 })
        .collect();

    let threshold = (-1.0f64).exp();
    let cutoff = q
        .iter()
        .zip(value.iter())
        .zip(counts.iter())
        .find(|((_, v), c)| **c > 0 && **v < threshold)
        .map(|((q, _), _)| *q);

    Ok(PrtfResult {
        curve: ShellCurve { q, value, counts },
        cutoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_volume_average() {
        let data = Volume::filled([16, 16, 16], 3.5);
        let curve = radial_average(&data, ShellOrigin::Center, [1.0, 1.0, 1.0], 8, 0.0).unwrap();

        for (v, c) in curve.value.iter().zip(curve.counts.iter()) {
            if *c > 0 {
                assert!((v - 3.5).abs() < 1e-12);
            }
        }
        // 低壳层必然非空
        assert!(curve.counts[0] > 0);
    }

    #[test]
    fn test_masked_voxels_excluded() {
        let mut data = Volume::filled([8, 8, 8], 2.0);
        data.set(4, 4, 4, -1.0);
        let curve = radial_average(&data, ShellOrigin::Center, [1.0, 1.0, 1.0], 4, 0.0).unwrap();
        let total: usize = curve.counts.iter().sum();
        assert_eq!(total, 8 * 8 * 8 - 1);
    }

    #[test]
    fn test_invalid_bins() {
        let data = Volume::ones([4, 4, 4]);
        assert!(radial_average(&data, ShellOrigin::Center, [1.0, 1.0, 1.0], 0, 0.0).is_err());
    }

    #[test]
    fn test_prtf_perfect_retrieval() {
        // 恢复振幅恰为 sqrt(I)：PRTF 恒为 1
        let mut measured = Volume::zeros([8, 8, 8]);
        let mut retrieved = Volume::zeros([8, 8, 8]);
        for z in 0..8 {
            for y in 0..8 {
                for x in 0..8 {
                    let v = 1.0 + (z + y + x) as f64;
                    measured.set(z, y, x, v);
                    retrieved.set(z, y, x, v.sqrt());
                }
            }
        }

        let result = prtf(&measured, &retrieved, 6).unwrap();
        for (v, c) in result.curve.value.iter().zip(result.curve.counts.iter()) {
            if *c > 0 {
                assert!((v - 1.0).abs() < 1e-9);
            }
        }
        assert!(result.cutoff.is_none());
    }

    #[test]
    fn test_prtf_decay_cutoff() {
        // 恢复振幅随 |q| 衰减，PRTF 应在某处跌破 1/e
        let mut measured = Volume::zeros([16, 16, 16]);
        let mut retrieved = Volume::zeros([16, 16, 16]);
        for z in 0..16 {
            for y in 0..16 {
                for x in 0..16 {
                    let qz = z as f64 - 8.0;
                    let qy = y as f64 - 8.0;
                    let qx = x as f64 - 8.0;
                    let qr = (qz * qz + qy * qy + qx * qx).sqrt();
                    measured.set(z, y, x, 4.0);
                    retrieved.set(z, y, x, 2.0 * (-qr / 2.0).exp());
                }
            }
        }

        let result = prtf(&measured, &retrieved, 8).unwrap();
        assert!(result.cutoff.is_some());
    }

    #[test]
    fn test_prtf_shape_mismatch() {
        let a = Volume::ones([4, 4, 4]);
        let b = Volume::ones([4, 4, 5]);
        assert!(prtf(&a, &b, 4).is_err());
    }
}
