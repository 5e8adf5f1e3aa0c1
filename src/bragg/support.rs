//! # 支撑掩模生成
//!
//! 从重建振幅（实空间模量）生成相位恢复用的二值支撑：
//! 可选 3x3x3 盒式平滑后，按最大值的给定比例阈值化。
//!
//! ## 依赖关系
//! - 被 `commands/mask.rs` 调用
//! - 使用 `models/volume.rs` 的 Volume

use crate::error::{BcdiError, Result};
use crate::models::Volume;

/// 支撑统计信息
#[derive(Debug, Clone)]
pub struct SupportStats {
    /// 支撑内体素数
    pub voxels_inside: usize,
    /// 支撑占整个网格的比例
    pub fill_fraction: f64,
    /// 实际使用的绝对阈值
    pub threshold_value: f64,
}

/// 3x3x3 盒式平滑（边界用实际存在的邻居平均）
pub fn box_smooth(data: &Volume) -> Volume {
    let [nz, ny, nx] = data.shape;
    let mut out = Volume::zeros(data.shape);

    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                let mut sum = 0.0;
                let mut count = 0usize;
                for dz in -1i64..=1 {
                    for dy in -1i64..=1 {
                        for dx in -1i64..=1 {
                            let zz = z as i64 + dz;
                            let yy = y as i64 + dy;
                            let xx = x as i64 + dx;
                            if zz < 0
                                || yy < 0
                                || xx < 0
                                || zz >= nz as i64
                                || yy >= ny as i64
                                || xx >= nx as i64
                            {
                                continue;
                            }
                            sum += data.get(zz as usize, yy as usize, xx as usize);
                            count += 1;
                        }
                    }
                }
                out.set(z, y, x, sum / count as f64);
            }
        }
    }
    out
}

/// 按最大值比例阈值化生成二值支撑
///
/// `threshold` 为相对阈值（0 到 1 之间，不含端点）。`smooth` 为 true
/// 时先做一次盒式平滑再阈值化，可抑制孤立噪声体素。
pub fn make_support(
    amplitude: &Volume,
    threshold: f64,
    smooth: bool,
) -> Result<(Volume, SupportStats)> {
    if !(threshold > 0.0 && threshold < 1.0) {
        return Err(BcdiError::InvalidRange(format!(
            "support threshold must be in (0, 1), got {}",
            threshold
        )));
    }

    let working = if smooth {
        box_smooth(amplitude)
    } else {
        amplitude.clone()
    };

    let max = working.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if !(max > 0.0) {
        return Err(BcdiError::InvalidArgument(
            "amplitude volume has no positive values".to_string(),
        ));
    }
    let threshold_value = threshold * max;

    let mut support = Volume::zeros(amplitude.shape);
    let mut voxels_inside = 0usize;
    for i in 0..working.data.len() {
        if working.data[i] >= threshold_value {
            support.data[i] = 1.0;
            voxels_inside += 1;
        }
    }

    let stats = SupportStats {
        voxels_inside,
        fill_fraction: voxels_inside as f64 / support.data.len() as f64,
        threshold_value,
    };
    Ok((support, stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_support_thresholds_at_fraction_of_max() {
        let mut amp = Volume::zeros([4, 4, 4]);
        amp.set(2, 2, 2, 10.0);
        amp.set(1, 1, 1, 4.0);
        amp.set(0, 0, 0, 1.0);

        let (support, stats) = make_support(&amp, 0.3, false).unwrap();
        assert_eq!(support.get(2, 2, 2), 1.0);
        assert_eq!(support.get(1, 1, 1), 1.0);
        assert_eq!(support.get(0, 0, 0), 0.0);
        assert_eq!(stats.voxels_inside, 2);
        assert!((stats.threshold_value - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_smoothing_suppresses_isolated_voxel() {
        // 孤立尖峰经平滑后低于相对阈值
        let mut amp = Volume::zeros([5, 5, 5]);
        amp.set(2, 2, 2, 100.0);
        for z in 0..3 {
            for y in 0..3 {
                for x in 0..3 {
                    if (z, y, x) != (2, 2, 2) {
                        amp.set(z, y, x, 50.0);
                    }
                }
            }
        }

        let (_, raw_stats) = make_support(&amp, 0.9, false).unwrap();
        let (_, smooth_stats) = make_support(&amp, 0.9, true).unwrap();
        assert_eq!(raw_stats.voxels_inside, 1);
        // 平滑后尖峰被摊平，支撑形状随邻域重新分布
        assert!(smooth_stats.threshold_value < raw_stats.threshold_value);
    }

    #[test]
    fn test_box_smooth_preserves_constant() {
        let amp = Volume::filled([4, 4, 4], 2.5);
        let smoothed = box_smooth(&amp);
        for v in &smoothed.data {
            assert!((v - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_threshold() {
        let amp = Volume::ones([2, 2, 2]);
        assert!(make_support(&amp, 0.0, false).is_err());
        assert!(make_support(&amp, 1.0, false).is_err());
        assert!(make_support(&amp, 1.5, false).is_err());
    }

    #[test]
    fn test_all_zero_amplitude_rejected() {
        let amp = Volume::zeros([2, 2, 2]);
        assert!(make_support(&amp, 0.5, false).is_err());
    }
}
