//! # 监视器归一化
//!
//! 摇摆扫描中入射光强随时间波动，用监视器（入射强度计数）逐帧归一。
//! 默认归一到监视器最小值（乘数 <= 1，不放大噪声）；也可归一到最大值。
//!
//! ## 依赖关系
//! - 被 `commands/preprocess/normalize.rs` 调用
//! - 使用 `models/volume.rs` 的 Volume

use crate::error::{BcdiError, Result};
use crate::models::Volume;

/// 归一化参考
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormReference {
    /// monitor.min() / monitor，不放大噪声
    Min,
    /// monitor / monitor.max()
    Max,
}

/// 按监视器值归一化摇摆序列，返回应用于各帧的乘数
pub fn normalize_dataset(
    data: &mut Volume,
    monitor: &[f64],
    reference: NormReference,
) -> Result<Vec<f64>> {
    let nbz = data.shape[0];
    if monitor.len() != nbz {
        return Err(BcdiError::ShapeMismatch {
            context: "frame count and monitor length differ".to_string(),
            expected: format!("{} monitor values", nbz),
            actual: format!("{} monitor values", monitor.len()),
        });
    }
    if monitor.iter().any(|v| *v <= 0.0) {
        return Err(BcdiError::InvalidArgument(
            "monitor values must be strictly positive".to_string(),
        ));
    }

    let factors: Vec<f64> = match reference {
        NormReference::Min => {
            let min = monitor.iter().cloned().fold(f64::INFINITY, f64::min);
            monitor.iter().map(|m| min / m).collect()
        }
        NormReference::Max => {
            let max = monitor.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            monitor.iter().map(|m| m / max).collect()
        }
    };

    for z in 0..nbz {
        let factor = factors[z];
        for y in 0..data.shape[1] {
            for x in 0..data.shape[2] {
                let v = data.get(z, y, x);
                data.set(z, y, x, v * factor);
            }
        }
    }

    Ok(factors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_to_min() {
        let mut data = Volume::ones([3, 2, 2]);
        let monitor = vec![100.0, 200.0, 400.0];
        let factors = normalize_dataset(&mut data, &monitor, NormReference::Min).unwrap();

        assert!((factors[0] - 1.0).abs() < 1e-12);
        assert!((factors[1] - 0.5).abs() < 1e-12);
        assert!((data.get(2, 0, 0) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_to_max() {
        let mut data = Volume::ones([2, 1, 1]);
        let monitor = vec![50.0, 100.0];
        let factors = normalize_dataset(&mut data, &monitor, NormReference::Max).unwrap();
        assert!((factors[0] - 0.5).abs() < 1e-12);
        assert!((data.get(1, 0, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_monitor_length_mismatch() {
        let mut data = Volume::ones([3, 1, 1]);
        let err = normalize_dataset(&mut data, &[1.0, 2.0], NormReference::Min).unwrap_err();
        assert!(matches!(err, BcdiError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_nonpositive_monitor_rejected() {
        let mut data = Volume::ones([2, 1, 1]);
        let err = normalize_dataset(&mut data, &[1.0, 0.0], NormReference::Min).unwrap_err();
        assert!(matches!(err, BcdiError::InvalidArgument(_)));
    }
}
