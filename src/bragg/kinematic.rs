//! # 运动学衍射模拟
//!
//! 有限晶体的运动学（单次散射）衍射强度：沿三个晶轴的 Laue 函数乘积
//!
//! I(q) = Π_i sin²(N_i u_i / 2) / sin²(u_i / 2)
//!
//! 其中 N_i 为沿第 i 轴的晶胞数，u_i 为偏离 Bragg 条件的约化坐标。
//! 用于生成已知答案的合成摇摆数据，检验预处理与分析链路。
//!
//! ## 依赖关系
//! - 被 `commands/simulate.rs` 调用
//! - 使用 `models/volume.rs` 的 Volume

use crate::error::{BcdiError, Result};
use crate::models::Volume;

/// 模拟参数
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// 输出网格 [nz, ny, nx]
    pub shape: [usize; 3],
    /// 沿各轴的晶胞数 [Nz, Ny, Nx]
    pub cells: [usize; 3],
    /// 约化坐标范围：u_i 取 [-range, range]
    pub range: f64,
    /// 峰值归一化强度
    pub peak_intensity: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            shape: [64, 64, 64],
            cells: [20, 20, 20],
            range: 0.5,
            peak_intensity: 1e6,
        }
    }
}

/// 单轴 Laue 函数 sin²(n u / 2) / sin²(u / 2)
///
/// u -> 2πk 的奇点处取极限值 n²。
pub fn laue_intensity(u: f64, n: usize) -> f64 {
    let n_f = n as f64;
    let denom = (u / 2.0).sin();
    if denom.abs() < 1e-9 {
        return n_f * n_f;
    }
    let num = (n_f * u / 2.0).sin();
    (num / denom) * (num / denom)
}

/// 生成运动学摇摆扫描数据
///
/// 峰位于网格几何中心，峰值强度缩放到 `peak_intensity`。
pub fn simulate_rocking(config: &SimulationConfig) -> Result<Volume> {
    if config.shape.iter().any(|n| *n < 2) {
        return Err(BcdiError::InvalidArgument(
            "simulation grid must be at least 2 along each axis".to_string(),
        ));
    }
    if config.cells.iter().any(|n| *n == 0) {
        return Err(BcdiError::InvalidArgument(
            "cell counts must be positive".to_string(),
        ));
    }
    if config.range <= 0.0 {
        return Err(BcdiError::InvalidRange(
            "reduced coordinate range must be positive".to_string(),
        ));
    }
    if config.peak_intensity <= 0.0 {
        return Err(BcdiError::InvalidArgument(
            "peak intensity must be positive".to_string(),
        ));
    }

    let [nz, ny, nx] = config.shape;
    let [cz, cy, cx] = config.cells;
    // 理论峰值 Π N_i²，用于归一化
    let peak = (cz * cz * cy * cy * cx * cx) as f64;
    let scale = config.peak_intensity / peak;

    // 约化坐标：第 i 格对应 u = -range + 2*range*i/(n-1)
    let coord = |i: usize, n: usize| -> f64 {
        -config.range + 2.0 * config.range * i as f64 / (n - 1) as f64
    };

    let mut data = Volume::zeros(config.shape);
    for z in 0..nz {
        let lz = laue_intensity(coord(z, nz), cz);
        for y in 0..ny {
            let ly = laue_intensity(coord(y, ny), cy);
            for x in 0..nx {
                let lx = laue_intensity(coord(x, nx), cx);
                data.set(z, y, x, scale * lz * ly * lx);
            }
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_laue_limit_at_origin() {
        // u -> 0 时极限为 n²
        assert!((laue_intensity(0.0, 10) - 100.0).abs() < 1e-9);
        assert!((laue_intensity(1e-12, 7) - 49.0).abs() < 1e-6);
    }

    #[test]
    fn test_laue_first_zero() {
        // 第一个零点在 u = 2π/n
        let u = 2.0 * std::f64::consts::PI / 10.0;
        assert!(laue_intensity(u, 10).abs() < 1e-9);
    }

    #[test]
    fn test_simulate_peak_at_center() {
        let config = SimulationConfig {
            shape: [17, 17, 17],
            cells: [8, 8, 8],
            range: 0.5,
            peak_intensity: 1000.0,
        };
        let data = simulate_rocking(&config).unwrap();

        // 奇数网格的几何中心恰为 u = 0
        let (z, y, x) = data.argmax();
        assert_eq!((z, y, x), (8, 8, 8));
        assert!((data.get(8, 8, 8) - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn test_simulate_symmetric() {
        let config = SimulationConfig {
            shape: [9, 9, 9],
            cells: [5, 5, 5],
            range: 0.4,
            peak_intensity: 1.0,
        };
        let data = simulate_rocking(&config).unwrap();
        // Laue 函数为偶函数
        assert!((data.get(0, 4, 4) - data.get(8, 4, 4)).abs() < 1e-12);
        assert!((data.get(4, 0, 4) - data.get(4, 8, 4)).abs() < 1e-12);
    }

    #[test]
    fn test_simulate_rejects_bad_config() {
        let mut config = SimulationConfig::default();
        config.range = 0.0;
        assert!(simulate_rocking(&config).is_err());

        let mut config = SimulationConfig::default();
        config.cells = [0, 10, 10];
        assert!(simulate_rocking(&config).is_err());
    }
}
