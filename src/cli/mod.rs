//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `preprocess`: 摇摆扫描数据预处理（嵌套子命令）
//!   - `center`: 以 Bragg 峰为中心裁剪/补零到 FFT 友好尺寸
//!   - `filter`: 坏点检测与均值滤波
//!   - `normalize`: 监视器归一化
//!   - `apodize`: 切趾窗
//! - `analyze`: 分析功能（嵌套子命令）
//!   - `average`: q 壳层径向平均
//!   - `prtf`: 相位恢复传递函数
//!   - `fit`: 摇摆曲线峰拟合
//! - `simulate`: 运动学衍射模拟
//! - `mask`: 实空间掩模（嵌套子命令）
//!   - `support`: 支撑掩模生成
//!   - `isosurface`: 等值面网格提取
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: preprocess, analyze, simulate, mask

pub mod analyze;
pub mod mask;
pub mod preprocess;
pub mod simulate;

use clap::{Parser, Subcommand, ValueEnum};

/// bcdikit - Bragg 相干衍射成像统一工具箱
#[derive(Parser)]
#[command(name = "bcdikit")]
#[command(version)]
#[command(about = "A unified Bragg coherent diffraction imaging analysis toolkit", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Preprocess rocking-scan diffraction data (.npy)
    Preprocess(preprocess::PreprocessArgs),

    /// Analyze diffraction data and phase retrieval results
    Analyze(analyze::AnalyzeArgs),

    /// Simulate a kinematic rocking scan from a finite crystal
    Simulate(simulate::SimulateArgs),

    /// Build real-space masks from retrieved amplitudes
    Mask(mask::MaskArgs),
}

/// 图像输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum PlotFormat {
    /// PNG image (publication quality)
    #[default]
    Png,
    /// SVG vector image
    Svg,
}

impl PlotFormat {
    pub fn is_svg(self) -> bool {
        matches!(self, PlotFormat::Svg)
    }
}

/// 解析逗号分隔的三元组（如 "128,256,256"）
pub fn parse_usize_triplet(input: &str) -> Result<[usize; 3], String> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!(
            "Expected 3 comma-separated values (z,y,x), got '{}'",
            input
        ));
    }
    let mut out = [0usize; 3];
    for (i, p) in parts.iter().enumerate() {
        out[i] = p
            .parse::<usize>()
            .map_err(|_| format!("Invalid integer '{}' in '{}'", p, input))?;
    }
    Ok(out)
}

/// 解析逗号分隔的浮点三元组（如 "0.5,0.5,0.5"）
pub fn parse_f64_triplet(input: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!(
            "Expected 3 comma-separated values (z,y,x), got '{}'",
            input
        ));
    }
    let mut out = [0.0f64; 3];
    for (i, p) in parts.iter().enumerate() {
        out[i] = p
            .parse::<f64>()
            .map_err(|_| format!("Invalid number '{}' in '{}'", p, input))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_usize_triplet() {
        assert_eq!(parse_usize_triplet("128, 256,256").unwrap(), [128, 256, 256]);
        assert!(parse_usize_triplet("1,2").is_err());
        assert!(parse_usize_triplet("1,2,abc").is_err());
    }

    #[test]
    fn test_parse_f64_triplet() {
        assert_eq!(parse_f64_triplet("0.5,1.0,2.0").unwrap(), [0.5, 1.0, 2.0]);
        assert!(parse_f64_triplet("0.5").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
