//! # analyze 子命令 CLI 定义
//!
//! 分析功能统一入口，包含多个子命令：
//! - `average`: q 壳层径向平均
//! - `prtf`: 相位恢复传递函数
//! - `fit`: 摇摆曲线峰拟合
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/analyze/` 相应模块

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use super::PlotFormat;

// ─────────────────────────────────────────────────────────────
// Analyze 主命令
// ─────────────────────────────────────────────────────────────

/// analyze 主命令参数
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(subcommand)]
    pub command: AnalyzeCommands,
}

/// analyze 子命令
#[derive(Subcommand, Debug)]
pub enum AnalyzeCommands {
    /// Radial shell average of a 3D diffraction pattern
    Average(AverageArgs),

    /// Phase retrieval transfer function from measured and retrieved data
    Prtf(PrtfArgs),

    /// Fit a peak model to a 1D rocking curve
    Fit(FitArgs),
}

// ─────────────────────────────────────────────────────────────
// average 子命令
// ─────────────────────────────────────────────────────────────

/// 径向平均原点
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OriginArg {
    /// Geometric center of the array
    #[default]
    Center,
    /// Position of the maximum intensity (Bragg peak)
    Max,
}

/// average 子命令参数
#[derive(Args, Debug)]
pub struct AverageArgs {
    /// Input: intensity volume (.npy) or directory containing volumes
    pub input: PathBuf,

    /// Output: file path (single mode) or directory (batch mode)
    #[arg(short, long, default_value = "radial_average.csv")]
    pub output: PathBuf,

    /// Shell origin
    #[arg(long, value_enum, default_value = "center")]
    pub origin: OriginArg,

    /// Reciprocal-space step per axis (z,y,x), in 1/nm per voxel
    #[arg(long, value_parser = super::parse_f64_triplet, default_value = "1,1,1")]
    pub dq: [f64; 3],

    /// Number of q shells
    #[arg(long, default_value_t = 100)]
    pub bins: usize,

    /// Ignore voxels below this value (masked voxels are negative)
    #[arg(long, default_value_t = 0.0)]
    pub min_value: f64,

    /// Save a log-scale plot of the shell curve
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Plot image format
    #[arg(long, value_enum, default_value = "png")]
    pub plot_format: PlotFormat,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for input files (batch mode)
    #[arg(long, default_value = "*.npy")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto, batch mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories (batch mode)
    #[arg(long, default_value_t = false)]
    pub recursive: bool,

    /// Overwrite existing output files
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,
}

// ─────────────────────────────────────────────────────────────
// prtf 子命令
// ─────────────────────────────────────────────────────────────

/// prtf 子命令参数
#[derive(Args, Debug)]
pub struct PrtfArgs {
    /// Measured intensity volume (.npy, 3D, masked voxels negative)
    pub measured: PathBuf,

    /// Retrieved diffraction amplitude volume (.npy, same shape)
    pub retrieved: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "prtf.csv")]
    pub output: PathBuf,

    /// Number of q shells
    #[arg(long, default_value_t = 50)]
    pub bins: usize,

    /// Save a plot of the PRTF curve with the 1/e line
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Plot image format
    #[arg(long, value_enum, default_value = "png")]
    pub plot_format: PlotFormat,
}

// ─────────────────────────────────────────────────────────────
// fit 子命令
// ─────────────────────────────────────────────────────────────

/// 峰模型
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum FitModelArg {
    /// Gaussian peak
    #[default]
    Gaussian,
    /// Lorentzian peak
    Lorentzian,
    /// Pseudo-Voigt (50% Gaussian + 50% Lorentzian)
    PseudoVoigt,
}

impl std::fmt::Display for FitModelArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitModelArg::Gaussian => write!(f, "gaussian"),
            FitModelArg::Lorentzian => write!(f, "lorentzian"),
            FitModelArg::PseudoVoigt => write!(f, "pseudo-voigt"),
        }
    }
}

/// fit 子命令参数
#[derive(Args, Debug)]
pub struct FitArgs {
    /// Input: 3D rocking volume (.npy, integrated per frame), 1D curve (.npy)
    /// or 2-column text curve (.xy/.dat/.txt)
    pub input: PathBuf,

    /// Rocking angles, one per frame (.npy, 1D); defaults to frame index
    #[arg(long)]
    pub angles: Option<PathBuf>,

    /// Output CSV path for the fitted parameters
    #[arg(short, long, default_value = "rocking_fit.csv")]
    pub output: PathBuf,

    /// Peak model
    #[arg(long, value_enum, default_value = "gaussian")]
    pub model: FitModelArg,

    /// Also export the measured and fitted curve (XY format)
    #[arg(long)]
    pub curve_output: Option<PathBuf>,

    /// Save a plot of the measured points and fitted curve
    #[arg(long)]
    pub plot: Option<PathBuf>,

    /// Plot image format
    #[arg(long, value_enum, default_value = "png")]
    pub plot_format: PlotFormat,
}
