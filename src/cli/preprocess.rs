//! # preprocess 子命令 CLI 定义
//!
//! 摇摆扫描数据预处理统一入口，包含多个子命令：
//! - `center`: 以 Bragg 峰为中心裁剪/补零到 FFT 友好尺寸
//! - `filter`: 坏点检测与均值滤波
//! - `normalize`: 监视器归一化
//! - `apodize`: 切趾窗
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/preprocess/` 相应模块

use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// Preprocess 主命令
// ─────────────────────────────────────────────────────────────

/// preprocess 主命令参数
#[derive(Args, Debug)]
pub struct PreprocessArgs {
    #[command(subcommand)]
    pub command: PreprocessCommands,
}

/// preprocess 子命令
#[derive(Subcommand, Debug)]
pub enum PreprocessCommands {
    /// Center the Bragg peak and crop/pad to FFT-friendly dimensions
    Center(CenterArgs),

    /// Detect hot pixels and filter isolated dead pixels
    Filter(FilterArgs),

    /// Normalize frames by the incident beam monitor
    Normalize(NormalizeArgs),

    /// Apply an apodization window before phase retrieval
    Apodize(ApodizeArgs),
}

// ─────────────────────────────────────────────────────────────
// center 子命令
// ─────────────────────────────────────────────────────────────

/// Bragg 峰定位方法
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum CenteringMethod {
    /// Position of the maximum intensity
    #[default]
    Max,
    /// Center of mass of the intensity
    Com,
}

impl std::fmt::Display for CenteringMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CenteringMethod::Max => write!(f, "max"),
            CenteringMethod::Com => write!(f, "com"),
        }
    }
}

/// 中心化模式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum CenterModeArg {
    /// Crop symmetrically around the peak
    #[default]
    CropSym,
    /// Crop without recentering the peak
    CropAsym,
    /// Pad symmetrically around the peak to --pad-size
    PadSym,
    /// Pad at the end of each axis
    PadAsym,
    /// Leave the array untouched
    Skip,
}

impl std::fmt::Display for CenterModeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CenterModeArg::CropSym => write!(f, "crop-sym"),
            CenterModeArg::CropAsym => write!(f, "crop-asym"),
            CenterModeArg::PadSym => write!(f, "pad-sym"),
            CenterModeArg::PadAsym => write!(f, "pad-asym"),
            CenterModeArg::Skip => write!(f, "skip"),
        }
    }
}

/// center 子命令参数
#[derive(Args, Debug)]
pub struct CenterArgs {
    /// Input intensity volume (.npy, 3D, axes z=rocking y=vertical x=outboard)
    pub input: PathBuf,

    /// Output path for the centered volume
    #[arg(short, long, default_value = "centered.npy")]
    pub output: PathBuf,

    /// Detector mask to carry through the same crop/pad (.npy, 2D or 3D)
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Output path for the transformed mask
    #[arg(long, default_value = "centered_mask.npy")]
    pub mask_output: PathBuf,

    /// How to locate the Bragg peak
    #[arg(long, value_enum, default_value = "max")]
    pub centering: CenteringMethod,

    /// Centering mode
    #[arg(long, value_enum, default_value = "crop-sym")]
    pub mode: CenterModeArg,

    /// Override the detected peak position (z,y,x)
    #[arg(long, value_parser = super::parse_usize_triplet)]
    pub fix_bragg: Option<[usize; 3]>,

    /// Target shape for padding modes (z,y,x); must be FFT-friendly
    #[arg(long, value_parser = super::parse_usize_triplet)]
    pub pad_size: Option<[usize; 3]>,

    /// Save a log-scale heatmap of the central frame
    #[arg(long)]
    pub plot: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────
// filter 子命令
// ─────────────────────────────────────────────────────────────

/// filter 子命令参数
#[derive(Args, Debug)]
pub struct FilterArgs {
    /// Input intensity volume (.npy, 3D)
    pub input: PathBuf,

    /// Output path for the filtered volume
    #[arg(short, long, default_value = "filtered.npy")]
    pub output: PathBuf,

    /// Known hot pixel map (.npy, nonzero marks a hot pixel)
    #[arg(long)]
    pub hotpixels: Option<PathBuf>,

    /// Existing detector mask to update (.npy, 2D)
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Output path for the updated mask
    #[arg(long, default_value = "filtered_mask.npy")]
    pub mask_output: PathBuf,

    /// Skip the variance-based hot pixel detection
    #[arg(long, default_value_t = false)]
    pub no_variance_check: bool,

    /// Apply the mean filter to isolated zero pixels of each frame
    #[arg(long, default_value_t = false)]
    pub mean_filter: bool,

    /// Minimum nonzero neighbours for the mean filter
    #[arg(long, default_value_t = 6)]
    pub nb_neighbours: usize,

    /// Interpolate treated pixels instead of masking them
    #[arg(long, default_value_t = false)]
    pub interpolate: bool,
}

// ─────────────────────────────────────────────────────────────
// normalize 子命令
// ─────────────────────────────────────────────────────────────

/// 归一化参考
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum NormRefArg {
    /// Scale to the minimum monitor value (never amplifies noise)
    #[default]
    Min,
    /// Scale to the maximum monitor value
    Max,
}

/// normalize 子命令参数
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Input intensity volume (.npy, 3D)
    pub input: PathBuf,

    /// Monitor values, one per rocking frame (.npy, 1D)
    pub monitor: PathBuf,

    /// Output path for the normalized volume
    #[arg(short, long, default_value = "normalized.npy")]
    pub output: PathBuf,

    /// Normalization reference
    #[arg(long, value_enum, default_value = "min")]
    pub reference: NormRefArg,
}

// ─────────────────────────────────────────────────────────────
// apodize 子命令
// ─────────────────────────────────────────────────────────────

/// 切趾窗类型
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum WindowTypeArg {
    /// Gaussian window
    #[default]
    Gaussian,
    /// Tukey (tapered cosine) window
    Tukey,
    /// Blackman window
    Blackman,
}

impl std::fmt::Display for WindowTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WindowTypeArg::Gaussian => write!(f, "gaussian"),
            WindowTypeArg::Tukey => write!(f, "tukey"),
            WindowTypeArg::Blackman => write!(f, "blackman"),
        }
    }
}

/// apodize 子命令参数
#[derive(Args, Debug)]
pub struct ApodizeArgs {
    /// Input intensity volume (.npy, 3D)
    pub input: PathBuf,

    /// Output path for the apodized volume
    #[arg(short, long, default_value = "apodized.npy")]
    pub output: PathBuf,

    /// Window type
    #[arg(long, value_enum, default_value = "gaussian")]
    pub window: WindowTypeArg,

    /// Gaussian sigma per axis in reduced coordinates (z,y,x)
    #[arg(long, value_parser = super::parse_f64_triplet, default_value = "0.3,0.3,0.3")]
    pub sigma: [f64; 3],

    /// Tukey taper fraction alpha (0 = rectangular, 1 = Hann)
    #[arg(long, default_value_t = 0.5)]
    pub alpha: f64,

    /// Save a log-scale heatmap of the summed apodized pattern
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
