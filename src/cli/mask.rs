//! # mask 子命令 CLI 定义
//!
//! 实空间掩模统一入口，包含多个子命令：
//! - `support`: 从重建振幅生成二值支撑
//! - `isosurface`: 等值面三角网格提取
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/mask.rs`

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// mask 主命令参数
#[derive(Args, Debug)]
pub struct MaskArgs {
    #[command(subcommand)]
    pub command: MaskCommands,
}

/// mask 子命令
#[derive(Subcommand, Debug)]
pub enum MaskCommands {
    /// Threshold a retrieved amplitude into a binary support
    Support(SupportArgs),

    /// Extract an isosurface mesh from a 3D scalar field
    Isosurface(IsosurfaceArgs),
}

// ─────────────────────────────────────────────────────────────
// support 子命令
// ─────────────────────────────────────────────────────────────

/// support 子命令参数
#[derive(Args, Debug)]
pub struct SupportArgs {
    /// Retrieved amplitude volume (.npy, 3D)
    pub input: PathBuf,

    /// Output path for the binary support (.npy)
    #[arg(short, long, default_value = "support.npy")]
    pub output: PathBuf,

    /// Relative threshold as a fraction of the maximum amplitude
    #[arg(long, default_value_t = 0.1)]
    pub threshold: f64,

    /// Apply a 3x3x3 box smoothing before thresholding
    #[arg(long, default_value_t = false)]
    pub smooth: bool,
}

// ─────────────────────────────────────────────────────────────
// isosurface 子命令
// ─────────────────────────────────────────────────────────────

/// isosurface 子命令参数
#[derive(Args, Debug)]
pub struct IsosurfaceArgs {
    /// Input scalar volume (.npy, 3D)
    pub input: PathBuf,

    /// Output path for the mesh (Wavefront OBJ)
    #[arg(short, long, default_value = "isosurface.obj")]
    pub output: PathBuf,

    /// Isosurface level as a fraction of the maximum value
    #[arg(long, default_value_t = 0.5)]
    pub level: f64,

    /// Voxel size per axis (z,y,x) in nm
    #[arg(long, value_parser = super::parse_f64_triplet, default_value = "1,1,1")]
    pub voxel_size: [f64; 3],
}
