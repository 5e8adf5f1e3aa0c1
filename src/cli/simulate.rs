//! # simulate 子命令 CLI 定义
//!
//! 运动学衍射模拟参数。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/simulate.rs`

use clap::Args;
use std::path::PathBuf;

/// simulate 子命令参数
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Output path for the simulated volume (.npy)
    #[arg(short, long, default_value = "simulated.npy")]
    pub output: PathBuf,

    /// Output grid shape (z,y,x)
    #[arg(long, value_parser = super::parse_usize_triplet, default_value = "64,64,64")]
    pub shape: [usize; 3],

    /// Number of unit cells along each axis (z,y,x)
    #[arg(long, value_parser = super::parse_usize_triplet, default_value = "20,20,20")]
    pub cells: [usize; 3],

    /// Reduced coordinate range: each axis spans [-range, range]
    #[arg(long, default_value_t = 0.5)]
    pub range: f64,

    /// Peak intensity after normalization (photon counts)
    #[arg(long, default_value_t = 1e6)]
    pub peak_intensity: f64,

    /// Save a log-scale heatmap of the summed rocking pattern
    #[arg(long)]
    pub plot: Option<PathBuf>,
}
