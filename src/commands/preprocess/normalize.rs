//! # normalize 子命令实现
//!
//! 按入射光监视器逐帧归一化摇摆扫描数据。
//!
//! ## 依赖关系
//! - 使用 `cli/preprocess.rs` 定义的 NormalizeArgs
//! - 使用 `bragg/normalize.rs` 进行归一化
//! - 使用 `io/npy.rs` 读写数组

use crate::bragg::normalize::{normalize_dataset, NormReference};
use crate::cli::preprocess::{NormRefArg, NormalizeArgs};
use crate::error::Result;
use crate::io;
use crate::utils::output;

/// 执行 normalize 子命令
pub fn execute(args: NormalizeArgs) -> Result<()> {
    output::print_header("Monitor Normalization");

    output::print_info(&format!("Loading '{}'", args.input.display()));
    let mut data = io::read_volume(&args.input)?;
    output::print_success(&format!("Loaded {} rocking frames", data.shape[0]));

    output::print_info(&format!("Loading monitor '{}'", args.monitor.display()));
    let monitor = io::read_series(&args.monitor)?;

    let reference = match args.reference {
        NormRefArg::Min => NormReference::Min,
        NormRefArg::Max => NormReference::Max,
    };

    let factors = normalize_dataset(&mut data, &monitor, reference)?;

    let f_min = factors.iter().cloned().fold(f64::INFINITY, f64::min);
    let f_max = factors.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    output::print_info(&format!(
        "Applied per-frame factors in [{:.4}, {:.4}]",
        f_min, f_max
    ));

    io::write_volume(&args.output, &data)?;
    output::print_saved("normalized volume", &args.output);

    output::print_done("Normalization complete");
    Ok(())
}
