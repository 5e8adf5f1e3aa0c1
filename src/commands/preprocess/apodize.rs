//! # apodize 子命令实现
//!
//! 相位恢复前对衍射数据施加切趾窗，抑制截断伪影。
//!
//! ## 依赖关系
//! - 使用 `cli/preprocess.rs` 定义的 ApodizeArgs
//! - 使用 `bragg/window.rs` 构造窗函数
//! - 使用 `io/npy.rs` 读写数组

use crate::bragg::plot;
use crate::bragg::window::{apodize, WindowKind};
use crate::cli::preprocess::{ApodizeArgs, WindowTypeArg};
use crate::error::{BcdiError, Result};
use crate::io;
use crate::utils::output;

/// 执行 apodize 子命令
pub fn execute(args: ApodizeArgs) -> Result<()> {
    output::print_header("Apodization");

    let kind = match args.window {
        WindowTypeArg::Gaussian => {
            if args.sigma.iter().any(|s| *s <= 0.0) {
                return Err(BcdiError::InvalidArgument(
                    "gaussian sigma must be strictly positive".to_string(),
                ));
            }
            WindowKind::Gaussian { sigma: args.sigma }
        }
        WindowTypeArg::Tukey => WindowKind::Tukey { alpha: args.alpha },
        WindowTypeArg::Blackman => WindowKind::Blackman,
    };

    output::print_info(&format!("Loading '{}'", args.input.display()));
    let data = io::read_volume(&args.input)?;
    output::print_success(&format!(
        "Loaded volume: {} x {} x {}",
        data.shape[0], data.shape[1], data.shape[2]
    ));
    output::print_info(&format!("Window: {}", args.window));

    let before = data.sum();
    let result = apodize(&data, kind);
    let after = result.sum();
    output::print_info(&format!(
        "Integrated intensity: {:.4e} -> {:.4e} (max preserved)",
        before, after
    ));

    io::write_volume(&args.output, &result)?;
    output::print_saved("apodized volume", &args.output);

    if let Some(path) = &args.plot {
        let summed = result.sum_axis0();
        let use_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);
        plot::generate_frame_heatmap(&summed, "Apodized summed pattern", path, 1000, 800, use_svg)?;
        output::print_saved("summed pattern heatmap", path);
    }

    output::print_done("Apodization complete");
    Ok(())
}
