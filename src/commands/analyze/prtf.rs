//! # prtf 子命令实现
//!
//! 从实测强度与恢复振幅计算相位恢复传递函数。
//!
//! ## 功能
//! - 壳层 PRTF 曲线与 1/e 分辨率截止
//! - CSV 导出与可选曲线图
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的 PrtfArgs
//! - 使用 `bragg/shells.rs` 进行计算

use crate::bragg::{export, plot, shells};
use crate::cli::analyze::PrtfArgs;
use crate::error::Result;
use crate::io;
use crate::utils::output;

/// 执行 prtf 子命令
pub fn execute(args: PrtfArgs) -> Result<()> {
    output::print_header("Phase Retrieval Transfer Function");

    output::print_info(&format!(
        "Loading measured intensity '{}'",
        args.measured.display()
    ));
    let measured = io::read_volume(&args.measured)?;
    output::print_info(&format!(
        "Loading retrieved amplitude '{}'",
        args.retrieved.display()
    ));
    let retrieved = io::read_volume(&args.retrieved)?;
    output::print_success(&format!(
        "Volumes: {} x {} x {}",
        measured.shape[0], measured.shape[1], measured.shape[2]
    ));

    let result = shells::prtf(&measured, &retrieved, args.bins)?;

    match result.cutoff {
        Some(q) => output::print_success(&format!(
            "PRTF drops below 1/e at |q| = {:.4} (voxel units)",
            q
        )),
        None => output::print_warning("PRTF never drops below 1/e within the measured range"),
    }

    export::curve_to_csv(&result.curve, "prtf", &args.output)?;
    output::print_saved("PRTF curve", &args.output);

    if let Some(path) = &args.plot {
        let points = result.curve.points();
        let threshold = (-1.0f64).exp();
        let threshold_line = [
            (points.first().map(|(q, _)| *q).unwrap_or(0.0), threshold),
            (points.last().map(|(q, _)| *q).unwrap_or(1.0), threshold),
        ];
        let series = [
            plot::CurveSeries {
                label: "PRTF",
                points: &points,
            },
            plot::CurveSeries {
                label: "1/e",
                points: &threshold_line,
            },
        ];
        let plot_config = plot::CurvePlotConfig {
            title: "Phase retrieval transfer function",
            x_label: "|q| (voxel units)",
            y_label: "PRTF",
            log_y: false,
            ..Default::default()
        };
        plot::generate_curve_plot(&series, &plot_config, path, args.plot_format.is_svg())?;
        output::print_saved("PRTF plot", path);
    }

    output::print_done("PRTF complete");
    Ok(())
}
