//! # simulate 子命令实现
//!
//! 生成运动学摇摆扫描合成数据，峰位与峰值已知，
//! 用于检验预处理与分析链路。
//!
//! ## 依赖关系
//! - 使用 `cli/simulate.rs` 定义的 SimulateArgs
//! - 使用 `bragg/kinematic.rs` 进行模拟
//! - 使用 `io/npy.rs` 写出数组

use crate::bragg::kinematic::{simulate_rocking, SimulationConfig};
use crate::bragg::plot;
use crate::cli::simulate::SimulateArgs;
use crate::error::Result;
use crate::io;
use crate::utils::output;

/// 执行 simulate 子命令
pub fn execute(args: SimulateArgs) -> Result<()> {
    output::print_header("Kinematic Rocking Scan Simulation");

    let config = SimulationConfig {
        shape: args.shape,
        cells: args.cells,
        range: args.range,
        peak_intensity: args.peak_intensity,
    };
    output::print_info(&format!(
        "Grid {:?}, crystal {:?} unit cells, reduced range ±{}",
        config.shape, config.cells, config.range
    ));

    let data = simulate_rocking(&config)?;
    let (z, y, x) = data.argmax();
    output::print_success(&format!(
        "Simulated peak at (z, y, x) = ({}, {}, {}) with intensity {:.4e}",
        z,
        y,
        x,
        data.get(z, y, x)
    ));

    io::write_volume(&args.output, &data)?;
    output::print_saved("simulated volume", &args.output);

    if let Some(path) = &args.plot {
        let summed = data.sum_axis0();
        let use_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);
        plot::generate_frame_heatmap(
            &summed,
            "Simulated summed pattern",
            path,
            1000,
            800,
            use_svg,
        )?;
        output::print_saved("summed pattern heatmap", path);
    }

    output::print_done("Simulation complete");
    Ok(())
}
