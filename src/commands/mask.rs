//! # mask 命令实现
//!
//! 实空间掩模子命令：支撑生成与等值面提取。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `cli/mask.rs` 定义的参数
//! - 使用 `bragg/support.rs` 与 `bragg/isosurface.rs`

use crate::bragg::isosurface::{marching_tetrahedra, write_obj};
use crate::bragg::support::make_support;
use crate::cli::mask::{IsosurfaceArgs, MaskArgs, MaskCommands, SupportArgs};
use crate::error::{BcdiError, Result};
use crate::io;
use crate::utils::output;

use tabled::{Table, Tabled};

/// 执行 mask 子命令
pub fn execute(args: MaskArgs) -> Result<()> {
    match args.command {
        MaskCommands::Support(args) => execute_support(args),
        MaskCommands::Isosurface(args) => execute_isosurface(args),
    }
}

/// 支撑掩模生成
fn execute_support(args: SupportArgs) -> Result<()> {
    output::print_header("Support Mask Generation");

    output::print_info(&format!("Loading '{}'", args.input.display()));
    let amplitude = io::read_volume(&args.input)?;
    output::print_success(&format!(
        "Loaded amplitude: {} x {} x {}",
        amplitude.shape[0], amplitude.shape[1], amplitude.shape[2]
    ));

    if args.smooth {
        output::print_info("Applying 3x3x3 box smoothing before thresholding");
    }
    let (support, stats) = make_support(&amplitude, args.threshold, args.smooth)?;

    print_support_table(args.threshold, &stats);

    io::write_volume(&args.output, &support)?;
    output::print_saved("binary support", &args.output);

    output::print_done("Support generation complete");
    Ok(())
}

/// 等值面网格提取
fn execute_isosurface(args: IsosurfaceArgs) -> Result<()> {
    output::print_header("Isosurface Extraction");

    if !(args.level > 0.0 && args.level < 1.0) {
        return Err(BcdiError::InvalidRange(format!(
            "isosurface level must be in (0, 1), got {}",
            args.level
        )));
    }

    output::print_info(&format!("Loading '{}'", args.input.display()));
    let data = io::read_volume(&args.input)?;
    output::print_success(&format!(
        "Loaded volume: {} x {} x {}",
        data.shape[0], data.shape[1], data.shape[2]
    ));

    let max = data.max();
    if !(max > 0.0) {
        return Err(BcdiError::InvalidArgument(
            "volume has no positive values".to_string(),
        ));
    }
    let level = args.level * max;
    output::print_info(&format!(
        "Isosurface at {:.4e} ({:.0}% of max), voxel size {:?} nm",
        level,
        args.level * 100.0,
        args.voxel_size
    ));

    let mesh = marching_tetrahedra(&data, level, args.voxel_size)?;
    if mesh.is_empty() {
        output::print_warning("Isosurface is empty at this level");
    } else {
        output::print_success(&format!(
            "Extracted {} triangles ({} vertices)",
            mesh.triangles.len(),
            mesh.vertices.len()
        ));
    }

    write_obj(&mesh, &args.output)?;
    output::print_saved("isosurface mesh", &args.output);

    output::print_done("Isosurface extraction complete");
    Ok(())
}

/// 打印支撑统计表格
fn print_support_table(threshold: f64, stats: &crate::bragg::support::SupportStats) {
    #[derive(Tabled)]
    struct SupportRow {
        #[tabled(rename = "Relative threshold")]
        relative: String,
        #[tabled(rename = "Absolute threshold")]
        absolute: String,
        #[tabled(rename = "Voxels inside")]
        voxels: String,
        #[tabled(rename = "Fill fraction")]
        fill: String,
    }

    let row = SupportRow {
        relative: format!("{:.3}", threshold),
        absolute: format!("{:.4e}", stats.threshold_value),
        voxels: stats.voxels_inside.to_string(),
        fill: format!("{:.2}%", stats.fill_fraction * 100.0),
    };

    let table = Table::new(vec![row]);
    println!("{}", table);
}
