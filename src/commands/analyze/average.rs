//! # average 子命令实现
//!
//! 3D 衍射图样的 q 壳层径向平均。
//!
//! ## 功能
//! - 支持单文件和批量目录处理
//! - 并行计算（rayon）
//! - CSV 导出与可选对数曲线图
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的 AverageArgs
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `bragg/shells.rs` 进行计算

use crate::batch::{BatchRunner, FileCollector, ProcessResult};
use crate::bragg::{export, plot, shells};
use crate::cli::analyze::{AverageArgs, OriginArg};
use crate::cli::PlotFormat;
use crate::error::{BcdiError, Result};
use crate::io;
use crate::utils::output;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 执行 average 子命令
pub fn execute(args: AverageArgs) -> Result<()> {
    output::print_header("Radial Shell Average");

    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive);

    if collector.is_single_file() {
        execute_single_file(&args)
    } else if args.input.is_dir() {
        execute_batch(&args, &collector)
    } else {
        Err(BcdiError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 单文件模式
fn execute_single_file(args: &AverageArgs) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", args.input.display()));

    let config = AverageConfig::from_args(args);
    average_one(&args.input, &args.output, args.plot.as_deref(), &config)?;
    output::print_saved("shell curve", &args.output);
    if let Some(path) = &args.plot {
        output::print_saved("shell curve plot", path);
    }

    output::print_done("Radial average complete");
    Ok(())
}

/// 批量处理模式
fn execute_batch(args: &AverageArgs, collector: &FileCollector) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let files = collector.collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }
    output::print_info(&format!("Found {} data files", files.len()));

    fs::create_dir_all(&args.output).map_err(|e| BcdiError::FileWriteError {
        path: args.output.display().to_string(),
        source: e,
    })?;

    let config = Arc::new(BatchAverageConfig {
        output_dir: args.output.clone(),
        overwrite: args.overwrite,
        make_plot: args.plot.is_some(),
        plot_format: args.plot_format,
        average: AverageConfig::from_args(args),
    });

    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file| process_batch_file(file, &config));
    result.report();

    Ok(())
}

/// 单次径向平均的配置
struct AverageConfig {
    origin: shells::ShellOrigin,
    dq: [f64; 3],
    bins: usize,
    min_value: f64,
    plot_format: PlotFormat,
}

impl AverageConfig {
    fn from_args(args: &AverageArgs) -> Self {
        AverageConfig {
            origin: match args.origin {
                OriginArg::Center => shells::ShellOrigin::Center,
                OriginArg::Max => shells::ShellOrigin::Max,
            },
            dq: args.dq,
            bins: args.bins,
            min_value: args.min_value,
            plot_format: args.plot_format,
        }
    }
}

/// 批量处理配置
struct BatchAverageConfig {
    output_dir: PathBuf,
    overwrite: bool,
    make_plot: bool,
    plot_format: PlotFormat,
    average: AverageConfig,
}

/// 读取、平均并导出单个文件
fn average_one(
    input: &Path,
    output: &Path,
    plot_path: Option<&Path>,
    config: &AverageConfig,
) -> Result<()> {
    let data = io::read_volume(input)?;
    let curve = shells::radial_average(
        &data,
        config.origin,
        config.dq,
        config.bins,
        config.min_value,
    )?;

    export::curve_to_csv(&curve, "intensity", output)?;

    if let Some(path) = plot_path {
        let points = curve.points();
        let series = [plot::CurveSeries {
            label: "radial average",
            points: &points,
        }];
        let plot_config = plot::CurvePlotConfig {
            title: "Radial shell average",
            x_label: "|q| (1/nm)",
            y_label: "Intensity",
            log_y: true,
            ..Default::default()
        };
        plot::generate_curve_plot(&series, &plot_config, path, config.plot_format.is_svg())?;
    }

    Ok(())
}

/// 处理批量模式中的单个文件
fn process_batch_file(input: &PathBuf, config: &Arc<BatchAverageConfig>) -> ProcessResult {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let output_file = config.output_dir.join(format!("{}_radial.csv", stem));

    if output_file.exists() && !config.overwrite {
        return ProcessResult::Skipped(format!(
            "Output exists, skipping: {}",
            output_file.display()
        ));
    }

    let plot_file = if config.make_plot {
        let ext = if config.plot_format.is_svg() {
            "svg"
        } else {
            "png"
        };
        Some(config.output_dir.join(format!("{}_radial.{}", stem, ext)))
    } else {
        None
    };

    match average_one(input, &output_file, plot_file.as_deref(), &config.average) {
        Ok(_) => ProcessResult::Success(format!(
            "{} -> {}",
            input.display(),
            output_file.display()
        )),
        Err(e) => ProcessResult::Failed(input.display().to_string(), e.to_string()),
    }
}
