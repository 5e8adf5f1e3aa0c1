//! # fit 子命令实现
//!
//! 摇摆曲线峰形拟合：积分每帧强度得到 1D 曲线，
//! 插值估计 FWHM 后用最小二乘精修峰模型。
//!
//! ## 功能
//! - 3D 摇摆体自动积分，或直接读入 1D 曲线
//! - Gaussian / Lorentzian / pseudo-Voigt 模型
//! - 参数表格输出、CSV/XY 导出、可选曲线图
//!
//! ## 依赖关系
//! - 使用 `cli/analyze.rs` 定义的 FitArgs
//! - 使用 `bragg/fitting.rs` 进行拟合

use crate::bragg::fitting::{estimate_fwhm, fit_peak, moments, sort_by_x, FitResult, PeakModel};
use crate::bragg::{export, plot};
use crate::cli::analyze::{FitArgs, FitModelArg};
use crate::error::{BcdiError, Result};
use crate::io;
use crate::utils::output;

use std::path::Path;
use tabled::{Table, Tabled};

/// 执行 fit 子命令
pub fn execute(args: FitArgs) -> Result<()> {
    output::print_header("Rocking Curve Fit");

    // 读取曲线：3D 体逐帧积分，1D NPY 或两列文本直接使用
    output::print_info(&format!("Loading '{}'", args.input.display()));
    let (curve_x, y) = load_curve(&args.input)?;
    output::print_success(&format!("Rocking curve with {} points", y.len()));

    let x = match &args.angles {
        Some(path) => {
            output::print_info(&format!("Loading angles '{}'", path.display()));
            let angles = io::read_series(path)?;
            if angles.len() != y.len() {
                return Err(BcdiError::ShapeMismatch {
                    context: "angles and rocking curve lengths differ".to_string(),
                    expected: format!("{} angles", y.len()),
                    actual: format!("{} angles", angles.len()),
                });
            }
            angles
        }
        None => curve_x.unwrap_or_else(|| (0..y.len()).map(|i| i as f64).collect()),
    };

    // 递减角度扫描按角度升序重排
    let (x, y) = sort_by_x(&x, &y);

    let rough_fwhm = estimate_fwhm(&x, &y, 5)?;
    let (centroid, variance) = moments(&x, &y)?;
    output::print_info(&format!(
        "Estimates: FWHM {:.4} (interpolated), centroid {:.4}, variance {:.4}",
        rough_fwhm, centroid, variance
    ));

    let model = match args.model {
        FitModelArg::Gaussian => PeakModel::Gaussian,
        FitModelArg::Lorentzian => PeakModel::Lorentzian,
        FitModelArg::PseudoVoigt => PeakModel::PseudoVoigt,
    };
    let fit = fit_peak(&x, &y, model)?;

    if fit.r_squared < 0.9 {
        output::print_warning(&format!(
            "Poor fit quality (R² = {:.4}); check the peak model",
            fit.r_squared
        ));
    }
    print_fit_table(&fit);

    export::fit_to_csv(&fit, &args.output)?;
    output::print_saved("fit parameters", &args.output);

    let y_fit: Vec<f64> = x.iter().map(|xi| fit.evaluate(*xi)).collect();

    if let Some(path) = &args.curve_output {
        export::fit_curve_to_xy(&x, &y, &y_fit, &fit, path)?;
        output::print_saved("fit curve", path);
    }

    if let Some(path) = &args.plot {
        let measured: Vec<(f64, f64)> = x.iter().cloned().zip(y.iter().cloned()).collect();
        let fitted: Vec<(f64, f64)> = x.iter().cloned().zip(y_fit.iter().cloned()).collect();
        let series = [
            plot::CurveSeries {
                label: "measured",
                points: &measured,
            },
            plot::CurveSeries {
                label: "fitted",
                points: &fitted,
            },
        ];
        let plot_config = plot::CurvePlotConfig {
            title: "Rocking curve fit",
            x_label: "Rocking angle",
            y_label: "Integrated intensity",
            log_y: false,
            ..Default::default()
        };
        plot::generate_curve_plot(&series, &plot_config, path, args.plot_format.is_svg())?;
        output::print_saved("fit plot", path);
    }

    output::print_done("Fit complete");
    Ok(())
}

/// 读取摇摆曲线
///
/// 两列文本（.xy/.dat/.txt）给出 (x, y)；1D NPY 给出 y；
/// 3D NPY 逐帧积分得到 y。
fn load_curve(input: &Path) -> Result<(Option<Vec<f64>>, Vec<f64>)> {
    let is_text = input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_lowercase().as_str(), "xy" | "dat" | "txt"))
        .unwrap_or(false);
    if is_text {
        let (x, y) = read_text_curve(input)?;
        return Ok((Some(x), y));
    }

    if let Ok(series) = io::read_series(input) {
        return Ok((None, series));
    }
    let volume = io::read_volume(input)?;
    let curve = (0..volume.shape[0])
        .map(|z| {
            let mut sum = 0.0;
            for y in 0..volume.shape[1] {
                for x in 0..volume.shape[2] {
                    sum += volume.get(z, y, x);
                }
            }
            sum
        })
        .collect();
    Ok((None, curve))
}

/// 读取两列文本曲线，`#` 开头为注释
fn read_text_curve(path: &Path) -> Result<(Vec<f64>, Vec<f64>)> {
    let content = std::fs::read_to_string(path).map_err(|e| BcdiError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let mut x = Vec::new();
    let mut y = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut cols = line.split_whitespace();
        let (xs, ys) = match (cols.next(), cols.next()) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                return Err(BcdiError::ParseError {
                    format: "XY".to_string(),
                    path: path.display().to_string(),
                    reason: format!("line {}: expected 2 columns", lineno + 1),
                })
            }
        };
        let parse = |s: &str| -> Result<f64> {
            s.parse().map_err(|_| BcdiError::ParseError {
                format: "XY".to_string(),
                path: path.display().to_string(),
                reason: format!("line {}: invalid number '{}'", lineno + 1, s),
            })
        };
        x.push(parse(xs)?);
        y.push(parse(ys)?);
    }

    if x.is_empty() {
        return Err(BcdiError::ParseError {
            format: "XY".to_string(),
            path: path.display().to_string(),
            reason: "no data lines".to_string(),
        });
    }
    Ok((x, y))
}

/// 打印拟合参数表格
fn print_fit_table(fit: &FitResult) {
    #[derive(Tabled)]
    struct FitRow {
        #[tabled(rename = "Model")]
        model: String,
        #[tabled(rename = "Height")]
        height: String,
        #[tabled(rename = "Center")]
        center: String,
        #[tabled(rename = "FWHM")]
        fwhm: String,
        #[tabled(rename = "Background")]
        background: String,
        #[tabled(rename = "Area")]
        area: String,
        #[tabled(rename = "R²")]
        r_squared: String,
    }

    let row = FitRow {
        model: fit.model.to_string(),
        height: format!("{:.4e}", fit.height),
        center: format!("{:.4}", fit.center),
        fwhm: format!("{:.4}", fit.fwhm),
        background: format!("{:.4e}", fit.background),
        area: format!("{:.4e}", fit.area),
        r_squared: format!("{:.5}", fit.r_squared),
    };

    let table = Table::new(vec![row]);
    println!("{}", table);
}
