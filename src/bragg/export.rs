//! # 分析结果导出
//!
//! 导出壳层曲线、PRTF 与拟合曲线到 CSV 和 XY 格式。
//!
//! ## 支持格式
//! - CSV: 含壳层统计（q, value, counts）或拟合参数的完整数据
//! - XY: 两列文本交换格式（q, value），`#` 开头为注释
//!
//! ## 依赖关系
//! - 被 `commands/analyze/*.rs` 调用
//! - 使用 `bragg/shells.rs` 的 ShellCurve 与 `bragg/fitting.rs` 的 FitResult
//! - 使用 `csv` 库写入 CSV 文件

use crate::bragg::fitting::FitResult;
use crate::bragg::shells::ShellCurve;
use crate::error::{BcdiError, Result};

use std::fs::File;
use std::io::Write;
use std::path::Path;

/// 导出壳层曲线为 CSV 格式
pub fn curve_to_csv(curve: &ShellCurve, value_name: &str, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(BcdiError::CsvError)?;

    wtr.write_record(["q", value_name, "counts"])
        .map_err(BcdiError::CsvError)?;

    for ((q, v), c) in curve.q.iter().zip(curve.value.iter()).zip(curve.counts.iter()) {
        wtr.write_record(&[
            format!("{:.6e}", q),
            format!("{:.6e}", v),
            c.to_string(),
        ])
        .map_err(BcdiError::CsvError)?;
    }

    wtr.flush().map_err(|e| BcdiError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出壳层曲线为 XY 格式（跳过空壳层）
pub fn curve_to_xy(
    curve: &ShellCurve,
    header_lines: &[String],
    output_path: &Path,
) -> Result<()> {
    let mut file = File::create(output_path).map_err(|e| BcdiError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    let write_err = |e: std::io::Error| BcdiError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    };

    for line in header_lines {
        writeln!(file, "# {}", line).map_err(write_err)?;
    }
    writeln!(file, "#").map_err(write_err)?;

    for (q, v) in curve.points() {
        writeln!(file, "{:.6e}\t{:.6e}", q, v).map_err(write_err)?;
    }

    Ok(())
}

/// 导出拟合结果为 CSV 格式（参数一行）
pub fn fit_to_csv(fit: &FitResult, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path).map_err(BcdiError::CsvError)?;

    wtr.write_record([
        "model",
        "height",
        "center",
        "fwhm",
        "background",
        "area",
        "r_squared",
    ])
    .map_err(BcdiError::CsvError)?;

    wtr.write_record(&[
        fit.model.to_string(),
        format!("{:.6e}", fit.height),
        format!("{:.6e}", fit.center),
        format!("{:.6e}", fit.fwhm),
        format!("{:.6e}", fit.background),
        format!("{:.6e}", fit.area),
        format!("{:.6}", fit.r_squared),
    ])
    .map_err(BcdiError::CsvError)?;

    wtr.flush().map_err(|e| BcdiError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出实测点与拟合曲线为 XY 格式
pub fn fit_curve_to_xy(
    x: &[f64],
    y: &[f64],
    y_fit: &[f64],
    fit: &FitResult,
    output_path: &Path,
) -> Result<()> {
    let mut file = File::create(output_path).map_err(|e| BcdiError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    let write_err = |e: std::io::Error| BcdiError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    };

    writeln!(file, "# Rocking curve fit: {}", fit.model).map_err(write_err)?;
    writeln!(
        file,
        "# center = {:.6e}, fwhm = {:.6e}, height = {:.6e}, background = {:.6e}",
        fit.center, fit.fwhm, fit.height, fit.background
    )
    .map_err(write_err)?;
    writeln!(file, "# Columns: x, measured, fitted").map_err(write_err)?;
    writeln!(file, "#").map_err(write_err)?;

    for i in 0..x.len() {
        writeln!(file, "{:.6e}\t{:.6e}\t{:.6e}", x[i], y[i], y_fit[i]).map_err(write_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample_curve() -> ShellCurve {
        ShellCurve {
            q: vec![0.5, 1.5, 2.5],
            value: vec![10.0, 5.0, 0.0],
            counts: vec![4, 2, 0],
        }
    }

    #[test]
    fn test_curve_csv_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join("bcdikit_test_curve.csv");
        curve_to_csv(&sample_curve(), "intensity", &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "q,intensity,counts");
        assert_eq!(lines.len(), 4);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_curve_xy_skips_empty_shells() {
        let dir = std::env::temp_dir();
        let path = dir.join("bcdikit_test_curve.xy");
        curve_to_xy(&sample_curve(), &["radial average".to_string()], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let data_lines: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
        // 第三个壳层为空，不应写出
        assert_eq!(data_lines.len(), 2);
        fs::remove_file(&path).ok();
    }
}
