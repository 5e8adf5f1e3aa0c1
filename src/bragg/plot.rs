//! # 曲线与切片图生成
//!
//! 使用 `plotters` 库生成分析结果图：1D 曲线（壳层平均、PRTF、
//! 摇摆曲线拟合）与探测器帧的对数强度热图。
//!
//! ## 功能
//! - 多序列曲线，可选对数纵轴
//! - 2D 帧的 log10 热图
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/analyze/*.rs` 与 `commands/preprocess/center.rs` 调用
//! - 使用 `models/volume.rs` 的 Frame
//! - 使用 `plotters` 渲染图表

use crate::error::{BcdiError, Result};
use crate::models::Frame;

use plotters::prelude::*;
use std::path::Path;

/// 一条曲线
pub struct CurveSeries<'a> {
    pub label: &'a str,
    pub points: &'a [(f64, f64)],
}

/// 曲线图参数
pub struct CurvePlotConfig<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub log_y: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for CurvePlotConfig<'_> {
    fn default() -> Self {
        CurvePlotConfig {
            title: "",
            x_label: "q (1/nm)",
            y_label: "Intensity",
            log_y: false,
            width: 1200,
            height: 800,
        }
    }
}

const SERIES_COLORS: [RGBColor; 4] = [
    RGBColor(0, 102, 204),
    RGBColor(204, 51, 0),
    RGBColor(0, 153, 76),
    RGBColor(153, 51, 204),
];

/// 生成曲线图
pub fn generate_curve_plot(
    series: &[CurveSeries<'_>],
    config: &CurvePlotConfig<'_>,
    output_path: &Path,
    use_svg: bool,
) -> Result<()> {
    if series.iter().all(|s| s.points.is_empty()) {
        return Err(BcdiError::InvalidArgument(
            "nothing to plot: all series are empty".to_string(),
        ));
    }

    if use_svg {
        let root = SVGBackend::new(output_path, (config.width, config.height)).into_drawing_area();
        draw_curve_chart(&root, series, config)?;
        root.present().map_err(|e| BcdiError::Other(e.to_string()))?;
    } else {
        let root =
            BitMapBackend::new(output_path, (config.width, config.height)).into_drawing_area();
        draw_curve_chart(&root, series, config)?;
        root.present().map_err(|e| BcdiError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 绘制曲线图的核心逻辑
fn draw_curve_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &[CurveSeries<'_>],
    config: &CurvePlotConfig<'_>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;

    // 确定范围
    let mut x_min = f64::INFINITY;
    let mut x_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    for s in series {
        for (x, y) in s.points {
            x_min = x_min.min(*x);
            x_max = x_max.max(*x);
            // 对数轴只统计正值
            if !config.log_y || *y > 0.0 {
                y_min = y_min.min(*y);
                y_max = y_max.max(*y);
            }
        }
    }
    if !(x_max > x_min) {
        x_max = x_min + 1.0;
    }
    if !y_min.is_finite() || !y_max.is_finite() {
        return Err(BcdiError::InvalidArgument(
            "no positive values to plot on a log axis".to_string(),
        ));
    }
    if !(y_max > y_min) {
        y_max = y_min + 1.0;
    }

    // 对数轴转 log10 坐标绘制
    let transform = |y: f64| -> f64 {
        if config.log_y {
            y.max(y_min).log10()
        } else {
            y
        }
    };
    let (ty_min, ty_max) = (transform(y_min), transform(y_max));
    let y_pad = (ty_max - ty_min) * 0.05;

    let mut chart = ChartBuilder::on(root)
        .caption(config.title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, (ty_min - y_pad)..(ty_max + y_pad))
        .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;

    let y_desc = if config.log_y {
        format!("log10 {}", config.y_label)
    } else {
        config.y_label.to_string()
    };
    chart
        .configure_mesh()
        .x_desc(config.x_label)
        .y_desc(y_desc)
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;

    for (i, s) in series.iter().enumerate() {
        let color = SERIES_COLORS[i % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(
                s.points.iter().map(|(x, y)| (*x, transform(*y))),
                color.stroke_width(2),
            ))
            .map_err(|e| BcdiError::Other(format!("{:?}", e)))?
            .label(s.label)
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    if series.len() > 1 {
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .label_font(("sans-serif", 14))
            .draw()
            .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;
    }

    Ok(())
}

/// 生成探测器帧的 log10 强度热图
pub fn generate_frame_heatmap(
    frame: &Frame,
    title: &str,
    output_path: &Path,
    width: u32,
    height: u32,
    use_svg: bool,
) -> Result<()> {
    if use_svg {
        let root = SVGBackend::new(output_path, (width, height)).into_drawing_area();
        draw_heatmap(&root, frame, title)?;
        root.present().map_err(|e| BcdiError::Other(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, (width, height)).into_drawing_area();
        draw_heatmap(&root, frame, title)?;
        root.present().map_err(|e| BcdiError::Other(e.to_string()))?;
    }
    Ok(())
}

/// 绘制热图的核心逻辑
fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    frame: &Frame,
    title: &str,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;

    let [ny, nx] = frame.shape;
    let log_max = frame.max().max(1.0).log10();

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0..nx, 0..ny)
        .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("Detector X (pixel)")
        .y_desc("Detector Y (pixel)")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .disable_mesh()
        .draw()
        .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;

    chart
        .draw_series((0..ny).flat_map(|y| {
            (0..nx).map(move |x| {
                let v = frame.get(y, x);
                let t = if v > 0.0 && log_max > 0.0 {
                    (v.log10().max(0.0) / log_max).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                Rectangle::new([(x, y), (x + 1, y + 1)], intensity_color(t).filled())
            })
        }))
        .map_err(|e| BcdiError::Other(format!("{:?}", e)))?;

    Ok(())
}

/// 黑-蓝-黄-白强度色标
fn intensity_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        // 黑到蓝
        let s = t * 2.0;
        RGBColor(0, (102.0 * s) as u8, (204.0 * s) as u8)
    } else {
        // 蓝到黄白
        let s = (t - 0.5) * 2.0;
        RGBColor(
            (255.0 * s) as u8,
            (102.0 + 153.0 * s) as u8,
            (204.0 * (1.0 - s) + 51.0 * s) as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_series_rejected() {
        let series = [CurveSeries {
            label: "empty",
            points: &[],
        }];
        let config = CurvePlotConfig::default();
        let result = generate_curve_plot(&series, &config, Path::new("/tmp/none.png"), false);
        assert!(result.is_err());
    }

    #[test]
    fn test_intensity_color_endpoints() {
        let low = intensity_color(0.0);
        let high = intensity_color(1.0);
        assert_eq!((low.0, low.1, low.2), (0, 0, 0));
        assert_eq!(high.0, 255);
    }
}
