//! # center 子命令实现
//!
//! 定位 Bragg 峰并把强度体与掩模裁剪/填充到 FFT 友好尺寸。
//!
//! ## 功能
//! - 最大值或质心定位，支持手动指定峰位
//! - 对称/非对称裁剪与填充
//! - 掩模同步变换
//! - 可选中心帧热图输出
//!
//! ## 依赖关系
//! - 使用 `cli/preprocess.rs` 定义的 CenterArgs
//! - 使用 `bragg/center.rs` 进行变换
//! - 使用 `io/npy.rs` 读写数组

use crate::bragg::center::{center_fft, CenterMode, Centering};
use crate::bragg::plot;
use crate::cli::preprocess::{CenterArgs, CenterModeArg, CenteringMethod};
use crate::error::{BcdiError, Result};
use crate::io;
use crate::models::{Frame, Volume};
use crate::utils::output;

use std::path::Path;

/// 执行 center 子命令
pub fn execute(args: CenterArgs) -> Result<()> {
    output::print_header("Bragg Peak Centering");

    output::print_info(&format!("Loading '{}'", args.input.display()));
    let data = io::read_volume(&args.input)?;
    output::print_success(&format!(
        "Loaded volume: {} x {} x {} (rocking x vertical x horizontal)",
        data.shape[0], data.shape[1], data.shape[2]
    ));

    let mask = match &args.mask {
        Some(path) => {
            output::print_info(&format!("Loading mask '{}'", path.display()));
            load_mask_volume(path, data.shape)?
        }
        None => Volume::zeros(data.shape),
    };

    let centering = match args.centering {
        CenteringMethod::Max => Centering::Max,
        CenteringMethod::Com => Centering::Com,
    };
    let mode = match args.mode {
        CenterModeArg::CropSym => CenterMode::CropSymmetric,
        CenterModeArg::CropAsym => CenterMode::CropAsymmetric,
        CenterModeArg::PadSym => CenterMode::PadSymmetric,
        CenterModeArg::PadAsym => CenterMode::PadAsymmetric,
        CenterModeArg::Skip => CenterMode::Skip,
    };

    output::print_info(&format!(
        "Centering: {} | mode: {}",
        args.centering, args.mode
    ));

    let outcome = center_fft(&data, &mask, centering, args.fix_bragg, mode, args.pad_size)?;

    output::print_info(&format!(
        "Bragg peak at (z, y, x) = ({}, {}, {})",
        outcome.peak.0, outcome.peak.1, outcome.peak.2
    ));
    output::print_info(&format!(
        "Output shape: {} x {} x {} | pad width: {:?}",
        outcome.data.shape[0], outcome.data.shape[1], outcome.data.shape[2], outcome.pad_width
    ));

    io::write_volume(&args.output, &outcome.data)?;
    output::print_saved("centered volume", &args.output);

    if args.mask.is_some() {
        io::write_volume(&args.mask_output, &outcome.mask)?;
        output::print_saved("transformed mask", &args.mask_output);
    }

    if let Some(plot_path) = &args.plot {
        save_central_frame_plot(&outcome.data, plot_path)?;
        output::print_saved("central frame heatmap", plot_path);
    }

    output::print_done("Centering complete");
    Ok(())
}

/// 读取掩模：2D 掩模沿摇摆轴广播，3D 掩模直接使用
///
/// 掩模尺寸必须与探测器帧一致，否则报错退出。
fn load_mask_volume(path: &Path, shape: [usize; 3]) -> Result<Volume> {
    match io::read_volume(path) {
        Ok(volume) => Ok(volume),
        Err(_) => {
            let frame = io::read_frame(path)?;
            if frame.shape != [shape[1], shape[2]] {
                return Err(BcdiError::ShapeMismatch {
                    context: format!(
                        "detector mask '{}' does not match the data frames",
                        path.display()
                    ),
                    expected: format!("[{}, {}]", shape[1], shape[2]),
                    actual: format!("{:?}", frame.shape),
                });
            }
            let mut volume = Volume::zeros(shape);
            for z in 0..shape[0] {
                for y in 0..shape[1] {
                    for x in 0..shape[2] {
                        volume.set(z, y, x, frame.get(y, x));
                    }
                }
            }
            Ok(volume)
        }
    }
}

/// 输出中心摇摆帧的对数热图
fn save_central_frame_plot(data: &Volume, path: &Path) -> Result<()> {
    let z = data.shape[0] / 2;
    let mut frame = Frame::zeros([data.shape[1], data.shape[2]]);
    for y in 0..data.shape[1] {
        for x in 0..data.shape[2] {
            frame.set(y, x, data.get(z, y, x));
        }
    }
    let use_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false);
    plot::generate_frame_heatmap(
        &frame,
        &format!("Central rocking frame (z = {})", z),
        path,
        1000,
        800,
        use_svg,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_mask_broadcast_along_rocking_axis() {
        let mut frame = Frame::zeros([3, 4]);
        frame.set(1, 2, 1.0);
        let path = temp_path("bcdikit_test_mask_2d.npy");
        io::write_frame(&path, &frame).unwrap();

        let volume = load_mask_volume(&path, [5, 3, 4]).unwrap();
        std::fs::remove_file(&path).ok();

        for z in 0..5 {
            assert_eq!(volume.get(z, 1, 2), 1.0);
            assert_eq!(volume.get(z, 0, 0), 0.0);
        }
    }

    #[test]
    fn test_mask_wrong_frame_shape_is_fatal() {
        let frame = Frame::zeros([3, 3]);
        let path = temp_path("bcdikit_test_mask_bad.npy");
        io::write_frame(&path, &frame).unwrap();

        let err = load_mask_volume(&path, [5, 3, 4]).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, BcdiError::ShapeMismatch { .. }));
    }
}
