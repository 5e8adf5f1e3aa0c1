//! # filter 子命令实现
//!
//! 坏点检测与孤立零值像素滤波。
//!
//! ## 功能
//! - 外部坏点表屏蔽
//! - 方差判据自动检出坏点
//! - 逐帧均值滤波（可选插值）
//! - 掩模累积更新
//!
//! ## 依赖关系
//! - 使用 `cli/preprocess.rs` 定义的 FilterArgs
//! - 使用 `bragg/hotpixels.rs` 进行检测
//! - 使用 `io/npy.rs` 读写数组

use crate::bragg::hotpixels::{check_pixels, mean_filter, remove_hotpixels};
use crate::cli::preprocess::FilterArgs;
use crate::error::Result;
use crate::io;
use crate::models::Frame;
use crate::utils::output;

/// 执行 filter 子命令
pub fn execute(args: FilterArgs) -> Result<()> {
    output::print_header("Detector Filtering");

    output::print_info(&format!("Loading '{}'", args.input.display()));
    let mut data = io::read_volume(&args.input)?;
    let detector_shape = [data.shape[1], data.shape[2]];
    output::print_success(&format!(
        "Loaded {} frames of {} x {} pixels",
        data.shape[0], detector_shape[0], detector_shape[1]
    ));

    let mut mask = match &args.mask {
        Some(path) => {
            output::print_info(&format!("Loading mask '{}'", path.display()));
            io::read_frame(path)?
        }
        None => Frame::zeros(detector_shape),
    };

    // 外部坏点表
    if let Some(path) = &args.hotpixels {
        output::print_info(&format!("Applying hot pixel map '{}'", path.display()));
        let hot = io::read_frame(path)?;
        let n = remove_hotpixels(&mut data, &mut mask, &hot)?;
        output::print_success(&format!("Masked {} pixels from the hot pixel map", n));
    }

    // 方差判据
    if !args.no_variance_check {
        let n = check_pixels(&mut data, &mut mask)?;
        output::print_success(&format!("Variance check flagged {} hot pixels", n));
    } else {
        output::print_skip("Variance check disabled");
    }

    // 逐帧均值滤波
    if args.mean_filter {
        let mut treated = 0usize;
        for z in 0..data.shape[0] {
            let mut frame = Frame::zeros(detector_shape);
            for y in 0..detector_shape[0] {
                for x in 0..detector_shape[1] {
                    frame.set(y, x, data.get(z, y, x));
                }
            }
            treated += mean_filter(&mut frame, &mut mask, args.nb_neighbours, args.interpolate)?;
            for y in 0..detector_shape[0] {
                for x in 0..detector_shape[1] {
                    data.set(z, y, x, frame.get(y, x));
                }
            }
        }
        let action = if args.interpolate {
            "interpolated"
        } else {
            "masked"
        };
        output::print_success(&format!(
            "Mean filter {} {} isolated pixels across {} frames",
            action,
            treated,
            data.shape[0]
        ));
    }

    output::print_info(&format!(
        "Mask now covers {} pixels",
        mask.count_nonzero()
    ));

    io::write_volume(&args.output, &data)?;
    output::print_saved("filtered volume", &args.output);
    io::write_frame(&args.mask_output, &mask)?;
    output::print_saved("updated mask", &args.mask_output);

    output::print_done("Filtering complete");
    Ok(())
}
