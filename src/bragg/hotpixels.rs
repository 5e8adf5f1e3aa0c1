//! # 坏点检测与屏蔽
//!
//! 探测器坏点（hot pixel）会在摇摆扫描的所有帧中出现异常计数。
//! 利用沿摇摆轴的均值与方差判据检出坏点：正常光子计数服从泊松统计，
//! 1/方差异常大的像素即为坏点。阈值按整条摇摆曲线单光子事件标定
//! （min_count = 1.0）。
//!
//! ## 依赖关系
//! - 被 `commands/preprocess/filter.rs` 调用
//! - 使用 `models/volume.rs` 的 Volume 与 Frame

use crate::error::{BcdiError, Result};
use crate::models::{Frame, Volume};

/// 按外部坏点表清零数据并更新掩模，返回屏蔽像素数
pub fn remove_hotpixels(data: &mut Volume, mask: &mut Frame, hotpixels: &Frame) -> Result<usize> {
    let detector_shape = [data.shape[1], data.shape[2]];
    if hotpixels.shape != detector_shape || mask.shape != detector_shape {
        return Err(BcdiError::ShapeMismatch {
            context: "hotpixel map and mask must match the detector frame".to_string(),
            expected: format!("{:?}", detector_shape),
            actual: format!("{:?} / {:?}", hotpixels.shape, mask.shape),
        });
    }

    let mut count = 0;
    for y in 0..detector_shape[0] {
        for x in 0..detector_shape[1] {
            if hotpixels.get(y, x) != 0.0 {
                count += 1;
                mask.set(y, x, 1.0);
                for z in 0..data.shape[0] {
                    data.set(z, y, x, 0.0);
                }
            }
        }
    }
    Ok(count)
}

/// 方差判据坏点检测
///
/// 对每个探测器像素计算沿摇摆轴的均值与 1/方差。无信号像素
/// （均值为 0，1/方差发散）以有限 1/方差的均值替代。
/// 1/方差超过单光子事件阈值的像素被判为坏点，在所有帧中清零。
/// 返回新检出的坏点数量。
pub fn check_pixels(data: &mut Volume, mask: &mut Frame) -> Result<usize> {
    let [nbz, nby, nbx] = data.shape;
    if mask.shape != [nby, nbx] {
        return Err(BcdiError::ShapeMismatch {
            context: "mask must match the detector frame".to_string(),
            expected: format!("{:?}", [nby, nbx]),
            actual: format!("{:?}", mask.shape),
        });
    }
    if nbz < 2 {
        return Err(BcdiError::InvalidArgument(
            "variance filter needs at least 2 frames".to_string(),
        ));
    }

    // 沿 axis 0 的均值与 1/方差（总体方差）
    let mut meandata = Frame::zeros([nby, nbx]);
    let mut vardata = Frame::zeros([nby, nbx]);
    for y in 0..nby {
        for x in 0..nbx {
            let mut sum = 0.0;
            let mut sum_sq = 0.0;
            for z in 0..nbz {
                let v = data.get(z, y, x);
                sum += v;
                sum_sq += v * v;
            }
            let mean = sum / nbz as f64;
            let var = sum_sq / nbz as f64 - mean * mean;
            meandata.set(y, x, mean);
            vardata.set(y, x, if var > 0.0 { 1.0 / var } else { f64::INFINITY });
        }
    }

    // 有限 1/方差的均值，用于替代无信号像素
    let mut finite_sum = 0.0;
    let mut finite_count = 0usize;
    for v in &vardata.data {
        if v.is_finite() {
            finite_sum += v;
            finite_count += 1;
        }
    }
    let var_mean = if finite_count > 0 {
        finite_sum / finite_count as f64
    } else {
        0.0
    };
    for y in 0..nby {
        for x in 0..nbx {
            if meandata.get(y, x) == 0.0 {
                vardata.set(y, x, var_mean);
            }
        }
    }

    // 单光子事件阈值
    let min_count = 1.0;
    let mean_threshold = min_count / nbz as f64;
    let var_threshold = ((nbz as f64 - 1.0) * mean_threshold * mean_threshold
        + (min_count - mean_threshold) * (min_count - mean_threshold))
        / nbz as f64;

    let mut count = 0;
    for y in 0..nby {
        for x in 0..nbx {
            if vardata.get(y, x) > 1.0 / var_threshold {
                count += 1;
                mask.set(y, x, 1.0);
                for z in 0..nbz {
                    data.set(z, y, x, 0.0);
                }
            }
        }
    }
    Ok(count)
}

/// 均值滤波：处理孤立的零值像素
///
/// 对每个零值像素检查 3x3 邻域：邻域计数总和 > 24 且非零邻居数
/// >= `nb_neighbours` 时，`interpolate` 为 true 则以邻域均值插值，
/// 否则标记进掩模。返回处理的像素数。
pub fn mean_filter(
    frame: &mut Frame,
    mask: &mut Frame,
    nb_neighbours: usize,
    interpolate: bool,
) -> Result<usize> {
    if frame.shape != mask.shape {
        return Err(BcdiError::ShapeMismatch {
            context: "frame and mask must have the same shape".to_string(),
            expected: format!("{:?}", frame.shape),
            actual: format!("{:?}", mask.shape),
        });
    }

    let [ny, nx] = frame.shape;
    let mut treated = 0;

    for y in 0..ny {
        for x in 0..nx {
            if frame.get(y, x) != 0.0 {
                continue;
            }

            let mut sum = 0.0;
            let mut nonzero = 0usize;
            for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    let yy = y as i64 + dy;
                    let xx = x as i64 + dx;
                    if yy < 0 || xx < 0 || yy >= ny as i64 || xx >= nx as i64 {
                        continue;
                    }
                    let v = frame.get(yy as usize, xx as usize);
                    sum += v;
                    if v != 0.0 {
                        nonzero += 1;
                    }
                }
            }

            // 每个邻居至少约 3 个光子才认为是真实信号中的空洞
            if sum > 24.0 && nonzero >= nb_neighbours {
                treated += 1;
                if interpolate {
                    frame.set(y, x, sum / nonzero as f64);
                    mask.set(y, x, 0.0);
                } else {
                    mask.set(y, x, 1.0);
                }
            }
        }
    }
    Ok(treated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_hotpixels() {
        let mut data = Volume::ones([3, 4, 4]);
        let mut mask = Frame::zeros([4, 4]);
        let mut hot = Frame::zeros([4, 4]);
        hot.set(2, 2, 1.0);

        let n = remove_hotpixels(&mut data, &mut mask, &hot).unwrap();
        assert_eq!(n, 1);
        assert_eq!(mask.get(2, 2), 1.0);
        for z in 0..3 {
            assert_eq!(data.get(z, 2, 2), 0.0);
        }
        assert_eq!(data.get(0, 1, 1), 1.0);
    }

    #[test]
    fn test_check_pixels_flags_constant_hot_pixel() {
        // 正常像素沿摇摆轴有起伏，坏点数值恒定（方差为 0）
        let nbz = 10;
        let mut data = Volume::zeros([nbz, 4, 4]);
        for z in 0..nbz {
            for y in 0..4 {
                for x in 0..4 {
                    data.set(z, y, x, (z % 3) as f64 + 1.0);
                }
            }
        }
        for z in 0..nbz {
            data.set(z, 1, 1, 5000.0);
        }
        let mut mask = Frame::zeros([4, 4]);

        let n = check_pixels(&mut data, &mut mask).unwrap();
        assert!(n >= 1);
        assert_eq!(mask.get(1, 1), 1.0);
        assert_eq!(data.get(0, 1, 1), 0.0);
    }

    #[test]
    fn test_check_pixels_needs_frames() {
        let mut data = Volume::zeros([1, 4, 4]);
        let mut mask = Frame::zeros([4, 4]);
        assert!(check_pixels(&mut data, &mut mask).is_err());
    }

    #[test]
    fn test_mean_filter_interpolates_hole() {
        let mut frame = Frame::zeros([3, 3]);
        for y in 0..3 {
            for x in 0..3 {
                frame.set(y, x, 10.0);
            }
        }
        frame.set(1, 1, 0.0);
        let mut mask = Frame::zeros([3, 3]);
        mask.set(1, 1, 1.0);

        let n = mean_filter(&mut frame, &mut mask, 6, true).unwrap();
        assert_eq!(n, 1);
        assert!((frame.get(1, 1) - 10.0).abs() < 1e-12);
        assert_eq!(mask.get(1, 1), 0.0);
    }

    #[test]
    fn test_mean_filter_masks_without_interpolation() {
        let mut frame = Frame::zeros([3, 3]);
        for y in 0..3 {
            for x in 0..3 {
                frame.set(y, x, 10.0);
            }
        }
        frame.set(1, 1, 0.0);
        let mut mask = Frame::zeros([3, 3]);

        let n = mean_filter(&mut frame, &mut mask, 6, false).unwrap();
        assert_eq!(n, 1);
        assert_eq!(mask.get(1, 1), 1.0);
        assert_eq!(frame.get(1, 1), 0.0);
    }

    #[test]
    fn test_mean_filter_ignores_dark_region() {
        // 低计数区域的零像素不应被处理
        let mut frame = Frame::zeros([3, 3]);
        frame.set(0, 0, 1.0);
        let mut mask = Frame::zeros([3, 3]);
        let n = mean_filter(&mut frame, &mut mask, 2, true).unwrap();
        assert_eq!(n, 0);
    }
}
