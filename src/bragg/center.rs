//! # Bragg 峰居中与 FFT 裁剪/填充
//!
//! 相位恢复前的标准预处理：确定 Bragg 峰位置（最大值或质心），
//! 把数据与掩模裁剪或零填充到满足 FFT 要求的尺寸。
//!
//! 掩模与数据同步变换；填充进掩模的像素记为 1（视为被屏蔽）。
//!
//! ## 依赖关系
//! - 被 `commands/preprocess/center.rs` 调用
//! - 使用 `bragg/fftshape.rs` 计算 FFT 友好尺寸
//! - 使用 `models/volume.rs` 的 Volume

use crate::bragg::fftshape::{higher_primes, smaller_primes};
use crate::error::{BcdiError, Result};
use crate::models::Volume;

/// 预处理的 FFT 尺寸约束：最大素因子 7，必含因子 2
pub const MAXPRIME: usize = 7;
pub const REQUIRED_DIVIDERS: &[usize] = &[2];

/// Bragg 峰定位方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Centering {
    /// 绝对值最大处
    Max,
    /// 强度质心
    Com,
}

/// 裁剪/填充模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterMode {
    /// 裁剪，Bragg 峰居中
    CropSymmetric,
    /// 裁剪，不移动峰位（围绕几何中心）
    CropAsymmetric,
    /// 按用户给定尺寸填充，Bragg 峰居中
    PadSymmetric,
    /// 填充到最近的 FFT 友好尺寸，不移动峰位
    PadAsymmetric,
    /// 不做处理
    Skip,
}

/// 居中结果
#[derive(Debug)]
pub struct CenterOutcome {
    /// 变换后的数据
    pub data: Volume,
    /// 变换后的掩模
    pub mask: Volume,
    /// 各端填充像素数 [z0, z1, y0, y1, x0, x1]
    pub pad_width: [usize; 6],
    /// 使用的 Bragg 峰位置 (z, y, x)
    pub peak: (usize, usize, usize),
}

/// 居中并裁剪/填充数据与掩模
pub fn center_fft(
    data: &Volume,
    mask: &Volume,
    centering: Centering,
    fix_bragg: Option<[usize; 3]>,
    mode: CenterMode,
    pad_size: Option<[usize; 3]>,
) -> Result<CenterOutcome> {
    if data.shape != mask.shape {
        return Err(BcdiError::ShapeMismatch {
            context: "data and mask must have the same shape".to_string(),
            expected: format!("{:?}", data.shape),
            actual: format!("{:?}", mask.shape),
        });
    }

    let [nbz, nby, nbx] = data.shape;

    let (iz0, iy0, ix0) = match fix_bragg {
        Some([z, y, x]) => {
            if z >= nbz || y >= nby || x >= nbx {
                return Err(BcdiError::InvalidArgument(format!(
                    "fixed Bragg position ({}, {}, {}) outside data shape {:?}",
                    z, y, x, data.shape
                )));
            }
            (z, y, x)
        }
        None => match centering {
            Centering::Max => data.argmax(),
            Centering::Com => {
                let (cz, cy, cx) = data.center_of_mass();
                (
                    cz.round() as usize,
                    cy.round() as usize,
                    cx.round() as usize,
                )
            }
        },
    };

    // 围绕峰位的最大对称盒
    let max_nz = 2 * iz0.min(nbz - iz0);
    let max_ny = 2 * iy0.min(nby - iy0);
    let max_nx = 2 * ix0.min(nbx - ix0);

    // 峰贴边时无法居中，退化为不处理
    let mode = if (max_nz == 0 || max_ny == 0 || max_nx == 0) && mode != CenterMode::Skip {
        CenterMode::Skip
    } else {
        mode
    };

    match mode {
        CenterMode::CropSymmetric => {
            let nz1 = smaller_primes(max_nz, MAXPRIME, REQUIRED_DIVIDERS);
            let ny1 = smaller_primes(max_ny, MAXPRIME, REQUIRED_DIVIDERS);
            let nx1 = smaller_primes(max_nx, MAXPRIME, REQUIRED_DIVIDERS);
            if nz1 == 0 || ny1 == 0 || nx1 == 0 {
                return Err(BcdiError::Other(
                    "symmetric box too small for FFT requirements".to_string(),
                ));
            }
            let out_data = data.crop(
                iz0 - nz1 / 2,
                iz0 + nz1 / 2,
                iy0 - ny1 / 2,
                iy0 + ny1 / 2,
                ix0 - nx1 / 2,
                ix0 + nx1 / 2,
            );
            let out_mask = mask.crop(
                iz0 - nz1 / 2,
                iz0 + nz1 / 2,
                iy0 - ny1 / 2,
                iy0 + ny1 / 2,
                ix0 - nx1 / 2,
                ix0 + nx1 / 2,
            );
            Ok(CenterOutcome {
                data: out_data,
                mask: out_mask,
                pad_width: [0; 6],
                peak: (iz0, iy0, ix0),
            })
        }
        CenterMode::CropAsymmetric => {
            let nz1 = smaller_primes(nbz, MAXPRIME, REQUIRED_DIVIDERS);
            let ny1 = smaller_primes(nby, MAXPRIME, REQUIRED_DIVIDERS);
            let nx1 = smaller_primes(nbx, MAXPRIME, REQUIRED_DIVIDERS);
            if nz1 == 0 || ny1 == 0 || nx1 == 0 {
                return Err(BcdiError::Other(
                    "data too small for FFT requirements".to_string(),
                ));
            }
            let out_data = data.crop(
                nbz / 2 - nz1 / 2,
                nbz / 2 + nz1 / 2,
                nby / 2 - ny1 / 2,
                nby / 2 + ny1 / 2,
                nbx / 2 - nx1 / 2,
                nbx / 2 + nx1 / 2,
            );
            let out_mask = mask.crop(
                nbz / 2 - nz1 / 2,
                nbz / 2 + nz1 / 2,
                nby / 2 - ny1 / 2,
                nby / 2 + ny1 / 2,
                nbx / 2 - nx1 / 2,
                nbx / 2 + nx1 / 2,
            );
            Ok(CenterOutcome {
                data: out_data,
                mask: out_mask,
                pad_width: [0; 6],
                peak: (iz0, iy0, ix0),
            })
        }
        CenterMode::PadSymmetric => {
            let pad_size = pad_size.ok_or_else(|| {
                BcdiError::InvalidArgument(
                    "pad-size is required for symmetric padding".to_string(),
                )
            })?;
            for (axis, (&ps, &nb)) in pad_size.iter().zip(data.shape.iter()).enumerate() {
                if ps < 2 {
                    return Err(BcdiError::InvalidArgument(format!(
                        "pad size {} (axis {}) must be at least 2",
                        ps, axis
                    )));
                }
                if ps != higher_primes(ps, MAXPRIME, REQUIRED_DIVIDERS) {
                    return Err(BcdiError::InvalidArgument(format!(
                        "pad size {} (axis {}) does not meet FFT requirements",
                        ps, axis
                    )));
                }
                if ps < nb {
                    return Err(BcdiError::InvalidArgument(format!(
                        "pad size {} (axis {}) smaller than data size {}",
                        ps, axis, nb
                    )));
                }
            }

            // 左侧填充使峰位移到 pad_size/2，整体不超过 pad_size
            let left = |ps: usize, nb: usize, i0: usize| -> usize {
                (ps / 2).saturating_sub(i0).min(ps - nb)
            };
            let lz = left(pad_size[0], nbz, iz0);
            let ly = left(pad_size[1], nby, iy0);
            let lx = left(pad_size[2], nbx, ix0);
            let pad_width = [
                lz,
                pad_size[0] - nbz - lz,
                ly,
                pad_size[1] - nby - ly,
                lx,
                pad_size[2] - nbx - lx,
            ];
            Ok(CenterOutcome {
                data: data.zero_pad(pad_width, false),
                mask: mask.zero_pad(pad_width, true),
                pad_width,
                peak: (iz0, iy0, ix0),
            })
        }
        CenterMode::PadAsymmetric => {
            let split = |nb: usize| -> (usize, usize) {
                let n1 = higher_primes(nb, MAXPRIME, REQUIRED_DIVIDERS);
                let diff = n1 - nb;
                let left = (diff + diff % 2) / 2;
                (left, diff - left)
            };
            let (lz, rz) = split(nbz);
            let (ly, ry) = split(nby);
            let (lx, rx) = split(nbx);
            let pad_width = [lz, rz, ly, ry, lx, rx];
            Ok(CenterOutcome {
                data: data.zero_pad(pad_width, false),
                mask: mask.zero_pad(pad_width, true),
                pad_width,
                peak: (iz0, iy0, ix0),
            })
        }
        CenterMode::Skip => Ok(CenterOutcome {
            data: data.clone(),
            mask: mask.clone(),
            pad_width: [0; 6],
            peak: (iz0, iy0, ix0),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_volume(shape: [usize; 3], peak: (usize, usize, usize)) -> Volume {
        let mut vol = Volume::zeros(shape);
        vol.set(peak.0, peak.1, peak.2, 1000.0);
        vol
    }

    #[test]
    fn test_crop_symmetric_centers_peak() {
        let data = peak_volume([20, 20, 20], (12, 8, 10));
        let mask = Volume::zeros([20, 20, 20]);

        let out = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::CropSymmetric,
            None,
        )
        .unwrap();

        assert_eq!(out.peak, (12, 8, 10));
        // 峰位于输出的几何中心
        let [nz, ny, nx] = out.data.shape;
        assert_eq!(out.data.argmax(), (nz / 2, ny / 2, nx / 2));
    }

    #[test]
    fn test_crop_asymmetric_fft_shape() {
        let data = peak_volume([19, 21, 23], (9, 10, 11));
        let mask = Volume::zeros([19, 21, 23]);

        let out = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::CropAsymmetric,
            None,
        )
        .unwrap();

        for &n in &out.data.shape {
            assert!(crate::bragg::fftshape::try_smaller_primes(n, 7, &[2]));
        }
    }

    #[test]
    fn test_pad_symmetric_requires_pad_size() {
        let data = peak_volume([8, 8, 8], (4, 4, 4));
        let mask = Volume::zeros([8, 8, 8]);
        let err = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::PadSymmetric,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BcdiError::InvalidArgument(_)));
    }

    #[test]
    fn test_pad_symmetric_rejects_zero_pad_size() {
        let data = peak_volume([8, 8, 8], (4, 4, 4));
        let mask = Volume::zeros([8, 8, 8]);
        let err = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::PadSymmetric,
            Some([0, 0, 0]),
        )
        .unwrap_err();
        assert!(matches!(err, BcdiError::InvalidArgument(_)));
    }

    #[test]
    fn test_pad_symmetric_mask_padding() {
        let data = peak_volume([8, 8, 8], (4, 4, 4));
        let mask = Volume::zeros([8, 8, 8]);

        let out = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::PadSymmetric,
            Some([16, 16, 16]),
        )
        .unwrap();

        assert_eq!(out.data.shape, [16, 16, 16]);
        // 填充进掩模的像素被标记为屏蔽
        assert_eq!(out.mask.get(0, 0, 0), 1.0);
        let total: usize = out.pad_width.iter().sum();
        assert_eq!(total, 3 * 8);
    }

    #[test]
    fn test_pad_asymmetric_shape() {
        let data = peak_volume([11, 13, 17], (5, 6, 8));
        let mask = Volume::zeros([11, 13, 17]);

        let out = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::PadAsymmetric,
            None,
        )
        .unwrap();

        for &n in &out.data.shape {
            assert!(crate::bragg::fftshape::try_smaller_primes(n, 7, &[2]));
        }
        assert!(out.data.shape[0] >= 11);
    }

    #[test]
    fn test_edge_peak_degrades_to_skip() {
        // 峰在边缘，对称盒为空
        let data = peak_volume([10, 10, 10], (0, 5, 5));
        let mask = Volume::zeros([10, 10, 10]);

        let out = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::CropSymmetric,
            None,
        )
        .unwrap();
        assert_eq!(out.data.shape, [10, 10, 10]);
    }

    #[test]
    fn test_shape_mismatch() {
        let data = Volume::zeros([4, 4, 4]);
        let mask = Volume::zeros([4, 4, 5]);
        let err = center_fft(
            &data,
            &mask,
            Centering::Max,
            None,
            CenterMode::Skip,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BcdiError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_fix_bragg_out_of_bounds() {
        let data = Volume::zeros([4, 4, 4]);
        let mask = Volume::zeros([4, 4, 4]);
        let err = center_fft(
            &data,
            &mask,
            Centering::Max,
            Some([10, 0, 0]),
            CenterMode::Skip,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, BcdiError::InvalidArgument(_)));
    }
}
