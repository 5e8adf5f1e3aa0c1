//! # 体数据模型
//!
//! 定义 3D 衍射数据 / 实空间重建的统一表示，以及 2D 探测器帧。
//!
//! 轴约定沿用同步辐射 BCDI 的惯例：
//! axis 0 = z（摇摆角 / qx，束流下游方向），axis 1 = y（竖直 / qz），
//! axis 2 = x（出射侧 / qy）。
//!
//! ## 依赖关系
//! - 被 `io/`, `bragg/` 和 `commands/` 使用
//! - 无外部模块依赖

use serde::{Deserialize, Serialize};

/// 3D 体数据（C 序存储）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    /// 形状 [nz, ny, nx]
    pub shape: [usize; 3],
    /// 数据，C 序（x 变化最快）
    pub data: Vec<f64>,
}

impl Volume {
    /// 创建填充常数的体数据
    pub fn filled(shape: [usize; 3], value: f64) -> Self {
        Volume {
            shape,
            data: vec![value; shape[0] * shape[1] * shape[2]],
        }
    }

    /// 创建全零体数据
    pub fn zeros(shape: [usize; 3]) -> Self {
        Self::filled(shape, 0.0)
    }

    /// 创建全一体数据
    pub fn ones(shape: [usize; 3]) -> Self {
        Self::filled(shape, 1.0)
    }

    /// 从已有数据创建，检查元素数量与形状一致
    pub fn from_vec(shape: [usize; 3], data: Vec<f64>) -> Option<Self> {
        if data.len() != shape[0] * shape[1] * shape[2] {
            return None;
        }
        Some(Volume { shape, data })
    }

    /// 线性索引
    #[inline]
    pub fn idx(&self, z: usize, y: usize, x: usize) -> usize {
        (z * self.shape[1] + y) * self.shape[2] + x
    }

    /// 读取元素
    #[inline]
    pub fn get(&self, z: usize, y: usize, x: usize) -> f64 {
        self.data[self.idx(z, y, x)]
    }

    /// 写入元素
    #[inline]
    pub fn set(&mut self, z: usize, y: usize, x: usize, value: f64) {
        let i = self.idx(z, y, x);
        self.data[i] = value;
    }

    /// 元素总数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.data.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    /// 元素求和
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// 绝对值最大处的索引 (z, y, x)
    pub fn argmax(&self) -> (usize, usize, usize) {
        let mut best = 0;
        let mut best_val = f64::NEG_INFINITY;
        for (i, v) in self.data.iter().enumerate() {
            if v.abs() > best_val {
                best_val = v.abs();
                best = i;
            }
        }
        let x = best % self.shape[2];
        let y = (best / self.shape[2]) % self.shape[1];
        let z = best / (self.shape[1] * self.shape[2]);
        (z, y, x)
    }

    /// 质心坐标 (z, y, x)，按强度加权
    ///
    /// 全零数据返回几何中心。
    pub fn center_of_mass(&self) -> (f64, f64, f64) {
        let total = self.sum();
        if total == 0.0 {
            return (
                self.shape[0] as f64 / 2.0,
                self.shape[1] as f64 / 2.0,
                self.shape[2] as f64 / 2.0,
            );
        }

        let mut cz = 0.0;
        let mut cy = 0.0;
        let mut cx = 0.0;
        for z in 0..self.shape[0] {
            for y in 0..self.shape[1] {
                for x in 0..self.shape[2] {
                    let w = self.get(z, y, x);
                    cz += w * z as f64;
                    cy += w * y as f64;
                    cx += w * x as f64;
                }
            }
        }
        (cz / total, cy / total, cx / total)
    }

    /// 沿 axis 0 求和，得到 2D 帧（摇摆曲线叠加图）
    pub fn sum_axis0(&self) -> Frame {
        let mut frame = Frame::zeros([self.shape[1], self.shape[2]]);
        for z in 0..self.shape[0] {
            for y in 0..self.shape[1] {
                for x in 0..self.shape[2] {
                    let i = frame.idx(y, x);
                    frame.data[i] += self.get(z, y, x);
                }
            }
        }
        frame
    }

    /// 裁剪到 [z0, z1) x [y0, y1) x [x0, x1)
    ///
    /// 调用者保证边界在形状范围内且非空。
    pub fn crop(&self, z0: usize, z1: usize, y0: usize, y1: usize, x0: usize, x1: usize) -> Volume {
        let shape = [z1 - z0, y1 - y0, x1 - x0];
        let mut out = Volume::zeros(shape);
        for z in z0..z1 {
            for y in y0..y1 {
                for x in x0..x1 {
                    out.set(z - z0, y - y0, x - x0, self.get(z, y, x));
                }
            }
        }
        out
    }

    /// 零填充，`pad_width` = [z0, z1, y0, y1, x0, x1] 为各端填充像素数
    ///
    /// `mask_flag` 为 true 时以 1 填充（掩模外扩像素视为被屏蔽）。
    pub fn zero_pad(&self, pad_width: [usize; 6], mask_flag: bool) -> Volume {
        let shape = [
            self.shape[0] + pad_width[0] + pad_width[1],
            self.shape[1] + pad_width[2] + pad_width[3],
            self.shape[2] + pad_width[4] + pad_width[5],
        ];
        let fill = if mask_flag { 1.0 } else { 0.0 };
        let mut out = Volume::filled(shape, fill);
        for z in 0..self.shape[0] {
            for y in 0..self.shape[1] {
                for x in 0..self.shape[2] {
                    out.set(
                        z + pad_width[0],
                        y + pad_width[2],
                        x + pad_width[4],
                        self.get(z, y, x),
                    );
                }
            }
        }
        out
    }

    /// 逐元素相乘（窗函数应用）
    ///
    /// 形状不一致时返回 None。
    pub fn multiply(&self, other: &Volume) -> Option<Volume> {
        if self.shape != other.shape {
            return None;
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .collect();
        Some(Volume {
            shape: self.shape,
            data,
        })
    }

    /// 全体缩放
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }
}

/// 2D 帧（探测器掩模、叠加图样）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// 形状 [ny, nx]
    pub shape: [usize; 2],
    /// 数据，C 序
    pub data: Vec<f64>,
}

impl Frame {
    /// 创建全零帧
    pub fn zeros(shape: [usize; 2]) -> Self {
        Frame {
            shape,
            data: vec![0.0; shape[0] * shape[1]],
        }
    }

    /// 从已有数据创建，检查元素数量与形状一致
    pub fn from_vec(shape: [usize; 2], data: Vec<f64>) -> Option<Self> {
        if data.len() != shape[0] * shape[1] {
            return None;
        }
        Some(Frame { shape, data })
    }

    /// 线性索引
    #[inline]
    pub fn idx(&self, y: usize, x: usize) -> usize {
        y * self.shape[1] + x
    }

    /// 读取元素
    #[inline]
    pub fn get(&self, y: usize, x: usize) -> f64 {
        self.data[self.idx(y, x)]
    }

    /// 写入元素
    #[inline]
    pub fn set(&mut self, y: usize, x: usize, value: f64) {
        let i = self.idx(y, x);
        self.data[i] = value;
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.data.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
    }

    /// 非零元素个数
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|v| **v != 0.0).count()
    }

    /// 非零元素置 1（掩模二值化）
    pub fn binarize(&mut self) {
        for v in &mut self.data {
            if *v != 0.0 {
                *v = 1.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_indexing() {
        let mut vol = Volume::zeros([2, 3, 4]);
        vol.set(1, 2, 3, 7.0);
        assert_eq!(vol.get(1, 2, 3), 7.0);
        assert_eq!(vol.len(), 24);
    }

    #[test]
    fn test_volume_from_vec_shape_check() {
        assert!(Volume::from_vec([2, 2, 2], vec![0.0; 8]).is_some());
        assert!(Volume::from_vec([2, 2, 2], vec![0.0; 7]).is_none());
    }

    #[test]
    fn test_argmax() {
        let mut vol = Volume::zeros([3, 3, 3]);
        vol.set(2, 1, 0, -9.0);
        assert_eq!(vol.argmax(), (2, 1, 0));
    }

    #[test]
    fn test_center_of_mass_single_voxel() {
        let mut vol = Volume::zeros([5, 5, 5]);
        vol.set(1, 2, 3, 4.0);
        let (cz, cy, cx) = vol.center_of_mass();
        assert!((cz - 1.0).abs() < 1e-12);
        assert!((cy - 2.0).abs() < 1e-12);
        assert!((cx - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_crop() {
        let mut vol = Volume::zeros([4, 4, 4]);
        vol.set(1, 1, 1, 5.0);
        let cropped = vol.crop(1, 3, 1, 3, 1, 3);
        assert_eq!(cropped.shape, [2, 2, 2]);
        assert_eq!(cropped.get(0, 0, 0), 5.0);
    }

    #[test]
    fn test_zero_pad_data_and_mask() {
        let vol = Volume::ones([2, 2, 2]);
        let padded = vol.zero_pad([1, 1, 0, 0, 0, 0], false);
        assert_eq!(padded.shape, [4, 2, 2]);
        assert_eq!(padded.get(0, 0, 0), 0.0);
        assert_eq!(padded.get(1, 0, 0), 1.0);

        let mask = Volume::zeros([2, 2, 2]);
        let padded_mask = mask.zero_pad([1, 1, 0, 0, 0, 0], true);
        assert_eq!(padded_mask.get(0, 0, 0), 1.0);
        assert_eq!(padded_mask.get(1, 0, 0), 0.0);
    }

    #[test]
    fn test_sum_axis0() {
        let vol = Volume::ones([3, 2, 2]);
        let frame = vol.sum_axis0();
        assert_eq!(frame.shape, [2, 2]);
        assert_eq!(frame.get(0, 0), 3.0);
    }

    #[test]
    fn test_multiply_shape_mismatch() {
        let a = Volume::ones([2, 2, 2]);
        let b = Volume::ones([2, 2, 3]);
        assert!(a.multiply(&b).is_none());
    }

    #[test]
    fn test_frame_binarize() {
        let mut frame = Frame::from_vec([2, 2], vec![0.0, 0.5, 3.0, 0.0]).unwrap();
        frame.binarize();
        assert_eq!(frame.data, vec![0.0, 1.0, 1.0, 0.0]);
        assert_eq!(frame.count_nonzero(), 2);
    }
}
