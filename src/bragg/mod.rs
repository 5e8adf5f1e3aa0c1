//! # BCDI 数值变换核心模块
//!
//! 提供各子命令的数值变换实现。
//!
//! ## 子模块
//! - `fftshape`: FFT 友好尺寸（素因子分解）
//! - `center`: Bragg 峰居中与裁剪/填充
//! - `hotpixels`: 坏点检测与屏蔽
//! - `normalize`: 监视器归一化
//! - `window`: 切趾窗函数
//! - `shells`: q 壳层径向平均与 PRTF
//! - `fitting`: 摇摆曲线拟合
//! - `kinematic`: 运动学衍射模拟
//! - `isosurface`: 等值面提取
//! - `support`: 支撑域掩模
//! - `plot`: 图表生成
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/` 数据模型

pub mod center;
pub mod export;
pub mod fftshape;
pub mod fitting;
pub mod hotpixels;
pub mod isosurface;
pub mod kinematic;
pub mod normalize;
pub mod plot;
pub mod shells;
pub mod support;
pub mod window;
