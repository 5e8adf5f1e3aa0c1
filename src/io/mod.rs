//! # 数组文件读写模块
//!
//! 提供科学数组文件格式的读写（NumPy NPY）。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: npy

pub mod npy;

pub use npy::{read_frame, read_series, read_volume, write_frame, write_series, write_volume};
