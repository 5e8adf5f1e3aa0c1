//! # 数据模型模块
//!
//! 定义统一的数组数据表示（3D 体数据与 2D 帧）。
//!
//! ## 依赖关系
//! - 被 `io/`, `bragg/` 和 `commands/` 使用
//! - 无外部模块依赖

pub mod volume;

pub use volume::{Frame, Volume};
