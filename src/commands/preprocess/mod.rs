//! # preprocess 命令实现
//!
//! 摇摆扫描数据预处理子命令分发。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 子模块: center, filter, normalize, apodize

pub mod apodize;
pub mod center;
pub mod filter;
pub mod normalize;

use crate::cli::preprocess::{PreprocessArgs, PreprocessCommands};
use crate::error::Result;

/// 执行 preprocess 子命令
pub fn execute(args: PreprocessArgs) -> Result<()> {
    match args.command {
        PreprocessCommands::Center(args) => center::execute(args),
        PreprocessCommands::Filter(args) => filter::execute(args),
        PreprocessCommands::Normalize(args) => normalize::execute(args),
        PreprocessCommands::Apodize(args) => apodize::execute(args),
    }
}
