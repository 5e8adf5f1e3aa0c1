//! # analyze 命令实现
//!
//! 分析子命令分发。
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 子模块: average, prtf, fit

pub mod average;
pub mod fit;
pub mod prtf;

use crate::cli::analyze::{AnalyzeArgs, AnalyzeCommands};
use crate::error::Result;

/// 执行 analyze 子命令
pub fn execute(args: AnalyzeArgs) -> Result<()> {
    match args.command {
        AnalyzeCommands::Average(args) => average::execute(args),
        AnalyzeCommands::Prtf(args) => prtf::execute(args),
        AnalyzeCommands::Fit(args) => fit::execute(args),
    }
}
