//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `io/`, `bragg/`, `models/`, `utils/`
//! - 子模块: preprocess, analyze, simulate, mask

pub mod analyze;
pub mod mask;
pub mod preprocess;
pub mod simulate;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Preprocess(args) => preprocess::execute(args),
        Commands::Analyze(args) => analyze::execute(args),
        Commands::Simulate(args) => simulate::execute(args),
        Commands::Mask(args) => mask::execute(args),
    }
}
