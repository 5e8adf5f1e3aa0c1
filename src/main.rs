//! # bcdikit - BCDI 数据分析统一工具箱
//!
//! 将分散的 Bragg 相干衍射成像 (BCDI) 分析脚本用 Rust 重构，
//! 统一成单一可执行文件。
//!
//! ## 子命令
//! - `preprocess` - 衍射数据预处理
//!   - `center` - Bragg 峰居中与 FFT 裁剪/填充
//!   - `filter` - 坏点检测与屏蔽
//!   - `normalize` - 监视器归一化
//!   - `apodize` - 切趾窗函数
//! - `analyze` - 分析功能
//!   - `average` - 径向（q 壳层）平均
//!   - `prtf` - 相位恢复传递函数
//!   - `fit` - 摇摆曲线拟合
//! - `simulate` - 运动学衍射模拟
//! - `mask` - 支撑域与等值面提取
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── io/     (NPY 数组读写)
//!   │     ├── bragg/  (数值变换核心)
//!   │     └── models/ (数据模型)
//!   ├── batch/      (批量并行处理)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod bragg;
mod cli;
mod commands;
mod error;
mod io;
mod models;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
