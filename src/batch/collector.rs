//! # 文件收集器
//!
//! 根据输入路径和模式收集待处理的数据文件列表。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔的多模式）
//! - 递归目录搜索
//!
//! ## 依赖关系
//! - 被 `commands/analyze/average.rs` 调用
//! - 使用 `walkdir` 遍历目录
//! - 使用 `glob` 进行文件名匹配

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器，默认匹配 NPY 数据文件
    pub fn new(input: PathBuf) -> Self {
        Self {
            input,
            patterns: vec![Pattern::new("*.npy").unwrap()],
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式，非法模式被忽略）
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        let patterns: Vec<Pattern> = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| Pattern::new(s).ok())
            .collect();
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 检查输入是否为单文件
    pub fn is_single_file(&self) -> bool {
        self.input.is_file()
    }

    /// 收集所有匹配的文件（按路径排序，保证批量结果稳定）
    pub fn collect(&self) -> Vec<PathBuf> {
        if self.input.is_file() {
            return vec![self.input.clone()];
        }
        if !self.input.is_dir() {
            return vec![];
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.matches(e.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        files
    }

    /// 检查文件名是否匹配任一模式
    fn matches(&self, path: &Path) -> bool {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        self.patterns.iter().any(|p| p.matches(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_matches_npy() {
        let collector = FileCollector::new(PathBuf::from("."));
        assert!(collector.matches(Path::new("scan_0042.npy")));
        assert!(!collector.matches(Path::new("scan_0042.csv")));
    }

    #[test]
    fn test_multi_pattern() {
        let collector =
            FileCollector::new(PathBuf::from(".")).with_pattern("scan_*.npy, mask_?.npy");
        assert!(collector.matches(Path::new("scan_0001.npy")));
        assert!(collector.matches(Path::new("mask_3.npy")));
        assert!(!collector.matches(Path::new("mask_12.npy")));
        assert!(!collector.matches(Path::new("other.npy")));
    }

    #[test]
    fn test_empty_pattern_keeps_default() {
        let collector = FileCollector::new(PathBuf::from(".")).with_pattern(" , ");
        assert!(collector.matches(Path::new("data.npy")));
    }

    #[test]
    fn test_is_single_file() {
        let path = std::env::temp_dir().join("bcdikit_test_collector_single.npy");
        std::fs::write(&path, b"x").unwrap();

        assert!(FileCollector::new(path.clone()).is_single_file());
        assert!(!FileCollector::new(std::env::temp_dir()).is_single_file());

        std::fs::remove_file(&path).ok();
    }
}
