//! # NPY 格式解析器
//!
//! 读写 NumPy 的 .npy 数组文件（v1.0 / v2.0）。
//!
//! 格式参考 numpy.lib.format：魔数 `\x93NUMPY` + 版本号 + 头部长度 +
//! Python 字典头部（descr / fortran_order / shape）+ 原始数据。
//!
//! ## 支持范围
//! - 读取: `<f8` `<f4` `<i4` `<i8` `<u2` `|u1` `|i1`，C 序，1-3 维
//! - 写入: `<f8` C 序 v1.0
//! - Fortran 序与大端数据不支持，报错退出
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 使用 `regex` 解析头部字典

use crate::error::{BcdiError, Result};
use crate::models::{Frame, Volume};

use regex::Regex;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// NPY 魔数
const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// 解析后的原始数组：形状 + f64 数据
#[derive(Debug, Clone)]
pub struct RawArray {
    /// 各维长度
    pub shape: Vec<usize>,
    /// 数据，统一转换为 f64
    pub data: Vec<f64>,
}

/// 读取 NPY 文件为 f64 数组
pub fn read_npy(path: &Path) -> Result<RawArray> {
    if !path.exists() {
        return Err(BcdiError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut file = File::open(path).map_err(|e| BcdiError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| BcdiError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

    parse_npy(&bytes).map_err(|reason| BcdiError::ParseError {
        format: "NPY".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 解析 NPY 字节流
fn parse_npy(bytes: &[u8]) -> std::result::Result<RawArray, String> {
    if bytes.len() < 10 {
        return Err("file too short for NPY header".to_string());
    }
    if &bytes[0..6] != MAGIC {
        return Err("bad magic, not a NPY file".to_string());
    }

    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => {
            let len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
            (len, 10)
        }
        2 | 3 => {
            if bytes.len() < 12 {
                return Err("file too short for v2 header".to_string());
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
            (len, 12)
        }
        v => return Err(format!("unsupported NPY version {}", v)),
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err("truncated header".to_string());
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| "header is not valid ASCII".to_string())?;

    let (descr, fortran_order, shape) = parse_header(header)?;
    if fortran_order {
        return Err("Fortran-ordered arrays are not supported".to_string());
    }

    // 形状乘积溢出视为头部损坏
    let count = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| "shape product overflows usize".to_string())?;
    let payload = &bytes[data_start..];
    let data = decode_payload(payload, &descr, count)?;

    Ok(RawArray { shape, data })
}

/// 解析头部字典，返回 (descr, fortran_order, shape)
fn parse_header(header: &str) -> std::result::Result<(String, bool, Vec<usize>), String> {
    let re_descr = Regex::new(r"'descr'\s*:\s*'([^']+)'").unwrap();
    let re_order = Regex::new(r"'fortran_order'\s*:\s*(True|False)").unwrap();
    let re_shape = Regex::new(r"'shape'\s*:\s*\(([^)]*)\)").unwrap();

    let descr = re_descr
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| "missing 'descr' in header".to_string())?;

    let fortran_order = re_order
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str() == "True")
        .ok_or_else(|| "missing 'fortran_order' in header".to_string())?;

    let shape_str = re_shape
        .captures(header)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| "missing 'shape' in header".to_string())?;

    let mut shape = Vec::new();
    for part in shape_str.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let dim: usize = part
            .parse()
            .map_err(|_| format!("invalid shape entry '{}'", part))?;
        shape.push(dim);
    }
    if shape.is_empty() {
        return Err("scalar (0-d) arrays are not supported".to_string());
    }

    Ok((descr, fortran_order, shape))
}

/// 解码数据段，统一转换为 f64
fn decode_payload(
    payload: &[u8],
    descr: &str,
    count: usize,
) -> std::result::Result<Vec<f64>, String> {
    let itemsize = match descr {
        "<f8" | "<i8" => 8,
        "<f4" | "<i4" => 4,
        "<u2" | "<i2" => 2,
        "|u1" | "|i1" | "|b1" => 1,
        other => return Err(format!("unsupported dtype '{}'", other)),
    };

    let needed = count
        .checked_mul(itemsize)
        .ok_or_else(|| "shape product overflows usize".to_string())?;
    if payload.len() < needed {
        return Err(format!(
            "payload too short: need {} bytes for {} elements, got {}",
            needed,
            count,
            payload.len()
        ));
    }

    let mut data = Vec::with_capacity(count);
    for i in 0..count {
        let chunk = &payload[i * itemsize..(i + 1) * itemsize];
        let value = match descr {
            "<f8" => f64::from_le_bytes(chunk.try_into().unwrap()),
            "<f4" => f32::from_le_bytes(chunk.try_into().unwrap()) as f64,
            "<i8" => i64::from_le_bytes(chunk.try_into().unwrap()) as f64,
            "<i4" => i32::from_le_bytes(chunk.try_into().unwrap()) as f64,
            "<i2" => i16::from_le_bytes(chunk.try_into().unwrap()) as f64,
            "<u2" => u16::from_le_bytes(chunk.try_into().unwrap()) as f64,
            "|u1" | "|b1" => chunk[0] as f64,
            "|i1" => chunk[0] as i8 as f64,
            _ => unreachable!(),
        };
        data.push(value);
    }
    Ok(data)
}

/// 读取 3D 体数据
pub fn read_volume(path: &Path) -> Result<Volume> {
    let raw = read_npy(path)?;
    if raw.shape.len() != 3 {
        return Err(BcdiError::DimensionError {
            path: path.display().to_string(),
            expected: 3,
            actual: raw.shape.len(),
        });
    }
    let shape = [raw.shape[0], raw.shape[1], raw.shape[2]];
    Volume::from_vec(shape, raw.data).ok_or_else(|| BcdiError::ParseError {
        format: "NPY".to_string(),
        path: path.display().to_string(),
        reason: "element count does not match shape".to_string(),
    })
}

/// 读取 2D 帧（掩模、平场）
///
/// 3D 输入沿 axis 0 求和后二值化，与原始脚本对掩模的处理一致。
pub fn read_frame(path: &Path) -> Result<Frame> {
    let raw = read_npy(path)?;
    match raw.shape.len() {
        2 => {
            let shape = [raw.shape[0], raw.shape[1]];
            Frame::from_vec(shape, raw.data).ok_or_else(|| BcdiError::ParseError {
                format: "NPY".to_string(),
                path: path.display().to_string(),
                reason: "element count does not match shape".to_string(),
            })
        }
        3 => {
            let shape = [raw.shape[0], raw.shape[1], raw.shape[2]];
            let vol = Volume::from_vec(shape, raw.data).ok_or_else(|| BcdiError::ParseError {
                format: "NPY".to_string(),
                path: path.display().to_string(),
                reason: "element count does not match shape".to_string(),
            })?;
            let mut frame = vol.sum_axis0();
            frame.binarize();
            Ok(frame)
        }
        n => Err(BcdiError::DimensionError {
            path: path.display().to_string(),
            expected: 2,
            actual: n,
        }),
    }
}

/// 读取 1D 序列（监视器值）
pub fn read_series(path: &Path) -> Result<Vec<f64>> {
    let raw = read_npy(path)?;
    if raw.shape.len() != 1 {
        return Err(BcdiError::DimensionError {
            path: path.display().to_string(),
            expected: 1,
            actual: raw.shape.len(),
        });
    }
    Ok(raw.data)
}

/// 构造 NPY v1.0 头部字节
fn build_header(shape: &[usize]) -> Vec<u8> {
    let shape_str = match shape.len() {
        1 => format!("({},)", shape[0]),
        _ => format!(
            "({})",
            shape
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    };
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': {}, }}",
        shape_str
    );

    // 头部总长（魔数 10 字节 + 字典）补齐到 64 的倍数，以 \n 结尾
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let mut header = dict.into_bytes();
    header.extend(std::iter::repeat(b' ').take(padding));
    header.push(b'\n');
    header
}

/// 写出 f64 数组为 NPY v1.0
pub fn write_npy(path: &Path, shape: &[usize], data: &[f64]) -> Result<()> {
    let count: usize = shape.iter().product();
    if count != data.len() {
        return Err(BcdiError::ShapeMismatch {
            context: format!("writing '{}'", path.display()),
            expected: format!("{} elements", count),
            actual: format!("{} elements", data.len()),
        });
    }

    let header = build_header(shape);
    let mut file = File::create(path).map_err(|e| BcdiError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;

    let write_err = |e: std::io::Error| BcdiError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    };

    file.write_all(MAGIC).map_err(write_err)?;
    file.write_all(&[1u8, 0u8]).map_err(write_err)?;
    file.write_all(&(header.len() as u16).to_le_bytes())
        .map_err(write_err)?;
    file.write_all(&header).map_err(write_err)?;

    let mut buf = Vec::with_capacity(data.len() * 8);
    for v in data {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    file.write_all(&buf).map_err(write_err)?;

    Ok(())
}

/// 写出 3D 体数据
pub fn write_volume(path: &Path, volume: &Volume) -> Result<()> {
    write_npy(path, &volume.shape, &volume.data)
}

/// 写出 2D 帧数据
pub fn write_frame(path: &Path, frame: &Frame) -> Result<()> {
    write_npy(path, &frame.shape, &frame.data)
}

/// 写出 1D 序列
pub fn write_series(path: &Path, data: &[f64]) -> Result<()> {
    write_npy(path, &[data.len()], data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn test_roundtrip_volume() {
        let mut vol = Volume::zeros([2, 3, 4]);
        vol.set(1, 2, 3, 42.5);
        vol.set(0, 0, 0, -1.0);

        let path = temp_path("bcdikit_test_roundtrip.npy");
        write_volume(&path, &vol).unwrap();
        let loaded = read_volume(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.shape, [2, 3, 4]);
        assert_eq!(loaded.get(1, 2, 3), 42.5);
        assert_eq!(loaded.get(0, 0, 0), -1.0);
    }

    #[test]
    fn test_roundtrip_series() {
        let series = vec![1.0, 2.0, 3.5];
        let path = temp_path("bcdikit_test_series.npy");
        write_series(&path, &series).unwrap();
        let loaded = read_series(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, series);
    }

    #[test]
    fn test_header_alignment() {
        let header = build_header(&[128, 256, 256]);
        assert_eq!((10 + header.len()) % 64, 0);
        assert_eq!(*header.last().unwrap(), b'\n');
    }

    #[test]
    fn test_bad_magic() {
        let err = parse_npy(b"not a npy file at all").unwrap_err();
        assert!(err.contains("magic"));
    }

    #[test]
    fn test_parse_header_dict() {
        let (descr, fortran, shape) =
            parse_header("{'descr': '<f8', 'fortran_order': False, 'shape': (3, 4, 5), }")
                .unwrap();
        assert_eq!(descr, "<f8");
        assert!(!fortran);
        assert_eq!(shape, vec![3, 4, 5]);
    }

    #[test]
    fn test_parse_header_1d() {
        let (_, _, shape) =
            parse_header("{'descr': '<f4', 'fortran_order': False, 'shape': (7,), }").unwrap();
        assert_eq!(shape, vec![7]);
    }

    #[test]
    fn test_fortran_order_rejected() {
        // 手工构造一个 Fortran 序头部
        let dict = "{'descr': '<f8', 'fortran_order': True, 'shape': (2, 2), }";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&[1, 0]);
        let mut header = dict.as_bytes().to_vec();
        header.push(b'\n');
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&[0u8; 32]);

        let err = parse_npy(&bytes).unwrap_err();
        assert!(err.contains("Fortran"));
    }

    #[test]
    fn test_oversized_shape_rejected() {
        // 形状乘积超出 usize 的损坏头部
        let dict =
            "{'descr': '<f8', 'fortran_order': False, 'shape': (9223372036854775807, 4, 2), }";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&[1, 0]);
        let mut header = dict.as_bytes().to_vec();
        header.push(b'\n');
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&[0u8; 16]);

        let err = parse_npy(&bytes).unwrap_err();
        assert!(err.contains("overflow"));
    }

    #[test]
    fn test_dimension_check() {
        let path = temp_path("bcdikit_test_dim.npy");
        write_series(&path, &[1.0, 2.0]).unwrap();
        let err = read_volume(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, BcdiError::DimensionError { .. }));
    }
}
