//! # 等值面提取
//!
//! 用 marching tetrahedra 从 3D 标量场提取等值面三角网格。
//! 每个体素立方体拆成 6 个四面体，在跨越等值的棱上线性插值顶点。
//! 网格坐标按体素尺寸缩放，可直接写出 Wavefront OBJ。
//!
//! ## 依赖关系
//! - 被 `commands/mask.rs` 调用
//! - 使用 `models/volume.rs` 的 Volume

use crate::error::{BcdiError, Result};
use crate::models::Volume;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// 三角网格（顶点按 (x, y, z) 存储）
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    /// 每个三角形为三个顶点下标
    pub triangles: Vec<[usize; 3]>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

// 立方体 8 个角的局部偏移，下标约定 bit0=x, bit1=y, bit2=z
const CORNERS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

// 每个立方体拆成的 6 个四面体（共享体对角线 0-7）
const TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 3, 2, 7],
    [0, 2, 6, 7],
    [0, 6, 4, 7],
    [0, 4, 5, 7],
    [0, 5, 1, 7],
];

/// 提取等值面
///
/// `level` 为等值；`voxel_size` 为 (z, y, x) 方向的体素物理尺寸，
/// 输出顶点坐标已乘以该尺寸。
pub fn marching_tetrahedra(data: &Volume, level: f64, voxel_size: [f64; 3]) -> Result<Mesh> {
    if data.shape.iter().any(|n| *n < 2) {
        return Err(BcdiError::InvalidArgument(
            "isosurface extraction needs at least 2 voxels along each axis".to_string(),
        ));
    }
    if voxel_size.iter().any(|v| *v <= 0.0) {
        return Err(BcdiError::InvalidArgument(
            "voxel sizes must be strictly positive".to_string(),
        ));
    }

    let [nz, ny, nx] = data.shape;
    let mut mesh = Mesh::default();

    for z in 0..nz - 1 {
        for y in 0..ny - 1 {
            for x in 0..nx - 1 {
                // 角点的标量值与世界坐标
                let mut values = [0.0; 8];
                let mut positions = [[0.0; 3]; 8];
                for (i, c) in CORNERS.iter().enumerate() {
                    let (cz, cy, cx) = (z + c[2], y + c[1], x + c[0]);
                    values[i] = data.get(cz, cy, cx);
                    positions[i] = [
                        cx as f64 * voxel_size[2],
                        cy as f64 * voxel_size[1],
                        cz as f64 * voxel_size[0],
                    ];
                }

                for tet in &TETRAHEDRA {
                    emit_tetrahedron(&mut mesh, tet, &values, &positions, level);
                }
            }
        }
    }

    Ok(mesh)
}

/// 单个四面体的等值面三角形
fn emit_tetrahedron(
    mesh: &mut Mesh,
    tet: &[usize; 4],
    values: &[f64; 8],
    positions: &[[f64; 3]; 8],
    level: f64,
) {
    // 四位掩码标记每个顶点是否在等值之上
    let mut mask = 0u8;
    for (i, v) in tet.iter().enumerate() {
        if values[*v] >= level {
            mask |= 1 << i;
        }
    }
    if mask == 0 || mask == 0b1111 {
        return;
    }

    let interp = |a: usize, b: usize| -> [f64; 3] {
        let (va, vb) = (values[tet[a]], values[tet[b]]);
        let t = if (vb - va).abs() < 1e-300 {
            0.5
        } else {
            ((level - va) / (vb - va)).clamp(0.0, 1.0)
        };
        let (pa, pb) = (positions[tet[a]], positions[tet[b]]);
        [
            pa[0] + t * (pb[0] - pa[0]),
            pa[1] + t * (pb[1] - pa[1]),
            pa[2] + t * (pb[2] - pa[2]),
        ]
    };

    let mut push_triangle = |a: [f64; 3], b: [f64; 3], c: [f64; 3]| {
        let base = mesh.vertices.len();
        mesh.vertices.push(a);
        mesh.vertices.push(b);
        mesh.vertices.push(c);
        mesh.triangles.push([base, base + 1, base + 2]);
    };

    // 四面体只有两类截面：单顶点（三角形）与双顶点（四边形拆两个三角形）
    match mask {
        0b0001 | 0b1110 => {
            push_triangle(interp(0, 1), interp(0, 2), interp(0, 3));
        }
        0b0010 | 0b1101 => {
            push_triangle(interp(1, 0), interp(1, 3), interp(1, 2));
        }
        0b0100 | 0b1011 => {
            push_triangle(interp(2, 0), interp(2, 1), interp(2, 3));
        }
        0b1000 | 0b0111 => {
            push_triangle(interp(3, 0), interp(3, 2), interp(3, 1));
        }
        0b0011 | 0b1100 => {
            let (a, b, c, d) = (interp(0, 2), interp(0, 3), interp(1, 3), interp(1, 2));
            push_triangle(a, b, c);
            push_triangle(a, c, d);
        }
        0b0101 | 0b1010 => {
            let (a, b, c, d) = (interp(0, 1), interp(2, 3), interp(0, 3), interp(2, 1));
            push_triangle(a, c, b);
            push_triangle(a, b, d);
        }
        0b0110 | 0b1001 => {
            let (a, b, c, d) = (interp(1, 0), interp(1, 3), interp(2, 3), interp(2, 0));
            push_triangle(a, b, c);
            push_triangle(a, c, d);
        }
        _ => unreachable!(),
    }
}

/// 写出 Wavefront OBJ 文件
pub fn write_obj(mesh: &Mesh, output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(|e| BcdiError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    let mut writer = BufWriter::new(file);

    let mut write = |line: String| -> Result<()> {
        writeln!(writer, "{}", line).map_err(|e| BcdiError::FileWriteError {
            path: output_path.display().to_string(),
            source: e,
        })
    };

    write(format!(
        "# isosurface mesh: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangles.len()
    ))?;
    for v in &mesh.vertices {
        write(format!("v {:.6} {:.6} {:.6}", v[0], v[1], v[2]))?;
    }
    for t in &mesh.triangles {
        // OBJ 下标从 1 开始
        write(format!("f {} {} {}", t[0] + 1, t[1] + 1, t[2] + 1))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_field_has_no_surface() {
        let data = Volume::filled([4, 4, 4], 1.0);
        let mesh = marching_tetrahedra(&data, 0.5, [1.0, 1.0, 1.0]).unwrap();
        assert!(mesh.is_empty());
    }

    #[test]
    fn test_single_voxel_produces_closed_surface() {
        let mut data = Volume::zeros([3, 3, 3]);
        data.set(1, 1, 1, 1.0);
        let mesh = marching_tetrahedra(&data, 0.5, [1.0, 1.0, 1.0]).unwrap();
        assert!(!mesh.is_empty());
        // 顶点都应落在中心体素附近
        for v in &mesh.vertices {
            for c in v {
                assert!(*c >= 0.0 && *c <= 2.0);
            }
        }
    }

    #[test]
    fn test_voxel_size_scales_coordinates() {
        let mut data = Volume::zeros([3, 3, 3]);
        data.set(1, 1, 1, 1.0);
        let unit = marching_tetrahedra(&data, 0.5, [1.0, 1.0, 1.0]).unwrap();
        let scaled = marching_tetrahedra(&data, 0.5, [2.0, 2.0, 2.0]).unwrap();

        assert_eq!(unit.vertices.len(), scaled.vertices.len());
        for (u, s) in unit.vertices.iter().zip(scaled.vertices.iter()) {
            for k in 0..3 {
                assert!((s[k] - 2.0 * u[k]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_rejects_degenerate_grid() {
        let data = Volume::ones([1, 4, 4]);
        assert!(marching_tetrahedra(&data, 0.5, [1.0, 1.0, 1.0]).is_err());
    }

    #[test]
    fn test_halfspace_plane_vertices_on_level() {
        // z 方向线性场，等值面应为 z = 1.5 平面
        let mut data = Volume::zeros([4, 3, 3]);
        for z in 0..4 {
            for y in 0..3 {
                for x in 0..3 {
                    data.set(z, y, x, z as f64);
                }
            }
        }
        let mesh = marching_tetrahedra(&data, 1.5, [1.0, 1.0, 1.0]).unwrap();
        assert!(!mesh.is_empty());
        for v in &mesh.vertices {
            assert!((v[2] - 1.5).abs() < 1e-9);
        }
    }
}
