//! Mesh import: Wavefront OBJ and STL (ASCII or binary).
//!
//! OBJ: the first model of the file is used. Faces are triangulated and
//! indexed once (`single_index`) so positions and normals share an index.
//! STL: facets are welded into an indexed mesh and smooth normals are
//! generated. Either way object bounds are accumulated while positions are
//! streamed into vertices.

use std::fs::OpenOptions;
use std::path::Path;

use throng_rendering::{MeshData, Vertex};
use throng_shared::bounds::ObjectBounds;
use throng_shared::math::{cross, length, normalize, sub};

use crate::error::{AppError, AppResult};

/// Mesh file formats the viewer can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    /// Wavefront `.obj`.
    Obj,
    /// Stereolithography `.stl`.
    Stl,
}

impl MeshFormat {
    /// Format implied by the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("obj") {
            Some(Self::Obj)
        } else if ext.eq_ignore_ascii_case("stl") {
            Some(Self::Stl)
        } else {
            None
        }
    }
}

fn load_error(path: &Path, reason: impl ToString) -> AppError {
    AppError::MeshLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Loads the mesh at `path`.
///
/// # Errors
///
/// [`AppError::MeshLoad`] if the file is missing, unreadable, of an unknown
/// format or has no model; [`AppError::EmptyMesh`] if it has no triangles.
pub fn load_mesh(path: &Path) -> AppResult<MeshData> {
    let (mesh, name) = match MeshFormat::from_path(path) {
        Some(MeshFormat::Obj) => load_obj(path)?,
        Some(MeshFormat::Stl) => load_stl(path)?,
        None => return Err(load_error(path, "unsupported format (expected .obj or .stl)")),
    };

    if !mesh.has_triangles() {
        return Err(AppError::EmptyMesh {
            path: path.to_path_buf(),
        });
    }

    tracing::info!(
        "loaded '{}' ({}): {} vertices, {} triangles",
        path.display(),
        name,
        mesh.vertices.len(),
        mesh.indices.len() / 3
    );
    Ok(mesh)
}

fn load_obj(path: &Path) -> AppResult<(MeshData, String)> {
    let options = tobj::LoadOptions {
        single_index: true,
        triangulate: true,
        ignore_lines: true,
        ignore_points: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj(path, &options).map_err(|e| load_error(path, e))?;

    let Some(model) = models.into_iter().next() else {
        return Err(load_error(path, "file contains no model"));
    };

    let mesh = mesh_from_buffers(&model.mesh.positions, &model.mesh.normals, model.mesh.indices);
    Ok((mesh, model.name))
}

fn load_stl(path: &Path) -> AppResult<(MeshData, String)> {
    let mut file = OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|e| load_error(path, e))?;
    let stl = stl_io::read_stl(&mut file).map_err(|e| load_error(path, e))?;

    let positions: Vec<f32> = stl
        .vertices
        .iter()
        .flat_map(|v| [v[0], v[1], v[2]])
        .collect();
    let indices: Vec<u32> = stl
        .faces
        .iter()
        .filter_map(|face| {
            let [a, b, c] = face.vertices;
            Some([u32::try_from(a).ok()?, u32::try_from(b).ok()?, u32::try_from(c).ok()?])
        })
        .flatten()
        .collect();

    Ok((mesh_from_buffers(&positions, &[], indices), "stl".to_owned()))
}

/// Builds a mesh from flat position/normal arrays and a triangle list.
///
/// `normals` may be empty, in which case smooth normals are generated.
/// Indices that reference a missing vertex are dropped with their triangle.
#[must_use]
pub fn mesh_from_buffers(positions: &[f32], normals: &[f32], indices: Vec<u32>) -> MeshData {
    let mut bounds = ObjectBounds::EMPTY;
    let mut vertices: Vec<Vertex> = positions
        .chunks_exact(3)
        .map(|p| {
            let position = [p[0], p[1], p[2]];
            bounds.extend(position);
            Vertex {
                position,
                normal: [0.0; 3],
            }
        })
        .collect();

    let vertex_count = vertices.len();
    let indices: Vec<u32> = indices
        .chunks_exact(3)
        .filter(|tri| tri.iter().all(|&i| (i as usize) < vertex_count))
        .flatten()
        .copied()
        .collect();

    if normals.len() == positions.len() && !normals.is_empty() {
        for (vertex, n) in vertices.iter_mut().zip(normals.chunks_exact(3)) {
            vertex.normal = [n[0], n[1], n[2]];
        }
    } else {
        generate_normals(&mut vertices, &indices);
    }

    MeshData {
        vertices,
        indices,
        bounds,
    }
}

/// Area-weighted vertex normals from the face normals around each vertex.
fn generate_normals(vertices: &mut [Vertex], indices: &[u32]) {
    let mut accum = vec![[0.0f32; 3]; vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (pa, pb, pc) = (vertices[a].position, vertices[b].position, vertices[c].position);
        let face = cross(sub(pb, pa), sub(pc, pa));
        for i in [a, b, c] {
            for (sum, f) in accum[i].iter_mut().zip(face) {
                *sum += f;
            }
        }
    }
    for (vertex, n) in vertices.iter_mut().zip(accum) {
        vertex.normal = if length(n) > 0.0 { normalize(n) } else { [0.0, 1.0, 0.0] };
    }
}
