use crate::error::AssetError;
use crate::geometry::Vertex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Index into the owning model's materials.
    pub material: Option<usize>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, material: Option<usize>) -> Self {
        Self {
            vertices,
            indices,
            material,
        }
    }
}

/// Texture maps referenced by an MTL material, already resolved against
/// the OBJ directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDesc {
    pub name: String,
    pub diffuse_texture: Option<PathBuf>,
    pub specular_texture: Option<PathBuf>,
}

pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<MaterialDesc>,
}

impl Model {
    pub fn load_obj(path: &Path) -> Result<Self, AssetError> {
        let file = File::open(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let model = Self::parse_obj(&mut BufReader::new(file), base_dir).map_err(|source| {
            AssetError::Obj {
                path: path.to_path_buf(),
                source,
            }
        })?;
        if model.meshes.iter().all(|m| m.indices.is_empty()) {
            return Err(AssetError::EmptyModel(path.to_path_buf()));
        }
        log::info!(
            "loaded {} ({} meshes, {} materials)",
            path.display(),
            model.meshes.len(),
            model.materials.len()
        );
        Ok(model)
    }

    /// Parses OBJ text; `mtllib` and texture names resolve against `base_dir`.
    pub fn parse_obj(reader: &mut impl BufRead, base_dir: &Path) -> Result<Self, tobj::LoadError> {
        let (models, materials) = tobj::load_obj_buf(
            reader,
            &tobj::LoadOptions {
                single_index: true,
                triangulate: true,
                ..Default::default()
            },
            |mtl_path| tobj::load_mtl(base_dir.join(mtl_path)),
        )?;
        let materials = match materials {
            Ok(materials) => materials,
            Err(e) => {
                log::warn!("no usable materials under {}: {e}", base_dir.display());
                Vec::new()
            }
        };
        let materials = materials
            .into_iter()
            .map(|m| MaterialDesc {
                name: m.name,
                diffuse_texture: m.diffuse_texture.map(|t| base_dir.join(t)),
                specular_texture: m.specular_texture.map(|t| base_dir.join(t)),
            })
            .collect::<Vec<_>>();

        let meshes = models
            .into_iter()
            .map(|model| {
                let mesh = model.mesh;
                let n = mesh.positions.len() / 3;
                let vertices = (0..n)
                    .map(|i| {
                        let pos = [
                            mesh.positions[i * 3],
                            mesh.positions[i * 3 + 1],
                            mesh.positions[i * 3 + 2],
                        ];
                        let nor = if mesh.normals.len() < (i + 1) * 3 {
                            [0.0, 0.0, 1.0]
                        } else {
                            [
                                mesh.normals[i * 3],
                                mesh.normals[i * 3 + 1],
                                mesh.normals[i * 3 + 2],
                            ]
                        };
                        let uv = if mesh.texcoords.len() < (i + 1) * 2 {
                            [0.0, 0.0]
                        } else {
                            [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
                        };
                        Vertex::new(pos, nor, uv)
                    })
                    .collect();
                let material = mesh.material_id.filter(|&id| id < materials.len());
                Mesh::new(vertices, mesh.indices, material)
            })
            .collect();

        Ok(Self { meshes, materials })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
o tri
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    const QUAD_NO_NORMALS: &str = "\
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn reads_positions_uvs_and_normals() {
        let model = Model::parse_obj(&mut TRIANGLE.as_bytes(), Path::new(".")).unwrap();
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices.len(), 3);
        assert_eq!(mesh.vertices.len(), 3);
        assert!(mesh.vertices.iter().any(|v| v.uv == [1.0, 0.0] && v.position == [1.0, 0.0, 0.0]));
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
        assert_eq!(mesh.material, None);
    }

    #[test]
    fn triangulates_and_defaults_missing_attributes() {
        let model = Model::parse_obj(&mut QUAD_NO_NORMALS.as_bytes(), Path::new(".")).unwrap();
        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices.len(), 6);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 0.0, 1.0] && v.uv == [0.0, 0.0]));
    }

    #[test]
    fn missing_mtl_is_not_fatal() {
        let source = format!("mtllib nowhere.mtl\nusemtl bark\n{TRIANGLE}");
        let model = Model::parse_obj(&mut source.as_bytes(), Path::new("/nonexistent")).unwrap();
        assert!(model.materials.is_empty());
        assert_eq!(model.meshes[0].material, None);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = Model::load_obj(Path::new("/nonexistent/bank.obj"))
            .err()
            .map(|e| e.to_string());
        assert!(err.is_some_and(|e| e.contains("/nonexistent/bank.obj")));
    }
}
