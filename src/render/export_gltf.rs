// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Detgeom Team

//! GLTF/GLB exporter for collected scenes

use super::scene::SceneCollector;
use super::visual::{Representation, VisOptions};
use crate::geometry::Mesh;
use ahash::AHashMap;
use anyhow::{Context, Result};
use serde_json::{json, Map, Value};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

const FLOAT: u32 = 5126;
const UNSIGNED_INT: u32 = 5125;
const ARRAY_BUFFER: u32 = 34962;
const ELEMENT_ARRAY_BUFFER: u32 = 34963;

/// Export a scene to GLTF or GLB format, chosen by the file extension
pub fn export_scene(scene: &SceneCollector, path: &Path) -> Result<()> {
    let is_glb = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("glb"));

    if is_glb {
        let (gltf, buffer) = create_gltf_json(scene, None)?;
        export_glb(&gltf, &buffer, path)?;
    } else {
        let bin_path = path.with_extension("bin");
        let bin_name = bin_path
            .file_name()
            .and_then(|name| name.to_str())
            .context("scene path has no usable file name")?
            .to_string();
        let (gltf, buffer) = create_gltf_json(scene, Some(&bin_name))?;

        let json_string = serde_json::to_string_pretty(&gltf)?;
        std::fs::write(path, json_string)
            .with_context(|| format!("failed to write {}", path.display()))?;
        if !buffer.is_empty() {
            std::fs::write(&bin_path, buffer)
                .with_context(|| format!("failed to write {}", bin_path.display()))?;
        }
    }

    info!(
        path = %path.display(),
        meshes = scene.meshes.len(),
        nodes = scene.nodes.len(),
        "exported scene"
    );
    Ok(())
}

/// Write binary GLTF: header, JSON chunk, BIN chunk
fn export_glb(gltf: &Value, buffer_data: &[u8], path: &Path) -> Result<()> {
    let json_string = serde_json::to_string(gltf)?;
    let mut json_offset = json_string.len();
    align_to_multiple_of_four(&mut json_offset);
    let json_padding = json_offset - json_string.len();

    let mut buffer_offset = buffer_data.len();
    align_to_multiple_of_four(&mut buffer_offset);
    let buffer_padding = buffer_offset - buffer_data.len();

    let bin_chunk = if buffer_data.is_empty() { 0 } else { 8 + buffer_offset };
    let total_length = 12 + 8 + json_offset + bin_chunk;

    let mut file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;

    // GLB header
    file.write_all(&0x46546C67u32.to_le_bytes())?; // magic: "glTF"
    file.write_all(&2u32.to_le_bytes())?; // version
    file.write_all(&(total_length as u32).to_le_bytes())?;

    // JSON chunk
    file.write_all(&(json_offset as u32).to_le_bytes())?;
    file.write_all(&0x4E4F534Au32.to_le_bytes())?; // type: "JSON"
    file.write_all(json_string.as_bytes())?;
    file.write_all(&vec![b' '; json_padding])?;

    if !buffer_data.is_empty() {
        // BIN chunk
        file.write_all(&(buffer_offset as u32).to_le_bytes())?;
        file.write_all(&0x004E4942u32.to_le_bytes())?; // type: "BIN\0"
        file.write_all(buffer_data)?;
        file.write_all(&vec![0u8; buffer_padding])?;
    }

    Ok(())
}

/// Accessor indices of one mesh in the binary buffer
struct MeshAccessors {
    position: usize,
    normal: usize,
    indices: usize,
}

#[derive(Default)]
struct GltfBuilder {
    buffer: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
}

impl GltfBuilder {
    fn push_view(&mut self, bytes: &[u8], target: u32) -> usize {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
            "target": target
        }));
        self.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    /// `None` for meshes without triangles; glTF accessors may not be empty
    fn add_mesh(&mut self, mesh: &Mesh) -> Option<MeshAccessors> {
        let triangles = mesh.triangles();
        if triangles.is_empty() {
            return None;
        }

        let mut positions = Vec::with_capacity(mesh.vertices.len() * 12);
        let mut normals = Vec::with_capacity(mesh.vertices.len() * 12);
        let (mut min, mut max) = ([f32::MAX; 3], [f32::MIN; 3]);
        for vertex in &mesh.vertices {
            let p = [
                vertex.position.x as f32,
                vertex.position.y as f32,
                vertex.position.z as f32,
            ];
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
                positions.extend_from_slice(&p[axis].to_le_bytes());
                normals.extend_from_slice(&(vertex.normal[axis] as f32).to_le_bytes());
            }
        }

        let mut indices = Vec::with_capacity(triangles.len() * 12);
        for triangle in &triangles {
            for index in triangle {
                indices.extend_from_slice(&(*index as u32).to_le_bytes());
            }
        }

        let view = self.push_view(&positions, ARRAY_BUFFER);
        let position = self.push_accessor(json!({
            "bufferView": view,
            "byteOffset": 0,
            "componentType": FLOAT,
            "count": mesh.vertices.len(),
            "type": "VEC3",
            "min": min,
            "max": max
        }));
        let view = self.push_view(&normals, ARRAY_BUFFER);
        let normal = self.push_accessor(json!({
            "bufferView": view,
            "byteOffset": 0,
            "componentType": FLOAT,
            "count": mesh.vertices.len(),
            "type": "VEC3"
        }));
        let view = self.push_view(&indices, ELEMENT_ARRAY_BUFFER);
        let indices = self.push_accessor(json!({
            "bufferView": view,
            "byteOffset": 0,
            "componentType": UNSIGNED_INT,
            "count": triangles.len() * 3,
            "type": "SCALAR"
        }));

        Some(MeshAccessors {
            position,
            normal,
            indices,
        })
    }
}

fn material_json(visual: &VisOptions) -> Value {
    let [r, g, b] = visual.colour;
    let representation = match visual.representation {
        Representation::Surface => "surface",
        Representation::Wireframe => "wireframe",
    };
    let mut material = json!({
        "pbrMetallicRoughness": {
            "baseColorFactor": [r, g, b, visual.alpha],
            "metallicFactor": 0.0,
            "roughnessFactor": 1.0
        },
        "doubleSided": true,
        "extras": {
            "representation": representation,
            "lineWidth": visual.line_width
        }
    });
    if visual.alpha < 1.0 {
        material["alphaMode"] = json!("BLEND");
    }
    material
}

fn create_gltf_json(scene: &SceneCollector, bin_uri: Option<&str>) -> Result<(Value, Vec<u8>)> {
    let mut builder = GltfBuilder::default();
    let accessors: Vec<Option<MeshAccessors>> =
        scene.meshes.iter().map(|m| builder.add_mesh(&m.mesh)).collect();

    // One material per distinct visual, one glTF mesh per (mesh, material) pair
    let mut materials: Vec<VisOptions> = Vec::new();
    let mut gltf_meshes: Vec<Value> = Vec::new();
    let mut mesh_lookup: AHashMap<(usize, usize), usize> = AHashMap::new();
    let mut nodes = Vec::with_capacity(scene.nodes.len());

    for node in &scene.nodes {
        let mut node_json = json!({
            "name": node.name,
            "matrix": node.matrix.as_slice()
        });

        if let Some(Some(mesh)) = accessors.get(node.mesh) {
            let material = match materials.iter().position(|m| same_material(m, &node.visual)) {
                Some(index) => index,
                None => {
                    materials.push(node.visual.clone());
                    materials.len() - 1
                }
            };
            let gltf_mesh = *mesh_lookup.entry((node.mesh, material)).or_insert_with(|| {
                gltf_meshes.push(json!({
                    "name": scene.meshes[node.mesh].key,
                    "primitives": [{
                        "attributes": {
                            "POSITION": mesh.position,
                            "NORMAL": mesh.normal
                        },
                        "indices": mesh.indices,
                        "material": material,
                        "mode": 4
                    }]
                }));
                gltf_meshes.len() - 1
            });
            node_json["mesh"] = json!(gltf_mesh);
        }
        nodes.push(node_json);
    }

    let mut root = Map::new();
    root.insert(
        "asset".into(),
        json!({ "generator": "detgeom", "version": "2.0" }),
    );
    root.insert("scene".into(), json!(0));
    root.insert(
        "scenes".into(),
        json!([{ "nodes": (0..nodes.len()).collect::<Vec<_>>() }]),
    );
    root.insert("nodes".into(), Value::Array(nodes));
    if !gltf_meshes.is_empty() {
        root.insert("meshes".into(), Value::Array(gltf_meshes));
        root.insert(
            "materials".into(),
            Value::Array(materials.iter().map(material_json).collect()),
        );
    }

    let GltfBuilder {
        buffer,
        buffer_views,
        accessors,
    } = builder;
    if !buffer.is_empty() {
        root.insert("accessors".into(), Value::Array(accessors));
        root.insert("bufferViews".into(), Value::Array(buffer_views));
        let mut gltf_buffer = json!({ "byteLength": buffer.len() });
        if let Some(uri) = bin_uri {
            gltf_buffer["uri"] = json!(uri);
        }
        root.insert("buffers".into(), json!([gltf_buffer]));
    }

    Ok((Value::Object(root), buffer))
}

fn same_material(a: &VisOptions, b: &VisOptions) -> bool {
    a.colour == b.colour
        && a.alpha == b.alpha
        && a.representation == b.representation
        && a.line_width == b.line_width
}

fn align_to_multiple_of_four(n: &mut usize) {
    *n = (*n + 3) & !3;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Primitive;
    use crate::render::RenderBackend;
    use nalgebra::{Matrix4, Vector3};
    use tempfile::TempDir;

    fn two_cubes() -> SceneCollector {
        let mut scene = SceneCollector::new();
        let cube = Primitive::cuboid(Vector3::new(10.0, 10.0, 10.0)).to_mesh();
        let handle = scene.create_mesh("cube", &cube).unwrap();
        scene
            .add_actor(&handle, &Matrix4::identity(), "a", &VisOptions::default())
            .unwrap();
        scene
            .add_actor(
                &handle,
                &Matrix4::new_translation(&Vector3::new(20.0, 0.0, 0.0)),
                "b",
                &VisOptions::new([1.0, 0.0, 0.0], 1.0),
            )
            .unwrap();
        scene
    }

    #[test]
    fn test_export_glb() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("scene.glb");

        export_scene(&two_cubes(), &path)?;

        let file_content = std::fs::read(&path)?;
        assert_eq!(&file_content[0..4], b"glTF");
        let total = u32::from_le_bytes([file_content[8], file_content[9], file_content[10], file_content[11]]);
        assert_eq!(total as usize, file_content.len());
        assert_eq!(file_content.len() % 4, 0);
        Ok(())
    }

    #[test]
    fn test_export_gltf_structure() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("scene.gltf");

        export_scene(&two_cubes(), &path)?;

        assert!(dir.path().join("scene.bin").exists());
        let gltf: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(gltf["buffers"][0]["uri"], "scene.bin");
        assert_eq!(gltf["nodes"].as_array().unwrap().len(), 2);
        // Same mesh, two visuals
        assert_eq!(gltf["meshes"].as_array().unwrap().len(), 2);
        assert_eq!(gltf["materials"].as_array().unwrap().len(), 2);
        assert_eq!(gltf["materials"][0]["alphaMode"], "BLEND");
        assert!(gltf["materials"][1].get("alphaMode").is_none());
        assert_eq!(gltf["nodes"][1]["matrix"][12], 20.0);
        Ok(())
    }

    #[test]
    fn test_export_empty_scene() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("empty.gltf");

        export_scene(&SceneCollector::new(), &path)?;

        let gltf: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert!(gltf.get("buffers").is_none());
        assert!(!dir.path().join("empty.bin").exists());
        Ok(())
    }
}
