//! glTF metadata import.
//!
//! Reads the JSON document (plain `.gltf` or the JSON chunk of a `.glb`) and
//! extracts what the scene needs: mesh and material summaries, the node count,
//! and animation clips with their durations. Vertex buffers are not decoded.

use crate::{AssetError, ContentId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_JSON_CHUNK: u32 = 0x4E4F_534A;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMesh {
    pub name: String,
    pub primitive_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMaterial {
    pub name: String,
    pub base_color: [f32; 4],
}

/// A named animation and its length in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationClip {
    pub name: String,
    pub duration: f32,
    pub channel_count: usize,
}

/// Everything the importer extracted from one model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAsset {
    pub id: ContentId,
    pub meshes: Vec<ModelMesh>,
    pub materials: Vec<ModelMaterial>,
    pub node_count: usize,
    pub animations: Vec<AnimationClip>,
}

impl ModelAsset {
    pub fn animation(&self, name: &str) -> Option<&AnimationClip> {
        self.animations.iter().find(|a| a.name == name)
    }
}

/// Parse a `.gltf` or `.glb` document from raw bytes.
pub fn parse_gltf(bytes: &[u8]) -> Result<ModelAsset, AssetError> {
    let json_bytes = if bytes.starts_with(GLB_MAGIC) {
        glb_json_chunk(bytes)?
    } else {
        bytes
    };
    let json: Value =
        serde_json::from_slice(json_bytes).map_err(|e| AssetError::GltfParse(e.to_string()))?;
    if !json.is_object() {
        return Err(AssetError::GltfParse("document root is not an object".into()));
    }

    let meshes = array(&json, "meshes")
        .iter()
        .enumerate()
        .map(|(i, mesh)| ModelMesh {
            name: name_or(mesh, "mesh", i),
            primitive_count: array(mesh, "primitives").len(),
        })
        .collect();

    let materials = array(&json, "materials")
        .iter()
        .enumerate()
        .map(|(i, mat)| ModelMaterial {
            name: name_or(mat, "material", i),
            base_color: base_color(mat),
        })
        .collect();

    let accessors = array(&json, "accessors");
    let animations = array(&json, "animations")
        .iter()
        .enumerate()
        .map(|(i, anim)| animation_clip(anim, i, accessors))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ModelAsset {
        id: ContentId::of(bytes),
        meshes,
        materials,
        node_count: array(&json, "nodes").len(),
        animations,
    })
}

fn glb_json_chunk(bytes: &[u8]) -> Result<&[u8], AssetError> {
    let word = |at: usize| -> Result<u32, AssetError> {
        bytes
            .get(at..at + 4)
            .and_then(|w| w.try_into().ok())
            .map(u32::from_le_bytes)
            .ok_or_else(|| AssetError::GltfParse("truncated GLB header".into()))
    };
    let version = word(4)?;
    if version != 2 {
        return Err(AssetError::GltfParse(format!(
            "unsupported GLB version {version}"
        )));
    }
    let chunk_len = word(12)? as usize;
    if word(16)? != GLB_JSON_CHUNK {
        return Err(AssetError::GltfParse("first GLB chunk is not JSON".into()));
    }
    bytes
        .get(20..20 + chunk_len)
        .ok_or_else(|| AssetError::GltfParse("GLB JSON chunk overruns file".into()))
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn name_or(value: &Value, kind: &str, index: usize) -> String {
    value
        .get("name")
        .and_then(|n| n.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{kind}_{index}"))
}

fn base_color(material: &Value) -> [f32; 4] {
    let mut color = [1.0f32; 4];
    if let Some(factor) = material
        .get("pbrMetallicRoughness")
        .and_then(|pbr| pbr.get("baseColorFactor"))
        .and_then(|c| c.as_array())
    {
        for (slot, v) in color.iter_mut().zip(factor) {
            if let Some(f) = v.as_f64() {
                *slot = f as f32;
            }
        }
    }
    color
}

/// Clip duration is the largest keyframe time over every sampler input.
fn animation_clip(anim: &Value, index: usize, accessors: &[Value]) -> Result<AnimationClip, AssetError> {
    let name = name_or(anim, "animation", index);
    let mut duration = 0.0f32;
    for sampler in array(anim, "samplers") {
        let input = sampler
            .get("input")
            .and_then(|i| i.as_u64())
            .ok_or_else(|| AssetError::GltfParse(format!("animation `{name}` sampler has no input")))?
            as usize;
        let accessor = accessors.get(input).ok_or_else(|| {
            AssetError::GltfParse(format!("animation `{name}` references missing accessor {input}"))
        })?;
        let max = array(accessor, "max")
            .first()
            .and_then(|m| m.as_f64())
            .unwrap_or(0.0) as f32;
        if max.is_finite() && max > duration {
            duration = max;
        }
    }
    Ok(AnimationClip {
        name,
        duration,
        channel_count: array(anim, "channels").len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOX: &str = r#"{
        "asset": {"version": "2.0"},
        "nodes": [{"name": "root"}, {"name": "body", "mesh": 0}],
        "meshes": [{"name": "fox", "primitives": [{}, {}]}],
        "materials": [{"name": "fur", "pbrMetallicRoughness": {"baseColorFactor": [0.5, 0.25, 0.1, 1.0]}}],
        "accessors": [
            {"count": 3, "max": [0.0]},
            {"count": 10, "max": [2.5]},
            {"count": 10, "max": [0.7]},
            {"count": 8, "max": [1.2]}
        ],
        "animations": [
            {"name": "Survey", "samplers": [{"input": 1}, {"input": 2}], "channels": [{}, {}]},
            {"name": "Walk", "samplers": [{"input": 3}], "channels": [{}]},
            {"samplers": []}
        ]
    }"#;

    #[test]
    fn extracts_meshes_materials_and_clips() {
        let model = parse_gltf(FOX.as_bytes()).unwrap();
        assert_eq!(model.node_count, 2);
        assert_eq!(model.meshes[0].name, "fox");
        assert_eq!(model.meshes[0].primitive_count, 2);
        assert_eq!(model.materials[0].base_color, [0.5, 0.25, 0.1, 1.0]);

        assert_eq!(model.animations.len(), 3);
        assert_eq!(model.animations[0].duration, 2.5);
        assert_eq!(model.animations[0].channel_count, 2);
        assert_eq!(model.animation("Walk").unwrap().duration, 1.2);
        assert_eq!(model.animations[2].name, "animation_2");
        assert_eq!(model.animations[2].duration, 0.0);
    }

    #[test]
    fn out_of_range_keyframe_times_are_ignored() {
        let doc = r#"{
            "accessors": [{"max": [-3.0]}, {"max": [1e39]}, {"max": [0.4]}],
            "animations": [
                {"name": "Backwards", "samplers": [{"input": 0}]},
                {"name": "Overflow", "samplers": [{"input": 1}, {"input": 2}]}
            ]
        }"#;
        let model = parse_gltf(doc.as_bytes()).unwrap();
        assert_eq!(model.animation("Backwards").unwrap().duration, 0.0);
        assert_eq!(model.animation("Overflow").unwrap().duration, 0.4);
    }

    #[test]
    fn model_survives_json_round_trip() {
        let model = parse_gltf(FOX.as_bytes()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let back: ModelAsset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
        assert_eq!(back.id, ContentId::of(FOX.as_bytes()));
    }

    #[test]
    fn reads_glb_json_chunk() {
        let json = FOX.as_bytes();
        let padded = json.len().next_multiple_of(4);
        let mut glb = Vec::new();
        glb.extend_from_slice(GLB_MAGIC);
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&((20 + padded) as u32).to_le_bytes());
        glb.extend_from_slice(&(padded as u32).to_le_bytes());
        glb.extend_from_slice(&GLB_JSON_CHUNK.to_le_bytes());
        glb.extend_from_slice(json);
        glb.resize(20 + padded, b' ');

        let model = parse_gltf(&glb).unwrap();
        assert_eq!(model.animations.len(), 3);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse_gltf(b"not json"), Err(AssetError::GltfParse(_))));
        assert!(parse_gltf(b"[1, 2]").is_err());
        assert!(parse_gltf(b"glTF\x02\x00").is_err());
    }

    #[test]
    fn missing_accessor_is_an_error() {
        let doc = r#"{"animations": [{"samplers": [{"input": 9}]}]}"#;
        assert!(parse_gltf(doc.as_bytes()).is_err());
    }
}
