//! CPU-side vertex data and per-frame uniform packing.

use bytemuck::{Pod, Zeroable};
use frameloop_assets::{Geometry, Material};
use frameloop_common::Transform;
use frameloop_scene::{Light, NodeKind, Scene};
use glam::{Mat4, Vec3};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub(crate) struct Uniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_dir: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct InstanceData {
    pub model_0: [f32; 4],
    pub model_1: [f32; 4],
    pub model_2: [f32; 4],
    pub model_3: [f32; 4],
    pub color: [f32; 4],
}

impl InstanceData {
    pub fn new(model: Mat4, color: [f32; 4]) -> Self {
        let cols = model.to_cols_array_2d();
        Self {
            model_0: cols[0],
            model_1: cols[1],
            model_2: cols[2],
            model_3: cols[3],
            color,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Unit cube centred on the origin.
pub(crate) fn cube_mesh() -> (Vec<Vertex>, Vec<u16>) {
    let p = 0.5_f32;
    #[rustfmt::skip]
    let vertices = vec![
        // +Z face
        Vertex { position: [-p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 0.0, 1.0] },
        Vertex { position: [-p,  p,  p], normal: [0.0, 0.0, 1.0] },
        // -Z face
        Vertex { position: [ p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p, -p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 0.0, -1.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 0.0, -1.0] },
        // +X face
        Vertex { position: [ p, -p,  p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [1.0, 0.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [1.0, 0.0, 0.0] },
        // -X face
        Vertex { position: [-p, -p, -p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p,  p], normal: [-1.0, 0.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [-1.0, 0.0, 0.0] },
        // +Y face
        Vertex { position: [-p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p,  p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [ p,  p, -p], normal: [0.0, 1.0, 0.0] },
        Vertex { position: [-p,  p, -p], normal: [0.0, 1.0, 0.0] },
        // -Y face
        Vertex { position: [-p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p, -p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [ p, -p,  p], normal: [0.0, -1.0, 0.0] },
        Vertex { position: [-p, -p,  p], normal: [0.0, -1.0, 0.0] },
    ];
    #[rustfmt::skip]
    let indices: Vec<u16> = vec![
        0,1,2, 2,3,0,
        4,5,6, 6,7,4,
        8,9,10, 10,11,8,
        12,13,14, 14,15,12,
        16,17,18, 18,19,16,
        20,21,22, 22,23,20,
    ];
    (vertices, indices)
}

const PLANE_THICKNESS: f32 = 0.01;

/// Extents of the cube proxy that stands in for `geometry`.
pub(crate) fn proxy_extents(geometry: &Geometry) -> Vec3 {
    match *geometry {
        Geometry::Box {
            width,
            height,
            depth,
        } => Vec3::new(width, height, depth),
        Geometry::Sphere { radius, .. } => Vec3::splat(radius * 2.0),
        Geometry::Plane { width, height } => Vec3::new(width, height, PLANE_THICKNESS),
        Geometry::Torus { radius, tube } | Geometry::TorusKnot { radius, tube } => {
            let outer = (radius + tube) * 2.0;
            Vec3::new(outer, outer, tube * 2.0)
        }
        Geometry::Cone { radius, height } => Vec3::new(radius * 2.0, height, radius * 2.0),
        Geometry::Buffer { ref positions, .. } => {
            let (min, max) = positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .fold((Vec3::INFINITY, Vec3::NEG_INFINITY), |(lo, hi), p| {
                    (lo.min(p), hi.max(p))
                });
            if min.cmple(max).all() {
                (max - min).max(Vec3::splat(PLANE_THICKNESS))
            } else {
                Vec3::ZERO
            }
        }
    }
}

/// Instance for a mesh node: node transform scaled to the geometry.
pub(crate) fn mesh_instance(
    transform: &Transform,
    geometry: &Geometry,
    material: &Material,
) -> InstanceData {
    let model = Mat4::from_scale_rotation_translation(
        transform.scale * proxy_extents(geometry),
        transform.rotation,
        transform.position,
    );
    let [r, g, b] = material.color().to_array();
    InstanceData::new(model, [r, g, b, material.opacity()])
}

/// Instance for a points node: transform plus material tint.
pub(crate) fn points_instance(transform: &Transform, material: &Material) -> InstanceData {
    let model =
        Mat4::from_scale_rotation_translation(transform.scale, transform.rotation, transform.position);
    let [r, g, b] = material.color().to_array();
    InstanceData::new(model, [r, g, b, 1.0])
}

/// Whether a points material wants the additive, no-depth-write pipeline.
pub(crate) fn is_additive(material: &Material) -> bool {
    matches!(
        material,
        Material::Points { additive: true, .. } | Material::Points { depth_write: false, .. }
    )
}

/// Vertices for a point cloud. Analytic geometries have no point form.
pub(crate) fn point_vertices(geometry: &Geometry, material: &Material) -> Option<Vec<PointVertex>> {
    let Geometry::Buffer { positions, colors } = geometry else {
        return None;
    };
    let vertex_colors = matches!(
        material,
        Material::Points {
            vertex_colors: true,
            ..
        }
    );
    let colors = colors.as_deref().filter(|_| vertex_colors);
    Some(
        positions
            .chunks_exact(3)
            .enumerate()
            .map(|(i, p)| {
                let color = match colors {
                    Some(c) => [c[i * 3], c[i * 3 + 1], c[i * 3 + 2], 1.0],
                    None => [1.0; 4],
                };
                PointVertex {
                    position: [p[0], p[1], p[2]],
                    color,
                }
            })
            .collect(),
    )
}

const FALLBACK_AMBIENT: f32 = 0.3;
const FALLBACK_DIFFUSE: f32 = 0.7;

/// Fold the scene's lights into the single ambient + directional term the shader uses.
///
/// Ambient lights add up. The first directional or point light supplies the
/// diffuse term, shining from its position towards the origin. A scene
/// without lights gets a fixed key light.
pub(crate) fn lighting(scene: &Scene, view_proj: Mat4) -> Uniforms {
    let mut ambient = Vec3::ZERO;
    let mut key: Option<(Vec3, Vec3)> = None;
    let mut any = false;

    for (_, node) in scene.nodes() {
        let NodeKind::Light(light) = node.kind else {
            continue;
        };
        if !node.visible {
            continue;
        }
        any = true;
        match light {
            Light::Ambient { color, intensity } => {
                ambient += Vec3::from_array(color.to_array()) * intensity;
            }
            Light::Directional {
                color, intensity, ..
            }
            | Light::Point {
                color, intensity, ..
            } => {
                if key.is_none() {
                    let dir = node.transform.position.normalize_or(Vec3::Y);
                    key = Some((dir, Vec3::from_array(color.to_array()) * intensity));
                }
            }
        }
    }

    let (dir, color) = match key {
        Some(key) => key,
        None if !any => {
            ambient = Vec3::splat(FALLBACK_AMBIENT);
            (Vec3::new(0.3, 1.0, 0.5).normalize(), Vec3::splat(FALLBACK_DIFFUSE))
        }
        None => (Vec3::Y, Vec3::ZERO),
    };

    Uniforms {
        view_proj: view_proj.to_cols_array_2d(),
        light_dir: dir.extend(0.0).to_array(),
        light_color: color.extend(1.0).to_array(),
        ambient: ambient.extend(1.0).to_array(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frameloop_common::Color;
    use frameloop_scene::Node;
    use glam::Vec4;

    fn points_material(vertex_colors: bool, additive: bool) -> Material {
        Material::Points {
            color: Color::WHITE,
            size: 0.01,
            size_attenuation: true,
            depth_write: !additive,
            additive,
            vertex_colors,
        }
    }

    #[test]
    fn cube_has_six_faces() {
        let (verts, indices) = cube_mesh();
        assert_eq!(verts.len(), 24);
        assert_eq!(indices.len(), 36);
    }

    #[test]
    fn proxy_matches_box_and_sphere() {
        assert_eq!(
            proxy_extents(&Geometry::Box {
                width: 1.0,
                height: 2.0,
                depth: 3.0
            }),
            Vec3::new(1.0, 2.0, 3.0)
        );
        assert_eq!(proxy_extents(&Geometry::sphere(0.5)), Vec3::ONE);
        let empty = Geometry::Buffer {
            positions: Vec::new(),
            colors: None,
        };
        assert_eq!(proxy_extents(&empty), Vec3::ZERO);
    }

    #[test]
    fn mesh_instance_places_and_tints() {
        let transform = Transform::from_position(Vec3::new(0.0, 3.0, 0.0));
        let material = Material::Basic {
            color: Color::new(1.0, 0.0, 0.0),
            opacity: 0.5,
        };
        let inst = mesh_instance(&transform, &Geometry::sphere(0.5), &material);
        assert_eq!(inst.model_3, [0.0, 3.0, 0.0, 1.0]);
        assert_eq!(inst.color, [1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn point_vertices_use_colors_only_when_enabled() {
        let geometry = Geometry::Buffer {
            positions: vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            colors: Some(vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]),
        };
        let colored = point_vertices(&geometry, &points_material(true, true)).unwrap();
        assert_eq!(colored[1].position, [3.0, 4.0, 5.0]);
        assert_eq!(colored[1].color, [0.0, 0.0, 1.0, 1.0]);

        let plain = point_vertices(&geometry, &points_material(false, false)).unwrap();
        assert_eq!(plain[0].color, [1.0; 4]);
        assert!(point_vertices(&Geometry::unit_box(), &points_material(false, false)).is_none());
    }

    #[test]
    fn additive_follows_material_flags() {
        assert!(is_additive(&points_material(true, true)));
        assert!(!is_additive(&points_material(true, false)));
        assert!(!is_additive(&Material::standard(Color::WHITE)));
    }

    #[test]
    fn unlit_scene_gets_key_light() {
        let u = lighting(&Scene::new(), Mat4::IDENTITY);
        assert_eq!(u.ambient[0], FALLBACK_AMBIENT);
        assert_eq!(u.light_color[0], FALLBACK_DIFFUSE);
    }

    #[test]
    fn lights_fold_into_uniforms() {
        let mut scene = Scene::new();
        scene.add(Node::light(
            "ambient",
            Light::Ambient {
                color: Color::WHITE,
                intensity: 0.5,
            },
        ));
        scene.add(
            Node::light(
                "sun",
                Light::Directional {
                    color: Color::WHITE,
                    intensity: 1.5,
                    cast_shadow: true,
                },
            )
            .with_transform(Transform::from_position(Vec3::new(0.0, 4.0, 0.0))),
        );
        let u = lighting(&scene, Mat4::IDENTITY);
        assert_eq!(Vec4::from_array(u.ambient), Vec4::new(0.5, 0.5, 0.5, 1.0));
        assert_eq!(u.light_dir, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(u.light_color[1], 1.5);
    }
}
