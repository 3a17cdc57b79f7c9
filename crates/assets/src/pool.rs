use crate::AssetError;
use frameloop_common::{Color, GeometryHandle, MaterialHandle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geometry data as handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
    },
    Torus {
        radius: f32,
        tube: f32,
    },
    Cone {
        radius: f32,
        height: f32,
    },
    TorusKnot {
        radius: f32,
        tube: f32,
    },
    /// Raw per-vertex attributes, three floats per vertex.
    Buffer {
        positions: Vec<f32>,
        colors: Option<Vec<f32>>,
    },
}

impl Geometry {
    pub fn unit_box() -> Self {
        Self::Box {
            width: 1.0,
            height: 1.0,
            depth: 1.0,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere {
            radius,
            width_segments: 20,
            height_segments: 20,
        }
    }

    /// Number of vertices for buffer geometry; `None` for analytic shapes.
    pub fn vertex_count(&self) -> Option<usize> {
        match self {
            Self::Buffer { positions, .. } => Some(positions.len() / 3),
            _ => None,
        }
    }

    pub fn validate(&self) -> Result<(), AssetError> {
        match self {
            Self::Buffer { positions, colors } => {
                if positions.len() % 3 != 0 {
                    return Err(AssetError::InvalidGeometry(format!(
                        "position buffer length {} is not a multiple of 3",
                        positions.len()
                    )));
                }
                if let Some(colors) = colors {
                    if colors.len() != positions.len() {
                        return Err(AssetError::InvalidGeometry(format!(
                            "color buffer length {} does not match {} positions",
                            colors.len(),
                            positions.len()
                        )));
                    }
                }
                Ok(())
            }
            Self::Sphere { radius, .. } if *radius < 0.0 => Err(AssetError::InvalidGeometry(
                format!("negative sphere radius {radius}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Surface description as handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Material {
    Basic {
        color: Color,
        opacity: f32,
    },
    Standard {
        color: Color,
        metalness: f32,
        roughness: f32,
    },
    Toon {
        color: Color,
    },
    Points {
        color: Color,
        size: f32,
        size_attenuation: bool,
        depth_write: bool,
        additive: bool,
        vertex_colors: bool,
    },
}

impl Material {
    pub fn standard(color: Color) -> Self {
        Self::Standard {
            color,
            metalness: 0.3,
            roughness: 0.4,
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Basic { color, .. }
            | Self::Standard { color, .. }
            | Self::Toon { color }
            | Self::Points { color, .. } => *color,
        }
    }

    pub fn opacity(&self) -> f32 {
        match self {
            Self::Basic { opacity, .. } => *opacity,
            _ => 1.0,
        }
    }
}

/// A geometry plus the number of times it was mutated in place.
#[derive(Debug, Clone)]
pub struct GeometryRecord {
    pub geometry: Geometry,
    pub version: u64,
}

#[derive(Debug, Clone)]
pub struct MaterialRecord {
    pub material: Material,
    pub version: u64,
}

/// Owner of every live geometry and material record.
///
/// Records stay alive until disposed; dropping a handle does nothing. Renderers
/// watch `version` to know when to re-upload mutated data.
#[derive(Debug, Default)]
pub struct ResourcePool {
    geometries: BTreeMap<GeometryHandle, GeometryRecord>,
    materials: BTreeMap<MaterialHandle, MaterialRecord>,
    next_id: u64,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn create_geometry(&mut self, geometry: Geometry) -> Result<GeometryHandle, AssetError> {
        geometry.validate()?;
        let handle = GeometryHandle(self.next_id());
        tracing::debug!(?handle, vertices = ?geometry.vertex_count(), "geometry created");
        self.geometries.insert(
            handle,
            GeometryRecord {
                geometry,
                version: 0,
            },
        );
        Ok(handle)
    }

    pub fn create_material(&mut self, material: Material) -> MaterialHandle {
        let handle = MaterialHandle(self.next_id());
        tracing::debug!(?handle, "material created");
        self.materials.insert(
            handle,
            MaterialRecord {
                material,
                version: 0,
            },
        );
        handle
    }

    pub fn geometry(&self, handle: GeometryHandle) -> Option<&GeometryRecord> {
        self.geometries.get(&handle)
    }

    /// Mutable access to a geometry; marks it for re-upload.
    pub fn geometry_mut(&mut self, handle: GeometryHandle) -> Option<&mut Geometry> {
        let record = self.geometries.get_mut(&handle)?;
        record.version += 1;
        Some(&mut record.geometry)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&MaterialRecord> {
        self.materials.get(&handle)
    }

    /// Mutable access to a material; marks it changed.
    pub fn material_mut(&mut self, handle: MaterialHandle) -> Option<&mut Material> {
        let record = self.materials.get_mut(&handle)?;
        record.version += 1;
        Some(&mut record.material)
    }

    /// Release a geometry. Returns false if it was not live.
    pub fn dispose_geometry(&mut self, handle: GeometryHandle) -> bool {
        let removed = self.geometries.remove(&handle).is_some();
        if removed {
            tracing::debug!(?handle, "geometry disposed");
        }
        removed
    }

    /// Release a material. Returns false if it was not live.
    pub fn dispose_material(&mut self, handle: MaterialHandle) -> bool {
        let removed = self.materials.remove(&handle).is_some();
        if removed {
            tracing::debug!(?handle, "material disposed");
        }
        removed
    }

    pub fn live_geometries(&self) -> usize {
        self.geometries.len()
    }

    pub fn live_materials(&self) -> usize {
        self.materials.len()
    }

    pub fn geometry_handles(&self) -> impl Iterator<Item = GeometryHandle> + '_ {
        self.geometries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_dispose() {
        let mut pool = ResourcePool::new();
        let g = pool.create_geometry(Geometry::unit_box()).unwrap();
        let m = pool.create_material(Material::standard(Color::WHITE));
        assert_eq!(pool.live_geometries(), 1);
        assert_eq!(pool.live_materials(), 1);

        assert!(pool.dispose_geometry(g));
        assert!(pool.dispose_material(m));
        assert!(!pool.dispose_geometry(g));
        assert!(pool.geometry(g).is_none());
        assert_eq!(pool.live_geometries(), 0);
        assert_eq!(pool.live_materials(), 0);
    }

    #[test]
    fn handles_are_never_reused() {
        let mut pool = ResourcePool::new();
        let a = pool.create_geometry(Geometry::unit_box()).unwrap();
        pool.dispose_geometry(a);
        let b = pool.create_geometry(Geometry::unit_box()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn mutation_bumps_version() {
        let mut pool = ResourcePool::new();
        let g = pool
            .create_geometry(Geometry::Buffer {
                positions: vec![0.0; 6],
                colors: None,
            })
            .unwrap();
        assert_eq!(pool.geometry(g).unwrap().version, 0);
        if let Some(Geometry::Buffer { positions, .. }) = pool.geometry_mut(g) {
            positions[1] = 1.0;
        }
        let record = pool.geometry(g).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.geometry.vertex_count(), Some(2));
    }

    #[test]
    fn rejects_malformed_buffers() {
        let mut pool = ResourcePool::new();
        let err = pool.create_geometry(Geometry::Buffer {
            positions: vec![0.0; 4],
            colors: None,
        });
        assert!(matches!(err, Err(AssetError::InvalidGeometry(_))));

        let err = pool.create_geometry(Geometry::Buffer {
            positions: vec![0.0; 6],
            colors: Some(vec![0.0; 3]),
        });
        assert!(err.is_err());
        assert_eq!(pool.live_geometries(), 0);
    }
}
