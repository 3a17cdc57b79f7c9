use frameloop_common::{Color, GeometryHandle, MaterialHandle, Transform};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    Ambient { color: Color, intensity: f32 },
    Directional { color: Color, intensity: f32, cast_shadow: bool },
    Point { color: Color, intensity: f32, distance: f32 },
}

/// What a node draws, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Mesh {
        geometry: GeometryHandle,
        material: MaterialHandle,
    },
    Points {
        geometry: GeometryHandle,
        material: MaterialHandle,
    },
    Group,
    Light(Light),
}

impl NodeKind {
    /// The pool records this node draws with.
    pub fn resources(&self) -> Option<(GeometryHandle, MaterialHandle)> {
        match *self {
            Self::Mesh { geometry, material } | Self::Points { geometry, material } => {
                Some((geometry, material))
            }
            Self::Group | Self::Light(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub visible: bool,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            transform: Transform::default(),
            kind,
            visible: true,
        }
    }

    pub fn mesh(name: impl Into<String>, geometry: GeometryHandle, material: MaterialHandle) -> Self {
        Self::new(name, NodeKind::Mesh { geometry, material })
    }

    pub fn points(
        name: impl Into<String>,
        geometry: GeometryHandle,
        material: MaterialHandle,
    ) -> Self {
        Self::new(name, NodeKind::Points { geometry, material })
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, NodeKind::Group)
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::new(name, NodeKind::Light(light))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}
