//! Assets: the resource pool behind scene nodes and background asset loading.
//!
//! Geometry and material records live in a [`ResourcePool`] and are referenced
//! by handle. Records are released explicitly; [`ResourceSlot`] replaces a
//! geometry/material pair without leaking the old one. Files are loaded off the
//! frame thread and delivered through [`LoadHandle`].
//!
//! # Invariants
//! - A disposed handle never resolves again.
//! - A rebuild installs the new pair before the old pair is released.
//! - Load results are `Result`s; failures are logged apart from successes.

mod gltf;
mod load;
mod pool;
mod slot;
mod texture;

pub use gltf::{AnimationClip, ModelAsset, ModelMaterial, ModelMesh, parse_gltf};
pub use load::{AssetLoader, LoadHandle, LoadState};
pub use pool::{Geometry, GeometryRecord, Material, MaterialRecord, ResourcePool};
pub use slot::ResourceSlot;
pub use texture::TextureAsset;

use std::path::PathBuf;

/// Content-addressed id of a loaded file (first 8 bytes of its SHA-256).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ContentId(pub u64);

impl ContentId {
    pub fn of(bytes: &[u8]) -> Self {
        use sha2::{Digest, Sha256};
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(head))
    }
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("glTF parse error: {0}")]
    GltfParse(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("unknown geometry {0:?}")]
    UnknownGeometry(frameloop_common::GeometryHandle),
    #[error("unknown material {0:?}")]
    UnknownMaterial(frameloop_common::MaterialHandle),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("loader thread ended without delivering a result")]
    Abandoned,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_is_stable() {
        assert_eq!(ContentId::of(b"duck"), ContentId::of(b"duck"));
        assert_ne!(ContentId::of(b"duck"), ContentId::of(b"fox"));
    }
}
