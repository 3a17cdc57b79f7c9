use crate::AssetError;
use crate::pool::{Geometry, Material, ResourcePool};
use frameloop_common::{GeometryHandle, MaterialHandle};

/// Holds the geometry/material pair currently installed for one object.
///
/// [`rebuild`](Self::rebuild) acquires the replacement, installs it, and only
/// then releases the previous pair, so the scene never references a released
/// record and there is no frame without a pair.
#[derive(Debug, Default)]
pub struct ResourceSlot {
    current: Option<(GeometryHandle, MaterialHandle)>,
}

impl ResourceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<(GeometryHandle, MaterialHandle)> {
        self.current
    }

    /// Replace the installed pair.
    ///
    /// `build` produces the new data, `install` points the scene at the new
    /// handles. If either fails, whatever was created here is released and the
    /// previous pair stays installed.
    pub fn rebuild<E, B, I>(
        &mut self,
        pool: &mut ResourcePool,
        build: B,
        install: I,
    ) -> Result<(GeometryHandle, MaterialHandle), E>
    where
        E: From<AssetError>,
        B: FnOnce() -> Result<(Geometry, Material), E>,
        I: FnOnce(GeometryHandle, MaterialHandle) -> Result<(), E>,
    {
        let (geometry, material) = build()?;
        let new_geometry = pool.create_geometry(geometry)?;
        let new_material = pool.create_material(material);

        if let Err(e) = install(new_geometry, new_material) {
            pool.dispose_geometry(new_geometry);
            pool.dispose_material(new_material);
            return Err(e);
        }

        if let Some((old_geometry, old_material)) = self.current.replace((new_geometry, new_material))
        {
            pool.dispose_geometry(old_geometry);
            pool.dispose_material(old_material);
        }
        Ok((new_geometry, new_material))
    }

    /// Release the installed pair, if any.
    pub fn release(&mut self, pool: &mut ResourcePool) -> bool {
        match self.current.take() {
            Some((geometry, material)) => {
                pool.dispose_geometry(geometry);
                pool.dispose_material(material);
                true
            }
            None => false,
        }
    }
}
