use crate::{PerspectiveCamera, RenderFrame, Renderer};
use frameloop_assets::ResourcePool;
use frameloop_kernel::{FrameTime, Present, StepError};
use frameloop_scene::Scene;

/// A frame context that can be drawn: a scene, a camera and the pool behind it.
pub trait View {
    fn scene(&self) -> &Scene;
    fn camera(&self) -> &PerspectiveCamera;
    fn resources(&self) -> &ResourcePool;
}

/// Adapts a [`Renderer`] to the frame driver's draw hook.
pub struct Presenter<'r>(pub &'r mut dyn Renderer);

impl<'r> Presenter<'r> {
    pub fn new(renderer: &'r mut dyn Renderer) -> Self {
        Self(renderer)
    }
}

impl<C: View + ?Sized> Present<C> for Presenter<'_> {
    fn present(&mut self, ctx: &C, time: &FrameTime) -> Result<(), StepError> {
        let frame = RenderFrame {
            scene: ctx.scene(),
            camera: ctx.camera(),
            resources: ctx.resources(),
            frame: time.frame,
        };
        self.0.render(&frame)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DebugTextRenderer;
    use frameloop_assets::{Geometry, Material};
    use frameloop_common::Color;
    use frameloop_kernel::{FrameDriver, ManualClock, Pacer};
    use frameloop_scene::Node;
    use std::time::Duration;

    struct Spin {
        scene: Scene,
        camera: PerspectiveCamera,
        pool: ResourcePool,
    }

    impl View for Spin {
        fn scene(&self) -> &Scene {
            &self.scene
        }
        fn camera(&self) -> &PerspectiveCamera {
            &self.camera
        }
        fn resources(&self) -> &ResourcePool {
            &self.pool
        }
    }

    fn spin() -> Spin {
        let mut pool = ResourcePool::new();
        let g = pool.create_geometry(Geometry::unit_box()).unwrap();
        let m = pool.create_material(Material::standard(Color::WHITE));
        let mut scene = Scene::new();
        scene.add(Node::mesh("cube", g, m));
        Spin {
            scene,
            camera: PerspectiveCamera::default(),
            pool,
        }
    }

    #[test]
    fn driver_draws_post_update_state() {
        let clock = ManualClock::new();
        let mut driver = FrameDriver::with_clock(spin(), clock.clone());
        driver.step("rotate", move |ctx: &mut Spin, t: &FrameTime| {
            clock.advance(Duration::from_millis(16));
            let id = ctx.scene.find("cube").ok_or("cube missing")?;
            if let Some(node) = ctx.scene.get_mut(id) {
                node.transform.position.y = t.frame as f32;
            }
            Ok(())
        });

        let mut renderer = DebugTextRenderer::new();
        let mut presenter = Presenter::new(&mut renderer);
        let summary = driver
            .run(&mut presenter, &mut Pacer::unpaced(), Some(3))
            .unwrap();
        assert_eq!(summary.frames, 3);
        assert_eq!(renderer.frames(), 3);
        assert!(renderer.last_output().contains("Frame 3"));
        assert!(renderer.last_output().contains("pos=(0.00, 3.00, 0.00)"));
    }

    #[test]
    fn render_failure_stops_the_driver() {
        let mut driver = FrameDriver::with_clock(spin(), ManualClock::new());
        driver.step("dispose", |ctx: &mut Spin, _: &FrameTime| {
            let handles: Vec<_> = ctx.pool.geometry_handles().collect();
            for handle in handles {
                ctx.pool.dispose_geometry(handle);
            }
            Ok(())
        });

        let mut renderer = DebugTextRenderer::new();
        let mut presenter = Presenter::new(&mut renderer);
        let err = driver
            .run(&mut presenter, &mut Pacer::unpaced(), Some(5))
            .unwrap_err();
        assert!(matches!(
            err,
            frameloop_kernel::DriverError::Present { frame: 1, .. }
        ));
        assert_eq!(driver.state(), frameloop_kernel::DriverState::Stopped);
    }
}
