//! The pieces every lesson shares: the stage it draws, the context trait the
//! frame steps see, and the loop wrapper hosts drive.

use crate::{LessonError, LessonKind};
use frameloop_assets::{Geometry, Material, ResourcePool};
use frameloop_common::{NodeId, Transform};
use frameloop_input::{Action, ActionQueue};
use frameloop_kernel::{
    DriverError, DriverState, FrameDriver, FrameScheduler, FrameTime, Liveness, MonotonicClock,
    Pacer, RunSummary, StepResult, Tick, TimeSource,
};
use frameloop_render::{OrbitControls, PerspectiveCamera, Presenter, Renderer};
use frameloop_scene::{Light, Node, Scene};
use glam::Vec3;

/// Scene, camera and pool, plus the input plumbing around them.
#[derive(Debug)]
pub struct Stage {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub pool: ResourcePool,
    pub controls: Option<OrbitControls>,
    pub actions: ActionQueue,
    liveness: Liveness,
}

impl Stage {
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self {
            scene: Scene::new(),
            camera,
            pool: ResourcePool::new(),
            controls: None,
            actions: ActionQueue::new(),
            liveness: Liveness::new(),
        }
    }

    /// Attach orbit controls circling `target`.
    pub fn with_controls(mut self, mut controls: OrbitControls, target: Vec3) -> Self {
        controls.target = target;
        self.camera.target = target;
        self.controls = Some(controls);
        self
    }

    /// Handle that stops the driver this stage runs under.
    pub fn liveness(&self) -> &Liveness {
        &self.liveness
    }

    /// Create a geometry/material pair and a mesh node drawing it.
    pub fn add_mesh(
        &mut self,
        name: &str,
        geometry: Geometry,
        material: Material,
        transform: Transform,
    ) -> Result<NodeId, LessonError> {
        let geometry = self.pool.create_geometry(geometry)?;
        let material = self.pool.create_material(material);
        Ok(self
            .scene
            .add(Node::mesh(name, geometry, material).with_transform(transform)))
    }

    pub fn add_light(&mut self, name: &str, light: Light, position: Vec3) -> NodeId {
        self.scene
            .add(Node::light(name, light).with_transform(Transform::from_position(position)))
    }
}

/// A lesson's frame context. The driver owns it and hands it to every step.
pub trait LessonContext: frameloop_render::View + 'static {
    fn stage(&self) -> &Stage;
    fn stage_mut(&mut self) -> &mut Stage;

    /// React to an action after camera and quit handling.
    fn apply(&mut self, action: Action) -> Result<(), LessonError> {
        tracing::trace!(%action, "action ignored by this lesson");
        Ok(())
    }

    /// One-line summary for headless hosts.
    fn status(&self) -> String {
        format!("{} nodes", self.stage().scene.len())
    }
}

/// Implements [`View`](frameloop_render::View) for a context by reading its stage.
macro_rules! impl_view {
    ($ty:ty) => {
        impl frameloop_render::View for $ty {
            fn scene(&self) -> &frameloop_scene::Scene {
                &self.stage.scene
            }
            fn camera(&self) -> &frameloop_render::PerspectiveCamera {
                &self.stage.camera
            }
            fn resources(&self) -> &frameloop_assets::ResourcePool {
                &self.stage.pool
            }
        }
    };
}
pub(crate) use impl_view;

/// Drain queued actions: camera moves and quit first, then the lesson's own handling.
fn input_step<C: LessonContext>(ctx: &mut C, _time: &FrameTime) -> StepResult {
    let actions = ctx.stage_mut().actions.drain();
    for action in actions {
        let stage = ctx.stage_mut();
        match action {
            Action::Orbit { azimuth, polar } => {
                if let Some(controls) = stage.controls.as_mut() {
                    controls.rotate(azimuth, polar);
                }
            }
            Action::Zoom(factor) => {
                if let Some(controls) = stage.controls.as_mut() {
                    controls.dolly(factor);
                }
            }
            Action::Quit => {
                tracing::info!("quit requested");
                stage.liveness.stop();
            }
            _ => {}
        }
        ctx.apply(action)?;
    }
    Ok(())
}

fn controls_step<C: LessonContext>(ctx: &mut C, _time: &FrameTime) -> StepResult {
    let stage = ctx.stage_mut();
    if let Some(controls) = stage.controls.as_mut() {
        controls.update(&mut stage.camera);
    }
    Ok(())
}

/// A running lesson, independent of its context type. This is what hosts hold.
pub trait SceneLoop {
    fn kind(&self) -> LessonKind;

    /// Run one frame and re-arm `scheduler` if the lesson is still live.
    fn tick(
        &mut self,
        renderer: &mut dyn Renderer,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<Tick, DriverError>;

    /// Blocking loop until stopped, failed, or `frame_limit` frames ran.
    fn run(
        &mut self,
        renderer: &mut dyn Renderer,
        pacer: &mut Pacer,
        frame_limit: Option<u64>,
    ) -> Result<RunSummary, DriverError>;

    /// Queue an action for the next frame's input step.
    fn push_action(&mut self, action: Action);

    fn liveness(&self) -> Liveness;

    fn state(&self) -> DriverState;

    fn resize(&mut self, width: u32, height: u32);

    fn status(&self) -> String;

    fn step_names(&self) -> Vec<&str>;

    fn stage(&self) -> &Stage;
}

/// A [`FrameDriver`] over a lesson context, with the shared steps registered.
pub struct LessonLoop<C, S: TimeSource = MonotonicClock> {
    kind: LessonKind,
    driver: FrameDriver<C, S>,
}

impl<C: LessonContext, S: TimeSource> LessonLoop<C, S> {
    /// Build the driver: `input` first, then the lesson's steps, then `controls`.
    pub(crate) fn assemble(
        kind: LessonKind,
        context: C,
        source: S,
        register: impl FnOnce(&mut FrameDriver<C, S>),
    ) -> Self {
        let mut driver = FrameDriver::with_clock(context, source);
        driver.context_mut().stage_mut().liveness = driver.liveness();
        driver.step("input", input_step::<C>);
        register(&mut driver);
        driver.step("controls", controls_step::<C>);
        tracing::info!(lesson = %kind, steps = ?driver.step_names(), "lesson assembled");
        Self { kind, driver }
    }

    pub fn driver(&self) -> &FrameDriver<C, S> {
        &self.driver
    }

    pub fn context(&self) -> &C {
        self.driver.context()
    }

    pub fn context_mut(&mut self) -> &mut C {
        self.driver.context_mut()
    }
}

impl<C: LessonContext, S: TimeSource> SceneLoop for LessonLoop<C, S> {
    fn kind(&self) -> LessonKind {
        self.kind
    }

    fn tick(
        &mut self,
        renderer: &mut dyn Renderer,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<Tick, DriverError> {
        self.driver.tick(&mut Presenter::new(renderer), scheduler)
    }

    fn run(
        &mut self,
        renderer: &mut dyn Renderer,
        pacer: &mut Pacer,
        frame_limit: Option<u64>,
    ) -> Result<RunSummary, DriverError> {
        let _span = tracing::info_span!("lesson", lesson = %self.kind).entered();
        self.driver
            .run(&mut Presenter::new(renderer), pacer, frame_limit)
    }

    fn push_action(&mut self, action: Action) {
        self.driver.context_mut().stage_mut().actions.push(action);
    }

    fn liveness(&self) -> Liveness {
        self.driver.liveness()
    }

    fn state(&self) -> DriverState {
        self.driver.state()
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.driver
            .context_mut()
            .stage_mut()
            .camera
            .set_viewport(width, height);
    }

    fn status(&self) -> String {
        self.driver.context().status()
    }

    fn step_names(&self) -> Vec<&str> {
        self.driver.step_names()
    }

    fn stage(&self) -> &Stage {
        self.driver.context().stage()
    }
}
