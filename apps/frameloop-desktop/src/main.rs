use anyhow::{Context, Result};
use clap::Parser;
use frameloop_input::{Action, Bindings, Key};
use frameloop_kernel::{FrameScheduler, Tick};
use frameloop_lessons::{LessonConfig, LessonKind, SceneLoop};
use frameloop_render::Renderer;
use frameloop_render_wgpu::{GpuContext, WgpuRenderer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

/// Wheel lines per viewport height.
const LINES_PER_PAGE: f32 = 8.0;

#[derive(Parser)]
#[command(name = "frameloop-desktop", about = "Run a frameloop lesson in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Lesson to open
    #[arg(short, long, default_value = "physics")]
    lesson: LessonKind,

    /// Lesson settings (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Re-arms a frame by asking the window for another redraw.
struct RedrawScheduler<'w>(&'w Window);

impl FrameScheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

fn key_for(code: KeyCode) -> Option<Key> {
    let key = match code {
        KeyCode::Space => Key::Space,
        KeyCode::KeyB => Key::B,
        KeyCode::KeyR => Key::R,
        KeyCode::KeyG => Key::G,
        KeyCode::KeyP => Key::P,
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Equal | KeyCode::NumpadAdd => Key::Plus,
        KeyCode::Minus | KeyCode::NumpadSubtract => Key::Minus,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    };
    Some(key)
}

struct App {
    lesson: Box<dyn SceneLoop>,
    bindings: Bindings,
    window: Option<Arc<Window>>,
    renderer: Option<WgpuRenderer>,
    size: PhysicalSize<u32>,
}

impl App {
    fn new(lesson: Box<dyn SceneLoop>) -> Self {
        Self {
            lesson,
            bindings: Bindings::default(),
            window: None,
            renderer: None,
            size: PhysicalSize::new(1280, 720),
        }
    }

    fn open(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(format!("frameloop: {}", self.lesson.kind()))
            .with_inner_size(self.size);
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);
        let size = window.inner_size();

        let gpu = pollster::block_on(GpuContext::new(window.clone(), size.width, size.height))
            .context("initialize GPU")?;
        tracing::info!("GPU initialized with {} backend", gpu.backend());

        self.size = size;
        self.lesson.resize(size.width, size.height);
        self.renderer = Some(WgpuRenderer::new(gpu));
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let width = self.size.width.max(1) as f64;
        let height = self.size.height.max(1) as f64;
        self.lesson.push_action(Action::CursorMove {
            x: (position.x / width - 0.5) as f32,
            y: (position.y / height - 0.5) as f32,
        });
    }

    fn scrolled(&mut self, delta: MouseScrollDelta) {
        let pages = match delta {
            MouseScrollDelta::LineDelta(_, lines) => -lines / LINES_PER_PAGE,
            MouseScrollDelta::PixelDelta(pixels) => {
                (-pixels.y / self.size.height.max(1) as f64) as f32
            }
        };
        self.lesson.push_action(Action::Scroll(pages));
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (self.window.as_ref(), self.renderer.as_mut()) else {
            return;
        };
        match self.lesson.tick(renderer, &mut RedrawScheduler(window)) {
            Ok(Tick::Scheduled(_)) => {}
            Ok(Tick::Finished(time)) => {
                tracing::info!(frames = time.frame, "lesson finished");
                event_loop.exit();
            }
            Ok(Tick::Inactive) => event_loop.exit(),
            Err(e) => {
                tracing::error!("frame failed: {e}");
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.open(event_loop) {
            tracing::error!("failed to open window: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.lesson.liveness().stop();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.size = new_size;
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(new_size.width, new_size.height);
                }
                self.lesson.resize(new_size.width, new_size.height);
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(action) = key_for(code).and_then(|key| self.bindings.get(key)) {
                    tracing::debug!(%action, "key action");
                    self.lesson.push_action(action);
                }
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor_moved(position),
            WindowEvent::MouseWheel { delta, .. } => self.scrolled(delta),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = match &cli.config {
        Some(path) => LessonConfig::load(path)
            .with_context(|| format!("loading lesson config {}", path.display()))?,
        None => LessonConfig::default(),
    };
    tracing::info!(lesson = %cli.lesson, "frameloop-desktop starting");
    let lesson = frameloop_lessons::build(cli.lesson, &config, frameloop_kernel::MonotonicClock::new())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(lesson);
    event_loop.run_app(&mut app)?;

    Ok(())
}
