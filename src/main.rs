use winit::{
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window},
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

// Import from the library crate
use walkthrough::{
    logging, ui,
    model, view, controller,
};

use controller::{install_scene, ControllerConfig, InputEvent, LockRequester, WalkController};
use model::{load_scene, Camera};
use view::{EguiFrame, GpuContext, RenderState};
use walkthrough::labels::TextLabel;

const DEFAULT_SCENE: &str = "assets/scene.json";

/// Cursor grab standing in for browser pointer lock. Grabbing is synchronous,
/// so the outcome is queued and replayed as a lock-changed event.
struct CursorGrab {
    window: Arc<Window>,
    changed: Rc<Cell<Option<bool>>>,
}

impl LockRequester for CursorGrab {
    fn request_lock(&self) {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                self.changed.set(Some(true));
            }
            Err(e) => warn!("cursor grab refused: {e}"),
        }
    }

    fn release_lock(&self) {
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            warn!("cursor release failed: {e}");
        }
        self.window.set_cursor_visible(true);
        self.changed.set(Some(false));
    }
}

struct App {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,

    // egui
    egui_state: egui_winit::State,
    egui_ctx: egui::Context,

    // Walkthrough state
    camera: Rc<RefCell<Camera>>,
    walker: WalkController,
    labels: Vec<TextLabel>,
    lock_changed: Rc<Cell<Option<bool>>>,
    blocker_visible: Rc<Cell<bool>>,

    // Frame timing
    started: Instant,
    last_frame_time: Instant,
}

impl App {
    async fn new(window: Arc<Window>, scene_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let gpu = GpuContext::new_native(window.clone()).await?;
        let mut render_state = RenderState::new(&gpu.device, &gpu.config);

        let camera = Rc::new(RefCell::new(Camera::new(gpu.config.width, gpu.config.height)));
        let lock_changed = Rc::new(Cell::new(None));
        let blocker_visible = Rc::new(Cell::new(true));

        let walker = WalkController::new(
            camera.clone(),
            Box::new(CursorGrab { window: window.clone(), changed: lock_changed.clone() }),
            Box::new({
                let blocker_visible = blocker_visible.clone();
                move |visible: bool| blocker_visible.set(visible)
            }),
            ControllerConfig::default(),
            0.0,
        );

        // A missing scene leaves an empty world; the frame loop keeps running
        let labels = match load_scene(scene_path).await {
            Ok(scene) => {
                let loaded = install_scene(scene, walker.collidables());
                render_state.upload_scene(&gpu.device, &loaded.scene);
                loaded.labels
            }
            Err(e) => {
                error!("failed to load scene '{scene_path}': {e}");
                Vec::new()
            }
        };

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );

        Ok(Self {
            window,
            gpu,
            render_state,
            egui_state,
            egui_ctx,
            camera,
            walker,
            labels,
            lock_changed,
            blocker_visible,
            started: Instant::now(),
            last_frame_time: Instant::now(),
        })
    }

    fn now_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Replay a grab or release as the lock-changed event a browser would send
    fn flush_lock_change(&mut self) {
        if let Some(locked) = self.lock_changed.take() {
            self.walker.handle_event(&InputEvent::PointerLockChanged { locked });
        }
    }

    fn input(&mut self, event: &WindowEvent) -> bool {
        // Egui only sees input while the pointer is free
        if !self.walker.is_locked() {
            let egui_captured = self.egui_state.on_window_event(self.window.as_ref(), event).consumed;
            if egui_captured {
                return true;
            }
        }

        let handled = match event {
            WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, repeat, .. }, .. } => {
                if let PhysicalKey::Code(code) = physical_key {
                    // winit key codes debug-print as DOM `KeyboardEvent.code` names
                    let code = format!("{code:?}");
                    match state {
                        ElementState::Pressed if !repeat => self.walker.handle_event(&InputEvent::KeyDown(code)),
                        ElementState::Pressed => {}
                        ElementState::Released => self.walker.handle_event(&InputEvent::KeyUp(code)),
                    }
                }
                true
            }
            WindowEvent::MouseInput { state: ElementState::Pressed, button: MouseButton::Left, .. } => {
                if !self.walker.is_locked() {
                    self.walker.lock();
                }
                true
            }
            WindowEvent::Focused(false) => {
                self.walker.handle_event(&InputEvent::FocusLost);
                if self.walker.is_locked() {
                    self.walker.unlock();
                }
                true
            }
            WindowEvent::Occluded(occluded) => {
                self.walker.handle_event(&InputEvent::VisibilityChanged { visible: !occluded });
                true
            }
            _ => false,
        };

        self.flush_lock_change();
        handled
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            let resized = self.render_state.resize(&self.gpu.device, &self.gpu.surface, new_size.width, new_size.height);
            if resized {
                self.camera.borrow_mut().set_aspect(new_size.width, new_size.height);
            }
        }
    }

    fn handle_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.walker.handle_event(&InputEvent::MouseMove { dx: dx as f32, dy: dy as f32 });
    }

    fn render_ui(&mut self, dt: f32) -> EguiFrame {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let camera = self.camera.borrow();
        let output = ui::build_ui(
            &self.egui_ctx,
            raw_input,
            &ui::UiFrame {
                camera: &camera,
                walker: &self.walker,
                labels: &self.labels,
                show_blocker: self.blocker_visible.get(),
                dt,
            },
        );
        drop(camera);

        self.egui_state.handle_platform_output(&self.window, output.platform_output);
        let pixels_per_point = self.window.scale_factor() as f32;
        EguiFrame {
            primitives: self.egui_ctx.tessellate(output.shapes, pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point,
        }
    }

    fn redraw(&mut self) -> Result<(), wgpu::SurfaceError> {
        let now = Instant::now();
        let dt = (now - self.last_frame_time).as_secs_f32();
        self.last_frame_time = now;

        self.walker.update(self.now_ms());
        self.render_state.write_uniforms(&self.gpu.queue, &self.camera.borrow());

        let overlay = self.render_ui(dt);
        self.render_state
            .draw_frame(&self.gpu.device, &self.gpu.queue, &self.gpu.surface, Some(overlay))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let scene_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SCENE.to_string());
    info!("starting walkthrough with scene {scene_path}");

    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title("Walkthrough")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut app = pollster::block_on(App::new(window.clone(), &scene_path))?;

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent {
                ref event,
                window_id,
            } if window_id == app.window.id() => {
                if !app.input(event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::Resized(physical_size) => {
                            app.resize(*physical_size);
                        }
                        WindowEvent::RedrawRequested => match app.redraw() {
                            Ok(_) => {}
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                error!("GPU out of memory, exiting");
                                elwt.exit();
                            }
                            Err(e) => debug!("skipped frame: {e}"),
                        },
                        _ => {}
                    }
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                app.handle_mouse_motion(delta.0, delta.1);
            }
            Event::AboutToWait => {
                app.window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
