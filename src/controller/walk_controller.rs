use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use tracing::{debug, info};

use crate::controller::frame_loop::frame_delta;
use crate::controller::motion::MotionIntegrator;
use crate::controller::pointer_lock::{LockRequester, Overlay, PointerLockControls};
use crate::controller::probes::ProbeSet;
use crate::controller::vertical::{VerticalCorrection, VerticalProbes};
use crate::controller::{ControllerConfig, InputEvent, InputState};
use crate::model::{Camera, CollidableSet};

/// First-person walk controller: keyboard state and elapsed time in, camera
/// displacement out, with ray probes deciding what blocks and what supports.
pub struct WalkController {
    controls: PointerLockControls,
    input: InputState,
    probes: ProbeSet,
    vertical: VerticalProbes,
    motion: MotionIntegrator,
    collidables: CollidableSet,
    config: ControllerConfig,
    /// Milliseconds, same clock as `update`
    prev_time: f64,
    last_vertical: Option<VerticalCorrection>,
}

impl WalkController {
    pub fn new(
        camera: Rc<RefCell<Camera>>,
        requester: Box<dyn LockRequester>,
        overlay: Box<dyn Overlay>,
        config: ControllerConfig,
        now: f64,
    ) -> Self {
        let controls = PointerLockControls::new(camera, requester, overlay, config.mouse_sensitivity);
        controls.set_height(config.spawn_height);

        Self {
            controls,
            input: InputState::new(),
            probes: ProbeSet::new(&config),
            vertical: VerticalProbes::new(&config),
            motion: MotionIntegrator::new(&config),
            collidables: CollidableSet::new(),
            config,
            prev_time: now,
            last_vertical: None,
        }
    }

    /// Handle the host appends loaded geometry to
    pub fn collidables(&self) -> &CollidableSet {
        &self.collidables
    }

    pub fn controls(&self) -> &PointerLockControls {
        &self.controls
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn probes(&self) -> &ProbeSet {
        &self.probes
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn velocity(&self) -> Vec3 {
        self.motion.velocity
    }

    pub fn last_vertical(&self) -> Option<VerticalCorrection> {
        self.last_vertical
    }

    pub fn prev_time(&self) -> f64 {
        self.prev_time
    }

    pub fn is_locked(&self) -> bool {
        self.controls.is_locked()
    }

    pub fn lock(&self) {
        self.controls.lock();
    }

    pub fn unlock(&self) {
        self.controls.unlock();
    }

    pub fn on_key_down(&mut self, code: &str) -> bool {
        self.input.on_key_down(code)
    }

    pub fn on_key_up(&mut self, code: &str) -> bool {
        self.input.on_key_up(code)
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(code) => {
                if self.input.bindings().is_release(code) {
                    self.unlock();
                } else {
                    self.on_key_down(code);
                }
            }
            InputEvent::KeyUp(code) => {
                self.on_key_up(code);
            }
            InputEvent::MouseMove { dx, dy } => self.controls.apply_look(*dx, *dy),
            InputEvent::FocusLost => {
                debug!("focus lost, releasing held keys");
                self.input.clear_keys();
            }
            InputEvent::VisibilityChanged { visible } => {
                if !visible {
                    self.input.clear_keys();
                }
            }
            InputEvent::PointerLockChanged { locked } => {
                self.controls.set_locked(*locked);
                if !locked {
                    self.input.clear_keys();
                }
            }
        }
    }

    /// Advance one frame. `now` is in milliseconds.
    pub fn update(&mut self, now: f64) {
        if self.controls.is_locked() {
            let delta = frame_delta(self.prev_time, now, self.config.max_frame_delta);
            self.step(delta);
        }
        self.prev_time = now;
    }

    fn step(&mut self, delta: f32) {
        self.probes.update(self.controls.direction(), self.controls.position(), &self.collidables);

        let displacement = self.motion.integrate(&self.input, &self.probes, delta);
        self.controls.move_right(displacement.right);
        self.controls.move_forward(displacement.forward);

        let correction = self.vertical.correct(&self.controls, &self.collidables);
        if correction.clamped && !self.last_vertical.is_some_and(|c| c.clamped) {
            info!(position = ?self.controls.position(), "height clamped to floor");
        }
        self.last_vertical = Some(correction);
    }
}
