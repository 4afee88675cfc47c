use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;
use tracing::info;

use crate::model::Camera;

/// Host side of pointer capture. Requests are asynchronous: the host reports the
/// outcome back through `PointerLockControls::set_locked`.
pub trait LockRequester {
    fn request_lock(&self);
    fn release_lock(&self);
}

/// Blocking overlay shown while the pointer is free
pub trait Overlay {
    fn set_visible(&self, visible: bool);
}

impl<F: Fn(bool)> Overlay for F {
    fn set_visible(&self, visible: bool) {
        self(visible)
    }
}

/// Pointer-lock camera binding: lock state, mouse look and the relative movement
/// primitives the walk controller drives the camera through.
pub struct PointerLockControls {
    camera: Rc<RefCell<Camera>>,
    requester: Box<dyn LockRequester>,
    overlay: Box<dyn Overlay>,
    locked: bool,
    mouse_sensitivity: f32,
}

impl PointerLockControls {
    pub fn new(
        camera: Rc<RefCell<Camera>>,
        requester: Box<dyn LockRequester>,
        overlay: Box<dyn Overlay>,
        mouse_sensitivity: f32,
    ) -> Self {
        overlay.set_visible(true);
        Self {
            camera,
            requester,
            overlay,
            locked: false,
            mouse_sensitivity,
        }
    }

    pub fn camera(&self) -> &Rc<RefCell<Camera>> {
        &self.camera
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock(&self) {
        self.requester.request_lock();
    }

    pub fn unlock(&self) {
        self.requester.release_lock();
    }

    /// Lock-changed event from the host
    pub fn set_locked(&mut self, locked: bool) {
        if self.locked == locked {
            return;
        }
        self.locked = locked;
        self.overlay.set_visible(!locked);
        info!("pointer {}", if locked { "locked" } else { "released" });
    }

    /// Mouse look, ignored while the pointer is free
    pub fn apply_look(&self, dx: f32, dy: f32) {
        if !self.locked {
            return;
        }
        let mut camera = self.camera.borrow_mut();
        camera.yaw += dx * self.mouse_sensitivity;
        let pi_half = std::f32::consts::FRAC_PI_2;
        camera.pitch = (camera.pitch - dy * self.mouse_sensitivity).clamp(-pi_half, pi_half);
    }

    /// World-space view direction
    pub fn direction(&self) -> Vec3 {
        self.camera.borrow().forward()
    }

    pub fn position(&self) -> Vec3 {
        self.camera.borrow().eye
    }

    pub fn set_height(&self, y: f32) {
        self.camera.borrow_mut().eye.y = y;
    }

    /// Move parallel to the ground along the view direction
    pub fn move_forward(&self, distance: f32) {
        let mut camera = self.camera.borrow_mut();
        let step = camera.flat_forward() * distance;
        camera.eye += step;
    }

    /// Move sideways; positive is to the observer's right
    pub fn move_right(&self, distance: f32) {
        let mut camera = self.camera.borrow_mut();
        let step = camera.right() * distance;
        camera.eye += step;
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{Document, HtmlElement};

    /// Captures the pointer on a page element
    pub struct ElementLock {
        pub element: HtmlElement,
        pub document: Document,
    }

    impl LockRequester for ElementLock {
        fn request_lock(&self) {
            self.element.request_pointer_lock();
        }

        fn release_lock(&self) {
            self.document.exit_pointer_lock();
        }
    }

    /// Toggles a DOM element between `display: flex` and `display: none`
    pub struct ElementOverlay(pub HtmlElement);

    impl Overlay for ElementOverlay {
        fn set_visible(&self, visible: bool) {
            let display = if visible { "flex" } else { "none" };
            if let Err(e) = self.0.style().set_property("display", display) {
                tracing::warn!("failed to toggle overlay: {e:?}");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    pub struct RecordingRequester {
        pub requests: Rc<Cell<u32>>,
        pub releases: Rc<Cell<u32>>,
    }

    impl LockRequester for RecordingRequester {
        fn request_lock(&self) {
            self.requests.set(self.requests.get() + 1);
        }

        fn release_lock(&self) {
            self.releases.set(self.releases.get() + 1);
        }
    }

    fn controls() -> (PointerLockControls, Rc<Cell<Option<bool>>>) {
        let overlay_state = Rc::new(Cell::new(None));
        let seen = Rc::clone(&overlay_state);
        let camera = Rc::new(RefCell::new(Camera::new(800, 600)));
        let controls = PointerLockControls::new(
            camera,
            Box::new(RecordingRequester::default()),
            Box::new(move |visible: bool| seen.set(Some(visible))),
            0.002,
        );
        (controls, overlay_state)
    }

    #[test]
    fn test_overlay_follows_lock_state() {
        let (mut controls, overlay) = controls();
        assert_eq!(overlay.get(), Some(true));

        controls.set_locked(true);
        assert!(controls.is_locked());
        assert_eq!(overlay.get(), Some(false));

        controls.set_locked(false);
        assert_eq!(overlay.get(), Some(true));
    }

    #[test]
    fn test_lock_delegates_to_host() {
        let requester = RecordingRequester::default();
        let (requests, releases) = (Rc::clone(&requester.requests), Rc::clone(&requester.releases));
        let controls = PointerLockControls::new(
            Rc::new(RefCell::new(Camera::new(800, 600))),
            Box::new(requester),
            Box::new(|_: bool| {}),
            0.002,
        );

        controls.lock();
        controls.unlock();
        assert_eq!((requests.get(), releases.get()), (1, 1));
        // the host has not confirmed yet
        assert!(!controls.is_locked());
    }

    #[test]
    fn test_look_only_while_locked() {
        let (mut controls, _) = controls();
        controls.apply_look(100.0, 0.0);
        assert_eq!(controls.camera().borrow().yaw, 0.0);

        controls.set_locked(true);
        controls.apply_look(100.0, -5000.0);
        let camera = controls.camera().borrow();
        assert!((camera.yaw - 0.2).abs() < 1e-6);
        assert!((camera.pitch - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_move_primitives_stay_horizontal() {
        let (controls, _) = controls();
        {
            let mut camera = controls.camera().borrow_mut();
            camera.eye = Vec3::new(0.0, 3.0, 0.0);
            camera.pitch = 0.8;
        }

        controls.move_forward(2.0);
        assert!((controls.position() - Vec3::new(2.0, 3.0, 0.0)).length() < 1e-5);

        controls.move_right(-1.0);
        assert!((controls.position() - Vec3::new(2.0, 3.0, -1.0)).length() < 1e-5);
    }
}
