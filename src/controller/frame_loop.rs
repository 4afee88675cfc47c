use tracing::{info, warn};

use crate::labels::{place_labels, TextLabel};
use crate::model::{CollidableSet, Scene};

/// A scene after its landmarks were swapped for labels
pub struct LoadedScene {
    pub scene: Scene,
    pub labels: Vec<TextLabel>,
}

/// Place labels, then hand the remaining geometry to the collision set
pub fn install_scene(mut scene: Scene, collidables: &CollidableSet) -> LoadedScene {
    let texts = std::mem::take(&mut scene.labels);
    let labels = place_labels(&mut scene, &texts);
    scene.labels = texts;

    if !scene.objects.iter().any(|o| o.is_ground_plane()) {
        warn!("scene has no ground-tagged object, every surface counts as a step");
    }

    let before = collidables.len();
    collidables.extend(scene.collidables());
    info!("{} collidables registered", collidables.len() - before);

    LoadedScene { scene, labels }
}

/// Seconds between two millisecond timestamps, clamped to `[0, max]`
pub fn frame_delta(prev_ms: f64, now_ms: f64, max: f32) -> f32 {
    (((now_ms - prev_ms) / 1000.0) as f32).clamp(0.0, max)
}

#[cfg(target_arch = "wasm32")]
pub use self::wasm::FrameLoopContext;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::cell::RefCell;
    use std::rc::Rc;

    use tracing::debug;
    use web_sys::Window;
    use wgpu::{Device, Queue, Surface};

    use super::{frame_delta, LoadedScene};
    use crate::controller::WalkController;
    use crate::labels::TextLabel;
    use crate::model::Camera;
    use crate::ui::{self, UiFrame};
    use crate::view::{EguiFrame, RenderState};

    /// Per-frame state of the web host
    pub struct FrameLoopContext {
        pub cam: Rc<RefCell<Camera>>,
        pub walker: Rc<RefCell<WalkController>>,
        /// Filled by the scene loader, drained by the next frame
        pub pending_scene: Rc<RefCell<Option<LoadedScene>>>,
        pub labels: Vec<TextLabel>,
        pub egui_ctx: egui::Context,
        pub egui_events: Rc<RefCell<Vec<egui::Event>>>,
        pub last_time: f64,
    }

    impl FrameLoopContext {
        /// Advance the controller and build this frame's overlay
        pub fn update(
            &mut self,
            device: &Device,
            queue: &Queue,
            window: &Window,
            surface: &Surface,
            render_state: &mut RenderState,
        ) -> EguiFrame {
            let now = window.performance().map(|p| p.now()).unwrap_or(0.0);
            let max_dt = self.walker.borrow().config().max_frame_delta;
            let dt = frame_delta(self.last_time, now, max_dt);
            self.last_time = now;

            if let Some(loaded) = self.pending_scene.borrow_mut().take() {
                render_state.upload_scene(device, &loaded.scene);
                self.labels = loaded.labels;
                debug!("scene installed into the frame loop");
            }

            self.walker.borrow_mut().update(now);

            self.handle_resize(window, device, surface, render_state);
            render_state.write_uniforms(queue, &self.cam.borrow());

            let dpr = window.device_pixel_ratio() as f32;
            let mut raw_input = egui::RawInput::default();
            raw_input.time = Some(now / 1000.0);
            raw_input.screen_rect = Some(egui::Rect::from_min_size(
                egui::Pos2::new(0.0, 0.0),
                egui::vec2(render_state.width as f32 / dpr, render_state.height as f32 / dpr),
            ));
            raw_input.events.extend(self.egui_events.borrow_mut().drain(..));
            self.egui_ctx.set_pixels_per_point(dpr);

            let walker = self.walker.borrow();
            let camera = self.cam.borrow();
            let full_output = ui::build_ui(
                &self.egui_ctx,
                raw_input,
                &UiFrame {
                    camera: &camera,
                    walker: &walker,
                    labels: &self.labels,
                    show_blocker: false,
                    dt,
                },
            );

            EguiFrame {
                primitives: self.egui_ctx.tessellate(full_output.shapes, dpr),
                textures_delta: full_output.textures_delta,
                pixels_per_point: dpr,
            }
        }

        fn handle_resize(&self, window: &Window, device: &Device, surface: &Surface, render_state: &mut RenderState) {
            if let (Ok(w), Ok(h)) = (window.inner_width(), window.inner_height()) {
                let dpr = window.device_pixel_ratio();
                let nw = (w.as_f64().unwrap_or(800.0) * dpr) as u32;
                let nh = (h.as_f64().unwrap_or(600.0) * dpr) as u32;
                if render_state.resize(device, surface, nw, nh) {
                    self.cam.borrow_mut().set_aspect(nw, nh);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeometryKind, SceneObject};
    use glam::Vec3;

    fn scene() -> Scene {
        let mut scene = Scene::default();
        let mut ground = SceneObject::new("Ground", GeometryKind::Plane { width: 50.0, depth: 50.0 }, Vec3::ZERO);
        ground.ground = Some(true);
        scene.push(ground);
        scene.push(SceneObject::new("ring", GeometryKind::Box { size: Vec3::ONE }, Vec3::new(0.0, 2.0, -10.0)));
        scene.push(SceneObject::new("pillar", GeometryKind::Box { size: Vec3::ONE }, Vec3::new(5.0, 1.0, 0.0)));
        scene.labels = vec!["Welcome".to_string()];
        scene
    }

    #[test]
    fn test_install_replaces_landmarks_before_collision() {
        let set = CollidableSet::new();
        let loaded = install_scene(scene(), &set);

        assert_eq!(loaded.labels.len(), 1);
        assert_eq!(loaded.labels[0].text, "Welcome");
        // the ring became a label, not an obstacle
        assert_eq!(set.len(), 2);
        assert!(set.objects().iter().all(|c| c.name != "ring"));
        assert!(set.objects().iter().any(|c| c.is_ground_plane));
        assert_eq!(loaded.scene.labels, vec!["Welcome".to_string()]);
    }

    #[test]
    fn test_frame_delta_clamps_to_config() {
        let max = crate::controller::ControllerConfig::default().max_frame_delta;
        assert!((frame_delta(1000.0, 1016.0, max) - 0.016).abs() < 1e-6);
        assert_eq!(frame_delta(0.0, 60_000.0, max), max);
        assert_eq!(frame_delta(500.0, 400.0, max), 0.0);
    }

    #[test]
    fn test_non_collidable_objects_are_skipped() {
        let mut scene = scene();
        scene.objects[2].collidable = false;
        let set = CollidableSet::new();
        install_scene(scene, &set);
        assert_eq!(set.len(), 1);
    }
}
