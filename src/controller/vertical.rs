use glam::Vec3;
use tracing::trace;

use crate::controller::{ControllerConfig, PointerLockControls};
use crate::model::{CollidableSet, Ray};

/// What the downward probes found under the observer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerticalOutcome {
    /// Snapped up onto an obstruction by `rise`
    StepUp { rise: f32 },
    /// Moved down by `drop` (negative when the floor is closer than eye height)
    Fall { drop: f32 },
    /// Nothing below at all; altitude held
    NoSurface,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalCorrection {
    pub outcome: VerticalOutcome,
    /// The floor clamp overrode the outcome
    pub clamped: bool,
}

/// Short elevation ray and unbounded gravity ray, both straight down
#[derive(Debug, Clone)]
pub struct VerticalProbes {
    pub elevation: Ray,
    pub gravity: Ray,
    min_height: f32,
}

impl VerticalProbes {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            elevation: Ray::new(Vec3::ZERO, Vec3::NEG_Y, 0.0, config.elevation_range),
            gravity: Ray::unbounded(Vec3::ZERO, Vec3::NEG_Y),
            min_height: config.min_height,
        }
    }

    pub fn elevation_range(&self) -> f32 {
        self.elevation.far
    }

    /// Step up, fall or hold, then clamp to the minimum height
    pub fn correct(&mut self, controls: &PointerLockControls, collidables: &CollidableSet) -> VerticalCorrection {
        let position = controls.position();
        self.elevation.origin = position;
        self.gravity.origin = position;

        let range = self.elevation_range();
        let step = collidables
            .cast(&self.elevation)
            .filter(|hit| !hit.object.is_ground_plane);

        let outcome = if let Some(hit) = step {
            let rise = range - hit.distance;
            controls.set_height(position.y + rise);
            VerticalOutcome::StepUp { rise }
        } else if let Some(hit) = collidables.cast(&self.gravity) {
            let drop = hit.distance - range;
            controls.set_height(position.y - drop);
            VerticalOutcome::Fall { drop }
        } else {
            VerticalOutcome::NoSurface
        };

        let clamped = controls.position().y < self.min_height;
        if clamped {
            controls.set_height(self.min_height);
        }

        trace!(?outcome, clamped, "vertical correction");
        VerticalCorrection { outcome, clamped }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::pointer_lock::tests::RecordingRequester;
    use crate::model::{Camera, Collidable};
    use crate::utils::Mesh;
    use glam::Quat;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn controls_at(eye: Vec3) -> PointerLockControls {
        let mut camera = Camera::new(800, 600);
        camera.eye = eye;
        PointerLockControls::new(
            Rc::new(RefCell::new(camera)),
            Box::new(RecordingRequester::default()),
            Box::new(|_: bool| {}),
            0.002,
        )
    }

    fn ground_at(y: f32) -> Collidable {
        let mut mesh = Mesh::plane(100.0, 100.0, [1.0; 4]);
        mesh.transform(Quat::IDENTITY, Vec3::new(0.0, y, 0.0));
        Collidable::new("Ground", true, true, mesh.triangles())
    }

    fn block(center: Vec3, size: Vec3) -> Collidable {
        let mut mesh = Mesh::cuboid(size, [1.0; 4]);
        mesh.transform(Quat::IDENTITY, center);
        Collidable::new("step", false, false, mesh.triangles())
    }

    #[test]
    fn test_step_up_rises_exactly() {
        // top face at y = 1.5, eye at 4: hit distance 2.5
        let set = CollidableSet::new();
        set.push(ground_at(0.0));
        set.push(block(Vec3::new(0.2, 1.0, 0.1), Vec3::new(2.0, 1.0, 2.0)));

        let controls = controls_at(Vec3::new(0.0, 4.0, 0.0));
        let mut probes = VerticalProbes::new(&ControllerConfig::default());
        let result = probes.correct(&controls, &set);

        match result.outcome {
            VerticalOutcome::StepUp { rise } => assert!((rise - 0.5).abs() < 1e-5),
            other => panic!("expected a step up, got {other:?}"),
        }
        assert!((controls.position().y - 4.5).abs() < 1e-5);
        assert!(!result.clamped);
    }

    #[test]
    fn test_ground_within_range_is_not_a_step() {
        let set = CollidableSet::new();
        set.push(ground_at(0.0));

        let controls = controls_at(Vec3::new(0.3, 2.5, 0.1));
        let mut probes = VerticalProbes::new(&ControllerConfig::default());
        let result = probes.correct(&controls, &set);

        // gravity path: -(2.5 - 3) lifts back to eye height
        assert!(matches!(result.outcome, VerticalOutcome::Fall { drop } if (drop + 0.5).abs() < 1e-5));
        assert!((controls.position().y - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_falls_to_eye_height_above_raised_ground() {
        let set = CollidableSet::new();
        set.push(ground_at(2.0));

        let controls = controls_at(Vec3::new(1.0, 9.0, -0.4));
        let mut probes = VerticalProbes::new(&ControllerConfig::default());
        let result = probes.correct(&controls, &set);

        assert!(matches!(result.outcome, VerticalOutcome::Fall { .. }));
        assert!((controls.position().y - 5.0).abs() < 1e-5);
        assert!(!result.clamped);
    }

    #[test]
    fn test_floor_clamp() {
        let set = CollidableSet::new();
        set.push(ground_at(-2.0));

        let controls = controls_at(Vec3::new(0.3, 3.0, 0.1));
        let mut probes = VerticalProbes::new(&ControllerConfig::default());
        let result = probes.correct(&controls, &set);

        assert!(result.clamped);
        assert_eq!(controls.position().y, 3.0);
    }

    #[test]
    fn test_no_surface_holds_altitude() {
        let controls = controls_at(Vec3::new(0.0, 7.0, 0.0));
        let mut probes = VerticalProbes::new(&ControllerConfig::default());
        let result = probes.correct(&controls, &CollidableSet::new());

        assert_eq!(result.outcome, VerticalOutcome::NoSurface);
        assert_eq!(controls.position().y, 7.0);
        assert!(controls.position().y.is_finite());
    }

    #[test]
    fn test_no_surface_still_clamped() {
        let controls = controls_at(Vec3::new(0.0, 1.0, 0.0));
        let mut probes = VerticalProbes::new(&ControllerConfig::default());
        let result = probes.correct(&controls, &CollidableSet::new());

        assert_eq!(result.outcome, VerticalOutcome::NoSurface);
        assert!(result.clamped);
        assert_eq!(controls.position().y, 3.0);
    }
}
