use glam::Vec3;

use crate::controller::probes::{Compass, ProbeSet};
use crate::controller::{ControllerConfig, InputState};

/// Damped horizontal velocity.
///
/// Axes are observer-relative: `z` is forward/backward, `x` is right/left.
/// Accelerating "forward" drives `velocity.z` negative; the displacement
/// returned from [`MotionIntegrator::integrate`] flips the sign back.
#[derive(Debug, Clone)]
pub struct MotionIntegrator {
    pub velocity: Vec3,
    pub direction: Vec3,
    damping: f32,
    acceleration: f32,
}

/// Distances to feed the pointer-lock movement primitives
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub right: f32,
    pub forward: f32,
}

impl MotionIntegrator {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            velocity: Vec3::ZERO,
            direction: Vec3::ZERO,
            damping: config.damping,
            acceleration: config.acceleration,
        }
    }

    pub fn integrate(&mut self, input: &InputState, probes: &ProbeSet, delta: f32) -> Displacement {
        self.velocity.x -= self.velocity.x * self.damping * delta;
        self.velocity.z -= self.velocity.z * self.damping * delta;

        self.direction = Vec3::new(
            input.right as i32 as f32 - input.left as i32 as f32,
            0.0,
            input.forward as i32 as f32 - input.backward as i32 as f32,
        )
        .normalize_or_zero();

        if input.any_longitudinal() {
            self.velocity.z -= self.direction.z * self.acceleration * delta;
        }
        if input.any_lateral() {
            self.velocity.x -= self.direction.x * self.acceleration * delta;
        }

        self.veto(input, probes);

        Displacement {
            right: -self.velocity.x * delta,
            forward: -self.velocity.z * delta,
        }
    }

    /// Cancel motion along an axis when a held key pushes into a blocked probe.
    /// Opposite keys held together still cancel: the axis may carry momentum.
    fn veto(&mut self, input: &InputState, probes: &ProbeSet) {
        let blocked_z = (input.forward && probes.collision(Compass::North))
            || (input.backward && probes.collision(Compass::South));
        if blocked_z {
            self.direction.z = 0.0;
            self.velocity.z = 0.0;
        }

        let blocked_x = (input.left && probes.collision(Compass::West))
            || (input.right && probes.collision(Compass::East));
        if blocked_x {
            self.direction.x = 0.0;
            self.velocity.x = 0.0;
        }
    }
}
