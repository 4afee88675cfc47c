use glam::{Quat, Vec3};

use crate::controller::ControllerConfig;
use crate::model::{CollidableSet, Ray};

/// Probe labels. They follow the observer's facing: North is always "ahead".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compass {
    North,
    East,
    South,
    West,
}

impl Compass {
    pub const ALL: [Compass; 4] = [Compass::North, Compass::East, Compass::South, Compass::West];

    /// Home direction of the probe with the observer facing -Z
    pub fn home_direction(self) -> Vec3 {
        match self {
            Compass::North => Vec3::NEG_Z,
            Compass::East => Vec3::X,
            Compass::South => Vec3::Z,
            Compass::West => Vec3::NEG_X,
        }
    }
}

/// Signed rotation about +Y taking `from` onto `to`, both horizontal
fn yaw_between(from: Vec3, to: Vec3) -> f32 {
    let cross_y = from.z * to.x - from.x * to.z;
    cross_y.atan2(from.dot(to))
}

/// A head-height ray plus an ankle-height twin tilted down
#[derive(Debug, Clone)]
pub struct DirectionalProbe {
    pub compass: Compass,
    pub original_direction: Vec3,
    pub ray: Ray,
    pub angled_ray: Ray,
    pub collision: bool,
    /// Rotation from North's home direction into this probe's
    yaw_offset: f32,
}

impl DirectionalProbe {
    pub fn new(compass: Compass, range: f32) -> Self {
        let original_direction = compass.home_direction();
        Self {
            compass,
            original_direction,
            ray: Ray::new(Vec3::ZERO, original_direction, 0.0, range),
            angled_ray: Ray::new(Vec3::ZERO, original_direction + Vec3::NEG_Y, 0.0, range),
            collision: false,
            yaw_offset: yaw_between(Compass::North.home_direction(), original_direction),
        }
    }

    /// Re-aim both rays from the observer's horizontal facing
    pub fn aim(&mut self, look: Vec3, position: Vec3, drop: f32) {
        let heading = Quat::from_rotation_y(self.yaw_offset) * look;

        self.ray.origin = position;
        self.ray.direction = heading;

        // Y keeps the downward tilt it was built with
        self.angled_ray.origin = position - Vec3::Y * drop;
        self.angled_ray.direction.x = heading.x;
        self.angled_ray.direction.z = heading.z;
    }

    pub fn cast(&mut self, collidables: &CollidableSet) -> bool {
        self.collision = collidables.hits(&self.ray) || collidables.hits(&self.angled_ray);
        self.collision
    }
}

/// The four wall probes, one per observer-relative direction
#[derive(Debug, Clone)]
pub struct ProbeSet {
    probes: [DirectionalProbe; 4],
    angled_drop: f32,
}

impl ProbeSet {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            probes: Compass::ALL.map(|c| DirectionalProbe::new(c, config.probe_range)),
            angled_drop: config.angled_probe_drop,
        }
    }

    /// Re-aim every probe from the view direction and test it
    pub fn update(&mut self, view_direction: Vec3, position: Vec3, collidables: &CollidableSet) {
        let look = Vec3::new(view_direction.x, 0.0, view_direction.z).normalize_or_zero();
        for probe in self.probes.iter_mut() {
            probe.aim(look, position, self.angled_drop);
            probe.cast(collidables);
        }
    }

    pub fn probe(&self, compass: Compass) -> &DirectionalProbe {
        // probes are stored in Compass::ALL order
        &self.probes[compass as usize]
    }

    pub fn collision(&self, compass: Compass) -> bool {
        self.probe(compass).collision
    }

    pub fn iter(&self) -> impl Iterator<Item = &DirectionalProbe> {
        self.probes.iter()
    }
}
