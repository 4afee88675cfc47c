/// Tuning constants for the walk controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerConfig {
    /// Velocity decay rate per second
    pub damping: f32,
    /// Acceleration per second while a movement key is held
    pub acceleration: f32,
    /// Reach of the four horizontal probes and their angled twins
    pub probe_range: f32,
    /// How far below the eye the angled probes start
    pub angled_probe_drop: f32,
    /// Reach of the short downward probe; also the eye height above ground
    pub elevation_range: f32,
    /// Hard floor for the eye height
    pub min_height: f32,
    pub spawn_height: f32,
    pub mouse_sensitivity: f32,
    /// Frame deltas are clamped to this many seconds
    pub max_frame_delta: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            damping: 10.0,
            acceleration: 200.0,
            probe_range: 1.0,
            angled_probe_drop: 1.0,
            elevation_range: 3.0,
            min_height: 3.0,
            spawn_height: 3.0,
            mouse_sensitivity: 0.002,
            max_frame_delta: 0.1,
        }
    }
}
