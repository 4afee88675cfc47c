// CONTROLLER: Input, walk physics, and update loop
pub mod config;
pub mod input;
pub mod pointer_lock;
pub mod probes;
pub mod vertical;
pub mod motion;
pub mod walk_controller;
pub mod frame_loop;

pub use config::ControllerConfig;
pub use input::{InputEvent, InputState, KeyBindings, MoveDirection};
pub use pointer_lock::{LockRequester, Overlay, PointerLockControls};
pub use probes::{Compass, DirectionalProbe, ProbeSet};
pub use vertical::{VerticalCorrection, VerticalOutcome, VerticalProbes};
pub use motion::{Displacement, MotionIntegrator};
pub use walk_controller::WalkController;
pub use frame_loop::{frame_delta, install_scene, LoadedScene};
#[cfg(target_arch = "wasm32")]
pub use frame_loop::FrameLoopContext;
