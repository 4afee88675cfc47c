// MODEL: Scene data, camera and collision geometry
pub mod camera;
pub mod collidable;
pub mod scene;

pub use camera::Camera;
pub use collidable::{Aabb, Collidable, CollidableSet, Ray, RayHit};
pub use scene::{load_scene, GeometryKind, Scene, SceneObject};
