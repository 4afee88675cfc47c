use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SceneError;
use crate::model::Collidable;
use crate::utils::Mesh;

const DEFAULT_COLOR: [f32; 4] = [0.7, 0.7, 0.7, 1.0];

fn default_color() -> [f32; 4] { DEFAULT_COLOR }
fn default_true() -> bool { true }

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometryKind {
    Box { size: Vec3 },
    /// Horizontal plane in local XZ, facing +Y
    Plane { width: f32, depth: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    pub kind: GeometryKind,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in radians, applied X then Y then Z
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_color")]
    pub color: [f32; 4],
    /// Ground tag; resolved once when the scene is parsed
    #[serde(default)]
    pub ground: Option<bool>,
    #[serde(default = "default_true")]
    pub collidable: bool,
}

impl SceneObject {
    pub fn new(name: impl Into<String>, kind: GeometryKind, position: Vec3) -> Self {
        Self {
            name: name.into(),
            kind,
            position,
            rotation: Vec3::ZERO,
            color: DEFAULT_COLOR,
            ground: None,
            collidable: true,
        }
    }

    pub fn is_ground_plane(&self) -> bool {
        self.ground.unwrap_or(false)
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Local geometry with the object's transform baked in
    pub fn world_mesh(&self) -> Mesh {
        let mut mesh = match self.kind {
            GeometryKind::Box { size } => Mesh::cuboid(size, self.color),
            GeometryKind::Plane { width, depth } => Mesh::plane(width, depth, self.color),
        };
        mesh.transform(self.orientation(), self.position);
        mesh
    }

    pub fn to_collidable(&self) -> Collidable {
        let double_sided = matches!(self.kind, GeometryKind::Plane { .. });
        Collidable::new(
            self.name.clone(),
            self.is_ground_plane(),
            double_sided,
            self.world_mesh().triangles(),
        )
    }
}

/// Scene graph: an ordered, flat list of objects plus label texts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let mut scene: Scene = serde_json::from_str(json)?;
        scene.tag_ground_planes();
        Ok(scene)
    }

    /// Objects without an explicit ground tag inherit one from their name
    fn tag_ground_planes(&mut self) {
        for object in self.objects.iter_mut().filter(|o| o.ground.is_none()) {
            let by_name = object.name.to_lowercase().contains("ground");
            if by_name {
                debug!("tagging '{}' as ground by name", object.name);
            }
            object.ground = Some(by_name);
        }
    }

    pub fn push(&mut self, object: SceneObject) {
        self.objects.push(object);
    }

    /// Remove and drop an object; its GPU and collision data are rebuilt from the list
    pub fn remove(&mut self, index: usize) -> Option<SceneObject> {
        (index < self.objects.len()).then(|| self.objects.remove(index))
    }

    pub fn find(&self, name: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn collidables(&self) -> Vec<Collidable> {
        self.objects
            .iter()
            .filter(|o| o.collidable)
            .map(SceneObject::to_collidable)
            .collect()
    }

    pub fn meshes(&self) -> Vec<Mesh> {
        self.objects.iter().map(SceneObject::world_mesh).collect()
    }
}

/// Resolve a scene identifier to a location: bare names map to `<name>.json`
fn scene_location(identifier: &str) -> String {
    if identifier.ends_with(".json") {
        return identifier.to_string();
    }

    #[cfg(target_arch = "wasm32")]
    let location = format!("./{identifier}.json");
    #[cfg(not(target_arch = "wasm32"))]
    let location = format!("assets/{identifier}.json");

    location
}

#[cfg(target_arch = "wasm32")]
pub async fn load_scene(identifier: &str) -> Result<Scene, SceneError> {
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;

    fn fetch_error(e: wasm_bindgen::JsValue) -> SceneError {
        SceneError::Fetch(format!("{e:?}"))
    }

    let url = scene_location(identifier);
    info!("fetching scene from {url}");

    let window = web_sys::window().ok_or_else(|| SceneError::Fetch("no global `window`".into()))?;
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(fetch_error)?
        .dyn_into()
        .map_err(fetch_error)?;

    if !response.ok() {
        return Err(SceneError::Fetch(format!("{url}: HTTP {}", response.status())));
    }

    let text = JsFuture::from(response.text().map_err(fetch_error)?)
        .await
        .map_err(fetch_error)?
        .as_string()
        .ok_or_else(|| SceneError::Fetch(format!("{url}: body is not text")))?;

    let scene = Scene::from_json(&text)?;
    info!("loaded scene '{identifier}' with {} objects", scene.objects.len());
    Ok(scene)
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn load_scene(identifier: &str) -> Result<Scene, SceneError> {
    let path = scene_location(identifier);
    info!("reading scene from {path}");

    let text = std::fs::read_to_string(&path)?;
    let scene = Scene::from_json(&text)?;
    info!("loaded scene '{identifier}' with {} objects", scene.objects.len());
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"{
        "objects": [
            { "name": "Ground", "kind": { "plane": { "width": 100.0, "depth": 100.0 } } },
            { "name": "crate", "kind": { "box": { "size": [1.0, 2.0, 1.0] } }, "position": [4.0, 1.0, 0.0] },
            { "name": "ring", "kind": { "box": { "size": [1.0, 1.0, 0.2] } }, "rotation": [0.0, -0.5, 0.0], "collidable": false },
            { "name": "sandbox", "kind": { "box": { "size": [1.0, 1.0, 1.0] } }, "ground": false }
        ],
        "labels": ["hello"]
    }"#;

    #[test]
    fn test_parse_scene() {
        let scene = Scene::from_json(SCENE).unwrap();
        assert_eq!(scene.objects.len(), 4);
        assert_eq!(scene.labels, vec!["hello".to_string()]);

        let crate_obj = scene.find("crate").unwrap();
        assert_eq!(crate_obj.kind, GeometryKind::Box { size: Vec3::new(1.0, 2.0, 1.0) });
        assert_eq!(crate_obj.position, Vec3::new(4.0, 1.0, 0.0));
        assert_eq!(crate_obj.color, DEFAULT_COLOR);
        assert!(crate_obj.collidable);
    }

    #[test]
    fn test_ground_tag_resolved_at_load() {
        let scene = Scene::from_json(SCENE).unwrap();
        assert_eq!(scene.find("Ground").unwrap().ground, Some(true));
        assert_eq!(scene.find("crate").unwrap().ground, Some(false));
        // explicit tag wins over the name
        assert_eq!(scene.find("sandbox").unwrap().ground, Some(false));
    }

    #[test]
    fn test_collidables_skip_flagged_objects() {
        let scene = Scene::from_json(SCENE).unwrap();
        let collidables = scene.collidables();
        assert_eq!(collidables.len(), 3);
        assert!(collidables.iter().all(|c| c.name != "ring"));

        let ground = collidables.iter().find(|c| c.name == "Ground").unwrap();
        assert!(ground.is_ground_plane);
        assert!(ground.double_sided);
        assert_eq!(ground.triangle_count(), 2);
    }

    #[test]
    fn test_world_mesh_is_positioned() {
        let scene = Scene::from_json(SCENE).unwrap();
        let bounds = scene.find("crate").unwrap().to_collidable().bounds();
        assert!((bounds.min - Vec3::new(3.5, 0.0, -0.5)).length() < 1e-5);
        assert!((bounds.max - Vec3::new(4.5, 2.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut scene = Scene::from_json(SCENE).unwrap();
        assert!(scene.remove(10).is_none());
        assert_eq!(scene.remove(0).unwrap().name, "Ground");
        assert_eq!(scene.objects.len(), 3);
    }

    #[test]
    fn test_malformed_scene_is_parse_error() {
        let err = Scene::from_json("{ \"objects\": 3 }").unwrap_err();
        assert!(matches!(err, SceneError::Parse(_)));
    }

    #[test]
    fn test_scene_location() {
        assert!(scene_location("level.json").ends_with("level.json"));
        assert!(scene_location("scene").ends_with("scene.json"));
    }

    #[test]
    fn test_missing_scene_file_is_io_error() {
        let err = pollster::block_on(load_scene("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }
}
