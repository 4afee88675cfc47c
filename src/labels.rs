//! Text labels that take the place of landmark objects after the scene loads.

use glam::{Quat, Vec3};
use tracing::{info, warn};

use crate::model::Scene;

/// Objects with this name (any case) are label placeholders
pub const LANDMARK_NAME: &str = "ring";

/// Labels sit this far in front of their landmark along Z
pub const LABEL_OFFSET: f32 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    pub position: Vec3,
    pub rotation: Vec3,
}

impl TextLabel {
    /// Direction the readable side of the text points to
    pub fn facing(&self) -> Vec3 {
        Quat::from_rotation_y(self.rotation.y) * Vec3::Z
    }

    /// How squarely the text faces `eye`: 1 head-on, 0 edge-on, negative from behind
    pub fn facing_factor(&self, eye: Vec3) -> f32 {
        (eye - self.position).normalize_or_zero().dot(self.facing())
    }
}

/// Replace landmarks with `texts`, pairing them in scene order.
/// Used landmarks are removed from the scene; surplus texts are dropped.
pub fn place_labels(scene: &mut Scene, texts: &[String]) -> Vec<TextLabel> {
    let landmarks: Vec<usize> = scene
        .objects
        .iter()
        .enumerate()
        .filter(|(_, o)| o.name.eq_ignore_ascii_case(LANDMARK_NAME))
        .map(|(i, _)| i)
        .collect();

    if texts.len() > landmarks.len() {
        warn!(
            "{} label texts but only {} landmarks, dropping the rest",
            texts.len(),
            landmarks.len()
        );
    }

    let labels: Vec<TextLabel> = texts
        .iter()
        .zip(&landmarks)
        .map(|(text, &index)| {
            let landmark = &scene.objects[index];
            let mut position = landmark.position;
            position.z -= if landmark.rotation.y < 0.0 { LABEL_OFFSET } else { -LABEL_OFFSET };
            TextLabel {
                text: text.clone(),
                position,
                rotation: landmark.rotation,
            }
        })
        .collect();

    // back to front so earlier indices stay valid
    for &index in landmarks[..labels.len()].iter().rev() {
        scene.remove(index);
    }

    info!("placed {} text labels", labels.len());
    labels
}
