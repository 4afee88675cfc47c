use egui::{Align2, Color32, Context, FontId, Pos2, Stroke};

use crate::controller::probes::Compass;
use crate::controller::vertical::VerticalOutcome;
use crate::controller::WalkController;
use crate::labels::TextLabel;
use crate::model::{Camera, CollidableSet, Ray};

/// Labels closer than this to a surface are not hidden by it
const LABEL_CLEARANCE: f32 = 0.05;

/// Everything the overlay reads for one frame
pub struct UiFrame<'a> {
    pub camera: &'a Camera,
    pub walker: &'a WalkController,
    pub labels: &'a [TextLabel],
    /// Draw the in-canvas blocker; the web host uses a DOM element instead
    pub show_blocker: bool,
    pub dt: f32,
}

/// Build the complete UI and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, frame: &UiFrame) -> egui::FullOutput {
    egui_ctx.run(raw_input, |ctx| {
        draw_labels(ctx, frame.camera, frame.labels, frame.walker.collidables());
        if frame.walker.is_locked() {
            draw_crosshair(ctx);
        } else if frame.show_blocker {
            draw_blocker(ctx);
        }
        draw_debug_window(ctx, frame);
    })
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::TOP, egui::Id::new("crosshair")));
    let center = ctx.available_rect().center();
    let size = 10.0;
    let stroke = Stroke::new(1.0, Color32::WHITE);
    painter.line_segment([Pos2::new(center.x - size, center.y), Pos2::new(center.x + size, center.y)], stroke);
    painter.line_segment([Pos2::new(center.x, center.y - size), Pos2::new(center.x, center.y + size)], stroke);
}

fn draw_blocker(ctx: &Context) {
    let screen = ctx.available_rect();
    ctx.layer_painter(egui::LayerId::new(egui::Order::Background, egui::Id::new("blocker")))
        .rect_filled(screen, 0.0, Color32::from_black_alpha(128));

    egui::Area::new(egui::Id::new("instructions"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("Click to walk").size(32.0).color(Color32::WHITE));
                ui.label(egui::RichText::new("Move: WASD / arrow keys").color(Color32::WHITE));
                ui.label(egui::RichText::new("Look: mouse").color(Color32::WHITE));
                ui.label(egui::RichText::new("Release: Escape").color(Color32::WHITE));
            });
        });
}

/// Screen position of a world point, in points
fn to_screen(camera: &Camera, screen: egui::Rect, world: glam::Vec3) -> Option<Pos2> {
    let ndc = camera.project(world)?;
    Some(Pos2::new(
        screen.min.x + (ndc.x + 1.0) * 0.5 * screen.width(),
        screen.min.y + (1.0 - ndc.y) * 0.5 * screen.height(),
    ))
}

/// Whether scene geometry sits between the eye and `target`
fn is_occluded(collidables: &CollidableSet, eye: glam::Vec3, target: glam::Vec3) -> bool {
    let to_target = target - eye;
    let distance = to_target.length();
    if distance <= LABEL_CLEARANCE {
        return false;
    }
    collidables.hits(&Ray::new(eye, to_target, 0.0, distance - LABEL_CLEARANCE))
}

fn draw_labels(ctx: &Context, camera: &Camera, labels: &[TextLabel], collidables: &CollidableSet) {
    let screen = ctx.available_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::Background, egui::Id::new("labels")));

    for label in labels {
        if is_occluded(collidables, camera.eye, label.position) {
            continue;
        }
        let Some(pos) = to_screen(camera, screen, label.position) else {
            continue;
        };

        // foreshortened when seen at an angle, dimmed from behind
        let facing = label.facing_factor(camera.eye);
        let distance = camera.eye.distance(label.position).max(1.0);
        let size = (240.0 / distance * facing.abs().max(0.3)).clamp(10.0, 48.0);
        let color = if facing >= 0.0 { Color32::WHITE } else { Color32::from_white_alpha(90) };
        painter.text(pos, Align2::CENTER_CENTER, &label.text, FontId::proportional(size), color);
    }
}

fn draw_debug_window(ctx: &Context, frame: &UiFrame) {
    let camera = frame.camera;
    let walker = frame.walker;
    let pos = camera.eye;
    let vel = walker.velocity();

    let probes = Compass::ALL
        .iter()
        .map(|c| {
            let flag = if walker.probes().collision(*c) { "X" } else { "-" };
            format!("{c:?}: {flag}")
        })
        .collect::<Vec<_>>()
        .join("  ");

    let vertical = match walker.last_vertical() {
        Some(c) => {
            let outcome = match c.outcome {
                VerticalOutcome::StepUp { rise } => format!("step up {rise:.2}"),
                VerticalOutcome::Fall { drop } => format!("fall {drop:.2}"),
                VerticalOutcome::NoSurface => "no surface".to_string(),
            };
            if c.clamped { format!("{outcome} (clamped)") } else { outcome }
        }
        None => "-".to_string(),
    };

    egui::Window::new("Debug")
        .default_pos([8.0, 8.0])
        .show(ctx, |ui| {
            let small = |ui: &mut egui::Ui, text: String| {
                ui.label(egui::RichText::new(text).small());
            };
            small(ui, format!("FPS: {:.0}", if frame.dt > 0.0 { 1.0 / frame.dt } else { 0.0 }));
            small(ui, format!("Pos: x: {:.1} y: {:.1} z: {:.1}", pos.x, pos.y, pos.z));
            small(ui, format!("Vel: x: {:.2} z: {:.2}", vel.x, vel.z));
            small(ui, format!("Yaw: {:.1} Pitch: {:.1}", camera.yaw.to_degrees(), camera.pitch.to_degrees()));
            small(ui, format!("Probes: {probes}"));
            small(ui, format!("Vertical: {vertical}"));
            small(ui, format!("Collidables: {}", walker.collidables().len()));
            small(ui, format!("Pointer: {}", if walker.is_locked() { "locked" } else { "free" }));
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_to_screen_center() {
        let mut camera = Camera::new(800, 600);
        camera.eye = Vec3::new(0.0, 3.0, 0.0);
        let screen = egui::Rect::from_min_size(Pos2::ZERO, egui::vec2(800.0, 600.0));

        let pos = to_screen(&camera, screen, Vec3::new(10.0, 3.0, 0.0)).unwrap();
        assert!((pos.x - 400.0).abs() < 1e-2);
        assert!((pos.y - 300.0).abs() < 1e-2);

        // behind the observer
        assert!(to_screen(&camera, screen, Vec3::new(-10.0, 3.0, 0.0)).is_none());
    }

    #[test]
    fn test_wall_hides_label() {
        use crate::model::Collidable;
        use crate::utils::Mesh;

        let eye = Vec3::new(0.0, 3.0, 0.0);
        let label = Vec3::new(10.0, 3.0, 0.1);
        let set = CollidableSet::new();
        assert!(!is_occluded(&set, eye, label));

        let mut wall = Mesh::cuboid(Vec3::new(1.0, 4.0, 4.0), [1.0; 4]);
        wall.transform(glam::Quat::IDENTITY, Vec3::new(5.0, 3.0, 0.3));
        set.push(Collidable::new("wall", false, false, wall.triangles()));
        assert!(is_occluded(&set, eye, label));

        // a wall behind the label does not hide it
        assert!(!is_occluded(&set, eye, Vec3::new(3.0, 3.0, 0.1)));
    }

    #[test]
    fn test_to_screen_right_is_right() {
        let camera = Camera::new(800, 600);
        let screen = egui::Rect::from_min_size(Pos2::ZERO, egui::vec2(800.0, 600.0));
        // +Z is the observer's right at yaw 0
        let pos = to_screen(&camera, screen, Vec3::new(10.0, 0.0, 2.0)).unwrap();
        assert!(pos.x > 400.0);
    }
}
