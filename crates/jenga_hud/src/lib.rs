use bevy::prelude::*;
use bevy_mod_imgui::prelude::*;
use jenga_core::{BodyControl, HandEmulation, HandTrackingState};
use jenga_physics::{DragController, PhysicsState};

/// Inspector window: tower state, current drag and hand tracking.
pub struct HudPlugin;

impl Plugin for HudPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(bevy_mod_imgui::ImguiPlugin::default())
            .add_systems(Update, imgui_ui);
    }
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

fn imgui_ui(
    mut context: NonSendMut<ImguiContext>,
    physics: Res<PhysicsState>,
    controller: Res<DragController>,
    hand: Res<HandTrackingState>,
    mut emulation: ResMut<HandEmulation>,
) {
    let ui = context.ui();

    ui.window("Tower")
        .size([320.0, 260.0], Condition::FirstUseEver)
        .build(|| {
            ui.text(format!("Dynamic bodies: {}", physics.dynamic_body_count()));
            ui.text(format!("Sleeping: {}", physics.sleeping_body_count()));
            ui.separator();

            match controller.0.selection() {
                Some(selection) => {
                    ui.text(format!("Holding: {:?}", selection.body));
                    ui.text(format!("Cursor: {}", fmt_vec3(selection.cursor)));
                    if let Some(position) = physics.position(selection.body) {
                        ui.text(format!("Block: {}", fmt_vec3(position)));
                    }
                    if let Some(command) = controller.0.last_command() {
                        ui.text(format!("Command: {}", fmt_vec3(command)));
                    }
                }
                None => ui.text("Holding: nothing"),
            }
            ui.separator();

            match hand.last_frame {
                Some(frame) => {
                    ui.text(format!(
                        "Pinch strength: {:.2} ({})",
                        frame.pinch_strength,
                        if hand.pinched { "pinched" } else { "open" }
                    ));
                    if let Some(gesture) = hand.last_gesture {
                        ui.text(format!("Last gesture: {:?}", gesture));
                    }
                    ui.text(format!("Frames: {}", hand.frames_received));
                }
                None => ui.text("No hand frames yet"),
            }

            let mut enabled = emulation.enabled;
            if ui.checkbox("Emulate hand (mouse + Space)", &mut enabled) {
                emulation.enabled = enabled;
            }
        });
}
