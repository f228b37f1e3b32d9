//! Virtual hand for running without a tracker.
//!
//! The mouse cursor stands in for the palm and Space for the pinch. Frames go
//! through the regular [`HandTrackingChannel`], so everything downstream is
//! exercised exactly as with real hardware.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::source::{HandFrame, HandTrackingChannel, InteractionBox};

#[derive(Resource, Debug, Clone)]
pub struct HandEmulation {
    pub enabled: bool,
    /// Normalized depth reported for the palm
    pub depth: f32,
    pub pinch_key: KeyCode,
    pub interaction_box: InteractionBox,
}

impl Default for HandEmulation {
    fn default() -> Self {
        Self {
            enabled: false,
            depth: 0.5,
            pinch_key: KeyCode::Space,
            interaction_box: InteractionBox::default(),
        }
    }
}

impl HandEmulation {
    /// Frame for a cursor position (window pixels) and pinch key state.
    pub fn frame(&self, cursor: Vec2, viewport: Vec2, pinching: bool) -> HandFrame {
        let normalized = Vec3::new(cursor.x / viewport.x, 1.0 - cursor.y / viewport.y, self.depth);
        HandFrame {
            palm_position: self.interaction_box.denormalize_point(normalized),
            pinch_strength: if pinching { 1.0 } else { 0.0 },
            interaction_box: self.interaction_box,
        }
    }
}

pub fn emulate_hand_system(
    emulation: Res<HandEmulation>,
    keyboard: Res<ButtonInput<KeyCode>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    channel: Res<HandTrackingChannel>,
) {
    if !emulation.enabled {
        return;
    }
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    let viewport = Vec2::new(window.width(), window.height());
    let pinching = keyboard.pressed(emulation.pinch_key);
    channel.sender().send(emulation.frame(cursor, viewport, pinching));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emulated_frame_maps_back_to_cursor() {
        let emulation = HandEmulation::default();
        let viewport = Vec2::new(1280.0, 720.0);
        let cursor = Vec2::new(320.0, 540.0);

        let frame = emulation.frame(cursor, viewport, true);
        let screen = frame.screen_position(viewport);

        assert!((screen.truncate() - cursor).length() < 1e-2);
        assert!((screen.z - 0.5).abs() < 1e-4);
        assert_eq!(frame.pinch_strength, 1.0);
        assert_eq!(emulation.frame(cursor, viewport, false).pinch_strength, 0.0);
    }
}
