//! Mouse adapter: left button drives the pointer protocol.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::pointer::{PointerEvent, PointerInputSet, PointerSample, PointerSource};

/// Translates left-button presses, drags and releases into [`PointerEvent`]s.
pub struct MouseInputPlugin;

impl Plugin for MouseInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PointerEvent>()
            .add_systems(Update, mouse_pointer_system.in_set(PointerInputSet));
    }
}

/// Press begins, movement while pressed updates, release ends.
///
/// Mouse samples carry no depth.
pub fn mouse_pointer_system(
    mouse_button: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut last_cursor: Local<Option<Vec2>>,
    mut pointer_events: MessageWriter<PointerEvent>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let viewport = Vec2::new(window.width(), window.height());
    let cursor = window.cursor_position();

    if let Some(position) = cursor {
        let sample = PointerSample::from_screen(position, viewport, None);
        if mouse_button.just_pressed(MouseButton::Left) {
            pointer_events.write(PointerEvent::begin(PointerSource::Mouse, sample));
        } else if mouse_button.pressed(MouseButton::Left) && *last_cursor != cursor {
            pointer_events.write(PointerEvent::update(PointerSource::Mouse, sample));
        }
    }

    if mouse_button.just_released(MouseButton::Left) {
        pointer_events.write(PointerEvent::end(PointerSource::Mouse));
    }

    *last_cursor = cursor;
}
