//! On-screen marker for the tracked palm.

use bevy::prelude::*;

use super::HandTrackingState;

/// Side length of the cursor square in pixels.
pub const HAND_CURSOR_SIZE: f32 = 18.0;

/// Cursor colour while the hand is pinched.
pub const PINCHED_CURSOR_COLOR: Color = Color::srgb(0.9, 0.1, 0.1);
/// Cursor colour while the hand is open.
pub const OPEN_CURSOR_COLOR: Color = Color::srgb(0.1, 0.3, 0.9);

#[derive(Component)]
pub struct HandCursor;

pub(super) fn spawn_hand_cursor(mut commands: Commands) {
    commands.spawn((
        HandCursor,
        Node {
            position_type: PositionType::Absolute,
            width: Val::Px(HAND_CURSOR_SIZE),
            height: Val::Px(HAND_CURSOR_SIZE),
            ..default()
        },
        BackgroundColor(OPEN_CURSOR_COLOR),
        Visibility::Hidden,
    ));
}

/// Follow the palm; red while pinched, blue otherwise. Hidden until the first
/// hand frame.
pub fn update_hand_cursor(
    state: Res<HandTrackingState>,
    mut cursors: Query<(&mut Node, &mut BackgroundColor, &mut Visibility), With<HandCursor>>,
) {
    if !state.is_changed() {
        return;
    }
    let Some(screen) = state.screen_position else {
        return;
    };
    for (mut node, mut background, mut visibility) in cursors.iter_mut() {
        node.left = Val::Px(screen.x - HAND_CURSOR_SIZE / 2.0);
        node.top = Val::Px(screen.y - HAND_CURSOR_SIZE / 2.0);
        background.0 = if state.pinched {
            PINCHED_CURSOR_COLOR
        } else {
            OPEN_CURSOR_COLOR
        };
        *visibility = Visibility::Visible;
    }
}
