//! Hand-tracking adapter.
//!
//! Hand frames arrive through [`HandTrackingChannel`], get classified into
//! pinch / hold / release and are re-emitted as [`PointerEvent`]s:
//!
//! | Gesture   | Pointer event |
//! |-----------|---------------|
//! | `Pinch`   | `Begin`       |
//! | `Hold`    | `Update`      |
//! | `Release` | `End`         |
//!
//! A held pinch stays held until the tracker reports an open hand; losing the
//! hand does not release.

mod classifier;
mod cursor;
mod emulation;
mod source;

pub use classifier::{round_significant, GestureKind, PinchClassifier};
pub use cursor::{
    update_hand_cursor, HandCursor, HAND_CURSOR_SIZE, OPEN_CURSOR_COLOR, PINCHED_CURSOR_COLOR,
};
pub use emulation::{emulate_hand_system, HandEmulation};
pub use source::{HandFrame, HandTrackingChannel, HandTrackingSender, InteractionBox};

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::config::DemoConfig;
use crate::pointer::{PointerEvent, PointerInputSet, PointerSample, PointerSource};

/// Plugin wiring the hand tracker into the pointer protocol.
pub struct GesturePlugin;

impl Plugin for GesturePlugin {
    fn build(&self, app: &mut App) {
        let gesture = app
            .world()
            .get_resource::<DemoConfig>()
            .map(|config| config.gesture.clone())
            .unwrap_or_default();

        app.add_message::<PointerEvent>()
            .insert_resource(HandTrackingChannel::new(gesture.channel_capacity))
            .insert_resource(HandTrackingState::new(gesture.pinch_threshold))
            .insert_resource(HandEmulation {
                enabled: gesture.emulate_with_keyboard,
                depth: gesture.emulated_depth,
                ..default()
            })
            .add_systems(Startup, cursor::spawn_hand_cursor)
            .add_systems(
                Update,
                (emulate_hand_system, gesture_pointer_system, update_hand_cursor)
                    .chain()
                    .in_set(PointerInputSet),
            );
    }
}

/// Latest hand tracking state, for the cursor and the inspector.
#[derive(Resource, Debug, Clone)]
pub struct HandTrackingState {
    pub classifier: PinchClassifier,
    /// Most recent frame, `None` until the tracker sends one
    pub last_frame: Option<HandFrame>,
    /// Palm position in window pixels plus normalized depth
    pub screen_position: Option<Vec3>,
    pub pinched: bool,
    pub last_gesture: Option<GestureKind>,
    pub frames_received: u64,
}

impl Default for HandTrackingState {
    fn default() -> Self {
        Self::new(0.70)
    }
}

impl HandTrackingState {
    pub fn new(pinch_threshold: f32) -> Self {
        Self {
            classifier: PinchClassifier::new(pinch_threshold),
            last_frame: None,
            screen_position: None,
            pinched: false,
            last_gesture: None,
            frames_received: 0,
        }
    }

    /// Record one frame and translate it into a pointer event, if any.
    pub fn process(&mut self, frame: HandFrame, viewport: Vec2) -> Option<PointerEvent> {
        let screen = frame.screen_position(viewport);
        self.frames_received += 1;
        self.last_frame = Some(frame);
        self.screen_position = Some(screen);
        self.pinched = self.classifier.is_pinched(frame.pinch_strength);

        let gesture = self.classifier.classify(frame.pinch_strength)?;
        self.last_gesture = Some(gesture);

        let sample = PointerSample::from_screen(screen.truncate(), viewport, Some(screen.z));
        let source = PointerSource::Gesture;
        Some(match gesture {
            GestureKind::Pinch => PointerEvent::begin(source, sample),
            GestureKind::Hold => PointerEvent::update(source, sample),
            GestureKind::Release => PointerEvent::end(source),
        })
    }
}

/// Drain queued hand frames and emit pointer events for them.
///
/// Frames stay queued while there is no primary window to map them onto.
pub fn gesture_pointer_system(
    channel: Res<HandTrackingChannel>,
    mut state: ResMut<HandTrackingState>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut pointer_events: MessageWriter<PointerEvent>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let frames = channel.drain();
    if frames.is_empty() {
        return;
    }
    let viewport = Vec2::new(window.width(), window.height());

    for frame in frames {
        if let Some(event) = state.process(frame, viewport) {
            debug!("Gesture {:?}", event.phase);
            pointer_events.write(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::PointerPhase;

    fn frame_at(normalized: Vec3, pinch_strength: f32) -> HandFrame {
        let interaction_box = InteractionBox::default();
        HandFrame {
            palm_position: interaction_box.denormalize_point(normalized),
            pinch_strength,
            interaction_box,
        }
    }

    #[test]
    fn test_open_hand_only_moves_cursor() {
        let mut state = HandTrackingState::default();
        let event = state.process(frame_at(Vec3::splat(0.5), 0.1), Vec2::new(800.0, 600.0));

        assert!(event.is_none());
        assert!(!state.pinched);
        let screen = state.screen_position.unwrap();
        assert!((screen.x - 400.0).abs() < 1e-2);
        assert!((screen.y - 300.0).abs() < 1e-2);
        assert_eq!(state.frames_received, 1);
    }

    #[test]
    fn test_pinch_hold_release_map_to_pointer_phases() {
        let mut state = HandTrackingState::default();
        let viewport = Vec2::new(800.0, 600.0);
        let position = Vec3::new(0.75, 0.25, 0.3);

        let begin = state.process(frame_at(position, 0.9), viewport).unwrap();
        let hold = state.process(frame_at(position, 0.9), viewport).unwrap();
        let end = state.process(frame_at(position, 0.2), viewport).unwrap();

        assert_eq!(begin.source, PointerSource::Gesture);
        let PointerPhase::Begin(sample) = begin.phase else {
            panic!("expected begin, got {:?}", begin.phase);
        };
        // x = 2 * 0.75 - 1, y = 2 * 0.25 - 1
        assert!((sample.ndc - Vec2::new(0.5, -0.5)).length() < 1e-4);
        assert!((sample.depth.unwrap() - 0.3).abs() < 1e-4);

        assert!(matches!(hold.phase, PointerPhase::Update(_)));
        assert_eq!(end.phase, PointerPhase::End);
        assert_eq!(state.last_gesture, Some(GestureKind::Release));
    }
}
