//! Pointer-driven dragging of tower blocks.
//!
//! Pointer events are applied in `Update`; the velocity command is issued in
//! [`PhysicsSet::PreStep`] so the integrator sees it on the same tick.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use jenga_core::{
    CameraRig, DemoConfig, InteractionController, PickVolume, PointerEvent, PointerInputSet,
};
use rapier3d::prelude::RigidBodyHandle;

use crate::{Pickable, PhysicsSet, PhysicsState, RigidBodyLink};

/// The app's single interaction controller.
#[derive(Resource, Default)]
pub struct DragController(pub InteractionController<RigidBodyHandle>);

pub struct DragPlugin;

impl Plugin for DragPlugin {
    fn build(&self, app: &mut App) {
        let interaction = app
            .world()
            .get_resource::<DemoConfig>()
            .map(|config| config.interaction.clone())
            .unwrap_or_default();

        app.add_message::<PointerEvent>()
            .init_resource::<CameraRig>()
            .insert_resource(DragController(InteractionController::new(interaction)))
            .add_systems(
                Update,
                (track_viewport, apply_pointer_events)
                    .chain()
                    .after(PointerInputSet),
            )
            .add_systems(FixedUpdate, drag_step.in_set(PhysicsSet::PreStep));
    }
}

/// Pick volumes for every pickable body at its current pose.
pub fn pick_volumes<'a>(
    physics: &PhysicsState,
    blocks: impl IntoIterator<Item = (&'a RigidBodyLink, &'a Pickable)>,
) -> Vec<PickVolume<RigidBodyHandle>> {
    blocks
        .into_iter()
        .filter_map(|(link, pickable)| physics.pick_volume(link.0, pickable.half_extents))
        .collect()
}

/// Keep the pick-ray aspect ratio in step with the window.
fn track_viewport(
    windows: Query<&Window, (With<PrimaryWindow>, Changed<Window>)>,
    mut rig: ResMut<CameraRig>,
) {
    if let Ok(window) = windows.single() {
        rig.set_viewport(window.width(), window.height());
    }
}

fn apply_pointer_events(
    mut pointer_events: MessageReader<PointerEvent>,
    mut controller: ResMut<DragController>,
    mut physics: ResMut<PhysicsState>,
    rig: Res<CameraRig>,
    blocks: Query<(&RigidBodyLink, &Pickable)>,
) {
    let events: Vec<PointerEvent> = pointer_events.read().copied().collect();
    if events.is_empty() {
        return;
    }

    let volumes = pick_volumes(&physics, blocks.iter());
    for event in &events {
        controller.0.handle(physics.as_mut(), &rig, &volumes, event);
    }
}

fn drag_step(
    mut controller: ResMut<DragController>,
    mut physics: ResMut<PhysicsState>,
    blocks: Query<&RigidBodyLink, With<Pickable>>,
) {
    controller
        .0
        .on_simulation_step(physics.as_mut(), blocks.iter().map(|link| link.0));
}
