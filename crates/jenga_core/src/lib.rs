//! Core types and input handling for Jenga Studio.
//!
//! This crate provides:
//! - Demo configuration with JSON loading
//! - Tower layout (block placements)
//! - Device-independent pointer events with mouse and hand-tracking adapters
//! - Pick rays, ray/box picking and the drag plane
//! - The pick-and-drag interaction controller, generic over the physics world
//!
//! Nothing here depends on a particular physics engine; `jenga_physics`
//! implements [`BodyControl`] for rapier.

use bevy::prelude::*;

pub mod camera_rig;
pub mod config;
pub mod gesture;
pub mod interaction;
pub mod mouse;
pub mod picking;
pub mod pointer;
pub mod tower;

pub use camera_rig::CameraRig;
pub use config::{
    CameraConfig, ConfigError, ConfigLoadReport, ConfigResult, DemoConfig, GestureConfig,
    InteractionConfig, PhysicsConfig, SurfaceMaterial, TableConfig, WindowConfig,
};
pub use gesture::{
    GestureKind, GesturePlugin, HandCursor, HandEmulation, HandFrame, HandTrackingChannel,
    HandTrackingSender, HandTrackingState, InteractionBox, PinchClassifier, OPEN_CURSOR_COLOR,
    PINCHED_CURSOR_COLOR,
};
pub use interaction::{BodyControl, InteractionController, Selection, FULL_RESPONSE, NO_RESPONSE};
pub use mouse::MouseInputPlugin;
pub use picking::{cast_nearest, GroundPlane, PickHit, PickVolume};
pub use pointer::{
    screen_to_ndc, PointerEvent, PointerInputSet, PointerPhase, PointerSample, PointerSource,
    FULL_DEPTH,
};
pub use tower::{BlockPlacement, TowerLayout, ROTATED_ROW_YAW};

/// Input plugin: pointer events from mouse and hand tracker, plus the shared
/// camera rig.
///
/// Reads [`DemoConfig`] if it was inserted before the plugin is added.
pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<DemoConfig>()
            .cloned()
            .unwrap_or_default();
        let aspect = config.window.width as f32 / config.window.height as f32;

        app.insert_resource(CameraRig::from_config(&config.camera, aspect))
            .init_resource::<ConfigLoadReport>()
            .add_systems(Startup, config::report_config_load)
            .add_plugins(MouseInputPlugin)
            .add_plugins(GesturePlugin);

        if !app.world().contains_resource::<DemoConfig>() {
            app.insert_resource(config);
        }
    }
}
