use bevy::prelude::*;
use jenga_core::{CameraRig, CorePlugin, DemoConfig};
use jenga_hud::HudPlugin;
use jenga_physics::{DragPlugin, PhysicsPlugin};

fn main() {
    // Load problems are logged at startup, once LogPlugin is running
    let (config, load_report) = DemoConfig::from_args_or_default();
    let window = Window {
        title: config.window.title.clone(),
        resolution: bevy::window::WindowResolution::new(config.window.width, config.window.height),
        ..default()
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(window),
            ..default()
        }))
        // Plugins below read the config while building
        .insert_resource(config)
        .insert_resource(load_report)
        .add_plugins(CorePlugin)
        .add_plugins(PhysicsPlugin)
        .add_plugins(DragPlugin)
        .add_plugins(HudPlugin)
        .insert_resource(ClearColor(Color::srgb(0.93, 0.93, 0.9)))
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands, config: Res<DemoConfig>, rig: Res<CameraRig>) {
    // Fixed camera; pick rays are built from the same rig
    commands.spawn((
        Camera3d::default(),
        Projection::from(PerspectiveProjection {
            fov: rig.fov_y,
            near: rig.near,
            far: rig.far,
            ..default()
        }),
        rig.transform(),
    ));

    // Key light, shadow casting
    commands.spawn((
        DirectionalLight {
            illuminance: 10000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(20.0, 30.0, -5.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Soft fill from the camera side
    commands.spawn((
        DirectionalLight {
            illuminance: 2500.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(rig.eye).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    info!(
        "Drag blocks with the left mouse button{}",
        if config.gesture.emulate_with_keyboard {
            ", or pinch with Space"
        } else {
            ""
        }
    );
}
