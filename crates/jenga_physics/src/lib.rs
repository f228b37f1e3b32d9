use bevy::prelude::*;
use jenga_core::{
    BlockPlacement, BodyControl, DemoConfig, PhysicsConfig, PickVolume, SurfaceMaterial,
    TableConfig, TowerLayout,
};
use rapier3d::prelude as rapier;
use rapier::nalgebra::Vector3;
use std::collections::HashMap;

pub mod drag;

pub use drag::{DragController, DragPlugin};

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<DemoConfig>()
            .map(|config| config.physics.clone())
            .unwrap_or_default();

        app.insert_resource(PhysicsState::new(&config))
            .insert_resource(Time::<Fixed>::from_hz(config.fixed_hz))
            .configure_sets(
                FixedUpdate,
                (PhysicsSet::PreStep, PhysicsSet::Step, PhysicsSet::Sync).chain(),
            )
            .add_systems(Startup, setup_physics_scene)
            .add_systems(FixedUpdate, step_physics.in_set(PhysicsSet::Step))
            .add_systems(FixedUpdate, sync_transforms.in_set(PhysicsSet::Sync));
    }
}

/// Ordering of one physics tick.
///
/// Systems that command bodies for the coming tick go in `PreStep`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicsSet {
    PreStep,
    Step,
    Sync,
}

/// Per-axis solver response of a body (0 = off, 1 = on).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyFactors {
    pub linear: Vec3,
    pub angular: Vec3,
}

impl Default for BodyFactors {
    fn default() -> Self {
        Self {
            linear: Vec3::ONE,
            angular: Vec3::ONE,
        }
    }
}

impl BodyFactors {
    /// No axis responds to the solver.
    pub fn is_frozen(&self) -> bool {
        self.linear == Vec3::ZERO && self.angular == Vec3::ZERO
    }
}

#[derive(Resource)]
pub struct PhysicsState {
    pub gravity: Vector3<f32>,
    pub integration_parameters: rapier::IntegrationParameters,
    pub physics_pipeline: rapier::PhysicsPipeline,
    pub island_manager: rapier::IslandManager,
    pub broad_phase: rapier::DefaultBroadPhase,
    pub narrow_phase: rapier::NarrowPhase,
    pub rigid_body_set: rapier::RigidBodySet,
    pub collider_set: rapier::ColliderSet,
    pub impulse_joint_set: rapier::ImpulseJointSet,
    pub multibody_joint_set: rapier::MultibodyJointSet,
    pub ccd_solver: rapier::CCDSolver,
    factors: HashMap<rapier::RigidBodyHandle, BodyFactors>,
}

impl PhysicsState {
    pub fn new(config: &PhysicsConfig) -> Self {
        let integration_parameters = rapier::IntegrationParameters {
            dt: config.timestep(),
            ..Default::default()
        };
        Self {
            gravity: Vector3::new(0.0, config.gravity, 0.0),
            integration_parameters,
            physics_pipeline: rapier::PhysicsPipeline::new(),
            island_manager: rapier::IslandManager::new(),
            broad_phase: rapier::DefaultBroadPhase::new(),
            narrow_phase: rapier::NarrowPhase::new(),
            rigid_body_set: rapier::RigidBodySet::new(),
            collider_set: rapier::ColliderSet::new(),
            impulse_joint_set: rapier::ImpulseJointSet::new(),
            multibody_joint_set: rapier::MultibodyJointSet::new(),
            ccd_solver: rapier::CCDSolver::new(),
            factors: HashMap::new(),
        }
    }

    /// Advance the simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
    }

    /// Static table box.
    pub fn insert_table(&mut self, table: &TableConfig) -> rapier::RigidBodyHandle {
        let body = rapier::RigidBodyBuilder::fixed().translation(to_vector(table.center()));
        let handle = self.rigid_body_set.insert(body);
        let half = table.half_extents();
        let collider = rapier::ColliderBuilder::cuboid(half.x, half.y, half.z)
            .friction(table.material.friction)
            .restitution(table.material.restitution);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        handle
    }

    /// Dynamic box body at a tower placement.
    pub fn insert_block(
        &mut self,
        placement: &BlockPlacement,
        half_extents: Vec3,
        material: SurfaceMaterial,
    ) -> rapier::RigidBodyHandle {
        let body = rapier::RigidBodyBuilder::dynamic()
            .translation(to_vector(placement.translation))
            .rotation(Vector3::new(0.0, placement.yaw, 0.0));
        let handle = self.rigid_body_set.insert(body);
        let collider = rapier::ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .friction(material.friction)
            .restitution(material.restitution);
        self.collider_set
            .insert_with_parent(collider, handle, &mut self.rigid_body_set);
        self.factors.insert(handle, BodyFactors::default());
        handle
    }

    /// Insert every block of the layout, bottom row first.
    pub fn build_tower(
        &mut self,
        layout: &TowerLayout,
        material: SurfaceMaterial,
    ) -> Vec<(BlockPlacement, rapier::RigidBodyHandle)> {
        let half_extents = layout.half_extents();
        layout
            .placements()
            .into_iter()
            .map(|placement| {
                let handle = self.insert_block(&placement, half_extents, material);
                (placement, handle)
            })
            .collect()
    }

    /// Current pose of a body as a pickable box.
    pub fn pick_volume(
        &self,
        handle: rapier::RigidBodyHandle,
        half_extents: Vec3,
    ) -> Option<PickVolume<rapier::RigidBodyHandle>> {
        let body = self.rigid_body_set.get(handle)?;
        let (center, rotation) = body_pose(body);
        Some(PickVolume {
            body: handle,
            center,
            rotation,
            half_extents,
        })
    }

    pub fn factors(&self, handle: rapier::RigidBodyHandle) -> Option<BodyFactors> {
        self.factors.get(&handle).copied()
    }

    pub fn dynamic_body_count(&self) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_dynamic())
            .count()
    }

    pub fn sleeping_body_count(&self) -> usize {
        self.rigid_body_set
            .iter()
            .filter(|(_, body)| body.is_sleeping())
            .count()
    }

    fn update_factors(
        &mut self,
        handle: rapier::RigidBodyHandle,
        change: impl FnOnce(&mut BodyFactors),
    ) {
        let Some(body) = self.rigid_body_set.get_mut(handle) else {
            return;
        };
        let factors = self.factors.entry(handle).or_default();
        change(factors);
        apply_factors(body, *factors);
    }
}

impl Default for PhysicsState {
    fn default() -> Self {
        Self::new(&PhysicsConfig::default())
    }
}

/// Map factors onto rapier, which has axis locks instead of multipliers.
///
/// A fully frozen body becomes velocity-based kinematic: velocity writes still
/// move it but gravity and contacts do not.
fn apply_factors(body: &mut rapier::RigidBody, factors: BodyFactors) {
    if factors.is_frozen() {
        if body.body_type() != rapier::RigidBodyType::KinematicVelocityBased {
            body.set_body_type(rapier::RigidBodyType::KinematicVelocityBased, true);
        }
        return;
    }

    if body.body_type() != rapier::RigidBodyType::Dynamic {
        body.set_body_type(rapier::RigidBodyType::Dynamic, true);
    }
    let linear = factors.linear;
    let angular = factors.angular;
    body.set_enabled_translations(linear.x != 0.0, linear.y != 0.0, linear.z != 0.0, true);
    body.set_enabled_rotations(angular.x != 0.0, angular.y != 0.0, angular.z != 0.0, true);
}

impl BodyControl for PhysicsState {
    type Body = rapier::RigidBodyHandle;

    fn position(&self, body: Self::Body) -> Option<Vec3> {
        self.rigid_body_set
            .get(body)
            .map(|body| from_vector(body.translation()))
    }

    fn set_linear_velocity(&mut self, body: Self::Body, velocity: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(body) {
            body.set_linvel(to_vector(velocity), true);
        }
    }

    fn set_angular_velocity(&mut self, body: Self::Body, velocity: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(body) {
            body.set_angvel(to_vector(velocity), true);
        }
    }

    fn set_linear_factor(&mut self, body: Self::Body, factor: Vec3) {
        self.update_factors(body, |factors| factors.linear = factor);
    }

    fn set_angular_factor(&mut self, body: Self::Body, factor: Vec3) {
        self.update_factors(body, |factors| factors.angular = factor);
    }

    fn linear_factor(&self, body: Self::Body) -> Option<Vec3> {
        self.factors(body).map(|factors| factors.linear)
    }

    fn angular_factor(&self, body: Self::Body) -> Option<Vec3> {
        self.factors(body).map(|factors| factors.angular)
    }

    fn apply_central_impulse(&mut self, body: Self::Body, impulse: Vec3) {
        if let Some(body) = self.rigid_body_set.get_mut(body) {
            body.apply_impulse(to_vector(impulse), true);
            // Zero impulses are skipped by rapier, so wake explicitly
            if body.is_dynamic() {
                body.wake_up(true);
            }
        }
    }
}

pub fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn body_pose(body: &rapier::RigidBody) -> (Vec3, Quat) {
    let pos = body.translation();
    let rot = body.rotation();
    (
        Vec3::new(pos.x, pos.y, pos.z),
        Quat::from_xyzw(rot.i, rot.j, rot.k, rot.w),
    )
}

/// Links a Bevy entity to a Rapier rigid body
#[derive(Component)]
pub struct RigidBodyLink(pub rapier::RigidBodyHandle);

/// Marks a body the pointer can grab, with its box half-extents.
#[derive(Component, Debug, Clone, Copy)]
pub struct Pickable {
    pub half_extents: Vec3,
}

/// Where a block started in the tower.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TowerBlock {
    pub row: u32,
    pub column: u32,
}

/// Spawn the table and the tower.
///
/// Meshes are only attached when the render asset stores exist, so headless
/// apps get the same bodies without visuals.
fn setup_physics_scene(
    mut commands: Commands,
    mut physics: ResMut<PhysicsState>,
    config: Option<Res<DemoConfig>>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let config = config.map(|c| c.clone()).unwrap_or_default();
    let p = physics.as_mut();

    p.insert_table(&config.table);
    let blocks = p.build_tower(&config.tower, config.block_material);
    info!(
        "Built tower: {} blocks in {} rows",
        blocks.len(),
        config.tower.rows
    );

    let visuals = match (meshes, materials) {
        (Some(mut meshes), Some(mut materials)) => {
            // Table
            commands.spawn((
                Mesh3d(meshes.add(Cuboid::from_size(Vec3::from_array(config.table.size)))),
                MeshMaterial3d(materials.add(Color::srgb(0.45, 0.3, 0.18))),
                Transform::from_translation(config.table.center()),
            ));
            let mesh = meshes.add(Cuboid::from_size(config.tower.block_size()));
            let material = materials.add(Color::srgb(0.86, 0.72, 0.52));
            Some((mesh, material))
        }
        _ => None,
    };

    let half_extents = config.tower.half_extents();
    for (placement, handle) in blocks {
        let mut entity = commands.spawn((
            Transform::from_translation(placement.translation).with_rotation(placement.rotation),
            RigidBodyLink(handle),
            Pickable { half_extents },
            TowerBlock {
                row: placement.row,
                column: placement.column,
            },
        ));
        if let Some((mesh, material)) = &visuals {
            entity.insert((Mesh3d(mesh.clone()), MeshMaterial3d(material.clone())));
        }
    }
}

fn step_physics(mut physics: ResMut<PhysicsState>) {
    physics.step();
}

fn sync_transforms(physics: Res<PhysicsState>, mut query: Query<(&RigidBodyLink, &mut Transform)>) {
    for (link, mut transform) in query.iter_mut() {
        if let Some(body) = physics.rigid_body_set.get(link.0) {
            let (translation, rotation) = body_pose(body);
            transform.translation = translation;
            transform.rotation = rotation;
        }
    }
}
