//! Pick-and-drag control of rigid bodies.
//!
//! [`InteractionController`] owns the selection and turns pointer input into
//! commands on a physics world reached through [`BodyControl`]:
//!
//! 1. **Begin**: cast a ray through the pointer; the nearest block is taken
//!    over. Its factors and velocities drop to zero so only our velocity
//!    commands move it, and the drag plane moves to the grab height.
//! 2. **Update**: re-cast against the drag plane to move the cursor.
//! 3. **Step** (every physics tick): steer the held block toward
//!    `cursor + grab offset` with a proportional velocity, horizontal only,
//!    and nudge every block awake.
//! 4. **End**: give the block back to the solver.
//!
//! Misses at any stage are not errors; they simply leave the state as is.

use bevy::prelude::*;
use std::fmt::Debug;

use crate::camera_rig::CameraRig;
use crate::config::InteractionConfig;
use crate::picking::{cast_nearest, GroundPlane, PickVolume};
use crate::pointer::{PointerEvent, PointerPhase, PointerSample};

/// Factor value that leaves an axis fully under solver control.
pub const FULL_RESPONSE: Vec3 = Vec3::ONE;

/// Factor value that removes an axis from solver control.
pub const NO_RESPONSE: Vec3 = Vec3::ZERO;

/// The operations the controller needs from a physics world.
///
/// Factors are per-axis multipliers (0 or 1) on how much the solver's own
/// forces move a body. Velocity writes apply regardless of factors.
pub trait BodyControl {
    type Body: Copy + Eq + Debug;

    /// World position of the body origin, `None` if the body is unknown.
    fn position(&self, body: Self::Body) -> Option<Vec3>;

    fn set_linear_velocity(&mut self, body: Self::Body, velocity: Vec3);

    fn set_angular_velocity(&mut self, body: Self::Body, velocity: Vec3);

    fn set_linear_factor(&mut self, body: Self::Body, factor: Vec3);

    fn set_angular_factor(&mut self, body: Self::Body, factor: Vec3);

    fn linear_factor(&self, body: Self::Body) -> Option<Vec3>;

    fn angular_factor(&self, body: Self::Body) -> Option<Vec3>;

    /// Impulse through the center of mass. Also wakes the body.
    fn apply_central_impulse(&mut self, body: Self::Body, impulse: Vec3);
}

/// The block currently held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<B> {
    pub body: B,
    /// Body origin minus grab point, fixed at pick time
    pub offset: Vec3,
    /// Live cursor position on the drag plane
    pub cursor: Vec3,
}

impl<B> Selection<B> {
    /// Where the body origin is being steered to.
    pub fn target(&self) -> Vec3 {
        self.cursor + self.offset
    }
}

/// Selection state plus the drag plane.
#[derive(Debug, Clone)]
pub struct InteractionController<B> {
    config: InteractionConfig,
    selection: Option<Selection<B>>,
    plane: GroundPlane,
    last_command: Option<Vec3>,
}

impl<B: Copy + Eq + Debug> Default for InteractionController<B> {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

impl<B: Copy + Eq + Debug> InteractionController<B> {
    pub fn new(config: InteractionConfig) -> Self {
        let plane = GroundPlane::with_size(config.ground_plane_size);
        Self {
            config,
            selection: None,
            plane,
            last_command: None,
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn selection(&self) -> Option<&Selection<B>> {
        self.selection.as_ref()
    }

    pub fn selected(&self) -> Option<B> {
        self.selection.map(|s| s.body)
    }

    pub fn is_holding(&self) -> bool {
        self.selection.is_some()
    }

    pub fn plane(&self) -> &GroundPlane {
        &self.plane
    }

    /// Velocity written on the most recent step, if a block was held.
    pub fn last_command(&self) -> Option<Vec3> {
        self.last_command
    }

    /// Apply one pointer event.
    pub fn handle<W>(
        &mut self,
        world: &mut W,
        rig: &CameraRig,
        volumes: &[PickVolume<B>],
        event: &PointerEvent,
    ) where
        W: BodyControl<Body = B>,
    {
        match event.phase {
            PointerPhase::Begin(sample) => {
                self.begin_select(world, rig, volumes, sample);
            }
            PointerPhase::Update(sample) => self.update_target(rig, sample),
            PointerPhase::End => {
                self.end_select(world);
            }
        }
    }

    /// Try to grab the block under the pointer. Returns the grabbed body.
    pub fn begin_select<W>(
        &mut self,
        world: &mut W,
        rig: &CameraRig,
        volumes: &[PickVolume<B>],
        sample: PointerSample,
    ) -> Option<B>
    where
        W: BodyControl<Body = B>,
    {
        let ray = rig.ray(sample)?;
        self.select_along(world, volumes, ray)
    }

    /// Grab the nearest block along `ray`.
    pub fn select_along<W>(
        &mut self,
        world: &mut W,
        volumes: &[PickVolume<B>],
        ray: Ray3d,
    ) -> Option<B>
    where
        W: BodyControl<Body = B>,
    {
        let Some(hit) = cast_nearest(volumes, ray) else {
            debug!("Pick missed");
            return None;
        };
        let position = world.position(hit.body)?;

        // Only one block may be held; hand the old one back first.
        self.end_select(world);

        world.set_angular_factor(hit.body, NO_RESPONSE);
        world.set_angular_velocity(hit.body, Vec3::ZERO);
        world.set_linear_factor(hit.body, NO_RESPONSE);
        world.set_linear_velocity(hit.body, Vec3::ZERO);

        self.plane.height = hit.point.y;
        self.selection = Some(Selection {
            body: hit.body,
            offset: position - hit.point,
            cursor: hit.point,
        });
        info!("Picked {:?} at {:?}", hit.body, hit.point);
        Some(hit.body)
    }

    /// Move the drag cursor to where the pointer meets the drag plane.
    ///
    /// Does nothing without a selection. A plane miss keeps the previous cursor.
    pub fn update_target(&mut self, rig: &CameraRig, sample: PointerSample) {
        if self.selection.is_none() {
            return;
        }
        if let Some(ray) = rig.ray(sample) {
            self.retarget_along(ray);
        }
    }

    /// Move the drag cursor to where `ray` meets the drag plane.
    pub fn retarget_along(&mut self, ray: Ray3d) {
        let Some(selection) = self.selection.as_mut() else {
            return;
        };
        match self.plane.intersect(ray) {
            Some(point) => selection.cursor = point,
            None => debug!("Drag plane missed, keeping cursor at {:?}", selection.cursor),
        }
    }

    /// Let go of the held block. Returns it, if there was one.
    pub fn end_select<W>(&mut self, world: &mut W) -> Option<B>
    where
        W: BodyControl<Body = B>,
    {
        let selection = self.selection.take()?;
        world.set_angular_factor(selection.body, FULL_RESPONSE);
        world.set_linear_factor(selection.body, FULL_RESPONSE);
        self.last_command = None;
        info!("Released {:?}", selection.body);
        Some(selection.body)
    }

    /// Per-tick hook, run before the physics world integrates.
    ///
    /// Steers the held block (if any) and wakes every pickable body. Returns
    /// the velocity written to the held block.
    pub fn on_simulation_step<W, I>(&mut self, world: &mut W, bodies: I) -> Option<Vec3>
    where
        W: BodyControl<Body = B>,
        I: IntoIterator<Item = B>,
    {
        self.last_command = self.selection.and_then(|selection| {
            let position = world.position(selection.body)?;
            let mut velocity = (selection.target() - position) * self.config.gain;
            // Dragging never lifts or drops the block
            velocity.y = 0.0;
            world.set_linear_velocity(selection.body, velocity);
            Some(velocity)
        });

        // Keep idle blocks from sleeping so knocked blocks still react.
        for body in bodies {
            world.apply_central_impulse(body, Vec3::ZERO);
        }

        self.last_command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    struct FakeBody {
        position: Vec3,
        linvel: Vec3,
        angvel: Vec3,
        linear_factor: Vec3,
        angular_factor: Vec3,
        impulses: u32,
    }

    /// Records every command; bodies never move on their own.
    #[derive(Default)]
    struct FakeWorld {
        bodies: HashMap<u32, FakeBody>,
        velocity_writes: u32,
    }

    impl FakeWorld {
        fn with_bodies(positions: &[(u32, Vec3)]) -> Self {
            let mut world = Self::default();
            for (id, position) in positions {
                world.bodies.insert(
                    *id,
                    FakeBody {
                        position: *position,
                        linvel: Vec3::new(1.0, 2.0, 3.0),
                        angvel: Vec3::new(0.5, 0.5, 0.5),
                        linear_factor: Vec3::ONE,
                        angular_factor: Vec3::ONE,
                        impulses: 0,
                    },
                );
            }
            world
        }

        fn body(&self, id: u32) -> &FakeBody {
            &self.bodies[&id]
        }
    }

    impl BodyControl for FakeWorld {
        type Body = u32;

        fn position(&self, body: u32) -> Option<Vec3> {
            self.bodies.get(&body).map(|b| b.position)
        }

        fn set_linear_velocity(&mut self, body: u32, velocity: Vec3) {
            self.velocity_writes += 1;
            if let Some(b) = self.bodies.get_mut(&body) {
                b.linvel = velocity;
            }
        }

        fn set_angular_velocity(&mut self, body: u32, velocity: Vec3) {
            if let Some(b) = self.bodies.get_mut(&body) {
                b.angvel = velocity;
            }
        }

        fn set_linear_factor(&mut self, body: u32, factor: Vec3) {
            if let Some(b) = self.bodies.get_mut(&body) {
                b.linear_factor = factor;
            }
        }

        fn set_angular_factor(&mut self, body: u32, factor: Vec3) {
            if let Some(b) = self.bodies.get_mut(&body) {
                b.angular_factor = factor;
            }
        }

        fn linear_factor(&self, body: u32) -> Option<Vec3> {
            self.bodies.get(&body).map(|b| b.linear_factor)
        }

        fn angular_factor(&self, body: u32) -> Option<Vec3> {
            self.bodies.get(&body).map(|b| b.angular_factor)
        }

        fn apply_central_impulse(&mut self, body: u32, _impulse: Vec3) {
            if let Some(b) = self.bodies.get_mut(&body) {
                b.impulses += 1;
            }
        }
    }

    fn volumes(world: &FakeWorld) -> Vec<PickVolume<u32>> {
        let mut ids: Vec<u32> = world.bodies.keys().copied().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| PickVolume {
                body: id,
                center: world.body(id).position,
                rotation: Quat::IDENTITY,
                half_extents: Vec3::splat(0.5),
            })
            .collect()
    }

    fn down_ray(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 50.0, z), Dir3::NEG_Y)
    }

    /// Two stacked blocks at the origin plus one off to the side.
    fn setup() -> (FakeWorld, Vec<PickVolume<u32>>, InteractionController<u32>) {
        let world = FakeWorld::with_bodies(&[
            (1, Vec3::new(0.0, 0.5, 0.0)),
            (2, Vec3::new(0.0, 1.5, 0.0)),
            (3, Vec3::new(5.0, 0.5, 0.0)),
        ]);
        let volumes = volumes(&world);
        (world, volumes, InteractionController::default())
    }

    #[test]
    fn test_select_picks_nearest_hit() {
        let (mut world, volumes, mut controller) = setup();
        let picked = controller.select_along(&mut world, &volumes, down_ray(0.1, 0.2));

        assert_eq!(picked, Some(2));
        let selection = controller.selection().unwrap();
        assert_eq!(selection.cursor, Vec3::new(0.1, 2.0, 0.2));
        assert_eq!(selection.offset, Vec3::new(-0.1, -0.5, -0.2));
        assert_eq!(controller.plane().height, 2.0);
    }

    #[test]
    fn test_select_zeroes_factors_and_velocities() {
        let (mut world, volumes, mut controller) = setup();
        controller.select_along(&mut world, &volumes, down_ray(0.0, 0.0));

        let body = world.body(2);
        assert_eq!(body.linear_factor, Vec3::ZERO);
        assert_eq!(body.angular_factor, Vec3::ZERO);
        assert_eq!(body.linvel, Vec3::ZERO);
        assert_eq!(body.angvel, Vec3::ZERO);
        // Others untouched
        assert_eq!(world.body(1).linear_factor, Vec3::ONE);
        assert_eq!(world.body(1).linvel, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_miss_leaves_selection_unchanged() {
        let (mut world, volumes, mut controller) = setup();
        assert_eq!(controller.select_along(&mut world, &volumes, down_ray(20.0, 0.0)), None);
        assert!(!controller.is_holding());

        controller.select_along(&mut world, &volumes, down_ray(5.0, 0.0));
        let before = *controller.selection().unwrap();
        controller.select_along(&mut world, &volumes, down_ray(20.0, 0.0));
        assert_eq!(controller.selection(), Some(&before));
        assert_eq!(world.body(3).linear_factor, Vec3::ZERO);
    }

    #[test]
    fn test_end_restores_factors() {
        let (mut world, volumes, mut controller) = setup();
        controller.select_along(&mut world, &volumes, down_ray(0.0, 0.0));

        assert_eq!(controller.end_select(&mut world), Some(2));
        assert!(!controller.is_holding());
        assert_eq!(world.body(2).linear_factor, Vec3::ONE);
        assert_eq!(world.body(2).angular_factor, Vec3::ONE);
    }

    #[test]
    fn test_end_without_selection_is_noop() {
        let (mut world, _volumes, mut controller) = setup();
        assert_eq!(controller.end_select(&mut world), None);
        assert_eq!(world.velocity_writes, 0);
    }

    #[test]
    fn test_at_most_one_selected() {
        let (mut world, volumes, mut controller) = setup();
        let rays = [
            down_ray(0.0, 0.0),
            down_ray(5.0, 0.0),
            down_ray(30.0, 0.0),
            down_ray(0.0, 0.0),
        ];
        for ray in rays {
            controller.select_along(&mut world, &volumes, ray);
            let held: Vec<u32> = world
                .bodies
                .iter()
                .filter(|(_, b)| b.linear_factor == Vec3::ZERO)
                .map(|(id, _)| *id)
                .collect();
            assert!(held.len() <= 1);
            assert_eq!(held.first().copied(), controller.selected());
        }
        controller.end_select(&mut world);
        assert!(world.bodies.values().all(|b| b.linear_factor == Vec3::ONE));
    }

    #[test]
    fn test_retarget_without_selection_is_ignored() {
        let mut controller = InteractionController::<u32>::default();
        controller.retarget_along(down_ray(1.0, 1.0));
        assert!(controller.selection().is_none());
    }

    #[test]
    fn test_retarget_moves_cursor_on_plane() {
        let (mut world, volumes, mut controller) = setup();
        controller.select_along(&mut world, &volumes, down_ray(0.0, 0.0));

        controller.retarget_along(down_ray(3.0, -1.0));
        assert_eq!(controller.selection().unwrap().cursor, Vec3::new(3.0, 2.0, -1.0));
    }

    #[test]
    fn test_retarget_miss_keeps_cursor() {
        let (mut world, volumes, mut controller) = setup();
        controller.select_along(&mut world, &volumes, down_ray(0.0, 0.0));
        let before = controller.selection().unwrap().cursor;

        // Outside the 150x150 plane
        controller.retarget_along(down_ray(500.0, 0.0));
        assert_eq!(controller.selection().unwrap().cursor, before);
        // Pointing up never meets the plane
        controller.retarget_along(Ray3d::new(Vec3::ZERO, Dir3::Y));
        assert_eq!(controller.selection().unwrap().cursor, before);
    }

    #[test]
    fn test_step_velocity_is_horizontal() {
        let (mut world, volumes, mut controller) = setup();
        controller.select_along(&mut world, &volumes, down_ray(0.0, 0.0));
        controller.retarget_along(down_ray(2.0, 0.0));
        // Body sunk below its target; drag must not lift it.
        world.bodies.get_mut(&2).unwrap().position.y = -10.0;

        let velocity = controller.on_simulation_step(&mut world, [1, 2, 3]).unwrap();
        assert_eq!(velocity.y, 0.0);
        assert_eq!(velocity, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(world.body(2).linvel, velocity);
        assert_eq!(controller.last_command(), Some(velocity));
    }

    #[test]
    fn test_step_uses_configured_gain() {
        let (mut world, volumes, _) = setup();
        let mut controller = InteractionController::new(InteractionConfig {
            gain: 2.0,
            ..default()
        });
        controller.select_along(&mut world, &volumes, down_ray(0.0, 0.0));
        controller.retarget_along(down_ray(0.0, 1.5));

        let velocity = controller.on_simulation_step(&mut world, [2]).unwrap();
        assert_eq!(velocity, Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_step_without_selection_only_wakes() {
        let (mut world, _volumes, mut controller) = setup();

        assert_eq!(controller.on_simulation_step(&mut world, [1, 2, 3]), None);
        assert_eq!(world.velocity_writes, 0);
        for id in [1, 2, 3] {
            assert_eq!(world.body(id).impulses, 1);
        }
    }

    #[test]
    fn test_step_with_selection_wakes_all() {
        let (mut world, volumes, mut controller) = setup();
        controller.select_along(&mut world, &volumes, down_ray(5.0, 0.0));
        controller.on_simulation_step(&mut world, [1, 2, 3]);
        for id in [1, 2, 3] {
            assert_eq!(world.body(id).impulses, 1);
        }
    }

    #[test]
    fn test_handle_dispatches_phases() {
        use crate::pointer::PointerSource;

        let (mut world, volumes, mut controller) = setup();
        let rig = CameraRig::default();
        let ndc = rig.project(Vec3::new(5.0, 1.0, 0.0)).truncate();

        controller.handle(
            &mut world,
            &rig,
            &volumes,
            &PointerEvent::begin(PointerSource::Mouse, PointerSample::new(ndc)),
        );
        assert_eq!(controller.selected(), Some(3));

        controller.handle(&mut world, &rig, &volumes, &PointerEvent::end(PointerSource::Mouse));
        assert_eq!(controller.selected(), None);
        assert_eq!(world.body(3).linear_factor, Vec3::ONE);
    }
}
