//! Ray queries against pickable blocks and the invisible drag plane.

use bevy::math::bounding::{Aabb3d, RayCast3d};
use bevy::prelude::*;

/// Oriented box that can be picked, tagged with the body it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickVolume<B> {
    pub body: B,
    pub center: Vec3,
    pub rotation: Quat,
    pub half_extents: Vec3,
}

/// Where a ray hit a pick volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit<B> {
    pub body: B,
    /// Ray parameter (distance along the normalized ray)
    pub distance: f32,
    pub point: Vec3,
}

impl<B: Copy> PickVolume<B> {
    /// Distance along `ray` to the entry point, if the ray hits from outside.
    pub fn intersect(&self, ray: Ray3d) -> Option<f32> {
        // Work in the box frame, where it is axis aligned at the origin.
        let inverse = self.rotation.inverse();
        let local_origin = inverse * (ray.origin - self.center);
        let local_direction = Dir3::new(inverse * *ray.direction).ok()?;

        let cast = RayCast3d::new(local_origin, local_direction, f32::MAX);
        let aabb = Aabb3d::new(Vec3::ZERO, self.half_extents);
        cast.aabb_intersection_at(&aabb).filter(|t| *t > 0.0)
    }
}

/// Nearest volume along the ray (smallest positive ray parameter).
///
/// Ties keep the volume listed first.
pub fn cast_nearest<B: Copy>(volumes: &[PickVolume<B>], ray: Ray3d) -> Option<PickHit<B>> {
    let mut nearest: Option<PickHit<B>> = None;
    for volume in volumes {
        let Some(distance) = volume.intersect(ray) else {
            continue;
        };
        if nearest.is_none_or(|hit| distance < hit.distance) {
            nearest = Some(PickHit {
                body: volume.body,
                distance,
                point: ray.get_point(distance),
            });
        }
    }
    nearest
}

/// Large invisible horizontal plane the drag cursor slides on.
///
/// It is moved to the height of each grab so the cursor stays level with the
/// grab point. Only its upper face is hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub height: f32,
    /// Half the side length of the square plane
    pub half_size: f32,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::with_size(150.0)
    }
}

impl GroundPlane {
    pub fn with_size(size: f32) -> Self {
        Self {
            height: 0.0,
            half_size: size * 0.5,
        }
    }

    /// Point where `ray` meets the plane from above, inside its extent.
    pub fn intersect(&self, ray: Ray3d) -> Option<Vec3> {
        if ray.direction.y >= 0.0 {
            return None;
        }
        let origin = Vec3::new(0.0, self.height, 0.0);
        let distance = ray.intersect_plane(origin, InfinitePlane3d::new(Vec3::Y))?;
        let point = ray.get_point(distance);
        if point.x.abs() > self.half_size || point.z.abs() > self.half_size {
            return None;
        }
        Some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn down_ray(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 100.0, z), Dir3::NEG_Y)
    }

    fn unit_box(body: u32, center: Vec3) -> PickVolume<u32> {
        PickVolume {
            body,
            center,
            rotation: Quat::IDENTITY,
            half_extents: Vec3::splat(0.5),
        }
    }

    #[test]
    fn test_cast_nearest_picks_smallest_distance() {
        let volumes = vec![
            unit_box(1, Vec3::new(0.0, 0.0, 0.0)),
            unit_box(2, Vec3::new(0.0, 5.0, 0.0)),
            unit_box(3, Vec3::new(0.0, 2.0, 0.0)),
        ];
        let hit = cast_nearest(&volumes, down_ray(0.0, 0.0)).unwrap();
        assert_eq!(hit.body, 2);
        assert!((hit.point.y - 5.5).abs() < 1e-4);
        assert!((hit.distance - 94.5).abs() < 1e-3);
    }

    #[test]
    fn test_cast_nearest_tie_keeps_first_listed() {
        let volumes = vec![
            unit_box(7, Vec3::new(0.0, 3.0, 0.0)),
            unit_box(8, Vec3::new(0.0, 3.0, 0.0)),
        ];
        let hit = cast_nearest(&volumes, down_ray(0.0, 0.0)).unwrap();
        assert_eq!(hit.body, 7);
    }

    #[test]
    fn test_cast_nearest_miss() {
        let volumes = vec![unit_box(1, Vec3::ZERO)];
        assert!(cast_nearest(&volumes, down_ray(3.0, 0.0)).is_none());
        assert!(cast_nearest::<u32>(&[], down_ray(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_ray_pointing_away_misses() {
        let volumes = vec![unit_box(1, Vec3::ZERO)];
        let ray = Ray3d::new(Vec3::new(0.0, 10.0, 0.0), Dir3::Y);
        assert!(cast_nearest(&volumes, ray).is_none());
    }

    #[test]
    fn test_rotated_box_uses_its_orientation() {
        // Long on local X, turned a quarter about Y so it is long on Z
        let volume = PickVolume {
            body: 7u32,
            center: Vec3::ZERO,
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
            half_extents: Vec3::new(3.0, 0.5, 0.75),
        };
        assert!(volume.intersect(down_ray(0.0, 2.5)).is_some());
        assert!(volume.intersect(down_ray(2.5, 0.0)).is_none());
    }

    #[test]
    fn test_ground_plane_hit_at_height() {
        let plane = GroundPlane {
            height: 4.0,
            half_size: 75.0,
        };
        let ray = Ray3d::new(Vec3::new(10.0, 20.0, 10.0), Dir3::new(Vec3::new(-1.0, -1.0, 0.0)).unwrap());
        let point = plane.intersect(ray).unwrap();
        assert!((point.y - 4.0).abs() < 1e-4);
        assert!((point.x - -6.0).abs() < 1e-4);
    }

    #[test]
    fn test_ground_plane_misses_outside_extent() {
        let plane = GroundPlane::with_size(10.0);
        assert!(plane.intersect(down_ray(6.0, 0.0)).is_none());
        assert!(plane.intersect(down_ray(4.0, 4.0)).is_some());
    }

    #[test]
    fn test_ground_plane_ignores_rays_from_below() {
        let plane = GroundPlane::default();
        let ray = Ray3d::new(Vec3::new(0.0, -10.0, 0.0), Dir3::Y);
        assert!(plane.intersect(ray).is_none());
    }
}
