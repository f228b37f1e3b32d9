//! Tower layout: where every block starts.
//!
//! Blocks are stacked in rows of `columns` blocks. Even rows are turned a
//! quarter turn about Y and spread along X; odd rows keep their long axis on X
//! and are spread along Z, giving the usual crossed lattice.

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Yaw of the even rows.
///
/// Slightly short of a right angle: blocks at exactly PI/2 misbehave in the
/// solver, and the cause has not been tracked down yet.
pub const ROTATED_ROW_YAW: f32 = PI / 2.01;

/// Dimensions and arrangement of the tower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerLayout {
    pub rows: u32,
    pub columns: u32,
    /// Block size along its long axis (local X)
    pub block_length: f32,
    /// Block size along Y
    pub block_height: f32,
    /// Block size along local Z
    pub block_width: f32,
    /// Center-to-center distance between blocks in a row
    pub spacing: f32,
    /// Yaw applied to even rows
    pub rotated_yaw: f32,
}

impl Default for TowerLayout {
    fn default() -> Self {
        Self {
            rows: 16,
            columns: 3,
            block_length: 6.0,
            block_height: 1.0,
            block_width: 1.5,
            spacing: 2.0,
            rotated_yaw: ROTATED_ROW_YAW,
        }
    }
}

/// Initial pose of one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockPlacement {
    pub row: u32,
    pub column: u32,
    pub translation: Vec3,
    pub rotation: Quat,
    /// Yaw in radians (the rotation about Y)
    pub yaw: f32,
}

impl TowerLayout {
    pub fn block_count(&self) -> usize {
        (self.rows * self.columns) as usize
    }

    /// Half-extents of a block in its local frame.
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.block_length, self.block_height, self.block_width) * 0.5
    }

    /// Full size of a block, for building meshes.
    pub fn block_size(&self) -> Vec3 {
        self.half_extents() * 2.0
    }

    /// Lateral offset of a column, centered on the tower axis.
    fn column_offset(&self, column: u32) -> f32 {
        let count = self.columns as f32;
        self.spacing * column as f32 - (self.spacing * count / 2.0 - self.spacing / 2.0)
    }

    /// Starting poses, bottom row first, columns in order.
    pub fn placements(&self) -> Vec<BlockPlacement> {
        let mut placements = Vec::with_capacity(self.block_count());
        for row in 0..self.rows {
            let y = self.block_height / 2.0 + self.block_height * row as f32;
            for column in 0..self.columns {
                let offset = self.column_offset(column);
                let (translation, yaw) = if row % 2 == 0 {
                    (Vec3::new(offset, y, 0.0), self.rotated_yaw)
                } else {
                    (Vec3::new(0.0, y, offset), 0.0)
                };
                placements.push(BlockPlacement {
                    row,
                    column,
                    translation,
                    rotation: Quat::from_rotation_y(yaw),
                    yaw,
                });
            }
        }
        placements
    }

    /// Height of the top face of the tower.
    pub fn height(&self) -> f32 {
        self.block_height * self.rows as f32
    }

    /// Center of the middle block in the top row.
    pub fn top_center(&self) -> Vec3 {
        let row = self.rows.saturating_sub(1);
        let y = self.block_height / 2.0 + self.block_height * row as f32;
        Vec3::new(0.0, y, 0.0)
    }
}
