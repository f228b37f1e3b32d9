//! Device-independent pointer input.
//!
//! Mouse and hand tracker both end up as [`PointerEvent`]s carrying a
//! [`PointerSample`] in normalized device coordinates, so the drag logic never
//! sees which device produced them.

use bevy::prelude::*;

/// Depth used when the device reports none (the far end of the range).
pub const FULL_DEPTH: f32 = 1.0;

/// One pointer position in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// x and y in [-1, 1], +y up
    pub ndc: Vec2,
    /// Normalized depth; gesture input has it, mouse input does not
    pub depth: Option<f32>,
}

impl PointerSample {
    pub fn new(ndc: Vec2) -> Self {
        Self { ndc, depth: None }
    }

    pub fn with_depth(ndc: Vec2, depth: f32) -> Self {
        Self {
            ndc,
            depth: Some(depth),
        }
    }

    /// Sample from a window-space pixel position.
    pub fn from_screen(screen: Vec2, viewport: Vec2, depth: Option<f32>) -> Self {
        Self {
            ndc: screen_to_ndc(screen, viewport),
            depth,
        }
    }

    /// Depth to unproject at.
    pub fn depth_or_full(&self) -> f32 {
        self.depth.unwrap_or(FULL_DEPTH)
    }
}

/// Convert a pixel position (origin top-left, +y down) to NDC.
pub fn screen_to_ndc(screen: Vec2, viewport: Vec2) -> Vec2 {
    Vec2::new(
        (screen.x / viewport.x) * 2.0 - 1.0,
        -(screen.y / viewport.y) * 2.0 + 1.0,
    )
}

/// Systems that turn device input into [`PointerEvent`]s.
///
/// Consumers of pointer events run after this set.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointerInputSet;

/// Which adapter produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerSource {
    Mouse,
    Gesture,
}

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerPhase {
    /// Contact started: try to pick a block
    Begin(PointerSample),
    /// Contact continues: move the drag target
    Update(PointerSample),
    /// Contact ended: let go
    End,
}

/// A pointer event from either input adapter.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub source: PointerSource,
    pub phase: PointerPhase,
}

impl PointerEvent {
    pub fn begin(source: PointerSource, sample: PointerSample) -> Self {
        Self {
            source,
            phase: PointerPhase::Begin(sample),
        }
    }

    pub fn update(source: PointerSource, sample: PointerSample) -> Self {
        Self {
            source,
            phase: PointerPhase::Update(sample),
        }
    }

    pub fn end(source: PointerSource) -> Self {
        Self {
            source,
            phase: PointerPhase::End,
        }
    }
}
