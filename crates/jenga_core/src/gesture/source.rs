//! Hand frames and the channel tracker bridges feed them through.
//!
//! A device bridge (typically on its own thread, next to the vendor SDK)
//! clones a [`HandTrackingSender`] and pushes one [`HandFrame`] per tracked
//! hand per device frame. The app drains the channel once per render frame.

use async_channel::{Receiver, Sender, TrySendError};
use bevy::prelude::*;

/// The tracker's calibrated volume, used to normalize raw positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionBox {
    /// Center in tracking space (millimetres)
    pub center: Vec3,
    /// Width, height, depth in tracking space
    pub size: Vec3,
}

impl Default for InteractionBox {
    fn default() -> Self {
        Self {
            center: Vec3::new(0.0, 200.0, 0.0),
            size: Vec3::new(235.0, 235.0, 147.0),
        }
    }
}

impl InteractionBox {
    /// Map a tracking-space point to [0, 1] per axis (outside the box maps
    /// outside the range unless `clamp` is set).
    pub fn normalize_point(&self, point: Vec3, clamp: bool) -> Vec3 {
        let normalized = (point - self.center) / self.size + Vec3::splat(0.5);
        if clamp {
            normalized.clamp(Vec3::ZERO, Vec3::ONE)
        } else {
            normalized
        }
    }

    /// Inverse of [`normalize_point`](Self::normalize_point).
    pub fn denormalize_point(&self, normalized: Vec3) -> Vec3 {
        self.center + (normalized - Vec3::splat(0.5)) * self.size
    }
}

/// One tracked hand at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandFrame {
    /// Stabilized palm position in tracking space
    pub palm_position: Vec3,
    /// Pinch confidence in [0, 1]
    pub pinch_strength: f32,
    pub interaction_box: InteractionBox,
}

impl HandFrame {
    /// Palm position in window pixels (x right, y down) plus normalized depth.
    pub fn screen_position(&self, viewport: Vec2) -> Vec3 {
        let n = self.interaction_box.normalize_point(self.palm_position, false);
        Vec3::new(n.x * viewport.x, (1.0 - n.y) * viewport.y, n.z)
    }
}

/// Cloneable handle for pushing frames from a tracker bridge.
#[derive(Clone)]
pub struct HandTrackingSender(Sender<HandFrame>);

impl HandTrackingSender {
    /// Queue a frame. Returns `false` if it was dropped (channel full or closed).
    pub fn send(&self, frame: HandFrame) -> bool {
        match self.0.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Hand frame channel full, dropping frame");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Bounded frame queue between tracker bridges and the app.
#[derive(Resource)]
pub struct HandTrackingChannel {
    sender: Sender<HandFrame>,
    receiver: Receiver<HandFrame>,
}

impl HandTrackingChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = async_channel::bounded(capacity.max(1));
        Self { sender, receiver }
    }

    pub fn sender(&self) -> HandTrackingSender {
        HandTrackingSender(self.sender.clone())
    }

    /// Take every frame queued so far, oldest first.
    pub fn drain(&self) -> Vec<HandFrame> {
        let mut frames = Vec::with_capacity(self.receiver.len());
        while let Ok(frame) = self.receiver.try_recv() {
            frames.push(frame);
        }
        frames
    }
}
