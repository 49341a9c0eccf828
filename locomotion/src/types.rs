/*!
Core types and math aliases shared by the controller modules.

This module intentionally contains no algorithms. It defines the data exchanged between:
- the host (scene graph, move-with-collision, ray picks)
- the locomotion state machine
- the camera rig
- the animation/sound selector
*/

use nalgebra as na;
use serde::{Deserialize, Serialize};

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Rot3 = na::Rotation3<f32>;

/// Opaque handle to a node of the host scene graph (mesh, transform node, ...).
///
/// The host decides what the number means; the controller only compares and forwards it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Handle to a sound registered with the controller via `CharacterController::add_sound`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundId(pub u32);

/// A ray used for the camera obstruction query.
///
/// `direction` is unit length; hits farther than `length` are ignored.
#[derive(Clone, Copy, Debug)]
pub struct PickRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: f32,
}

/// A single ray intersection reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickHit {
    /// Node that was hit.
    pub node: NodeId,
    /// World-space hit point.
    pub point: Vec3,
    /// Distance from the ray origin to `point`.
    pub distance: f32,
}

/// How the controller interprets camera and avatar orientation.
///
/// - `ThirdPerson`: rotating the camera around the avatar rotates the avatar too.
/// - `TopDown`: camera direction has no bearing on avatar movement (isometric games, NPCs).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CameraMode {
    #[default]
    ThirdPerson,
    TopDown,
}

/// Per-frame vertical contact classification of the avatar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Contact {
    /// Resting on or walking over walkable ground.
    #[default]
    Grounded,
    /// Walking up a slope steeper than the lower limit but below the upper limit.
    Steep,
    /// Truncated downward motion along a slope steeper than the lower limit.
    Sliding,
    /// Downward motion with no support at all.
    FreeFall,
    /// Rising over a step lower than the step offset.
    Stepping,
    /// Blocked by a wall or a step higher than the step offset; position rolled back.
    Blocked,
    /// Airborne in a jump.
    Jumping,
}
