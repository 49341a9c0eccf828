/*!
Host interfaces.

The controller never owns the scene. Everything it needs from the engine (transforms,
the collidable move primitive, ray picks, visibility, the orbit camera and sounds) is
reached through these traits. `crate::rapier::RapierStage` is the bundled implementation
of `Stage`; `crate::camera::ArcCamera` is a plain `OrbitCamera`.
*/

use crate::types::{NodeId, PickHit, PickRay, Vec3};

/// Read-only view of the scene hierarchy.
pub trait SceneGraph {
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    /// The node can be moved with collisions.
    fn is_mesh(&self, node: NodeId) -> bool;
    fn has_skeleton(&self, node: NodeId) -> bool;
}

/// The scene the avatar lives in.
pub trait Stage: SceneGraph {
    fn position(&self, node: NodeId) -> Vec3;
    fn set_position(&mut self, node: NodeId, position: Vec3);

    /// Rotation about the world up axis, radians.
    fn yaw(&self, node: NodeId) -> f32;
    fn set_yaw(&mut self, node: NodeId, yaw: f32);

    /// Move `node` by `displacement`, sliding along and stopping at colliders.
    fn move_with_collisions(&mut self, node: NodeId, displacement: Vec3);

    /// Every node hit by `ray` except `exclude`, nearest first.
    fn multi_pick(&self, ray: &PickRay, exclude: NodeId) -> Vec<PickHit>;

    fn is_visible(&self, node: NodeId) -> bool;
    fn set_visible(&mut self, node: NodeId, visible: bool);

    /// The node actually shows up on screen (visible, not fully transparent, ...).
    fn is_see_able(&self, node: NodeId) -> bool {
        self.is_visible(node)
    }

    /// The node takes part in camera collisions.
    fn is_collidable(&self, node: NodeId) -> bool;

    /// The node's local basis has the opposite handedness of the scene
    /// (`x × y` points against local z).
    fn handedness_flipped(&self, _node: NodeId) -> bool {
        false
    }

    /// The scene uses a right-handed coordinate system.
    fn right_handed(&self) -> bool {
        false
    }
}

/// A camera orbiting a target point.
///
/// `alpha` is the longitudinal angle, measured anticlockwise; avatar yaw is measured
/// clockwise.
pub trait OrbitCamera {
    fn alpha(&self) -> f32;
    fn set_alpha(&mut self, alpha: f32);
    fn radius(&self) -> f32;
    fn set_radius(&mut self, radius: f32);
    /// Closest allowed radius, 0 when unlimited.
    fn lower_radius_limit(&self) -> f32;
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn target(&self) -> Vec3;
    fn set_target(&mut self, target: Vec3);
    fn check_collisions(&self) -> bool;
    fn set_check_collisions(&mut self, check: bool);
    /// Attach or detach the player's orbit input (mouse, touch, gamepad).
    fn set_user_input(&mut self, _attached: bool) {}
    fn user_input(&self) -> bool {
        true
    }
}

/// A loaded sound.
pub trait SoundHandle {
    fn play(&mut self);
    fn stop(&mut self);
    fn set_loop(&mut self, looped: bool);
    /// Make the sound spatial, following `node`.
    fn attach_to(&mut self, _node: NodeId) {}
}
