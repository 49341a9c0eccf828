//! Avatar-to-camera orientation conventions.

use std::f32::consts::{FRAC_PI_2, PI};

/// Signs and offsets that turn camera angles into avatar yaw.
///
/// Camera alpha is measured anticlockwise, avatar yaw clockwise. In third person the
/// avatar is aligned with `av2cam - alpha` so the camera looks at its back.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Facing {
    /// The avatar's face points along its local +Z.
    pub face_forward: bool,
    pub av2cam: f32,
    /// Sign applied to forward displacements.
    pub ff_sign: f32,
    /// The avatar's basis has the opposite handedness of the scene.
    pub flipped: bool,
    /// Sign applied to strafe displacements.
    pub strafe_sign: f32,
    /// Sign applied to camera rotation; -1 in right-handed scenes.
    pub rhs_sign: f32,
    right_handed: bool,
}

impl Facing {
    pub fn new(face_forward: bool, has_camera: bool, flipped: bool, right_handed: bool) -> Self {
        let (av2cam, ff_sign) = match (has_camera, flipped, face_forward) {
            (false, _, _) => (0.0, 1.0),
            (true, true, true) => (FRAC_PI_2, 1.0),
            (true, true, false) => (3.0 * FRAC_PI_2, -1.0),
            (true, false, true) => (3.0 * FRAC_PI_2, -1.0),
            (true, false, false) => (FRAC_PI_2, 1.0),
        };
        Self {
            face_forward,
            av2cam,
            ff_sign,
            flipped,
            strafe_sign: if flipped { 1.0 } else { -1.0 },
            rhs_sign: if right_handed { -1.0 } else { 1.0 },
            right_handed,
        }
    }

    /// Same scene and avatar, different face direction.
    pub fn with_face_forward(&self, face_forward: bool, has_camera: bool) -> Self {
        Self::new(face_forward, has_camera, self.flipped, self.right_handed)
    }

    /// Yaw that puts the camera behind the avatar.
    #[inline]
    pub fn yaw_for(&self, alpha: f32) -> f32 {
        self.av2cam - alpha
    }
}

/// Yaw offset from the camera heading when turning is off: turn keys face sideways,
/// walk-back faces the camera.
pub fn fixed_heading_offset(
    walk: bool,
    walk_back: bool,
    turn_left: bool,
    turn_right: bool,
    rhs_sign: f32,
) -> Option<f32> {
    let quarter = PI / 4.0;
    match (walk, walk_back, turn_left, turn_right) {
        (true, _, _, true) => Some(rhs_sign * quarter),
        (true, _, true, _) => Some(-rhs_sign * quarter),
        (_, true, _, true) => Some(rhs_sign * 3.0 * quarter),
        (_, true, true, _) => Some(-rhs_sign * 3.0 * quarter),
        (true, _, _, _) => Some(0.0),
        (_, true, _, _) => Some(PI),
        (_, _, _, true) => Some(rhs_sign * FRAC_PI_2),
        (_, _, true, _) => Some(-rhs_sign * FRAC_PI_2),
        _ => None,
    }
}
