/*!
Follow-camera rig.

Every frame the orbit camera's target follows the avatar (plus a configurable offset).
Geometry between the target and the camera is then dealt with in one or both ways:

- hide policy: occluders are made invisible while they block the view and restored
  once they no longer do;
- elastic policy: the camera eases in front of the first blocking object, closing a
  fixed fraction of the gap per frame and snapping when it gets close.

Pulling the camera down to its lower radius limit switches to first person: the avatar
is hidden and camera collisions are suspended until the radius grows again.
*/

use nalgebra as na;

use crate::constants::{DEFAULT_CAMERA_SKIN, DEFAULT_ELASTIC_STEPS, ELASTIC_SNAP_DISTANCE};
use crate::host::{OrbitCamera, Stage};
use crate::types::{NodeId, PickHit, PickRay, Vec3};

/// A first-person transition that happened during `CameraRig::follow`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FirstPersonChange {
    Entered,
    Exited,
}

#[derive(Clone, Debug)]
pub struct CameraRig {
    /// Added to the avatar position to get the camera target.
    pub target_offset: Vec3,
    pub elastic: bool,
    pub elastic_steps: u32,
    pub hide_occluders: bool,
    pub no_first_person: bool,
    /// Gap kept between the camera and the object it was pulled in front of.
    pub skin: f32,
    hidden: Vec<NodeId>,
    in_first_person: bool,
    saved_collision: bool,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            target_offset: Vec3::zeros(),
            elastic: true,
            elastic_steps: DEFAULT_ELASTIC_STEPS,
            hide_occluders: false,
            no_first_person: false,
            skin: DEFAULT_CAMERA_SKIN,
            hidden: Vec::new(),
            in_first_person: false,
            saved_collision: true,
        }
    }
}

impl CameraRig {
    pub fn new(camera: Option<&dyn OrbitCamera>) -> Self {
        Self {
            saved_collision: camera.is_none_or(|c| c.check_collisions()),
            ..Self::default()
        }
    }

    pub fn in_first_person(&self) -> bool {
        self.in_first_person
    }

    /// Nodes currently hidden by the hide policy.
    pub fn hidden(&self) -> &[NodeId] {
        &self.hidden
    }

    /// Re-read the camera's collision flag after the host changed it.
    pub fn camera_collision_changed(&mut self, camera: &dyn OrbitCamera) {
        self.saved_collision = camera.check_collisions();
    }

    /// Per-frame camera update.
    ///
    /// `hold_target` keeps the target still (the avatar is climbing a step).
    pub fn follow(
        &mut self,
        camera: &mut dyn OrbitCamera,
        stage: &mut dyn Stage,
        avatar: NodeId,
        hold_target: bool,
    ) -> Option<FirstPersonChange> {
        if !hold_target {
            camera.set_target(stage.position(avatar) + self.target_offset);
        }

        let limit = camera.lower_radius_limit();
        if camera.radius() > limit && (self.elastic || self.hide_occluders) {
            self.handle_obstruction(camera, stage, avatar);
        }

        if camera.radius() <= limit {
            if !self.no_first_person && !self.in_first_person {
                stage.set_visible(avatar, false);
                camera.set_check_collisions(false);
                self.in_first_person = true;
                log::debug!("camera entered first person");
                return Some(FirstPersonChange::Entered);
            }
        } else if self.in_first_person {
            stage.set_visible(avatar, true);
            camera.set_check_collisions(self.saved_collision);
            self.in_first_person = false;
            log::debug!("camera left first person");
            return Some(FirstPersonChange::Exited);
        }
        None
    }

    fn handle_obstruction(
        &mut self,
        camera: &mut dyn OrbitCamera,
        stage: &mut dyn Stage,
        avatar: NodeId,
    ) {
        let origin = camera.target();
        let to_camera = camera.position() - origin;
        let length = to_camera.norm();
        let Some(direction) = to_camera.try_normalize(f32::EPSILON) else {
            return;
        };
        let mut hits = stage.multi_pick(
            &PickRay {
                origin,
                direction,
                length,
            },
            avatar,
        );
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        if self.hide_occluders {
            self.hide(&hits, stage);
        }
        if self.elastic {
            self.pull_in(&hits, camera, &*stage);
        }
    }

    fn hide(&mut self, hits: &[PickHit], stage: &mut dyn Stage) {
        let previous = std::mem::take(&mut self.hidden);
        for hit in hits {
            if self.hidden.contains(&hit.node) {
                continue;
            }
            if stage.is_visible(hit.node) || previous.contains(&hit.node) {
                stage.set_visible(hit.node, false);
                self.hidden.push(hit.node);
            }
        }
        for node in previous {
            if !self.hidden.contains(&node) {
                stage.set_visible(node, true);
            }
        }
    }

    fn pull_in(&self, hits: &[PickHit], camera: &mut dyn OrbitCamera, stage: &dyn Stage) {
        let Some(first) = hits.first() else {
            return;
        };
        if hits.len() == 1
            && !stage.is_see_able(first.node)
            && (!stage.is_collidable(first.node) || !camera.check_collisions())
        {
            return;
        }
        let Some(pivot) = hits
            .iter()
            .find(|h| stage.is_see_able(h.node) || stage.is_collidable(h.node))
            .map(|h| h.point)
        else {
            return;
        };

        let c2p = camera.position() - pivot;
        let l = c2p.norm();
        let steps = self.elastic_steps.max(1) as f32;
        if camera.check_collisions() {
            let dir = c2p.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::zeros);
            let step = if l <= ELASTIC_SNAP_DISTANCE {
                c2p + dir * self.skin
            } else {
                dir * (l / steps)
            };
            camera.set_position(camera.position() - step);
        } else {
            let step = if l <= ELASTIC_SNAP_DISTANCE {
                l + self.skin
            } else {
                l / steps
            };
            camera.set_radius(camera.radius() - step);
        }
    }
}

/// A plain arc-rotate camera: spherical coordinates around a target.
///
/// `alpha` is measured in the XZ plane from +X towards +Z, `beta` from +Y.
#[derive(Clone, Debug, PartialEq)]
pub struct ArcCamera {
    pub alpha: f32,
    pub beta: f32,
    pub radius: f32,
    pub target: Vec3,
    pub lower_radius_limit: f32,
    pub check_collisions: bool,
    /// Player orbit input is attached.
    pub user_input: bool,
}

impl ArcCamera {
    pub fn new(alpha: f32, beta: f32, radius: f32, target: Vec3) -> Self {
        Self {
            alpha,
            beta,
            radius,
            target,
            lower_radius_limit: 0.0,
            check_collisions: false,
            user_input: true,
        }
    }
}

impl OrbitCamera for ArcCamera {
    fn alpha(&self) -> f32 {
        self.alpha
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    fn radius(&self) -> f32 {
        self.radius
    }

    fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(self.lower_radius_limit);
    }

    fn lower_radius_limit(&self) -> f32 {
        self.lower_radius_limit
    }

    fn position(&self) -> Vec3 {
        let (sa, ca) = self.alpha.sin_cos();
        let (sb, cb) = self.beta.sin_cos();
        self.target + Vec3::new(ca * sb, cb, sa * sb) * self.radius
    }

    fn set_position(&mut self, position: Vec3) {
        let d = position - self.target;
        let radius = d.norm();
        if radius <= f32::EPSILON {
            self.radius = 0.0;
            return;
        }
        self.radius = radius;
        self.alpha = d.z.atan2(d.x);
        self.beta = na::clamp(d.y / radius, -1.0, 1.0).acos();
    }

    fn target(&self) -> Vec3 {
        self.target
    }

    fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    fn check_collisions(&self) -> bool {
        self.check_collisions
    }

    fn set_check_collisions(&mut self, check: bool) {
        self.check_collisions = check;
    }

    fn set_user_input(&mut self, attached: bool) {
        self.user_input = attached;
    }

    fn user_input(&self) -> bool {
        self.user_input
    }
}
