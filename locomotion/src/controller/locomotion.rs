//! Per-frame locomotion: idle settling, moving, jumping and turning.
//!
//! Each routine moves the avatar through the host's collidable move primitive, then
//! classifies what actually happened against what was asked for.

use crate::action::ActionKind;
use crate::constants::{MIN_IDLE_PROBE_DISTANCE, MIN_MOVE_DISTANCE};
use crate::host::Stage;
use crate::slope::SlopeClass;
use crate::step::StepOutcome;
use crate::types::{CameraMode, Contact, Vec3};
use crate::utils::{forward_from_yaw, pov_displacement, vectors_equal, vertical_slope};

use super::{CharacterController, fixed_heading_offset};

impl CharacterController {
    /// Camera heading drives the avatar's yaw.
    fn follows_camera(&self) -> bool {
        self.camera.is_some() && self.mode == CameraMode::ThirdPerson
    }

    /// Face away from the camera (idle and jump).
    fn align_to_camera(&self, stage: &mut dyn Stage) {
        if self.turning_off || !self.follows_camera() {
            return;
        }
        if let Some(camera) = self.camera.as_deref() {
            stage.set_yaw(self.avatar.root, self.facing.yaw_for(camera.alpha()));
        }
    }

    /// 1 if the avatar faces away from the camera, -1 if it faces the camera.
    /// Third person always counts as facing the camera.
    pub(super) fn facing_camera_sign(&self, stage: &dyn Stage) -> f32 {
        let Some(camera) = self.camera.as_deref() else {
            return 1.0;
        };
        if self.mode == CameraMode::ThirdPerson {
            return -1.0;
        }
        let root = self.avatar.root;
        let forward = forward_from_yaw(stage.yaw(root));
        if forward.dot(&(stage.position(root) - camera.position())) < 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    pub(super) fn end_jump(&mut self) {
        self.intent.jump = false;
        self.motion.end_jump();
    }

    pub(super) fn do_idle(&mut self, dt: f32, stage: &mut dyn Stage) -> ActionKind {
        if self.motion.grounded {
            return ActionKind::Idle;
        }
        let m = &mut self.motion;
        m.was_walking = false;
        m.was_running = false;
        m.move_fall.reset();
        m.fall_frames = 0;

        let fall = m.idle_fall.advance(self.gravity, dt);
        if fall < MIN_IDLE_PROBE_DISTANCE {
            return ActionKind::Idle;
        }
        let disp = Vec3::new(0.0, -fall, 0.0);
        self.align_to_camera(stage);

        let root = self.avatar.root;
        stage.move_with_collisions(root, disp);
        let position = stage.position(root);
        let start = self.motion.frame_start;
        let max = self.tuning.ground_frame_max;

        if position.y >= start.y {
            self.motion.ground_frame(max);
            self.motion.contact = Contact::Grounded;
            return ActionKind::Idle;
        }

        let actual = position - start;
        if vectors_equal(&actual, &disp, self.tuning.free_fall_epsilon) {
            self.motion.contact = Contact::FreeFall;
        } else if vertical_slope(&actual) <= self.slope.lower() {
            // walkable: stay put instead of creeping down
            self.motion.ground_frame(max);
            stage.set_position(root, start);
            self.motion.contact = Contact::Grounded;
        } else {
            self.motion.unground();
            self.motion.contact = Contact::Sliding;
            return ActionKind::SlideBack;
        }
        ActionKind::Idle
    }

    /// Moving or falling. `None` keeps the current animation (free fall under the
    /// flicker threshold, blocked turn).
    pub(super) fn do_move(&mut self, dt: f32, stage: &mut dyn Stage) -> Option<ActionKind> {
        let fall = self.motion.move_fall.advance(self.gravity, dt);
        let mut moving = false;
        let mut action = None;

        if self.motion.in_free_fall {
            self.motion.move_vector.y = -fall;
            moving = true;
        }

        self.rotate_to_camera(stage);
        action = self.rotate_with_turn(stage, action, moving, dt);

        if !self.motion.in_free_fall {
            self.motion.was_walking = false;
            self.motion.was_running = false;
            if let Some((kind, move_vector)) = self.planar_move(stage, fall, dt) {
                action = Some(kind);
                self.motion.move_vector = move_vector;
                moving = true;
            }
        }

        if !moving || self.motion.move_vector.norm() <= MIN_MOVE_DISTANCE {
            return action;
        }

        let root = self.avatar.root;
        let desired = self.motion.move_vector;
        stage.move_with_collisions(root, desired);
        let start = self.motion.frame_start;
        let actual = stage.position(root) - start;
        let class = self
            .slope
            .classify(&actual, &desired, self.tuning.free_fall_epsilon);
        log::trace!("move {desired:?} -> {actual:?}: {class:?}");

        let m = &mut self.motion;
        if class != SlopeClass::StepOrWall {
            m.step.reset();
        }
        match class {
            SlopeClass::StepOrWall => match m.step.on_steep_rise(self.step_offset, start, actual.y) {
                StepOutcome::Climb => m.contact = Contact::Stepping,
                StepOutcome::Rollback(to) => {
                    stage.set_position(root, to);
                    m.end_free_fall();
                    m.contact = Contact::Blocked;
                }
            },
            SlopeClass::Steep => {
                // keep the fall clock running to slow the climb down
                m.hold_on_slope();
                m.contact = Contact::Steep;
            }
            SlopeClass::Ground | SlopeClass::WalkDown => {
                m.end_free_fall();
                m.contact = Contact::Grounded;
            }
            SlopeClass::Sliding => {
                m.hold_on_slope();
                m.contact = Contact::Sliding;
            }
            SlopeClass::FreeFall => {
                m.in_free_fall = true;
                m.fall_frames = m.fall_frames.saturating_add(1);
                m.contact = Contact::FreeFall;
                // running downhill alternates between free fall and ground
                if m.fall_frames > self.tuning.fall_frame_min {
                    action = Some(ActionKind::Fall);
                }
            }
        }
        action
    }

    /// Profile and displacement for this frame's strafe, walk or walk-back.
    fn planar_move(&mut self, stage: &dyn Stage, fall: f32, dt: f32) -> Option<(ActionKind, Vec3)> {
        let intent = self.intent;
        let fast = intent.speed_modifier;
        let yaw = stage.yaw(self.avatar.root);
        let ff = self.facing.ff_sign;
        let speed = |kind: ActionKind| self.table.get(kind).speed * dt;

        if intent.strafe_left || intent.strafe_right {
            let facing = self.facing.strafe_sign * self.facing_camera_sign(stage);
            let (sign, slow, quick) = if intent.strafe_left {
                (facing, ActionKind::StrafeLeft, ActionKind::StrafeLeftFast)
            } else {
                (-facing, ActionKind::StrafeRight, ActionKind::StrafeRightFast)
            };
            let dist = speed(if fast { quick } else { slow });
            let left = -ff * sign > 0.0;
            let kind = match (left, fast) {
                (true, false) => ActionKind::StrafeLeft,
                (true, true) => ActionKind::StrafeLeftFast,
                (false, false) => ActionKind::StrafeRight,
                (false, true) => ActionKind::StrafeRightFast,
            };
            return Some((kind, pov_displacement(yaw, sign * dist, -fall, 0.0)));
        }

        if intent.walk || (self.turning_off && self.mode == CameraMode::ThirdPerson) {
            let kind = if fast {
                self.motion.was_running = true;
                ActionKind::Run
            } else {
                self.motion.was_walking = true;
                ActionKind::Walk
            };
            return Some((kind, pov_displacement(yaw, 0.0, -fall, ff * speed(kind))));
        }

        if intent.walk_back {
            let kind = if fast {
                ActionKind::WalkBackFast
            } else {
                ActionKind::WalkBack
            };
            return Some((kind, pov_displacement(yaw, 0.0, -fall, -ff * speed(kind))));
        }
        None
    }

    /// Third person: yaw follows the camera heading, or one of the fixed headings
    /// when turning is off.
    fn rotate_to_camera(&self, stage: &mut dyn Stage) {
        if !self.follows_camera() {
            return;
        }
        let Some(camera) = self.camera.as_deref() else {
            return;
        };
        let heading = self.facing.yaw_for(camera.alpha());
        let yaw = if self.turning_off {
            let i = &self.intent;
            match fixed_heading_offset(
                i.walk,
                i.walk_back,
                i.turn_left,
                i.turn_right,
                self.facing.rhs_sign,
            ) {
                Some(offset) => heading + offset,
                None => return,
            }
        } else {
            heading
        };
        stage.set_yaw(self.avatar.root, yaw);
    }

    /// Apply turn intent. In third person the camera orbits by the same angle; in
    /// top-down the turn direction is latched for the whole gesture.
    fn rotate_with_turn(
        &mut self,
        stage: &mut dyn Stage,
        mut action: Option<ActionKind>,
        moving: bool,
        dt: f32,
    ) -> Option<ActionKind> {
        let i = self.intent;
        if (self.turning_off && self.mode == CameraMode::ThirdPerson)
            || i.is_strafing()
            || !i.is_turning()
        {
            return action;
        }
        let mut turn = self.table.get(ActionKind::TurnLeft).speed * dt;
        if i.speed_modifier {
            turn *= 2.0;
        }

        let direction = if self.mode == CameraMode::TopDown {
            if !self.motion.is_turning {
                // a turn may take the avatar from facing away to facing the camera;
                // keep the direction it started with
                let mut sign = -self.facing.ff_sign * self.facing_camera_sign(stage);
                if self.facing.flipped {
                    sign = -sign;
                }
                self.motion.turn_sign = sign;
                self.motion.is_turning = true;
            }
            let s = self.motion.turn_sign;
            let towards = |positive, negative| if s > 0.0 { positive } else { negative };
            if i.turn_left {
                if i.walk {
                    s
                } else if i.walk_back {
                    -s
                } else {
                    action = Some(towards(ActionKind::TurnRight, ActionKind::TurnLeft));
                    s
                }
            } else if i.walk {
                -s
            } else if i.walk_back {
                s
            } else {
                action = Some(towards(ActionKind::TurnLeft, ActionKind::TurnRight));
                -s
            }
        } else {
            let mut a = 1.0;
            if i.turn_left {
                if i.walk_back {
                    a = -1.0;
                }
                if !moving {
                    action = Some(ActionKind::TurnLeft);
                }
            } else {
                if i.walk {
                    a = -1.0;
                }
                if !moving {
                    a = -1.0;
                    action = Some(ActionKind::TurnRight);
                }
                if i.walk_back {
                    a = 1.0;
                }
            }
            if let Some(camera) = self.camera.as_deref_mut() {
                camera.set_alpha(camera.alpha() + self.facing.rhs_sign * turn * a);
            }
            a
        };

        let root = self.avatar.root;
        stage.set_yaw(root, stage.yaw(root) + turn * direction);
        action
    }

    pub(super) fn do_jump(&mut self, dt: f32, stage: &mut dyn Stage) -> ActionKind {
        let root = self.avatar.root;
        self.motion.jump.launch(stage.position(root).y);
        self.align_to_camera(stage);

        let m = &mut self.motion;
        let (mut action, disp) = if m.was_running || m.was_walking {
            let carried = if m.was_running {
                ActionKind::Run
            } else {
                ActionKind::Walk
            };
            let forward = self.table.get(carried).speed * dt;
            let planar = Vec3::new(m.move_vector.x, 0.0, m.move_vector.z)
                .try_normalize(f32::EPSILON)
                .unwrap_or_else(Vec3::zeros)
                * forward;
            let rise = m
                .jump
                .advance(self.table.get(ActionKind::RunJump).speed, self.gravity, dt);
            (ActionKind::RunJump, Vec3::new(planar.x, rise, planar.z))
        } else {
            let rise = m
                .jump
                .advance(self.table.get(ActionKind::IdleJump).speed, self.gravity, dt);
            (ActionKind::IdleJump, Vec3::new(0.0, rise, 0.0))
        };
        m.contact = Contact::Jumping;

        if disp.norm() > MIN_MOVE_DISTANCE {
            stage.move_with_collisions(root, disp);
        }
        if disp.y >= 0.0 {
            return action;
        }

        // descending
        let position = stage.position(root);
        let start = self.motion.frame_start;
        if position.y > start.y || (position.y == start.y && disp.norm() > MIN_MOVE_DISTANCE) {
            self.end_jump();
            self.motion.contact = Contact::Grounded;
        } else if position.y < self.motion.jump.start_height {
            let actual = position - start;
            if vectors_equal(&actual, &disp, self.tuning.free_fall_epsilon) {
                action = ActionKind::Fall;
                self.motion.contact = Contact::FreeFall;
            } else if vertical_slope(&actual) <= self.slope.lower() {
                self.end_jump();
                self.motion.contact = Contact::Grounded;
            }
        }
        action
    }
}
