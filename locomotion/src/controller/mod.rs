/*!
The character controller.

`CharacterController` owns the locomotion state of one avatar: intent, action profiles,
motion scalars, the camera rig and the animation/sound selection. The host owns the
scene and hands it in every frame:

```text
host frame hook ──► update(dt, stage)
                      ├─ jump / move / idle           (locomotion.rs)
                      ├─ animation + sound selection  (selector)
                      └─ camera follow                (camera rig)
```

`update` does nothing until `start()`; `stop()` makes it inert again.
*/

mod facing;
mod locomotion;

#[cfg(test)]
mod tests;

pub use facing::{Facing, fixed_heading_offset};

use crate::action::{ActionKind, ActionMap, ActionTable};
use crate::animation::{AnimationSource, ClipGroup, GroupAnimations, RangeAnimations, Skeleton};
use crate::camera::{CameraRig, FirstPersonChange};
use crate::constants::{DEFAULT_GRAVITY, DEFAULT_STEP_OFFSET};
use crate::error::Result;
use crate::host::{OrbitCamera, SoundHandle, Stage};
use crate::input::{KeyCommand, Keyboard};
use crate::intent::Intent;
use crate::motion::MotionState;
use crate::scene::AvatarRig;
use crate::selector::{ActionSelector, SoundBank};
use crate::settings::{Settings, Speeds, Tuning};
use crate::slope::SlopeLimits;
use crate::types::{CameraMode, Contact, NodeId, SoundId, Vec3};

pub struct CharacterController {
    avatar: AvatarRig,
    camera: Option<Box<dyn OrbitCamera>>,
    anims: Option<Box<dyn AnimationSource>>,
    sounds: SoundBank,
    step_sound: Option<SoundId>,
    table: ActionTable,
    intent: Intent,
    motion: MotionState,
    rig: CameraRig,
    selector: ActionSelector,
    keyboard: Keyboard,
    facing: Facing,
    mode: CameraMode,
    /// Mode to restore when leaving first person.
    saved_mode: CameraMode,
    turning_off: bool,
    gravity: f32,
    slope: SlopeLimits,
    step_offset: f32,
    tuning: Tuning,
    /// Last profile chosen by the state machine.
    action: Option<ActionKind>,
    started: bool,
    /// The player may orbit the camera.
    camera_control: bool,
}

impl CharacterController {
    /// Control the hierarchy containing `avatar`, whose root must be a mesh.
    ///
    /// Without a camera the controller works in top-down mode.
    pub fn new(
        stage: &dyn Stage,
        avatar: NodeId,
        camera: Option<Box<dyn OrbitCamera>>,
        face_forward: bool,
    ) -> Result<Self> {
        let rig = AvatarRig::resolve(stage, avatar)?;
        let has_camera = camera.is_some();
        let facing = Facing::new(
            face_forward,
            has_camera,
            stage.handedness_flipped(rig.root),
            stage.right_handed(),
        );
        let mode = if has_camera {
            CameraMode::ThirdPerson
        } else {
            CameraMode::TopDown
        };
        log::info!(
            "controller created for avatar {:?} (root {:?}, camera: {has_camera})",
            avatar,
            rig.root
        );
        Ok(Self {
            avatar: rig,
            rig: CameraRig::new(camera.as_deref()),
            camera,
            anims: None,
            sounds: SoundBank::default(),
            step_sound: None,
            table: ActionTable::new(),
            intent: Intent::default(),
            motion: MotionState::new(),
            selector: ActionSelector::default(),
            keyboard: Keyboard::default(),
            facing,
            mode,
            saved_mode: mode,
            turning_off: false,
            gravity: DEFAULT_GRAVITY,
            slope: SlopeLimits::default(),
            step_offset: DEFAULT_STEP_OFFSET,
            tuning: Tuning::default(),
            action: None,
            started: false,
            camera_control: true,
        })
    }

    // ---- lifecycle ----

    /// Begin frame processing. Idempotent.
    pub fn start(&mut self, stage: &mut dyn Stage) {
        if self.started {
            return;
        }
        self.started = true;
        self.intent.reset();
        self.motion.restart();
        self.update_camera(stage);
        if self.keyboard.enabled {
            self.keyboard.listening = true;
        }
        log::info!("controller started");
    }

    /// Stop frame processing and key listening. Idempotent.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;
        self.keyboard.listening = false;
        self.release_animation();
        self.selector.forget();
        log::info!("controller stopped");
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Hand animation and sound back to the caller; locomotion keeps running.
    pub fn pause_anim(&mut self) {
        self.release_animation();
        self.selector.pause();
    }

    /// Take animation back; the current profile restarts on the next frame.
    pub fn resume_anim(&mut self) {
        self.selector.resume();
    }

    pub fn is_anim_paused(&self) -> bool {
        self.selector.is_paused()
    }

    /// Replace the controlled avatar.
    ///
    /// Profiles return to their defaults and the animation source is dropped, since it
    /// belongs to the previous skeleton: install the new avatar's source afterwards.
    pub fn set_avatar(&mut self, stage: &dyn Stage, avatar: NodeId, face_forward: bool) -> Result<()> {
        let rig = AvatarRig::resolve(stage, avatar)?;
        self.release_animation();
        self.anims = None;
        self.avatar = rig;
        self.table.reset();
        if let Some(sound) = self.step_sound {
            self.sounds.prepare_step_sound(sound, rig.root);
            self.table.set_step_sound(sound);
        }
        self.facing = Facing::new(
            face_forward,
            self.camera.is_some(),
            stage.handedness_flipped(rig.root),
            stage.right_handed(),
        );
        log::info!("avatar changed to {:?} (root {:?})", avatar, rig.root);
        Ok(())
    }

    // ---- per frame ----

    /// Advance one frame. Inert unless started.
    pub fn update(&mut self, dt: f32, stage: &mut dyn Stage) {
        if !self.started {
            return;
        }
        let dt = dt.max(0.0);
        let root = self.avatar.root;
        self.motion.frame_start = stage.position(root);

        let action = if self.intent.jump && !self.motion.in_free_fall {
            self.motion.grounded = false;
            self.motion.idle_fall.reset();
            Some(self.do_jump(dt, stage))
        } else if self.intent.any_movement() || self.motion.in_free_fall {
            self.motion.grounded = false;
            self.motion.idle_fall.reset();
            self.do_move(dt, stage)
        } else {
            Some(self.do_idle(dt, stage))
        };
        if action.is_some() {
            self.action = action;
        }
        log::trace!("frame dt={dt:.4} action={action:?} contact={:?}", self.motion.contact);

        self.animate(action, dt);
        self.update_camera(stage);
    }

    fn animate(&mut self, action: Option<ActionKind>, dt: f32) {
        match (action, self.anims.as_deref_mut()) {
            (Some(kind), Some(anims)) if self.table.any_exists() => {
                self.selector
                    .select(kind, dt, &self.table, anims, &mut self.sounds);
            }
            _ => self.selector.tick(dt, &mut self.sounds),
        }
    }

    fn update_camera(&mut self, stage: &mut dyn Stage) {
        let Some(camera) = self.camera.as_deref_mut() else {
            return;
        };
        let hold = self.motion.step.is_climbing();
        match self.rig.follow(camera, stage, self.avatar.root, hold) {
            Some(FirstPersonChange::Entered) => {
                self.saved_mode = self.mode;
                self.mode = CameraMode::ThirdPerson;
            }
            Some(FirstPersonChange::Exited) => self.mode = self.saved_mode,
            None => {}
        }
    }

    fn release_animation(&mut self) {
        if let Some(anims) = self.anims.as_deref_mut() {
            self.selector.release(&self.table, anims, &mut self.sounds);
        }
    }

    // ---- animation ----

    /// Drive animation through named ranges on `skeleton`.
    ///
    /// Without a map every profile whose name is a range on the skeleton is bound.
    pub fn set_animation_ranges<S: Skeleton + 'static>(&mut self, skeleton: S, map: Option<&ActionMap>) {
        self.install_animations(Box::new(RangeAnimations::new(skeleton)), map);
    }

    /// Drive animation through discrete clip objects keyed by name.
    ///
    /// Without a map every profile whose name is a key of `groups` is bound.
    pub fn set_animation_groups<G: ClipGroup + 'static>(
        &mut self,
        groups: GroupAnimations<G>,
        map: Option<&ActionMap>,
    ) {
        self.install_animations(Box::new(groups), map);
    }

    fn install_animations(&mut self, source: Box<dyn AnimationSource>, map: Option<&ActionMap>) {
        self.release_animation();
        let has_clip = |clip: &str| source.has_clip(clip);
        match map {
            Some(map) => self.table.apply_map(map, has_clip),
            None => {
                if !self.table.bind_default_clips(has_clip) {
                    log::warn!("no clip named after an action on the {:?} source", source.kind());
                }
            }
        }
        log::info!("{:?} animation source installed", source.kind());
        self.anims = Some(source);
    }

    /// Replace the profile bindings; profiles missing from `map` stop existing.
    pub fn set_action_map(&mut self, map: &ActionMap) {
        let Some(anims) = self.anims.as_deref_mut() else {
            log::warn!("action map ignored, no animation source installed");
            return;
        };
        self.selector.release(&self.table, anims, &mut self.sounds);
        self.table.apply_map(map, |clip| anims.has_clip(clip));
    }

    /// Bindings of every profile that has a clip.
    pub fn action_map(&self) -> ActionMap {
        self.table.to_map()
    }

    /// Change one profile's clip, rate or loop flag; `None` keeps the current value.
    pub fn set_action_anim(
        &mut self,
        kind: ActionKind,
        clip: Option<&str>,
        rate: Option<f32>,
        looped: Option<bool>,
    ) {
        let Some(anims) = self.anims.as_deref() else {
            log::warn!("{} animation ignored, no animation source installed", kind.id());
            return;
        };
        self.table
            .set_anim(kind, clip, rate, looped, |name| anims.has_clip(name));
    }

    /// `Some(speed)` blends between clips, `None` cuts.
    pub fn set_blending(&mut self, speed: Option<f32>) {
        if let Some(anims) = self.anims.as_deref_mut() {
            anims.set_blending(speed);
        }
    }

    pub fn enable_blending(&mut self, speed: f32) {
        self.set_blending(Some(speed));
    }

    pub fn disable_blending(&mut self) {
        self.set_blending(None);
    }

    // ---- sound ----

    pub fn add_sound(&mut self, sound: Box<dyn SoundHandle>) -> SoundId {
        self.sounds.add(sound)
    }

    /// Use `sound` as the step sound of every moving profile.
    pub fn set_sound(&mut self, sound: SoundId) {
        if !self.sounds.contains(sound) {
            log::warn!("unknown sound {sound:?}");
            return;
        }
        self.step_sound = Some(sound);
        self.sounds.prepare_step_sound(sound, self.avatar.root);
        self.table.set_step_sound(sound);
    }

    pub fn sound(&self) -> Option<SoundId> {
        self.step_sound
    }

    // ---- keyboard ----

    pub fn key_down(&mut self, key: &str, repeat: bool) {
        self.keyboard
            .key_down(&self.table, &mut self.intent, key, repeat);
    }

    pub fn key_up(&mut self, key: &str) {
        let command = self.keyboard.key_up(&self.table, &mut self.intent, key);
        if matches!(command, Some(KeyCommand::TurnLeft | KeyCommand::TurnRight)) {
            self.motion.is_turning = false;
        }
    }

    /// Listening starts with `start()` when enabled.
    pub fn enable_keyboard(&mut self, enabled: bool) {
        self.keyboard.enabled = enabled;
        self.keyboard.listening = enabled && self.started;
    }

    pub fn is_keyboard_enabled(&self) -> bool {
        self.keyboard.enabled
    }

    pub fn set_action_key(&mut self, kind: ActionKind, key: &str) {
        self.table.set_key(kind, key);
    }

    // ---- programmatic intent ----

    pub fn walk(&mut self, b: bool) {
        self.intent.walk = b;
    }

    pub fn walk_back(&mut self, b: bool) {
        self.intent.walk_back = b;
    }

    pub fn walk_back_fast(&mut self, b: bool) {
        self.intent.walk_back = b;
        self.intent.speed_modifier = b;
    }

    pub fn run(&mut self, b: bool) {
        self.intent.walk = b;
        self.intent.speed_modifier = b;
    }

    pub fn turn_left(&mut self, b: bool) {
        self.intent.turn_left = b;
        if !b {
            self.motion.is_turning = false;
        }
    }

    pub fn turn_left_fast(&mut self, b: bool) {
        self.turn_left(b);
        self.intent.speed_modifier = b;
    }

    pub fn turn_right(&mut self, b: bool) {
        self.intent.turn_right = b;
        if !b {
            self.motion.is_turning = false;
        }
    }

    pub fn turn_right_fast(&mut self, b: bool) {
        self.turn_right(b);
        self.intent.speed_modifier = b;
    }

    pub fn strafe_left(&mut self, b: bool) {
        self.intent.strafe_left = b;
    }

    pub fn strafe_left_fast(&mut self, b: bool) {
        self.intent.strafe_left = b;
        self.intent.speed_modifier = b;
    }

    pub fn strafe_right(&mut self, b: bool) {
        self.intent.strafe_right = b;
    }

    pub fn strafe_right_fast(&mut self, b: bool) {
        self.intent.strafe_right = b;
        self.intent.speed_modifier = b;
    }

    /// Request a jump; the request clears itself when the jump lands.
    pub fn jump(&mut self) {
        self.intent.jump = true;
    }

    /// Drop every movement command, including a jump in flight.
    pub fn idle(&mut self) {
        self.intent.reset();
        self.motion.jump.land();
    }

    pub fn any_movement(&self) -> bool {
        self.intent.any_movement()
    }

    // ---- configuration ----

    pub fn set_slope_limits(&mut self, min_degrees: f32, max_degrees: f32) -> Result<()> {
        self.slope = SlopeLimits::from_degrees(min_degrees, max_degrees)?;
        Ok(())
    }

    pub fn slope_limits(&self) -> SlopeLimits {
        self.slope
    }

    /// The avatar steps up a stair only if its total rise stays below `offset`.
    pub fn set_step_offset(&mut self, offset: f32) {
        self.step_offset = offset;
    }

    pub fn step_offset(&self) -> f32 {
        self.step_offset
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn set_walk_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::Walk).speed = speed;
    }

    pub fn set_run_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::Run).speed = speed;
    }

    pub fn set_back_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::WalkBack).speed = speed;
    }

    pub fn set_back_fast_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::WalkBackFast).speed = speed;
    }

    /// Launch speed of both idle and running jumps.
    pub fn set_jump_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::IdleJump).speed = speed;
        self.table.get_mut(ActionKind::RunJump).speed = speed;
    }

    pub fn set_left_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::StrafeLeft).speed = speed;
    }

    pub fn set_left_fast_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::StrafeLeftFast).speed = speed;
    }

    pub fn set_right_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::StrafeRight).speed = speed;
    }

    pub fn set_right_fast_speed(&mut self, speed: f32) {
        self.table.get_mut(ActionKind::StrafeRightFast).speed = speed;
    }

    /// Degrees per second.
    pub fn set_turn_speed(&mut self, degrees: f32) {
        let speed = degrees.to_radians();
        self.table.get_mut(ActionKind::TurnLeft).speed = speed;
        self.table.get_mut(ActionKind::TurnRight).speed = speed;
    }

    /// Degrees per second.
    pub fn set_turn_fast_speed(&mut self, degrees: f32) {
        let speed = degrees.to_radians();
        self.table.get_mut(ActionKind::TurnLeftFast).speed = speed;
        self.table.get_mut(ActionKind::TurnRightFast).speed = speed;
    }

    pub fn set_camera_target(&mut self, offset: Vec3) {
        self.rig.target_offset = offset;
    }

    pub fn set_camera_elasticity(&mut self, elastic: bool) {
        self.rig.elastic = elastic;
    }

    pub fn set_elastic_steps(&mut self, steps: u32) {
        self.rig.elastic_steps = steps;
    }

    pub fn make_obstruction_invisible(&mut self, hide: bool) {
        self.rig.hide_occluders = hide;
    }

    pub fn set_no_first_person(&mut self, no_first_person: bool) {
        self.rig.no_first_person = no_first_person;
    }

    /// Call after changing the camera's collision flag outside the controller.
    pub fn camera_collision_changed(&mut self) {
        if let Some(camera) = self.camera.as_deref() {
            self.rig.camera_collision_changed(camera);
        }
    }

    /// Reattach the player's orbit input to the camera. On by default.
    pub fn enable_camera_control(&mut self) {
        self.set_camera_control(true);
    }

    /// Detach the player's orbit input. The controller still moves the camera: it
    /// follows the avatar and turn keys orbit it in third person.
    pub fn disable_camera_control(&mut self) {
        self.set_camera_control(false);
    }

    fn set_camera_control(&mut self, enabled: bool) {
        if self.camera_control == enabled {
            return;
        }
        self.camera_control = enabled;
        if let Some(camera) = self.camera.as_deref_mut() {
            camera.set_user_input(enabled);
        }
    }

    pub fn is_camera_control_enabled(&self) -> bool {
        self.camera_control
    }

    pub fn set_face_forward(&mut self, face_forward: bool) {
        self.facing = self
            .facing
            .with_face_forward(face_forward, self.camera.is_some());
    }

    pub fn is_face_forward(&self) -> bool {
        self.facing.face_forward
    }

    /// Third person needs a camera; without one the mode stays top-down.
    pub fn set_mode(&mut self, mode: CameraMode) {
        let mode = if self.camera.is_some() {
            mode
        } else {
            CameraMode::TopDown
        };
        self.mode = mode;
        self.saved_mode = mode;
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    /// With turning off, turn keys face the avatar sideways relative to the camera and
    /// walk-back faces it towards the camera. No effect in top-down mode.
    pub fn set_turning_off(&mut self, off: bool) {
        self.turning_off = off;
    }

    pub fn is_turning_off(&self) -> bool {
        self.turning_off
    }

    pub fn set_tuning(&mut self, tuning: Tuning) {
        self.tuning = tuning;
        self.rig.skin = tuning.camera_skin;
    }

    pub fn tuning(&self) -> Tuning {
        self.tuning
    }

    pub fn settings(&self) -> Settings {
        Settings {
            face_forward: self.facing.face_forward,
            top_down: self.mode == CameraMode::TopDown,
            turning_off: self.turning_off,
            camera_target: self.rig.target_offset,
            camera_elastic: self.rig.elastic,
            elastic_steps: self.rig.elastic_steps,
            make_invisible: self.rig.hide_occluders,
            gravity: self.gravity,
            keyboard: self.keyboard.enabled,
            min_slope_limit: self.slope.min_degrees(),
            max_slope_limit: self.slope.max_degrees(),
            no_first_person: self.rig.no_first_person,
            step_offset: self.step_offset,
            sound: self.step_sound,
            speeds: Speeds::from_table(&self.table),
            tuning: self.tuning,
        }
    }

    /// Apply a settings bundle. Nothing changes if the slope limits are invalid.
    pub fn set_settings(&mut self, settings: &Settings) -> Result<()> {
        self.slope = SlopeLimits::from_degrees(settings.min_slope_limit, settings.max_slope_limit)?;
        self.set_face_forward(settings.face_forward);
        self.set_mode(if settings.top_down {
            CameraMode::TopDown
        } else {
            CameraMode::ThirdPerson
        });
        self.turning_off = settings.turning_off;
        self.rig.target_offset = settings.camera_target;
        self.rig.elastic = settings.camera_elastic;
        self.rig.elastic_steps = settings.elastic_steps;
        self.rig.hide_occluders = settings.make_invisible;
        self.gravity = settings.gravity;
        self.enable_keyboard(settings.keyboard);
        self.rig.no_first_person = settings.no_first_person;
        self.step_offset = settings.step_offset;
        if let Some(sound) = settings.sound {
            self.set_sound(sound);
        }
        settings.speeds.apply_to(&mut self.table);
        self.set_tuning(settings.tuning);
        Ok(())
    }

    // ---- state ----

    pub fn avatar(&self) -> NodeId {
        self.avatar.root
    }

    pub fn skeleton(&self) -> Option<NodeId> {
        self.avatar.skeleton
    }

    pub fn camera(&self) -> Option<&dyn OrbitCamera> {
        self.camera.as_deref()
    }

    pub fn camera_mut(&mut self) -> Option<&mut (dyn OrbitCamera + 'static)> {
        self.camera.as_deref_mut()
    }

    pub fn camera_rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn intent(&self) -> &Intent {
        &self.intent
    }

    pub fn motion(&self) -> &MotionState {
        &self.motion
    }

    pub fn action_table(&self) -> &ActionTable {
        &self.table
    }

    /// Profile the state machine chose most recently.
    pub fn action(&self) -> Option<ActionKind> {
        self.action
    }

    /// Profile currently playing on the animation source.
    pub fn playing(&self) -> Option<ActionKind> {
        self.selector.active()
    }

    pub fn contact(&self) -> Contact {
        self.motion.contact
    }

    pub fn is_grounded(&self) -> bool {
        self.motion.grounded
    }

    pub fn in_free_fall(&self) -> bool {
        self.motion.in_free_fall
    }
}
