//! Save/restore bundle for the controller configuration.
//!
//! Every field has a default, so a partial JSON document only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, ActionTable};
use crate::constants::{
    DEFAULT_CAMERA_SKIN, DEFAULT_ELASTIC_STEPS, DEFAULT_FALL_FRAME_MIN, DEFAULT_FREE_FALL_EPSILON,
    DEFAULT_GRAVITY, DEFAULT_GROUND_FRAME_MAX, DEFAULT_MAX_SLOPE_LIMIT_DEG,
    DEFAULT_MIN_SLOPE_LIMIT_DEG, DEFAULT_STEP_OFFSET,
};
use crate::error::Result;
use crate::types::{SoundId, Vec3};

/// Debounce counters and tolerances of the state machine and the camera rig.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tuning {
    /// Consecutive free-fall frames before the fall animation is selected.
    pub fall_frame_min: u32,
    /// Consecutive grounded idle frames before the avatar counts as grounded.
    pub ground_frame_max: u32,
    pub free_fall_epsilon: f32,
    pub camera_skin: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            fall_frame_min: DEFAULT_FALL_FRAME_MIN,
            ground_frame_max: DEFAULT_GROUND_FRAME_MAX,
            free_fall_epsilon: DEFAULT_FREE_FALL_EPSILON,
            camera_skin: DEFAULT_CAMERA_SKIN,
        }
    }
}

/// Movement speeds in units per second; turn rates in degrees per second.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Speeds {
    pub walk: f32,
    pub run: f32,
    pub back: f32,
    pub back_fast: f32,
    pub jump: f32,
    pub left: f32,
    pub left_fast: f32,
    pub right: f32,
    pub right_fast: f32,
    pub turn: f32,
    pub turn_fast: f32,
}

impl Default for Speeds {
    fn default() -> Self {
        Self::from_table(&ActionTable::new())
    }
}

impl Speeds {
    pub fn from_table(table: &ActionTable) -> Self {
        let speed = |kind| table.get(kind).speed;
        Self {
            walk: speed(ActionKind::Walk),
            run: speed(ActionKind::Run),
            back: speed(ActionKind::WalkBack),
            back_fast: speed(ActionKind::WalkBackFast),
            jump: speed(ActionKind::IdleJump),
            left: speed(ActionKind::StrafeLeft),
            left_fast: speed(ActionKind::StrafeLeftFast),
            right: speed(ActionKind::StrafeRight),
            right_fast: speed(ActionKind::StrafeRightFast),
            turn: speed(ActionKind::TurnLeft).to_degrees(),
            turn_fast: speed(ActionKind::TurnLeftFast).to_degrees(),
        }
    }

    /// Write the speeds into `table`. Turn rates apply to both directions.
    pub fn apply_to(&self, table: &mut ActionTable) {
        let mut set = |kind, speed| table.get_mut(kind).speed = speed;
        set(ActionKind::Walk, self.walk);
        set(ActionKind::Run, self.run);
        set(ActionKind::WalkBack, self.back);
        set(ActionKind::WalkBackFast, self.back_fast);
        set(ActionKind::IdleJump, self.jump);
        set(ActionKind::RunJump, self.jump);
        set(ActionKind::StrafeLeft, self.left);
        set(ActionKind::StrafeLeftFast, self.left_fast);
        set(ActionKind::StrafeRight, self.right);
        set(ActionKind::StrafeRightFast, self.right_fast);
        set(ActionKind::TurnLeft, self.turn.to_radians());
        set(ActionKind::TurnRight, self.turn.to_radians());
        set(ActionKind::TurnLeftFast, self.turn_fast.to_radians());
        set(ActionKind::TurnRightFast, self.turn_fast.to_radians());
    }
}

/// Everything `CharacterController::settings` captures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub face_forward: bool,
    pub top_down: bool,
    pub turning_off: bool,
    pub camera_target: Vec3,
    pub camera_elastic: bool,
    pub elastic_steps: u32,
    pub make_invisible: bool,
    pub gravity: f32,
    pub keyboard: bool,
    /// Degrees.
    pub min_slope_limit: f32,
    /// Degrees.
    pub max_slope_limit: f32,
    pub no_first_person: bool,
    pub step_offset: f32,
    pub sound: Option<SoundId>,
    pub speeds: Speeds,
    pub tuning: Tuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            face_forward: false,
            top_down: false,
            turning_off: false,
            camera_target: Vec3::zeros(),
            camera_elastic: true,
            elastic_steps: DEFAULT_ELASTIC_STEPS,
            make_invisible: false,
            gravity: DEFAULT_GRAVITY,
            keyboard: true,
            min_slope_limit: DEFAULT_MIN_SLOPE_LIMIT_DEG,
            max_slope_limit: DEFAULT_MAX_SLOPE_LIMIT_DEG,
            no_first_person: false,
            step_offset: DEFAULT_STEP_OFFSET,
            sound: None,
            speeds: Speeds::default(),
            tuning: Tuning::default(),
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
