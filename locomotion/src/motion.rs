use crate::constants::START_IDLE_FALL_TIME;
use crate::kinematics::{FallClock, JumpClock};
use crate::step::StepClimber;
use crate::types::{Contact, Vec3};

/// Per-frame scalars owned by the locomotion state machine.
///
/// Nothing outside the controller mutates this; hosts can read it through
/// `CharacterController::motion` for debugging overlays.
#[derive(Clone, Debug, Default)]
pub struct MotionState {
    pub grounded: bool,
    pub in_free_fall: bool,
    /// Fall time accumulated while idle.
    pub idle_fall: FallClock,
    /// Fall time accumulated while moving.
    pub move_fall: FallClock,
    /// Consecutive frames of exact free fall while moving (animation flicker debounce).
    pub fall_frames: u32,
    /// Consecutive idle frames without a fall (ground debounce).
    pub ground_frames: u32,
    pub step: StepClimber,
    pub jump: JumpClock,
    pub was_walking: bool,
    pub was_running: bool,
    /// Top-down turn direction, latched once per turn gesture.
    pub turn_sign: f32,
    pub is_turning: bool,
    /// Last displacement requested; carried into jumps and free fall.
    pub move_vector: Vec3,
    /// Avatar position before this frame's move.
    pub frame_start: Vec3,
    /// Classification of the last frame.
    pub contact: Contact,
}

impl MotionState {
    pub fn new() -> Self {
        Self {
            turn_sign: 1.0,
            ..Self::default()
        }
    }

    /// State on `start()`: ungrounded, with a non-zero idle fall time so the first probe
    /// reaches the ground.
    pub fn restart(&mut self) {
        self.move_fall.reset();
        self.idle_fall = FallClock::new(START_IDLE_FALL_TIME);
        self.grounded = false;
        self.jump.land();
    }

    pub fn end_free_fall(&mut self) {
        self.move_fall.reset();
        self.fall_frames = 0;
        self.in_free_fall = false;
    }

    /// Steep slope: keep accumulating fall time so the avatar decelerates.
    pub fn hold_on_slope(&mut self) {
        self.fall_frames = 0;
        self.in_free_fall = false;
    }

    /// Count one grounded idle frame; ground after more than `max` in a row.
    pub fn ground_frame(&mut self, max: u32) {
        self.ground_frames = self.ground_frames.saturating_add(1);
        if self.ground_frames > max {
            self.grounded = true;
            self.idle_fall.reset();
        }
    }

    pub fn unground(&mut self) {
        self.grounded = false;
        self.ground_frames = 0;
    }

    pub fn end_jump(&mut self) {
        self.jump.land();
        self.was_walking = false;
        self.was_running = false;
    }
}
