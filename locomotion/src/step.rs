//! Step-up climber.
//!
//! Rises steeper than the upper slope limit are either stair steps or walls. Consecutive
//! steep rises are accumulated from the position where the climb began; once the total
//! exceeds the step offset the obstacle is a wall and the avatar goes back to that
//! position.

use crate::types::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepOutcome {
    /// Keep the move.
    Climb,
    /// Wall: move the avatar back to this position and end free fall.
    Rollback(Vec3),
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepClimber {
    total_rise: f32,
    start: Vec3,
}

impl StepClimber {
    /// Feed one steep rise. `frame_start` is the avatar position before this frame's move.
    pub fn on_steep_rise(&mut self, step_offset: f32, frame_start: Vec3, rise: f32) -> StepOutcome {
        if step_offset <= 0.0 {
            return StepOutcome::Rollback(frame_start);
        }
        if self.total_rise == 0.0 {
            self.start = frame_start;
        }
        self.total_rise += rise;
        if self.total_rise > step_offset {
            self.total_rise = 0.0;
            log::trace!("step climb exceeded offset {step_offset}, rolling back");
            return StepOutcome::Rollback(self.start);
        }
        StepOutcome::Climb
    }

    /// Any classification other than step-or-wall ends the climb.
    pub fn reset(&mut self) {
        self.total_rise = 0.0;
    }

    /// A climb is under way; the camera holds its target meanwhile.
    #[inline]
    pub fn is_climbing(&self) -> bool {
        self.total_rise != 0.0
    }

    #[inline]
    pub fn total_rise(&self) -> f32 {
        self.total_rise
    }
}
