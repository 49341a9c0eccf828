//! Vertical kinematics: free-fall and jump integration under a constant pseudo-gravity.

use crate::constants::FALLBACK_PROBE_DISTANCE;

/// Distance fallen during `dt` by a body that has been falling for `fall_time` seconds.
///
/// `dt == 0` (first frame after registration) yields `FALLBACK_PROBE_DISTANCE`.
#[inline]
pub fn free_fall_distance(gravity: f32, fall_time: f32, dt: f32) -> f32 {
    if dt == 0.0 {
        return FALLBACK_PROBE_DISTANCE;
    }
    let u = gravity * fall_time;
    u * dt + 0.5 * gravity * dt * dt
}

/// Upward displacement during `dt` of a jump launched at `jump_speed`, `jump_time`
/// seconds ago. Negative once the apex has been passed.
#[inline]
pub fn jump_displacement(jump_speed: f32, gravity: f32, jump_time: f32, dt: f32) -> f32 {
    let js = jump_speed - gravity * jump_time;
    js * dt - 0.5 * gravity * dt * dt
}

/// Accumulated fall time with the integration step attached.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FallClock {
    pub time: f32,
}

impl FallClock {
    pub fn new(time: f32) -> Self {
        Self { time }
    }

    /// Fall distance for this frame; advances the clock unless `dt == 0`.
    pub fn advance(&mut self, gravity: f32, dt: f32) -> f32 {
        let dist = free_fall_distance(gravity, self.time, dt);
        self.time += dt;
        dist
    }

    pub fn reset(&mut self) {
        self.time = 0.0;
    }
}

/// Jump flight time and launch height.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumpClock {
    pub time: f32,
    pub start_height: f32,
    /// Set by `launch`, cleared by `land`.
    pub airborne: bool,
}

impl JumpClock {
    /// Record the launch height on the first frame of a jump.
    pub fn launch(&mut self, height: f32) {
        if !self.airborne {
            self.airborne = true;
            self.time = 0.0;
            self.start_height = height;
        }
    }

    /// Displacement for this frame, computed before the clock advances.
    pub fn advance(&mut self, jump_speed: f32, gravity: f32, dt: f32) -> f32 {
        let disp = jump_displacement(jump_speed, gravity, self.time, dt);
        self.time += dt;
        disp
    }

    pub fn land(&mut self) {
        self.airborne = false;
        self.time = 0.0;
    }
}
