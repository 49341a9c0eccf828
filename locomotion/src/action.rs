/*!
Action profile table.

One `ActionProfile` per locomotion mode, keyed by the closed `ActionKind` enum. A profile
carries everything the selector and the state machine need for that mode: the clip to
play, its loop flag and rate, the movement speed, the keyboard binding and the step sound.

Profiles without a clip of their own borrow one where it makes sense: the fast variants of
walk-back, turn and strafe fall back to their slow counterpart played at twice the rate.
*/

use std::collections::BTreeMap;
use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

use crate::constants::UNBOUND_KEY;
use crate::types::SoundId;

/// Locomotion modes. The discriminant is the profile's index in the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    Idle,
    Walk,
    WalkBack,
    WalkBackFast,
    Run,
    IdleJump,
    RunJump,
    Fall,
    TurnLeft,
    TurnLeftFast,
    TurnRight,
    TurnRightFast,
    StrafeLeft,
    StrafeLeftFast,
    StrafeRight,
    StrafeRightFast,
    SlideBack,
}

impl ActionKind {
    pub const COUNT: usize = 17;

    pub const ALL: [ActionKind; Self::COUNT] = [
        ActionKind::Idle,
        ActionKind::Walk,
        ActionKind::WalkBack,
        ActionKind::WalkBackFast,
        ActionKind::Run,
        ActionKind::IdleJump,
        ActionKind::RunJump,
        ActionKind::Fall,
        ActionKind::TurnLeft,
        ActionKind::TurnLeftFast,
        ActionKind::TurnRight,
        ActionKind::TurnRightFast,
        ActionKind::StrafeLeft,
        ActionKind::StrafeLeftFast,
        ActionKind::StrafeRight,
        ActionKind::StrafeRightFast,
        ActionKind::SlideBack,
    ];

    /// (fast, slow) pairs whose fast variant can borrow the slow clip.
    pub const FAST_FALLBACKS: [(ActionKind, ActionKind); 5] = [
        (ActionKind::WalkBackFast, ActionKind::WalkBack),
        (ActionKind::TurnRightFast, ActionKind::TurnRight),
        (ActionKind::TurnLeftFast, ActionKind::TurnLeft),
        (ActionKind::StrafeRightFast, ActionKind::StrafeRight),
        (ActionKind::StrafeLeftFast, ActionKind::StrafeLeft),
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Stable name, also used as the default clip name when probing an avatar.
    pub fn id(self) -> &'static str {
        match self {
            ActionKind::Idle => "idle",
            ActionKind::Walk => "walk",
            ActionKind::WalkBack => "walkBack",
            ActionKind::WalkBackFast => "walkBackFast",
            ActionKind::Run => "run",
            ActionKind::IdleJump => "idleJump",
            ActionKind::RunJump => "runJump",
            ActionKind::Fall => "fall",
            ActionKind::TurnLeft => "turnLeft",
            ActionKind::TurnLeftFast => "turnLeftFast",
            ActionKind::TurnRight => "turnRight",
            ActionKind::TurnRightFast => "turnRightFast",
            ActionKind::StrafeLeft => "strafeLeft",
            ActionKind::StrafeLeftFast => "strafeLeftFast",
            ActionKind::StrafeRight => "strafeRight",
            ActionKind::StrafeRightFast => "strafeRightFast",
            ActionKind::SlideBack => "slideBack",
        }
    }

    /// Default speed: units per second, or radians per second for turns.
    pub fn default_speed(self) -> f32 {
        match self {
            ActionKind::Walk => 3.0,
            ActionKind::WalkBack => 1.5,
            ActionKind::WalkBackFast => 3.0,
            ActionKind::Run | ActionKind::IdleJump | ActionKind::RunJump => 6.0,
            ActionKind::TurnLeft | ActionKind::TurnRight => PI / 8.0,
            ActionKind::TurnLeftFast | ActionKind::TurnRightFast => PI / 4.0,
            ActionKind::StrafeLeft | ActionKind::StrafeRight => 1.5,
            ActionKind::StrafeLeftFast | ActionKind::StrafeRightFast => 3.0,
            ActionKind::Idle | ActionKind::Fall | ActionKind::SlideBack => 0.0,
        }
    }

    pub fn default_key(self) -> &'static str {
        match self {
            ActionKind::Walk => "w",
            ActionKind::WalkBack => "s",
            ActionKind::IdleJump => " ",
            ActionKind::TurnLeft => "a",
            ActionKind::TurnRight => "d",
            ActionKind::StrafeLeft => "q",
            ActionKind::StrafeRight => "e",
            _ => UNBOUND_KEY,
        }
    }

    /// Modes that never play the step sound.
    pub fn is_silent(self) -> bool {
        matches!(
            self,
            ActionKind::Idle | ActionKind::Fall | ActionKind::SlideBack
        )
    }
}

/// Configuration of one locomotion mode.
#[derive(Clone, Debug, PartialEq)]
pub struct ActionProfile {
    pub kind: ActionKind,
    /// Clip (range or group name) on the animation source.
    pub clip: Option<String>,
    pub looped: bool,
    pub rate: f32,
    pub speed: f32,
    /// Lowercase key name, `UNBOUND_KEY` when not bound.
    pub key: String,
    pub sound: Option<SoundId>,
    /// A playable clip is bound to this profile.
    pub exists: bool,
}

impl ActionProfile {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind,
            clip: None,
            looped: true,
            rate: 1.0,
            speed: kind.default_speed(),
            key: kind.default_key().to_string(),
            sound: None,
            exists: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.kind);
    }
}

/// Per-mode overrides, the serializable form of a profile.
///
/// Absent fields keep the table's current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    #[serde(rename = "loop", skip_serializing_if = "Option::is_none")]
    pub looped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound: Option<SoundId>,
}

impl ActionSpec {
    pub fn clip(name: impl Into<String>) -> Self {
        Self {
            clip: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Action map document: kind to overrides.
pub type ActionMap = BTreeMap<ActionKind, ActionSpec>;

/// The 17 profiles, indexed by `ActionKind`.
#[derive(Clone, Debug)]
pub struct ActionTable {
    profiles: [ActionProfile; ActionKind::COUNT],
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionTable {
    pub fn new() -> Self {
        Self {
            profiles: ActionKind::ALL.map(ActionProfile::new),
        }
    }

    #[inline]
    pub fn get(&self, kind: ActionKind) -> &ActionProfile {
        &self.profiles[kind.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, kind: ActionKind) -> &mut ActionProfile {
        &mut self.profiles[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionProfile> {
        self.profiles.iter()
    }

    pub fn any_exists(&self) -> bool {
        self.profiles.iter().any(|p| p.exists)
    }

    /// Restore every profile to its defaults.
    pub fn reset(&mut self) {
        self.profiles.iter_mut().for_each(ActionProfile::reset);
    }

    /// Let `fast` borrow `slow`'s clip at double rate, if `fast` has none and `slow` has one.
    pub fn copy_slow(&mut self, fast: ActionKind, slow: ActionKind) {
        if self.get(fast).exists || !self.get(slow).exists {
            return;
        }
        let (clip, rate) = {
            let s = self.get(slow);
            (s.clip.clone(), s.rate)
        };
        let f = self.get_mut(fast);
        f.exists = true;
        f.clip = clip;
        f.rate = rate * 2.0;
    }

    pub fn check_fast_anims(&mut self) {
        for (fast, slow) in ActionKind::FAST_FALLBACKS {
            self.copy_slow(fast, slow);
        }
    }

    /// Bind every profile whose id names a clip on the source. Returns true if any bound.
    pub fn bind_default_clips(&mut self, has_clip: impl Fn(&str) -> bool) -> bool {
        let mut any = false;
        for p in self.profiles.iter_mut() {
            if has_clip(p.kind.id()) {
                p.clip = Some(p.kind.id().to_string());
                p.exists = true;
                any = true;
            }
        }
        self.check_fast_anims();
        any
    }

    /// Update a profile's clip, rate and loop flag.
    ///
    /// A clip the source does not have marks the profile non-existent and leaves the
    /// rest untouched. Slow variants refresh their fast counterpart afterwards.
    pub fn set_anim(
        &mut self,
        kind: ActionKind,
        clip: Option<&str>,
        rate: Option<f32>,
        looped: Option<bool>,
        has_clip: impl Fn(&str) -> bool,
    ) {
        {
            let p = self.get_mut(kind);
            if let Some(name) = clip {
                if !has_clip(name) {
                    log::debug!("clip {name:?} not found, {} disabled", kind.id());
                    p.exists = false;
                    return;
                }
                p.clip = Some(name.to_string());
                p.exists = true;
            }
            if let Some(looped) = looped {
                p.looped = looped;
            }
            if let Some(rate) = rate {
                p.rate = rate;
            }
        }
        if let Some(&(fast, slow)) = ActionKind::FAST_FALLBACKS.iter().find(|(_, s)| *s == kind) {
            self.copy_slow(fast, slow);
        }
    }

    /// Replace the bindings with those of `map`.
    ///
    /// Every profile is first marked non-existent; listed profiles whose clip the source
    /// has come back, with their overrides applied.
    pub fn apply_map(&mut self, map: &ActionMap, has_clip: impl Fn(&str) -> bool) {
        for p in self.profiles.iter_mut() {
            p.exists = false;
            let Some(spec) = map.get(&p.kind) else {
                continue;
            };
            let clip = spec.clip.as_deref().or(p.clip.as_deref());
            match clip {
                Some(name) if has_clip(name) => {
                    p.clip = Some(name.to_string());
                    p.exists = true;
                }
                Some(name) => {
                    log::debug!("clip {name:?} not found, {} disabled", p.kind.id());
                    continue;
                }
                None => continue,
            }
            if let Some(looped) = spec.looped {
                p.looped = looped;
            }
            if let Some(rate) = spec.rate {
                p.rate = rate;
            }
            if let Some(speed) = spec.speed {
                p.speed = speed;
            }
            if let Some(key) = &spec.key {
                p.key = key.to_lowercase();
            }
            if spec.sound.is_some() {
                p.sound = spec.sound;
            }
        }
        self.check_fast_anims();
    }

    /// Serializable form of every existing profile.
    pub fn to_map(&self) -> ActionMap {
        self.profiles
            .iter()
            .filter(|p| p.exists)
            .map(|p| {
                let spec = ActionSpec {
                    clip: p.clip.clone(),
                    looped: Some(p.looped),
                    rate: Some(p.rate),
                    speed: Some(p.speed),
                    key: Some(p.key.clone()),
                    sound: p.sound,
                };
                (p.kind, spec)
            })
            .collect()
    }

    /// Attach the shared step sound to every moving mode.
    pub fn set_step_sound(&mut self, sound: SoundId) {
        for p in self.profiles.iter_mut() {
            p.sound = if p.kind.is_silent() { None } else { Some(sound) };
        }
    }

    pub fn set_key(&mut self, kind: ActionKind, key: &str) {
        self.get_mut(kind).key = key.to_lowercase();
    }
}
