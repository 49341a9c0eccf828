/*!
Animation/sound selector.

Exactly one profile is active at a time. When the state machine picks a different one,
the previous clip, its sound and the periodic replay are stopped before the new clip
starts. The step sound then replays twice per clip cycle, driven by frame time rather
than a wall-clock timer.
*/

use crate::action::{ActionKind, ActionTable};
use crate::animation::{AnimationSource, ClipTiming};
use crate::host::SoundHandle;
use crate::types::{NodeId, SoundId};

/// Sounds registered with the controller, addressed by `SoundId`.
#[derive(Default)]
pub struct SoundBank {
    sounds: Vec<Box<dyn SoundHandle>>,
}

impl SoundBank {
    pub fn add(&mut self, sound: Box<dyn SoundHandle>) -> SoundId {
        self.sounds.push(sound);
        SoundId((self.sounds.len() - 1) as u32)
    }

    pub fn contains(&self, id: SoundId) -> bool {
        (id.0 as usize) < self.sounds.len()
    }

    pub fn get_mut(&mut self, id: SoundId) -> Option<&mut (dyn SoundHandle + 'static)> {
        self.sounds.get_mut(id.0 as usize).map(|s| s.as_mut())
    }

    pub fn play(&mut self, id: SoundId) {
        if let Some(sound) = self.get_mut(id) {
            sound.play();
        }
    }

    pub fn stop(&mut self, id: SoundId) {
        if let Some(sound) = self.get_mut(id) {
            sound.stop();
        }
    }

    /// Step sounds are one-shots replayed by the scheduler, attached to the avatar.
    pub fn prepare_step_sound(&mut self, id: SoundId, avatar: NodeId) {
        if let Some(sound) = self.get_mut(id) {
            sound.set_loop(false);
            sound.attach_to(avatar);
        }
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

/// Frame-driven periodic replay of one sound.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SoundScheduler {
    sound: Option<SoundId>,
    interval: f32,
    elapsed: f32,
}

impl SoundScheduler {
    /// Replay interval for a clip: twice per cycle at the clip's playback speed.
    /// `None` when the clip does not advance.
    pub fn interval_for(timing: ClipTiming, rate: f32) -> Option<f32> {
        let speed = timing.fps * rate.abs() * 2.0;
        if speed <= 0.0 || timing.frames <= 0.0 {
            return None;
        }
        Some(timing.frames / speed)
    }

    pub fn schedule(&mut self, sound: SoundId, interval: f32) {
        *self = Self {
            sound: Some(sound),
            interval,
            elapsed: 0.0,
        };
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_scheduled(&self) -> bool {
        self.sound.is_some()
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Advance by `dt`, replaying the sound at most once. Time past the interval
    /// carries over, but never more than one interval of it.
    pub fn tick(&mut self, dt: f32, sounds: &mut SoundBank) {
        let Some(sound) = self.sound else {
            return;
        };
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = (self.elapsed - self.interval).min(self.interval);
            sounds.play(sound);
        }
    }
}

#[derive(Default)]
pub struct ActionSelector {
    active: Option<ActionKind>,
    paused: bool,
    scheduler: SoundScheduler,
}

impl ActionSelector {
    pub fn active(&self) -> Option<ActionKind> {
        self.active
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn scheduler(&self) -> &SoundScheduler {
        &self.scheduler
    }

    /// Make `kind` the active profile. Re-selecting the active profile only advances
    /// the sound replay.
    pub fn select(
        &mut self,
        kind: ActionKind,
        dt: f32,
        table: &ActionTable,
        anims: &mut dyn AnimationSource,
        sounds: &mut SoundBank,
    ) {
        if self.paused {
            return;
        }
        if self.active == Some(kind) {
            self.scheduler.tick(dt, sounds);
            return;
        }

        self.stop_active(table, anims, sounds);

        let profile = table.get(kind);
        log::debug!("action {} -> {}", self.active.map_or("none", ActionKind::id), kind.id());
        self.active = Some(kind);
        if !profile.exists {
            return;
        }
        let Some(clip) = profile.clip.as_deref() else {
            return;
        };
        let Some(timing) = anims.start(clip, profile.looped, profile.rate) else {
            log::debug!("clip {clip:?} for {} did not start", kind.id());
            return;
        };
        if let Some(sound) = profile.sound {
            sounds.play(sound);
            if let Some(interval) = SoundScheduler::interval_for(timing, profile.rate) {
                self.scheduler.schedule(sound, interval);
            }
        }
    }

    fn stop_active(
        &mut self,
        table: &ActionTable,
        anims: &mut dyn AnimationSource,
        sounds: &mut SoundBank,
    ) {
        self.scheduler.clear();
        let Some(prev) = self.active else {
            return;
        };
        let profile = table.get(prev);
        if profile.exists {
            if let Some(clip) = profile.clip.as_deref() {
                anims.stop(clip);
            }
        }
        if let Some(sound) = profile.sound {
            sounds.stop(sound);
        }
    }

    /// Select nothing until `resume`. Call `release` first to stop what is playing.
    pub fn pause(&mut self) {
        self.paused = true;
        self.scheduler.clear();
    }

    /// Select again; the next frame restarts the current profile.
    pub fn resume(&mut self) {
        self.paused = false;
        self.active = None;
    }

    /// Stop the active clip before its bindings or its source are replaced.
    pub fn release(
        &mut self,
        table: &ActionTable,
        anims: &mut dyn AnimationSource,
        sounds: &mut SoundBank,
    ) {
        self.stop_active(table, anims, sounds);
        self.active = None;
    }

    /// Forget the active profile when no animation source is left to stop.
    pub fn forget(&mut self) {
        self.active = None;
        self.scheduler.clear();
    }

    /// Advance the sound replay on frames that select nothing.
    pub fn tick(&mut self, dt: f32, sounds: &mut SoundBank) {
        if !self.paused {
            self.scheduler.tick(dt, sounds);
        }
    }
}
