/*!
Animation sources.

The controller only decides which clip plays, with which loop flag and rate. Playback
itself belongs to the engine, reached through one of two shapes:

- `RangeAnimations`: named frame ranges on a single skeleton (`Skeleton` trait);
- `GroupAnimations`: discrete clip objects keyed by name (`ClipGroup` trait).

Both are `AnimationSource`s; the controller holds whichever was installed last.
*/

use std::collections::BTreeMap;

use crate::constants::DEFAULT_CLIP_FPS;

/// Frame span of a clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRange {
    pub from: f32,
    pub to: f32,
}

impl FrameRange {
    pub fn new(from: f32, to: f32) -> Self {
        Self { from, to }
    }

    #[inline]
    pub fn frames(&self) -> f32 {
        self.to - self.from
    }
}

/// Length and speed of a clip that was just started; drives the step sound cadence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipTiming {
    pub frames: f32,
    pub fps: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Ranges,
    Groups,
}

pub trait AnimationSource {
    fn kind(&self) -> SourceKind;
    fn has_clip(&self, clip: &str) -> bool;
    /// Start `clip`. `None` if the source does not know it.
    fn start(&mut self, clip: &str, looped: bool, rate: f32) -> Option<ClipTiming>;
    fn stop(&mut self, clip: &str);
    /// `Some(speed)` enables blending between clips, `None` disables it.
    fn set_blending(&mut self, speed: Option<f32>);
}

/// A skeleton with named animation ranges.
pub trait Skeleton {
    fn range(&self, name: &str) -> Option<FrameRange>;
    /// Begin the range; returns its frame rate if known.
    fn begin_animation(&mut self, name: &str, looped: bool, rate: f32) -> Option<f32>;
    fn stop_animation(&mut self);
    fn enable_blending(&mut self, speed: f32);
    fn disable_blending(&mut self) {}
}

/// A self-contained clip object.
pub trait ClipGroup {
    fn start(&mut self, looped: bool, rate: f32);
    fn stop(&mut self);
    fn frame_range(&self) -> FrameRange;
    fn fps(&self) -> Option<f32>;
    fn set_blending(&mut self, speed: Option<f32>);
}

pub struct RangeAnimations<S> {
    skeleton: S,
}

impl<S: Skeleton> RangeAnimations<S> {
    pub fn new(skeleton: S) -> Self {
        Self { skeleton }
    }

    pub fn skeleton(&self) -> &S {
        &self.skeleton
    }
}

impl<S: Skeleton> AnimationSource for RangeAnimations<S> {
    fn kind(&self) -> SourceKind {
        SourceKind::Ranges
    }

    fn has_clip(&self, clip: &str) -> bool {
        self.skeleton.range(clip).is_some()
    }

    fn start(&mut self, clip: &str, looped: bool, rate: f32) -> Option<ClipTiming> {
        let range = self.skeleton.range(clip)?;
        let fps = self
            .skeleton
            .begin_animation(clip, looped, rate)
            .unwrap_or(DEFAULT_CLIP_FPS);
        Some(ClipTiming {
            frames: range.frames(),
            fps,
        })
    }

    fn stop(&mut self, _clip: &str) {
        // One skeleton plays one range at a time.
        self.skeleton.stop_animation();
    }

    fn set_blending(&mut self, speed: Option<f32>) {
        match speed {
            Some(speed) => self.skeleton.enable_blending(speed),
            None => self.skeleton.disable_blending(),
        }
    }
}

pub struct GroupAnimations<G> {
    groups: BTreeMap<String, G>,
}

impl<G: ClipGroup> GroupAnimations<G> {
    pub fn new(groups: BTreeMap<String, G>) -> Self {
        Self { groups }
    }

    pub fn insert(&mut self, name: impl Into<String>, group: G) {
        self.groups.insert(name.into(), group);
    }

    pub fn get(&self, name: &str) -> Option<&G> {
        self.groups.get(name)
    }
}

impl<G: ClipGroup> FromIterator<(String, G)> for GroupAnimations<G> {
    fn from_iter<I: IntoIterator<Item = (String, G)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<G: ClipGroup> AnimationSource for GroupAnimations<G> {
    fn kind(&self) -> SourceKind {
        SourceKind::Groups
    }

    fn has_clip(&self, clip: &str) -> bool {
        self.groups.contains_key(clip)
    }

    fn start(&mut self, clip: &str, looped: bool, rate: f32) -> Option<ClipTiming> {
        let group = self.groups.get_mut(clip)?;
        group.start(looped, rate);
        Some(ClipTiming {
            frames: group.frame_range().frames(),
            fps: group.fps().unwrap_or(DEFAULT_CLIP_FPS),
        })
    }

    fn stop(&mut self, clip: &str) {
        if let Some(group) = self.groups.get_mut(clip) {
            group.stop();
        }
    }

    fn set_blending(&mut self, speed: Option<f32>) {
        self.groups
            .values_mut()
            .for_each(|group| group.set_blending(speed));
    }
}
