pub mod action;
pub mod animation;
pub mod camera;
pub mod constants;
pub mod controller;
pub mod error;
pub mod host;
pub mod input;
pub mod intent;
pub mod kinematics;
pub mod motion;
pub mod rapier;
pub mod scene;
pub mod selector;
pub mod settings;
pub mod slope;
pub mod step;
pub mod types;
pub mod utils;

pub use action::{ActionKind, ActionMap, ActionProfile, ActionSpec, ActionTable};
pub use animation::{
    AnimationSource, ClipGroup, FrameRange, GroupAnimations, RangeAnimations, Skeleton,
};
pub use camera::{ArcCamera, CameraRig};
pub use constants::{
    DEFAULT_GRAVITY, DEFAULT_MAX_SLOPE_LIMIT_DEG, DEFAULT_MIN_SLOPE_LIMIT_DEG,
    DEFAULT_STEP_OFFSET,
};
pub use controller::CharacterController;
pub use error::{ControllerError, Result};
pub use host::{OrbitCamera, SceneGraph, SoundHandle, Stage};
pub use intent::Intent;
pub use rapier::{CapsuleDef, ColliderShapeDef, RapierStage, StaticDef, collider_from_def};
pub use settings::{Settings, Speeds, Tuning};
pub use slope::{SlopeClass, SlopeLimits};
pub use types::{CameraMode, Contact, NodeId, PickHit, PickRay, SoundId, Vec3};
