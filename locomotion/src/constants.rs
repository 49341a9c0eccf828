/*!
Controller defaults and tolerances.

These constants centralize the parameters used by the vertical kinematics, the slope
classifier, the step climber and the camera rig. Keeping them together makes tuning
easier.

Notes
- Distances are in scene units (meters for the rapier host), time in seconds.
- The debounce counters and the free-fall epsilon were tuned at ~60 fps. They are the
  defaults of `settings::Tuning`, so override them there for other frame rates.
*/

/// Pseudo-gravity used for falls and jumps (units per second squared).
pub const DEFAULT_GRAVITY: f32 = 9.8;

/// Slopes up to this angle (degrees) are walked on as normal ground.
pub const DEFAULT_MIN_SLOPE_LIMIT_DEG: f32 = 30.0;

/// Rising contacts at or above this angle (degrees) are steps or walls.
pub const DEFAULT_MAX_SLOPE_LIMIT_DEG: f32 = 45.0;

/// The avatar steps up a stair only if the total rise stays below this value.
pub const DEFAULT_STEP_OFFSET: f32 = 0.25;

/// Free-fall distance used on frames where the host reports `dt == 0`.
///
/// The first frame after registration always has a zero delta; a long probe makes
/// sure an avatar spawned above the ground finds it straight away.
pub const FALLBACK_PROBE_DISTANCE: f32 = 5.0;

/// Idle fall time seeded on `start()` so the first idle probe is not zero.
pub const START_IDLE_FALL_TIME: f32 = 0.001;

/// Displacements shorter than this are not sent to the move primitive.
pub const MIN_MOVE_DISTANCE: f32 = 0.001;

/// Idle downward probes shorter than this are skipped.
///
/// Sweeping down a few millimeters against a surface pushes the avatar up instead.
pub const MIN_IDLE_PROBE_DISTANCE: f32 = 0.01;

/// Componentwise tolerance when comparing actual and desired displacement.
pub const DEFAULT_FREE_FALL_EPSILON: f32 = 0.001;

/// Consecutive free-fall frames required before the fall animation is selected.
pub const DEFAULT_FALL_FRAME_MIN: u32 = 50;

/// Consecutive non-falling idle frames required before the avatar counts as grounded.
pub const DEFAULT_GROUND_FRAME_MAX: u32 = 10;

/// Distance kept between the camera and an obstruction it was pulled in front of.
pub const DEFAULT_CAMERA_SKIN: f32 = 0.5;

/// Number of frames over which an elastic camera closes the gap to an obstruction.
pub const DEFAULT_ELASTIC_STEPS: u32 = 50;

/// Remaining camera gap under which the elastic camera snaps instead of easing.
pub const ELASTIC_SNAP_DISTANCE: f32 = 1.0;

/// Frame rate assumed when an animation source cannot report one.
pub const DEFAULT_CLIP_FPS: f32 = 30.0;

/// Key name stored for actions that have no keyboard binding.
pub const UNBOUND_KEY: &str = "na";
