use std::cell::RefCell;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::rc::Rc;

use approx::assert_relative_eq;

use super::*;
use crate::action::ActionSpec;
use crate::animation::FrameRange;
use crate::camera::ArcCamera;
use crate::error::ControllerError;
use crate::host::SceneGraph;
use crate::types::{PickHit, PickRay};

const AVATAR: NodeId = NodeId(1);
const DT: f32 = 1.0 / 60.0;

#[derive(Clone, Copy, Debug)]
enum Terrain {
    Flat,
    /// Ground only where `z >= edge`.
    Cliff { edge: f32 },
    /// Rises towards -Z from `z = 0`.
    Ramp { slope_deg: f32 },
    /// Treads of `depth` rising `rise` each towards -Z from `z = 0`.
    Stairs { rise: f32, depth: f32 },
}

impl Terrain {
    fn height(&self, z: f32) -> f32 {
        match *self {
            Terrain::Flat => 0.0,
            Terrain::Cliff { edge } => {
                if z >= edge {
                    0.0
                } else {
                    -1000.0
                }
            }
            Terrain::Ramp { slope_deg } => (-z).max(0.0) * slope_deg.to_radians().tan(),
            Terrain::Stairs { rise, depth } => (-z / depth).max(0.0).ceil() * rise,
        }
    }

    fn normal(&self, at: &Vec3) -> Vec3 {
        match *self {
            Terrain::Ramp { slope_deg } if at.z < 0.0 => {
                let a = slope_deg.to_radians();
                Vec3::new(0.0, a.cos(), a.sin())
            }
            _ => Vec3::y(),
        }
    }
}

struct Occluder {
    node: NodeId,
    center: Vec3,
    radius: f32,
    visible: bool,
    collidable: bool,
}

/// A heightfield world with one avatar. Blocked moves slide along the surface and end
/// on it.
struct Field {
    terrain: Terrain,
    position: Vec3,
    yaw: f32,
    avatar_visible: bool,
    root_is_mesh: bool,
    occluders: Vec<Occluder>,
}

impl Field {
    fn new(terrain: Terrain) -> Self {
        Self {
            terrain,
            position: Vec3::zeros(),
            yaw: 0.0,
            avatar_visible: true,
            root_is_mesh: true,
            occluders: Vec::new(),
        }
    }

    fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    fn occluder(&self, node: NodeId) -> Option<&Occluder> {
        self.occluders.iter().find(|o| o.node == node)
    }
}

impl SceneGraph for Field {
    fn parent(&self, _node: NodeId) -> Option<NodeId> {
        None
    }
    fn children(&self, _node: NodeId) -> Vec<NodeId> {
        Vec::new()
    }
    fn is_mesh(&self, node: NodeId) -> bool {
        node != AVATAR || self.root_is_mesh
    }
    fn has_skeleton(&self, _node: NodeId) -> bool {
        false
    }
}

impl Stage for Field {
    fn position(&self, node: NodeId) -> Vec3 {
        self.occluder(node).map_or(self.position, |o| o.center)
    }
    fn set_position(&mut self, _node: NodeId, position: Vec3) {
        self.position = position;
    }
    fn yaw(&self, _node: NodeId) -> f32 {
        self.yaw
    }
    fn set_yaw(&mut self, _node: NodeId, yaw: f32) {
        self.yaw = yaw;
    }

    fn move_with_collisions(&mut self, _node: NodeId, d: Vec3) {
        let from = self.position;
        let free = from + d;
        if free.y >= self.terrain.height(free.z) {
            self.position = free;
            return;
        }
        let n = self.terrain.normal(&from);
        let mut to = from + (d - n * d.dot(&n));
        to.y = self.terrain.height(to.z);
        self.position = to;
    }

    fn multi_pick(&self, ray: &PickRay, exclude: NodeId) -> Vec<PickHit> {
        let mut hits: Vec<PickHit> = self
            .occluders
            .iter()
            .filter(|o| o.node != exclude)
            .filter_map(|o| {
                let t = (o.center - ray.origin).dot(&ray.direction);
                let closest = (ray.origin + ray.direction * t - o.center).norm();
                if closest > o.radius {
                    return None;
                }
                let distance = t - (o.radius * o.radius - closest * closest).sqrt();
                (0.0..=ray.length).contains(&distance).then(|| PickHit {
                    node: o.node,
                    point: ray.origin + ray.direction * distance,
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn is_visible(&self, node: NodeId) -> bool {
        match self.occluder(node) {
            Some(o) => o.visible,
            None => self.avatar_visible,
        }
    }
    fn set_visible(&mut self, node: NodeId, visible: bool) {
        match self.occluders.iter_mut().find(|o| o.node == node) {
            Some(o) => o.visible = visible,
            None => self.avatar_visible = visible,
        }
    }
    fn is_collidable(&self, node: NodeId) -> bool {
        self.occluder(node).is_some_and(|o| o.collidable)
    }
}

type Log = Rc<RefCell<Vec<String>>>;

struct Clip {
    name: &'static str,
    log: Log,
}

impl ClipGroup for Clip {
    fn start(&mut self, _looped: bool, rate: f32) {
        self.log.borrow_mut().push(format!("start {} {rate}", self.name));
    }
    fn stop(&mut self) {
        self.log.borrow_mut().push(format!("stop {}", self.name));
    }
    fn frame_range(&self) -> FrameRange {
        FrameRange::new(0.0, 30.0)
    }
    fn fps(&self) -> Option<f32> {
        Some(30.0)
    }
    fn set_blending(&mut self, _speed: Option<f32>) {}
}

struct Step {
    log: Log,
}

impl SoundHandle for Step {
    fn play(&mut self) {
        self.log.borrow_mut().push("play step".to_string());
    }
    fn stop(&mut self) {
        self.log.borrow_mut().push("mute step".to_string());
    }
    fn set_loop(&mut self, looped: bool) {
        self.log.borrow_mut().push(format!("loop {looped}"));
    }
}

fn clips(log: &Log) -> GroupAnimations<Clip> {
    ["idle", "walk", "run", "fall", "idleJump", "runJump", "slideBack", "turnLeft"]
        .into_iter()
        .map(|name| {
            (
                name.to_string(),
                Clip {
                    name,
                    log: log.clone(),
                },
            )
        })
        .collect()
}

fn started(field: &mut Field) -> CharacterController {
    let mut cc = CharacterController::new(&*field, AVATAR, None, false).unwrap();
    cc.start(field);
    cc
}

fn with_camera(field: &mut Field, camera: ArcCamera) -> CharacterController {
    let mut cc =
        CharacterController::new(&*field, AVATAR, Some(Box::new(camera)), false).unwrap();
    cc.start(field);
    cc
}

/// Camera behind the avatar (at -Z), level with the target.
fn camera_behind(radius: f32) -> ArcCamera {
    ArcCamera::new(-FRAC_PI_2, FRAC_PI_2, radius, Vec3::zeros())
}

fn run_frames(cc: &mut CharacterController, field: &mut Field, frames: usize) {
    for _ in 0..frames {
        cc.update(DT, field);
    }
}

fn settle(cc: &mut CharacterController, field: &mut Field) {
    cc.update(0.0, field);
    run_frames(cc, field, 30);
}

#[test]
fn spawned_avatar_settles_on_ground() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    assert!(!cc.is_grounded());

    settle(&mut cc, &mut field);
    assert!(cc.is_grounded());
    assert_eq!(cc.action(), Some(ActionKind::Idle));
    assert_eq!(field.position, Vec3::zeros());
}

#[test]
fn walking_covers_walk_speed_per_second() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 60);
    assert_eq!(cc.action(), Some(ActionKind::Walk));
    assert_eq!(cc.contact(), Contact::Grounded);
    // no camera: yaw 0 walks towards -Z
    assert_relative_eq!(field.position.z, -3.0, epsilon = 1.0e-3);
    assert_eq!(field.position.y, 0.0);
}

#[test]
fn speed_modifier_runs() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.run(true);
    run_frames(&mut cc, &mut field, 60);
    assert_eq!(cc.action(), Some(ActionKind::Run));
    assert_relative_eq!(field.position.z, -6.0, epsilon = 1.0e-3);

    cc.run(false);
    cc.walk_back(true);
    run_frames(&mut cc, &mut field, 60);
    assert_eq!(cc.action(), Some(ActionKind::WalkBack));
    assert_relative_eq!(field.position.z, -4.5, epsilon = 1.0e-3);
}

#[test]
fn strafing_picks_side_profile() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.strafe_left(true);
    run_frames(&mut cc, &mut field, 60);
    assert_eq!(cc.action(), Some(ActionKind::StrafeLeft));
    assert_relative_eq!(field.position.x, 1.5, epsilon = 1.0e-3);

    cc.strafe_left(false);
    cc.strafe_right_fast(true);
    run_frames(&mut cc, &mut field, 60);
    assert_eq!(cc.action(), Some(ActionKind::StrafeRightFast));
    assert_relative_eq!(field.position.x, -1.5, epsilon = 1.0e-3);
}

#[test]
fn fall_animation_waits_for_debounce() {
    let mut field = Field::new(Terrain::Cliff { edge: -0.01 });
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 50);
    assert!(cc.in_free_fall());
    assert_eq!(cc.motion().fall_frames, 50);
    assert_eq!(cc.action(), Some(ActionKind::Walk));

    cc.update(DT, &mut field);
    assert_eq!(cc.action(), Some(ActionKind::Fall));
    assert_eq!(cc.contact(), Contact::FreeFall);

    // free fall keeps going without intent
    cc.walk(false);
    let y = field.position.y;
    cc.update(DT, &mut field);
    assert!(field.position.y < y);
}

#[test]
fn low_steps_are_climbed() {
    let mut field = Field::new(Terrain::Stairs {
        rise: 0.1,
        depth: 0.5,
    });
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.walk(true);
    let mut stepped = false;
    for _ in 0..60 {
        cc.update(DT, &mut field);
        stepped |= cc.contact() == Contact::Stepping;
    }
    assert!(stepped);
    assert!(field.position.y >= 0.5, "climbed to {}", field.position.y);
    assert!(field.position.z < -2.9);
}

#[test]
fn walls_roll_back() {
    let mut field = Field::new(Terrain::Stairs {
        rise: 1.0,
        depth: 100.0,
    });
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 30);
    assert_eq!(cc.contact(), Contact::Blocked);
    assert_eq!(field.position, Vec3::zeros());
    assert!(!cc.motion().step.is_climbing());
}

#[test]
fn zero_step_offset_blocks_any_step() {
    let mut field = Field::new(Terrain::Stairs {
        rise: 0.1,
        depth: 0.5,
    });
    let mut cc = started(&mut field);
    cc.set_step_offset(0.0);
    settle(&mut cc, &mut field);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 10);
    assert_eq!(cc.contact(), Contact::Blocked);
    assert_eq!(field.position.y, 0.0);
}

#[test]
fn idle_jump_lands_and_clears_request() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.jump();
    cc.update(DT, &mut field);
    assert_eq!(cc.action(), Some(ActionKind::IdleJump));
    assert_eq!(cc.contact(), Contact::Jumping);

    let mut apex: f32 = 0.0;
    for _ in 0..120 {
        cc.update(DT, &mut field);
        apex = apex.max(field.position.y);
    }
    // v²/2g for the default jump speed
    assert_relative_eq!(apex, 36.0 / (2.0 * 9.8), epsilon = 0.1);
    assert!(!cc.intent().jump);
    assert_eq!(field.position.y, 0.0);
}

#[test]
fn jump_after_an_interrupted_jump_launches_again() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.jump();
    run_frames(&mut cc, &mut field, 40);
    assert!(field.position.y > 1.0);

    // dropped mid-flight: the avatar falls back as idle
    cc.idle();
    run_frames(&mut cc, &mut field, 120);
    assert_eq!(field.position.y, 0.0);
    assert!(!cc.motion().jump.airborne);

    cc.jump();
    let mut apex: f32 = 0.0;
    for _ in 0..60 {
        cc.update(DT, &mut field);
        apex = apex.max(field.position.y);
    }
    assert_relative_eq!(apex, 36.0 / (2.0 * 9.8), epsilon = 0.1);
}

#[test]
fn restart_drops_a_jump_in_flight() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.jump();
    run_frames(&mut cc, &mut field, 20);
    cc.stop();
    cc.start(&mut field);
    assert!(!cc.intent().jump);
    assert!(!cc.motion().jump.airborne);
    assert_eq!(cc.motion().jump.time, 0.0);
}

#[test]
fn walking_jump_carries_momentum() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 10);
    let z = field.position.z;

    cc.jump();
    cc.update(DT, &mut field);
    assert_eq!(cc.action(), Some(ActionKind::RunJump));
    assert!(field.position.y > 0.0);
    assert_relative_eq!(field.position.z, z - 0.05, epsilon = 1.0e-4);

    // the jump carries its own momentum
    cc.walk(false);
    run_frames(&mut cc, &mut field, 120);
    assert!(!cc.intent().jump);
    assert!(!cc.motion().was_walking);
}

#[test]
fn steep_slope_slides_back() {
    let a = 40.0_f32;
    let start = Vec3::new(0.0, a.to_radians().tan(), -1.0);
    let mut field = Field::new(Terrain::Ramp { slope_deg: a }).at(start);
    let mut cc = started(&mut field);

    let mut slid = false;
    cc.update(0.0, &mut field);
    for _ in 0..30 {
        cc.update(DT, &mut field);
        slid |= cc.action() == Some(ActionKind::SlideBack);
    }
    assert!(slid);
    assert!(field.position.z > start.z);
}

#[test]
fn gentle_slope_holds_position() {
    let a = 20.0_f32;
    let start = Vec3::new(0.0, a.to_radians().tan(), -1.0);
    let mut field = Field::new(Terrain::Ramp { slope_deg: a }).at(start);
    let mut cc = started(&mut field);

    settle(&mut cc, &mut field);
    assert!(cc.is_grounded());
    assert_ne!(cc.action(), Some(ActionKind::SlideBack));
    assert_eq!(field.position, start);
}

#[test]
fn walking_up_a_steep_ramp_is_steep_contact() {
    let mut field = Field::new(Terrain::Ramp { slope_deg: 40.0 });
    let mut cc = started(&mut field);
    settle(&mut cc, &mut field);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 5);
    assert_eq!(cc.contact(), Contact::Steep);
    assert!(field.position.y > 0.0);
}

#[test]
fn third_person_walks_away_from_camera() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = with_camera(&mut field, camera_behind(5.0));
    settle(&mut cc, &mut field);
    assert_relative_eq!(field.yaw, PI, epsilon = 1.0e-5);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 20);
    assert!(field.position.z > 0.9);
    let camera = cc.camera().unwrap();
    assert_relative_eq!(camera.target(), field.position, epsilon = 1.0e-6);
}

#[test]
fn third_person_turn_orbits_camera() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = with_camera(&mut field, camera_behind(5.0));
    settle(&mut cc, &mut field);

    cc.turn_left(true);
    for _ in 0..10 {
        cc.update(0.1, &mut field);
    }
    assert_eq!(cc.action(), Some(ActionKind::TurnLeft));
    let alpha = cc.camera().unwrap().alpha();
    assert_relative_eq!(alpha, -FRAC_PI_2 + PI / 8.0, epsilon = 1.0e-4);

    cc.turn_left_fast(true);
    cc.update(0.1, &mut field);
    let fast = cc.camera().unwrap().alpha() - alpha;
    // the modifier doubles the base turn rate
    assert_relative_eq!(fast, 0.1 * PI / 8.0 * 2.0, epsilon = 1.0e-4);
}

#[test]
fn camera_control_toggles_player_input() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = with_camera(&mut field, camera_behind(5.0));
    settle(&mut cc, &mut field);
    assert!(cc.is_camera_control_enabled());
    assert!(cc.camera().unwrap().user_input());

    cc.disable_camera_control();
    cc.disable_camera_control();
    assert!(!cc.is_camera_control_enabled());
    assert!(!cc.camera().unwrap().user_input());

    // turn keys still orbit the camera
    cc.turn_left(true);
    for _ in 0..10 {
        cc.update(0.1, &mut field);
    }
    assert_relative_eq!(
        cc.camera().unwrap().alpha(),
        -FRAC_PI_2 + PI / 8.0,
        epsilon = 1.0e-4
    );

    cc.enable_camera_control();
    assert!(cc.camera().unwrap().user_input());
}

#[test]
fn camera_control_without_camera_only_records_preference() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    cc.disable_camera_control();
    assert!(!cc.is_camera_control_enabled());
    assert!(cc.camera().is_none());
}

#[test]
fn turning_off_uses_fixed_headings() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = with_camera(&mut field, camera_behind(5.0));
    cc.set_turning_off(true);
    settle(&mut cc, &mut field);
    // camera heading is PI for this camera
    cc.walk(true);
    cc.turn_right(true);
    cc.update(DT, &mut field);
    assert_relative_eq!(field.yaw, PI + FRAC_PI_4, epsilon = 1.0e-5);
    assert_relative_eq!(cc.camera().unwrap().alpha(), -FRAC_PI_2);

    cc.idle();
    cc.walk_back(true);
    let z = field.position.z;
    cc.update(DT, &mut field);
    assert_relative_eq!(field.yaw, 2.0 * PI, epsilon = 1.0e-5);
    // faces the camera and walks towards it
    assert!(field.position.z < z);
    assert_eq!(cc.action(), Some(ActionKind::Walk));
}

#[test]
fn top_down_turn_latches_direction() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = with_camera(&mut field, camera_behind(5.0));
    cc.set_mode(CameraMode::TopDown);
    settle(&mut cc, &mut field);

    cc.turn_left(true);
    cc.update(0.1, &mut field);
    assert!(cc.motion().is_turning);
    let sign = cc.motion().turn_sign;
    for _ in 0..40 {
        cc.update(0.1, &mut field);
    }
    assert_eq!(cc.motion().turn_sign, sign);
    // top down never orbits the camera
    assert_relative_eq!(cc.camera().unwrap().alpha(), -FRAC_PI_2);

    cc.turn_left(false);
    assert!(!cc.motion().is_turning);
}

#[test]
fn elastic_camera_eases_in_front_of_occluder() {
    let mut field = Field::new(Terrain::Flat);
    field.occluders.push(Occluder {
        node: NodeId(7),
        center: Vec3::new(0.0, 0.0, -2.5),
        radius: 0.5,
        visible: true,
        collidable: true,
    });
    let mut camera = camera_behind(5.0);
    camera.check_collisions = false;
    let cc = with_camera(&mut field, camera);

    // pivot at z = -2, 3 units from the camera, closed over 50 steps
    assert_relative_eq!(cc.camera().unwrap().radius(), 5.0 - 3.0 / 50.0, epsilon = 1.0e-4);
}

#[test]
fn occluders_are_hidden_and_restored() {
    let mut field = Field::new(Terrain::Flat);
    field.occluders.push(Occluder {
        node: NodeId(7),
        center: Vec3::new(0.0, 0.0, -2.5),
        radius: 0.5,
        visible: true,
        collidable: false,
    });
    let mut cc = CharacterController::new(&field, AVATAR, Some(Box::new(camera_behind(5.0))), false)
        .unwrap();
    cc.set_camera_elasticity(false);
    cc.make_obstruction_invisible(true);
    cc.start(&mut field);
    assert!(!field.is_visible(NodeId(7)));
    assert_eq!(cc.camera_rig().hidden(), &[NodeId(7)]);

    field.occluders[0].center = Vec3::new(10.0, 0.0, 0.0);
    cc.update(DT, &mut field);
    assert!(field.is_visible(NodeId(7)));
    assert!(cc.camera_rig().hidden().is_empty());
}

#[test]
fn first_person_forces_third_person_and_restores() {
    let mut field = Field::new(Terrain::Flat);
    let mut camera = camera_behind(2.0);
    camera.lower_radius_limit = 2.0;
    camera.check_collisions = true;
    let mut cc = CharacterController::new(&field, AVATAR, Some(Box::new(camera)), false).unwrap();
    cc.set_mode(CameraMode::TopDown);
    cc.start(&mut field);

    assert!(cc.camera_rig().in_first_person());
    assert_eq!(cc.mode(), CameraMode::ThirdPerson);
    assert!(!field.avatar_visible);
    assert!(!cc.camera().unwrap().check_collisions());

    cc.camera_mut().unwrap().set_radius(5.0);
    cc.update(DT, &mut field);
    assert!(!cc.camera_rig().in_first_person());
    assert_eq!(cc.mode(), CameraMode::TopDown);
    assert!(field.avatar_visible);
    assert!(cc.camera().unwrap().check_collisions());
}

#[test]
fn update_is_inert_unless_started() {
    let mut field = Field::new(Terrain::Cliff { edge: 10.0 });
    let mut cc = CharacterController::new(&field, AVATAR, None, false).unwrap();
    cc.walk(true);
    cc.update(DT, &mut field);
    assert_eq!(field.position, Vec3::zeros());

    cc.start(&mut field);
    assert!(!cc.intent().walk);
    cc.update(0.0, &mut field);
    assert!(field.position.y < 0.0);

    cc.stop();
    cc.stop();
    let p = field.position;
    cc.update(DT, &mut field);
    assert_eq!(field.position, p);
    assert!(!cc.is_started());
}

#[test]
fn keyboard_follows_lifecycle() {
    let mut field = Field::new(Terrain::Flat);
    let mut cc = CharacterController::new(&field, AVATAR, None, false).unwrap();
    cc.key_down("w", false);
    assert!(!cc.intent().walk);

    cc.start(&mut field);
    cc.key_down("W", false);
    assert!(cc.intent().walk);
    cc.key_up("w");
    assert!(!cc.intent().walk);

    cc.enable_keyboard(false);
    cc.key_down("w", false);
    assert!(!cc.intent().walk);
    assert!(!cc.settings().keyboard);
}

#[test]
fn animations_follow_the_state_machine() {
    let log: Log = Rc::default();
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    cc.set_animation_groups(clips(&log), None);
    let step = cc.add_sound(Box::new(Step { log: log.clone() }));
    cc.set_sound(step);
    assert!(log.borrow().iter().any(|e| e == "loop false"));

    settle(&mut cc, &mut field);
    assert_eq!(cc.playing(), Some(ActionKind::Idle));

    log.borrow_mut().clear();
    cc.walk(true);
    cc.update(DT, &mut field);
    assert_eq!(*log.borrow(), vec!["stop idle", "start walk 1", "play step"]);

    // walk-back has no clip: nothing starts but walk stops
    log.borrow_mut().clear();
    cc.walk(false);
    cc.walk_back(true);
    cc.update(DT, &mut field);
    assert_eq!(*log.borrow(), vec!["stop walk", "mute step"]);
    assert_eq!(cc.playing(), Some(ActionKind::WalkBack));
}

#[test]
fn stop_halts_the_playing_clip() {
    let log: Log = Rc::default();
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    cc.set_animation_groups(clips(&log), None);
    let step = cc.add_sound(Box::new(Step { log: log.clone() }));
    cc.set_sound(step);
    settle(&mut cc, &mut field);

    cc.walk(true);
    run_frames(&mut cc, &mut field, 5);
    log.borrow_mut().clear();

    cc.stop();
    assert_eq!(*log.borrow(), vec!["stop walk", "mute step"]);
    assert_eq!(cc.playing(), None);

    log.borrow_mut().clear();
    cc.start(&mut field);
    run_frames(&mut cc, &mut field, 30);
    assert_eq!(log.borrow().first().map(String::as_str), Some("start idle 1"));
    assert!(!log.borrow().iter().any(|e| e == "stop walk"));
}

#[test]
fn paused_animation_keeps_locomotion() {
    let log: Log = Rc::default();
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    cc.set_animation_groups(clips(&log), None);
    settle(&mut cc, &mut field);

    cc.pause_anim();
    assert!(cc.is_anim_paused());
    assert_eq!(log.borrow().last().map(String::as_str), Some("stop idle"));

    log.borrow_mut().clear();
    cc.walk(true);
    run_frames(&mut cc, &mut field, 10);
    assert!(log.borrow().is_empty());
    assert!(field.position.z < 0.0);

    cc.resume_anim();
    cc.update(DT, &mut field);
    assert_eq!(*log.borrow(), vec!["start walk 1"]);
}

#[test]
fn action_map_replaces_bindings() {
    let log: Log = Rc::default();
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);

    let mut map = ActionMap::new();
    map.insert(ActionKind::Walk, ActionSpec::clip("run"));
    cc.set_action_map(&map);
    assert!(cc.action_map().is_empty());

    cc.set_animation_groups(clips(&log), Some(&map));
    let bound = cc.action_map();
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[&ActionKind::Walk].clip.as_deref(), Some("run"));
    assert!(!cc.action_table().get(ActionKind::Idle).exists);

    cc.set_action_anim(ActionKind::TurnLeft, Some("turnLeft"), Some(0.5), None);
    assert_eq!(cc.action_table().get(ActionKind::TurnLeftFast).rate, 1.0);
    cc.set_action_anim(ActionKind::Idle, Some("dance"), None, None);
    assert!(!cc.action_table().get(ActionKind::Idle).exists);
}

#[test]
fn settings_round_trip_between_controllers() {
    let mut field = Field::new(Terrain::Flat);
    let mut a = CharacterController::new(&field, AVATAR, Some(Box::new(camera_behind(5.0))), false)
        .unwrap();
    a.set_gravity(5.0);
    a.set_step_offset(0.4);
    a.set_turn_speed(90.0);
    a.set_right_fast_speed(7.0);
    a.set_mode(CameraMode::TopDown);
    a.set_slope_limits(20.0, 50.0).unwrap();
    a.set_camera_target(Vec3::new(0.0, 1.8, 0.0));

    let json = a.settings().to_json().unwrap();
    let mut b = CharacterController::new(&field, AVATAR, Some(Box::new(camera_behind(5.0))), false)
        .unwrap();
    b.set_settings(&Settings::from_json(&json).unwrap()).unwrap();
    assert_eq!(b.gravity(), 5.0);
    assert_eq!(b.step_offset(), 0.4);
    assert_eq!(b.mode(), CameraMode::TopDown);
    assert_relative_eq!(b.slope_limits().min_degrees(), 20.0, epsilon = 1.0e-3);
    assert_relative_eq!(b.slope_limits().max_degrees(), 50.0, epsilon = 1.0e-3);
    assert_relative_eq!(
        b.action_table().get(ActionKind::TurnRight).speed,
        FRAC_PI_2,
        epsilon = 1.0e-5
    );
    assert_eq!(b.action_table().get(ActionKind::StrafeRightFast).speed, 7.0);
    assert_eq!(b.action_table().get(ActionKind::StrafeLeftFast).speed, 3.0);

    b.start(&mut field);
    assert_relative_eq!(b.camera().unwrap().target(), Vec3::new(0.0, 1.8, 0.0));
}

#[test]
fn invalid_settings_change_nothing() {
    let field = Field::new(Terrain::Flat);
    let mut cc = CharacterController::new(&field, AVATAR, None, false).unwrap();
    let bad = Settings {
        min_slope_limit: 60.0,
        max_slope_limit: 45.0,
        gravity: 1.0,
        ..Settings::default()
    };
    let err = cc.set_settings(&bad).unwrap_err();
    assert!(matches!(err, ControllerError::InvalidSlopeLimits { .. }));
    assert_eq!(cc.gravity(), 9.8);
}

#[test]
fn no_camera_forces_top_down() {
    let field = Field::new(Terrain::Flat);
    let mut cc = CharacterController::new(&field, AVATAR, None, true).unwrap();
    assert_eq!(cc.mode(), CameraMode::TopDown);
    cc.set_mode(CameraMode::ThirdPerson);
    assert_eq!(cc.mode(), CameraMode::TopDown);
}

#[test]
fn avatar_root_must_be_a_mesh() {
    let mut field = Field::new(Terrain::Flat);
    field.root_is_mesh = false;
    let err = CharacterController::new(&field, AVATAR, None, false)
        .err()
        .unwrap();
    assert!(matches!(err, ControllerError::InvalidAvatar { .. }));
}

#[test]
fn changing_avatar_resets_profiles() {
    let log: Log = Rc::default();
    let mut field = Field::new(Terrain::Flat);
    let mut cc = started(&mut field);
    cc.set_animation_groups(clips(&log), None);
    let step = cc.add_sound(Box::new(Step { log: log.clone() }));
    cc.set_sound(step);
    cc.set_walk_speed(10.0);

    cc.set_avatar(&field, NodeId(2), false).unwrap();
    assert_eq!(cc.avatar(), NodeId(2));
    assert!(!cc.action_table().any_exists());
    assert_eq!(cc.action_table().get(ActionKind::Walk).speed, 3.0);
    assert_eq!(cc.action_table().get(ActionKind::Walk).sound, Some(step));
    assert_eq!(cc.action_table().get(ActionKind::Idle).sound, None);
}
