//! Rapier-backed `Stage` over immutable world geometry.
//!
//! Static geometry is described by `StaticDef`s and inserted once into a query-only world
//! (no dynamics). Avatars are capsules moved with Rapier's `KinematicCharacterController`;
//! camera picks are per-collider ray casts.
//!
//! Conventions
//! - Units are meters.
//! - An avatar's node position is the center of its capsule.
//! - Every static is its own scene node, identified by `StaticDef::id`.

use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

use rapier3d::{
    control::{CharacterLength, KinematicCharacterController},
    na::{Isometry3, Point3, Translation3, UnitQuaternion},
    parry::{query::RayCast, utils::hashmap::HashMap},
    prelude::{
        BroadPhaseBvh, Capsule, Collider, ColliderBuilder, ColliderHandle, ColliderSet, HalfSpace,
        IntegrationParameters, NarrowPhase, QueryFilter, QueryPipeline, Ray, RigidBodySet,
        SharedShape, UnitVector,
    },
};

use crate::host::{SceneGraph, Stage};
use crate::types::{NodeId, PickHit, PickRay, Vec3};

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane; its normal is `rotation * +Y`.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },
    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Y-aligned cylinder (meters).
    CylinderY { radius: f32, half_height: f32 },
}

/// One immutable piece of world geometry.
#[derive(Clone, Debug)]
pub struct StaticDef {
    /// Node id of the static in the scene graph.
    pub id: u32,
    pub translation: Vec3,
    pub rotation: UnitQuaternion<f32>,
    pub shape: ColliderShapeDef,
    pub visible: bool,
    /// Blocks a collidable camera.
    pub camera_collidable: bool,
}

impl StaticDef {
    pub fn new(id: u32, translation: Vec3, shape: ColliderShapeDef) -> Self {
        Self {
            id,
            translation,
            rotation: UnitQuaternion::identity(),
            shape,
            visible: true,
            camera_collidable: true,
        }
    }

    pub fn rotated(mut self, rotation: UnitQuaternion<f32>) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn camera_passes_through(mut self) -> Self {
        self.camera_collidable = false;
        self
    }
}

/// Build a Rapier collider (identity local transform) from a `StaticDef`.
pub fn collider_from_def(def: &StaticDef) -> Collider {
    match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => {
            // n ⋅ x = dist, with dist = n ⋅ t + offset
            let n = def.rotation * Vec3::y();
            let dist = n.dot(&def.translation) + *offset_along_normal;
            let unit_n = UnitVector::new_normalize(n);
            ColliderBuilder::new(SharedShape::new(HalfSpace::new(unit_n)))
                .translation(unit_n.into_inner() * dist)
                .build()
        }
        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z).build()
        }
        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius).build(),
        ColliderShapeDef::CylinderY {
            radius,
            half_height,
        } => ColliderBuilder::cylinder(*half_height, *radius).build(),
    }
}

/// In-memory Rapier structures for scene queries and the KCC.
pub struct StaticQueryWorld {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
}

impl StaticQueryWorld {
    pub fn as_query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }
}

/// Insert `defs` as parentless colliders and build the broad phase over them.
///
/// Returns the world and the collider handle of each def, in input order.
pub fn build_static_query_world<'a>(
    defs: impl IntoIterator<Item = &'a StaticDef>,
    dt: f32,
) -> (StaticQueryWorld, Vec<ColliderHandle>) {
    let bodies = RigidBodySet::new();
    let mut colliders = ColliderSet::new();
    let mut handles = Vec::new();

    for def in defs {
        let mut collider = collider_from_def(def);
        if !matches!(def.shape, ColliderShapeDef::Plane { .. }) {
            collider.set_position(Isometry3::from_parts(
                Translation3::from(def.translation),
                def.rotation,
            ));
        }
        handles.push(colliders.insert(collider));
    }

    let mut broad_phase = BroadPhaseBvh::new();
    let mut events = Vec::new();
    broad_phase.update(
        &IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        },
        &colliders,
        &bodies,
        &handles,
        &[],
        &mut events,
    );

    let world = StaticQueryWorld {
        bodies,
        colliders,
        broad_phase,
        narrow_phase: NarrowPhase::default(),
    };
    (world, handles)
}

/// Avatar capsule dimensions (meters).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleDef {
    pub half_height: f32,
    pub radius: f32,
}

#[derive(Clone, Debug)]
struct NodeRecord {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    mesh: bool,
    skeleton: bool,
    position: Vec3,
    yaw: f32,
    visible: bool,
    see_able: bool,
    camera_collidable: bool,
    capsule: Option<CapsuleDef>,
}

impl NodeRecord {
    fn new(position: Vec3, mesh: bool) -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            mesh,
            skeleton: false,
            position,
            yaw: 0.0,
            visible: true,
            see_able: true,
            camera_collidable: false,
            capsule: None,
        }
    }
}

/// A headless stage: static world geometry plus kinematic avatars.
pub struct RapierStage {
    world: StaticQueryWorld,
    collider_nodes: HashMap<ColliderHandle, NodeId>,
    nodes: BTreeMap<NodeId, NodeRecord>,
    kcc: KinematicCharacterController,
    dt: f32,
    right_handed: bool,
}

impl RapierStage {
    /// Build the stage. `dt` is the nominal frame time handed to the KCC.
    pub fn build(statics: Vec<StaticDef>, dt: f32) -> Self {
        let (world, handles) = build_static_query_world(&statics, dt);

        let mut collider_nodes = HashMap::default();
        let mut nodes = BTreeMap::new();
        for (def, handle) in statics.iter().zip(handles) {
            let id = NodeId(def.id);
            collider_nodes.insert(handle, id);
            let mut record = NodeRecord::new(def.translation, true);
            record.visible = def.visible;
            record.camera_collidable = def.camera_collidable;
            nodes.insert(id, record);
        }
        log::info!("rapier stage built with {} statics", statics.len());

        let kcc = KinematicCharacterController {
            autostep: None,
            snap_to_ground: None,
            max_slope_climb_angle: FRAC_PI_2,
            offset: CharacterLength::Relative(0.025),
            ..KinematicCharacterController::default()
        };

        Self {
            world,
            collider_nodes,
            nodes,
            kcc,
            dt,
            right_handed: false,
        }
    }

    /// Add a movable capsule node.
    pub fn add_avatar(&mut self, id: NodeId, position: Vec3, capsule: CapsuleDef) {
        let mut record = NodeRecord::new(position, true);
        record.capsule = Some(capsule);
        self.nodes.insert(id, record);
    }

    /// Add a plain node under `parent`. `mesh == false` makes a transform node.
    pub fn add_node(&mut self, id: NodeId, parent: Option<NodeId>, mesh: bool) {
        let mut record = NodeRecord::new(Vec3::zeros(), mesh);
        record.parent = parent;
        self.nodes.insert(id, record);
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
    }

    pub fn set_skeleton(&mut self, id: NodeId, skeleton: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.skeleton = skeleton;
        }
    }

    /// Mark a node as fully transparent (still visible, never seen).
    pub fn set_see_able(&mut self, id: NodeId, see_able: bool) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.see_able = see_able;
        }
    }

    pub fn set_right_handed(&mut self, right_handed: bool) {
        self.right_handed = right_handed;
    }

    fn query_pipeline(&self) -> QueryPipeline<'_> {
        self.world.as_query_pipeline(QueryFilter::only_fixed())
    }
}

impl SceneGraph for RapierStage {
    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn is_mesh(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.mesh)
    }

    fn has_skeleton(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.skeleton)
    }
}

impl Stage for RapierStage {
    fn position(&self, node: NodeId) -> Vec3 {
        self.nodes
            .get(&node)
            .map_or_else(Vec3::zeros, |n| n.position)
    }

    fn set_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.position = position;
        }
    }

    fn yaw(&self, node: NodeId) -> f32 {
        self.nodes.get(&node).map_or(0.0, |n| n.yaw)
    }

    fn set_yaw(&mut self, node: NodeId, yaw: f32) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.yaw = yaw;
        }
    }

    fn move_with_collisions(&mut self, node: NodeId, displacement: Vec3) {
        let Some(record) = self.nodes.get(&node) else {
            return;
        };
        let Some(capsule) = record.capsule else {
            log::warn!("node {node:?} has no capsule, moving without collisions");
            let position = record.position + displacement;
            self.set_position(node, position);
            return;
        };

        let pose = Isometry3::translation(record.position.x, record.position.y, record.position.z);
        let corrected = {
            let query_pipeline = self.query_pipeline();
            self.kcc.move_shape(
                self.dt,
                &query_pipeline,
                &Capsule::new_y(capsule.half_height, capsule.radius),
                &pose,
                displacement,
                |_| {},
            )
        };
        let position = record.position + corrected.translation;
        self.set_position(node, position);
    }

    fn multi_pick(&self, ray: &PickRay, exclude: NodeId) -> Vec<PickHit> {
        let rapier_ray = Ray::new(Point3::from(ray.origin), ray.direction);
        let mut hits: Vec<PickHit> = self
            .world
            .colliders
            .iter()
            .filter_map(|(handle, collider)| {
                let node = *self.collider_nodes.get(&handle)?;
                if node == exclude {
                    return None;
                }
                let hit = collider.shape().cast_ray_and_get_normal(
                    collider.position(),
                    &rapier_ray,
                    ray.length,
                    true,
                )?;
                Some(PickHit {
                    node,
                    point: ray.origin + ray.direction * hit.time_of_impact,
                    distance: hit.time_of_impact,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible)
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.visible = visible;
        }
    }

    fn is_see_able(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible && n.see_able)
    }

    fn is_collidable(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.camera_collidable)
    }

    fn right_handed(&self) -> bool {
        self.right_handed
    }
}
