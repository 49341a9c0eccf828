//! Headless run of the locomotion controller on a small rapier course.
//!
//! Usage: `sandbox [settings.json]`. Set `RUST_LOG=locomotion=debug` to follow the
//! action changes frame by frame.

use std::f32::consts::FRAC_PI_2;

use anyhow::{Context, Result};
use locomotion::{
    ArcCamera, CapsuleDef, CharacterController, ColliderShapeDef, NodeId, RapierStage, Settings,
    Stage, StaticDef, Vec3,
};
use nalgebra::UnitQuaternion;

const FPS: f32 = 60.0;
const AVATAR: NodeId = NodeId(1);

/// One scripted stretch of input.
struct Phase {
    name: &'static str,
    seconds: f32,
    input: fn(&mut CharacterController),
}

fn course() -> Vec<StaticDef> {
    let mut statics = vec![StaticDef::new(
        100,
        Vec3::zeros(),
        ColliderShapeDef::Plane {
            offset_along_normal: 0.0,
        },
    )];

    // stairs ahead of the spawn point, 0.15 per tread
    for i in 0..6u32 {
        let rise = 0.15 * (i + 1) as f32;
        statics.push(StaticDef::new(
            110 + i,
            Vec3::new(0.0, rise / 2.0, 4.0 + 0.4 * i as f32 + 5.0),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(2.0, rise / 2.0, 5.0),
            },
        ));
    }

    // a wall at the top of the stairs
    statics.push(StaticDef::new(
        116,
        Vec3::new(0.0, 2.0, 17.0),
        ColliderShapeDef::Cuboid {
            half_extents: Vec3::new(3.0, 2.0, 0.25),
        },
    ));

    // a 40° ramp to the side, too steep to stand on
    statics.push(
        StaticDef::new(
            120,
            Vec3::new(8.0, 0.0, 0.0),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(4.0, 0.1, 2.0),
            },
        )
        .rotated(UnitQuaternion::from_axis_angle(
            &Vec3::z_axis(),
            40f32.to_radians(),
        )),
    );

    // a pillar between the avatar and the camera
    statics.push(StaticDef::new(
        130,
        Vec3::new(0.0, 1.0, -3.0),
        ColliderShapeDef::CylinderY {
            radius: 0.4,
            half_height: 1.0,
        },
    ));

    // a glass panel the camera sees through
    statics.push(
        StaticDef::new(
            131,
            Vec3::new(0.0, 1.0, -4.5),
            ColliderShapeDef::Cuboid {
                half_extents: Vec3::new(1.0, 1.0, 0.05),
            },
        )
        .camera_passes_through(),
    );
    statics
}

fn timeline() -> Vec<Phase> {
    vec![
        Phase {
            name: "settle",
            seconds: 1.0,
            input: |cc| cc.idle(),
        },
        Phase {
            name: "walk to the stairs",
            seconds: 2.0,
            input: |cc| cc.walk(true),
        },
        Phase {
            name: "run up the stairs",
            seconds: 2.0,
            input: |cc| cc.run(true),
        },
        Phase {
            name: "turn around",
            seconds: 4.0,
            input: |cc| {
                cc.idle();
                cc.turn_left_fast(true);
            },
        },
        Phase {
            name: "jump",
            seconds: 1.5,
            input: |cc| {
                cc.idle();
                cc.jump();
            },
        },
        Phase {
            name: "strafe",
            seconds: 1.0,
            input: |cc| cc.strafe_left(true),
        },
        Phase {
            name: "walk back",
            seconds: 2.0,
            input: |cc| {
                cc.idle();
                cc.walk_back(true);
            },
        },
        Phase {
            name: "rest",
            seconds: 1.0,
            input: |cc| cc.idle(),
        },
    ]
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading settings from {path}"))?;
            Settings::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => Settings {
            camera_target: Vec3::new(0.0, 1.5, 0.0),
            make_invisible: true,
            ..Settings::default()
        },
    };

    let dt = 1.0 / FPS;
    let mut stage = RapierStage::build(course(), dt);
    stage.add_avatar(
        AVATAR,
        Vec3::new(0.0, 1.5, 0.0),
        CapsuleDef {
            half_height: 0.5,
            radius: 0.3,
        },
    );

    let mut camera = ArcCamera::new(-FRAC_PI_2, FRAC_PI_2 - 0.2, 6.0, Vec3::zeros());
    camera.lower_radius_limit = 1.0;
    let mut cc = CharacterController::new(&stage, AVATAR, Some(Box::new(camera)), false)
        .context("installing the avatar")?;
    cc.set_settings(&settings)
        .context("applying controller settings")?;

    cc.start(&mut stage);
    // the host reports a zero delta on the first frame
    cc.update(0.0, &mut stage);

    for phase in timeline() {
        (phase.input)(&mut cc);
        let frames = (phase.seconds * FPS).round() as u32;
        for _ in 0..frames {
            cc.update(dt, &mut stage);
        }
        let p = stage.position(AVATAR);
        log::info!(
            "{:<20} action={:<16} contact={:?} pos=({:.2}, {:.2}, {:.2}) yaw={:.2}",
            phase.name,
            cc.action().map_or("-", |a| a.id()),
            cc.contact(),
            p.x,
            p.y,
            p.z,
            stage.yaw(AVATAR),
        );
    }
    cc.stop();

    let summary = serde_json::json!({
        "position": stage.position(AVATAR),
        "grounded": cc.is_grounded(),
        "hidden": cc.camera_rig().hidden(),
        "settings": cc.settings(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
