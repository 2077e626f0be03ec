//! In-memory collaborators and a small synthetic HAM file for tests.

use std::cell::RefCell;
use std::io::Write;

use crate::data::ham::{
    EClip, HamFile, JointList, JointPos, Powerup, Reactor, Robot, Ship, TmapInfo, VClip, WClip,
    Weapon,
};
use crate::data::vham::VHamFile;
use crate::data::{BaseFileCodec, BitmapInfo, BitmapResolver, ExtensionFileCodec};
use crate::error::ErrorKind;
use crate::game_types::{FixAngles, FixVector};
use crate::models::polymodel::{Polymodel, Submodel};

/// Bitmap library with a handful of named bitmaps.
///
/// | id | name |
/// |---|---|
/// | 0 | bitmap0 |
/// | 1 | rbot061 |
/// | 2 | rbot062 |
/// | 3 | ship1-1 |
/// | 4 | blinky#0 (animated) |
/// | 5 | glow04 |
/// | 6 | rbot046 |
/// | 7 | blinky#1 (animated) |
/// | 8..22 | multi0..multi13 |
pub struct FakePig {
    bitmaps: Vec<BitmapInfo>,
}

impl FakePig {
    pub fn standard() -> Self {
        let mut bitmaps: Vec<BitmapInfo> = [
            ("bitmap0", false),
            ("rbot061", false),
            ("rbot062", false),
            ("ship1-1", false),
            ("blinky#0", true),
            ("glow04", false),
            ("rbot046", false),
            ("blinky#1", true),
        ]
        .into_iter()
        .map(|(name, is_animated)| BitmapInfo {
            name: name.to_string(),
            is_animated,
        })
        .collect();
        bitmaps.extend((0..14).map(|i| BitmapInfo {
            name: format!("multi{i}"),
            is_animated: false,
        }));
        FakePig { bitmaps }
    }
}

impl BitmapResolver for FakePig {
    fn bitmap_info(&self, id: u16) -> Option<BitmapInfo> {
        self.bitmaps.get(id as usize).cloned()
    }

    fn bitmap_id_from_name(&self, name: &str) -> u16 {
        self.bitmaps
            .iter()
            .position(|info| info.name.eq_ignore_ascii_case(name))
            .unwrap_or(0) as u16
    }
}

/// Codec that hands out a fixed record set and remembers what it was asked
/// to encode. The record arrays are represented by a 4-byte marker.
pub struct InMemoryCodec {
    pub file: RefCell<HamFile>,
}

pub const RECORDS_MARKER: &[u8; 4] = b"RECS";

impl InMemoryCodec {
    pub fn new(file: HamFile) -> Self {
        InMemoryCodec {
            file: RefCell::new(file),
        }
    }
}

impl BaseFileCodec for InMemoryCodec {
    fn decode(&self, input: &mut &[u8]) -> Result<HamFile, ErrorKind> {
        let data: &[u8] = input;
        match data.strip_prefix(RECORDS_MARKER.as_slice()) {
            Some(rest) => {
                *input = rest;
                Ok(self.file.borrow().clone())
            }
            None => Err(ErrorKind::BaseFile("missing record marker".to_string())),
        }
    }

    fn encode(&self, file: &HamFile, out: &mut dyn Write) -> Result<(), ErrorKind> {
        *self.file.borrow_mut() = file.clone();
        out.write_all(RECORDS_MARKER)?;
        Ok(())
    }
}

/// [`InMemoryCodec`] for expansion files.
#[derive(Default)]
pub struct InMemoryExtensionCodec {
    pub file: RefCell<VHamFile>,
}

impl ExtensionFileCodec for InMemoryExtensionCodec {
    fn decode(&self, input: &mut &[u8]) -> Result<VHamFile, ErrorKind> {
        let data: &[u8] = input;
        match data.strip_prefix(RECORDS_MARKER.as_slice()) {
            Some(rest) => {
                *input = rest;
                Ok(self.file.borrow().clone())
            }
            None => Err(ErrorKind::BaseFile("missing record marker".to_string())),
        }
    }

    fn encode(&self, file: &VHamFile, out: &mut dyn Write) -> Result<(), ErrorKind> {
        *self.file.borrow_mut() = file.clone();
        out.write_all(RECORDS_MARKER)?;
        Ok(())
    }
}

pub const ROBOT_MODEL: usize = 0;
pub const WEAPON_MODEL: usize = 1;
pub const REACTOR_MODEL: usize = 2;
pub const SHIP_MODEL: usize = 3;
pub const DYING_SHIP_MODEL: usize = 4;
pub const ORPHAN_MODEL: usize = 5;

/// Index of the first multiplayer bitmap pointer in [`sample_ham`].
pub const SAMPLE_FIRST_MULTI: usize = 7;

fn model(first_texture: u16, num_textures: u8) -> Polymodel {
    Polymodel {
        first_texture,
        num_textures,
        ..Default::default()
    }
}

/// Angles stored for the robot's arm in animation state `state`.
pub fn arm_angles(state: usize) -> FixAngles {
    FixAngles::new(state as i16 * 10, -(state as i16), 3)
}

/// A consistent HAM file as the game would ship it.
///
/// Models: a robot model with an animated arm on gun 0, a weapon model using
/// the "Blinky" animated texture, a reactor model, the ship, the dying ship
/// sharing the ship's textures and one orphaned model whose texture is the
/// sentinel bitmap.
pub fn sample_ham() -> HamFile {
    let mut robot_model = model(0, 2);
    robot_model.submodels.push(Submodel {
        parent: 0,
        ..Default::default()
    });
    let mut ship = model(5, 1);
    ship.dying_model_num = DYING_SHIP_MODEL as i32;

    let mut robot = Robot {
        model_num: ROBOT_MODEL as i32,
        num_guns: 1,
        ..Default::default()
    };
    robot.gun_points[0] = FixVector::from_raw(0, 0, 65536);
    robot.gun_submodels[0] = 1;
    let mut joints = Vec::new();
    for state in 0..5 {
        robot.anim_states[0][state] = JointList {
            num_joints: 1,
            offset: state as i16,
        };
        joints.push(JointPos {
            joint_num: 1,
            angles: arm_angles(state),
        });
    }

    let mut reactor = Reactor {
        model_num: REACTOR_MODEL as i32,
        num_guns: 2,
        ..Default::default()
    };
    reactor.gun_points[1] = FixVector::from_raw(7, 8, 9);
    reactor.gun_dirs[1] = FixVector::from_raw(0, 0, -65536);

    let mut player_ship = Ship {
        model_num: SHIP_MODEL as i32,
        ..Default::default()
    };
    player_ship.gun_points[2] = FixVector::from_raw(-3, 0, 12);

    let mut eclip = EClip {
        changing_object_texture: 2,
        ..Default::default()
    };
    eclip.clip.frames = vec![4, 7];

    let weapon = Weapon {
        model_num: WEAPON_MODEL as i16,
        ..Default::default()
    };

    let mut obj_bitmaps = vec![1, 2, 4, 2, 3, u16::MAX];
    obj_bitmaps.extend(8..22);
    let mut obj_bitmap_pointers = vec![0, 1, 2, 0, 3, 4, 5];
    obj_bitmap_pointers.extend(6..20);

    HamFile {
        version: 3,
        textures: vec![0; 10],
        tmap_info: vec![TmapInfo::default()],
        sounds: vec![0; 4],
        alt_sounds: vec![0; 4],
        vclips: vec![VClip::default(); 2],
        eclips: vec![eclip],
        wclips: vec![WClip::default()],
        robots: vec![robot],
        joints,
        weapons: vec![weapon],
        models: vec![
            robot_model,
            model(2, 2),
            model(4, 1),
            ship,
            model(5, 1),
            model(6, 1),
        ],
        obj_bitmaps,
        obj_bitmap_pointers,
        player_ship,
        reactors: vec![reactor],
        powerups: vec![Powerup::default()],
        first_multi_bitmap_num: SAMPLE_FIRST_MULTI as i32,
        ..Default::default()
    }
}
