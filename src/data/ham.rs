//! Typed records of a decoded HAM file.
//!
//! These mirror the fixed-layout records of the game's `descent2.ham`. Field
//! decoding from bytes happens in a [`BaseFileCodec`](super::BaseFileCodec);
//! this module only describes the decoded shape.

use crate::game_types::{Contains, FixAngles, FixVector, OBJ_POWERUP};
use crate::models::polymodel::{MAX_GUNS, NUM_ANIMATION_STATES, Polymodel};
use crate::recognized::Recognized;

/// Number of frames a wall clip can hold.
pub const MAX_WALL_CLIP_FRAMES: usize = 50;
/// Number of multiplayer ship color variants stored in the object-bitmap table.
pub const NUM_MULTIPLAYER_BITMAPS: usize = 14;
/// Number of player ship guns.
pub const NUM_PLAYER_GUNS: usize = 8;
/// Size of the low-memory bitmap translation table.
pub const BITMAP_XLAT_SIZE: usize = 2620;

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TmapInfo {
    pub flags: u8,
    pub lighting: i32,
    pub damage: i32,
    pub eclip_num: i16,
    pub destroyed: i16,
    pub slide_u: i16,
    pub slide_v: i16,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VClip {
    pub play_time: i32,
    pub frame_time: i32,
    pub flags: i32,
    pub sound_num: i16,
    pub light_value: i32,
    pub frames: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EClip {
    pub clip: VClip,
    pub time_left: i32,
    pub frame_count: i32,
    pub changing_wall_texture: i16,
    /// Object-bitmap slot this clip animates, or -1.
    pub changing_object_texture: i16,
    pub flags: i32,
    pub critical_clip: i32,
    pub destroyed_bitmap_num: i32,
    pub explosion_vclip: i32,
    pub explosion_eclip: i32,
    pub explosion_size: i32,
    pub sound_num: i32,
    pub segment: i32,
    pub side: i32,
}

impl Default for EClip {
    fn default() -> Self {
        EClip {
            clip: VClip::default(),
            time_left: 0,
            frame_count: 0,
            changing_wall_texture: -1,
            changing_object_texture: -1,
            flags: 0,
            critical_clip: -1,
            destroyed_bitmap_num: -1,
            explosion_vclip: -1,
            explosion_eclip: -1,
            explosion_size: 0,
            sound_num: -1,
            segment: -1,
            side: -1,
        }
    }
}

impl EClip {
    /// Bitmap id of the first animation frame, if the clip has any frames.
    pub fn first_frame(&self) -> Option<u16> {
        self.clip.frames.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WClip {
    pub play_time: i32,
    pub num_frames: i16,
    pub frames: [u16; MAX_WALL_CLIP_FRAMES],
    pub open_sound: i16,
    pub close_sound: i16,
    pub flags: i16,
    pub filename: String,
}

impl Default for WClip {
    fn default() -> Self {
        WClip {
            play_time: 0,
            num_frames: 0,
            frames: [0; MAX_WALL_CLIP_FRAMES],
            open_sound: -1,
            close_sound: -1,
            flags: 0,
            filename: String::new(),
        }
    }
}

/// A `{offset, count}` run in the flat joint array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointList {
    pub num_joints: i16,
    pub offset: i16,
}

/// One recorded rotation of one submodel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointPos {
    pub joint_num: i16,
    pub angles: FixAngles,
}

/// Joint-list descriptors indexed by `[gun][state]`. The extra row after the
/// last gun holds submodels that are not attached to any gun.
pub type AnimStates = [[JointList; NUM_ANIMATION_STATES]; MAX_GUNS + 1];

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Robot {
    pub model_num: i32,
    pub num_guns: i8,
    pub gun_points: [FixVector; MAX_GUNS],
    pub gun_submodels: [u8; MAX_GUNS],
    pub hit_vclip_num: i16,
    pub hit_sound_num: i16,
    pub death_vclip_num: i16,
    pub death_sound_num: i16,
    pub weapon_type: i8,
    pub weapon_type_secondary: i8,
    pub contains_id: u8,
    pub contains_count: u8,
    pub contains_probability: u8,
    pub contains_type: u8,
    pub see_sound: u8,
    pub attack_sound: u8,
    pub claw_sound: u8,
    pub taunt_sound: u8,
    pub death_roll_sound: u8,
    pub behavior: u8,
    pub boss_flag: i8,
    pub strength: i32,
    pub mass: i32,
    pub drag: i32,
    pub score_value: i16,
    pub anim_states: AnimStates,
}

impl Default for Robot {
    fn default() -> Self {
        Robot {
            model_num: 0,
            num_guns: 0,
            gun_points: [FixVector::default(); MAX_GUNS],
            gun_submodels: [0; MAX_GUNS],
            hit_vclip_num: -1,
            hit_sound_num: -1,
            death_vclip_num: -1,
            death_sound_num: -1,
            weapon_type: 0,
            weapon_type_secondary: -1,
            contains_id: 0,
            contains_count: 0,
            contains_probability: 0,
            contains_type: OBJ_POWERUP,
            see_sound: 0,
            attack_sound: 0,
            claw_sound: 0,
            taunt_sound: 0,
            death_roll_sound: 0,
            behavior: 0x81,
            boss_flag: 0,
            strength: 0,
            mass: 0,
            drag: 0,
            score_value: 0,
            anim_states: [[JointList::default(); NUM_ANIMATION_STATES]; MAX_GUNS + 1],
        }
    }
}

impl Robot {
    pub fn contains(&self) -> Recognized<Contains, u8> {
        Contains::from_raw(self.contains_type, self.contains_id)
    }

    pub fn set_contains(&mut self, contains: Contains) {
        (self.contains_type, self.contains_id) = contains.to_raw();
    }

    /// Model index, or `None` when the robot has no model.
    pub fn model_index(&self) -> Option<usize> {
        usize::try_from(self.model_num).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weapon {
    pub render_type: u8,
    pub model_num: i16,
    pub model_num_inner: i16,
    pub muzzle_flash_vclip: i8,
    pub robot_hit_vclip: i8,
    pub wall_hit_vclip: i8,
    pub weapon_vclip: i8,
    pub firing_sound: i16,
    pub robot_hit_sound: i16,
    pub wall_hit_sound: i16,
    pub fire_count: u8,
    pub ammo_usage: u8,
    pub children: i8,
    pub energy_usage: i32,
    pub fire_wait: i32,
    pub damage: [i32; 5],
    pub speed: [i32; 5],
    pub bitmap: u16,
}

impl Default for Weapon {
    fn default() -> Self {
        Weapon {
            render_type: 0,
            model_num: 0,
            model_num_inner: -1,
            muzzle_flash_vclip: -1,
            robot_hit_vclip: -1,
            wall_hit_vclip: -1,
            weapon_vclip: -1,
            firing_sound: -1,
            robot_hit_sound: -1,
            wall_hit_sound: -1,
            fire_count: 1,
            ammo_usage: 0,
            children: -1,
            energy_usage: 0,
            fire_wait: 0,
            damage: [0; 5],
            speed: [0; 5],
            bitmap: 0,
        }
    }
}

impl Weapon {
    pub fn model_index(&self) -> Option<usize> {
        usize::try_from(self.model_num).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Powerup {
    pub vclip_num: i32,
    pub hit_sound: i32,
    pub size: i32,
    pub light: i32,
}

impl Default for Powerup {
    fn default() -> Self {
        Powerup {
            vclip_num: -1,
            hit_sound: -1,
            size: 0,
            light: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reactor {
    pub model_num: i32,
    pub num_guns: i32,
    pub gun_points: [FixVector; MAX_GUNS],
    pub gun_dirs: [FixVector; MAX_GUNS],
}

impl Default for Reactor {
    fn default() -> Self {
        Reactor {
            model_num: -1,
            num_guns: 0,
            gun_points: [FixVector::default(); MAX_GUNS],
            gun_dirs: [FixVector::default(); MAX_GUNS],
        }
    }
}

impl Reactor {
    pub fn model_index(&self) -> Option<usize> {
        usize::try_from(self.model_num).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ship {
    pub model_num: i32,
    pub explosion_vclip_num: i32,
    pub mass: i32,
    pub drag: i32,
    pub max_thrust: i32,
    pub reverse_thrust: i32,
    pub brakes: i32,
    pub wiggle: i32,
    pub max_rotation_thrust: i32,
    pub gun_points: [FixVector; NUM_PLAYER_GUNS],
}

impl Ship {
    pub fn model_index(&self) -> Option<usize> {
        usize::try_from(self.model_num).ok()
    }
}

/// A decoded base HAM file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HamFile {
    pub version: i32,
    pub textures: Vec<u16>,
    pub tmap_info: Vec<TmapInfo>,
    pub sounds: Vec<u8>,
    pub alt_sounds: Vec<u8>,
    pub vclips: Vec<VClip>,
    pub eclips: Vec<EClip>,
    pub wclips: Vec<WClip>,
    pub robots: Vec<Robot>,
    pub joints: Vec<JointPos>,
    pub weapons: Vec<Weapon>,
    pub models: Vec<Polymodel>,
    pub gauges: Vec<u16>,
    pub gauges_hires: Vec<u16>,
    pub obj_bitmaps: Vec<u16>,
    pub obj_bitmap_pointers: Vec<u16>,
    pub player_ship: Ship,
    pub cockpits: Vec<u16>,
    pub reactors: Vec<Reactor>,
    pub powerups: Vec<Powerup>,
    pub first_multi_bitmap_num: i32,
    pub bitmap_xlat: Vec<u16>,
}

impl Default for HamFile {
    fn default() -> Self {
        HamFile {
            version: 3,
            textures: Vec::new(),
            tmap_info: Vec::new(),
            sounds: Vec::new(),
            alt_sounds: Vec::new(),
            vclips: Vec::new(),
            eclips: Vec::new(),
            wclips: Vec::new(),
            robots: Vec::new(),
            joints: Vec::new(),
            weapons: Vec::new(),
            models: Vec::new(),
            gauges: Vec::new(),
            gauges_hires: Vec::new(),
            obj_bitmaps: Vec::new(),
            obj_bitmap_pointers: Vec::new(),
            player_ship: Ship::default(),
            cockpits: Vec::new(),
            reactors: Vec::new(),
            powerups: Vec::new(),
            first_multi_bitmap_num: 0,
            bitmap_xlat: vec![0; BITMAP_XLAT_SIZE],
        }
    }
}
