//! Typed records of a decoded VHAM (Vertigo expansion) file.
//!
//! A VHAM adds robots, weapons, models, joints and object bitmaps on top of a
//! base HAM. Its tables are stored without the base entries; absolute ids
//! address them past fixed per-category boundaries.

use crate::data::ham::{JointPos, Robot, Weapon};
use crate::models::polymodel::Polymodel;

/// Base robot count the expansion numbers its robots after.
pub const N_D2_ROBOT_TYPES: usize = 66;
/// Base joint count the expansion numbers its joints after.
pub const N_D2_ROBOT_JOINTS: usize = 1145;
/// Base polymodel count the expansion numbers its models after.
pub const N_D2_POLYGON_MODELS: usize = 166;
/// Base object-bitmap count the expansion numbers its bitmaps after.
pub const N_D2_OBJBITMAPS: usize = 422;
/// Base object-bitmap pointer count the expansion numbers its pointers after.
pub const N_D2_OBJBITMAPPTRS: usize = 502;
/// Base weapon count the expansion numbers its weapons after.
pub const N_D2_WEAPON_TYPES: usize = 62;

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VHamFile {
    pub robots: Vec<Robot>,
    pub weapons: Vec<Weapon>,
    pub models: Vec<Polymodel>,
    pub joints: Vec<JointPos>,
    pub obj_bitmaps: Vec<u16>,
    pub obj_bitmap_pointers: Vec<u16>,
}
