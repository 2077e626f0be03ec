//! Polygon model records as the editor sees them.
//!
//! On disk a polymodel only stores its submodel tree, its interpreter data and
//! a `(first_texture, num_textures)` slice of the object-bitmap pointer table.
//! Guns and animation live on the robot/reactor/ship records that use the
//! model; the editor folds them back onto the model so they can be edited in
//! one place. `texture_list` is the semantic replacement for the pointer slice.

use crate::game_types::{FixAngles, FixVector};

/// Maximum number of submodels in a polymodel.
pub const MAX_SUBMODELS: usize = 10;
/// Maximum number of guns on a robot, reactor or model.
pub const MAX_GUNS: usize = 8;
/// Number of robot animation states (rest, alert, fire, recoil, flinch).
pub const NUM_ANIMATION_STATES: usize = 5;

/// Per-submodel, per-animation-state rotation grid.
pub type AnimationMatrix = [[FixAngles; NUM_ANIMATION_STATES]; MAX_SUBMODELS];

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Submodel {
    /// Index of the parent submodel. The root (index 0) points at itself or -1.
    pub parent: i32,
    pub offset: FixVector,
    pub normal: FixVector,
    pub point: FixVector,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polymodel {
    pub submodels: Vec<Submodel>,
    /// Opaque interpreter (geometry) data; never inspected by the editor.
    pub model_data: Vec<u8>,
    pub dying_model_num: i32,
    pub simpler_model: u8,
    pub num_guns: i32,
    pub gun_points: [FixVector; MAX_GUNS],
    pub gun_dirs: [FixVector; MAX_GUNS],
    pub gun_submodels: [i32; MAX_GUNS],
    pub animation_matrix: AnimationMatrix,
    pub is_animated: bool,
    /// Start of this model's slice in the object-bitmap pointer table. Only
    /// meaningful right after a table build.
    pub first_texture: u16,
    pub num_textures: u8,
    /// Texture names, one per texture slot.
    pub texture_list: Vec<String>,
}

impl Default for Polymodel {
    fn default() -> Self {
        Polymodel {
            submodels: vec![Submodel {
                parent: -1,
                ..Default::default()
            }],
            model_data: Vec::new(),
            dying_model_num: -1,
            simpler_model: 0,
            num_guns: 0,
            gun_points: [FixVector::default(); MAX_GUNS],
            gun_dirs: [FixVector::default(); MAX_GUNS],
            gun_submodels: [0; MAX_GUNS],
            animation_matrix: [[FixAngles::default(); NUM_ANIMATION_STATES]; MAX_SUBMODELS],
            is_animated: false,
            first_texture: 0,
            num_textures: 0,
            texture_list: Vec::new(),
        }
    }
}

impl Polymodel {
    pub fn num_submodels(&self) -> usize {
        self.submodels.len().min(MAX_SUBMODELS)
    }

    /// Parent of submodel `index`, or `None` for the root and for indices that
    /// fall outside the tree.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        if index == 0 {
            return None;
        }
        let parent = self.submodels.get(index)?.parent;
        usize::try_from(parent)
            .ok()
            .filter(|&p| p < self.num_submodels())
    }

    /// Gun count clamped into `0..=MAX_GUNS`.
    pub fn gun_count(&self) -> usize {
        self.num_guns.clamp(0, MAX_GUNS as i32) as usize
    }

    /// Replace the texture list, keeping `num_textures` in step with it.
    pub fn set_texture_list(&mut self, textures: Vec<String>) {
        self.num_textures = textures.len() as u8;
        self.texture_list = textures;
    }
}
