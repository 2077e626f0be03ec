//! The expansion-file editor database.
//!
//! A VHAM only stores the records it adds. Absolute ids below a category's
//! boundary address the base file; ids at or past it address the expansion
//! at `id - boundary`. [`AugmentedHam`] applies that rule for every category
//! so callers never do the arithmetic themselves.

use std::io::Write;

use tracing::{debug, warn};

use crate::data::{BitmapResolver, ExtensionFileCodec};
use crate::data::ham::{JointPos, Robot, Weapon};
use crate::data::vham::{
    N_D2_OBJBITMAPPTRS, N_D2_OBJBITMAPS, N_D2_POLYGON_MODELS, N_D2_ROBOT_JOINTS,
    N_D2_ROBOT_TYPES, N_D2_WEAPON_TYPES, VHamFile,
};
use crate::edit::ham::EditorHamFile;
use crate::error::IResult;
use crate::models::guns::guns_from_robot;
use crate::models::joints::{build_animation, clear_joint_runs, flatten_animation};
use crate::models::obj_bitmaps::{ObjBitmapTableBuilder, TextureNameTables};
use crate::models::polymodel::Polymodel;

/// Name reported for ids that resolve to nothing.
pub const UNDEFINED_NAME: &str = "<undefined>";

/// First absolute id of each category the expansion numbers after the base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Boundaries {
    pub robots: usize,
    pub joints: usize,
    pub models: usize,
    pub obj_bitmaps: usize,
    pub obj_bitmap_pointers: usize,
    pub weapons: usize,
}

impl Default for Boundaries {
    fn default() -> Self {
        Boundaries {
            robots: N_D2_ROBOT_TYPES,
            joints: N_D2_ROBOT_JOINTS,
            models: N_D2_POLYGON_MODELS,
            obj_bitmaps: N_D2_OBJBITMAPS,
            obj_bitmap_pointers: N_D2_OBJBITMAPPTRS,
            weapons: N_D2_WEAPON_TYPES,
        }
    }
}

/// Resolve an absolute id against a base table and an expansion table.
fn layered<'a, T>(base: &'a [T], ext: &'a [T], boundary: usize, id: usize) -> Option<&'a T> {
    if id < boundary {
        base.get(id)
    } else {
        ext.get(id - boundary)
    }
}

/// Resolve an object-bitmap table entry. The base table is consulted for ids
/// below the boundary and for ids past the end of the expansion's entries.
fn layered_table(base: &[u16], ext: &[u16], boundary: usize, id: usize) -> u16 {
    if id < base.len() && (id < boundary || id >= boundary + ext.len()) {
        base[id]
    } else if id >= boundary {
        ext.get(id - boundary).copied().unwrap_or(0)
    } else {
        0
    }
}

/// Count of addressable ids. A base file that already holds more entries
/// than the boundary plus the expansion's own wins.
fn layered_count(base: usize, ext: usize, boundary: usize) -> usize {
    if base > boundary + ext {
        base
    } else {
        boundary + ext
    }
}

fn non_negative(id: i32) -> Option<usize> {
    usize::try_from(id).ok()
}

/// Editor view of a VHAM file layered on a base HAM file.
#[derive(Debug, Clone)]
pub struct EditorVhamFile {
    /// Expansion records. Model guns, animation and texture lists are
    /// authoritative; joints and object-bitmap tables are regenerated on
    /// save.
    pub data: VHamFile,
    pub robot_names: Vec<String>,
    pub weapon_names: Vec<String>,
    pub model_names: Vec<String>,
    pub boundaries: Boundaries,
}

impl EditorVhamFile {
    /// Decode a VHAM file with `codec` and build its editor view on `base`.
    pub fn read(
        codec: &dyn ExtensionFileCodec,
        input: &[u8],
        base: &EditorHamFile,
        resolver: &dyn BitmapResolver,
    ) -> IResult<Self> {
        let mut input = input;
        let data = codec.decode(&mut input)?;
        if !input.is_empty() {
            debug!("{} trailing bytes left unread", input.len());
        }
        Ok(Self::from_base(data, base, resolver))
    }

    /// Build the editor view of `data` on top of `base` with the stock
    /// boundaries.
    pub fn from_base(data: VHamFile, base: &EditorHamFile, resolver: &dyn BitmapResolver) -> Self {
        Self::with_boundaries(data, base, resolver, Boundaries::default())
    }

    pub fn with_boundaries(
        data: VHamFile,
        base: &EditorHamFile,
        resolver: &dyn BitmapResolver,
        boundaries: Boundaries,
    ) -> Self {
        let robot_names = (1..=data.robots.len()).map(|n| format!("New Robot {n}")).collect();
        let weapon_names = (1..=data.weapons.len()).map(|n| format!("New Weapon {n}")).collect();
        let model_names = (1..=data.models.len()).map(|n| format!("New Model {n}")).collect();

        let mut file = EditorVhamFile {
            data,
            robot_names,
            weapon_names,
            model_names,
            boundaries,
        };
        file.build_model_animation(base);
        file.build_model_texture_tables(base, resolver);
        file
    }

    fn build_model_animation(&mut self, base: &EditorHamFile) {
        let b = self.boundaries;
        let VHamFile {
            robots,
            models,
            joints,
            ..
        } = &mut self.data;
        let joints: &[JointPos] = joints;

        for (i, robot) in robots.iter().enumerate() {
            let Some(index) = robot.model_index() else {
                continue;
            };
            // robots reusing base models leave those models alone
            if index < b.models {
                continue;
            }
            let Some(model) = models.get_mut(index - b.models) else {
                warn!("expansion robot {i} uses missing model {index}");
                continue;
            };
            guns_from_robot(robot, model);
            build_animation(robot, model, |id| {
                layered(&base.data.joints, joints, b.joints, id).copied()
            });
        }
    }

    fn build_model_texture_tables(&mut self, base: &EditorHamFile, resolver: &dyn BitmapResolver) {
        let b = self.boundaries;
        let base_bitmaps = &base.data.obj_bitmaps;
        let base_pointers = &base.data.obj_bitmap_pointers;
        let VHamFile {
            models,
            obj_bitmaps,
            obj_bitmap_pointers,
            ..
        } = &mut self.data;
        let obj_bitmaps: &[u16] = obj_bitmaps;
        let obj_bitmap_pointers: &[u16] = obj_bitmap_pointers;

        let tables = TextureNameTables::build(
            b.obj_bitmaps + obj_bitmaps.len(),
            |id| layered_table(base_bitmaps, obj_bitmaps, b.obj_bitmaps, id),
            base.data
                .eclips
                .iter()
                .zip(base.names.eclips.iter().map(String::as_str)),
            resolver,
        );
        tables.apply(models.iter_mut(), |id| {
            Some(layered_table(
                base_pointers,
                obj_bitmap_pointers,
                b.obj_bitmap_pointers,
                id,
            ))
        });
    }

    /// Regenerate the expansion's joints and object-bitmap tables and return
    /// the records to write.
    pub fn save(&mut self, base: &EditorHamFile, resolver: &dyn BitmapResolver) -> IResult<VHamFile> {
        let b = self.boundaries;

        let mut builder = ObjBitmapTableBuilder::with_bases(resolver, b.obj_bitmaps, b.obj_bitmap_pointers);
        for (clip, name) in base.data.eclips.iter().zip(&base.names.eclips) {
            if let Ok(slot) = usize::try_from(clip.changing_object_texture) {
                builder.seed(name, slot);
            }
        }
        for model in self.data.models.iter_mut() {
            builder.push_model_deduplicated(model)?;
        }
        let bitmap_count = builder.obj_bitmaps.len();
        self.data.obj_bitmaps = builder.obj_bitmaps;
        self.data.obj_bitmap_pointers = builder.obj_bitmap_pointers;

        let VHamFile {
            robots,
            models,
            joints,
            ..
        } = &mut self.data;
        joints.clear();
        for (i, robot) in robots.iter_mut().enumerate() {
            let Some(index) = robot.model_index().filter(|&index| index >= b.models) else {
                continue;
            };
            match models.get(index - b.models) {
                Some(model) => flatten_animation(robot, model, joints, b.joints)?,
                None => {
                    warn!("expansion robot {i} uses missing model {index}");
                    clear_joint_runs(robot);
                }
            }
        }
        debug!(
            "built {} expansion joints and {} object bitmaps",
            joints.len(),
            bitmap_count
        );

        Ok(self.data.clone())
    }

    /// Save and encode the expansion records with `codec`.
    pub fn write(
        &mut self,
        codec: &dyn ExtensionFileCodec,
        out: &mut dyn Write,
        base: &EditorHamFile,
        resolver: &dyn BitmapResolver,
    ) -> IResult<()> {
        let file = self.save(base, resolver)?;
        codec.encode(&file, out)?;
        Ok(())
    }

    /// Layered view resolving absolute ids across `base` and this file.
    pub fn view<'a>(&'a self, base: &'a EditorHamFile) -> AugmentedHam<'a> {
        AugmentedHam { base, ext: self }
    }
}

/// Absolute-id access to a base file and the expansion layered on it.
#[derive(Clone, Copy)]
pub struct AugmentedHam<'a> {
    base: &'a EditorHamFile,
    ext: &'a EditorVhamFile,
}

impl<'a> AugmentedHam<'a> {
    fn boundaries(&self) -> Boundaries {
        self.ext.boundaries
    }

    pub fn robot(&self, id: i32) -> Option<&'a Robot> {
        let id = non_negative(id)?;
        layered(&self.base.data.robots, &self.ext.data.robots, self.boundaries().robots, id)
    }

    pub fn weapon(&self, id: i32) -> Option<&'a Weapon> {
        let id = non_negative(id)?;
        layered(&self.base.data.weapons, &self.ext.data.weapons, self.boundaries().weapons, id)
    }

    pub fn model(&self, id: i32) -> Option<&'a Polymodel> {
        let id = non_negative(id)?;
        layered(&self.base.data.models, &self.ext.data.models, self.boundaries().models, id)
    }

    /// Joint at an absolute index, or a zero joint.
    pub fn joint(&self, id: i32) -> JointPos {
        non_negative(id)
            .and_then(|id| {
                layered(&self.base.data.joints, &self.ext.data.joints, self.boundaries().joints, id)
            })
            .copied()
            .unwrap_or_default()
    }

    pub fn obj_bitmap(&self, id: i32) -> u16 {
        non_negative(id)
            .map(|id| {
                layered_table(
                    &self.base.data.obj_bitmaps,
                    &self.ext.data.obj_bitmaps,
                    self.boundaries().obj_bitmaps,
                    id,
                )
            })
            .unwrap_or(0)
    }

    pub fn obj_bitmap_pointer(&self, id: i32) -> u16 {
        non_negative(id)
            .map(|id| {
                layered_table(
                    &self.base.data.obj_bitmap_pointers,
                    &self.ext.data.obj_bitmap_pointers,
                    self.boundaries().obj_bitmap_pointers,
                    id,
                )
            })
            .unwrap_or(0)
    }

    pub fn robot_name(&self, id: i32) -> &'a str {
        non_negative(id)
            .and_then(|id| {
                layered(&self.base.names.robots, &self.ext.robot_names, self.boundaries().robots, id)
            })
            .map_or(UNDEFINED_NAME, String::as_str)
    }

    pub fn weapon_name(&self, id: i32) -> &'a str {
        non_negative(id)
            .and_then(|id| {
                layered(&self.base.names.weapons, &self.ext.weapon_names, self.boundaries().weapons, id)
            })
            .map_or(UNDEFINED_NAME, String::as_str)
    }

    pub fn model_name(&self, id: i32) -> &'a str {
        non_negative(id)
            .and_then(|id| {
                layered(&self.base.names.models, &self.ext.model_names, self.boundaries().models, id)
            })
            .map_or(UNDEFINED_NAME, String::as_str)
    }

    pub fn num_robots(&self) -> usize {
        layered_count(
            self.base.data.robots.len(),
            self.ext.data.robots.len(),
            self.boundaries().robots,
        )
    }

    pub fn num_weapons(&self) -> usize {
        layered_count(
            self.base.data.weapons.len(),
            self.ext.data.weapons.len(),
            self.boundaries().weapons,
        )
    }

    pub fn num_models(&self) -> usize {
        layered_count(
            self.base.data.models.len(),
            self.ext.data.models.len(),
            self.boundaries().models,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::ham::JointList;
    use crate::edit::HamType;
    use crate::edit::options::EditorOptions;
    use crate::game_types::FixAngles;
    use crate::models::polymodel::Submodel;
    use crate::test_support::{
        FakePig, InMemoryExtensionCodec, RECORDS_MARKER, ROBOT_MODEL, arm_angles, sample_ham,
    };

    /// Boundaries matching [`sample_ham`]'s table sizes.
    fn sample_boundaries() -> Boundaries {
        Boundaries {
            robots: 1,
            joints: 5,
            models: 6,
            obj_bitmaps: 20,
            obj_bitmap_pointers: 21,
            weapons: 1,
        }
    }

    fn expansion_angles() -> FixAngles {
        FixAngles::new(100, 200, 300)
    }

    /// One new model (absolute id 6) with an arm driven by a base joint in
    /// state 0 and an expansion joint in state 1, used by one new robot. A
    /// second new robot reuses the base robot model.
    fn sample_vham() -> VHamFile {
        let mut model = Polymodel {
            first_texture: 21,
            num_textures: 2,
            ..Default::default()
        };
        model.submodels.push(Submodel {
            parent: 0,
            ..Default::default()
        });

        let mut robot = Robot {
            model_num: 6,
            num_guns: 1,
            ..Default::default()
        };
        robot.gun_submodels[0] = 1;
        robot.anim_states[0][0] = JointList {
            num_joints: 1,
            offset: 0,
        };
        robot.anim_states[0][1] = JointList {
            num_joints: 1,
            offset: 5,
        };

        let reused = Robot {
            model_num: ROBOT_MODEL as i32,
            ..Default::default()
        };

        VHamFile {
            robots: vec![robot, reused],
            weapons: vec![Weapon::default()],
            models: vec![model],
            joints: vec![JointPos {
                joint_num: 1,
                angles: expansion_angles(),
            }],
            obj_bitmaps: vec![6, 1],
            obj_bitmap_pointers: vec![20, 2],
        }
    }

    fn load() -> (FakePig, EditorHamFile, EditorVhamFile) {
        let pig = FakePig::standard();
        let base = EditorHamFile::from_base(sample_ham(), &pig, EditorOptions::default());
        let vham = EditorVhamFile::with_boundaries(sample_vham(), &base, &pig, sample_boundaries());
        (pig, base, vham)
    }

    #[test]
    fn default_boundaries_are_the_stock_game_counts() {
        let b = Boundaries::default();
        assert_eq!(b.robots, 66);
        assert_eq!(b.joints, 1145);
        assert_eq!(b.models, 166);
        assert_eq!(b.obj_bitmaps, 422);
        assert_eq!(b.obj_bitmap_pointers, 502);
        assert_eq!(b.weapons, 62);
    }

    #[test]
    fn table_lookup_prefers_base_outside_expansion_range() {
        let base: Vec<u16> = (0..25).collect();
        let ext = [900, 901];

        assert_eq!(layered_table(&base, &ext, 20, 3), 3);
        assert_eq!(layered_table(&base, &ext, 20, 21), 901);
        assert_eq!(layered_table(&base, &ext, 20, 23), 23);
        assert_eq!(layered_table(&base, &ext, 20, 30), 0);
        assert_eq!(layered_table(&base[..10], &ext, 20, 15), 0);

        assert_eq!(layered_count(25, 2, 20), 25);
        assert_eq!(layered_count(10, 2, 20), 22);
    }

    #[test]
    fn load_builds_expansion_models() {
        let (_, base, vham) = load();

        assert_eq!(vham.robot_names, ["New Robot 1", "New Robot 2"]);
        assert_eq!(vham.weapon_names, ["New Weapon 1"]);
        assert_eq!(vham.model_names, ["New Model 1"]);

        let model = &vham.data.models[0];
        assert_eq!(model.num_guns, 1);
        assert_eq!(model.gun_submodels[0], 1);
        assert!(model.is_animated);
        assert_eq!(model.animation_matrix[1][0], arm_angles(0));
        assert_eq!(model.animation_matrix[1][1], expansion_angles());

        let eclip_name = base.name(HamType::EClip, 0).unwrap();
        assert_eq!(model.texture_list, ["rbot046", eclip_name]);
    }

    #[test]
    fn save_rebuilds_tables_past_the_boundaries() {
        let (pig, base, mut vham) = load();
        vham.data.obj_bitmaps.clear();
        vham.data.obj_bitmap_pointers.clear();
        let saved = vham.save(&base, &pig).unwrap();

        // the animated texture stays on the base slot its clip animates
        assert_eq!(saved.obj_bitmaps, [6]);
        assert_eq!(saved.obj_bitmap_pointers, [20, 2]);
        assert_eq!(saved.models[0].first_texture, 21);
        assert_eq!(saved.models[0].num_textures, 2);

        // one submodel on gun 0, five states
        assert_eq!(saved.joints.len(), 5);
        let robot = &saved.robots[0];
        assert_eq!(robot.anim_states[0][0].offset, 5);
        assert_eq!(robot.anim_states[0][1].offset, 6);
        assert_eq!(robot.anim_states[0][1].num_joints, 1);
        assert_eq!(saved.joints[0].angles, arm_angles(0));
        assert_eq!(saved.joints[1].angles, expansion_angles());

        // the robot on a base model keeps its descriptors
        assert_eq!(saved.robots[1], sample_vham().robots[1]);
    }

    #[test]
    fn saved_expansion_loads_back_identically() {
        let (pig, base, mut vham) = load();
        let saved = vham.save(&base, &pig).unwrap();
        let reloaded = EditorVhamFile::with_boundaries(saved, &base, &pig, sample_boundaries());

        let before = &vham.data.models[0];
        let after = &reloaded.data.models[0];
        assert_eq!(after.texture_list, before.texture_list);
        assert_eq!(after.animation_matrix, before.animation_matrix);
    }

    #[test]
    fn view_resolves_absolute_ids() {
        let (pig, base, mut vham) = load();
        vham.save(&base, &pig).unwrap();
        let view = vham.view(&base);

        assert_eq!(view.robot(0), base.data.robots.first());
        assert_eq!(view.robot(1), vham.data.robots.first());
        assert!(view.robot(3).is_none());
        assert!(view.robot(-1).is_none());
        assert_eq!(view.weapon(1), vham.data.weapons.first());
        assert_eq!(view.model(6), vham.data.models.first());
        assert_eq!(view.model(5), base.data.models.get(5));

        assert_eq!(view.joint(2).angles, arm_angles(2));
        assert_eq!(view.joint(6).angles, expansion_angles());
        assert_eq!(view.joint(500), JointPos::default());

        assert_eq!(view.obj_bitmap(19), 21);
        assert_eq!(view.obj_bitmap(20), 6);
        assert_eq!(view.obj_bitmap_pointer(22), 2);
        assert_eq!(view.obj_bitmap_pointer(-4), 0);

        assert_eq!(view.robot_name(1), "New Robot 1");
        assert_eq!(view.robot_name(0), base.name(HamType::Robot, 0).unwrap());
        assert_eq!(view.weapon_name(1), "New Weapon 1");
        assert_eq!(view.model_name(6), "New Model 1");
        assert_eq!(view.model_name(60), UNDEFINED_NAME);

        assert_eq!(view.num_robots(), 3);
        assert_eq!(view.num_weapons(), 2);
        assert_eq!(view.num_models(), 7);
    }

    #[test]
    fn write_then_read_through_codec() {
        let pig = FakePig::standard();
        let base = EditorHamFile::from_base(sample_ham(), &pig, EditorOptions::default());
        let mut data = sample_vham();
        data.robots[0].model_num = N_D2_POLYGON_MODELS as i32;
        let mut vham = EditorVhamFile::from_base(data, &base, &pig);

        let codec = InMemoryExtensionCodec::default();
        let mut out = Vec::new();
        vham.write(&codec, &mut out, &base, &pig).unwrap();
        assert_eq!(out, RECORDS_MARKER);
        assert_eq!(codec.file.borrow().joints.len(), 5);
        assert_eq!(codec.file.borrow().robots[0].anim_states[0][0].offset, 1145);

        let reread = EditorVhamFile::read(&codec, &out, &base, &pig).unwrap();
        assert_eq!(reread.data.models[0].animation_matrix, vham.data.models[0].animation_matrix);
        assert!(EditorVhamFile::read(&codec, b"nope", &base, &pig).is_err());
    }

    #[test]
    fn stock_boundaries_leave_a_gap_after_a_small_base() {
        let pig = FakePig::standard();
        let base = EditorHamFile::from_base(sample_ham(), &pig, EditorOptions::default());
        let mut data = sample_vham();
        data.robots[0].model_num = N_D2_POLYGON_MODELS as i32;
        let vham = EditorVhamFile::from_base(data, &base, &pig);
        let view = vham.view(&base);

        assert!(view.robot(10).is_none());
        assert_eq!(view.robot_name(10), UNDEFINED_NAME);
        assert_eq!(view.robot(N_D2_ROBOT_TYPES as i32), vham.data.robots.first());
        assert_eq!(view.num_robots(), N_D2_ROBOT_TYPES + 2);
        assert!(vham.data.models[0].is_animated);
    }
}
