//! The base-file editor database.
//!
//! Loading copies the decoded records, clamps bad references, and then
//! reconstructs what the records only encode indirectly: model guns and
//! animation from robot joint runs, model texture names from the
//! object-bitmap tables, and display names from the trailing chunks. Saving
//! runs the same transforms in reverse.

use std::collections::{HashMap, HashSet};
use std::io::Write;

use rootcause::Report;
use tracing::{debug, warn};

use crate::data::ham::{
    EClip, HamFile, JointPos, NUM_MULTIPLAYER_BITMAPS, Powerup, Reactor, Robot, TmapInfo, VClip,
    WClip, Weapon,
};
use crate::data::{BaseFileCodec, BitmapResolver};
use crate::edit::chunks::{
    ChunkError, ChunkRead, ElementCounts, NameChunk, OrphanedModel, TrailingChunks, scan_chunks,
    write_name_chunk, write_orphan_chunk,
};
use crate::edit::names::{NameLists, added_element_name};
use crate::edit::options::{EditorOptions, ExtraBitmapTarget};
use crate::edit::validate::{ValidationReport, validate_references};
use crate::edit::HamType;
use crate::error::{ErrorKind, IResult};
use crate::models::guns::{
    guns_from_reactor, guns_from_robot, guns_from_ship, reactor_guns_from_model,
    ship_guns_from_model,
};
use crate::models::joints::{build_animation, clear_joint_runs, flatten_animation};
use crate::models::obj_bitmaps::{
    ExtraModelBitmaps, ObjBitmapTableBuilder, ShipModels, TextureNameTables, build_compatible,
    build_deduplicated,
};
use crate::models::polymodel::Polymodel;

fn element<T>(items: &[T], id: i32) -> Option<&T> {
    items.get(usize::try_from(id).ok()?)
}

fn element_mut<T>(items: &mut [T], id: i32) -> Option<&mut T> {
    items.get_mut(usize::try_from(id).ok()?)
}

/// Editor view of a base HAM file.
#[derive(Debug)]
pub struct EditorHamFile {
    /// Records in their on-disk shape. Model guns, animation and texture
    /// lists are authoritative; robot joint runs and object-bitmap tables
    /// are regenerated from them on save.
    pub data: HamFile,
    pub names: NameLists,
    pub options: EditorOptions,
    /// Fields the validator replaced while loading.
    pub validation: ValidationReport,
    /// Why trailing chunks found while loading were not used.
    pub chunk_rejections: Vec<Report<ChunkError>>,
    /// Lowercase EClip name -> EClip index.
    eclip_name_mapping: HashMap<String, usize>,
    /// Lowercase texture name -> object-bitmap index.
    obj_bitmap_mapping: HashMap<String, usize>,
    multiplayer_bitmaps: [u16; NUM_MULTIPLAYER_BITMAPS],
}

impl EditorHamFile {
    /// Decode a HAM file with `codec` and build the editor view, reading the
    /// trailing chunks that follow the records.
    pub fn read(
        codec: &dyn BaseFileCodec,
        input: &[u8],
        resolver: &dyn BitmapResolver,
        options: EditorOptions,
    ) -> IResult<Self> {
        let mut input = input;
        let data = codec.decode(&mut input)?;
        let chunks = scan_chunks(&mut input);
        if !input.is_empty() {
            debug!("{} trailing bytes left unread", input.len());
        }
        Ok(Self::load(data, chunks, resolver, options))
    }

    /// Build the editor view of records that carry no trailing chunks.
    pub fn from_base(data: HamFile, resolver: &dyn BitmapResolver, options: EditorOptions) -> Self {
        Self::load(data, TrailingChunks::default(), resolver, options)
    }

    /// Build the editor view of `data` using already scanned chunks.
    pub fn load(
        mut data: HamFile,
        chunks: TrailingChunks,
        resolver: &dyn BitmapResolver,
        options: EditorOptions,
    ) -> Self {
        let validation = validate_references(&mut data);
        let mut chunk_rejections = Vec::new();

        let loaded_counts = ElementCounts {
            vclips: data.vclips.len(),
            eclips: data.eclips.len(),
            robots: data.robots.len(),
            weapons: data.weapons.len(),
            sounds: data.sounds.len(),
            models: data.models.len(),
            powerups: data.powerups.len(),
            reactors: Some(data.reactors.len()),
        };
        let names = match chunks.names.and_then_check(|chunk| check_counts(chunk, &loaded_counts)) {
            ChunkRead::Present(chunk) => names_from_chunk(chunk, data.reactors.len()),
            ChunkRead::Absent => NameLists::defaults(&data),
            ChunkRead::Rejected(reason) => {
                warn!("name chunk rejected, generating default names: {reason}");
                chunk_rejections.push(reason);
                NameLists::defaults(&data)
            }
        };

        let mut file = EditorHamFile {
            data,
            names,
            options,
            validation,
            chunk_rejections,
            eclip_name_mapping: HashMap::new(),
            obj_bitmap_mapping: HashMap::new(),
            multiplayer_bitmaps: [0; NUM_MULTIPLAYER_BITMAPS],
        };

        match chunks.orphans {
            ChunkRead::Present(orphans) => file.apply_orphans(&orphans),
            ChunkRead::Rejected(reason) => file.chunk_rejections.push(reason),
            ChunkRead::Absent => {}
        }

        file.translate(resolver);
        file
    }

    fn apply_orphans(&mut self, orphans: &[OrphanedModel]) {
        for orphan in orphans {
            match orphan
                .model_index()
                .and_then(|index| self.data.models.get_mut(index))
            {
                Some(model) => orphan.apply_to(model),
                None => warn!("orphaned model {} does not exist", orphan.model_id),
            }
        }
    }

    /// Reconstruct model guns, animation and texture lists from the records.
    fn translate(&mut self, resolver: &dyn BitmapResolver) {
        self.rebuild_eclip_mapping();

        let first_multi = self.data.first_multi_bitmap_num.max(0) as usize;
        for (i, slot) in self.multiplayer_bitmaps.iter_mut().enumerate() {
            *slot = self
                .data
                .obj_bitmap_pointers
                .get(first_multi + i)
                .and_then(|&pointer| self.data.obj_bitmaps.get(pointer as usize))
                .copied()
                .unwrap_or(0);
        }

        let HamFile {
            robots,
            joints,
            models,
            reactors,
            player_ship,
            ..
        } = &mut self.data;
        let joints: &[JointPos] = joints;

        let mut visited = 0;
        for (i, robot) in robots.iter().enumerate() {
            let Some(model) = robot.model_index().and_then(|index| models.get_mut(index)) else {
                warn!("robot {i} uses missing model {}", robot.model_num);
                continue;
            };
            guns_from_robot(robot, model);
            visited += build_animation(robot, model, |index| joints.get(index).copied());
        }
        debug!("read {visited} of {} robot joints", joints.len());

        for reactor in reactors.iter() {
            if let Some(model) = reactor.model_index().and_then(|index| models.get_mut(index)) {
                guns_from_reactor(reactor, model);
            }
        }
        match player_ship.model_index().and_then(|index| models.get_mut(index)) {
            Some(model) => guns_from_ship(player_ship, model),
            None => warn!("player ship uses missing model {}", player_ship.model_num),
        }

        let tables = TextureNameTables::build(
            self.data.obj_bitmaps.len(),
            |index| self.data.obj_bitmaps[index],
            self.data
                .eclips
                .iter()
                .zip(self.names.eclips.iter().map(String::as_str)),
            resolver,
        );
        let pointers = &self.data.obj_bitmap_pointers;
        tables.apply(self.data.models.iter_mut(), |index| pointers.get(index).copied());
        self.obj_bitmap_mapping = tables.obj_bitmap_mapping;
    }

    fn rebuild_eclip_mapping(&mut self) {
        self.eclip_name_mapping = self
            .names
            .eclips
            .iter()
            .enumerate()
            .map(|(index, name)| (name.to_lowercase(), index))
            .collect();
    }

    /// Regenerate the derived tables and return the records to write.
    pub fn save(&mut self, resolver: &dyn BitmapResolver) -> IResult<HamFile> {
        self.generate_object_bitmap_tables(resolver)?;

        let HamFile {
            robots,
            joints,
            models,
            reactors,
            player_ship,
            ..
        } = &mut self.data;

        debug!("discarding {} loaded joints", joints.len());
        joints.clear();
        for (i, robot) in robots.iter_mut().enumerate() {
            match robot.model_index().and_then(|index| models.get(index)) {
                Some(model) => flatten_animation(robot, model, joints, 0)?,
                None => {
                    warn!(
                        "robot {i} uses missing model {}, leaving it unanimated",
                        robot.model_num
                    );
                    clear_joint_runs(robot);
                }
            }
        }
        debug!("constructed {} joints", joints.len());

        for reactor in reactors.iter_mut() {
            if let Some(model) = reactor.model_index().and_then(|index| models.get(index)) {
                reactor_guns_from_model(reactor, model);
            }
        }
        if let Some(model) = player_ship.model_index().and_then(|index| models.get(index)) {
            ship_guns_from_model(player_ship, model);
        }

        Ok(self.data.clone())
    }

    /// Save and encode the records with `codec`, followed by the name and
    /// orphaned-model chunks when `export_extra_data` is set.
    pub fn write(
        &mut self,
        codec: &dyn BaseFileCodec,
        out: &mut dyn Write,
        resolver: &dyn BitmapResolver,
    ) -> IResult<()> {
        let file = self.save(resolver)?;
        codec.encode(&file, out)?;
        if self.options.export_extra_data {
            let mut out = out;
            write_name_chunk(&mut out, &self.names)?;
            write_orphan_chunk(&mut out, &self.orphaned_models())?;
        }
        Ok(())
    }

    fn generate_object_bitmap_tables(&mut self, resolver: &dyn BitmapResolver) -> Result<(), ErrorKind> {
        let mut builder = ObjBitmapTableBuilder::new(resolver);
        let multiplayer_bitmaps = self.multiplayer_bitmaps;

        let first_multi = if self.options.compatibility_object_bitmaps {
            let ship = self
                .data
                .player_ship
                .model_index()
                .filter(|&index| index < self.data.models.len());
            let dying = ship
                .and_then(|index| usize::try_from(self.data.models[index].dying_model_num).ok())
                .filter(|&index| index < self.data.models.len());

            let mut extra = ExtraModelBitmaps::new();
            for entry in &self.options.extra_object_bitmaps {
                let model = match entry.target {
                    ExtraBitmapTarget::Weapon(weapon) => {
                        self.data.weapons.get(weapon).and_then(Weapon::model_index)
                    }
                    ExtraBitmapTarget::Model(model) => Some(model),
                };
                if let Some(model) = model {
                    extra.entry(model).or_insert(entry.bitmaps.as_slice());
                }
            }

            let eclip_keys: HashSet<String> =
                self.names.eclips.iter().map(|name| name.to_lowercase()).collect();
            build_compatible(
                &mut builder,
                &mut self.data.models,
                ShipModels { ship, dying },
                &extra,
                &eclip_keys,
                &multiplayer_bitmaps,
            )?
        } else {
            build_deduplicated(&mut builder, &mut self.data.models, &multiplayer_bitmaps)?
        };

        builder.remap_eclips(
            self.data
                .eclips
                .iter_mut()
                .zip(self.names.eclips.iter().map(String::as_str)),
        )?;

        self.obj_bitmap_mapping = builder.mapping().clone();
        self.data.first_multi_bitmap_num = first_multi as i32;
        self.data.obj_bitmaps = builder.obj_bitmaps;
        self.data.obj_bitmap_pointers = builder.obj_bitmap_pointers;
        debug!(
            "built {} object bitmaps and {} pointers",
            self.data.obj_bitmaps.len(),
            self.data.obj_bitmap_pointers.len()
        );
        Ok(())
    }

    /// Models whose guns and animation no robot, reactor or ship carries.
    pub fn orphaned_models(&self) -> Vec<OrphanedModel> {
        let owned: HashSet<usize> = self
            .data
            .robots
            .iter()
            .filter_map(Robot::model_index)
            .chain(self.data.reactors.iter().filter_map(Reactor::model_index))
            .chain(self.data.player_ship.model_index())
            .collect();
        self.data
            .models
            .iter()
            .enumerate()
            .filter(|(index, _)| !owned.contains(index))
            .map(|(index, model)| OrphanedModel::from_model(index, model))
            .collect()
    }

    pub fn tmap_info(&self, id: i32) -> Option<&TmapInfo> {
        element(&self.data.tmap_info, id)
    }

    pub fn tmap_info_mut(&mut self, id: i32) -> Option<&mut TmapInfo> {
        element_mut(&mut self.data.tmap_info, id)
    }

    pub fn vclip(&self, id: i32) -> Option<&VClip> {
        element(&self.data.vclips, id)
    }

    pub fn vclip_mut(&mut self, id: i32) -> Option<&mut VClip> {
        element_mut(&mut self.data.vclips, id)
    }

    pub fn eclip(&self, id: i32) -> Option<&EClip> {
        element(&self.data.eclips, id)
    }

    pub fn eclip_mut(&mut self, id: i32) -> Option<&mut EClip> {
        element_mut(&mut self.data.eclips, id)
    }

    pub fn wclip(&self, id: i32) -> Option<&WClip> {
        element(&self.data.wclips, id)
    }

    pub fn wclip_mut(&mut self, id: i32) -> Option<&mut WClip> {
        element_mut(&mut self.data.wclips, id)
    }

    pub fn robot(&self, id: i32) -> Option<&Robot> {
        element(&self.data.robots, id)
    }

    pub fn robot_mut(&mut self, id: i32) -> Option<&mut Robot> {
        element_mut(&mut self.data.robots, id)
    }

    pub fn weapon(&self, id: i32) -> Option<&Weapon> {
        element(&self.data.weapons, id)
    }

    pub fn weapon_mut(&mut self, id: i32) -> Option<&mut Weapon> {
        element_mut(&mut self.data.weapons, id)
    }

    pub fn model(&self, id: i32) -> Option<&Polymodel> {
        element(&self.data.models, id)
    }

    pub fn model_mut(&mut self, id: i32) -> Option<&mut Polymodel> {
        element_mut(&mut self.data.models, id)
    }

    pub fn powerup(&self, id: i32) -> Option<&Powerup> {
        element(&self.data.powerups, id)
    }

    pub fn powerup_mut(&mut self, id: i32) -> Option<&mut Powerup> {
        element_mut(&mut self.data.powerups, id)
    }

    pub fn reactor(&self, id: i32) -> Option<&Reactor> {
        element(&self.data.reactors, id)
    }

    pub fn reactor_mut(&mut self, id: i32) -> Option<&mut Reactor> {
        element_mut(&mut self.data.reactors, id)
    }

    /// Append a default element and name it. Returns the new element's index.
    pub fn add_element(&mut self, element_type: HamType) -> IResult<usize> {
        let index = match element_type {
            HamType::EClip => {
                self.data.eclips.push(EClip::default());
                self.data.eclips.len() - 1
            }
            HamType::Robot => {
                self.data.robots.push(Robot::default());
                self.data.robots.len() - 1
            }
            HamType::Weapon => {
                self.data.weapons.push(Weapon::default());
                self.data.weapons.len() - 1
            }
            HamType::Model => {
                self.data.models.push(Polymodel::default());
                self.data.models.len() - 1
            }
            other => return Err(ErrorKind::UnsupportedElement(other).into()),
        };

        if let (Some(name), Some(list)) = (
            added_element_name(element_type, index),
            self.names.list_mut(element_type),
        ) {
            list.push(name);
        }
        if element_type == HamType::EClip {
            self.rebuild_eclip_mapping();
        }
        Ok(index)
    }

    /// Change an element's display name. Renaming an EClip also renames the
    /// texture entries that refer to it.
    pub fn rename(
        &mut self,
        element_type: HamType,
        index: usize,
        name: impl Into<String>,
    ) -> IResult<()> {
        let list = self
            .names
            .list_mut(element_type)
            .ok_or(ErrorKind::UnsupportedElement(element_type))?;
        let count = list.len();
        let slot = list.get_mut(index).ok_or(ErrorKind::ElementOutOfRange {
            element_type,
            index,
            count,
        })?;
        let name = name.into();
        let old = std::mem::replace(slot, name.clone());
        if element_type == HamType::EClip {
            // models refer to animated textures by clip name
            for texture in self
                .data
                .models
                .iter_mut()
                .flat_map(|model| model.texture_list.iter_mut())
            {
                if texture.to_lowercase() == old.to_lowercase() {
                    *texture = name.clone();
                }
            }
            self.rebuild_eclip_mapping();
        }
        Ok(())
    }

    pub fn name(&self, element_type: HamType, index: usize) -> Option<&str> {
        self.names.get(element_type, index)
    }

    /// Index of the EClip with the given name, ignoring case.
    pub fn eclip_by_name(&self, name: &str) -> Option<usize> {
        self.eclip_name_mapping.get(&name.to_lowercase()).copied()
    }

    /// Object-bitmap index currently carrying a texture name, ignoring case.
    pub fn obj_bitmap_index(&self, texture: &str) -> Option<usize> {
        self.obj_bitmap_mapping.get(&texture.to_lowercase()).copied()
    }

    /// Bitmaps of the multiplayer ship color variants.
    pub fn multiplayer_bitmaps(&self) -> &[u16; NUM_MULTIPLAYER_BITMAPS] {
        &self.multiplayer_bitmaps
    }
}

fn check_counts(chunk: &NameChunk, loaded: &ElementCounts) -> Result<(), Report<ChunkError>> {
    if chunk.counts.matches(loaded) {
        Ok(())
    } else {
        Err(Report::new(ChunkError::CountMismatch {
            expected: *loaded,
            found: chunk.counts,
        }))
    }
}

fn names_from_chunk(chunk: NameChunk, reactor_count: usize) -> NameLists {
    let mut names = chunk.names;
    if chunk.counts.reactors.is_none() {
        names.reactors = NameLists::default_reactor_names(reactor_count);
    }
    names
}
