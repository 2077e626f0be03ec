//! Editor chunks stored after a HAM file's record arrays.
//!
//! The game ignores anything past the records, so the editor appends:
//!
//! - `HAMN`: display names for every named category, preceded by the element
//!   counts they were written for.
//! - `ORPN`: gun and animation data for models that no robot, reactor or
//!   ship carries, and which would otherwise be lost on reload.
//!
//! Each chunk starts with its 4-byte tag and an `i32` version. All other
//! fields are little-endian. Both chunks are optional; a chunk that cannot be
//! used is reported as [`ChunkRead::Rejected`] and handled like a missing one.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use rootcause::Report;
use thiserror::Error;
use tracing::{debug, warn};
use winnow::Parser;
use winnow::binary::le_i32;
use winnow::error::{ContextError, ErrMode};
use winnow::token::take;

use crate::data::parser_utils::{
    WResult, parse_bool, parse_fix_angles, parse_fix_vector, parse_string_list, write_fix_angles,
    write_fix_vector, write_prefixed_string,
};
use crate::edit::names::NameLists;
use crate::error::{ErrorKind, narrow};
use crate::game_types::{FixAngles, FixVector};
use crate::models::polymodel::{
    AnimationMatrix, MAX_GUNS, MAX_SUBMODELS, NUM_ANIMATION_STATES, Polymodel,
};

pub const NAME_CHUNK_TAG: &[u8; 4] = b"HAMN";
pub const ORPHAN_CHUNK_TAG: &[u8; 4] = b"ORPN";

/// Name chunk version written by this crate. Version 1 has no reactor names.
pub const NAME_CHUNK_VERSION: i32 = 2;
pub const ORPHAN_CHUNK_VERSION: i32 = 1;

/// Why an optional chunk was not used.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error("unsupported {tag} chunk version {version}")]
    UnsupportedVersion { tag: &'static str, version: i32 },
    #[error("name chunk was written for {found:?} elements but the file has {expected:?}")]
    CountMismatch {
        expected: ElementCounts,
        found: ElementCounts,
    },
    #[error("orphaned model {model_id} has {num_guns} guns")]
    InvalidGunCount { model_id: i32, num_guns: i32 },
    #[error("malformed {tag} chunk: {detail}")]
    Malformed { tag: &'static str, detail: String },
}

/// Outcome of looking for one optional chunk.
#[derive(Debug)]
pub enum ChunkRead<T> {
    Present(T),
    Absent,
    Rejected(Report<ChunkError>),
}

impl<T> Default for ChunkRead<T> {
    fn default() -> Self {
        ChunkRead::Absent
    }
}

impl<T> ChunkRead<T> {
    /// The chunk's data, treating a rejected chunk as absent.
    pub fn present(self) -> Option<T> {
        match self {
            ChunkRead::Present(data) => Some(data),
            ChunkRead::Absent | ChunkRead::Rejected(_) => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ChunkRead::Present(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, ChunkRead::Rejected(_))
    }

    /// Keep the data only if `check` accepts it.
    pub fn and_then_check(
        self,
        check: impl FnOnce(&T) -> Result<(), Report<ChunkError>>,
    ) -> ChunkRead<T> {
        match self {
            ChunkRead::Present(data) => match check(&data) {
                Ok(()) => ChunkRead::Present(data),
                Err(reason) => ChunkRead::Rejected(reason),
            },
            other => other,
        }
    }
}

/// Per-category element counts stored in a name chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementCounts {
    pub vclips: usize,
    pub eclips: usize,
    pub robots: usize,
    pub weapons: usize,
    pub sounds: usize,
    pub models: usize,
    pub powerups: usize,
    /// Absent in version 1 chunks.
    pub reactors: Option<usize>,
}

impl ElementCounts {
    /// Counts of a set of name lists.
    pub fn of(names: &NameLists) -> Self {
        ElementCounts {
            vclips: names.vclips.len(),
            eclips: names.eclips.len(),
            robots: names.robots.len(),
            weapons: names.weapons.len(),
            sounds: names.sounds.len(),
            models: names.models.len(),
            powerups: names.powerups.len(),
            reactors: Some(names.reactors.len()),
        }
    }

    /// Whether a chunk written with `self` counts fits a file with
    /// `loaded` counts. A chunk without reactor counts fits any reactor count.
    pub fn matches(&self, loaded: &ElementCounts) -> bool {
        let reactors_match = match (self.reactors, loaded.reactors) {
            (Some(found), Some(expected)) => found == expected,
            _ => true,
        };
        self.vclips == loaded.vclips
            && self.eclips == loaded.eclips
            && self.robots == loaded.robots
            && self.weapons == loaded.weapons
            && self.sounds == loaded.sounds
            && self.models == loaded.models
            && self.powerups == loaded.powerups
            && reactors_match
    }
}

/// Decoded `HAMN` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChunk {
    pub version: i32,
    pub counts: ElementCounts,
    /// Reactor names are empty for version 1 chunks.
    pub names: NameLists,
}

/// Gun and animation data preserved for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct OrphanedModel {
    pub model_id: i32,
    pub num_guns: i32,
    pub gun_submodels: [i32; MAX_GUNS],
    pub gun_points: [FixVector; MAX_GUNS],
    pub gun_dirs: [FixVector; MAX_GUNS],
    /// Present exactly when the model is animated.
    pub animation_matrix: Option<AnimationMatrix>,
}

impl OrphanedModel {
    pub fn from_model(model_id: usize, model: &Polymodel) -> Self {
        OrphanedModel {
            model_id: model_id as i32,
            num_guns: model.gun_count() as i32,
            gun_submodels: model.gun_submodels,
            gun_points: model.gun_points,
            gun_dirs: model.gun_dirs,
            animation_matrix: model.is_animated.then_some(model.animation_matrix),
        }
    }

    pub fn model_index(&self) -> Option<usize> {
        usize::try_from(self.model_id).ok()
    }

    /// Overwrite the model's guns and animation with the preserved data.
    pub fn apply_to(&self, model: &mut Polymodel) {
        model.num_guns = self.num_guns;
        let count = self.num_guns.clamp(0, MAX_GUNS as i32) as usize;
        model.gun_submodels[..count].copy_from_slice(&self.gun_submodels[..count]);
        model.gun_points[..count].copy_from_slice(&self.gun_points[..count]);
        model.gun_dirs[..count].copy_from_slice(&self.gun_dirs[..count]);
        model.is_animated = self.animation_matrix.is_some();
        if let Some(matrix) = &self.animation_matrix {
            model.animation_matrix = *matrix;
        }
    }
}

/// Every chunk found after the record arrays.
#[derive(Debug, Default)]
pub struct TrailingChunks {
    pub names: ChunkRead<NameChunk>,
    pub orphans: ChunkRead<Vec<OrphanedModel>>,
}

fn malformed(tag: &'static str) -> impl FnOnce(ErrMode<ContextError>) -> Report<ChunkError> {
    move |e| {
        Report::new(ChunkError::Malformed {
            tag,
            detail: format!("{e}"),
        })
    }
}

fn parse_count(input: &mut &[u8]) -> WResult<usize> {
    let count = le_i32.parse_next(input)?;
    usize::try_from(count).map_err(|_| ErrMode::Cut(ContextError::new()))
}

fn parse_name_counts(input: &mut &[u8], version: i32) -> WResult<ElementCounts> {
    Ok(ElementCounts {
        vclips: parse_count(input)?,
        eclips: parse_count(input)?,
        robots: parse_count(input)?,
        weapons: parse_count(input)?,
        sounds: parse_count(input)?,
        models: parse_count(input)?,
        powerups: parse_count(input)?,
        reactors: if version >= 2 {
            Some(parse_count(input)?)
        } else {
            None
        },
    })
}

fn parse_name_lists(input: &mut &[u8], counts: &ElementCounts) -> WResult<NameLists> {
    Ok(NameLists {
        vclips: parse_string_list(input, counts.vclips)?,
        eclips: parse_string_list(input, counts.eclips)?,
        robots: parse_string_list(input, counts.robots)?,
        weapons: parse_string_list(input, counts.weapons)?,
        sounds: parse_string_list(input, counts.sounds)?,
        models: parse_string_list(input, counts.models)?,
        powerups: parse_string_list(input, counts.powerups)?,
        reactors: match counts.reactors {
            Some(count) => parse_string_list(input, count)?,
            None => Vec::new(),
        },
    })
}

/// Parse a `HAMN` chunk body (everything after the tag).
pub fn parse_name_chunk(input: &mut &[u8]) -> Result<NameChunk, Report<ChunkError>> {
    let tag = "HAMN";
    let version = le_i32.parse_next(input).map_err(malformed(tag))?;
    if !(1..=2).contains(&version) {
        return Err(Report::new(ChunkError::UnsupportedVersion { tag, version }));
    }
    let counts = parse_name_counts(input, version).map_err(malformed(tag))?;
    let names = parse_name_lists(input, &counts).map_err(malformed(tag))?;
    Ok(NameChunk {
        version,
        counts,
        names,
    })
}

fn parse_animation_matrix(input: &mut &[u8]) -> WResult<AnimationMatrix> {
    let mut matrix = [[FixAngles::default(); NUM_ANIMATION_STATES]; MAX_SUBMODELS];
    for row in matrix.iter_mut() {
        for cell in row.iter_mut() {
            *cell = parse_fix_angles(input)?;
        }
    }
    Ok(matrix)
}

fn parse_orphaned_model(input: &mut &[u8]) -> Result<OrphanedModel, Report<ChunkError>> {
    let tag = "ORPN";
    let model_id = le_i32.parse_next(input).map_err(malformed(tag))?;
    let num_guns = le_i32.parse_next(input).map_err(malformed(tag))?;
    if !(0..=MAX_GUNS as i32).contains(&num_guns) {
        return Err(Report::new(ChunkError::InvalidGunCount { model_id, num_guns }));
    }

    let mut model = OrphanedModel {
        model_id,
        num_guns,
        gun_submodels: [0; MAX_GUNS],
        gun_points: [FixVector::default(); MAX_GUNS],
        gun_dirs: [FixVector::default(); MAX_GUNS],
        animation_matrix: None,
    };
    for gun in 0..num_guns as usize {
        model.gun_submodels[gun] = le_i32.parse_next(input).map_err(malformed(tag))?;
        model.gun_points[gun] = parse_fix_vector(input).map_err(malformed(tag))?;
        model.gun_dirs[gun] = parse_fix_vector(input).map_err(malformed(tag))?;
    }
    if parse_bool(input).map_err(malformed(tag))? {
        model.animation_matrix = Some(parse_animation_matrix(input).map_err(malformed(tag))?);
    }
    Ok(model)
}

/// Parse an `ORPN` chunk body (everything after the tag).
pub fn parse_orphan_chunk(input: &mut &[u8]) -> Result<Vec<OrphanedModel>, Report<ChunkError>> {
    let tag = "ORPN";
    let version = le_i32.parse_next(input).map_err(malformed(tag))?;
    if version != ORPHAN_CHUNK_VERSION {
        return Err(Report::new(ChunkError::UnsupportedVersion { tag, version }));
    }
    let count = parse_count(input).map_err(malformed(tag))?;
    let mut models = Vec::with_capacity(count.min(input.len()));
    for _ in 0..count {
        models.push(parse_orphaned_model(input)?);
    }
    Ok(models)
}

/// Scan the chunks that follow the record arrays.
///
/// Scanning stops when fewer than four bytes remain, at an unknown tag, or
/// after a chunk that could not be parsed, since the position of whatever
/// follows it is unknown.
pub fn scan_chunks(input: &mut &[u8]) -> TrailingChunks {
    let mut chunks = TrailingChunks::default();

    while input.len() >= 4 {
        let Ok(tag) = take::<_, _, ContextError>(4usize).parse_next(input) else {
            break;
        };
        if tag == NAME_CHUNK_TAG {
            match parse_name_chunk(input) {
                Ok(chunk) => {
                    debug!("read version {} name chunk", chunk.version);
                    chunks.names = ChunkRead::Present(chunk);
                }
                Err(reason) => {
                    warn!("ignoring name chunk: {reason}");
                    chunks.names = ChunkRead::Rejected(reason);
                    break;
                }
            }
        } else if tag == ORPHAN_CHUNK_TAG {
            match parse_orphan_chunk(input) {
                Ok(models) => {
                    debug!("read {} orphaned models", models.len());
                    chunks.orphans = ChunkRead::Present(models);
                }
                Err(reason) => {
                    warn!("ignoring orphaned model chunk: {reason}");
                    chunks.orphans = ChunkRead::Rejected(reason);
                    break;
                }
            }
        } else {
            warn!("unknown trailing chunk tag {:02X?}, stopping scan", tag);
            break;
        }
    }

    chunks
}

fn write_names(out: &mut impl Write, names: &[String]) -> Result<(), ErrorKind> {
    for name in names {
        write_prefixed_string(out, name)?;
    }
    Ok(())
}

/// Write a version 2 `HAMN` chunk.
pub fn write_name_chunk(out: &mut impl Write, names: &NameLists) -> Result<(), ErrorKind> {
    out.write_all(NAME_CHUNK_TAG)?;
    out.write_i32::<LittleEndian>(NAME_CHUNK_VERSION)?;
    for list in [
        &names.vclips,
        &names.eclips,
        &names.robots,
        &names.weapons,
        &names.sounds,
        &names.models,
        &names.powerups,
        &names.reactors,
    ] {
        out.write_i32::<LittleEndian>(narrow("name count", list.len())?)?;
    }
    for list in [
        &names.vclips,
        &names.eclips,
        &names.robots,
        &names.weapons,
        &names.sounds,
        &names.models,
        &names.powerups,
        &names.reactors,
    ] {
        write_names(out, list)?;
    }
    Ok(())
}

/// Write an `ORPN` chunk.
pub fn write_orphan_chunk(out: &mut impl Write, models: &[OrphanedModel]) -> Result<(), ErrorKind> {
    out.write_all(ORPHAN_CHUNK_TAG)?;
    out.write_i32::<LittleEndian>(ORPHAN_CHUNK_VERSION)?;
    out.write_i32::<LittleEndian>(narrow("orphaned model count", models.len())?)?;
    for model in models {
        out.write_i32::<LittleEndian>(model.model_id)?;
        out.write_i32::<LittleEndian>(model.num_guns)?;
        let count = model.num_guns.clamp(0, MAX_GUNS as i32) as usize;
        for gun in 0..count {
            out.write_i32::<LittleEndian>(model.gun_submodels[gun])?;
            write_fix_vector(out, &model.gun_points[gun])?;
            write_fix_vector(out, &model.gun_dirs[gun])?;
        }
        out.write_u8(model.animation_matrix.is_some() as u8)?;
        if let Some(matrix) = &model.animation_matrix {
            for angles in matrix.iter().flatten() {
                write_fix_angles(out, angles)?;
            }
        }
    }
    Ok(())
}
