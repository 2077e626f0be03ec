//! Object-bitmap tables and per-model texture lists.
//!
//! On disk, a model's texture slot `k` resolves through two flat tables:
//! `obj_bitmaps[obj_bitmap_pointers[first_texture + k]]`. The editor keeps a
//! list of texture names per model instead and regenerates both tables on
//! save. Animated textures are named after the EClip that drives their slot.

use std::collections::{BTreeMap, HashMap, HashSet};

use itertools::Itertools;
use tracing::{trace, warn};

use crate::data::BitmapResolver;
use crate::data::ham::EClip;
use crate::error::{ErrorKind, narrow};
use crate::models::polymodel::Polymodel;

/// Texture name emitted for slots that resolve to nothing.
pub const UNRESOLVED_TEXTURE: &str = "bogus";
/// Bitmap id the game writes for "no bitmap"; resolved as bitmap 0.
pub const SENTINEL_BITMAP: u16 = u16::MAX;

/// Lookups used to turn pointer slices back into texture names.
#[derive(Debug, Default)]
pub struct TextureNameTables {
    /// Object-bitmap slot -> name of the EClip animating it.
    pub eclip_textures: HashMap<usize, String>,
    /// Object-bitmap index -> lowercase name of a non-animated bitmap.
    pub plain_textures: HashMap<usize, String>,
    /// Lowercase name -> first object-bitmap index carrying it. EClip names
    /// map to the slot they animate.
    pub obj_bitmap_mapping: HashMap<String, usize>,
}

impl TextureNameTables {
    /// Resolve every object bitmap in `0..obj_bitmap_count`.
    ///
    /// `obj_bitmap_at` reads an absolute object-bitmap index. `eclips` yields
    /// each clip with its display name.
    pub fn build<'a>(
        obj_bitmap_count: usize,
        obj_bitmap_at: impl Fn(usize) -> u16,
        eclips: impl IntoIterator<Item = (&'a EClip, &'a str)>,
        resolver: &dyn BitmapResolver,
    ) -> Self {
        let mut tables = TextureNameTables::default();

        for (clip, name) in eclips {
            let Ok(slot) = usize::try_from(clip.changing_object_texture) else {
                continue;
            };
            tables.eclip_textures.entry(slot).or_insert_with(|| name.to_owned());
            tables
                .obj_bitmap_mapping
                .entry(name.to_lowercase())
                .or_insert(slot);
        }

        for index in 0..obj_bitmap_count {
            let mut bitmap = obj_bitmap_at(index);
            if bitmap == SENTINEL_BITMAP {
                bitmap = 0;
            }
            let Some(info) = resolver.bitmap_info(bitmap) else {
                continue;
            };
            if info.is_animated {
                continue;
            }
            let name = info.name.to_lowercase();
            tables
                .obj_bitmap_mapping
                .entry(name.clone())
                .or_insert(index);
            tables.plain_textures.insert(index, name);
        }

        tables
    }

    /// Name for the object bitmap a pointer refers to.
    pub fn texture_name(&self, pointer: usize) -> &str {
        self.eclip_textures
            .get(&pointer)
            .or_else(|| self.plain_textures.get(&pointer))
            .map(String::as_str)
            .unwrap_or(UNRESOLVED_TEXTURE)
    }

    /// Rebuild a model's texture list from its pointer slice.
    ///
    /// `pointer_at` reads an absolute pointer-table index.
    pub fn texture_list(
        &self,
        model: &Polymodel,
        pointer_at: impl Fn(usize) -> Option<u16>,
    ) -> Vec<String> {
        let first = model.first_texture as usize;
        (first..first + model.num_textures as usize)
            .map(|slot| match pointer_at(slot) {
                Some(pointer) => self.texture_name(pointer as usize).to_owned(),
                None => {
                    warn!("object bitmap pointer {slot} is out of range");
                    UNRESOLVED_TEXTURE.to_owned()
                }
            })
            .collect()
    }

    /// Replace every model's texture list with the names its slice resolves to.
    pub fn apply<'m>(
        &self,
        models: impl IntoIterator<Item = &'m mut Polymodel>,
        pointer_at: impl Fn(usize) -> Option<u16>,
    ) {
        for model in models {
            let textures = self.texture_list(model, &pointer_at);
            trace!("model texture list: [{}]", textures.iter().join(" "));
            model.texture_list = textures;
        }
    }
}

/// Accumulates freshly generated object-bitmap and pointer tables.
///
/// Indices handed out are absolute: an extension file starts its tables at
/// the base file's boundaries.
pub struct ObjBitmapTableBuilder<'r> {
    resolver: &'r dyn BitmapResolver,
    bitmap_base: usize,
    pointer_base: usize,
    pub obj_bitmaps: Vec<u16>,
    pub obj_bitmap_pointers: Vec<u16>,
    /// Lowercase texture name -> absolute object-bitmap index.
    mapping: HashMap<String, usize>,
}

impl<'r> ObjBitmapTableBuilder<'r> {
    pub fn new(resolver: &'r dyn BitmapResolver) -> Self {
        Self::with_bases(resolver, 0, 0)
    }

    pub fn with_bases(resolver: &'r dyn BitmapResolver, bitmap_base: usize, pointer_base: usize) -> Self {
        ObjBitmapTableBuilder {
            resolver,
            bitmap_base,
            pointer_base,
            obj_bitmaps: Vec::new(),
            obj_bitmap_pointers: Vec::new(),
            mapping: HashMap::new(),
        }
    }

    /// Make `name` resolve to an object bitmap that lives outside this
    /// builder's tables.
    pub fn seed(&mut self, name: &str, obj_bitmap: usize) {
        self.mapping.insert(name.to_lowercase(), obj_bitmap);
    }

    /// Absolute index of the next pointer entry.
    pub fn next_pointer(&self) -> usize {
        self.pointer_base + self.obj_bitmap_pointers.len()
    }

    /// Every name assigned so far.
    pub fn mapping(&self) -> &HashMap<String, usize> {
        &self.mapping
    }

    /// Absolute object-bitmap index already assigned to `name`.
    pub fn lookup(&self, name: &str) -> Option<usize> {
        self.mapping.get(&name.to_lowercase()).copied()
    }

    fn push_bitmap(&mut self, bitmap: u16) -> usize {
        self.obj_bitmaps.push(bitmap);
        self.bitmap_base + self.obj_bitmaps.len() - 1
    }

    fn push_pointer(&mut self, obj_bitmap: usize) -> Result<(), ErrorKind> {
        self.obj_bitmap_pointers.push(narrow("object bitmap", obj_bitmap)?);
        Ok(())
    }

    /// Object-bitmap index for `name`, creating the entry on first sight.
    fn dedup_bitmap(&mut self, name: &str) -> usize {
        let key = name.to_lowercase();
        if let Some(&index) = self.mapping.get(&key) {
            return index;
        }
        let index = self.push_bitmap(self.resolver.bitmap_id_from_name(name));
        self.mapping.insert(key, index);
        index
    }

    /// Append a bitmap with its own pointer, outside any model's slice.
    pub fn push_standalone(&mut self, bitmap: u16) -> Result<(), ErrorKind> {
        let index = self.push_bitmap(bitmap);
        self.push_pointer(index)
    }

    /// Point `model` at the next pointer entry for `count` textures.
    fn start_slice(&self, model: &mut Polymodel, count: usize) -> Result<(), ErrorKind> {
        model.first_texture = narrow("object bitmap pointer", self.next_pointer())?;
        model.num_textures = narrow("model texture count", count)?;
        Ok(())
    }

    /// Append a model's textures, sharing object bitmaps between equal names.
    pub fn push_model_deduplicated(&mut self, model: &mut Polymodel) -> Result<(), ErrorKind> {
        let count = model.texture_list.len();
        self.start_slice(model, count)?;
        for name in &model.texture_list {
            let index = self.dedup_bitmap(name);
            self.push_pointer(index)?;
        }
        Ok(())
    }

    /// Append a model's textures the way the game's own tables lay them out:
    /// animated textures (names in `eclip_keys`) are shared, every other
    /// texture gets its own object bitmap.
    pub fn push_model_compatible(
        &mut self,
        model: &mut Polymodel,
        eclip_keys: &HashSet<String>,
    ) -> Result<(), ErrorKind> {
        let count = model.texture_list.len();
        self.start_slice(model, count)?;
        for name in &model.texture_list {
            let index = if eclip_keys.contains(&name.to_lowercase()) {
                // placeholder bitmap, replaced by the clip's first frame later
                match self.lookup(name) {
                    Some(index) => index,
                    None => {
                        let index = self.push_bitmap(0);
                        self.mapping.insert(name.to_lowercase(), index);
                        index
                    }
                }
            } else {
                self.push_bitmap(self.resolver.bitmap_id_from_name(name))
            };
            self.push_pointer(index)?;
        }
        Ok(())
    }

    /// Point each EClip at the slot its name was assigned and show the clip's
    /// first frame there. Clips no model uses stop animating any slot.
    pub fn remap_eclips<'a>(
        &mut self,
        eclips: impl IntoIterator<Item = (&'a mut EClip, &'a str)>,
    ) -> Result<(), ErrorKind> {
        for (clip, name) in eclips {
            let Some(slot) = self.lookup(name) else {
                clip.changing_object_texture = -1;
                continue;
            };
            clip.changing_object_texture = narrow("object bitmap", slot)?;
            if let (Some(frame), Some(offset)) = (clip.first_frame(), slot.checked_sub(self.bitmap_base)) {
                if let Some(bitmap) = self.obj_bitmaps.get_mut(offset) {
                    *bitmap = frame;
                }
            }
        }
        Ok(())
    }
}

/// Extra bitmaps appended after a model's own slice in compatibility mode,
/// keyed by model index.
pub type ExtraModelBitmaps<'a> = BTreeMap<usize, &'a [String]>;

/// Player ship models that need special handling in compatibility mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShipModels {
    pub ship: Option<usize>,
    pub dying: Option<usize>,
}

/// Build tables in the editor's layout: every model in index order with
/// shared bitmaps, then the multiplayer ship colors. Returns the pointer
/// index of the first multiplayer bitmap.
pub fn build_deduplicated(
    builder: &mut ObjBitmapTableBuilder<'_>,
    models: &mut [Polymodel],
    multiplayer_bitmaps: &[u16],
) -> Result<usize, ErrorKind> {
    for model in models.iter_mut() {
        builder.push_model_deduplicated(model)?;
    }
    let first_multi = builder.next_pointer();
    for &bitmap in multiplayer_bitmaps {
        builder.push_standalone(bitmap)?;
    }
    Ok(first_multi)
}

/// Build tables in the layout the game's loader produces.
///
/// The multiplayer ship colors go in front of the dying ship's slice (or the
/// ship's own slice when it has no dying model), and the dying ship reuses
/// the living ship's textures. Models in `extra` get additional bitmaps after
/// their own slice. Returns the pointer index of the first multiplayer bitmap.
pub fn build_compatible(
    builder: &mut ObjBitmapTableBuilder<'_>,
    models: &mut [Polymodel],
    ship_models: ShipModels,
    extra: &ExtraModelBitmaps<'_>,
    eclip_keys: &HashSet<String>,
    multiplayer_bitmaps: &[u16],
) -> Result<usize, ErrorKind> {
    let inject_at = ship_models.dying.or(ship_models.ship);
    let shared = match (ship_models.ship, ship_models.dying) {
        (Some(ship), Some(dying)) if ship != dying && ship.max(dying) < models.len() => {
            Some((ship, dying))
        }
        _ => None,
    };
    let mut first_multi = None;

    for index in 0..models.len() {
        if Some(index) == inject_at {
            first_multi = Some(builder.next_pointer());
            for &bitmap in multiplayer_bitmaps {
                builder.push_standalone(bitmap)?;
            }
        }
        if shared.is_some_and(|(_, dying)| dying == index) {
            continue;
        }

        builder.push_model_compatible(&mut models[index], eclip_keys)?;
        if let Some(names) = extra.get(&index) {
            for name in names.iter() {
                let bitmap = builder.resolver.bitmap_id_from_name(name);
                builder.push_standalone(bitmap)?;
            }
        }
    }

    if let Some((ship, dying)) = shared {
        models[dying].first_texture = models[ship].first_texture;
        models[dying].num_textures = models[ship].num_textures;
    }

    if let Some(first) = first_multi {
        return Ok(first);
    }
    warn!("player ship model is missing, appending multiplayer bitmaps at the end");
    let first = builder.next_pointer();
    for &bitmap in multiplayer_bitmaps {
        builder.push_standalone(bitmap)?;
    }
    Ok(first)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::FakePig;

    fn model_with(textures: &[&str]) -> Polymodel {
        let mut model = Polymodel::default();
        model.set_texture_list(textures.iter().map(|s| s.to_string()).collect());
        model
    }

    fn reload(
        models: &[Polymodel],
        obj_bitmaps: &[u16],
        pointers: &[u16],
        eclips: &[(EClip, String)],
        pig: &FakePig,
    ) -> Vec<Vec<String>> {
        let tables = TextureNameTables::build(
            obj_bitmaps.len(),
            |i| obj_bitmaps[i],
            eclips.iter().map(|(c, n)| (c, n.as_str())),
            pig,
        );
        models
            .iter()
            .map(|m| tables.texture_list(m, |i| pointers.get(i).copied()))
            .collect()
    }

    #[test]
    fn deduplicated_tables_round_trip_names() {
        let pig = FakePig::standard();
        let mut models = vec![
            model_with(&["rbot061", "rbot062", "rbot061"]),
            model_with(&["rbot062", "ship1-1"]),
        ];
        let mut builder = ObjBitmapTableBuilder::new(&pig);
        let first_multi = build_deduplicated(&mut builder, &mut models, &[9; 14]).unwrap();

        assert_eq!(builder.obj_bitmaps.len(), 3 + 14);
        assert_eq!(builder.obj_bitmap_pointers[..5], [0, 1, 0, 1, 2]);
        assert_eq!(first_multi, 5);
        assert_eq!((models[1].first_texture, models[1].num_textures), (3, 2));

        let lists = reload(&models, &builder.obj_bitmaps, &builder.obj_bitmap_pointers, &[], &pig);
        assert_eq!(lists[0], ["rbot061", "rbot062", "rbot061"]);
        assert_eq!(lists[1], ["rbot062", "ship1-1"]);
    }

    #[test]
    fn sentinel_bitmap_reads_as_bitmap_zero() {
        let pig = FakePig::standard();
        let obj_bitmaps = [SENTINEL_BITMAP, 2];
        let tables = TextureNameTables::build(2, |i| obj_bitmaps[i], [], &pig);
        assert_eq!(tables.texture_name(0), "bitmap0");
        assert_eq!(tables.texture_name(1), "rbot062");
    }

    #[test]
    fn unresolved_slots_become_placeholders() {
        let pig = FakePig::standard();
        // bitmap 4 is an animated frame, 999 is unknown
        let obj_bitmaps = [4, 999];
        let pointers = [0u16, 1, 7];
        let tables = TextureNameTables::build(2, |i| obj_bitmaps[i], [], &pig);
        let mut model = Polymodel::default();
        model.num_textures = 4;
        let list = tables.texture_list(&model, |i| pointers.get(i).copied());
        assert_eq!(list, [UNRESOLVED_TEXTURE; 4]);
    }

    #[test]
    fn eclip_names_win_over_plain_names() {
        let pig = FakePig::standard();
        let obj_bitmaps = [1u16, 2];
        let clip = EClip {
            changing_object_texture: 1,
            ..Default::default()
        };
        let eclips = [(clip, "Blinky".to_string())];
        let tables = TextureNameTables::build(
            2,
            |i| obj_bitmaps[i],
            eclips.iter().map(|(c, n)| (c, n.as_str())),
            &pig,
        );
        assert_eq!(tables.texture_name(1), "Blinky");
        assert_eq!(tables.obj_bitmap_mapping.get("blinky"), Some(&1));
        assert_eq!(tables.obj_bitmap_mapping.get("rbot061"), Some(&0));
    }

    #[test]
    fn compatible_layout_shares_dying_ship_textures() {
        let pig = FakePig::standard();
        let mut models = vec![
            model_with(&["rbot061"]),
            model_with(&["ship1-1", "ship1-1"]),
            model_with(&["rbot062"]),
            model_with(&["ship1-1"]),
        ];
        models[1].dying_model_num = 3;
        let extra_names = vec!["glow04".to_string(), "rbot046".to_string()];
        let mut extra = ExtraModelBitmaps::new();
        extra.insert(2, extra_names.as_slice());

        let mut builder = ObjBitmapTableBuilder::new(&pig);
        let first_multi = build_compatible(
            &mut builder,
            &mut models,
            ShipModels {
                ship: Some(1),
                dying: Some(3),
            },
            &extra,
            &HashSet::new(),
            &[9; 14],
        )
        .unwrap();

        // plain textures are not shared in this layout
        assert_eq!(builder.obj_bitmaps[1..3], [3, 3]);
        assert_eq!(
            (models[3].first_texture, models[3].num_textures),
            (models[1].first_texture, models[1].num_textures)
        );
        // rbot061, ship x2, rbot062, glow04, rbot046, then the colors
        assert_eq!(first_multi, 6);
        assert_eq!(builder.obj_bitmap_pointers.len(), 6 + 14);
        assert_eq!(builder.obj_bitmaps[4], pig.bitmap_id_from_name("glow04"));
        assert_eq!(models[2].num_textures, 1);
    }

    #[test]
    fn compatible_layout_without_dying_model_keeps_ship_textures() {
        let pig = FakePig::standard();
        let mut models = vec![model_with(&["rbot061"]), model_with(&["ship1-1"])];
        let mut builder = ObjBitmapTableBuilder::new(&pig);
        let first_multi = build_compatible(
            &mut builder,
            &mut models,
            ShipModels {
                ship: Some(1),
                dying: None,
            },
            &ExtraModelBitmaps::new(),
            &HashSet::new(),
            &[9; 14],
        )
        .unwrap();
        assert_eq!(first_multi, 1);
        assert_eq!(models[1].first_texture, 15);
        assert_eq!(builder.obj_bitmaps[15], 3);
    }

    #[test]
    fn eclips_take_their_slot_and_first_frame() {
        let pig = FakePig::standard();
        let mut models = vec![model_with(&["rbot061", "Blinky"])];
        let mut builder = ObjBitmapTableBuilder::new(&pig);
        build_deduplicated(&mut builder, &mut models, &[]).unwrap();

        let mut used = EClip::default();
        used.clip.frames = vec![40, 41];
        let mut unused = EClip {
            changing_object_texture: 12,
            ..Default::default()
        };
        builder
            .remap_eclips([(&mut used, "BLINKY"), (&mut unused, "other")])
            .unwrap();

        assert_eq!(used.changing_object_texture, 1);
        assert_eq!(builder.obj_bitmaps[1], 40);
        assert_eq!(unused.changing_object_texture, -1);
    }

    #[test]
    fn compatible_layout_shares_eclip_slots() {
        let pig = FakePig::standard();
        let mut models = vec![model_with(&["Blinky", "rbot061"]), model_with(&["blinky"])];
        let keys: HashSet<String> = ["blinky".to_string()].into();
        let mut builder = ObjBitmapTableBuilder::new(&pig);
        build_compatible(
            &mut builder,
            &mut models,
            ShipModels::default(),
            &ExtraModelBitmaps::new(),
            &keys,
            &[],
        )
        .unwrap();
        assert_eq!(builder.obj_bitmap_pointers, [0, 1, 0]);
        assert_eq!(builder.obj_bitmaps[0], 0);
    }

    #[test]
    fn seeded_names_point_outside_the_builder() {
        let pig = FakePig::standard();
        let mut builder = ObjBitmapTableBuilder::with_bases(&pig, 422, 502);
        builder.seed("Blinky", 17);
        let mut model = model_with(&["blinky", "rbot061"]);
        builder.push_model_deduplicated(&mut model).unwrap();
        assert_eq!(model.first_texture, 502);
        assert_eq!(builder.obj_bitmap_pointers, [17, 422]);
    }

    #[test]
    fn pointers_past_the_table_width_fail() {
        let pig = FakePig::standard();
        let mut builder = ObjBitmapTableBuilder::with_bases(&pig, 0, 70_000);
        let mut model = model_with(&["rbot061"]);
        assert!(matches!(
            builder.push_model_deduplicated(&mut model),
            Err(ErrorKind::TableOverflow { value: 70_000, .. })
        ));

        let mut builder = ObjBitmapTableBuilder::with_bases(&pig, 70_000, 0);
        assert!(matches!(
            builder.push_standalone(9),
            Err(ErrorKind::TableOverflow { value: 70_000, .. })
        ));
    }
}
