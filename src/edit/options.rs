use bon::Builder;

/// Element whose model receives extra object bitmaps in the compatible
/// table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtraBitmapTarget {
    /// The model rendered by weapon `n`.
    Weapon(usize),
    /// Model `n` directly.
    Model(usize),
}

/// Bitmaps appended after a model's own texture slice when the compatible
/// layout is written. They are not part of the model's texture count.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtraObjBitmaps {
    pub target: ExtraBitmapTarget,
    pub bitmaps: Vec<String>,
}

impl ExtraObjBitmaps {
    pub fn new(target: ExtraBitmapTarget, bitmaps: &[&str]) -> Self {
        ExtraObjBitmaps {
            target,
            bitmaps: bitmaps.iter().map(|name| name.to_string()).collect(),
        }
    }

    /// The stock game's table lists two missile debris textures after the
    /// mega missile models.
    pub fn stock() -> Vec<ExtraObjBitmaps> {
        vec![
            ExtraObjBitmaps::new(ExtraBitmapTarget::Weapon(18), &["glow04", "rbot046"]),
            ExtraObjBitmaps::new(ExtraBitmapTarget::Weapon(28), &["glow04", "rbot046"]),
        ]
    }
}

/// Options controlling how an editor database is written back.
#[derive(Debug, Clone, Builder)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EditorOptions {
    /// Append the name and orphaned-model chunks after the records.
    #[builder(default = true)]
    pub export_extra_data: bool,
    /// Lay out object bitmaps the way the game's own tables are built.
    #[builder(default = false)]
    pub compatibility_object_bitmaps: bool,
    #[builder(default = ExtraObjBitmaps::stock())]
    pub extra_object_bitmaps: Vec<ExtraObjBitmaps>,
}

impl Default for EditorOptions {
    fn default() -> Self {
        EditorOptions::builder().build()
    }
}
