//! Editor-side databases layered over decoded HAM and VHAM files.
//!
//! [`EditorHamFile`] owns a base file's records together with display names
//! and the semantic per-model data (gun layout, animation matrix, texture
//! names) that the on-disk tables only encode indirectly. [`EditorVhamFile`]
//! does the same for an expansion file, resolving absolute ids through
//! [`AugmentedHam`].

/// Trailing `HAMN`/`ORPN` chunks written after the record arrays
pub mod chunks;
/// The base-file editor database
pub mod ham;
/// Display names and their defaults
pub mod names;
/// Save-time configuration
pub mod options;
/// Post-load clamping of cross-references
pub mod validate;
/// The expansion-file editor database
pub mod vham;

pub use ham::EditorHamFile;
pub use names::NameLists;
pub use options::{EditorOptions, ExtraBitmapTarget, ExtraObjBitmaps};
pub use validate::ValidationReport;
pub use vham::{AugmentedHam, Boundaries, EditorVhamFile};

/// Element categories of a HAM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HamType {
    VClip,
    EClip,
    WClip,
    Robot,
    Weapon,
    Sound,
    Model,
    Powerup,
    Reactor,
}
