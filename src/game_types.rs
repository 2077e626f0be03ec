//! Game concept types shared by the HAM records and the editor model.
//!
//! Fixed-point math types use the game's 16.16 representation; enumerations
//! decode raw record bytes into typed values through [`Recognized`] so that
//! values the game never defined survive untouched until validation.

use std::fmt;

use crate::recognized::Recognized;

// =============================================================================
// Fixed-point Types
// =============================================================================

/// A 16.16 fixed-point number.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Fix(pub i32);

impl Fix {
    pub const ONE: Fix = Fix(65536);

    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 65536.0
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

impl From<i32> for Fix {
    fn from(v: i32) -> Self {
        Fix(v)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixVector {
    pub x: Fix,
    pub y: Fix,
    pub z: Fix,
}

impl FixVector {
    pub fn from_raw(x: i32, y: i32, z: i32) -> Self {
        FixVector {
            x: Fix(x),
            y: Fix(y),
            z: Fix(z),
        }
    }

    /// Unit vector along +X, the direction robots and the player ship fire in.
    pub fn forward() -> Self {
        FixVector::from_raw(Fix::ONE.0, 0, 0)
    }
}

/// Pitch/bank/heading rotation in the game's 16-bit angle units.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixAngles {
    pub p: i16,
    pub b: i16,
    pub h: i16,
}

impl FixAngles {
    pub fn new(p: i16, b: i16, h: i16) -> Self {
        FixAngles { p, b, h }
    }
}

// =============================================================================
// Object Types
// =============================================================================

/// Object type stored in a robot's `contains_type` for robot drops.
pub const OBJ_ROBOT: u8 = 2;
/// Object type stored in a robot's `contains_type` for powerup drops.
pub const OBJ_POWERUP: u8 = 7;

/// What a robot drops when destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Contains {
    Robot(u8),
    Powerup(u8),
}

impl Contains {
    /// Decode the `(contains_type, contains_id)` pair. Unknown object types
    /// keep the raw type byte.
    pub fn from_raw(contains_type: u8, contains_id: u8) -> Recognized<Contains, u8> {
        match contains_type {
            OBJ_ROBOT => Recognized::Known(Contains::Robot(contains_id)),
            OBJ_POWERUP => Recognized::Known(Contains::Powerup(contains_id)),
            other => Recognized::Unknown(other),
        }
    }

    pub fn to_raw(self) -> (u8, u8) {
        match self {
            Contains::Robot(id) => (OBJ_ROBOT, id),
            Contains::Powerup(id) => (OBJ_POWERUP, id),
        }
    }
}

// =============================================================================
// Robot AI
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RobotAiType {
    Still,
    Normal,
    Behind,
    RunFrom,
    Snipe,
    Station,
    Follow,
}

impl RobotAiType {
    pub const ALL: &[RobotAiType] = &[
        Self::Still,
        Self::Normal,
        Self::Behind,
        Self::RunFrom,
        Self::Snipe,
        Self::Station,
        Self::Follow,
    ];

    pub fn from_raw(value: u8) -> Recognized<RobotAiType, u8> {
        match value {
            0x80 => Recognized::Known(Self::Still),
            0x81 => Recognized::Known(Self::Normal),
            0x82 => Recognized::Known(Self::Behind),
            0x83 => Recognized::Known(Self::RunFrom),
            0x84 => Recognized::Known(Self::Snipe),
            0x85 => Recognized::Known(Self::Station),
            0x86 => Recognized::Known(Self::Follow),
            other => Recognized::Unknown(other),
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            Self::Still => 0x80,
            Self::Normal => 0x81,
            Self::Behind => 0x82,
            Self::RunFrom => 0x83,
            Self::Snipe => 0x84,
            Self::Station => 0x85,
            Self::Follow => 0x86,
        }
    }
}

// =============================================================================
// Bosses
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BossType {
    None,
    Descent1Level7,
    Descent1Level27,
    RedFatty,
    WaterBoss,
    FireBoss,
    IceBoss,
    AlienBoss1,
    AlienBoss2,
    VertigoBoss1,
    VertigoBoss2,
}

impl BossType {
    pub fn from_raw(value: i8) -> Recognized<BossType, i8> {
        match value {
            0 => Recognized::Known(Self::None),
            1 => Recognized::Known(Self::Descent1Level7),
            2 => Recognized::Known(Self::Descent1Level27),
            21 => Recognized::Known(Self::RedFatty),
            22 => Recognized::Known(Self::WaterBoss),
            23 => Recognized::Known(Self::FireBoss),
            24 => Recognized::Known(Self::IceBoss),
            25 => Recognized::Known(Self::AlienBoss1),
            26 => Recognized::Known(Self::AlienBoss2),
            27 => Recognized::Known(Self::VertigoBoss1),
            28 => Recognized::Known(Self::VertigoBoss2),
            other => Recognized::Unknown(other),
        }
    }

    pub fn to_raw(self) -> i8 {
        match self {
            Self::None => 0,
            Self::Descent1Level7 => 1,
            Self::Descent1Level27 => 2,
            Self::RedFatty => 21,
            Self::WaterBoss => 22,
            Self::FireBoss => 23,
            Self::IceBoss => 24,
            Self::AlienBoss1 => 25,
            Self::AlienBoss2 => 26,
            Self::VertigoBoss1 => 27,
            Self::VertigoBoss2 => 28,
        }
    }
}
