//! Clamping of cross-references after load.
//!
//! HAM files are routinely patched by hand, so any id field may point past
//! the end of the table it indexes. Every such field is replaced with a safe
//! default instead of failing the load.

use std::ops::Range;

use tracing::{debug, warn};

use crate::data::ham::HamFile;
use crate::game_types::{BossType, Contains, RobotAiType};
use crate::recognized::Recognized;

/// Weapon robots fall back to when their primary weapon is invalid. Like the
/// game's own editor, this is not checked against the weapon count.
pub const FALLBACK_ROBOT_WEAPON: i8 = 10;

/// One field the validator replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClampedField {
    pub record: &'static str,
    pub index: usize,
    pub field: &'static str,
    pub old_value: i64,
}

/// Fields replaced by a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub clamped: Vec<ClampedField>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.clamped.is_empty()
    }

    pub fn len(&self) -> usize {
        self.clamped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clamped.is_empty()
    }

    fn record(&mut self, record: &'static str, index: usize, field: &'static str, old_value: i64) {
        warn!("{record} {index}: {field} {old_value} is out of range, clamping");
        self.clamped.push(ClampedField {
            record,
            index,
            field,
            old_value,
        });
    }

    /// Replace `value` with `fallback` unless it lies in `valid`.
    fn check<T: Copy + Into<i64>>(
        &mut self,
        (record, index): (&'static str, usize),
        field: &'static str,
        value: &mut T,
        valid: Range<i64>,
        fallback: T,
    ) {
        let raw = (*value).into();
        if !valid.contains(&raw) {
            self.record(record, index, field, raw);
            *value = fallback;
        }
    }
}

/// `-1..count`: an optional reference.
fn optional(count: usize) -> Range<i64> {
    -1..count as i64
}

/// `0..count`: a required reference.
fn required(count: usize) -> Range<i64> {
    0..count as i64
}

/// Clamp every cross-reference in `file` to a valid value.
///
/// Never fails. Running it again on its own output changes nothing.
pub fn validate_references(file: &mut HamFile) -> ValidationReport {
    let mut report = ValidationReport::default();

    let textures = file.textures.len();
    let sounds = file.sounds.len();
    let vclips = file.vclips.len();
    let eclips = file.eclips.len();
    let robots = file.robots.len();
    let weapons = file.weapons.len();
    let models = file.models.len();
    let powerups = file.powerups.len();

    for (i, info) in file.tmap_info.iter_mut().enumerate() {
        let at = ("tmap_info", i);
        report.check(at, "eclip_num", &mut info.eclip_num, optional(eclips), -1);
    }

    for (i, clip) in file.vclips.iter_mut().enumerate() {
        report.check(("vclip", i), "sound_num", &mut clip.sound_num, optional(sounds), -1);
    }

    for (i, clip) in file.eclips.iter_mut().enumerate() {
        let at = ("eclip", i);
        report.check(at, "sound_num", &mut clip.sound_num, optional(sounds), -1);
        report.check(at, "explosion_eclip", &mut clip.explosion_eclip, optional(eclips), -1);
        report.check(at, "explosion_vclip", &mut clip.explosion_vclip, optional(vclips), -1);
        report.check(at, "critical_clip", &mut clip.critical_clip, optional(eclips), -1);
    }

    for (i, clip) in file.wclips.iter_mut().enumerate() {
        let at = ("wclip", i);
        report.check(at, "open_sound", &mut clip.open_sound, optional(sounds), -1);
        report.check(at, "close_sound", &mut clip.close_sound, optional(sounds), -1);
        for frame in clip.frames.iter_mut() {
            report.check(at, "frames", frame, required(textures), 0);
        }
    }

    for (i, robot) in file.robots.iter_mut().enumerate() {
        let at = ("robot", i);
        report.check(at, "hit_sound_num", &mut robot.hit_sound_num, optional(sounds), -1);
        report.check(at, "hit_vclip_num", &mut robot.hit_vclip_num, optional(vclips), -1);
        report.check(at, "death_sound_num", &mut robot.death_sound_num, optional(sounds), -1);
        report.check(at, "death_vclip_num", &mut robot.death_vclip_num, optional(vclips), -1);
        report.check(
            at,
            "weapon_type",
            &mut robot.weapon_type,
            required(weapons),
            FALLBACK_ROBOT_WEAPON,
        );
        report.check(
            at,
            "weapon_type_secondary",
            &mut robot.weapon_type_secondary,
            optional(weapons),
            -1,
        );

        match robot.contains() {
            Recognized::Known(Contains::Robot(_)) => {
                report.check(at, "contains_id", &mut robot.contains_id, required(robots), 0);
            }
            Recognized::Known(Contains::Powerup(_)) => {
                report.check(at, "contains_id", &mut robot.contains_id, required(powerups), 0);
            }
            Recognized::Unknown(raw) => {
                // an extra life
                report.record(at.0, at.1, "contains_type", raw.into());
                robot.set_contains(Contains::Powerup(0));
            }
        }

        report.check(at, "see_sound", &mut robot.see_sound, required(sounds), 0);
        report.check(at, "attack_sound", &mut robot.attack_sound, required(sounds), 0);
        report.check(at, "claw_sound", &mut robot.claw_sound, required(sounds), 0);
        report.check(at, "taunt_sound", &mut robot.taunt_sound, required(sounds), 0);
        report.check(at, "death_roll_sound", &mut robot.death_roll_sound, required(sounds), 0);

        // demo data uses 0
        if robot.behavior != 0 && !RobotAiType::from_raw(robot.behavior).is_known() {
            report.record(at.0, at.1, "behavior", robot.behavior.into());
            robot.behavior = RobotAiType::Still.to_raw();
        }
        if let Some(&raw) = BossType::from_raw(robot.boss_flag).unknown() {
            report.record(at.0, at.1, "boss_flag", raw.into());
            robot.boss_flag = BossType::None.to_raw();
        }
    }

    for (i, weapon) in file.weapons.iter_mut().enumerate() {
        let at = ("weapon", i);
        report.check(at, "model_num", &mut weapon.model_num, required(models), 0);
        report.check(at, "model_num_inner", &mut weapon.model_num_inner, optional(models), -1);
        report.check(at, "muzzle_flash_vclip", &mut weapon.muzzle_flash_vclip, optional(vclips), -1);
        report.check(at, "robot_hit_vclip", &mut weapon.robot_hit_vclip, optional(vclips), -1);
        report.check(at, "wall_hit_vclip", &mut weapon.wall_hit_vclip, optional(vclips), -1);
        report.check(at, "weapon_vclip", &mut weapon.weapon_vclip, optional(vclips), -1);
        report.check(at, "firing_sound", &mut weapon.firing_sound, optional(sounds), -1);
        report.check(at, "robot_hit_sound", &mut weapon.robot_hit_sound, optional(sounds), -1);
        report.check(at, "wall_hit_sound", &mut weapon.wall_hit_sound, optional(sounds), -1);
        report.check(at, "children", &mut weapon.children, optional(weapons), -1);
    }

    for (i, powerup) in file.powerups.iter_mut().enumerate() {
        let at = ("powerup", i);
        report.check(at, "vclip_num", &mut powerup.vclip_num, optional(vclips), -1);
        report.check(at, "hit_sound", &mut powerup.hit_sound, optional(sounds), -1);
    }

    debug!("reference validation clamped {} fields", report.len());
    report
}
