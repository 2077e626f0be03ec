use crate::data::ham::HamFile;
use crate::edit::HamType;

/// First base file version whose model table is the retail one. Older
/// (demo) files name their models differently.
const FIRST_RETAIL_VERSION: i32 = 3;

/// Display names, index-aligned with each category's records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NameLists {
    pub vclips: Vec<String>,
    pub eclips: Vec<String>,
    pub robots: Vec<String>,
    pub weapons: Vec<String>,
    pub sounds: Vec<String>,
    pub models: Vec<String>,
    pub powerups: Vec<String>,
    pub reactors: Vec<String>,
}

/// Default display name for element `index` of a category.
///
/// Returns `None` for categories that carry no names.
pub fn default_name(element_type: HamType, index: usize, version: i32) -> Option<String> {
    let name = match element_type {
        HamType::VClip => format!("New VClip #{index}"),
        HamType::EClip => format!("New EClip #{index}"),
        HamType::Robot => format!("New Robot #{index}"),
        HamType::Weapon => format!("New Weapon #{index}"),
        HamType::Sound => format!("New Sound #{index}"),
        HamType::Model if version < FIRST_RETAIL_VERSION => format!("Demo Polymodel #{index}"),
        HamType::Model => format!("New Polymodel #{index}"),
        HamType::Powerup => format!("New Powerup #{index}"),
        HamType::Reactor => format!("New Reactor #{index}"),
        HamType::WClip => return None,
    };
    Some(name)
}

/// Name given to an element created through the editor.
pub(crate) fn added_element_name(element_type: HamType, index: usize) -> Option<String> {
    match element_type {
        HamType::EClip => Some(format!("NewEClip{index}")),
        HamType::Robot => Some(format!("New Robot #{index}")),
        HamType::Weapon => Some(format!("New Weapon #{index}")),
        HamType::Model => Some(format!("New Polymodel #{index}")),
        _ => None,
    }
}

fn defaults_for(element_type: HamType, count: usize, version: i32) -> Vec<String> {
    (0..count)
        .filter_map(|index| default_name(element_type, index, version))
        .collect()
}

impl NameLists {
    /// Generated names for every element of `file`.
    pub fn defaults(file: &HamFile) -> Self {
        let version = file.version;
        NameLists {
            vclips: defaults_for(HamType::VClip, file.vclips.len(), version),
            eclips: defaults_for(HamType::EClip, file.eclips.len(), version),
            robots: defaults_for(HamType::Robot, file.robots.len(), version),
            weapons: defaults_for(HamType::Weapon, file.weapons.len(), version),
            sounds: defaults_for(HamType::Sound, file.sounds.len(), version),
            models: defaults_for(HamType::Model, file.models.len(), version),
            powerups: defaults_for(HamType::Powerup, file.powerups.len(), version),
            reactors: defaults_for(HamType::Reactor, file.reactors.len(), version),
        }
    }

    /// Default reactor names, for name chunks that predate reactor names.
    pub fn default_reactor_names(count: usize) -> Vec<String> {
        defaults_for(HamType::Reactor, count, FIRST_RETAIL_VERSION)
    }

    pub fn list(&self, element_type: HamType) -> Option<&Vec<String>> {
        match element_type {
            HamType::VClip => Some(&self.vclips),
            HamType::EClip => Some(&self.eclips),
            HamType::Robot => Some(&self.robots),
            HamType::Weapon => Some(&self.weapons),
            HamType::Sound => Some(&self.sounds),
            HamType::Model => Some(&self.models),
            HamType::Powerup => Some(&self.powerups),
            HamType::Reactor => Some(&self.reactors),
            HamType::WClip => None,
        }
    }

    pub fn list_mut(&mut self, element_type: HamType) -> Option<&mut Vec<String>> {
        match element_type {
            HamType::VClip => Some(&mut self.vclips),
            HamType::EClip => Some(&mut self.eclips),
            HamType::Robot => Some(&mut self.robots),
            HamType::Weapon => Some(&mut self.weapons),
            HamType::Sound => Some(&mut self.sounds),
            HamType::Model => Some(&mut self.models),
            HamType::Powerup => Some(&mut self.powerups),
            HamType::Reactor => Some(&mut self.reactors),
            HamType::WClip => None,
        }
    }

    pub fn get(&self, element_type: HamType, index: usize) -> Option<&str> {
        self.list(element_type)?.get(index).map(String::as_str)
    }
}
