//! Shot types and the professional tempo catalog.
//!
//! Shot categories are a closed enum inside the crate. Strings only appear at
//! the loading boundary (catalog JSON, CLI arguments, stored preferences) and
//! are mapped through [`ShotType::from_str`].

mod shot_type;

pub use shot_type::ShotType;

use crate::error::CatalogError;
use crate::tempo::{phase_durations, TempoProfile};
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG_JSON: &str = include_str!("../../assets/tempo_catalog.json");

static BUILTIN_CATALOG: Lazy<TempoCatalog> = Lazy::new(|| {
    TempoCatalog::from_json_str(BUILTIN_CATALOG_JSON).unwrap_or_else(|err| {
        warn!("[Catalog] Embedded catalog rejected: {}", err);
        TempoCatalog::default()
    })
});

/// One professional's tempo entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProTempo {
    pub name: String,
    pub bpm: u32,
    pub ratio: f64,
    /// Frame notation as quoted by the tempo literature, e.g. "24/8"
    pub frames: String,
    pub description: String,
    pub learning_notes: String,
}

/// A shot category with its ordered list of professionals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEntry {
    pub shot_type: ShotType,
    pub description: String,
    pub learning_notes: String,
    pub pros: Vec<ProTempo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TempoCatalog {
    shot_types: Vec<ShotEntry>,
}

impl TempoCatalog {
    /// The catalog shipped with the crate.
    pub fn builtin() -> &'static TempoCatalog {
        &BUILTIN_CATALOG
    }

    /// Parses and validates a catalog document.
    ///
    /// Every entry must carry a schedulable tempo and no shot type may be
    /// listed twice.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let catalog: TempoCatalog = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|err| CatalogError::Malformed {
            reason: format!("{}: {}", path.display(), err),
        })?;
        let catalog = Self::from_json_str(&contents)?;
        info!(
            "[Catalog] Loaded {} shot types from {}",
            catalog.shot_types.len(),
            path.display()
        );
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for (index, entry) in self.shot_types.iter().enumerate() {
            if self.shot_types[..index]
                .iter()
                .any(|other| other.shot_type == entry.shot_type)
            {
                return Err(CatalogError::Malformed {
                    reason: format!("duplicate shot type {}", entry.shot_type.key()),
                });
            }
            for pro in &entry.pros {
                phase_durations(pro.bpm as f64, pro.ratio).map_err(|err| {
                    CatalogError::Malformed {
                        reason: format!("{} / {}: {}", entry.shot_type, pro.name, err),
                    }
                })?;
            }
        }
        Ok(())
    }

    pub fn shot_types(&self) -> impl Iterator<Item = &ShotEntry> {
        self.shot_types.iter()
    }

    pub fn shot(&self, shot_type: ShotType) -> Option<&ShotEntry> {
        self.shot_types
            .iter()
            .find(|entry| entry.shot_type == shot_type)
    }

    pub fn pros(&self, shot_type: ShotType) -> &[ProTempo] {
        self.shot(shot_type)
            .map(|entry| entry.pros.as_slice())
            .unwrap_or(&[])
    }

    /// Looks up a professional (case-insensitive) and builds the session
    /// profile for it.
    pub fn profile(&self, shot_type: ShotType, pro: &str) -> Result<TempoProfile, CatalogError> {
        let entry = self
            .pros(shot_type)
            .iter()
            .find(|candidate| candidate.name.eq_ignore_ascii_case(pro.trim()))
            .ok_or_else(|| CatalogError::UnknownPro {
                shot_type: shot_type.display_name().to_string(),
                pro: pro.to_string(),
            })?;

        TempoProfile::new(
            shot_type,
            entry.name.clone(),
            entry.bpm,
            entry.ratio,
            entry.frames.clone(),
            entry.description.clone(),
            entry.learning_notes.clone(),
        )
        .map_err(|err| CatalogError::Malformed {
            reason: err.to_string(),
        })
    }

    /// Resolves string selections such as stored preferences or CLI flags.
    pub fn profile_by_name(&self, shot_type: &str, pro: &str) -> Result<TempoProfile, CatalogError> {
        let shot_type: ShotType = shot_type.parse()?;
        self.profile(shot_type, pro)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_contents() {
        let catalog = TempoCatalog::builtin();
        assert_eq!(catalog.pros(ShotType::LongGame).len(), 9);
        assert_eq!(catalog.pros(ShotType::ShortGame).len(), 5);
        assert_eq!(catalog.pros(ShotType::Putting).len(), 3);

        let first = &catalog.pros(ShotType::LongGame)[0];
        assert_eq!(first.name, "Adam Scott");
        assert_eq!(first.bpm, 73);
    }

    #[test]
    fn test_profile_lookup_is_case_insensitive() {
        let profile = TempoCatalog::builtin()
            .profile(ShotType::LongGame, "tiger woods")
            .unwrap();
        assert_eq!(profile.pro_name(), "Tiger Woods");
        assert_eq!(profile.bpm(), 84);
        assert_eq!(profile.ratio(), 3.0);
        assert_eq!(profile.frame_notation(), "21/7");
    }

    #[test]
    fn test_same_pro_differs_per_shot_type() {
        let catalog = TempoCatalog::builtin();
        let long = catalog.profile(ShotType::LongGame, "Adam Scott").unwrap();
        let short = catalog.profile(ShotType::ShortGame, "Adam Scott").unwrap();
        let putt = catalog.profile(ShotType::Putting, "Adam Scott").unwrap();
        assert_eq!((long.bpm(), long.ratio()), (73, 3.0));
        assert_eq!((short.bpm(), short.ratio()), (87, 2.0));
        assert_eq!((putt.bpm(), putt.frame_notation()), (76, "15/7.5"));
    }

    #[test]
    fn test_unknown_pro() {
        let err = TempoCatalog::builtin()
            .profile(ShotType::Putting, "Rory McIlroy")
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownPro { .. }));
    }

    #[test]
    fn test_profile_by_name_parses_display_names() {
        let profile = TempoCatalog::builtin()
            .profile_by_name("Short Game", "Dickfore Tempo 14/7")
            .unwrap();
        assert_eq!(profile.bpm(), 112);
        assert!(TempoCatalog::builtin()
            .profile_by_name("chipping", "Adam Scott")
            .is_err());
    }

    #[test]
    fn test_rejects_invalid_entries() {
        let json = r#"{"shot_types":[{"shot_type":"putting","description":"","learning_notes":"",
            "pros":[{"name":"Broken","bpm":0,"ratio":2.0,"frames":"","description":"","learning_notes":""}]}]}"#;
        let err = TempoCatalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, CatalogError::Malformed { .. }));
    }

    #[test]
    fn test_rejects_duplicate_shot_types() {
        let json = r#"{"shot_types":[
            {"shot_type":"putting","description":"","learning_notes":"","pros":[]},
            {"shot_type":"Putting","description":"","learning_notes":"","pros":[]}]}"#;
        assert!(TempoCatalog::from_json_str(json).is_err());
    }
}
