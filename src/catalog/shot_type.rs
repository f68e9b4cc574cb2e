use crate::error::CatalogError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Shot category. Each has its own tempo ratio family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShotType {
    LongGame,
    ShortGame,
    Putting,
}

impl ShotType {
    pub const ALL: [ShotType; 3] = [ShotType::LongGame, ShotType::ShortGame, ShotType::Putting];

    /// Stable lowercase key used in files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            ShotType::LongGame => "long_game",
            ShotType::ShortGame => "short_game",
            ShotType::Putting => "putting",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ShotType::LongGame => "Long Game",
            ShotType::ShortGame => "Short Game",
            ShotType::Putting => "Putting",
        }
    }
}

impl fmt::Display for ShotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ShotType {
    type Err = CatalogError;

    /// Accepts keys and display names, ignoring case and separators.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "longgame" | "long" => Ok(ShotType::LongGame),
            "shortgame" | "short" => Ok(ShotType::ShortGame),
            "putting" | "putt" => Ok(ShotType::Putting),
            _ => Err(CatalogError::UnknownShotType {
                value: value.to_string(),
            }),
        }
    }
}

impl Serialize for ShotType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for ShotType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_keys_and_display_names() {
        assert_eq!("long_game".parse::<ShotType>().unwrap(), ShotType::LongGame);
        assert_eq!("Long Game".parse::<ShotType>().unwrap(), ShotType::LongGame);
        assert_eq!("SHORT-GAME".parse::<ShotType>().unwrap(), ShotType::ShortGame);
        assert_eq!("Putting".parse::<ShotType>().unwrap(), ShotType::Putting);
        assert!("bunker".parse::<ShotType>().is_err());
    }

    #[test]
    fn test_serde_uses_keys() {
        let json = serde_json::to_string(&ShotType::ShortGame).unwrap();
        assert_eq!(json, "\"short_game\"");
        let parsed: ShotType = serde_json::from_str("\"Putting\"").unwrap();
        assert_eq!(parsed, ShotType::Putting);
    }

    #[test]
    fn test_round_trip_all_variants() {
        for shot in ShotType::ALL {
            assert_eq!(shot.key().parse::<ShotType>().unwrap(), shot);
            assert_eq!(shot.display_name().parse::<ShotType>().unwrap(), shot);
        }
    }
}
