use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrunchyError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Identifier {
    type Err = CrunchyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        // The identifier doubles as an on-disk directory name.
        let is_valid = !normalized.is_empty()
            && normalized != "."
            && normalized != ".."
            && !normalized
                .chars()
                .any(|ch| ch.is_whitespace() || ch == '/' || ch == '\\');
        if !is_valid {
            return Err(CrunchyError::InvalidIdentifier(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CreatorField {
    One(String),
    Many(Vec<String>),
}

impl CreatorField {
    pub fn resolve(&self, fallback: &str) -> CreatorName {
        let raw = match self {
            CreatorField::One(name) => Some(name.as_str()),
            CreatorField::Many(names) => names.first().map(String::as_str),
        };
        match raw {
            Some(name) if !name.trim().is_empty() => CreatorName::sanitize(name),
            _ => CreatorName::sanitize(fallback),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatorName(String);

impl CreatorName {
    pub fn sanitize(raw: &str) -> Self {
        let mut safe = String::with_capacity(raw.len());
        for ch in raw.trim().chars() {
            if ch.is_whitespace() {
                safe.push('_');
            } else if ch.is_alphanumeric() || ch == '_' || ch == '-' {
                safe.push(ch);
            }
        }
        if safe.is_empty() {
            safe.push_str("unknown");
        }
        Self(safe)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CreatorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct AudioFilter {
    suffix: String,
}

impl AudioFilter {
    pub fn new(extension: &str) -> Self {
        let normalized = extension.trim().trim_start_matches('.').to_ascii_lowercase();
        Self {
            suffix: format!(".{normalized}"),
        }
    }

    pub fn matches(&self, file_name: &str) -> bool {
        file_name.to_ascii_lowercase().ends_with(&self.suffix)
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for AudioFilter {
    fn default() -> Self {
        Self::new("mp3")
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_identifier_valid() {
        let id: Identifier = " gd1977-05-08.sbd.hicks.4982 ".parse().unwrap();
        assert_eq!(id.as_str(), "gd1977-05-08.sbd.hicks.4982");
    }

    #[test]
    fn parse_identifier_invalid() {
        assert_matches!("".parse::<Identifier>(), Err(CrunchyError::InvalidIdentifier(_)));
        assert_matches!("a/b".parse::<Identifier>(), Err(CrunchyError::InvalidIdentifier(_)));
        assert_matches!("..".parse::<Identifier>(), Err(CrunchyError::InvalidIdentifier(_)));
        assert_matches!("a b".parse::<Identifier>(), Err(CrunchyError::InvalidIdentifier(_)));
    }

    #[test]
    fn sanitize_replaces_whitespace_and_strips() {
        let name = CreatorName::sanitize("Umphreys McGee");
        assert_eq!(name.as_str(), "Umphreys_McGee");

        let name = CreatorName::sanitize("Billy & the Kids!");
        assert_eq!(name.as_str(), "Billy__the_Kids");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = CreatorName::sanitize("Grateful Dead (SBD)");
        let twice = CreatorName::sanitize(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn sanitize_never_yields_empty() {
        let name = CreatorName::sanitize("!!!");
        assert_eq!(name.as_str(), "unknown");
    }

    #[test]
    fn creator_list_resolves_to_first_element() {
        let field = CreatorField::Many(vec!["Phish".to_string(), "Dead".to_string()]);
        assert_eq!(field.resolve("GratefulDead").as_str(), "Phish");
    }

    #[test]
    fn creator_empty_list_falls_back_to_collection() {
        let field = CreatorField::Many(Vec::new());
        assert_eq!(field.resolve("GratefulDead").as_str(), "GratefulDead");

        let field = CreatorField::One("   ".to_string());
        assert_eq!(field.resolve("GratefulDead").as_str(), "GratefulDead");
    }

    #[test]
    fn audio_filter_matches_case_insensitively() {
        let filter = AudioFilter::default();
        assert!(filter.matches("gd77-05-08d1t01.mp3"));
        assert!(filter.matches("GD77-05-08D1T01.MP3"));
        assert!(!filter.matches("gd77-05-08d1t01.flac"));
        assert!(!filter.matches("notes.txt"));

        let flac = AudioFilter::new(".FLAC");
        assert!(flac.matches("track01.flac"));
    }
}
