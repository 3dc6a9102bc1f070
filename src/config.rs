use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::CrunchyError;

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub collections: Vec<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: &Utf8Path) -> Result<Vec<String>, CrunchyError> {
        if !path.as_std_path().exists() {
            return Err(CrunchyError::MissingConfig(path.to_owned()));
        }

        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| CrunchyError::ConfigRead(path.to_owned()))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|err| CrunchyError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config, path)
    }

    pub fn resolve_config(config: Config, path: &Utf8Path) -> Result<Vec<String>, CrunchyError> {
        let collections = config
            .collections
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>();

        if collections.is_empty() {
            return Err(CrunchyError::EmptyCollections(path.to_owned()));
        }
        Ok(collections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_config_trims_and_drops_blanks() {
        let config = Config {
            collections: vec![
                " GratefulDead ".to_string(),
                String::new(),
                "PhilLeshAndFriends".to_string(),
            ],
        };

        let collections =
            ConfigLoader::resolve_config(config, Utf8PathBuf::from("config.yaml").as_path())
                .unwrap();
        assert_eq!(collections, vec!["GratefulDead", "PhilLeshAndFriends"]);
    }

    #[test]
    fn resolve_config_rejects_empty_list() {
        let config = Config {
            collections: Vec::new(),
        };
        let err = ConfigLoader::resolve_config(config, Utf8PathBuf::from("config.yaml").as_path())
            .unwrap_err();
        assert!(matches!(err, CrunchyError::EmptyCollections(_)));
    }
}
