use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::parser::ParseOptions;

/// Runtime settings: optional `story_parser.toml`, then `STORY_*` variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
    /// Overrides the built-in rich-text block types.
    #[serde(default)]
    pub rich_text_types: Option<Vec<String>>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

fn default_pretty() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            output_dir: default_output_dir(),
            pretty: default_pretty(),
            rich_text_types: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("story_parser").required(false))
            .add_source(
                Environment::with_prefix("STORY")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("rich_text_types"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn parse_options(&self) -> ParseOptions {
        match &self.rich_text_types {
            Some(types) => ParseOptions {
                rich_text_types: types.iter().map(|t| t.trim().to_lowercase()).collect(),
            },
            None => ParseOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_unset() {
        let settings: Settings = Config::builder().build().unwrap().try_deserialize().unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert!(settings.pretty);
        assert_eq!(settings.parse_options(), ParseOptions::default());
    }

    #[test]
    fn rich_text_override() {
        let settings = Settings {
            rich_text_types: Some(vec![" Texto".into(), "legenda".into()]),
            ..Settings::default()
        };
        assert_eq!(settings.parse_options().rich_text_types, vec!["texto", "legenda"]);
    }

    #[test]
    fn values_from_toml_source() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "output_dir = \"stories\"\npretty = false",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("stories"));
        assert!(!settings.pretty);
    }
}
