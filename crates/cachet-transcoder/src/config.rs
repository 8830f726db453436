//! Transcoder configuration
//!
//! Configuration is layered: defaults, then an optional TOML file, then
//! `CACHET_*` environment variables. [`TranscoderConfig::validate`] runs
//! before a transcoder is built from it.
//!
//! ```toml
//! name = "sessions"
//! codec = "json"
//!
//! [json]
//! escape = "strict"
//! ```

use crate::codec::{CodecKind, JsonOptions};
use crate::error::{Result, TranscodeError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`TranscoderConfig::name`]
pub const ENV_NAME: &str = "CACHET_NAME";
/// Environment variable overriding [`TranscoderConfig::codec`]
pub const ENV_CODEC: &str = "CACHET_CODEC";
/// Environment variable overriding the JSON escape policy
pub const ENV_JSON_ESCAPE: &str = "CACHET_JSON_ESCAPE";

/// Settings for a single named transcoder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranscoderConfig {
    /// Name the cache uses to select this transcoder
    pub name: String,
    /// Structural codec
    pub codec: CodecKind,
    /// JSON codec options, ignored by other codecs
    pub json: JsonOptions,
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            name: crate::EnvelopeTranscoder::DEFAULT_NAME.to_string(),
            codec: CodecKind::default(),
            json: JsonOptions::default(),
        }
    }
}

impl TranscoderConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            TranscodeError::config(format!("Failed to read {}: {err}", path.display()))
        })?;
        let config = Self::from_toml_str(&contents)?;
        tracing::debug!(path = %path.display(), name = %config.name, "Loaded transcoder configuration");
        Ok(config)
    }

    /// Render configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|err| TranscodeError::config(err.to_string()))
    }

    /// Apply overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.apply_env(std::env::vars())
    }

    /// Apply overrides from `(key, value)` pairs; unrelated keys are ignored
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                ENV_NAME => self.name = value.to_string(),
                ENV_CODEC => {
                    self.codec = value
                        .parse()
                        .map_err(|err| TranscodeError::config(format!("{ENV_CODEC}: {err}")))?;
                }
                ENV_JSON_ESCAPE => {
                    self.json.escape = value.parse().map_err(|err| {
                        TranscodeError::config(format!("{ENV_JSON_ESCAPE}: {err}"))
                    })?;
                }
                _ => continue,
            }
            tracing::debug!(key, "Applied transcoder configuration override");
        }
        Ok(())
    }

    /// Check the configuration for values no transcoder can use
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(TranscodeError::config("Transcoder name cannot be empty"));
        }
        if self.name.chars().any(char::is_control) {
            return Err(TranscodeError::config(
                "Transcoder name cannot contain control characters",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::EscapePolicy;

    #[test]
    fn test_defaults() {
        let config = TranscoderConfig::default();
        assert_eq!(config.name, "default");
        assert_eq!(config.codec, CodecKind::Json);
        assert_eq!(config.json.escape, EscapePolicy::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = TranscoderConfig::from_toml_str("codec = \"cbor\"").unwrap();
        assert_eq!(config.codec, CodecKind::Cbor);
        assert_eq!(config.name, "default");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = TranscoderConfig::from_toml_str("compression = true").unwrap_err();
        assert!(matches!(err, TranscodeError::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TranscoderConfig::default();
        config
            .apply_env([
                ("CACHET_NAME", "profiles"),
                ("CACHET_JSON_ESCAPE", "relaxed"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(config.name, "profiles");
        assert_eq!(config.json.escape, EscapePolicy::Relaxed);

        let err = config.apply_env([("CACHET_CODEC", "bson")]).unwrap_err();
        assert!(err.to_string().contains("CACHET_CODEC"));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let config = TranscoderConfig {
            name: "  ".to_string(),
            ..TranscoderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = TranscoderConfig {
            name: "sessions".to_string(),
            codec: CodecKind::Cbor,
            json: JsonOptions {
                escape: EscapePolicy::Relaxed,
            },
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(TranscoderConfig::from_toml_str(&text).unwrap(), config);
    }
}
