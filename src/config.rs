//! Generator configuration.
//!
//! Values are layered, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. the project file (`apidoc.toml`, or the file given with `--config`)
//! 3. environment variables (`APIDOC_*`)
//! 4. command-line flags
//!
//! Every resolved value remembers which layer it came from, so `generate`
//! can report where each setting originated.
//!
//! ## Project File
//!
//! ```toml
//! outputDir = "docs/api"
//! linkTemplate = "%c.md"
//! title = "Acme API"
//! singleFile = false
//! ```
//!
//! Keys are accepted in camelCase or snake_case.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use apidoc_core::link::{CLASS_PLACEHOLDER, DEFAULT_LINK_TEMPLATE};

/// Project configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "apidoc.toml";

pub const DEFAULT_OUTPUT_DIR: &str = "docs";
pub const DEFAULT_TITLE: &str = "API Index";
pub const DEFAULT_INDEX_FILE: &str = "README.md";

pub const ENV_OUTPUT_DIR: &str = "APIDOC_OUTPUT_DIR";
pub const ENV_TEMPLATE_DIR: &str = "APIDOC_TEMPLATE_DIR";
pub const ENV_LINK_TEMPLATE: &str = "APIDOC_LINK_TEMPLATE";
pub const ENV_TITLE: &str = "APIDOC_TITLE";
pub const ENV_SINGLE_FILE: &str = "APIDOC_SINGLE_FILE";
pub const ENV_INDEX_FILE: &str = "APIDOC_INDEX_FILE";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// ============================================================================
// Configuration Sources
// ============================================================================

/// Where a configuration value came from. Later variants take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    Default = 0,
    ProjectConfig = 1,
    EnvVar = 2,
    CliFlag = 3,
}

/// A configuration value with its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        ConfigValue { value, source }
    }

    pub fn default_value(value: T) -> Self {
        ConfigValue::new(value, ConfigSource::Default)
    }

    /// Take `value` when present and `source` does not rank below ours.
    fn apply(&mut self, value: Option<T>, source: ConfigSource) {
        if let Some(value) = value {
            if source >= self.source {
                *self = ConfigValue::new(value, source);
            }
        }
    }
}

// ============================================================================
// Project File
// ============================================================================

/// Contents of `apidoc.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default, alias = "output_dir")]
    pub output_dir: Option<PathBuf>,
    #[serde(default, alias = "template_dir")]
    pub template_dir: Option<PathBuf>,
    #[serde(default, alias = "link_template")]
    pub link_template: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "single_file")]
    pub single_file: Option<bool>,
    #[serde(default, alias = "index_file")]
    pub index_file: Option<String>,
}

impl FileConfig {
    /// Load a project file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }

    /// Load an explicitly requested file, or `apidoc.toml` in `dir` if it
    /// exists. A missing default file yields an empty configuration.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> ConfigResult<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((FileConfig::load(path)?, Some(path.to_path_buf())));
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "using project config");
            Ok((FileConfig::load(&candidate)?, Some(candidate)))
        } else {
            Ok((FileConfig::default(), None))
        }
    }
}

// ============================================================================
// CLI Overrides
// ============================================================================

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub output_dir: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
    pub link_template: Option<String>,
    pub title: Option<String>,
    /// `--single-file` / `--multi-file`.
    pub single_file: Option<bool>,
    pub index_file: Option<String>,
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// Final configuration after layering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    pub output_dir: ConfigValue<PathBuf>,
    /// `None` selects the built-in templates.
    pub template_dir: ConfigValue<Option<PathBuf>>,
    pub link_template: ConfigValue<String>,
    pub title: ConfigValue<String>,
    pub single_file: ConfigValue<bool>,
    pub index_file: ConfigValue<String>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ResolvedConfig {
            output_dir: ConfigValue::default_value(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            template_dir: ConfigValue::default_value(None),
            link_template: ConfigValue::default_value(DEFAULT_LINK_TEMPLATE.to_string()),
            title: ConfigValue::default_value(DEFAULT_TITLE.to_string()),
            single_file: ConfigValue::default_value(true),
            index_file: ConfigValue::default_value(DEFAULT_INDEX_FILE.to_string()),
        }
    }
}

impl ResolvedConfig {
    /// Layer the project file, the process environment and CLI overrides
    /// over the defaults.
    pub fn resolve(file: &FileConfig, cli: &CliOverrides) -> ConfigResult<Self> {
        ResolvedConfig::resolve_with_env(file, |key| std::env::var(key).ok(), cli)
    }

    /// Like [`ResolvedConfig::resolve`], reading environment variables
    /// through `env`.
    ///
    /// Empty environment values are treated as unset.
    pub fn resolve_with_env<F>(file: &FileConfig, env: F, cli: &CliOverrides) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ResolvedConfig::default();

        // Project file
        let source = ConfigSource::ProjectConfig;
        config.output_dir.apply(file.output_dir.clone(), source);
        config
            .template_dir
            .apply(file.template_dir.clone().map(Some), source);
        config.link_template.apply(file.link_template.clone(), source);
        config.title.apply(file.title.clone(), source);
        config.single_file.apply(file.single_file, source);
        config.index_file.apply(file.index_file.clone(), source);

        // Environment
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());
        let source = ConfigSource::EnvVar;
        config
            .output_dir
            .apply(lookup(ENV_OUTPUT_DIR).map(PathBuf::from), source);
        config
            .template_dir
            .apply(lookup(ENV_TEMPLATE_DIR).map(|v| Some(PathBuf::from(v))), source);
        config.link_template.apply(lookup(ENV_LINK_TEMPLATE), source);
        config.title.apply(lookup(ENV_TITLE), source);
        let single_file = lookup(ENV_SINGLE_FILE)
            .map(|v| parse_bool(ENV_SINGLE_FILE, &v))
            .transpose()?;
        config.single_file.apply(single_file, source);
        config.index_file.apply(lookup(ENV_INDEX_FILE), source);

        // Command line
        let source = ConfigSource::CliFlag;
        config.output_dir.apply(cli.output_dir.clone(), source);
        config
            .template_dir
            .apply(cli.template_dir.clone().map(Some), source);
        config.link_template.apply(cli.link_template.clone(), source);
        config.title.apply(cli.title.clone(), source);
        config.single_file.apply(cli.single_file, source);
        config.index_file.apply(cli.index_file.clone(), source);

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if !self.link_template.value.contains(CLASS_PLACEHOLDER) {
            return Err(ConfigError::InvalidValue {
                key: "linkTemplate".to_string(),
                value: self.link_template.value.clone(),
                reason: format!("must contain the {} placeholder", CLASS_PLACEHOLDER),
            });
        }
        let index_file = &self.index_file.value;
        if index_file.is_empty()
            || index_file == "."
            || index_file == ".."
            || index_file.contains(['/', '\\'])
        {
            return Err(ConfigError::InvalidValue {
                key: "indexFile".to_string(),
                value: index_file.clone(),
                reason: "must be a plain file name".to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a boolean setting from its textual form.
fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config =
            ResolvedConfig::resolve_with_env(&FileConfig::default(), no_env, &CliOverrides::default())
                .unwrap();
        assert_eq!(config.output_dir.value, PathBuf::from("docs"));
        assert_eq!(config.template_dir.value, None);
        assert_eq!(config.link_template.value, "%c.md");
        assert_eq!(config.title.value, "API Index");
        assert!(config.single_file.value);
        assert_eq!(config.index_file.value, "README.md");
        assert_eq!(config.title.source, ConfigSource::Default);
    }

    #[test]
    fn precedence_cli_over_env_over_file() {
        let file = FileConfig {
            title: Some("From File".to_string()),
            output_dir: Some(PathBuf::from("file-out")),
            single_file: Some(false),
            ..Default::default()
        };
        let env = env_from(&[(ENV_TITLE, "From Env"), (ENV_OUTPUT_DIR, "env-out")]);
        let cli = CliOverrides {
            title: Some("From Cli".to_string()),
            ..Default::default()
        };

        let config = ResolvedConfig::resolve_with_env(&file, env, &cli).unwrap();
        assert_eq!(config.title, ConfigValue::new("From Cli".to_string(), ConfigSource::CliFlag));
        assert_eq!(
            config.output_dir,
            ConfigValue::new(PathBuf::from("env-out"), ConfigSource::EnvVar)
        );
        assert_eq!(config.single_file, ConfigValue::new(false, ConfigSource::ProjectConfig));
        assert_eq!(config.link_template.source, ConfigSource::Default);
    }

    #[test]
    fn empty_env_value_is_ignored() {
        let env = env_from(&[(ENV_TITLE, "")]);
        let config =
            ResolvedConfig::resolve_with_env(&FileConfig::default(), env, &CliOverrides::default())
                .unwrap();
        assert_eq!(config.title.source, ConfigSource::Default);
    }

    #[test]
    fn env_single_file_parsing() {
        let env = env_from(&[(ENV_SINGLE_FILE, "No")]);
        let config =
            ResolvedConfig::resolve_with_env(&FileConfig::default(), env, &CliOverrides::default())
                .unwrap();
        assert!(!config.single_file.value);

        let env = env_from(&[(ENV_SINGLE_FILE, "maybe")]);
        let err =
            ResolvedConfig::resolve_with_env(&FileConfig::default(), env, &CliOverrides::default())
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_SINGLE_FILE));
    }

    #[test]
    fn link_template_requires_placeholder() {
        let cli = CliOverrides {
            link_template: Some("api.md".to_string()),
            ..Default::default()
        };
        let err = ResolvedConfig::resolve_with_env(&FileConfig::default(), no_env, &cli).unwrap_err();
        assert!(err.to_string().contains("%c"));
    }

    #[test]
    fn index_file_must_be_plain_name() {
        let cli = CliOverrides {
            index_file: Some("nested/index.md".to_string()),
            ..Default::default()
        };
        assert!(ResolvedConfig::resolve_with_env(&FileConfig::default(), no_env, &cli).is_err());
    }

    #[test]
    fn index_file_rejects_dot_names() {
        for name in [".", ".."] {
            let cli = CliOverrides {
                index_file: Some(name.to_string()),
                ..Default::default()
            };
            let err = ResolvedConfig::resolve_with_env(&FileConfig::default(), no_env, &cli)
                .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "indexFile"),
                "{name} accepted"
            );
        }
    }

    #[test]
    fn index_file_from_env_loses_to_cli() {
        let file = FileConfig {
            index_file: Some("file.md".to_string()),
            ..Default::default()
        };
        let config = ResolvedConfig::resolve_with_env(
            &file,
            env_from(&[(ENV_INDEX_FILE, "env.md")]),
            &CliOverrides::default(),
        )
        .unwrap();
        assert_eq!(config.index_file, ConfigValue::new("env.md".to_string(), ConfigSource::EnvVar));

        let cli = CliOverrides {
            index_file: Some("cli.md".to_string()),
            ..Default::default()
        };
        let config =
            ResolvedConfig::resolve_with_env(&file, env_from(&[(ENV_INDEX_FILE, "env.md")]), &cli)
                .unwrap();
        assert_eq!(config.index_file.value, "cli.md");
    }

    #[test]
    fn file_config_accepts_both_key_styles() {
        let camel: FileConfig =
            toml::from_str("outputDir = \"out\"\nsingleFile = false\nlinkTemplate = \"%c.html\"")
                .unwrap();
        let snake: FileConfig =
            toml::from_str("output_dir = \"out\"\nsingle_file = false\nlink_template = \"%c.html\"")
                .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn file_config_rejects_unknown_keys() {
        assert!(toml::from_str::<FileConfig>("outputDirectory = \"x\"").is_err());
    }

    #[test]
    fn discover_reads_default_file_when_present() {
        let dir = TempDir::new().unwrap();
        let (config, path) = FileConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config, FileConfig::default());
        assert!(path.is_none());

        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "title = \"Acme\"\n").unwrap();
        let (config, path) = FileConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.title.as_deref(), Some("Acme"));
        assert_eq!(path, Some(dir.path().join(DEFAULT_CONFIG_FILE)));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = FileConfig::discover(Some(&missing), dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apidoc.toml");
        fs::write(&path, "title = ").unwrap();
        assert!(matches!(FileConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
