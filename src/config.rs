//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/surveykit/surveykit.toml`
//! 3. Local config: `<data_dir>/.surveykit.toml`
//! 4. Environment variables: `SURVEYKIT_*` prefix

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{AccessConfig, AccessFilter, OneOrMany, TabulateOptions};
use crate::util::path::expand_path;

/// Export parsing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportConfig {
    /// Field delimiter; auto-detected from the `"id"` header when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

/// Raw tabulate config for intermediate parsing (Option to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawTabulateConfig {
    pub ignore_blanks: Option<bool>,
    pub sort: Option<bool>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_dir: Option<PathBuf>,
    pub pretty: Option<bool>,
    pub export: ExportConfig,
    pub tabulate: RawTabulateConfig,
    pub access: AccessConfig,
}

/// Unified configuration for surveykit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one sub-directory per survey
    pub data_dir: PathBuf,
    /// Pretty-print JSON output
    pub pretty: bool,
    pub export: ExportConfig,
    pub tabulate: TabulateOptions,
    /// Column allow/block rules applied when tabulating
    pub access: AccessConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            pretty: true,
            export: ExportConfig::default(),
            tabulate: TabulateOptions::default(),
            access: AccessConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    ProjectDirs::from("", "", "surveykit")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("surveys"))
}

/// Get the XDG config directory for surveykit.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "surveykit").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("surveykit.toml"))
}

/// Get the path to the local config file in a data directory.
pub fn local_config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".surveykit.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    let mut raw: RawSettings = toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })?;
    raw.access = raw.access.resolve_aliases();
    Ok(raw)
}

/// Merge arrays with union semantics and negation support.
///
/// - Items from overlay are added to base
/// - Items prefixed with `!` remove the corresponding item from the result
/// - Duplicates are de-duplicated
///
/// # Examples
/// ```ignore
/// merge_array(&["a", "b"], &["c"])       // → ["a", "b", "c"]
/// merge_array(&["a", "b"], &["!a", "c"]) // → ["b", "c"]
/// ```
pub fn merge_array(base: &[String], overlay: &[String]) -> Vec<String> {
    let mut result: HashSet<String> = base.iter().cloned().collect();

    for item in overlay {
        if let Some(negated) = item.strip_prefix('!') {
            result.remove(negated);
        } else {
            result.insert(item.clone());
        }
    }

    let mut vec: Vec<String> = result.into_iter().collect();
    vec.sort();
    vec
}

/// Literal lists union, everything else (patterns, single strings) replaces.
fn merge_rules(
    base: &Option<OneOrMany>,
    base_is_pattern: Option<bool>,
    overlay: &Option<OneOrMany>,
    overlay_is_pattern: Option<bool>,
) -> (Option<OneOrMany>, Option<bool>) {
    match (base, overlay) {
        (_, None) => (base.clone(), base_is_pattern),
        (Some(OneOrMany::Many(b)), Some(OneOrMany::Many(o)))
            if base_is_pattern != Some(true) && overlay_is_pattern != Some(true) =>
        {
            (Some(OneOrMany::Many(merge_array(b, o))), overlay_is_pattern)
        }
        (_, Some(o)) => (Some(o.clone()), overlay_is_pattern),
    }
}

impl ExportConfig {
    /// The delimiter as a byte, if configured.
    pub fn delimiter_byte(&self) -> Result<Option<u8>, ApplicationError> {
        match self.delimiter {
            None => Ok(None),
            Some(c) if c.is_ascii() => Ok(Some(c as u8)),
            Some(c) => Err(ApplicationError::Config {
                message: format!("export.delimiter '{}' is not a single-byte character", c),
            }),
        }
    }
}

impl Settings {
    /// Access filter built from the `[access]` table.
    pub fn access_filter(&self) -> AccessFilter {
        AccessFilter::from_config(&self.access)
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_dir = expand_path(&self.data_dir);
    }

    /// Merge overlay config onto self (base) with union semantics for literal lists.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let (allowed, allowed_is_pattern) = merge_rules(
            &self.access.allowed,
            self.access.allowed_is_pattern,
            &overlay.access.allowed,
            overlay.access.allowed_is_pattern,
        );
        let (blocked, blocked_is_pattern) = merge_rules(
            &self.access.blocked,
            self.access.blocked_is_pattern,
            &overlay.access.blocked,
            overlay.access.blocked_is_pattern,
        );
        let mut merged = self.apply_global(overlay);
        merged.access = AccessConfig {
            allowed,
            allowed_is_pattern,
            blocked,
            blocked_is_pattern,
            whitelist: None,
            blacklist: None,
        };
        merged
    }

    /// Apply global config onto defaults with REPLACE semantics.
    fn apply_global(&self, global: &RawSettings) -> Self {
        let access = if global.access.is_empty() {
            self.access.clone()
        } else {
            global.access.clone()
        };
        Self {
            data_dir: global
                .data_dir
                .clone()
                .unwrap_or_else(|| self.data_dir.clone()),
            pretty: global.pretty.unwrap_or(self.pretty),
            export: ExportConfig {
                delimiter: global.export.delimiter.or(self.export.delimiter),
            },
            tabulate: TabulateOptions {
                ignore_blanks: global
                    .tabulate
                    .ignore_blanks
                    .unwrap_or(self.tabulate.ignore_blanks),
                sort: global.tabulate.sort.unwrap_or(self.tabulate.sort),
            },
            access,
        }
    }

    /// Load settings with layered precedence.
    ///
    /// `data_dir` overrides every configured data directory and is where the
    /// local config is looked up.
    ///
    /// # Array Merge Semantics
    /// - Defaults → Global: REPLACE
    /// - Global → Local: literal access lists UNION with negation support
    /// - Any → Env vars: REPLACE
    pub fn load(data_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), data_dir)
    }

    /// Like [`Settings::load`] with an explicit global config path.
    pub fn load_from(
        global_path: Option<&Path>,
        data_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                let raw = load_raw_settings(global_path)?;
                current = current.apply_global(&raw);
            }
        }

        let local_dir = data_dir
            .map(expand_path)
            .unwrap_or_else(|| expand_path(&current.data_dir));
        let local_path = local_config_path(&local_dir);
        if local_path.exists() {
            debug!("load: local config {}", local_path.display());
            let raw = load_raw_settings(&local_path)?;
            current = current.merge_with(&raw);
        }

        current = Self::apply_env_overrides(current)?;

        if let Some(dir) = data_dir {
            current.data_dir = dir.to_path_buf();
        }
        current.expand_paths();
        current.export.delimiter_byte()?;

        Ok(current)
    }

    /// Apply SURVEYKIT_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let builder = Config::builder().add_source(
            Environment::with_prefix("SURVEYKIT")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("access.allowed")
                .with_list_parse_key("access.blocked"),
        );

        let config = builder.build().map_err(config_err)?;

        if let Ok(val) = config.get_string("data_dir") {
            settings.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_bool("pretty") {
            settings.pretty = val;
        }
        if let Ok(val) = config.get_string("export.delimiter") {
            settings.export.delimiter = val.chars().next();
        }
        if let Ok(val) = config.get_bool("tabulate.ignore_blanks") {
            settings.tabulate.ignore_blanks = val;
        }
        if let Ok(val) = config.get_bool("tabulate.sort") {
            settings.tabulate.sort = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("access.allowed") {
            settings.access.allowed = Some(OneOrMany::Many(val));
        }
        if let Ok(val) = config.get::<Vec<String>>("access.blocked") {
            settings.access.blocked = Some(OneOrMany::Many(val));
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# surveykit configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/surveykit/surveykit.toml
#   Local:  <data_dir>/.surveykit.toml
#   Env:    SURVEYKIT_* environment variables (SURVEYKIT_TABULATE__SORT=true)
#
# Literal access lists in the local config UNION with the global ones.
# Use "!NAME" to REMOVE an inherited entry:
#   allowed = ["Q3", "!Q1"]

# Directory with one sub-directory per survey
# data_dir = "~/surveys"

# Pretty-print JSON output
# pretty = true

[export]
# Field delimiter (auto-detected from the "id" header when absent)
# delimiter = ","

[tabulate]
# ignore_blanks = true
# sort = false

[access]
# A list is matched literally, a single string is a pattern
# allowed = ["Q1", "Q2"]
# blocked = "/^_/"
# allowedIsPattern = false
# blockedIsPattern = true
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
