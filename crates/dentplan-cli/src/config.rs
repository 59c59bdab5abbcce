//! Configuration file management for dentplan.
//!
//! Provides a TOML-based config file at `~/.config/dentplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dentplan_model::config::parse_field_list;
use dentplan_model::{EngineConfig, ImplantField};

use crate::plan_io::PlanFormat;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub wizard: WizardSection,
    #[serde(default)]
    pub export: ExportSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WizardSection {
    /// Implant fields that must be filled in before step 2.
    pub required_implant_fields: Vec<ImplantField>,
    /// Start sessions with the implant validation override set.
    #[serde(default)]
    pub skip_implant_validation: bool,
}

impl Default for WizardSection {
    fn default() -> Self {
        Self {
            required_implant_fields: ImplantField::DEFAULT_REQUIRED.to_vec(),
            skip_implant_validation: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExportSection {
    /// Format used when neither `--format` nor the output extension decide.
    pub format: PlanFormat,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            format: PlanFormat::Toml,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the dentplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/dentplan` or
/// `~/.config/dentplan`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("dentplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dentplan")
}

/// Return the path to the dentplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct DentplanConfig {
    pub engine: EngineConfig,
    pub default_format: PlanFormat,
}

impl DentplanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Required fields: `cli_required_fields` > `DENTPLAN_REQUIRED_IMPLANT_FIELDS` env >
    ///   `wizard.required_implant_fields` > brand + connection system
    /// - Skip override: `--skip-implant-validation` > `DENTPLAN_SKIP_IMPLANT_VALIDATION` env >
    ///   `wizard.skip_implant_validation` > `false`
    /// - Default format: `export.format` > TOML
    pub fn resolve(cli_required_fields: Option<&str>, cli_skip: bool) -> Result<Self> {
        let file_config = match load_config() {
            Ok(cfg) => Some(cfg),
            Err(err) => {
                tracing::debug!("no usable config file: {err:#}");
                None
            }
        };

        let base = match file_config {
            Some(ref cfg) => EngineConfig::new()
                .required_implant_fields(cfg.wizard.required_implant_fields.clone())
                .skip_implant_validation(cfg.wizard.skip_implant_validation),
            None => EngineConfig::new(),
        };
        let mut engine = base.with_env()?;

        if let Some(raw) = cli_required_fields {
            engine.required_implant_fields =
                parse_field_list(raw).context("invalid --required-fields")?;
        }
        if cli_skip {
            engine.skip_implant_validation = true;
        }

        let default_format = file_config
            .as_ref()
            .map(|cfg| cfg.export.format)
            .unwrap_or(PlanFormat::Toml);

        Ok(Self {
            engine,
            default_format,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point config lookup at an empty temp dir and clear engine env vars.
    fn isolated_env(tmp: &tempfile::TempDir) {
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var("DENTPLAN_REQUIRED_IMPLANT_FIELDS") };
        unsafe { std::env::remove_var("DENTPLAN_SKIP_IMPLANT_VALIDATION") };
    }

    fn restore_env() {
        unsafe { std::env::remove_var("XDG_CONFIG_HOME") };
        unsafe { std::env::remove_var("DENTPLAN_REQUIRED_IMPLANT_FIELDS") };
        unsafe { std::env::remove_var("DENTPLAN_SKIP_IMPLANT_VALIDATION") };
    }

    #[test]
    fn default_config_file_roundtrip() {
        let original = ConfigFile::default();
        let contents = toml::to_string_pretty(&original).unwrap();
        assert!(contents.contains("[wizard]"));
        assert!(contents.contains("[export]"));

        let loaded: ConfigFile = toml::from_str(&contents).unwrap();
        assert_eq!(
            loaded.wizard.required_implant_fields,
            ImplantField::DEFAULT_REQUIRED.to_vec()
        );
        assert_eq!(loaded.export.format, PlanFormat::Toml);
    }

    #[test]
    fn partial_config_file_fills_defaults() {
        let loaded: ConfigFile = toml::from_str("[export]\nformat = \"json\"\n").unwrap();
        assert_eq!(loaded.export.format, PlanFormat::Json);
        assert!(!loaded.wizard.skip_implant_validation);
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        isolated_env(&tmp);

        let config = DentplanConfig::resolve(None, false);
        restore_env();

        let config = config.unwrap();
        assert_eq!(config.engine, EngineConfig::new());
        assert_eq!(config.default_format, PlanFormat::Toml);
    }

    #[test]
    fn resolve_reads_config_file() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        isolated_env(&tmp);

        let cfg = ConfigFile {
            wizard: WizardSection {
                required_implant_fields: vec![ImplantField::Platform],
                skip_implant_validation: true,
            },
            export: ExportSection {
                format: PlanFormat::Json,
            },
        };
        save_config(&cfg).unwrap();
        let config = DentplanConfig::resolve(None, false);
        restore_env();

        let config = config.unwrap();
        assert_eq!(
            config.engine.required_implant_fields,
            vec![ImplantField::Platform]
        );
        assert!(config.engine.skip_implant_validation);
        assert_eq!(config.default_format, PlanFormat::Json);
    }

    #[test]
    fn resolve_env_overrides_config_file_and_cli_overrides_env() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        isolated_env(&tmp);

        save_config(&ConfigFile::default()).unwrap();
        unsafe { std::env::set_var("DENTPLAN_REQUIRED_IMPLANT_FIELDS", "platform,abutment_type") };
        let from_env = DentplanConfig::resolve(None, false);
        let from_cli = DentplanConfig::resolve(Some("brand"), true);
        restore_env();

        assert_eq!(
            from_env.unwrap().engine.required_implant_fields,
            vec![ImplantField::Platform, ImplantField::AbutmentType]
        );
        let from_cli = from_cli.unwrap();
        assert_eq!(
            from_cli.engine.required_implant_fields,
            vec![ImplantField::Brand]
        );
        assert!(from_cli.engine.skip_implant_validation);
    }

    #[test]
    fn resolve_env_flag_can_switch_file_override_off() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        isolated_env(&tmp);

        let cfg = ConfigFile {
            wizard: WizardSection {
                required_implant_fields: vec![ImplantField::Platform],
                skip_implant_validation: true,
            },
            export: ExportSection::default(),
        };
        save_config(&cfg).unwrap();
        unsafe { std::env::set_var("DENTPLAN_SKIP_IMPLANT_VALIDATION", "0") };
        let config = DentplanConfig::resolve(None, false);
        restore_env();

        let config = config.unwrap();
        assert!(!config.engine.skip_implant_validation);
        assert_eq!(
            config.engine.required_implant_fields,
            vec![ImplantField::Platform]
        );
    }

    #[test]
    fn resolve_errors_on_bad_env_value() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        isolated_env(&tmp);

        unsafe { std::env::set_var("DENTPLAN_SKIP_IMPLANT_VALIDATION", "sometimes") };
        let result = DentplanConfig::resolve(None, false);
        restore_env();

        let msg = format!("{:#}", result.unwrap_err());
        assert!(
            msg.contains("DENTPLAN_SKIP_IMPLANT_VALIDATION"),
            "unexpected error: {msg}"
        );
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("dentplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
