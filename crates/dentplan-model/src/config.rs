use std::env;
use std::fmt;

use crate::models::{ImplantField, ImplantFieldParseError};

/// Engine configuration.
///
/// Reads from `DENTPLAN_REQUIRED_IMPLANT_FIELDS` (comma-separated field
/// names) and `DENTPLAN_SKIP_IMPLANT_VALIDATION` (`1`/`true`), falling back
/// to brand + connection system being required and validation enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Implant fields that must be filled in before leaving step 1.
    pub required_implant_fields: Vec<ImplantField>,
    /// Start the wizard with the implant validation override already set.
    pub skip_implant_validation: bool,
}

impl EngineConfig {
    /// Environment variable holding the comma-separated required fields.
    pub const REQUIRED_FIELDS_VAR: &str = "DENTPLAN_REQUIRED_IMPLANT_FIELDS";
    /// Environment variable holding the skip-validation flag.
    pub const SKIP_VALIDATION_VAR: &str = "DENTPLAN_SKIP_IMPLANT_VALIDATION";

    /// Build a config from the environment.
    ///
    /// Priority: env vars, then the built-in defaults.
    pub fn from_env() -> Result<Self, EngineEnvError> {
        Self::new().with_env()
    }

    /// Override the values whose env vars are set, keeping the rest.
    pub fn with_env(mut self) -> Result<Self, EngineEnvError> {
        if let Ok(raw) = env::var(Self::REQUIRED_FIELDS_VAR) {
            self.required_implant_fields = parse_field_list(&raw)
                .map_err(|_| EngineEnvError::new(Self::REQUIRED_FIELDS_VAR, raw.clone()))?;
            tracing::debug!(fields = %raw, "required implant fields taken from env");
        }

        if let Ok(raw) = env::var(Self::SKIP_VALIDATION_VAR) {
            self.skip_implant_validation = parse_flag(&raw)
                .ok_or_else(|| EngineEnvError::new(Self::SKIP_VALIDATION_VAR, raw.clone()))?;
            tracing::debug!(flag = %raw, "skip implant validation taken from env");
        }

        Ok(self)
    }

    /// The built-in defaults, ignoring the environment.
    pub fn new() -> Self {
        Self {
            required_implant_fields: ImplantField::DEFAULT_REQUIRED.to_vec(),
            skip_implant_validation: false,
        }
    }

    /// Replace the required implant fields.
    pub fn required_implant_fields(mut self, fields: Vec<ImplantField>) -> Self {
        self.required_implant_fields = fields;
        self
    }

    /// Set the initial skip-validation override.
    pub fn skip_implant_validation(mut self, skip: bool) -> Self {
        self.skip_implant_validation = skip;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Error returned when an engine env var holds an unusable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEnvError {
    pub var: &'static str,
    pub value: String,
}

impl EngineEnvError {
    fn new(var: &'static str, value: String) -> Self {
        Self { var, value }
    }
}

impl fmt::Display for EngineEnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} env var has an invalid value: {:?}", self.var, self.value)
    }
}

impl std::error::Error for EngineEnvError {}

/// Parse a comma-separated list of implant field names.
///
/// Duplicates are dropped; an empty string yields an empty list.
pub fn parse_field_list(raw: &str) -> Result<Vec<ImplantField>, ImplantFieldParseError> {
    let mut fields = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let field: ImplantField = part.parse()?;
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    Ok(fields)
}

/// Parse a boolean-ish environment value.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_require_brand_and_connection() {
        let cfg = EngineConfig::new();
        assert_eq!(
            cfg.required_implant_fields,
            vec![ImplantField::Brand, ImplantField::ConnectionSystem]
        );
        assert!(!cfg.skip_implant_validation);
    }

    #[test]
    fn field_list_parsing() {
        assert_eq!(
            parse_field_list("brand, platform,brand").unwrap(),
            vec![ImplantField::Brand, ImplantField::Platform]
        );
        assert!(parse_field_list("").unwrap().is_empty());
        assert!(parse_field_list("brand,colour").is_err());
    }

    #[test]
    fn flag_parsing() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn clear_env() {
        unsafe { env::remove_var(EngineConfig::REQUIRED_FIELDS_VAR) };
        unsafe { env::remove_var(EngineConfig::SKIP_VALIDATION_VAR) };
    }

    #[test]
    fn from_env_defaults_when_unset() {
        let _lock = lock_env();
        clear_env();
        assert_eq!(EngineConfig::from_env().unwrap(), EngineConfig::new());
    }

    #[test]
    fn from_env_reads_both_vars() {
        let _lock = lock_env();
        unsafe { env::set_var(EngineConfig::REQUIRED_FIELDS_VAR, "platform, abutment_type") };
        unsafe { env::set_var(EngineConfig::SKIP_VALIDATION_VAR, "yes") };
        let cfg = EngineConfig::from_env();
        clear_env();

        let cfg = cfg.unwrap();
        assert_eq!(
            cfg.required_implant_fields,
            vec![ImplantField::Platform, ImplantField::AbutmentType]
        );
        assert!(cfg.skip_implant_validation);
    }

    #[test]
    fn with_env_keeps_unset_values() {
        let _lock = lock_env();
        clear_env();
        unsafe { env::set_var(EngineConfig::SKIP_VALIDATION_VAR, "1") };
        let cfg = EngineConfig::new()
            .required_implant_fields(vec![ImplantField::Brand])
            .with_env();
        clear_env();

        let cfg = cfg.unwrap();
        assert_eq!(cfg.required_implant_fields, vec![ImplantField::Brand]);
        assert!(cfg.skip_implant_validation);
    }

    #[test]
    fn from_env_rejects_bad_values() {
        let _lock = lock_env();
        clear_env();
        unsafe { env::set_var(EngineConfig::SKIP_VALIDATION_VAR, "sometimes") };
        let err = EngineConfig::from_env().unwrap_err();
        clear_env();

        assert_eq!(err.var, EngineConfig::SKIP_VALIDATION_VAR);
        assert_eq!(err.value, "sometimes");
        assert!(err.to_string().contains("DENTPLAN_SKIP_IMPLANT_VALIDATION"));

        unsafe { env::set_var(EngineConfig::REQUIRED_FIELDS_VAR, "brand,colour") };
        let err = EngineConfig::from_env().unwrap_err();
        clear_env();
        assert_eq!(err.var, EngineConfig::REQUIRED_FIELDS_VAR);
    }

    #[test]
    fn builder_overrides() {
        let cfg = EngineConfig::new()
            .required_implant_fields(vec![ImplantField::Platform])
            .skip_implant_validation(true);
        assert_eq!(cfg.required_implant_fields, vec![ImplantField::Platform]);
        assert!(cfg.skip_implant_validation);
    }
}
