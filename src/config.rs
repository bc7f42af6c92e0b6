//! Designer configuration.
//!
//! Loaded from TOML by the host or built from [`DesignerConfig::default`].
//! Every key is optional; missing keys keep their defaults.
//!
//! ```toml
//! form_name = "Intake Form"
//! form_acronym = "IF"
//! id_width = 5
//! animation_ms = 150
//! default_layout = "inline"
//! year_window = 8
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FormError, Result};

/// Label placement applied to new fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldLayout {
    #[default]
    Inline,
    Block,
}

impl FieldLayout {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldLayout::Inline => "inline",
            FieldLayout::Block => "block",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Display name of the form being edited.
    pub form_name: String,
    /// Prefix of every generated element id (`TF-00001`).
    pub form_acronym: String,
    /// Zero-padded width of the numeric part of generated ids.
    pub id_width: usize,
    /// Duration of enter and exit transitions in milliseconds.
    pub animation_ms: u64,
    pub default_layout: FieldLayout,
    /// Number of years listed by the calendar's year picker.
    pub year_window: usize,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            form_name: "Test Form".to_string(),
            form_acronym: "TF".to_string(),
            id_width: 5,
            animation_ms: 150,
            default_layout: FieldLayout::Inline,
            year_window: 8,
        }
    }
}

impl DesignerConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: DesignerConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce unusable ids or pickers.
    pub fn validate(&self) -> Result<()> {
        if self.form_acronym.trim().is_empty() {
            return Err(FormError::Config("form_acronym must not be empty".into()));
        }
        if self.id_width == 0 {
            return Err(FormError::Config("id_width must be at least 1".into()));
        }
        if self.year_window == 0 {
            return Err(FormError::Config("year_window must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_blank_form() {
        let config = DesignerConfig::default();
        assert_eq!(config.form_name, "Test Form");
        assert_eq!(config.form_acronym, "TF");
        assert_eq!(config.id_width, 5);
        assert_eq!(config.animation_ms, 150);
        assert_eq!(config.default_layout, FieldLayout::Inline);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = DesignerConfig::from_toml_str("form_acronym = \"IF\"\ndefault_layout = \"block\"\n")
            .unwrap();
        assert_eq!(config.form_acronym, "IF");
        assert_eq!(config.default_layout, FieldLayout::Block);
        assert_eq!(config.id_width, 5);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = DesignerConfig::from_toml_str("id_width = \"wide\"").unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }

    #[test]
    fn test_empty_acronym_rejected() {
        let err = DesignerConfig::from_toml_str("form_acronym = \"  \"").unwrap_err();
        assert!(matches!(err, FormError::Config(_)));
    }
}
