use crate::smooth::{PsisError, psislw, validate_r_eff};
use ndarray::ArrayViewMut1;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Settings for a smoothing run, stored as TOML.
///
/// ```toml
/// r_eff = 0.85
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PsisOptions {
    /// Relative efficiency `N_eff / N` of the posterior draws.
    pub r_eff: f64,
}

impl Default for PsisOptions {
    fn default() -> Self {
        Self { r_eff: 1.0 }
    }
}

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to read options file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML options: {0}")]
    TomlParseError(#[from] toml::de::Error),
    #[error("Failed to serialize options to TOML: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),
    #[error("Invalid options: {0}")]
    Invalid(#[from] PsisError),
}

impl PsisOptions {
    pub fn from_toml_str(text: &str) -> Result<Self, OptionsError> {
        let options: Self = toml::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, OptionsError> {
        Ok(toml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        validate_r_eff(self.r_eff)?;
        Ok(())
    }

    /// Smooths `weights` in place with these settings. See [`psislw`].
    pub fn smooth(&self, weights: ArrayViewMut1<f64>) -> Result<f64, PsisError> {
        psislw(weights, self.r_eff)
    }
}
