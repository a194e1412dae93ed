use serde::Deserialize;

use crate::error::ReconError;
use crate::view::ViewFilter;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReconConfig {
    pub name: String,
    pub subject: String,
    pub inputs: InputFiles,
    #[serde(default)]
    pub view: ViewConfig,
    /// Treat any `new` filing as a failed run.
    #[serde(default)]
    pub fail_on_new: bool,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// JSON input files, relative to the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct InputFiles {
    pub filings: String,
    pub records: String,
    #[serde(default)]
    pub cross_refs: Option<String>,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "all".into()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { filter: default_filter() }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.subject.trim().is_empty() {
            return Err(ReconError::ConfigValidation("subject must not be empty".into()));
        }

        if self.inputs.filings.trim().is_empty() || self.inputs.records.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "inputs.filings and inputs.records are required".into(),
            ));
        }

        self.view_filter()?;
        Ok(())
    }

    pub fn view_filter(&self) -> Result<ViewFilter, ReconError> {
        self.view
            .filter
            .parse()
            .map_err(|e: String| ReconError::ConfigValidation(format!("view.filter: {e}")))
    }
}
