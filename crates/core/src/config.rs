//! Build configuration.

use crate::productions::DEFAULT_LOCATION;
use serde::{Deserialize, Serialize};

/// Options for [`crate::build_tree`]. Missing fields take their defaults when
/// deserialized, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Production applied at the start of input
    pub start_production: String,
    /// Report input the start production leaves over as an error
    pub must_consume_all: bool,
    /// Location named in positions when the input has no parts
    pub location: String,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            start_production: "Root".to_owned(),
            must_consume_all: true,
            location: DEFAULT_LOCATION.to_owned(),
        }
    }
}

impl BuildConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_start(mut self, production: impl Into<String>) -> Self {
        self.start_production = production.into();
        self
    }

    pub fn allow_unconsumed(mut self) -> Self {
        self.must_consume_all = false;
        self
    }
}
