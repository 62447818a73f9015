//! Run configuration.
//!
//! Every section has working defaults; a JSON file only needs the keys it
//! overrides:
//!
//! ```json
//! { "enumeration": { "userType": "viewer" }, "split": { "seed": 7 } }
//! ```

use crate::bipartite::EnumerationConfig;
use crate::features::FeatureConfig;
use crate::split::SplitConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// All settings for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PipelineConfig {
    pub enumeration: EnumerationConfig,
    pub features: FeatureConfig,
    pub split: SplitConfig,
}

impl PipelineConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::MalformedInput(format!("cannot read config {}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }
}
