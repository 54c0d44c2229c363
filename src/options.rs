use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Customization applied when an icon is created.
///
/// Every field is optional in JSON:
///
/// ```json
/// { "colors": { "primary": "#ff0000" }, "stroke": 2, "speed": 1.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IconOptions {
    /// Control name to `#rrggbb`.
    pub colors: BTreeMap<String, String>,
    pub stroke: Option<f64>,
    pub loop_playback: bool,
    pub autoplay: bool,
    pub speed: f32,
}

impl Default for IconOptions {
    fn default() -> Self {
        Self {
            colors: BTreeMap::new(),
            stroke: None,
            loop_playback: true,
            autoplay: true,
            speed: 1.0,
        }
    }
}

impl IconOptions {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading options from {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing options in {}", path.display()))
    }

    /// Apply command-line style overrides. Playback settings are kept.
    pub fn with_overrides(mut self, colors: BTreeMap<String, String>, stroke: Option<f64>) -> Self {
        self.colors.extend(colors);
        if stroke.is_some() {
            self.stroke = stroke;
        }
        self
    }
}
