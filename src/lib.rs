//! # Lottie Icons
//!
//! `lottie-icons` customizes Lottie icon animations at runtime. It finds the
//! effect controls an icon exposes (colors, stroke width, points, toggles),
//! writes new values into a playing [`AnimationInstance`] and evaluates the
//! expressions that wire those controls to shapes.
//!
//! ```no_run
//! use lottie_icons::{Icon, IconOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut icon = Icon::load("icons/rocket.json")?;
//! icon.set_color("primary", "#ff0000");
//! icon.set_stroke(3.0);
//! let customized = icon.export_document();
//! # Ok(())
//! # }
//! ```

pub mod icon;
pub mod options;

pub use icon::Icon;
pub use options::IconOptions;

pub use lottie_core::{
    color, compile, discover, AnimationInstance, ParamKind, ParameterDescriptor, Scope,
};

use anyhow::Result;

/// Source of animation documents.
pub trait AssetLoader: Send + Sync {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>>;
}

/// Reads documents from the local filesystem.
pub struct DefaultAssetLoader;

impl AssetLoader for DefaultAssetLoader {
    fn load_bytes(&self, path: &str) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }
}
