use crate::options::IconOptions;
use crate::{AssetLoader, DefaultAssetLoader};
use anyhow::{Context, Result};
use lottie_core::instance::ExpressionSample;
use lottie_core::path;
use lottie_core::properties::{self, ParamKind, ParameterDescriptor, Scope};
use lottie_core::AnimationInstance;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, instrument, warn};

/// A loaded icon: its source document, a live instance and the controls it
/// exposes.
pub struct Icon {
    document: Value,
    instance: AnimationInstance,
    /// Addressed into the live tree.
    parameters: Vec<ParameterDescriptor>,
    /// `(layer_index, field_index)` of every control written since load or
    /// the last reset.
    customized: BTreeSet<(usize, usize)>,
}

impl Icon {
    pub fn from_value(document: Value) -> Result<Self> {
        let instance =
            AnimationInstance::from_value(&document).context("building animation instance")?;
        let parameters = properties::discover(&document, Scope::LiveTree);
        debug!(parameters = parameters.len(), "icon ready");
        Ok(Self {
            document,
            instance,
            parameters,
            customized: BTreeSet::new(),
        })
    }

    pub fn from_value_with(document: Value, options: &IconOptions) -> Result<Self> {
        let mut icon = Self::from_value(document)?;
        icon.apply_options(options);
        Ok(icon)
    }

    #[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::load_with(&DefaultAssetLoader, &path.to_string_lossy())
    }

    pub fn load_with(loader: &dyn AssetLoader, path: &str) -> Result<Self> {
        let bytes = loader
            .load_bytes(path)
            .with_context(|| format!("reading animation {path}"))?;
        let document: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing animation {path}"))?;
        Self::from_value(document)
    }

    /// Stroke first, then colors, then playback settings.
    pub fn apply_options(&mut self, options: &IconOptions) {
        if let Some(width) = options.stroke {
            self.set_stroke(width);
        }
        for (name, hex) in &options.colors {
            if self.set_color(name, hex) == 0 {
                warn!(%name, "icon has no color control with this name");
            }
        }
        self.instance.set_loop(options.loop_playback);
        self.instance.set_speed(options.speed);
        if options.autoplay {
            self.instance.play();
        } else {
            self.instance.pause();
        }
    }

    pub fn properties(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn instance(&self) -> &AnimationInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut AnimationInstance {
        &mut self.instance
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Write `value` into every control called `name`. Returns how many
    /// controls were targeted.
    pub fn set_property(&mut self, name: &str, value: &Value) -> usize {
        let name = name.to_lowercase();
        self.write_matching(|d| d.name == name, value)
    }

    pub fn set_color(&mut self, name: &str, hex: &str) -> usize {
        let name = name.to_lowercase();
        let hex = Value::String(hex.to_string());
        self.write_matching(|d| d.name == name && d.kind == ParamKind::Color, &hex)
    }

    pub fn set_stroke(&mut self, width: f64) -> usize {
        self.write_matching(|d| d.name == "stroke", &serde_json::json!(width))
    }

    /// Current hex value of the color control `name`.
    pub fn color(&self, name: &str) -> Option<String> {
        let name = name.to_lowercase();
        let descriptor = self
            .parameters
            .iter()
            .find(|d| d.name == name && d.kind == ParamKind::Color)?;
        let value = path::get(&self.instance, &descriptor.path)?;
        let channels: Vec<f64> = value.as_array()?.iter().filter_map(Value::as_f64).collect();
        match channels.as_slice() {
            [r, g, b, ..] => Some(lottie_core::color::to_hex([*r, *g, *b])),
            _ => None,
        }
    }

    /// Restore every control to the value it was loaded with.
    pub fn reset(&mut self) {
        properties::reset(&mut self.instance, &self.parameters);
        self.customized.clear();
    }

    pub fn advance(&mut self, dt: f32) -> Vec<ExpressionSample> {
        self.instance.advance(dt);
        self.instance.sample_expressions()
    }

    pub fn sample_at(&mut self, frame: f32) -> Vec<ExpressionSample> {
        self.instance.go_to_frame(frame);
        self.instance.sample_expressions()
    }

    /// The source document with every customized control baked in.
    pub fn export_document(&self) -> Value {
        let mut out = self.document.clone();
        for descriptor in &self.parameters {
            if !self.customized.contains(&(descriptor.layer_index, descriptor.field_index)) {
                continue;
            }
            let Some(live) = path::get(&self.instance, &descriptor.path) else {
                continue;
            };
            let target = descriptor.in_scope(Scope::Document);
            if let Err(err) = path::set(&mut out, &target.path, live.clone()) {
                warn!(name = %descriptor.name, %err, "could not export control");
            }
        }
        out
    }

    fn write_matching(&mut self, pred: impl Fn(&ParameterDescriptor) -> bool, value: &Value) -> usize {
        let selected: Vec<ParameterDescriptor> =
            self.parameters.iter().filter(|d| pred(d)).cloned().collect();
        properties::write(&mut self.instance, &selected, value);
        self.customized
            .extend(selected.iter().map(|d| (d.layer_index, d.field_index)));
        selected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct InMemory(&'static str);

    impl AssetLoader for InMemory {
        fn load_bytes(&self, _path: &str) -> Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    const DOC: &str = r#"{
        "nm": "c", "fr": 30, "ip": 0, "op": 30, "w": 10, "h": 10,
        "layers": [ { "nm": "L", "ef": [
            { "nm": "Primary", "mn": "ADBE Color Control", "ef": [ { "nm": "Color", "v": { "a": 0, "k": [0, 0, 0] } } ] },
            { "nm": "Stroke", "mn": "ADBE Slider Control", "ef": [ { "nm": "Slider", "v": { "a": 0, "k": 2 } } ] }
        ] } ]
    }"#;

    #[test]
    fn loads_through_a_loader() {
        let icon = Icon::load_with(&InMemory(DOC), "memory").unwrap();
        assert_eq!(icon.properties().len(), 2);
        assert!(icon.properties().iter().all(|d| d.scope == Scope::LiveTree));
    }

    #[test]
    fn bad_json_has_context() {
        let err = Icon::load_with(&InMemory("{"), "broken.json").err().unwrap();
        assert!(format!("{err:#}").contains("parsing animation broken.json"));
    }

    #[test]
    fn color_names_are_case_insensitive() {
        let mut icon = Icon::load_with(&InMemory(DOC), "memory").unwrap();
        assert_eq!(icon.set_color("PRIMARY", "#336699"), 1);
        assert_eq!(icon.color("primary").as_deref(), Some("#336699"));
        assert_eq!(icon.set_color("missing", "#ffffff"), 0);
    }

    #[test]
    fn export_only_touches_customized_controls() {
        let mut icon = Icon::load_with(&InMemory(DOC), "memory").unwrap();
        icon.set_stroke(5.0);
        let out = icon.export_document();
        assert_eq!(out["layers"][0]["ef"][1]["ef"][0]["v"]["k"], json!(5.0));
        assert_eq!(out["layers"][0]["ef"][0], icon.document()["layers"][0]["ef"][0]);
    }
}
