//! A playing animation and its live tree.
//!
//! The live tree mirrors layers, their effects and the effects' values. Effect
//! values expose their current sample in `p.v`, which is what customization
//! writes into between frames. Addresses follow
//! `renderer.elements.{layer}.effectsManager.effectElements.{effect}.effectElements.{value}.p.v`.

use crate::animatable::Animator;
use crate::errors::{EvalError, LoadError, PathError};
use crate::expressions::{
    CompRef, EffectRef, EffectSelector, ExprValue, ExpressionCache, ExpressionContext,
    TemplateKind,
};
use crate::path::{AddressingPath, ParamTarget, PathStep};
use lottie_data::model::{self as data, LottieJson, Property};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayDirection {
    #[default]
    Forward,
    Reverse,
}

impl PlayDirection {
    fn sign(self) -> f32 {
        match self {
            PlayDirection::Forward => 1.0,
            PlayDirection::Reverse => -1.0,
        }
    }
}

/// An effect value slot: the current sample and the property it comes from.
#[derive(Debug, Clone)]
pub struct AnimatedValue {
    pub v: Value,
    source: Property<Value>,
}

impl AnimatedValue {
    fn new(source: Property<Value>) -> Self {
        let v = Animator::resolve(&source, 0.0, |v: &Value| v.clone(), Value::Null);
        Self { v, source }
    }

    pub fn is_animated(&self) -> bool {
        self.source.is_animated()
    }
}

#[derive(Debug, Clone)]
pub struct EffectProperty {
    pub name: Option<String>,
    pub match_name: Option<String>,
    pub p: AnimatedValue,
}

#[derive(Debug, Clone)]
pub struct EffectElement {
    pub name: Option<String>,
    pub match_name: Option<String>,
    pub enabled: bool,
    pub effect_elements: Vec<EffectProperty>,
}

#[derive(Debug, Clone, Default)]
pub struct EffectsManager {
    pub effect_elements: Vec<EffectElement>,
}

#[derive(Debug, Clone)]
pub struct LayerElement {
    pub name: Option<String>,
    pub start_time: f32,
    pub effects_manager: EffectsManager,
}

#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub elements: Vec<LayerElement>,
}

impl Renderer {
    fn build(model: &LottieJson) -> Self {
        let elements = model
            .layers
            .iter()
            .map(|layer| LayerElement {
                name: layer.nm.clone(),
                start_time: layer.st,
                effects_manager: EffectsManager {
                    effect_elements: layer
                        .ef
                        .iter()
                        .flatten()
                        .map(EffectElement::from_effect)
                        .collect(),
                },
            })
            .collect();
        Self { elements }
    }
}

impl EffectElement {
    fn from_effect(effect: &data::Effect) -> Self {
        Self {
            name: effect.nm.clone(),
            match_name: effect.mn.clone(),
            enabled: effect.en.unwrap_or(1) != 0,
            effect_elements: effect
                .ef
                .iter()
                .flatten()
                .map(|value| EffectProperty {
                    name: value.nm.clone(),
                    match_name: value.mn.clone(),
                    p: AnimatedValue::new(value.v.clone().unwrap_or_default()),
                })
                .collect(),
        }
    }
}

/// A property driven by an expression, found while loading.
#[derive(Debug, Clone)]
pub struct ExpressionBinding {
    /// Document path of the property object.
    pub path: AddressingPath,
    pub source: String,
    /// `st` of the owning layer.
    start_time: f32,
    property: Property<Value>,
}

/// One evaluated expression binding.
#[derive(Debug, Clone, Serialize)]
pub struct ExpressionSample {
    pub path: AddressingPath,
    /// `None` when the expression is not recognized and keyframes were used.
    pub template: Option<TemplateKind>,
    pub value: Value,
}

pub struct AnimationInstance {
    pub name: Option<String>,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f32,
    pub in_point: f32,
    pub out_point: f32,
    pub current_frame: f32,
    pub speed: f32,
    pub direction: PlayDirection,
    pub looping: bool,
    pub paused: bool,
    pub renderer: Renderer,
    bindings: Vec<ExpressionBinding>,
    cache: ExpressionCache,
}

impl AnimationInstance {
    pub fn from_value(document: &Value) -> Result<Self, LoadError> {
        let model: LottieJson = serde_json::from_value(document.clone())?;
        if model.fr == 0.0 {
            return Err(LoadError::ZeroFrameRate);
        }

        let mut bindings = Vec::new();
        if let Some(layers) = document.get("layers").and_then(Value::as_array) {
            for (i, layer) in layers.iter().enumerate() {
                let start_time = layer.get("st").and_then(Value::as_f64).unwrap_or(0.0) as f32;
                let at = AddressingPath::new().key("layers").index(i);
                collect_bindings(layer, &at, start_time, &mut bindings);
            }
        }
        debug!(
            layers = model.layers.len(),
            expressions = bindings.len(),
            "animation instance created"
        );

        Ok(Self {
            name: model.nm.clone(),
            width: model.w,
            height: model.h,
            frame_rate: model.fr,
            in_point: model.ip,
            out_point: model.op,
            current_frame: model.ip,
            speed: 1.0,
            direction: PlayDirection::Forward,
            looping: true,
            paused: false,
            renderer: Renderer::build(&model),
            bindings,
            cache: ExpressionCache::new(),
        })
    }

    pub fn duration_frames(&self) -> f32 {
        self.out_point - self.in_point
    }

    pub fn bindings(&self) -> &[ExpressionBinding] {
        &self.bindings
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn set_direction(&mut self, direction: PlayDirection) {
        self.direction = direction;
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Move playback by `dt` seconds and re-sample animated values.
    pub fn advance(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        let frames = dt * self.frame_rate * self.speed * self.direction.sign();
        let mut frame = self.current_frame + frames;

        let duration = self.duration_frames();
        if duration <= 0.0 {
            frame = self.in_point;
        } else if self.looping {
            if frame >= self.out_point || frame < self.in_point {
                frame = self.in_point + (frame - self.in_point).rem_euclid(duration);
            }
        } else {
            let finished = match self.direction {
                PlayDirection::Forward => frame >= self.out_point,
                PlayDirection::Reverse => frame <= self.in_point,
            };
            frame = frame.clamp(self.in_point, self.out_point);
            if finished {
                self.paused = true;
            }
        }

        self.current_frame = frame;
        self.update_properties();
    }

    pub fn go_to_frame(&mut self, frame: f32) {
        self.current_frame = frame.clamp(self.in_point, self.out_point);
        self.update_properties();
    }

    /// Re-sample keyframed effect values at the current frame.
    ///
    /// Static values are left alone, so writes into them persist. Writes into
    /// keyframed values last until the next sample.
    pub fn update_properties(&mut self) {
        let frame = self.current_frame;
        for element in &mut self.renderer.elements {
            let local = frame - element.start_time;
            for effect in &mut element.effects_manager.effect_elements {
                for prop in &mut effect.effect_elements {
                    if prop.p.is_animated() {
                        let current = prop.p.v.clone();
                        prop.p.v = Animator::resolve(&prop.p.source, local, |v: &Value| v.clone(), current);
                    }
                }
            }
        }
    }

    /// Evaluate every expression binding at the current frame, in the time of
    /// the layer that owns it.
    ///
    /// Unrecognized expressions and failed evaluations fall back to the
    /// property's keyframed value.
    pub fn sample_expressions(&mut self) -> Vec<ExpressionSample> {
        let frame = self.current_frame;
        let mut samples = Vec::with_capacity(self.bindings.len());

        for binding in &self.bindings {
            let local = frame - binding.start_time;
            let base = Animator::resolve(&binding.property, local, |v: &Value| v.clone(), Value::Null);
            let ctx = LiveContext {
                comp_name: self.name.as_deref(),
                renderer: &self.renderer,
                value: &base,
            };

            let (template, value) = match self.cache.get_or_compile(&binding.source) {
                Some(expr) => match expr.evaluate(&ctx) {
                    Ok(v) => (Some(expr.kind()), v.to_json()),
                    Err(err) => {
                        debug!(path = %binding.path, %err, "expression failed, using keyframes");
                        (Some(expr.kind()), base.clone())
                    }
                },
                None => (None, base.clone()),
            };

            samples.push(ExpressionSample {
                path: binding.path.clone(),
                template,
                value,
            });
        }

        samples
    }

    pub fn layer(&self, name: &str) -> Option<&LayerElement> {
        self.renderer
            .elements
            .iter()
            .find(|l| l.name.as_deref() == Some(name))
    }
}

fn collect_bindings(
    value: &Value,
    at: &AddressingPath,
    start_time: f32,
    out: &mut Vec<ExpressionBinding>,
) {
    match value {
        Value::Object(map) => {
            if let (Some(Value::String(source)), true) = (map.get("x"), map.contains_key("k")) {
                match serde_json::from_value::<Property<Value>>(value.clone()) {
                    Ok(property) => out.push(ExpressionBinding {
                        path: at.clone(),
                        source: source.clone(),
                        start_time,
                        property,
                    }),
                    Err(err) => trace!(path = %at, %err, "unreadable expression property"),
                }
                return;
            }
            for (key, child) in map {
                collect_bindings(child, &at.child(PathStep::Key(key.clone())), start_time, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                collect_bindings(child, &at.child(PathStep::Index(i)), start_time, out);
            }
        }
        _ => {}
    }
}

/// Resolves effect references against the live tree.
struct LiveContext<'a> {
    comp_name: Option<&'a str>,
    renderer: &'a Renderer,
    value: &'a Value,
}

impl ExpressionContext for LiveContext<'_> {
    fn value(&self) -> Result<ExprValue, EvalError> {
        ExprValue::from_json(self.value).ok_or(EvalError::MissingMember("value"))
    }

    fn effect_channel(&self, reference: &EffectRef) -> Result<ExprValue, EvalError> {
        if let CompRef::Named(name) = &reference.comp {
            if self.comp_name != Some(name.as_str()) {
                return Err(EvalError::UnknownComposition(name.clone()));
            }
        }

        let layer = self
            .renderer
            .elements
            .iter()
            .find(|l| l.name.as_deref() == Some(reference.layer.as_str()))
            .ok_or_else(|| EvalError::UnknownLayer(reference.layer.clone()))?;

        let effects = &layer.effects_manager.effect_elements;
        let effect = match &reference.effect {
            EffectSelector::Name(n) => effects.iter().find(|e| {
                e.name.as_deref() == Some(n.as_str()) || e.match_name.as_deref() == Some(n.as_str())
            }),
            EffectSelector::Index(i) => i.checked_sub(1).and_then(|i| effects.get(i)),
        }
        .ok_or_else(|| EvalError::UnknownEffect {
            layer: reference.layer.clone(),
            effect: reference.effect.to_string(),
        })?;

        let channel = &reference.channel;
        let prop = effect
            .effect_elements
            .iter()
            .find(|p| {
                p.name.as_deref() == Some(channel.as_str())
                    || p.match_name.as_deref() == Some(channel.as_str())
            })
            .ok_or_else(|| EvalError::UnknownChannel {
                effect: reference.effect.to_string(),
                channel: channel.clone(),
            })?;

        ExprValue::from_json(&prop.p.v).ok_or_else(|| {
            EvalError::TypeMismatch(format!("`{channel}` does not hold a number or vector"))
        })
    }
}

/// Indices of the effect value slot a live-tree path names, and the steps
/// that continue inside it.
fn live_slot(path: &AddressingPath) -> Result<(usize, usize, usize, &[PathStep]), PathError> {
    match path.steps() {
        [renderer, elements, PathStep::Index(layer), manager, effects, PathStep::Index(effect), values, PathStep::Index(value), p, v, rest @ ..]
            if renderer.is_key("renderer")
                && elements.is_key("elements")
                && manager.is_key("effectsManager")
                && effects.is_key("effectElements")
                && values.is_key("effectElements")
                && p.is_key("p")
                && v.is_key("v") =>
        {
            Ok((*layer, *effect, *value, rest))
        }
        _ => Err(PathError::Unaddressable {
            path: path.to_string(),
        }),
    }
}

fn missing(path: &AddressingPath, step: usize) -> PathError {
    PathError::Missing {
        path: path.to_string(),
        step,
        key: path.steps()[step].as_key(),
    }
}

impl ParamTarget for AnimationInstance {
    fn locate<'s, 'p>(
        &'s self,
        path: &'p AddressingPath,
    ) -> Result<(&'s Value, &'p [PathStep]), PathError> {
        let (layer, effect, value, rest) = live_slot(path)?;
        let element = self.renderer.elements.get(layer).ok_or_else(|| missing(path, 2))?;
        let effect = element
            .effects_manager
            .effect_elements
            .get(effect)
            .ok_or_else(|| missing(path, 5))?;
        let prop = effect.effect_elements.get(value).ok_or_else(|| missing(path, 7))?;
        Ok((&prop.p.v, rest))
    }

    fn locate_mut<'s, 'p>(
        &'s mut self,
        path: &'p AddressingPath,
    ) -> Result<(&'s mut Value, &'p [PathStep]), PathError> {
        let (layer, effect, value, rest) = live_slot(path)?;
        let element = self
            .renderer
            .elements
            .get_mut(layer)
            .ok_or_else(|| missing(path, 2))?;
        let effect = element
            .effects_manager
            .effect_elements
            .get_mut(effect)
            .ok_or_else(|| missing(path, 5))?;
        let prop = effect
            .effect_elements
            .get_mut(value)
            .ok_or_else(|| missing(path, 7))?;
        Ok((&mut prop.p.v, rest))
    }
}
