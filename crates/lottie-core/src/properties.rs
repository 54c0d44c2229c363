//! Discovery of customizable effect controls and guarded writes into them.
//!
//! Controls live on layers as effect fields whose single value sits at
//! `ef.0.v.k`. The same control is reachable in the raw document and in the
//! live tree of an [`AnimationInstance`](crate::instance::AnimationInstance)
//! through structurally parallel paths, so a descriptor can be re-addressed
//! between the two with [`ParameterDescriptor::in_scope`].

use crate::color;
use crate::path::{self, AddressingPath, ParamTarget, PathStep};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Color,
    Slider,
    Point,
    Checkbox,
    /// Custom "pseudo" effect controls.
    Feature,
}

impl ParamKind {
    pub fn from_match_name(mn: &str) -> Option<Self> {
        match mn {
            "ADBE Color Control" => Some(ParamKind::Color),
            "ADBE Slider Control" => Some(ParamKind::Slider),
            "ADBE Point Control" => Some(ParamKind::Point),
            "ADBE Checkbox Control" => Some(ParamKind::Checkbox),
            _ if mn.starts_with("Pseudo/") => Some(ParamKind::Feature),
            _ => None,
        }
    }
}

/// Which structure descriptor paths point into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    Document,
    LiveTree,
}

impl Scope {
    /// Path of the value slot of effect `field` on layer `layer`.
    pub fn address(self, layer: usize, field: usize) -> AddressingPath {
        match self {
            Scope::Document => AddressingPath::new()
                .key("layers")
                .index(layer)
                .key("ef")
                .index(field)
                .key("ef")
                .index(0)
                .key("v")
                .key("k"),
            Scope::LiveTree => AddressingPath::new()
                .key("renderer")
                .key("elements")
                .index(layer)
                .key("effectsManager")
                .key("effectElements")
                .index(field)
                .key("effectElements")
                .index(0)
                .key("p")
                .key("v"),
        }
    }
}

/// Snapshot of one customizable control.
///
/// Identity is `(layer_index, field_index)`. `value` is captured at discovery
/// and does not follow later writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Lower-cased effect name.
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    pub scope: Scope,
    pub layer_index: usize,
    pub field_index: usize,
    pub path: AddressingPath,
    pub value: Value,
}

impl ParameterDescriptor {
    pub fn in_scope(&self, scope: Scope) -> Self {
        Self {
            scope,
            path: scope.address(self.layer_index, self.field_index),
            ..self.clone()
        }
    }
}

/// Every customizable control in `document`, in layer then field order.
///
/// Layers need a non-empty `nm` and an `ef` array; fields need `nm`, a known
/// `mn` and a value at `ef.0.v.k`. Everything else is skipped.
pub fn discover(document: &Value, scope: Scope) -> Vec<ParameterDescriptor> {
    let Some(layers) = document.get("layers").and_then(Value::as_array) else {
        trace!("document has no layers");
        return Vec::new();
    };

    let value_path = AddressingPath::parse("ef.0.v.k");
    let mut found = Vec::new();

    for (layer_index, layer) in layers.iter().enumerate() {
        let named = layer
            .get("nm")
            .and_then(Value::as_str)
            .is_some_and(|nm| !nm.is_empty());
        let Some(fields) = layer.get("ef").and_then(Value::as_array) else {
            continue;
        };
        if !named {
            trace!(layer_index, "skipping effects on unnamed layer");
            continue;
        }

        for (field_index, field) in fields.iter().enumerate() {
            let Some(name) = field.get("nm").and_then(Value::as_str) else {
                trace!(layer_index, field_index, "effect without a name");
                continue;
            };
            let Some(kind) = field
                .get("mn")
                .and_then(Value::as_str)
                .and_then(ParamKind::from_match_name)
            else {
                continue;
            };
            let Some(value) = path::get(field, &value_path) else {
                trace!(layer_index, field_index, "effect without a value slot");
                continue;
            };

            found.push(ParameterDescriptor {
                name: name.to_lowercase(),
                kind,
                scope,
                layer_index,
                field_index,
                path: scope.address(layer_index, field_index),
                value: value.clone(),
            });
        }
    }

    found
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// The slot writes `value` turns into for `descriptor`. Empty when the value
/// has a shape the control does not accept.
fn coerce(descriptor: &ParameterDescriptor, value: &Value) -> Vec<(AddressingPath, Value)> {
    let at = |v: Value| vec![(descriptor.path.clone(), v)];
    let pair = |x: &Value, y: &Value| {
        vec![
            (descriptor.path.child(PathStep::Index(0)), x.clone()),
            (descriptor.path.child(PathStep::Index(1)), y.clone()),
        ]
    };

    match descriptor.kind {
        ParamKind::Color => match value {
            Value::String(hex) => at(serde_json::json!(color::to_normalized_triple(hex))),
            Value::Array(items) if items.len() >= 3 => at(value.clone()),
            Value::Object(map) => {
                match (
                    number_field(map, "r"),
                    number_field(map, "g"),
                    number_field(map, "b"),
                ) {
                    (Some(r), Some(g), Some(b)) => {
                        let rgb = color::Rgb { r, g, b };
                        at(serde_json::json!(color::rgb_to_normalized(rgb)))
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        },
        ParamKind::Point => match value {
            Value::Array(items) if items.len() == 2 => pair(&items[0], &items[1]),
            Value::Object(map) => match (map.get("x"), map.get("y")) {
                (Some(x), Some(y)) => pair(x, y),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        },
        ParamKind::Slider | ParamKind::Checkbox | ParamKind::Feature => at(value.clone()),
    }
}

/// Apply `value` to every descriptor.
///
/// A descriptor whose slot cannot be reached is logged and skipped; the rest
/// are still written. Nothing is rolled back.
pub fn write<T>(target: &mut T, descriptors: &[ParameterDescriptor], value: &Value)
where
    T: ParamTarget + ?Sized,
{
    for descriptor in descriptors {
        let writes = coerce(descriptor, value);
        if writes.is_empty() {
            trace!(name = %descriptor.name, kind = ?descriptor.kind, "value shape not accepted");
        }
        for (slot, v) in writes {
            if let Err(err) = path::set(target, &slot, v) {
                warn!(name = %descriptor.name, %err, "skipping parameter write");
                break;
            }
        }
    }
}

/// Put each descriptor's discovered value back.
pub fn reset<T>(target: &mut T, descriptors: &[ParameterDescriptor])
where
    T: ParamTarget + ?Sized,
{
    for descriptor in descriptors {
        if let Err(err) = path::set(target, &descriptor.path, descriptor.value.clone()) {
            warn!(name = %descriptor.name, %err, "skipping parameter reset");
        }
    }
}
