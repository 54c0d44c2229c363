//! Typed addressing into heterogeneous animation data.
//!
//! Grammar: dot-separated steps, purely numeric steps are indices.
//!   "layers.0.ef.2.ef.0.v.k" -> [Key(layers), Index(0), Key(ef), Index(2), ...]
//!
//! A [`ParamTarget`] walks as much of a path as its own structure defines and
//! hands the rest over to the generic JSON walk implemented here.

use crate::errors::PathError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Index(usize),
}

impl PathStep {
    /// The step as an object key. Indices become their decimal form, like
    /// property access on a JS object.
    pub fn as_key(&self) -> String {
        match self {
            PathStep::Key(k) => k.clone(),
            PathStep::Index(i) => i.to_string(),
        }
    }

    pub fn is_key(&self, name: &str) -> bool {
        matches!(self, PathStep::Key(k) if k == name)
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Key(k) => f.write_str(k),
            PathStep::Index(i) => write!(f, "{i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AddressingPath {
    steps: Vec<PathStep>,
}

impl AddressingPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.steps.push(PathStep::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.steps.push(PathStep::Index(index));
        self
    }

    /// A copy of this path extended by one step.
    pub fn child(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    pub fn parse(s: &str) -> Self {
        let steps = s
            .split('.')
            .filter(|seg| !seg.is_empty())
            .map(|seg| match seg.parse::<usize>() {
                Ok(i) => PathStep::Index(i),
                Err(_) => PathStep::Key(seg.to_string()),
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<Vec<PathStep>> for AddressingPath {
    fn from(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }
}

impl fmt::Display for AddressingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for AddressingPath {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AddressingPath::parse(s))
    }
}

impl Serialize for AddressingPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AddressingPath {
    fn deserialize<D>(deserializer: D) -> Result<AddressingPath, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s.is_empty() {
            return Err(de::Error::custom("empty addressing path"));
        }
        Ok(AddressingPath::parse(&s))
    }
}

/// Anything a [`ParameterDescriptor`](crate::properties::ParameterDescriptor) can be written into.
///
/// Implementors resolve the prefix of the path that crosses their own
/// structure and return the JSON slot reached together with the steps that
/// remain. The remaining steps are walked generically.
pub trait ParamTarget {
    fn locate<'s, 'p>(
        &'s self,
        path: &'p AddressingPath,
    ) -> Result<(&'s Value, &'p [PathStep]), PathError>;

    fn locate_mut<'s, 'p>(
        &'s mut self,
        path: &'p AddressingPath,
    ) -> Result<(&'s mut Value, &'p [PathStep]), PathError>;
}

impl ParamTarget for Value {
    fn locate<'s, 'p>(
        &'s self,
        path: &'p AddressingPath,
    ) -> Result<(&'s Value, &'p [PathStep]), PathError> {
        Ok((self, path.steps()))
    }

    fn locate_mut<'s, 'p>(
        &'s mut self,
        path: &'p AddressingPath,
    ) -> Result<(&'s mut Value, &'p [PathStep]), PathError> {
        Ok((self, path.steps()))
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

enum StepFailure {
    NotIndexable(&'static str),
    Missing,
}

fn step_into<'a>(current: &'a Value, step: &PathStep) -> Result<&'a Value, StepFailure> {
    match (current, step) {
        (Value::Object(map), step) => map.get(&step.as_key()).ok_or(StepFailure::Missing),
        (Value::Array(items), PathStep::Index(i)) => items.get(*i).ok_or(StepFailure::Missing),
        (Value::Array(_), PathStep::Key(_)) => Err(StepFailure::Missing),
        (other, _) => Err(StepFailure::NotIndexable(kind_name(other))),
    }
}

fn step_into_mut<'a>(current: &'a mut Value, step: &PathStep) -> Result<&'a mut Value, StepFailure> {
    match (current, step) {
        (Value::Object(map), step) => map.get_mut(&step.as_key()).ok_or(StepFailure::Missing),
        (Value::Array(items), PathStep::Index(i)) => items.get_mut(*i).ok_or(StepFailure::Missing),
        (Value::Array(_), PathStep::Key(_)) => Err(StepFailure::Missing),
        (other, _) => Err(StepFailure::NotIndexable(kind_name(other))),
    }
}

fn step_error(path: &AddressingPath, step: usize, failure: StepFailure) -> PathError {
    match failure {
        StepFailure::NotIndexable(found) => PathError::NotIndexable {
            path: path.to_string(),
            step,
            found,
        },
        StepFailure::Missing => PathError::Missing {
            path: path.to_string(),
            step,
            key: path.steps()[step].as_key(),
        },
    }
}

/// Read the value at `path`, or `None` as soon as a step cannot be taken.
pub fn get<'a, T>(target: &'a T, path: &AddressingPath) -> Option<&'a Value>
where
    T: ParamTarget + ?Sized,
{
    let (mut current, rest) = target.locate(path).ok()?;
    for step in rest {
        current = step_into(current, step).ok()?;
    }
    Some(current)
}

/// Read the value at `path`, falling back to `default` on any failed step.
pub fn get_or<'a, T>(target: &'a T, path: &AddressingPath, default: &'a Value) -> &'a Value
where
    T: ParamTarget + ?Sized,
{
    get(target, path).unwrap_or(default)
}

pub fn has<T>(target: &T, path: &AddressingPath) -> bool
where
    T: ParamTarget + ?Sized,
{
    get(target, path).is_some()
}

/// Assign `value` at `path`.
///
/// The final step may create a new object key or append to an array at
/// exactly its length. Every intermediate step must already exist and be
/// indexable, otherwise the write fails with [`PathError`].
pub fn set<T>(target: &mut T, path: &AddressingPath, value: Value) -> Result<(), PathError>
where
    T: ParamTarget + ?Sized,
{
    let (slot, rest) = target.locate_mut(path)?;
    let offset = path.len() - rest.len();

    let Some((last, parents)) = rest.split_last() else {
        *slot = value;
        return Ok(());
    };

    let mut current = slot;
    for (i, step) in parents.iter().enumerate() {
        current = step_into_mut(current, step).map_err(|f| step_error(path, offset + i, f))?;
    }

    let last_index = path.len() - 1;
    match (current, last) {
        (Value::Object(map), step) => {
            map.insert(step.as_key(), value);
            Ok(())
        }
        (Value::Array(items), PathStep::Index(i)) if *i < items.len() => {
            items[*i] = value;
            Ok(())
        }
        (Value::Array(items), PathStep::Index(i)) if *i == items.len() => {
            items.push(value);
            Ok(())
        }
        (Value::Array(_), _) => Err(step_error(path, last_index, StepFailure::Missing)),
        (other, _) => Err(step_error(
            path,
            last_index,
            StepFailure::NotIndexable(kind_name(other)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_and_display() {
        let p = AddressingPath::parse("layers.0.ef.12.ef.0.v.k");
        assert_eq!(p.len(), 8);
        assert_eq!(p.steps()[1], PathStep::Index(0));
        assert_eq!(p.steps()[3], PathStep::Index(12));
        assert_eq!(p.to_string(), "layers.0.ef.12.ef.0.v.k");
    }

    #[test]
    fn builder_matches_parse() {
        let built = AddressingPath::new().key("layers").index(1).key("ef");
        assert_eq!(built, AddressingPath::parse("layers.1.ef"));
        assert_eq!(built.child(PathStep::Index(0)).to_string(), "layers.1.ef.0");
    }

    #[test]
    fn get_walks_objects_and_arrays() {
        let doc = json!({ "layers": [ { "nm": "a" }, { "nm": "b" } ] });
        assert_eq!(get(&doc, &AddressingPath::parse("layers.1.nm")), Some(&json!("b")));
        assert_eq!(get(&doc, &AddressingPath::parse("layers.2.nm")), None);
        assert!(has(&doc, &AddressingPath::parse("layers.0")));
    }

    #[test]
    fn get_or_returns_default_through_scalars() {
        let doc = json!({ "a": 5 });
        let fallback = json!("fallback");
        let got = get_or(&doc, &AddressingPath::parse("a.b.c"), &fallback);
        assert_eq!(got, &fallback);
    }

    #[test]
    fn index_step_reads_numeric_object_keys() {
        let doc = json!({ "0": "zero" });
        assert_eq!(get(&doc, &AddressingPath::parse("0")), Some(&json!("zero")));
    }

    #[test]
    fn set_replaces_and_creates_last_step() {
        let mut doc = json!({ "a": { "b": [1, 2] } });
        set(&mut doc, &AddressingPath::parse("a.b.1"), json!(20)).unwrap();
        set(&mut doc, &AddressingPath::parse("a.b.2"), json!(30)).unwrap();
        set(&mut doc, &AddressingPath::parse("a.c"), json!("new")).unwrap();
        assert_eq!(doc, json!({ "a": { "b": [1, 20, 30], "c": "new" } }));
    }

    #[test]
    fn set_through_scalar_fails() {
        let mut doc = json!({ "a": 5 });
        let err = set(&mut doc, &AddressingPath::parse("a.b.c"), json!(1)).unwrap_err();
        assert!(matches!(err, PathError::NotIndexable { step: 1, found: "a number", .. }));
        assert_eq!(doc, json!({ "a": 5 }));
    }

    #[test]
    fn set_through_missing_intermediate_fails() {
        let mut doc = json!({ "a": {} });
        let err = set(&mut doc, &AddressingPath::parse("a.b.c"), json!(1)).unwrap_err();
        assert!(matches!(err, PathError::Missing { step: 1, .. }));
    }

    #[test]
    fn set_empty_path_replaces_root() {
        let mut doc = json!({ "a": 1 });
        set(&mut doc, &AddressingPath::new(), json!([1, 2])).unwrap();
        assert_eq!(doc, json!([1, 2]));
    }

    #[test]
    fn serde_as_string() {
        let p = AddressingPath::parse("renderer.elements.3");
        let s = serde_json::to_value(&p).unwrap();
        assert_eq!(s, json!("renderer.elements.3"));
        let back: AddressingPath = serde_json::from_value(s).unwrap();
        assert_eq!(back, p);
    }
}
