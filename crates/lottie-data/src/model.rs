use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LottieJson {
    pub v: Option<String>,
    #[serde(default)]
    pub nm: Option<String>,
    pub ip: f32,
    pub op: f32,
    pub fr: f32,
    pub w: u32,
    pub h: u32,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    #[serde(default)]
    pub ty: u8, // 0..5
    #[serde(default)]
    pub ind: Option<u32>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub ip: f32,
    #[serde(default)]
    pub op: f32,
    #[serde(default)]
    pub st: f32,
    #[serde(default)]
    pub ef: Option<Vec<Effect>>,
}

/// An effect attached to a layer. Expression controls (color, slider, point,
/// checkbox) and pseudo effects all share this shape; `mn` tells them apart.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Effect {
    #[serde(default)]
    pub ty: Option<u8>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub mn: Option<String>,
    #[serde(default)]
    pub ix: Option<u32>,
    #[serde(default)]
    pub en: Option<u8>,
    #[serde(default)]
    pub ef: Option<Vec<EffectValue>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EffectValue {
    #[serde(default)]
    pub ty: Option<u8>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub mn: Option<String>,
    #[serde(default)]
    pub ix: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_effect_value_property")]
    pub v: Option<Property<serde_json::Value>>,
}

fn deserialize_effect_value_property<'de, D>(
    deserializer: D,
) -> Result<Option<Property<serde_json::Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    // Unwrap single-element array
    if let serde_json::Value::Array(arr) = &v {
        if arr.len() == 1 {
            v = arr[0].clone();
        }
    }

    if v.is_object() && v.get("k").is_some() {
        if let Ok(p) = serde_json::from_value::<Property<serde_json::Value>>(v.clone()) {
            return Ok(Some(p));
        }
    }

    // Fallback: Treat as static value
    Ok(Some(Property {
        k: Value::Static(v),
        a: 0,
        ix: None,
        x: None,
    }))
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned", serialize = "T: Serialize"))]
    pub k: Value<T>,
    #[serde(default)]
    pub ix: Option<u32>,
    /// Expression source attached to the property, if any.
    #[serde(default)]
    pub x: Option<String>,
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
            x: None,
        }
    }
}

impl<T> Property<T> {
    pub fn is_animated(&self) -> bool {
        matches!(self.k, Value::Animated(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        if is_keyframe_list(&v) {
            if let Ok(keyframes) = serde_json::from_value::<Vec<Keyframe<T>>>(v.clone()) {
                return Ok(Value::Animated(keyframes));
            }
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

// Serializes back to the raw Lottie shape: `null`, the bare value, or the keyframe list.
impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Default => serializer.serialize_none(),
            Value::Static(v) => v.serialize(serializer),
            Value::Animated(keyframes) => keyframes.serialize(serializer),
        }
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

/// A keyframe list is a non-empty array of objects carrying a `t` field.
/// Checked up front so `Value<serde_json::Value>` does not swallow keyframes as a static value.
fn is_keyframe_list(v: &serde_json::Value) -> bool {
    match v.as_array() {
        Some(items) if !items.is_empty() => items
            .iter()
            .all(|item| item.as_object().is_some_and(|o| o.contains_key("t"))),
        _ => false,
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(bound(deserialize = "T: DeserializeOwned", serialize = "T: Serialize"))]
pub struct Keyframe<T> {
    pub t: f32,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub s: Option<T>,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub e: Option<T>,
    #[serde(default)]
    pub i: Option<Vec2>,
    #[serde(default)]
    pub o: Option<Vec2>,
    #[serde(default)]
    pub to: Option<Vec<f32>>,
    #[serde(default)]
    pub ti: Option<Vec<f32>>,
    #[serde(default)]
    pub h: Option<u8>,
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

/// Easing handles come in as `{ "x": [..], "y": [..] }` or a bare pair.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
pub struct Vec2(pub [f32; 2]);

impl std::ops::Index<usize> for Vec2 {
    type Output = f32;
    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

impl<'de> Deserialize<'de> for Vec2 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;
        let first = |v: &serde_json::Value| -> f32 {
            match v {
                serde_json::Value::Array(items) => {
                    items.first().and_then(|x| x.as_f64()).unwrap_or(0.0) as f32
                }
                other => other.as_f64().unwrap_or(0.0) as f32,
            }
        };
        match &v {
            serde_json::Value::Object(map) => {
                let x = map.get("x").map(first).unwrap_or(0.0);
                let y = map.get("y").map(first).unwrap_or(0.0);
                Ok(Vec2([x, y]))
            }
            serde_json::Value::Array(items) => {
                let x = items.first().and_then(|x| x.as_f64()).unwrap_or(0.0) as f32;
                let y = items.get(1).and_then(|y| y.as_f64()).unwrap_or(0.0) as f32;
                Ok(Vec2([x, y]))
            }
            _ => Err(serde::de::Error::custom("expected easing handle object or pair")),
        }
    }
}
