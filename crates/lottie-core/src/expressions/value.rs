use crate::errors::EvalError;
use serde::Serialize;
use serde_json::Value;

/// Result of evaluating an expression: a scalar, or a color / point vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExprValue {
    Number(f64),
    Vector(Vec<f64>),
}

impl ExprValue {
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().map(ExprValue::Number),
            Value::Bool(b) => Some(ExprValue::Number(if *b { 1.0 } else { 0.0 })),
            Value::Array(items) => items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<_>>>()
                .map(ExprValue::Vector),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ExprValue::Number(n) => serde_json::json!(n),
            ExprValue::Vector(v) => serde_json::json!(v),
        }
    }

    /// Scalars, and one-element vectors as the authoring tool reads them.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ExprValue::Number(n) => Some(*n),
            ExprValue::Vector(v) if v.len() == 1 => Some(v[0]),
            ExprValue::Vector(_) => None,
        }
    }

    /// `$bm_mul`: scalar * scalar, or a vector scaled component-wise.
    pub fn mul(&self, other: &ExprValue) -> Result<ExprValue, EvalError> {
        match (self.as_scalar(), other.as_scalar()) {
            (Some(a), Some(b)) => Ok(ExprValue::Number(a * b)),
            (None, Some(b)) => Ok(self.map(|x| x * b)),
            (Some(a), None) => Ok(other.map(|x| a * x)),
            (None, None) => Err(EvalError::TypeMismatch(
                "cannot multiply two vectors".to_string(),
            )),
        }
    }

    /// `$bm_div`: a vector divided by zero yields NaN components.
    pub fn div(&self, other: &ExprValue) -> Result<ExprValue, EvalError> {
        let Some(b) = other.as_scalar() else {
            return Err(EvalError::TypeMismatch(
                "divisor must be a scalar".to_string(),
            ));
        };
        match self.as_scalar() {
            Some(a) => Ok(ExprValue::Number(a / b)),
            None if b == 0.0 => Ok(self.map(|_| f64::NAN)),
            None => Ok(self.map(|x| x / b)),
        }
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> ExprValue {
        match self {
            ExprValue::Number(n) => ExprValue::Number(f(*n)),
            ExprValue::Vector(v) => ExprValue::Vector(v.iter().copied().map(f).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_json_shapes() {
        assert_eq!(ExprValue::from_json(&json!(2)), Some(ExprValue::Number(2.0)));
        assert_eq!(ExprValue::from_json(&json!(true)), Some(ExprValue::Number(1.0)));
        assert_eq!(
            ExprValue::from_json(&json!([0.5, 1])),
            Some(ExprValue::Vector(vec![0.5, 1.0]))
        );
        assert_eq!(ExprValue::from_json(&json!("x")), None);
        assert_eq!(ExprValue::from_json(&json!([1, "x"])), None);
    }

    #[test]
    fn vector_scaling() {
        let v = ExprValue::Vector(vec![2.0, 4.0]);
        assert_eq!(
            v.mul(&ExprValue::Number(3.0)).unwrap(),
            ExprValue::Vector(vec![6.0, 12.0])
        );
        assert_eq!(
            ExprValue::Number(3.0).mul(&v).unwrap(),
            ExprValue::Vector(vec![6.0, 12.0])
        );
        assert_eq!(
            v.div(&ExprValue::Number(2.0)).unwrap(),
            ExprValue::Vector(vec![1.0, 2.0])
        );
        assert!(v.mul(&v).is_err());
    }

    #[test]
    fn single_element_vector_is_scalar() {
        let one = ExprValue::Vector(vec![5.0]);
        assert_eq!(one.as_scalar(), Some(5.0));
        assert_eq!(
            one.mul(&ExprValue::Number(2.0)).unwrap(),
            ExprValue::Number(10.0)
        );
    }

    #[test]
    fn vector_div_by_zero_is_nan() {
        let out = ExprValue::Vector(vec![1.0, 2.0])
            .div(&ExprValue::Number(0.0))
            .unwrap();
        let ExprValue::Vector(v) = out else {
            panic!("expected a vector, got {out:?}");
        };
        assert!(v.iter().all(|c| c.is_nan()));
    }
}
