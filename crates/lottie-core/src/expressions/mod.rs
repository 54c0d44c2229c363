//! Compiler for the small set of expression idioms found in icon exports.
//!
//! Source text is tokenized, parsed into a statement tree and matched against
//! fixed templates. Anything else is reported as unrecognized and the caller
//! falls back to the keyframed value.

mod ast;
mod error;
mod lexer;
mod parser;
mod templates;
mod value;

pub use error::ParseError;
pub use templates::{CompRef, CompiledExpression, EffectRef, EffectSelector, TemplateKind};
pub use value::ExprValue;

use crate::errors::EvalError;
use std::collections::HashMap;
use tracing::debug;

/// Compile `source`, or `None` when it is not a supported idiom.
pub fn compile(source: &str) -> Option<CompiledExpression> {
    let program = match parser::parse_program(source) {
        Ok(p) => p,
        Err(err) => {
            debug!(%err, "expression did not parse");
            return None;
        }
    };
    let Some(shape) = templates::normalize(&program) else {
        debug!("expression does not reduce to a single result");
        return None;
    };
    let compiled = templates::TEMPLATES
        .iter()
        .find_map(|(_, matcher)| matcher(&shape));
    if compiled.is_none() {
        debug!("expression matches no known template");
    }
    compiled
}

/// Every template accepting `source`, in precedence order.
///
/// More than one entry means two templates overlap.
pub fn matching_templates(source: &str) -> Vec<TemplateKind> {
    let Ok(program) = parser::parse_program(source) else {
        return Vec::new();
    };
    let Some(shape) = templates::normalize(&program) else {
        return Vec::new();
    };
    templates::TEMPLATES
        .iter()
        .filter(|(_, matcher)| matcher(&shape).is_some())
        .map(|(kind, _)| *kind)
        .collect()
}

/// What a compiled expression may ask of the host at evaluation time.
///
/// Implementors only need the members the evaluated template reads.
pub trait ExpressionContext {
    /// The pre-expression value of the property being driven.
    fn value(&self) -> Result<ExprValue, EvalError> {
        Err(EvalError::MissingMember("value"))
    }

    /// Resolve `comp(..)` / `thisComp`, then layer, effect and channel.
    fn effect_channel(&self, reference: &EffectRef) -> Result<ExprValue, EvalError>;

    fn mul(&self, a: &ExprValue, b: &ExprValue) -> Result<ExprValue, EvalError> {
        a.mul(b)
    }

    fn div(&self, a: &ExprValue, b: &ExprValue) -> Result<ExprValue, EvalError> {
        a.div(b)
    }
}

impl CompiledExpression {
    pub fn evaluate(&self, ctx: &dyn ExpressionContext) -> Result<ExprValue, EvalError> {
        match self {
            CompiledExpression::CompColor(r)
            | CompiledExpression::LegacyAxis(r)
            | CompiledExpression::LegacyColor(r) => ctx.effect_channel(r),
            CompiledExpression::ScaledStroke { divisor, reference } => {
                let scaled = ctx.div(&ctx.value()?, &ExprValue::Number(*divisor))?;
                ctx.mul(&scaled, &ctx.effect_channel(reference)?)
            }
            CompiledExpression::MenuSwitch {
                reference,
                threshold,
                when_equal,
                otherwise,
            } => {
                // Loose comparison: a one-element vector compares as its scalar.
                let menu = ctx.effect_channel(reference)?;
                if menu.as_scalar() == Some(*threshold) {
                    Ok(ExprValue::Number(*when_equal))
                } else {
                    Ok(ExprValue::Number(*otherwise))
                }
            }
            CompiledExpression::LegacyScaled { reference, factor } => {
                ctx.mul(&ctx.effect_channel(reference)?, &ExprValue::Number(*factor))
            }
            CompiledExpression::LegacyScale(r) => {
                let v = ctx.effect_channel(r)?.as_scalar().ok_or_else(|| {
                    EvalError::TypeMismatch(format!("`{}` is not a scalar", r.channel))
                })?;
                Ok(ExprValue::Vector(vec![v, v]))
            }
            CompiledExpression::Watermark => Ok(ExprValue::Number(0.0)),
        }
    }
}

/// Compile-on-first-use store keyed by source text. Failures are cached too.
#[derive(Debug, Default)]
pub struct ExpressionCache {
    compiled: HashMap<String, Option<CompiledExpression>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&mut self, source: &str) -> Option<&CompiledExpression> {
        if !self.compiled.contains_key(source) {
            self.compiled.insert(source.to_string(), compile(source));
        }
        self.compiled.get(source).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(ExprValue);

    impl ExpressionContext for Fixed {
        fn effect_channel(&self, _: &EffectRef) -> Result<ExprValue, EvalError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn compiles_comp_color() {
        let c = compile("comp('icon').layer('control').effect('primary')('Color')").unwrap();
        assert_eq!(c.kind(), TemplateKind::CompColor);
        let out = c.evaluate(&Fixed(ExprValue::Vector(vec![1.0, 0.0, 0.0]))).unwrap();
        assert_eq!(out, ExprValue::Vector(vec![1.0, 0.0, 0.0]));
    }

    #[test]
    fn unparsable_source_is_none() {
        assert!(compile("comp('icon'").is_none());
        assert!(compile("").is_none());
        assert!(compile("wiggle(2, 30)").is_none());
    }

    #[test]
    fn scaled_stroke_needs_value() {
        let c = compile("$bm_mul($bm_div(value, 2), comp('c').layer('l').effect('e')('Slider'))")
            .unwrap();
        assert_eq!(
            c.evaluate(&Fixed(ExprValue::Number(3.0))),
            Err(EvalError::MissingMember("value"))
        );
    }

    #[test]
    fn legacy_scale_duplicates_slider() {
        let c = compile("thisComp.layer('ctrl').effect('Scale')('Slider')").unwrap();
        assert_eq!(
            c.evaluate(&Fixed(ExprValue::Number(80.0))).unwrap(),
            ExprValue::Vector(vec![80.0, 80.0])
        );
        assert!(c.evaluate(&Fixed(ExprValue::Vector(vec![1.0, 2.0]))).is_err());
    }

    #[test]
    fn watermark_is_inert() {
        let c = compile("thisComp.layer('02092020').effect('Mark')('Opacity')").unwrap();
        assert_eq!(c.reference(), None);
        assert_eq!(
            c.evaluate(&Fixed(ExprValue::Number(9.0))).unwrap(),
            ExprValue::Number(0.0)
        );
    }

    #[test]
    fn cache_compiles_once_per_source() {
        let mut cache = ExpressionCache::new();
        assert!(cache.get_or_compile("thisComp.layer('a').effect('b')('Color')").is_some());
        assert!(cache.get_or_compile("thisComp.layer('a').effect('b')('Color')").is_some());
        assert!(cache.get_or_compile("time * 2").is_none());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn compiled_expressions_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CompiledExpression>();
    }
}
