//! Fixed expression templates, matched on the shape of the parsed program.
//!
//! A program is first reduced to its result: either one value expression or a
//! two-way branch assigning `$bm_rt`. Each template then inspects that result
//! as a whole. Matching a sub-expression is never enough.

use crate::expressions::ast::{BinaryOp, Expr, Stmt};
use serde::Serialize;
use std::fmt;

const RESULT_VAR: &str = "$bm_rt";
const WATERMARK_LAYER: &str = "02092020";

/// Root of an effect lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum CompRef {
    /// `comp('name')`
    Named(String),
    /// `thisComp`
    This,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum EffectSelector {
    Name(String),
    /// 1-based, as authored.
    Index(usize),
}

impl fmt::Display for EffectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectSelector::Name(n) => f.write_str(n),
            EffectSelector::Index(i) => write!(f, "#{i}"),
        }
    }
}

/// `<comp>.layer('L').effect(E)('channel')`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EffectRef {
    pub comp: CompRef,
    pub layer: String,
    pub effect: EffectSelector,
    pub channel: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    CompColor,
    ScaledStroke,
    MenuSwitch,
    LegacyScaled,
    LegacyScale,
    LegacyAxis,
    LegacyColor,
    Watermark,
}

impl TemplateKind {
    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::CompColor => "comp_color",
            TemplateKind::ScaledStroke => "scaled_stroke",
            TemplateKind::MenuSwitch => "menu_switch",
            TemplateKind::LegacyScaled => "legacy_scaled",
            TemplateKind::LegacyScale => "legacy_scale",
            TemplateKind::LegacyAxis => "legacy_axis",
            TemplateKind::LegacyColor => "legacy_color",
            TemplateKind::Watermark => "watermark",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A recognized expression, ready to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledExpression {
    CompColor(EffectRef),
    ScaledStroke {
        divisor: f64,
        reference: EffectRef,
    },
    MenuSwitch {
        reference: EffectRef,
        threshold: f64,
        when_equal: f64,
        otherwise: f64,
    },
    LegacyScaled {
        reference: EffectRef,
        factor: f64,
    },
    LegacyScale(EffectRef),
    LegacyAxis(EffectRef),
    LegacyColor(EffectRef),
    Watermark,
}

impl CompiledExpression {
    pub fn kind(&self) -> TemplateKind {
        match self {
            CompiledExpression::CompColor(_) => TemplateKind::CompColor,
            CompiledExpression::ScaledStroke { .. } => TemplateKind::ScaledStroke,
            CompiledExpression::MenuSwitch { .. } => TemplateKind::MenuSwitch,
            CompiledExpression::LegacyScaled { .. } => TemplateKind::LegacyScaled,
            CompiledExpression::LegacyScale(_) => TemplateKind::LegacyScale,
            CompiledExpression::LegacyAxis(_) => TemplateKind::LegacyAxis,
            CompiledExpression::LegacyColor(_) => TemplateKind::LegacyColor,
            CompiledExpression::Watermark => TemplateKind::Watermark,
        }
    }

    /// The effect channel this expression reads, if any.
    pub fn reference(&self) -> Option<&EffectRef> {
        match self {
            CompiledExpression::CompColor(r)
            | CompiledExpression::LegacyScale(r)
            | CompiledExpression::LegacyAxis(r)
            | CompiledExpression::LegacyColor(r) => Some(r),
            CompiledExpression::ScaledStroke { reference, .. }
            | CompiledExpression::MenuSwitch { reference, .. }
            | CompiledExpression::LegacyScaled { reference, .. } => Some(reference),
            CompiledExpression::Watermark => None,
        }
    }
}

/// What a program produces.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Shape<'a> {
    Value(&'a Expr),
    Branch {
        cond: &'a Expr,
        then_value: &'a Expr,
        else_value: &'a Expr,
    },
}

pub(crate) fn normalize(program: &[Stmt]) -> Option<Shape<'_>> {
    let mut body = program
        .iter()
        .filter(|s| !matches!(s, Stmt::Var { init: None, .. }));
    let stmt = body.next()?;
    if body.next().is_some() {
        return None;
    }

    match stmt {
        Stmt::Expr(e) => Some(Shape::Value(e)),
        Stmt::Assign { name, value } if name == RESULT_VAR => Some(Shape::Value(value)),
        Stmt::Var {
            name,
            init: Some(value),
        } if name == RESULT_VAR => Some(Shape::Value(value)),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => Some(Shape::Branch {
            cond,
            then_value: branch_result(then_branch)?,
            else_value: branch_result(else_branch)?,
        }),
        _ => None,
    }
}

fn branch_result(branch: &[Stmt]) -> Option<&Expr> {
    match branch {
        [Stmt::Assign { name, value }] if name == RESULT_VAR => Some(value),
        _ => None,
    }
}

fn single<T>(items: &[T]) -> Option<&T> {
    match items {
        [only] => Some(only),
        _ => None,
    }
}

fn non_negative_int(e: &Expr) -> Option<f64> {
    e.as_num_lit().filter(|n| *n >= 0.0 && n.fract() == 0.0)
}

fn effect_ref(e: &Expr) -> Option<EffectRef> {
    let Expr::Call { callee, args } = e else {
        return None;
    };
    let channel = single(args)?.as_str_lit()?.to_string();

    let (layer_call, effect_args) = callee.as_method_call("effect")?;
    let selector = single(effect_args)?;
    let effect = match selector.as_str_lit() {
        Some(name) => EffectSelector::Name(name.to_string()),
        None => {
            let n = non_negative_int(selector).filter(|n| *n >= 1.0)?;
            EffectSelector::Index(n as usize)
        }
    };

    let (root, layer_args) = layer_call.as_method_call("layer")?;
    let layer = single(layer_args)?.as_str_lit()?.to_string();

    let comp = if root.is_ident("thisComp") {
        CompRef::This
    } else {
        let name = single(root.as_named_call("comp")?)?.as_str_lit()?;
        CompRef::Named(name.to_string())
    };

    Some(EffectRef {
        comp,
        layer,
        effect,
        channel,
    })
}

fn value_ref(shape: &Shape<'_>) -> Option<EffectRef> {
    match shape {
        Shape::Value(e) => effect_ref(e),
        Shape::Branch { .. } => None,
    }
}

fn is_named_effect(r: &EffectRef, effect: &str) -> bool {
    matches!(&r.effect, EffectSelector::Name(n) if n == effect)
}

fn comp_color(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let r = value_ref(shape)?;
    let ok = matches!(r.comp, CompRef::Named(_))
        && matches!(r.effect, EffectSelector::Name(_))
        && r.channel == "Color";
    ok.then_some(CompiledExpression::CompColor(r))
}

// $bm_mul($bm_div(value, D), comp('C').layer('L').effect('E')('ch'))
fn scaled_stroke(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let Shape::Value(e) = shape else {
        return None;
    };
    let [scaled, referenced] = e.as_named_call("$bm_mul")? else {
        return None;
    };
    let [value, divisor] = scaled.as_named_call("$bm_div")? else {
        return None;
    };
    if !value.is_ident("value") {
        return None;
    }
    let divisor = divisor.as_num_lit().filter(|d| *d >= 0.0)?;
    let reference = effect_ref(referenced)?;
    let ok = matches!(reference.comp, CompRef::Named(_))
        && matches!(reference.effect, EffectSelector::Name(_));
    ok.then_some(CompiledExpression::ScaledStroke { divisor, reference })
}

// if (thisComp.layer('L').effect('E')('Menu') == N) { $bm_rt = A } else { $bm_rt = B }
fn menu_switch(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let Shape::Branch {
        cond,
        then_value,
        else_value,
    } = shape
    else {
        return None;
    };
    let Expr::Binary {
        op: BinaryOp::Eq,
        left,
        right,
    } = cond
    else {
        return None;
    };
    let reference = effect_ref(left)?;
    let ok = reference.comp == CompRef::This
        && matches!(reference.effect, EffectSelector::Name(_))
        && reference.channel == "Menu";
    if !ok {
        return None;
    }
    Some(CompiledExpression::MenuSwitch {
        reference,
        threshold: non_negative_int(right)?,
        when_equal: non_negative_int(then_value)?,
        otherwise: non_negative_int(else_value)?,
    })
}

// $bm_mul(thisComp.layer('L').effect(E)('ch'), M)
fn legacy_scaled(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let Shape::Value(e) = shape else {
        return None;
    };
    let [referenced, factor] = e.as_named_call("$bm_mul")? else {
        return None;
    };
    let reference = effect_ref(referenced)?;
    if reference.comp != CompRef::This {
        return None;
    }
    let factor = factor.as_num_lit().filter(|m| *m >= 0.0)?;
    Some(CompiledExpression::LegacyScaled { reference, factor })
}

/// `thisComp` reference to a named effect on any layer but the watermark one.
fn legacy_ref(shape: &Shape<'_>) -> Option<EffectRef> {
    let r = value_ref(shape)?;
    let ok = r.comp == CompRef::This
        && matches!(r.effect, EffectSelector::Name(_))
        && r.layer != WATERMARK_LAYER;
    ok.then_some(r)
}

fn legacy_scale(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let r = legacy_ref(shape)?;
    (is_named_effect(&r, "Scale") && r.channel == "Slider")
        .then_some(CompiledExpression::LegacyScale(r))
}

fn legacy_axis(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let r = legacy_ref(shape)?;
    (is_named_effect(&r, "Axis") && r.channel == "Point")
        .then_some(CompiledExpression::LegacyAxis(r))
}

fn legacy_color(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let r = legacy_ref(shape)?;
    (r.channel == "Color").then_some(CompiledExpression::LegacyColor(r))
}

fn watermark(shape: &Shape<'_>) -> Option<CompiledExpression> {
    let r = value_ref(shape)?;
    let ok = r.comp == CompRef::This
        && r.layer == WATERMARK_LAYER
        && matches!(r.effect, EffectSelector::Name(_));
    ok.then_some(CompiledExpression::Watermark)
}

type Matcher = fn(&Shape<'_>) -> Option<CompiledExpression>;

/// Checked in order, first match wins.
pub(crate) const TEMPLATES: &[(TemplateKind, Matcher)] = &[
    (TemplateKind::CompColor, comp_color),
    (TemplateKind::ScaledStroke, scaled_stroke),
    (TemplateKind::MenuSwitch, menu_switch),
    (TemplateKind::LegacyScaled, legacy_scaled),
    (TemplateKind::LegacyScale, legacy_scale),
    (TemplateKind::LegacyAxis, legacy_axis),
    (TemplateKind::LegacyColor, legacy_color),
    (TemplateKind::Watermark, watermark),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::parser::parse_program;

    fn shape_of(src: &str) -> Option<CompiledExpression> {
        let program = parse_program(src).unwrap();
        let shape = normalize(&program)?;
        TEMPLATES.iter().find_map(|(_, m)| m(&shape))
    }

    #[test]
    fn extracts_effect_reference() {
        let program = parse_program("comp('icon').layer('control').effect(3)('Slider')").unwrap();
        let Some(Shape::Value(e)) = normalize(&program) else {
            panic!("expected a value");
        };
        assert_eq!(
            effect_ref(e),
            Some(EffectRef {
                comp: CompRef::Named("icon".into()),
                layer: "control".into(),
                effect: EffectSelector::Index(3),
                channel: "Slider".into(),
            })
        );
    }

    #[test]
    fn zero_effect_index_is_not_a_reference() {
        assert_eq!(shape_of("$bm_mul(thisComp.layer('a').effect(0)('b'), 2)"), None);
    }

    #[test]
    fn unused_declarations_are_ignored() {
        let compiled = shape_of("var $bm_rt;\nvar tmp;\n$bm_rt = thisComp.layer('a').effect('b')('Color');");
        assert!(matches!(compiled, Some(CompiledExpression::LegacyColor(_))));
    }

    #[test]
    fn extra_statements_do_not_match() {
        assert_eq!(
            shape_of("var x = 1;\n$bm_rt = thisComp.layer('a').effect('b')('Color');"),
            None
        );
    }

    #[test]
    fn reference_must_be_whole_result() {
        assert_eq!(
            shape_of("$bm_rt = [thisComp.layer('a').effect('b')('Color')];"),
            None
        );
    }

    #[test]
    fn menu_branches_must_assign_result() {
        assert_eq!(
            shape_of("if (thisComp.layer('a').effect('b')('Menu') == 1) { x = 1; } else { x = 2; }"),
            None
        );
    }

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(TemplateKind::ScaledStroke.to_string(), "scaled_stroke");
        assert_eq!(
            serde_json::to_value(TemplateKind::LegacyAxis).unwrap(),
            serde_json::json!("legacy_axis")
        );
    }
}
