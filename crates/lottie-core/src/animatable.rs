use glam::Vec2;
use lottie_data::model::{Property, Value};

pub trait Interpolatable: Sized + Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;

    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        _tan_in: Option<&Vec<f32>>,
        _tan_out: Option<&Vec<f32>>,
    ) -> Self {
        self.lerp(other, t)
    }
}

impl Interpolatable for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

fn tangent(v: Option<&Vec<f32>>) -> Vec2 {
    match v {
        Some(v) if v.len() >= 2 => Vec2::new(v[0], v[1]),
        _ => Vec2::ZERO,
    }
}

impl Interpolatable for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *other, t)
    }

    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        tan_in: Option<&Vec<f32>>,
        tan_out: Option<&Vec<f32>>,
    ) -> Self {
        let p0 = *self;
        let p3 = *other;
        let p1 = p0 + tangent(tan_out);
        let p2 = p3 + tangent(tan_in);

        let one_minus_t = 1.0 - t;
        let one_minus_t_sq = one_minus_t * one_minus_t;
        let one_minus_t_cub = one_minus_t_sq * one_minus_t;

        let t_sq = t * t;
        let t_cub = t_sq * t;

        p0 * one_minus_t_cub
            + p1 * 3.0 * one_minus_t_sq * t
            + p2 * 3.0 * one_minus_t * t_sq
            + p3 * t_cub
    }
}

fn as_components(v: &serde_json::Value) -> Option<Vec<f32>> {
    match v {
        serde_json::Value::Number(n) => n.as_f64().map(|n| vec![n as f32]),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|x| x.as_f64().map(|n| n as f32))
            .collect(),
        _ => None,
    }
}

fn from_components(template: &serde_json::Value, c: &[f32]) -> serde_json::Value {
    match template {
        serde_json::Value::Number(_) => serde_json::json!(c[0]),
        _ => serde_json::json!(c),
    }
}

/// Effect values are raw JSON: numbers and numeric arrays interpolate, any
/// other shape holds until the next keyframe.
impl Interpolatable for serde_json::Value {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self.lerp_spatial(other, t, None, None)
    }

    fn lerp_spatial(
        &self,
        other: &Self,
        t: f32,
        tan_in: Option<&Vec<f32>>,
        tan_out: Option<&Vec<f32>>,
    ) -> Self {
        let (Some(a), Some(b)) = (as_components(self), as_components(other)) else {
            return if t < 1.0 { self.clone() } else { other.clone() };
        };
        if a.len() != b.len() || a.is_empty() {
            return if t < 1.0 { self.clone() } else { other.clone() };
        }

        // Point controls follow their motion path.
        if a.len() == 2 && (tan_in.is_some() || tan_out.is_some()) {
            let p = Vec2::new(a[0], a[1]).lerp_spatial(&Vec2::new(b[0], b[1]), t, tan_in, tan_out);
            return from_components(self, &[p.x, p.y]);
        }

        let mixed: Vec<f32> = a.iter().zip(&b).map(|(x, y)| x.lerp(y, t)).collect();
        from_components(self, &mixed)
    }
}

// Cubic Bezier Easing
pub fn solve_cubic_bezier(p1: Vec2, p2: Vec2, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    // Newton-Raphson
    let mut t = x;
    for _ in 0..8 {
        let one_minus_t = 1.0 - t;
        let x_est = 3.0 * one_minus_t * one_minus_t * t * p1.x
            + 3.0 * one_minus_t * t * t * p2.x
            + t * t * t;

        let err = x_est - x;
        if err.abs() < 1e-4 {
            break;
        }

        let dx_dt = 3.0 * one_minus_t * one_minus_t * p1.x
            + 6.0 * one_minus_t * t * (p2.x - p1.x)
            + 3.0 * t * t * (1.0 - p2.x);

        if dx_dt.abs() < 1e-6 {
            break;
        }
        t -= err / dx_dt;
    }

    let one_minus_t = 1.0 - t;
    3.0 * one_minus_t * one_minus_t * t * p1.y + 3.0 * one_minus_t * t * t * p2.y + t * t * t
}

/// Samples keyframed properties at a frame.
pub struct Animator;

impl Animator {
    pub fn resolve<T, U>(prop: &Property<T>, frame: f32, converter: impl Fn(&T) -> U, default: U) -> U
    where
        U: Interpolatable,
    {
        match &prop.k {
            Value::Default => default,
            Value::Static(v) => converter(v),
            Value::Animated(keyframes) => {
                if keyframes.is_empty() {
                    return default;
                }

                // First keyframe strictly after `frame`; the segment is [idx-1, idx].
                let idx = keyframes.partition_point(|kf| kf.t <= frame);

                if idx == 0 {
                    if let Some(s) = &keyframes[0].s {
                        return converter(s);
                    }
                    return default;
                }

                let len = keyframes.len();
                if idx >= len {
                    let last = &keyframes[len - 1];
                    if let Some(e) = &last.e {
                        return converter(e);
                    }
                    if let Some(s) = &last.s {
                        return converter(s);
                    }
                    return default;
                }

                let kf_start = &keyframes[idx - 1];
                let kf_end = &keyframes[idx];

                let start_val = kf_start
                    .s
                    .as_ref()
                    .map(&converter)
                    .unwrap_or(default.clone());

                let end_val = kf_start
                    .e
                    .as_ref()
                    .map(&converter)
                    .or_else(|| kf_end.s.as_ref().map(&converter))
                    .unwrap_or(start_val.clone());

                let duration = kf_end.t - kf_start.t;
                if duration <= 0.0 {
                    return start_val;
                }

                if kf_start.h == Some(1) {
                    return start_val;
                }

                let p1 = kf_start
                    .o
                    .map(|o| Vec2::new(o[0], o[1]))
                    .unwrap_or(Vec2::ZERO);
                let p2 = kf_end
                    .i
                    .map(|i| Vec2::new(i[0], i[1]))
                    .unwrap_or(Vec2::ONE);

                let local_t = solve_cubic_bezier(p1, p2, (frame - kf_start.t) / duration);

                start_val.lerp_spatial(&end_val, local_t, kf_end.ti.as_ref(), kf_start.to.as_ref())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottie_data::model::Keyframe;
    use serde_json::json;

    fn kf<T>(t: f32, s: T, e: T) -> Keyframe<T> {
        Keyframe {
            t,
            s: Some(s),
            e: Some(e),
            i: None,
            o: None,
            to: None,
            ti: None,
            h: None,
        }
    }

    #[test]
    fn test_animator_resolve_binary_search() {
        let prop = Property {
            a: 1,
            k: Value::Animated(vec![kf(0.0, 0.0, 10.0), kf(10.0, 10.0, 20.0), kf(20.0, 20.0, 30.0)]),
            ix: None,
            x: None,
        };

        let conv = |v: &f32| *v;

        assert_eq!(Animator::resolve(&prop, 0.0, conv, -1.0), 0.0);
        assert_eq!(Animator::resolve(&prop, 10.0, conv, -1.0), 10.0);
        assert_eq!(Animator::resolve(&prop, 20.0, conv, -1.0), 30.0);
        assert_eq!(Animator::resolve(&prop, -5.0, conv, -1.0), 0.0);
        assert_eq!(Animator::resolve(&prop, 25.0, conv, -1.0), 30.0);
        assert_eq!(Animator::resolve(&prop, 5.0, conv, -1.0), 5.0);
        assert_eq!(Animator::resolve(&prop, 15.0, conv, -1.0), 15.0);
    }

    #[test]
    fn json_colors_interpolate_per_channel() {
        let prop = Property {
            a: 1,
            k: Value::Animated(vec![
                kf(0.0, json!([0.0, 0.0, 0.0, 1.0]), json!([1.0, 0.5, 0.0, 1.0])),
                Keyframe { e: None, ..kf(10.0, json!([1.0, 0.5, 0.0, 1.0]), json!(null)) },
            ]),
            ix: None,
            x: None,
        };
        let mid = Animator::resolve(&prop, 5.0, |v| v.clone(), json!(null));
        assert_eq!(mid, json!([0.5, 0.25, 0.0, 1.0]));
    }

    #[test]
    fn json_scalars_stay_scalars() {
        assert_eq!(json!(2.0).lerp(&json!(4.0), 0.5), json!(3.0));
    }

    #[test]
    fn mismatched_shapes_hold() {
        assert_eq!(json!("a").lerp(&json!("b"), 0.5), json!("a"));
        assert_eq!(json!([1.0]).lerp(&json!([1.0, 2.0]), 0.99), json!([1.0]));
        assert_eq!(json!([1.0]).lerp(&json!([1.0, 2.0]), 1.0), json!([1.0, 2.0]));
    }

    #[test]
    fn hold_keyframes_do_not_interpolate() {
        let prop = Property {
            a: 1,
            k: Value::Animated(vec![
                Keyframe { h: Some(1), ..kf(0.0, 0.0f32, 10.0) },
                kf(10.0, 10.0, 10.0),
            ]),
            ix: None,
            x: None,
        };
        assert_eq!(Animator::resolve(&prop, 5.0, |v: &f32| *v, -1.0), 0.0);
    }

    #[test]
    fn easing_endpoints() {
        let p1 = Vec2::new(0.33, 0.0);
        let p2 = Vec2::new(0.67, 1.0);
        assert_eq!(solve_cubic_bezier(p1, p2, 0.0), 0.0);
        assert_eq!(solve_cubic_bezier(p1, p2, 1.0), 1.0);
        assert!((solve_cubic_bezier(p1, p2, 0.5) - 0.5).abs() < 1e-3);
    }
}
