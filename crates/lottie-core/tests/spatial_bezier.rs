#[cfg(test)]
mod tests {
    use lottie_core::animatable::Animator;
    use lottie_data::model::Property;
    use serde_json::{json, Value};

    #[test]
    fn test_point_control_follows_spatial_bezier() {
        // P0 = (0, 0), P3 = (100, 100)
        // Tangent Out (from P0) = (50, 0) -> P1 = (50, 0)
        // Tangent In (to P3) = (0, -50)   -> P2 = (100, 50)
        //
        // At t = 0.5 the weights are 0.125, 0.375, 0.375, 0.125:
        // x = 0.375*50 + 0.375*100 + 0.125*100 = 68.75
        // y = 0.375*50 + 0.125*100 = 31.25
        let prop: Property<Value> = serde_json::from_value(json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [0, 0], "e": [100, 100], "to": [50, 0] },
                { "t": 10, "s": [100, 100], "ti": [0, -50] }
            ]
        }))
        .unwrap();
        assert!(prop.is_animated());

        let result = Animator::resolve(&prop, 5.0, |v: &Value| v.clone(), Value::Null);
        let x = result[0].as_f64().unwrap();
        let y = result[1].as_f64().unwrap();

        assert!((x - 68.75).abs() < 0.001, "X should be ~68.75, got {x}");
        assert!((y - 31.25).abs() < 0.001, "Y should be ~31.25, got {y}");
    }

    #[test]
    fn test_color_without_tangents_is_linear() {
        let prop: Property<Value> = serde_json::from_value(json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [0, 0, 0], "e": [1, 1, 1] },
                { "t": 10, "s": [1, 1, 1] }
            ]
        }))
        .unwrap();

        let result = Animator::resolve(&prop, 5.0, |v: &Value| v.clone(), Value::Null);
        assert_eq!(result, json!([0.5, 0.5, 0.5]));
    }
}
