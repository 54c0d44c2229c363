// lottie-data: Serde structs for Lottie JSON format
pub mod model;

#[cfg(test)]
mod tests {
    use super::model::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal() {
        let data = json!({
            "v": "5.5.2",
            "ip": 0,
            "op": 60,
            "fr": 60,
            "w": 500,
            "h": 500,
            "layers": []
        });
        let lottie: LottieJson = serde_json::from_value(data).unwrap();
        assert_eq!(lottie.w, 500);
        assert!(lottie.nm.is_none());
    }

    #[test]
    fn test_deserialize_effect_controls() {
        let data = json!({
            "ip": 0, "op": 60, "fr": 30, "w": 100, "h": 100,
            "nm": "icon",
            "layers": [
                {
                    "ty": 3,
                    "nm": "control",
                    "ef": [
                        {
                            "ty": 5,
                            "nm": "primary",
                            "mn": "ADBE Color Control",
                            "ef": [
                                { "ty": 2, "nm": "Color", "mn": "ADBE Color Control-0001",
                                  "v": { "a": 0, "k": [0.071, 0.075, 0.192, 1] } }
                            ]
                        },
                        {
                            "ty": 5,
                            "nm": "stroke",
                            "mn": "ADBE Slider Control",
                            "ef": [ { "ty": 0, "nm": "Slider", "v": { "a": 0, "k": 2 } } ]
                        }
                    ]
                }
            ]
        });
        let lottie: LottieJson = serde_json::from_value(data).unwrap();
        let effects = lottie.layers[0].ef.as_ref().unwrap();
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0].mn.as_deref(), Some("ADBE Color Control"));

        let slider = effects[1].ef.as_ref().unwrap()[0].v.as_ref().unwrap();
        match &slider.k {
            Value::Static(v) => assert_eq!(v, &json!(2)),
            other => panic!("Expected static slider, got {:?}", other),
        }
    }

    #[test]
    fn test_keyframes_are_not_mistaken_for_static_values() {
        let data = json!({
            "a": 1,
            "k": [
                { "t": 0, "s": [0], "o": { "x": [0.33], "y": [0] }, "i": { "x": [0.67], "y": [1] } },
                { "t": 30, "s": [10] }
            ]
        });
        let prop: Property<serde_json::Value> = serde_json::from_value(data).unwrap();
        match &prop.k {
            Value::Animated(kfs) => {
                assert_eq!(kfs.len(), 2);
                assert_eq!(kfs[0].o.unwrap()[0], 0.33);
                assert_eq!(kfs[1].s, Some(json!([10])));
            }
            other => panic!("Expected keyframes, got {:?}", other),
        }
    }

    #[test]
    fn test_value_serializes_to_raw_shape() {
        let stat: Value<serde_json::Value> = Value::Static(json!([1, 0, 0]));
        assert_eq!(serde_json::to_value(&stat).unwrap(), json!([1, 0, 0]));

        let empty: Value<serde_json::Value> = Value::Default;
        assert_eq!(serde_json::to_value(&empty).unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_expression_source_is_kept() {
        let data = json!({
            "a": 0,
            "k": [0, 0, 0, 1],
            "x": "var $bm_rt;\n$bm_rt = comp('icon').layer('control').effect('primary')('Color');"
        });
        let prop: Property<serde_json::Value> = serde_json::from_value(data).unwrap();
        assert!(prop.x.as_deref().unwrap().contains("effect('primary')"));
        assert!(!prop.is_animated());
    }
}
