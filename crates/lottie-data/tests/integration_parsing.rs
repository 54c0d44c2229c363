use std::fs::File;
use std::io::BufReader;
use lottie_data::model::LottieJson;

#[test]
fn test_parse_control_icon() {
    let file = File::open("tests/control_icon.json").expect("Failed to open control_icon.json");
    let reader = BufReader::new(file);
    let res: Result<LottieJson, _> = serde_json::from_reader(reader);
    match res {
        Ok(lottie) => {
            assert_eq!(lottie.nm.as_deref(), Some("icon"));
            assert_eq!(lottie.layers.len(), 2);
            let effects = lottie.layers[0].ef.as_ref().expect("control layer has effects");
            assert_eq!(effects.len(), 5);
            assert!(lottie.layers[1].ef.is_none());
        }
        Err(e) => panic!("Failed to parse control_icon.json: {}", e),
    }
}
