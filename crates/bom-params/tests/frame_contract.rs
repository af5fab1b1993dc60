use bom_params::{FrameKind, FrameOptions, ParamError, ParameterFrame};
use serde_json::{Value, json};

#[test]
fn replace_leaves_held_snapshot_untouched() {
    let mut frame = ParameterFrame::new(FrameOptions::default());
    frame.add("thickness", 5.0, Some("mm")).unwrap();

    let before = frame.param("thickness").unwrap();
    let mut changes = serde_json::Map::new();
    changes.insert("value".into(), json!(7.5));
    changes.insert("source".into(), json!("drawing rev B"));
    frame.update_parameter("thickness", changes).unwrap();

    assert_eq!(before.value, json!(5.0));
    assert!(!before.extra.contains_key("source"));

    let after = frame.param("thickness").unwrap();
    assert_eq!(after.value, json!(7.5));
    assert_eq!(after.unit.as_deref(), Some("mm"));
    assert_eq!(after.extra["source"], json!("drawing rev B"));
}

#[test]
fn metre_parameter_rejects_seconds() {
    let mut frame = ParameterFrame::new(FrameOptions::default());
    frame.add("radius", 1.0, Some("m")).unwrap();
    match frame.set("radius", json!("1 s")) {
        Err(ParamError::DimensionalityViolation { var, from, to }) => {
            assert_eq!(var, "radius");
            assert_eq!(from, "m");
            assert_eq!(to, "s");
        }
        other => panic!("expected a dimensionality violation, got {other:?}"),
    }
}

#[test]
fn null_values_establish_no_class() {
    let mut frame = ParameterFrame::new(FrameOptions::default());
    frame.add("mass", Value::Null, None).unwrap();
    frame.set("mass", json!("3 kg")).unwrap();
    assert!(frame.set("mass", json!("3 m")).is_err());
}

#[test]
fn frame_round_trips_through_json_text() {
    let mut frame = ParameterFrame::new(FrameOptions {
        kind: FrameKind::UnitChecked,
        restricted: false,
    });
    frame.set("mass", json!("12.5 kg")).unwrap();
    frame.set("grade", json!("stainless")).unwrap();
    frame.set("count", json!(4)).unwrap();

    let text = serde_json::to_string(&frame.to_value()).unwrap();
    let parsed: Value = serde_json::from_str(&text).unwrap();
    let back = ParameterFrame::from_value(&parsed, FrameOptions::default()).unwrap();

    assert_eq!(back.to_value(), frame.to_value());
    assert_eq!(back.get("grade").unwrap(), &json!("stainless"));
}

#[test]
fn numeric_looking_text_is_stored_as_text() {
    let mut frame = ParameterFrame::default();
    frame.set("floor", json!("2nd floor")).unwrap();
    assert_eq!(frame.get("floor").unwrap(), &json!("2nd floor"));
    assert_eq!(
        frame.get_field("floor", "unit").unwrap(),
        json!("dimensionless")
    );
}
