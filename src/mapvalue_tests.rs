//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::types;
use crate::types::FieldValue;
use crate::types::NoSQLColumnToFieldValue;
use std::error::Error;
use std::result::Result;

#[test]
fn test_basic_mapvalue() -> Result<(), Box<dyn Error>> {
    let mut m = types::MapValue::new();
    m.put_i32("i32val", 5);
    m.put_bool("boolval", true);
    m.put_i64("i64val", 123456789);
    m.put_float64("floatval", 2345.0023456);
    m.put_str("strval", "This is a string value");
    let vec: Vec<u8> = vec![0, 1, 2, 3, 4, 5];
    m.put_binary("binval", vec);
    assert_eq!(m.get_i32("i32val").ok_or("i32val doesn't exist")?, 5);
    assert!(m.get_bool("boolval").ok_or("boolval doesn't exist")?);
    assert_eq!(
        m.get_float64("floatval").ok_or("floatval doesn't exist")?,
        2345.0023456
    );
    assert_eq!(
        m.get_i64("i64val").ok_or("i64val doesn't exist")?,
        123456789
    );
    assert_eq!(
        m.get_string("strval").ok_or("strval doesn't exist")?,
        "This is a string value"
    );
    assert_eq!(
        m.get_binary("binval").ok_or("binval doesn't exist")?,
        &vec![0u8, 1, 2, 3, 4, 5]
    );
    assert_eq!(m.len(), 6);
    // wrong-type reads return None
    assert_eq!(m.get_i32("strval"), None);
    assert_eq!(m.get_string("i32val"), None);
    // Integer widens when read as a long
    assert_eq!(m.get_i64("i32val"), Some(5));
    Ok(())
}

#[test]
fn test_wire_format() -> Result<(), Box<dyn Error>> {
    let mut m = types::MapValue::new();
    m.put("id", 29i32);
    m.put("name", "Tracy");
    m.put("big", 1i64 << 40);
    m.put("nothing", None::<String>);
    m.put("blob", vec![1u8, 2, 3]);
    let v = serde_json::to_value(&m)?;
    assert_eq!(
        v,
        serde_json::json!({
            "id": {"INTEGER": 29},
            "name": {"STRING": "Tracy"},
            "big": {"LONG": 1099511627776i64},
            "nothing": "NULL",
            "blob": {"BINARY": "AQID"}
        })
    );
    let back: types::MapValue = serde_json::from_value(v)?;
    assert_eq!(back, m);
    Ok(())
}

#[test]
fn test_display_is_plain_json() {
    let m = types::MapValue::new().i32("id", 29).str("name", "Tracy");
    assert_eq!(m.to_string(), r#"{"id":29,"name":"Tracy"}"#);
}

#[test]
fn test_from_json_object() -> Result<(), Box<dyn Error>> {
    let j = serde_json::json!({"id": 29, "big": 5000000000i64, "ratio": 0.5, "name": "Tracy", "ok": true, "gone": null});
    let m = types::MapValue::from_json_object(&j)?;
    assert_eq!(m.get_field_value("id"), Some(&FieldValue::Integer(29)));
    assert_eq!(m.get_field_value("big"), Some(&FieldValue::Long(5000000000)));
    assert_eq!(m.get_float64("ratio"), Some(0.5));
    assert_eq!(m.get_bool("ok"), Some(true));
    assert!(m.get_field_value("gone").ok_or("gone doesn't exist")?.is_null());

    assert!(types::MapValue::from_json_object(&serde_json::json!([1, 2])).is_err());
    assert!(types::MapValue::from_json_object(&serde_json::json!({"a": [1]})).is_err());
    Ok(())
}

#[test]
fn test_project_and_column_builder() {
    let m = types::MapValue::new()
        .column("id", 29i32)
        .column("name", "Tracy".to_string())
        .column("score", 1.5f64);
    let k = m.project(&["id".to_string(), "missing".to_string()]);
    assert_eq!(k.len(), 1);
    assert_eq!(k.get_i32("id"), Some(29));
    assert_eq!(
        Some(3i32).to_field_value(),
        FieldValue::Integer(3)
    );
}
