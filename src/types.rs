//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use base64::prelude::{Engine as _, BASE64_STANDARD};
use serde_derive::{Deserialize, Serialize};
use std::collections::btree_map::Iter;
use std::collections::BTreeMap;
use std::result::Result;

use crate::error::NoSQLError;

/// Column types that may be declared in a table schema.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    // Signed 32-bit integer.
    Integer,
    // Signed 64-bit integer.
    Long,
    // IEEE-754 64-bit floating-point number.
    Double,
    String,
    Boolean,
    // Uninterpreted sequence of bytes.
    Binary,
}

impl FieldType {
    /// The name of this type as written in a DDL statement.
    pub fn ddl_name(&self) -> &'static str {
        match self {
            FieldType::Integer => "INTEGER",
            FieldType::Long => "LONG",
            FieldType::Double => "DOUBLE",
            FieldType::String => "STRING",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Binary => "BINARY",
        }
    }

    /// Returns true if a value of type `value` may be stored in a column of this type.
    ///
    /// Types must match exactly, except that an `Integer` fits in a `Long` column.
    pub fn accepts(&self, value: FieldType) -> bool {
        *self == value || (*self == FieldType::Long && value == FieldType::Integer)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.ddl_name())
    }
}

/// A single typed value in a table row.
///
/// On the wire a value is a single-key object naming its type, for example
/// `{"INTEGER": 29}` or `{"STRING": "Tracy"}`. Binary values are base64 encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldValue {
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    Boolean(bool),
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
    Null,
}

impl FieldValue {
    /// The type of this value, or `None` for `Null`.
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            FieldValue::Integer(_) => Some(FieldType::Integer),
            FieldValue::Long(_) => Some(FieldType::Long),
            FieldValue::Double(_) => Some(FieldType::Double),
            FieldValue::String(_) => Some(FieldType::String),
            FieldValue::Boolean(_) => Some(FieldType::Boolean),
            FieldValue::Binary(_) => Some(FieldType::Binary),
            FieldValue::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    // Untagged json, as used for display
    fn to_plain_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Long(l) => serde_json::Value::from(*l),
            FieldValue::Double(d) => serde_json::Value::from(*d),
            FieldValue::String(s) => serde_json::Value::from(s.as_str()),
            FieldValue::Boolean(b) => serde_json::Value::from(*b),
            FieldValue::Binary(b) => serde_json::Value::from(BASE64_STANDARD.encode(b)),
            FieldValue::Null => serde_json::Value::Null,
        }
    }
}

mod base64_bytes {
    use base64::prelude::{Engine as _, BASE64_STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&BASE64_STANDARD.encode(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        BASE64_STANDARD
            .decode(s.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// Row versions are opaque bytes, base64 encoded on the wire
pub(crate) mod base64_version {
    use base64::prelude::{Engine as _, BASE64_STANDARD};
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(s) if !s.is_empty() => BASE64_STANDARD
                .decode(s.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

/// Trait for native Rust values that can be stored as a [`FieldValue`].
pub trait NoSQLColumnToFieldValue {
    fn to_field_value(&self) -> FieldValue;
}

impl NoSQLColumnToFieldValue for FieldValue {
    fn to_field_value(&self) -> FieldValue {
        self.clone()
    }
}

impl NoSQLColumnToFieldValue for i32 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Integer(*self)
    }
}

impl NoSQLColumnToFieldValue for i64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Long(*self)
    }
}

impl NoSQLColumnToFieldValue for f64 {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Double(*self)
    }
}

impl NoSQLColumnToFieldValue for String {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.clone())
    }
}

impl NoSQLColumnToFieldValue for &str {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::String(self.to_string())
    }
}

impl NoSQLColumnToFieldValue for bool {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Boolean(*self)
    }
}

impl NoSQLColumnToFieldValue for Vec<u8> {
    fn to_field_value(&self) -> FieldValue {
        FieldValue::Binary(self.clone())
    }
}

impl<T: NoSQLColumnToFieldValue> NoSQLColumnToFieldValue for Option<T> {
    fn to_field_value(&self) -> FieldValue {
        match self {
            Some(v) => v.to_field_value(),
            None => FieldValue::Null,
        }
    }
}

impl<T: NoSQLColumnToFieldValue> NoSQLColumnToFieldValue for &T {
    fn to_field_value(&self) -> FieldValue {
        (*self).to_field_value()
    }
}

/// A map of column name to [`FieldValue`]: one table row, or the primary key of one.
///
/// ```
/// use nosql_cloud_quickstart::types::MapValue;
/// let row = MapValue::new().i32("id", 29).str("name", "Tracy");
/// assert_eq!(row.get_i32("id"), Some(29));
/// assert_eq!(row.to_string(), r#"{"id":29,"name":"Tracy"}"#);
/// ```
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapValue {
    pub(crate) m: BTreeMap<String, FieldValue>,
}

impl MapValue {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn len(&self) -> usize {
        self.m.len()
    }

    pub fn is_empty(&self) -> bool {
        self.m.is_empty()
    }

    pub fn iter(&self) -> Iter<String, FieldValue> {
        self.m.iter()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.m.contains_key(key)
    }

    pub fn put(&mut self, key: &str, val: impl NoSQLColumnToFieldValue) {
        self.m.insert(key.to_string(), val.to_field_value());
    }

    pub fn column(mut self, key: &str, val: impl NoSQLColumnToFieldValue) -> MapValue {
        self.m.insert(key.to_string(), val.to_field_value());
        self
    }

    pub fn put_i32(&mut self, key: &str, val: i32) {
        self.m.insert(key.to_string(), FieldValue::Integer(val));
    }
    pub fn i32(mut self, key: &str, val: i32) -> MapValue {
        self.put_i32(key, val);
        self
    }
    pub fn get_i32(&self, key: &str) -> Option<i32> {
        if let FieldValue::Integer(i) = self.m.get(key)? {
            Some(*i)
        } else {
            None
        }
    }

    pub fn put_i64(&mut self, key: &str, val: i64) {
        self.m.insert(key.to_string(), FieldValue::Long(val));
    }
    pub fn i64(mut self, key: &str, val: i64) -> MapValue {
        self.put_i64(key, val);
        self
    }
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.m.get(key)? {
            FieldValue::Long(l) => Some(*l),
            FieldValue::Integer(i) => Some(*i as i64),
            _ => None,
        }
    }

    pub fn put_float64(&mut self, key: &str, val: f64) {
        self.m.insert(key.to_string(), FieldValue::Double(val));
    }
    pub fn get_float64(&self, key: &str) -> Option<f64> {
        if let FieldValue::Double(d) = self.m.get(key)? {
            Some(*d)
        } else {
            None
        }
    }

    pub fn put_str(&mut self, key: &str, val: &str) {
        self.put_string(key, val.to_string())
    }
    pub fn str(mut self, key: &str, val: &str) -> MapValue {
        self.put_str(key, val);
        self
    }
    pub fn put_string(&mut self, key: &str, val: String) {
        self.m.insert(key.to_string(), FieldValue::String(val));
    }
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let FieldValue::String(s) = self.m.get(key)? {
            Some(s.clone())
        } else {
            None
        }
    }

    pub fn put_bool(&mut self, key: &str, val: bool) {
        self.m.insert(key.to_string(), FieldValue::Boolean(val));
    }
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        if let FieldValue::Boolean(b) = self.m.get(key)? {
            Some(*b)
        } else {
            None
        }
    }

    pub fn put_binary(&mut self, key: &str, val: Vec<u8>) {
        self.m.insert(key.to_string(), FieldValue::Binary(val));
    }
    pub fn get_binary(&self, key: &str) -> Option<&Vec<u8>> {
        if let FieldValue::Binary(b) = self.m.get(key)? {
            Some(b)
        } else {
            None
        }
    }

    pub fn put_field_value(&mut self, key: &str, val: FieldValue) {
        self.m.insert(key.to_string(), val);
    }
    pub fn get_field_value(&self, key: &str) -> Option<&FieldValue> {
        self.m.get(key)
    }

    /// A copy of this map holding only the named columns that are present.
    pub fn project(&self, columns: &[String]) -> MapValue {
        let mut m = BTreeMap::new();
        for c in columns {
            if let Some(v) = self.m.get(c) {
                m.insert(c.clone(), v.clone());
            }
        }
        MapValue { m }
    }

    /// Build a `MapValue` from a json object, inferring column types from json types.
    ///
    /// Integral numbers become `Integer` when they fit in 32 bits, otherwise `Long`.
    pub fn from_json_object(json: &serde_json::Value) -> Result<Self, NoSQLError> {
        let o = match json {
            serde_json::Value::Object(o) => o,
            _ => {
                return crate::error::ia_err!(
                    "from_json_object: json value is not an Object: {}",
                    json
                )
            }
        };
        let mut mv = MapValue::new();
        for (key, val) in o {
            let fv = match val {
                serde_json::Value::Null => FieldValue::Null,
                serde_json::Value::Bool(b) => FieldValue::Boolean(*b),
                serde_json::Value::String(s) => FieldValue::String(s.clone()),
                serde_json::Value::Number(n) => {
                    if let Some(i) = n.as_i64() {
                        match i32::try_from(i) {
                            Ok(i) => FieldValue::Integer(i),
                            Err(_) => FieldValue::Long(i),
                        }
                    } else if let Some(d) = n.as_f64() {
                        FieldValue::Double(d)
                    } else {
                        return crate::error::ia_err!("unsupported number '{}' for '{}'", n, key);
                    }
                }
                _ => {
                    return crate::error::ia_err!(
                        "unsupported json value for '{}': arrays and objects are not column types",
                        key
                    )
                }
            };
            mv.m.insert(key.clone(), fv);
        }
        Ok(mv)
    }
}

impl std::fmt::Display for MapValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let mut o = serde_json::Map::new();
        for (k, v) in &self.m {
            o.insert(k.clone(), v.to_plain_json());
        }
        write!(f, "{}", serde_json::Value::Object(o))
    }
}

/// Consistency guarantees for read operations.
///
/// Eventual consistency means that the values read may be very slightly out of
/// date. This is the default. Absolute consistency guarantees that current
/// values are read, at twice the read-unit cost.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Consistency {
    #[default]
    Eventual,
    Absolute,
}

/// State of a table, as reported by the service.
///
/// States are only ever learned from service responses; the client never sets them.
#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableState {
    // The table is being created and cannot yet be used
    #[default]
    Creating,
    // The table is ready to be used. This is the steady state after
    // creation or modification.
    Active,
    // The table is being updated. It is available for normal use, but
    // additional table modification operations are not permitted.
    Updating,
    // The table is being dropped and cannot be used
    Dropping,
    // The table has been dropped or does not exist
    Dropped,
    // The requested table operation failed
    Failed,
}

impl std::fmt::Display for TableState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let s = match self {
            TableState::Creating => "CREATING",
            TableState::Active => "ACTIVE",
            TableState::Updating => "UPDATING",
            TableState::Dropping => "DROPPING",
            TableState::Dropped => "DROPPED",
            TableState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Default, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapacityMode {
    #[default]
    Provisioned,
    OnDemand,
}

/// Provisioned throughput and storage for a table.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLimits {
    pub read_units: i32,
    pub write_units: i32,
    pub storage_gb: i32,
    #[serde(default)]
    pub mode: CapacityMode,
}

impl TableLimits {
    // Create a new TableLimits with Provisioned values
    pub fn provisioned(read_units: i32, write_units: i32, storage_gb: i32) -> TableLimits {
        TableLimits {
            read_units,
            write_units,
            storage_gb,
            mode: CapacityMode::Provisioned,
        }
    }

    // create a new TableLimits with on-demand values
    pub fn on_demand(storage_gb: i32) -> TableLimits {
        TableLimits {
            read_units: 0,
            write_units: 0,
            storage_gb,
            mode: CapacityMode::OnDemand,
        }
    }
}
