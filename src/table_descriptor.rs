//
// Copyright (c) 2024, 2025 Oracle and/or its affiliates. All rights reserved.
//
// Licensed under the Universal Permissive License v 1.0 as shown at
//  https://oss.oracle.com/licenses/upl/
//
use crate::error::{ia_err, schema_err, NoSQLError};
use crate::types::{FieldType, MapValue, TableLimits};
use serde_derive::{Deserialize, Serialize};
use std::result::Result;

/// A single declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Declared columns of a table, in declaration order, and the ordered primary key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
}

impl TableSchema {
    pub fn column_type(&self, name: &str) -> Option<FieldType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.field_type)
    }

    fn validate(&self) -> Result<(), NoSQLError> {
        if self.primary_key.is_empty() {
            return ia_err!("table schema must declare at least one primary key column");
        }
        for (i, c) in self.columns.iter().enumerate() {
            if c.name.is_empty() {
                return ia_err!("column names must be non-empty");
            }
            if self.columns[..i].iter().any(|p| p.name == c.name) {
                return ia_err!("column '{}' is declared more than once", c.name);
            }
        }
        for pk in &self.primary_key {
            if self.column_type(pk).is_none() {
                return ia_err!("primary key column '{}' is not a declared column", pk);
            }
        }
        Ok(())
    }

    /// Check a row about to be written.
    ///
    /// Every primary key column must be present with a value of the declared type.
    /// Other fields must be declared columns; they may be `Null` or left out.
    pub fn validate_row(&self, table_name: &str, row: &MapValue) -> Result<(), NoSQLError> {
        for pk in &self.primary_key {
            if !row.contains_key(pk) {
                return schema_err!(
                    "row for table {} is missing primary key column '{}'",
                    table_name,
                    pk
                );
            }
        }
        for (name, value) in row.iter() {
            let declared = match self.column_type(name) {
                Some(t) => t,
                None => {
                    return schema_err!("table {} has no column named '{}'", table_name, name);
                }
            };
            match value.field_type() {
                Some(vt) => {
                    if !declared.accepts(vt) {
                        return schema_err!(
                            "column '{}' of table {} is {}, value is {}",
                            name,
                            table_name,
                            declared,
                            vt
                        );
                    }
                }
                None => {
                    if self.primary_key.contains(name) {
                        return schema_err!(
                            "primary key column '{}' of table {} cannot be null",
                            name,
                            table_name
                        );
                    }
                }
            }
        }
        Ok(())
    }

    /// Check a primary key used to read a row.
    ///
    /// The key must contain exactly the primary key columns, each with a
    /// non-null value of the declared type.
    pub fn validate_key(&self, table_name: &str, key: &MapValue) -> Result<(), NoSQLError> {
        for (name, _) in key.iter() {
            if !self.primary_key.contains(name) {
                return schema_err!(
                    "'{}' is not a primary key column of table {}",
                    name,
                    table_name
                );
            }
        }
        for pk in &self.primary_key {
            let value = match key.get_field_value(pk) {
                Some(v) => v,
                None => {
                    return schema_err!(
                        "key for table {} is missing primary key column '{}'",
                        table_name,
                        pk
                    );
                }
            };
            // checked in validate(): every primary key column is declared
            let declared = self.column_type(pk).unwrap_or(FieldType::String);
            match value.field_type() {
                Some(vt) if declared.accepts(vt) => {}
                Some(vt) => {
                    return schema_err!(
                        "primary key column '{}' of table {} is {}, value is {}",
                        pk,
                        table_name,
                        declared,
                        vt
                    );
                }
                None => {
                    return schema_err!(
                        "primary key column '{}' of table {} cannot be null",
                        pk,
                        table_name
                    );
                }
            }
        }
        Ok(())
    }
}

/// Everything needed to create a table: its name, schema and limits.
///
/// ```
/// use nosql_cloud_quickstart::TableDescriptor;
/// use nosql_cloud_quickstart::types::{FieldType, TableLimits};
/// let td = TableDescriptor::new("HelloWorldTable")
///     .column("id", FieldType::Integer)
///     .column("name", FieldType::String)
///     .primary_key(&["id"])
///     .limits(TableLimits::provisioned(1, 2, 1));
/// assert_eq!(
///     td.create_ddl().unwrap(),
///     "CREATE TABLE IF NOT EXISTS HelloWorldTable(id INTEGER, name STRING, PRIMARY KEY(id))"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDescriptor {
    pub(crate) name: String,
    pub(crate) schema: TableSchema,
    pub(crate) limits: Option<TableLimits>,
}

impl TableDescriptor {
    pub fn new(name: &str) -> TableDescriptor {
        TableDescriptor {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Append a column to the table definition.
    pub fn column(mut self, name: &str, field_type: FieldType) -> TableDescriptor {
        self.schema.columns.push(ColumnDef {
            name: name.to_string(),
            field_type,
        });
        self
    }

    /// Set the ordered list of primary key columns.
    pub fn primary_key(mut self, columns: &[&str]) -> TableDescriptor {
        self.schema.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Cloud only: set the table limits used when the table is created.
    pub fn limits(mut self, limits: TableLimits) -> TableDescriptor {
        self.limits = Some(limits);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn table_limits(&self) -> Option<&TableLimits> {
        self.limits.as_ref()
    }

    /// The `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_ddl(&self) -> Result<String, NoSQLError> {
        validate_table_name(&self.name)?;
        self.schema.validate()?;
        let mut ddl = format!("CREATE TABLE IF NOT EXISTS {}(", self.name);
        for c in &self.schema.columns {
            ddl.push_str(&c.name);
            ddl.push(' ');
            ddl.push_str(c.field_type.ddl_name());
            ddl.push_str(", ");
        }
        ddl.push_str("PRIMARY KEY(");
        ddl.push_str(&self.schema.primary_key.join(", "));
        ddl.push_str("))");
        Ok(ddl)
    }
}

/// The `DROP TABLE IF EXISTS` statement for the named table.
pub fn drop_ddl(table_name: &str) -> Result<String, NoSQLError> {
    validate_table_name(table_name)?;
    Ok(format!("DROP TABLE IF EXISTS {}", table_name))
}

pub(crate) fn validate_table_name(name: &str) -> Result<(), NoSQLError> {
    if name.is_empty() {
        return ia_err!("table name must be non-empty");
    }
    let mut chars = name.chars();
    let first_ok = chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false);
    if !first_ok || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return ia_err!(
            "invalid table name '{}': must start with a letter and contain only letters, digits and '_'",
            name
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NoSQLErrorKind;
    use crate::types::FieldValue;

    fn hello_schema() -> TableSchema {
        TableDescriptor::new("HelloWorldTable")
            .column("id", FieldType::Integer)
            .column("name", FieldType::String)
            .primary_key(&["id"])
            .schema
    }

    #[test]
    fn create_and_drop_ddl() {
        let td = TableDescriptor::new("users")
            .column("shard", FieldType::Integer)
            .column("id", FieldType::Long)
            .column("data", FieldType::Binary)
            .primary_key(&["shard", "id"]);
        assert_eq!(
            td.create_ddl().unwrap(),
            "CREATE TABLE IF NOT EXISTS users(shard INTEGER, id LONG, data BINARY, PRIMARY KEY(shard, id))"
        );
        assert_eq!(drop_ddl("users").unwrap(), "DROP TABLE IF EXISTS users");
    }

    #[test]
    fn bad_descriptors_are_rejected() {
        let no_pk = TableDescriptor::new("t").column("id", FieldType::Integer);
        assert!(no_pk.create_ddl().is_err());

        let undeclared_pk = TableDescriptor::new("t")
            .column("id", FieldType::Integer)
            .primary_key(&["other"]);
        assert!(undeclared_pk.create_ddl().is_err());

        let dup = TableDescriptor::new("t")
            .column("id", FieldType::Integer)
            .column("id", FieldType::String)
            .primary_key(&["id"]);
        assert!(dup.create_ddl().is_err());

        assert!(drop_ddl("").is_err());
        assert!(drop_ddl("1abc").is_err());
        assert!(drop_ddl("abc; DROP").is_err());
    }

    #[test]
    fn row_validation() {
        let s = hello_schema();
        let ok = MapValue::new().i32("id", 29).str("name", "Tracy");
        assert!(s.validate_row("t", &ok).is_ok());

        // non-key columns may be left out or be null
        assert!(s.validate_row("t", &MapValue::new().i32("id", 1)).is_ok());
        let mut nulled = MapValue::new().i32("id", 1);
        nulled.put_field_value("name", FieldValue::Null);
        assert!(s.validate_row("t", &nulled).is_ok());

        let missing_pk = MapValue::new().str("name", "Tracy");
        let e = s.validate_row("t", &missing_pk).unwrap_err();
        assert_eq!(e.kind(), NoSQLErrorKind::Schema);

        let wrong_type = MapValue::new().str("id", "29");
        assert_eq!(
            s.validate_row("t", &wrong_type).unwrap_err().kind(),
            NoSQLErrorKind::Schema
        );

        let extra = MapValue::new().i32("id", 1).i32("age", 4);
        assert_eq!(
            s.validate_row("t", &extra).unwrap_err().kind(),
            NoSQLErrorKind::Schema
        );
    }

    #[test]
    fn key_validation() {
        let s = hello_schema();
        assert!(s.validate_key("t", &MapValue::new().i32("id", 29)).is_ok());

        let with_extra = MapValue::new().i32("id", 29).str("name", "Tracy");
        assert_eq!(
            s.validate_key("t", &with_extra).unwrap_err().kind(),
            NoSQLErrorKind::Schema
        );
        assert_eq!(
            s.validate_key("t", &MapValue::new()).unwrap_err().kind(),
            NoSQLErrorKind::Schema
        );
        assert_eq!(
            s.validate_key("t", &MapValue::new().i64("id", 29)).unwrap_err().kind(),
            NoSQLErrorKind::Schema
        );
    }

    #[test]
    fn integer_widens_into_long() {
        let s = TableDescriptor::new("t")
            .column("id", FieldType::Long)
            .primary_key(&["id"])
            .schema;
        assert!(s.validate_key("t", &MapValue::new().i32("id", 7)).is_ok());
        assert!(s.validate_row("t", &MapValue::new().i64("id", 7)).is_ok());
    }
}
