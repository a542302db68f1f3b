//! Typed records produced by normalization

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// JSON form used in remote payloads and API responses. Dates render as
    /// `YYYY-MM-DD`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Text form for a PostgreSQL `COPY ... (FORMAT csv)` field; `None` is NULL.
    pub fn to_copy_text(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Float(f) => Some(f.to_string()),
            FieldValue::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// One output row: canonical field name to value, data fields first, then
/// context fields, in profile order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    fields: Vec<(String, FieldValue)>,
}

impl NormalizedRecord {
    pub fn new(fields: Vec<(String, FieldValue)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    pub fn values(&self) -> impl Iterator<Item = &FieldValue> {
        self.fields.iter().map(|(_, v)| v)
    }
}

impl Serialize for NormalizedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// All records of one upload.
///
/// Built all-or-nothing by the normalizer; a batch only exists once every
/// row has been coerced.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NormalizedBatch {
    pub document_type: String,
    /// Data field names in output order, context excluded
    pub columns: Vec<String>,
    pub context: Vec<(String, FieldValue)>,
    pub records: Vec<NormalizedRecord>,
}

impl NormalizedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Data columns followed by context columns, matching record field order
    pub fn all_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .cloned()
            .chain(self.context.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    /// Values of one data column, aligned with `records`
    pub fn column(&self, name: &str) -> Vec<&FieldValue> {
        static NULL: FieldValue = FieldValue::Null;
        self.records
            .iter()
            .map(|r| r.get(name).unwrap_or(&NULL))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> NormalizedRecord {
        NormalizedRecord::new(vec![
            ("offer_id".to_string(), FieldValue::Text("A1".to_string())),
            ("price".to_string(), FieldValue::Float(10.5)),
            ("client_id".to_string(), FieldValue::Integer(7)),
        ])
    }

    #[test]
    fn test_record_serializes_as_object() {
        let value = serde_json::to_value(record()).unwrap_or_default();
        assert_eq!(value, json!({"offer_id": "A1", "price": 10.5, "client_id": 7}));
    }

    #[test]
    fn test_copy_text() {
        assert_eq!(FieldValue::Null.to_copy_text(), None);
        assert_eq!(FieldValue::Float(7.0).to_copy_text().as_deref(), Some("7"));
        let date = NaiveDate::from_ymd_opt(2024, 5, 31).unwrap_or_default();
        assert_eq!(FieldValue::Date(date).to_copy_text().as_deref(), Some("2024-05-31"));
    }

    #[test]
    fn test_all_columns_appends_context() {
        let batch = NormalizedBatch {
            document_type: "price".to_string(),
            columns: vec!["offer_id".to_string(), "price".to_string()],
            context: vec![("client_id".to_string(), FieldValue::Integer(7))],
            records: vec![record()],
        };
        assert_eq!(batch.all_columns(), vec!["offer_id", "price", "client_id"]);
        assert_eq!(batch.column("price"), vec![&FieldValue::Float(10.5)]);
        assert_eq!(batch.column("missing"), vec![&FieldValue::Null]);
    }
}
