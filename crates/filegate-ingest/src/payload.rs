//! JSON request bodies for the remote pricing API

use crate::profile::PayloadShape;
use crate::record::NormalizedBatch;
use serde_json::{Map, Value};

/// Serialize `batch` in the layout the remote endpoint expects.
///
/// Context fields always appear once, as top-level scalars.
///
/// ```text
/// Columnar { nest_under: None }       {"api_id": "7", "offer_id": ["A1"], "price": [10.5]}
/// Columnar { nest_under: "mappings" } {"client_id": 7, "mappings": {"ozon": ["A1"], "wb": [123]}}
/// Rows { key: "items" }               {"client_id": 7, "items": [{"ozon": "A1", "wb": 123}]}
/// ```
pub fn remote_payload(batch: &NormalizedBatch, shape: &PayloadShape) -> Value {
    let mut body = Map::new();

    match shape {
        PayloadShape::Columnar { nest_under } => {
            let columns = columnar(batch);
            match nest_under {
                Some(key) => {
                    body.insert(key.clone(), Value::Object(columns));
                },
                None => body.extend(columns),
            }
        },
        PayloadShape::Rows { key } => {
            let rows = batch
                .records
                .iter()
                .map(|record| {
                    let object: Map<String, Value> = batch
                        .columns
                        .iter()
                        .filter_map(|c| record.get(c).map(|v| (c.clone(), v.to_json())))
                        .collect();
                    Value::Object(object)
                })
                .collect();
            body.insert(key.clone(), Value::Array(rows));
        },
    }

    for (name, value) in &batch.context {
        body.insert(name.clone(), value.to_json());
    }

    Value::Object(body)
}

fn columnar(batch: &NormalizedBatch) -> Map<String, Value> {
    batch
        .columns
        .iter()
        .map(|name| {
            let values = batch.column(name).into_iter().map(|v| v.to_json()).collect();
            (name.clone(), Value::Array(values))
        })
        .collect()
}
