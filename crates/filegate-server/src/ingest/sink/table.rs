use async_trait::async_trait;
use filegate_ingest::{NormalizedBatch, SinkTarget};
use sqlx::PgPool;
use tracing::{info, instrument};

use super::{RecordSink, SinkError};
use crate::db::quote_ident;
use crate::ingest::dedup;

/// Bulk-loads batches into PostgreSQL with `COPY ... FROM STDIN`
#[derive(Clone)]
pub struct TableSink {
    pool: PgPool,
}

impl TableSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `COPY "table" ("a", "b") FROM STDIN WITH (FORMAT csv)`
pub fn copy_statement(table: &str, columns: &[String]) -> String {
    let columns = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT csv)",
        quote_ident(table),
        columns
    )
}

/// Encode records as COPY csv text. NULL is an unquoted empty field.
pub fn encode_copy_csv(batch: &NormalizedBatch) -> Result<Vec<u8>, SinkError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    for record in &batch.records {
        let row = record
            .values()
            .map(|v| v.to_copy_text().unwrap_or_default());
        writer
            .write_record(row)
            .map_err(|e| SinkError::Storage(format!("Failed to encode COPY data: {}", e)))?;
    }

    writer
        .into_inner()
        .map_err(|e| SinkError::Storage(format!("Failed to encode COPY data: {}", e)))
}

#[async_trait]
impl RecordSink for TableSink {
    fn kind(&self) -> &'static str {
        "table"
    }

    #[instrument(skip(self, batch, target), fields(document_type = %batch.document_type, records = batch.len()))]
    async fn deliver(
        &self,
        batch: &NormalizedBatch,
        target: &SinkTarget,
    ) -> Result<u64, SinkError> {
        let SinkTarget::Table { table, .. } = target else {
            return Err(SinkError::Misrouted {
                sink: self.kind(),
                target: target.kind(),
            });
        };

        let data = encode_copy_csv(batch)?;
        let statement = copy_statement(table, &batch.all_columns());

        let mut tx = self.pool.begin().await?;
        let mut copy = tx.copy_in_raw(&statement).await?;
        copy.send(data).await?;
        let rows = copy.finish().await?;
        tx.commit().await?;

        info!(table = %table, rows, "Batch copied into table");
        Ok(rows)
    }

    async fn dedupe(&self, target: &SinkTarget) -> Result<u64, SinkError> {
        match target {
            SinkTarget::Table { table, natural_key } => {
                Ok(dedup::dedupe(&self.pool, table, natural_key).await?)
            },
            SinkTarget::Remote { .. } => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_ingest::{FieldValue, NormalizedRecord};

    #[test]
    fn test_copy_statement_quotes_identifiers() {
        let sql = copy_statement(
            "yandex_sales_boost",
            &["sku".to_string(), "client_id".to_string()],
        );
        assert_eq!(
            sql,
            "COPY \"yandex_sales_boost\" (\"sku\", \"client_id\") FROM STDIN WITH (FORMAT csv)"
        );
    }

    #[test]
    fn test_encode_nulls_and_quoting() {
        let batch = NormalizedBatch {
            document_type: "yandex_sales_boost".to_string(),
            columns: vec!["sku".to_string(), "boost_spend".to_string()],
            context: vec![("client_id".to_string(), FieldValue::Integer(7))],
            records: vec![
                NormalizedRecord::new(vec![
                    ("sku".to_string(), FieldValue::Text("a,b".to_string())),
                    ("boost_spend".to_string(), FieldValue::Null),
                    ("client_id".to_string(), FieldValue::Integer(7)),
                ]),
                NormalizedRecord::new(vec![
                    ("sku".to_string(), FieldValue::Text("c".to_string())),
                    ("boost_spend".to_string(), FieldValue::Float(12.5)),
                    ("client_id".to_string(), FieldValue::Integer(7)),
                ]),
            ],
        };

        let data = encode_copy_csv(&batch).unwrap_or_default();
        assert_eq!(String::from_utf8_lossy(&data), "\"a,b\",,7\nc,12.5,7\n");
    }
}
