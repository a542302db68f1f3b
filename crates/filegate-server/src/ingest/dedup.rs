//! Natural-key de-duplication for analytics tables
//!
//! Re-uploading an export appends a second copy of every row. After each
//! insert we keep only the newest row per natural key; `row_id` is the
//! insertion order.

use sqlx::PgPool;
use tracing::{debug, info, instrument};

use crate::db::quote_ident;

pub fn dedupe_statement(table: &str, natural_key: &[String]) -> String {
    let table = quote_ident(table);
    let partition = natural_key
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "DELETE FROM {table} WHERE row_id IN (\
         SELECT row_id FROM (\
         SELECT row_id, ROW_NUMBER() OVER (PARTITION BY {partition} ORDER BY row_id DESC) AS rn \
         FROM {table}) ranked \
         WHERE rn > 1)"
    )
}

/// Delete every row that shares its natural key with a newer row.
///
/// Returns the number of rows removed. Running it twice removes nothing the
/// second time.
#[instrument(skip(pool))]
pub async fn dedupe(pool: &PgPool, table: &str, natural_key: &[String]) -> Result<u64, sqlx::Error> {
    if natural_key.is_empty() {
        debug!("No natural key configured, skipping");
        return Ok(0);
    }

    let statement = dedupe_statement(table, natural_key);

    let mut tx = pool.begin().await?;
    let removed = sqlx::query(&statement).execute(&mut *tx).await?.rows_affected();
    tx.commit().await?;

    info!(table, removed, "Duplicate rows removed");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_partitions_by_key() {
        let sql = dedupe_statement("t", &["sku".to_string(), "date".to_string()]);
        assert_eq!(
            sql,
            "DELETE FROM \"t\" WHERE row_id IN (SELECT row_id FROM (SELECT row_id, \
             ROW_NUMBER() OVER (PARTITION BY \"sku\", \"date\" ORDER BY row_id DESC) AS rn \
             FROM \"t\") ranked WHERE rn > 1)"
        );
    }
}
