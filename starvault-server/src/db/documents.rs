use chrono::{DateTime, Utc};
use sqlx::PgPool;

use starvault_core::traits::RemoteDocument;

use crate::error::{Result, ServerError};

/// Insert or replace the user's document. Last write wins.
pub async fn upsert_document(pool: &PgPool, user_id: &str, doc: &RemoteDocument) -> Result<()> {
    sqlx::query(
        "INSERT INTO documents (user_id, encrypted_data, nonce, updated_at)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id) DO UPDATE
         SET encrypted_data = EXCLUDED.encrypted_data,
             nonce          = EXCLUDED.nonce,
             updated_at     = EXCLUDED.updated_at,
             stored_at      = NOW()",
    )
    .bind(user_id)
    .bind(&doc.encrypted_data)
    .bind(&doc.nonce)
    .bind(doc.updated_at)
    .execute(pool)
    .await
    .map_err(|e| ServerError::Database(format!("upsert_document failed: {e}")))?;

    Ok(())
}

pub async fn get_document(pool: &PgPool, user_id: &str) -> Result<Option<RemoteDocument>> {
    let row: Option<(String, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT encrypted_data, nonce, updated_at FROM documents WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .map_err(|e| ServerError::Database(format!("get_document failed: {e}")))?;

    Ok(row.map(|(encrypted_data, nonce, updated_at)| RemoteDocument {
        encrypted_data,
        nonce,
        updated_at,
    }))
}

/// Returns whether a document existed.
pub async fn delete_document(pool: &PgPool, user_id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(|e| ServerError::Database(format!("delete_document failed: {e}")))?;

    Ok(result.rows_affected() > 0)
}
