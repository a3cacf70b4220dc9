use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;

use starvault_core::traits::RemoteDocument;

use crate::db::documents as db;
use crate::error::ServerError;
use crate::state::AppState;

const MAX_USER_ID_LEN: usize = 256;

/// PUT /api/documents/{user_id}
///
/// Store the user's sealed document, replacing any previous one. The payload
/// is opaque: it is only checked to be base64, never decoded further.
pub async fn put_document(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(doc): Json<RemoteDocument>,
) -> Result<impl IntoResponse, ServerError> {
    validate_user_id(&user_id)?;
    validate_document(&doc)?;

    db::upsert_document(&state.pool, &user_id, &doc).await?;

    tracing::info!(
        user_id = %user_id,
        size = doc.encrypted_data.len(),
        updated_at = %doc.updated_at,
        "document stored"
    );

    Ok((StatusCode::OK, Json(json!({ "updatedAt": doc.updated_at }))))
}

/// GET /api/documents/{user_id}
///
/// Always served fresh: clients rely on this read being authoritative.
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    validate_user_id(&user_id)?;

    match db::get_document(&state.pool, &user_id).await? {
        Some(doc) => {
            tracing::debug!(user_id = %user_id, size = doc.encrypted_data.len(), "document served");
            Ok(([(CACHE_CONTROL, "no-store")], Json(doc)))
        }
        None => Err(ServerError::NotFound(format!("no document for user {user_id}"))),
    }
}

/// DELETE /api/documents/{user_id}
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    validate_user_id(&user_id)?;

    let deleted = db::delete_document(&state.pool, &user_id).await?;

    tracing::info!(user_id = %user_id, deleted, "document deleted");

    Ok((StatusCode::OK, Json(json!({ "deleted": deleted }))))
}

fn validate_user_id(user_id: &str) -> Result<(), ServerError> {
    if user_id.trim().is_empty() || user_id.len() > MAX_USER_ID_LEN {
        return Err(ServerError::BadRequest(format!(
            "user id must be 1..={MAX_USER_ID_LEN} bytes"
        )));
    }
    Ok(())
}

fn validate_document(doc: &RemoteDocument) -> Result<(), ServerError> {
    for (field, value) in [("encryptedData", &doc.encrypted_data), ("nonce", &doc.nonce)] {
        if value.is_empty() {
            return Err(ServerError::BadRequest(format!("{field} cannot be empty")));
        }
        STANDARD
            .decode(value)
            .map_err(|e| ServerError::BadRequest(format!("{field} is not base64: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(encrypted_data: &str, nonce: &str) -> RemoteDocument {
        RemoteDocument {
            encrypted_data: encrypted_data.to_string(),
            nonce: nonce.to_string(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_document() {
        assert!(validate_document(&doc("AQID", "AAAAAAAAAAAAAAAA")).is_ok());
        assert!(validate_document(&doc("", "AAAAAAAAAAAAAAAA")).is_err());
        assert!(validate_document(&doc("not base64!", "AAAAAAAAAAAAAAAA")).is_err());
        assert!(validate_document(&doc("AQID", "%%%")).is_err());
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("alice").is_ok());
        assert!(validate_user_id("  ").is_err());
        assert!(validate_user_id(&"x".repeat(MAX_USER_ID_LEN + 1)).is_err());
    }
}
