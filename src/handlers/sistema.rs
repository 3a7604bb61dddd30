use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::database::connection::health_check;
use crate::errors::ApiError;
use crate::resources::ApiResponse;
use crate::AppState;

/// Estado del servicio y de su base de datos. Sin autenticación: lo
/// consumen monitores externos.
pub async fn salud(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    health_check(&state.db).await?;

    Ok(Json(ApiResponse::ok(serde_json::json!({
        "status": "ok",
        "database": "ok",
    }))))
}
